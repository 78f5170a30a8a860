//! Build-time configuration.
//!
//! Every value here is fixed when the wrapper is compiled (`LISTGATE_*` variables in the
//! build environment). Nothing is read from files or the runtime environment: the caller
//! of a setgid wrapper must not be able to influence any of it.

use serde::Serialize;
use std::path::PathBuf;

use crate::invocation::Mode;
use crate::whitelist::{contains_script, VALID_SCRIPTS};

/// Group the web server runs as when no `LISTGATE_CGI_GROUP` is given at build time.
pub const DEFAULT_CGI_GROUP: &str = "www-data";

/// Group a caller must run as.
pub const CGI_GROUP: &str = match option_env!("LISTGATE_CGI_GROUP") {
    Some(group) => group,
    None => DEFAULT_CGI_GROUP,
};

/// Script a CGI wrapper binary runs. One binary is built per script.
pub const CGI_SCRIPT: &str = match option_env!("LISTGATE_CGI_SCRIPT") {
    Some(script) => script,
    None => "listinfo",
};

/// Install prefix of the list manager; scripts live in `<prefix>/scripts`.
pub const PREFIX: &str = match option_env!("LISTGATE_PREFIX") {
    Some(prefix) => prefix,
    None => "/usr/local/mailman",
};

/// Interpreter used to run scripts.
pub const PYTHON: &str = match option_env!("LISTGATE_PYTHON") {
    Some(python) => python,
    None => "/usr/bin/python",
};

/// Entry point every CGI request is routed through.
pub const CGI_DRIVER: &str = "driver";

const _: () = assert!(
    contains_script(VALID_SCRIPTS, CGI_SCRIPT),
    "LISTGATE_CGI_SCRIPT must name a whitelisted script"
);

/// Resolved configuration for one wrapper binary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperConfig {
    /// Identity used in every diagnostic and as the syslog ident.
    pub log_ident: String,

    /// Group the calling server must run as.
    pub parent_group: String,

    /// Interpreter executed on dispatch.
    pub python: PathBuf,

    /// Directory holding the dispatched scripts.
    pub script_dir: PathBuf,

    /// Directory put on the interpreter's module path.
    pub module_dir: PathBuf,

    /// Script baked into CGI builds.
    pub cgi_script: String,
}

impl WrapperConfig {
    /// Configuration compiled into this binary, for the given mode.
    pub fn from_build(mode: Mode) -> Self {
        let prefix = PathBuf::from(PREFIX);
        Self {
            log_ident: log_ident(mode, CGI_SCRIPT),
            parent_group: CGI_GROUP.to_string(),
            python: PathBuf::from(PYTHON),
            script_dir: prefix.join("scripts"),
            module_dir: prefix,
            cgi_script: CGI_SCRIPT.to_string(),
        }
    }
}

/// Diagnostic identity for a wrapper running in `mode`.
pub fn log_ident(mode: Mode, cgi_script: &str) -> String {
    match mode {
        Mode::Direct => "listgate wrapper".to_string(),
        Mode::CgiFixed => format!("listgate cgi-wrapper ({})", cgi_script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baked_cgi_script_is_whitelisted() {
        assert!(crate::whitelist::script_whitelist().is_valid(CGI_SCRIPT));
    }

    #[test]
    fn script_dir_is_under_module_dir() {
        let config = WrapperConfig::from_build(Mode::Direct);
        assert_eq!(config.script_dir, config.module_dir.join("scripts"));
        assert_eq!(config.parent_group, CGI_GROUP);
    }

    #[test]
    fn cgi_ident_names_the_script() {
        assert_eq!(
            log_ident(Mode::CgiFixed, "admin"),
            "listgate cgi-wrapper (admin)"
        );
        assert_eq!(log_ident(Mode::Direct, "admin"), "listgate wrapper");
    }

    #[test]
    fn serializes_camel_case() {
        let config = WrapperConfig::from_build(Mode::CgiFixed);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json.get("parentGroup").and_then(|v| v.as_str()),
            Some(CGI_GROUP)
        );
        assert!(json.get("logIdent").is_some());
        assert!(json.get("cgiScript").is_some());
    }
}
