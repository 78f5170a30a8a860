//! Invocation resolution: turn process-start inputs into an [`InvocationContext`],
//! rejecting malformed direct invocations before any privileged work.

use serde::Serialize;
use std::ffi::OsString;

use crate::config::CGI_DRIVER;
use crate::error::WrapperError;
use crate::whitelist::CommandWhitelist;

/// Program name used in the usage message when argv is empty.
const FALLBACK_PROGRAM: &str = "listgate-wrapper";

/// How the wrapper was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// First argument names the script.
    Direct,
    /// Script fixed at build time; caller argv is ignored.
    CgiFixed,
}

impl Mode {
    /// Kind of wrapper, as named in group diagnostics.
    pub fn wrapper_label(self) -> &'static str {
        match self {
            Mode::Direct => "command",
            Mode::CgiFixed => "CGI",
        }
    }

    /// Kind of server expected to run the wrapper.
    pub fn server_label(self) -> &'static str {
        match self {
            Mode::Direct => "calling",
            Mode::CgiFixed => "web",
        }
    }
}

/// Resolved intent of one process run. Immutable once built.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    mode: Mode,
    requested_command: String,
    script: String,
    raw_args: Vec<OsString>,
    argv: Vec<Option<OsString>>,
    env: Vec<(OsString, OsString)>,
}

impl InvocationContext {
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The whitelisted command this run is for.
    pub fn requested_command(&self) -> &str {
        &self.requested_command
    }

    /// Script handed to the dispatcher: the command itself in direct mode, the CGI driver otherwise.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Arguments exactly as the caller supplied them. Diagnostic use only.
    pub fn raw_args(&self) -> &[OsString] {
        &self.raw_args
    }

    /// Argument vector handed to the dispatcher. CGI mode has placeholder slots.
    pub fn argv(&self) -> &[Option<OsString>] {
        &self.argv
    }

    pub fn argc(&self) -> usize {
        self.argv.len()
    }

    /// Arguments forwarded to the dispatched script (`argv[2..]`).
    pub fn forwarded_args(&self) -> impl Iterator<Item = &OsString> {
        self.argv.iter().skip(2).flatten()
    }

    pub fn env(&self) -> &[(OsString, OsString)] {
        &self.env
    }
}

/// Resolve a direct invocation: `args[1]` is the command, `args[2..]` its arguments.
pub fn resolve_direct(
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    whitelist: &CommandWhitelist,
) -> Result<InvocationContext, WrapperError> {
    if args.len() < 2 {
        let program = args
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_PROGRAM.to_string());
        return Err(WrapperError::Usage { program });
    }

    // Non-UTF-8 can never equal a whitelist entry.
    let command = match args[1].to_str() {
        Some(c) if whitelist.is_valid(c) => c.to_string(),
        _ => {
            return Err(WrapperError::IllegalCommand {
                command: args[1].to_string_lossy().into_owned(),
            })
        }
    };

    log::debug!("resolved direct invocation of {}", command);
    let argv = args.iter().cloned().map(Some).collect();
    Ok(InvocationContext {
        mode: Mode::Direct,
        script: command.clone(),
        requested_command: command,
        raw_args: args,
        argv,
        env,
    })
}

/// Resolve a CGI invocation for the build-time `script`. Caller-supplied `args` are kept
/// for diagnostics but never reach the dispatcher.
pub fn resolve_cgi(
    script: &str,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
) -> InvocationContext {
    log::debug!("resolved CGI invocation of {}", script);
    InvocationContext {
        mode: Mode::CgiFixed,
        requested_command: script.to_string(),
        script: CGI_DRIVER.to_string(),
        raw_args: args,
        argv: vec![None, None, Some(OsString::from(script))],
        env,
    }
}
