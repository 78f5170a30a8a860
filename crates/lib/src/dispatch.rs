//! Dispatch: hand the validated invocation to the script interpreter.
//!
//! The production dispatcher replaces the process image, so the only thing it can ever
//! return is the reason it failed to.

use std::ffi::OsString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::caller::Authorized;
use crate::config::WrapperConfig;
use crate::error::WrapperError;
use crate::invocation::InvocationContext;

const PYTHONPATH: &str = "PYTHONPATH";

/// Variables never passed on to the interpreter. `PYTHONPATH` is replaced, not dropped.
const STRIPPED_VARS: &[&str] = &[PYTHONPATH, "PYTHONHOME"];
const STRIPPED_PREFIXES: &[&[u8]] = &[b"LD_", b"DYLD_"];

/// Runs the script named by an authorized invocation.
///
/// `Ok(())` means the collaborator finished the handoff in-process. A dispatcher that
/// replaces the process never returns it.
pub trait Dispatcher {
    fn run_script(
        &self,
        authorized: &Authorized,
        ctx: &InvocationContext,
    ) -> Result<(), WrapperError>;
}

/// Fully resolved interpreter command line for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPlan {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

/// Execs `<python> -S <script_dir>/<script> argv[2..]` with a sanitized environment.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    python: PathBuf,
    script_dir: PathBuf,
    module_dir: PathBuf,
}

impl ScriptRunner {
    pub fn new(python: PathBuf, script_dir: PathBuf, module_dir: PathBuf) -> Self {
        Self {
            python,
            script_dir,
            module_dir,
        }
    }

    pub fn from_config(config: &WrapperConfig) -> Self {
        Self::new(
            config.python.clone(),
            config.script_dir.clone(),
            config.module_dir.clone(),
        )
    }

    /// Build the command line and environment without running anything.
    pub fn plan(&self, ctx: &InvocationContext) -> DispatchPlan {
        let mut args = vec![
            OsString::from("-S"),
            self.script_dir.join(ctx.script()).into_os_string(),
        ];
        args.extend(ctx.forwarded_args().cloned());
        DispatchPlan {
            program: self.python.clone(),
            args,
            env: child_env(ctx.env(), &self.module_dir),
        }
    }

    /// Replace this process with the interpreter. Returns only on failure.
    pub fn exec(&self, _authorized: &Authorized, ctx: &InvocationContext) -> WrapperError {
        if let Err(e) = fix_real_gid() {
            return e;
        }
        let plan = self.plan(ctx);
        log::debug!("exec {} {:?}", plan.program.display(), plan.args);
        let err = command(&plan).exec();
        WrapperError::Exec(err)
    }
}

impl Dispatcher for ScriptRunner {
    fn run_script(
        &self,
        authorized: &Authorized,
        ctx: &InvocationContext,
    ) -> Result<(), WrapperError> {
        Err(self.exec(authorized, ctx))
    }
}

/// Command for a plan; the child sees only the plan's environment.
pub fn command(plan: &DispatchPlan) -> Command {
    let mut cmd = Command::new(&plan.program);
    cmd.args(&plan.args)
        .env_clear()
        .envs(plan.env.iter().map(|(k, v)| (k, v)));
    cmd
}

/// Scripts check the real gid, so it must match the wrapper's effective (setgid) group.
fn fix_real_gid() -> Result<(), WrapperError> {
    let egid = nix::unistd::getegid();
    // gid_t::MAX is (gid_t)-1: leave the effective gid unchanged.
    let ret = unsafe { libc::setregid(egid.as_raw(), libc::gid_t::MAX) };
    if ret != 0 {
        return Err(WrapperError::SetRegid(std::io::Error::last_os_error()));
    }
    Ok(())
}

/// Caller environment minus loader and interpreter overrides, plus our `PYTHONPATH`.
fn child_env(env: &[(OsString, OsString)], module_dir: &Path) -> Vec<(OsString, OsString)> {
    let mut out: Vec<(OsString, OsString)> = env
        .iter()
        .filter(|(key, _)| !is_stripped(key.as_bytes()))
        .cloned()
        .collect();
    out.push((
        OsString::from(PYTHONPATH),
        module_dir.as_os_str().to_os_string(),
    ));
    out
}

fn is_stripped(key: &[u8]) -> bool {
    STRIPPED_VARS.iter().any(|v| v.as_bytes() == key)
        || STRIPPED_PREFIXES.iter().any(|p| key.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invocation::{resolve_cgi, resolve_direct};
    use crate::whitelist::script_whitelist;

    fn runner() -> ScriptRunner {
        ScriptRunner::new(
            PathBuf::from("/usr/bin/python"),
            PathBuf::from("/opt/lists/scripts"),
            PathBuf::from("/opt/lists"),
        )
    }

    fn os(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn direct_plan_runs_the_named_script() {
        let ctx = resolve_direct(
            os(&["wrapper", "admin", "mylist"]),
            vec![],
            &script_whitelist(),
        )
        .unwrap();
        let plan = runner().plan(&ctx);
        assert_eq!(plan.program, PathBuf::from("/usr/bin/python"));
        assert_eq!(
            plan.args,
            os(&["-S", "/opt/lists/scripts/admin", "mylist"])
        );
    }

    #[test]
    fn cgi_plan_runs_driver_with_baked_script() {
        let ctx = resolve_cgi("listinfo", os(&["cgi", "rmlist", "x"]), vec![]);
        let plan = runner().plan(&ctx);
        assert_eq!(
            plan.args,
            os(&["-S", "/opt/lists/scripts/driver", "listinfo"])
        );
    }

    #[test]
    fn environment_is_sanitized() {
        let env = vec![
            (OsString::from("QUERY_STRING"), OsString::from("a=1")),
            (OsString::from("PYTHONPATH"), OsString::from("/evil")),
            (OsString::from("PYTHONHOME"), OsString::from("/evil")),
            (OsString::from("LD_PRELOAD"), OsString::from("/evil.so")),
            (OsString::from("DYLD_INSERT_LIBRARIES"), OsString::from("x")),
            (OsString::from("OLD_PWD"), OsString::from("/home")),
        ];
        let ctx = resolve_cgi("roster", vec![], env);
        let plan = runner().plan(&ctx);
        assert_eq!(
            plan.env,
            vec![
                (OsString::from("QUERY_STRING"), OsString::from("a=1")),
                (OsString::from("OLD_PWD"), OsString::from("/home")),
                (OsString::from("PYTHONPATH"), OsString::from("/opt/lists")),
            ]
        );
    }

    #[test]
    fn command_uses_only_plan_environment() {
        let ctx = resolve_cgi("roster", vec![], vec![]);
        let plan = runner().plan(&ctx);
        let cmd = command(&plan);
        assert_eq!(cmd.get_program(), plan.program.as_os_str());
        let envs: Vec<_> = cmd.get_envs().collect();
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].0, "PYTHONPATH");
    }
}
