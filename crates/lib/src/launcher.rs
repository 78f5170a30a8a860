//! Launcher: runs the validation stages in order and produces the run's [`ExitOutcome`].
//!
//! Direct mode: arguments → whitelist → caller → dispatch.
//! CGI mode: caller → dispatch; the script is fixed at build time, so there is no
//! caller-supplied command to validate.

use std::ffi::OsString;

use crate::caller::{authorize, CallerCheck};
use crate::config::WrapperConfig;
use crate::dispatch::Dispatcher;
use crate::error::WrapperError;
use crate::invocation::{resolve_cgi, resolve_direct, InvocationContext};
use crate::outcome::ExitOutcome;
use crate::whitelist::CommandWhitelist;

pub struct Launcher<'a, C, D> {
    config: &'a WrapperConfig,
    whitelist: CommandWhitelist,
    caller: C,
    dispatcher: D,
}

impl<'a, C: CallerCheck, D: Dispatcher> Launcher<'a, C, D> {
    pub fn new(
        config: &'a WrapperConfig,
        whitelist: CommandWhitelist,
        caller: C,
        dispatcher: D,
    ) -> Self {
        Self {
            config,
            whitelist,
            caller,
            dispatcher,
        }
    }

    pub fn run_direct(
        &self,
        args: Vec<OsString>,
        env: Vec<(OsString, OsString)>,
    ) -> ExitOutcome {
        let result = resolve_direct(args, env, &self.whitelist)
            .and_then(|ctx| self.authorize_and_dispatch(&ctx));
        ExitOutcome::from(result)
    }

    /// Run the build-time `script`. `args` are accepted only to be ignored.
    pub fn run_cgi(
        &self,
        script: &str,
        args: Vec<OsString>,
        env: Vec<(OsString, OsString)>,
    ) -> ExitOutcome {
        let ctx = resolve_cgi(script, args, env);
        ExitOutcome::from(self.authorize_and_dispatch(&ctx))
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn authorize_and_dispatch(&self, ctx: &InvocationContext) -> Result<(), WrapperError> {
        let authorized = authorize(
            &self.caller,
            &self.config.log_ident,
            &self.config.parent_group,
            ctx.mode(),
        )?;
        log::debug!(
            "{}: dispatching {} for {} (caller argv {:?})",
            self.config.log_ident,
            ctx.script(),
            ctx.requested_command(),
            ctx.raw_args()
        );
        self.dispatcher.run_script(&authorized, ctx)
    }
}
