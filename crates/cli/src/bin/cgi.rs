//! CGI wrapper. Built once per script (`LISTGATE_CGI_SCRIPT`); the web server's argv
//! never selects what runs.

use listgate::caller::ProcessGroupCheck;
use listgate::config::{WrapperConfig, CGI_SCRIPT};
use listgate::dispatch::ScriptRunner;
use listgate::invocation::Mode;
use listgate::launcher::Launcher;
use listgate::report::Reporter;
use listgate::whitelist::script_whitelist;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = WrapperConfig::from_build(Mode::CgiFixed);
    let reporter = Reporter::new(config.log_ident.clone(), Mode::CgiFixed);
    let launcher = Launcher::new(
        &config,
        script_whitelist(),
        ProcessGroupCheck,
        ScriptRunner::from_config(&config),
    );

    let outcome = launcher.run_cgi(
        CGI_SCRIPT,
        std::env::args_os().collect(),
        std::env::vars_os().collect(),
    );
    reporter.terminate(outcome)
}
