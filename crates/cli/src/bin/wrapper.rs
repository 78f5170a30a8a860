//! Direct-mode wrapper: `listgate-wrapper <script> [args...]`.
//!
//! Installed setgid to the list manager's group; only a caller running as the configured
//! parent group gets through, and only for a whitelisted script.

use listgate::caller::ProcessGroupCheck;
use listgate::config::WrapperConfig;
use listgate::dispatch::ScriptRunner;
use listgate::invocation::Mode;
use listgate::launcher::Launcher;
use listgate::report::Reporter;
use listgate::whitelist::script_whitelist;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = WrapperConfig::from_build(Mode::Direct);
    let reporter = Reporter::new(config.log_ident.clone(), Mode::Direct);
    let launcher = Launcher::new(
        &config,
        script_whitelist(),
        ProcessGroupCheck,
        ScriptRunner::from_config(&config),
    );

    let outcome = launcher.run_direct(
        std::env::args_os().collect(),
        std::env::vars_os().collect(),
    );
    reporter.terminate(outcome)
}
