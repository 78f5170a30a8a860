use std::cell::RefCell;
use std::ffi::OsString;

use anyhow::Context;
use clap::{Parser, Subcommand};
use listgate::caller::{Authorized, ProcessGroupCheck};
use listgate::config::{WrapperConfig, CGI_DRIVER, CGI_SCRIPT};
use listgate::dispatch::{DispatchPlan, Dispatcher, ScriptRunner};
use listgate::error::WrapperError;
use listgate::invocation::{InvocationContext, Mode};
use listgate::launcher::Launcher;
use listgate::whitelist::script_whitelist;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "listgate")]
#[command(about = "Inspect the listgate wrapper build", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Print the configuration compiled into the wrappers, with the command whitelist.
    Config,

    /// Report whether a command is on the whitelist.
    Check {
        /// Command name, compared exactly.
        command: String,
    },

    /// Run an invocation through every check the wrapper performs, then print the
    /// interpreter command line instead of executing it.
    Test {
        /// Resolve as the CGI wrapper (baked-in script) instead of the direct wrapper.
        #[arg(long)]
        cgi: bool,

        /// Arguments as the wrapper would receive them after its program name.
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("listgate {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Config) => {
            if let Err(e) = run_config() {
                log::error!("config failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Check { command }) => {
            if !run_check(&command) {
                std::process::exit(1);
            }
        }
        Some(Commands::Test { cgi, args }) => match run_test(cgi, args) {
            Ok(status) => std::process::exit(status),
            Err(e) => {
                log::error!("test failed: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildReport {
    direct: WrapperConfig,
    cgi: WrapperConfig,
    cgi_driver: &'static str,
    whitelist: &'static [&'static str],
}

fn run_config() -> anyhow::Result<()> {
    let report = BuildReport {
        direct: WrapperConfig::from_build(Mode::Direct),
        cgi: WrapperConfig::from_build(Mode::CgiFixed),
        cgi_driver: CGI_DRIVER,
        whitelist: script_whitelist().entries(),
    };
    let json = serde_json::to_string_pretty(&report).context("serialize build config")?;
    println!("{}", json);
    Ok(())
}

fn run_check(command: &str) -> bool {
    if script_whitelist().is_valid(command) {
        println!("{}: allowed", command);
        true
    } else {
        eprintln!(
            "{}",
            WrapperError::IllegalCommand {
                command: command.to_string()
            }
        );
        false
    }
}

/// Dispatcher that records the plan it would have executed.
struct DryRun {
    runner: ScriptRunner,
    plan: RefCell<Option<DispatchPlan>>,
}

impl Dispatcher for DryRun {
    fn run_script(
        &self,
        _authorized: &Authorized,
        ctx: &InvocationContext,
    ) -> Result<(), WrapperError> {
        *self.plan.borrow_mut() = Some(self.runner.plan(ctx));
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TestReport {
    mode: Mode,
    status: i32,
    message: Option<String>,
    plan: Option<PlanReport>,
}

#[derive(Serialize)]
struct PlanReport {
    program: String,
    args: Vec<String>,
    env: Vec<String>,
}

impl From<&DispatchPlan> for PlanReport {
    fn from(plan: &DispatchPlan) -> Self {
        Self {
            program: plan.program.display().to_string(),
            args: plan
                .args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            env: plan
                .env
                .iter()
                .map(|(k, v)| format!("{}={}", k.to_string_lossy(), v.to_string_lossy()))
                .collect(),
        }
    }
}

/// Returns the exit status the wrapper would have reported.
fn run_test(cgi: bool, args: Vec<OsString>) -> anyhow::Result<i32> {
    let mode = if cgi { Mode::CgiFixed } else { Mode::Direct };
    let config = WrapperConfig::from_build(mode);
    let dry_run = DryRun {
        runner: ScriptRunner::from_config(&config),
        plan: RefCell::new(None),
    };
    let launcher = Launcher::new(&config, script_whitelist(), ProcessGroupCheck, dry_run);

    let program = if cgi { "listgate-cgi" } else { "listgate-wrapper" };
    let mut argv = vec![OsString::from(program)];
    argv.extend(args);
    let env: Vec<(OsString, OsString)> = std::env::vars_os().collect();

    let outcome = match mode {
        Mode::Direct => launcher.run_direct(argv, env),
        Mode::CgiFixed => launcher.run_cgi(CGI_SCRIPT, argv, env),
    };

    let plan = launcher.dispatcher().plan.borrow_mut().take();
    let report = TestReport {
        mode,
        status: outcome.status_code(),
        message: outcome.message(),
        plan: plan.as_ref().map(PlanReport::from),
    };
    let json = serde_json::to_string_pretty(&report).context("serialize test report")?;
    println!("{}", json);
    Ok(report.status)
}
