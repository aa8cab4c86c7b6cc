// crates/rls-verify-cli/src/main.rs
// ============================================================================
// Module: RLS Verify CLI Entry Point
// Description: Command dispatcher for RLS verification runs and diagnostics.
// Purpose: Provide a localized CLI that maps run verdicts to exit codes.
// Dependencies: clap, rls-verify-core, rls-verify-config, thiserror, time.
// ============================================================================

//! ## Overview
//! `rls-verify run` discovers reference data with the service key, then
//! exercises each selected role against the live policies and exits non-zero
//! when any assertion fails. `discover` and `config validate` are read-only
//! diagnostics. All user-facing strings are routed through the i18n catalog.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use rls_verify_cli::console::ConsoleSink;
use rls_verify_cli::console::RULE;
use rls_verify_cli::console::join_or_none;
use rls_verify_cli::t;
use rls_verify_config::HarnessConfig;
use rls_verify_core::FanoutSink;
use rls_verify_core::Harness;
use rls_verify_core::JsonLinesSink;
use rls_verify_core::ProbeError;
use rls_verify_core::ResultTracker;
use rls_verify_core::Role;
use rls_verify_core::RunOutcome;
use rls_verify_core::RunPlan;
use rls_verify_core::RunReport;
use rls_verify_core::Suite;
use thiserror::Error;
use time::OffsetDateTime;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "rls-verify", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the verification plan against the configured backend.
    Run(RunCommand),
    /// Load reference data and report per-role user availability.
    Discover(DiscoverCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an rls-verify configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for a verification run.
#[derive(Args, Debug)]
struct RunCommand {
    /// Optional config file path (defaults to rls-verify.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Restrict the run to these roles (repeatable).
    #[arg(long = "role", value_name = "ROLE")]
    roles: Vec<Role>,
    /// Restrict the run to these suites (repeatable).
    #[arg(long = "suite", value_name = "SUITE")]
    suites: Vec<Suite>,
    /// Directory receiving summary.json and summary.md.
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,
    /// JSON Lines file receiving every progress event.
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
}

/// Arguments for discovery.
#[derive(Args, Debug)]
struct DiscoverCommand {
    /// Optional config file path (defaults to rls-verify.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to rls-verify.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command),
        Commands::Discover(command) => command_discover(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Prints CLI help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
fn command_run(command: RunCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let endpoint = config
        .to_endpoint()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let plan = resolve_plan(&config, command.roles, command.suites);
    let report_dir = command.report_dir.or_else(|| config.report.dir.clone());
    let events_path = command.events.or_else(|| config.events.path.clone());

    let mut sink = FanoutSink::new().with(Box::new(ConsoleSink::stdout()));
    if let Some(path) = &events_path {
        let events = JsonLinesSink::new(path).map_err(|err| {
            CliError::new(t!("run.events_failed", path = path.display(), error = err))
        })?;
        sink = sink.with(Box::new(events));
    }

    write_stdout_line(&t!("run.header"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(RULE).map_err(|err| CliError::new(output_error("stdout", &err)))?;

    let harness = Harness::new(endpoint)
        .map_err(|err| CliError::new(t!("run.setup_failed", error = err)))?;
    let started = OffsetDateTime::now_utc();
    let mut tracker = ResultTracker::new(&sink);
    let mut outcome = RunOutcome::default();
    let result = harness.run(&plan, &mut tracker, &mut outcome);
    let ended = OffsetDateTime::now_utc();

    match result {
        Ok(()) => {
            let all_passed = tracker.summarize();
            if let Some(dir) = &report_dir {
                let report = RunReport::new(started, ended, tracker.summary(), &outcome)
                    .map_err(|err| report_error(dir, &err))?;
                write_report(dir, &report)?;
            }
            Ok(if all_passed { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Err(fatal) => {
            if let Some(dir) = &report_dir {
                let written = RunReport::new(started, ended, tracker.summary(), &outcome)
                    .map_err(|err| report_error(dir, &err))
                    .and_then(|report| write_report(dir, &report.aborted(fatal.to_string())));
                if let Err(err) = written {
                    let _ = write_stderr_line(&err.to_string());
                }
            }
            Err(CliError::new(t!("run.fatal", error = fatal)))
        }
    }
}

/// Applies CLI role/suite filters over the configured plan.
fn resolve_plan(config: &HarnessConfig, roles: Vec<Role>, suites: Vec<Suite>) -> RunPlan {
    let mut plan = config.to_plan();
    if !roles.is_empty() {
        plan.roles = roles;
    }
    if !suites.is_empty() {
        plan.suites = suites;
    }
    plan
}

/// Writes the run report and announces its location.
fn write_report(dir: &Path, report: &RunReport) -> CliResult<()> {
    report.write(dir).map_err(|err| report_error(dir, &err))?;
    write_stdout_line(&t!("run.report_written", path = dir.display()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Formats a report failure.
fn report_error(dir: &Path, error: &ProbeError) -> CliError {
    CliError::new(t!("run.report_failed", path = dir.display(), error = error))
}

// ============================================================================
// SECTION: Discover Command
// ============================================================================

/// Executes the `discover` command.
fn command_discover(command: &DiscoverCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let endpoint = config
        .to_endpoint()
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let harness = Harness::new(endpoint)
        .map_err(|err| CliError::new(t!("run.setup_failed", error = err)))?;
    let sink = ConsoleSink::stdout();
    let fixture =
        harness.discover(&sink).map_err(|err| CliError::new(t!("run.fatal", error = err)))?;

    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line(&t!("discover.roles"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    for role in Role::ALL {
        let line = fixture.find_user_by_role(role).map_or_else(
            || t!("discover.role_missing", role = role),
            |user| {
                t!(
                    "discover.role_user",
                    role = role,
                    email = user.email,
                    groups = join_or_none(fixture.groups_of(&user.id))
                )
            },
        );
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
    }
}

/// Executes the config validation command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let _config = load_config(command.config.as_deref())?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads and validates configuration.
fn load_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    HarnessConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
