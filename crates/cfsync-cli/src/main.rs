#![forbid(unsafe_code)]

mod cmd;
mod http;
mod output;
mod prompt;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use cfsync_core::context::ContextError;
use cfsync_core::{Mode, SyncError};
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cfsync: reconcile users, admins, teams and rules between platform accounts",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `--json` and the FORMAT env var).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Answer yes to every confirmation prompt.
    #[arg(short, long, global = true)]
    yes: bool,

    /// Path to the context store (defaults to `$HOME/.cfconfig`).
    #[arg(long, global = true, value_name = "PATH")]
    cfconfig_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Compare a resource between two accounts",
        long_about = "Show which items are common, missing in target, or only present in target.",
        after_help = "EXAMPLES:\n    # Compare teams\n    cfsync compare teams --context-from staging --context-to prod\n\n    # Emit machine-readable output\n    cfsync compare rules --context-from staging --context-to prod --json"
    )]
    Compare(cmd::reconcile::ReconcileArgs),

    #[command(
        about = "Copy items missing in the target account",
        long_about = "Create every source item the target account lacks. Deletions are never propagated.",
        after_help = "EXAMPLES:\n    # Copy users\n    cfsync copy users --context-from staging --context-to prod\n\n    # Skip confirmation and use smaller batches\n    cfsync copy teams --context-from staging --context-to prod --yes --batch-size 5"
    )]
    Copy(cmd::reconcile::ReconcileArgs),

    #[command(
        about = "List the contexts of the context store",
        after_help = "EXAMPLES:\n    # List contexts\n    cfsync contexts\n\n    # Use another store\n    cfsync contexts --cfconfig-path ./cfconfig.yaml"
    )]
    Contexts(cmd::contexts::ContextsArgs),

    #[command(
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cfsync completions bash\n\n    # Generate zsh completions\n    cfsync completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn default_filter(verbose: bool, debug_env: bool) -> &'static str {
    if verbose || debug_env {
        "cfsync=debug,info"
    } else {
        "cfsync=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CFSYNC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose, env::var("DEBUG").is_ok()))
    });

    let format = env::var("CFSYNC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Typed errors keep their code and hint; anything else is rendered as-is.
fn cli_error(err: &anyhow::Error) -> CliError {
    if let Some(err) = err.downcast_ref::<SyncError>() {
        CliError::from(err)
    } else if let Some(err) = err.downcast_ref::<ContextError>() {
        CliError::from(err)
    } else {
        CliError::new(format!("{err:#}"))
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let store_path = cli.cfconfig_path.as_deref();
    match &cli.command {
        Commands::Compare(args) => {
            cmd::reconcile::run_reconcile(Mode::Compare, args, output, store_path, cli.yes)
        }
        Commands::Copy(args) => {
            cmd::reconcile::run_reconcile(Mode::Copy, args, output, store_path, cli.yes)
        }
        Commands::Contexts(args) => cmd::contexts::run_contexts(args, output, store_path),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!(?cli, "parsed arguments");

    let output = resolve_output_mode(cli.format, cli.json);
    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error = cli_error(&err);
            if render_error(output, &error).is_err() {
                eprintln!("error: {}", error.message);
            }
            ExitCode::FAILURE
        }
    }
}
