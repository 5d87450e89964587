//! `cfsync compare <resource>` and `cfsync copy <resource>`.

use std::io::{self, Write};
use std::num::NonZeroUsize;
use std::path::Path;

use cfsync_core::batch::DEFAULT_BATCH_SIZE;
use cfsync_core::context::ContextStore;
use cfsync_core::{Command, Mode, Reconciler, Resource, SyncError, WorkflowOutcome};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::http::HttpDirectory;
use crate::output::{OutputMode, Renderable, render_item};
use crate::prompt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceArg {
    Users,
    Admins,
    Teams,
    Rules,
}

impl From<ResourceArg> for Resource {
    fn from(arg: ResourceArg) -> Self {
        match arg {
            ResourceArg::Users => Self::Users,
            ResourceArg::Admins => Self::Admins,
            ResourceArg::Teams => Self::Teams,
            ResourceArg::Rules => Self::Rules,
        }
    }
}

/// Arguments shared by `cfsync compare` and `cfsync copy`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Resource to reconcile.
    #[arg(value_enum)]
    pub resource: ResourceArg,

    /// Context of the source account.
    #[arg(long)]
    pub context_from: String,

    /// Context of the target account.
    #[arg(long)]
    pub context_to: String,

    /// Maximum number of mutating requests in flight.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: NonZeroUsize,
}

#[derive(Debug, Serialize)]
struct Declined {
    command: String,
    declined: bool,
}

impl Renderable for Declined {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Aborted \"{}\"; nothing was changed.", self.command)
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "aborted")
    }
}

/// Execute one compare or copy workflow.
///
/// # Errors
///
/// Configuration errors, a missing terminal without `--yes`, and fatal
/// workflow errors. Per-item copy failures are rendered, not returned.
pub fn run_reconcile(
    mode: Mode,
    args: &ReconcileArgs,
    output: OutputMode,
    store_path: Option<&Path>,
    assume_yes: bool,
) -> anyhow::Result<()> {
    let command = Command::new(mode, args.resource.into());

    let store = ContextStore::load(store_path)?;
    let source_context = store.context(&args.context_from)?;
    let target_context = store.context(&args.context_to)?;

    if !assume_yes && !prompt::is_interactive() {
        return Err(SyncError::NotInteractive.into());
    }

    let source = HttpDirectory::from_context(source_context).map_err(SyncError::from)?;
    let target = HttpDirectory::from_context(target_context).map_err(SyncError::from)?;
    let confirm = prompt::confirmer(assume_yes);

    info!(
        %command,
        from = %args.context_from,
        to = %args.context_to,
        batch_size = args.batch_size.get(),
        "starting workflow"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let reconciler =
        Reconciler::new(&source, &target, confirm.as_ref()).with_batch_size(args.batch_size);
    let outcome = runtime.block_on(reconciler.run(command))?;

    match outcome {
        WorkflowOutcome::Completed(report) => render_item(&report, output)?,
        WorkflowOutcome::Declined => render_item(
            &Declined {
                command: command.to_string(),
                declined: true,
            },
            output,
        )?,
    }
    Ok(())
}
