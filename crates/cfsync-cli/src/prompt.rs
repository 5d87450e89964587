//! Operator confirmation backed by the terminal.

use std::io::{self, IsTerminal};

use cfsync_core::workflow::{Confirm, Prompt};
use cfsync_core::{Result, SyncError};
use tracing::info;

/// `true` when prompts can be answered interactively.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal() && io::stderr().is_terminal()
}

/// Asks on the terminal; every prompt defaults to "no".
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &Prompt) -> Result<bool> {
        if !is_interactive() {
            return Err(SyncError::NotInteractive);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt.to_string())
            .default(false)
            .interact()
            .map_err(|err| SyncError::Prompt(err.to_string()))
    }
}

/// Accepts every prompt, for `--yes`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, prompt: &Prompt) -> Result<bool> {
        info!(%prompt, "confirmed by --yes");
        Ok(true)
    }
}

/// Pick the confirmation strategy for this invocation.
pub fn confirmer(assume_yes: bool) -> Box<dyn Confirm> {
    if assume_yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm)
    }
}
