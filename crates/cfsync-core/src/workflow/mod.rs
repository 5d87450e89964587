//! Compare and copy workflows over a pair of account directories.
//!
//! Every workflow runs the same pipeline: preflight, fetch both sides
//! concurrently, normalize to comparison keys, diff, then either report or
//! copy the keys missing from the target.

mod compare;
mod copy;

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;
use tracing::{info, warn};

use crate::batch::DEFAULT_BATCH_SIZE;
use crate::directory::AccountDirectory;
use crate::error::{Result, SyncError};
use crate::model::{Account, Rule, Team, User};
use crate::rules::{CanonicalRule, normalize_rules};
use crate::teams::team_keys;

pub use compare::CompareReport;
pub use copy::{CopiedItem, CopyReport, FailedItem};

/// Kind of account state being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Admins,
    Teams,
    Rules,
}

impl Resource {
    pub const ALL: [Self; 4] = [Self::Users, Self::Admins, Self::Teams, Self::Rules];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Admins => "admins",
            Self::Teams => "teams",
            Self::Rules => "rules",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Compare,
    Copy,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compare => "compare",
            Self::Copy => "copy",
        })
    }
}

/// One workflow invocation, e.g. `copy users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Command {
    pub mode: Mode,
    pub resource: Resource,
}

impl Command {
    #[must_use]
    pub const fn new(mode: Mode, resource: Resource) -> Self {
        Self { mode, resource }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mode, self.resource)
    }
}

/// Questions a workflow may put to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    /// Asked once before any workflow starts.
    Proceed {
        command: Command,
        source_account: String,
        target_account: String,
    },
    /// Asked by `copy teams` when some source users are absent from target.
    MissingUsers { count: usize },
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed {
                command,
                source_account,
                target_account,
            } => write!(
                f,
                "Running \"{command}\" from account \"{source_account}\" to account \"{target_account}\". Do you want to proceed?"
            ),
            Self::MissingUsers { count } => write!(
                f,
                "Some users are missing in target account: {count}. Proceeding might result in data inconsistency; run \"compare users\" for details. Do you want to proceed?"
            ),
        }
    }
}

/// Operator confirmation seam.
pub trait Confirm {
    /// `Ok(false)` declines; errors abort the workflow.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotInteractive`] when no answer can be obtained.
    fn confirm(&self, prompt: &Prompt) -> Result<bool>;
}

/// Result of a workflow that may stop at a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome<R> {
    Completed(R),
    Declined,
}

impl<R> WorkflowOutcome<R> {
    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> WorkflowOutcome<T> {
        match self {
            Self::Completed(report) => WorkflowOutcome::Completed(f(report)),
            Self::Declined => WorkflowOutcome::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Report {
    Compare(CompareReport),
    Copy(CopyReport),
}

/// Drives the workflows between a source and a target account.
pub struct Reconciler<'a> {
    source: &'a dyn AccountDirectory,
    target: &'a dyn AccountDirectory,
    confirm: &'a dyn Confirm,
    batch_size: NonZeroUsize,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        source: &'a dyn AccountDirectory,
        target: &'a dyn AccountDirectory,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            source,
            target,
            confirm,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: NonZeroUsize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Confirm `command` against both active accounts, then run it.
    ///
    /// # Errors
    ///
    /// Any fatal workflow error. Per-item copy failures land in the report.
    pub async fn run(&self, command: Command) -> Result<WorkflowOutcome<Report>> {
        let (source, target) = self.active_accounts().await?;
        let prompt = Prompt::Proceed {
            command,
            source_account: source.name,
            target_account: target.name,
        };
        if !self.confirm.confirm(&prompt)? {
            info!(%command, "aborted by operator");
            return Ok(WorkflowOutcome::Declined);
        }

        let outcome = match (command.mode, command.resource) {
            (Mode::Compare, resource) => {
                WorkflowOutcome::Completed(Report::Compare(self.compare(resource).await?))
            }
            (Mode::Copy, Resource::Users) => {
                WorkflowOutcome::Completed(Report::Copy(self.copy_users().await?))
            }
            (Mode::Copy, Resource::Admins) => {
                WorkflowOutcome::Completed(Report::Copy(self.copy_admins().await?))
            }
            (Mode::Copy, Resource::Teams) => self.copy_teams().await?.map(Report::Copy),
            (Mode::Copy, Resource::Rules) => {
                WorkflowOutcome::Completed(Report::Copy(self.copy_rules().await?))
            }
        };
        Ok(outcome)
    }

    async fn compare(&self, resource: Resource) -> Result<CompareReport> {
        match resource {
            Resource::Users => self.compare_users().await,
            Resource::Admins => self.compare_admins().await,
            Resource::Teams => self.compare_teams().await,
            Resource::Rules => self.compare_rules().await,
        }
    }

    async fn active_accounts(&self) -> Result<(Account, Account)> {
        futures::try_join!(active_account(self.source), active_account(self.target))
    }

    async fn account_users(&self) -> Result<(AccountUsers, AccountUsers)> {
        futures::try_join!(account_users(self.source), account_users(self.target))
    }

    async fn teams(&self) -> Result<(Vec<Team>, Vec<Team>)> {
        Ok(futures::try_join!(self.source.teams(), self.target.teams())?)
    }

    /// Teams of both sides after verifying every source team exists in target.
    async fn teams_with_parity(&self) -> Result<(Vec<Team>, Vec<Team>)> {
        let (source_teams, target_teams) = self.teams().await?;
        let parity = crate::diff::diff(&team_keys(&source_teams), &team_keys(&target_teams));
        if !parity.removed.is_empty() {
            warn!(
                missing = parity.removed.len(),
                "some teams are missing in target account"
            );
            return Err(SyncError::TeamParity {
                missing: parity.removed,
            });
        }
        Ok((source_teams, target_teams))
    }

    /// Canonical rules of both sides, remapped into the target's team ids.
    async fn canonical_rules(&self) -> Result<(Vec<CanonicalRule>, Vec<CanonicalRule>)> {
        let (source_teams, target_teams) = self.teams_with_parity().await?;
        let (source_rules, target_rules): (Vec<Rule>, Vec<Rule>) =
            futures::try_join!(self.source.rules(), self.target.rules())?;
        info!("Found {} rules in source account", source_rules.len());

        let source = normalize_rules(&source_rules, &source_teams, &target_teams)?;
        let target = normalize_rules(&target_rules, &target_teams, &target_teams)?;
        Ok((source, target))
    }
}

struct AccountUsers {
    account: Account,
    users: Vec<User>,
}

async fn active_account(directory: &dyn AccountDirectory) -> Result<Account> {
    let user = directory.current_user().await?;
    user.active_account()
        .cloned()
        .ok_or_else(|| SyncError::ActiveAccountMissing {
            name: user.active_account_name.clone(),
        })
}

async fn account_users(directory: &dyn AccountDirectory) -> Result<AccountUsers> {
    let account = active_account(directory).await?;
    let users = directory.users(&account.id).await?;
    Ok(AccountUsers { account, users })
}

/// Select one item per occurrence of each key in `keys`, in `items` order.
fn take_by_keys<'t, T>(
    items: &'t [T],
    keys: &[String],
    key_of: impl Fn(&T) -> String,
) -> Vec<&'t T> {
    let mut wanted: HashMap<&str, usize> = HashMap::new();
    for key in keys {
        *wanted.entry(key.as_str()).or_default() += 1;
    }
    items
        .iter()
        .filter(|item| match wanted.get_mut(key_of(*item).as_str()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        })
        .collect()
}
