use serde::Serialize;
use tracing::info;

use super::{Reconciler, Resource};
use crate::diff::{DiffResult, diff};
use crate::error::Result;
use crate::rules::CanonicalRule;
use crate::teams::team_keys;

/// Read-only view of how two accounts differ for one resource.
///
/// `removed` lists keys missing in target, `added` keys only target has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareReport {
    pub resource: Resource,
    pub common: Vec<String>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl CompareReport {
    fn new(resource: Resource, result: DiffResult<String>) -> Self {
        info!(
            %resource,
            common = result.common.len(),
            added = result.added.len(),
            removed = result.removed.len(),
            "comparison finished"
        );
        Self {
            resource,
            common: result.common,
            added: result.added,
            removed: result.removed,
        }
    }

    pub fn is_identical(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl Reconciler<'_> {
    /// Users keyed by email.
    ///
    /// # Errors
    ///
    /// Directory failures and a missing active account are fatal.
    pub async fn compare_users(&self) -> Result<CompareReport> {
        let (source, target) = self.account_users().await?;
        let result = diff(&emails(&source.users), &emails(&target.users));
        Ok(CompareReport::new(Resource::Users, result))
    }

    /// Admin user ids of both active accounts.
    ///
    /// # Errors
    ///
    /// Directory failures and a missing active account are fatal.
    pub async fn compare_admins(&self) -> Result<CompareReport> {
        let (source, target) = self.active_accounts().await?;
        Ok(CompareReport::new(
            Resource::Admins,
            diff(&source.admins, &target.admins),
        ))
    }

    /// Teams keyed by kind for system teams and by name otherwise.
    ///
    /// # Errors
    ///
    /// Directory failures are fatal.
    pub async fn compare_teams(&self) -> Result<CompareReport> {
        let (source, target) = self.teams().await?;
        Ok(CompareReport::new(
            Resource::Teams,
            diff(&team_keys(&source), &team_keys(&target)),
        ))
    }

    /// Rules keyed by their canonical form in the target's team id space.
    ///
    /// # Errors
    ///
    /// [`SyncError::TeamParity`](crate::error::SyncError::TeamParity) before
    /// any rule is fetched when target lacks a source team.
    pub async fn compare_rules(&self) -> Result<CompareReport> {
        let (source, target) = self.canonical_rules().await?;
        Ok(CompareReport::new(
            Resource::Rules,
            diff(&canonical_keys(&source)?, &canonical_keys(&target)?),
        ))
    }
}

pub(super) fn emails(users: &[crate::model::User]) -> Vec<String> {
    users.iter().map(|user| user.email.clone()).collect()
}

pub(super) fn canonical_keys(rules: &[CanonicalRule]) -> Result<Vec<String>> {
    rules.iter().map(CanonicalRule::canonical_key).collect()
}
