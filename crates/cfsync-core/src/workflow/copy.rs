use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::compare::{canonical_keys, emails};
use super::{Prompt, Reconciler, Resource, WorkflowOutcome, take_by_keys};
use crate::batch::{Outcome, run_batched};
use crate::diff::diff;
use crate::error::Result;
use crate::model::{CreateTeam, CreateUser, Team};
use crate::rules::CanonicalRule;
use crate::teams::{team_key, team_keys};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopiedItem {
    pub key: String,
    /// Id issued by the target, when the call returns one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub key: String,
    pub reason: String,
}

/// Per-item result of a copy workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyReport {
    pub resource: Resource,
    /// Set when target already held every source item; no mutation was made.
    pub nothing_to_copy: bool,
    pub succeeded: Vec<CopiedItem>,
    pub failed: Vec<FailedItem>,
}

impl CopyReport {
    fn nothing_to_copy(resource: Resource) -> Self {
        info!("No {resource} to copy");
        Self {
            resource,
            nothing_to_copy: true,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    fn from_outcomes(
        resource: Resource,
        keys: Vec<String>,
        outcomes: Vec<Outcome<Option<String>>>,
    ) -> Self {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (key, outcome) in keys.into_iter().zip(outcomes) {
            match outcome {
                Outcome::Success(remote_id) => succeeded.push(CopiedItem { key, remote_id }),
                Outcome::Failure(reason) => failed.push(FailedItem { key, reason }),
            }
        }

        debug!(?succeeded, ?failed, "{resource} copy results");
        if !succeeded.is_empty() {
            info!("Successfully copied {} {resource}", succeeded.len());
        }
        if !failed.is_empty() {
            error!("Failed to copy {} {resource}", failed.len());
        }

        Self {
            resource,
            nothing_to_copy: false,
            succeeded,
            failed,
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

impl Reconciler<'_> {
    /// Invite every source user whose email is absent from target.
    ///
    /// # Errors
    ///
    /// Fetch failures are fatal; failed invitations land in the report.
    pub async fn copy_users(&self) -> Result<CopyReport> {
        let (source, target) = self.account_users().await?;
        info!("Found {} users in source account", source.users.len());

        let result = diff(&emails(&source.users), &emails(&target.users));
        info!("Found {} common users", result.common.len());
        if result.removed.is_empty() {
            return Ok(CopyReport::nothing_to_copy(Resource::Users));
        }
        info!("Found {} users missing in target account", result.removed.len());

        let to_copy = take_by_keys(&source.users, &result.removed, |user| user.email.clone());
        let requests: Vec<CreateUser> = to_copy
            .iter()
            .map(|user| CreateUser {
                user_details: user.email.clone(),
            })
            .collect();

        let directory = self.target;
        let account_id = target.account.id.as_str();
        let operations = requests.iter().map(|request| async move {
            directory
                .add_user(account_id, request)
                .await
                .map(|user| Some(user.id))
        });
        let outcomes = run_batched(operations, self.batch_size).await;

        let keys = requests.into_iter().map(|r| r.user_details).collect();
        Ok(CopyReport::from_outcomes(Resource::Users, keys, outcomes))
    }

    /// Promote every source admin id that target does not list as admin.
    ///
    /// The ids must already belong to users of the target account.
    ///
    /// # Errors
    ///
    /// Fetch failures are fatal; failed promotions land in the report.
    pub async fn copy_admins(&self) -> Result<CopyReport> {
        let (source, target) = self.active_accounts().await?;
        info!("Found {} admins in source account", source.admins.len());

        let result = diff(&source.admins, &target.admins);
        info!("Found {} common admins", result.common.len());
        if result.removed.is_empty() {
            return Ok(CopyReport::nothing_to_copy(Resource::Admins));
        }
        info!("Found {} admins missing in target account", result.removed.len());

        let directory = self.target;
        let account_id = target.id.as_str();
        let operations = result.removed.iter().map(|user_id| async move {
            directory
                .set_user_as_admin(account_id, user_id)
                .await
                .map(|_| None::<String>)
        });
        let outcomes = run_batched(operations, self.batch_size).await;

        Ok(CopyReport::from_outcomes(
            Resource::Admins,
            result.removed,
            outcomes,
        ))
    }

    /// Create every source team that has no counterpart in target.
    ///
    /// Members are resolved by email to target user ids. Asks for
    /// confirmation first when target lacks some source users.
    ///
    /// # Errors
    ///
    /// Fetch failures are fatal; rejected teams land in the report.
    pub async fn copy_teams(&self) -> Result<WorkflowOutcome<CopyReport>> {
        let (source, target) = self.account_users().await?;
        let users = diff(&emails(&source.users), &emails(&target.users));
        if !users.removed.is_empty() {
            let count = users.removed.len();
            warn!(
                missing = count,
                "Some users are missing in target account. Proceeding might result in data inconsistency; run \"compare users\" for details"
            );
            if !self.confirm.confirm(&Prompt::MissingUsers { count })? {
                info!("aborted by operator");
                return Ok(WorkflowOutcome::Declined);
            }
            info!("proceeding");
        }

        let (source_teams, target_teams) = self.teams().await?;
        info!("Found {} teams in source account", source_teams.len());

        let result = diff(&team_keys(&source_teams), &team_keys(&target_teams));
        info!(
            "Found {} common teams, including the default and admin teams",
            result.common.len()
        );
        if result.removed.is_empty() {
            return Ok(WorkflowOutcome::Completed(CopyReport::nothing_to_copy(
                Resource::Teams,
            )));
        }
        info!("Found {} teams missing in target account", result.removed.len());

        let target_ids: HashMap<&str, &str> = target
            .users
            .iter()
            .map(|user| (user.email.as_str(), user.id.as_str()))
            .collect();
        let requests: Vec<CreateTeam> = take_by_keys(&source_teams, &result.removed, team_key)
            .into_iter()
            .map(|team| team_request(team, &target_ids))
            .collect();

        let directory = self.target;
        let operations = requests.iter().map(|request| async move {
            directory
                .create_team(request)
                .await
                .map(|team| Some(team.id))
        });
        let outcomes = run_batched(operations, self.batch_size).await;

        let keys = requests.into_iter().map(|r| r.name).collect();
        Ok(WorkflowOutcome::Completed(CopyReport::from_outcomes(
            Resource::Teams,
            keys,
            outcomes,
        )))
    }

    /// Create every canonical source rule absent from target in one request.
    ///
    /// # Errors
    ///
    /// [`SyncError::TeamParity`](crate::error::SyncError::TeamParity) before
    /// any rule is fetched when target lacks a source team. A rejected
    /// creation request marks every rule in it as failed.
    pub async fn copy_rules(&self) -> Result<CopyReport> {
        let (source, target) = self.canonical_rules().await?;
        let source_keys = canonical_keys(&source)?;

        let result = diff(&source_keys, &canonical_keys(&target)?);
        info!("Found {} common rules", result.common.len());
        if result.removed.is_empty() {
            return Ok(CopyReport::nothing_to_copy(Resource::Rules));
        }

        let keyed: Vec<(String, &CanonicalRule)> = source_keys.into_iter().zip(&source).collect();
        let (keys, rules): (Vec<String>, Vec<CanonicalRule>) =
            take_by_keys(&keyed, &result.removed, |(key, _)| key.clone())
                .into_iter()
                .map(|(key, rule)| (key.clone(), (*rule).clone()))
                .unzip();
        info!("Found {} rules missing in target account", rules.len());

        let directory = self.target;
        let request = async { directory.create_rules(&rules).await.map(|_| None::<String>) };
        let outcomes = run_batched(std::iter::once(request), self.batch_size).await;

        let per_rule: Vec<_> = outcomes
            .into_iter()
            .flat_map(|outcome| std::iter::repeat_n(outcome, keys.len()))
            .collect();
        Ok(CopyReport::from_outcomes(Resource::Rules, keys, per_rule))
    }
}

fn team_request(team: &Team, target_ids: &HashMap<&str, &str>) -> CreateTeam {
    let mut unresolved = 0usize;
    let users = team
        .users
        .iter()
        .map(|member| match target_ids.get(member.email.as_str()) {
            Some(id) => (*id).to_string(),
            None => {
                unresolved += 1;
                member.id.clone()
            }
        })
        .collect();
    if unresolved > 0 {
        warn!(
            team = %team.name,
            unresolved,
            "team members missing in target account keep their source ids"
        );
    }

    CreateTeam {
        name: team.name.clone(),
        tags: team.tags.clone(),
        users,
    }
}
