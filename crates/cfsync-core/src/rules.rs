//! Account-independent rule representation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::model::{Rule, Team};
use crate::teams::map_team_ids;

/// A rule with its owning team remapped into the target account.
///
/// Field order is fixed by declaration, which makes [`canonical_key`]
/// stable. The same value is submitted as the creation payload.
///
/// [`canonical_key`]: CanonicalRule::canonical_key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRule {
    pub teams: Vec<String>,
    pub actions: Vec<String>,
    pub tags: Vec<String>,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_resource: Option<String>,
}

impl CanonicalRule {
    /// Deterministic serialization used as the diff key.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Encode`] if serialization fails.
    pub fn canonical_key(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Normalize `rules` owned by an account whose teams are `owner_teams`,
/// remapping team references into the id space of `target_teams`.
///
/// Pass the target's own teams as both arguments to normalize target rules,
/// so that both sides of a comparison share one id space.
///
/// # Errors
///
/// Fails when the team mapping cannot be built, or with
/// [`SyncError::UnresolvedRole`] when a rule's owning team is not among
/// `owner_teams`.
pub fn normalize_rules(
    rules: &[Rule],
    owner_teams: &[Team],
    target_teams: &[Team],
) -> Result<Vec<CanonicalRule>> {
    let team_ids = map_team_ids(owner_teams, target_teams)?;

    rules
        .iter()
        .map(|rule| -> Result<CanonicalRule> {
            let team = team_ids
                .get(&rule.role)
                .ok_or_else(|| SyncError::UnresolvedRole {
                    rule: rule.id.clone(),
                    role: rule.role.clone(),
                })?;
            Ok(CanonicalRule {
                teams: vec![team.clone()],
                actions: vec![rule.action.clone()],
                tags: rule.attributes.clone(),
                resource: rule.resource.clone(),
                related_resource: rule.related_resource.clone(),
            })
        })
        .collect()
}
