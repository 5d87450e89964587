//! Cross-account team correspondence.
//!
//! Team ids are account-local. The two system teams exist in every account
//! under names that may differ, so they are matched by kind; ordinary teams
//! are matched by name.

use std::collections::HashMap;

use crate::error::{Result, SyncError};
use crate::model::{Team, TeamKind};

const DEFAULT_TEAM_KEY: &str = "$default";
const ADMIN_TEAM_KEY: &str = "$admin";

/// Source team id → target team id.
pub type TeamIdMap = HashMap<String, String>;

/// Kind-aware comparison key for a team.
#[must_use]
pub fn team_key(team: &Team) -> String {
    match team.kind() {
        TeamKind::Default => DEFAULT_TEAM_KEY.to_string(),
        TeamKind::Admin => ADMIN_TEAM_KEY.to_string(),
        TeamKind::Ordinary => team.name.clone(),
    }
}

/// Comparison keys for every team, in input order.
#[must_use]
pub fn team_keys(teams: &[Team]) -> Vec<String> {
    teams.iter().map(team_key).collect()
}

/// Map every source team onto its target counterpart.
///
/// # Errors
///
/// Returns [`SyncError::UnresolvedTeam`] for the first source team without a
/// counterpart, and [`SyncError::AmbiguousTeam`] when the target holds zero or
/// several teams of a needed system kind, or several teams sharing the name
/// of an ordinary source team.
pub fn map_team_ids(source_teams: &[Team], target_teams: &[Team]) -> Result<TeamIdMap> {
    let mut map = TeamIdMap::with_capacity(source_teams.len());

    for team in source_teams {
        let counterpart = match team.kind() {
            kind @ (TeamKind::Default | TeamKind::Admin) => {
                unique_system_team(target_teams, kind)?
            }
            TeamKind::Ordinary => unique_named_team(team, target_teams)?,
        };
        map.insert(team.id.clone(), counterpart.id.clone());
    }

    Ok(map)
}

fn unique_system_team(teams: &[Team], kind: TeamKind) -> Result<&Team> {
    let mut matches = teams.iter().filter(|team| team.kind() == kind);
    match (matches.next(), matches.next()) {
        (Some(team), None) => Ok(team),
        (first, second) => Err(SyncError::AmbiguousTeam {
            selector: format!("kind {kind:?}").to_lowercase(),
            found: usize::from(first.is_some()) + usize::from(second.is_some()) + matches.count(),
        }),
    }
}

fn unique_named_team<'a>(source: &Team, teams: &'a [Team]) -> Result<&'a Team> {
    let mut matches = teams
        .iter()
        .filter(|team| team.kind() == TeamKind::Ordinary && team.name == source.name);
    match (matches.next(), matches.next()) {
        (Some(team), None) => Ok(team),
        (None, _) => Err(SyncError::UnresolvedTeam {
            id: source.id.clone(),
            team: source.name.clone(),
        }),
        (Some(_), Some(_)) => Err(SyncError::AmbiguousTeam {
            selector: format!("name \"{}\"", source.name),
            found: 2 + matches.count(),
        }),
    }
}
