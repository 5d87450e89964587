//! Wire-level snapshots of accounts, users, teams and rules.
//!
//! Field names follow the platform's JSON payloads; every type is an
//! immutable snapshot fetched once per workflow run.

use serde::{Deserialize, Serialize};

/// An account the authenticated identity belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub admins: Vec<String>,
}

/// The identity behind a context's token, with all of its accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub account: Vec<Account>,
    pub active_account_name: String,
}

impl CurrentUser {
    /// The account the token currently operates on.
    #[must_use]
    pub fn active_account(&self) -> Option<&Account> {
        self.account
            .iter()
            .find(|account| account.name == self.active_account_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    pub email: String,
    #[serde(default)]
    pub account: Vec<String>,
}

/// Discriminates the two system teams from ordinary named teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamKind {
    Default,
    Admin,
    #[serde(other)]
    Ordinary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TeamKind>,
}

impl Team {
    /// Kind of the team; absent discriminants are ordinary teams.
    #[must_use]
    pub fn kind(&self) -> TeamKind {
        self.kind.unwrap_or(TeamKind::Ordinary)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    #[serde(rename = "Fn")]
    pub function: String,
    pub args: RuleConditionArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConditionArgs {
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A raw authorization rule as stored in one account.
///
/// `role` is the owning team's id and is only meaningful inside that account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub action: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_resource: Option<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RuleCondition>,
    pub role: String,
}

/// Payload for inviting a user into an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub user_details: String,
}

/// A team as echoed back by team creation.
///
/// Unlike listed teams, members come back as bare user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTeam {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

/// Payload for creating a team; `users` holds target-account user ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTeam {
    pub name: String,
    pub tags: Vec<String>,
    pub users: Vec<String>,
}
