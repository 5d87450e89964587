//! The remote account surface consumed by the workflows.
//!
//! The engine never sees the transport. Anything that can answer these calls
//! for one account context (an HTTP client, an in-memory fake) can drive a
//! reconciliation.

use async_trait::async_trait;

use crate::model::{CreateTeam, CreateUser, CreatedTeam, CurrentUser, Rule, Team, User};
use crate::rules::CanonicalRule;

/// Failure of a single directory call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// The platform answered with a non-success status.
    #[error("{status}, {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body did not match the expected payload.
    #[error("unexpected response payload: {0}")]
    Decode(String),
}

impl DirectoryError {
    /// HTTP-like status, when the platform produced one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read and mutate one account's users, teams and rules.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// The authenticated identity and all of its accounts.
    async fn current_user(&self) -> DirectoryResult<CurrentUser>;

    async fn teams(&self) -> DirectoryResult<Vec<Team>>;

    async fn users(&self, account_id: &str) -> DirectoryResult<Vec<User>>;

    async fn create_team(&self, team: &CreateTeam) -> DirectoryResult<CreatedTeam>;

    /// Invite a user into `account_id`; the platform issues the new id.
    async fn add_user(&self, account_id: &str, user: &CreateUser) -> DirectoryResult<User>;

    async fn set_user_as_admin(
        &self,
        account_id: &str,
        user_id: &str,
    ) -> DirectoryResult<serde_json::Value>;

    async fn rules(&self) -> DirectoryResult<Vec<Rule>>;

    /// Create every rule of `rules` in one request.
    async fn create_rules(&self, rules: &[CanonicalRule]) -> DirectoryResult<serde_json::Value>;
}
