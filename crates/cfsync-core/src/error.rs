use std::fmt;

use crate::context::ContextError;
use crate::directory::DirectoryError;

/// Machine-readable error codes for operator- and script-friendly reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    HomeUnresolved,
    ContextStoreNotFound,
    ContextStoreInvalid,
    UnknownContext,
    InteractiveRequired,
    DirectoryRequestFailed,
    ActiveAccountMissing,
    TeamParityViolated,
    TeamUnresolved,
    TeamAmbiguous,
    RoleUnresolved,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::HomeUnresolved => "E1001",
            Self::ContextStoreNotFound => "E1002",
            Self::ContextStoreInvalid => "E1003",
            Self::UnknownContext => "E1004",
            Self::InteractiveRequired => "E2001",
            Self::DirectoryRequestFailed => "E3001",
            Self::ActiveAccountMissing => "E3002",
            Self::TeamParityViolated => "E4001",
            Self::TeamUnresolved => "E4002",
            Self::TeamAmbiguous => "E4003",
            Self::RoleUnresolved => "E4004",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::HomeUnresolved => "Home directory could not be resolved",
            Self::ContextStoreNotFound => "Context store not found",
            Self::ContextStoreInvalid => "Context store is invalid",
            Self::UnknownContext => "Unknown context",
            Self::InteractiveRequired => "Confirmation requires a terminal",
            Self::DirectoryRequestFailed => "Account directory request failed",
            Self::ActiveAccountMissing => "Active account missing from current user",
            Self::TeamParityViolated => "Teams missing in target account",
            Self::TeamUnresolved => "Team has no counterpart in target account",
            Self::TeamAmbiguous => "Team counterpart is ambiguous",
            Self::RoleUnresolved => "Rule references an unknown team",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::HomeUnresolved => Some("Pass `--cfconfig-path` pointing at your context store."),
            Self::ContextStoreNotFound => {
                Some("Create the store with the platform CLI or pass `--cfconfig-path`.")
            }
            Self::ContextStoreInvalid => {
                Some("The store needs `current-context` and a `contexts` map.")
            }
            Self::UnknownContext => Some("Run `cfsync contexts` to list available contexts."),
            Self::InteractiveRequired => Some("Re-run with `--yes` to skip confirmation prompts."),
            Self::DirectoryRequestFailed => {
                Some("Check the context URL and token, then retry.")
            }
            Self::ActiveAccountMissing => {
                Some("Switch the token's active account and retry.")
            }
            Self::TeamParityViolated => Some(
                "Proceeding is impossible until teams are synced. Run `cfsync compare teams` for details.",
            ),
            Self::TeamUnresolved | Self::RoleUnresolved => {
                Some("Run `cfsync compare teams` and copy missing teams first.")
            }
            Self::TeamAmbiguous => {
                Some("Each account must hold exactly one team per system kind and unique team names.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal workflow errors.
///
/// Per-item failures inside a copy batch are never surfaced through this
/// type; they are folded into the copy report instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("{0}")]
    Directory(#[from] DirectoryError),

    #[error("active account \"{name}\" is not among the current user's accounts")]
    ActiveAccountMissing { name: String },

    #[error("some teams are missing in target account: {}", .missing.len())]
    TeamParity { missing: Vec<String> },

    #[error("team \"{team}\" ({id}) has no counterpart in target account")]
    UnresolvedTeam { id: String, team: String },

    #[error("expected exactly one target team matching {selector}, found {found}")]
    AmbiguousTeam { selector: String, found: usize },

    #[error("rule {rule} references unknown team {role}")]
    UnresolvedRole { rule: String, role: String },

    #[error("confirmation requires an interactive terminal")]
    NotInteractive,

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("failed to encode canonical rule: {0}")]
    Encode(#[from] serde_json::Error),
}

impl SyncError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Context(err) => err.code(),
            Self::Directory(_) => ErrorCode::DirectoryRequestFailed,
            Self::ActiveAccountMissing { .. } => ErrorCode::ActiveAccountMissing,
            Self::TeamParity { .. } => ErrorCode::TeamParityViolated,
            Self::UnresolvedTeam { .. } => ErrorCode::TeamUnresolved,
            Self::AmbiguousTeam { .. } => ErrorCode::TeamAmbiguous,
            Self::UnresolvedRole { .. } => ErrorCode::RoleUnresolved,
            Self::NotInteractive => ErrorCode::InteractiveRequired,
            Self::Prompt(_) | Self::Encode(_) => ErrorCode::InternalUnexpected,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
