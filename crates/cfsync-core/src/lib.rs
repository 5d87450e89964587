//! cfsync-core library.
//!
//! Reconciliation engine for users, admins, teams and authorization rules
//! between two platform accounts.
//!
//! # Conventions
//!
//! - **Errors**: Typed `thiserror` enums; every fatal error maps to an
//!   [`ErrorCode`](error::ErrorCode).
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod batch;
pub mod context;
pub mod diff;
pub mod directory;
pub mod error;
pub mod model;
pub mod rules;
pub mod teams;
pub mod workflow;

pub use directory::{AccountDirectory, DirectoryError, DirectoryResult};
pub use error::{ErrorCode, Result, SyncError};
pub use workflow::{
    Command, CompareReport, Confirm, CopyReport, Mode, Prompt, Reconciler, Report, Resource,
    WorkflowOutcome,
};
