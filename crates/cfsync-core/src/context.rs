//! Named account contexts loaded from the platform CLI's YAML store.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ErrorCode;

/// Store file name looked up in the home directory.
pub const DEFAULT_STORE_FILE: &str = ".cfconfig";

/// Platform URL used when a context does not name one.
pub const DEFAULT_URL: &str = "https://g.codefresh.io";

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("unable to resolve path to HOME in order to load the default context store")]
    HomeUnresolved,

    #[error("context store was not found at \"{}\"", .path.display())]
    StoreNotFound { path: PathBuf },

    #[error("failed to read context store at \"{}\": {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid context store: {reason}")]
    InvalidStore { reason: String },

    #[error("context \"{name}\" was not found. Available options: {}", .available.join(", "))]
    UnknownContext { name: String, available: Vec<String> },
}

impl ContextError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::HomeUnresolved => ErrorCode::HomeUnresolved,
            Self::StoreNotFound { .. } => ErrorCode::ContextStoreNotFound,
            Self::Read { .. } | Self::InvalidStore { .. } => ErrorCode::ContextStoreInvalid,
            Self::UnknownContext { .. } => ErrorCode::UnknownContext,
        }
    }
}

/// One named set of credentials.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_url")]
    pub url: String,
    pub token: String,
    #[serde(default)]
    pub beta: bool,
    #[serde(default)]
    pub on_prem: bool,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("beta", &self.beta)
            .field("on_prem", &self.on_prem)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextStore {
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub contexts: BTreeMap<String, Context>,
}

impl ContextStore {
    /// Parse a store from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::InvalidStore`] when the document is not a
    /// mapping with a non-empty `current-context` and a `contexts` map.
    pub fn from_yaml(text: &str) -> Result<Self, ContextError> {
        let store: Self = serde_yaml::from_str(text).map_err(|err| ContextError::InvalidStore {
            reason: err.to_string(),
        })?;
        if store.current_context.trim().is_empty() {
            return Err(ContextError::InvalidStore {
                reason: "`current-context` is empty".to_string(),
            });
        }
        Ok(store)
    }

    /// Load the store from `path`, or from `$HOME/.cfconfig` when absent.
    ///
    /// # Errors
    ///
    /// Distinguishes a missing home directory, a missing file, an unreadable
    /// file and an invalid document.
    pub fn load(path: Option<&Path>) -> Result<Self, ContextError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                info!("path to context store was not set, using default path");
                default_store_path()?
            }
        };

        info!(path = %path.display(), "loading context store");
        let text = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ContextError::StoreNotFound { path: path.clone() }
            } else {
                ContextError::Read {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let store = Self::from_yaml(&text)?;
        info!(contexts = store.contexts.len(), "context store loaded");
        Ok(store)
    }

    /// Look up a context by name.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::UnknownContext`] listing every available name.
    pub fn context(&self, name: &str) -> Result<&Context, ContextError> {
        self.contexts
            .get(name)
            .ok_or_else(|| ContextError::UnknownContext {
                name: name.to_string(),
                available: self.names().map(str::to_string).collect(),
            })
    }

    /// Context names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }
}

/// `$HOME/.cfconfig`.
///
/// # Errors
///
/// Returns [`ContextError::HomeUnresolved`] when no home directory is known.
pub fn default_store_path() -> Result<PathBuf, ContextError> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_STORE_FILE))
        .ok_or(ContextError::HomeUnresolved)
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}
