//! `cfsync contexts`: list the profiles of the context store.

use std::io::{self, Write};
use std::path::Path;

use cfsync_core::context::ContextStore;
use clap::Args;
use serde::Serialize;

use crate::output::{OutputMode, Renderable, pretty_section, render_item};

/// Arguments for `cfsync contexts`.
#[derive(Args, Debug, Default)]
pub struct ContextsArgs {}

#[derive(Debug, Serialize)]
struct ContextEntry {
    name: String,
    url: String,
    #[serde(rename = "type")]
    kind: String,
    current: bool,
}

#[derive(Debug, Serialize)]
struct ContextsOutput {
    current_context: String,
    contexts: Vec<ContextEntry>,
}

impl From<&ContextStore> for ContextsOutput {
    fn from(store: &ContextStore) -> Self {
        let contexts = store
            .contexts
            .iter()
            .map(|(name, context)| ContextEntry {
                name: name.clone(),
                url: context.url.clone(),
                kind: context.kind.clone(),
                current: *name == store.current_context,
            })
            .collect();
        Self {
            current_context: store.current_context.clone(),
            contexts,
        }
    }
}

impl Renderable for ContextsOutput {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_section(w, "Contexts")?;
        for entry in &self.contexts {
            let marker = if entry.current { "*" } else { " " };
            writeln!(w, "{marker} {:<24} {}", entry.name, entry.url)?;
        }
        Ok(())
    }

    fn render_text(&self, w: &mut dyn Write) -> io::Result<()> {
        for entry in &self.contexts {
            let marker = if entry.current { "*" } else { "-" };
            writeln!(w, "{marker} {} {}", entry.name, entry.url)?;
        }
        Ok(())
    }
}

/// Execute `cfsync contexts`.
///
/// # Errors
///
/// Fails when the context store cannot be loaded or stdout is closed.
pub fn run_contexts(
    _args: &ContextsArgs,
    output: OutputMode,
    store_path: Option<&Path>,
) -> anyhow::Result<()> {
    let store = ContextStore::load(store_path)?;
    render_item(&ContextsOutput::from(&store), output)?;
    Ok(())
}
