pub mod completions;
pub mod contexts;
pub mod reconcile;
