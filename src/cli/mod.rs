//! CLI command handlers

pub mod commands;

pub use commands::{copy, layouts, reconcile, ReconcileArgs};
