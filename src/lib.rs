//! Hotsheet Sync - reconcile product hotsheets against ERP extracts
//!
//! A hotsheet is a per-product tracking workbook with one row per SKU, split
//! into sections (worksheets). This library matches those rows against
//! inventory, purchase-order, BN, stock and sales extracts and writes the
//! figures back into the hotsheet in place.
//!
//! # Features
//!
//! - Column layouts per product and section, built in or loaded from YAML
//! - Indexed matching for inventory, PO and BN extracts
//! - Forward-scan matching for the legacy stock and sales extracts
//! - Kit multipliers, back-order substitution and BN overlay subtraction
//! - One log file per run with every comparison and skipped row
//!
//! # Example
//!
//! ```no_run
//! use hotsheet_sync::logging::RunLog;
//! use hotsheet_sync::{LayoutRegistry, Reconciler, RunInputs};
//! use std::path::PathBuf;
//!
//! let registry = LayoutRegistry::builtin()?;
//! let inputs = RunInputs {
//!     hotsheet: PathBuf::from("BJP_hotsheet.xlsx"),
//!     inventory: Some(PathBuf::from("inventory.xlsx")),
//!     purchase_orders: Some(PathBuf::from("po.xlsx")),
//!     ..RunInputs::default()
//! };
//!
//! let summary = Reconciler::new(&registry, "BJP", "all")?.run(&inputs, &RunLog::discard())?;
//! println!("Updated {} rows", summary.rows_updated());
//! # Ok::<(), hotsheet_sync::HotsheetError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod numeric;
pub mod progress;
pub mod reconcile;
pub mod workbook;

// Re-export commonly used types
pub use config::LayoutRegistry;
pub use error::{HotsheetError, HotsheetResult};
pub use reconcile::{Reconciler, RunInputs, RunState, RunSummary};
