//! SKU matching between a hotsheet and an extract.
//!
//! Two strategies are used:
//!
//! - [`scan_forward`] walks an extract from a [`ScanPointer`] that only moves
//!   forward, assuming extract rows follow the hotsheet's order. Legacy stock
//!   and sales reconciliation rely on it.
//! - [`SkuIndex`] pre-indexes an extract by SKU, so the ordering assumption is
//!   not needed. Inventory, PO and BN reconciliation use it.
//!
//! Running off the end of an extract is never an error: the hotsheet row is
//! simply unmatched.

use crate::config::{Column, DuplicatePolicy, ValueOffset};
use crate::workbook::Grid;
use std::collections::HashMap;
use tracing::debug;

/// How a hotsheet SKU is compared with an extract SKU cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPredicate {
    /// Equal after trimming both sides; case-sensitive.
    Exact,
    /// The extract cell contains the hotsheet SKU. Cells listed in `skip`
    /// are header artifacts and never match.
    Substring { skip: Vec<String> },
}

impl MatchPredicate {
    pub fn matches(&self, hotsheet_sku: &str, extract_sku: &str) -> bool {
        let hotsheet_sku = hotsheet_sku.trim();
        if hotsheet_sku.is_empty() {
            return false;
        }
        match self {
            MatchPredicate::Exact => hotsheet_sku == extract_sku.trim(),
            MatchPredicate::Substring { skip } => {
                if skip.iter().any(|s| s == extract_sku) {
                    return false;
                }
                extract_sku.contains(hotsheet_sku)
            }
        }
    }
}

/// Next extract row a forward scan starts from (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPointer(u32);

impl Default for ScanPointer {
    fn default() -> Self {
        ScanPointer(1)
    }
}

impl ScanPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self) -> u32 {
        self.0
    }
}

/// Find the next extract row at or after `pointer` whose SKU cell matches.
///
/// On a match the pointer moves just past the matched row. Without one the
/// pointer is left where it was and `None` is returned.
pub fn scan_forward(
    grid: &Grid,
    sku_column: Column,
    hotsheet_sku: &str,
    predicate: &MatchPredicate,
    pointer: &mut ScanPointer,
) -> Option<u32> {
    for row in pointer.0..=grid.row_count() {
        let extract_sku = grid.cell(row, sku_column);
        if extract_sku.trim().is_empty() {
            continue;
        }
        debug!(
            "Comparing hotsheet SKU '{}' with extract SKU [{}] '{}'",
            hotsheet_sku, row, extract_sku
        );
        if predicate.matches(hotsheet_sku, extract_sku) {
            pointer.0 = row + 1;
            return Some(row);
        }
    }
    None
}

/// Row holding the values that belong to the SKU on `sku_row`.
///
/// Returns `None` when that row lies past the end of the extract.
pub fn value_row(grid: &Grid, offset: &ValueOffset, sku_row: u32) -> Option<u32> {
    let delta = match offset {
        ValueOffset::Fixed(n) => *n,
        ValueOffset::Probe(probe) => {
            if grid.trimmed(sku_row + probe.at, probe.column).is_empty() {
                probe.if_empty
            } else {
                probe.otherwise
            }
        }
    };
    let row = sku_row + delta;
    (row <= grid.row_count()).then_some(row)
}

/// Extract entries keyed by trimmed SKU.
#[derive(Debug, Clone)]
pub struct SkuIndex<T> {
    entries: HashMap<String, T>,
    policy: DuplicatePolicy,
    duplicates: usize,
}

impl<T> SkuIndex<T> {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            duplicates: 0,
        }
    }

    /// Add an entry; a repeated SKU is resolved by the duplicate policy.
    pub fn insert(&mut self, sku: &str, value: T) {
        let key = sku.trim().to_string();
        if self.entries.contains_key(&key) {
            self.duplicates += 1;
            debug!("Duplicate extract SKU '{}' ({:?})", key, self.policy);
            if self.policy == DuplicatePolicy::FirstWins {
                return;
            }
        }
        self.entries.insert(key, value);
    }

    pub fn get(&self, sku: &str) -> Option<&T> {
        self.entries.get(sku.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many inserts hit an existing SKU.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// An index entry whose numbers could not be read.
#[derive(Debug, Clone, PartialEq)]
pub enum Indexed<T> {
    Ready(T),
    Unreadable,
}
