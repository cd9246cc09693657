//! Reconciliation engine.
//!
//! A [`Reconciler`] runs the reconcilers a product's sections call for:
//!
//! | Reconciler | Extract | Matching |
//! |------------|---------|----------|
//! | inventory  | inventory (+ BN) | SKU index |
//! | purchase-orders | PO | SKU index |
//! | stock      | legacy stock | forward scan, substring |
//! | sales      | legacy sales | forward scan, exact |
//!
//! The hotsheet is opened once, every extract is read and indexed once, and
//! the workbook is saved once at the end. Any fatal error leaves the file on
//! disk as it was.

mod inventory;
mod purchase_orders;
mod sales;
mod stock;

pub use inventory::{index_bn, index_inventory, InventoryFigures, InventoryReconciler};
pub use purchase_orders::{index_purchase_orders, PoLine, PoSlots, PurchaseOrderReconciler};
pub use sales::SalesReconciler;
pub use stock::StockReconciler;

use crate::config::{Column, LayoutRegistry, SectionLayout};
use crate::error::{HotsheetError, HotsheetResult};
use crate::logging::RunLog;
use crate::progress::ProgressBar;
use crate::workbook::{Grid, Hotsheet, SheetAccess};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Files for one run. Extracts a selected section does not use may be `None`.
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub hotsheet: PathBuf,
    pub inventory: Option<PathBuf>,
    pub purchase_orders: Option<PathBuf>,
    pub bn: Option<PathBuf>,
    pub stock: Option<PathBuf>,
    pub sales: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    ExtractsOpened,
    Indexed,
    RowsMatched,
    Saved,
    SavedWithWarnings,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotStarted => "not started",
            RunState::ExtractsOpened => "extracts opened",
            RunState::Indexed => "indexed",
            RunState::RowsMatched => "rows matched",
            RunState::Saved => "saved",
            RunState::SavedWithWarnings => "saved with warnings",
            RunState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Counts for one hotsheet section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionSummary {
    pub section: String,
    pub rows_scanned: usize,
    pub rows_updated: usize,
    pub rows_unmatched: usize,
    pub rows_skipped: usize,
    pub po_slots_written: usize,
    pub parse_errors: usize,
}

impl SectionSummary {
    pub fn new(section: &str) -> Self {
        Self {
            section: section.to_string(),
            ..Self::default()
        }
    }
}

/// Outcome of a run that reached the save step.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub product: String,
    pub selection: String,
    pub state: RunState,
    pub sections: Vec<SectionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl RunSummary {
    pub fn parse_errors(&self) -> usize {
        self.sections.iter().map(|s| s.parse_errors).sum()
    }

    pub fn rows_updated(&self) -> usize {
        self.sections.iter().map(|s| s.rows_updated).sum()
    }

    pub fn has_warnings(&self) -> bool {
        self.state == RunState::SavedWithWarnings
    }
}

/// Elapsed months of the year at `date`, counting the current month pro rata.
///
/// 15 March 2025 gives `2 + 15/31`.
pub fn month_fraction(date: NaiveDate) -> f64 {
    (date.month() - 1) as f64 + date.day() as f64 / days_in_month(date) as f64
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Non-blank SKUs of a section from `first_row` down, trimmed.
fn hotsheet_skus<S: SheetAccess>(
    sheet: &S,
    column: Column,
    first_row: u32,
) -> HotsheetResult<Vec<(u32, String)>> {
    let mut rows = Vec::new();
    for row in first_row..=sheet.last_row() {
        let sku = sheet.read_at(column, row)?;
        let sku = sku.trim();
        if !sku.is_empty() {
            rows.push((row, sku.to_string()));
        }
    }
    Ok(rows)
}

/// Extract grids needed by the selected sections.
#[derive(Default)]
struct Extracts {
    inventory: Option<Grid>,
    purchase_orders: Option<Grid>,
    bn: Option<Grid>,
    stock: Option<Grid>,
    sales: Option<Grid>,
}

fn required<'p>(path: &'p Option<PathBuf>, name: &'static str) -> HotsheetResult<&'p Path> {
    path.as_deref().ok_or(HotsheetError::MissingExtract(name))
}

/// Runs one product/selection against a hotsheet.
pub struct Reconciler<'a> {
    registry: &'a LayoutRegistry,
    product: String,
    selection: String,
    sections: Vec<&'a SectionLayout>,
    today: NaiveDate,
    show_progress: bool,
    state: RunState,
}

impl<'a> Reconciler<'a> {
    /// Resolve `product` and `selection` (a section slug, sheet name, or `all`).
    pub fn new(registry: &'a LayoutRegistry, product: &str, selection: &str) -> HotsheetResult<Self> {
        let (name, layout) = registry.product(product)?;
        let sections = layout.select(name, selection)?;
        Ok(Self {
            registry,
            product: name.to_string(),
            selection: if crate::config::is_all(selection) {
                "all".to_string()
            } else {
                selection.trim().to_string()
            },
            sections,
            today: Local::now().date_naive(),
            show_progress: false,
            state: RunState::NotStarted,
        })
    }

    /// Date used for the average-monthly figures (defaults to today).
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn sections(&self) -> &[&'a SectionLayout] {
        &self.sections
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Reconcile and save the hotsheet, logging into `log`.
    pub fn run(&mut self, inputs: &RunInputs, log: &RunLog) -> HotsheetResult<RunSummary> {
        let result = log.in_scope(|| self.execute(inputs));
        match result {
            Ok(mut summary) => {
                summary.log_file = log.path().map(Path::to_path_buf);
                Ok(summary)
            }
            Err(e) => {
                log.in_scope(|| {
                    self.advance(RunState::Aborted);
                    error!("Run aborted: {}", e);
                });
                Err(e)
            }
        }
    }

    fn advance(&mut self, next: RunState) {
        info!("Run state: {} -> {}", self.state, next);
        self.state = next;
    }

    fn execute(&mut self, inputs: &RunInputs) -> HotsheetResult<RunSummary> {
        let sections = self.sections.clone();
        info!(
            "Reconciling {} hotsheet {} ({} section(s): {})",
            self.product,
            inputs.hotsheet.display(),
            sections.len(),
            sections
                .iter()
                .map(|s| s.sheet.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let extracts = self.open_extracts(inputs, &sections)?;
        let mut hotsheet = Hotsheet::open(&inputs.hotsheet)?;
        self.advance(RunState::ExtractsOpened);

        let registry = self.registry;
        let layouts = &registry.extracts;
        let inventory = extracts
            .inventory
            .as_ref()
            .map(|grid| index_inventory(grid, &layouts.inventory));
        let bn = extracts.bn.as_ref().map(|grid| index_bn(grid, &layouts.bn));
        let purchase_orders = extracts
            .purchase_orders
            .as_ref()
            .map(|grid| index_purchase_orders(grid, &layouts.purchase_orders));
        self.advance(RunState::Indexed);

        let fraction = month_fraction(self.today);
        let mut progress = if self.show_progress {
            ProgressBar::new(0, 0)
        } else {
            ProgressBar::hidden(0)
        };
        let mut summaries = Vec::with_capacity(sections.len());

        for layout in &sections {
            let mut sheet = hotsheet.section(&layout.sheet)?;
            let mut summary = SectionSummary::new(&layout.sheet);
            info!("Section {}: {}", layout.sheet, layout.reconcilers().join(", "));

            if let (Some(map), Some(inventory)) = (&layout.inventory, &inventory) {
                let skipped_rows = InventoryReconciler {
                    map,
                    first_data_row: layout.first_data_row,
                    inventory,
                    bn: bn.as_ref(),
                    month_fraction: fraction,
                }
                .reconcile(&mut sheet, &mut summary, &mut progress)?;

                if let Some(index) = purchase_orders.as_ref().filter(|_| map.has_po_slots()) {
                    PurchaseOrderReconciler {
                        map,
                        first_data_row: layout.first_data_row,
                        index,
                        skipped_rows: &skipped_rows,
                        number_prefix: &layouts.purchase_orders.po_number_prefix,
                    }
                    .reconcile(&mut sheet, &mut summary, &mut progress)?;
                }
            }

            if let (Some(columns), Some(grid)) = (&layout.stock, &extracts.stock) {
                StockReconciler {
                    columns,
                    first_data_row: layout.first_data_row,
                    extract: grid,
                    layout: &layouts.stock,
                }
                .reconcile(&mut sheet, &mut summary, &mut progress)?;
            }

            if let (Some(columns), Some(grid)) = (&layout.sales, &extracts.sales) {
                SalesReconciler {
                    columns,
                    first_data_row: layout.first_data_row,
                    extract: grid,
                    layout: &layouts.sales,
                }
                .reconcile(&mut sheet, &mut summary, &mut progress)?;
            }

            info!(
                "Section {} done: {} updated, {} unmatched, {} skipped, {} PO slots",
                summary.section,
                summary.rows_updated,
                summary.rows_unmatched,
                summary.rows_skipped,
                summary.po_slots_written
            );
            summaries.push(summary);
        }
        self.advance(RunState::RowsMatched);

        hotsheet.save()?;

        let mut summary = RunSummary {
            product: self.product.clone(),
            selection: self.selection.clone(),
            state: RunState::Saved,
            sections: summaries,
            log_file: None,
        };
        let skipped: usize = summary.sections.iter().map(|s| s.rows_skipped).sum();
        if summary.parse_errors() > 0 || skipped > 0 {
            warn!(
                "{} parse error(s), {} row(s) skipped; review the log",
                summary.parse_errors(),
                skipped
            );
            summary.state = RunState::SavedWithWarnings;
        }
        self.advance(summary.state);
        Ok(summary)
    }

    fn open_extracts(
        &self,
        inputs: &RunInputs,
        sections: &[&SectionLayout],
    ) -> HotsheetResult<Extracts> {
        let layouts = &self.registry.extracts;
        let needs_inventory = sections.iter().any(|s| s.inventory.is_some());
        let needs_purchase_orders = sections
            .iter()
            .filter_map(|s| s.inventory.as_ref())
            .any(|map| map.has_po_slots());
        let needs_stock = sections.iter().any(|s| s.stock.is_some());
        let needs_sales = sections.iter().any(|s| s.sales.is_some());

        // Check every path before reading any workbook.
        let inventory = needs_inventory
            .then(|| required(&inputs.inventory, "inventory"))
            .transpose()?;
        let purchase_orders = needs_purchase_orders
            .then(|| required(&inputs.purchase_orders, "purchase order"))
            .transpose()?;
        let stock = needs_stock
            .then(|| required(&inputs.stock, "stock"))
            .transpose()?;
        let sales = needs_sales
            .then(|| required(&inputs.sales, "sales"))
            .transpose()?;
        let bn = inputs.bn.as_deref().filter(|_| needs_inventory);

        Ok(Extracts {
            inventory: open_grid(inventory, &layouts.inventory.sheet)?,
            purchase_orders: open_grid(purchase_orders, &layouts.purchase_orders.sheet)?,
            bn: open_grid(bn, &layouts.bn.sheet)?,
            stock: open_grid(stock, &layouts.stock.sheet)?,
            sales: open_grid(sales, &layouts.sales.sheet)?,
        })
    }
}

fn open_grid(path: Option<&Path>, sheet: &str) -> HotsheetResult<Option<Grid>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let grid = Grid::open(path, sheet)?;
    info!("Read {} rows from {}", grid.row_count(), path.display());
    Ok(Some(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::MemorySheet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_fraction() {
        assert!((month_fraction(date(2025, 3, 15)) - (2.0 + 15.0 / 31.0)).abs() < 1e-12);
        assert_eq!(month_fraction(date(2025, 1, 31)), 1.0);
        assert_eq!(month_fraction(date(2025, 12, 31)), 12.0);
        assert!((month_fraction(date(2024, 2, 29)) - 2.0).abs() < 1e-12);
        assert!((month_fraction(date(2025, 2, 14)) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_hotsheet_skus_skips_blanks() {
        let mut sheet = MemorySheet::new();
        sheet
            .set("C1", "SKU")
            .set("C2", " ABC-1 ")
            .set("C3", "")
            .set("C5", "XYZ");
        let rows = hotsheet_skus(&sheet, Column::parse("C").unwrap(), 2).unwrap();
        assert_eq!(
            rows,
            vec![(2, "ABC-1".to_string()), (5, "XYZ".to_string())]
        );
    }

    #[test]
    fn test_missing_extract_aborts_before_reading() {
        let registry = LayoutRegistry::builtin().unwrap();
        let mut reconciler = Reconciler::new(&registry, "bjp", "all").unwrap();
        let inputs = RunInputs {
            hotsheet: PathBuf::from("does-not-exist.xlsx"),
            purchase_orders: Some(PathBuf::from("po.xlsx")),
            ..RunInputs::default()
        };

        let err = reconciler.run(&inputs, &RunLog::discard()).unwrap_err();

        assert!(matches!(err, HotsheetError::MissingExtract("inventory")));
        assert_eq!(reconciler.state(), RunState::Aborted);
    }

    #[test]
    fn test_inventory_setup_without_slots_needs_no_po_extract() {
        let registry = LayoutRegistry::builtin().unwrap();
        let mut reconciler = Reconciler::new(&registry, "21c-inv", "all").unwrap();
        let inputs = RunInputs {
            hotsheet: PathBuf::from("does-not-exist.xlsx"),
            inventory: Some(PathBuf::from("does-not-exist-inventory.xlsx")),
            ..RunInputs::default()
        };

        let err = reconciler.run(&inputs, &RunLog::discard()).unwrap_err();

        // Fails opening the inventory workbook, not on a missing PO extract.
        assert!(matches!(err, HotsheetError::Workbook { .. }));
    }

    #[test]
    fn test_selection_is_normalized() {
        let registry = LayoutRegistry::builtin().unwrap();
        let reconciler = Reconciler::new(&registry, "BSC", "").unwrap();
        assert_eq!(reconciler.product(), "BSC");
        assert_eq!(reconciler.sections().len(), 5);

        let winter = Reconciler::new(&registry, "BSC", "winter").unwrap();
        assert_eq!(winter.sections()[0].sheet, "Winter Holiday");
    }

    #[test]
    fn test_summary_totals() {
        let summary = RunSummary {
            product: "BJP".into(),
            selection: "all".into(),
            state: RunState::SavedWithWarnings,
            sections: vec![
                SectionSummary {
                    rows_updated: 4,
                    parse_errors: 1,
                    ..SectionSummary::new("Everyday")
                },
                SectionSummary {
                    parse_errors: 2,
                    ..SectionSummary::new("Holiday")
                },
            ],
            log_file: None,
        };
        assert_eq!(summary.parse_errors(), 3);
        assert_eq!(summary.rows_updated(), 4);
        assert!(summary.has_warnings());
    }
}
