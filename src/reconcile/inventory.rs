//! Inventory reconciliation: on-hand, on-PO, SO/BO, YTD and BN overlay.

use super::{hotsheet_skus, SectionSummary};
use std::collections::BTreeSet;
use crate::config::{BnExtract, ColumnMap, InventoryExtract};
use crate::error::HotsheetResult;
use crate::matcher::{value_row, Indexed, SkuIndex};
use crate::numeric::{parse_number, ParseNumberError};
use crate::progress::ProgressBar;
use crate::workbook::{Grid, SheetAccess};
use tracing::{debug, info, warn};

/// Figures read from one inventory extract entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InventoryFigures {
    pub on_hand: i64,
    pub on_po: i64,
    pub on_so: i64,
    pub on_bo: i64,
    pub ytd_sold: i64,
    pub ytd_issued: i64,
}

impl InventoryFigures {
    /// `None` on overflow.
    pub fn on_so_bo(&self) -> Option<i64> {
        self.on_so.checked_add(self.on_bo)
    }

    /// `None` on overflow.
    pub fn ytd_sold_issued(&self) -> Option<i64> {
        self.ytd_sold.checked_add(self.ytd_issued)
    }
}

pub type InventoryIndex = SkuIndex<Indexed<InventoryFigures>>;
pub type BnIndex = SkuIndex<Indexed<i64>>;

/// Index the inventory extract by SKU.
///
/// Every non-blank SKU cell becomes a key, value rows included; those keys
/// never match a hotsheet SKU. Entries whose figures do not parse are kept as
/// [`Indexed::Unreadable`] so a matching hotsheet row is skipped, not blanked.
pub fn index_inventory(grid: &Grid, layout: &InventoryExtract) -> InventoryIndex {
    let mut index = SkuIndex::new(layout.duplicates);
    let mut unreadable = 0;

    for row in 1..=grid.row_count() {
        let sku = grid.trimmed(row, layout.sku);
        if sku.is_empty() {
            continue;
        }
        let Some(values) = value_row(grid, &layout.value_offset, row) else {
            continue;
        };

        let read = |col| parse_number(grid.cell(values, col));
        let parsed = (|| {
            Ok::<_, ParseNumberError>(InventoryFigures {
                on_hand: read(layout.on_hand)?,
                on_po: read(layout.on_po)?,
                on_so: read(layout.on_so)?,
                on_bo: read(layout.on_bo)?,
                ytd_sold: read(layout.ytd_sold)?,
                ytd_issued: read(layout.ytd_issued)?,
            })
        })();

        match parsed {
            Ok(figures) => index.insert(sku, Indexed::Ready(figures)),
            Err(e) => {
                debug!("Inventory SKU {} (extract row {}) unreadable: {}", sku, values, e);
                unreadable += 1;
                index.insert(sku, Indexed::Unreadable);
            }
        }
    }

    info!(
        "Indexed {} inventory keys ({} duplicates, {} unreadable)",
        index.len(),
        index.duplicates(),
        unreadable
    );
    index
}

/// Index the BN overlay extract by SKU.
pub fn index_bn(grid: &Grid, layout: &BnExtract) -> BnIndex {
    let mut index = SkuIndex::new(layout.duplicates);

    for row in 1..=grid.row_count() {
        let sku = grid.trimmed(row, layout.sku);
        if sku.is_empty() {
            continue;
        }
        let Some(values) = value_row(grid, &layout.value_offset, row) else {
            continue;
        };
        match parse_number(grid.cell(values, layout.ytd_sold)) {
            Ok(ytd) => index.insert(sku, Indexed::Ready(ytd)),
            Err(e) => {
                debug!("BN SKU {} unreadable: {}", sku, e);
                index.insert(sku, Indexed::Unreadable);
            }
        }
    }

    info!("Indexed {} BN keys", index.len());
    index
}

/// Writes inventory figures into one hotsheet section.
pub struct InventoryReconciler<'a> {
    pub map: &'a ColumnMap,
    pub first_data_row: u32,
    pub inventory: &'a InventoryIndex,
    pub bn: Option<&'a BnIndex>,
    /// Elapsed months of the year, see [`super::month_fraction`].
    pub month_fraction: f64,
}

impl InventoryReconciler<'_> {
    /// Reconcile every SKU row; returns the rows skipped as unreadable.
    pub fn reconcile<S: SheetAccess>(
        &self,
        sheet: &mut S,
        summary: &mut SectionSummary,
        progress: &mut ProgressBar,
    ) -> HotsheetResult<BTreeSet<u32>> {
        let rows = hotsheet_skus(sheet, self.map.sku, self.first_data_row)?;
        let mut skipped = BTreeSet::new();
        progress.restart(rows.len() as u64);
        for (done, (row, sku)) in rows.into_iter().enumerate() {
            progress.play(done as u64 + 1);
            summary.rows_scanned += 1;
            let totals = match self.inventory.get(&sku) {
                None => {
                    info!("No inventory match for SKU {} (row {}); clearing PO slots", sku, row);
                    self.clear_po_slots(sheet, row)?;
                    summary.rows_unmatched += 1;
                    continue;
                }
                Some(Indexed::Unreadable) => None,
                Some(Indexed::Ready(figures)) => figures
                    .on_so_bo()
                    .zip(figures.ytd_sold_issued())
                    .map(|totals| (figures, totals)),
            };
            match totals {
                Some((figures, totals)) => {
                    self.write_figures(sheet, row, &sku, figures, totals, summary)?;
                    summary.rows_updated += 1;
                }
                None => {
                    warn!(
                        "Skipping SKU {} (row {}) due to parse error in the inventory extract",
                        sku, row
                    );
                    summary.parse_errors += 1;
                    summary.rows_skipped += 1;
                    skipped.insert(row);
                }
            }
        }
        progress.finish();
        Ok(skipped)
    }

    /// `totals` is (SO+BO, YTD sold+issued), already overflow-checked.
    fn write_figures<S: SheetAccess>(
        &self,
        sheet: &mut S,
        row: u32,
        sku: &str,
        figures: &InventoryFigures,
        (on_so_bo, ytd): (i64, i64),
        summary: &mut SectionSummary,
    ) -> HotsheetResult<()> {
        let map = self.map;

        sheet.write_int_at(map.on_hand, row, figures.on_hand)?;
        sheet.write_int_at(map.on_po_total, row, figures.on_po)?;
        sheet.write_int_at(map.on_so_bo, row, on_so_bo)?;
        if let Some(col) = map.ytd_sold_issued {
            sheet.write_int_at(col, row, ytd)?;
        }
        if let Some((sold_col, issued_col)) = map.split_ytd_columns() {
            sheet.write_int_at(sold_col, row, figures.ytd_sold)?;
            sheet.write_int_at(issued_col, row, figures.ytd_issued)?;
        }
        if let Some(col) = map.average_monthly {
            sheet.write_number_at(col, row, ytd as f64 / self.month_fraction)?;
        }
        self.clear_po_slots(sheet, row)?;

        info!(
            "Match found for SKU: {} | onHand: {} | onPO: {} | onSO: {} | onBO: {} | ytdSold: {} | ytdIssued: {}",
            sku,
            figures.on_hand,
            figures.on_po,
            figures.on_so,
            figures.on_bo,
            figures.ytd_sold,
            figures.ytd_issued
        );

        let Some((bn_ytd_col, bn_avg_col)) = map.bn_columns() else {
            return Ok(());
        };
        sheet.clear_at(bn_ytd_col, row)?;
        sheet.clear_at(bn_avg_col, row)?;

        match self.bn.and_then(|bn| bn.get(sku)) {
            Some(Indexed::Ready(bn_ytd_sold)) => match ytd.checked_sub(*bn_ytd_sold) {
                Some(adjusted) => {
                    sheet.write_int_at(bn_ytd_col, row, adjusted)?;
                    sheet.write_number_at(bn_avg_col, row, adjusted as f64 / self.month_fraction)?;
                    info!("BN match found for SKU: {} | BN YTD sold: {}", sku, bn_ytd_sold);
                }
                None => {
                    warn!("BN adjustment for SKU {} overflows; BN columns left blank", sku);
                    summary.parse_errors += 1;
                }
            },
            Some(Indexed::Unreadable) => {
                warn!("BN figures for SKU {} unreadable; BN columns left blank", sku);
                summary.parse_errors += 1;
            }
            None => debug!("No BN entry for SKU {}", sku),
        }
        Ok(())
    }

    fn clear_po_slots<S: SheetAccess>(&self, sheet: &mut S, row: u32) -> HotsheetResult<()> {
        for slot in &self.map.po_slots {
            sheet.clear_at(slot.number, row)?;
            sheet.clear_at(slot.quantity, row)?;
        }
        Ok(())
    }
}
