//! Purchase-order slots: up to three open PO lines per SKU.

use super::{hotsheet_skus, SectionSummary};
use crate::config::{ColumnMap, PoSlotColumns, PurchaseOrderExtract};
use crate::error::{HotsheetError, HotsheetResult};
use crate::matcher::SkuIndex;
use crate::numeric::parse_number;
use crate::progress::ProgressBar;
use crate::workbook::{Grid, SheetAccess};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// One PO line as read from the extract, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoLine {
    pub extract_row: u32,
    pub number: String,
    pub quantity: String,
    pub back_order: bool,
}

/// The lines following a SKU row, one per hotsheet slot.
pub type PoSlots = [Option<PoLine>; 3];

/// Index the PO extract: every SKU cell maps to the lines at the slot offsets.
///
/// A PO line carries a status. The first slot row without one is the next
/// SKU's header (or past the end of the report) and ends the lines.
pub fn index_purchase_orders(grid: &Grid, layout: &PurchaseOrderExtract) -> SkuIndex<PoSlots> {
    let mut index = SkuIndex::new(layout.duplicates);

    for row in 1..=grid.row_count() {
        let sku = grid.trimmed(row, layout.sku);
        if sku.is_empty() {
            continue;
        }
        let mut ended = false;
        let slots = layout.slot_offsets.map(|offset| {
            let line_row = row + offset;
            ended = ended
                || line_row > grid.row_count()
                || grid.trimmed(line_row, layout.status).is_empty();
            (!ended).then(|| read_line(grid, layout, line_row))
        });
        index.insert(sku, slots);
    }

    info!(
        "Indexed {} PO extract SKUs ({} duplicates)",
        index.len(),
        index.duplicates()
    );
    index
}

fn read_line(grid: &Grid, layout: &PurchaseOrderExtract, row: u32) -> PoLine {
    let back_order = grid.trimmed(row, layout.status) == layout.back_order_status;
    let quantity_column = if back_order { layout.backorder } else { layout.on_po };
    PoLine {
        extract_row: row,
        number: grid.trimmed(row, layout.sku).to_string(),
        quantity: grid.trimmed(row, quantity_column).to_string(),
        back_order,
    }
}

/// Fills the PO slot columns of rows with a nonzero on-PO total.
///
/// Runs after the inventory pass, which has already blanked every slot of the
/// rows it wrote. Rows that pass skipped are left alone here too.
pub struct PurchaseOrderReconciler<'a> {
    pub map: &'a ColumnMap,
    pub first_data_row: u32,
    pub index: &'a SkuIndex<PoSlots>,
    pub skipped_rows: &'a BTreeSet<u32>,
    /// Slots 2 and 3 hold a real PO only when the number starts with this.
    pub number_prefix: &'a str,
}

impl PurchaseOrderReconciler<'_> {
    pub fn reconcile<S: SheetAccess>(
        &self,
        sheet: &mut S,
        summary: &mut SectionSummary,
        progress: &mut ProgressBar,
    ) -> HotsheetResult<()> {
        let rows = hotsheet_skus(sheet, self.map.sku, self.first_data_row)?;
        progress.restart(rows.len() as u64);

        for (done, (row, sku)) in rows.into_iter().enumerate() {
            progress.play(done as u64 + 1);
            if self.skipped_rows.contains(&row) {
                debug!("SKU {} (row {}) was skipped by the inventory pass", sku, row);
                continue;
            }

            let total = sheet.read_at(self.map.on_po_total, row)?;
            match parse_number(&total) {
                Ok(0) => continue,
                Ok(_) => {}
                Err(e) => {
                    warn!("SKU {} (row {}): on-PO total unreadable, PO slots skipped: {}", sku, row, e);
                    summary.parse_errors += 1;
                    continue;
                }
            }

            let Some(slots) = self.index.get(&sku) else {
                debug!("SKU {} has an on-PO total but no PO extract entry", sku);
                continue;
            };

            for (slot, (line, columns)) in slots.iter().zip(&self.map.po_slots).enumerate() {
                let Some(line) = line else { continue };
                if !self.consults(slot, line) {
                    continue;
                }
                if self.write_slot(sheet, row, &sku, line, columns, summary)? {
                    summary.po_slots_written += 1;
                }
            }
        }
        progress.finish();
        Ok(())
    }

    fn consults(&self, slot: usize, line: &PoLine) -> bool {
        if slot == 0 {
            !line.number.is_empty()
        } else {
            line.number.starts_with(self.number_prefix) && !line.number.is_empty()
        }
    }

    /// Write one slot; `Ok(false)` when the slot was left blank.
    fn write_slot<S: SheetAccess>(
        &self,
        sheet: &mut S,
        row: u32,
        sku: &str,
        line: &PoLine,
        columns: &PoSlotColumns,
        summary: &mut SectionSummary,
    ) -> HotsheetResult<bool> {
        let number: i64 = line
            .number
            .parse()
            .map_err(|_| HotsheetError::InvalidPoNumber {
                sku: sku.to_string(),
                row: line.extract_row,
                value: line.number.clone(),
            })?;
        if number == 0 {
            return Ok(false);
        }

        let quantity = match parse_number(&line.quantity) {
            Ok(quantity) => quantity,
            Err(e) => {
                warn!(
                    "SKU {}: quantity for PO {} (extract row {}) unreadable, slot skipped: {}",
                    sku, number, line.extract_row, e
                );
                summary.parse_errors += 1;
                return Ok(false);
            }
        };

        sheet.write_int_at(columns.number, row, number)?;
        sheet.write_int_at(columns.quantity, row, quantity)?;
        info!(
            "{} has a quantity of {} on PO number {}{}",
            sku,
            quantity,
            number,
            if line.back_order { " (back order)" } else { "" }
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutRegistry;
    use crate::workbook::MemorySheet;
    use pretty_assertions::assert_eq;

    /// PO extract row: (A, G status, I on-PO, K backorder).
    fn po_grid(rows: &[(&str, &str, &str, &str)]) -> Grid {
        Grid::from_rows(rows.iter().map(|(a, status, on_po, backorder)| {
            let mut row = vec![String::new(); 11];
            row[0] = a.to_string();
            row[6] = status.to_string();
            row[8] = on_po.to_string();
            row[10] = backorder.to_string();
            row
        }))
    }

    fn three_lines() -> Grid {
        po_grid(&[
            ("ABC-1", "", "", ""),
            ("00123", "Open", "20", ""),
            ("00124", "Back Order", "999", "10"),
            ("00125", "Open", "1,000", ""),
        ])
    }

    fn run(sheet: &mut MemorySheet, grid: &Grid) -> HotsheetResult<SectionSummary> {
        run_skipping(sheet, grid, &BTreeSet::new())
    }

    fn run_skipping(
        sheet: &mut MemorySheet,
        grid: &Grid,
        skipped_rows: &BTreeSet<u32>,
    ) -> HotsheetResult<SectionSummary> {
        let registry = LayoutRegistry::builtin().unwrap();
        let map = registry.products["BJP"].sections[0]
            .inventory
            .clone()
            .unwrap();
        let index = index_purchase_orders(grid, &registry.extracts.purchase_orders);
        let reconciler = PurchaseOrderReconciler {
            map: &map,
            first_data_row: 2,
            index: &index,
            skipped_rows,
            number_prefix: &registry.extracts.purchase_orders.po_number_prefix,
        };
        let mut summary = SectionSummary::new("Everyday");
        reconciler.reconcile(sheet, &mut summary, &mut ProgressBar::hidden(0))?;
        Ok(summary)
    }

    #[test]
    fn test_index_reads_back_order_column() {
        let registry = LayoutRegistry::builtin().unwrap();
        let index = index_purchase_orders(&three_lines(), &registry.extracts.purchase_orders);
        let slots = index.get("ABC-1").unwrap();
        let second = slots[1].as_ref().unwrap();
        assert!(second.back_order);
        assert_eq!(second.quantity, "10");
        assert_eq!(second.extract_row, 3);
    }

    #[test]
    fn test_three_slots_populated() {
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "50");

        let summary = run(&mut sheet, &three_lines()).unwrap();

        assert_eq!(summary.po_slots_written, 3);
        assert_eq!(sheet.get("F2"), "123");
        assert_eq!(sheet.get("E2"), "20");
        assert_eq!(sheet.get("H2"), "124");
        assert_eq!(sheet.get("G2"), "10");
        assert_eq!(sheet.get("J2"), "125");
        assert_eq!(sheet.get("I2"), "1000");
    }

    #[test]
    fn test_zero_on_po_skips_row() {
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "0");

        let summary = run(&mut sheet, &three_lines()).unwrap();

        assert_eq!(summary.po_slots_written, 0);
        assert_eq!(sheet.get("F2"), "");
    }

    #[test]
    fn test_blank_on_po_skips_row() {
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1");
        run(&mut sheet, &three_lines()).unwrap();
        assert_eq!(sheet.get("F2"), "");
    }

    #[test]
    fn test_later_slots_need_prefix() {
        let grid = po_grid(&[
            ("ABC-1", "", "", ""),
            ("00123", "Open", "20", ""),
            ("12345", "Open", "7", ""),
            ("00900", "Open", "5", ""),
        ]);
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "25");

        run(&mut sheet, &grid).unwrap();

        assert_eq!(sheet.get("F2"), "123");
        assert_eq!(sheet.get("H2"), "");
        assert_eq!(sheet.get("J2"), "900");
        assert_eq!(sheet.get("I2"), "5");
    }

    #[test]
    fn test_next_sku_header_ends_lines() {
        let grid = po_grid(&[
            ("ABC-1", "", "", ""),
            ("00123", "Open", "20", ""),
            ("XYZ-2", "", "", ""),
            ("00900", "Open", "5", ""),
        ]);
        let index = index_purchase_orders(
            &grid,
            &LayoutRegistry::builtin().unwrap().extracts.purchase_orders,
        );
        let slots = index.get("ABC-1").unwrap();
        assert!(slots[0].is_some());
        assert_eq!(slots[1], None);
        assert_eq!(slots[2], None, "00900 belongs to XYZ-2");

        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "25");
        run(&mut sheet, &grid).unwrap();
        assert_eq!(sheet.get("F2"), "123");
        assert_eq!(sheet.get("J2"), "");
    }

    #[test]
    fn test_sku_without_lines_is_not_fatal() {
        let grid = po_grid(&[
            ("ABC-1", "", "", ""),
            ("XYZ-2", "", "", ""),
            ("00123", "Open", "20", ""),
        ]);
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "30");

        let summary = run(&mut sheet, &grid).unwrap();

        assert_eq!(summary.po_slots_written, 0);
        assert_eq!(sheet.get("F2"), "");
    }

    #[test]
    fn test_rows_skipped_by_inventory_are_untouched() {
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "30");
        sheet.set("F2", "00777").set("H2", "00555").set("G2", "9");

        let skipped = BTreeSet::from([2]);
        let summary = run_skipping(&mut sheet, &three_lines(), &skipped).unwrap();

        assert_eq!(summary.po_slots_written, 0);
        assert_eq!(sheet.get("F2"), "00777");
        assert_eq!(sheet.get("H2"), "00555");
        assert_eq!(sheet.get("G2"), "9");
    }

    #[test]
    fn test_map_without_slots_writes_nothing() {
        let registry = LayoutRegistry::builtin().unwrap();
        let mut map = registry.products["BJP"].sections[0]
            .inventory
            .clone()
            .unwrap();
        map.po_slots.clear();
        let index = index_purchase_orders(&three_lines(), &registry.extracts.purchase_orders);
        let reconciler = PurchaseOrderReconciler {
            map: &map,
            first_data_row: 2,
            index: &index,
            skipped_rows: &BTreeSet::new(),
            number_prefix: "00",
        };
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "50");
        let mut summary = SectionSummary::new("Everyday");

        reconciler
            .reconcile(&mut sheet, &mut summary, &mut ProgressBar::hidden(0))
            .unwrap();

        assert_eq!(summary.po_slots_written, 0);
        assert_eq!(sheet.get("F2"), "");
    }

    #[test]
    fn test_non_numeric_first_slot_is_fatal() {
        let grid = po_grid(&[("ABC-1", "", "", ""), ("PO#12", "Open", "20", "")]);
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "20");

        let err = run(&mut sheet, &grid).unwrap_err();
        assert!(matches!(
            err,
            HotsheetError::InvalidPoNumber { ref value, row: 2, .. } if value == "PO#12"
        ));
    }

    #[test]
    fn test_bad_quantity_skips_slot() {
        let grid = po_grid(&[
            ("ABC-1", "", "", ""),
            ("00123", "Open", "lots", ""),
            ("00124", "Open", "4", ""),
        ]);
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "4");

        let summary = run(&mut sheet, &grid).unwrap();

        assert_eq!(summary.parse_errors, 1);
        assert_eq!(summary.po_slots_written, 1);
        assert_eq!(sheet.get("F2"), "");
        assert_eq!(sheet.get("H2"), "124");
    }

    #[test]
    fn test_zero_po_number_is_not_written() {
        let grid = po_grid(&[("ABC-1", "", "", ""), ("0000", "Open", "3", "")]);
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "ABC-1").set("K2", "3");

        let summary = run(&mut sheet, &grid).unwrap();
        assert_eq!(summary.po_slots_written, 0);
        assert_eq!(sheet.get("F2"), "");
    }
}
