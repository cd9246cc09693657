//! Legacy stock reconciliation (BSC, 21C, SMD).

use super::{hotsheet_skus, SectionSummary};
use crate::config::{StockColumns, StockExtract};
use crate::error::HotsheetResult;
use crate::matcher::{scan_forward, value_row, MatchPredicate, ScanPointer};
use crate::numeric::{parse_number, ParseNumberError};
use crate::progress::ProgressBar;
use crate::workbook::{Grid, SheetAccess};
use tracing::{info, warn};

pub struct StockReconciler<'a> {
    pub columns: &'a StockColumns,
    pub first_data_row: u32,
    pub extract: &'a Grid,
    pub layout: &'a StockExtract,
}

struct StockFigures {
    on_hand: i64,
    on_po: i64,
    on_so_bo: i64,
}

impl StockReconciler<'_> {
    pub fn reconcile<S: SheetAccess>(
        &self,
        sheet: &mut S,
        summary: &mut SectionSummary,
        progress: &mut ProgressBar,
    ) -> HotsheetResult<()> {
        let predicate = MatchPredicate::Substring {
            skip: self.layout.skip_skus.clone(),
        };
        let mut pointer = ScanPointer::new();
        let rows = hotsheet_skus(sheet, self.columns.sku, self.first_data_row)?;
        progress.restart(rows.len() as u64);

        for (done, (row, sku)) in rows.into_iter().enumerate() {
            progress.play(done as u64 + 1);
            summary.rows_scanned += 1;

            let Some(found) =
                scan_forward(self.extract, self.layout.sku, &sku, &predicate, &mut pointer)
            else {
                summary.rows_unmatched += 1;
                continue;
            };
            let Some(values) = value_row(self.extract, &self.layout.value_offset, found) else {
                warn!("SKU {} matched extract row {} but its values run past the end", sku, found);
                summary.rows_skipped += 1;
                continue;
            };

            match self.figures(values) {
                Ok(figures) => {
                    sheet.write_int_at(self.columns.on_hand, row, figures.on_hand)?;
                    sheet.write_int_at(self.columns.on_po, row, figures.on_po)?;
                    sheet.write_int_at(self.columns.on_so_bo, row, figures.on_so_bo)?;
                    info!(
                        "Match found for SKU: {} | on_hand: {} | on_po: {} | on_so_bo: {}",
                        sku, figures.on_hand, figures.on_po, figures.on_so_bo
                    );
                    summary.rows_updated += 1;
                }
                Err(e) => {
                    warn!("SKU {} (extract row {}) skipped: {}", sku, values, e);
                    summary.parse_errors += 1;
                    summary.rows_skipped += 1;
                }
            }
        }
        progress.finish();
        Ok(())
    }

    fn figures(&self, row: u32) -> Result<StockFigures, ParseNumberError> {
        let read = |col| parse_number(self.extract.cell(row, col));
        let (on_so, on_bo) = (read(self.layout.on_so)?, read(self.layout.on_bo)?);
        let on_so_bo = on_so.checked_add(on_bo).ok_or_else(|| ParseNumberError {
            raw: format!("{} + {}", on_so, on_bo),
        })?;
        Ok(StockFigures {
            on_hand: read(self.layout.on_hand)?,
            on_po: read(self.layout.on_po)?,
            on_so_bo,
        })
    }
}
