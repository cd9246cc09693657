//! Legacy YTD sales reconciliation with the kit multiplier.

use super::{hotsheet_skus, SectionSummary};
use crate::config::{SalesColumns, SalesExtract};
use crate::error::HotsheetResult;
use crate::matcher::{scan_forward, MatchPredicate, ScanPointer};
use crate::numeric::parse_number;
use crate::progress::ProgressBar;
use crate::workbook::{Grid, SheetAccess};
use tracing::{info, warn};

pub struct SalesReconciler<'a> {
    pub columns: &'a SalesColumns,
    pub first_data_row: u32,
    pub extract: &'a Grid,
    pub layout: &'a SalesExtract,
}

impl SalesReconciler<'_> {
    pub fn reconcile<S: SheetAccess>(
        &self,
        sheet: &mut S,
        summary: &mut SectionSummary,
        progress: &mut ProgressBar,
    ) -> HotsheetResult<()> {
        let layout = self.layout;
        let mut pointer = ScanPointer::new();
        let rows = hotsheet_skus(sheet, self.columns.sku, self.first_data_row)?;
        progress.restart(rows.len() as u64);

        for (done, (row, sku)) in rows.into_iter().enumerate() {
            progress.play(done as u64 + 1);
            summary.rows_scanned += 1;

            let Some(found) =
                scan_forward(self.extract, layout.sku, &sku, &MatchPredicate::Exact, &mut pointer)
            else {
                summary.rows_unmatched += 1;
                continue;
            };

            let raw = self.extract.cell(found + layout.ytd.offset, layout.ytd.column);
            let ytd = match parse_number(raw) {
                Ok(ytd) => ytd,
                Err(e) => {
                    warn!("SKU {} (extract row {}) skipped: {}", sku, found, e);
                    summary.parse_errors += 1;
                    summary.rows_skipped += 1;
                    continue;
                }
            };

            let flag = self.extract.trimmed(found + layout.kit.offset, layout.kit.column);
            let is_kit = flag == layout.kit_flag;
            let units = if is_kit && !layout.is_kit_exempt(&sku) {
                ytd.checked_mul(layout.kit_multiplier)
            } else {
                Some(ytd)
            };
            let Some(units) = units else {
                warn!("SKU {} (extract row {}) skipped: kit YTD {} overflows", sku, found, ytd);
                summary.parse_errors += 1;
                summary.rows_skipped += 1;
                continue;
            };

            sheet.write_int_at(self.columns.ytd, row, units)?;
            info!(
                "Match found for SKU: {} | YTD: {}{}",
                sku,
                units,
                if is_kit { " (kit)" } else { "" }
            );
            summary.rows_updated += 1;
        }
        progress.finish();
        Ok(())
    }
}
