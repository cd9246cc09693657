//! The hotsheet workbook, opened with umya-spreadsheet and edited in place.

use super::{CellRef, SheetAccess};
use crate::error::{HotsheetError, HotsheetResult};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// An open hotsheet. Dropping it without [`Hotsheet::save`] discards edits.
pub struct Hotsheet {
    path: PathBuf,
    book: Spreadsheet,
}

impl Hotsheet {
    pub fn open(path: &Path) -> HotsheetResult<Self> {
        let book =
            umya_spreadsheet::reader::xlsx::read(path).map_err(|e| HotsheetError::Workbook {
                path: path.to_path_buf(),
                operation: "open hotsheet",
                message: e.to_string(),
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            book,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow one worksheet for editing.
    pub fn section(&mut self, sheet: &str) -> HotsheetResult<HotsheetSection<'_>> {
        let path = self.path.clone();
        let worksheet = self
            .book
            .get_sheet_by_name_mut(sheet)
            .ok_or_else(|| HotsheetError::SheetNotFound {
                path,
                sheet: sheet.to_string(),
            })?;
        Ok(HotsheetSection { worksheet })
    }

    /// Write the workbook back to the path it was opened from.
    pub fn save(self) -> HotsheetResult<()> {
        umya_spreadsheet::writer::xlsx::write(&self.book, &self.path).map_err(|e| {
            HotsheetError::Workbook {
                path: self.path.clone(),
                operation: "save hotsheet",
                message: e.to_string(),
            }
        })
    }
}

/// One worksheet of an open [`Hotsheet`].
pub struct HotsheetSection<'a> {
    worksheet: &'a mut Worksheet,
}

impl SheetAccess for HotsheetSection<'_> {
    fn last_row(&self) -> u32 {
        self.worksheet.get_highest_row()
    }

    fn read(&self, cell: CellRef) -> String {
        self.worksheet.get_value(cell.to_string().as_str())
    }

    fn write_number(&mut self, cell: CellRef, value: f64) -> HotsheetResult<()> {
        self.worksheet
            .get_cell_mut(cell.to_string().as_str())
            .set_value_number(value);
        Ok(())
    }

    fn clear(&mut self, cell: CellRef) -> HotsheetResult<()> {
        self.worksheet
            .get_cell_mut(cell.to_string().as_str())
            .set_value_string("");
        Ok(())
    }
}

/// File name of the dated working copy: `<product>_hotsheet_<YYYY-MM-DD>.xlsx`.
pub fn working_copy_name(product: &str, date: NaiveDate) -> String {
    format!("{}_hotsheet_{}.xlsx", product, date.format("%Y-%m-%d"))
}

/// Copy `source` next to itself under a dated name and return the new path.
///
/// Reconciliation then runs against the copy so the template stays untouched.
pub fn copy_hotsheet(product: &str, source: &Path, date: NaiveDate) -> HotsheetResult<PathBuf> {
    if !source.is_file() {
        return Err(HotsheetError::Workbook {
            path: source.to_path_buf(),
            operation: "copy hotsheet",
            message: "file does not exist".to_string(),
        });
    }
    let dir = source.parent().unwrap_or_else(|| Path::new("."));
    let target = dir.join(working_copy_name(product, date));
    if target == source {
        return Err(HotsheetError::Workbook {
            path: source.to_path_buf(),
            operation: "copy hotsheet",
            message: "source already has the working copy name".to_string(),
        });
    }
    std::fs::copy(source, &target).map_err(|e| HotsheetError::Workbook {
        path: target.clone(),
        operation: "write working copy",
        message: e.to_string(),
    })?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_working_copy_name() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(working_copy_name("BJP", date), "BJP_hotsheet_2026-03-09.xlsx");
    }

    #[test]
    fn test_copy_hotsheet() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("template.xlsx");
        std::fs::write(&source, b"not really xlsx").unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let copy = copy_hotsheet("BSC", &source, date).unwrap();

        assert_eq!(copy, dir.path().join("BSC_hotsheet_2026-10-19.xlsx"));
        assert_eq!(std::fs::read(&copy).unwrap(), b"not really xlsx");
        assert!(source.exists(), "template must remain");
    }

    #[test]
    fn test_copy_missing_source() {
        let dir = TempDir::new().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let result = copy_hotsheet("BSC", &dir.path().join("missing.xlsx"), date);
        assert!(matches!(result, Err(HotsheetError::Workbook { .. })));
    }

    #[test]
    fn test_open_missing_hotsheet() {
        let result = Hotsheet::open(Path::new("/nonexistent/hotsheet.xlsx"));
        assert!(matches!(result, Err(HotsheetError::Workbook { .. })));
    }
}
