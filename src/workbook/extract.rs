//! Read-only extract grids loaded with calamine.

use crate::config::Column;
use crate::error::{HotsheetError, HotsheetResult};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::Path;

/// A worksheet materialized as display strings, addressed from A1.
///
/// Rows are 1-based to match the addresses printed in extract reports and
/// logs. Cells outside the used area read as `""`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    /// Open `path` and load `sheet` into a grid.
    pub fn open(path: &Path, sheet: &str) -> HotsheetResult<Self> {
        let mut workbook = open_workbook_auto(path).map_err(|e| HotsheetError::Workbook {
            path: path.to_path_buf(),
            operation: "open extract",
            message: e.to_string(),
        })?;

        if !workbook.sheet_names().iter().any(|name| name == sheet) {
            return Err(HotsheetError::SheetNotFound {
                path: path.to_path_buf(),
                sheet: sheet.to_string(),
            });
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| HotsheetError::Workbook {
                path: path.to_path_buf(),
                operation: "read extract sheet of",
                message: e.to_string(),
            })?;

        Ok(Self::from_range(&range))
    }

    /// Convert a calamine range, keeping absolute positions.
    fn from_range(range: &Range<Data>) -> Self {
        let Some((end_row, end_col)) = range.end() else {
            return Self::default();
        };

        let mut rows = Vec::with_capacity(end_row as usize + 1);
        for row in 0..=end_row {
            let mut cells = Vec::with_capacity(end_col as usize + 1);
            for col in 0..=end_col {
                let text = match range.get_value((row, col)) {
                    Some(Data::Empty) | None => String::new(),
                    Some(cell) => cell.to_string(),
                };
                cells.push(text);
            }
            rows.push(cells);
        }
        Self { rows }
    }

    /// Build a grid from literal rows; row 1 is the first slice.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    /// Number of rows; also the last addressable row.
    pub fn row_count(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell text at a 1-based row.
    pub fn cell(&self, row: u32, column: Column) -> &str {
        if row == 0 {
            return "";
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|cells| cells.get(column.offset()))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Cell text with surrounding whitespace removed.
    pub fn trimmed(&self, row: u32, column: Column) -> &str {
        self.cell(row, column).trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(letters: &str) -> Column {
        Column::parse(letters).unwrap()
    }

    #[test]
    fn test_from_rows_addressing() {
        let grid = Grid::from_rows(vec![vec!["a1", "b1"], vec!["a2"]]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.cell(1, col("B")), "b1");
        assert_eq!(grid.cell(2, col("A")), "a2");
    }

    #[test]
    fn test_out_of_range_reads_blank() {
        let grid = Grid::from_rows(vec![vec!["a1"]]);
        assert_eq!(grid.cell(0, col("A")), "");
        assert_eq!(grid.cell(5, col("A")), "");
        assert_eq!(grid.cell(1, col("Z")), "");
    }

    #[test]
    fn test_trimmed() {
        let grid = Grid::from_rows(vec![vec!["  SKU-1 \t"]]);
        assert_eq!(grid.trimmed(1, col("A")), "SKU-1");
    }

    #[test]
    fn test_from_range_keeps_absolute_positions() {
        // Used area starting at C3 must still be addressed from A1.
        let mut range: Range<Data> = Range::new((2, 2), (3, 3));
        range.set_value((2, 2), Data::String("SKU".to_string()));
        range.set_value((3, 3), Data::Float(12.0));
        let grid = Grid::from_range(&range);

        assert_eq!(grid.cell(3, col("C")), "SKU");
        assert_eq!(grid.cell(4, col("D")), "12");
        assert_eq!(grid.cell(1, col("A")), "");
    }

    #[test]
    fn test_open_missing_file() {
        let result = Grid::open(Path::new("/nonexistent/extract.xlsx"), "Sheet1");
        assert!(matches!(result, Err(HotsheetError::Workbook { .. })));
    }
}
