use super::{CellRef, SheetAccess};
use crate::config::Column;
use crate::error::HotsheetResult;
use std::collections::BTreeMap;

/// An in-memory hotsheet section.
///
/// Numbers are stored as the text a spreadsheet would display, so reading a
/// written cell back behaves like the umya-backed section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    cells: BTreeMap<(u32, u32), String>,
}

impl MemorySheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell from its address, e.g. `set("C2", "SKU-1")`.
    ///
    /// # Panics
    /// On a malformed address; intended for fixtures.
    pub fn set(&mut self, address: &str, value: &str) -> &mut Self {
        let split = address
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(address.len());
        let (letters, digits) = address.split_at(split);
        let column = Column::parse(letters).expect("column letters");
        let row: u32 = digits.parse().expect("row number");
        self.cells.insert((row, column.index()), value.to_string());
        self
    }

    /// Text at an address, `""` when never written.
    pub fn get(&self, address: &str) -> String {
        let split = address
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(address.len());
        let (letters, digits) = address.split_at(split);
        match (Column::parse(letters), digits.parse::<u32>()) {
            (Ok(column), Ok(row)) => self
                .cells
                .get(&(row, column.index()))
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        }
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

impl SheetAccess for MemorySheet {
    fn last_row(&self) -> u32 {
        self.cells
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|((row, _), _)| *row)
            .max()
            .unwrap_or(0)
    }

    fn read(&self, cell: CellRef) -> String {
        self.cells
            .get(&(cell.row(), cell.column().index()))
            .cloned()
            .unwrap_or_default()
    }

    fn write_number(&mut self, cell: CellRef, value: f64) -> HotsheetResult<()> {
        self.cells
            .insert((cell.row(), cell.column().index()), format_number(value));
        Ok(())
    }

    fn clear(&mut self, cell: CellRef) -> HotsheetResult<()> {
        self.cells.insert((cell.row(), cell.column().index()), String::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut sheet = MemorySheet::new();
        sheet.set("C2", "SKU-1").set("AA10", "x");
        assert_eq!(sheet.get("C2"), "SKU-1");
        assert_eq!(sheet.get("AA10"), "x");
        assert_eq!(sheet.get("D2"), "");
        assert_eq!(sheet.last_row(), 10);
    }

    #[test]
    fn test_write_number_formats_like_a_sheet() {
        let mut sheet = MemorySheet::new();
        sheet.write_number_at(Column::from_index(1), 1, 50.0).unwrap();
        sheet.write_number_at(Column::from_index(2), 1, 2.5).unwrap();
        assert_eq!(sheet.get("A1"), "50");
        assert_eq!(sheet.get("B1"), "2.5");
    }

    #[test]
    fn test_clear_does_not_extend_last_row() {
        let mut sheet = MemorySheet::new();
        sheet.set("A3", "SKU");
        sheet.clear_at(Column::from_index(1), 9).unwrap();
        assert_eq!(sheet.last_row(), 3);
        assert_eq!(sheet.get("A9"), "");
    }

    #[test]
    fn test_out_of_range_write_fails() {
        let mut sheet = MemorySheet::new();
        let beyond = Column::parse("ZZZZ").unwrap();
        assert!(sheet.write_int_at(beyond, 2, 1).is_err());
    }
}
