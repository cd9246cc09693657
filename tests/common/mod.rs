//! Workbook fixtures shared by the integration tests.

#![allow(dead_code)]

use hotsheet_sync::config::Column;
use hotsheet_sync::workbook::Grid;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Cells of one worksheet as `(address, text)` pairs, e.g. `("C2", "ABC-1")`.
pub type Cells<'a> = &'a [(&'a str, &'a str)];

fn split_address(address: &str) -> (u32, u16) {
    let split = address.find(|c: char| c.is_ascii_digit()).unwrap();
    let (letters, digits) = address.split_at(split);
    let column = Column::parse(letters).unwrap();
    let row: u32 = digits.parse().unwrap();
    (row - 1, (column.index() - 1) as u16)
}

/// Write an .xlsx with one worksheet per entry. Every cell is stored as text,
/// the way ERP extracts arrive.
pub fn write_workbook(path: &Path, sheets: &[(&str, Cells)]) {
    let mut workbook = Workbook::new();
    for (name, cells) in sheets {
        let worksheet = workbook.add_worksheet().set_name(*name).unwrap();
        for (address, text) in cells.iter() {
            let (row, col) = split_address(address);
            worksheet.write_string(row, col, *text).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

/// Read a worksheet back for assertions.
pub fn read_sheet(path: &Path, sheet: &str) -> Grid {
    Grid::open(path, sheet).unwrap()
}

/// Text of one cell of a grid read with [`read_sheet`].
pub fn cell(grid: &Grid, address: &str) -> String {
    let (row, col) = split_address(address);
    grid.cell(row + 1, Column::from_index(col as u32 + 1)).to_string()
}
