//! Spreadsheet access.
//!
//! - Extracts are read once with calamine into a [`Grid`] of display strings.
//! - The hotsheet is edited in place through [`SheetAccess`]; [`Hotsheet`]
//!   backs it with umya-spreadsheet, [`MemorySheet`] with a map.

mod extract;
mod hotsheet;
mod memory;

pub use extract::Grid;
pub use hotsheet::{copy_hotsheet, working_copy_name, Hotsheet, HotsheetSection};
pub use memory::MemorySheet;

use crate::config::Column;
use crate::error::{HotsheetError, HotsheetResult};
use std::fmt;

/// Widest column an .xlsx sheet can hold (XFD).
pub const MAX_COLUMN: u32 = 16_384;
/// Deepest row an .xlsx sheet can hold.
pub const MAX_ROW: u32 = 1_048_576;

/// A validated cell address (1-based column and row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    column: Column,
    row: u32,
}

impl CellRef {
    pub fn new(column: Column, row: u32) -> HotsheetResult<Self> {
        if column.index() > MAX_COLUMN || row == 0 || row > MAX_ROW {
            return Err(HotsheetError::CellOutOfRange {
                column: column.letters(),
                row,
            });
        }
        Ok(Self { column, row })
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn row(&self) -> u32 {
        self.row
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

/// Cell-level access to one hotsheet section.
pub trait SheetAccess {
    /// Last row holding any data (0 for an empty sheet).
    fn last_row(&self) -> u32;

    /// Display text of a cell; blank cells read as `""`.
    fn read(&self, cell: CellRef) -> String;

    fn write_number(&mut self, cell: CellRef, value: f64) -> HotsheetResult<()>;

    /// Blank a cell so stale values do not survive a run.
    fn clear(&mut self, cell: CellRef) -> HotsheetResult<()>;

    fn read_at(&self, column: Column, row: u32) -> HotsheetResult<String> {
        Ok(self.read(CellRef::new(column, row)?))
    }

    fn write_number_at(&mut self, column: Column, row: u32, value: f64) -> HotsheetResult<()> {
        self.write_number(CellRef::new(column, row)?, value)
    }

    fn write_int_at(&mut self, column: Column, row: u32, value: i64) -> HotsheetResult<()> {
        self.write_number(CellRef::new(column, row)?, value as f64)
    }

    fn clear_at(&mut self, column: Column, row: u32) -> HotsheetResult<()> {
        self.clear(CellRef::new(column, row)?)
    }
}
