//! A1-notation ranges for the `Products` sheet.

use crate::row::SHEET_NAME;

/// Last row examined when looking up a product by id.
pub const SCAN_LIMIT: u32 = 1000;

const LAST_COLUMN: char = 'I';

// `full_sync` clears wider than A:I so stray columns from manual edits go too.
const CLEAR_LAST_COLUMN: char = 'Z';

/// `Products!A{row}:I{row}`.
#[must_use]
pub fn row_range(row: u32) -> String {
    rows_range(row, row)
}

/// `Products!A{first}:I{last}`.
#[must_use]
pub fn rows_range(first: u32, last: u32) -> String {
    format!("{SHEET_NAME}!A{first}:{LAST_COLUMN}{last}")
}

/// Column A of a single row.
#[must_use]
pub fn id_cell(row: u32) -> String {
    format!("{SHEET_NAME}!A{row}:A{row}")
}

/// Target for appends: the whole A:I table.
#[must_use]
pub fn table_range() -> String {
    format!("{SHEET_NAME}!A:{LAST_COLUMN}")
}

#[must_use]
pub fn clear_range() -> String {
    format!("{SHEET_NAME}!A1:{CLEAR_LAST_COLUMN}{SCAN_LIMIT}")
}
