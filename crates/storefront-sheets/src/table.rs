use async_trait::async_trait;

use crate::error::SheetsError;

/// Row-oriented access to the `Products` sheet.
///
/// Rows are 1-based as in the spreadsheet UI; row 1 holds the header.
/// [`crate::GoogleSheetsClient`] is the production implementation.
#[async_trait]
pub trait SheetTable: Send + Sync {
    /// Returns rows `first..=last`. Trailing empty rows and trailing empty
    /// cells may be omitted, as the Sheets API does.
    async fn read_rows(&self, first: u32, last: u32) -> Result<Vec<Vec<String>>, SheetsError>;

    /// Overwrites columns A:I of `row`.
    async fn write_row(&self, row: u32, cells: Vec<String>) -> Result<(), SheetsError>;

    /// Appends rows after the last non-empty row of the table.
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<(), SheetsError>;

    /// Clears every value on the sheet, header included.
    async fn clear(&self) -> Result<(), SheetsError>;

    /// Column A of `row`, `None` when the cell is empty.
    async fn read_id(&self, row: u32) -> Result<Option<String>, SheetsError> {
        let rows = self.read_rows(row, row).await?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|cells| cells.into_iter().next())
            .filter(|cell| !cell.trim().is_empty()))
    }
}
