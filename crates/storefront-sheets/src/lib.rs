//! Google Sheets mirror of the product catalog.
//!
//! [`SheetSync`] keeps the `Products` sheet in step with the `products` table
//! and applies edits made in the sheet back to the datastore.
//! [`GoogleSheetsClient`] talks to the Sheets v4 REST API.

mod auth;
pub mod client;
pub mod error;
pub mod range;
pub mod row;
pub mod store;
pub mod sync;
pub mod table;

pub use client::GoogleSheetsClient;
pub use error::{SheetsError, SyncError};
pub use row::{HEADER, SHEET_NAME};
pub use store::ProductRepository;
pub use sync::{InboundOutcome, InboundUpdate, SheetSync};
pub use table::SheetTable;
