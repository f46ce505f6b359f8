//! Reconciliation between the `products` table and the `Products` sheet.
//!
//! Outbound operations (`full_sync`, `upsert_product`, `remove_product`) are
//! best-effort: failures are logged and never reach the caller, so a sheet
//! outage cannot fail a product mutation. Inbound updates from the sheet's
//! webhook return their errors so the caller can report them upstream.
//!
//! Writes for one product id are serialized, and `full_sync` excludes all of
//! them, so a scan followed by a write never races another writer in this
//! process.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError};

use serde::Deserialize;
use serde_json::{Map, Value};
use sqlx::PgPool;
use storefront_core::SheetsConfig;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::client::GoogleSheetsClient;
use crate::error::SyncError;
use crate::range::SCAN_LIMIT;
use crate::row::{blank_row, header_row, inbound_id, inbound_patch, is_header, product_to_row, SHEET_NAME};
use crate::store::ProductRepository;
use crate::table::SheetTable;

/// Body posted by the sheet's script to `POST /google-sheets/update`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundUpdate {
    pub sheet_name: String,
    pub action: String,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
    #[serde(default)]
    pub row: Option<i64>,
}

/// What an inbound update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    Updated(Uuid),
    Deleted(Uuid),
    /// The referenced row had no id in column A.
    EmptyRow(u32),
    /// The integration is disabled.
    Skipped,
}

impl fmt::Display for InboundOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Updated(id) => write!(f, "updated product {id}"),
            Self::Deleted(id) => write!(f, "deleted product {id}"),
            Self::EmptyRow(row) => write!(f, "row {row} is empty, nothing to delete"),
            Self::Skipped => write!(f, "sheet integration disabled, update ignored"),
        }
    }
}

/// Per-id async mutexes. Entries nobody holds or waits on are pruned on the
/// next acquisition.
#[derive(Default)]
struct KeyedLocks {
    inner: std::sync::Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(id).or_default())
        };
        entry.lock_owned().await
    }
}

pub struct SheetSync {
    sheet: Option<Arc<dyn SheetTable>>,
    products: Arc<dyn ProductRepository>,
    sheet_lock: RwLock<()>,
    row_locks: KeyedLocks,
}

impl SheetSync {
    #[must_use]
    pub fn new(sheet: Option<Arc<dyn SheetTable>>, products: Arc<dyn ProductRepository>) -> Self {
        Self {
            sheet,
            products,
            sheet_lock: RwLock::new(()),
            row_locks: KeyedLocks::default(),
        }
    }

    /// Builds the service from configuration. Missing configuration or a
    /// client that cannot be constructed leaves the integration disabled.
    #[must_use]
    pub fn from_config(config: Option<&SheetsConfig>, pool: PgPool) -> Self {
        let products: Arc<dyn ProductRepository> = Arc::new(pool);
        let Some(config) = config else {
            tracing::warn!("Google Sheets configuration is incomplete; sheet sync disabled");
            return Self::new(None, products);
        };

        match GoogleSheetsClient::new(config) {
            Ok(client) => {
                tracing::info!(spreadsheet_id = %config.spreadsheet_id, "Google Sheets sync enabled");
                Self::new(Some(Arc::new(client)), products)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialise Google Sheets client; sheet sync disabled");
                Self::new(None, products)
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sheet.is_some()
    }

    /// Rewrites the whole sheet from the datastore. Errors are logged.
    pub async fn full_sync(&self) {
        if let Err(e) = self.try_full_sync().await {
            tracing::error!(error = %e, "full sheet sync failed");
        }
    }

    /// Like [`SheetSync::full_sync`] but returns the outcome: the number of
    /// product rows written, `0` when disabled.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the datastore or the Sheets API fails.
    pub async fn try_full_sync(&self) -> Result<usize, SyncError> {
        let Some(sheet) = self.sheet.as_deref() else {
            tracing::warn!("Google Sheets not configured; skipping full sync");
            return Ok(0);
        };

        let _exclusive = self.sheet_lock.write().await;

        let products = self.products.list_sheet_products().await?;
        let rows: Vec<Vec<String>> = products.iter().map(product_to_row).collect();
        let count = rows.len();

        sheet.clear().await?;
        sheet.write_row(1, header_row()).await?;
        sheet.append_rows(rows).await?;

        tracing::info!(products = count, "synced all products to Google Sheets");
        Ok(count)
    }

    /// Writes one product's row, overwriting it in place when present.
    pub async fn upsert_product(&self, id: Uuid) {
        let Some(sheet) = self.sheet.as_deref() else {
            tracing::warn!(product_id = %id, "Google Sheets not configured; skipping product sync");
            return;
        };

        let _shared = self.sheet_lock.read().await;
        let _row = self.row_locks.lock(id).await;

        if let Err(e) = self.write_product_row(sheet, id).await {
            tracing::error!(product_id = %id, error = %e, "failed to sync product to Google Sheets");
        }
    }

    /// Blanks the product's row. The row itself stays so other row numbers
    /// do not shift.
    pub async fn remove_product(&self, id: Uuid) {
        let Some(sheet) = self.sheet.as_deref() else {
            tracing::warn!(product_id = %id, "Google Sheets not configured; skipping product removal");
            return;
        };

        let _shared = self.sheet_lock.read().await;
        let _row = self.row_locks.lock(id).await;

        if let Err(e) = self.blank_product_row(sheet, id).await {
            tracing::error!(product_id = %id, error = %e, "failed to remove product from Google Sheets");
        }
    }

    async fn write_product_row(&self, sheet: &dyn SheetTable, id: Uuid) -> Result<(), SyncError> {
        let Some(product) = self.products.get_sheet_product(id).await? else {
            tracing::warn!(product_id = %id, "product not found; nothing to sync");
            return Ok(());
        };
        let cells = product_to_row(&product);

        let rows = sheet.read_rows(1, SCAN_LIMIT).await?;
        match rows.first() {
            Some(first) if is_header(first) => {}
            Some(first) if first.iter().any(|c| !c.trim().is_empty()) => {
                tracing::warn!("row 1 of the Products sheet is not the expected header");
            }
            _ => sheet.write_row(1, header_row()).await?,
        }

        if let Some(row) = find_product_row(&rows, id) {
            sheet.write_row(row, cells).await?;
            tracing::info!(product_id = %id, row, "updated product row in Google Sheets");
        } else {
            sheet.append_rows(vec![cells]).await?;
            tracing::info!(product_id = %id, "appended product row to Google Sheets");
        }
        Ok(())
    }

    async fn blank_product_row(&self, sheet: &dyn SheetTable, id: Uuid) -> Result<(), SyncError> {
        let rows = sheet.read_rows(1, SCAN_LIMIT).await?;
        if let Some(row) = find_product_row(&rows, id) {
            sheet.write_row(row, blank_row()).await?;
            tracing::info!(product_id = %id, row, "removed product from Google Sheets");
        } else {
            tracing::debug!(product_id = %id, "product not present in sheet");
        }
        Ok(())
    }

    /// Applies an edit made in the sheet to the datastore.
    ///
    /// # Errors
    ///
    /// - [`SyncError::WrongSheet`] when the payload names another sheet.
    /// - [`SyncError::Validation`] for an unknown action, a missing or
    ///   malformed `data.id`, or a missing or header `row`.
    /// - [`SyncError::NotFound`] when the product does not exist; nothing is
    ///   written in that case.
    /// - [`SyncError::Sheets`] or [`SyncError::Store`] on I/O failure.
    pub async fn apply_inbound(&self, update: &InboundUpdate) -> Result<InboundOutcome, SyncError> {
        let Some(sheet) = self.sheet.as_deref() else {
            tracing::warn!(sheet = %update.sheet_name, "Google Sheets not configured; ignoring sheet update");
            return Ok(InboundOutcome::Skipped);
        };

        if update.sheet_name != SHEET_NAME {
            return Err(SyncError::WrongSheet(update.sheet_name.clone()));
        }

        match update.action.as_str() {
            "update" => self.apply_inbound_update(update.data.as_ref()).await,
            "delete" => self.apply_inbound_delete(sheet, update.row).await,
            other => Err(SyncError::Validation(format!("unknown action '{other}'"))),
        }
    }

    async fn apply_inbound_update(
        &self,
        data: Option<&Map<String, Value>>,
    ) -> Result<InboundOutcome, SyncError> {
        let data = data.ok_or_else(|| SyncError::Validation("update requires data.id".to_string()))?;
        let id = inbound_id(data)
            .map_err(|raw| SyncError::Validation(format!("invalid product id '{raw}'")))?
            .ok_or_else(|| SyncError::Validation("update requires data.id".to_string()))?;

        let patch = inbound_patch(data);
        if self.products.update_product(id, &patch).await?.is_none() {
            return Err(SyncError::NotFound(id));
        }

        tracing::info!(product_id = %id, "applied sheet update to product");
        Ok(InboundOutcome::Updated(id))
    }

    async fn apply_inbound_delete(
        &self,
        sheet: &dyn SheetTable,
        row: Option<i64>,
    ) -> Result<InboundOutcome, SyncError> {
        let row = row
            .and_then(|r| u32::try_from(r).ok())
            .filter(|r| *r >= 2)
            .ok_or_else(|| SyncError::Validation("delete requires a data row number (>= 2)".to_string()))?;

        let Some(raw) = sheet.read_id(row).await? else {
            tracing::info!(row, "sheet delete references an empty row; nothing to do");
            return Ok(InboundOutcome::EmptyRow(row));
        };
        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| SyncError::Validation(format!("row {row} does not hold a product id")))?;

        if !self.products.delete_product(id).await? {
            return Err(SyncError::NotFound(id));
        }

        tracing::info!(product_id = %id, row, "deleted product from sheet request");
        Ok(InboundOutcome::Deleted(id))
    }
}

/// 1-based row number of the first data row whose column A equals `id`.
fn find_product_row(rows: &[Vec<String>], id: Uuid) -> Option<u32> {
    let needle = id.to_string();
    rows.iter()
        .enumerate()
        .skip(1)
        .find(|(_, cells)| cells.first().is_some_and(|cell| cell.trim() == needle))
        .and_then(|(index, _)| u32::try_from(index + 1).ok())
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
