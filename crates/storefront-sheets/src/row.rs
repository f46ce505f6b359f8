//! Conversion between products and sheet rows.
//!
//! Outbound, a product becomes nine string cells in the order of [`HEADER`].
//! Inbound, the loosely typed `data` object posted by the sheet's script is
//! coerced into a [`ProductPatch`]; fields that fail coercion are logged and
//! dropped rather than failing the whole update.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use storefront_db::{ProductPatch, ProductSheetRow};
use uuid::Uuid;

pub const SHEET_NAME: &str = "Products";

pub const COLUMN_COUNT: usize = 9;

pub const HEADER: [&str; COLUMN_COUNT] = [
    "ID",
    "Name",
    "Description",
    "Price",
    "Stock",
    "Category",
    "User",
    "Created At",
    "Updated At",
];

#[must_use]
pub fn header_row() -> Vec<String> {
    HEADER.iter().map(|h| (*h).to_string()).collect()
}

#[must_use]
pub fn blank_row() -> Vec<String> {
    vec![String::new(); COLUMN_COUNT]
}

/// True when `cells` is exactly the header. Trailing cells past column I are
/// ignored.
#[must_use]
pub fn is_header(cells: &[String]) -> bool {
    cells.len() >= COLUMN_COUNT && cells.iter().zip(HEADER).all(|(cell, label)| cell == label)
}

#[must_use]
pub fn product_to_row(product: &ProductSheetRow) -> Vec<String> {
    vec![
        product.id.to_string(),
        product.name.clone(),
        product.description.clone(),
        format_price(product.price),
        product.stock.to_string(),
        product.category_name.clone().unwrap_or_default(),
        product.owner_name.clone().unwrap_or_default(),
        format_timestamp(product.created_at),
        format_timestamp(product.updated_at),
    ]
}

/// Trailing zeros are dropped, so a stored `50.00` is written as `50`.
#[must_use]
pub fn format_price(price: Decimal) -> String {
    price.normalize().to_string()
}

/// RFC 3339, millisecond precision, `Z` suffix.
#[must_use]
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

const NAME_KEYS: [&str; 2] = ["name", "Name"];
const DESCRIPTION_KEYS: [&str; 2] = ["description", "Description"];
const PRICE_KEYS: [&str; 2] = ["price", "Price"];
const STOCK_KEYS: [&str; 2] = ["stock", "Stock"];
const ID_KEYS: [&str; 2] = ["id", "ID"];

fn first_present<'a>(data: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| data.get(*key).filter(|v| !v.is_null()))
}

/// Reads the product id from an inbound `data` object.
///
/// Returns `Ok(None)` when no id key is present and `Err` with the raw value
/// when one is present but is not a UUID.
pub fn inbound_id(data: &Map<String, Value>) -> Result<Option<Uuid>, String> {
    let Some(value) = first_present(data, &ID_KEYS) else {
        return Ok(None);
    };
    let raw = value_as_text(value);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(trimmed).map(Some).map_err(|_| raw)
}

/// Builds a sparse patch from the known fields of an inbound `data` object.
#[must_use]
pub fn inbound_patch(data: &Map<String, Value>) -> ProductPatch {
    let mut patch = ProductPatch::default();

    if let Some(value) = first_present(data, &NAME_KEYS) {
        let name = value_as_text(value);
        let name = name.trim();
        if name.is_empty() {
            tracing::warn!("ignoring empty name from sheet update");
        } else {
            patch.name = Some(name.to_string());
        }
    }

    if let Some(value) = first_present(data, &DESCRIPTION_KEYS) {
        patch.description = Some(value_as_text(value));
    }

    if let Some(value) = first_present(data, &PRICE_KEYS) {
        match coerce_price(value) {
            Some(price) => patch.price = Some(price),
            None => tracing::warn!(value = %value, "dropping unparseable price from sheet update"),
        }
    }

    if let Some(value) = first_present(data, &STOCK_KEYS) {
        match coerce_stock(value) {
            Some(stock) => patch.stock = Some(stock),
            None => tracing::warn!(value = %value, "dropping unparseable stock from sheet update"),
        }
    }

    patch
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_price(value: &Value) -> Option<Decimal> {
    let text = value_as_text(value);
    let price = text.trim().parse::<Decimal>().ok()?;
    storefront_core::validation::validate_price(price).ok()?;
    Some(price)
}

fn coerce_stock(value: &Value) -> Option<i32> {
    let stock = match value {
        Value::Number(n) => i32::try_from(n.as_i64()?).ok()?,
        Value::String(s) => s.trim().parse::<i32>().ok()?,
        _ => return None,
    };
    storefront_core::validation::validate_stock(stock).ok()?;
    Some(stock)
}
