use thiserror::Error;
use uuid::Uuid;

/// Errors returned by the Google Sheets client.
#[derive(Debug, Error)]
pub enum SheetsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Sheets API answered with a non-2xx status.
    #[error("Sheets API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Signing the service-account assertion or exchanging it for a token failed.
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Errors surfaced by reconciliation operations.
///
/// Outbound sync swallows these after logging; inbound updates return them to
/// the webhook caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("unexpected sheet '{0}', only 'Products' is synchronized")]
    WrongSheet(String),

    #[error("invalid sheet update: {0}")]
    Validation(String),

    #[error("product {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Sheets(#[from] SheetsError),

    #[error(transparent)]
    Store(#[from] storefront_db::DbError),
}
