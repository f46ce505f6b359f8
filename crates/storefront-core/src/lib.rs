mod app_config;
pub mod catalog;
mod config;
pub mod validation;

use rust_decimal::Decimal;
use thiserror::Error;

pub use app_config::{AppConfig, Environment, SheetsConfig, SheetsCredentials};
pub use catalog::{normalize_page_size, CatalogQuery, Page};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(i16),
    #[error("price must not be negative, got {0}")]
    NegativePrice(Decimal),
    #[error("price must have at most 2 decimal places and not exceed 9999999999.99, got {0}")]
    PriceOutOfRange(Decimal),
    #[error("stock must not be negative, got {0}")]
    NegativeStock(i32),
    #[error("{field} must be 1-{max} characters")]
    InvalidName { field: &'static str, max: usize },
}
