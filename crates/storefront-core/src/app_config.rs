use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Credentials for the Google Sheets integration.
///
/// Either a service account (exchanged for short-lived tokens) or a token
/// issued out of band.
#[derive(Clone, PartialEq, Eq)]
pub enum SheetsCredentials {
    ServiceAccount {
        client_email: String,
        private_key: String,
    },
    AccessToken(String),
}

impl std::fmt::Debug for SheetsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetsCredentials::ServiceAccount { client_email, .. } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("private_key", &"[redacted]")
                .finish(),
            SheetsCredentials::AccessToken(_) => {
                f.debug_tuple("AccessToken").field(&"[redacted]").finish()
            }
        }
    }
}

/// Everything the Sheets client needs. Present only when the integration is
/// fully configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub credentials: SheetsCredentials,
    pub request_timeout_secs: u64,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub sheets: Option<SheetsConfig>,
    pub sheet_webhook_secret: Option<String>,
    pub token_cleanup_cron: String,
    pub sheets_sync_cron: Option<String>,
}

impl AppConfig {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self.env, Environment::Development)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("sheets", &self.sheets)
            .field(
                "sheet_webhook_secret",
                &self.sheet_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("token_cleanup_cron", &self.token_cleanup_cron)
            .field("sheets_sync_cron", &self.sheets_sync_cron)
            .finish()
    }
}
