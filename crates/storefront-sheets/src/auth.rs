//! Access tokens for the Sheets API.
//!
//! A service account signs a short-lived RS256 assertion and trades it at the
//! OAuth token endpoint for a bearer token, which is cached until shortly
//! before it expires. A statically configured token is used as-is.

use std::time::{Duration, Instant};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use storefront_core::SheetsCredentials;
use tokio::sync::Mutex;

use crate::error::SheetsError;

pub(crate) const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub(crate) struct CachedToken {
    token: String,
    refresh_at: Instant,
}

pub(crate) enum TokenSource {
    Static(String),
    ServiceAccount {
        client_email: String,
        key: EncodingKey,
        token_url: String,
        cache: Mutex<Option<CachedToken>>,
    },
}

impl TokenSource {
    /// # Errors
    ///
    /// Returns [`SheetsError::Auth`] if the service-account private key is not
    /// a valid RSA PEM.
    pub(crate) fn from_credentials(
        credentials: &SheetsCredentials,
        token_url: &str,
    ) -> Result<Self, SheetsError> {
        match credentials {
            SheetsCredentials::AccessToken(token) => Ok(Self::Static(token.clone())),
            SheetsCredentials::ServiceAccount {
                client_email,
                private_key,
            } => {
                let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
                    .map_err(|e| SheetsError::Auth(format!("invalid private key: {e}")))?;
                Ok(Self::ServiceAccount {
                    client_email: client_email.clone(),
                    key,
                    token_url: token_url.to_owned(),
                    cache: Mutex::new(None),
                })
            }
        }
    }

    pub(crate) async fn access_token(&self, client: &reqwest::Client) -> Result<String, SheetsError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::ServiceAccount {
                client_email,
                key,
                token_url,
                cache,
            } => {
                let mut cached = cache.lock().await;
                if let Some(current) = cached.as_ref() {
                    if Instant::now() < current.refresh_at {
                        return Ok(current.token.clone());
                    }
                }

                let fresh = exchange_assertion(client, client_email, key, token_url).await?;
                let token = fresh.token.clone();
                *cached = Some(fresh);
                Ok(token)
            }
        }
    }
}

async fn exchange_assertion(
    client: &reqwest::Client,
    client_email: &str,
    key: &EncodingKey,
    token_url: &str,
) -> Result<CachedToken, SheetsError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: client_email,
        scope: SCOPE,
        aud: token_url,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let assertion = encode(&Header::new(Algorithm::RS256), &claims, key)
        .map_err(|e| SheetsError::Auth(format!("failed to sign assertion: {e}")))?;

    let response = client
        .post(token_url)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SheetsError::Auth(format!(
            "token exchange failed with status {}",
            response.status()
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| SheetsError::Auth(format!("token parse error: {e}")))?;

    let lifetime = Duration::from_secs(body.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS));
    tracing::debug!(expires_in = lifetime.as_secs(), "obtained Sheets access token");

    Ok(CachedToken {
        token: body.access_token,
        refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let source = TokenSource::from_credentials(
            &SheetsCredentials::AccessToken("ya29.static".to_string()),
            DEFAULT_TOKEN_URL,
        )
        .expect("static token source");
        let client = reqwest::Client::new();
        assert_eq!(
            source.access_token(&client).await.expect("token"),
            "ya29.static"
        );
    }

    #[test]
    fn malformed_private_key_is_an_auth_error() {
        let result = TokenSource::from_credentials(
            &SheetsCredentials::ServiceAccount {
                client_email: "svc@example.iam.gserviceaccount.com".to_string(),
                private_key: "not a pem".to_string(),
            },
            DEFAULT_TOKEN_URL,
        );
        assert!(matches!(result, Err(SheetsError::Auth(_))));
    }
}
