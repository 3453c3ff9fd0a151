// =============================================================================
// SERVICE ACCOUNT AUTHENTICATION
// =============================================================================
//
// OAuth2 for server-to-server calls: sign a JWT with the service account's
// private key, exchange it at the token URI for a bearer token, and cache the
// token until shortly before it expires.
//
// **Setup:**
// 1. Create a service account in Google Cloud Console and enable the Sheets API.
// 2. Download a JSON key for it.
// 3. Share the schedule spreadsheet with the service account email as Editor.
// 4. Set `GOOGLE_SERVICE_ACCOUNT_KEY` (path to the key file) or
//    `GOOGLE_SERVICE_ACCOUNT_JSON` (the key itself, for deployments).

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use crate::core::schedule::SheetStoreError;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Google caps assertion lifetime at one hour.
const ASSERTION_LIFETIME_SECS: u64 = 3600;
/// Tokens this close to expiry are replaced before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Anything that can hand out a bearer token for the Sheets API.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetStoreError>;
}

/// A fixed token, for short-lived scripts and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetStoreError> {
        Ok(self.0.clone())
    }
}

/// The parts of a downloaded key file needed to sign assertions.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

struct IssuedToken {
    value: String,
    expires_at: SystemTime,
}

impl IssuedToken {
    fn usable_at(&self, now: SystemTime) -> bool {
        self.expires_at > now + REFRESH_MARGIN
    }
}

/// Bearer tokens for a service account, fetched lazily and reused until near expiry.
pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    scope: String,
    client: Client,
    token: RwLock<Option<IssuedToken>>,
}

impl ServiceAccountAuth {
    pub async fn from_file(path: &str) -> Result<Self, SheetStoreError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SheetStoreError::Auth(format!("Cannot read key file {}: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, SheetStoreError> {
        let key: ServiceAccountKey = serde_json::from_str(json)
            .map_err(|e| SheetStoreError::Auth(format!("Malformed service account key: {}", e)))?;
        Ok(Self {
            key,
            scope: SPREADSHEETS_SCOPE.to_string(),
            client: Client::new(),
            token: RwLock::new(None),
        })
    }

    /// Key file path wins over inline JSON when both are set.
    pub async fn from_env() -> Result<Self, SheetStoreError> {
        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }
        if let Ok(json) = std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            return Self::from_json(&json);
        }
        Err(SheetStoreError::Auth(
            "Set GOOGLE_SERVICE_ACCOUNT_KEY or GOOGLE_SERVICE_ACCOUNT_JSON".into(),
        ))
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn sign_assertion(&self) -> Result<String, SheetStoreError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SheetStoreError::Auth(e.to_string()))?
            .as_secs();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())
            .map_err(|e| SheetStoreError::Auth(format!("Invalid private key: {}", e)))?;
        encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| SheetStoreError::Auth(e.to_string()))
    }

    async fn request_token(&self) -> Result<IssuedToken, SheetStoreError> {
        let assertion = self.sign_assertion()?;
        tracing::debug!(client_email = %self.key.client_email, "Requesting access token");

        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| SheetStoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetStoreError::Auth(format!(
                "Token exchange failed ({}): {}",
                status, body
            )));
        }

        let granted: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetStoreError::Decode(e.to_string()))?;
        let lifetime = granted.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(IssuedToken {
            value: granted.access_token,
            expires_at: SystemTime::now() + Duration::from_secs(lifetime),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, SheetStoreError> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.usable_at(SystemTime::now()) {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = slot.as_ref() {
            if token.usable_at(SystemTime::now()) {
                return Ok(token.value.clone());
            }
        }
        let token = self.request_token().await?;
        let value = token.value.clone();
        *slot = Some(token);
        Ok(value)
    }
}
