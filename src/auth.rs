//! Service-account OAuth2: a signed JWT assertion exchanged for a bearer token.

use crate::http::check_status;
use anyhow::{anyhow, Context, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
/// Refresh this long before the server-side expiry.
const EXPIRY_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading key file: {}", path.display()))?;
        let key: ServiceAccountKey = serde_json::from_str(&raw)
            .with_context(|| format!("parsing key file: {}", path.display()))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(anyhow!(
                "key file is missing client_email or private_key: {}",
                path.display()
            ));
        }
        Ok(key)
    }
}

#[derive(Debug, Serialize)]
pub struct Claims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

pub fn sign_assertion(key: &ServiceAccountKey, scope: &str, aud: &str) -> Result<String> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let claims = Claims {
        iss: &key.client_email,
        scope,
        aud,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .with_context(|| "private_key is not a valid RSA PEM")?;
    Ok(encode(&header, &claims, &signing_key)?)
}

/// Bearer tokens for one scope, re-minted when close to expiry.
pub struct TokenSource {
    http: Client,
    key: ServiceAccountKey,
    scope: String,
    token_uri: String,
    cached: RefCell<Option<(String, Instant)>>,
}

impl TokenSource {
    pub fn new(http: Client, key: ServiceAccountKey, scope: &str, token_uri_override: &str) -> Self {
        let token_uri = if !token_uri_override.is_empty() {
            token_uri_override.to_string()
        } else {
            key.token_uri
                .clone()
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string())
        };
        Self {
            http,
            key,
            scope: scope.to_string(),
            token_uri,
            cached: RefCell::new(None),
        }
    }

    pub fn bearer(&self) -> Result<String> {
        if let Some((token, expires)) = self.cached.borrow().as_ref() {
            if Instant::now() + EXPIRY_SLACK < *expires {
                return Ok(token.clone());
            }
        }

        debug!("minting access token scope={}", self.scope);
        let assertion = sign_assertion(&self.key, &self.scope, &self.token_uri)?;
        let resp = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .with_context(|| format!("token request to {}", self.token_uri))?;
        let resp = check_status(resp, "token exchange")?;
        let tok: TokenResponse = resp.json().with_context(|| "parsing token response")?;

        let lifetime = Duration::from_secs(tok.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
        *self.cached.borrow_mut() = Some((tok.access_token.clone(), Instant::now() + lifetime));
        Ok(tok.access_token)
    }
}
