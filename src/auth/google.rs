//! OAuth access tokens for the Google Sheets API.
//!
//! Two strategies, picked once at startup from the run mode:
//!
//! - [`GoogleAuth::Local`]: a cached token file next to the working directory,
//!   refreshed and written back when it has expired
//! - [`GoogleAuth::Hosted`]: client secrets and a refresh token handed in
//!   through the environment, exchanged for a fresh access token every run
//!
//! Both read the OAuth client from the `google-oauth.json` client secrets
//! format (`{"installed": {...}}` or `{"web": {...}}`).

use crate::error::{HarvestError, Result};
use crate::http::expect_success;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthClient {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Deserialize)]
struct ClientSecrets {
    installed: Option<OAuthClient>,
    web: Option<OAuthClient>,
}

impl OAuthClient {
    /// Parse a client secrets document.
    pub fn from_json(raw: &str) -> Result<Self> {
        let secrets: ClientSecrets = serde_json::from_str(raw)?;
        secrets.installed.or(secrets.web).ok_or_else(|| {
            HarvestError::AuthFailure("client secrets have neither `installed` nor `web`".into())
        })
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            HarvestError::AuthFailure(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

/// Cached token file contents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Usable for at least another minute.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|exp| exp - Duration::seconds(60) > now)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub enum GoogleAuth {
    Local {
        client: OAuthClient,
        token_path: PathBuf,
    },
    Hosted {
        client: OAuthClient,
        refresh_token: String,
    },
}

impl GoogleAuth {
    /// Return an access token valid for the rest of the run.
    #[instrument(level = "info", skip_all)]
    pub async fn access_token(&self, http: &Client) -> Result<String> {
        match self {
            GoogleAuth::Local { client, token_path } => {
                let raw = tokio::fs::read_to_string(token_path).await.map_err(|e| {
                    HarvestError::AuthFailure(format!(
                        "no cached Google token at {} ({}); authorize once and save the token there",
                        token_path.display(),
                        e
                    ))
                })?;
                let stored: StoredToken = serde_json::from_str(&raw)?;
                if stored.is_fresh(Utc::now()) {
                    info!(path = %token_path.display(), "Loaded Google token from file");
                    return Ok(stored.access_token);
                }
                let refresh_token = stored.refresh_token.clone().ok_or_else(|| {
                    HarvestError::AuthFailure(
                        "cached Google token expired and has no refresh token".into(),
                    )
                })?;
                let refreshed = refresh(http, client, &refresh_token).await?;
                tokio::fs::write(token_path, serde_json::to_string_pretty(&refreshed)?).await?;
                info!(path = %token_path.display(), "Refreshed Google token and saved it");
                Ok(refreshed.access_token)
            }
            GoogleAuth::Hosted {
                client,
                refresh_token,
            } => {
                let refreshed = refresh(http, client, refresh_token).await?;
                info!("Obtained Google token from environment refresh token");
                Ok(refreshed.access_token)
            }
        }
    }
}

async fn refresh(http: &Client, client: &OAuthClient, refresh_token: &str) -> Result<StoredToken> {
    let params = [
        ("grant_type", "refresh_token"),
        ("client_id", client.client_id.as_str()),
        ("client_secret", client.client_secret.as_str()),
        ("refresh_token", refresh_token),
    ];
    let resp = http.post(TOKEN_ENDPOINT).form(&params).send().await?;
    let resp = expect_success(resp)
        .await
        .map_err(|e| HarvestError::AuthFailure(format!("token refresh rejected: {}", e)))?;
    let body: TokenResponse = resp.json().await?;

    Ok(StoredToken {
        access_token: body.access_token,
        refresh_token: body.refresh_token.or_else(|| Some(refresh_token.to_string())),
        expires_at: body
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs)),
    })
}
