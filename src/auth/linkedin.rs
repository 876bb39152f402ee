//! LinkedIn session management.
//!
//! The session lives in a `reqwest` cookie jar shared with the LinkedIn
//! content source. Between runs the LinkedIn cookies are kept in a JSON state
//! file (by default `~/Downloads/linkedin-auth.json`). When no state file
//! exists, or the jobs page still asks the visitor to sign in, a credential
//! login is performed and the resulting cookies are saved.

use super::Authenticator;
use crate::error::{HarvestError, Result};
use crate::guard::{Policy, guard};
use crate::http::expect_success;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use url::Url;

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const LOGIN_SUBMIT_URL: &str = "https://www.linkedin.com/checkpoint/lg/login-submit";
const JOBS_URL: &str = "https://www.linkedin.com/jobs/search/";
const SIGN_IN_MARKER: &str = "Sign in to view more jobs";
const SESSION_COOKIE: &str = "li_at";

static LINKEDIN_ROOT: Lazy<Url> = Lazy::new(|| Url::parse("https://www.linkedin.com/").unwrap());
static CSRF_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"input[name="loginCsrfParam"]"#).unwrap());

/// Default location of the session state file.
pub fn default_state_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join("Downloads")
        .join("linkedin-auth.json")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
}

/// Contents of the session state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub cookies: Vec<StoredCookie>,
    pub saved_at: DateTime<Utc>,
}

impl SessionState {
    /// Parse a `Cookie` header value (`a=1; b=2`).
    pub fn from_cookie_header(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                (!name.is_empty()).then(|| StoredCookie {
                    name: name.to_string(),
                    value: value.to_string(),
                })
            })
            .collect();
        SessionState {
            cookies,
            saved_at: Utc::now(),
        }
    }

    pub fn has_session_cookie(&self) -> bool {
        self.cookies.iter().any(|c| c.name == SESSION_COOKIE && !c.value.is_empty())
    }
}

/// Extract the hidden CSRF token from the login form.
pub fn login_csrf(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&CSRF_INPUT)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(str::to_string)
}

pub struct LinkedInAuth {
    http: Client,
    jar: Arc<Jar>,
    state_path: PathBuf,
    username: Option<String>,
    password: Option<String>,
    probe_timeout: Duration,
}

impl LinkedInAuth {
    pub fn new(
        http: Client,
        jar: Arc<Jar>,
        state_path: PathBuf,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            http,
            jar,
            state_path,
            username,
            password,
            probe_timeout: Duration::from_secs(5),
        }
    }

    /// Load stored cookies into the jar. `false` when there is no state file.
    #[instrument(level = "info", skip_all, fields(path = %self.state_path.display()))]
    async fn load_state(&self) -> Result<bool> {
        let raw = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let state: SessionState = serde_json::from_str(&raw)?;
        for cookie in &state.cookies {
            self.jar.add_cookie_str(
                &format!("{}={}; Domain=.linkedin.com; Path=/", cookie.name, cookie.value),
                &LINKEDIN_ROOT,
            );
        }
        info!(
            cookies = state.cookies.len(),
            saved_at = %state.saved_at,
            "Loaded LinkedIn session state"
        );
        Ok(true)
    }

    fn current_state(&self) -> Option<SessionState> {
        let header = self.jar.cookies(&LINKEDIN_ROOT)?;
        let header = header.to_str().ok()?;
        Some(SessionState::from_cookie_header(header))
    }

    /// Write the jar's LinkedIn cookies to the state file. Failures are logged only.
    async fn save_state(&self) {
        let path = self.state_path.clone();
        let state = self.current_state();
        let _ = guard(
            "save_auth_state",
            json!({ "path": path.display().to_string() }),
            Policy::Suppress(()),
            async move {
                let state = state
                    .ok_or_else(|| HarvestError::AuthFailure("no cookies to save".into()))?;
                if let Some(dir) = path.parent() {
                    tokio::fs::create_dir_all(dir).await?;
                }
                tokio::fs::write(&path, serde_json::to_string(&state)?).await?;
                info!(path = %path.display(), "Saved LinkedIn session state");
                Ok(())
            },
        )
        .await;
    }

    /// Submit the login form with the configured credentials.
    #[instrument(level = "info", skip_all)]
    async fn login(&self) -> Result<()> {
        let password = self
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| HarvestError::AuthFailure("LINKEDIN_PASSWORD is not set".into()))?;
        let username = self.username.as_deref().unwrap_or_default();
        if username.is_empty() {
            warn!("LINKEDIN_USERNAME is empty; relying on a remembered username");
        }

        let page = expect_success(self.http.get(LOGIN_URL).send().await?).await?;
        let html = page.text().await?;
        let csrf = login_csrf(&html)
            .ok_or_else(|| HarvestError::AuthFailure("login form has no CSRF token".into()))?;

        let form = [
            ("session_key", username),
            ("session_password", password),
            ("loginCsrfParam", csrf.as_str()),
        ];
        expect_success(self.http.post(LOGIN_SUBMIT_URL).form(&form).send().await?)
            .await
            .map_err(|e| HarvestError::AuthFailure(e.to_string()))?;

        match self.current_state() {
            Some(state) if state.has_session_cookie() => {
                info!("Logged in to LinkedIn");
                Ok(())
            }
            _ => Err(HarvestError::AuthFailure(
                "login did not produce a session cookie (wrong credentials or security checkpoint)".into(),
            )),
        }
    }

    /// Whether the jobs page still shows the sign-in prompt. Probe failures
    /// count as signed in.
    async fn sign_in_required(&self) -> bool {
        let probe = async {
            let resp = expect_success(self.http.get(JOBS_URL).send().await?).await?;
            Ok::<_, HarvestError>(resp.text().await?)
        };
        match timeout(self.probe_timeout, probe).await {
            Ok(Ok(body)) => body.contains(SIGN_IN_MARKER),
            Ok(Err(e)) => {
                warn!(error = %e, "Sign-in probe failed; assuming logged in");
                false
            }
            Err(_) => false,
        }
    }
}

impl Authenticator for LinkedInAuth {
    #[instrument(level = "info", skip_all)]
    async fn ensure_authenticated(&mut self) -> Result<()> {
        if !self.load_state().await? {
            info!("No stored LinkedIn session; logging in");
            self.login().await?;
            self.save_state().await;
        }
        if self.sign_in_required().await {
            info!("Not logged in, performing login");
            self.login().await?;
            self.save_state().await;
        }
        Ok(())
    }
}
