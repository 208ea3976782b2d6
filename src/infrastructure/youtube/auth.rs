use async_trait::async_trait;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::common::error::{AppError, AppResult};

pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW: Duration = Duration::seconds(60);
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Supplies bearer credentials for the video-hosting API.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> AppResult<String>;
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        now + EXPIRY_SKEW >= self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// OAuth2 refresh-token flow. The access token is cached and refreshed
/// transparently once it is about to expire.
pub struct RefreshTokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: Mutex<Option<CachedToken>>,
}

impl RefreshTokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            cached: Mutex::new(None),
        }
    }

    async fn refresh(&self) -> AppResult<CachedToken> {
        if self.refresh_token.is_empty() {
            return Err(AppError::Authentication("no refresh token configured".to_string()));
        }

        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", UPLOAD_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Token refresh rejected ({}): {}", status, body);
            return Err(AppError::Authentication(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("malformed token response: {}", e)))?;

        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        info!("YouTube credentials refreshed, valid for {}s", expires_in);

        Ok(CachedToken {
            value: token.access_token,
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for RefreshTokenProvider {
    async fn access_token(&self) -> AppResult<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(OffsetDateTime::now_utc()) {
                return Ok(token.value.clone());
            }
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}
