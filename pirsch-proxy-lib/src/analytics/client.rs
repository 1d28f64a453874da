use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::error::AnalyticsError;
use super::types::{Domain, Event, PageView};
use crate::config::{ClientConfig, UpstreamConfig};

pub mod endpoints {
    pub const TOKEN: &str = "/api/v1/token";
    pub const HIT: &str = "/api/v1/hit";
    pub const EVENT: &str = "/api/v1/event";
    pub const SESSION: &str = "/api/v1/session";
    pub const DOMAIN: &str = "/api/v1/domain";
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Authenticated client for one set of analytics API credentials.
///
/// OAuth clients (non-empty id) exchange id and secret for an access token
/// and refresh it whenever a request is rejected. Clients without an id use
/// the secret as a static bearer token and never refresh.
pub struct AnalyticsClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    access_token: RwLock<Option<String>>,
    request_retries: u32,
    retry_backoff: Duration,
}

impl AnalyticsClient {
    pub fn new(
        credentials: &ClientConfig,
        base_url: &str,
        upstream: &UpstreamConfig,
    ) -> Result<Self, AnalyticsError> {
        let http = reqwest::Client::builder()
            .timeout(upstream.timeout())
            .build()?;
        let access_token =
            credentials.id.is_empty().then(|| credentials.secret.clone());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: credentials.id.clone(),
            client_secret: credentials.secret.clone(),
            access_token: RwLock::new(access_token),
            request_retries: upstream.request_retries,
            retry_backoff: Duration::from_secs(1),
        })
    }

    /// Base delay between attempts; attempt `n` waits `n * backoff`
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn id(&self) -> &str {
        &self.client_id
    }

    pub fn uses_oauth(&self) -> bool {
        !self.client_id.is_empty()
    }

    pub async fn page_view(&self, page_view: &PageView) -> Result<(), AnalyticsError> {
        self.post(endpoints::HIT, page_view).await
    }

    pub async fn event(&self, event: &Event) -> Result<(), AnalyticsError> {
        self.post(endpoints::EVENT, event).await
    }

    /// Extend the visitor's session without counting a page view
    pub async fn session(&self, page_view: &PageView) -> Result<(), AnalyticsError> {
        self.post(endpoints::SESSION, page_view).await
    }

    /// Fetch the single domain these credentials are bound to
    pub async fn verify(&self) -> Result<Domain, AnalyticsError> {
        let url = self.url(endpoints::DOMAIN);
        let resp = self
            .execute(&url, |token| self.http.get(&url).bearer_auth(token))
            .await?;
        let mut domains: Vec<Domain> = resp.json().await?;

        if domains.len() != 1 {
            return Err(AnalyticsError::DomainNotFound);
        }
        domains.pop().ok_or(AnalyticsError::DomainNotFound)
    }

    async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> Result<(), AnalyticsError> {
        let url = self.url(endpoint);
        self.execute(&url, |token| self.http.post(&url).bearer_auth(token).json(body))
            .await?;
        Ok(())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Send a request, refreshing the access token and retrying while
    /// attempts remain. Anything but 200 is an error.
    async fn execute<F>(&self, url: &str, build: F) -> Result<Response, AnalyticsError>
    where
        F: Fn(&str) -> RequestBuilder,
    {
        let mut retries_left = self.request_retries;

        loop {
            if self.uses_oauth() && retries_left > 0 && self.access_token.read().await.is_none() {
                self.refresh_with_backoff(retries_left).await?;
                retries_left -= 1;
                continue;
            }

            let token = self.access_token.read().await.clone().unwrap_or_default();
            let resp = build(&token).send().await?;
            let status = resp.status();

            if status == StatusCode::OK {
                return Ok(resp);
            }

            if self.uses_oauth() && retries_left > 0 {
                debug!(%url, %status, "request rejected, refreshing access token");
                self.refresh_with_backoff(retries_left).await?;
                retries_left -= 1;
                continue;
            }

            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyticsError::Status { url: url.to_string(), status: status.as_u16(), body });
        }
    }

    async fn refresh_with_backoff(&self, retries_left: u32) -> Result<(), AnalyticsError> {
        let attempt = self.request_retries.saturating_sub(retries_left).saturating_add(1);
        tokio::time::sleep(self.retry_backoff.saturating_mul(attempt)).await;

        self.refresh_token().await.map_err(|e| {
            error!(error = %e, client_id = %self.client_id, "error refreshing token");
            AnalyticsError::Token { attempt, max: self.request_retries, message: e.to_string() }
        })
    }

    async fn refresh_token(&self) -> Result<(), AnalyticsError> {
        let mut access_token = self.access_token.write().await;
        *access_token = None;

        let url = self.url(endpoints::TOKEN);
        let resp = self
            .http
            .post(&url)
            .json(&TokenRequest { client_id: &self.client_id, client_secret: &self.client_secret })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyticsError::Status { url, status: status.as_u16(), body });
        }

        let token: TokenResponse = resp.json().await?;
        *access_token = Some(token.access_token);
        Ok(())
    }
}
