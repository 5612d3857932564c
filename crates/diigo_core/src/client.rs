use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client, StatusCode,
};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::Credentials;
use crate::errors::DiigoError;
use crate::models::BookmarkPayload;

pub const DEFAULT_BASE_URL: &str = "https://www.diigo.com/api/v2/";
pub const BOOKMARKS_METHOD: &str = "bookmarks";
/// Upper bound Diigo accepts for `count`.
pub const MAX_PAGE_SIZE: u32 = 100;

pub const DEFAULT_HEADERS: [(&str, &str); 2] = [
    (
        "user-agent",
        concat!("diigo_export/", env!("CARGO_PKG_VERSION")),
    ),
    ("accept", "application/json"),
];

/// Bounded exponential backoff for transport failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            backoff_multiplier: 2,
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn without_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            backoff_multiplier: 1,
            max_delay: Duration::ZERO,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub base_url: Option<String>,
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            base_url: None,
            retry: RetryPolicy::default(),
        }
    }
}

/// Reported after every page collected by [`DiigoClient::fetch_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub pages: u32,
    pub fetched: u64,
}

pub struct DiigoClient {
    client: Client,
    bookmarks_url: Url,
    credentials: Credentials,
    options: ClientOptions,
}

impl DiigoClient {
    pub fn new(credentials: Credentials, options: ClientOptions) -> Result<Self, DiigoError> {
        let mut headers = HeaderMap::new();
        for (name, value) in DEFAULT_HEADERS.iter() {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }

        let client = Client::builder()
            .timeout(options.timeout)
            .default_headers(headers)
            .build()
            .map_err(DiigoError::Network)?;

        let bookmarks_url = bookmarks_url(options.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        Ok(Self {
            client,
            bookmarks_url,
            credentials,
            options,
        })
    }

    /// Checks the credentials with a single-record request.
    pub async fn authenticate(&self) -> Result<(), DiigoError> {
        self.fetch_page(0, 1).await?;
        debug!(user = %self.credentials.username, "Diigo accepted credentials");
        Ok(())
    }

    pub async fn fetch_page(
        &self,
        start: u32,
        count: u32,
    ) -> Result<Vec<BookmarkPayload>, DiigoError> {
        self.request(&[
            ("user", self.credentials.username.clone()),
            ("start", start.to_string()),
            ("count", count.to_string()),
            ("filter", "all".to_string()),
        ])
        .await
    }

    /// Pages through every bookmark until a page comes back short.
    pub async fn fetch_all<F>(
        &self,
        page_size: u32,
        mut on_page: F,
    ) -> Result<Vec<BookmarkPayload>, DiigoError>
    where
        F: FnMut(PageProgress),
    {
        validate_page_size(page_size)?;
        let mut start = 0u32;
        let mut pages = 0u32;
        let mut records = Vec::new();
        loop {
            debug!(start, end = start.saturating_add(page_size), "fetching bookmarks");
            let page = self.fetch_page(start, page_size).await?;
            let received = page.len();
            records.extend(page);
            pages += 1;
            on_page(PageProgress {
                pages,
                fetched: records.len() as u64,
            });
            if received < page_size as usize {
                break;
            }
            start = start.checked_add(page_size).ok_or_else(|| {
                DiigoError::InvalidResponse("bookmark offset overflowed".to_string())
            })?;
        }
        Ok(records)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, DiigoError> {
        let retry = &self.options.retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send_once(params).await {
                Err(DiigoError::Network(err)) if attempt < retry.max_attempts => {
                    let delay = retry.delay_after(attempt);
                    warn!(
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying Diigo request after transport error"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        params: &[(&str, String)],
    ) -> Result<T, DiigoError> {
        let response = self
            .client
            .get(self.bookmarks_url.clone())
            .basic_auth(
                &self.credentials.username,
                Some(self.credentials.password.expose_secret()),
            )
            .query(&[("key", self.credentials.api_key.expose_secret().as_str())])
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DiigoError::Auth(format!(
                "Diigo rejected the credentials for {} (HTTP {status})",
                self.credentials.username
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiigoError::Api {
                status: status.as_u16(),
                message: body.trim().to_string(),
            });
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|err| DiigoError::InvalidResponse(err.to_string()))
    }
}

/// The request URL carries the API key, so it never goes into the error.
fn transport_error(err: reqwest::Error) -> DiigoError {
    DiigoError::Network(err.without_url())
}

pub fn validate_page_size(page_size: u32) -> Result<(), DiigoError> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(DiigoError::Config(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

fn bookmarks_url(base: &str) -> Result<Url, DiigoError> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Url::parse(&normalized)
        .and_then(|url| url.join(BOOKMARKS_METHOD))
        .map_err(|err| DiigoError::Config(format!("invalid base URL {base:?}: {err}")))
}
