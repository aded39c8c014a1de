use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, REFERER as REFERER_HEADER};
use serde::Deserialize;
use thiserror::Error;

use cash5_db::models::DrawRecord;

use crate::config::{GAME_NAME, REFERER, SyncConfig};

/// Failure fetching one page, classified by whether a retry can help.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("bad status: {code}")]
    Status { code: u16 },
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Server-side 5xx, timeouts and dropped connections are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { code } => (500..600).contains(code),
            FetchError::Timeout | FetchError::Transport(_) => true,
            FetchError::Decode(_) => false,
        }
    }
}

/// One page of a date-bounded listing. Dates are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: usize,
    pub size: usize,
    pub date_from: i64,
    pub date_to: i64,
}

pub trait DrawSource {
    fn fetch_page(&mut self, query: &PageQuery) -> Result<Vec<DrawRecord>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct PageEnvelope {
    #[serde(default)]
    draws: Option<Vec<DrawRecord>>,
}

pub fn decode_page(body: &str) -> Result<Vec<DrawRecord>, FetchError> {
    let envelope: PageEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(envelope.draws.unwrap_or_default())
}

/// The lottery's public draw listing endpoint.
pub struct HttpDrawSource {
    client: Client,
    base_url: String,
}

impl HttpDrawSource {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent("Mozilla/5.0")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}

impl DrawSource for HttpDrawSource {
    fn fetch_page(&mut self, query: &PageQuery) -> Result<Vec<DrawRecord>, FetchError> {
        log::debug!(
            "GET page {} (size {}) {}..{}",
            query.page,
            query.size,
            query.date_from,
            query.date_to
        );
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("game-names", GAME_NAME.to_string()),
                ("status", "CLOSED".to_string()),
                ("size", query.size.to_string()),
                ("page", query.page.to_string()),
                ("date-from", query.date_from.to_string()),
                ("date-to", query.date_to.to_string()),
            ])
            .header(ACCEPT, "application/json")
            .header(REFERER_HEADER, REFERER)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status {
                code: status.as_u16(),
            });
        }

        let body = response.text().map_err(transport_error)?;
        decode_page(&body)
    }
}
