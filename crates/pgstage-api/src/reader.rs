//! Paged reader over the delivery-system REST API.
//!
//! Pages are addressed by offset. The reader asks for ascending order on a
//! sort field, but the API does not promise a stable order between pages: if
//! objects shift between two runs, the cursor can move past objects that were
//! never returned. Each run still loads whatever it was given.

use std::time::Duration;

use pgstage_core::{Batch, LoadResult, RawObject, SourceReader, SourceRecord};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use tracing::debug;

use crate::error::{ApiError, ApiResult};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the API, resolved before the reader is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub nickname: String,
    pub cohort: String,
    pub timeout_secs: u64,
}

/// Reads one resource (e.g. `couriers`) page by page.
///
/// The record at position `i` of a page fetched at `offset` gets the
/// sequence key `offset + i`, its absolute position in the stream, so the
/// next run resumes at `cursor + 1`.
#[derive(Debug, Clone)]
pub struct PagedApiReader {
    client: Client,
    url: String,
    sort_field: String,
}

impl PagedApiReader {
    pub fn new(
        config: &ApiConfig,
        resource: &str,
        sort_field: impl Into<String>,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers(config)?)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/{}", config.base_url.trim_end_matches('/'), resource),
            sort_field: sort_field.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get_page(&self, offset: i64, limit: usize) -> ApiResult<Vec<serde_json::Value>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("sort_field", self.sort_field.clone()),
                ("sort_direction", "asc".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn headers(config: &ApiConfig) -> ApiResult<HeaderMap> {
    let mut h = HeaderMap::new();
    h.insert(
        "x-api-key",
        HeaderValue::from_str(&config.api_key).map_err(|_| ApiError::InvalidHeader("X-API-KEY"))?,
    );
    h.insert(
        "x-nickname",
        HeaderValue::from_str(&config.nickname)
            .map_err(|_| ApiError::InvalidHeader("X-Nickname"))?,
    );
    h.insert(
        "x-cohort",
        HeaderValue::from_str(&config.cohort).map_err(|_| ApiError::InvalidHeader("X-Cohort"))?,
    );
    Ok(h)
}

/// Turn one page into records keyed by absolute position.
pub fn records_from_page(
    offset: i64,
    objects: Vec<serde_json::Value>,
    limit: usize,
) -> Vec<SourceRecord<RawObject>> {
    objects
        .iter()
        .take(limit)
        .zip(offset..)
        .map(|(object, key)| SourceRecord::new(key, RawObject::from_json(object)))
        .collect()
}

impl SourceReader for PagedApiReader {
    type Record = RawObject;

    async fn fetch(&self, threshold: i64, limit: usize) -> LoadResult<Batch<RawObject>> {
        let offset = threshold.saturating_add(1).max(0);
        let objects = self.get_page(offset, limit).await?;
        if objects.len() > limit {
            debug!(url = %self.url, returned = objects.len(), limit, "Truncating oversized page");
        }

        let records = records_from_page(offset, objects, limit);
        debug!(url = %self.url, offset, fetched = records.len(), "Fetched page");
        Ok(Batch::new(records))
    }
}
