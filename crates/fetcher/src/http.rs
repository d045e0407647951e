use async_trait::async_trait;
use sitemap_kit_core::{Category, Error, Result};
use sitemap_kit_validator::validate_payload;
use std::time::Duration;

use crate::{ContentSource, FetchedCategory};

const USER_AGENT: &str = concat!("sitemap-kit/", env!("CARGO_PKG_VERSION"));

/// Fetches category listings from the content API over HTTP.
pub struct HttpContentSource {
    client: reqwest::Client,
    api_base: String,
}

impl HttpContentSource {
    /// Create a source for `api_base`; every request is bounded by `timeout`.
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::InvalidData(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL for a category
    pub fn endpoint(&self, category: &Category) -> String {
        format!("{}/{}", self.api_base, category.key)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_category(&self, category: &Category) -> Result<FetchedCategory> {
        let url = self.endpoint(category);
        tracing::debug!(category = category.key, %url, "fetching category");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(category, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch {
                category: category.key.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(category, e))?;

        parse_category_body(category, &body)
    }
}

fn request_error(category: &Category, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            category: category.key.to_string(),
        }
    } else {
        Error::Request {
            category: category.key.to_string(),
            message: err.to_string(),
        }
    }
}

/// Decode and validate a category response body.
pub fn parse_category_body(category: &Category, body: &str) -> Result<FetchedCategory> {
    let payload: serde_json::Value = serde_json::from_str(body).map_err(|e| Error::Parse {
        category: category.key.to_string(),
        message: e.to_string(),
    })?;

    let (items, report) = validate_payload(category, payload)?;

    if report.dropped() > 0 {
        tracing::warn!(
            category = category.key,
            dropped = report.dropped(),
            accepted = report.accepted,
            "dropped content items without a valid slug"
        );
    }
    if items.is_empty() {
        tracing::warn!(category = category.key, "no valid items in category");
    }

    Ok(FetchedCategory { items, report })
}
