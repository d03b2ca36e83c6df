//! HTTP client for the Overpass interpreter endpoint.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::form_urlencoded;

use super::{build_query, BoundaryLookup};
use crate::error::{EnrichError, Result};
use crate::models::{GeoPoint, OverpassResponse};

const USER_AGENT: &str = "kelurahan-mapper/0.1 (boundary enrichment)";

pub struct OverpassClient {
    client: Client,
    url: String,
    admin_level: String,
}

impl OverpassClient {
    /// Create a client. Without `timeout` a request may wait indefinitely.
    pub fn new(url: &str, admin_level: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url: url.to_string(),
            admin_level: admin_level.to_string(),
        })
    }

    /// POST a raw Overpass QL query as `data=<query>`.
    pub async fn fetch(&self, query: &str) -> Result<OverpassResponse> {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("data", query)
            .finish();

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| e.to_string());
            return Err(EnrichError::Http { status, body });
        }

        let bytes = response.bytes().await?;
        decode_response(&bytes)
    }
}

#[async_trait]
impl BoundaryLookup for OverpassClient {
    async fn lookup(&self, point: GeoPoint) -> Result<OverpassResponse> {
        debug!("Overpass lookup at {}", point);
        self.fetch(&build_query(point, &self.admin_level)).await
    }
}

pub fn decode_response(body: &[u8]) -> Result<OverpassResponse> {
    Ok(serde_json::from_slice(body)?)
}
