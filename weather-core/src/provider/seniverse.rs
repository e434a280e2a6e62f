use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::{error::QueryError, model::WeatherQueryResult};

use super::{QueryParams, WeatherDataSource};

pub const DEFAULT_ENDPOINT: &str = "https://api.seniverse.com/v3/weather/now.json";

/// Current weather from the Seniverse `now` endpoint.
#[derive(Debug, Clone)]
pub struct SeniverseDataSource {
    endpoint: String,
    http: Client,
}

impl SeniverseDataSource {
    pub fn new() -> Result<Self, QueryError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, QueryError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            endpoint: endpoint.into(),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WeatherDataSource for SeniverseDataSource {
    async fn fetch_current(&self, params: &QueryParams) -> Result<WeatherQueryResult, QueryError> {
        debug!(location = %params.location, "requesting current weather");

        let res = self
            .http
            .get(&self.endpoint)
            .query(&params.as_pairs())
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(QueryError::Api {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
