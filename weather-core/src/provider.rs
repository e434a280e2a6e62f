use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::QueryError, model::WeatherQueryResult};

pub mod seniverse;

pub use seniverse::SeniverseDataSource;

pub const PARAM_API_KEY: &str = "key";
pub const PARAM_UNIT: &str = "unit";
pub const PARAM_LANGUAGE: &str = "language";
pub const PARAM_LOCATION: &str = "location";

/// Everything one current-weather fetch sends upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub api_key: String,
    pub unit: String,
    pub language: String,
    pub location: String,
}

impl QueryParams {
    /// Key/value pairs as they go on the wire.
    pub fn as_pairs(&self) -> [(&'static str, &str); 4] {
        [
            (PARAM_API_KEY, self.api_key.as_str()),
            (PARAM_UNIT, self.unit.as_str()),
            (PARAM_LANGUAGE, self.language.as_str()),
            (PARAM_LOCATION, self.location.as_str()),
        ]
    }
}

/// Source of current weather for a named location.
#[async_trait]
pub trait WeatherDataSource: Send + Sync + Debug {
    async fn fetch_current(&self, params: &QueryParams) -> Result<WeatherQueryResult, QueryError>;
}
