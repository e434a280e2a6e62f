//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - [`WeatherQueryController`]: dedupes requests for one location, runs the
//!   fetch → validate → persist → map pipeline and publishes status and rows
//! - Ports for the collaborators it drives ([`WeatherDataSource`],
//!   [`LocationStore`], [`ErrorHandler`]) and their stock implementations
//! - Configuration & credentials handling
//! - Shared domain models (service responses, display rows)
//!
//! It is used by `weather-cli`, but can also be embedded by any other front end
//! that wants to watch the [`Observable`] holders.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod observable;
pub mod provider;
pub mod reporter;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::{Config, QueryConfig};
pub use controller::{Status, WeatherQueryController};
pub use error::QueryError;
pub use model::{Location, Now, NowResult, TextRow, WeatherQueryResult};
pub use observable::Observable;
pub use provider::{QueryParams, SeniverseDataSource, WeatherDataSource};
pub use reporter::{ErrorHandler, TracingErrorHandler};
pub use store::{JsonFileLocationStore, LocationStore, MemoryLocationStore};
