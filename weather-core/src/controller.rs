//! State for a single "current weather" query.
//!
//! [`WeatherQueryController`] skips repeat requests for the location it last
//! accepted, runs each accepted request through
//! fetch → validate → persist → map on a background task, and publishes the
//! outcome through two [`Observable`] holders: the [`Status`] and the rows
//! to display.

use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tokio::{runtime::Handle, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    config::QueryConfig,
    error::QueryError,
    model::{Location, TextRow},
    observable::Observable,
    provider::{QueryParams, WeatherDataSource},
    reporter::{ErrorHandler, TracingErrorHandler},
    store::LocationStore,
};

/// Where the current query is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Loading => "loading",
            Status::Success => "success",
            Status::Error => "error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct QueryState {
    last_requested: Option<String>,
    rows: Option<Observable<Vec<TextRow>>>,
    active: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    generation: u64,
}

impl QueryState {
    fn rows(&mut self) -> Observable<Vec<TextRow>> {
        self.rows
            .get_or_insert_with(|| Observable::new(Vec::new()))
            .clone()
    }
}

pub struct WeatherQueryController {
    config: QueryConfig,
    source: Arc<dyn WeatherDataSource>,
    store: Arc<dyn LocationStore>,
    errors: Arc<dyn ErrorHandler>,
    runtime: Handle,
    status: Observable<Status>,
    state: Arc<Mutex<QueryState>>,
}

impl fmt::Debug for WeatherQueryController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherQueryController")
            .field("status", &self.status.get())
            .field("last_requested", &self.state.lock().last_requested)
            .finish()
    }
}

impl WeatherQueryController {
    /// Create a controller that runs fetches on the current tokio runtime.
    pub fn new(
        config: QueryConfig,
        source: Arc<dyn WeatherDataSource>,
        store: Arc<dyn LocationStore>,
    ) -> Result<Self, QueryError> {
        let runtime = Handle::try_current().map_err(|_| QueryError::NoRuntime)?;
        Ok(Self::with_runtime(config, source, store, runtime))
    }

    pub fn with_runtime(
        config: QueryConfig,
        source: Arc<dyn WeatherDataSource>,
        store: Arc<dyn LocationStore>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            source,
            store,
            errors: Arc::new(TracingErrorHandler),
            runtime,
            status: Observable::new(Status::Idle),
            state: Arc::new(Mutex::new(QueryState::default())),
        }
    }

    /// Replace the default tracing-only error handler.
    pub fn with_error_handler(mut self, errors: Arc<dyn ErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn status(&self) -> Observable<Status> {
        self.status.clone()
    }

    /// Rows holder, if a query has been made since construction or the last
    /// [`dispose`](Self::dispose).
    pub fn rows(&self) -> Option<Observable<Vec<TextRow>>> {
        self.state.lock().rows.clone()
    }

    pub fn last_requested_location(&self) -> Option<String> {
        self.state.lock().last_requested.clone()
    }

    /// Ask for the weather at `location_name`.
    ///
    /// Starts a fetch unless the name matches the last accepted one, compared
    /// against its lower-cased form. Returns the rows holder either way; the
    /// same holder is handed out until `dispose`.
    pub fn query(&self, location_name: &str) -> Observable<Vec<TextRow>> {
        let mut state = self.state.lock();
        let rows = state.rows();

        let current = state
            .last_requested
            .get_or_insert_with(String::new)
            .to_lowercase();
        if current == location_name {
            debug!(location = %location_name, "location unchanged, skipping fetch");
            return rows;
        }

        state.last_requested = Some(location_name.to_string());
        self.load_weather(&mut state, location_name.to_string());
        rows
    }

    /// Fetch the last accepted location again, even if it already succeeded.
    pub fn retry(&self) {
        let mut state = self.state.lock();
        let Some(location) = state.last_requested.clone() else {
            debug!("retry requested before any query");
            return;
        };

        info!(location = %location, "retrying weather query");
        self.load_weather(&mut state, location);
    }

    /// Cancel in-flight fetches and let go of the rows holder and the last
    /// location. The status keeps its last value.
    pub fn dispose(&self) {
        let mut state = self.state.lock();

        state.cancel.cancel();
        state.cancel = CancellationToken::new();
        if let Some(active) = state.active.take() {
            active.abort();
        }
        state.rows = None;
        state.last_requested = None;
    }

    fn load_weather(&self, state: &mut QueryState, location: String) {
        state.generation += 1;

        let params = self.config.params_for(&location);
        let fetch = Fetch {
            location,
            generation: state.generation,
            discard_superseded: self.config.discard_superseded,
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            errors: Arc::clone(&self.errors),
            status: self.status.clone(),
            rows: state.rows(),
            state: Arc::clone(&self.state),
            cancel: state.cancel.clone(),
        };

        self.status.set(Status::Loading);
        // A still-running predecessor keeps going; only its handle is dropped.
        state.active = Some(self.runtime.spawn(fetch.run(params)));
    }
}

impl Drop for WeatherQueryController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// One spawned run of the pipeline.
struct Fetch {
    location: String,
    generation: u64,
    discard_superseded: bool,
    source: Arc<dyn WeatherDataSource>,
    store: Arc<dyn LocationStore>,
    errors: Arc<dyn ErrorHandler>,
    status: Observable<Status>,
    rows: Observable<Vec<TextRow>>,
    state: Arc<Mutex<QueryState>>,
    cancel: CancellationToken,
}

impl Fetch {
    async fn run(self, params: QueryParams) {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(location = %self.location, "weather query cancelled");
                return;
            }
            outcome = self.fetch_rows(&params) => outcome,
        };

        self.deliver(outcome);
    }

    async fn fetch_rows(&self, params: &QueryParams) -> Result<Vec<TextRow>, QueryError> {
        let result = self.source.fetch_current(params).await?;
        let now = result.into_single()?;
        self.remember(&now.location).await?;
        Ok(now.to_rows())
    }

    async fn remember(&self, location: &Location) -> Result<(), QueryError> {
        if self.store.find_by_name(&location.name).await?.is_none() {
            info!(name = %location.name, path = %location.path, "saving new location");
            self.store.save(location.clone()).await?;
        }
        Ok(())
    }

    fn deliver(&self, outcome: Result<Vec<TextRow>, QueryError>) {
        let failure = {
            // dispose takes this lock before cancelling, so nothing slips through after it
            let state = self.state.lock();
            if self.cancel.is_cancelled() {
                return;
            }
            if self.discard_superseded && state.generation != self.generation {
                debug!(location = %self.location, "dropping result of superseded query");
                return;
            }

            match outcome {
                Ok(rows) => {
                    debug!(location = %self.location, "weather query succeeded");
                    self.rows.set(rows);
                    self.status.set(Status::Success);
                    None
                }
                Err(err) => {
                    self.status.set(Status::Error);
                    Some(err)
                }
            }
        };

        // unlocked so the handler may call retry
        if let Some(err) = failure {
            self.errors.handle_error(&self.location, &err);
        }
    }
}
