//! In-process fakes for exercising the controller without a network or disk.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::{collections::VecDeque, time::Duration};
use tokio::sync::{oneshot, watch};

use crate::{
    controller::Status,
    error::QueryError,
    model::{Location, Now, NowResult, WeatherQueryResult},
    provider::{QueryParams, WeatherDataSource},
    reporter::ErrorHandler,
    store::{LocationStore, MemoryLocationStore},
};

const WAIT: Duration = Duration::from_secs(2);

pub fn now_result(name: &str, path: &str, text: &str, temperature: &str) -> NowResult {
    NowResult {
        location: Location {
            id: format!("id-{name}"),
            name: name.to_string(),
            country: "CN".to_string(),
            path: path.to_string(),
            timezone: "Asia/Shanghai".to_string(),
            timezone_offset: "+08:00".to_string(),
        },
        now: Now {
            text: text.to_string(),
            code: "0".to_string(),
            temperature: temperature.to_string(),
        },
        last_update: None,
    }
}

pub fn single(result: NowResult) -> WeatherQueryResult {
    WeatherQueryResult::new(vec![result])
}

pub async fn wait_for_status(rx: &mut watch::Receiver<Status>, target: Status) {
    tokio::time::timeout(WAIT, rx.wait_for(|status| *status == target))
        .await
        .unwrap_or_else(|_| panic!("status never became {target}"))
        .expect("status holder alive");
}

/// Give spawned fetches a chance to run to completion.
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
}

type Reply = Result<WeatherQueryResult, QueryError>;

#[derive(Debug)]
enum Mode {
    /// Answer from the queue, or with a sunny result named after the query.
    Auto,
    /// Park every call until the test completes it.
    Manual,
}

#[derive(Debug)]
pub struct FakeSource {
    mode: Mode,
    calls: Mutex<Vec<QueryParams>>,
    queued: Mutex<VecDeque<Reply>>,
    pending: Mutex<Vec<(String, oneshot::Sender<Reply>)>>,
}

impl FakeSource {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
            queued: Mutex::new(VecDeque::new()),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn auto() -> Self {
        Self::with_mode(Mode::Auto)
    }

    pub fn manual() -> Self {
        Self::with_mode(Mode::Manual)
    }

    pub fn push_ok(&self, result: WeatherQueryResult) {
        self.queued.lock().push_back(Ok(result));
    }

    pub fn push_err(&self, err: QueryError) {
        self.queued.lock().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<QueryParams> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn locations(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|params| params.location.clone())
            .collect()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        let waited = tokio::time::timeout(WAIT, async {
            while self.call_count() < count {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {count} fetches, saw {}", self.call_count());
    }

    /// Answer the oldest parked call for `location`. False if none is parked
    /// or its fetch has already been dropped.
    pub fn complete(&self, location: &str, reply: Reply) -> bool {
        let mut pending = self.pending.lock();
        let Some(idx) = pending.iter().position(|(loc, _)| loc == location) else {
            return false;
        };
        let (_, tx) = pending.remove(idx);
        tx.send(reply).is_ok()
    }

    pub fn complete_ok(&self, location: &str, result: WeatherQueryResult) -> bool {
        self.complete(location, Ok(result))
    }

    pub fn complete_err(&self, location: &str, err: QueryError) -> bool {
        self.complete(location, Err(err))
    }
}

#[async_trait]
impl WeatherDataSource for FakeSource {
    async fn fetch_current(&self, params: &QueryParams) -> Result<WeatherQueryResult, QueryError> {
        self.calls.lock().push(params.clone());

        match self.mode {
            Mode::Auto => {
                let queued = self.queued.lock().pop_front();
                queued.unwrap_or_else(|| {
                    Ok(single(now_result(&params.location, &params.location, "Sunny", "20")))
                })
            }
            Mode::Manual => {
                let (tx, rx) = oneshot::channel();
                self.pending.lock().push((params.location.clone(), tx));
                rx.await.unwrap_or_else(|_| Err(QueryError::Store("fake source dropped".into())))
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryLocationStore,
    saved: Mutex<Vec<String>>,
    lookups: Mutex<usize>,
    fail_saves: Mutex<bool>,
}

impl RecordingStore {
    /// Insert without counting it as a save.
    pub fn seed(&self, location: Location) {
        self.inner.insert(location);
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock() = fail;
    }

    pub fn saved_names(&self) -> Vec<String> {
        self.saved.lock().clone()
    }

    pub fn lookups(&self) -> usize {
        *self.lookups.lock()
    }
}

#[async_trait]
impl LocationStore for RecordingStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Location>, QueryError> {
        *self.lookups.lock() += 1;
        self.inner.find_by_name(name).await
    }

    async fn save(&self, location: Location) -> Result<(), QueryError> {
        if *self.fail_saves.lock() {
            return Err(QueryError::Store("injected failure".into()));
        }
        self.saved.lock().push(location.name.clone());
        self.inner.save(location).await
    }
}

#[derive(Debug, Default)]
pub struct RecordingErrors {
    messages: Mutex<Vec<String>>,
}

impl RecordingErrors {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl ErrorHandler for RecordingErrors {
    fn handle_error(&self, location: &str, err: &QueryError) {
        self.messages.lock().push(format!("{location}: {err}"));
    }
}
