use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use klines_core::{
    ExchangeClient, ExchangeId, Granularity, KlineRecord, KlineRequest, KlinesError, PagePolicy,
    TimestampUnit,
};

use crate::SyntheticSeries;

/// Instruction for how a fetch should behave.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the provided page immediately.
    Return(Vec<KlineRecord>),
    /// Return the provided page after a delay (simulate a slow request).
    Delay(Duration, Vec<KlineRecord>),
    /// Fail immediately with the provided error.
    Fail(KlinesError),
    /// Hang indefinitely (simulate a stalled request).
    Hang,
}

#[derive(Default)]
struct InternalState {
    by_since: HashMap<i64, VecDeque<MockBehavior>>,
    queue: VecDeque<MockBehavior>,
    requests: Vec<KlineRequest>,
}

/// Controller handle used by tests to drive a [`ScriptedClient`] from the outside.
#[derive(Clone)]
pub struct ScriptController {
    state: Arc<Mutex<InternalState>>,
}

impl ScriptController {
    /// Queue a behavior for the next request whose `since` equals `since`.
    ///
    /// Behaviors for the same `since` are consumed in order.
    pub async fn script_at(&self, since: i64, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.by_since.entry(since).or_default().push_back(behavior);
    }

    /// Queue a behavior for the next request not matched by [`script_at`](Self::script_at).
    pub async fn push_behavior(&self, behavior: MockBehavior) {
        self.state.lock().await.queue.push_back(behavior);
    }

    /// Return a copy of every request received so far.
    pub async fn requests(&self) -> Vec<KlineRequest> {
        self.state.lock().await.requests.clone()
    }

    /// Number of requests received so far.
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests.len()
    }

    /// Clear all scripted behaviors and the request log.
    pub async fn clear_all(&self) {
        let mut guard = self.state.lock().await;
        guard.by_since.clear();
        guard.queue.clear();
        guard.requests.clear();
    }
}

/// Exchange client whose responses come from a script, then from a synthetic series.
///
/// Resolution order per request: behaviors scripted for the request's `since`, the
/// shared behavior queue, the synthetic series (if any), an empty page.
pub struct ScriptedClient {
    name: &'static str,
    exchange: ExchangeId,
    unit: TimestampUnit,
    policy: PagePolicy,
    max_page_size: u32,
    granularities: &'static [Granularity],
    series: Option<SyntheticSeries>,
    state: Arc<Mutex<InternalState>>,
}

impl ScriptedClient {
    /// Start configuring a scripted client.
    #[must_use]
    pub fn builder(name: &'static str) -> ScriptedClientBuilder {
        ScriptedClientBuilder {
            name,
            exchange: ExchangeId::Mock,
            unit: TimestampUnit::Milliseconds,
            policy: PagePolicy::ShortPage,
            max_page_size: 1000,
            granularities: Granularity::ALL,
            series: None,
        }
    }

    /// Create a short-page client with default settings and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Arc<dyn ExchangeClient>, ScriptController) {
        Self::builder(name).build()
    }
}

/// Builder for [`ScriptedClient`].
pub struct ScriptedClientBuilder {
    name: &'static str,
    exchange: ExchangeId,
    unit: TimestampUnit,
    policy: PagePolicy,
    max_page_size: u32,
    granularities: &'static [Granularity],
    series: Option<SyntheticSeries>,
}

impl ScriptedClientBuilder {
    /// Exchange reported by the client (file-name prefix).
    #[must_use]
    pub const fn exchange(mut self, exchange: ExchangeId) -> Self {
        self.exchange = exchange;
        self
    }

    /// Timestamp unit of requests and records.
    #[must_use]
    pub const fn unit(mut self, unit: TimestampUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Default page policy advertised by the client.
    #[must_use]
    pub const fn policy(mut self, policy: PagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Largest page the client serves.
    #[must_use]
    pub const fn max_page_size(mut self, max: u32) -> Self {
        self.max_page_size = max;
        self
    }

    /// Granularities the client claims to serve.
    #[must_use]
    pub const fn granularities(mut self, granularities: &'static [Granularity]) -> Self {
        self.granularities = granularities;
        self
    }

    /// Serve unscripted requests from `series`.
    #[must_use]
    pub const fn series(mut self, series: SyntheticSeries) -> Self {
        self.series = Some(series);
        self
    }

    /// Build the client and the controller sharing its script.
    #[must_use]
    pub fn build(self) -> (Arc<dyn ExchangeClient>, ScriptController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let controller = ScriptController {
            state: Arc::clone(&state),
        };
        let client = ScriptedClient {
            name: self.name,
            exchange: self.exchange,
            unit: self.unit,
            policy: self.policy,
            max_page_size: self.max_page_size,
            granularities: self.granularities,
            series: self.series,
            state,
        };
        (Arc::new(client) as Arc<dyn ExchangeClient>, controller)
    }
}

#[async_trait]
impl ExchangeClient for ScriptedClient {
    fn name(&self) -> &'static str {
        self.name
    }

    fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    fn timestamp_unit(&self) -> TimestampUnit {
        self.unit
    }

    fn default_policy(&self) -> PagePolicy {
        self.policy
    }

    fn max_page_size(&self) -> u32 {
        self.max_page_size
    }

    fn supported_granularities(&self) -> &'static [Granularity] {
        self.granularities
    }

    async fn fetch(&self, req: &KlineRequest) -> Result<Vec<KlineRecord>, KlinesError> {
        // Resolve without holding the lock across the hang
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.requests.push(req.clone());
            let scripted = guard
                .by_since
                .get_mut(&req.since)
                .and_then(VecDeque::pop_front);
            scripted.or_else(|| guard.queue.pop_front())
        };

        match behavior {
            Some(MockBehavior::Return(page)) => Ok(page),
            Some(MockBehavior::Delay(delay, page)) => {
                tokio::time::sleep(delay).await;
                Ok(page)
            }
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Hang) => std::future::pending().await,
            None => Ok(self
                .series
                .map(|s| s.page(req.since, req.until, req.limit))
                .unwrap_or_default()),
        }
    }
}
