use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    clock::{Clock, SystemClock},
    config::ClientConfig,
    error::{CatalogError, Result},
    events::{EventBus, EventListener},
    management::{MemoryScheduleStore, ReleaseAggregator, ScheduleStore, TokenManager},
    spotify::{
        executor::RequestExecutor,
        gate::{RateLimitGate, RateLimitWindow},
        transport::{ApiRequest, ReqwestTransport, Transport},
    },
};

/// Point-in-time view of the client's API health.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApiStatus {
    pub token_expires_in_secs: u64,
    pub rate_limited_for_secs: u64,
    pub queued_requests: usize,
    pub is_rate_limited: bool,
    pub initial_rate_limit_secs: u64,
    /// How far the current rate-limit window has elapsed, `100.0` when none is open.
    pub rate_limit_pct_complete: f64,
}

impl ApiStatus {
    fn rate_limit_progress(rate_limited_for_secs: u64, initial_secs: u64) -> f64 {
        if initial_secs == 0 {
            return 100.0;
        }
        let pct = 100.0 - (rate_limited_for_secs as f64 / initial_secs as f64) * 100.0;
        pct.clamp(0.0, 100.0)
    }
}

/// Catalog access with credential handling, rate-limit queuing and retries.
///
/// Cloning is cheap and clones share the token, window and queue.
#[derive(Clone)]
pub struct CatalogClient {
    config: Arc<ClientConfig>,
    gate: Arc<RateLimitGate>,
    tokens: Arc<TokenManager>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn ScheduleStore>,
    events: EventBus,
}

pub struct CatalogClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn ScheduleStore>>,
    events: EventBus,
}

impl CatalogClientBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn store(mut self, store: Arc<dyn ScheduleStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn listener(self, listener: Arc<dyn EventListener>) -> Self {
        self.events.subscribe(listener);
        self
    }

    /// Wires the client together. Without an explicit transport a `reqwest`
    /// client honoring the configured timeout is built.
    pub fn build(self) -> Result<CatalogClient> {
        let config = self.config;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(config.http_timeout)?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryScheduleStore::new()));
        let events = self.events;

        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&transport),
            Arc::clone(&clock),
            events.clone(),
            config.credentials.clone(),
            config.token_url.clone(),
            config.token_safety_margin,
        ));
        let window = Arc::new(RateLimitWindow::new(config.default_retry_after_secs));
        let executor = Arc::new(RequestExecutor::new(
            Arc::clone(&tokens),
            transport,
            Arc::clone(&clock),
            Arc::clone(&window),
            Arc::clone(&store),
            events.clone(),
            config.retry,
            config.default_retry_after_secs,
        ));
        let gate = Arc::new(RateLimitGate::new(
            executor,
            window,
            Arc::clone(&clock),
            events.clone(),
            config.drain_buffer,
        ));

        Ok(CatalogClient {
            config: Arc::new(config),
            gate,
            tokens,
            clock,
            store,
            events,
        })
    }
}

impl CatalogClient {
    pub fn builder(config: ClientConfig) -> CatalogClientBuilder {
        CatalogClientBuilder {
            config,
            transport: None,
            clock: None,
            store: None,
            events: EventBus::new(),
        }
    }

    /// Client over HTTPS with the system clock and an in-memory schedule store.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn subscribe(&self, listener: Arc<dyn EventListener>) {
        self.events.subscribe(listener);
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub(crate) fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    /// Obtains an access token, returning its remaining lifetime in seconds.
    pub async fn authenticate(&self) -> Result<u64> {
        self.tokens.valid_token().await?;
        Ok(self.tokens.expires_in_secs())
    }

    pub fn status(&self) -> ApiStatus {
        let window = self.gate.window();
        let remaining_ms = window.remaining_millis(self.clock.now_millis());
        let rate_limited_for_secs = (remaining_ms as u64).div_ceil(1000);
        let initial_rate_limit_secs = window.initial_duration_secs();

        ApiStatus {
            token_expires_in_secs: self.tokens.expires_in_secs(),
            rate_limited_for_secs,
            queued_requests: self.gate.queued(),
            is_rate_limited: remaining_ms > 0,
            initial_rate_limit_secs,
            rate_limit_pct_complete: ApiStatus::rate_limit_progress(
                rate_limited_for_secs,
                initial_rate_limit_secs,
            ),
        }
    }

    /// Time of the last completed new-release check, if the store knows one.
    pub async fn last_check_at(&self) -> Option<i64> {
        match self.store.load().await {
            Ok(state) => state.last_check_at,
            Err(e) => {
                warn!(error = %e, "cannot read schedule state");
                None
            }
        }
    }

    pub fn release_aggregator(&self) -> ReleaseAggregator {
        ReleaseAggregator::new(self.clone(), self.config.pacing)
    }

    /// Issues `GET {api_url}{path_and_query}` through the rate-limit gate and
    /// decodes the body into `T`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T> {
        let url = format!("{}{}", self.config.api_url, path_and_query);
        debug!(%url, "scheduling request");
        let value = self.gate.schedule(ApiRequest::get(url)).await?;
        serde_json::from_value(value)
            .map_err(|e| CatalogError::api(200, format!("unexpected response shape: {e}")))
    }

    pub(crate) async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            self.clock.sleep(duration).await;
        }
    }
}
