use std::{sync::Arc, time::Duration};

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    clock::Clock,
    error::{CatalogError, Result},
    events::{ClientEvent, EventBus},
    management::{ScheduleStore, Token, TokenError, TokenManager},
    spotify::{
        gate::RateLimitWindow,
        transport::{ApiRequest, ApiResponse, Transport},
    },
};

/// Backoff for transport failures: attempt `n` waits `base_delay * multiplier^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * self.multiplier.saturating_pow(attempt)
    }
}

/// What a single execution ended in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(Value),
    /// Rate limited: the request has to wait for the window to close.
    Deferred,
}

/// Parses a `Retry-After` header holding whole seconds.
pub fn parse_retry_after(header: Option<&str>) -> Option<u64> {
    header?.trim().parse().ok()
}

/// Pulls a human readable message out of an API error body.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return "Unknown error".to_string();
    };

    value["error"]["message"]
        .as_str()
        .or_else(|| value["error"].as_str())
        .or_else(|| value["message"].as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

pub struct RequestExecutor {
    tokens: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    window: Arc<RateLimitWindow>,
    store: Arc<dyn ScheduleStore>,
    events: EventBus,
    retry: RetryPolicy,
    default_retry_after_secs: u64,
}

impl RequestExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        window: Arc<RateLimitWindow>,
        store: Arc<dyn ScheduleStore>,
        events: EventBus,
        retry: RetryPolicy,
        default_retry_after_secs: u64,
    ) -> Self {
        Self {
            tokens,
            transport,
            clock,
            window,
            store,
            events,
            retry,
            default_retry_after_secs,
        }
    }

    /// Executes `request`, retrying transport failures under the retry policy.
    ///
    /// The attempt counter belongs to this call, so every request starts
    /// with a fresh budget.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Outcome> {
        let mut attempt = 0;
        loop {
            match self.attempt(request).await {
                Err(CatalogError::Network(reason)) if attempt < self.retry.max_attempts => {
                    attempt += 1;
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        url = %request.url,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_secs = delay.as_secs(),
                        %reason,
                        "network error, retrying"
                    );
                    self.events.emit(ClientEvent::NetworkRetry {
                        attempt,
                        delay_secs: delay.as_secs(),
                    });
                    self.clock.sleep(delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Result<Outcome> {
        let Some(token) = self.token().await? else {
            return Ok(Outcome::Deferred);
        };
        let response = self.send(request, &token).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return self.classify(request, response).await;
        }

        debug!(url = %request.url, "access token rejected, refreshing once");
        self.tokens.invalidate(&token.value).await;
        let Some(token) = self.token().await? else {
            return Ok(Outcome::Deferred);
        };
        let response = self.send(request, &token).await?;
        if response.status == StatusCode::UNAUTHORIZED {
            return Err(CatalogError::Auth(format!(
                "access token rejected after refresh: {}",
                error_message(&response.body)
            )));
        }
        self.classify(request, response).await
    }

    /// `None` when the credential endpoint itself is rate limited.
    async fn token(&self) -> Result<Option<Token>> {
        match self.tokens.valid_token().await {
            Ok(token) => Ok(Some(token)),
            Err(TokenError::RateLimited { retry_after }) => {
                self.open_window(retry_after.as_deref()).await;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn send(&self, request: &ApiRequest, token: &Token) -> Result<ApiResponse> {
        debug!(url = %request.url, "sending request");
        self.transport
            .send(request, Some(&token.value))
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))
    }

    async fn classify(&self, request: &ApiRequest, response: ApiResponse) -> Result<Outcome> {
        let status = response.status;

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.open_window(response.retry_after.as_deref()).await;
            return Ok(Outcome::Deferred);
        }

        if !status.is_success() {
            let message = error_message(&response.body);
            debug!(url = %request.url, status = status.as_u16(), %message, "request failed");
            return Err(CatalogError::api(status.as_u16(), message));
        }

        if response.body.trim().is_empty() {
            return Ok(Outcome::Completed(Value::Null));
        }
        serde_json::from_str(&response.body)
            .map(Outcome::Completed)
            .map_err(|e| CatalogError::api(status.as_u16(), format!("invalid response body: {e}")))
    }

    async fn open_window(&self, retry_after: Option<&str>) {
        let secs = parse_retry_after(retry_after).unwrap_or(self.default_retry_after_secs);
        self.window.open(self.clock.now_millis(), secs);

        warn!(retry_after_secs = secs, "rate limited by the API");
        self.events.emit(ClientEvent::RateLimited {
            retry_after_secs: secs,
        });

        if let Err(e) = self.store.record_rate_limit(secs).await {
            warn!(error = %e, "cannot persist rate limit duration");
        }
    }
}
