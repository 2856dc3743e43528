use std::{
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    config::Credentials,
    error::CatalogError,
    events::{ClientEvent, EventBus},
    spotify::transport::{ApiRequest, Transport},
};

const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    /// Epoch millis at which the credential endpoint said the token dies.
    pub expires_at: i64,
}

impl Token {
    pub fn is_usable(&self, now: i64, safety_margin: Duration) -> bool {
        now < self.expires_at - safety_margin.as_millis() as i64
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("{0}")]
    Rejected(String),
    #[error("credential endpoint is rate limited")]
    RateLimited { retry_after: Option<String> },
    #[error("{0}")]
    Network(String),
}

impl From<TokenError> for CatalogError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Rejected(msg) => CatalogError::Auth(msg),
            TokenError::RateLimited { .. } => {
                CatalogError::api(429, "credential endpoint is rate limited")
            }
            TokenError::Network(msg) => CatalogError::Network(msg),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

pub struct TokenManager {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    credentials: Credentials,
    token_url: String,
    safety_margin: Duration,
    // Held for the whole refresh, so concurrent callers wait for and then
    // reuse the token of the refresh already in flight.
    token: Mutex<Option<Token>>,
    expires_at: AtomicI64,
}

impl TokenManager {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        credentials: Credentials,
        token_url: String,
        safety_margin: Duration,
    ) -> Self {
        Self {
            transport,
            clock,
            events,
            credentials,
            token_url,
            safety_margin,
            token: Mutex::new(None),
            expires_at: AtomicI64::new(0),
        }
    }

    pub async fn valid_token(&self) -> Result<Token, TokenError> {
        let mut slot = self.token.lock().await;
        if let Some(token) = slot.as_ref() {
            if token.is_usable(self.clock.now_millis(), self.safety_margin) {
                return Ok(token.clone());
            }
        }

        let fresh = self.refresh().await?;
        self.expires_at.store(fresh.expires_at, Ordering::SeqCst);
        *slot = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drops the cached token if it is still the one that got rejected.
    pub async fn invalidate(&self, stale: &str) {
        let mut slot = self.token.lock().await;
        if slot.as_ref().is_some_and(|t| t.value == stale) {
            debug!("invalidating rejected access token");
            *slot = None;
            self.expires_at.store(0, Ordering::SeqCst);
        }
    }

    pub fn expires_in_secs(&self) -> u64 {
        let remaining = self.expires_at.load(Ordering::SeqCst) - self.clock.now_millis();
        (remaining.max(0) / 1000) as u64
    }

    async fn refresh(&self) -> Result<Token, TokenError> {
        let request = ApiRequest::post_form(
            &self.token_url,
            &[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ],
        );

        debug!(url = %self.token_url, "requesting client credentials token");
        let response = self
            .transport
            .send(&request, None)
            .await
            .map_err(|e| TokenError::Network(e.to_string()))?;

        if response.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TokenError::RateLimited {
                retry_after: response.retry_after,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).unwrap_or_default();
        if let Some(error) = parsed.error {
            let message = match parsed.error_description {
                Some(description) => format!("{error}: {description}"),
                None => error,
            };
            return Err(TokenError::Rejected(message));
        }
        if !response.status.is_success() {
            return Err(TokenError::Rejected(format!(
                "credential endpoint returned status {}",
                response.status.as_u16()
            )));
        }

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TokenError::Rejected("response carries no access token".into()))?;
        let expires_in = parsed.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        info!(expires_in, "obtained access token");
        self.events.emit(ClientEvent::TokenRefreshed {
            expires_in_secs: expires_in,
        });

        Ok(Token {
            value,
            expires_at: self.clock.now_millis() + (expires_in as i64) * 1000,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ManualClock, MockReply, MockTransport, T0};
    use serde_json::json;

    fn manager(transport: Arc<MockTransport>, clock: Arc<ManualClock>) -> TokenManager {
        TokenManager::new(
            transport,
            clock,
            EventBus::new(),
            Credentials::new("id", "secret"),
            crate::test_utils::TOKEN_URL.to_string(),
            Duration::from_secs(60),
        )
    }

    #[test]
    fn test_token_usable_respects_safety_margin() {
        let token = Token {
            value: "t".into(),
            expires_at: 100_000,
        };
        let margin = Duration::from_secs(60);
        assert!(token.is_usable(39_999, margin));
        assert!(!token.is_usable(40_000, margin));
    }

    #[tokio::test]
    async fn test_cached_token_is_reused() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tokens = manager(Arc::clone(&transport), Arc::clone(&clock));

        let first = tokens.valid_token().await.unwrap();
        let second = tokens.valid_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.token_calls(), 1);
        assert_eq!(tokens.expires_in_secs(), 3600);
    }

    #[tokio::test]
    async fn test_token_refreshed_inside_safety_margin() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tokens = manager(Arc::clone(&transport), Arc::clone(&clock));

        tokens.valid_token().await.unwrap();
        clock.advance(Duration::from_secs(3600 - 59));
        let renewed = tokens.valid_token().await.unwrap();

        assert_eq!(transport.token_calls(), 2);
        assert_eq!(renewed.value, "token-2");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let transport = Arc::new(MockTransport::new());
        let clock = Arc::new(ManualClock::new(T0));
        let tokens = Arc::new(manager(Arc::clone(&transport), clock));

        let calls = (0..8).map(|_| {
            let tokens = Arc::clone(&tokens);
            async move { tokens.valid_token().await }
        });
        let results = futures::future::join_all(calls).await;

        assert!(results.iter().all(|r| r.as_ref().unwrap().value == "token-1"));
        assert_eq!(transport.token_calls(), 1);
        assert_eq!(transport.max_token_calls_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_error_payload_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        transport.script_token(MockReply::Json(
            400,
            json!({"error": "invalid_client", "error_description": "Invalid client secret"}),
        ));
        let tokens = manager(Arc::clone(&transport), Arc::new(ManualClock::new(T0)));

        let err = tokens.valid_token().await.unwrap_err();
        assert!(matches!(&err, TokenError::Rejected(m) if m.contains("invalid_client")));
        assert!(CatalogError::from(err).is_auth());
    }

    #[tokio::test]
    async fn test_non_success_without_payload_is_rejected() {
        let transport = Arc::new(MockTransport::new());
        transport.script_token(MockReply::Text(503, "upstream down".into()));
        let tokens = manager(Arc::clone(&transport), Arc::new(ManualClock::new(T0)));

        let err = tokens.valid_token().await.unwrap_err();
        assert!(matches!(err, TokenError::Rejected(m) if m.contains("503")));
    }

    #[tokio::test]
    async fn test_rate_limited_credential_endpoint() {
        let transport = Arc::new(MockTransport::new());
        transport.script_token(MockReply::RateLimited(Some("12")));
        let tokens = manager(Arc::clone(&transport), Arc::new(ManualClock::new(T0)));

        let err = tokens.valid_token().await.unwrap_err();
        assert!(matches!(
            err,
            TokenError::RateLimited { retry_after: Some(ref s) } if s == "12"
        ));
    }

    #[tokio::test]
    async fn test_invalidate_only_drops_matching_token() {
        let transport = Arc::new(MockTransport::new());
        let tokens = manager(Arc::clone(&transport), Arc::new(ManualClock::new(T0)));

        let current = tokens.valid_token().await.unwrap();
        tokens.invalidate("some-older-token").await;
        assert_eq!(tokens.valid_token().await.unwrap(), current);
        assert_eq!(transport.token_calls(), 1);

        tokens.invalidate(&current.value).await;
        assert_eq!(tokens.expires_in_secs(), 0);
        assert_eq!(tokens.valid_token().await.unwrap().value, "token-2");
    }
}
