//! Test utilities and fixtures shared by the unit tests.
//!
//! [`MockTransport`] stands in for the HTTP layer and [`ManualClock`] for wall
//! clock time, so the client stack can be exercised end to end without a
//! network and without real waiting.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{ManualClock, MockReply, MockTransport, T0, test_client};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let transport = Arc::new(MockTransport::new());
//!     transport.route("/artists/a1", MockReply::Json(200, artist_json("a1", "A")));
//!     let client = test_client(transport, Arc::new(ManualClock::new(T0)));
//!     // ... test logic
//! }
//! ```

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc,
        atomic::{AtomicI64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{Value, json};

use crate::{
    clock::Clock,
    config::{ClientConfig, Credentials},
    management::{MemoryScheduleStore, ScheduleStore},
    spotify::{
        CatalogClient,
        transport::{ApiRequest, ApiResponse, Transport, TransportError},
    },
    types::Artist,
};

pub const API_URL: &str = "https://api.test/v1";
pub const TOKEN_URL: &str = "https://auth.test/api/token";

/// 2024-01-08T00:00:00Z
pub const T0: i64 = 1_704_672_000_000;

/// Virtual time: `sleep` advances `now` instantly and records the delay.
pub struct ManualClock {
    now: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Clone)]
pub enum MockReply {
    Json(u16, Value),
    Text(u16, String),
    /// 429 with the given `Retry-After` header value.
    RateLimited(Option<&'static str>),
    Unauthorized,
    NetworkDown,
    /// A fresh `token-N` from the credential endpoint.
    Token,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub url: String,
    pub bearer: Option<String>,
}

/// Scripted transport. Replies are queued per path; the last reply of a
/// queue repeats forever.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<MockReply>>>,
    token_replies: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<RecordedRequest>>,
    tokens_issued: AtomicUsize,
    token_calls: AtomicUsize,
    token_in_flight: AtomicUsize,
    max_token_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, path: &str, reply: MockReply) {
        self.routes
            .lock()
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn script_token(&self, reply: MockReply) {
        self.token_replies.lock().push_back(reply);
    }

    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    pub fn max_token_calls_in_flight(&self) -> usize {
        self.max_token_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.path == path).count()
    }

    fn next_reply(queue: &mut VecDeque<MockReply>) -> Option<MockReply> {
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn respond(&self, reply: MockReply) -> Result<ApiResponse, TransportError> {
        let (status, retry_after, body) = match reply {
            MockReply::Json(status, value) => (status, None, value.to_string()),
            MockReply::Text(status, text) => (status, None, text),
            MockReply::RateLimited(header) => (429, header.map(str::to_string), String::new()),
            MockReply::Unauthorized => (
                401,
                None,
                json!({"error": {"status": 401, "message": "The access token expired"}})
                    .to_string(),
            ),
            MockReply::NetworkDown => {
                return Err(TransportError("connection refused".to_string()));
            }
            MockReply::Token => {
                let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
                (
                    200,
                    None,
                    json!({
                        "access_token": format!("token-{n}"),
                        "token_type": "Bearer",
                        "expires_in": 3600
                    })
                    .to_string(),
                )
            }
        };

        Ok(ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            retry_after,
            body,
        })
    }

    async fn send_token(&self) -> Result<ApiResponse, TransportError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.token_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_token_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        let reply = Self::next_reply(&mut self.token_replies.lock()).unwrap_or(MockReply::Token);
        self.token_in_flight.fetch_sub(1, Ordering::SeqCst);
        self.respond(reply)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, TransportError> {
        if request.url == TOKEN_URL {
            return self.send_token().await;
        }

        let path = request
            .url
            .strip_prefix(API_URL)
            .unwrap_or(&request.url)
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string();
        self.requests.lock().push(RecordedRequest {
            path: path.clone(),
            url: request.url.clone(),
            bearer: bearer.map(str::to_string),
        });

        tokio::task::yield_now().await;

        let reply = self
            .routes
            .lock()
            .get_mut(&path)
            .and_then(Self::next_reply)
            .unwrap_or_else(|| {
                MockReply::Json(
                    404,
                    json!({"error": {"status": 404, "message": "non existing id"}}),
                )
            });
        self.respond(reply)
    }
}

pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new(Credentials::new("test-id", "test-secret"));
    config.api_url = API_URL.to_string();
    config.token_url = TOKEN_URL.to_string();
    config
}

pub fn test_client(transport: Arc<MockTransport>, clock: Arc<ManualClock>) -> CatalogClient {
    test_client_with_store(transport, clock, Arc::new(MemoryScheduleStore::new()))
}

pub fn test_client_with_store(
    transport: Arc<MockTransport>,
    clock: Arc<ManualClock>,
    store: Arc<dyn ScheduleStore>,
) -> CatalogClient {
    CatalogClient::builder(test_config())
        .transport(transport)
        .clock(clock)
        .store(store)
        .build()
        .unwrap()
}

pub fn artist(id: &str, name: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: name.to_string(),
        genres: Vec::new(),
        popularity: None,
        images: Vec::new(),
        followers: None,
    }
}

pub fn artist_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "genres": ["techno"],
        "popularity": 50,
        "images": [],
        "followers": {"total": 1000}
    })
}

pub fn album_json(
    id: &str,
    name: &str,
    release_date: &str,
    album_type: &str,
    artists: &[(&str, &str)],
) -> Value {
    json!({
        "id": id,
        "name": name,
        "release_date": release_date,
        "release_date_precision": "day",
        "album_type": album_type,
        "total_tracks": 1,
        "images": [],
        "artists": artists
            .iter()
            .map(|(id, name)| json!({"id": id, "name": name}))
            .collect::<Vec<_>>()
    })
}

pub fn album_detail_json(id: &str, name: &str, release_date: &str, album_type: &str) -> Value {
    let mut detail = album_json(id, name, release_date, album_type, &[("a1", "Artist One")]);
    detail["tracks"] = json!({
        "items": [
            {"id": format!("{id}-t1"), "name": "Intro", "uri": format!("spotify:track:{id}-t1"), "duration_ms": 180000, "track_number": 1}
        ]
    });
    detail
}
