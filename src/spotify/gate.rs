use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::{
    clock::Clock,
    error::{CatalogError, Result},
    events::{ClientEvent, EventBus},
    spotify::{
        executor::{Outcome, RequestExecutor},
        transport::ApiRequest,
    },
};

/// The period during which the API asked us to back off.
#[derive(Debug)]
pub struct RateLimitWindow {
    until: AtomicI64,
    initial_duration_secs: AtomicU64,
}

impl RateLimitWindow {
    pub fn new(initial_duration_secs: u64) -> Self {
        Self {
            until: AtomicI64::new(0),
            initial_duration_secs: AtomicU64::new(initial_duration_secs),
        }
    }

    pub fn open(&self, now: i64, secs: u64) {
        self.until
            .store(now + (secs as i64) * 1000, Ordering::SeqCst);
        self.initial_duration_secs.store(secs, Ordering::SeqCst);
    }

    /// Epoch millis at which the window closes. `0` if it was never opened.
    pub fn until(&self) -> i64 {
        self.until.load(Ordering::SeqCst)
    }

    pub fn initial_duration_secs(&self) -> u64 {
        self.initial_duration_secs.load(Ordering::SeqCst)
    }

    pub fn is_active(&self, now: i64) -> bool {
        now < self.until()
    }

    pub fn remaining_millis(&self, now: i64) -> i64 {
        (self.until() - now).max(0)
    }
}

struct QueuedRequest {
    request: ApiRequest,
    completion: oneshot::Sender<Result<Value>>,
}

/// Admits requests while no rate-limit window is open and parks them in a
/// FIFO queue otherwise. A single background task drains the queue once the
/// window has passed.
pub struct RateLimitGate {
    executor: Arc<RequestExecutor>,
    window: Arc<RateLimitWindow>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    queue: Mutex<VecDeque<QueuedRequest>>,
    draining: AtomicBool,
    buffer: Duration,
}

impl RateLimitGate {
    pub fn new(
        executor: Arc<RequestExecutor>,
        window: Arc<RateLimitWindow>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        buffer: Duration,
    ) -> Self {
        Self {
            executor,
            window,
            clock,
            events,
            queue: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            buffer,
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn window(&self) -> &RateLimitWindow {
        &self.window
    }

    pub async fn schedule(self: &Arc<Self>, request: ApiRequest) -> Result<Value> {
        if self.window.is_active(self.clock.now_millis()) {
            return self.enqueue(request).await;
        }

        match self.executor.execute(&request).await? {
            Outcome::Completed(value) => Ok(value),
            Outcome::Deferred => self.enqueue(request).await,
        }
    }

    async fn enqueue(self: &Arc<Self>, request: ApiRequest) -> Result<Value> {
        let (completion, result) = oneshot::channel();
        let url = request.url.clone();
        let queued = {
            let mut queue = self.queue.lock();
            queue.push_back(QueuedRequest {
                request,
                completion,
            });
            queue.len()
        };

        debug!(%url, queued, "request parked until the rate limit window closes");
        self.events.emit(ClientEvent::RequestQueued { queued });
        self.start_drain();

        result.await.unwrap_or_else(|_| {
            Err(CatalogError::Network(
                "rate limit queue dropped the request".to_string(),
            ))
        })
    }

    fn start_drain(self: &Arc<Self>) {
        if self.draining.swap(true, Ordering::SeqCst) {
            return;
        }
        let gate = Arc::clone(self);
        tokio::spawn(gate.drain());
    }

    async fn drain(self: Arc<Self>) {
        loop {
            let remaining = self.window.remaining_millis(self.clock.now_millis());
            if remaining > 0 {
                debug!(remaining_ms = remaining, "waiting for the rate limit window");
                self.clock
                    .sleep(Duration::from_millis(remaining as u64) + self.buffer)
                    .await;
                // The window may have been extended while we slept.
                continue;
            }

            let next = self.queue.lock().pop_front();
            let Some(item) = next else {
                self.draining.store(false, Ordering::SeqCst);
                let empty = self.queue.lock().is_empty();
                if empty {
                    info!("rate limit queue drained");
                    self.events.emit(ClientEvent::QueueDrained);
                    return;
                }
                // An enqueue slipped in after the pop. Whoever wins the flag
                // drains it.
                if self.draining.swap(true, Ordering::SeqCst) {
                    return;
                }
                continue;
            };

            match self.executor.execute(&item.request).await {
                Ok(Outcome::Completed(value)) => {
                    let _ = item.completion.send(Ok(value));
                }
                Ok(Outcome::Deferred) => {
                    self.queue.lock().push_front(item);
                }
                Err(e) => {
                    let _ = item.completion.send(Err(e));
                }
            }
        }
    }
}
