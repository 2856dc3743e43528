//! State-change notifications emitted by the client.
//!
//! The core never talks to a presentation layer directly. Anything that wants
//! to show progress (a spinner, a status line, a log) registers an
//! [`EventListener`] and receives [`ClientEvent`]s as they happen.

use std::sync::Arc;

use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A new access token was obtained.
    TokenRefreshed { expires_in_secs: u64 },
    /// The API answered 429 and a rate-limit window was opened.
    RateLimited { retry_after_secs: u64 },
    /// A request was parked until the rate-limit window closes.
    RequestQueued { queued: usize },
    /// The rate-limit queue ran empty.
    QueueDrained,
    /// A transport failure is being retried after `delay_secs`.
    NetworkRetry { attempt: u32, delay_secs: u64 },
    /// A new-release check started for `artists` followed artists.
    ReleaseCheckStarted { artists: usize },
    /// One followed artist was processed.
    ArtistProcessed {
        artist: String,
        done: usize,
        total: usize,
    },
    /// Fetching one followed artist failed and was skipped.
    ArtistFailed { artist: String, reason: String },
    /// A new-release check finished with `releases` results.
    ReleaseCheckFinished { releases: usize },
}

pub trait EventListener: Send + Sync {
    fn on_state_change(&self, event: &ClientEvent);
}

impl<F> EventListener for F
where
    F: Fn(&ClientEvent) + Send + Sync,
{
    fn on_state_change(&self, event: &ClientEvent) {
        self(event)
    }
}

/// Fan-out of events to every subscribed listener.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Vec<Arc<dyn EventListener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn EventListener>) {
        self.listeners.write().push(listener);
    }

    pub fn emit(&self, event: ClientEvent) {
        for listener in self.listeners.read().iter() {
            listener.on_state_change(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_emit_reaches_every_listener() {
        let bus = EventBus::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&first);
        bus.subscribe(Arc::new(move |e: &ClientEvent| sink.lock().push(e.clone())));
        let sink = Arc::clone(&second);
        bus.subscribe(Arc::new(move |e: &ClientEvent| sink.lock().push(e.clone())));

        bus.emit(ClientEvent::QueueDrained);

        assert_eq!(first.lock().as_slice(), &[ClientEvent::QueueDrained]);
        assert_eq!(second.lock().as_slice(), &[ClientEvent::QueueDrained]);
    }

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let bus = EventBus::new();
        bus.emit(ClientEvent::RateLimited {
            retry_after_secs: 30,
        });
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let clone = bus.clone();
        clone.subscribe(Arc::new(|_: &ClientEvent| {}));
        assert_eq!(bus.listener_count(), 1);
    }
}
