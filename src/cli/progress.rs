use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::events::{ClientEvent, EventListener};

/// Terminal spinner that narrates client events.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Spinner text for an event, `None` for events that do not change it.
fn describe(event: &ClientEvent) -> Option<String> {
    let message = match event {
        ClientEvent::RateLimited { retry_after_secs } => {
            format!("Rate limited by Spotify, waiting {retry_after_secs}s...")
        }
        ClientEvent::RequestQueued { queued } => {
            format!("{queued} request(s) waiting for the rate limit to pass...")
        }
        ClientEvent::QueueDrained => "Rate limit passed, continuing...".to_string(),
        ClientEvent::NetworkRetry {
            attempt,
            delay_secs,
        } => format!("Network error, retry {attempt} in {delay_secs}s..."),
        ClientEvent::ReleaseCheckStarted { artists } => {
            format!("Checking {artists} artists for new releases...")
        }
        ClientEvent::ArtistProcessed {
            artist,
            done,
            total,
        } => format!("Checked {artist} ({done}/{total})"),
        ClientEvent::ArtistFailed { artist, .. } => format!("Skipped {artist}"),
        ClientEvent::TokenRefreshed { .. } | ClientEvent::ReleaseCheckFinished { .. } => {
            return None;
        }
    };
    Some(message)
}

impl EventListener for Spinner {
    fn on_state_change(&self, event: &ClientEvent) {
        if let Some(message) = describe(event) {
            self.bar.set_message(message);
        }
    }
}
