//! # Command Line Interface Module
//!
//! User-facing commands of releasewatch. Each function builds what it needs
//! from the environment, runs one operation against the catalog client and
//! prints the outcome through the crate's output macros or as a table.
//!
//! Long running operations show a spinner whose message follows the
//! client's [`ClientEvent`](crate::events::ClientEvent)s, so rate limiting and
//! retries are visible while a command waits.
//!
//! Fatal problems (missing credentials, rejected credentials, unreadable
//! local files) end the process through [`error!`](crate::error).

mod artists;
mod auth;
mod info;
mod progress;
mod releases;

use std::sync::Arc;

pub use artists::{
    follow_artist, list_artists, recommend_artists, related_artists, search_artists,
    unfollow_artist,
};
pub use auth::auth;
pub use info::info;
pub use progress::Spinner;
pub use releases::{artist_releases, new_releases};

use crate::{
    config::ClientConfig,
    error,
    management::{FileScheduleStore, FollowedArtists},
    spotify::CatalogClient,
};

/// Builds a client from the environment, persisting schedule state in the
/// data directory.
pub(crate) fn connect() -> CatalogClient {
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("Cannot read configuration. Err: {}", e),
    };

    match CatalogClient::builder(config)
        .store(Arc::new(FileScheduleStore::default()))
        .build()
    {
        Ok(client) => client,
        Err(e) => error!("Cannot create client. Err: {}", e),
    }
}

pub(crate) async fn load_followed() -> FollowedArtists {
    match FollowedArtists::load().await {
        Ok(followed) => followed,
        Err(e) => error!("Cannot load followed artists. Err: {}", e),
    }
}
