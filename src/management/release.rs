use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    events::ClientEvent,
    spotify::CatalogClient,
    types::{AggregatedRelease, Album, Artist, CollaborationInfo},
    utils,
};

/// Spacing of the per-artist lookups of a release check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub batch_size: usize,
    /// Between two artists of the same batch.
    pub artist_delay: Duration,
    /// Between two batches.
    pub batch_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch_size: 5,
            artist_delay: Duration::from_millis(100),
            batch_delay: Duration::from_millis(500),
        }
    }
}

/// Builds the feed of recent releases across a list of followed artists.
pub struct ReleaseAggregator {
    client: CatalogClient,
    pacing: Pacing,
}

impl ReleaseAggregator {
    pub fn new(client: CatalogClient, pacing: Pacing) -> Self {
        Self { client, pacing }
    }

    /// Releases of the last `lookback_days` days by any of `followed`.
    ///
    /// Each release shows up once, attributed to the earliest followed
    /// artist credited on it. Artists whose lookup fails are skipped, except
    /// for authentication failures which abort the whole check. A completed
    /// check is recorded in the schedule store.
    pub async fn find_new_releases(
        &self,
        followed: &[Artist],
        lookback_days: u32,
    ) -> Result<Vec<AggregatedRelease>> {
        if followed.is_empty() {
            return Ok(Vec::new());
        }

        let clock = self.client.clock();
        let events = self.client.events();
        let total = followed.len();
        let now = clock.now_millis();
        let cutoff = utils::lookback_cutoff(now, lookback_days);

        info!(artists = total, lookback_days, "checking for new releases");
        events.emit(ClientEvent::ReleaseCheckStarted { artists: total });

        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, artist) in followed.iter().enumerate() {
            positions.entry(artist.id.as_str()).or_insert(idx);
        }

        let mut emitted = HashSet::new();
        let mut releases = Vec::new();
        let mut done = 0;

        for (batch_no, batch) in followed.chunks(self.pacing.batch_size.max(1)).enumerate() {
            if batch_no > 0 {
                self.client.pause(self.pacing.batch_delay).await;
            }

            for (pos, artist) in batch.iter().enumerate() {
                if pos > 0 {
                    self.client.pause(self.pacing.artist_delay).await;
                }

                match self.client.fetch_recent_albums(&artist.id).await {
                    Ok(albums) => {
                        let current = done;
                        for album in albums {
                            let recent = utils::release_timestamp(&album.release_date)
                                .is_some_and(|at| at > cutoff);
                            if recent && emitted.insert(album.id.clone()) {
                                releases.push(attribute(followed, &positions, current, album));
                            }
                        }
                    }
                    Err(e) if e.is_auth() => return Err(e),
                    Err(e) => {
                        warn!(artist = %artist.name, error = %e, "skipping artist");
                        events.emit(ClientEvent::ArtistFailed {
                            artist: artist.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }

                done += 1;
                debug!(artist = %artist.name, done, total, "artist processed");
                events.emit(ClientEvent::ArtistProcessed {
                    artist: artist.name.clone(),
                    done,
                    total,
                });
            }
        }

        if let Err(e) = self.client.store().record_check(now).await {
            warn!(error = %e, "cannot record release check");
        }

        info!(releases = releases.len(), "release check finished");
        events.emit(ClientEvent::ReleaseCheckFinished {
            releases: releases.len(),
        });
        Ok(releases)
    }
}

fn attribute(
    followed: &[Artist],
    positions: &HashMap<&str, usize>,
    current: usize,
    album: Album,
) -> AggregatedRelease {
    let primary = album
        .artists
        .iter()
        .filter_map(|a| positions.get(a.id.as_str()).copied())
        .fold(current, usize::min);
    let artist = followed[primary].clone();

    // Only releases credited to more than one artist are collaborations.
    let collaboration_info = (album.artists.len() > 1).then(|| CollaborationInfo {
        is_collaboration: true,
        collaborating_artists: album
            .artists
            .iter()
            .filter(|a| a.id != artist.id)
            .map(|a| a.name.clone())
            .collect(),
    });

    AggregatedRelease {
        artist,
        album,
        collaboration_info,
    }
}
