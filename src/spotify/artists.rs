use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
    error::Result,
    spotify::CatalogClient,
    types::{Artist, GenreSeedsResponse, RecommendationsResponse, RelatedArtistsResponse, SearchResponse},
};

const RELATED_ARTISTS_LIMIT: usize = 5;
const MAX_SEED_ARTISTS: usize = 5;
const MAX_RECOMMENDED_ARTISTS: usize = 6;

impl CatalogClient {
    /// Searches artists by name. Failures are logged and yield no results.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Vec<Artist> {
        let path = format!(
            "/search?q={q}&type=artist&limit={limit}",
            q = urlencoding::encode(query.trim()),
        );

        match self.get::<SearchResponse>(&path).await {
            Ok(response) => response.artists.items,
            Err(e) => {
                warn!(query, error = %e, "artist search failed");
                Vec::new()
            }
        }
    }

    pub async fn get_artist(&self, artist_id: &str) -> Result<Artist> {
        self.get(&format!("/artists/{}", urlencoding::encode(artist_id)))
            .await
    }

    /// The five most related artists, or none if the lookup fails.
    pub async fn get_related_artists(&self, artist_id: &str) -> Vec<Artist> {
        let path = format!("/artists/{}/related-artists", urlencoding::encode(artist_id));

        match self.get::<RelatedArtistsResponse>(&path).await {
            Ok(response) => response
                .artists
                .into_iter()
                .take(RELATED_ARTISTS_LIMIT)
                .collect(),
            Err(e) => {
                warn!(artist_id, error = %e, "related artists lookup failed");
                Vec::new()
            }
        }
    }

    /// Genre names accepted as recommendation seeds.
    pub async fn get_genres(&self) -> Vec<String> {
        match self
            .get::<GenreSeedsResponse>("/recommendations/available-genre-seeds")
            .await
        {
            Ok(response) => response.genres,
            Err(e) => {
                warn!(error = %e, "genre seed lookup failed");
                Vec::new()
            }
        }
    }

    /// Artists appearing on tracks recommended for the given seed artists.
    ///
    /// At most five seeds are sent. Artists found on the recommended tracks
    /// that are not seeds themselves are resolved, up to six of them, in the
    /// order they first appear. Lookups that fail are left out.
    pub async fn get_recommendations(&self, seed_ids: &[String], limit: u32) -> Vec<Artist> {
        let seeds: Vec<&str> = seed_ids
            .iter()
            .map(String::as_str)
            .take(MAX_SEED_ARTISTS)
            .collect();
        if seeds.is_empty() {
            return Vec::new();
        }

        let path = format!(
            "/recommendations?seed_artists={seeds}&limit={limit}&market={market}",
            seeds = urlencoding::encode(&seeds.join(",")),
            market = urlencoding::encode(&self.config().market),
        );
        let response = match self.get::<RecommendationsResponse>(&path).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "recommendations lookup failed");
                return Vec::new();
            }
        };

        let mut seen: HashSet<&str> = seeds.iter().copied().collect();
        let mut candidates = Vec::new();
        for artist in response.tracks.iter().flat_map(|t| &t.artists) {
            if candidates.len() == MAX_RECOMMENDED_ARTISTS {
                break;
            }
            if seen.insert(artist.id.as_str()) {
                candidates.push(artist.id.as_str());
            }
        }
        debug!(candidates = candidates.len(), "resolving recommended artists");

        join_all(candidates.iter().map(|id| self.get_artist(id)))
            .await
            .into_iter()
            .zip(&candidates)
            .filter_map(|(result, id)| match result {
                Ok(artist) => Some(artist),
                Err(e) => {
                    warn!(artist_id = id, error = %e, "skipping recommended artist");
                    None
                }
            })
            .collect()
    }
}
