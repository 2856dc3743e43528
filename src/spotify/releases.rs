use std::collections::HashMap;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::{
    error::{CatalogError, Result},
    spotify::CatalogClient,
    types::{Album, AlbumDetail, AlbumResponse},
    utils,
};

const RELEASE_LIST_LIMIT: u32 = 20;
const RECENT_ALBUMS_LIMIT: u32 = 10;

/// Collapses releases that share a title, newest first.
///
/// Titles are compared lower-cased and trimmed. Of two releases with the
/// same title the newer one stays; on equal dates a single beats an album,
/// otherwise the first one seen stays. Dates that cannot be parsed rank
/// oldest. The survivors are sorted by release date, newest first, and cut
/// to `limit`.
pub fn dedupe_releases(albums: &[Album], limit: usize) -> Vec<Album> {
    let mut kept: Vec<Album> = Vec::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();

    for album in albums {
        let title = utils::normalize_title(&album.name);
        match by_title.get(&title) {
            Some(&idx) => {
                if supersedes(album, &kept[idx]) {
                    kept[idx] = album.clone();
                }
            }
            None => {
                by_title.insert(title, kept.len());
                kept.push(album.clone());
            }
        }
    }

    kept.sort_by_key(|album| std::cmp::Reverse(rank(album)));
    kept.truncate(limit);
    kept
}

fn rank(album: &Album) -> i64 {
    utils::release_timestamp(&album.release_date).unwrap_or(i64::MIN)
}

fn supersedes(candidate: &Album, current: &Album) -> bool {
    let (candidate_at, current_at) = (rank(candidate), rank(current));
    candidate_at > current_at
        || (candidate_at == current_at && candidate.is_single() && !current.is_single())
}

impl CatalogClient {
    /// The latest singles and albums of an artist with their track lists.
    ///
    /// Detail lookups run concurrently and failed ones are dropped. Only when
    /// every lookup failed is the whole call an error.
    pub async fn get_artist_releases(&self, artist_id: &str, limit: usize) -> Result<Vec<AlbumDetail>> {
        let albums = self.list_albums(artist_id, RELEASE_LIST_LIMIT).await?;
        let unique = dedupe_releases(&albums, limit);
        debug!(
            artist_id,
            listed = albums.len(),
            kept = unique.len(),
            "fetching release details"
        );
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let attempted = unique.len();
        let mut details = Vec::with_capacity(attempted);
        let mut last_error = None;
        for (album, result) in unique
            .iter()
            .zip(join_all(unique.iter().map(|a| self.get_album(&a.id))).await)
        {
            match result {
                Ok(detail) => details.push(detail),
                Err(e) => {
                    warn!(album_id = %album.id, error = %e, "skipping release without details");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) if details.is_empty() => Err(CatalogError::AllDetailsFailed {
                attempted,
                last: Box::new(last),
            }),
            _ => Ok(details),
        }
    }

    /// The ten most recent singles and albums of an artist, without details.
    pub async fn fetch_recent_albums(&self, artist_id: &str) -> Result<Vec<Album>> {
        self.list_albums(artist_id, RECENT_ALBUMS_LIMIT).await
    }

    pub async fn get_album(&self, album_id: &str) -> Result<AlbumDetail> {
        self.get(&format!("/albums/{}", urlencoding::encode(album_id)))
            .await
    }

    async fn list_albums(&self, artist_id: &str, limit: u32) -> Result<Vec<Album>> {
        let path = format!(
            "/artists/{id}/albums?include_groups=single,album&limit={limit}&market={market}",
            id = urlencoding::encode(artist_id),
            market = urlencoding::encode(&self.config().market),
        );
        let response: AlbumResponse = self.get(&path).await?;
        Ok(response.items)
    }
}
