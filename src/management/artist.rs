use std::{io::ErrorKind, path::PathBuf};

use crate::{
    config,
    management::StateError,
    types::{Artist, FollowedArtist},
};

/// The artists the user follows locally, in the order they were followed.
#[derive(Debug, Clone)]
pub struct FollowedArtists {
    path: PathBuf,
    artists: Vec<FollowedArtist>,
}

impl FollowedArtists {
    pub fn default_path() -> PathBuf {
        let mut path = config::data_dir();
        path.push("cache/followed-artists.json");
        path
    }

    pub async fn load() -> Result<Self, StateError> {
        Self::load_from(Self::default_path()).await
    }

    /// Reads the list at `path`. A missing file is an empty list.
    pub async fn load_from(path: PathBuf) -> Result<Self, StateError> {
        let artists = match async_fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, artists })
    }

    pub async fn persist(&self) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.artists)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Returns `false` if the artist was already followed.
    pub fn follow(&mut self, artist: Artist, followed_at: i64) -> bool {
        if self.contains(&artist.id) {
            return false;
        }
        self.artists.push(FollowedArtist {
            artist,
            followed_at,
        });
        true
    }

    pub fn unfollow(&mut self, artist_id: &str) -> Option<FollowedArtist> {
        let idx = self.artists.iter().position(|f| f.artist.id == artist_id)?;
        Some(self.artists.remove(idx))
    }

    pub fn contains(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|f| f.artist.id == artist_id)
    }

    pub fn artists(&self) -> Vec<Artist> {
        self.artists.iter().map(|f| f.artist.clone()).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.artists.iter().map(|f| f.artist.id.clone()).collect()
    }

    pub fn all(&self) -> &[FollowedArtist] {
        &self.artists
    }

    pub fn len(&self) -> usize {
        self.artists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
    }
}
