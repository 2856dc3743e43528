use std::sync::Arc;

use chrono::Utc;
use tabled::Table;

use crate::{
    cli::{Spinner, connect, load_followed},
    error, info, success,
    types::{Artist, ArtistTableRow},
    warning,
};

fn to_rows(artists: Vec<Artist>) -> Vec<ArtistTableRow> {
    artists
        .into_iter()
        .map(|a| ArtistTableRow {
            id: a.id,
            name: a.name,
            genres: a.genres.iter().take(3).cloned().collect::<Vec<_>>().join(","),
        })
        .collect()
}

fn print_artists(artists: Vec<Artist>, empty_message: &str) {
    if artists.is_empty() {
        warning!("{}", empty_message);
        return;
    }
    println!("{}", Table::new(to_rows(artists)));
}

pub async fn search_artists(query: String, limit: u32) {
    let client = connect();
    let spinner = Arc::new(Spinner::start(format!("Searching artists for \"{query}\"...")));
    client.subscribe(spinner.clone());

    let artists = client.search_artists(&query, limit).await;
    spinner.finish();

    print_artists(artists, "No artists found.");
}

pub async fn follow_artist(artist_id: String) {
    let client = connect();
    let mut followed = load_followed().await;

    if followed.contains(&artist_id) {
        info!("Artist {} is already followed.", artist_id);
        return;
    }

    let artist = match client.get_artist(&artist_id).await {
        Ok(artist) => artist,
        Err(e) => error!("Cannot look up artist {}. Err: {}", artist_id, e),
    };
    let name = artist.name.clone();
    followed.follow(artist, Utc::now().timestamp_millis());

    match followed.persist().await {
        Ok(_) => success!("Following {} now.", name),
        Err(e) => error!("Cannot save followed artists. Err: {}", e),
    }
}

pub async fn unfollow_artist(artist_id: String) {
    let mut followed = load_followed().await;

    let Some(removed) = followed.unfollow(&artist_id) else {
        warning!("Artist {} is not followed.", artist_id);
        return;
    };

    match followed.persist().await {
        Ok(_) => success!("Unfollowed {}.", removed.artist.name),
        Err(e) => error!("Cannot save followed artists. Err: {}", e),
    }
}

pub async fn list_artists() {
    let followed = load_followed().await;

    let mut artists = followed.artists();
    artists.sort_by_key(|a| a.name.to_lowercase());

    print_artists(
        artists,
        "No followed artists. Use releasewatch artists follow <id>.",
    );
}

pub async fn related_artists(artist_id: String) {
    let client = connect();
    let spinner = Arc::new(Spinner::start("Fetching related artists..."));
    client.subscribe(spinner.clone());

    let artists = client.get_related_artists(&artist_id).await;
    spinner.finish();

    print_artists(artists, "No related artists found.");
}

pub async fn recommend_artists(limit: u32) {
    let followed = load_followed().await;
    if followed.is_empty() {
        warning!("Follow some artists first, recommendations are seeded from them.");
        return;
    }

    let client = connect();
    let spinner = Arc::new(Spinner::start("Fetching recommendations..."));
    client.subscribe(spinner.clone());

    let mut artists = client.get_recommendations(&followed.ids(), limit).await;
    spinner.finish();

    artists.retain(|a| !followed.contains(&a.id));
    print_artists(artists, "No recommendations found.");
}
