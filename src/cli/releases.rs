use std::sync::Arc;

use tabled::Table;

use crate::{
    cli::{Spinner, connect, load_followed},
    config, error, success,
    types::AlbumTableRow,
    utils, warning,
};

/// Prints the releases of followed artists from the last `days` days.
///
/// Without `days` the configured lookback period is used. Either way the
/// value is clamped to 1..=14 days.
pub async fn new_releases(days: Option<u32>) {
    let followed = load_followed().await;
    if followed.is_empty() {
        warning!("No followed artists. Use releasewatch artists follow <id>.");
        return;
    }

    let client = connect();
    let lookback_days = config::clamp_lookback_days(days.unwrap_or(client.config().lookback_days));

    let spinner = Arc::new(Spinner::start("Checking for new releases..."));
    client.subscribe(spinner.clone());

    let releases = match client
        .release_aggregator()
        .find_new_releases(&followed.artists(), lookback_days)
        .await
    {
        Ok(releases) => releases,
        Err(e) => {
            spinner.finish();
            error!("Cannot check for new releases. Err: {}", e);
        }
    };
    spinner.finish();

    if releases.is_empty() {
        success!("No new releases in the last {} days.", lookback_days);
        return;
    }

    let mut rows = utils::to_release_table_rows(&releases);
    utils::sort_release_table_rows(&mut rows);
    println!(
        "New releases, last {days} days\n{table}\n",
        days = lookback_days,
        table = Table::new(rows)
    );
}

pub async fn artist_releases(artist_id: String, limit: usize) {
    let client = connect();
    let spinner = Arc::new(Spinner::start("Fetching releases..."));
    client.subscribe(spinner.clone());

    let releases = match client.get_artist_releases(&artist_id, limit).await {
        Ok(releases) => releases,
        Err(e) => {
            spinner.finish();
            error!("Cannot fetch releases for artist {}. Err: {}", artist_id, e);
        }
    };
    spinner.finish();

    if releases.is_empty() {
        warning!("Artist {} has no releases.", artist_id);
        return;
    }

    let rows: Vec<AlbumTableRow> = releases
        .into_iter()
        .map(|detail| AlbumTableRow {
            date: detail.album.release_date,
            name: detail.album.name,
            kind: detail.album.album_type,
            tracks: detail.tracks.items.len(),
        })
        .collect();
    println!("{}", Table::new(rows));
}
