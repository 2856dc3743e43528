use std::sync::Arc;

use crate::{
    cli::{Spinner, connect, load_followed},
    info, utils, warning,
};

pub async fn info(genres: bool) {
    let client = connect();

    if genres {
        let spinner = Arc::new(Spinner::start("Fetching genre seeds..."));
        client.subscribe(spinner.clone());
        let genres = client.get_genres().await;
        spinner.finish();

        if genres.is_empty() {
            warning!("No genre seeds available.");
        } else {
            info!("Genre seeds ({}): {}", genres.len(), genres.join(", "));
        }
        return;
    }

    let followed = load_followed().await;
    let status = client.status();

    info!("Followed artists: {}", followed.len());
    match client.last_check_at().await {
        Some(at) => info!("Last release check: {}", utils::format_timestamp(at)),
        None => info!("Last release check: never"),
    }
    info!("Market: {}", client.config().market);
    info!(
        "Default lookback: {} days",
        client.config().lookback_days
    );

    if status.is_rate_limited {
        warning!(
            "Rate limited for another {}s ({:.0}% of {}s passed), {} request(s) queued.",
            status.rate_limited_for_secs,
            status.rate_limit_pct_complete,
            status.initial_rate_limit_secs,
            status.queued_requests
        );
    } else {
        info!("Rate limit: none");
    }
    if let Some(secs) = client
        .store()
        .load()
        .await
        .ok()
        .and_then(|state| state.initial_rate_limit_secs)
    {
        info!("Last rate limit window: {}s", secs);
    }
}
