use crate::{cli::connect, error, success};

pub async fn auth() {
    let client = connect();

    match client.authenticate().await {
        Ok(expires_in) => success!(
            "Credentials accepted, access token valid for {} minutes.",
            expires_in / 60
        ),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}
