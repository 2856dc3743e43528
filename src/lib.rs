//! releasewatch library
//!
//! A Spotify catalog client built around client-credentials authentication
//! that keeps working under rate limiting, plus the release aggregation that
//! turns a list of followed artists into a feed of their latest releases.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `clock` - Time source used for token expiry, backoff and pacing
//! - `config` - Configuration from environment variables and `.env`
//! - `error` - The error type shared by all catalog operations
//! - `events` - State-change notifications for progress reporting
//! - `management` - Tokens, release aggregation and local persistence
//! - `spotify` - The catalog client and its request pipeline
//! - `types` - Data structures and type definitions
//! - `utils` - Utility functions and helpers
//!
//! # Example
//!
//! ```ignore
//! use releasewatch::{config::{self, ClientConfig}, spotify::CatalogClient};
//!
//! #[tokio::main]
//! async fn main() -> releasewatch::error::Result<()> {
//!     config::load_env().await?;
//!     let client = CatalogClient::new(ClientConfig::from_env()?)?;
//!     for artist in client.search_artists("boards of canada", 5).await {
//!         println!("{} {}", artist.id, artist.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod management;
pub mod spotify;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

/// Prints an informational line with a blue `o` marker.
///
/// Takes the same arguments as `println!`.
///
/// ```ignore
/// info!("Followed artists: {}", followed.len());
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success line with a green checkmark.
///
/// ```ignore
/// success!("Following {} now.", name);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error line with a red `!` marker and exits with status 1.
///
/// Meant for failures a command cannot recover from, such as missing
/// credentials. Code after the macro never runs, so it can stand in for a
/// value in a `match` arm.
///
/// ```ignore
/// let config = match ClientConfig::from_env() {
///     Ok(config) => config,
///     Err(e) => error!("Cannot read configuration. Err: {}", e),
/// };
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning line with a yellow `!` marker.
///
/// ```ignore
/// warning!("No followed artists.");
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
