//! # Catalog client
//!
//! Access to the Spotify Web API with client-credentials authentication.
//!
//! ```text
//! CatalogClient (artists, releases)
//!          ↓
//! RateLimitGate      queue while a 429 window is open, drain in FIFO order
//!          ↓
//! RequestExecutor    bearer token, 401 refresh, network backoff
//!          ↓
//! Transport          reqwest, or a scripted transport in tests
//! ```
//!
//! Every call site goes through the gate, so a rate-limit signal seen by one
//! request holds back all the others until the window has passed.

pub mod artists;
pub mod client;
pub mod executor;
pub mod gate;
pub mod releases;
pub mod transport;

pub use client::{ApiStatus, CatalogClient, CatalogClientBuilder};
pub use executor::{Outcome, RetryPolicy};
pub use releases::dedupe_releases;
