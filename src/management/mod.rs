mod artist;
mod auth;
mod release;
mod state;

pub use artist::FollowedArtists;
pub use auth::{Token, TokenError, TokenManager};
pub use release::{Pacing, ReleaseAggregator};
pub use state::{FileScheduleStore, MemoryScheduleStore, ScheduleState, ScheduleStore, StateError};
