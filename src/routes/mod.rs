pub mod health;
mod router;
pub mod types;

pub use router::{
    create_router, RouteGroups, AUTH_PREFIX, HABITS_PREFIX, HEALTH_PATH, MOUNT_PATHS, STATS_PREFIX,
};

// Re-export AppState for convenience
pub use crate::state::AppState;
