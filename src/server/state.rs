use axum::extract::FromRef;

use crate::curator::Curator;
use crate::resolver::TrackCatalog;
use crate::user::UserManager;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<Mutex<UserManager>>;
pub type GuardedCurator = Arc<Curator>;
pub type GuardedTrackCatalog = Arc<dyn TrackCatalog>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub curator: GuardedCurator,
    pub catalog: GuardedTrackCatalog,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedCurator {
    fn from_ref(input: &ServerState) -> Self {
        input.curator.clone()
    }
}

impl FromRef<ServerState> for GuardedTrackCatalog {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
