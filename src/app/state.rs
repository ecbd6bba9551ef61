//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::RoomManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomManager>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let rooms = Arc::new(RoomManager::new(config.max_rooms, config.room.clone()));

        Self { config, rooms }
    }
}
