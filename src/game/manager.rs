//! Room manager - registry of live rooms with a capacity bound

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::RoomSettings;

use super::error::ManagerError;
use super::maps::MapLayout;
use super::room::{GameMode, Room, RoomState};

pub struct RoomManager {
    rooms: DashMap<Uuid, Arc<Room>>,
    max_rooms: usize,
    settings: RoomSettings,
    /// Serializes the capacity check with the insert
    create_lock: Mutex<()>,
}

impl RoomManager {
    pub fn new(max_rooms: usize, settings: RoomSettings) -> Self {
        Self {
            rooms: DashMap::new(),
            max_rooms,
            settings,
            create_lock: Mutex::new(()),
        }
    }

    /// Create and register a room. Fails once `max_rooms` rooms exist.
    pub fn create_room(&self, mode: GameMode, map_id: &str) -> Result<Arc<Room>, ManagerError> {
        let _guard = self.create_lock.lock();
        if self.rooms.len() >= self.max_rooms {
            return Err(ManagerError::AtCapacity { max: self.max_rooms });
        }

        let room = Arc::new(Room::new(mode, MapLayout::load(map_id), self.settings.clone()));
        self.rooms.insert(room.id(), Arc::clone(&room));

        info!(
            room_id = %room.id(),
            mode = mode.as_str(),
            map = map_id,
            active_rooms = self.rooms.len(),
            "Room created"
        );
        Ok(room)
    }

    pub fn get_room(&self, id: &Uuid) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| Arc::clone(r.value()))
    }

    pub fn list_rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.iter().map(|r| Arc::clone(r.value())).collect()
    }

    /// Stop and deregister a room
    pub fn remove_room(&self, id: &Uuid) -> Result<Arc<Room>, ManagerError> {
        let (_, room) = self.rooms.remove(id).ok_or(ManagerError::NotFound(*id))?;
        room.stop();
        info!(room_id = %id, active_rooms = self.rooms.len(), "Room removed");
        Ok(room)
    }

    /// Drop every FINISHED room. Returns how many were reaped.
    pub fn reap_finished(&self) -> usize {
        let finished: Vec<Uuid> = self
            .rooms
            .iter()
            .filter(|r| r.value().state() == RoomState::Finished)
            .map(|r| *r.key())
            .collect();

        finished
            .iter()
            .filter(|id| self.remove_room(id).is_ok())
            .count()
    }

    /// Stop every room and clear the registry
    pub fn shutdown(&self) {
        let count = self.rooms.len();
        for room in self.rooms.iter() {
            room.value().stop();
        }
        self.rooms.clear();
        info!(rooms = count, "All rooms stopped");
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn max_rooms(&self) -> usize {
        self.max_rooms
    }

    pub fn total_players(&self) -> usize {
        self.rooms.iter().map(|r| r.value().player_count()).sum()
    }
}
