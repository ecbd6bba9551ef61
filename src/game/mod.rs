//! Game simulation modules

pub mod bot;
pub mod entities;
pub mod error;
pub mod manager;
pub mod maps;
pub mod physics;
pub mod room;
pub mod snapshot;
pub mod validator;
pub mod weapons;

pub use entities::{Player, PlayerId, Team, Vec2};
pub use error::{ClaimError, ManagerError, RoomError};
pub use manager::RoomManager;
pub use room::{GameMode, Room, RoomState, RoomSummary};
pub use snapshot::{SnapshotSink, WorldSnapshot};
pub use validator::HitClaim;
pub use weapons::WeaponId;

use serde::{Deserialize, Serialize};

/// One tick's worth of player intent, as sent by a client or produced by a bot
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Stick x in [-1, 1]
    pub horizontal: f32,
    /// Stick y in [-1, 1], only applied while flying
    pub vertical: f32,
    pub aim_angle_deg: f32,
    pub flying: bool,
    pub firing: bool,
    /// Raw weapon id
    pub weapon: u8,
    pub sequence: u32,
}
