//! Error taxonomy for rooms, the room manager and hit claims

use uuid::Uuid;

use super::entities::PlayerId;
use super::room::RoomState;
use super::validator::Rejection;

/// Room control-surface errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room full")]
    RoomFull,

    #[error("match already in progress")]
    MatchInProgress,

    #[error("room cannot start from state {0:?}")]
    AlreadyStarted(RoomState),

    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),

    #[error("room has been stopped")]
    Stopped,
}

/// Room manager errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    #[error("server at max room capacity ({max})")]
    AtCapacity { max: usize },

    #[error("room {0} not found")]
    NotFound(Uuid),
}

/// Why a hit claim was not accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    #[error("unknown shooter {0}")]
    UnknownShooter(PlayerId),

    #[error("unknown or dead target {0}")]
    InvalidTarget(PlayerId),

    #[error("shooter is dead")]
    ShooterDead,

    #[error("weapon {0} is not a hitscan weapon")]
    NotHitscan(u8),

    #[error("match is not in progress")]
    NotInProgress,

    #[error("claim rejected: {0}")]
    Rejected(#[from] Rejection),
}

/// Unrecognised game mode string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game mode `{0}`")]
pub struct UnknownMode(pub String);
