//! Arena Server - authoritative simulation core for a jetpack arena shooter
//!
//! Rooms run their own fixed-rate tick loop on the tokio runtime, own every
//! entity in the match and publish world snapshots to a pluggable sink.

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod util;

pub use config::{Config, ConfigError, RoomSettings};
pub use game::{
    GameMode, HitClaim, PlayerInput, Room, RoomManager, RoomState, SnapshotSink, WorldSnapshot,
};
