//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::snapshot::EventWindow;
use crate::util::time::{tick_delta, tick_interval, DEFAULT_TPS};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Admin HTTP binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Maximum concurrently active rooms
    pub max_rooms: usize,
    /// Bots to seed into a demo room at startup (0 = none)
    pub demo_bots: usize,
    /// Settings applied to every room this server creates
    pub room: RoomSettings,
}

/// Per-room settings, fixed at room construction
#[derive(Clone, Debug, PartialEq)]
pub struct RoomSettings {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Snapshots per second
    pub snapshot_rate: u32,
    pub max_players: usize,
    pub time_limit: Duration,
    pub kill_limit: u32,
    /// Zero skips the countdown phase
    pub countdown: Duration,
    pub event_window: EventWindow,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TPS,
            snapshot_rate: DEFAULT_TPS,
            max_players: 10,
            time_limit: Duration::from_secs(300),
            kill_limit: 20,
            countdown: Duration::ZERO,
            event_window: EventWindow::Full,
        }
    }
}

impl RoomSettings {
    /// Tick delta in seconds
    pub fn tick_delta(&self) -> f32 {
        tick_delta(self.tick_rate)
    }

    pub fn tick_interval(&self) -> Duration {
        tick_interval(self.tick_rate)
    }

    /// Ticks between snapshots
    pub fn snapshot_interval_ticks(&self) -> u32 {
        (self.tick_rate / self.snapshot_rate.max(1)).max(1)
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR for hosted deployments
        let server_addr = match get("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:7001".to_string()),
        };

        let defaults = RoomSettings::default();
        let tick_rate: u32 = parse_or(&get, "TICK_RATE", defaults.tick_rate)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }

        let event_window = match get("SNAPSHOT_EVENTS").as_deref() {
            None | Some("full") => EventWindow::Full,
            Some("since_last") => EventWindow::SinceLastSnapshot,
            Some(_) => return Err(ConfigError::Invalid("SNAPSHOT_EVENTS")),
        };

        let room = RoomSettings {
            tick_rate,
            snapshot_rate: parse_or(&get, "SNAPSHOT_RATE", tick_rate)?,
            max_players: parse_or(&get, "MAX_PLAYERS_PER_ROOM", defaults.max_players)?,
            time_limit: Duration::from_secs(parse_or(
                &get,
                "TIME_LIMIT_SECS",
                defaults.time_limit.as_secs(),
            )?),
            kill_limit: parse_or(&get, "KILL_LIMIT", defaults.kill_limit)?,
            countdown: Duration::from_secs(parse_or(&get, "COUNTDOWN_SECS", 0u64)?),
            event_window,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            max_rooms: parse_or(&get, "MAX_ROOMS_PER_SERVER", 50)?,
            demo_bots: parse_or(&get, "DEMO_BOTS", 0)?,
            room,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
