//! Entities owned by a room: players, projectiles, pickups and match events

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::weapons::WeaponId;

/// Room-scoped player identifier
pub type PlayerId = u32;

pub const MAX_HEALTH: i32 = 100;
pub const MAX_FUEL: f32 = 100.0;
pub const FUEL_DRAIN_PER_SEC: f32 = 15.0;
pub const FUEL_RECHARGE_PER_SEC: f32 = 10.0;
/// Horizontal speed cap (units/sec)
pub const MAX_SPEED_X: f32 = 12.0;
/// Vertical speed cap (units/sec)
pub const MAX_SPEED_Y: f32 = 15.0;
pub const RESPAWN_DELAY: Duration = Duration::from_secs(3);

/// 2D position or velocity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Team affiliation; free-for-all players have none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    Red,
    Blue,
    None,
}

impl Team {
    /// Two players are enemies unless they share a real team
    pub fn is_enemy_of(self, other: Team) -> bool {
        self == Team::None || self != other
    }
}

/// Authoritative player state
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub user_id: String,
    pub display_name: String,
    pub team: Team,

    // Kinematics
    pub position: Vec2,
    pub velocity: Vec2,
    pub aim_angle_deg: f32,

    // Vitals (mutator-only)
    health: i32,
    max_health: i32,
    fuel: f32,
    max_fuel: f32,
    alive: bool,

    pub grounded: bool,
    pub flying: bool,

    // Loadout
    pub primary_weapon: WeaponId,
    pub secondary_weapon: Option<WeaponId>,
    pub primary_ammo: u32,
    pub secondary_ammo: u32,

    // Stats
    pub kills: u32,
    pub deaths: u32,
    pub damage_dealt: i32,

    pub last_input_seq: u32,
    pub is_bot: bool,

    #[serde(skip)]
    respawn_at: Option<Instant>,
    #[serde(skip)]
    pub last_fire_at: Option<Instant>,
    #[serde(skip)]
    pub last_claim_at: Option<Instant>,
    #[serde(skip)]
    pub last_input_at: Option<Instant>,
}

/// Shared, independently lockable player record
pub type PlayerHandle = Arc<RwLock<Player>>;

impl Player {
    pub fn new(id: PlayerId, user_id: String, display_name: String, team: Team) -> Self {
        let primary = WeaponId::AssaultRifle;
        Self {
            id,
            user_id,
            display_name,
            team,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            aim_angle_deg: 0.0,
            health: MAX_HEALTH,
            max_health: MAX_HEALTH,
            fuel: MAX_FUEL,
            max_fuel: MAX_FUEL,
            alive: true,
            grounded: false,
            flying: false,
            primary_weapon: primary,
            secondary_weapon: None,
            primary_ammo: primary.spec().max_ammo,
            secondary_ammo: 0,
            kills: 0,
            deaths: 0,
            damage_dealt: 0,
            last_input_seq: 0,
            is_bot: false,
            respawn_at: None,
            last_fire_at: None,
            last_claim_at: None,
            last_input_at: None,
        }
    }

    pub fn into_handle(self) -> PlayerHandle {
        Arc::new(RwLock::new(self))
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn max_fuel(&self) -> f32 {
        self.max_fuel
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn respawn_at(&self) -> Option<Instant> {
        self.respawn_at
    }

    /// True once a dead player's respawn delay has elapsed
    pub fn respawn_due(&self, now: Instant) -> bool {
        !self.alive && self.respawn_at.map_or(true, |at| now >= at)
    }

    /// Apply damage; a lethal hit kills and schedules a respawn
    pub fn take_damage(&mut self, amount: i32, now: Instant) {
        if !self.alive {
            return;
        }
        self.health = (self.health - amount.max(0)).clamp(0, self.max_health);
        if self.health == 0 {
            self.alive = false;
            self.deaths += 1;
            self.flying = false;
            self.respawn_at = Some(now + RESPAWN_DELAY);
        }
    }

    /// Revive at the given coordinates with full vitals
    pub fn respawn(&mut self, x: f32, y: f32) {
        self.health = self.max_health;
        self.fuel = self.max_fuel;
        self.alive = true;
        self.respawn_at = None;
        self.position = Vec2::new(x, y);
        self.velocity = Vec2::ZERO;
        self.flying = false;
        self.grounded = false;
    }

    /// Drain fuel while flying, recharge while grounded
    pub fn update_fuel(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        if self.flying && self.alive {
            self.fuel -= FUEL_DRAIN_PER_SEC * dt;
            if self.fuel <= 0.0 {
                self.fuel = 0.0;
                self.flying = false;
            }
        } else if self.grounded && self.fuel < self.max_fuel {
            self.fuel = (self.fuel + FUEL_RECHARGE_PER_SEC * dt).min(self.max_fuel);
        }
    }

    /// Restore health, capped at max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if !self.alive {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + amount.max(0)).min(self.max_health);
        self.health - before
    }

    pub fn refuel(&mut self) {
        self.fuel = self.max_fuel;
    }

    pub fn equip_primary(&mut self, weapon: WeaponId) {
        self.primary_weapon = weapon;
        self.primary_ammo = weapon.spec().max_ammo;
    }
}

/// Simulated projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub owner_id: PlayerId,
    pub weapon: WeaponId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub spawned_at: Instant,
    pub max_life: Duration,
    pub active: bool,
}

impl Projectile {
    pub const MAX_LIFE: Duration = Duration::from_secs(5);

    /// Expired once strictly more than `max_life` has passed
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.spawned_at) > self.max_life
    }
}

/// What a pickup grants
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PickupKind {
    Weapon { weapon: WeaponId },
    Health { amount: i32 },
    Fuel,
}

/// Map pickup
#[derive(Debug, Clone, Serialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub position: Vec2,
    pub active: bool,
    #[serde(skip)]
    pub respawn_at: Option<Instant>,
}

impl Pickup {
    pub const RESPAWN_DELAY: Duration = Duration::from_secs(15);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Kill,
    Pickup,
    MatchEnd,
}

/// Append-only match log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEvent {
    pub tick: u64,
    pub kind: EventKind,
    pub actor_id: PlayerId,
    /// Victim player id for kills, pickup id for pickups
    pub target_id: u32,
    pub weapon: Option<WeaponId>,
}
