//! Anti-cheat acceptance checks on client-claimed actions
//!
//! Every predicate is a pure function of the claim, server-known state and the
//! static weapon catalog. `true` means the claim is plausible.

use std::time::Instant;

use super::entities::{Vec2, MAX_SPEED_X, MAX_SPEED_Y};
use super::weapons;

/// Slack applied to the movement envelope
pub const MOVE_TOLERANCE: f32 = 1.1;
/// Allowed client clock drift on fire intervals
pub const FIRE_RATE_TOLERANCE: f64 = 1.1;
/// Allowed divergence between claimed and tracked fuel
pub const FUEL_TOLERANCE: f32 = 5.0;
pub const MAX_ANGLE_DEG: f32 = 360.0;
/// Allowed float slack on claimed damage
pub const DAMAGE_TOLERANCE: f64 = 1.1;

/// Reject position deltas beyond what max speed allows in `dt` seconds
pub fn validate_move(old_pos: Vec2, new_pos: Vec2, dt: f32) -> bool {
    let max_displacement = (MAX_SPEED_X + MAX_SPEED_Y) * dt.max(0.0) * MOVE_TOLERANCE;
    old_pos.distance(new_pos) <= max_displacement
}

/// Reject shots fired faster than the weapon's rate allows.
/// Unknown and non-firing weapons, and a first-ever shot, always pass.
pub fn validate_fire_rate(weapon: u8, last_fire: Option<Instant>, now: Instant) -> bool {
    let Some(min_interval) = weapons::lookup(weapon).and_then(|spec| spec.min_fire_interval()) else {
        return true;
    };
    let Some(last_fire) = last_fire else {
        return true;
    };
    let elapsed = now.saturating_duration_since(last_fire).as_secs_f64();
    elapsed >= min_interval.as_secs_f64() / FIRE_RATE_TOLERANCE
}

pub fn validate_fuel(claimed: f32, server: f32) -> bool {
    (claimed - server).abs() <= FUEL_TOLERANCE
}

pub fn validate_aim_angle(deg: f32) -> bool {
    (-MAX_ANGLE_DEG..=MAX_ANGLE_DEG).contains(&deg)
}

/// Accept damage in `(0, damage * 1.1]` for a known weapon
pub fn validate_damage(weapon: u8, claimed: i32) -> bool {
    let Some(spec) = weapons::lookup(weapon) else {
        return false;
    };
    let max_damage = spec.damage as f64 * DAMAGE_TOLERANCE;
    claimed > 0 && claimed as f64 <= max_damage
}

/// Which acceptance check a claim failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("claimed position is out of movement range")]
    Movement,

    #[error("shot exceeds weapon fire rate")]
    FireRate,

    #[error("claimed fuel drifts from server state")]
    Fuel,

    #[error("aim angle out of range")]
    AimAngle,

    #[error("claimed damage exceeds weapon spec")]
    Damage,
}

/// Server-side facts a claim is checked against
#[derive(Debug, Clone, Copy)]
pub struct KnownState {
    pub position: Vec2,
    pub fuel: f32,
    pub last_claim_at: Option<Instant>,
    /// Seconds the claimed position may have moved since it was last known
    pub elapsed_secs: f32,
}

/// A client's claim that a hitscan shot hit a target
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
pub struct HitClaim {
    pub target_id: u32,
    pub weapon: u8,
    pub damage: i32,
    pub shooter_position: Vec2,
    pub fuel: f32,
    pub aim_angle_deg: f32,
}

/// Run every acceptance check, reporting the first failure
pub fn validate_hit_claim(claim: &HitClaim, known: &KnownState, now: Instant) -> Result<(), Rejection> {
    if !validate_aim_angle(claim.aim_angle_deg) {
        return Err(Rejection::AimAngle);
    }
    if !validate_move(known.position, claim.shooter_position, known.elapsed_secs) {
        return Err(Rejection::Movement);
    }
    if !validate_fuel(claim.fuel, known.fuel) {
        return Err(Rejection::Fuel);
    }
    if !validate_fire_rate(claim.weapon, known.last_claim_at, now) {
        return Err(Rejection::FireRate);
    }
    if !validate_damage(claim.weapon, claim.damage) {
        return Err(Rejection::Damage);
    }
    Ok(())
}
