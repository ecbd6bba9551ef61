//! Player and projectile integration

use super::entities::{Player, Projectile, Vec2, MAX_SPEED_X, MAX_SPEED_Y};
use super::validator::MAX_ANGLE_DEG;

/// Downward acceleration (units/sec^2)
pub const GRAVITY: f32 = -20.0;
/// Floor plane height
pub const FLOOR_Y: f32 = 0.0;

/// Physics system for integrating entity motion
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one alive player over `dt`: gravity, motion, floor contact
    pub fn integrate_player(player: &mut Player, dt: f32) {
        if !player.is_alive() {
            return;
        }

        if !player.grounded && !player.flying {
            player.velocity.y = (player.velocity.y + GRAVITY * dt).max(-MAX_SPEED_Y);
        }

        player.position.x += player.velocity.x * dt;
        player.position.y += player.velocity.y * dt;

        if player.position.y <= FLOOR_Y {
            player.position.y = FLOOR_Y;
            player.velocity.y = 0.0;
            player.grounded = true;
        } else {
            player.grounded = false;
        }
    }

    /// Advance a projectile along its velocity
    pub fn integrate_projectile(projectile: &mut Projectile, dt: f32) {
        projectile.position.x += projectile.velocity.x * dt;
        projectile.position.y += projectile.velocity.y * dt;
    }

    /// Velocity from an aim angle in degrees and a speed
    pub fn velocity_from_aim(aim_angle_deg: f32, speed: f32) -> Vec2 {
        let radians = aim_angle_deg.clamp(-MAX_ANGLE_DEG, MAX_ANGLE_DEG).to_radians();
        Vec2::new(radians.cos() * speed, radians.sin() * speed)
    }

    /// Velocity commanded by stick input, capped at the player speed limits
    pub fn commanded_velocity(horizontal: f32, vertical: f32) -> Vec2 {
        Vec2::new(
            horizontal.clamp(-1.0, 1.0) * MAX_SPEED_X,
            vertical.clamp(-1.0, 1.0) * MAX_SPEED_Y,
        )
    }
}
