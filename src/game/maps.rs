//! Static map data: spawn points and pickup placements

use super::entities::{Pickup, PickupKind, Vec2};
use super::weapons::WeaponId;

/// Spawn table and pickup table for one map
#[derive(Debug, Clone)]
pub struct MapLayout {
    pub id: String,
    pub spawns: Vec<Vec2>,
    pub pickups: Vec<(PickupKind, Vec2)>,
}

const OUTPOST_SPAWNS: [Vec2; 10] = [
    Vec2::new(3.0, 12.0),
    Vec2::new(21.0, 12.0),
    Vec2::new(12.0, 7.0),
    Vec2::new(6.0, 4.0),
    Vec2::new(18.0, 4.0),
    Vec2::new(9.0, 15.0),
    Vec2::new(15.0, 15.0),
    Vec2::new(3.0, 17.0),
    Vec2::new(21.0, 17.0),
    Vec2::new(12.0, 2.0),
];

impl MapLayout {
    pub fn outpost() -> Self {
        let weapon = |weapon| PickupKind::Weapon { weapon };
        let health = PickupKind::Health { amount: 50 };
        Self {
            id: "outpost".to_string(),
            spawns: OUTPOST_SPAWNS.to_vec(),
            pickups: vec![
                (weapon(WeaponId::Shotgun), Vec2::new(5.0, 14.0)),
                (weapon(WeaponId::SniperRifle), Vec2::new(19.0, 14.0)),
                (weapon(WeaponId::RocketLauncher), Vec2::new(12.0, 9.0)),
                (health, Vec2::new(8.0, 16.0)),
                (health, Vec2::new(16.0, 16.0)),
                (health, Vec2::new(12.0, 4.0)),
                (weapon(WeaponId::Flamethrower), Vec2::new(3.0, 6.0)),
                (weapon(WeaponId::LaserGun), Vec2::new(21.0, 6.0)),
            ],
        }
    }

    /// Resolve a map id; unknown maps fall back to the outpost spawn table with no pickups
    pub fn load(map_id: &str) -> Self {
        match map_id {
            "outpost" => Self::outpost(),
            other => Self {
                id: other.to_string(),
                spawns: OUTPOST_SPAWNS.to_vec(),
                pickups: Vec::new(),
            },
        }
    }

    /// Spawn point by index, wrapping around the table
    pub fn spawn_point(&self, index: usize) -> Vec2 {
        if self.spawns.is_empty() {
            return Vec2::ZERO;
        }
        self.spawns[index % self.spawns.len()]
    }

    /// Fresh, active pickup instances with ids starting at 1
    pub fn instantiate_pickups(&self) -> Vec<Pickup> {
        self.pickups
            .iter()
            .enumerate()
            .map(|(i, (kind, position))| Pickup {
                id: i as u32 + 1,
                kind: *kind,
                position: *position,
                active: true,
                respawn_at: None,
            })
            .collect()
    }
}
