//! Weapon catalog - static combat characteristics per weapon

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Weapon identifiers as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum WeaponId {
    AssaultRifle = 1,
    SniperRifle = 2,
    Shotgun = 3,
    RocketLauncher = 4,
    Flamethrower = 5,
    Smg = 6,
    DualPistols = 7,
    LaserGun = 8,
    ProximityMine = 9,
    Grenade = 10,
}

impl WeaponId {
    /// Resolve a raw wire id; unknown ids yield `None`
    pub fn from_u8(raw: u8) -> Option<Self> {
        let id = match raw {
            1 => Self::AssaultRifle,
            2 => Self::SniperRifle,
            3 => Self::Shotgun,
            4 => Self::RocketLauncher,
            5 => Self::Flamethrower,
            6 => Self::Smg,
            7 => Self::DualPistols,
            8 => Self::LaserGun,
            9 => Self::ProximityMine,
            10 => Self::Grenade,
            _ => return None,
        };
        Some(id)
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Static spec for this weapon
    pub fn spec(self) -> &'static WeaponSpec {
        &WEAPONS[(self as usize) - 1]
    }
}

/// How a weapon's shot reaches its target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delivery {
    /// Resolved instantly along a line (claim-and-validate path)
    Hitscan,
    /// Simulated projectile travelling at `speed` units/sec
    Projectile { speed: f32 },
}

/// Combat characteristics of a weapon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSpec {
    pub id: WeaponId,
    pub name: &'static str,
    pub damage: f32,
    /// Shots per second (0 = placed/thrown, no sustained fire)
    pub fire_rate: f32,
    pub max_ammo: u32,
    pub reload_secs: f32,
    pub delivery: Delivery,
    /// Impact radius for explosives (0 = contact hit)
    pub blast_radius: f32,
}

impl WeaponSpec {
    pub fn is_hitscan(&self) -> bool {
        matches!(self.delivery, Delivery::Hitscan)
    }

    /// Minimum time between shots, `None` for non-firing weapons
    pub fn min_fire_interval(&self) -> Option<Duration> {
        if self.fire_rate > 0.0 {
            Some(Duration::from_secs_f32(1.0 / self.fire_rate))
        } else {
            None
        }
    }

    /// Per-shot damage as applied by the server
    pub fn applied_damage(&self) -> i32 {
        self.damage.round() as i32
    }
}

const fn weapon(
    id: WeaponId,
    name: &'static str,
    damage: f32,
    fire_rate: f32,
    max_ammo: u32,
    reload_secs: f32,
    delivery: Delivery,
    blast_radius: f32,
) -> WeaponSpec {
    WeaponSpec {
        id,
        name,
        damage,
        fire_rate,
        max_ammo,
        reload_secs,
        delivery,
        blast_radius,
    }
}

/// Weapon balance sheet, indexed by `id - 1`
pub static WEAPONS: [WeaponSpec; 10] = [
    weapon(WeaponId::AssaultRifle, "Assault Rifle", 12.0, 8.0, 30, 1.8, Delivery::Hitscan, 0.0),
    weapon(WeaponId::SniperRifle, "Sniper Rifle", 80.0, 0.5, 5, 2.5, Delivery::Hitscan, 0.0),
    // 8 pellets x 6 damage
    weapon(WeaponId::Shotgun, "Shotgun", 6.0, 1.5, 8, 1.5, Delivery::Hitscan, 0.0),
    weapon(
        WeaponId::RocketLauncher,
        "Rocket Launcher",
        120.0,
        0.4,
        4,
        3.0,
        Delivery::Projectile { speed: 18.0 },
        3.0,
    ),
    weapon(
        WeaponId::Flamethrower,
        "Flamethrower",
        8.0,
        10.0,
        100,
        2.0,
        Delivery::Projectile { speed: 8.0 },
        0.0,
    ),
    weapon(WeaponId::Smg, "SMG", 8.0, 12.0, 45, 1.5, Delivery::Hitscan, 0.0),
    weapon(WeaponId::DualPistols, "Dual Pistols", 12.0, 4.0, 24, 1.0, Delivery::Hitscan, 0.0),
    weapon(WeaponId::LaserGun, "Laser Gun", 25.0, 3.0, 20, 2.0, Delivery::Hitscan, 0.0),
    weapon(
        WeaponId::ProximityMine,
        "Proximity Mine",
        90.0,
        0.0,
        3,
        0.0,
        Delivery::Projectile { speed: 0.0 },
        2.5,
    ),
    weapon(
        WeaponId::Grenade,
        "Grenade",
        80.0,
        0.0,
        2,
        0.0,
        Delivery::Projectile { speed: 12.0 },
        3.5,
    ),
];

/// Look up a weapon by raw wire id
pub fn lookup(raw: u8) -> Option<&'static WeaponSpec> {
    WeaponId::from_u8(raw).map(WeaponId::spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_id() {
        for raw in 1..=10u8 {
            let spec = lookup(raw).expect("known weapon");
            assert_eq!(spec.id.as_u8(), raw);
        }
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        assert!(lookup(0).is_none());
        assert!(lookup(11).is_none());
        assert!(lookup(255).is_none());
    }

    #[test]
    fn rocket_is_an_explosive_projectile() {
        let rocket = WeaponId::RocketLauncher.spec();
        assert!(!rocket.is_hitscan());
        assert_eq!(rocket.delivery, Delivery::Projectile { speed: 18.0 });
        assert_eq!(rocket.blast_radius, 3.0);
        assert_eq!(rocket.applied_damage(), 120);
    }

    #[test]
    fn sniper_fires_every_two_seconds() {
        let sniper = WeaponId::SniperRifle.spec();
        assert!(sniper.is_hitscan());
        assert_eq!(sniper.min_fire_interval(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn placed_weapons_have_no_fire_interval() {
        assert_eq!(WeaponId::ProximityMine.spec().min_fire_interval(), None);
        assert_eq!(WeaponId::Grenade.spec().min_fire_interval(), None);
    }
}
