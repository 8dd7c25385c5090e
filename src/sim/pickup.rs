//! Collectible drops: currency, restores and timed buffs

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind};
use super::physics::{self, WorldBounds};
use super::pool::Handle;
use super::ship::Ship;
use crate::tuning::{PickupKindTuning, PickupTuning, Tuning};

/// Flash period of an expiring pickup (seconds)
const FLASH_PERIOD: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickupKind {
    Salvage,
    Gold,
    Platinum,
    Adamantium,
    Health,
    Shield,
    RapidFire,
    Pierce,
    Damage,
}

impl PickupKind {
    pub const ALL: [PickupKind; 9] = [
        PickupKind::Salvage,
        PickupKind::Gold,
        PickupKind::Platinum,
        PickupKind::Adamantium,
        PickupKind::Health,
        PickupKind::Shield,
        PickupKind::RapidFire,
        PickupKind::Pierce,
        PickupKind::Damage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupKind::Salvage => "salvage",
            PickupKind::Gold => "gold",
            PickupKind::Platinum => "platinum",
            PickupKind::Adamantium => "adamantium",
            PickupKind::Health => "health",
            PickupKind::Shield => "shield",
            PickupKind::RapidFire => "rapid_fire",
            PickupKind::Pierce => "pierce",
            PickupKind::Damage => "damage",
        }
    }

    pub fn is_currency(&self) -> bool {
        matches!(
            self,
            PickupKind::Salvage | PickupKind::Gold | PickupKind::Platinum | PickupKind::Adamantium
        )
    }

    /// Weighted random kind from the drop table (Salvage if the table is empty)
    pub fn roll(rng: &mut impl Rng, table: &[PickupKindTuning]) -> PickupKind {
        let total: u32 = table.iter().map(|k| k.weight).sum();
        if total == 0 {
            return PickupKind::Salvage;
        }
        let mut roll = rng.random_range(0..total);
        for entry in table {
            if roll < entry.weight {
                return entry.kind;
            }
            roll -= entry.weight;
        }
        PickupKind::Salvage
    }
}

/// What collecting a pickup did to the ship
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickupEffect {
    Currency(u64),
    Heal(f32),
    Shield(f32),
    Buff { kind: PickupKind, seconds: f32 },
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub body: Body,
    pub kind: PickupKind,
    /// Currency amount, restore amount or buff seconds
    pub value: f32,
    pub magnet_range: f32,
    pub remaining_lifetime: f32,
    /// Weak reference to the ship that attracts this pickup
    pub magnet_target: Option<Handle<Ship>>,
    /// Seconds before expiry at which flashing starts
    flash_time: f32,
}

impl Default for Pickup {
    fn default() -> Self {
        Self {
            body: Body::new(1.0),
            kind: PickupKind::Salvage,
            value: 0.0,
            magnet_range: 0.0,
            remaining_lifetime: 0.0,
            magnet_target: None,
            flash_time: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PickupSpawn {
    pub kind: PickupKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub magnet_target: Option<Handle<Ship>>,
}

impl PickupSpawn {
    /// Random kind with a small random drift, as dropped by a destroyed entity
    pub fn drop_at(
        position: Vec2,
        magnet_target: Option<Handle<Ship>>,
        rng: &mut impl Rng,
        tuning: &PickupTuning,
    ) -> Self {
        let (lo, hi) = tuning.drift_speed;
        let speed = if hi > lo { rng.random_range(lo..hi) } else { lo };
        let angle = rng.random_range(0.0..std::f32::consts::TAU);
        Self {
            kind: PickupKind::roll(rng, &tuning.kinds),
            position,
            velocity: Vec2::from_angle(angle) * speed,
            magnet_target,
        }
    }
}

impl Pickup {
    pub(crate) fn init(&mut self, args: PickupSpawn, tuning: &Tuning) {
        let pickups = &tuning.pickups;
        self.body.radius = pickups.radius;
        self.body.position = args.position;
        self.body.velocity = args.velocity;
        self.kind = args.kind;
        self.value = pickups.value_of(args.kind);
        self.magnet_range = pickups.magnet_range;
        self.remaining_lifetime = pickups.lifetime;
        self.magnet_target = args.magnet_target;
        self.flash_time = pickups.flash_time;
    }

    /// Advance one tick. `magnet` is the bound ship's position, when it resolves.
    pub fn update(&mut self, dt: f32, magnet: Option<Vec2>, tuning: &PickupTuning, bounds: WorldBounds) {
        self.remaining_lifetime -= dt;
        if self.remaining_lifetime <= 0.0 {
            self.body.deactivate();
            return;
        }

        if let Some(ship_pos) = magnet {
            let dist = self.body.position.distance(ship_pos);
            if dist < self.magnet_range && self.magnet_range > 0.0 {
                // Up to three times stronger right next to the ship
                let strength = tuning.magnet_strength * (1.0 + 2.0 * (1.0 - dist / self.magnet_range));
                let pull = physics::direction(self.body.position, ship_pos) * strength;
                physics::apply_force(&mut self.body, pull, dt);
            }
        }
        self.body.velocity *= tuning.drag;
        physics::clamp_velocity(&mut self.body, 0.0, tuning.max_speed);
        self.body.advance(dt, bounds);
    }

    /// Render opacity: solid until the last seconds, then blinking
    pub fn opacity(&self) -> f32 {
        if self.remaining_lifetime > self.flash_time {
            return 1.0;
        }
        let phase = (self.remaining_lifetime / FLASH_PERIOD).floor() as i64;
        if phase % 2 == 0 { 1.0 } else { 0.3 }
    }

    /// Give this pickup's payload to `ship`
    pub fn apply_to_ship(&self, ship: &mut Ship) -> PickupEffect {
        match self.kind {
            PickupKind::Salvage | PickupKind::Gold | PickupKind::Platinum | PickupKind::Adamantium => {
                let amount = self.value.max(0.0).round() as u64;
                ship.credits += amount;
                PickupEffect::Currency(amount)
            }
            PickupKind::Health => {
                ship.heal(self.value);
                PickupEffect::Heal(self.value)
            }
            PickupKind::Shield => {
                ship.add_shield(self.value);
                PickupEffect::Shield(self.value)
            }
            kind @ (PickupKind::RapidFire | PickupKind::Pierce | PickupKind::Damage) => {
                ship.activate_buff(kind, self.value);
                PickupEffect::Buff {
                    kind,
                    seconds: self.value,
                }
            }
        }
    }
}

impl Entity for Pickup {
    const KIND: EntityKind = EntityKind::Pickup;

    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn reset(&mut self) {
        let radius = self.body.radius;
        *self = Self::default();
        self.body.radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::ShipTuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn pickup(kind: PickupKind, position: Vec2, tuning: &Tuning) -> Pickup {
        let mut p = Pickup::default();
        p.init(
            PickupSpawn {
                kind,
                position,
                velocity: Vec2::ZERO,
                magnet_target: None,
            },
            tuning,
        );
        p
    }

    #[test]
    fn test_roll_follows_weights() {
        let mut rng = Pcg32::seed_from_u64(9);
        let table = vec![
            PickupKindTuning {
                kind: PickupKind::Gold,
                weight: 0,
                value: 5.0,
            },
            PickupKindTuning {
                kind: PickupKind::Shield,
                weight: 3,
                value: 25.0,
            },
        ];
        for _ in 0..50 {
            assert_eq!(PickupKind::roll(&mut rng, &table), PickupKind::Shield);
        }
        assert_eq!(PickupKind::roll(&mut rng, &[]), PickupKind::Salvage);
    }

    #[test]
    fn test_default_table_rolls_every_kind() {
        let tuning = PickupTuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..5000 {
            seen.insert(PickupKind::roll(&mut rng, &tuning.kinds));
        }
        assert_eq!(seen.len(), PickupKind::ALL.len());
    }

    #[test]
    fn test_magnet_pulls_harder_when_closer() {
        let tuning = Tuning::default();
        let bounds = tuning.world.bounds();
        let mut near = pickup(PickupKind::Gold, Vec2::new(20.0, 0.0), &tuning);
        let mut far = pickup(PickupKind::Gold, Vec2::new(140.0, 0.0), &tuning);
        near.update(0.016, Some(Vec2::ZERO), &tuning.pickups, bounds);
        far.update(0.016, Some(Vec2::ZERO), &tuning.pickups, bounds);
        assert!(near.body.velocity.x < far.body.velocity.x);
        assert!(far.body.velocity.x < 0.0);

        // Outside the range only drag applies
        let mut out = pickup(PickupKind::Gold, Vec2::new(400.0, 0.0), &tuning);
        out.update(0.016, Some(Vec2::ZERO), &tuning.pickups, bounds);
        assert_eq!(out.body.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_expires_and_flashes() {
        let tuning = Tuning::default();
        let mut p = pickup(PickupKind::Salvage, Vec2::ZERO, &tuning);
        assert_eq!(p.opacity(), 1.0);

        p.remaining_lifetime = 0.25;
        assert_eq!(p.opacity(), 0.3);

        p.update(0.3, None, &tuning.pickups, tuning.world.bounds());
        assert!(!p.body.active);
    }

    #[test]
    fn test_apply_to_ship() {
        let tuning = Tuning::default();
        let mut ship = Ship::new(&ShipTuning::default());
        ship.health = 50.0;

        let gold = pickup(PickupKind::Gold, Vec2::ZERO, &tuning);
        assert_eq!(gold.apply_to_ship(&mut ship), PickupEffect::Currency(5));
        assert_eq!(ship.credits, 5);

        let health = pickup(PickupKind::Health, Vec2::ZERO, &tuning);
        health.apply_to_ship(&mut ship);
        assert_eq!(ship.health, 75.0);

        let rapid = pickup(PickupKind::RapidFire, Vec2::ZERO, &tuning);
        assert_eq!(
            rapid.apply_to_ship(&mut ship),
            PickupEffect::Buff {
                kind: PickupKind::RapidFire,
                seconds: 8.0
            }
        );
        assert_eq!(ship.buffs.rapid_fire, 8.0);
    }
}
