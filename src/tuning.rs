//! Data-driven game balance
//!
//! Every world constant the simulation reads lives in [`Tuning`]. A JSON file can
//! override any subset of it: each section is `#[serde(default)]`, so missing keys
//! keep the compiled defaults.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{SimError, SimResult};
use crate::sim::asteroid::AsteroidSize;
use crate::sim::collision::CollisionPair;
use crate::sim::enemy::EnemyType;
use crate::sim::physics::WorldBounds;
use crate::sim::pickup::PickupKind;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    Casual,
    #[default]
    Standard,
    Hard,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Casual => "Casual",
            Preset::Standard => "Standard",
            Preset::Hard => "Hard",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "casual" | "easy" => Some(Preset::Casual),
            "standard" | "normal" => Some(Preset::Standard),
            "hard" => Some(Preset::Hard),
            _ => None,
        }
    }

    /// Parse a preset name, logging and falling back to the default when unknown
    pub fn from_name_or_default(name: &str) -> Self {
        Preset::from_str(name).unwrap_or_else(|| {
            log::warn!("Unknown preset '{}', using {}", name, Preset::default().as_str());
            Preset::default()
        })
    }

    /// Multiplier applied to damage the ship receives
    pub fn damage_taken_scale(&self) -> f32 {
        match self {
            Preset::Casual => 0.5,
            Preset::Standard => 1.0,
            Preset::Hard => 1.5,
        }
    }

    /// Multiplier applied to enemy hit chance
    pub fn enemy_accuracy_scale(&self) -> f32 {
        match self {
            Preset::Casual => 0.7,
            Preset::Standard => 1.0,
            Preset::Hard => 1.15,
        }
    }
}

/// World dimensions and stepping limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub half_width: f32,
    pub half_height: f32,
    /// Largest dt a tick integrates
    pub max_dt: f32,
    /// Broad-phase grid cell edge length
    pub grid_cell_size: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            half_width: 640.0,
            half_height: 360.0,
            max_dt: crate::consts::MAX_DT,
            grid_cell_size: 100.0,
        }
    }
}

impl WorldTuning {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::new(self.half_width, self.half_height)
    }
}

/// Player ship handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    pub radius: f32,
    /// Rotation easing rate (radians/second)
    pub rotation_speed: f32,
    /// Forward acceleration while thrusting (units/second²)
    pub thrust: f32,
    /// Velocity multiplier applied once per tick
    pub friction: f32,
    pub max_speed: f32,
    pub max_health: f32,
    pub max_shield: f32,
    /// Seconds between shots
    pub fire_cooldown: f32,
    /// Invulnerability granted on spawn/restart
    pub spawn_invulnerability: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            radius: 15.0,
            rotation_speed: 5.0,
            thrust: 300.0,
            friction: 0.99,
            max_speed: 300.0,
            max_health: 100.0,
            max_shield: 50.0,
            fire_cooldown: 0.2,
            spawn_invulnerability: 2.0,
        }
    }
}

/// Fixed properties of one asteroid size
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsteroidSizeTuning {
    pub radius: f32,
    pub split_count: u8,
    pub split_size: Option<AsteroidSize>,
    /// Reference speed used for split pieces (units/second)
    pub base_speed: f32,
}

/// Asteroid sizes and splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidTuning {
    pub large: AsteroidSizeTuning,
    pub medium: AsteroidSizeTuning,
    pub small: AsteroidSizeTuning,
    /// Split piece speed factor applied on top of `base_speed`
    pub split_speed_factor: f32,
    /// Per-axis positional jitter of split pieces
    pub split_jitter: f32,
    /// Maximum spin rate (radians/second)
    pub max_spin: f32,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            large: AsteroidSizeTuning {
                radius: 40.0,
                split_count: 2,
                split_size: Some(AsteroidSize::Medium),
                base_speed: 20.0,
            },
            medium: AsteroidSizeTuning {
                radius: 25.0,
                split_count: 2,
                split_size: Some(AsteroidSize::Small),
                base_speed: 35.0,
            },
            small: AsteroidSizeTuning {
                radius: 12.0,
                split_count: 0,
                split_size: None,
                base_speed: 50.0,
            },
            split_speed_factor: 1.2,
            split_jitter: 1.0,
            max_spin: 1.5,
        }
    }
}

impl AsteroidTuning {
    pub fn size(&self, size: AsteroidSize) -> &AsteroidSizeTuning {
        match size {
            AsteroidSize::Large => &self.large,
            AsteroidSize::Medium => &self.medium,
            AsteroidSize::Small => &self.small,
        }
    }
}

/// Projectile defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub radius: f32,
    pub speed: f32,
    pub lifetime: f32,
    /// Health removed from an enemy by a bullet with damage multiplier 1.0
    pub base_damage: f32,
    pub enemy_speed: f32,
    pub enemy_lifetime: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            radius: 3.0,
            speed: 500.0,
            lifetime: 1.2,
            base_damage: 10.0,
            enemy_speed: 280.0,
            enemy_lifetime: 2.0,
        }
    }
}

/// Per-type enemy stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyStats {
    pub radius: f32,
    pub health: f32,
    pub max_speed: f32,
    pub acceleration: f32,
    /// Shoot cooldown range in seconds (min, max)
    pub shoot_cooldown: (f32, f32),
    /// Chance a shot is aimed at the lead point
    pub accuracy: f32,
    /// Maximum distance at which the enemy shoots
    pub range: f32,
    /// Distance at which hunting turns into attacking
    pub attack_range: f32,
    /// Distance inside which the enemy may flee after attacking
    pub flee_distance: f32,
    /// Preferred radius while circling
    pub orbit_radius: f32,
    /// Pursuit jitter strength while attacking
    pub jitter: f32,
}

/// Enemy types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub hunter: EnemyStats,
    pub sniper: EnemyStats,
    pub kamikaze: EnemyStats,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            hunter: EnemyStats {
                radius: 18.0,
                health: 30.0,
                max_speed: 110.0,
                acceleration: 220.0,
                shoot_cooldown: (1.5, 2.5),
                accuracy: 0.7,
                range: 350.0,
                attack_range: 260.0,
                flee_distance: 120.0,
                orbit_radius: 200.0,
                jitter: 0.4,
            },
            sniper: EnemyStats {
                radius: 16.0,
                health: 20.0,
                max_speed: 70.0,
                acceleration: 140.0,
                shoot_cooldown: (2.5, 4.0),
                accuracy: 0.9,
                range: 550.0,
                attack_range: 420.0,
                flee_distance: 250.0,
                orbit_radius: 380.0,
                jitter: 0.2,
            },
            kamikaze: EnemyStats {
                radius: 14.0,
                health: 15.0,
                max_speed: 170.0,
                acceleration: 360.0,
                shoot_cooldown: (4.0, 6.0),
                accuracy: 0.2,
                range: 200.0,
                attack_range: 180.0,
                flee_distance: 0.0,
                orbit_radius: 60.0,
                jitter: 0.6,
            },
        }
    }
}

impl EnemyTuning {
    pub fn stats(&self, enemy_type: EnemyType) -> &EnemyStats {
        match enemy_type {
            EnemyType::Hunter => &self.hunter,
            EnemyType::Sniper => &self.sniper,
            EnemyType::Kamikaze => &self.kamikaze,
        }
    }
}

/// Drop weight and payload for one pickup kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupKindTuning {
    pub kind: PickupKind,
    /// Relative weight when rolling a random pickup
    pub weight: u32,
    /// Currency amount, restore amount or buff seconds
    pub value: f32,
}

/// Pickup behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupTuning {
    pub radius: f32,
    pub lifetime: f32,
    pub magnet_range: f32,
    /// Base magnet acceleration (units/second²)
    pub magnet_strength: f32,
    /// Velocity multiplier applied once per tick
    pub drag: f32,
    pub max_speed: f32,
    /// Seconds before expiry at which the pickup starts flashing
    pub flash_time: f32,
    /// Initial drift speed range
    pub drift_speed: (f32, f32),
    /// Chance of a drop when an enemy dies
    pub enemy_drop_chance: f64,
    /// Chance an asteroid destruction drops one pickup rather than two
    pub single_drop_chance: f64,
    pub kinds: Vec<PickupKindTuning>,
}

impl Default for PickupTuning {
    fn default() -> Self {
        let kind = |kind, weight, value| PickupKindTuning {
            kind,
            weight,
            value,
        };
        Self {
            radius: 8.0,
            lifetime: 10.0,
            magnet_range: 150.0,
            magnet_strength: 400.0,
            drag: 0.98,
            max_speed: 350.0,
            flash_time: 3.0,
            drift_speed: (10.0, 40.0),
            enemy_drop_chance: 0.15,
            single_drop_chance: 0.7,
            kinds: vec![
                kind(PickupKind::Salvage, 40, 1.0),
                kind(PickupKind::Gold, 20, 5.0),
                kind(PickupKind::Platinum, 10, 10.0),
                kind(PickupKind::Adamantium, 5, 25.0),
                kind(PickupKind::Health, 8, 25.0),
                kind(PickupKind::Shield, 7, 25.0),
                kind(PickupKind::RapidFire, 4, 8.0),
                kind(PickupKind::Pierce, 3, 8.0),
                kind(PickupKind::Damage, 3, 8.0),
            ],
        }
    }
}

impl PickupTuning {
    /// Payload value for a kind (0 when the kind is missing from the table)
    pub fn value_of(&self, kind: PickupKind) -> f32 {
        self.kinds
            .iter()
            .find(|k| k.kind == kind)
            .map(|k| k.value)
            .unwrap_or(0.0)
    }
}

/// Collision responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Enabled pair keys, resolved in this order
    pub pairs: Vec<String>,
    pub asteroid_invulnerability: f32,
    pub bullet_invulnerability: f32,
    pub enemy_invulnerability: f32,
    /// Knockback impulse magnitude applied to the ship
    pub knockback: f32,
    pub ship_asteroid_damage: f32,
    pub ship_enemy_damage: f32,
    /// Damage an enemy takes when it rams the ship
    pub enemy_contact_damage: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            pairs: CollisionPair::ALL.iter().map(|p| p.key().to_string()).collect(),
            asteroid_invulnerability: 1.5,
            bullet_invulnerability: 0.5,
            enemy_invulnerability: 1.0,
            knockback: 200.0,
            ship_asteroid_damage: 10.0,
            ship_enemy_damage: 15.0,
            enemy_contact_damage: 25.0,
        }
    }
}

/// Base point values (before the combo multiplier)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointTable {
    pub asteroid_large: u32,
    pub asteroid_medium: u32,
    pub asteroid_small: u32,
    pub enemy: u32,
    pub pickup: u32,
    pub wave_complete: u32,
    pub perfect_wave: u32,
}

impl Default for PointTable {
    fn default() -> Self {
        Self {
            asteroid_large: 20,
            asteroid_medium: 50,
            asteroid_small: 100,
            enemy: 150,
            pickup: 10,
            wave_complete: 100,
            perfect_wave: 500,
        }
    }
}

impl PointTable {
    pub fn asteroid(&self, size: AsteroidSize) -> u32 {
        match size {
            AsteroidSize::Large => self.asteroid_large,
            AsteroidSize::Medium => self.asteroid_medium,
            AsteroidSize::Small => self.asteroid_small,
        }
    }
}

/// Scoring and combo
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTuning {
    pub points: PointTable,
    pub combo_window: f32,
}

impl Default for ScoringTuning {
    fn default() -> Self {
        Self {
            points: PointTable::default(),
            combo_window: crate::consts::COMBO_WINDOW,
        }
    }
}

/// Wave progression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    pub max_asteroids: u32,
    pub max_enemies: u32,
    /// Minimum spawn distance from the world center
    pub safe_radius: f32,
    pub spawn_attempts: u32,
    /// Asteroid spawn speed range before the wave multiplier
    pub asteroid_speed: (f32, f32),
    /// Delay before a wave's enemies appear
    pub enemy_spawn_delay: f32,
    /// Delay between a completed wave and the next one
    pub transition_delay: f32,
    pub hunter_from_wave: u32,
    pub sniper_from_wave: u32,
    pub kamikaze_from_wave: u32,
}

impl Default for WaveTuning {
    fn default() -> Self {
        Self {
            max_asteroids: 20,
            max_enemies: 5,
            safe_radius: 150.0,
            spawn_attempts: 10,
            asteroid_speed: (10.0, 30.0),
            enemy_spawn_delay: 3.0,
            transition_delay: 2.0,
            hunter_from_wave: 3,
            sniper_from_wave: 4,
            kamikaze_from_wave: 6,
        }
    }
}

/// Pool capacities (instances retained for reuse per kind)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolTuning {
    pub ships: usize,
    pub asteroids: usize,
    pub bullets: usize,
    pub enemies: usize,
    pub pickups: usize,
}

impl Default for PoolTuning {
    fn default() -> Self {
        Self {
            ships: 2,
            asteroids: 64,
            bullets: 128,
            enemies: 16,
            pickups: 64,
        }
    }
}

/// Complete tuning table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    #[serde(deserialize_with = "preset_or_default")]
    pub preset: Preset,
    pub world: WorldTuning,
    pub ship: ShipTuning,
    pub asteroids: AsteroidTuning,
    pub bullets: BulletTuning,
    pub enemies: EnemyTuning,
    pub pickups: PickupTuning,
    pub collision: CollisionTuning,
    pub scoring: ScoringTuning,
    pub waves: WaveTuning,
    pub pools: PoolTuning,
}

impl Tuning {
    /// Default tuning with a named preset applied.
    ///
    /// Unknown names are logged and fall back to the standard preset.
    pub fn from_preset_name(name: &str) -> Self {
        let preset = Preset::from_name_or_default(name);
        let mut tuning = Self::default();
        tuning.apply_preset(preset);
        tuning
    }

    /// Apply a preset (scales damage taken and enemy accuracy)
    pub fn apply_preset(&mut self, preset: Preset) {
        let previous = self.preset;
        self.preset = preset;

        let damage = preset.damage_taken_scale() / previous.damage_taken_scale();
        self.collision.ship_asteroid_damage *= damage;
        self.collision.ship_enemy_damage *= damage;

        let accuracy = preset.enemy_accuracy_scale() / previous.enemy_accuracy_scale();
        for stats in [
            &mut self.enemies.hunter,
            &mut self.enemies.sniper,
            &mut self.enemies.kamikaze,
        ] {
            stats.accuracy = (stats.accuracy * accuracy).clamp(0.0, 1.0);
        }
    }

    /// Parse tuning overrides from a JSON document and validate the result.
    ///
    /// Values in the document are standard-preset values; the document's
    /// `preset` is applied on top. Unknown keys are logged and ignored.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let raw: Value = serde_json::from_str(json)?;
        let known = serde_json::to_value(Tuning::default())?;
        for key in unknown_keys(&raw, &known) {
            log::warn!("Unknown tuning key '{}', ignoring", key);
        }

        let mut tuning: Tuning = serde_json::from_value(raw)?;
        let preset = tuning.preset;
        tuning.preset = Preset::Standard;
        tuning.apply_preset(preset);
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let tuning = Self::from_json_str(&contents)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Serialize the full table (useful as a template for overrides).
    ///
    /// Values are written at the standard scale so loading the output
    /// reapplies the preset exactly once.
    pub fn to_json_pretty(&self) -> SimResult<String> {
        let mut base = self.clone();
        base.apply_preset(Preset::Standard);
        base.preset = self.preset;
        Ok(serde_json::to_string_pretty(&base)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> SimResult<()> {
        positive("world.half_width", self.world.half_width)?;
        positive("world.half_height", self.world.half_height)?;
        positive("world.max_dt", self.world.max_dt)?;
        positive("world.grid_cell_size", self.world.grid_cell_size)?;
        positive("ship.radius", self.ship.radius)?;
        positive("ship.max_health", self.ship.max_health)?;
        positive("asteroids.large.radius", self.asteroids.large.radius)?;
        positive("asteroids.medium.radius", self.asteroids.medium.radius)?;
        positive("asteroids.small.radius", self.asteroids.small.radius)?;
        positive("bullets.radius", self.bullets.radius)?;
        positive("bullets.speed", self.bullets.speed)?;
        positive("bullets.enemy_speed", self.bullets.enemy_speed)?;
        positive("enemies.hunter.radius", self.enemies.hunter.radius)?;
        positive("enemies.sniper.radius", self.enemies.sniper.radius)?;
        positive("enemies.kamikaze.radius", self.enemies.kamikaze.radius)?;
        positive("pickups.radius", self.pickups.radius)?;
        positive("scoring.combo_window", self.scoring.combo_window)?;

        if !(0.0..=1.0).contains(&self.ship.friction) {
            return Err(SimError::InvalidTuning {
                name: "ship.friction",
                value: self.ship.friction,
                valid: "[0.0, 1.0]",
            });
        }
        if !(0.0..=1.0).contains(&self.pickups.drag) {
            return Err(SimError::InvalidTuning {
                name: "pickups.drag",
                value: self.pickups.drag,
                valid: "[0.0, 1.0]",
            });
        }
        Ok(())
    }
}

fn preset_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Preset, D::Error> {
    let name = String::deserialize(deserializer)?;
    Ok(Preset::from_name_or_default(&name))
}

/// Dotted paths of object keys in `input` that `known` does not have
fn unknown_keys(input: &Value, known: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    collect_unknown(input, known, "", &mut keys);
    keys
}

fn collect_unknown(input: &Value, known: &Value, prefix: &str, keys: &mut Vec<String>) {
    let (Value::Object(input), Value::Object(known)) = (input, known) else {
        return;
    };
    for (key, value) in input {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match known.get(key) {
            Some(expected) => collect_unknown(value, expected, &path, keys),
            None => keys.push(path),
        }
    }
}

fn positive(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimError::InvalidTuning {
            name,
            value,
            valid: "(0.0, ∞)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json_str(
            r#"{ "world": { "half_width": 800.0 }, "scoring": { "points": { "enemy": 300 } } }"#,
        )
        .unwrap();
        assert_eq!(tuning.world.half_width, 800.0);
        assert_eq!(tuning.world.half_height, 360.0);
        assert_eq!(tuning.scoring.points.enemy, 300);
        assert_eq!(tuning.scoring.points.asteroid_small, 100);
        assert_eq!(tuning.asteroids.large.split_size, Some(AsteroidSize::Medium));
    }

    #[test]
    fn test_invalid_value_rejected() {
        let err = Tuning::from_json_str(r#"{ "world": { "grid_cell_size": 0.0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidTuning {
                name: "world.grid_cell_size",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            Tuning::from_json_str("{ not json"),
            Err(SimError::Json(_))
        ));
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let tuning = Tuning::from_preset_name("nightmare");
        assert_eq!(tuning.preset, Preset::Standard);
        assert_eq!(tuning.collision.ship_asteroid_damage, 10.0);
    }

    #[test]
    fn test_preset_scales_damage() {
        let tuning = Tuning::from_preset_name("casual");
        assert_eq!(tuning.preset, Preset::Casual);
        assert!((tuning.collision.ship_asteroid_damage - 5.0).abs() < 1e-5);

        // Switching back restores the original scale
        let mut tuning = tuning;
        tuning.apply_preset(Preset::Standard);
        assert!((tuning.collision.ship_asteroid_damage - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_json_preset_is_applied() {
        let tuning = Tuning::from_json_str(r#"{ "preset": "Hard" }"#).unwrap();
        assert_eq!(tuning.preset, Preset::Hard);
        assert!((tuning.collision.ship_asteroid_damage - 15.0).abs() < 1e-4);

        // Back to standard divides by the right scale
        let mut tuning = tuning;
        tuning.apply_preset(Preset::Standard);
        assert!((tuning.collision.ship_asteroid_damage - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_json_preset_scales_overridden_damage() {
        let tuning =
            Tuning::from_json_str(r#"{ "preset": "casual", "collision": { "ship_enemy_damage": 30.0 } }"#).unwrap();
        assert_eq!(tuning.preset, Preset::Casual);
        assert!((tuning.collision.ship_enemy_damage - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_json_unknown_preset_falls_back() {
        let tuning = Tuning::from_json_str(r#"{ "preset": "nightmare" }"#).unwrap();
        assert_eq!(tuning.preset, Preset::Standard);
        assert_eq!(tuning.collision.ship_asteroid_damage, 10.0);
    }

    #[test]
    fn test_unknown_keys_are_reported_and_skipped() {
        let json = r#"{ "wrold": { "half_width": 1.0 }, "ship": { "max_sped": 1.0, "thrust": 400.0 } }"#;
        let raw: Value = serde_json::from_str(json).unwrap();
        let known = serde_json::to_value(Tuning::default()).unwrap();
        let mut keys = unknown_keys(&raw, &known);
        keys.sort();
        assert_eq!(keys, vec!["ship.max_sped".to_string(), "wrold".to_string()]);

        let tuning = Tuning::from_json_str(json).unwrap();
        assert_eq!(tuning.ship.thrust, 400.0);
        assert_eq!(tuning.world.half_width, WorldTuning::default().half_width);
    }

    #[test]
    fn test_preset_survives_json_round_trip() {
        let json = Tuning::from_preset_name("hard").to_json_pretty().unwrap();
        let parsed = Tuning::from_json_str(&json).unwrap();
        assert_eq!(parsed.preset, Preset::Hard);
        assert!((parsed.collision.ship_asteroid_damage - 15.0).abs() < 1e-4);
    }

    #[test]
    fn test_json_template_round_trips() {
        let json = Tuning::default().to_json_pretty().unwrap();
        let parsed = Tuning::from_json_str(&json).unwrap();
        assert_eq!(parsed.pickups.kinds.len(), 9);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Tuning::load("/definitely/not/here/tuning.json").unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }
}
