//! Game balance configuration
//!
//! Loaded once at startup (JSON) and read-only afterwards. Every section is
//! `#[serde(default)]` so a config file only needs the values it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// World speed and spawn interval curves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Speed hazards fall at when the run starts (units/s)
    pub base_world_speed: f32,
    /// World speed gained per elapsed second
    pub difficulty_ramp: f32,
    /// Hard cap on world speed
    pub max_world_speed: f32,
    /// Seconds between spawns at run start
    pub base_spawn_interval: f32,
    /// Interval reduction per elapsed second
    pub spawn_interval_ramp: f32,
    /// Floor for the spawn interval
    pub min_spawn_interval: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_world_speed: 5.0,
            difficulty_ramp: 0.15,
            max_world_speed: 8.0,
            base_spawn_interval: 1.2,
            spawn_interval_ramp: 0.01,
            min_spawn_interval: 0.45,
        }
    }
}

/// Light/dark energy pools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max_energy: f32,
    /// Passive drain on both pools while flying (per second)
    pub idle_drain_per_second: f32,
    /// Cost of one lane change (right = light, left = dark)
    pub move_drain: f32,
    /// Cost of one committed attack
    pub attack_drain: f32,
    /// Gain from a single-element orb
    pub orb_amount: f32,
    /// Gain on both pools from a dual orb
    pub dual_orb_amount: f32,
    /// Lateral speed factor when exactly one pool is empty
    pub depleted_move_factor: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            idle_drain_per_second: 0.10,
            move_drain: 3.0,
            attack_drain: 8.0,
            orb_amount: 15.0,
            dual_orb_amount: 10.0,
            depleted_move_factor: 0.89,
        }
    }
}

/// Score accrual and pickup multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub score_per_second: f32,
    /// Multiplier granted by a light or dark orb
    pub orb_multiplier: f32,
    pub orb_multiplier_seconds: f32,
    /// Multiplier granted by a dual orb
    pub dual_multiplier: f32,
    pub dual_multiplier_seconds: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            score_per_second: 10.0,
            orb_multiplier: 2.0,
            orb_multiplier_seconds: 7.0,
            dual_multiplier: 4.0,
            dual_multiplier_seconds: 4.0,
        }
    }
}

/// Spawn chances and orb balance weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Elemental wall chance at difficulty 0
    pub wall_chance_start: f32,
    /// Elemental wall chance at difficulty 1
    pub wall_chance_end: f32,
    /// Constant orb chance; the remainder is neutral obstacles
    pub orb_chance: f32,
    pub orb_base_weight: f32,
    /// Bias toward the emptier pool
    pub orb_bias_weight: f32,
    /// Dual orb weight (keep small so duals stay rare)
    pub dual_orb_weight: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            wall_chance_start: 0.10,
            wall_chance_end: 0.28,
            orb_chance: 0.10,
            orb_base_weight: 1.0,
            orb_bias_weight: 1.2,
            dual_orb_weight: 0.25,
        }
    }
}

/// Attack range relative to the player
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub attack_range_below_player: f32,
    pub attack_range_above_player: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_range_below_player: 1.0,
            attack_range_above_player: 8.0,
        }
    }
}

/// Continue/revive rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviveConfig {
    pub max_continues_per_run: u32,
    /// Grace period after a revive, in real seconds
    pub revive_invulnerability_seconds: f32,
    /// Base vertical radius cleared around the player on revive
    pub revive_clear_range_y: f32,
}

impl Default for ReviveConfig {
    fn default() -> Self {
        Self {
            max_continues_per_run: 1,
            revive_invulnerability_seconds: 1.5,
            revive_clear_range_y: 8.0,
        }
    }
}

/// Lane layout and lateral movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub lane_count: u8,
    pub center_x: f32,
    pub lane_spacing: f32,
    /// Lateral speed between lanes (units/s) before the energy penalty
    pub lane_change_speed: f32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            lane_count: 3,
            center_x: 0.0,
            lane_spacing: 2.2,
            lane_change_speed: 16.0,
        }
    }
}

impl LaneConfig {
    /// World X of a lane (0 = leftmost)
    pub fn lane_x(&self, lane: u8) -> f32 {
        let mid = (self.lane_count as f32 - 1.0) / 2.0;
        self.center_x + (lane as f32 - mid) * self.lane_spacing
    }

    /// Index of the middle lane (start lane)
    pub fn center_lane(&self) -> u8 {
        self.lane_count.saturating_sub(1) / 2
    }
}

/// Vertical layout of the hazard field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed Y of the player
    pub player_y: f32,
    /// Y where hazards are spawned (forward offset)
    pub spawn_y: f32,
    /// Hazards below this Y are removed
    pub despawn_y: f32,
    /// Vertical half extent used for player contact
    pub contact_half_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player_y: -3.5,
            spawn_y: 7.0,
            despawn_y: -12.0,
            contact_half_height: 0.45,
        }
    }
}

/// Complete tuning surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub difficulty: DifficultyConfig,
    pub energy: EnergyConfig,
    pub scoring: ScoringConfig,
    pub spawn: SpawnConfig,
    pub combat: CombatConfig,
    pub revive: ReviveConfig,
    pub lanes: LaneConfig,
    pub world: WorldConfig,
}

impl GameConfig {
    /// Parse from JSON and validate
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    /// Check every tunable. Called once when a run is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.difficulty;
        finite_non_negative("difficulty.base_world_speed", d.base_world_speed)?;
        finite_non_negative("difficulty.difficulty_ramp", d.difficulty_ramp)?;
        finite_non_negative("difficulty.spawn_interval_ramp", d.spawn_interval_ramp)?;
        finite_positive("difficulty.min_spawn_interval", d.min_spawn_interval)?;
        finite_positive("difficulty.base_spawn_interval", d.base_spawn_interval)?;
        if !d.max_world_speed.is_finite() || d.max_world_speed < d.base_world_speed {
            return Err(invalid(
                "difficulty.max_world_speed",
                format!("must be >= base_world_speed ({})", d.base_world_speed),
            ));
        }
        if d.base_spawn_interval < d.min_spawn_interval {
            return Err(invalid(
                "difficulty.base_spawn_interval",
                format!("must be >= min_spawn_interval ({})", d.min_spawn_interval),
            ));
        }

        let e = &self.energy;
        finite_positive("energy.max_energy", e.max_energy)?;
        finite_non_negative("energy.idle_drain_per_second", e.idle_drain_per_second)?;
        finite_non_negative("energy.move_drain", e.move_drain)?;
        finite_non_negative("energy.attack_drain", e.attack_drain)?;
        finite_non_negative("energy.orb_amount", e.orb_amount)?;
        finite_non_negative("energy.dual_orb_amount", e.dual_orb_amount)?;
        unit_interval("energy.depleted_move_factor", e.depleted_move_factor)?;
        if e.depleted_move_factor == 0.0 {
            return Err(invalid("energy.depleted_move_factor", "must be > 0".into()));
        }

        let s = &self.scoring;
        finite_non_negative("scoring.score_per_second", s.score_per_second)?;
        at_least_one("scoring.orb_multiplier", s.orb_multiplier)?;
        at_least_one("scoring.dual_multiplier", s.dual_multiplier)?;
        finite_non_negative("scoring.orb_multiplier_seconds", s.orb_multiplier_seconds)?;
        finite_non_negative("scoring.dual_multiplier_seconds", s.dual_multiplier_seconds)?;

        let sp = &self.spawn;
        unit_interval("spawn.wall_chance_start", sp.wall_chance_start)?;
        unit_interval("spawn.wall_chance_end", sp.wall_chance_end)?;
        unit_interval("spawn.orb_chance", sp.orb_chance)?;
        finite_non_negative("spawn.orb_base_weight", sp.orb_base_weight)?;
        finite_non_negative("spawn.orb_bias_weight", sp.orb_bias_weight)?;
        finite_non_negative("spawn.dual_orb_weight", sp.dual_orb_weight)?;
        if sp.orb_base_weight * 2.0 + sp.dual_orb_weight <= 0.0 {
            return Err(invalid(
                "spawn.orb_base_weight",
                "orb weights must not all be zero".into(),
            ));
        }

        finite_non_negative("combat.attack_range_below_player", self.combat.attack_range_below_player)?;
        finite_non_negative("combat.attack_range_above_player", self.combat.attack_range_above_player)?;

        finite_non_negative(
            "revive.revive_invulnerability_seconds",
            self.revive.revive_invulnerability_seconds,
        )?;
        finite_non_negative("revive.revive_clear_range_y", self.revive.revive_clear_range_y)?;

        let l = &self.lanes;
        if l.lane_count == 0 {
            return Err(invalid("lanes.lane_count", "must be at least 1".into()));
        }
        finite_positive("lanes.lane_spacing", l.lane_spacing)?;
        finite_positive("lanes.lane_change_speed", l.lane_change_speed)?;
        if !l.center_x.is_finite() {
            return Err(invalid("lanes.center_x", "must be finite".into()));
        }

        let w = &self.world;
        finite_positive("world.contact_half_height", w.contact_half_height)?;
        if !(w.despawn_y < w.player_y && w.player_y < w.spawn_y) {
            return Err(invalid(
                "world.player_y",
                "expected despawn_y < player_y < spawn_y".into(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn finite_non_negative(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if !v.is_finite() || v < 0.0 {
        return Err(invalid(field, format!("must be finite and >= 0, got {v}")));
    }
    Ok(())
}

fn finite_positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(invalid(field, format!("must be finite and > 0, got {v}")));
    }
    Ok(())
}

fn unit_interval(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(field, format!("must be within [0, 1], got {v}")));
    }
    Ok(())
}

fn at_least_one(field: &'static str, v: f32) -> Result<(), ConfigError> {
    if !v.is_finite() || v < 1.0 {
        return Err(invalid(field, format!("must be >= 1, got {v}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = GameConfig::from_json_str(r#"{ "revive": { "max_continues_per_run": 3 } }"#)
            .unwrap();
        assert_eq!(config.revive.max_continues_per_run, 3);
        assert_eq!(config.revive.revive_clear_range_y, 8.0);
        assert_eq!(config.energy.max_energy, 100.0);
    }

    #[test]
    fn test_rejects_bad_chance() {
        let err = GameConfig::from_json_str(r#"{ "spawn": { "orb_chance": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "spawn.orb_chance", .. }));
    }

    #[test]
    fn test_rejects_inverted_interval() {
        let mut config = GameConfig::default();
        config.difficulty.base_spawn_interval = 0.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            GameConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_lane_x_layout() {
        let lanes = LaneConfig::default();
        assert_eq!(lanes.center_lane(), 1);
        assert!((lanes.lane_x(0) + 2.2).abs() < 1e-6);
        assert!(lanes.lane_x(1).abs() < 1e-6);
        assert!((lanes.lane_x(2) - 2.2).abs() < 1e-6);
    }
}
