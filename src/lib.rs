//! Dual Balance - run simulation and progression core
//!
//! Core modules:
//! - `sim`: Run state machine, energy economy, combat, spawning, hazard world
//! - `stats`: Durable lifetime statistics (write-through to achievements)
//! - `achievements`: Fixed unlock catalog evaluated to a fixed point
//! - `persistence`: Key-value store contract and implementations
//! - `events`: Notification bus for UI/audio/analytics collaborators
//! - `config`: Data-driven game balance

pub mod achievements;
pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod sim;
pub mod stats;

pub use achievements::{AchievementEngine, AchievementRule};
pub use config::GameConfig;
pub use error::{ConfigError, StoreError};
pub use events::{EventBus, Notification, SubscriberId};
pub use persistence::{JsonFileStore, KeyValueStore, MemoryStore};
pub use stats::StatRecorder;

/// Simulation constants
pub mod consts {
    /// Longest single step the simulation takes (60 Hz); longer frames are split
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Energy at or below this counts as depleted
    pub const DEPLETED_EPSILON: f32 = 0.001;
}

/// Element of a barrier, attack or single-element pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Element {
    Light,
    Dark,
}

impl Element {
    /// The element an attack of this kind destroys
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Element::Light => Element::Dark,
            Element::Dark => Element::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Light => "light",
            Element::Dark => "dark",
        }
    }
}

/// Pickup (orb) kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum OrbKind {
    Light,
    Dark,
    /// Refills both pools, rarer
    Dual,
}

impl OrbKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrbKind::Light => "light",
            OrbKind::Dark => "dark",
            OrbKind::Dual => "dual",
        }
    }
}

/// Linear interpolation, `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1].
/// Works for descending ranges (a > b); returns 0 when a == b.
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_lerp_descending() {
        assert_eq!(inverse_lerp(1.2, 0.45, 1.2), 0.0);
        assert_eq!(inverse_lerp(1.2, 0.45, 0.45), 1.0);
        assert!((inverse_lerp(1.2, 0.45, 0.825) - 0.5).abs() < 1e-5);
        // Out of range clamps
        assert_eq!(inverse_lerp(1.2, 0.45, 0.1), 1.0);
        assert_eq!(inverse_lerp(1.2, 0.45, 2.0), 0.0);
    }

    #[test]
    fn test_inverse_lerp_degenerate() {
        assert_eq!(inverse_lerp(1.0, 1.0, 5.0), 0.0);
    }

    #[test]
    fn test_lerp_clamps() {
        assert!((lerp(0.10, 0.28, 1.0) - 0.28).abs() < 1e-6);
        assert!((lerp(0.10, 0.28, 2.0) - 0.28).abs() < 1e-6);
        assert!((lerp(0.10, 0.28, 0.0) - 0.10).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_element() {
        assert_eq!(Element::Light.opposite(), Element::Dark);
        assert_eq!(Element::Dark.opposite(), Element::Light);
    }
}
