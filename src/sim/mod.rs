//! Run simulation
//!
//! All gameplay logic lives here. Single-threaded and deterministic:
//! - One external `tick` call advances everything
//! - Seeded RNG only
//! - Stable iteration order (arena slot order)
//! - No rendering, input-device or ad-network dependencies

pub mod combat;
pub mod difficulty;
pub mod economy;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod world;

pub use combat::CombatResolver;
pub use difficulty::DifficultyCurve;
pub use economy::{EnergyLevels, MoveDirection, ResourceEconomy};
pub use spawn::{OrbWeights, SpawnCategory, SpawnChances, SpawnDecision, SpawnDirector};
pub use state::{
    AttackOutcome, ContinueOutcome, ContinueStatus, Countdown, Player, RewardSource, Run,
    RunAttackStats, RunSnapshot, RunState, ScoreMultiplier,
};
pub use tick::{TickInput, tick};
pub use world::{Handle, Hazard, HazardKind, World};
