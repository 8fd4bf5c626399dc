//! Difficulty curves
//!
//! World speed and spawn interval are pure functions of elapsed run time.
//! Everything that needs either value reads it from here.

use crate::config::DifficultyConfig;
use crate::inverse_lerp;

#[derive(Debug, Clone)]
pub struct DifficultyCurve {
    cfg: DifficultyConfig,
}

impl DifficultyCurve {
    pub fn new(cfg: DifficultyConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &DifficultyConfig {
        &self.cfg
    }

    /// `min(base + elapsed * ramp, max)`
    pub fn world_speed(&self, elapsed: f32) -> f32 {
        let speed = self.cfg.base_world_speed + elapsed.max(0.0) * self.cfg.difficulty_ramp;
        speed.min(self.cfg.max_world_speed)
    }

    /// `max(min, base - elapsed * ramp)`
    pub fn spawn_interval(&self, elapsed: f32) -> f32 {
        let interval =
            self.cfg.base_spawn_interval - elapsed.max(0.0) * self.cfg.spawn_interval_ramp;
        interval.max(self.cfg.min_spawn_interval)
    }

    /// 0 at the base interval, 1 once the interval hits its floor
    pub fn difficulty01(&self, interval: f32) -> f32 {
        inverse_lerp(
            self.cfg.base_spawn_interval,
            self.cfg.min_spawn_interval,
            interval,
        )
    }
}
