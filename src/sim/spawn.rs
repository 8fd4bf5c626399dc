//! Spawn director
//!
//! Paced by the difficulty curve's spawn interval. Each spawn picks one of
//! three categories:
//! - Neutral: one or two single-lane obstacles
//! - Wall: a full-width light or dark barrier
//! - Orb: a single pickup, biased toward the emptier pool

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::SpawnConfig;
use crate::{Element, OrbKind, lerp};

use super::difficulty::DifficultyCurve;
use super::economy::EnergyLevels;

/// What the director decided to spawn this interval
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnDecision {
    /// Distinct lanes to block, sorted
    Neutral { lanes: Vec<u8> },
    Wall(Element),
    Orb { lane: u8, kind: OrbKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnCategory {
    Neutral,
    Wall,
    Orb,
}

/// Category probabilities at a given difficulty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnChances {
    pub neutral: f32,
    pub wall: f32,
    pub orb: f32,
}

impl SpawnChances {
    pub fn at(cfg: &SpawnConfig, difficulty01: f32) -> Self {
        let wall = lerp(cfg.wall_chance_start, cfg.wall_chance_end, difficulty01);
        let orb = cfg.orb_chance;
        Self {
            neutral: (1.0 - wall - orb).max(0.0),
            wall,
            orb,
        }
    }

    /// Map a uniform draw in [0, 1) onto a category
    pub fn classify(&self, r: f32) -> SpawnCategory {
        if r < self.neutral {
            SpawnCategory::Neutral
        } else if r - self.neutral < self.wall {
            SpawnCategory::Wall
        } else {
            SpawnCategory::Orb
        }
    }
}

/// Orb kind weights; the emptier pool gets the larger bias
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbWeights {
    pub light: f32,
    pub dark: f32,
    pub dual: f32,
}

impl OrbWeights {
    pub fn new(cfg: &SpawnConfig, levels: EnergyLevels) -> Self {
        Self {
            light: cfg.orb_base_weight + (1.0 - levels.light01) * cfg.orb_bias_weight,
            dark: cfg.orb_base_weight + (1.0 - levels.dark01) * cfg.orb_bias_weight,
            dual: cfg.dual_orb_weight,
        }
    }

    pub fn total(&self) -> f32 {
        self.light + self.dark + self.dual
    }

    /// `r` is a draw in [0, total)
    pub fn pick(&self, r: f32) -> OrbKind {
        if r < self.light {
            OrbKind::Light
        } else if r < self.light + self.dark {
            OrbKind::Dark
        } else {
            OrbKind::Dual
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpawnDirector {
    cfg: SpawnConfig,
    lane_count: u8,
    timer: f32,
    rng: Pcg32,
}

impl SpawnDirector {
    pub fn new(cfg: SpawnConfig, lane_count: u8, seed: u64) -> Self {
        Self {
            cfg,
            lane_count: lane_count.max(1),
            timer: 0.0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    /// Advance the spawn timer; returns a decision when the interval elapses
    pub fn tick(
        &mut self,
        dt: f32,
        elapsed: f32,
        curve: &DifficultyCurve,
        levels: EnergyLevels,
    ) -> Option<SpawnDecision> {
        self.timer += dt;
        let interval = curve.spawn_interval(elapsed);
        if self.timer < interval {
            return None;
        }
        self.timer = 0.0;
        Some(self.sample(curve.difficulty01(interval), levels))
    }

    pub fn sample(&mut self, difficulty01: f32, levels: EnergyLevels) -> SpawnDecision {
        let chances = SpawnChances::at(&self.cfg, difficulty01);
        let r: f32 = self.rng.random();
        match chances.classify(r) {
            SpawnCategory::Wall => SpawnDecision::Wall(self.wall()),
            SpawnCategory::Orb => self.orb(levels),
            SpawnCategory::Neutral => SpawnDecision::Neutral {
                lanes: self.neutral_lanes(),
            },
        }
    }

    fn wall(&mut self) -> Element {
        if self.rng.random_bool(0.5) {
            Element::Light
        } else {
            Element::Dark
        }
    }

    fn orb(&mut self, levels: EnergyLevels) -> SpawnDecision {
        let weights = OrbWeights::new(&self.cfg, levels);
        let lane = self.rng.random_range(0..self.lane_count);
        let r = self.rng.random::<f32>() * weights.total();
        SpawnDecision::Orb {
            lane,
            kind: weights.pick(r),
        }
    }

    /// One or two distinct lanes; always leaves a lane open when there are two or more
    fn neutral_lanes(&mut self) -> Vec<u8> {
        let lanes = self.lane_count as usize;
        let max_block = 2.min(lanes.saturating_sub(1)).max(1);
        let count = self.rng.random_range(1..=max_block);
        let mut picked: Vec<u8> = rand::seq::index::sample(&mut self.rng, lanes, count)
            .into_iter()
            .map(|i| i as u8)
            .collect();
        picked.sort_unstable();
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DifficultyConfig;

    fn full() -> EnergyLevels {
        EnergyLevels {
            light01: 1.0,
            dark01: 1.0,
        }
    }

    #[test]
    fn test_chances_at_extremes() {
        let cfg = SpawnConfig::default();
        let easy = SpawnChances::at(&cfg, 0.0);
        assert!((easy.wall - 0.10).abs() < 1e-6);
        assert!((easy.neutral - 0.80).abs() < 1e-6);

        let hard = SpawnChances::at(&cfg, 1.0);
        assert!((hard.wall - 0.28).abs() < 1e-6);
        assert!((hard.orb - 0.10).abs() < 1e-6);
        assert!((hard.neutral - 0.62).abs() < 1e-6);
    }

    #[test]
    fn test_sampled_frequencies_match_chances() {
        let mut director = SpawnDirector::new(SpawnConfig::default(), 3, 7);
        let n = 100_000;
        let (mut walls, mut neutrals) = (0u32, 0u32);
        for _ in 0..n {
            match director.sample(1.0, full()) {
                SpawnDecision::Wall(_) => walls += 1,
                SpawnDecision::Neutral { .. } => neutrals += 1,
                SpawnDecision::Orb { .. } => {}
            }
        }
        let wall_rate = walls as f32 / n as f32;
        let neutral_rate = neutrals as f32 / n as f32;
        assert!((wall_rate - 0.28).abs() < 0.01, "wall rate {}", wall_rate);
        assert!((neutral_rate - 0.62).abs() < 0.01, "neutral rate {}", neutral_rate);
    }

    #[test]
    fn test_orb_weights_favor_empty_pool() {
        let cfg = SpawnConfig::default();
        let w = OrbWeights::new(
            &cfg,
            EnergyLevels {
                light01: 0.0,
                dark01: 1.0,
            },
        );
        assert!((w.light - 2.2).abs() < 1e-6);
        assert!((w.dark - 1.0).abs() < 1e-6);
        assert!((w.dual - 0.25).abs() < 1e-6);

        assert_eq!(w.pick(0.0), OrbKind::Light);
        assert_eq!(w.pick(2.5), OrbKind::Dark);
        assert_eq!(w.pick(3.3), OrbKind::Dual);
    }

    #[test]
    fn test_neutral_rows_leave_a_lane_open() {
        let mut director = SpawnDirector::new(SpawnConfig::default(), 3, 11);
        for _ in 0..2_000 {
            if let SpawnDecision::Neutral { lanes } = director.sample(0.0, full()) {
                assert!((1..=2).contains(&lanes.len()));
                assert!(lanes.windows(2).all(|w| w[0] < w[1]));
                assert!(lanes.iter().all(|&l| l < 3));
            }
        }
    }

    #[test]
    fn test_tick_paces_by_interval() {
        let curve = DifficultyCurve::new(DifficultyConfig::default());
        let mut director = SpawnDirector::new(SpawnConfig::default(), 3, 1);

        assert!(director.tick(1.0, 0.0, &curve, full()).is_none());
        assert!(director.tick(0.25, 0.0, &curve, full()).is_some());
        assert_eq!(director.timer(), 0.0);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SpawnDirector::new(SpawnConfig::default(), 3, 42);
        let mut b = SpawnDirector::new(SpawnConfig::default(), 3, 42);
        for _ in 0..100 {
            assert_eq!(a.sample(0.5, full()), b.sample(0.5, full()));
        }
    }
}
