//! Run state machine
//!
//! `Run` owns everything a single play session needs: economy, combat,
//! spawning, the hazard world, the stat recorder and the notification bus.
//! Every mutation goes through it so transitions stay in one place.
//!
//! States:
//! - `Playing`: the only state in which time, score and hazards advance
//! - `Paused`: toggled from/to `Playing`
//! - `GameOverPending`: lethal hit with a continue left; snapshot held
//! - `GameOverFinal`: terminal until `restart`

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::ConfigError;
use crate::events::{EventBus, Notification, SubscriberId};
use crate::stats::StatRecorder;
use crate::{Element, OrbKind};

use super::combat::CombatResolver;
use super::difficulty::DifficultyCurve;
use super::economy::{MoveDirection, ResourceEconomy};
use super::spawn::{SpawnDecision, SpawnDirector};
use super::world::{Handle, Hazard, HazardKind, World};

/// Spawner reseed stride between restarts
const RESTART_SEED_STRIDE: u64 = 2_654_435_761;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Playing,
    Paused,
    GameOverPending,
    GameOverFinal,
}

/// Captured on entry to `GameOverPending`, consumed by a revive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub score: f32,
    pub elapsed: f32,
    pub light_energy: f32,
    pub dark_energy: f32,
    pub lane: u8,
    pub position_x: f32,
}

/// Timer that counts down to zero and stays there
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    pub fn start(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
    }

    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }

    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// Timed score multiplier granted by orbs.
///
/// A stronger buff replaces the active one; an equal one keeps the longer
/// remaining time; a weaker one is ignored while the current buff lasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreMultiplier {
    factor: f32,
    timer: Countdown,
}

impl Default for ScoreMultiplier {
    fn default() -> Self {
        Self {
            factor: 1.0,
            timer: Countdown::default(),
        }
    }
}

impl ScoreMultiplier {
    /// Current factor, 1 when no buff is active
    pub fn factor(&self) -> f32 {
        if self.timer.is_active() {
            self.factor
        } else {
            1.0
        }
    }

    pub fn remaining(&self) -> f32 {
        self.timer.remaining()
    }

    pub fn apply(&mut self, factor: f32, seconds: f32) {
        let current = self.factor();
        if factor > current {
            self.factor = factor;
            self.timer.start(seconds);
        } else if factor == current && self.timer.is_active() {
            self.timer.start(seconds.max(self.timer.remaining()));
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.timer.tick(dt);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Attack counters for the current run only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunAttackStats {
    pub total: u32,
    pub light: u32,
    pub dark: u32,
}

impl RunAttackStats {
    fn record(&mut self, kind: Element) {
        self.total += 1;
        match kind {
            Element::Light => self.light += 1,
            Element::Dark => self.dark += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    /// Lane the player last arrived in
    pub lane: u8,
    /// Lane the player is heading to
    pub target_lane: u8,
    pub x: f32,
}

/// Reports whether a rewarded continue has been earned
pub trait RewardSource {
    fn is_reward_ready(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueStatus {
    /// No continue possible (wrong state, budget spent or no snapshot)
    Unavailable,
    /// Continue possible, reward not ready yet
    NotReady,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueOutcome {
    Revived,
    /// Pending run had no snapshot and was finalized instead
    Finalized,
    /// Not in `GameOverPending`
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    Ignored,
    NoEnergy,
    NoTarget,
    Hit { destroyed: u32 },
}

pub struct Run {
    pub(super) config: GameConfig,
    pub(super) curve: DifficultyCurve,
    pub(super) state: RunState,
    pub(super) score: f32,
    pub(super) elapsed: f32,
    pub(super) multiplier: ScoreMultiplier,
    pub(super) player: Player,
    pub(super) economy: ResourceEconomy,
    pub(super) combat: CombatResolver,
    pub(super) spawner: SpawnDirector,
    pub(super) world: World,
    pub(super) stats: StatRecorder,
    pub(super) bus: EventBus,
    pub(super) continues_used: u32,
    pub(super) snapshot: Option<RunSnapshot>,
    pub(super) invulnerability: Countdown,
    pub(super) run_attacks: RunAttackStats,
    /// Set when this run wrote a new best score on entering `GameOverPending`
    pub(super) record_this_run: bool,
    seed: u64,
    restarts: u64,
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("state", &self.state)
            .field("score", &self.score)
            .field("elapsed", &self.elapsed)
            .field("player", &self.player)
            .field("continues_used", &self.continues_used)
            .field("hazards", &self.world.len())
            .finish_non_exhaustive()
    }
}

impl Run {
    /// Start a run in `Playing`. Fails if the config is out of range.
    pub fn new(config: GameConfig, stats: StatRecorder, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let lane = config.lanes.center_lane();
        let player = Player {
            lane,
            target_lane: lane,
            x: config.lanes.lane_x(lane),
        };
        log::info!("Starting run (seed {})", seed);
        Ok(Self {
            curve: DifficultyCurve::new(config.difficulty.clone()),
            economy: ResourceEconomy::new(config.energy.clone()),
            spawner: SpawnDirector::new(config.spawn.clone(), config.lanes.lane_count, seed),
            state: RunState::Playing,
            score: 0.0,
            elapsed: 0.0,
            multiplier: ScoreMultiplier::default(),
            player,
            combat: CombatResolver::new(),
            world: World::new(),
            stats,
            bus: EventBus::new(),
            continues_used: 0,
            snapshot: None,
            invulnerability: Countdown::default(),
            run_attacks: RunAttackStats::default(),
            record_this_run: false,
            seed,
            restarts: 0,
            config,
        })
    }

    /// Reset everything run-scoped and return to `Playing`.
    /// Lifetime stats and subscribers are kept.
    pub fn restart(&mut self) {
        self.restarts += 1;
        let seed = self
            .seed
            .wrapping_add(self.restarts.wrapping_mul(RESTART_SEED_STRIDE));
        let lane = self.config.lanes.center_lane();
        self.player = Player {
            lane,
            target_lane: lane,
            x: self.config.lanes.lane_x(lane),
        };
        self.spawner = SpawnDirector::new(
            self.config.spawn.clone(),
            self.config.lanes.lane_count,
            seed,
        );
        self.economy.reset();
        self.combat.clear();
        self.world.clear();
        self.state = RunState::Playing;
        self.score = 0.0;
        self.elapsed = 0.0;
        self.multiplier.reset();
        self.continues_used = 0;
        self.snapshot = None;
        self.invulnerability.clear();
        self.run_attacks = RunAttackStats::default();
        self.record_this_run = false;
        log::info!("Restarting run (seed {})", seed);
        self.publish_energy();
    }

    // --- Queries ---

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    /// Score as reported and persisted (rounded to nearest)
    pub fn score_int(&self) -> i64 {
        self.score.round() as i64
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn world_speed(&self) -> f32 {
        self.curve.world_speed(self.elapsed)
    }

    pub fn spawn_interval(&self) -> f32 {
        self.curve.spawn_interval(self.elapsed)
    }

    pub fn difficulty01(&self) -> f32 {
        self.curve.difficulty01(self.spawn_interval())
    }

    pub fn score_multiplier(&self) -> &ScoreMultiplier {
        &self.multiplier
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn economy(&self) -> &ResourceEconomy {
        &self.economy
    }

    pub fn combat(&self) -> &CombatResolver {
        &self.combat
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn stats(&self) -> &StatRecorder {
        &self.stats
    }

    /// Hand the recorder back (e.g. to start a fresh `Run` with new config)
    pub fn into_stats(self) -> StatRecorder {
        self.stats
    }

    pub fn run_attacks(&self) -> RunAttackStats {
        self.run_attacks
    }

    pub fn continues_used(&self) -> u32 {
        self.continues_used
    }

    pub fn snapshot(&self) -> Option<&RunSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn is_revive_invulnerable(&self) -> bool {
        self.invulnerability.is_active()
    }

    pub fn invulnerability_remaining(&self) -> f32 {
        self.invulnerability.remaining()
    }

    /// Open vertical attack window around the player
    pub fn attack_range(&self) -> (f32, f32) {
        let y = self.config.world.player_y;
        (
            y - self.config.combat.attack_range_below_player,
            y + self.config.combat.attack_range_above_player,
        )
    }

    // --- Subscribers ---

    pub fn subscribe(&mut self) -> SubscriberId {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn drain_notifications(&mut self, id: SubscriberId) -> Vec<Notification> {
        self.bus.drain(id)
    }

    pub(super) fn publish_energy(&mut self) {
        let levels = self.economy.levels();
        self.bus.publish(Notification::EnergyChanged {
            light01: levels.light01,
            dark01: levels.dark01,
        });
    }

    // --- Pause ---

    /// `Playing` <-> `Paused`; ignored in any other state
    pub fn set_paused(&mut self, paused: bool) {
        match (self.state, paused) {
            (RunState::Playing, true) => {
                self.state = RunState::Paused;
                log::debug!("Paused");
            }
            (RunState::Paused, false) => {
                self.state = RunState::Playing;
                log::debug!("Resumed");
            }
            _ => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        let paused = self.state == RunState::Playing;
        self.set_paused(paused);
    }

    // --- Hazards ---

    /// Add a hazard to the world; barriers are registered with combat
    pub fn spawn_hazard(&mut self, hazard: Hazard) -> Handle {
        let is_barrier = hazard.kind.spans_all_lanes();
        let handle = self.world.insert(hazard);
        if is_barrier {
            self.combat.register(handle);
        }
        handle
    }

    /// Remove a hazard, unregistering it from combat first
    pub fn despawn_hazard(&mut self, handle: Handle) -> Option<Hazard> {
        self.combat.unregister(handle);
        self.world.remove(handle)
    }

    pub(super) fn materialize(&mut self, decision: SpawnDecision) {
        let lanes = &self.config.lanes;
        let y = self.config.world.spawn_y;
        let hazards: Vec<Hazard> = match decision {
            SpawnDecision::Neutral { lanes: blocked } => blocked
                .into_iter()
                .map(|lane| Hazard::obstacle(lane, Vec2::new(lanes.lane_x(lane), y)))
                .collect(),
            SpawnDecision::Wall(element) => {
                vec![Hazard::barrier(element, Vec2::new(lanes.center_x, y))]
            }
            SpawnDecision::Orb { lane, kind } => {
                vec![Hazard::orb(kind, lane, Vec2::new(lanes.lane_x(lane), y))]
            }
        };
        for hazard in hazards {
            self.spawn_hazard(hazard);
        }
    }

    // --- Player actions ---

    /// Shift the target lane by `delta`, clamped to the lane range.
    /// Each accepted change pays the move cost of its direction.
    pub fn change_lane(&mut self, delta: i8) -> bool {
        if self.state != RunState::Playing || delta == 0 {
            return false;
        }
        let max = self.config.lanes.lane_count.saturating_sub(1) as i16;
        let from = self.player.target_lane;
        let to = (from as i16 + delta as i16).clamp(0, max) as u8;
        if to == from {
            return false;
        }
        let direction = if to > from {
            MoveDirection::Right
        } else {
            MoveDirection::Left
        };
        self.economy.spend_move(direction);
        self.player.target_lane = to;
        self.publish_energy();
        true
    }

    /// Fire an attack of `kind`. Energy is spent only if a target exists.
    pub fn attack(&mut self, kind: Element) -> AttackOutcome {
        if self.state != RunState::Playing {
            return AttackOutcome::Ignored;
        }
        if !self.economy.can_attack(kind) {
            return AttackOutcome::NoEnergy;
        }
        let (y_min, y_max) = self.attack_range();
        if !self
            .combat
            .has_target_in_range(&self.world, kind, y_min, y_max)
        {
            return AttackOutcome::NoTarget;
        }

        self.economy.spend_attack(kind);
        self.publish_energy();

        let destroyed = self
            .combat
            .resolve_attack(&mut self.world, kind, y_min, y_max);
        self.stats
            .add_walls_destroyed(kind.opposite(), destroyed, &mut self.bus);
        self.stats.add_attack(kind, &mut self.bus);
        self.run_attacks.record(kind);

        AttackOutcome::Hit { destroyed }
    }

    // --- Collision reports ---

    /// Lethal contact with a neutral obstacle. Returns true if it counted.
    pub fn report_obstacle_collision(&mut self) -> bool {
        if !self.accepts_lethal_contact() {
            return false;
        }
        self.stats.add_death_obstacle(&mut self.bus);
        self.trigger_game_over();
        true
    }

    /// Lethal contact with a barrier of `wall`. Returns true if it counted.
    pub fn report_barrier_collision(&mut self, wall: Element) -> bool {
        if !self.accepts_lethal_contact() {
            return false;
        }
        self.stats.add_death_wall(wall, &mut self.bus);
        self.trigger_game_over();
        true
    }

    /// Orb collected: stat, energy and score buff. Returns true if it counted.
    pub fn report_pickup_collected(&mut self, kind: OrbKind) -> bool {
        if self.state != RunState::Playing {
            return false;
        }
        self.stats.add_orb(kind, &mut self.bus);
        self.economy.add_orb(kind);
        self.publish_energy();

        let scoring = &self.config.scoring;
        let (factor, seconds) = match kind {
            OrbKind::Dual => (scoring.dual_multiplier, scoring.dual_multiplier_seconds),
            OrbKind::Light | OrbKind::Dark => {
                (scoring.orb_multiplier, scoring.orb_multiplier_seconds)
            }
        };
        self.multiplier.apply(factor, seconds);
        log::debug!("Collected {} orb (x{} score)", kind.as_str(), self.multiplier.factor());
        true
    }

    fn accepts_lethal_contact(&self) -> bool {
        if self.state != RunState::Playing {
            return false;
        }
        if self.is_revive_invulnerable() {
            log::trace!("Lethal contact ignored (revive invulnerability)");
            return false;
        }
        true
    }

    // --- Game over / continue ---

    fn trigger_game_over(&mut self) {
        if self.continues_used < self.config.revive.max_continues_per_run {
            self.enter_pending();
        } else {
            self.finalize();
        }
    }

    fn enter_pending(&mut self) {
        self.state = RunState::GameOverPending;
        self.snapshot = Some(RunSnapshot {
            score: self.score,
            elapsed: self.elapsed,
            light_energy: self.economy.light(),
            dark_energy: self.economy.dark(),
            lane: self.player.lane,
            position_x: self.player.x,
        });

        let score = self.score_int();
        let is_new_record = score > self.stats.best_score();
        self.stats.try_set_best_score(score, &mut self.bus);
        self.record_this_run |= is_new_record;
        let best = self.stats.best_score();

        log::info!(
            "Game over pending: score {} best {} ({} of {} continues used)",
            score,
            best,
            self.continues_used,
            self.config.revive.max_continues_per_run
        );
        self.bus.publish(Notification::RunPending {
            score,
            best,
            can_continue: true,
            is_new_record,
        });
    }

    fn finalize(&mut self) {
        self.state = RunState::GameOverFinal;
        self.snapshot = None;
        self.invulnerability.clear();

        let score = self.score_int();
        let wrote = self.stats.try_set_best_score(score, &mut self.bus);
        let is_new_record = wrote || self.record_this_run;
        let best = self.stats.best_score();

        log::info!("Run over: score {} best {}", score, best);
        self.bus.publish(Notification::RunFinal {
            score,
            best,
            is_new_record,
        });
        self.stats.add_run(&mut self.bus);
    }

    /// Player gave up on the continue offer
    pub fn decline_continue(&mut self) -> bool {
        if self.state != RunState::GameOverPending {
            return false;
        }
        self.finalize();
        true
    }

    pub fn continue_status(&self, rewards: &dyn RewardSource) -> ContinueStatus {
        let available = self.state == RunState::GameOverPending
            && self.snapshot.is_some()
            && self.continues_used < self.config.revive.max_continues_per_run;
        if !available {
            ContinueStatus::Unavailable
        } else if rewards.is_reward_ready() {
            ContinueStatus::Ready
        } else {
            ContinueStatus::NotReady
        }
    }

    /// Revive from the pending snapshot after the reward was granted
    pub fn continue_after_reward(&mut self) -> ContinueOutcome {
        if self.state != RunState::GameOverPending {
            log::debug!("Continue ignored in {:?}", self.state);
            return ContinueOutcome::Ignored;
        }
        let Some(snap) = self.snapshot.take() else {
            log::warn!("Continue requested without a snapshot; finalizing run");
            self.finalize();
            return ContinueOutcome::Finalized;
        };

        self.continues_used += 1;
        self.score = snap.score;
        self.elapsed = snap.elapsed;
        self.economy.restore(snap.light_energy, snap.dark_energy);
        self.player = Player {
            lane: snap.lane,
            target_lane: snap.lane,
            x: snap.position_x,
        };

        let cleared = self.clear_nearby_hazards();
        self.invulnerability
            .start(self.config.revive.revive_invulnerability_seconds);
        self.state = RunState::Playing;

        log::info!(
            "Revived (continue {} of {}), cleared {} hazard(s)",
            self.continues_used,
            self.config.revive.max_continues_per_run,
            cleared
        );
        self.bus.publish(Notification::Revived);
        self.publish_energy();
        ContinueOutcome::Revived
    }

    /// Drop obstacles and barriers near the player; orbs stay
    fn clear_nearby_hazards(&mut self) -> usize {
        let range = self.config.revive.revive_clear_range_y + self.world_speed();
        let player_y = self.config.world.player_y;
        let removed = self
            .world
            .remove_where(|h| !h.kind.is_pickup() && (h.pos.y - player_y).abs() <= range);
        for (handle, hazard) in &removed {
            if let HazardKind::Barrier(_) = hazard.kind {
                self.combat.unregister(*handle);
            }
        }
        removed.len()
    }
}
