//! Fixed timestep simulation tick
//!
//! Advances a `Run` by one frame. Frames longer than `SIM_DT` are split into
//! sub-steps so no hazard can move past the player between contact checks.
//! Order within a sub-step:
//! 1. Revive invulnerability counts down (every state)
//! 2. Time, score and idle drain (Playing only from here on)
//! 3. Lane change request and lateral movement
//! 4. Attacks
//! 5. Scroll hazards, then spawn
//! 6. Contact detection, routed through the public collision reports
//!
//! The pause toggle is applied once, before the first sub-step; lane and
//! attack requests apply to the first sub-step only.

use super::state::{Run, RunState};
use super::world::{Handle, HazardKind};
use crate::consts::SIM_DT;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Lane change request (-1 left, +1 right, 0 none)
    pub lane_delta: i8,
    pub light_attack: bool,
    pub dark_attack: bool,
    /// Pause toggle
    pub pause: bool,
}

/// Advance the run by `dt` seconds
pub fn tick(run: &mut Run, input: &TickInput, dt: f32) {
    if input.pause {
        run.toggle_pause();
    }

    let idle = TickInput::default();
    let mut remaining = dt.max(0.0);
    let mut step_input = input;
    loop {
        let step = remaining.min(SIM_DT);
        substep(run, step_input, step);
        step_input = &idle;
        remaining -= step;
        if remaining <= 0.0 {
            break;
        }
    }
}

fn substep(run: &mut Run, input: &TickInput, dt: f32) {
    // Real time, independent of pause/game over
    run.invulnerability.tick(dt);

    if run.state != RunState::Playing {
        return;
    }

    run.elapsed += dt;
    run.multiplier.tick(dt);
    run.score += run.config.scoring.score_per_second * run.multiplier.factor() * dt;

    run.economy.drain_idle(dt);
    run.publish_energy();

    if input.lane_delta != 0 {
        run.change_lane(input.lane_delta);
    }
    move_player(run, dt);

    if input.light_attack {
        run.attack(crate::Element::Light);
    }
    if input.dark_attack {
        run.attack(crate::Element::Dark);
    }

    scroll_hazards(run, dt);

    let levels = run.economy.levels();
    if let Some(decision) = run.spawner.tick(dt, run.elapsed, &run.curve, levels) {
        log::debug!("Spawn {:?} at t={:.2}", decision, run.elapsed);
        run.materialize(decision);
    }

    resolve_contacts(run);
}

/// Slide toward the target lane; arriving snaps to the lane center
fn move_player(run: &mut Run, dt: f32) {
    let lanes = &run.config.lanes;
    let target_x = lanes.lane_x(run.player.target_lane);
    let step = lanes.lane_change_speed * run.economy.move_speed_factor() * dt;
    let dx = target_x - run.player.x;

    if dx.abs() <= step {
        run.player.x = target_x;
        run.player.lane = run.player.target_lane;
    } else {
        run.player.x += step.copysign(dx);
    }
}

fn scroll_hazards(run: &mut Run, dt: f32) {
    let dy = run.world_speed() * dt;
    let despawned = run.world.advance(dy, run.config.world.despawn_y);
    for (handle, hazard) in &despawned {
        if hazard.kind.spans_all_lanes() {
            run.combat.unregister(*handle);
        }
    }
}

/// Hazards overlapping the player this tick, in world order
fn contacts(run: &Run) -> Vec<(Handle, HazardKind)> {
    let player_y = run.config.world.player_y;
    let half_height = run.config.world.contact_half_height;
    let half_lane = run.config.lanes.lane_spacing * 0.5;
    let x = run.player.x;

    run.world
        .iter()
        .filter(|(_, h)| (h.pos.y - player_y).abs() <= half_height)
        .filter(|(_, h)| h.kind.spans_all_lanes() || (h.pos.x - x).abs() < half_lane)
        .map(|(handle, h)| (handle, h.kind))
        .collect()
}

fn resolve_contacts(run: &mut Run) {
    for (handle, kind) in contacts(run) {
        if run.state != RunState::Playing {
            break;
        }
        match kind {
            HazardKind::Orb(orb) => {
                if run.report_pickup_collected(orb) {
                    run.despawn_hazard(handle);
                }
            }
            HazardKind::Obstacle => {
                run.report_obstacle_collision();
            }
            HazardKind::Barrier(element) => {
                run.report_barrier_collision(element);
            }
        }
    }
}
