//! Dual Balance headless runner
//!
//! Plays runs with a simple autopilot at a fixed timestep and logs what the
//! core reports. Useful for balance passes and for soak-testing saves.
//!
//! Run `dual-balance --help` for options.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::error::Error;
    use std::path::PathBuf;

    use clap::Parser;

    use dual_balance::consts::SIM_DT;
    use dual_balance::sim::{
        ContinueStatus, HazardKind, RewardSource, Run, RunState, TickInput, tick,
    };
    use dual_balance::{
        Element, GameConfig, JsonFileStore, MemoryStore, Notification, StatRecorder,
    };

    /// Reward provider that always has a continue ready
    struct InstantReward;

    impl RewardSource for InstantReward {
        fn is_reward_ready(&self) -> bool {
            true
        }
    }

    #[derive(Parser, Debug)]
    #[command(name = "dual-balance")]
    #[command(about = "Headless Dual Balance runner for balance passes and save soak tests")]
    #[command(version)]
    struct Cli {
        /// Game config JSON (defaults to the shipped tuning)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Persist stats and achievements to this JSON file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Number of runs to play
        #[arg(long, default_value_t = 5)]
        runs: u32,

        /// Spawn RNG seed
        #[arg(long, default_value_t = 0x5eed)]
        seed: u64,

        /// Cap on simulated seconds per run
        #[arg(long, default_value_t = 300.0)]
        max_seconds: f32,
    }

    /// Dodge obstacles in the current lane, fire at barriers in range
    fn autopilot(run: &Run) -> TickInput {
        let cfg = run.config();
        let player = run.player();
        let player_y = cfg.world.player_y;
        let (y_min, y_max) = run.attack_range();
        let mut input = TickInput::default();

        for (_, hazard) in run.world().iter() {
            if let HazardKind::Barrier(wall) = hazard.kind {
                if hazard.pos.y > y_min && hazard.pos.y < y_max {
                    match wall.opposite() {
                        Element::Light => input.light_attack = true,
                        Element::Dark => input.dark_attack = true,
                    }
                }
            }
        }

        let lookahead = player_y + 4.0;
        let blocked = |lane: i16| {
            run.world().iter().any(|(_, h)| {
                h.kind == HazardKind::Obstacle
                    && h.lane.map(i16::from) == Some(lane)
                    && h.pos.y > player_y - 0.5
                    && h.pos.y < lookahead
            })
        };
        let here = i16::from(player.target_lane);
        if blocked(here) {
            let lanes = i16::from(cfg.lanes.lane_count);
            for delta in [-1i8, 1] {
                let lane = here + i16::from(delta);
                if (0..lanes).contains(&lane) && !blocked(lane) {
                    input.lane_delta = delta;
                    break;
                }
            }
        }
        input
    }

    fn report(note: &Notification) {
        match note {
            Notification::AchievementUnlocked { title, description, .. } => {
                log::info!("Achievement unlocked: {} ({})", title, description)
            }
            Notification::RunPending { score, best, .. } => {
                log::info!("Down at {} (best {}), continue offered", score, best)
            }
            Notification::RunFinal { score, best, is_new_record } => {
                let tag = if *is_new_record { " NEW RECORD" } else { "" };
                log::info!("Final score {} (best {}){}", score, best, tag)
            }
            Notification::Revived => log::info!("Revived"),
            Notification::EnergyChanged { .. } => {}
        }
    }

    pub fn run() -> Result<(), Box<dyn Error>> {
        let args = Cli::parse();

        let config = match &args.config {
            Some(path) => GameConfig::load(path)?,
            None => GameConfig::default(),
        };
        let stats = match &args.save {
            Some(path) => StatRecorder::new(JsonFileStore::open(path)?),
            None => StatRecorder::new(MemoryStore::new()),
        };

        let mut run = Run::new(config, stats, args.seed)?;
        let ui = run.subscribe();
        let rewards = InstantReward;
        let mut scores = Vec::with_capacity(args.runs as usize);

        for index in 0..args.runs {
            if index > 0 {
                run.restart();
            }
            while run.state() != RunState::GameOverFinal {
                if run.elapsed() >= args.max_seconds {
                    log::info!("Run {} hit the {}s cap", index + 1, args.max_seconds);
                    break;
                }
                let input = autopilot(&run);
                tick(&mut run, &input, SIM_DT);

                for note in run.drain_notifications(ui) {
                    report(&note);
                }

                if run.state() == RunState::GameOverPending {
                    match run.continue_status(&rewards) {
                        ContinueStatus::Ready => {
                            run.continue_after_reward();
                        }
                        ContinueStatus::NotReady | ContinueStatus::Unavailable => {
                            run.decline_continue();
                        }
                    }
                    for note in run.drain_notifications(ui) {
                        report(&note);
                    }
                }
            }
            let attacks = run.run_attacks();
            println!(
                "run {:>3}: score {:>6}  time {:>6.1}s  attacks {} (light {}, dark {})",
                index + 1,
                run.score_int(),
                run.elapsed(),
                attacks.total,
                attacks.light,
                attacks.dark
            );
            scores.push(run.score_int());
        }

        let stats = run.stats();
        let catalog = stats.achievements().catalog().len();
        println!(
            "best {}  lifetime runs {}  achievements {}/{}",
            stats.best_score(),
            stats.get(dual_balance::stats::Counter::Runs),
            stats.unlocked_count(),
            catalog
        );
        if let Some(top) = scores.iter().max() {
            log::info!("Top score this session: {}", top);
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use clap::CommandFactory;

        #[test]
        fn test_cli_definition_is_valid() {
            Cli::command().debug_assert();
        }

        #[test]
        fn test_cli_defaults() {
            let cli = Cli::try_parse_from(["dual-balance"]).unwrap();
            assert_eq!(cli.runs, 5);
            assert_eq!(cli.seed, 0x5eed);
            assert_eq!(cli.max_seconds, 300.0);
            assert!(cli.config.is_none());
            assert!(cli.save.is_none());
        }

        #[test]
        fn test_cli_flags() {
            let cli = Cli::try_parse_from([
                "dual-balance",
                "--runs",
                "2",
                "--seed",
                "7",
                "--max-seconds",
                "12.5",
                "--save",
                "stats.json",
            ])
            .unwrap();
            assert_eq!(cli.runs, 2);
            assert_eq!(cli.seed, 7);
            assert_eq!(cli.max_seconds, 12.5);
            assert_eq!(cli.save, Some(PathBuf::from("stats.json")));
        }

        #[test]
        fn test_cli_rejects_bad_input() {
            assert!(Cli::try_parse_from(["dual-balance", "--runs", "many"]).is_err());
            assert!(Cli::try_parse_from(["dual-balance", "--bogus"]).is_err());
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dual Balance (headless) starting...");

    match headless::run() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The core is a library; a browser front end drives `Run` directly
}
