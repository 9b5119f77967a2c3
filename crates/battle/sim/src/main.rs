//! Headless battle simulator.
//!
//! Loads a content directory, then fights the configured troop with the
//! party on auto battle, narrating every step through `tracing`.
//!
//! ```bash
//! BATTLE_TROOP_ID=3 BATTLE_SEED=7 RUST_LOG=debug cargo run -p battle-sim
//! ```

mod config;
mod narrator;

use std::path::Path;

use anyhow::Result;
use battle_content::ContentFactory;
use battle_core::{
    BattleContext, BattleEngine, BattleEnv, BattleOutcome, BattleRecord, Database, Encounter,
    LogEvent, Party, PcgRng, Troop,
};
use tracing::{info, warn};

use crate::config::SimConfig;
use crate::narrator::TracingLog;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SimConfig::from_env();
    let factory = match &config.data_dir {
        Some(dir) => ContentFactory::new(dir),
        None => ContentFactory::bundled(),
    };
    info!(data_dir = %factory.data_dir().display(), "loading content");
    let db = factory.load_database()?;

    let mut record = BattleRecord::default();
    let mut replay = Vec::new();
    for index in 0..config.battles {
        let seed = config.seed.wrapping_add(u64::from(index));
        let report = run_battle(&db, &config, seed, &mut record)?;
        info!(battle = index + 1, seed, outcome = ?report.outcome, ticks = report.ticks, "battle finished");
        replay.push(report.events);
    }
    info!(
        battles = record.battle_count,
        wins = record.win_count,
        escapes = record.escape_count,
        "simulation complete"
    );

    if let Some(path) = &config.replay_out {
        write_replay(path, &replay)?;
        info!(path = %path.display(), "replay written");
    }
    Ok(())
}

/// What one battle produced.
struct BattleReport {
    outcome: Option<BattleOutcome>,
    ticks: u32,
    events: Vec<LogEvent>,
}

fn run_battle(
    db: &Database,
    config: &SimConfig,
    seed: u64,
    record: &mut BattleRecord,
) -> Result<BattleReport> {
    let rng = PcgRng::new(seed);
    let mut party = Party::from_system(db)?;
    let mut troop = Troop::new();
    let mut log = TracingLog::new(db);
    let mut engine = BattleEngine::new();
    let mut ticks = 0;
    {
        let mut ctx = BattleContext::new(BattleEnv::new(db, &rng), &mut party, &mut troop)
            .with_log(&mut log)
            .with_system(record);
        engine.setup(&mut ctx, config.troop_id, config.can_escape, config.can_lose)?;
        engine.start_battle(&mut ctx, Encounter::Rolled);

        while engine.is_running() {
            if ticks >= config.max_ticks {
                warn!(ticks, phase = %engine.phase(), "battle stuck, aborting");
                engine.abort();
                // a few ticks let the abort settle
                for _ in 0..3 {
                    engine.update(&mut ctx);
                }
                break;
            }
            if engine.is_input_phase() {
                engine.complete_input_with_auto_battle(&mut ctx);
            } else {
                engine.update(&mut ctx);
            }
            ticks += 1;
        }
    }
    Ok(BattleReport {
        outcome: engine.outcome(),
        ticks,
        events: log.into_events(),
    })
}

fn write_replay(path: &Path, battles: &[Vec<LogEvent>]) -> Result<()> {
    let text = ron::ser::to_string_pretty(battles, ron::ser::PrettyConfig::default())
        .map_err(|e| anyhow::anyhow!("Failed to encode replay: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| anyhow::anyhow!("Failed to write replay {}: {}", path.display(), e))
}
