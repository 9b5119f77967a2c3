//! Simulator settings read from the environment.

use std::env;
use std::path::PathBuf;

use battle_core::data::TroopId;

/// Settings for one simulator run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Content directory. `None` uses the bundled sample game.
    pub data_dir: Option<PathBuf>,
    pub troop_id: TroopId,
    /// Seed for the first battle; later battles add their index.
    pub seed: u64,
    pub battles: u32,
    pub can_escape: bool,
    pub can_lose: bool,
    /// Ticks after which a battle is aborted as stuck.
    pub max_ticks: u32,
    /// Where to write the recorded events as RON.
    pub replay_out: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            troop_id: TroopId(1),
            seed: 1,
            battles: 1,
            can_escape: true,
            can_lose: false,
            max_ticks: 10_000,
            replay_out: None,
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.data_dir = env::var("BATTLE_DATA_DIR").ok().map(PathBuf::from);

        if let Some(id) = read_env::<u32>("BATTLE_TROOP_ID") {
            config.troop_id = TroopId(id);
        }
        if let Some(seed) = read_env::<u64>("BATTLE_SEED") {
            config.seed = seed;
        }
        if let Some(battles) = read_env::<u32>("BATTLE_COUNT") {
            config.battles = battles.max(1);
        }
        if let Some(can_escape) = read_env::<bool>("BATTLE_CAN_ESCAPE") {
            config.can_escape = can_escape;
        }
        if let Some(can_lose) = read_env::<bool>("BATTLE_CAN_LOSE") {
            config.can_lose = can_lose;
        }
        if let Some(max_ticks) = read_env::<u32>("BATTLE_MAX_TICKS") {
            config.max_ticks = max_ticks.max(1);
        }

        config.replay_out = env::var("BATTLE_REPLAY_OUT").ok().map(PathBuf::from);

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
