//! Presentation and bookkeeping collaborators.
//!
//! The battle rules never render, play audio or persist anything. They
//! report what happened through three optional hooks:
//!
//! - [`BattleLog`] receives narration events in order and may report itself
//!   busy, which pauses the state machine until it catches up
//! - [`StatusRefresh`] is told when visible battler status changed
//! - [`BattleSystem`] receives audio cues and battle statistics
//!
//! Every hook is optional. A battle with no hooks attached runs headless.

use crate::action::ActionResult;
use crate::battler::BattlerId;

/// Narrative messages shown around the battle itself.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleMessage {
    /// An enemy name appeared at battle start.
    Emerge(String),
    /// The party moves first this turn.
    Preemptive(String),
    /// The troop moves first this turn.
    Surprise(String),
    Victory(String),
    Defeat(String),
    EscapeStart(String),
    EscapeFailure,
    ObtainExp(i32),
    ObtainGold(i32),
    ObtainItem(String),
    LevelUp { name: String, level: i32 },
    ObtainSkill(String),
}

/// One narration step, carrying the display names it needs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogEvent {
    StartTurn {
        turn: i32,
    },
    StartAction {
        subject: BattlerId,
        subject_name: String,
        item_name: String,
        targets: Vec<BattlerId>,
    },
    EndAction {
        subject: BattlerId,
    },
    Counter {
        battler: BattlerId,
        name: String,
    },
    Reflection {
        battler: BattlerId,
        name: String,
    },
    Substitute {
        substitute: BattlerId,
        substitute_name: String,
        target: BattlerId,
        target_name: String,
    },
    /// Outcome of one application on `target`.
    ActionResult {
        subject: BattlerId,
        target: BattlerId,
        target_name: String,
        result: ActionResult,
    },
    /// States and buffs that changed outside an action (expiry).
    AutoAffectedStatus {
        battler: BattlerId,
        name: String,
        result: ActionResult,
    },
    /// States still active on a battler, with their "persist" lines.
    CurrentState {
        battler: BattlerId,
        name: String,
        lines: Vec<String>,
    },
    Regeneration {
        battler: BattlerId,
        name: String,
        result: ActionResult,
    },
    Message(BattleMessage),
}

/// Presentation log.
pub trait BattleLog {
    fn record(&mut self, event: LogEvent);

    /// While true, the state machine does nothing on each tick.
    fn is_busy(&self) -> bool {
        false
    }
}

/// Log that keeps every event, for tests and replays.
#[derive(Clone, Debug, Default)]
pub struct RecordingLog {
    pub events: Vec<LogEvent>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> impl Iterator<Item = &BattleMessage> {
        self.events.iter().filter_map(|event| match event {
            LogEvent::Message(message) => Some(message),
            _ => None,
        })
    }

    /// Drains recorded events, oldest first.
    pub fn take(&mut self) -> Vec<LogEvent> {
        std::mem::take(&mut self.events)
    }
}

impl BattleLog for RecordingLog {
    fn record(&mut self, event: LogEvent) {
        self.events.push(event);
    }
}

/// Notified after battler status changed in a visible way.
pub trait StatusRefresh {
    fn refresh_status(&mut self);
}

/// Fire-and-forget audio cues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleCue {
    Escape,
    VictoryMe,
    DefeatMe,
    ReplayBgm,
    StopBgm,
}

/// System-level bookkeeping and audio.
pub trait BattleSystem {
    fn cue(&mut self, _cue: BattleCue) {}

    fn on_battle_start(&mut self) {}

    fn on_battle_win(&mut self) {}

    fn on_battle_escape(&mut self) {}
}

/// Battle statistics kept across battles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleRecord {
    pub battle_count: u32,
    pub win_count: u32,
    pub escape_count: u32,
    pub cues: Vec<BattleCue>,
}

impl BattleSystem for BattleRecord {
    fn cue(&mut self, cue: BattleCue) {
        self.cues.push(cue);
    }

    fn on_battle_start(&mut self) {
        self.battle_count += 1;
    }

    fn on_battle_win(&mut self) {
        self.win_count += 1;
    }

    fn on_battle_escape(&mut self) {
        self.escape_count += 1;
    }
}

/// Optional collaborators attached to a battle.
#[derive(Default)]
pub struct BattleHooks<'a> {
    pub log: Option<&'a mut dyn BattleLog>,
    pub status: Option<&'a mut dyn StatusRefresh>,
    pub system: Option<&'a mut dyn BattleSystem>,
}

impl<'a> BattleHooks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.log.as_ref().is_some_and(|log| log.is_busy())
    }

    pub fn has_log(&self) -> bool {
        self.log.is_some()
    }

    pub fn record(&mut self, event: LogEvent) {
        if let Some(log) = self.log.as_deref_mut() {
            log.record(event);
        }
    }

    pub fn refresh_status(&mut self) {
        if let Some(status) = self.status.as_deref_mut() {
            status.refresh_status();
        }
    }

    pub fn system(&mut self) -> Option<&mut (dyn BattleSystem + 'a)> {
        self.system.as_deref_mut()
    }

    pub fn cue(&mut self, cue: BattleCue) {
        if let Some(system) = self.system.as_deref_mut() {
            system.cue(cue);
        }
    }
}

impl core::fmt::Debug for BattleHooks<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BattleHooks")
            .field("log", &self.log.is_some())
            .field("status", &self.status.is_some())
            .field("system", &self.system.is_some())
            .finish()
    }
}
