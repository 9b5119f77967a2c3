//! Battle state machine.
//!
//! [`BattleEngine`] owns the session state of one fight (phase, action
//! order, the action in flight and its pending targets). Everything it reads
//! or mutates beyond that is passed in on every call through a
//! [`BattleContext`], so the same engine can be driven headless, from a UI
//! loop or from tests.
//!
//! A session runs:
//!
//! 1. [`BattleEngine::setup`] builds the troop and the escape ratio
//! 2. [`BattleEngine::start_battle`] fires the battle-start hooks and rolls
//!    the encounter
//! 3. [`BattleEngine::update`] is called once per frame until
//!    [`BattleEngine::phase`] returns [`BattlePhase::None`] again
//!
//! While the phase is [`BattlePhase::Input`] the engine waits for commands
//! through the input API in `input.rs`. Turn processing lives in `turn.rs`,
//! the endings (escape, abort, victory, defeat) in `outcome.rs`.

mod errors;
mod input;
mod outcome;
mod turn;

pub use errors::SetupError;
pub use outcome::Rewards;

use std::collections::VecDeque;

use tracing::debug;

use crate::action::{self, Action};
use crate::battler::BattlerId;
use crate::context::BattleContext;
use crate::data::{SkillId, TroopId};
use crate::hooks::{BattleMessage, LogEvent};
use crate::unit::Unit;

/// Where the state machine stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattlePhase {
    /// No battle is running.
    #[default]
    None,
    /// Set up, waiting for [`BattleEngine::start_battle`].
    Init,
    Start,
    /// Waiting for party commands.
    Input,
    Turn,
    /// Resolving the current action target by target.
    Action,
    TurnEnd,
    /// Abort requested; observed on the next tick.
    Aborting,
    /// Outcome decided; the next tick finalises the session.
    BattleEnd,
}

impl BattlePhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Init => "init",
            Self::Start => "start",
            Self::Input => "input",
            Self::Turn => "turn",
            Self::Action => "action",
            Self::TurnEnd => "turn_end",
            Self::Aborting => "aborting",
            Self::BattleEnd => "battle_end",
        }
    }
}

impl core::fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the first turn opens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encounter {
    /// Roll preemptive and surprise chances from the sides' agility.
    #[default]
    Rolled,
    Normal,
    /// The troop skips the first turn.
    Preemptive,
    /// The party skips the first turn.
    Surprise,
}

/// Final result of a battle. The discriminants are the classic result codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BattleOutcome {
    Victory = 0,
    /// Escape, or the battle was aborted.
    Abort = 1,
    Defeat = 2,
}

impl BattleOutcome {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Session state of one battle.
#[derive(Clone, Debug)]
pub struct BattleEngine {
    phase: BattlePhase,
    can_escape: bool,
    can_lose: bool,
    preemptive: bool,
    surprise: bool,
    escaped: bool,
    escape_ratio: f64,
    /// Index into the party's battle members of the actor being commanded.
    actor_index: Option<usize>,
    action_battlers: VecDeque<BattlerId>,
    subject: Option<BattlerId>,
    action: Option<Action>,
    targets: VecDeque<BattlerId>,
    forced_battler: Option<BattlerId>,
    turn_forced: bool,
    rewards: Rewards,
    outcome: Option<BattleOutcome>,
}

impl Default for BattleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleEngine {
    pub fn new() -> Self {
        Self {
            phase: BattlePhase::None,
            can_escape: false,
            can_lose: false,
            preemptive: false,
            surprise: false,
            escaped: false,
            escape_ratio: 0.0,
            actor_index: None,
            action_battlers: VecDeque::new(),
            subject: None,
            action: None,
            targets: VecDeque::new(),
            forced_battler: None,
            turn_forced: false,
            rewards: Rewards::default(),
            outcome: None,
        }
    }

    /// Prepares a battle against `troop_id`.
    ///
    /// The escape ratio starts at `0.5 * party agility / troop agility`.
    pub fn setup(
        &mut self,
        ctx: &mut BattleContext<'_>,
        troop_id: TroopId,
        can_escape: bool,
        can_lose: bool,
    ) -> Result<(), SetupError> {
        if self.is_running() {
            return Err(SetupError::InProgress { phase: self.phase });
        }
        let db = ctx.db();
        ctx.troop.setup(db, troop_id)?;

        *self = Self::new();
        self.phase = BattlePhase::Init;
        self.can_escape = can_escape;
        self.can_lose = can_lose;
        self.escape_ratio = 0.5 * ctx.party.agility(db) / ctx.troop.agility(db);
        debug!(
            troop = troop_id.0,
            can_escape,
            can_lose,
            escape_ratio = self.escape_ratio,
            "battle set up"
        );
        Ok(())
    }

    /// Runs the battle-start hooks on every battler and announces the enemies.
    pub fn start_battle(&mut self, ctx: &mut BattleContext<'_>, encounter: Encounter) {
        self.roll_encounter(ctx, encounter);
        self.phase = BattlePhase::Start;
        if let Some(system) = ctx.hooks.system() {
            system.on_battle_start();
        }
        let env = ctx.env;
        ctx.party.on_battle_start(&env);
        ctx.troop.on_battle_start(&env);
        self.display_start_messages(ctx);
        debug!(
            preemptive = self.preemptive,
            surprise = self.surprise,
            "battle started"
        );
    }

    fn roll_encounter(&mut self, ctx: &BattleContext<'_>, encounter: Encounter) {
        let (preemptive, surprise) = match encounter {
            Encounter::Rolled => {
                let db = ctx.db();
                let troop_agi = ctx.troop.agility(db);
                let preemptive = ctx.env.random() < ctx.party.rate_preemptive(db, troop_agi);
                let surprise = ctx.env.random() < ctx.party.rate_surprise(db, troop_agi);
                (preemptive, surprise && !preemptive)
            }
            Encounter::Normal => (false, false),
            Encounter::Preemptive => (true, false),
            Encounter::Surprise => (false, true),
        };
        self.preemptive = preemptive;
        self.surprise = surprise;
    }

    fn display_start_messages(&self, ctx: &mut BattleContext<'_>) {
        for name in ctx.troop.enemy_names(ctx.db()) {
            ctx.narrate(|_| LogEvent::Message(BattleMessage::Emerge(name)));
        }
        if self.preemptive {
            ctx.narrate(|ctx| {
                LogEvent::Message(BattleMessage::Preemptive(ctx.party.name(ctx.db())))
            });
        } else if self.surprise {
            ctx.narrate(|ctx| LogEvent::Message(BattleMessage::Surprise(ctx.party.name(ctx.db()))));
        }
    }

    // ===== queries =====

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    /// True from setup until the session has been finalised.
    pub fn is_running(&self) -> bool {
        self.phase != BattlePhase::None
    }

    pub fn is_input_phase(&self) -> bool {
        self.phase == BattlePhase::Input
    }

    pub fn can_escape(&self) -> bool {
        self.can_escape
    }

    pub fn can_lose(&self) -> bool {
        self.can_lose
    }

    pub fn is_preemptive(&self) -> bool {
        self.preemptive
    }

    pub fn is_surprise(&self) -> bool {
        self.surprise
    }

    pub fn is_escaped(&self) -> bool {
        self.escaped
    }

    pub fn escape_ratio(&self) -> f64 {
        self.escape_ratio
    }

    /// True while the current turn was opened by a forced action.
    pub fn is_forced_turn(&self) -> bool {
        self.turn_forced
    }

    pub fn is_action_forced(&self) -> bool {
        self.forced_battler.is_some()
    }

    /// Battler whose actions are being processed.
    pub fn subject(&self) -> Option<BattlerId> {
        self.subject
    }

    /// Action being resolved during [`BattlePhase::Action`].
    pub fn current_action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    /// Battlers still waiting to act this turn, in order.
    pub fn action_order(&self) -> impl Iterator<Item = BattlerId> + '_ {
        self.action_battlers.iter().copied()
    }

    pub fn rewards(&self) -> &Rewards {
        &self.rewards
    }

    /// Outcome of the last battle, kept after the session ends.
    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    // ===== driving =====

    /// Advances the battle by one tick. Does nothing while the log is busy.
    pub fn update(&mut self, ctx: &mut BattleContext<'_>) {
        if ctx.hooks.is_busy() || self.update_event(ctx) {
            return;
        }
        match self.phase {
            BattlePhase::Start => self.start_input(ctx),
            BattlePhase::Turn => self.update_turn(ctx),
            BattlePhase::Action => self.update_action(ctx),
            BattlePhase::TurnEnd => self.start_input(ctx),
            BattlePhase::BattleEnd => self.update_battle_end(ctx),
            BattlePhase::None | BattlePhase::Init | BattlePhase::Input | BattlePhase::Aborting => {}
        }
    }

    /// Forced actions and battle-end checks that preempt the phase update.
    fn update_event(&mut self, ctx: &mut BattleContext<'_>) -> bool {
        match self.phase {
            BattlePhase::Start | BattlePhase::Turn | BattlePhase::TurnEnd => {
                if self.is_action_forced() {
                    self.process_forced_action(ctx);
                    return true;
                }
                self.check_battle_end(ctx)
            }
            _ => self.check_abort(ctx),
        }
    }

    /// Requests an abort, honoured on the next tick.
    pub fn abort(&mut self) {
        if self.is_running() && self.phase != BattlePhase::BattleEnd {
            self.phase = BattlePhase::Aborting;
        }
    }

    /// Ends the battle when it is over. Precedence: abort, then defeat, then
    /// victory.
    pub fn check_battle_end(&mut self, ctx: &mut BattleContext<'_>) -> bool {
        if matches!(self.phase, BattlePhase::None | BattlePhase::BattleEnd) {
            return false;
        }
        if self.check_abort(ctx) {
            return true;
        }
        if ctx.party.is_all_dead() {
            self.process_defeat(ctx);
            return true;
        }
        if ctx.troop.is_all_dead() {
            self.process_victory(ctx);
            return true;
        }
        false
    }

    /// Injects a forced skill use that runs before anything else next tick.
    ///
    /// `target_index` is a member index, [`action::TARGET_RANDOM`] or
    /// [`action::TARGET_LAST`].
    pub fn force_action(
        &mut self,
        ctx: &mut BattleContext<'_>,
        id: BattlerId,
        skill_id: SkillId,
        target_index: i32,
    ) {
        action::force_action(ctx, id, skill_id, target_index);
        self.forced_battler = Some(id);
        self.action_battlers.retain(|&queued| queued != id);
        debug!(battler = %id, skill = skill_id.0, target_index, "action forced");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BattleEnv;
    use crate::data::TroopId;
    use crate::hooks::{BattleRecord, RecordingLog};
    use crate::rng::FixedRng;
    use crate::testing::{TROOP_SLIME, TROOP_SLIMES, fixture_db, fixture_party};
    use crate::unit::Troop;

    #[test]
    fn setup_derives_the_escape_ratio_from_agility() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);

        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, true, false).unwrap();
        let expected = 0.5 * ctx.party.agility(&db) / ctx.troop.agility(&db);
        assert_eq!(engine.phase(), BattlePhase::Init);
        assert!((engine.escape_ratio() - expected).abs() < 1e-12);
        assert!(engine.can_escape() && !engine.can_lose());
    }

    #[test]
    fn setup_rejects_unknown_troops_and_running_battles() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);

        let mut engine = BattleEngine::new();
        let err = engine.setup(&mut ctx, TroopId(77), false, false).unwrap_err();
        assert!(matches!(err, SetupError::Troop(_)));
        assert_eq!(engine.phase(), BattlePhase::None);

        engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
        let err = engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap_err();
        assert_eq!(
            err,
            SetupError::InProgress {
                phase: BattlePhase::Init
            }
        );
    }

    #[test]
    fn start_announces_each_enemy_name_once() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut log = RecordingLog::new();
        let mut record = BattleRecord::default();
        {
            let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
                .with_log(&mut log)
                .with_system(&mut record);
            let mut engine = BattleEngine::new();
            engine.setup(&mut ctx, TROOP_SLIMES, false, false).unwrap();
            engine.start_battle(&mut ctx, Encounter::Preemptive);
            assert_eq!(engine.phase(), BattlePhase::Start);
            assert!(ctx.in_battle());
        }
        let messages: Vec<_> = log.messages().cloned().collect();
        assert_eq!(
            messages,
            [
                BattleMessage::Emerge("Slime".into()),
                BattleMessage::Preemptive("Hero".into()),
            ]
        );
        assert_eq!(record.battle_count, 1);
    }

    #[test]
    fn rolled_encounters_never_are_both_preemptive_and_surprise() {
        let db = fixture_db();
        // every roll succeeds: preemptive wins, surprise is suppressed
        let rng = FixedRng(0.0);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Rolled);
        assert!(engine.is_preemptive());
        assert!(!engine.is_surprise());
    }

    #[test]
    fn busy_logs_pause_the_machine() {
        struct Busy(RecordingLog);
        impl crate::hooks::BattleLog for Busy {
            fn record(&mut self, event: LogEvent) {
                self.0.record(event);
            }
            fn is_busy(&self) -> bool {
                true
            }
        }

        let db = fixture_db();
        let rng = FixedRng(0.5);
        let mut party = fixture_party(&db);
        let mut troop = Troop::new();
        let mut log = Busy(RecordingLog::new());
        let mut ctx = BattleContext::new(BattleEnv::new(&db, &rng), &mut party, &mut troop)
            .with_log(&mut log);
        let mut engine = BattleEngine::new();
        engine.setup(&mut ctx, TROOP_SLIME, false, false).unwrap();
        engine.start_battle(&mut ctx, Encounter::Normal);
        for _ in 0..10 {
            engine.update(&mut ctx);
        }
        assert_eq!(engine.phase(), BattlePhase::Start);
    }

    #[test]
    fn outcome_codes_follow_the_classic_numbering() {
        assert_eq!(BattleOutcome::Victory.code(), 0);
        assert_eq!(BattleOutcome::Abort.code(), 1);
        assert_eq!(BattleOutcome::Defeat.code(), 2);
        assert_eq!(BattlePhase::TurnEnd.to_string(), "turn_end");
    }
}
