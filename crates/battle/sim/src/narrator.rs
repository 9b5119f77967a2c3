//! Battle narration through `tracing`.

use battle_core::{ActionResult, BattleLog, BattleMessage, Database, LogEvent, StateId};
use tracing::{debug, info};

/// Writes every event as a log line and keeps it for the replay file.
pub struct TracingLog<'d> {
    db: &'d Database,
    events: Vec<LogEvent>,
}

impl<'d> TracingLog<'d> {
    pub fn new(db: &'d Database) -> Self {
        Self {
            db,
            events: Vec::new(),
        }
    }

    pub fn into_events(self) -> Vec<LogEvent> {
        self.events
    }

    fn state_names(&self, ids: &[StateId]) -> String {
        ids.iter()
            .map(|&id| self.db.state(id).map_or("?", |s| s.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn narrate_result(&self, name: &str, result: &ActionResult) {
        if result.missed {
            info!("{name} was missed");
            return;
        }
        if result.evaded {
            info!("{name} evaded");
            return;
        }
        if result.critical {
            info!("critical hit!");
        }
        if result.hp_affected {
            if result.hp_damage >= 0 {
                info!("{name} takes {} damage", result.hp_damage);
            } else {
                info!("{name} recovers {} HP", -result.hp_damage);
            }
        }
        if result.mp_damage != 0 {
            info!("{name} MP {:+}", -result.mp_damage);
        }
        if !result.added_states.is_empty() {
            info!("{name} gains {}", self.state_names(&result.added_states));
        }
        if !result.removed_states.is_empty() {
            info!("{name} loses {}", self.state_names(&result.removed_states));
        }
        if !result.success && !result.hp_affected {
            debug!("{name} is unaffected");
        }
    }
}

impl BattleLog for TracingLog<'_> {
    fn record(&mut self, event: LogEvent) {
        match &event {
            LogEvent::StartTurn { turn } => info!("--- turn {turn} ---"),
            LogEvent::StartAction {
                subject_name,
                item_name,
                ..
            } => info!("{subject_name} uses {item_name}"),
            LogEvent::EndAction { subject } => debug!(%subject, "action ended"),
            LogEvent::Counter { name, .. } => info!("{name} counterattacks"),
            LogEvent::Reflection { name, .. } => info!("{name} reflects the spell"),
            LogEvent::Substitute {
                substitute_name,
                target_name,
                ..
            } => info!("{substitute_name} protects {target_name}"),
            LogEvent::ActionResult {
                target_name,
                result,
                ..
            }
            | LogEvent::AutoAffectedStatus {
                name: target_name,
                result,
                ..
            }
            | LogEvent::Regeneration {
                name: target_name,
                result,
                ..
            } => self.narrate_result(target_name, result),
            LogEvent::CurrentState { name, lines, .. } => {
                for line in lines {
                    info!("{name}{line}");
                }
            }
            LogEvent::Message(message) => narrate_message(message),
        }
        self.events.push(event);
    }
}

fn narrate_message(message: &BattleMessage) {
    match message {
        BattleMessage::Emerge(name) => info!("{name} appears!"),
        BattleMessage::Preemptive(party) => info!("{party} got the upper hand!"),
        BattleMessage::Surprise(party) => info!("{party} was surprised!"),
        BattleMessage::Victory(party) => info!("{party} is victorious!"),
        BattleMessage::Defeat(party) => info!("{party} was defeated."),
        BattleMessage::EscapeStart(party) => info!("{party} tries to run..."),
        BattleMessage::EscapeFailure => info!("...but could not escape!"),
        BattleMessage::ObtainExp(exp) => info!("gained {exp} EXP"),
        BattleMessage::ObtainGold(gold) => info!("found {gold} gold"),
        BattleMessage::ObtainItem(item) => info!("found {item}"),
        BattleMessage::LevelUp { name, level } => info!("{name} reached level {level}!"),
        BattleMessage::ObtainSkill(skill) => info!("learned {skill}!"),
    }
}
