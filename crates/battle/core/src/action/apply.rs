//! Applying an action to one target.
//!
//! Draw order per application is fixed: hit, evasion, critical, the two
//! variance draws, then one draw per chance-based effect in data order.

use tracing::{debug, trace};

use super::Action;
use crate::battler::{Battler, BattlerId};
use crate::config::BattleConfig;
use crate::context::BattleContext;
use crate::data::{
    DamageType, Database, Effect, EffectCode, SPECIAL_EFFECT_ESCAPE, SkillId, StateId,
};
use crate::hooks::BattleCue;

impl Action {
    /// Whether applying the action to `target` can have any effect at all.
    pub fn test_apply(&self, ctx: &BattleContext<'_>, target: BattlerId) -> bool {
        let db = ctx.db();
        let battler = ctx.battler(target);
        if self.is_for_dead_friend(db) != battler.is_dead() {
            return false;
        }
        ctx.in_battle()
            || self.is_for_opponent(db)
            || (self.is_hp_recover(db) && battler.hp() < battler.mhp(db))
            || (self.is_mp_recover(db) && battler.mp() < battler.mmp(db))
            || self.has_any_valid_effects(db, battler)
    }

    fn has_any_valid_effects(&self, db: &Database, target: &Battler) -> bool {
        self.usage(db).is_some_and(|usage| {
            usage
                .effects
                .iter()
                .any(|effect| test_item_effect(db, target, effect))
        })
    }

    /// Resolves hit, damage and effects against `target`, leaving the outcome
    /// in the target's result.
    ///
    /// Both the subject's and the target's results are cleared first. A miss
    /// is only rolled when the action is usable on the target, and evasion
    /// only when it did not miss. Damage, effects and the subject's TP gain
    /// all require a hit. A zero damage value also clears `critical`.
    ///
    /// The subject's last target index is updated whatever the outcome.
    pub fn apply(&self, ctx: &mut BattleContext<'_>, target: BattlerId) {
        let env = ctx.env;
        let db = env.db;
        ctx.battler_mut(self.subject).clear_result();
        ctx.battler_mut(target).clear_result();

        let used = self.test_apply(ctx, target);
        let (hit, eva) = (
            self.item_hit(db, ctx.battler(self.subject)),
            self.item_eva(db, ctx.battler(target)),
        );
        let missed = used && env.random() >= hit;
        let evaded = !missed && env.random() < eva;
        {
            let result = ctx.battler_mut(target).result_mut();
            result.used = used;
            result.missed = missed;
            result.evaded = evaded;
            result.physical = self.is_physical(db);
            result.drain = self.is_drain(db);
        }

        if ctx.battler(target).result().is_hit() {
            if self.damage_type(db) != DamageType::None {
                let subject = ctx.battler(self.subject);
                let victim = ctx.battler(target);
                let critical = env.random() < self.item_cri(db, subject, victim);
                let value = self.make_damage_value(env, ctx.variables, subject, victim, critical);
                ctx.battler_mut(target).result_mut().critical = critical;
                self.execute_damage(ctx, target, value);
            }
            if let Some(usage) = self.usage(db) {
                for effect in &usage.effects {
                    self.apply_item_effect(ctx, target, effect);
                }
            }
            self.apply_item_user_effect(ctx);
        }
        debug!(
            subject = %self.subject,
            %target,
            used,
            missed,
            evaded,
            "action applied"
        );
        self.update_last_target(ctx, target);
    }

    /// Queues the common events named by the action's effects.
    pub fn apply_global(&self, ctx: &mut BattleContext<'_>) {
        let Some(usage) = self.usage(ctx.db()) else {
            return;
        };
        let events = usage
            .effects
            .iter()
            .filter(|effect| effect.code == EffectCode::CommonEvent)
            .filter_map(|effect| u32::try_from(effect.data_id).ok());
        ctx.reserved_common_events.extend(events);
    }

    fn update_last_target(&self, ctx: &mut BattleContext<'_>, target: BattlerId) {
        if self.subject.is_actor() {
            let index = ctx.unit(target.side()).member_index(target);
            ctx.battler_mut(self.subject).set_last_target(index);
        }
    }

    // ===== effects =====

    fn apply_item_effect(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        trace!(%target, code = <&str>::from(effect.code), "item effect");
        match effect.code {
            EffectCode::RecoverHp => self.effect_recover_hp(ctx, target, effect),
            EffectCode::RecoverMp => self.effect_recover_mp(ctx, target, effect),
            EffectCode::GainTp => effect_gain_tp(ctx, target, effect),
            EffectCode::AddState if effect.data_id == 0 => {
                self.effect_add_attack_state(ctx, target, effect)
            }
            EffectCode::AddState => self.effect_add_normal_state(ctx, target, effect),
            EffectCode::RemoveState => effect_remove_state(ctx, target, effect),
            EffectCode::AddBuff => effect_add_buff(ctx, target, effect),
            EffectCode::AddDebuff => self.effect_add_debuff(ctx, target, effect),
            EffectCode::RemoveBuff => effect_remove_buff(ctx, target, effect, true),
            EffectCode::RemoveDebuff => effect_remove_buff(ctx, target, effect, false),
            EffectCode::Special => effect_special(ctx, target, effect),
            EffectCode::Grow => effect_grow(ctx, target, effect),
            EffectCode::LearnSkill => effect_learn_skill(ctx, target, effect),
            EffectCode::CommonEvent => {}
        }
    }

    /// Scales a recovery amount by the target's recovery rate and, for items,
    /// the subject's pharmacology.
    fn recovery_value(&self, ctx: &BattleContext<'_>, target: &Battler, max: i32, effect: &Effect) -> i32 {
        let db = ctx.db();
        let mut value = (f64::from(max) * effect.value1 + effect.value2) * target.rec(db);
        if self.is_item() {
            value *= ctx.battler(self.subject).pha(db);
        }
        value.floor() as i32
    }

    fn effect_recover_hp(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        let env = ctx.env;
        let battler = ctx.battler(target);
        let value = self.recovery_value(ctx, battler, battler.mhp(env.db), effect);
        if value != 0 {
            let battler = ctx.battler_mut(target);
            battler.gain_hp(&env, value);
            battler.result_mut().success = true;
        }
    }

    fn effect_recover_mp(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        let env = ctx.env;
        let battler = ctx.battler(target);
        let value = self.recovery_value(ctx, battler, battler.mmp(env.db), effect);
        if value != 0 {
            let battler = ctx.battler_mut(target);
            battler.gain_mp(&env, value);
            battler.result_mut().success = true;
        }
    }

    /// `data_id` 0: every attack state of the subject, each rolled separately.
    fn effect_add_attack_state(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        let env = ctx.env;
        let db = env.db;
        let chances: Vec<(StateId, f64)> = {
            let subject = ctx.battler(self.subject);
            let victim = ctx.battler(target);
            let luck = self.luk_effect_rate(db, subject, victim);
            subject
                .attack_states(db)
                .into_iter()
                .map(|state_id| {
                    let chance = effect.value1
                        * victim.state_rate(db, state_id)
                        * subject.attack_states_rate(db, state_id)
                        * luck;
                    (state_id, chance)
                })
                .collect()
        };
        for (state_id, chance) in chances {
            if env.random() < chance {
                let battler = ctx.battler_mut(target);
                battler.add_state(&env, state_id);
                battler.result_mut().success = true;
            }
        }
    }

    /// One roll of `value1`. Unless the action is a certain hit the chance is
    /// scaled by the target's state rate and the luck rate.
    fn effect_add_normal_state(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        let env = ctx.env;
        let db = env.db;
        let Some(state_id) = state_of(effect) else {
            return;
        };
        let mut chance = effect.value1;
        if !self.is_certain_hit(db) {
            let subject = ctx.battler(self.subject);
            let victim = ctx.battler(target);
            chance *= victim.state_rate(db, state_id) * self.luk_effect_rate(db, subject, victim);
        }
        if env.random() < chance {
            let battler = ctx.battler_mut(target);
            battler.add_state(&env, state_id);
            battler.result_mut().success = true;
        }
    }

    /// Debuffs always roll; `value1` is the duration in turns.
    fn effect_add_debuff(&self, ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
        let env = ctx.env;
        let db = env.db;
        let Some(param_id) = param_of(effect) else {
            return;
        };
        let chance = {
            let subject = ctx.battler(self.subject);
            let victim = ctx.battler(target);
            victim.debuff_rate(db, param_id) * self.luk_effect_rate(db, subject, victim)
        };
        if env.random() < chance {
            let battler = ctx.battler_mut(target);
            battler.add_debuff(&env, param_id, effect.value1 as i32);
            battler.result_mut().success = true;
        }
    }

    /// TP the subject gains for landing the action.
    fn apply_item_user_effect(&self, ctx: &mut BattleContext<'_>) {
        let env = ctx.env;
        let tp_gain = self.usage(env.db).map_or(0, |usage| usage.tp_gain);
        let subject = ctx.battler_mut(self.subject);
        let value = (f64::from(tp_gain) * subject.tcr(env.db)).floor() as i32;
        subject.gain_silent_tp(&env, value);
    }
}

/// Whether a single effect would change `target`.
fn test_item_effect(db: &Database, target: &Battler, effect: &Effect) -> bool {
    match effect.code {
        EffectCode::RecoverHp => {
            target.hp() < target.mhp(db) || effect.value1 < 0.0 || effect.value2 < 0.0
        }
        EffectCode::RecoverMp => {
            target.mp() < target.mmp(db) || effect.value1 < 0.0 || effect.value2 < 0.0
        }
        EffectCode::AddState => state_of(effect).is_some_and(|id| !target.is_state_affected(id)),
        EffectCode::RemoveState => state_of(effect).is_some_and(|id| target.is_state_affected(id)),
        EffectCode::AddBuff => param_of(effect).is_some_and(|id| !target.is_max_buff_affected(id)),
        EffectCode::AddDebuff => {
            param_of(effect).is_some_and(|id| !target.is_max_debuff_affected(id))
        }
        EffectCode::RemoveBuff => param_of(effect).is_some_and(|id| target.is_buff_affected(id)),
        EffectCode::RemoveDebuff => {
            param_of(effect).is_some_and(|id| target.is_debuff_affected(id))
        }
        EffectCode::LearnSkill => {
            target.is_actor()
                && u32::try_from(effect.data_id)
                    .is_ok_and(|id| !target.is_learned_skill(SkillId(id)))
        }
        EffectCode::GainTp | EffectCode::Special | EffectCode::Grow | EffectCode::CommonEvent => {
            true
        }
    }
}

fn state_of(effect: &Effect) -> Option<StateId> {
    u32::try_from(effect.data_id).ok().map(StateId)
}

/// Base param index of a buff effect, `None` when out of range.
fn param_of(effect: &Effect) -> Option<usize> {
    usize::try_from(effect.data_id)
        .ok()
        .filter(|&id| id < BattleConfig::PARAM_COUNT)
}

fn effect_gain_tp(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    let env = ctx.env;
    let value = effect.value1.floor() as i32;
    if value != 0 {
        let battler = ctx.battler_mut(target);
        battler.gain_tp(&env, value);
        battler.result_mut().success = true;
    }
}

/// Rolls `value1` as a flat chance; no luck or rate applies.
fn effect_remove_state(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    let env = ctx.env;
    let Some(state_id) = state_of(effect) else {
        return;
    };
    if env.random() < effect.value1 {
        let battler = ctx.battler_mut(target);
        battler.remove_state(&env, state_id);
        battler.result_mut().success = true;
    }
}

fn effect_add_buff(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    let env = ctx.env;
    let Some(param_id) = param_of(effect) else {
        return;
    };
    let battler = ctx.battler_mut(target);
    battler.add_buff(&env, param_id, effect.value1 as i32);
    battler.result_mut().success = true;
}

/// Removes a buff (`buff == true`) or a debuff on the effect's param.
fn effect_remove_buff(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect, buff: bool) {
    let env = ctx.env;
    let Some(param_id) = param_of(effect) else {
        return;
    };
    let battler = ctx.battler_mut(target);
    let affected = if buff {
        battler.is_buff_affected(param_id)
    } else {
        battler.is_debuff_affected(param_id)
    };
    if affected {
        battler.remove_buff(&env, param_id);
        battler.result_mut().success = true;
    }
}

fn effect_special(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    if effect.data_id != SPECIAL_EFFECT_ESCAPE {
        return;
    }
    let in_battle = ctx.in_battle();
    let battler = ctx.battler_mut(target);
    battler.escape(in_battle);
    battler.result_mut().success = true;
    if in_battle {
        ctx.hooks.cue(BattleCue::Escape);
    }
}

fn effect_grow(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    let env = ctx.env;
    let Some(param_id) = param_of(effect) else {
        return;
    };
    let battler = ctx.battler_mut(target);
    battler.add_param(&env, param_id, effect.value1.floor() as i32);
    battler.result_mut().success = true;
}

fn effect_learn_skill(ctx: &mut BattleContext<'_>, target: BattlerId, effect: &Effect) {
    let battler = ctx.battler_mut(target);
    if !battler.is_actor() {
        return;
    }
    if let Ok(skill_id) = u32::try_from(effect.data_id) {
        battler.learn_skill(SkillId(skill_id));
    }
    battler.result_mut().success = true;
}
