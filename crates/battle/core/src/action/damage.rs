//! Damage formula evaluation and damage execution.

use tracing::{debug, warn};

use super::Action;
use crate::battler::{Battler, BattlerId, Param};
use crate::context::{BattleContext, BattleEnv, GameVariables};
use crate::data::Database;
use crate::formula::{self, Formula, FormulaScope, Method, Operand, Property};

/// Binds `a`, `b` and `v` for one formula evaluation.
pub struct BattlerScope<'s> {
    pub env: BattleEnv<'s>,
    pub subject: &'s Battler,
    pub target: &'s Battler,
    pub variables: &'s GameVariables,
}

impl BattlerScope<'_> {
    fn operand(&self, operand: Operand) -> &Battler {
        match operand {
            Operand::Subject => self.subject,
            Operand::Target => self.target,
        }
    }
}

impl FormulaScope for BattlerScope<'_> {
    fn property(&self, operand: Operand, property: Property) -> Option<f64> {
        let db = self.env.db;
        let b = self.operand(operand);
        let value = match property {
            Property::Hp => f64::from(b.hp()),
            Property::Mp => f64::from(b.mp()),
            Property::Tp => f64::from(b.tp()),
            Property::Mhp => f64::from(b.mhp(db)),
            Property::Mmp => f64::from(b.mmp(db)),
            Property::Atk => f64::from(b.atk(db)),
            Property::Def => f64::from(b.def(db)),
            Property::Mat => f64::from(b.mat(db)),
            Property::Mdf => f64::from(b.mdf(db)),
            Property::Agi => f64::from(b.agi(db)),
            Property::Luk => f64::from(b.luk(db)),
            Property::Hit => b.hit(db),
            Property::Eva => b.eva(db),
            Property::Cri => b.cri(db),
            Property::Cev => b.cev(db),
            Property::Mev => b.mev(db),
            Property::Mrf => b.mrf(db),
            Property::Cnt => b.cnt(db),
            Property::Hrg => b.hrg(db),
            Property::Mrg => b.mrg(db),
            Property::Trg => b.trg(db),
            Property::Tgr => b.tgr(db),
            Property::Grd => b.grd(db),
            Property::Rec => b.rec(db),
            Property::Pha => b.pha(db),
            Property::Mcr => b.mcr(db),
            Property::Tcr => b.tcr(db),
            Property::Pdr => b.pdr(db),
            Property::Mdr => b.mdr(db),
            Property::Fdr => b.fdr(db),
            Property::Exr => b.exr(db),
            Property::Level => f64::from(b.level()?),
        };
        Some(value)
    }

    fn method(&self, operand: Operand, method: Method, arg: f64) -> Option<f64> {
        let b = self.operand(operand);
        let id = arg as i64;
        let flag = |value: bool| if value { 1.0 } else { 0.0 };
        match method {
            Method::IsStateAffected => {
                let state_id = u32::try_from(id).ok()?;
                Some(flag(b.is_state_affected(crate::data::StateId(state_id))))
            }
            Method::IsBuffAffected => Some(flag(b.is_buff_affected(usize::try_from(id).ok()?))),
            Method::IsDebuffAffected => {
                Some(flag(b.is_debuff_affected(usize::try_from(id).ok()?)))
            }
            Method::Buff => Some(f64::from(b.buff(usize::try_from(id).ok()?))),
            Method::Param => {
                let param = Param::from_index(usize::try_from(id).ok()?)?;
                Some(f64::from(b.param(self.env.db, param)))
            }
        }
    }

    fn variable(&self, index: i32) -> f64 {
        self.variables.value(index)
    }

    fn random(&self) -> f64 {
        self.env.random()
    }
}

impl Action {
    /// `max(formula, 0) * sign`. A formula that fails to parse or evaluate,
    /// or evaluates to an infinity or NaN, yields 0.
    pub fn eval_damage_formula(
        &self,
        env: BattleEnv<'_>,
        variables: &GameVariables,
        subject: &Battler,
        target: &Battler,
    ) -> f64 {
        let Some(usage) = self.usage(env.db) else {
            return 0.0;
        };
        let damage = &usage.damage;
        let scope = BattlerScope {
            env,
            subject,
            target,
            variables,
        };
        let value = Formula::parse(&damage.formula)
            .and_then(|parsed| formula::evaluate(&parsed, &scope));
        match value {
            Ok(value) if value.is_finite() => value.max(0.0) * damage.kind.sign(),
            Ok(value) => {
                debug!(formula = %damage.formula, value, "damage formula is not finite, using 0");
                0.0
            }
            Err(err) => {
                debug!(formula = %damage.formula, %err, "damage formula failed, using 0");
                0.0
            }
        }
    }

    /// Subject attack elements take the best rate; an explicit element uses
    /// the target's rate for it.
    pub fn calc_element_rate(&self, db: &Database, subject: &Battler, target: &Battler) -> f64 {
        let element_id = self.usage(db).map_or(0, |usage| usage.damage.element_id);
        if element_id < 0 {
            subject
                .attack_elements(db)
                .into_iter()
                .map(|id| target.element_rate(db, id))
                .reduce(f64::max)
                .unwrap_or(1.0)
        } else {
            target.element_rate(db, element_id)
        }
    }

    /// Full damage pipeline for one target. Draws two random numbers for the
    /// variance.
    pub fn make_damage_value(
        &self,
        env: BattleEnv<'_>,
        variables: &GameVariables,
        subject: &Battler,
        target: &Battler,
        critical: bool,
    ) -> i32 {
        let db = env.db;
        let Some(usage) = self.usage(db) else {
            return 0;
        };
        let base = self.eval_damage_formula(env, variables, subject, target);
        let mut value = base * self.calc_element_rate(db, subject, target);
        if self.is_physical(db) {
            value *= target.pdr(db);
        }
        if self.is_magical(db) {
            value *= target.mdr(db);
        }
        if base < 0.0 {
            value *= target.rec(db);
        }
        if critical {
            value *= env.config().critical_multiplier;
        }
        value = apply_variance(&env, value, usage.damage.variance);
        value = apply_guard(db, value, target);
        formula::round_half_up(value) as i32
    }

    /// Applies a computed damage value to the target, plus drain to the
    /// subject (or the reflected-from battler).
    pub(super) fn execute_damage(&self, ctx: &mut BattleContext<'_>, target: BattlerId, value: i32) {
        let db = ctx.db();
        if value == 0 {
            ctx.battler_mut(target).result_mut().critical = false;
        }
        if self.is_hp_effect(db) {
            self.execute_hp_damage(ctx, target, value);
        }
        if self.is_mp_effect(db) {
            self.execute_mp_damage(ctx, target, value);
        }
    }

    fn execute_hp_damage(&self, ctx: &mut BattleContext<'_>, target: BattlerId, value: i32) {
        let env = ctx.env;
        let drain = self.is_drain(env.db);
        let battler = ctx.battler_mut(target);
        let value = if drain { value.min(battler.hp()) } else { value };
        battler.result_mut().success = true;
        battler.gain_hp(&env, value.saturating_neg());
        if value > 0 {
            battler.on_damage(&env, value);
        }
        debug!(%target, value, hp = battler.hp(), "hp damage");
        if drain {
            let receiver = self.reflection_target.unwrap_or(self.subject);
            ctx.battler_mut(receiver).gain_hp(&env, value);
        }
    }

    fn execute_mp_damage(&self, ctx: &mut BattleContext<'_>, target: BattlerId, value: i32) {
        let env = ctx.env;
        let drain = self.is_drain(env.db);
        let recover = self.is_mp_recover(env.db);
        let battler = ctx.battler_mut(target);
        let value = if recover { value } else { value.min(battler.mp()) };
        if value != 0 {
            battler.result_mut().success = true;
        }
        battler.gain_mp(&env, value.saturating_neg());
        debug!(%target, value, mp = battler.mp(), "mp damage");
        if drain {
            let receiver = self.reflection_target.unwrap_or(self.subject);
            ctx.battler_mut(receiver).gain_mp(&env, value);
        }
    }
}

/// Triangular jitter of up to `variance` percent in either direction.
fn apply_variance(env: &BattleEnv<'_>, damage: f64, variance: i32) -> f64 {
    let amp = (damage.abs() * f64::from(variance) / 100.0).max(0.0).floor() as i32;
    let spread = amp.saturating_add(1);
    let v = f64::from(env.random_int(spread)) + f64::from(env.random_int(spread)) - f64::from(amp);
    if damage >= 0.0 { damage + v } else { damage - v }
}

/// Guarding halves positive damage (scaled by the guard effect rate).
fn apply_guard(db: &Database, damage: f64, target: &Battler) -> f64 {
    if damage > 0.0 && target.is_guard(db) {
        let grd = target.grd(db);
        if grd > 0.0 {
            return damage / (2.0 * grd);
        }
        warn!(target = %target.id(), "guard effect rate is zero, guard ignored");
    }
    damage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Damage, DamageType, HitType, Scope, SkillData, Usage};
    use crate::rng::{FixedRng, ScriptedRng};
    use crate::testing::{ACTOR_HERO, ENEMY_SLIME, fixture_db};

    fn flat_skill(id: u32, formula: &str, variance: i32) -> SkillData {
        typed_skill(id, DamageType::HpDamage, formula, variance)
    }

    fn typed_skill(id: u32, kind: DamageType, formula: &str, variance: i32) -> SkillData {
        SkillData::new(
            id,
            "Flat",
            Usage::new(Scope::OneEnemy, HitType::Certain)
                .with_damage(Damage::new(kind, formula).with_variance(variance)),
        )
    }

    #[test]
    fn zero_variance_returns_rounded_formula() {
        let mut db = fixture_db();
        db.skills.upsert(flat_skill(90, "a.atk * 1.5 + 0.5", 0));
        let rng = FixedRng(0.99);
        let env = BattleEnv::new(&db, &rng);
        let variables = GameVariables::new();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        let mut action = Action::new(hero.id(), false);
        action.set_skill(crate::data::SkillId(90));

        let expected = formula::round_half_up(f64::from(hero.atk(&db)) * 1.5 + 0.5) as i32;
        assert_eq!(action.make_damage_value(env, &variables, &hero, &slime, false), expected);
    }

    #[test]
    fn broken_formula_deals_nothing() {
        let mut db = fixture_db();
        db.skills.upsert(flat_skill(91, "a.atk * (", 0));
        db.skills.upsert(flat_skill(92, "a.nonsense", 0));
        db.skills.upsert(flat_skill(93, "0 / 0", 0));
        db.skills.upsert(flat_skill(95, "1 / 0", 20));
        db.skills.upsert(typed_skill(96, DamageType::HpRecover, "1 / 0", 20));
        db.skills.upsert(typed_skill(97, DamageType::MpDamage, "-1 / 0", 0));
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let variables = GameVariables::new();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        for id in [91, 92, 93, 95, 96, 97] {
            let mut action = Action::new(hero.id(), false);
            action.set_skill(crate::data::SkillId(id));
            assert_eq!(action.make_damage_value(env, &variables, &hero, &slime, false), 0);
        }
    }

    #[test]
    fn huge_damage_saturates_through_variance() {
        let mut db = fixture_db();
        db.skills.upsert(flat_skill(98, "1000000000 * 1000000000 * 1000000000", 20));
        let rng = FixedRng(0.99);
        let env = BattleEnv::new(&db, &rng);
        let variables = GameVariables::new();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        let mut action = Action::new(hero.id(), false);
        action.set_skill(crate::data::SkillId(98));
        assert_eq!(action.make_damage_value(env, &variables, &hero, &slime, false), i32::MAX);
    }

    #[test]
    fn variance_is_symmetric_around_the_value() {
        // amp = 10 at 10%: both draws 0 give -10, both draws 10 give +10
        let low = ScriptedRng::new([0.0, 0.0], 0.0);
        let db = fixture_db();
        let env = BattleEnv::new(&db, &low);
        assert_eq!(apply_variance(&env, 100.0, 10), 90.0);
        let high = ScriptedRng::new([0.99, 0.99], 0.0);
        let env = BattleEnv::new(&db, &high);
        assert_eq!(apply_variance(&env, 100.0, 10), 110.0);
        let env = BattleEnv::new(&db, &high);
        assert_eq!(apply_variance(&env, -100.0, 10), -110.0);
    }

    #[test]
    fn critical_triples_damage() {
        let mut db = fixture_db();
        db.skills.upsert(flat_skill(94, "20", 0));
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let variables = GameVariables::new();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        let mut action = Action::new(hero.id(), false);
        action.set_skill(crate::data::SkillId(94));
        assert_eq!(action.make_damage_value(env, &variables, &hero, &slime, true), 60);
    }
}
