//! HP, MP and TP.

use super::Battler;
use crate::context::BattleEnv;
use crate::data::Database;

impl Battler {
    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn mp(&self) -> i32 {
        self.mp
    }

    pub fn tp(&self) -> i32 {
        self.tp
    }

    pub fn max_tp(&self, db: &Database) -> i32 {
        db.config.max_tp
    }

    pub fn hp_rate(&self, db: &Database) -> f64 {
        rate(self.hp, self.mhp(db))
    }

    pub fn mp_rate(&self, db: &Database) -> f64 {
        rate(self.mp, self.mmp(db))
    }

    pub fn tp_rate(&self, db: &Database) -> f64 {
        rate(self.tp, self.max_tp(db))
    }

    pub fn set_hp(&mut self, env: &BattleEnv<'_>, hp: i32) {
        self.hp = hp;
        self.refresh(env);
    }

    pub fn set_mp(&mut self, env: &BattleEnv<'_>, mp: i32) {
        self.mp = mp;
        self.refresh(env);
    }

    pub fn set_tp(&mut self, env: &BattleEnv<'_>, tp: i32) {
        self.tp = tp;
        self.refresh(env);
    }

    /// Clamped TP assignment for callers that hold no environment.
    pub(crate) fn init_tp(&mut self, db: &Database, tp: i32) {
        self.tp = tp.clamp(0, self.max_tp(db));
    }

    /// Adds `value` HP (negative for damage) and records it on the action
    /// result as `hp_damage = -value`. The sum saturates before clamping.
    pub fn gain_hp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.result.hp_damage = value.saturating_neg();
        self.result.hp_affected = true;
        self.set_hp(env, self.hp.saturating_add(value));
    }

    pub fn gain_mp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.result.mp_damage = value.saturating_neg();
        self.set_mp(env, self.mp.saturating_add(value));
    }

    pub fn gain_tp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.result.tp_damage = value.saturating_neg();
        self.set_tp(env, self.tp.saturating_add(value));
    }

    /// TP change that is not reported on the action result.
    pub fn gain_silent_tp(&mut self, env: &BattleEnv<'_>, value: i32) {
        self.set_tp(env, self.tp.saturating_add(value));
    }

    /// TP gained from taking damage; `damage_rate` is damage over max HP.
    pub fn charge_tp_by_damage(&mut self, env: &BattleEnv<'_>, damage_rate: f64) {
        let charge = env.config().tp_charge_by_damage * damage_rate * self.tcr(env.db);
        self.gain_silent_tp(env, charge.floor() as i32);
    }

    /// Full HP and MP, every state removed.
    pub fn recover_all(&mut self, db: &Database) {
        self.clear_states();
        self.hp = self.mhp(db);
        self.mp = self.mmp(db);
    }

    // ===== regeneration =====

    /// Largest HP loss slip damage may cause this turn.
    pub fn max_slip_damage(&self, env: &BattleEnv<'_>) -> i32 {
        if env.config().slip_death {
            self.hp
        } else {
            (self.hp - 1).max(0)
        }
    }

    pub fn regenerate_hp(&mut self, env: &BattleEnv<'_>) {
        let db = env.db;
        let value = (f64::from(self.mhp(db)) * self.hrg(db)).floor() as i32;
        let value = value.max(-self.max_slip_damage(env));
        if value != 0 {
            self.gain_hp(env, value);
        }
    }

    pub fn regenerate_mp(&mut self, env: &BattleEnv<'_>) {
        let db = env.db;
        let value = (f64::from(self.mmp(db)) * self.mrg(db)).floor() as i32;
        if value != 0 {
            self.gain_mp(env, value);
        }
    }

    pub fn regenerate_tp(&mut self, env: &BattleEnv<'_>) {
        let value = (100.0 * self.trg(env.db)).floor() as i32;
        self.gain_silent_tp(env, value);
    }

    pub fn regenerate_all(&mut self, env: &BattleEnv<'_>) {
        if self.is_alive() {
            self.regenerate_hp(env);
            self.regenerate_mp(env);
            self.regenerate_tp(env);
        }
    }
}

fn rate(value: i32, max: i32) -> f64 {
    if max > 0 {
        f64::from(value) / f64::from(max)
    } else {
        0.0
    }
}
