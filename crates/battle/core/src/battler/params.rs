//! Base, extended and special parameters.

use super::{Battler, BattlerKind};
use crate::context::BattleEnv;
use crate::data::{Database, TraitCode};
use crate::formula::round_half_up;

/// Base params, in data order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Param {
    Mhp = 0,
    Mmp = 1,
    Atk = 2,
    Def = 3,
    Mat = 4,
    Mdf = 5,
    Agi = 6,
    Luk = 7,
}

impl Param {
    pub const ALL: [Param; 8] = [
        Self::Mhp,
        Self::Mmp,
        Self::Atk,
        Self::Def,
        Self::Mat,
        Self::Mdf,
        Self::Agi,
        Self::Luk,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }
}

/// Extended params: rates summed over traits (default 0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u8)]
pub enum ExParam {
    Hit = 0,
    Eva = 1,
    Cri = 2,
    Cev = 3,
    Mev = 4,
    Mrf = 5,
    Cnt = 6,
    /// HP regeneration per turn, as a rate of MHP.
    Hrg = 7,
    Mrg = 8,
    Trg = 9,
}

/// Special params: rates multiplied over traits (default 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u8)]
pub enum SpParam {
    /// Target rate: weight when picked as a random target.
    Tgr = 0,
    /// Guard effect.
    Grd = 1,
    /// Recovery effect.
    Rec = 2,
    /// Pharmacology: item recovery bonus.
    Pha = 3,
    Mcr = 4,
    Tcr = 5,
    Pdr = 6,
    Mdr = 7,
    Fdr = 8,
    Exr = 9,
}

const ACTOR_MHP_MAX: i32 = 9999;
const ENEMY_MHP_MAX: i32 = 999_999;
const MMP_MAX: i32 = 9999;
const PARAM_MAX: i32 = 999;

impl Battler {
    /// Unmodified param from the class curve or the enemy template.
    pub fn param_base(&self, db: &Database, param_id: usize) -> i32 {
        match &self.kind {
            BattlerKind::Actor(profile) => db
                .class(profile.class_id)
                .map(|class| class.param_at(param_id, profile.level))
                .unwrap_or(0),
            BattlerKind::Enemy(profile) => db
                .enemy(profile.enemy_id)
                .and_then(|enemy| enemy.params.get(param_id).copied())
                .unwrap_or(0),
        }
    }

    /// Permanent growth plus equipment bonuses.
    pub fn param_plus(&self, db: &Database, param_id: usize) -> i32 {
        let growth = self.param_plus.get(param_id).copied().unwrap_or(0);
        let equips: i32 = match &self.kind {
            BattlerKind::Actor(profile) => profile
                .equips
                .iter()
                .flatten()
                .map(|&item| db.equip_params(item).get(param_id).copied().unwrap_or(0))
                .sum(),
            BattlerKind::Enemy(_) => 0,
        };
        growth + equips
    }

    pub fn param_min(&self, param_id: usize) -> i32 {
        if param_id == Param::Mmp.index() { 0 } else { 1 }
    }

    pub fn param_max(&self, param_id: usize) -> i32 {
        match param_id {
            0 if self.is_actor() => ACTOR_MHP_MAX,
            0 => ENEMY_MHP_MAX,
            1 => MMP_MAX,
            _ => PARAM_MAX,
        }
    }

    pub fn param_rate(&self, db: &Database, param_id: usize) -> f64 {
        self.traits_pi(db, TraitCode::Param, param_id as i32)
    }

    pub fn param_buff_rate(&self, param_id: usize) -> f64 {
        f64::from(self.buff(param_id)) * 0.25 + 1.0
    }

    /// `round(clamp((base + plus) * rate * buff_rate, min, max))`
    pub fn param_by_index(&self, db: &Database, param_id: usize) -> i32 {
        let base = f64::from(self.param_base(db, param_id) + self.param_plus(db, param_id));
        let value = base * self.param_rate(db, param_id) * self.param_buff_rate(param_id);
        let min = f64::from(self.param_min(param_id));
        let max = f64::from(self.param_max(param_id));
        round_half_up(value.clamp(min, max)) as i32
    }

    pub fn param(&self, db: &Database, param: Param) -> i32 {
        self.param_by_index(db, param.index())
    }

    pub fn xparam(&self, db: &Database, param: ExParam) -> f64 {
        self.traits_sum(db, TraitCode::ExParam, param as i32)
    }

    pub fn sparam(&self, db: &Database, param: SpParam) -> f64 {
        self.traits_pi(db, TraitCode::SpParam, param as i32)
    }

    /// Permanent param growth (the "grow" item effect).
    pub fn add_param(&mut self, env: &BattleEnv<'_>, param_id: usize, value: i32) {
        if let Some(plus) = self.param_plus.get_mut(param_id) {
            *plus += value;
            self.refresh(env);
        }
    }

    pub fn mhp(&self, db: &Database) -> i32 {
        self.param(db, Param::Mhp)
    }

    pub fn mmp(&self, db: &Database) -> i32 {
        self.param(db, Param::Mmp)
    }

    pub fn atk(&self, db: &Database) -> i32 {
        self.param(db, Param::Atk)
    }

    pub fn def(&self, db: &Database) -> i32 {
        self.param(db, Param::Def)
    }

    pub fn mat(&self, db: &Database) -> i32 {
        self.param(db, Param::Mat)
    }

    pub fn mdf(&self, db: &Database) -> i32 {
        self.param(db, Param::Mdf)
    }

    pub fn agi(&self, db: &Database) -> i32 {
        self.param(db, Param::Agi)
    }

    pub fn luk(&self, db: &Database) -> i32 {
        self.param(db, Param::Luk)
    }

    pub fn hit(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Hit)
    }

    pub fn eva(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Eva)
    }

    pub fn cri(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Cri)
    }

    pub fn cev(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Cev)
    }

    pub fn mev(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Mev)
    }

    pub fn mrf(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Mrf)
    }

    pub fn cnt(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Cnt)
    }

    pub fn hrg(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Hrg)
    }

    pub fn mrg(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Mrg)
    }

    pub fn trg(&self, db: &Database) -> f64 {
        self.xparam(db, ExParam::Trg)
    }

    pub fn tgr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Tgr)
    }

    pub fn grd(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Grd)
    }

    pub fn rec(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Rec)
    }

    pub fn pha(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Pha)
    }

    pub fn mcr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Mcr)
    }

    pub fn tcr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Tcr)
    }

    pub fn pdr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Pdr)
    }

    pub fn mdr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Mdr)
    }

    pub fn fdr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Fdr)
    }

    pub fn exr(&self, db: &Database) -> f64 {
        self.sparam(db, SpParam::Exr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{StateData, Trait};
    use crate::rng::FixedRng;
    use crate::testing::{ACTOR_HERO, ENEMY_SLIME, fixture_db};

    #[test]
    fn params_stay_within_bounds() {
        let mut db = fixture_db();
        // x1000 attack, x0 defense
        db.states.upsert(
            StateData::new(20, "Berserk")
                .with_trait(Trait::new(TraitCode::Param, 2, 1000.0))
                .with_trait(Trait::new(TraitCode::Param, 3, 0.0))
                .with_trait(Trait::new(TraitCode::Param, 1, 0.0)),
        );
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        hero.add_state(&env, crate::data::StateId(20));

        assert_eq!(hero.atk(&db), 999);
        assert_eq!(hero.def(&db), 1);
        assert_eq!(hero.mmp(&db), 0);
        for id in 0..8 {
            let value = hero.param_by_index(&db, id);
            assert!(value >= hero.param_min(id) && value <= hero.param_max(id));
        }
    }

    #[test]
    fn buffs_scale_by_quarter_steps() {
        let db = fixture_db();
        let rng = FixedRng(0.0);
        let env = BattleEnv::new(&db, &rng);
        let mut slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        let base = slime.atk(&db);
        slime.add_buff(&env, Param::Atk.index(), 3);
        assert_eq!(slime.atk(&db), round_half_up(f64::from(base) * 1.25) as i32);
        slime.add_debuff(&env, Param::Atk.index(), 3);
        slime.add_debuff(&env, Param::Atk.index(), 3);
        assert_eq!(slime.atk(&db), round_half_up(f64::from(base) * 0.75) as i32);
    }

    #[test]
    fn actor_mhp_caps_lower_than_enemy() {
        let db = fixture_db();
        let hero = Battler::new_actor(&db, ACTOR_HERO).unwrap();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        assert_eq!(hero.param_max(0), 9999);
        assert_eq!(slime.param_max(0), 999_999);
        assert_eq!(slime.param_max(1), 9999);
        assert_eq!(slime.param_min(1), 0);
    }

    #[test]
    fn neutral_rates_without_traits() {
        let db = fixture_db();
        let slime = Battler::new_enemy(&db, ENEMY_SLIME, 0).unwrap();
        assert_eq!(slime.rec(&db), 1.0);
        assert_eq!(slime.cnt(&db), 0.0);
    }
}
