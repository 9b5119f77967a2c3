//! Small game used by the integration tests: a sturdy hero, a one-hit wisp,
//! an ogre that takes a few rounds to bring down, and two enemies that turn
//! the hero's actions back on them.
#![allow(dead_code)]

use battle_core::data::{
    ActorData, ActorId, ClassData, Damage, DamageType, Database, Effect, EffectCode, EnemyAction,
    EnemyData, HitType, ItemData, Restriction, Scope, SkillData, StateData, StateId, Trait,
    TraitCode, TroopData, TroopId, Usage,
};
use battle_core::{BattlerId, Party, Troop};

pub const HERO: BattlerId = BattlerId::Actor(ActorId(1));
pub const TROOP_WISP: TroopId = TroopId(1);
pub const TROOP_OGRE: TroopId = TroopId(2);
/// Always counters physical attacks.
pub const TROOP_PORCUPINE: TroopId = TroopId(3);
/// Always reflects magic.
pub const TROOP_MIRROR: TroopId = TroopId(4);
pub const STATE_CURSE: StateId = StateId(10);
pub const SKILL_DRAIN: u32 = 3;
pub const SKILL_HEX: u32 = 4;
pub const SKILL_SIPHON: u32 = 5;
pub const ITEM_CHARM: u32 = 1;

pub fn database() -> Database {
    let mut db = Database::new();
    db.states.upsert(
        StateData::new(1, "Knockout")
            .with_restriction(Restriction::CannotMove)
            .with_priority(100),
    );
    db.states.upsert(StateData::new(STATE_CURSE.0, "Curse").with_priority(40));

    db.skills.upsert(SkillData::new(
        1,
        "Attack",
        Usage::new(Scope::OneEnemy, HitType::Physical).with_damage(
            Damage::new(DamageType::HpDamage, "a.atk * 4 - b.def * 2").with_element(-1),
        ),
    ));
    db.skills.upsert(SkillData::new(2, "Guard", Usage::new(Scope::User, HitType::Certain)));
    db.skills.upsert(SkillData::new(
        SKILL_DRAIN,
        "Drain",
        Usage::new(Scope::OneEnemy, HitType::Certain)
            .with_damage(Damage::new(DamageType::HpDrain, "50").with_variance(0)),
    ));
    db.skills.upsert(SkillData::new(
        SKILL_HEX,
        "Hex",
        Usage::new(Scope::OneEnemy, HitType::Magical).with_effect(Effect::new(
            EffectCode::AddState,
            STATE_CURSE.0 as i32,
            0.5,
            0.0,
        )),
    ));
    db.skills.upsert(SkillData::new(
        SKILL_SIPHON,
        "Siphon",
        Usage::new(Scope::OneEnemy, HitType::Magical)
            .with_damage(Damage::new(DamageType::HpDrain, "50").with_variance(0)),
    ));
    let curse = Effect::new(EffectCode::AddState, STATE_CURSE.0 as i32, 1.0, 0.0);
    db.items.upsert(ItemData::new(
        ITEM_CHARM,
        "Curse Charm",
        Usage::new(Scope::OneEnemy, HitType::Certain)
            .with_effect(curse.clone())
            .with_effect(curse),
    ));

    let hit = Trait::new(TraitCode::ExParam, 0, 1.0);
    db.enemies.upsert(
        EnemyData::new(1, "Wisp", [1, 0, 5, 0, 5, 0, 5, 0])
            .with_rewards(3, 2)
            .with_action(EnemyAction::new(1, 5))
            .with_trait(hit.clone()),
    );
    db.enemies.upsert(
        EnemyData::new(2, "Ogre", [300, 0, 20, 10, 5, 0, 5, 0])
            .with_rewards(40, 25)
            .with_action(EnemyAction::new(1, 5))
            .with_trait(hit.clone()),
    );
    db.enemies.upsert(
        EnemyData::new(3, "Porcupine", [200, 0, 30, 10, 5, 0, 5, 0])
            .with_action(EnemyAction::new(1, 5))
            .with_trait(hit.clone())
            .with_trait(Trait::new(TraitCode::ExParam, 6, 1.0)),
    );
    db.enemies.upsert(
        EnemyData::new(4, "Mirror Knight", [400, 0, 10, 10, 5, 0, 5, 0])
            .with_action(EnemyAction::new(1, 5))
            .with_trait(hit.clone())
            .with_trait(Trait::new(TraitCode::ExParam, 5, 1.0)),
    );
    db.troops.upsert(TroopData::new(TROOP_WISP.0, "Wisp", &[1]));
    db.troops.upsert(TroopData::new(TROOP_OGRE.0, "Ogre", &[2]));
    db.troops.upsert(TroopData::new(TROOP_PORCUPINE.0, "Porcupine", &[3]));
    db.troops.upsert(TroopData::new(TROOP_MIRROR.0, "Mirror Knight", &[4]));

    db.classes.upsert(
        ClassData::new(1, "Knight")
            .with_flat_params([1000, 100, 30, 20, 20, 20, 5, 10], 99)
            .with_trait(hit),
    );
    db.actors.upsert(ActorData::new(1, "Hero", 1));
    db.system.party_members = vec![ActorId(1)];
    db
}

pub fn party(db: &Database) -> Party {
    Party::from_system(db).expect("hero is defined")
}

pub fn troop() -> Troop {
    Troop::new()
}
