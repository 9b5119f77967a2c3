//! Shared fixtures for unit tests: a small database with one hero, two
//! enemy kinds and the handful of skills, states and items the tests need.

use crate::data::{
    ActorData, ActorId, AutoRemoval, ClassData, Damage, DamageType, Database, DropItem, DropKind,
    Effect, EffectCode, EnemyAction, EnemyData, EnemyId, HitType, ItemData, ItemId, Restriction,
    Scope, SkillData, SkillId, StateData, StateId, Trait, TraitCode, TroopData, TroopId,
    Usage, WeaponData, WeaponId,
};
use crate::unit::{Party, Troop};

pub const ACTOR_HERO: ActorId = ActorId(1);
pub const ENEMY_SLIME: EnemyId = EnemyId(1);
pub const ENEMY_BAT: EnemyId = EnemyId(2);
pub const STATE_GUARD: StateId = StateId(2);
pub const STATE_POISON: StateId = StateId(3);
pub const STATE_SLEEP: StateId = StateId(4);
pub const SKILL_FIRE: SkillId = SkillId(3);
pub const SKILL_HEAL: SkillId = SkillId(4);
pub const ITEM_POTION: ItemId = ItemId(1);
pub const WEAPON_SWORD: WeaponId = WeaponId(1);
pub const TROOP_SLIME: TroopId = TroopId(1);
pub const TROOP_SLIMES: TroopId = TroopId(2);

fn states() -> Vec<StateData> {
    vec![
        StateData::new(1, "Knockout")
            .with_restriction(Restriction::CannotMove)
            .with_priority(100),
        StateData::new(STATE_GUARD.0, "Guard")
            .with_priority(0)
            .with_auto_removal(AutoRemoval::ActionEnd, 1, 1)
            .removed_at_battle_end()
            .with_trait(Trait::new(TraitCode::SpecialFlag, 1, 0.0)),
        StateData::new(STATE_POISON.0, "Poison")
            .with_priority(50)
            .with_auto_removal(AutoRemoval::TurnEnd, 3, 5)
            .with_trait(Trait::new(TraitCode::ExParam, 7, -0.1)),
        StateData::new(STATE_SLEEP.0, "Sleep")
            .with_restriction(Restriction::CannotMove)
            .with_priority(90)
            .with_auto_removal(AutoRemoval::TurnEnd, 3, 5)
            .removed_at_battle_end()
            .removed_by_damage(100),
    ]
}

fn skills() -> Vec<SkillData> {
    let physical = Usage::new(Scope::OneEnemy, HitType::Physical);
    vec![
        SkillData::new(
            1,
            "Attack",
            physical
                .with_damage(
                    Damage::new(DamageType::HpDamage, "a.atk * 4 - b.def * 2")
                        .with_element(-1)
                        .with_critical(true),
                )
                .with_effect(Effect::new(EffectCode::AddState, 0, 1.0, 0.0))
                .with_tp_gain(10),
        ),
        SkillData::new(
            2,
            "Guard",
            Usage::new(Scope::User, HitType::Certain)
                .with_speed(2000)
                .with_effect(Effect::new(EffectCode::AddState, STATE_GUARD.0 as i32, 1.0, 0.0)),
        ),
        SkillData::new(
            SKILL_FIRE.0,
            "Fire",
            Usage::new(Scope::OneEnemy, HitType::Magical)
                .with_speed(5)
                .with_damage(
                    Damage::new(DamageType::HpDamage, "100 + a.mat * 2 - b.mdf * 2")
                        .with_element(2),
                ),
        )
        .with_costs(5, 0)
        .with_stype(1),
        SkillData::new(
            SKILL_HEAL.0,
            "Heal",
            Usage::new(Scope::OneAlly, HitType::Certain)
                .with_damage(Damage::new(DamageType::HpRecover, "200 + a.mat")),
        )
        .with_costs(5, 0)
        .with_stype(1),
    ]
}

fn enemies() -> Vec<EnemyData> {
    let hit = Trait::new(TraitCode::ExParam, 0, 0.95);
    vec![
        EnemyData::new(ENEMY_SLIME.0, "Slime", [60, 10, 12, 8, 6, 4, 8, 5])
            .with_rewards(10, 5)
            .with_drop(DropItem::new(DropKind::Item(ITEM_POTION), 4))
            .with_action(EnemyAction::new(1, 5))
            .with_action(EnemyAction::new(2, 4))
            .with_trait(hit.clone()),
        EnemyData::new(ENEMY_BAT.0, "Bat", [40, 0, 9, 5, 5, 5, 14, 5])
            .with_rewards(6, 3)
            .with_action(EnemyAction::new(1, 5))
            .with_trait(hit),
    ]
}

pub fn fixture_db() -> Database {
    let mut db = Database::new();
    for state in states() {
        db.states.upsert(state);
    }
    for skill in skills() {
        db.skills.upsert(skill);
    }
    for enemy in enemies() {
        db.enemies.upsert(enemy);
    }
    db.items.upsert(ItemData::new(
        ITEM_POTION.0,
        "Potion",
        Usage::new(Scope::OneAlly, HitType::Certain)
            .with_effect(Effect::new(EffectCode::RecoverHp, 0, 0.0, 500.0)),
    ));
    db.weapons.upsert(
        WeaponData::new(WEAPON_SWORD.0, "Sword", 1).with_params([0, 0, 10, 0, 0, 0, 0, 0]),
    );
    db.classes.upsert(
        ClassData::new(1, "Warrior")
            .with_linear_params(
                [200, 50, 16, 12, 14, 12, 12, 10],
                [20, 5, 2, 2, 2, 2, 2, 1],
                99,
            )
            .with_learning(1, SKILL_FIRE.0)
            .with_learning(3, SKILL_HEAL.0)
            .with_trait(Trait::new(TraitCode::ExParam, 0, 1.0))
            .with_trait(Trait::new(TraitCode::EquipWeaponType, 1, 0.0))
            .with_trait(Trait::new(TraitCode::EquipArmorType, 1, 0.0)),
    );
    db.actors.upsert(ActorData::new(ACTOR_HERO.0, "Hero", 1).with_equips(vec![WEAPON_SWORD.0]));
    db.troops.upsert(TroopData::new(TROOP_SLIME.0, "Slime", &[ENEMY_SLIME.0]));
    db.troops.upsert(TroopData::new(
        TROOP_SLIMES.0,
        "Slime x2",
        &[ENEMY_SLIME.0, ENEMY_SLIME.0],
    ));
    db.system.party_members = vec![ACTOR_HERO];
    db
}

/// The hero alone, carrying three potions.
pub fn fixture_party(db: &Database) -> Party {
    let mut party = Party::new(&db.config);
    party
        .add_actor(db, ACTOR_HERO)
        .expect("fixture hero exists");
    party.gain_item(ITEM_POTION, 3);
    party
}

pub fn fixture_troop(db: &Database, troop_id: TroopId) -> Troop {
    let mut troop = Troop::new();
    troop.setup(db, troop_id).expect("fixture troop exists");
    troop
}
