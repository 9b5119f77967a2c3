//! Typed modifiers contributed by actors, classes, equipment, enemies and states.
//!
//! A battler never stores its derived values. Every query walks the current
//! trait sources and folds the matching traits, either by sum or by product
//! depending on the category.

use bitflags::bitflags;

/// Trait category. Discriminants follow the data file codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr, strum::IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TraitCode {
    // ========================================================================
    // Rates (product, default 1)
    // ========================================================================
    ElementRate = 11,
    DebuffRate = 12,
    StateRate = 13,
    /// Set: the state can never be added.
    StateResist = 14,

    // ========================================================================
    // Parameters
    // ========================================================================
    /// Product per base param.
    Param = 21,
    /// Sum per extended param (hit, eva, ...).
    ExParam = 22,
    /// Product per special param (tgr, grd, ...).
    SpParam = 23,

    // ========================================================================
    // Attack
    // ========================================================================
    AttackElement = 31,
    /// `value` is the chance; summed per state id.
    AttackState = 32,
    AttackSpeed = 33,
    AttackTimes = 34,

    // ========================================================================
    // Skills
    // ========================================================================
    AddSkillType = 41,
    SealSkillType = 42,
    AddSkill = 43,
    SealSkill = 44,

    // ========================================================================
    // Equipment
    // ========================================================================
    EquipWeaponType = 51,
    EquipArmorType = 52,
    LockEquip = 53,
    SealEquip = 54,
    /// Data id 1 enables dual wield.
    SlotType = 55,

    // ========================================================================
    // Other
    // ========================================================================
    /// `value` is the chance of one extra action per turn.
    ActionPlus = 61,
    SpecialFlag = 62,
    CollapseType = 63,
    PartyAbility = 64,
}

/// A single modifier: `(code, data_id, value)`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trait {
    pub code: TraitCode,
    pub data_id: i32,
    pub value: f64,
}

impl Trait {
    pub const fn new(code: TraitCode, data_id: i32, value: f64) -> Self {
        Self {
            code,
            data_id,
            value,
        }
    }
}

/// Data ids of [`TraitCode::SpecialFlag`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u8)]
pub enum SpecialFlag {
    AutoBattle = 0,
    Guard = 1,
    Substitute = 2,
    PreserveTp = 3,
}

bitflags! {
    /// Set of special flags granted by a battler's traits.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SpecialFlags: u8 {
        const AUTO_BATTLE = 1 << 0;
        const GUARD = 1 << 1;
        const SUBSTITUTE = 1 << 2;
        const PRESERVE_TP = 1 << 3;
    }
}

impl SpecialFlags {
    /// Maps a trait data id to its flag. Unknown ids grant nothing.
    pub fn from_data_id(data_id: i32) -> Self {
        match u8::try_from(data_id).ok().and_then(SpecialFlag::from_repr) {
            Some(SpecialFlag::AutoBattle) => Self::AUTO_BATTLE,
            Some(SpecialFlag::Guard) => Self::GUARD,
            Some(SpecialFlag::Substitute) => Self::SUBSTITUTE,
            Some(SpecialFlag::PreserveTp) => Self::PRESERVE_TP,
            None => Self::empty(),
        }
    }
}

/// Data ids of [`TraitCode::PartyAbility`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u8)]
pub enum PartyAbility {
    EncounterHalf = 0,
    EncounterNone = 1,
    CancelSurprise = 2,
    RaisePreemptive = 3,
    GoldDouble = 4,
    DropItemDouble = 5,
}

/// Data ids of [`TraitCode::CollapseType`], selecting the knock-out presentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u8)]
pub enum CollapseEffect {
    #[default]
    Normal = 0,
    Boss = 1,
    Instant = 2,
    NoDisappear = 3,
}
