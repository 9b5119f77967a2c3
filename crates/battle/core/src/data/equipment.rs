use super::ids::{ArmorId, WeaponId};
use super::traits::Trait;

/// Weapon definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponData {
    pub id: WeaponId,
    pub name: String,
    pub wtype_id: u32,
    /// Slot kind; weapons always go into equip type 1.
    #[cfg_attr(feature = "serde", serde(default = "weapon_etype"))]
    pub etype_id: u32,
    /// Flat bonus per base param.
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: [i32; 8],
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub price: i32,
}

#[cfg(feature = "serde")]
fn weapon_etype() -> u32 {
    1
}

impl WeaponData {
    pub fn new(id: u32, name: impl Into<String>, wtype_id: u32) -> Self {
        Self {
            id: WeaponId(id),
            name: name.into(),
            wtype_id,
            etype_id: 1,
            params: [0; 8],
            traits: Vec::new(),
            price: 0,
        }
    }

    pub fn with_params(mut self, params: [i32; 8]) -> Self {
        self.params = params;
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}

/// Armor definition (shields, helmets, body armor, accessories).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArmorData {
    pub id: ArmorId,
    pub name: String,
    pub atype_id: u32,
    pub etype_id: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub params: [i32; 8],
    #[cfg_attr(feature = "serde", serde(default))]
    pub traits: Vec<Trait>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub price: i32,
}

impl ArmorData {
    pub fn new(id: u32, name: impl Into<String>, atype_id: u32, etype_id: u32) -> Self {
        Self {
            id: ArmorId(id),
            name: name.into(),
            atype_id,
            etype_id,
            params: [0; 8],
            traits: Vec::new(),
            price: 0,
        }
    }

    pub fn with_params(mut self, params: [i32; 8]) -> Self {
        self.params = params;
        self
    }

    pub fn with_trait(mut self, t: Trait) -> Self {
        self.traits.push(t);
        self
    }
}

/// Something that occupies an equipment slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipItem {
    Weapon(WeaponId),
    Armor(ArmorId),
}

impl EquipItem {
    pub fn is_weapon(self) -> bool {
        matches!(self, Self::Weapon(_))
    }

    pub fn is_armor(self) -> bool {
        matches!(self, Self::Armor(_))
    }
}
