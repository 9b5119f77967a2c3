//! Numeric identifiers into the static data tables.
//!
//! Ids are 1-based; id 0 never resolves and is used by the data files to
//! mean "nothing" (an empty equipment slot, no drop).

macro_rules! data_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u32);

        impl $name {
            /// Returns true for the reserved "nothing" id.
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

data_id!(
    /// Player character definition.
    ActorId
);
data_id!(ClassId);
data_id!(SkillId);
data_id!(ItemId);
data_id!(WeaponId);
data_id!(ArmorId);
data_id!(
    /// Enemy template (not an index into a troop).
    EnemyId
);
data_id!(TroopId);
data_id!(StateId);
