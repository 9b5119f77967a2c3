use super::ids::ActorId;

/// Global names and settings of the game database.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SystemData {
    pub game_title: String,
    pub currency_unit: String,
    /// Index = element id; index 0 is unused.
    pub elements: Vec<String>,
    pub skill_types: Vec<String>,
    pub weapon_types: Vec<String>,
    pub armor_types: Vec<String>,
    /// Index = equip type id; type 1 is the weapon slot.
    pub equip_types: Vec<String>,
    /// Skill types treated as "magic" for presentation.
    pub magic_skill_types: Vec<u32>,
    /// Roster at game start.
    pub party_members: Vec<ActorId>,
}

impl Default for SystemData {
    fn default() -> Self {
        Self {
            game_title: String::new(),
            currency_unit: String::from("G"),
            elements: vec![String::new(), String::from("Physical")],
            skill_types: vec![String::new(), String::from("Magic"), String::from("Special")],
            weapon_types: vec![String::new(), String::from("Sword")],
            armor_types: vec![String::new(), String::from("Shield")],
            equip_types: vec![
                String::new(),
                String::from("Weapon"),
                String::from("Shield"),
                String::from("Head"),
                String::from("Body"),
                String::from("Accessory"),
            ],
            magic_skill_types: vec![1],
            party_members: Vec::new(),
        }
    }
}

impl SystemData {
    /// Equip type per slot, excluding the unused index 0.
    pub fn equip_slots(&self) -> Vec<u32> {
        (1..self.equip_types.len())
            .filter_map(|i| u32::try_from(i).ok())
            .collect()
    }

    pub fn is_magic_skill_type(&self, stype_id: u32) -> bool {
        self.magic_skill_types.contains(&stype_id)
    }
}
