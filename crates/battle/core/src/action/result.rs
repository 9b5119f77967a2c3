use crate::data::StateId;

/// Outcome of the last action applied to a battler.
///
/// Overwritten on every application; the presentation log reads it right
/// after the application that produced it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionResult {
    pub used: bool,
    pub missed: bool,
    pub evaded: bool,
    pub physical: bool,
    pub drain: bool,
    pub critical: bool,
    pub success: bool,
    pub hp_affected: bool,
    pub hp_damage: i32,
    pub mp_damage: i32,
    pub tp_damage: i32,
    pub added_states: Vec<StateId>,
    pub removed_states: Vec<StateId>,
    pub added_buffs: Vec<usize>,
    pub added_debuffs: Vec<usize>,
    pub removed_buffs: Vec<usize>,
}

impl ActionResult {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The action connected: used, neither missed nor evaded.
    pub fn is_hit(&self) -> bool {
        self.used && !self.missed && !self.evaded
    }

    pub fn is_status_affected(&self) -> bool {
        !self.added_states.is_empty()
            || !self.removed_states.is_empty()
            || !self.added_buffs.is_empty()
            || !self.added_debuffs.is_empty()
            || !self.removed_buffs.is_empty()
    }

    pub fn is_state_added(&self, state_id: StateId) -> bool {
        self.added_states.contains(&state_id)
    }

    pub fn push_added_state(&mut self, state_id: StateId) {
        push_unique(&mut self.added_states, state_id);
    }

    pub fn is_state_removed(&self, state_id: StateId) -> bool {
        self.removed_states.contains(&state_id)
    }

    pub fn push_removed_state(&mut self, state_id: StateId) {
        push_unique(&mut self.removed_states, state_id);
    }

    pub fn is_buff_added(&self, param_id: usize) -> bool {
        self.added_buffs.contains(&param_id)
    }

    pub fn push_added_buff(&mut self, param_id: usize) {
        push_unique(&mut self.added_buffs, param_id);
    }

    pub fn is_debuff_added(&self, param_id: usize) -> bool {
        self.added_debuffs.contains(&param_id)
    }

    pub fn push_added_debuff(&mut self, param_id: usize) {
        push_unique(&mut self.added_debuffs, param_id);
    }

    pub fn is_buff_removed(&self, param_id: usize) -> bool {
        self.removed_buffs.contains(&param_id)
    }

    pub fn push_removed_buff(&mut self, param_id: usize) {
        push_unique(&mut self.removed_buffs, param_id);
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_never_hold_duplicates() {
        let mut result = ActionResult::default();
        result.push_added_state(StateId(4));
        result.push_added_state(StateId(4));
        result.push_removed_buff(2);
        result.push_removed_buff(2);
        assert_eq!(result.added_states, vec![StateId(4)]);
        assert_eq!(result.removed_buffs, vec![2]);
        assert!(result.is_status_affected());
        result.clear();
        assert!(!result.is_status_affected());
    }

    #[test]
    fn hit_requires_use_without_miss_or_evasion() {
        let mut result = ActionResult {
            used: true,
            ..ActionResult::default()
        };
        assert!(result.is_hit());
        result.evaded = true;
        assert!(!result.is_hit());
    }
}
