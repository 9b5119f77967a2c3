//! Target resolution.

use tracing::debug;

use super::Action;
use crate::battler::BattlerId;
use crate::context::BattleContext;
use crate::unit::Unit;

impl Action {
    /// Resolves the ordered target list, each target repeated
    /// [`Action::number_of_repeats`] times in a row.
    pub fn make_targets(&self, ctx: &BattleContext<'_>) -> Vec<BattlerId> {
        let db = ctx.db();
        let subject = ctx.battler(self.subject);
        let targets = if !self.forcing && subject.is_confused(db) {
            vec![self.confusion_target(ctx)]
        } else if self.is_for_opponent(db) {
            self.targets_for_opponents(ctx)
        } else if self.is_for_friend(db) {
            self.targets_for_friends(ctx)
        } else {
            Vec::new()
        };
        let repeats = self.number_of_repeats(db, subject);
        let targets = repeat_targets(targets, repeats);
        debug!(subject = %self.subject, targets = ?targets, "targets resolved");
        targets
    }

    fn confusion_target(&self, ctx: &BattleContext<'_>) -> Option<BattlerId> {
        let env = &ctx.env;
        let opponents = ctx.opponents_unit(self.subject);
        let friends = ctx.friends_unit(self.subject);
        match ctx.battler(self.subject).confusion_level(ctx.db()) {
            1 => opponents.random_target(env),
            2 if env.random_int(2) == 0 => opponents.random_target(env),
            2 | 3 => friends.random_target(env),
            _ => None,
        }
    }

    fn targets_for_opponents(&self, ctx: &BattleContext<'_>) -> Vec<Option<BattlerId>> {
        let db = ctx.db();
        let unit = ctx.opponents_unit(self.subject);
        let scope = self.scope(db);
        if scope.is_for_random() {
            (0..scope.num_targets())
                .map(|_| unit.random_target(&ctx.env))
                .collect()
        } else if scope.is_for_one() {
            vec![self.single_target(ctx, unit)]
        } else {
            unit.alive_members().iter().map(|b| Some(b.id())).collect()
        }
    }

    fn targets_for_friends(&self, ctx: &BattleContext<'_>) -> Vec<Option<BattlerId>> {
        let db = ctx.db();
        let unit = ctx.friends_unit(self.subject);
        let scope = self.scope(db);
        if scope.is_for_user() {
            vec![Some(self.subject)]
        } else if scope.is_for_dead_friend() {
            if scope.is_for_one() {
                vec![unit.smooth_dead_target(self.target_index)]
            } else {
                unit.dead_members().iter().map(|b| Some(b.id())).collect()
            }
        } else if scope.is_for_one() {
            vec![self.single_target(ctx, unit)]
        } else {
            unit.alive_members().iter().map(|b| Some(b.id())).collect()
        }
    }

    fn single_target(&self, ctx: &BattleContext<'_>, unit: &dyn Unit) -> Option<BattlerId> {
        if self.target_index < 0 {
            unit.random_target(&ctx.env)
        } else {
            unit.smooth_target(self.target_index)
        }
    }

    /// Picks a random target index for the action's scope. Clears the action
    /// when nothing can be targeted.
    pub fn decide_random_target(&mut self, ctx: &BattleContext<'_>) {
        let db = ctx.db();
        let target = if self.is_for_dead_friend(db) {
            ctx.friends_unit(self.subject).random_dead_target(&ctx.env)
        } else if self.is_for_friend(db) {
            ctx.friends_unit(self.subject).random_target(&ctx.env)
        } else {
            ctx.opponents_unit(self.subject).random_target(&ctx.env)
        };
        let index = target.and_then(|id| ctx.unit(id.side()).member_index(id));
        match index.and_then(|i| i32::try_from(i).ok()) {
            Some(index) => self.target_index = index,
            None => self.clear(),
        }
    }
}

/// Repeats each resolved target in place; unresolved entries are dropped.
pub(crate) fn repeat_targets(targets: Vec<Option<BattlerId>>, repeats: usize) -> Vec<BattlerId> {
    targets
        .into_iter()
        .flatten()
        .flat_map(|id| core::iter::repeat_n(id, repeats))
        .collect()
}
