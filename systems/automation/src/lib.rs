#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure automation system that plays the upgrade store and reset tiers.
//!
//! The system never touches world state directly. Each pass it inspects the
//! events produced by the most recent tick together with read-only world
//! views, and emits the purchase and reset commands a diligent player would
//! issue. The driving loop applies those commands through the world like any
//! player-issued command, so every automation decision is subject to the
//! same validation.

use revolution_core::{
    multipliers, upgrade_cost, Command, Event, SkillLevels, SkillNode, MAX_SPEED_LEVEL,
    PROMOTION_THRESHOLD_STEP,
};
use revolution_world::query::{ProgressSnapshot, RingView};

/// Automation system translating post-tick world views into command batches.
#[derive(Debug, Clone, Default)]
pub struct Automation {
    _private: (),
}

impl Automation {
    /// Creates a new automation system instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Consumes tick events and world views to emit automation commands.
    ///
    /// Runs only on passes that observed a [`Event::TimeAdvanced`], so
    /// suspension passes following a Promotion or Infinity reset produce no
    /// commands at all.
    pub fn handle(
        &mut self,
        events: &[Event],
        progress: &ProgressSnapshot,
        rings: &RingView,
        skills: &SkillLevels,
        out: &mut Vec<Command>,
    ) {
        let time_advanced = events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }));
        if !time_advanced || progress.reset_pending {
            return;
        }

        if progress.auto_buy {
            self.plan_purchases(progress, rings, out);
        }

        if progress.auto_promo && skills.level(SkillNode::Node10) >= 1 {
            self.plan_resets(progress, skills, out);
        }
    }

    /// Sweeps the rings innermost first, buying every upgrade the current
    /// score affords.
    ///
    /// The world validates each purchase again when the command is applied;
    /// the local budget and per-ring bases only keep this pass from emitting
    /// commands that are certain to be rejected.
    fn plan_purchases(
        &mut self,
        progress: &ProgressSnapshot,
        rings: &RingView,
        out: &mut Vec<Command>,
    ) {
        let mut budget = progress.score;
        for snapshot in rings.iter() {
            let mut level = snapshot.speed_level;
            let mut purchases = snapshot.purchase_count;
            while level < MAX_SPEED_LEVEL {
                let cost = upgrade_cost(snapshot.ring, purchases);
                if !(budget >= cost) {
                    break;
                }
                budget -= cost;
                level += 1;
                purchases = purchases.saturating_add(1);
                out.push(Command::BuySpeedUpgrade {
                    ring: snapshot.ring,
                });
            }
        }
    }

    /// Promotes the moment the prestige balance allows it, and otherwise
    /// prestiges whenever doing so closes the gap to the next promotion.
    fn plan_resets(
        &mut self,
        progress: &ProgressSnapshot,
        skills: &SkillLevels,
        out: &mut Vec<Command>,
    ) {
        let required =
            f64::from(progress.promotion_level.saturating_add(1)) * PROMOTION_THRESHOLD_STEP;
        if progress.prestige_points >= required {
            out.push(Command::Promote);
            return;
        }

        let gain =
            multipliers::prestige_gain(progress.score, progress.last_prestige_score, skills);
        if gain > 0.0 && progress.prestige_points + gain >= required {
            out.push(Command::Prestige);
        }
    }
}
