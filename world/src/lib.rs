#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative progression state for the Revolution engine.
//!
//! The [`World`] owns every piece of progression state: ring values, score,
//! the prestige/promotion/infinity currencies, skill levels, automation
//! toggles, and the rotation clock. All mutation flows through [`apply`],
//! which executes one [`Command`] at a time and broadcasts [`Event`] values
//! for systems and adapters. Reads go through the [`query`] module; there
//! are no fast mirrors to fall out of sync.

use std::time::Duration;

use revolution_core::{
    multipliers, upgrade_cost, Command, Event, ResetError, ResetTier, RingIndex, SkillError,
    SkillLevels, SkillNode, UpgradeError, BASE_REVOLUTION_REWARD, MAX_SPEED_LEVEL,
    PRESTIGE_THRESHOLD_STEP, PROMOTION_THRESHOLD_STEP, RING_COUNT,
};

mod clock;

use clock::RotationClock;

/// Scheduler phase consumed by the tick handler.
///
/// Promotion and Infinity set `ResetPending` after their synchronous batch of
/// mutations; the next tick consumes the flag, restores the suspended
/// auto-buy setting, and performs no reward work, so simulation resumes
/// exactly one scheduled pass later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Normal operation; ticks advance the clock and accrue rewards.
    Running,
    /// A reset completed this pass; the next tick is a reward no-op.
    ResetPending,
}

#[derive(Clone, Copy, Debug)]
struct Ring {
    value: f64,
    speed_level: u8,
    purchase_count: u32,
    completed_revolutions: u64,
}

impl Ring {
    const fn initial() -> Self {
        Self {
            value: 1.0,
            speed_level: 0,
            purchase_count: 0,
            completed_revolutions: 0,
        }
    }
}

/// Represents the authoritative progression state.
#[derive(Clone, Debug)]
pub struct World {
    rings: [Ring; RING_COUNT],
    score: f64,
    prestige_points: f64,
    prestige_strength: f64,
    last_prestige_score: f64,
    promotion_level: u32,
    infinity_points: u64,
    has_reached_infinity: bool,
    skills: SkillLevels,
    auto_buy: bool,
    auto_promo: bool,
    suspended_auto_buy: Option<bool>,
    phase: Phase,
    clock: RotationClock,
}

impl World {
    /// Creates a fresh world with default progression state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rings: [Ring::initial(); RING_COUNT],
            score: 0.0,
            prestige_points: 0.0,
            prestige_strength: 0.0,
            last_prestige_score: 0.0,
            promotion_level: 0,
            infinity_points: 0,
            has_reached_infinity: false,
            skills: SkillLevels::new(),
            auto_buy: false,
            auto_promo: false,
            suspended_auto_buy: None,
            phase: Phase::Running,
            clock: RotationClock::new(),
        }
    }

    /// Rebuilds a world from a persisted snapshot.
    ///
    /// Out-of-range fields are clamped rather than rejected: speed levels cap
    /// at 100, skill levels at each node's maximum, and non-finite or
    /// negative numbers fall back to their defaults. Clock state is not
    /// persisted; the epoch's revolution counters restart from zero.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut world = Self::new();
        for (index, ring) in world.rings.iter_mut().enumerate() {
            let value = snapshot.ring_values[index];
            ring.value = if value.is_finite() && value >= 1.0 {
                value
            } else {
                1.0
            };
            ring.speed_level = snapshot.speed_levels[index].min(MAX_SPEED_LEVEL);
            ring.purchase_count = snapshot.purchase_counts[index];
        }
        world.score = non_negative_or_zero(snapshot.score);
        world.prestige_points = finite_or_zero(snapshot.prestige_points);
        world.prestige_strength = finite_or_zero(snapshot.prestige_strength);
        world.last_prestige_score = finite_or_zero(snapshot.last_prestige_score);
        world.promotion_level = snapshot.promotion_level;
        world.infinity_points = snapshot.infinity_points;
        world.has_reached_infinity = snapshot.has_reached_infinity;
        for node in SkillNode::ALL {
            world.skills.set_level(node, snapshot.skills.level(node));
        }
        world.auto_buy = snapshot.auto_buy;
        world.auto_promo = snapshot.auto_promo;
        world
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.phase == Phase::ResetPending {
            self.phase = Phase::Running;
            if let Some(enabled) = self.suspended_auto_buy.take() {
                if enabled != self.auto_buy {
                    self.auto_buy = enabled;
                    out_events.push(Event::AutoBuyChanged { enabled });
                }
            }
            return;
        }

        self.clock.advance(dt);
        out_events.push(Event::TimeAdvanced { dt });

        let prestige_mul = multipliers::prestige_multiplier(self.prestige_points);
        let promotion_mul = multipliers::promotion_multiplier(self.promotion_level);
        let rotation_mul = multipliers::rotation_multiplier(&self.skills);
        let score_mul = multipliers::score_multiplier(&self.skills);

        for ring in RingIndex::ALL {
            let index = ring.get() as usize;
            let total = self
                .clock
                .completed_revolutions(ring, self.rings[index].speed_level);
            let stored = self.rings[index].completed_revolutions;
            if total <= stored {
                continue;
            }
            let revolutions = total - stored;
            self.rings[index].completed_revolutions = total;
            let batch = revolutions as f64;

            // The score delta is computed from the ring-value vector as it
            // stands before this ring's increment lands, keeping each ring's
            // reward a pure function of the state at the start of its turn.
            let product: f64 = self.rings.iter().map(|ring| ring.value).product();
            self.score += product * prestige_mul * score_mul * batch;

            let increment =
                BASE_REVOLUTION_REWARD * prestige_mul * promotion_mul * rotation_mul * batch;
            self.rings[index].value = round_to_cents(self.rings[index].value + increment);

            out_events.push(Event::RevolutionCompleted { ring, revolutions });
        }

        debug_assert!(!self.score.is_nan(), "score must never become NaN");
    }

    fn buy_speed_upgrade(&mut self, ring: RingIndex, out_events: &mut Vec<Event>) {
        let index = ring.get() as usize;
        if self.rings[index].speed_level >= MAX_SPEED_LEVEL {
            out_events.push(Event::UpgradeRejected {
                ring,
                reason: UpgradeError::SpeedLevelAtCap,
            });
            return;
        }

        let cost = upgrade_cost(ring, self.rings[index].purchase_count);
        if !(self.score >= cost) {
            out_events.push(Event::UpgradeRejected {
                ring,
                reason: UpgradeError::InsufficientScore,
            });
            return;
        }

        self.score -= cost;
        let state = &mut self.rings[index];
        state.speed_level = state.speed_level.saturating_add(1).min(MAX_SPEED_LEVEL);
        state.purchase_count = state.purchase_count.saturating_add(1);
        out_events.push(Event::SpeedUpgradePurchased {
            ring,
            level: state.speed_level,
            cost,
        });
    }

    fn buy_skill(&mut self, node: SkillNode, out_events: &mut Vec<Event>) {
        if !self.skills.is_unlocked(node) {
            out_events.push(Event::SkillRejected {
                node,
                reason: SkillError::Locked,
            });
            return;
        }

        let level = self.skills.level(node);
        if level >= node.max_level() {
            out_events.push(Event::SkillRejected {
                node,
                reason: SkillError::AtMaxLevel,
            });
            return;
        }

        let cost = node.purchase_cost(level);
        if self.infinity_points < cost {
            out_events.push(Event::SkillRejected {
                node,
                reason: SkillError::InsufficientPoints,
            });
            return;
        }

        self.infinity_points -= cost;
        let level = self.skills.raise(node);
        out_events.push(Event::SkillPurchased { node, level });

        // The first automation node switches auto-buy on the moment it is
        // bought; the toggle itself stays under player control afterwards.
        if node == SkillNode::Node3a && !self.auto_buy {
            self.auto_buy = true;
            out_events.push(Event::AutoBuyChanged { enabled: true });
        }
    }

    fn set_auto_buy(&mut self, enabled: bool, out_events: &mut Vec<Event>) {
        if self.phase == Phase::ResetPending {
            // Toggles issued during the suspension pass take effect when the
            // next tick restores automation.
            self.suspended_auto_buy = Some(enabled);
            return;
        }
        if self.auto_buy != enabled {
            self.auto_buy = enabled;
            out_events.push(Event::AutoBuyChanged { enabled });
        }
    }

    fn set_auto_promo(&mut self, enabled: bool, out_events: &mut Vec<Event>) {
        if self.auto_promo != enabled {
            self.auto_promo = enabled;
            out_events.push(Event::AutoPromoChanged { enabled });
        }
    }

    fn prestige(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == Phase::ResetPending {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Prestige,
                reason: ResetError::ResetInFlight,
            });
            return;
        }

        let gain = multipliers::prestige_gain(self.score, self.last_prestige_score, &self.skills);
        if gain <= 0.0 {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Prestige,
                reason: ResetError::NothingToConvert,
            });
            return;
        }
        if self.score < self.next_prestige_threshold() {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Prestige,
                reason: ResetError::ThresholdNotReached,
            });
            return;
        }

        self.prestige_points += gain;
        self.last_prestige_score =
            (self.score / PRESTIGE_THRESHOLD_STEP).floor() * PRESTIGE_THRESHOLD_STEP;
        let strength_delta =
            (10.0 * gain).sqrt() * multipliers::prestige_strength_boost(&self.skills);
        if strength_delta.is_finite() {
            self.prestige_strength += strength_delta;
        }
        self.reset_epoch();
        out_events.push(Event::PrestigePerformed {
            gain,
            total_points: self.prestige_points,
        });
    }

    fn promote(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == Phase::ResetPending {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Promotion,
                reason: ResetError::ResetInFlight,
            });
            return;
        }

        let required = self.next_promotion_requirement();
        if !self.prestige_points.is_finite() || self.prestige_points < required {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Promotion,
                reason: ResetError::ThresholdNotReached,
            });
            return;
        }

        self.begin_suspension(out_events);
        self.promotion_level = self.promotion_level.saturating_add(1);
        self.prestige_points = 0.0;
        self.prestige_strength = 0.0;
        self.last_prestige_score = 0.0;
        self.reset_epoch();
        out_events.push(Event::PromotionPerformed {
            level: self.promotion_level,
        });
    }

    fn go_infinite(&mut self, out_events: &mut Vec<Event>) {
        if self.phase == Phase::ResetPending {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Infinity,
                reason: ResetError::ResetInFlight,
            });
            return;
        }

        if self.score != f64::INFINITY {
            out_events.push(Event::ResetRejected {
                tier: ResetTier::Infinity,
                reason: ResetError::ThresholdNotReached,
            });
            return;
        }

        self.begin_suspension(out_events);
        self.infinity_points = self.infinity_points.saturating_add(1);
        self.has_reached_infinity = true;
        self.promotion_level = 0;
        self.prestige_points = 0.0;
        self.prestige_strength = 0.0;
        self.last_prestige_score = 0.0;
        self.reset_epoch();
        out_events.push(Event::InfinityReached {
            infinity_points: self.infinity_points,
        });
    }

    /// Remembers the auto-buy setting, disables it, and arms the pending
    /// phase so the next tick skips reward work before resuming.
    fn begin_suspension(&mut self, out_events: &mut Vec<Event>) {
        self.suspended_auto_buy = Some(self.auto_buy);
        if self.auto_buy {
            self.auto_buy = false;
            out_events.push(Event::AutoBuyChanged { enabled: false });
        }
        self.phase = Phase::ResetPending;
    }

    /// Clears the per-epoch state shared by every reset tier.
    fn reset_epoch(&mut self) {
        self.score = 0.0;
        self.rings = [Ring::initial(); RING_COUNT];
        self.clock.reset();
    }

    fn next_prestige_threshold(&self) -> f64 {
        self.last_prestige_score + PRESTIGE_THRESHOLD_STEP
    }

    fn next_promotion_requirement(&self) -> f64 {
        f64::from(self.promotion_level.saturating_add(1)) * PROMOTION_THRESHOLD_STEP
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::BuySpeedUpgrade { ring } => world.buy_speed_upgrade(ring, out_events),
        Command::BuySkill { node } => world.buy_skill(node, out_events),
        Command::SetAutoBuy { enabled } => world.set_auto_buy(enabled, out_events),
        Command::SetAutoPromo { enabled } => world.set_auto_promo(enabled, out_events),
        Command::Prestige => world.prestige(out_events),
        Command::Promote => world.promote(out_events),
        Command::GoInfinite => world.go_infinite(out_events),
    }
}

/// Persisted view of the progression state, matching the durable-store
/// contract field for field. Clock counters are deliberately absent.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// Multiplicative value of each ring.
    pub ring_values: [f64; RING_COUNT],
    /// Purchased speed level of each ring.
    pub speed_levels: [u8; RING_COUNT],
    /// Cumulative upgrade purchases of each ring within the epoch.
    pub purchase_counts: [u32; RING_COUNT],
    /// Score accrued within the current epoch.
    pub score: f64,
    /// Prestige point balance.
    pub prestige_points: f64,
    /// Accumulated prestige strength.
    pub prestige_strength: f64,
    /// Largest score multiple already converted by Prestige.
    pub last_prestige_score: f64,
    /// Purchased promotion level.
    pub promotion_level: u32,
    /// Never-reset infinity point balance.
    pub infinity_points: u64,
    /// Whether the player has ever completed an Infinity reset.
    pub has_reached_infinity: bool,
    /// Levels held across the skill tree.
    pub skills: SkillLevels,
    /// Auto-buy toggle.
    pub auto_buy: bool,
    /// Auto-promote toggle.
    pub auto_promo: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            ring_values: [1.0; RING_COUNT],
            speed_levels: [0; RING_COUNT],
            purchase_counts: [0; RING_COUNT],
            score: 0.0,
            prestige_points: 0.0,
            prestige_strength: 0.0,
            last_prestige_score: 0.0,
            promotion_level: 0,
            infinity_points: 0,
            has_reached_infinity: false,
            skills: SkillLevels::new(),
            auto_buy: false,
            auto_promo: false,
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{clock, Phase, Snapshot, World};
    use revolution_core::{multipliers, upgrade_cost, RingIndex, SkillLevels, SkillNode};

    /// Immutable representation of a single ring used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct RingSnapshot {
        /// Index of the ring.
        pub ring: RingIndex,
        /// Current multiplicative value of the ring.
        pub value: f64,
        /// Purchased speed level.
        pub speed_level: u8,
        /// Cumulative purchases within the epoch.
        pub purchase_count: u32,
        /// Whole revolutions completed this epoch.
        pub completed_revolutions: u64,
        /// Score cost of the ring's next speed upgrade.
        pub next_upgrade_cost: f64,
        /// Current revolutions per second.
        pub revolutions_per_second: f64,
        /// Current angle of the ring's moving dot in radians.
        pub angle: f64,
    }

    /// Read-only snapshot describing all rings in index order.
    #[derive(Clone, Debug, Default)]
    pub struct RingView {
        snapshots: Vec<RingSnapshot>,
    }

    impl RingView {
        /// Iterator over the captured ring snapshots, innermost first.
        pub fn iter(&self) -> impl Iterator<Item = &RingSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<RingSnapshot> {
            self.snapshots
        }
    }

    /// Read-only summary of the meta-progression currencies and toggles.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProgressSnapshot {
        /// Score accrued within the current epoch.
        pub score: f64,
        /// Prestige point balance.
        pub prestige_points: f64,
        /// Accumulated prestige strength.
        pub prestige_strength: f64,
        /// Largest score multiple already converted by Prestige.
        pub last_prestige_score: f64,
        /// Purchased promotion level.
        pub promotion_level: u32,
        /// Never-reset infinity point balance.
        pub infinity_points: u64,
        /// Whether the player has ever completed an Infinity reset.
        pub has_reached_infinity: bool,
        /// Auto-buy toggle as currently effective.
        pub auto_buy: bool,
        /// Auto-promote toggle.
        pub auto_promo: bool,
        /// True while a reset is waiting for its resumption tick.
        pub reset_pending: bool,
    }

    /// Captures a read-only view of all rings.
    #[must_use]
    pub fn ring_view(world: &World) -> RingView {
        let snapshots = RingIndex::ALL
            .into_iter()
            .map(|ring| {
                let state = &world.rings[ring.get() as usize];
                RingSnapshot {
                    ring,
                    value: state.value,
                    speed_level: state.speed_level,
                    purchase_count: state.purchase_count,
                    completed_revolutions: state.completed_revolutions,
                    next_upgrade_cost: upgrade_cost(ring, state.purchase_count),
                    revolutions_per_second: clock::revolutions_per_second(
                        ring,
                        state.speed_level,
                    ),
                    angle: world.clock.angle(ring, state.speed_level),
                }
            })
            .collect();
        RingView { snapshots }
    }

    /// Captures a read-only summary of progression currencies and toggles.
    #[must_use]
    pub fn progress(world: &World) -> ProgressSnapshot {
        ProgressSnapshot {
            score: world.score,
            prestige_points: world.prestige_points,
            prestige_strength: world.prestige_strength,
            last_prestige_score: world.last_prestige_score,
            promotion_level: world.promotion_level,
            infinity_points: world.infinity_points,
            has_reached_infinity: world.has_reached_infinity,
            auto_buy: world.auto_buy,
            auto_promo: world.auto_promo,
            reset_pending: world.phase == Phase::ResetPending,
        }
    }

    /// Copies the current skill-level table.
    #[must_use]
    pub fn skill_levels(world: &World) -> SkillLevels {
        world.skills
    }

    /// Level currently held for a single skill node.
    #[must_use]
    pub fn skill_level(world: &World, node: SkillNode) -> u8 {
        world.skills.level(node)
    }

    /// Score required before the next Prestige is accepted.
    #[must_use]
    pub fn next_prestige_threshold(world: &World) -> f64 {
        world.next_prestige_threshold()
    }

    /// Prestige points a Prestige performed right now would award.
    #[must_use]
    pub fn prestige_gain_now(world: &World) -> f64 {
        multipliers::prestige_gain(world.score, world.last_prestige_score, &world.skills)
    }

    /// Prestige points required before the next Promotion is accepted.
    #[must_use]
    pub fn next_promotion_requirement(world: &World) -> f64 {
        world.next_promotion_requirement()
    }

    /// Captures the persisted view of the world.
    #[must_use]
    pub fn snapshot(world: &World) -> Snapshot {
        let mut snapshot = Snapshot {
            score: world.score,
            prestige_points: world.prestige_points,
            prestige_strength: world.prestige_strength,
            last_prestige_score: world.last_prestige_score,
            promotion_level: world.promotion_level,
            infinity_points: world.infinity_points,
            has_reached_infinity: world.has_reached_infinity,
            skills: world.skills,
            auto_buy: world.auto_buy,
            auto_promo: world.auto_promo,
            ..Snapshot::default()
        };
        for ring in RingIndex::ALL {
            let index = ring.get() as usize;
            snapshot.ring_values[index] = world.rings[index].value;
            snapshot.speed_levels[index] = world.rings[index].speed_level;
            snapshot.purchase_counts[index] = world.rings[index].purchase_count;
        }
        snapshot
    }
}

/// Test scaffolding that injects otherwise unreachable progression state.
#[cfg(any(test, feature = "progress_scaffolding"))]
pub mod scaffolding {
    use super::World;
    use revolution_core::SkillNode;

    /// Overwrites the epoch score.
    pub fn set_score(world: &mut World, score: f64) {
        world.score = score;
    }

    /// Overwrites the prestige point balance.
    pub fn set_prestige_points(world: &mut World, points: f64) {
        world.prestige_points = points;
    }

    /// Overwrites the infinity point balance.
    pub fn set_infinity_points(world: &mut World, points: u64) {
        world.infinity_points = points;
    }

    /// Sets a skill node's level directly, bypassing unlock checks and cost.
    pub fn set_skill_level(world: &mut World, node: SkillNode, level: u8) {
        world.skills.set_level(node, level);
    }
}

fn round_to_cents(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        value
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn non_negative_or_zero(value: f64) -> f64 {
    // The overflow sentinel is legitimate persisted state only in as far as
    // the caller encodes it; NaN and negatives are not.
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use revolution_core::{Command, Event};

    const DT: Duration = Duration::from_millis(2_100);

    fn ring(value: u8) -> RingIndex {
        RingIndex::new(value).expect("valid ring")
    }

    fn tick(world: &mut World, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::Tick { dt }, &mut events);
        events
    }

    #[test]
    fn first_tick_past_the_spin_duration_rewards_the_inner_ring() {
        let mut world = World::new();
        let events = tick(&mut world, DT);

        assert!(events.contains(&Event::RevolutionCompleted {
            ring: ring(0),
            revolutions: 1,
        }));
        let view = query::ring_view(&world);
        let inner = view.iter().next().expect("ring 0");
        assert_eq!(inner.value, 1.01);
        assert_eq!(inner.completed_revolutions, 1);
        // Score delta uses the pre-increment product of all-ones.
        assert_eq!(query::progress(&world).score, 1.0);
    }

    #[test]
    fn revolutions_are_not_dropped_across_slow_ticks() {
        let mut fast = World::new();
        for _ in 0..10 {
            let _ = tick(&mut fast, Duration::from_millis(2_100));
        }

        let mut slow = World::new();
        let _ = tick(&mut slow, Duration::from_millis(21_000));

        let fast_total = query::ring_view(&fast)
            .iter()
            .next()
            .expect("ring 0")
            .completed_revolutions;
        let slow_total = query::ring_view(&slow)
            .iter()
            .next()
            .expect("ring 0")
            .completed_revolutions;
        assert_eq!(fast_total, slow_total);
        assert_eq!(slow_total, 10);
    }

    #[test]
    fn buying_the_first_inner_upgrade_consumes_the_whole_score() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, 1.0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySpeedUpgrade { ring: ring(0) },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SpeedUpgradePurchased {
                ring: ring(0),
                level: 1,
                cost: 1.0,
            }],
        );
        let view = query::ring_view(&world);
        let inner = view.iter().next().expect("ring 0");
        assert_eq!(inner.speed_level, 1);
        assert_eq!(inner.purchase_count, 1);
        assert_eq!(query::progress(&world).score, 0.0);
    }

    #[test]
    fn upgrades_are_rejected_without_score() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySpeedUpgrade { ring: ring(2) },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UpgradeRejected {
                ring: ring(2),
                reason: UpgradeError::InsufficientScore,
            }],
        );
        let view = query::ring_view(&world);
        assert!(view.iter().all(|snapshot| snapshot.purchase_count == 0));
    }

    #[test]
    fn upgrades_are_rejected_at_the_level_cap() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, f64::MAX);
        let mut events = Vec::new();
        for _ in 0..MAX_SPEED_LEVEL {
            apply(
                &mut world,
                Command::BuySpeedUpgrade { ring: ring(0) },
                &mut events,
            );
        }
        events.clear();
        apply(
            &mut world,
            Command::BuySpeedUpgrade { ring: ring(0) },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::UpgradeRejected {
                ring: ring(0),
                reason: UpgradeError::SpeedLevelAtCap,
            }],
        );
        let view = query::ring_view(&world);
        let inner = view.iter().next().expect("ring 0");
        assert_eq!(inner.speed_level, MAX_SPEED_LEVEL);
        assert_eq!(inner.purchase_count, u32::from(MAX_SPEED_LEVEL));
    }

    #[test]
    fn prestige_from_one_million_awards_a_single_point() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, 1_000_000.0);

        let mut events = Vec::new();
        apply(&mut world, Command::Prestige, &mut events);

        assert_eq!(
            events,
            vec![Event::PrestigePerformed {
                gain: 1.0,
                total_points: 1.0,
            }],
        );
        let progress = query::progress(&world);
        assert_eq!(progress.score, 0.0);
        assert_eq!(progress.prestige_points, 1.0);
        assert_eq!(progress.last_prestige_score, 1_000_000.0);
        assert_eq!(query::next_prestige_threshold(&world), 2_000_000.0);
        let view = query::ring_view(&world);
        for snapshot in view.iter() {
            assert_eq!(snapshot.value, 1.0);
            assert_eq!(snapshot.speed_level, 0);
            assert_eq!(snapshot.purchase_count, 0);
            assert_eq!(snapshot.completed_revolutions, 0);
        }
        assert!((progress.prestige_strength - 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn prestige_is_rejected_below_the_threshold() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, 999_999.0);

        let mut events = Vec::new();
        apply(&mut world, Command::Prestige, &mut events);

        assert_eq!(
            events,
            vec![Event::ResetRejected {
                tier: ResetTier::Prestige,
                reason: ResetError::NothingToConvert,
            }],
        );
        assert_eq!(query::progress(&world).score, 999_999.0);
    }

    #[test]
    fn repeat_prestige_requires_a_fresh_million() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, 1_500_000.0);
        let _ = {
            let mut events = Vec::new();
            apply(&mut world, Command::Prestige, &mut events);
            events
        };

        // The same epoch score again: every million here was already
        // converted, so there is nothing left to claim.
        scaffolding::set_score(&mut world, 1_000_000.0);
        let mut events = Vec::new();
        apply(&mut world, Command::Prestige, &mut events);
        assert_eq!(
            events,
            vec![Event::ResetRejected {
                tier: ResetTier::Prestige,
                reason: ResetError::NothingToConvert,
            }],
        );

        scaffolding::set_score(&mut world, 2_000_000.0);
        events.clear();
        apply(&mut world, Command::Prestige, &mut events);
        assert_eq!(
            events,
            vec![Event::PrestigePerformed {
                gain: 1.0,
                total_points: 2.0,
            }],
        );
    }

    #[test]
    fn promotion_consumes_prestige_state_and_suspends_one_pass() {
        let mut world = World::new();
        scaffolding::set_prestige_points(&mut world, 1e90);
        let mut events = Vec::new();
        apply(&mut world, Command::SetAutoBuy { enabled: true }, &mut events);
        events.clear();

        apply(&mut world, Command::Promote, &mut events);

        assert_eq!(
            events,
            vec![
                Event::AutoBuyChanged { enabled: false },
                Event::PromotionPerformed { level: 1 },
            ],
        );
        let progress = query::progress(&world);
        assert_eq!(progress.promotion_level, 1);
        assert_eq!(progress.prestige_points, 0.0);
        assert_eq!(progress.prestige_strength, 0.0);
        assert_eq!(progress.last_prestige_score, 0.0);
        assert!(progress.reset_pending);
        assert!(!progress.auto_buy);

        // The next tick is a reward no-op that restores auto-buy.
        let events = tick(&mut world, DT);
        assert_eq!(events, vec![Event::AutoBuyChanged { enabled: true }]);
        let progress = query::progress(&world);
        assert!(!progress.reset_pending);
        assert!(progress.auto_buy);

        // Rewards resume on the pass after the suspension.
        let events = tick(&mut world, DT);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::RevolutionCompleted { .. })));
    }

    #[test]
    fn promotion_is_rejected_below_the_requirement() {
        let mut world = World::new();
        scaffolding::set_prestige_points(&mut world, 9e89);

        let mut events = Vec::new();
        apply(&mut world, Command::Promote, &mut events);

        assert_eq!(
            events,
            vec![Event::ResetRejected {
                tier: ResetTier::Promotion,
                reason: ResetError::ThresholdNotReached,
            }],
        );
        assert_eq!(query::progress(&world).promotion_level, 0);
    }

    #[test]
    fn promotion_requirement_scales_linearly_with_level() {
        let mut world = World::new();
        assert_eq!(query::next_promotion_requirement(&world), 1e90);
        scaffolding::set_prestige_points(&mut world, 1e90);
        let mut events = Vec::new();
        apply(&mut world, Command::Promote, &mut events);
        assert_eq!(query::next_promotion_requirement(&world), 2e90);
    }

    #[test]
    fn infinity_latches_and_resets_every_lower_tier() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, f64::INFINITY);
        scaffolding::set_prestige_points(&mut world, 5e12);
        let mut events = Vec::new();
        apply(&mut world, Command::Promote, &mut events);
        events.clear();

        apply(&mut world, Command::GoInfinite, &mut events);
        // Promote above was rejected (below threshold), so no reset is in
        // flight and the infinity trigger fires.
        assert_eq!(events, vec![Event::InfinityReached { infinity_points: 1 }]);

        let progress = query::progress(&world);
        assert_eq!(progress.infinity_points, 1);
        assert!(progress.has_reached_infinity);
        assert_eq!(progress.score, 0.0);
        assert_eq!(progress.promotion_level, 0);
        assert_eq!(progress.prestige_points, 0.0);
        assert_eq!(progress.prestige_strength, 0.0);
        assert!(progress.reset_pending);

        // A later prestige epoch never clears the latch.
        let _ = tick(&mut world, DT);
        scaffolding::set_score(&mut world, 1_000_000.0);
        let mut events = Vec::new();
        apply(&mut world, Command::Prestige, &mut events);
        assert!(query::progress(&world).has_reached_infinity);
    }

    #[test]
    fn infinity_requires_the_overflow_sentinel() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, f64::MAX);

        let mut events = Vec::new();
        apply(&mut world, Command::GoInfinite, &mut events);

        assert_eq!(
            events,
            vec![Event::ResetRejected {
                tier: ResetTier::Infinity,
                reason: ResetError::ThresholdNotReached,
            }],
        );
    }

    #[test]
    fn only_one_reset_may_be_in_flight() {
        let mut world = World::new();
        scaffolding::set_prestige_points(&mut world, 1e90);
        let mut events = Vec::new();
        apply(&mut world, Command::Promote, &mut events);
        events.clear();

        scaffolding::set_score(&mut world, f64::INFINITY);
        apply(&mut world, Command::GoInfinite, &mut events);
        assert_eq!(
            events,
            vec![Event::ResetRejected {
                tier: ResetTier::Infinity,
                reason: ResetError::ResetInFlight,
            }],
        );
    }

    #[test]
    fn suspension_tick_emits_no_reward_events() {
        let mut world = World::new();
        scaffolding::set_prestige_points(&mut world, 1e90);
        let mut events = Vec::new();
        apply(&mut world, Command::Promote, &mut events);

        let events = tick(&mut world, Duration::from_secs(30));
        assert!(events
            .iter()
            .all(|event| !matches!(event, Event::RevolutionCompleted { .. })));
        assert!(!events.contains(&Event::TimeAdvanced {
            dt: Duration::from_secs(30)
        }));
    }

    #[test]
    fn buying_the_automation_node_force_enables_auto_buy() {
        let mut world = World::new();
        scaffolding::set_infinity_points(&mut world, 8);
        scaffolding::set_skill_level(&mut world, SkillNode::Node1, 1);
        scaffolding::set_skill_level(&mut world, SkillNode::Node2, 1);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySkill {
                node: SkillNode::Node3a,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::SkillPurchased {
                    node: SkillNode::Node3a,
                    level: 1,
                },
                Event::AutoBuyChanged { enabled: true },
            ],
        );
        assert!(query::progress(&world).auto_buy);
        assert_eq!(query::progress(&world).infinity_points, 7);
    }

    #[test]
    fn locked_skills_cannot_be_bought() {
        let mut world = World::new();
        scaffolding::set_infinity_points(&mut world, 100);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySkill {
                node: SkillNode::Node7,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SkillRejected {
                node: SkillNode::Node7,
                reason: SkillError::Locked,
            }],
        );
        assert_eq!(query::progress(&world).infinity_points, 100);
    }

    #[test]
    fn skill_purchases_stop_at_the_node_maximum() {
        let mut world = World::new();
        scaffolding::set_infinity_points(&mut world, 1_000);
        scaffolding::set_skill_level(&mut world, SkillNode::Node1, 5);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySkill {
                node: SkillNode::Node1,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SkillRejected {
                node: SkillNode::Node1,
                reason: SkillError::AtMaxLevel,
            }],
        );
    }

    #[test]
    fn skill_purchases_require_infinity_points() {
        let mut world = World::new();
        scaffolding::set_infinity_points(&mut world, 0);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::BuySkill {
                node: SkillNode::Node1,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::SkillRejected {
                node: SkillNode::Node1,
                reason: SkillError::InsufficientPoints,
            }],
        );
    }

    #[test]
    fn snapshot_round_trips_through_from_snapshot() {
        let mut world = World::new();
        scaffolding::set_score(&mut world, 42_000.5);
        scaffolding::set_prestige_points(&mut world, 17.0);
        scaffolding::set_infinity_points(&mut world, 3);
        scaffolding::set_skill_level(&mut world, SkillNode::Node1, 2);
        let mut events = Vec::new();
        apply(&mut world, Command::SetAutoPromo { enabled: true }, &mut events);

        let snapshot = query::snapshot(&world);
        let restored = World::from_snapshot(snapshot.clone());
        assert_eq!(query::snapshot(&restored), snapshot);
    }

    #[test]
    fn from_snapshot_clamps_malformed_fields() {
        let snapshot = Snapshot {
            ring_values: [f64::NAN; RING_COUNT],
            speed_levels: [200; RING_COUNT],
            score: -5.0,
            prestige_points: f64::NAN,
            ..Snapshot::default()
        };

        let world = World::from_snapshot(snapshot);
        let view = query::ring_view(&world);
        for ring in view.iter() {
            assert_eq!(ring.value, 1.0);
            assert_eq!(ring.speed_level, MAX_SPEED_LEVEL);
        }
        let progress = query::progress(&world);
        assert_eq!(progress.score, 0.0);
        assert_eq!(progress.prestige_points, 0.0);
    }

    #[test]
    fn reward_accrual_applies_the_multiplier_stack() {
        let mut world = World::new();
        scaffolding::set_prestige_points(&mut world, 10.0);
        scaffolding::set_skill_level(&mut world, SkillNode::Node1, 1);

        let events = tick(&mut world, DT);
        assert!(events.contains(&Event::RevolutionCompleted {
            ring: ring(0),
            revolutions: 1,
        }));

        // prestige multiplier = sqrt(100) = 10 (below every cap);
        // score multiplier = 2^1; product of ring values = 1.
        let progress = query::progress(&world);
        assert!((progress.score - 20.0).abs() < 1e-9);
        let view = query::ring_view(&world);
        let inner = view.iter().next().expect("ring 0");
        // increment = 0.01 * 10 rounded to cents on top of 1.0
        assert!((inner.value - 1.1).abs() < 1e-9);
    }
}
