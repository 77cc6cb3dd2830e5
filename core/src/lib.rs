#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Revolution progression engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! It also hosts the static skill-tree tables and the pure
//! [`multipliers`] stack so every crate prices and scales progression the
//! same way.

use std::f64::consts::TAU;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod multipliers;

/// Number of concentric rings simulated by the engine.
pub const RING_COUNT: usize = 9;

/// Highest speed level a ring can reach through upgrades.
pub const MAX_SPEED_LEVEL: u8 = 100;

/// Speed multiplier contributed by each purchased speed level.
pub const SPEED_LEVEL_STEP: f64 = 0.125;

/// Radius of the innermost ring expressed in world units.
pub const RING_BASE_RADIUS: f64 = 40.0;

/// Radial spacing between adjacent rings expressed in world units.
pub const RING_SPACING: f64 = 16.0;

/// Seconds the innermost ring takes for one revolution at multiplier 1.
pub const SPIN_DURATION_SECS: f64 = 2.0;

/// Tangential speed shared by every ring, derived from the innermost ring.
pub const REFERENCE_LINEAR_SPEED: f64 = TAU * RING_BASE_RADIUS / SPIN_DURATION_SECS;

/// Reward added to a ring's value per completed revolution before multipliers.
pub const BASE_REVOLUTION_REWARD: f64 = 0.01;

/// Score consumed per prestige point; also the additive threshold step.
pub const PRESTIGE_THRESHOLD_STEP: f64 = 1_000_000.0;

/// Prestige points required per promotion level.
pub const PROMOTION_THRESHOLD_STEP: f64 = 1e90;

/// Reward multiplier granted by each promotion level.
pub const PROMOTION_MULTIPLIER_BASE: f64 = 10.0;

/// Multiplicative cost growth applied per cumulative upgrade purchase.
pub const UPGRADE_COST_GROWTH: f64 = 1.2;

/// Cost multiplier separating each ring from the previous one.
pub const UPGRADE_COST_RING_FACTOR: f64 = 100.0;

/// Revolutions per second above which adapters present a static circle.
pub const FAST_REVS_PER_SEC: f64 = 5.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests a single speed-upgrade purchase for the specified ring.
    BuySpeedUpgrade {
        /// Ring whose speed level should be raised.
        ring: RingIndex,
    },
    /// Requests a single level purchase for the specified skill-tree node.
    BuySkill {
        /// Node whose level should be raised.
        node: SkillNode,
    },
    /// Updates the player's auto-buy toggle.
    SetAutoBuy {
        /// Desired toggle state.
        enabled: bool,
    },
    /// Updates the player's auto-promote toggle.
    SetAutoPromo {
        /// Desired toggle state.
        enabled: bool,
    },
    /// Requests a Prestige reset converting score into prestige points.
    Prestige,
    /// Requests a Promotion reset converting prestige points into a level.
    Promote,
    /// Requests an Infinity reset once score has reached the overflow sentinel.
    GoInfinite,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports newly completed revolutions for a ring since the last tick.
    RevolutionCompleted {
        /// Ring that completed the revolutions.
        ring: RingIndex,
        /// Number of whole revolutions completed, at least 1.
        revolutions: u64,
    },
    /// Confirms a speed-upgrade purchase.
    SpeedUpgradePurchased {
        /// Ring whose speed level was raised.
        ring: RingIndex,
        /// Speed level reached by the purchase.
        level: u8,
        /// Score deducted for the purchase.
        cost: f64,
    },
    /// Reports that a speed-upgrade purchase was rejected.
    UpgradeRejected {
        /// Ring named in the rejected request.
        ring: RingIndex,
        /// Specific reason the purchase failed.
        reason: UpgradeError,
    },
    /// Confirms a skill-node level purchase.
    SkillPurchased {
        /// Node whose level was raised.
        node: SkillNode,
        /// Level reached by the purchase.
        level: u8,
    },
    /// Reports that a skill purchase was rejected.
    SkillRejected {
        /// Node named in the rejected request.
        node: SkillNode,
        /// Specific reason the purchase failed.
        reason: SkillError,
    },
    /// Confirms a completed Prestige reset.
    PrestigePerformed {
        /// Prestige points awarded by the conversion.
        gain: f64,
        /// Total prestige points held after the conversion.
        total_points: f64,
    },
    /// Confirms a completed Promotion reset.
    PromotionPerformed {
        /// Promotion level reached by the reset.
        level: u32,
    },
    /// Confirms a completed Infinity reset.
    InfinityReached {
        /// Total infinity points held after the reset.
        infinity_points: u64,
    },
    /// Reports that a reset request was rejected.
    ResetRejected {
        /// Tier named in the rejected request.
        tier: ResetTier,
        /// Specific reason the reset failed.
        reason: ResetError,
    },
    /// Announces a change to the auto-buy toggle.
    AutoBuyChanged {
        /// Toggle state after the change.
        enabled: bool,
    },
    /// Announces a change to the auto-promote toggle.
    AutoPromoChanged {
        /// Toggle state after the change.
        enabled: bool,
    },
}

/// Zero-based index identifying one of the nine rings.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RingIndex(u8);

impl RingIndex {
    /// All ring indices ordered from the innermost ring outward.
    pub const ALL: [RingIndex; RING_COUNT] = [
        RingIndex(0),
        RingIndex(1),
        RingIndex(2),
        RingIndex(3),
        RingIndex(4),
        RingIndex(5),
        RingIndex(6),
        RingIndex(7),
        RingIndex(8),
    ];

    /// Creates a ring index, rejecting values outside the simulated rings.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < RING_COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    /// Radius of the ring measured in world units.
    #[must_use]
    pub const fn radius(&self) -> f64 {
        RING_BASE_RADIUS + RING_SPACING * self.0 as f64
    }

    /// Baseline activation before speed upgrades; only ring 0 spins initially.
    #[must_use]
    pub const fn base_activation(&self) -> f64 {
        if self.0 == 0 {
            1.0
        } else {
            0.0
        }
    }

    /// Effective speed multiplier for the ring at the provided speed level.
    #[must_use]
    pub fn effective_multiplier(&self, speed_level: u8) -> f64 {
        self.base_activation() + f64::from(speed_level) * SPEED_LEVEL_STEP
    }
}

/// Computes the score cost of the next speed upgrade for a ring.
///
/// Costs grow multiplicatively both with the ring index and with the
/// cumulative purchase count, which survives individual buys but resets with
/// each reset tier.
#[must_use]
pub fn upgrade_cost(ring: RingIndex, purchase_count: u32) -> f64 {
    let ring_factor = UPGRADE_COST_RING_FACTOR.powi(i32::from(ring.get()));
    let growth = UPGRADE_COST_GROWTH.powf(f64::from(purchase_count));
    ring_factor * growth
}

/// Reasons a speed-upgrade purchase may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// The current score cannot cover the purchase cost.
    InsufficientScore,
    /// The ring already sits at the maximum speed level.
    SpeedLevelAtCap,
}

/// Reasons a skill purchase may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillError {
    /// The node's unlock requirement is not satisfied.
    Locked,
    /// The node already sits at its maximum level.
    AtMaxLevel,
    /// The infinity point balance cannot cover the purchase cost.
    InsufficientPoints,
}

/// Reasons a reset request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetError {
    /// The tier's trigger threshold has not been reached.
    ThresholdNotReached,
    /// The conversion would award nothing, so the reset is refused.
    NothingToConvert,
    /// Another reset is still in flight; only one may run at a time.
    ResetInFlight,
}

/// The three escalating reset tiers of the meta-progression state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetTier {
    /// Converts score into prestige points.
    Prestige,
    /// Converts a very large prestige balance into a permanent level.
    Promotion,
    /// Converts an overflowed score into a never-reset infinity point.
    Infinity,
}

/// Number of nodes in the skill tree.
pub const SKILL_NODE_COUNT: usize = 17;

/// Identifiers for the seventeen skill-tree nodes, unlocked left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillNode {
    /// Root node; score boost.
    Node1,
    /// Basic rotation speed.
    Node2,
    /// Branch A of the first split; unlocks auto-buy.
    Node3a,
    /// Branch B of the first split; score boost.
    Node3b,
    /// Branch C of the first split; rotation boost.
    Node3c,
    /// Convergence node; requires any first-split branch.
    Node4,
    /// Advanced rotation speed.
    Node5,
    /// Branch A of the second split; score boost.
    Node6a,
    /// Branch B of the second split; score boost.
    Node6b,
    /// Branch C of the second split; prestige strength.
    Node6c,
    /// Ultimate node; requires every second-split branch.
    Node7,
    /// Extended main path; score boost.
    Node8,
    /// Extended main path; rotation boost.
    Node9,
    /// Unlocks the auto-promote path.
    Node10,
    /// Extended main path; score boost.
    Node11,
    /// Extended main path; rotation boost.
    Node12,
    /// Final node; boosts score and rotation together.
    Node13,
}

/// Static unlock requirement attached to a skill node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlockRequirement {
    /// The node is always available.
    None,
    /// A single predecessor must hold at least one level.
    Single(SkillNode),
    /// At least one of the listed nodes must hold a level.
    AnyOf([SkillNode; 3]),
    /// Every listed node must hold at least one level.
    AllOf([SkillNode; 3]),
}

impl SkillNode {
    /// All skill nodes in canonical tree order.
    pub const ALL: [SkillNode; SKILL_NODE_COUNT] = [
        SkillNode::Node1,
        SkillNode::Node2,
        SkillNode::Node3a,
        SkillNode::Node3b,
        SkillNode::Node3c,
        SkillNode::Node4,
        SkillNode::Node5,
        SkillNode::Node6a,
        SkillNode::Node6b,
        SkillNode::Node6c,
        SkillNode::Node7,
        SkillNode::Node8,
        SkillNode::Node9,
        SkillNode::Node10,
        SkillNode::Node11,
        SkillNode::Node12,
        SkillNode::Node13,
    ];

    /// Position of the node within [`SkillLevels`] storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Maximum level purchasable for the node.
    ///
    /// `Node3a` and `Node10` are single-use unlocks; every other node holds
    /// up to five levels.
    #[must_use]
    pub const fn max_level(&self) -> u8 {
        match self {
            Self::Node3a | Self::Node10 => 1,
            _ => 5,
        }
    }

    /// Static unlock requirement gating purchases of the node.
    #[must_use]
    pub const fn unlock_requirement(&self) -> UnlockRequirement {
        match self {
            Self::Node1 => UnlockRequirement::None,
            Self::Node2 => UnlockRequirement::Single(Self::Node1),
            Self::Node3a | Self::Node3b | Self::Node3c => {
                UnlockRequirement::Single(Self::Node2)
            }
            Self::Node4 => {
                UnlockRequirement::AnyOf([Self::Node3a, Self::Node3b, Self::Node3c])
            }
            Self::Node5 => UnlockRequirement::Single(Self::Node4),
            Self::Node6a | Self::Node6b | Self::Node6c => {
                UnlockRequirement::Single(Self::Node5)
            }
            Self::Node7 => {
                UnlockRequirement::AllOf([Self::Node6a, Self::Node6b, Self::Node6c])
            }
            Self::Node8 => UnlockRequirement::Single(Self::Node7),
            Self::Node9 => UnlockRequirement::Single(Self::Node8),
            Self::Node10 => UnlockRequirement::Single(Self::Node9),
            Self::Node11 => UnlockRequirement::Single(Self::Node10),
            Self::Node12 => UnlockRequirement::Single(Self::Node11),
            Self::Node13 => UnlockRequirement::Single(Self::Node12),
        }
    }

    /// Infinity point cost of raising the node from the provided level.
    #[must_use]
    pub const fn purchase_cost(&self, level: u8) -> u64 {
        1u64 << level
    }

    /// Stable string key used by the persistence contract.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Node1 => "node1",
            Self::Node2 => "node2",
            Self::Node3a => "node3a",
            Self::Node3b => "node3b",
            Self::Node3c => "node3c",
            Self::Node4 => "node4",
            Self::Node5 => "node5",
            Self::Node6a => "node6a",
            Self::Node6b => "node6b",
            Self::Node6c => "node6c",
            Self::Node7 => "node7",
            Self::Node8 => "node8",
            Self::Node9 => "node9",
            Self::Node10 => "node10",
            Self::Node11 => "node11",
            Self::Node12 => "node12",
            Self::Node13 => "node13",
        }
    }

    /// Resolves a persistence key back to its node, ignoring unknown keys.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|node| node.key() == key)
    }
}

/// Levels held for every skill-tree node; never reset for a save's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillLevels([u8; SKILL_NODE_COUNT]);

impl SkillLevels {
    /// Creates an empty skill-level table with every node at level 0.
    #[must_use]
    pub const fn new() -> Self {
        Self([0; SKILL_NODE_COUNT])
    }

    /// Current level held for the node.
    #[must_use]
    pub const fn level(&self, node: SkillNode) -> u8 {
        self.0[node.index()]
    }

    /// Evaluates the node's unlock requirement against current levels.
    #[must_use]
    pub fn is_unlocked(&self, node: SkillNode) -> bool {
        match node.unlock_requirement() {
            UnlockRequirement::None => true,
            UnlockRequirement::Single(required) => self.level(required) >= 1,
            UnlockRequirement::AnyOf(required) => {
                required.into_iter().any(|node| self.level(node) >= 1)
            }
            UnlockRequirement::AllOf(required) => {
                required.into_iter().all(|node| self.level(node) >= 1)
            }
        }
    }

    /// Raises the node by one level, clamped to its maximum; returns the new
    /// level.
    pub fn raise(&mut self, node: SkillNode) -> u8 {
        let level = self.0[node.index()].saturating_add(1).min(node.max_level());
        self.0[node.index()] = level;
        level
    }

    /// Overwrites the node's level, clamped to its maximum.
    pub fn set_level(&mut self, node: SkillNode, level: u8) {
        self.0[node.index()] = level.min(node.max_level());
    }
}
