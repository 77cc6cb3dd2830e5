//! Pure, stateless multiplier stack shared by the world and systems.
//!
//! Every function here is a total function of its inputs: no global state,
//! no clock access. Any computation that could yield NaN resolves to the
//! neutral multiplier 1 so that NaN never reaches persisted state.

use crate::{SkillLevels, SkillNode, PRESTIGE_THRESHOLD_STEP, PROMOTION_MULTIPLIER_BASE};

/// Ordered soft-cap tiers `(cap, alpha)` applied to the prestige multiplier.
///
/// Tiers are walked in increasing-cap order, each transforming the previous
/// tier's output. Above a cap the value becomes `value^a * cap^(1-a)` with
/// `a = min(alpha * 10, 0.99)`, which is continuous at the boundary and
/// sub-linear beyond it.
const SOFT_CAP_TIERS: [(f64, f64); 10] = [
    (20.0, 0.35),
    (100.0, 0.18),
    (500.0, 0.09),
    (5e3, 0.045),
    (5e6, 0.03),
    (1e10, 0.025),
    (1e14, 0.03),
    (1e20, 0.04),
    (1e26, 0.045),
    (1e30, 0.05),
];

/// Skill terms feeding the score multiplier: `(node, base)` per level.
const SCORE_TERMS: [(SkillNode, f64); 9] = [
    (SkillNode::Node1, 2.0),
    (SkillNode::Node6a, 3.0),
    (SkillNode::Node6b, 1.4),
    (SkillNode::Node7, 5.0),
    (SkillNode::Node3b, 1.5),
    (SkillNode::Node4, 1.25),
    (SkillNode::Node8, 1.1),
    (SkillNode::Node11, 1.15),
    (SkillNode::Node13, 2.0),
];

/// Skill terms feeding the rotation multiplier: `(node, base)` per level.
const ROTATION_TERMS: [(SkillNode, f64); 8] = [
    (SkillNode::Node2, 1.5),
    (SkillNode::Node5, 2.0),
    (SkillNode::Node7, 5.0),
    (SkillNode::Node4, 1.25),
    (SkillNode::Node3c, 1.5),
    (SkillNode::Node9, 1.1),
    (SkillNode::Node12, 1.15),
    (SkillNode::Node13, 2.0),
];

/// Computes the soft-capped prestige multiplier from the point balance.
///
/// The raw multiplier is `sqrt(10 * points)` floored at 1; each tier of
/// [`SOFT_CAP_TIERS`] then suppresses growth above its cap.
#[must_use]
pub fn prestige_multiplier(points: f64) -> f64 {
    // NaN or negative input degenerates to the raw floor of 1 here because
    // f64::max ignores a NaN operand.
    let mut value = (10.0 * points).sqrt().max(1.0);

    for (cap, alpha) in SOFT_CAP_TIERS {
        if value > cap {
            let a = (alpha * 10.0).min(0.99);
            value = value.powf(a) * cap.powf(1.0 - a);
        }
    }

    nan_guard(value.max(1.0))
}

/// Reward multiplier granted by the promotion level: `10^level`.
#[must_use]
pub fn promotion_multiplier(level: u32) -> f64 {
    nan_guard(PROMOTION_MULTIPLIER_BASE.powf(f64::from(level)))
}

/// Product of the nine leveled skill terms scaling score gain.
#[must_use]
pub fn score_multiplier(levels: &SkillLevels) -> f64 {
    skill_product(&SCORE_TERMS, levels)
}

/// Product of the eight leveled skill terms scaling revolution rewards.
#[must_use]
pub fn rotation_multiplier(levels: &SkillLevels) -> f64 {
    skill_product(&ROTATION_TERMS, levels)
}

/// Multiplier applied to prestige point gain: `3^level(6c) * 5^level(7)`.
#[must_use]
pub fn prestige_gain_multiplier(levels: &SkillLevels) -> f64 {
    let strong = 3f64.powi(i32::from(levels.level(SkillNode::Node6c)));
    let ultimate = 5f64.powi(i32::from(levels.level(SkillNode::Node7)));
    nan_guard(strong * ultimate)
}

/// Boost applied to prestige strength accumulation: `3^level(6c)`.
#[must_use]
pub fn prestige_strength_boost(levels: &SkillLevels) -> f64 {
    nan_guard(3f64.powi(i32::from(levels.level(SkillNode::Node6c))))
}

/// Prestige points awarded by converting the provided score right now.
///
/// One point is earned per completed multiple of 1,000,000 score beyond the
/// multiples already converted, scaled by the gain multiplier and floored.
/// Non-finite scores award nothing; the overflow sentinel belongs to the
/// Infinity tier, not to Prestige.
#[must_use]
pub fn prestige_gain(score: f64, last_prestige_score: f64, levels: &SkillLevels) -> f64 {
    if !score.is_finite() || score < PRESTIGE_THRESHOLD_STEP {
        return 0.0;
    }

    let total = (score / PRESTIGE_THRESHOLD_STEP).floor();
    let converted = (last_prestige_score.max(0.0) / PRESTIGE_THRESHOLD_STEP).floor();
    let base = (total - converted).max(0.0);
    let gain = (base * prestige_gain_multiplier(levels)).floor();
    if gain.is_nan() {
        0.0
    } else {
        gain
    }
}

fn skill_product(terms: &[(SkillNode, f64)], levels: &SkillLevels) -> f64 {
    let product = terms
        .iter()
        .map(|(node, base)| base.powi(i32::from(levels.level(*node))))
        .product();
    nan_guard(product)
}

fn nan_guard(value: f64) -> f64 {
    if value.is_nan() {
        1.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkillLevels;

    #[test]
    fn prestige_multiplier_never_drops_below_one() {
        for points in [0.0, 0.05, 1.0, 40.0, 1e6, 1e20, 1e60, 1e90] {
            assert!(prestige_multiplier(points) >= 1.0, "points {points}");
        }
        assert_eq!(prestige_multiplier(f64::NAN), 1.0);
        assert_eq!(prestige_multiplier(-5.0), 1.0);
    }

    #[test]
    fn prestige_multiplier_is_non_decreasing() {
        let mut previous = prestige_multiplier(0.0);
        let mut points = 0.1;
        while points < 1e120 {
            let current = prestige_multiplier(points);
            assert!(
                current >= previous,
                "multiplier decreased near {points}: {current} < {previous}"
            );
            previous = current;
            points *= 3.0;
        }
    }

    #[test]
    fn prestige_multiplier_is_continuous_at_each_cap() {
        // Walk the raw sqrt value up to each cap from both sides and require
        // the outputs to converge.
        for cap in [20.0, 100.0, 500.0, 5e3, 5e6, 1e10, 1e14] {
            // points such that sqrt(10 * points) == cap
            let points_at_cap = cap * cap / 10.0;
            let below = prestige_multiplier(points_at_cap * (1.0 - 1e-9));
            let above = prestige_multiplier(points_at_cap * (1.0 + 1e-9));
            let gap = (above - below).abs();
            assert!(
                gap <= below * 1e-6,
                "discontinuity at cap {cap}: below {below}, above {above}"
            );
        }
    }

    #[test]
    fn prestige_multiplier_matches_first_tier_closed_form() {
        // sqrt(10 * 1000) = 100 sits above the 20 cap, where the tier alpha
        // of 0.35 clamps to a = 0.99, and below every later cap.
        let points: f64 = 1000.0;
        let raw = (10.0 * points).sqrt();
        let a = 0.99;
        let expected = raw.powf(a) * 20f64.powf(1.0 - a);
        assert!((prestige_multiplier(points) - expected).abs() < 1e-9);
    }

    #[test]
    fn promotion_multiplier_is_a_power_of_ten() {
        assert_eq!(promotion_multiplier(0), 1.0);
        assert_eq!(promotion_multiplier(1), 10.0);
        assert_eq!(promotion_multiplier(3), 1000.0);
    }

    #[test]
    fn unleveled_skills_yield_neutral_multipliers() {
        let levels = SkillLevels::new();
        assert_eq!(score_multiplier(&levels), 1.0);
        assert_eq!(rotation_multiplier(&levels), 1.0);
        assert_eq!(prestige_gain_multiplier(&levels), 1.0);
        assert_eq!(prestige_strength_boost(&levels), 1.0);
    }

    #[test]
    fn score_multiplier_compounds_each_term() {
        let mut levels = SkillLevels::new();
        levels.set_level(SkillNode::Node1, 2);
        levels.set_level(SkillNode::Node6b, 1);
        let expected = 2f64.powi(2) * 1.4;
        assert!((score_multiplier(&levels) - expected).abs() < 1e-12);
    }

    #[test]
    fn rotation_multiplier_compounds_each_term() {
        let mut levels = SkillLevels::new();
        levels.set_level(SkillNode::Node2, 1);
        levels.set_level(SkillNode::Node13, 3);
        let expected = 1.5 * 8.0;
        assert!((rotation_multiplier(&levels) - expected).abs() < 1e-12);
    }

    #[test]
    fn prestige_gain_counts_new_millions_only() {
        let levels = SkillLevels::new();
        assert_eq!(prestige_gain(999_999.0, 0.0, &levels), 0.0);
        assert_eq!(prestige_gain(1_000_000.0, 0.0, &levels), 1.0);
        assert_eq!(prestige_gain(3_500_000.0, 0.0, &levels), 3.0);
        assert_eq!(prestige_gain(3_500_000.0, 2_000_000.0, &levels), 1.0);
    }

    #[test]
    fn prestige_gain_ignores_non_finite_scores() {
        let levels = SkillLevels::new();
        assert_eq!(prestige_gain(f64::INFINITY, 0.0, &levels), 0.0);
        assert_eq!(prestige_gain(f64::NAN, 0.0, &levels), 0.0);
    }

    #[test]
    fn prestige_gain_scales_with_the_gain_multiplier() {
        let mut levels = SkillLevels::new();
        levels.set_level(SkillNode::Node6c, 1);
        levels.set_level(SkillNode::Node7, 1);
        assert_eq!(prestige_gain(2_000_000.0, 0.0, &levels), 30.0);
    }
}
