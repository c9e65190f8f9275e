//! Cost-minimizing translator: given a desired speedup, pick the pair of
//! configurations bracketing it and apportion iterations between them.

use crate::math::{self, Real};

/// A host-characterized operating point. Immutable after `init`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlState {
    /// Index into the host's configuration table.
    pub id: u32,
    /// Dimensionless speedup relative to the `speedup == 1` baseline.
    pub speedup: Real,
    /// Steady-state cost per unit time in this configuration.
    pub cost: Real,
}

/// Result of one translation: the chosen pair and the iteration split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Split {
    /// Configuration used for the first `low_iters` iterations of the period.
    pub lower_id: Option<u32>,
    /// Configuration used for the remaining iterations of the period.
    pub upper_id: Option<u32>,
    /// Iterations (of `period`) spent in `lower_id`.
    pub low_iters: u32,
}

/// Compute the fraction `x` of the period to spend in `lower`, given both
/// speedups and the target. Either side may be left unset (`None`), in which
/// case it is treated as equal to the other side — this mirrors calling the
/// divider mid-enumeration, before both sides of a pair are known.
pub fn time_division_fraction(lower: Option<Real>, upper: Option<Real>, target: Real) -> Real {
    let (lower, upper) = match (lower, upper) {
        (Some(l), Some(u)) => (l, u),
        (Some(l), None) => (l, l),
        (None, Some(u)) => (u, u),
        (None, None) => return math::ZERO,
    };
    if upper == lower {
        return math::ZERO;
    }
    let numerator = upper * lower - target * lower;
    let denominator = upper * target - target * lower;
    numerator / denominator
}

/// Convert a fraction of the period into a clamped iteration count.
pub fn fraction_to_iters(x: Real, period: u32) -> u32 {
    let raw = math::round_to_int(x * math::from_int(period as i32));
    raw.clamp(0, period as i32) as u32
}

/// Period cost of splitting `period` iterations between `lower` and `upper`
/// with `low_iters` spent in `lower`.
pub fn period_cost(lower: &ControlState, upper: &ControlState, low_iters: u32, period: u32) -> Real {
    let low_iters_r = math::from_int(low_iters as i32);
    let high_iters_r = math::from_int((period - low_iters) as i32);
    (low_iters_r / lower.speedup) * lower.cost + (high_iters_r / upper.speedup) * upper.cost
}

/// Enumerate all `(lower, upper)` pairs bracketing `target` in O(N^2) and
/// return the one minimizing period cost, along with its iteration split.
///
/// Equality is allowed on both sides: a single state that exactly matches
/// `target` is a legal pair (lower == upper), with `low_iters == 0`. If no
/// state has `speedup >= target` the selection leaves both ids unset rather
/// than panicking; this cannot happen in practice because the controller
/// clamps its output to `u_max`, but the translator must not assume it.
pub fn translate_n2_with_time(states: &[ControlState], target: Real, period: u32) -> Split {
    let mut best_cost = math::BIG;
    let mut best: Option<(usize, usize, u32)> = None;

    for (i, upper) in states.iter().enumerate() {
        if upper.speedup < target {
            continue; // cannot serve as upper bound
        }
        for (j, lower) in states.iter().enumerate() {
            if lower.speedup > target {
                continue; // cannot serve as lower bound
            }
            let x = time_division_fraction(Some(lower.speedup), Some(upper.speedup), target);
            let low_iters = fraction_to_iters(x, period);
            let cost = period_cost(lower, upper, low_iters, period);
            if cost < best_cost {
                best_cost = cost;
                best = Some((j, i, low_iters));
            }
        }
    }

    match best {
        Some((j, i, low_iters)) => Split {
            lower_id: Some(states[j].id),
            upper_id: Some(states[i].id),
            low_iters,
        },
        None => Split {
            lower_id: None,
            upper_id: None,
            low_iters: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: u32, speedup: f64, cost: f64) -> ControlState {
        ControlState {
            id,
            speedup: math::konst(speedup),
            cost: math::konst(cost),
        }
    }

    #[test]
    fn exact_match_selects_single_state_with_zero_low_iters() {
        let states = [state(0, 1.0, 1.0), state(1, 2.0, 2.0), state(2, 4.0, 5.0)];
        let split = translate_n2_with_time(&states, math::konst(1.0), 10);
        assert_eq!(split.lower_id, Some(0));
        assert_eq!(split.upper_id, Some(0));
        assert_eq!(split.low_iters, 0);
    }

    #[test]
    fn time_division_required_splits_with_pinned_rounding() {
        let states = [state(0, 1.0, 1.0), state(1, 3.0, 10.0)];
        // x = (3*1 - 2*1) / (3*2 - 2*1) = 1/4 -> low_iters = round(0.25*10) = round(2.5) = 3
        // (half-away-from-zero)
        let split = translate_n2_with_time(&states, math::konst(2.0), 10);
        assert_eq!(split.lower_id, Some(0));
        assert_eq!(split.upper_id, Some(1));
        assert_eq!(split.low_iters, 3);
    }

    #[test]
    fn no_state_covers_target_leaves_both_unset() {
        let states = [state(0, 1.0, 1.0), state(1, 2.0, 2.0)];
        let split = translate_n2_with_time(&states, math::konst(10.0), 5);
        assert_eq!(split.lower_id, None);
        assert_eq!(split.upper_id, None);
        assert_eq!(split.low_iters, 0);
    }

    #[test]
    fn prefers_strictly_cheaper_pair() {
        // Two brackets of {1.5}: (0,1) cost vs (0,2) cost; state 2 is cheaper.
        let states = [state(0, 1.0, 1.0), state(1, 2.0, 10.0), state(2, 2.0, 1.0)];
        let split = translate_n2_with_time(&states, math::konst(1.5), 10);
        assert_eq!(split.lower_id, Some(0));
        assert_eq!(split.upper_id, Some(2));
    }

    #[test]
    fn time_division_fraction_treats_unset_side_as_equal() {
        let x = time_division_fraction(Some(math::konst(2.0)), None, math::konst(2.0));
        assert_eq!(math::to_f64(x), 0.0);
    }
}
