//! Apply scheduling: smears a period's (lower, upper) split across the next
//! `period` iterations and emits at most one apply call per iteration.

use crate::translate::Split;

/// Per-iteration bookkeeping for realizing a chosen split.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerState {
    /// Configuration used for the remaining `low_state_iters` of the period.
    pub lower_id: Option<u32>,
    /// Configuration used once `low_state_iters` reaches zero.
    pub upper_id: Option<u32>,
    /// Iterations still owed to `lower_id` within the current period.
    pub low_state_iters: u32,
    /// Last configuration id actually realized via the apply callback.
    pub last_applied_id: u32,
    /// Position within the current period; `0` means "recompute this call".
    pub current_action: u32,
    /// Iterations between recomputations.
    pub period: u32,
}

impl SchedulerState {
    /// Build a fresh scheduler state. `current_action` starts at
    /// [`crate::constants::CURRENT_ACTION_START`] so the very first call to
    /// `apply_control` does not recompute — the first recompute happens once
    /// a full period has elapsed.
    pub fn new(period: u32, last_applied_id: u32) -> Self {
        SchedulerState {
            lower_id: None,
            upper_id: None,
            low_state_iters: 0,
            last_applied_id,
            current_action: crate::constants::CURRENT_ACTION_START,
            period,
        }
    }

    /// Whether this call should trigger a full recompute (Kalman →
    /// controller → translator).
    pub fn should_recompute(&self) -> bool {
        self.current_action == 0
    }

    /// Record a freshly computed split, replacing whatever was owed before.
    pub fn apply_split(&mut self, split: Split) {
        self.lower_id = split.lower_id;
        self.upper_id = split.upper_id;
        self.low_state_iters = split.low_iters;
    }

    /// Pick the configuration to realize this iteration: `lower_id` while
    /// iterations are still owed to it, then `upper_id`, else nothing.
    pub fn choose_id(&mut self) -> Option<u32> {
        if self.low_state_iters > 0 {
            self.low_state_iters -= 1;
            self.lower_id
        } else if self.upper_id.is_some() {
            self.upper_id
        } else {
            None
        }
    }

    /// Advance the period counter, wrapping at `period`.
    pub fn advance(&mut self) {
        self.current_action = (self.current_action + 1) % self.period;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_does_not_recompute() {
        let s = SchedulerState::new(4, 0);
        assert!(!s.should_recompute());
    }

    #[test]
    fn current_action_wraps_at_period() {
        let mut s = SchedulerState::new(3, 0);
        s.current_action = 0;
        for expected in [1, 2, 0, 1] {
            s.advance();
            assert_eq!(s.current_action, expected);
        }
    }

    #[test]
    fn choose_id_drains_lower_then_falls_back_to_upper() {
        let mut s = SchedulerState::new(4, 0);
        s.apply_split(Split {
            lower_id: Some(0),
            upper_id: Some(1),
            low_iters: 2,
        });
        assert_eq!(s.choose_id(), Some(0));
        assert_eq!(s.low_state_iters, 1);
        assert_eq!(s.choose_id(), Some(0));
        assert_eq!(s.low_state_iters, 0);
        assert_eq!(s.choose_id(), Some(1));
        assert_eq!(s.choose_id(), Some(1));
    }

    #[test]
    fn choose_id_is_none_when_nothing_owed_and_no_upper() {
        let mut s = SchedulerState::new(4, 0);
        s.apply_split(Split {
            lower_id: None,
            upper_id: None,
            low_iters: 0,
        });
        assert_eq!(s.choose_id(), None);
    }

    #[test]
    fn low_state_iters_never_goes_negative() {
        let mut s = SchedulerState::new(4, 0);
        s.apply_split(Split {
            lower_id: Some(0),
            upper_id: Some(1),
            low_iters: 0,
        });
        // upper_id is set so we never touch low_state_iters; it must stay 0.
        s.choose_id();
        assert_eq!(s.low_state_iters, 0);
    }
}
