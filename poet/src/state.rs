//! Public surface: `PoetState` ties the numeric kernel, Kalman estimator,
//! controller, translator and scheduler together behind `init` /
//! `set_performance_goal` / `apply_control` / `destroy`.

use std::path::Path;

use tracing::{debug, info, trace};

use crate::controller::ControllerState;
use crate::error::{PoetError, PoetResult};
use crate::kalman::FilterState;
use crate::log::{LogRecord, LogRing};
use crate::math::{self, Real};
use crate::scheduler::SchedulerState;
use crate::translate::{translate_n2_with_time, ControlState};

/// Env var that, when set to anything, bypasses the control engine entirely.
pub const ENV_DISABLE_CONTROL: &str = "POET_DISABLE_CONTROL";
/// Env var that, when set to anything, suppresses the apply callback only.
pub const ENV_DISABLE_APPLY: &str = "POET_DISABLE_APPLY";

/// Host-supplied callback realizing a chosen configuration on the system.
/// Invoked at most once per `apply_control`, never when `new_id == last_id`.
pub type ApplyFn = Box<dyn FnMut(u32, u32) + Send>;

/// Host-supplied callback reporting the configuration currently active,
/// queried once during `init`. `None` means "unknown" and defers to the
/// default of the highest-id (assumed highest-capability) state.
pub type CurrentStateFn = Box<dyn FnOnce() -> Option<u32> + Send>;

fn env_flag_set(name: &str) -> bool {
    std::env::var_os(name).is_some()
}

/// Owns the full controller state for one application instance.
pub struct PoetState {
    states: Vec<ControlState>,
    u_max: Real,
    perf_goal: Real,
    filter: FilterState,
    controller: ControllerState,
    scheduler: SchedulerState,
    log: Option<LogRing>,
    apply_fn: Option<ApplyFn>,
}

impl PoetState {
    /// Construct a new controller instance.
    ///
    /// `control_states` must carry ids `0..N` consecutively; `period` and,
    /// when `log_path` is supplied, `buffer_depth` must be positive.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        perf_goal: f64,
        control_states: Vec<ControlState>,
        apply_fn: Option<ApplyFn>,
        current_fn: Option<CurrentStateFn>,
        period: u32,
        buffer_depth: u32,
        log_path: Option<&Path>,
    ) -> PoetResult<Self> {
        if perf_goal <= 0.0 {
            return Err(PoetError::InvalidPerfGoal { goal: perf_goal });
        }
        if control_states.is_empty() {
            return Err(PoetError::InvalidNumStates {
                num_states: control_states.len(),
            });
        }
        let ids: Vec<u32> = control_states.iter().map(|s| s.id).collect();
        let expected: Vec<u32> = (0..control_states.len() as u32).collect();
        if ids != expected {
            return Err(PoetError::NonConsecutiveIds {
                expected: control_states.len(),
                found: ids,
            });
        }
        if period == 0 {
            return Err(PoetError::InvalidPeriod);
        }
        if log_path.is_some() && buffer_depth == 0 {
            return Err(PoetError::InvalidBufferDepth);
        }

        let n = control_states.len() as u32;
        let u_max = control_states
            .iter()
            .map(|s| s.speedup)
            .fold(control_states[0].speedup, math::rmax);

        let last_id = current_fn
            .and_then(|f| f())
            .filter(|&id| id < n)
            .unwrap_or(n - 1);

        let log = match log_path {
            Some(path) => Some(LogRing::open(path, period, buffer_depth).map_err(|source| {
                PoetError::LogOpen {
                    path: path.display().to_string(),
                    source,
                }
            })?),
            None => None,
        };

        info!(
            num_states = n,
            last_id,
            period,
            "poet controller initialized"
        );

        Ok(PoetState {
            controller: ControllerState::new(control_states[last_id as usize].speedup, u_max),
            states: control_states,
            u_max,
            perf_goal: math::konst(perf_goal),
            filter: FilterState::default(),
            scheduler: SchedulerState::new(period, last_id),
            log,
            apply_fn,
        })
    }

    /// Current desired speedup, chiefly for tests and diagnostics.
    pub fn current_speedup(&self) -> f64 {
        math::to_f64(self.controller.u)
    }

    /// Id last realized via the apply callback (or the initial default).
    pub fn last_applied_id(&self) -> u32 {
        self.scheduler.last_applied_id
    }

    /// Update the performance target. Silently ignored if `new_goal <= 0`.
    pub fn set_performance_goal(&mut self, new_goal: f64) {
        if new_goal <= 0.0 {
            debug!(new_goal, "ignoring non-positive performance goal");
            return;
        }
        self.perf_goal = math::konst(new_goal);
    }

    /// Advance the controller by one iteration.
    ///
    /// `pwr` is accepted but unused by the current compensator; it is
    /// preserved in the signature for a future power-aware controller.
    pub fn apply_control(&mut self, tag: u64, perf: f64, _pwr: f64) {
        if env_flag_set(ENV_DISABLE_CONTROL) {
            trace!(tag, "control disabled, skipping iteration");
            return;
        }

        let perf_r = math::konst(perf);

        if self.scheduler.should_recompute() {
            self.recompute(tag, perf_r);
        }

        let chosen = self.scheduler.choose_id();
        if let Some(new_id) = chosen {
            let last_id = self.scheduler.last_applied_id;
            if new_id != last_id {
                if !env_flag_set(ENV_DISABLE_APPLY) {
                    if let Some(apply) = self.apply_fn.as_mut() {
                        debug!(new_id, last_id, "applying configuration change");
                        apply(new_id, last_id);
                    }
                } else {
                    trace!(new_id, last_id, "apply suppressed by env kill switch");
                }
            }
            self.scheduler.last_applied_id = new_id;
        }

        self.scheduler.advance();
    }

    fn recompute(&mut self, tag: u64, perf: Real) {
        let workload = self.filter.estimate_base_workload(perf, self.controller.u);
        let error = self.perf_goal - perf;
        let u = self.controller.calculate_xup(error, workload);

        let split = translate_n2_with_time(&self.states, u, self.scheduler.period);
        trace!(
            u = math::to_f64(u),
            lower = ?split.lower_id,
            upper = ?split.upper_id,
            low_iters = split.low_iters,
            "recomputed split"
        );
        self.scheduler.apply_split(split);

        if let Some(log) = self.log.as_mut() {
            let record = LogRecord::snapshot(
                tag,
                perf,
                self.filter,
                &self.controller,
                workload,
                split.lower_id,
                split.upper_id,
                self.scheduler.low_state_iters,
            );
            if let Err(err) = log.push(record) {
                debug!(error = %err, "failed to write log record");
            }
        }
    }

    /// Consume and tear down the controller, flushing any buffered log
    /// records. Equivalent to letting the value drop, provided for parity
    /// with the C-style `init`/`destroy` pair.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for PoetState {
    fn drop(&mut self) {
        if let Some(log) = self.log.as_mut() {
            // The source never flushes a partial ring on close; we do, since
            // a host that wants those trailing records has no other way to
            // recover them once the controller is gone.
            if let Err(err) = log.flush() {
                debug!(error = %err, "failed to flush log on destroy");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn state(id: u32, speedup: f64, cost: f64) -> ControlState {
        ControlState {
            id,
            speedup: math::konst(speedup),
            cost: math::konst(cost),
        }
    }

    #[test]
    fn init_rejects_non_positive_perf_goal() {
        let err = PoetState::init(0.0, vec![state(0, 1.0, 1.0)], None, None, 1, 0, None);
        assert!(matches!(err, Err(PoetError::InvalidPerfGoal { .. })));
    }

    #[test]
    fn init_rejects_empty_states() {
        let err = PoetState::init(1.0, vec![], None, None, 1, 0, None);
        assert!(matches!(err, Err(PoetError::InvalidNumStates { .. })));
    }

    #[test]
    fn init_rejects_non_consecutive_ids() {
        let states = vec![state(0, 1.0, 1.0), state(2, 2.0, 2.0)];
        let err = PoetState::init(1.0, states, None, None, 1, 0, None);
        assert!(matches!(err, Err(PoetError::NonConsecutiveIds { .. })));
    }

    #[test]
    fn init_rejects_zero_period() {
        let err = PoetState::init(1.0, vec![state(0, 1.0, 1.0)], None, None, 0, 0, None);
        assert!(matches!(err, Err(PoetError::InvalidPeriod)));
    }

    #[test]
    fn init_defaults_last_id_to_highest_state() {
        let states = vec![state(0, 1.0, 1.0), state(1, 2.0, 2.0)];
        let p = PoetState::init(1.0, states, None, None, 4, 0, None).unwrap();
        assert_eq!(p.last_applied_id(), 1);
        assert_eq!(p.current_speedup(), 2.0);
    }

    #[test]
    fn degenerate_period_one_converges_to_faster_state() {
        let states = vec![state(0, 1.0, 1.0), state(1, 2.0, 1.5)];
        let mut p = PoetState::init(2.0, states, None, None, 1, 0, None).unwrap();
        for tag in 0..20u64 {
            p.apply_control(tag, 1.0, 0.0);
        }
        assert_eq!(p.last_applied_id(), 1);
    }

    #[test]
    fn kill_switch_disables_everything() {
        unsafe { std::env::set_var(ENV_DISABLE_CONTROL, "1") };
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let states = vec![state(0, 1.0, 1.0), state(1, 2.0, 1.5)];
        let apply: ApplyFn = Box::new(move |_new, _last| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        let mut p = PoetState::init(2.0, states, Some(apply), None, 1, 0, None).unwrap();
        let before = p.last_applied_id();
        for tag in 0..100u64 {
            p.apply_control(tag, 1.0, 0.0);
        }
        unsafe { std::env::remove_var(ENV_DISABLE_CONTROL) };
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(p.last_applied_id(), before);
    }

    #[test]
    fn apply_disable_suppresses_callback_but_not_logging() {
        unsafe { std::env::set_var(ENV_DISABLE_APPLY, "1") };
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let states = vec![state(0, 1.0, 1.0), state(1, 2.0, 1.5)];
        let apply: ApplyFn = Box::new(move |_new, _last| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("poet.log");
        let mut p =
            PoetState::init(2.0, states, Some(apply), None, 1, 4, Some(&log_path)).unwrap();
        for tag in 0..100u64 {
            p.apply_control(tag, 1.0, 0.0);
        }
        unsafe { std::env::remove_var(ENV_DISABLE_APPLY) };
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        p.destroy();
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.lines().count() > 1, "expected header plus records");
    }

    #[test]
    fn exact_match_settles_with_single_apply() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let states = vec![state(0, 1.0, 1.0), state(1, 2.0, 2.0), state(2, 4.0, 5.0)];
        let apply: ApplyFn = Box::new(move |_new, _last| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        let mut p = PoetState::init(2.0, states, Some(apply), None, 4, 0, None).unwrap();
        // See the identical note in tests/scenarios.rs: a perf pinned equal
        // to the goal never produces a nonzero error, so the plant has to
        // react to the controller's own speedup for `u` to move at all.
        for tag in 0..40u64 {
            let perf = 2.0 * p.current_speedup();
            p.apply_control(tag, perf, 0.0);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!((p.current_speedup() - 1.0).abs() < 0.05);
    }
}
