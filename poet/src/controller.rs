//! Discrete-time 2-pole / 1-zero compensator producing a desired speedup
//! `u` from rate error, clamped to `[1, u_max]`.

use crate::constants;
use crate::math::{self, Real};

/// Controller state: current/lagged speedup and error, plus the clamp ceiling.
#[derive(Clone, Copy, Debug)]
pub struct ControllerState {
    /// Most recently computed speedup.
    pub u: Real,
    /// Speedup one step ago.
    pub uo: Real,
    /// Speedup two steps ago.
    pub uoo: Real,
    /// Current rate error.
    pub e: Real,
    /// Lagged rate error.
    pub eo: Real,
    /// Upper clamp bound: the fastest available configuration's speedup.
    pub u_max: Real,
}

impl ControllerState {
    /// Seed the controller so that `u == uo == uoo == initial_speedup`.
    pub fn new(initial_speedup: Real, u_max: Real) -> Self {
        ControllerState {
            u: initial_speedup,
            uo: initial_speedup,
            uoo: initial_speedup,
            e: constants::e_start(),
            eo: constants::eo_start(),
            u_max,
        }
    }

    /// Compute the next desired speedup from the rate error `e = goal - perf`
    /// and the Kalman-estimated workload `w`, then clamp and rotate state.
    pub fn calculate_xup(&mut self, e: Real, w: Real) -> Real {
        let p1 = constants::p1();
        let p2 = constants::p2();
        let z1 = constants::z1();
        let mu = constants::mu();
        let one = math::ONE;

        let a = p1 * z1 + p2 * z1 - mu * p1 * p2 + mu * p2 - p2 + mu * p1 - p1 - mu;
        let b = mu * p1 * p2 * z1 - p1 * p2 * z1 - mu * p2 * z1 - mu * p1 * z1 + mu * z1 + p1 * p2;
        let c = ((mu - mu * p1) * p2 + mu * p1 - mu) * w;
        let d = ((mu * p1 - mu) * p2 - mu * p1 + mu) * w * z1;
        let f = one / (z1 - one);

        let u = f * (a * self.uo + b * self.uoo + c * e + d * self.eo);
        let u = math::clamp(u, one, self.u_max);

        self.uoo = self.uo;
        self.uo = u;
        self.e = e;
        self.eo = self.e;
        self.u = u;

        u
    }
}
