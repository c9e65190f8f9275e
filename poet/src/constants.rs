//! Tuning constants for the Kalman estimator and the speedup controller.
//!
//! The "FAST" gain set (`P1 = P2 = Z1 = 0`, `MU = 1`) is the only preset
//! shipped: it collapses the compensator to a deadbeat form and is the one
//! the reference implementation actually ran with.

use crate::math::{self, Real};

/// Kalman process noise.
pub fn q() -> Real {
    math::konst(0.00001)
}

/// Kalman measurement noise.
pub fn r() -> Real {
    math::konst(0.01)
}

/// Initial a-priori state estimate.
pub fn x_hat_minus_start() -> Real {
    math::ZERO
}

/// Initial a-posteriori state estimate.
pub fn x_hat_start() -> Real {
    math::konst(0.2)
}

/// Initial a-posteriori error covariance.
pub fn p_start() -> Real {
    math::ONE
}

/// Initial a-priori error covariance.
pub fn p_minus_start() -> Real {
    math::ZERO
}

/// Initial observation matrix value.
pub fn h_start() -> Real {
    math::ZERO
}

/// Initial Kalman gain.
pub fn k_start() -> Real {
    math::ZERO
}

/// Compensator pole location 1 (deadbeat/"FAST" preset: 0).
pub fn p1() -> Real {
    math::ZERO
}

/// Compensator pole location 2 (deadbeat/"FAST" preset: 0).
pub fn p2() -> Real {
    math::ZERO
}

/// Compensator zero location (deadbeat/"FAST" preset: 0).
pub fn z1() -> Real {
    math::ZERO
}

/// Compensator plant-inversion gain (deadbeat/"FAST" preset: 1).
pub fn mu() -> Real {
    math::ONE
}

/// Initial current error seed.
pub fn e_start() -> Real {
    math::ONE
}

/// Initial lagged error seed.
pub fn eo_start() -> Real {
    math::ONE
}

/// Initial value of the scheduler's `current_action` counter.
pub const CURRENT_ACTION_START: u32 = 1;
