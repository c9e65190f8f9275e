//! One-dimensional Kalman filter estimating base per-iteration cost,
//! assuming no speedup is applied.

use crate::constants;
use crate::math::{self, Real};

/// Filter state carried between recomputations.
#[derive(Clone, Copy, Debug)]
pub struct FilterState {
    /// A-priori state estimate.
    pub x_hat_minus: Real,
    /// A-posteriori state estimate.
    pub x_hat: Real,
    /// A-priori error covariance.
    pub p_minus: Real,
    /// Observation matrix: the speedup applied when the observation was taken.
    pub h: Real,
    /// Kalman gain.
    pub k: Real,
    /// A-posteriori error covariance.
    pub p: Real,
}

impl Default for FilterState {
    fn default() -> Self {
        FilterState {
            x_hat_minus: constants::x_hat_minus_start(),
            x_hat: constants::x_hat_start(),
            p_minus: constants::p_minus_start(),
            h: constants::h_start(),
            k: constants::k_start(),
            p: constants::p_start(),
        }
    }
}

impl FilterState {
    /// Update the filter from an observed rate `y` and the speedup `h_k`
    /// applied when that rate was measured. Returns the estimated base
    /// workload `w = 1 / x_hat`.
    ///
    /// Using the previously applied speedup as the observation matrix,
    /// rather than a constant `1`, is what lets the compensator see
    /// through the plant gain; a constant `H` would make the observed
    /// rate look independent of the chosen configuration.
    pub fn estimate_base_workload(&mut self, y: Real, h_k: Real) -> Real {
        self.x_hat_minus = self.x_hat;
        self.p_minus = self.p + constants::q();

        let denom = h_k * self.p_minus * h_k + constants::r();
        self.k = (self.p_minus * h_k) / denom;

        let residual = y - h_k * self.x_hat_minus;
        self.x_hat = self.x_hat_minus + self.k * residual;

        self.p = (math::ONE - self.k * h_k) * self.p_minus;
        self.h = h_k;

        math::ONE / self.x_hat
    }
}
