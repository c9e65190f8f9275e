//! POET — a closed-loop adaptive controller.
//!
//! An application periodically reports an observed performance rate; this
//! engine decides which pre-characterized system configuration should be
//! active on each subsequent iteration so the rate converges toward a
//! target while minimizing a per-configuration cost. The host realizes the
//! chosen configuration through a callback supplied at [`PoetState::init`].
//!
//! The numeric backing (`f64` or Q16.16 fixed point) is a build-time choice;
//! see [`math`].

pub mod constants;
pub mod controller;
pub mod error;
pub mod kalman;
pub mod log;
pub mod math;
pub mod scheduler;
mod state;
pub mod translate;

pub use error::{PoetError, PoetResult};
pub use log::{LogRecord, LogRing};
pub use state::{ApplyFn, CurrentStateFn, PoetState, ENV_DISABLE_APPLY, ENV_DISABLE_CONTROL};
pub use translate::ControlState;
