//! Raw ADC reading to sensor voltage.
//!
//! The fitted curve works in log space:
//!
//! ```text
//! x    = log10(raw) - xc
//! logV = yo + C * (coth(x / w1) - w1 / x)
//! V    = 10 ^ logV
//! ```
//!
//! At `x == 0` both terms diverge but their difference does not:
//! `coth(u) - 1/u` tends to `u/3`, so close to the pole that series term is used
//! and the curve passes through `10 ^ yo`.

use thiserror::Error;

use crate::config::CalibrationConstants;

/// Below this distance from the pole the two terms cancel into noise.
const POLE_EPSILON: f32 = 1e-3;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    #[error("raw reading {0} carries no signal")]
    NoSignal(u16),

    #[error("raw reading {0} produced a non-finite voltage")]
    NonFinite(u16),
}

#[derive(Debug, Clone, Copy)]
pub struct CalibrationTransform {
    constants: CalibrationConstants,
}

impl CalibrationTransform {
    pub const fn new(constants: CalibrationConstants) -> Self {
        Self { constants }
    }

    /// Estimated sensor voltage for one raw reading.
    pub fn voltage(&self, raw: u16) -> Result<f32, CalibrationError> {
        if raw == 0 {
            return Err(CalibrationError::NoSignal(raw));
        }
        let CalibrationConstants { yo, xc, w1, c } = self.constants;

        let u = ((raw as f32).log10() - xc) / w1;
        let shape = if u.abs() * w1 < POLE_EPSILON {
            u / 3.0
        } else {
            1.0 / u.tanh() - 1.0 / u
        };
        let log_v = yo + c * shape;
        let volts = 10f32.powf(log_v);

        if volts.is_finite() {
            Ok(volts)
        } else {
            Err(CalibrationError::NonFinite(raw))
        }
    }
}

impl Default for CalibrationTransform {
    fn default() -> Self {
        Self::new(CalibrationConstants::default())
    }
}
