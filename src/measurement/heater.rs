use tracing::{error, info};

use crate::config::FULL_DUTY;
use crate::devices::{Delay, PwmOutput, Result};

/// Holds the heater at full duty; writes zero duty when dropped.
pub struct HeaterPulse<'a, P: PwmOutput> {
    pwm: &'a mut P,
}

impl<'a, P: PwmOutput> HeaterPulse<'a, P> {
    pub fn engage(pwm: &'a mut P) -> Result<Self> {
        // Armed before the write so a half-applied duty still gets cleared.
        let pulse = HeaterPulse { pwm };
        pulse.pwm.set_duty(FULL_DUTY)?;
        Ok(pulse)
    }
}

impl<P: PwmOutput> Drop for HeaterPulse<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.pwm.set_duty(0) {
            error!("Failed to switch heater off: {}", e);
        }
    }
}

pub struct HeaterActuator {
    interval_ms: u64,
}

impl HeaterActuator {
    pub fn new(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    /// One full-duty pulse lasting the measurement interval. The heater is
    /// back at zero duty when this returns, whatever the outcome.
    pub fn pulse<P: PwmOutput, D: Delay>(&self, pwm: &mut P, delay: &mut D) -> Result<()> {
        info!("Heater on for {} ms", self.interval_ms);
        let _pulse = HeaterPulse::engage(pwm)?;
        delay.delay_ms(self.interval_ms);
        Ok(())
    }
}
