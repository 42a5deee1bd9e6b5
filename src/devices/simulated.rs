use tracing::{info, warn, debug};

use super::{AnalogInput, Barometer, DeviceError, DigitalOutput, PwmOutput, Result};

/// Host stand-in for the ADC.
///
/// Each known pin sits at a fixed baseline with a small deterministic ripple,
/// so repeated cycles produce stable but not identical averages.
pub struct SimulatedAdc {
    baselines: Vec<(u8, u16)>, // (pin, raw baseline)
    adc_max: u16,
    tick: u32,
}

impl SimulatedAdc {
    pub fn new(baselines: &[(u8, u16)], adc_max: u16) -> Self {
        info!("Initializing simulated ADC with {} channels", baselines.len());
        SimulatedAdc {
            baselines: baselines.to_vec(),
            adc_max,
            tick: 0,
        }
    }
}

impl AnalogInput for SimulatedAdc {
    fn read_raw(&mut self, pin: u8) -> Result<u16> {
        let (_, baseline) = self
            .baselines
            .iter()
            .find(|(p, _)| *p == pin)
            .copied()
            .ok_or(DeviceError::InvalidPin(pin))?;
        self.tick = self.tick.wrapping_add(1);
        // Triangle ripple of +/-8 counts.
        let phase = (self.tick % 32) as i32;
        let ripple = if phase < 16 { phase - 8 } else { 24 - phase };
        let raw = (baseline as i32 + ripple).clamp(0, self.adc_max as i32);
        Ok(raw as u16)
    }
}

pub struct SimulatedPwm {
    pin: u8,
}

impl SimulatedPwm {
    pub fn new(pin: u8) -> Self {
        SimulatedPwm { pin }
    }
}

impl PwmOutput for SimulatedPwm {
    fn set_duty(&mut self, duty: u8) -> Result<()> {
        info!("PWM pin {} duty set to {}", self.pin, duty);
        Ok(())
    }
}

pub struct SimulatedLed {
    pin: u8,
}

impl SimulatedLed {
    pub fn new(pin: u8) -> Self {
        SimulatedLed { pin }
    }
}

impl DigitalOutput for SimulatedLed {
    fn set_level(&mut self, high: bool) -> Result<()> {
        info!("LED pin {} {}", self.pin, if high { "HIGH" } else { "LOW" });
        Ok(())
    }
}

/// Barometer that either answers every probe or none.
pub struct SimulatedBarometer {
    detected: bool,
    probes: u32,
}

impl SimulatedBarometer {
    pub fn new(detected: bool) -> Self {
        SimulatedBarometer { detected, probes: 0 }
    }
}

impl Barometer for SimulatedBarometer {
    fn begin(&mut self) -> Result<()> {
        self.probes += 1;
        if !self.detected {
            warn!("Barometer probe {} got no answer", self.probes);
            return Err(DeviceError::NotDetected("BMP180".to_string()));
        }
        debug!("Barometer answered on probe {}", self.probes);
        Ok(())
    }
}
