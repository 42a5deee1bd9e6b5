pub mod calibration;
pub mod data;
pub mod heater;
pub mod sampler;

use crate::config::{NodeConfig, CHANNEL_COUNT, SEPARATOR};
use crate::devices::{AnalogInput, Delay, LineTransport, PwmOutput};
use calibration::CalibrationTransform;
use data::CycleRecord;
use heater::HeaterActuator;
use sampler::{ChannelAverage, ChannelSampler};
use tracing::{debug, error, info, warn};

/// One heater pulse, one sampling window, one block of output lines.
pub struct MeasurementCycle<'a> {
    heater: HeaterActuator,
    sampler: ChannelSampler<'a>,
}

impl<'a> MeasurementCycle<'a> {
    pub fn new(config: &'a NodeConfig) -> Self {
        Self {
            heater: HeaterActuator::new(config.measurement_interval_ms),
            sampler: ChannelSampler::new(
                &config.channels,
                CalibrationTransform::new(config.calibration),
                config.samples_per_cycle,
                config.sample_delay_ms,
            ),
        }
    }

    /// Run the cycle to completion and emit its report.
    ///
    /// Returns `None` when the heater could not be driven; nothing is sampled
    /// or emitted in that case.
    pub fn run<A, P, T, D>(
        &self,
        cycle: u64,
        adc: &mut A,
        pwm: &mut P,
        link: &mut T,
        delay: &mut D,
    ) -> Option<[ChannelAverage; CHANNEL_COUNT]>
    where
        A: AnalogInput,
        P: PwmOutput,
        T: LineTransport,
        D: Delay,
    {
        info!("Starting measurement cycle {}", cycle);

        if let Err(e) = self.heater.pulse(pwm, delay) {
            error!("Heater pulse failed, abandoning cycle {}: {}", cycle, e);
            return None;
        }

        let averages = self.sampler.sample(adc, delay);

        let mut lines: Vec<String> = averages.iter().map(format_reading).collect();
        lines.push(SEPARATOR.to_string());
        for line in &lines {
            if let Err(e) = link.write_line(line) {
                warn!("Dropped output line '{}': {}", line, e);
            }
        }

        match serde_json::to_string(&CycleRecord::new(cycle, &averages)) {
            Ok(json) => debug!("Cycle record: {}", json),
            Err(e) => warn!("Failed to serialize cycle record: {}", e),
        }
        info!("Measurement cycle {} complete", cycle);

        Some(averages)
    }
}

/// `Sensor <label>: <volts>V`, two decimals; `nan` when no sample was valid.
pub fn format_reading(avg: &ChannelAverage) -> String {
    match avg.volts {
        Some(volts) => format!("Sensor {}: {:.2}V", avg.channel.label, volts),
        None => format!("Sensor {}: nanV", avg.channel.label),
    }
}
