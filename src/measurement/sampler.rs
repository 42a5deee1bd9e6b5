use tracing::{debug, warn};

use super::calibration::CalibrationTransform;
use crate::config::{Channel, CHANNEL_COUNT};
use crate::devices::{AnalogInput, Delay};

/// Running sum of calibrated voltages for one channel during one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelAccumulator {
    sum: f32,
    count: u32,
    skipped: u32,
}

impl ChannelAccumulator {
    fn add(&mut self, volts: f32) {
        self.sum += volts;
        self.count += 1;
    }

    fn skip(&mut self) {
        self.skipped += 1;
    }

    fn average(&self) -> Option<f32> {
        (self.count > 0).then(|| self.sum / self.count as f32)
    }
}

/// Mean calibrated voltage of one channel over one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelAverage {
    pub channel: Channel,
    pub volts: Option<f32>, // None when every sample was rejected
    pub valid_samples: u32,
    pub skipped_samples: u32,
}

pub struct ChannelSampler<'a> {
    channels: &'a [Channel; CHANNEL_COUNT],
    transform: CalibrationTransform,
    samples: u32,
    sample_delay_ms: u64,
}

impl<'a> ChannelSampler<'a> {
    pub fn new(
        channels: &'a [Channel; CHANNEL_COUNT],
        transform: CalibrationTransform,
        samples: u32,
        sample_delay_ms: u64,
    ) -> Self {
        Self {
            channels,
            transform,
            samples,
            sample_delay_ms,
        }
    }

    /// Sweep every channel `samples` times and average the valid readings.
    ///
    /// Channels are read in table order on every sweep. Readings the ADC fails
    /// to deliver or the calibration rejects are left out of that channel's mean.
    pub fn sample<A: AnalogInput, D: Delay>(
        &self,
        adc: &mut A,
        delay: &mut D,
    ) -> [ChannelAverage; CHANNEL_COUNT] {
        let mut acc = [ChannelAccumulator::default(); CHANNEL_COUNT];

        for _ in 0..self.samples {
            for (channel, slot) in self.channels.iter().zip(acc.iter_mut()) {
                let raw = match adc.read_raw(channel.pin) {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!("ADC read failed on pin {}: {}", channel.pin, e);
                        slot.skip();
                        continue;
                    }
                };
                match self.transform.voltage(raw) {
                    Ok(volts) => slot.add(volts),
                    Err(e) => {
                        debug!("Skipping sample on {}: {}", channel.label, e);
                        slot.skip();
                    }
                }
            }
            delay.delay_ms(self.sample_delay_ms);
        }

        std::array::from_fn(|i| ChannelAverage {
            channel: self.channels[i],
            volts: acc[i].average(),
            valid_samples: acc[i].count,
            skipped_samples: acc[i].skipped,
        })
    }
}
