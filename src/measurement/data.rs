use serde::Serialize;

use super::sampler::ChannelAverage;

#[derive(Serialize)]
pub struct ChannelRecord {
    pub pin: u8,
    pub label: &'static str,
    pub volts: Option<f32>,
    pub valid_samples: u32,
    pub skipped_samples: u32,
}

/// Diagnostic summary of one cycle, logged as JSON.
#[derive(Serialize)]
pub struct CycleRecord {
    pub timestamp: String, // UTC ISO timestamp
    pub cycle: u64,
    pub channels: Vec<ChannelRecord>,
}

impl CycleRecord {
    pub fn new(cycle: u64, averages: &[ChannelAverage]) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            cycle,
            channels: averages
                .iter()
                .map(|avg| ChannelRecord {
                    pin: avg.channel.pin,
                    label: avg.channel.label,
                    volts: avg.volts,
                    valid_samples: avg.valid_samples,
                    skipped_samples: avg.skipped_samples,
                })
                .collect(),
        }
    }
}
