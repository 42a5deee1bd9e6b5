use serde::Serialize;

pub const CHANNEL_COUNT: usize = 6;
pub const ADC_MAX: u16 = 4095;
pub const FULL_DUTY: u8 = 255;
pub const SEPARATOR: &str = "-----------------------";

/// One gas sensor input: the analog pin it is wired to and the label it is reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub pin: u8,
    pub label: &'static str,
}

impl Channel {
    pub const fn new(pin: u8, label: &'static str) -> Self {
        Self { pin, label }
    }
}

/// Labels follow the board's historical wiring, including the MQ138/MQ3 names.
pub const GAS_CHANNELS: [Channel; CHANNEL_COUNT] = [
    Channel::new(36, "MQ138 (Alcohol)"),
    Channel::new(39, "MQ4 (Metano)"),
    Channel::new(34, "MQ3 (Cetonas)"),
    Channel::new(35, "MG811 (Dióxido de Carbono)"),
    Channel::new(32, "MQ135 (Acetona)"),
    Channel::new(33, "MQ137 (Amoniaco)"),
];

/// Fitted constants of the raw-reading to voltage curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationConstants {
    pub yo: f32,
    pub xc: f32,
    pub w1: f32,
    pub c: f32,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            yo: 0.09317,
            xc: 3.12095,
            w1: 0.43486,
            c: 1.17273,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

/// Node configuration. Compiled in; the binary only ever uses `NodeConfig::default()`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeConfig {
    pub channels: [Channel; CHANNEL_COUNT],
    pub heater_pin: u8,
    pub status_led_pin: u8,
    pub samples_per_cycle: u32,      // samples averaged per channel per cycle
    pub sample_delay_ms: u64,        // settle time between channel sweeps
    pub measurement_interval_ms: u64, // heater pulse length
    pub poll_delay_ms: u64,          // command polling granularity
    pub link_settle_ms: u64,         // wait for the transport at boot
    pub calibration: CalibrationConstants,
    pub barometer_retry: RetryPolicy,
    pub link_address: &'static str,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            channels: GAS_CHANNELS,
            heater_pin: 23,
            status_led_pin: 2,
            samples_per_cycle: 50,
            sample_delay_ms: 20,
            measurement_interval_ms: 2000,
            poll_delay_ms: 100,
            link_settle_ms: 1000,
            calibration: CalibrationConstants::default(),
            barometer_retry: RetryPolicy {
                attempts: 5,
                delay_ms: 500,
            },
            link_address: "0.0.0.0:7878",
        }
    }
}
