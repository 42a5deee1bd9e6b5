pub mod simulated;
pub mod tcp_link;

use std::time::Duration;
use thiserror::Error;

pub use simulated::{SimulatedAdc, SimulatedBarometer, SimulatedLed, SimulatedPwm};
pub use tcp_link::TcpLink;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pin {0} is not an analog input")]
    InvalidPin(u8),

    #[error("Device not detected: {0}")]
    NotDetected(String),
}

pub type Result<T> = std::result::Result<T, DeviceError>;

/// Analog-to-digital converter shared by all gas channels.
pub trait AnalogInput {
    /// Read one raw sample from `pin`, in `0..=ADC_MAX`.
    fn read_raw(&mut self, pin: u8) -> Result<u16>;
}

/// PWM output driving the sensor heater.
pub trait PwmOutput {
    fn set_duty(&mut self, duty: u8) -> Result<()>;
}

pub trait DigitalOutput {
    fn set_level(&mut self, high: bool) -> Result<()>;
}

/// Line-oriented text transport to the remote operator.
pub trait LineTransport {
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Returns the next complete, newline-terminated line if one is buffered.
    /// Never waits for data.
    fn poll_line(&mut self) -> Result<Option<String>>;
}

/// Secondary barometric sensor. Only its bring-up is driven by the node.
pub trait Barometer {
    fn begin(&mut self) -> Result<()>;
}

/// The only way the node suspends.
pub trait Delay {
    fn delay_ms(&mut self, ms: u64);
}

pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }
}
