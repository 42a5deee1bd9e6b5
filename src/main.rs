mod boot;
mod config;
mod control;
mod devices;
mod measurement;

use config::{NodeConfig, ADC_MAX};
use control::ControlLoop;
use devices::{
    SimulatedAdc, SimulatedBarometer, SimulatedLed, SimulatedPwm, TcpLink, ThreadDelay,
};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive so buffered log lines are flushed.
    let _guard = setup_logging();
    info!("Starting gas sensor node");

    let config = NodeConfig::default();
    match serde_json::to_string(&config) {
        Ok(json) => info!("Node configuration: {}", json),
        Err(e) => warn!("Could not serialize node configuration: {}", e),
    }

    let mut link = match TcpLink::bind(config.link_address) {
        Ok(link) => link,
        Err(e) => {
            error!("Failed to open operator link on {}: {}", config.link_address, e);
            return Err(Box::new(e));
        }
    };

    // Resting readings roughly matching clean air on each sensor.
    let baselines: Vec<(u8, u16)> = config
        .channels
        .iter()
        .zip([620_u16, 480, 540, 2900, 700, 560])
        .map(|(channel, raw)| (channel.pin, raw))
        .collect();
    let adc = SimulatedAdc::new(&baselines, ADC_MAX);
    let mut pwm = SimulatedPwm::new(config.heater_pin);
    let mut led = SimulatedLed::new(config.status_led_pin);
    let mut barometer = SimulatedBarometer::new(true);
    let mut delay = ThreadDelay;

    let barometer_ready =
        boot::boot(&config, &mut led, &mut pwm, &mut link, &mut barometer, &mut delay);
    info!("Boot complete (barometer ready: {})", barometer_ready);

    ControlLoop::new(&config, adc, pwm, link, delay).run()
}

fn setup_logging() -> WorkerGuard {
    let file_appender = rolling::daily("logs", "gas-node.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false) // Disable ANSI colors in log files
        .with_level(true)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    guard
}
