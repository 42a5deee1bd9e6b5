use tracing::{error, info, warn};

use crate::config::{NodeConfig, RetryPolicy};
use crate::devices::{Barometer, Delay, DigitalOutput, LineTransport, PwmOutput};

pub const BAROMETER_READY: &str = "BMP180 sensor initialized.";
pub const BAROMETER_RETRYING: &str = "BMP180 init failed, retrying...";

/// Try `attempt` up to `policy.attempts` times, waiting `policy.delay_ms`
/// after each failure. `on_failure` sees the attempt number and its error.
pub fn retry_with_delay<T, E, D, F, R>(
    policy: RetryPolicy,
    delay: &mut D,
    mut attempt: F,
    mut on_failure: R,
) -> Option<T>
where
    D: Delay,
    F: FnMut() -> Result<T, E>,
    R: FnMut(u32, &E),
{
    for n in 1..=policy.attempts {
        match attempt() {
            Ok(value) => return Some(value),
            Err(e) => {
                on_failure(n, &e);
                delay.delay_ms(policy.delay_ms);
            }
        }
    }
    None
}

/// Bring the node to its idle starting point: outputs off, link up,
/// barometer probed. Returns whether the barometer answered.
pub fn boot<L, P, T, B, D>(
    config: &NodeConfig,
    led: &mut L,
    pwm: &mut P,
    link: &mut T,
    barometer: &mut B,
    delay: &mut D,
) -> bool
where
    L: DigitalOutput,
    P: PwmOutput,
    T: LineTransport,
    B: Barometer,
    D: Delay,
{
    if let Err(e) = led.set_level(false) {
        warn!("Failed to clear status LED: {}", e);
    }
    if let Err(e) = pwm.set_duty(0) {
        error!("Failed to zero heater at boot: {}", e);
    }

    delay.delay_ms(config.link_settle_ms);
    if let Err(e) = led.set_level(true) {
        warn!("Failed to set status LED: {}", e);
    }

    let policy = config.barometer_retry;
    let ready = retry_with_delay(
        policy,
        delay,
        || barometer.begin(),
        |n, e| {
            warn!("Barometer bring-up attempt {}/{} failed: {}", n, policy.attempts, e);
            send_status(link, BAROMETER_RETRYING);
        },
    )
    .is_some();

    if ready {
        info!("Barometer ready");
        send_status(link, BAROMETER_READY);
    } else {
        error!("Barometer unavailable after {} attempts", policy.attempts);
        send_status(
            link,
            &format!("BMP180 not detected after {} attempts. Check wiring.", policy.attempts),
        );
    }
    ready
}

fn send_status<T: LineTransport>(link: &mut T, line: &str) {
    if let Err(e) = link.write_line(line) {
        warn!("Dropped status line '{}': {}", line, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceError, Result};

    #[derive(Default)]
    struct Outputs {
        led: Vec<bool>,
        duty: Vec<u8>,
        lines: Vec<String>,
        waits: Vec<u64>,
    }

    struct Led<'a>(&'a mut Vec<bool>);
    struct Pwm<'a>(&'a mut Vec<u8>);
    struct Link<'a>(&'a mut Vec<String>);
    struct Waits<'a>(&'a mut Vec<u64>);

    impl DigitalOutput for Led<'_> {
        fn set_level(&mut self, high: bool) -> Result<()> {
            self.0.push(high);
            Ok(())
        }
    }

    impl PwmOutput for Pwm<'_> {
        fn set_duty(&mut self, duty: u8) -> Result<()> {
            self.0.push(duty);
            Ok(())
        }
    }

    impl LineTransport for Link<'_> {
        fn write_line(&mut self, line: &str) -> Result<()> {
            self.0.push(line.to_string());
            Ok(())
        }

        fn poll_line(&mut self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    impl Delay for Waits<'_> {
        fn delay_ms(&mut self, ms: u64) {
            self.0.push(ms);
        }
    }

    struct FlakyBarometer {
        failures: u32,
        probes: u32,
    }

    impl Barometer for FlakyBarometer {
        fn begin(&mut self) -> Result<()> {
            self.probes += 1;
            if self.probes <= self.failures {
                Err(DeviceError::NotDetected("BMP180".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn run_boot(failures: u32) -> (bool, Outputs, u32) {
        let config = NodeConfig::default();
        let mut out = Outputs::default();
        let mut baro = FlakyBarometer { failures, probes: 0 };
        let ready = boot(
            &config,
            &mut Led(&mut out.led),
            &mut Pwm(&mut out.duty),
            &mut Link(&mut out.lines),
            &mut baro,
            &mut Waits(&mut out.waits),
        );
        (ready, out, baro.probes)
    }

    #[test]
    fn test_boot_with_barometer_present() {
        let (ready, out, probes) = run_boot(0);
        assert!(ready);
        assert_eq!(probes, 1);
        assert_eq!(out.led, vec![false, true]);
        assert_eq!(out.duty, vec![0]);
        assert_eq!(out.waits, vec![1000]);
        assert_eq!(out.lines, vec![BAROMETER_READY.to_string()]);
    }

    #[test]
    fn test_boot_retries_then_succeeds() {
        let (ready, out, probes) = run_boot(2);
        assert!(ready);
        assert_eq!(probes, 3);
        assert_eq!(out.waits, vec![1000, 500, 500]);
        assert_eq!(
            out.lines,
            vec![BAROMETER_RETRYING, BAROMETER_RETRYING, BAROMETER_READY]
        );
    }

    #[test]
    fn test_boot_gives_up_after_five_attempts() {
        let (ready, out, probes) = run_boot(u32::MAX);
        assert!(!ready);
        assert_eq!(probes, 5);
        assert_eq!(out.lines.len(), 6);
        assert_eq!(
            out.lines.last().map(String::as_str),
            Some("BMP180 not detected after 5 attempts. Check wiring.")
        );
    }

    #[test]
    fn test_retry_stops_on_first_success() {
        let mut waits = Vec::new();
        let mut calls = 0;
        let policy = RetryPolicy { attempts: 3, delay_ms: 10 };
        let result: Option<u32> = retry_with_delay(
            policy,
            &mut Waits(&mut waits),
            || {
                calls += 1;
                if calls == 2 { Ok(calls) } else { Err("busy") }
            },
            |_, _| {},
        );
        assert_eq!(result, Some(2));
        assert!(waits == vec![10]);
    }
}
