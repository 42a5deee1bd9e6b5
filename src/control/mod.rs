pub mod command;

use crate::config::NodeConfig;
use crate::devices::{AnalogInput, Delay, LineTransport, PwmOutput};
use crate::measurement::MeasurementCycle;
use command::{ActivationState, Command, CommandInterpreter};
use tracing::{debug, info};

/// What one pass of the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    pub cycle_ran: bool,
    pub command: Option<Command>,
    pub state: ActivationState,
}

/// Top-level driver: cycle while active, then poll for a command.
pub struct ControlLoop<'a, A, P, T, D> {
    config: &'a NodeConfig,
    adc: A,
    pwm: P,
    link: T,
    delay: D,
    state: ActivationState,
    cycles: u64,
}

impl<'a, A, P, T, D> ControlLoop<'a, A, P, T, D>
where
    A: AnalogInput,
    P: PwmOutput,
    T: LineTransport,
    D: Delay,
{
    /// Starts idle; activation is never carried over from a previous run.
    pub fn new(config: &'a NodeConfig, adc: A, pwm: P, link: T, delay: D) -> Self {
        Self {
            config,
            adc,
            pwm,
            link,
            delay,
            state: ActivationState::Idle,
            cycles: 0,
        }
    }

    #[cfg(test)]
    fn state(&self) -> ActivationState {
        self.state
    }

    #[cfg(test)]
    fn cycles(&self) -> u64 {
        self.cycles
    }

    /// One pass: a full cycle if active, the poll delay, then one command check.
    ///
    /// A command received here only takes effect on the next pass, so a running
    /// cycle always completes.
    pub fn step(&mut self) -> Iteration {
        let cycle_ran = self.state.is_active();
        if cycle_ran {
            self.cycles += 1;
            MeasurementCycle::new(self.config).run(
                self.cycles,
                &mut self.adc,
                &mut self.pwm,
                &mut self.link,
                &mut self.delay,
            );
        }

        self.delay.delay_ms(self.config.poll_delay_ms);

        let before = self.state;
        let command = CommandInterpreter::poll(&mut self.link, &mut self.state);
        if self.state != before {
            info!("Activation state {:?} -> {:?}", before, self.state);
        }

        Iteration {
            cycle_ran,
            command,
            state: self.state,
        }
    }

    /// Runs until the node loses power.
    pub fn run(&mut self) -> ! {
        info!("Control loop started, waiting for 'play'");
        loop {
            let pass = self.step();
            if let Some(command) = pass.command {
                debug!(
                    "Pass handled {:?} (cycle ran: {}, now {:?})",
                    command, pass.cycle_ran, pass.state
                );
            }
        }
    }

    #[cfg(test)]
    fn parts(&mut self) -> (&mut A, &mut P, &mut T, &mut D) {
        (&mut self.adc, &mut self.pwm, &mut self.link, &mut self.delay)
    }
}
