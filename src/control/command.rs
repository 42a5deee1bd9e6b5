use tracing::{debug, info, warn};

use crate::devices::LineTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Activate,
    Deactivate,
    Unrecognized,
}

impl Command {
    /// Match a received line; surrounding whitespace is ignored, case is not.
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "play" => Command::Activate,
            "stop" => Command::Deactivate,
            _ => Command::Unrecognized,
        }
    }
}

/// Whether the control loop runs measurement cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Idle,
    Cycling,
}

impl ActivationState {
    pub fn is_active(self) -> bool {
        self == ActivationState::Cycling
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Activate => *self = ActivationState::Cycling,
            Command::Deactivate => *self = ActivationState::Idle,
            Command::Unrecognized => {}
        }
    }
}

pub struct CommandInterpreter;

impl CommandInterpreter {
    /// Consume at most one buffered line and apply it to `state`.
    ///
    /// Returns immediately when no complete line is waiting. Transport
    /// failures are logged and treated as "no command".
    pub fn poll<T: LineTransport>(link: &mut T, state: &mut ActivationState) -> Option<Command> {
        let line = match link.poll_line() {
            Ok(Some(line)) => line,
            Ok(None) => return None,
            Err(e) => {
                warn!("Command poll failed: {}", e);
                return None;
            }
        };

        let command = Command::parse(&line);
        match command {
            Command::Unrecognized => debug!("Ignoring command '{}'", line.trim()),
            _ => info!("Received command {:?}", command),
        }
        state.apply(command);
        Some(command)
    }
}
