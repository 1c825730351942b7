use tracing::{debug, trace};

use super::{
    state::{Mode, OperatorFlags},
    Controller,
};
use crate::{
    axis::parameters::ParameterError,
    protocol::{
        acknowledgment::Acknowledgment, command::Command, error::ProtocolError, parse_command,
        telemetry::Telemetry,
    },
};

impl Controller {
    /// Apply one inbound command (board prefix already stripped). Queries
    /// publish their telemetry immediately; everything else is confirmed by
    /// later telemetry only.
    pub fn handle(&mut self, text: &str) -> Acknowledgment {
        let ack = match parse_command(text) {
            Ok(command) => {
                // The console polls queries continuously.
                if command.is_query() {
                    trace!("Received command: {}", text.trim());
                } else {
                    debug!("Received command: {}", text.trim());
                }
                self.apply(command)
            }
            Err(err) => Acknowledgment::error(err.to_string()),
        };
        ack.log();
        ack
    }

    fn apply(&mut self, command: Command) -> Acknowledgment {
        let verb = command.verb();
        match command {
            Command::RequestValues => {
                self.publish(Telemetry::Values(self.state.store.values()));
                Acknowledgment::Query
            }
            Command::RequestButtonStates => {
                self.publish(Telemetry::ButtonStates(self.state.button_states()));
                Acknowledgment::Query
            }
            Command::RequestSetpoints => {
                self.publish(Telemetry::Setpoints(self.state.store.setpoints()));
                Acknowledgment::Query
            }
            Command::RequestStateEngine => {
                self.publish(Telemetry::StateEngine(self.sequencer.current_step()));
                Acknowledgment::Query
            }
            Command::SetMode(mode) => {
                let detail = match mode {
                    Mode::Automatic => "Auto Mode",
                    Mode::Manual => "Manual Mode",
                };
                toggle(&mut self.state.mode, mode, verb, detail)
            }
            Command::SetRepeat(on) => {
                let detail = if on { "Repeat enabled" } else { "Repeat disabled" };
                toggle(&mut self.state.repeat, on, verb, detail)
            }
            Command::SetStart(on) => {
                let detail = if on { "Start enabled" } else { "Start disabled" };
                toggle(&mut self.state.start, on, verb, detail)
            }
            Command::OperatorEnable { servo, enabled } => match self.operator_mut(servo) {
                Ok(flags) => {
                    let detail = if enabled { "Enabled" } else { "Disabled" };
                    toggle(
                        &mut flags.enabled,
                        enabled,
                        verb,
                        &format!("Servo{} {}", servo, detail),
                    )
                }
                Err(err) => Acknowledgment::error(ProtocolError::from(err).to_string()),
            },
            Command::RunStop { servo, run } => match self.operator_mut(servo) {
                Ok(flags) => {
                    let detail = if run { "Started" } else { "Stopped" };
                    toggle(&mut flags.run, run, verb, &format!("Servo{} {}", servo, detail))
                }
                Err(err) => Acknowledgment::error(ProtocolError::from(err).to_string()),
            },
            Command::Parameters { servo, setpoint } => {
                match self.state.store.set_parameters(servo, setpoint) {
                    Ok(()) => Acknowledgment::applied(
                        verb,
                        format!(
                            "Parameters received - V:{} A:{} P:{}",
                            setpoint.velocity, setpoint.acceleration, setpoint.position
                        ),
                    ),
                    Err(err) => Acknowledgment::error(ProtocolError::from(err).to_string()),
                }
            }
            Command::ClearPosition { servo } => {
                match self.state.store.clear_position(servo, &mut self.hw) {
                    Ok(()) => {
                        Acknowledgment::applied(verb, format!("Servo{} Position Cleared", servo))
                    }
                    Err(err) => Acknowledgment::error(ProtocolError::from(err).to_string()),
                }
            }
        }
    }

    fn operator_mut(&mut self, servo: usize) -> Result<&mut OperatorFlags, ParameterError> {
        servo
            .checked_sub(1)
            .and_then(|i| self.state.operators.get_mut(i))
            .ok_or(ParameterError::UnknownServo(servo))
    }
}

/// Edge-triggered flag update: only a change of value is applied.
fn toggle<T: PartialEq>(field: &mut T, value: T, command: String, detail: &str) -> Acknowledgment {
    if *field == value {
        Acknowledgment::unchanged(command)
    } else {
        *field = value;
        Acknowledgment::applied(command, detail.to_string())
    }
}
