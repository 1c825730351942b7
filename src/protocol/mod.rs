pub mod acknowledgment;
pub mod codec;
pub mod command;
pub mod error;
pub mod telemetry;

use command::Command;
use error::ProtocolError;

use crate::{
    axis::{parameters::Setpoint, AXES_PER_BOARD},
    controller::state::Mode,
};

pub fn board_prefix(board_id: u8) -> String {
    format!("BOARD:{};", board_id)
}

/// Returns the message body if `message` is addressed to `board_id`.
pub fn strip_board_prefix(board_id: u8, message: &str) -> Option<&str> {
    message.strip_prefix(board_prefix(board_id).as_str())
}

/// Parse one command line. The `CMD:` prefix is optional and surrounding
/// whitespace is ignored.
pub fn parse_command(input: &str) -> Result<Command, ProtocolError> {
    let input = input.trim();
    let verb = input.strip_prefix("CMD:").unwrap_or(input);

    let command = match verb {
        "REQUEST_VALUES" => Command::RequestValues,
        "REQUEST_BUTTON_STATES" => Command::RequestButtonStates,
        "REQUEST_SETPOINTS" => Command::RequestSetpoints,
        "REQUEST_STATE_ENGINE" => Command::RequestStateEngine,
        "Mode AUTO" => Command::SetMode(Mode::Automatic),
        "Mode MANUAL" => Command::SetMode(Mode::Manual),
        "Repeat ENABLE" => Command::SetRepeat(true),
        "Repeat DISABLE" => Command::SetRepeat(false),
        "Start ENABLE" => Command::SetStart(true),
        "Start DISABLE" => Command::SetStart(false),
        _ => return parse_servo_command(verb),
    };
    Ok(command)
}

fn parse_servo_command(verb: &str) -> Result<Command, ProtocolError> {
    let unknown = || ProtocolError::UnknownCommand(verb.to_string());

    let rest = verb.strip_prefix('S').ok_or_else(unknown)?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(unknown)?;
    let servo: usize = rest[..digits_end].parse().map_err(|_| unknown())?;
    if !(1..=AXES_PER_BOARD).contains(&servo) {
        return Err(unknown());
    }

    let command = match &rest[digits_end..] {
        "B1 ENABLE" => Command::OperatorEnable {
            servo,
            enabled: true,
        },
        "B1 DISABLE" => Command::OperatorEnable {
            servo,
            enabled: false,
        },
        "B2 Start" => Command::RunStop { servo, run: true },
        "B2 STOP" => Command::RunStop { servo, run: false },
        "_ClearPosition" => Command::ClearPosition { servo },
        action => {
            let params = action.strip_prefix("_Parameters:").ok_or_else(unknown)?;
            Command::Parameters {
                servo,
                setpoint: parse_setpoint(params)?,
            }
        }
    };
    Ok(command)
}

fn parse_setpoint(params: &str) -> Result<Setpoint, ProtocolError> {
    let malformed = || ProtocolError::MalformedParameters(params.to_string());
    let fields = params
        .split(',')
        .map(|field| field.trim().parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;

    match fields.as_slice() {
        [velocity, acceleration, position] => {
            Ok(Setpoint::new(*velocity, *acceleration, *position))
        }
        _ => Err(malformed()),
    }
}
