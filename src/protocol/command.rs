use crate::{axis::parameters::Setpoint, controller::state::Mode};

/// One inbound console command, board prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RequestValues,
    RequestButtonStates,
    RequestSetpoints,
    RequestStateEngine,
    SetMode(Mode),
    SetRepeat(bool),
    SetStart(bool),
    /// `S{n}B1`: operator enable of one servo.
    OperatorEnable { servo: usize, enabled: bool },
    /// `S{n}B2`: run/stop flag of one servo.
    RunStop { servo: usize, run: bool },
    Parameters { servo: usize, setpoint: Setpoint },
    ClearPosition { servo: usize },
}

impl Command {
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Command::RequestValues
                | Command::RequestButtonStates
                | Command::RequestSetpoints
                | Command::RequestStateEngine
        )
    }

    /// Canonical wire verb, without the `CMD:` prefix.
    pub fn verb(&self) -> String {
        match self {
            Command::RequestValues => "REQUEST_VALUES".to_string(),
            Command::RequestButtonStates => "REQUEST_BUTTON_STATES".to_string(),
            Command::RequestSetpoints => "REQUEST_SETPOINTS".to_string(),
            Command::RequestStateEngine => "REQUEST_STATE_ENGINE".to_string(),
            Command::SetMode(Mode::Automatic) => "Mode AUTO".to_string(),
            Command::SetMode(Mode::Manual) => "Mode MANUAL".to_string(),
            Command::SetRepeat(on) => format!("Repeat {}", enable_word(*on)),
            Command::SetStart(on) => format!("Start {}", enable_word(*on)),
            Command::OperatorEnable { servo, enabled } => {
                format!("S{}B1 {}", servo, enable_word(*enabled))
            }
            Command::RunStop { servo, run } => {
                format!("S{}B2 {}", servo, if *run { "Start" } else { "STOP" })
            }
            Command::Parameters { servo, setpoint } => format!(
                "S{}_Parameters:{},{},{}",
                servo, setpoint.velocity, setpoint.acceleration, setpoint.position
            ),
            Command::ClearPosition { servo } => format!("S{}_ClearPosition", servo),
        }
    }
}

fn enable_word(on: bool) -> &'static str {
    if on {
        "ENABLE"
    } else {
        "DISABLE"
    }
}
