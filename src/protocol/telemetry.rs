use crate::axis::AXES_PER_BOARD;

/// Mode/flag snapshot in `BUTTON_STATES` field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonStates {
    pub automatic: bool,
    pub repeat: bool,
    pub start: bool,
    /// Per servo: (B1 operator enable, B2 run/stop).
    pub servos: [(bool, bool); AXES_PER_BOARD],
}

impl ButtonStates {
    pub fn flags(&self) -> Vec<bool> {
        let mut flags = vec![self.automatic, self.repeat, self.start];
        for (b1, b2) in self.servos {
            flags.push(b1);
            flags.push(b2);
        }
        flags
    }
}

/// Outbound status message, one datagram each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Telemetry {
    Values([i32; 3 * AXES_PER_BOARD]),
    ButtonStates(ButtonStates),
    Setpoints([i32; 3 * AXES_PER_BOARD]),
    StateEngine(usize),
}

impl Telemetry {
    pub fn kind(&self) -> &'static str {
        match self {
            Telemetry::Values(_) => "VALUES",
            Telemetry::ButtonStates(_) => "BUTTON_STATES",
            Telemetry::Setpoints(_) => "SETPOINTS",
            Telemetry::StateEngine(_) => "STATE_ENGINE",
        }
    }

    pub fn payload(&self) -> String {
        match self {
            Telemetry::Values(fields) | Telemetry::Setpoints(fields) => join(fields.iter()),
            Telemetry::ButtonStates(states) => {
                join(states.flags().into_iter().map(|f| if f { 1 } else { 0 }))
            }
            Telemetry::StateEngine(step) => step.to_string(),
        }
    }

    /// Full datagram text: `BOARD:<id>;<KIND>:<payload>`.
    pub fn encode(&self, board_id: u8) -> String {
        format!("{}{}:{}", super::board_prefix(board_id), self.kind(), self.payload())
    }
}

fn join<T: ToString>(fields: impl Iterator<Item = T>) -> String {
    fields.map(|f| f.to_string()).collect::<Vec<_>>().join(",")
}
