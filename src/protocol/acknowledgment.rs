use tracing::{debug, info, warn};

/// Outcome of handling one command, reported on the debug log only. The
/// console learns about applied changes through the next telemetry push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    Applied { command: String, detail: String },
    /// Toggle already in the requested state.
    Unchanged { command: String },
    Query,
    Error { message: String },
}

impl Acknowledgment {
    pub fn applied(command: String, detail: String) -> Self {
        Self::Applied { command, detail }
    }

    pub fn unchanged(command: String) -> Self {
        Self::Unchanged { command }
    }

    pub fn error(message: String) -> Self {
        Self::Error { message }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Applied { command, detail } => {
                vec![format!("DATA:{}", detail), format!("ACK:{}", command)]
            }
            Self::Unchanged { command } => vec![format!("NOOP:{}", command)],
            Self::Query => Vec::new(),
            Self::Error { message } => vec![format!("ERR:{}", message)],
        }
    }

    pub fn log(&self) {
        match self {
            Self::Applied { .. } => self.lines().iter().for_each(|line| info!("{}", line)),
            Self::Unchanged { .. } => self.lines().iter().for_each(|line| debug!("{}", line)),
            Self::Query => {}
            Self::Error { .. } => self.lines().iter().for_each(|line| warn!("{}", line)),
        }
    }
}
