use crate::axis::parameters::ParameterError;

#[derive(Debug)]
pub enum ProtocolError {
    UnknownCommand(String),
    MalformedParameters(String),
    InvalidParameters(ParameterError),
    IoError(std::io::Error),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::UnknownCommand(cmd) => write!(f, "Unknown command - {}", cmd),
            ProtocolError::MalformedParameters(params) => {
                write!(f, "Malformed parameters - {}", params)
            }
            ProtocolError::InvalidParameters(err) => write!(f, "Invalid parameters - {}", err),
            ProtocolError::IoError(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<ParameterError> for ProtocolError {
    fn from(err: ParameterError) -> Self {
        ProtocolError::InvalidParameters(err)
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::IoError(err)
    }
}
