use std::fmt;

#[derive(Debug)]
pub enum RuntimeError {
    ConnectionError(String),
    ContainerCreationError(String),
    ContainerStartError(String),
    ContainerInspectError(String),
    ContainerStopError(String),
    ContainerRestartError(String),
    ContainerRemovalError(String),
    Timeout(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            RuntimeError::ContainerCreationError(msg) => {
                write!(f, "Container creation error: {}", msg)
            }
            RuntimeError::ContainerStartError(msg) => write!(f, "Container start error: {}", msg),
            RuntimeError::ContainerInspectError(msg) => {
                write!(f, "Container inspect error: {}", msg)
            }
            RuntimeError::ContainerStopError(msg) => write!(f, "Container stop error: {}", msg),
            RuntimeError::ContainerRestartError(msg) => {
                write!(f, "Container restart error: {}", msg)
            }
            RuntimeError::ContainerRemovalError(msg) => {
                write!(f, "Container removal error: {}", msg)
            }
            RuntimeError::Timeout(msg) => write!(f, "Runtime timeout: {}", msg),
        }
    }
}
