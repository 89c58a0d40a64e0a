use std::fmt;

/// Represents errors that can occur in the `Store` implementation.
#[derive(Debug)]
pub enum StoreError {
    /// Error from the external storage backend
    BackendError(String),
    /// A backend call exceeded its deadline
    Timeout(String),
    /// Failed to encode or decode a stored record
    CodecError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::BackendError(msg) => write!(f, "Backend error: {}", msg),
            StoreError::Timeout(msg) => write!(f, "Store timeout: {}", msg),
            StoreError::CodecError(msg) => write!(f, "Codec error: {}", msg),
        }
    }
}
