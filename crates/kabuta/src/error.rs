use kabuta_core::BackendError;
use thiserror::Error;

use crate::breakpoint::LocationError;

/// Why a command failed. The `Display` text is the `msg` sent to the IDE.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command {raw}: no method to process it \"{handler_id}\" found.")]
    UnknownCommand { raw: String, handler_id: String },

    #[error("{0}")]
    Unsupported(String),

    #[error("{0}")]
    Malformed(String),

    /// Needs a backend connection or an earlier command that has not happened.
    #[error("{0}")]
    Unresolved(String),

    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: BackendError,
    },
}

impl CommandError {
    pub fn backend(context: impl Into<String>, source: BackendError) -> Self {
        Self::Backend {
            context: context.into(),
            source,
        }
    }
}

impl From<LocationError> for CommandError {
    fn from(err: LocationError) -> Self {
        match err {
            LocationError::Unsupported(_) => Self::Unsupported(err.to_string()),
            LocationError::NoSuchFile { .. } | LocationError::UnparsableLine { .. } => {
                Self::Malformed(err.to_string())
            }
        }
    }
}
