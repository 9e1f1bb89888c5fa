use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection error to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} timed out after {timeout:?}")]
    Timeout { what: String, timeout: Duration },

    #[error("{method} failed: {message}")]
    JsonRpc { method: String, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Error running {command} in {dir}: {source}")]
    Launch {
        command: String,
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Startup(String),

    #[error("Backend exited before reporting readiness")]
    ExitedBeforeReady,

    #[error("Expected backend version to start with {expected}, returned {actual}")]
    Version { expected: String, actual: String },
}

impl BackendError {
    pub fn json_rpc(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self::JsonRpc {
            method: method.into(),
            message: message.into(),
        }
    }

    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            what: what.into(),
            timeout,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error in {file}: line {line}: cannot parse {text}")]
    InitFile {
        file: PathBuf,
        line: usize,
        text: String,
    },

    #[error("Cannot read {file}: {source}")]
    Read {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Expected DLV port specified by {key} to be integer, got {value}: {source}")]
    InvalidPort {
        key: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
