//! Kabuta Core
//!
//! Backend side of the kabuta GDB/MI bridge: configuration, the Delve
//! JSON-RPC client, typed RPC payloads, and supervision of the headless
//! Delve subprocess whose output gates the RPC handshake.

pub mod client;
pub mod config;
pub mod error;
pub mod ops;
pub mod supervisor;
pub mod types;

// Re-export commonly used types
pub use client::DelveClient;
pub use config::Config;
pub use error::{BackendError, ConfigError};
pub use supervisor::{Backend, LaunchSpec};

/// Result type alias using BackendError
pub type Result<T> = std::result::Result<T, BackendError>;
