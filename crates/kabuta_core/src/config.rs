use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_DLV_PATH: &str = "KABUTA_DLV_PATH";
pub const ENV_LOG_FILE: &str = "KABUTA_LOG_FILE";
pub const ENV_DLV_PORT: &str = "KABUTA_DLV_PORT";
pub const ENV_PATH: &str = "KABUTA_PATH";
pub const ENV_RPC_TIMEOUT_MS: &str = "KABUTA_RPC_TIMEOUT_MS";
pub const ENV_STARTUP_TIMEOUT_MS: &str = "KABUTA_STARTUP_TIMEOUT_MS";

/// Init file, looked for in the user's home directory, overriding the environment.
pub const INIT_FILE: &str = ".kabutainit";

pub const DEFAULT_DLV_PATH: &str = "dlv";
pub const DEFAULT_LOG_FILE: &str = "kabuta.log";
pub const DEFAULT_DLV_PORT: u16 = 8181;
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(120);

const KEYS: [&str; 6] = [
    ENV_DLV_PATH,
    ENV_LOG_FILE,
    ENV_DLV_PORT,
    ENV_PATH,
    ENV_RPC_TIMEOUT_MS,
    ENV_STARTUP_TIMEOUT_MS,
];

#[derive(Debug, Clone)]
pub struct Config {
    pub dlv_path: String,
    pub log_file: PathBuf,
    pub dlv_port: u16,
    /// Appended to `PATH` for the backend process.
    pub extra_path: Option<String>,
    pub rpc_timeout: Duration,
    pub startup_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dlv_path: DEFAULT_DLV_PATH.to_string(),
            log_file: absolutize(Path::new(DEFAULT_LOG_FILE)),
            dlv_port: DEFAULT_DLV_PORT,
            extra_path: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }
}

impl Config {
    /// Environment variables overridden by `~/.kabutainit`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut vars: HashMap<String, String> = KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        if let Some(home) = dirs::home_dir() {
            vars.extend(read_init_file(&home.join(INIT_FILE))?);
        }

        Self::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let value = |key: &str| vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
        let millis = |key: &str| {
            value(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let dlv_port = match value(ENV_DLV_PORT) {
            Some(port) => port.parse::<u16>().map_err(|source| ConfigError::InvalidPort {
                key: ENV_DLV_PORT,
                value: port.to_string(),
                source,
            })?,
            None => DEFAULT_DLV_PORT,
        };

        Ok(Self {
            dlv_path: value(ENV_DLV_PATH).unwrap_or(DEFAULT_DLV_PATH).to_string(),
            log_file: absolutize(Path::new(value(ENV_LOG_FILE).unwrap_or(DEFAULT_LOG_FILE))),
            dlv_port,
            extra_path: value(ENV_PATH).map(str::to_string),
            rpc_timeout: millis(ENV_RPC_TIMEOUT_MS).unwrap_or(DEFAULT_RPC_TIMEOUT),
            startup_timeout: millis(ENV_STARTUP_TIMEOUT_MS).unwrap_or(DEFAULT_STARTUP_TIMEOUT),
        })
    }

    /// Loopback address the backend is told to listen on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.dlv_port))
    }
}

/// A missing init file is not an error.
pub fn read_init_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_init_file(path, &contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
        Err(source) => Err(ConfigError::Read {
            file: path.to_path_buf(),
            source,
        }),
    }
}

pub fn parse_init_file(path: &Path, contents: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut vars = HashMap::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::InitFile {
            file: path.to_path_buf(),
            line: idx + 1,
            text: line.to_string(),
        })?;
        vars.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(vars)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
