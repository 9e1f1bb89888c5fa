use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use kabuta_core::{Backend, Config, DelveClient};

use crate::breakpoint::BreakpointRegistry;
use crate::error::CommandError;

/// Bridge state for the whole process lifetime. Only the dispatch loop
/// touches it, so nothing here is shared or locked.
#[derive(Debug)]
pub struct Session {
    pub cwd: Option<PathBuf>,
    /// Binary base name → directory of its `main` package.
    pub package_dirs: HashMap<String, PathBuf>,
    pub dlv_path: String,
    pub listen_addr: SocketAddr,
    pub rpc_timeout: Duration,
    pub startup_timeout: Duration,
    pub backend: Option<Backend>,
    /// Absent until the backend reports readiness.
    pub rpc: Option<DelveClient>,
    pub breakpoints: BreakpointRegistry,
    pub pending_breakpoints: bool,
    pub target_args: String,
    pub debug_binary: Option<PathBuf>,
    pub package_dir: Option<PathBuf>,
    /// Environment overrides applied to the backend process.
    pub env: BTreeMap<String, String>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        let mut session = Self {
            cwd: None,
            package_dirs: HashMap::new(),
            dlv_path: config.dlv_path.clone(),
            listen_addr: config.listen_addr(),
            rpc_timeout: config.rpc_timeout,
            startup_timeout: config.startup_timeout,
            backend: None,
            rpc: None,
            breakpoints: BreakpointRegistry::default(),
            pending_breakpoints: false,
            target_args: String::new(),
            debug_binary: None,
            package_dir: None,
            env: BTreeMap::new(),
        };
        if let Some(extra) = &config.extra_path {
            session.append_search_path("PATH", extra);
        }
        session
    }

    /// First mapping wins; returns false when `binary` was already mapped.
    pub fn record_package_dir(&mut self, binary: String, dir: PathBuf) -> bool {
        if let Some(existing) = self.package_dirs.get(&binary) {
            tracing::warn!(
                "Trying to set {} as dir for {}, but already have {}, will skip",
                dir.display(),
                binary,
                existing.display()
            );
            return false;
        }
        self.package_dirs.insert(binary, dir);
        true
    }

    /// Appends `fragment` to a path-list variable for future backend launches.
    pub fn append_search_path(&mut self, var: &str, fragment: &str) {
        let current = self
            .env
            .get(var)
            .cloned()
            .or_else(|| std::env::var(var).ok())
            .unwrap_or_default();
        let mut paths: Vec<PathBuf> = std::env::split_paths(&current)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        paths.push(PathBuf::from(fragment));

        match std::env::join_paths(paths) {
            Ok(joined) => {
                let joined = joined.to_string_lossy().into_owned();
                tracing::info!("Added {} to {}, new value {}", fragment, var, joined);
                self.env.insert(var.to_string(), joined);
            }
            Err(e) => tracing::warn!("Cannot add {} to {}: {}", fragment, var, e),
        }
    }

    pub fn rpc_mut(&mut self) -> Result<&mut DelveClient, CommandError> {
        self.rpc
            .as_mut()
            .ok_or_else(|| CommandError::Unresolved("not connected to the backend; run the program first".into()))
    }

    /// Reported to the IDE as the shared library of every breakpoint.
    pub fn shlib(&self) -> String {
        self.debug_binary
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    pub async fn shutdown(&mut self) {
        self.rpc = None;
        if let Some(backend) = self.backend.take() {
            tracing::info!("Stopping backend {:?}", backend.pid());
            backend.shutdown().await;
        }
    }
}
