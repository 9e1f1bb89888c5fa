//! Lifecycle of the headless Delve subprocess.
//!
//! The backend's stdout and stderr are each pumped by their own task into one
//! bounded line channel. `exec-run` reads that channel until the readiness
//! sentinel (or a known fatal line) shows up, after which the remaining output
//! is drained into the log so the pumps never block on a full channel.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::{Child, Command},
    sync::mpsc,
    task::JoinHandle,
    time::timeout,
};

use crate::{BackendError, Result};

/// Printed by Delve once its JSON-RPC listener accepts connections.
pub const READY_SENTINEL: &str = "API server listening at:";
/// Expected start of `dlv version` output.
pub const VERSION_BANNER_PREFIX: &str = "Delve Debugger";

const LINE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendLine {
    pub stream: OutputStream,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupLine {
    Ready,
    Fatal,
    Log,
}

pub fn classify_startup_line(line: &str) -> StartupLine {
    if line.starts_with(READY_SENTINEL) {
        StartupLine::Ready
    } else if line.contains("executable file not found in $PATH")
        || line.starts_with("could not launch process:")
    {
        StartupLine::Fatal
    } else {
        StartupLine::Log
    }
}

/// How to start the backend. Built with [`LaunchSpec::delve`] in production.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: PathBuf,
    /// Overrides layered on top of the inherited environment.
    pub envs: BTreeMap<String, String>,
}

impl LaunchSpec {
    /// `dlv debug --headless --log --api-version=2 --listen=<addr> -- <target args>`
    pub fn delve(dlv_path: &str, listen: SocketAddr, package_dir: &Path, target_args: &str) -> Self {
        let mut args = vec![
            "debug".to_string(),
            "--headless".to_string(),
            "--log".to_string(),
            "--api-version=2".to_string(),
            format!("--listen={listen}"),
            "--".to_string(),
        ];
        args.extend(target_args.split_whitespace().map(str::to_string));

        Self {
            program: dlv_path.to_string(),
            args,
            dir: package_dir.to_path_buf(),
            envs: BTreeMap::new(),
        }
    }

    pub fn with_envs(mut self, envs: &BTreeMap<String, String>) -> Self {
        self.envs.extend(envs.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn search_path(&self) -> String {
        self.envs
            .get("PATH")
            .cloned()
            .or_else(|| std::env::var("PATH").ok())
            .unwrap_or_default()
    }
}

/// A running backend process and the tasks pumping its output.
#[derive(Debug)]
pub struct Backend {
    child: Child,
    lines: Option<mpsc::Receiver<BackendLine>>,
    pumps: Vec<JoinHandle<()>>,
    drain: Option<JoinHandle<()>>,
    search_path: String,
}

impl Backend {
    pub fn launch(spec: &LaunchSpec) -> Result<Self> {
        let command_line = spec.command_line();
        let launch_error = |source| BackendError::Launch {
            command: command_line.clone(),
            dir: spec.dir.display().to_string(),
            source,
        };

        tracing::info!("Launching {} in {}", command_line, spec.dir.display());

        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.dir)
            .envs(&spec.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(launch_error)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackendError::Startup("Backend spawn failed: missing stdout pipe".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BackendError::Startup("Backend spawn failed: missing stderr pipe".into()))?;

        tracing::info!("Backend pid: {:?}", child.id());

        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let pumps = vec![
            tokio::spawn(pump_lines(stdout, OutputStream::Stdout, tx.clone())),
            tokio::spawn(pump_lines(stderr, OutputStream::Stderr, tx)),
        ];

        Ok(Self {
            child,
            lines: Some(rx),
            pumps,
            drain: None,
            search_path: spec.search_path(),
        })
    }

    /// Consumes backend output until the readiness sentinel, a fatal line,
    /// the end of both streams, or `startup_timeout`.
    pub async fn wait_ready(&mut self, startup_timeout: Duration) -> Result<()> {
        let search_path = self.search_path.clone();
        let lines = self
            .lines
            .as_mut()
            .ok_or_else(|| BackendError::Startup("Backend output was already handed off".into()))?;

        let wait = async {
            while let Some(line) = lines.recv().await {
                tracing::debug!("Waiting for Delve to start... [{}] {}", line.stream, line.text);
                match classify_startup_line(&line.text) {
                    StartupLine::Ready => return Ok(()),
                    StartupLine::Fatal => {
                        return Err(BackendError::Startup(format!("{} ({})", line.text, search_path)))
                    }
                    StartupLine::Log => {}
                }
            }
            Err(BackendError::ExitedBeforeReady)
        };

        timeout(startup_timeout, wait)
            .await
            .map_err(|_| BackendError::timeout("Waiting for the backend to listen", startup_timeout))?
    }

    /// Forwards everything the backend prints from now on to the log.
    pub fn drain_to_log(&mut self) {
        let Some(mut lines) = self.lines.take() else {
            return;
        };
        let pid = self.child.id();
        self.drain = Some(tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                tracing::debug!("dlv {:?} {}: {}", pid, line.stream, line.text);
            }
        }));
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub async fn shutdown(mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
        let _ = self.child.kill().await;
        let _ = self.child.wait().await;
        for pump in self.pumps.drain(..) {
            pump.abort();
        }
    }
}

/// Splits `reader` into trimmed, non-empty lines. A trailing line without a
/// newline is forwarded once the stream ends.
pub async fn pump_lines<R>(reader: R, stream: OutputStream, tx: mpsc::Sender<BackendLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if !forward_line(&tx, stream, &line).await {
                    return;
                }
            }
            Err(e) => {
                tracing::warn!("Error reading from {} of dlv: {}", stream, e);
                break;
            }
        }
    }
    tracing::debug!("dlv {} finished", stream);
}

async fn forward_line(tx: &mpsc::Sender<BackendLine>, stream: OutputStream, raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw).trim().to_string();
    if text.is_empty() {
        return true;
    }
    tx.send(BackendLine { stream, text }).await.is_ok()
}

/// Runs `<dlv> version` and checks the banner. Returns the full output.
pub async fn check_version(dlv_path: &str) -> Result<String> {
    let output = Command::new(dlv_path)
        .arg("version")
        .output()
        .await
        .map_err(|source| BackendError::Launch {
            command: format!("{dlv_path} version"),
            dir: ".".to_string(),
            source,
        })?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !text.starts_with(VERSION_BANNER_PREFIX) {
        return Err(BackendError::Version {
            expected: VERSION_BANNER_PREFIX.to_string(),
            actual: text,
        });
    }
    Ok(text)
}
