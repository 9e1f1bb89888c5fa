//! Helpers shared by the unit tests.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

/// A scratch directory removed on drop.
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "kabuta-{label}-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&path).expect("temp dir should be creatable");
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).expect("parent dir should be creatable");
        }
        std::fs::write(&file, contents).expect("file should be writable");
        file
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Every request a [`FakeDelve`] received, as `(method, params)`.
pub type CallLog = Arc<Mutex<Vec<(String, Value)>>>;

/// In-process stand-in for Delve's JSON-RPC listener. `reply` maps
/// `(method, params)` to `Ok(result)` or `Err(error string)`.
pub struct FakeDelve {
    pub addr: SocketAddr,
    pub calls: CallLog,
}

impl FakeDelve {
    pub async fn start<F>(reply: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("fake delve should bind");
        let addr = listener.local_addr().expect("fake delve should have an address");
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let log = calls.clone();
        let reply = Arc::new(reply);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = log.clone();
                let reply = reply.clone();
                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut lines = BufReader::new(read_half).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        let request: Value = serde_json::from_str(&line).expect("request should be JSON");
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request["params"][0].clone();
                        log.lock().unwrap().push((method.clone(), params.clone()));
                        let response = match reply(&method, &params) {
                            Ok(result) => json!({"id": request["id"], "result": result, "error": null}),
                            Err(error) => json!({"id": request["id"], "result": null, "error": error}),
                        };
                        let mut out = serde_json::to_vec(&response).expect("response should encode");
                        out.push(b'\n');
                        if write_half.write_all(&out).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self { addr, calls }
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(method, _)| method.clone())
            .collect()
    }
}

/// Echoes the requested breakpoint back with an id and address filled in.
pub fn resolve_breakpoints(method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "RPCServer.CreateBreakpoint" => {
            let mut bp = params["Breakpoint"].clone();
            if bp["functionName"].is_null() {
                bp["functionName"] = json!("main.main");
            }
            bp["id"] = json!(1);
            bp["addr"] = json!(0x10a2f34);
            Ok(json!({ "Breakpoint": bp }))
        }
        other => Err(format!("unexpected method {other}")),
    }
}
