use std::net::SocketAddr;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::timeout,
};

use crate::{BackendError, Result};

/// Blocking-style client for Delve's JSON-RPC listener.
///
/// Delve speaks Go's `net/rpc/jsonrpc` codec: one JSON object per line,
/// `params` is a one-element array and `error` is a string or null. Calls are
/// strictly sequential; every round trip is bounded by the configured timeout.
#[derive(Debug)]
pub struct DelveClient {
    addr: SocketAddr,
    timeout: Duration,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    next_id: u64,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, P> {
    method: &'a str,
    params: [&'a P; 1],
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl DelveClient {
    pub async fn connect(addr: SocketAddr, rpc_timeout: Duration) -> Result<Self> {
        let stream = timeout(rpc_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| BackendError::timeout(format!("Connecting to {addr}"), rpc_timeout))?
            .map_err(|source| BackendError::Connection {
                addr: addr.to_string(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();

        tracing::info!("Connected to Delve JSON-RPC at {}", addr);

        Ok(Self {
            addr,
            timeout: rpc_timeout,
            reader: BufReader::new(read_half),
            writer: write_half,
            next_id: 0,
        })
    }

    pub async fn call<P, R>(&mut self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = self.next_id;
        self.next_id += 1;

        let request = JsonRpcRequest {
            method,
            params: [params],
            id,
        };
        let mut line = serde_json::to_vec(&request)?;
        line.push(b'\n');

        tracing::debug!("Sending JSON-RPC request: method={}, id={}", method, id);

        let response = timeout(self.timeout, self.round_trip(&line))
            .await
            .map_err(|_| BackendError::timeout(method, self.timeout))??;

        if response.id != id {
            return Err(BackendError::InvalidResponse(format!(
                "Response ID mismatch: expected {}, got {}",
                id, response.id
            )));
        }

        match response.error {
            None | Some(Value::Null) => {}
            Some(error) => {
                let message = match error {
                    Value::String(message) => message,
                    other => other.to_string(),
                };
                tracing::warn!("JSON-RPC error: method={}, message={}", method, message);
                return Err(BackendError::json_rpc(method, message));
            }
        }

        tracing::debug!("JSON-RPC request successful: method={}, id={}", method, id);
        Ok(serde_json::from_value(response.result.unwrap_or(Value::Null))?)
    }

    async fn round_trip(&mut self, line: &[u8]) -> Result<JsonRpcResponse> {
        self.writer.write_all(line).await?;
        self.writer.flush().await?;

        let mut reply = String::new();
        let n = self.reader.read_line(&mut reply).await?;
        if n == 0 {
            return Err(BackendError::InvalidResponse(format!(
                "Connection to {} closed while waiting for a response",
                self.addr
            )));
        }
        Ok(serde_json::from_str(reply.trim_end())?)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
