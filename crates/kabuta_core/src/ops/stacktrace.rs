use crate::types::{Stackframe, StacktraceIn, StacktraceOut};
use crate::{DelveClient, Result};

pub const STACKTRACE: &str = "RPCServer.Stacktrace";

/// Goroutine id passed to Delve to mean "the selected goroutine".
pub const CURRENT_GOROUTINE: i64 = -1;

pub async fn stacktrace(client: &mut DelveClient, goroutine: i64, depth: i64) -> Result<Vec<Stackframe>> {
    let params = StacktraceIn {
        id: goroutine,
        depth,
        full: false,
        defers: false,
    };
    let out: StacktraceOut = client.call(STACKTRACE, &params).await?;
    Ok(out.locations)
}
