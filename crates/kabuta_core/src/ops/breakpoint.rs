use crate::types::{Breakpoint, CreateBreakpointIn, CreateBreakpointOut};
use crate::{DelveClient, Result};

pub const CREATE_BREAKPOINT: &str = "RPCServer.CreateBreakpoint";

/// Returns the breakpoint as resolved by the backend (id, address, function, file, line).
pub async fn create_breakpoint(client: &mut DelveClient, breakpoint: Breakpoint) -> Result<Breakpoint> {
    let out: CreateBreakpointOut = client
        .call(CREATE_BREAKPOINT, &CreateBreakpointIn { breakpoint })
        .await?;
    tracing::info!(
        "Delve breakpoint {} at {:#x} ({}:{})",
        out.breakpoint.id,
        out.breakpoint.addr,
        out.breakpoint.file,
        out.breakpoint.line
    );
    Ok(out.breakpoint)
}
