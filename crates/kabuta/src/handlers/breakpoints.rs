use kabuta_core::ops;

use crate::breakpoint::{parse_location, Resolution};
use crate::dispatch::{HandlerResult, Invocation, Reply};
use crate::error::CommandError;
use crate::options::OptionSpec;
use crate::session::Session;

/// GDB's `-break-insert` flags. All are accepted and ignored.
const BREAK_INSERT_OPTIONS: OptionSpec = OptionSpec {
    switches: &["-t", "-h", "-f", "-d", "-a"],
    valued: &["-c", "-i", "-p"],
};

/// `-break-insert [flags] <location>`
pub async fn break_insert(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    let parsed = BREAK_INSERT_OPTIONS.parse(inv.args)?;
    let raw = match parsed.positionals.as_slice() {
        [] => return Err(CommandError::Malformed("no location supplied".into())),
        [raw] => raw.as_str(),
        many => {
            return Err(CommandError::Malformed(format!(
                "expected one location, got {}",
                many.join(" ")
            )))
        }
    };
    if !parsed.switches.is_empty() || !parsed.values.is_empty() {
        tracing::debug!("Ignoring break-insert flags {:?} {:?}", parsed.switches, parsed.values);
    }

    let location = parse_location(raw, session.cwd.as_deref())?;

    let resolution = match session.rpc.as_mut() {
        Some(rpc) => {
            let created = ops::create_breakpoint(rpc, location.backend_request())
                .await
                .map_err(|e| CommandError::backend("breakpoint creation error", e))?;
            Resolution::Resolved(created)
        }
        None => {
            tracing::info!("No backend yet, breakpoint {} is pending", raw);
            Resolution::Pending
        }
    };

    let shlib = session.shlib();
    let bp = session.breakpoints.push(raw, location, resolution);
    Ok(Reply::done().with_field("bkpt", bp.descriptor(&shlib)))
}
