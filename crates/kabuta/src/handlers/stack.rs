use std::path::Path;

use kabuta_core::ops::{self, stacktrace::CURRENT_GOROUTINE};
use kabuta_core::types::Stackframe;

use crate::dispatch::{HandlerResult, Invocation, Reply};
use crate::error::CommandError;
use crate::options::{OptionSpec, ParsedOptions};
use crate::response::{field, MiValue};
use crate::session::Session;

const DEFAULT_HIGH_FRAME: u32 = 100;

const STACK_OPTIONS: OptionSpec = OptionSpec {
    switches: &["--no-frame-filters"],
    valued: &["--thread", "--frame"],
};

/// `-stack-list-frames [--thread N] [low [high]]`
pub async fn stack_list_frames(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    let parsed = STACK_OPTIONS.parse(inv.args)?;
    let (low, high) = match parsed.positionals.as_slice() {
        [] => (0, DEFAULT_HIGH_FRAME),
        [low] => (parse_frame(low)?, DEFAULT_HIGH_FRAME),
        [low, high] => (parse_frame(low)?, parse_frame(high)?),
        _ => return Err(CommandError::Malformed(format!("invalid frame range {}", inv.args_str()))),
    };
    if low > high {
        return Err(CommandError::Malformed(format!("invalid frame range {low} {high}")));
    }

    let frames = fetch_frames(session, &parsed, high).await?;
    let stack = frames
        .iter()
        .enumerate()
        .filter(|(level, _)| (low as usize..=high as usize).contains(level))
        .map(|(level, frame)| field("frame", frame_descriptor(level, frame)))
        .collect();

    Ok(Reply::done().with_field("stack", MiValue::ResultList(stack)))
}

/// `-stack-info-depth [--thread N] [max-depth]`
pub async fn stack_info_depth(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    let parsed = STACK_OPTIONS.parse(inv.args)?;
    let requested = match parsed.positionals.as_slice() {
        [] => None,
        [depth] => Some(parse_frame(depth)?),
        _ => return Err(CommandError::Malformed(format!("invalid depth {}", inv.args_str()))),
    };

    let frames = fetch_frames(session, &parsed, requested.unwrap_or(DEFAULT_HIGH_FRAME)).await?;
    let depth = requested.map_or(frames.len(), |d| d as usize);
    Ok(Reply::done().with_field("depth", MiValue::string(depth)))
}

async fn fetch_frames(session: &mut Session, parsed: &ParsedOptions, depth: u32) -> Result<Vec<Stackframe>, CommandError> {
    let goroutine = match parsed.value("--thread") {
        Some(id) => id
            .parse::<i64>()
            .map_err(|_| CommandError::Malformed(format!("invalid thread id {id}")))?,
        None => CURRENT_GOROUTINE,
    };
    let rpc = session.rpc_mut()?;
    ops::stacktrace(rpc, goroutine, i64::from(depth))
        .await
        .map_err(|e| CommandError::backend("error listing frames", e))
}

fn parse_frame(raw: &str) -> Result<u32, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::Malformed(format!("invalid frame number {raw}")))
}

fn frame_descriptor(level: usize, frame: &Stackframe) -> MiValue {
    let location = &frame.location;
    let file = Path::new(&location.file)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    MiValue::Tuple(vec![
        field("level", MiValue::string(level)),
        field("addr", MiValue::Const(format!("{:#018x}", location.pc))),
        field("func", MiValue::string(location.function_name())),
        field("file", MiValue::Const(file)),
        field("fullname", MiValue::string(&location.file)),
        field("line", MiValue::string(location.line)),
    ])
}
