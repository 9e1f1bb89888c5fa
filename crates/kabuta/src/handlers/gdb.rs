//! Commands answered from fixed tables or session fields, never the backend.

use crate::dispatch::{HandlerResult, Invocation, Reply};
use crate::error::CommandError;
use crate::response::MiValue;
use crate::session::Session;

/// What the IDE expects `gdb --version` to print.
pub const GDB_VERSION_BANNER: &str = r#"GNU gdb 6.3.50.20050815-cvs (Wed Nov 26 07:47:26 UTC 2014)
Copyright 2004 Free Software Foundation, Inc.
GDB is free software, covered by the GNU General Public License, and you are
welcome to change it and/or distribute copies of it under certain conditions.
Type "show copying" to see the conditions.
There is absolutely no warranty for GDB.  Type "show warranty" for details.
This GDB was configured as "--host=i686-apple-darwin14.0.0 --target=".
"#;

const GDB_VERSION: &str = "6.3.50.20050815-cvs";
const GDB_BUILD_DATE: &str = "Wed Nov 26 07:47:26 UTC 2014";

const POINTER_SIZE_EXPRESSION: &str = "\"sizeof (void*)\"";

pub fn gdb_version(inv: &mut Invocation<'_>) -> HandlerResult {
    let mut lines = GDB_VERSION_BANNER.lines().peekable();
    while let Some(line) = lines.next() {
        if lines.peek().is_some() {
            inv.console(format!("{line}\n"));
        } else {
            inv.console(line);
        }
    }

    Ok(Reply::done()
        .with_field("version", MiValue::string(GDB_VERSION))
        .with_field("rc_version", MiValue::string("unknown"))
        .with_field("target", MiValue::string(""))
        .with_field("build-date", MiValue::string(GDB_BUILD_DATE)))
}

pub fn data_evaluate_expression(inv: &mut Invocation<'_>) -> HandlerResult {
    let expression = inv.args_str();
    if expression == POINTER_SIZE_EXPRESSION {
        return Ok(Reply::done().with_field("value", MiValue::string(8)));
    }
    Err(CommandError::Unsupported(format!("don't know how to evaluate {expression}")))
}

pub fn gdb_set(session: &mut Session, inv: &mut Invocation<'_>) -> HandlerResult {
    let dont_know = || CommandError::Unsupported(format!("don't know how to set {}", inv.args_str()));
    let args: Vec<&str> = inv.args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["breakpoint", "pending", value] => match *value {
            // TODO: make `off` clear the flag once break-insert refuses
            // locations the backend cannot resolve yet.
            "on" | "off" => {
                session.pending_breakpoints = true;
                Ok(Reply::done())
            }
            other => Err(CommandError::Malformed(format!(
                "unknown value for breakpoint pending: {other}"
            ))),
        },
        ["args", rest @ ..] => {
            session.target_args = rest.join(" ");
            tracing::info!("Binary args: {}", session.target_args);
            Ok(Reply::done())
        }
        ["env", rest @ ..] => {
            let assignment = rest.join(" ");
            let (key, value) = assignment
                .split_once(" = ")
                .ok_or_else(|| CommandError::Malformed(format!("bad value for env {assignment}")))?;
            session.env.insert(key.to_string(), value.to_string());
            Ok(Reply::done())
        }
        ["print", "sevenbit-strings" | "object", ..] | ["charset", ..] | ["auto-solib-add", ..] => {
            Ok(Reply::done())
        }
        _ => Err(dont_know()),
    }
}

pub fn gdb_show(inv: &mut Invocation<'_>) -> HandlerResult {
    match inv.args.first().map(String::as_str) {
        Some("language") => Ok(Reply::done().with_field("value", MiValue::string("auto; currently c"))),
        Some("endian") => Ok(Reply::done()),
        _ => Err(CommandError::Unsupported(format!(
            "don't know how to show {}",
            inv.args_str()
        ))),
    }
}

pub fn noop(_inv: &mut Invocation<'_>) -> HandlerResult {
    Ok(Reply::done())
}

/// `-gdb-exit`: the frontend loop stops and the backend is shut down.
pub fn gdb_exit(_inv: &mut Invocation<'_>) -> HandlerResult {
    Ok(Reply::exit())
}
