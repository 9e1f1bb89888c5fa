//! GDB/MI output records.
//!
//! Result records: `<token>^<class>,<k>=<v>,...,time={...}`, or
//! `<token>^error,msg="..."`. Stream records: `~"..."` (console) and `@"..."`
//! (output). CLI commands only get `<token>^<class>`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::parser::CommandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultClass {
    #[default]
    Done,
    Running,
    Error,
    Exit,
}

impl ResultClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultClass::Done => "done",
            ResultClass::Running => "running",
            ResultClass::Error => "error",
            ResultClass::Exit => "exit",
        }
    }
}

/// A GDB/MI value: a quoted constant, a `{...}` tuple, or a `[...]` list of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiValue {
    Const(String),
    Tuple(Vec<(String, MiValue)>),
    ResultList(Vec<(String, MiValue)>),
}

impl MiValue {
    pub fn string(value: impl ToString) -> Self {
        MiValue::Const(value.to_string())
    }

    fn render_into(&self, out: &mut String) {
        match self {
            MiValue::Const(s) => out.push_str(&quote(s)),
            MiValue::Tuple(fields) => {
                out.push('{');
                render_results(fields, out);
                out.push('}');
            }
            MiValue::ResultList(fields) => {
                out.push('[');
                render_results(fields, out);
                out.push(']');
            }
        }
    }
}

/// Shorthand for one `key=value` pair.
pub fn field(key: &str, value: MiValue) -> (String, MiValue) {
    (key.to_string(), value)
}

fn render_results(fields: &[(String, MiValue)], out: &mut String) {
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push('=');
        value.render_into(out);
    }
}

/// C-style quoting as used by GDB for every string constant.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wall-clock bounds of one request, rendered as the `time={...}` block.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub start: SystemTime,
    pub elapsed: Duration,
}

impl Timing {
    /// GDB reports user and system time separately; the bridge only knows
    /// wall-clock time and splits it evenly.
    pub fn render(&self) -> String {
        let start = self
            .start
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        let wallclock = self.elapsed.as_secs_f64();
        let half = wallclock / 2.0;
        format!(
            "time={{wallclock=\"{wallclock:.5}\",user=\"{half:.5}\",system=\"{half:.5}\",start=\"{start:.6}\",end=\"{:.6}\"}}",
            start + wallclock
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    pub class: ResultClass,
    pub fields: Vec<(String, MiValue)>,
    pub error: Option<String>,
}

impl Response {
    pub fn done() -> Self {
        Self::default()
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            class: ResultClass::Error,
            fields: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn render(&self, kind: CommandKind, token: &str, timing: &Timing) -> String {
        if let Some(message) = &self.error {
            return format!("{token}^error,msg={}\n", quote(message));
        }

        match kind {
            CommandKind::Mi => {
                let mut out = format!("{token}^{}", self.class.as_str());
                out.push(',');
                if !self.fields.is_empty() {
                    render_results(&self.fields, &mut out);
                    out.push(',');
                }
                out.push_str(&timing.render());
                out.push('\n');
                out
            }
            CommandKind::Cli => format!("{token}^{}\n", self.class.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRecord {
    Console(String),
    Output(String),
}

impl StreamRecord {
    pub fn render(&self) -> String {
        match self {
            StreamRecord::Console(text) => format!("~{}\n", quote(text)),
            StreamRecord::Output(text) => format!("@{}\n", quote(text)),
        }
    }
}
