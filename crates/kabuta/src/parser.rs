//! Classification of raw IDE lines into MI or CLI commands.
//!
//! `<digits>-<mi-command> [args...]` is an MI command, `<digits><cli-command> [args...]`
//! a CLI command. Anything else is unrecognized and gets no response.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Mi,
    Cli,
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    /// Leading digit run, echoed verbatim in the response. May be empty.
    pub token: String,
    pub name: String,
    pub args: Vec<String>,
    /// Everything after the first space following the name.
    pub args_str: String,
}

impl Command {
    /// Handler identifiers this command could map to, longest first, each with
    /// the number of leading arguments it absorbs. MI names yield exactly one
    /// candidate; CLI names may span several words (`info threads`).
    pub fn handler_candidates(&self) -> Vec<(String, usize)> {
        match self.kind {
            CommandKind::Mi => vec![(handler_id(self.name.split('-')), 0)],
            CommandKind::Cli => {
                let words: Vec<&str> = std::iter::once(self.name.as_str())
                    .chain(self.args.iter().map(String::as_str))
                    .collect();
                (1..=words.len().min(MAX_CLI_WORDS))
                    .rev()
                    .map(|n| (handler_id(words[..n].iter().copied()), n - 1))
                    .collect()
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{} {}", self.name, self.args_str)
        }
    }
}

const MAX_CLI_WORDS: usize = 3;

/// Capitalizes the first character of every segment and concatenates them:
/// `break-insert` → `BreakInsert`. An empty segment is kept as `-`, so a
/// malformed name never matches a registered handler.
pub fn handler_id<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => "-".to_string(),
            }
        })
        .collect()
}

pub fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    let (token, rest) = line.split_at(digits);

    let (kind, body) = match rest.strip_prefix('-') {
        Some(body) => (CommandKind::Mi, body),
        None => (CommandKind::Cli, rest),
    };

    let (name, args_str) = match body.split_once(' ') {
        Some((name, args)) => (name, args.trim()),
        None => (body, ""),
    };

    let valid_name = match kind {
        CommandKind::Mi => !name.is_empty() && !name.starts_with('-'),
        CommandKind::Cli => !token.is_empty() && name.starts_with(|c: char| c.is_ascii_alphabetic()),
    };
    if !valid_name {
        return None;
    }

    Some(Command {
        kind,
        token: token.to_string(),
        name: name.to_string(),
        args: args_str
            .split(' ')
            .filter(|arg| !arg.is_empty())
            .map(str::to_string)
            .collect(),
        args_str: args_str.to_string(),
    })
}
