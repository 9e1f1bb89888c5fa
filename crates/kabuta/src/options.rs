//! Per-invocation option parsing for handlers that take GDB-style flags.

use std::collections::HashMap;

use crate::error::CommandError;

/// Options a handler accepts. Switches stand alone; valued options consume
/// the following argument.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub switches: &'static [&'static str],
    pub valued: &'static [&'static str],
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedOptions {
    pub switches: Vec<&'static str>,
    pub values: HashMap<&'static str, String>,
    pub positionals: Vec<String>,
}

impl ParsedOptions {
    pub fn value(&self, option: &str) -> Option<&str> {
        self.values.get(option).map(String::as_str)
    }
}

impl OptionSpec {
    /// `--` ends option parsing. `-<digit>...` and a lone `-` are positionals.
    pub fn parse(&self, args: &[String]) -> Result<ParsedOptions, CommandError> {
        let mut parsed = ParsedOptions::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            if arg == "--" {
                parsed.positionals.extend(iter.by_ref().cloned());
                break;
            }
            if !is_option(arg) {
                parsed.positionals.push(arg.clone());
                continue;
            }

            if let Some(switch) = self.switches.iter().copied().find(|s| *s == arg.as_str()) {
                parsed.switches.push(switch);
            } else if let Some(option) = self.valued.iter().copied().find(|o| *o == arg.as_str()) {
                let value = iter
                    .next()
                    .ok_or_else(|| CommandError::Malformed(format!("option {arg} requires a value")))?;
                parsed.values.insert(option, value.clone());
            } else {
                return Err(CommandError::Unsupported(format!("unsupported option {arg}")));
            }
        }

        Ok(parsed)
    }
}

fn is_option(arg: &str) -> bool {
    match arg.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit()),
        None => false,
    }
}
