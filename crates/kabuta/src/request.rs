use std::time::{Instant, SystemTime};

use crate::parser::{parse_line, Command};
use crate::response::Timing;

/// One line from the IDE, alive until its response is written.
#[derive(Debug, Clone)]
pub struct Request {
    pub raw: String,
    /// `None` when the line is neither an MI nor a CLI command.
    pub command: Option<Command>,
    started: Instant,
    start_wall: SystemTime,
}

impl Request {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        Self {
            command: parse_line(&raw),
            raw,
            started: Instant::now(),
            start_wall: SystemTime::now(),
        }
    }

    pub fn token(&self) -> &str {
        self.command.as_ref().map(|c| c.token.as_str()).unwrap_or_default()
    }

    /// Bounds from creation until now.
    pub fn timing(&self) -> Timing {
        Timing {
            start: self.start_wall,
            elapsed: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_keeps_trimmed_raw_line() {
        let request = Request::new("  12-gdb-version\n");
        assert_eq!(request.raw, "12-gdb-version");
        assert_eq!(request.token(), "12");
        assert!(request.command.is_some());
    }

    #[test]
    fn test_unrecognized_request_has_no_command() {
        let request = Request::new("(gdb)");
        assert!(request.command.is_none());
        assert_eq!(request.token(), "");
    }

    #[test]
    fn test_timing_starts_at_creation() {
        let request = Request::new("1-gdb-version");
        let timing = request.timing();
        assert_eq!(timing.start, request.start_wall);
        assert!(timing.elapsed < std::time::Duration::from_secs(5));
    }
}
