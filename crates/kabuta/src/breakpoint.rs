//! Breakpoints requested by the IDE and their Delve counterparts.
//!
//! Only the `function` and `file:line` linespec forms are understood; see
//! <https://sourceware.org/gdb/onlinedocs/gdb/Linespec-Locations.html>.

use std::fs::File;
use std::path::{Path, PathBuf};

use kabuta_core::types;
use thiserror::Error;

use crate::response::{field, MiValue};

/// Reported as the address of a breakpoint the backend has not resolved yet.
pub const PENDING_ADDRESS: &str = "<PENDING>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Function(String),
    FileLine { file: String, line: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("breakpoint location type not supported: {0}")]
    Unsupported(String),
    #[error("breakpoint location {location}: no such file {file}")]
    NoSuchFile { location: String, file: String },
    #[error("breakpoint location {location}: unparsable line number {line}")]
    UnparsableLine { location: String, line: String },
}

impl Location {
    pub fn backend_request(&self) -> types::Breakpoint {
        match self {
            Location::Function(name) => types::Breakpoint::at_function(name),
            Location::FileLine { file, line } => types::Breakpoint::at_line(file, i64::from(*line)),
        }
    }
}

/// Parses a linespec. Relative file names are resolved against `base` when
/// given, since Delve matches breakpoints by absolute source path.
pub fn parse_location(raw: &str, base: Option<&Path>) -> Result<Location, LocationError> {
    let segments: Vec<&str> = raw.split(':').collect();
    match segments.as_slice() {
        [single] => {
            let offset = single.starts_with('+') || single.starts_with('-');
            if offset || single.parse::<i64>().is_ok() || single.is_empty() {
                return Err(LocationError::Unsupported(raw.to_string()));
            }
            Ok(Location::Function(single.to_string()))
        }
        [file, line] => {
            let path = resolve(file, base);
            if !is_readable_file(&path) {
                return Err(LocationError::NoSuchFile {
                    location: raw.to_string(),
                    file: file.to_string(),
                });
            }
            let line = line.parse::<u32>().map_err(|_| LocationError::UnparsableLine {
                location: raw.to_string(),
                line: line.to_string(),
            })?;
            Ok(Location::FileLine {
                file: path.display().to_string(),
                line,
            })
        }
        _ => Err(LocationError::Unsupported(raw.to_string())),
    }
}

fn resolve(file: &str, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) if Path::new(file).is_relative() => base.join(file),
        _ => PathBuf::from(file),
    }
}

fn is_readable_file(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Recorded before a backend connection existed.
    Pending,
    Resolved(types::Breakpoint),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Breakpoint {
    pub number: u32,
    pub raw_location: String,
    pub location: Location,
    pub resolution: Resolution,
}

impl Breakpoint {
    /// What to ask Delve to create for this breakpoint.
    pub fn backend_request(&self) -> types::Breakpoint {
        self.location.backend_request()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.resolution, Resolution::Pending)
    }

    /// The `bkpt={...}` tuple. `shlib` is the binary being debugged.
    pub fn descriptor(&self, shlib: &str) -> MiValue {
        let (addr, func, file, line) = match (&self.resolution, &self.location) {
            (Resolution::Resolved(bp), _) => (
                format!("{:#018x}", bp.addr),
                bp.function_name.clone(),
                bp.file.clone(),
                bp.line.to_string(),
            ),
            (_, Location::Function(name)) => {
                (PENDING_ADDRESS.to_string(), name.clone(), String::new(), "0".to_string())
            }
            (_, Location::FileLine { file, line }) => (
                PENDING_ADDRESS.to_string(),
                "??".to_string(),
                file.clone(),
                line.to_string(),
            ),
        };

        MiValue::Tuple(vec![
            field("number", MiValue::string(self.number)),
            field("type", MiValue::string("breakpoint")),
            field("disp", MiValue::string("keep")),
            field("enabled", MiValue::string("y")),
            field("addr", MiValue::Const(addr)),
            field("func", MiValue::Const(func)),
            field("file", MiValue::Const(file)),
            field("line", MiValue::Const(line)),
            field("shlib", MiValue::string(shlib)),
            field("times", MiValue::string(0)),
        ])
    }
}

/// Breakpoints in insertion order. Numbers start at 1 and never change.
#[derive(Debug, Default)]
pub struct BreakpointRegistry {
    entries: Vec<Breakpoint>,
}

impl BreakpointRegistry {
    pub fn push(&mut self, raw_location: &str, location: Location, resolution: Resolution) -> &Breakpoint {
        let number = self.next_number();
        self.entries.push(Breakpoint {
            number,
            raw_location: raw_location.to_string(),
            location,
            resolution,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn next_number(&self) -> u32 {
        self.entries.len() as u32 + 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Breakpoint> {
        self.entries.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDir;

    #[test]
    fn test_function_location() {
        assert_eq!(
            parse_location("main.main", None),
            Ok(Location::Function("main.main".to_string()))
        );
    }

    #[test]
    fn test_offsets_and_bare_line_numbers_are_unsupported() {
        for raw in ["+5", "-3", "42", ""] {
            assert_eq!(
                parse_location(raw, None),
                Err(LocationError::Unsupported(raw.to_string())),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_too_many_segments_are_unsupported() {
        assert!(matches!(
            parse_location("a.go:main:3", None),
            Err(LocationError::Unsupported(_))
        ));
    }

    #[test]
    fn test_file_line_requires_existing_file() {
        let err = parse_location("missing.go:5", None).unwrap_err();
        assert!(matches!(err, LocationError::NoSuchFile { .. }));
        assert!(err.to_string().contains("no such file"));
    }

    #[test]
    fn test_file_line_location() {
        let dir = TempDir::new("bp-file-line");
        let file = dir.write("main.go", "package main\n");
        let raw = format!("{}:10", file.display());

        assert_eq!(
            parse_location(&raw, None),
            Ok(Location::FileLine {
                file: file.display().to_string(),
                line: 10
            })
        );
    }

    #[test]
    fn test_relative_file_is_resolved_against_base() {
        let dir = TempDir::new("bp-relative");
        let file = dir.write("main.go", "package main\n");

        assert_eq!(
            parse_location("main.go:7", Some(dir.path())),
            Ok(Location::FileLine {
                file: file.display().to_string(),
                line: 7
            })
        );
    }

    #[test]
    fn test_unparsable_line_number() {
        let dir = TempDir::new("bp-bad-line");
        let file = dir.write("main.go", "package main\n");

        for line in ["ten", "-1"] {
            let raw = format!("{}:{line}", file.display());
            let err = parse_location(&raw, None).unwrap_err();
            assert!(err.to_string().contains("unparsable line number"), "{err}");
        }
    }

    #[test]
    fn test_registry_numbers_start_at_one() {
        let mut registry = BreakpointRegistry::default();
        assert_eq!(
            registry
                .push("main", Location::Function("main".into()), Resolution::Pending)
                .number,
            1
        );
        assert_eq!(
            registry
                .push("init", Location::Function("init".into()), Resolution::Pending)
                .number,
            2
        );
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.iter().last().map(|bp| bp.raw_location.as_str()), Some("init"));
    }

    #[test]
    fn test_pending_descriptor() {
        let mut registry = BreakpointRegistry::default();
        let bp = registry.push(
            "main.go:10",
            Location::FileLine {
                file: "main.go".into(),
                line: 10,
            },
            Resolution::Pending,
        );
        assert!(bp.is_pending());
        assert_eq!(
            bp.descriptor("/bin/foo"),
            MiValue::Tuple(vec![
                field("number", MiValue::string(1)),
                field("type", MiValue::string("breakpoint")),
                field("disp", MiValue::string("keep")),
                field("enabled", MiValue::string("y")),
                field("addr", MiValue::string(PENDING_ADDRESS)),
                field("func", MiValue::string("??")),
                field("file", MiValue::string("main.go")),
                field("line", MiValue::string(10)),
                field("shlib", MiValue::string("/bin/foo")),
                field("times", MiValue::string(0)),
            ])
        );
    }

    #[test]
    fn test_resolved_descriptor_uses_backend_values() {
        let mut registry = BreakpointRegistry::default();
        let resolved = types::Breakpoint {
            id: 3,
            addr: 0x10a2f34,
            file: "/src/cli/main.go".into(),
            line: 12,
            function_name: "main.main".into(),
            ..types::Breakpoint::default()
        };
        let bp = registry.push(
            "main.main",
            Location::Function("main.main".into()),
            Resolution::Resolved(resolved),
        );
        let MiValue::Tuple(fields) = bp.descriptor("") else {
            panic!("descriptor should be a tuple");
        };
        assert_eq!(fields[4], field("addr", MiValue::string("0x00000000010a2f34")));
        assert_eq!(fields[5], field("func", MiValue::string("main.main")));
        assert_eq!(fields[6], field("file", MiValue::string("/src/cli/main.go")));
        assert_eq!(fields[7], field("line", MiValue::string(12)));
    }

    #[test]
    fn test_backend_request_shapes() {
        let bp = Breakpoint {
            number: 1,
            raw_location: "main.go:10".into(),
            location: Location::FileLine {
                file: "main.go".into(),
                line: 10,
            },
            resolution: Resolution::Pending,
        };
        assert_eq!(bp.backend_request(), types::Breakpoint::at_line("main.go", 10));
    }
}
