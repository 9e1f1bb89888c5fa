use serde::{Deserialize, Serialize};

/// A breakpoint as Delve describes it. Only the fields the bridge reads are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub addr: u64,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(rename = "functionName", default, skip_serializing_if = "String::is_empty")]
    pub function_name: String,
}

impl Breakpoint {
    pub fn at_function(name: impl Into<String>) -> Self {
        Self {
            function_name: name.into(),
            ..Self::default()
        }
    }

    pub fn at_line(file: impl Into<String>, line: i64) -> Self {
        Self {
            file: file.into(),
            line,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub pc: u64,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(default)]
    pub function: Option<Function>,
}

impl Location {
    pub fn function_name(&self) -> &str {
        self.function.as_ref().map(|f| f.name.as_str()).unwrap_or("??")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Goroutine {
    pub id: i64,
    #[serde(rename = "currentLoc", default)]
    pub current_loc: Location,
    /// Zero when the goroutine is not running on an OS thread.
    #[serde(rename = "threadID", default)]
    pub thread_id: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Thread {
    pub id: i64,
    #[serde(default)]
    pub pc: u64,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: i64,
    #[serde(rename = "goroutineID", default)]
    pub goroutine_id: i64,
    #[serde(rename = "breakPoint", default)]
    pub breakpoint: Option<Breakpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Stackframe {
    #[serde(flatten)]
    pub location: Location,
    #[serde(rename = "FrameOffset", default)]
    pub frame_offset: i64,
    #[serde(rename = "Err", default)]
    pub err: String,
}
