use serde::Deserialize;

use super::{Breakpoint, Goroutine, Stackframe, Thread};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBreakpointOut {
    #[serde(rename = "Breakpoint")]
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListGoroutinesOut {
    #[serde(rename = "Goroutines", default)]
    pub goroutines: Vec<Goroutine>,
    #[serde(rename = "Nextg", default)]
    pub nextg: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetThreadOut {
    #[serde(rename = "Thread")]
    pub thread: Option<Thread>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StacktraceOut {
    #[serde(rename = "Locations", default)]
    pub locations: Vec<Stackframe>,
}
