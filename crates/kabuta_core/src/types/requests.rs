use serde::Serialize;

use super::Breakpoint;

#[derive(Debug, Clone, Serialize)]
pub struct CreateBreakpointIn {
    #[serde(rename = "Breakpoint")]
    pub breakpoint: Breakpoint,
}

/// `Count` of zero asks for every goroutine.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListGoroutinesIn {
    #[serde(rename = "Start")]
    pub start: i64,
    #[serde(rename = "Count")]
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetThreadIn {
    #[serde(rename = "Id")]
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StacktraceIn {
    /// Goroutine id, `-1` for the current goroutine.
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "Depth")]
    pub depth: i64,
    #[serde(rename = "Full")]
    pub full: bool,
    #[serde(rename = "Defers")]
    pub defers: bool,
}
