use serde::{Deserialize, Serialize};

/// One catalog entry: a WGSL statement assigning into `buffer`, and the word
/// it must produce at invocation index 0.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub snippet: String,
    pub expected: u32,
}

impl TestCase {
    pub fn new(name: impl Into<String>, snippet: impl Into<String>, expected: u32) -> Self {
        Self {
            name: name.into(),
            snippet: snippet.into(),
            expected,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    pub cases: Vec<TestCase>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Compile,
    Dispatch,
    Readback,
    Timeout,
    Aborted,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Compile => "compile",
            FailureKind::Dispatch => "dispatch",
            FailureKind::Readback => "readback",
            FailureKind::Timeout => "timeout",
            FailureKind::Aborted => "aborted",
        }
    }
}

/// `got` is `None` only when the case never produced a value; `failure` then
/// names the stage that stopped it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub name: String,
    pub expected: u32,
    pub got: Option<u32>,
    pub passed: bool,
    pub failure: Option<FailureKind>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub passed: usize,
    pub failed: usize,
}
