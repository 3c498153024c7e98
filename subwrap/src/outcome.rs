use std::time::Duration;

use subwrap_types::{FailureKind, ReportRow, TestCase};

/// Why a case stopped before producing a value. A value that differs from the
/// expectation is not a `CaseError`; it is a failed row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaseError {
    #[error("shader compilation failed: {0}")]
    Compile(String),
    /// Bind group creation, encoding or submission was rejected; the shader
    /// never ran.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
    #[error("result readback failed: {0}")]
    Readback(String),
    #[error("case did not finish within {0:?}")]
    Timeout(Duration),
    #[error("case task ended without reporting a result")]
    Aborted,
}

impl CaseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CaseError::Compile(_) => FailureKind::Compile,
            CaseError::Dispatch(_) => FailureKind::Dispatch,
            CaseError::Readback(_) => FailureKind::Readback,
            CaseError::Timeout(_) => FailureKind::Timeout,
            CaseError::Aborted => FailureKind::Aborted,
        }
    }
}

pub type Outcome = Result<u32, CaseError>;

/// Exact comparison: no tolerance and no signed reinterpretation.
pub fn matches(expected: u32, got: u32) -> bool {
    expected == got
}

pub fn row_for(case: &TestCase, outcome: &Outcome) -> ReportRow {
    match outcome {
        Ok(got) => ReportRow {
            name: case.name.clone(),
            expected: case.expected,
            got: Some(*got),
            passed: matches(case.expected, *got),
            failure: None,
        },
        Err(err) => ReportRow {
            name: case.name.clone(),
            expected: case.expected,
            got: None,
            passed: false,
            failure: Some(err.kind()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_is_exact() {
        assert!(matches(0, 0));
        assert!(!matches(0, 0xFFFF_FFFF));
        assert!(!matches(0xFFFF_FFFF, 0));
        assert!(!matches(0, 1));
        // -1000 as i32 bit pattern against 1000
        assert!(!matches(1000, (-1000i32) as u32));
    }

    #[test]
    fn test_wrapped_value_is_a_failed_row() {
        let case = TestCase::new("x_sub_min", "buffer = gid.x - min(1000u, gid.x);", 0);
        let row = row_for(&case, &Ok(0xFFFF_FFFF));

        assert_eq!(row.got, Some(0xFFFF_FFFF));
        assert!(!row.passed);
        assert_eq!(row.failure, None);
    }

    #[test]
    fn test_matching_value_passes() {
        let case = TestCase::new("max_sub_c", "buffer = max(gid.x, 1000u) - 1000u;", 0);
        let row = row_for(&case, &Ok(0));
        assert!(row.passed);
        assert_eq!(row.got, Some(0));
    }

    #[test]
    fn test_compile_error_row() {
        let case = TestCase::new("broken", "buffer = nope;", 0);
        let row = row_for(&case, &Err(CaseError::Compile("unknown identifier".into())));

        assert!(!row.passed);
        assert_eq!(row.got, None);
        assert_eq!(row.failure, Some(FailureKind::Compile));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CaseError::Readback("lost".into()).kind(),
            FailureKind::Readback
        );
        assert_eq!(
            CaseError::Timeout(Duration::from_millis(5)).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            CaseError::Dispatch("invalid bind group".into()).kind(),
            FailureKind::Dispatch
        );
        assert_eq!(CaseError::Aborted.kind(), FailureKind::Aborted);
        assert_eq!(FailureKind::Dispatch.label(), "dispatch");
    }
}
