use std::sync::Arc;

use subwrap::report::{MarkdownTable, StatusLog};
use subwrap::outcome::row_for;
use subwrap::runner::execute_case;
use subwrap::shader::ShaderBuilder;
use subwrap::{
    catalog, run, CaseError, Catalog, DeviceSession, Error, FailureKind, HarnessConfig, ReportRow,
    ReportSink, RunSummary, TestCase, SENTINEL,
};

fn require_gpu() -> bool {
    let Ok(raw) = std::env::var("SUBWRAP_REQUIRE_GPU") else {
        return false;
    };
    let v = raw.trim();
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}

fn skip_or_panic(test_name: &str, reason: &str) {
    if require_gpu() {
        panic!("SUBWRAP_REQUIRE_GPU is set but {test_name} cannot run: {reason}");
    }
    eprintln!("skipping {test_name}: {reason}");
}

/// Runs `catalog` and returns its rows, or `None` when no GPU is available.
fn run_or_skip(
    test_name: &str,
    config: &HarnessConfig,
    catalog: &Catalog,
) -> Option<(Vec<ReportRow>, RunSummary)> {
    let mut rows: Vec<ReportRow> = Vec::new();
    let status = StatusLog::new();
    match run(config, catalog, &mut rows, &status) {
        Ok(summary) => {
            assert_eq!(
                status.current(),
                Some(format!("{} tests complete.", catalog.cases.len()))
            );
            Some((rows, summary))
        }
        Err(Error::UnsupportedPlatform(reason)) => {
            assert!(rows.is_empty());
            skip_or_panic(test_name, &reason);
            None
        }
        Err(e) => panic!("{test_name}: run failed: {e}"),
    }
}

async fn session_or_skip(test_name: &str) -> Option<Arc<DeviceSession>> {
    match DeviceSession::acquire(&HarnessConfig::default()).await {
        Ok(session) => Some(Arc::new(session)),
        Err(e) => {
            skip_or_panic(test_name, &e.to_string());
            None
        }
    }
}

fn row<'a>(rows: &'a [ReportRow], name: &str) -> &'a ReportRow {
    rows.iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no row for {name}"))
}

#[test]
fn test_builtin_identities_evaluate_to_zero() {
    let catalog = catalog::builtin();
    let Some((rows, summary)) = run_or_skip(
        "test_builtin_identities_evaluate_to_zero",
        &HarnessConfig::default(),
        &catalog,
    ) else {
        return;
    };

    assert_eq!(rows.len(), 6);
    assert_eq!(summary.total, 6);
    for case in &catalog.cases {
        let row = row(&rows, &case.name);
        assert_eq!(row.got, Some(0), "{} read back {:?}", case.name, row.got);
        assert!(row.passed, "{} failed", case.name);
    }
    assert!(summary.all_passed());
}

#[test]
fn test_identities_without_unused_uniform() {
    let config = HarnessConfig {
        always_bind_zero: false,
        ..Default::default()
    };
    let Some((rows, summary)) = run_or_skip(
        "test_identities_without_unused_uniform",
        &config,
        &catalog::builtin(),
    ) else {
        return;
    };

    assert_eq!(rows.len(), 6);
    assert!(summary.all_passed(), "rows: {rows:?}");
}

#[test]
fn test_multi_threaded_runtime() {
    let config = HarnessConfig {
        worker_threads: Some(2),
        ..Default::default()
    };
    let Some((rows, _)) = run_or_skip("test_multi_threaded_runtime", &config, &catalog::builtin())
    else {
        return;
    };

    let mut names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(
        names,
        vec!["add_sub_min", "c_sub_max", "max_sub_c", "min_sub_x", "select", "x_sub_min"]
    );
}

#[test]
fn test_global_invocation_id_is_zero() {
    let catalog = Catalog {
        cases: vec![TestCase::new(
            "gid_zero",
            "buffer = 7u + gid.x + (gid.y << 10u) + (gid.z << 20u);",
            7,
        )],
    };
    let Some((rows, _)) = run_or_skip(
        "test_global_invocation_id_is_zero",
        &HarnessConfig::default(),
        &catalog,
    ) else {
        return;
    };

    assert_eq!(rows[0].got, Some(7));
    assert!(rows[0].passed);
}

#[test]
fn test_compile_error_is_isolated() {
    let catalog = Catalog {
        cases: vec![
            TestCase::new("broken", "buffer = not_declared;", 0),
            TestCase::new("max_sub_c", "buffer = max(gid.x, 1000u) - 1000u;", 0),
        ],
    };
    let Some((rows, summary)) = run_or_skip(
        "test_compile_error_is_isolated",
        &HarnessConfig::default(),
        &catalog,
    ) else {
        return;
    };

    assert_eq!(rows.len(), 2);
    let broken = row(&rows, "broken");
    assert!(!broken.passed);
    assert_eq!(broken.got, None);
    assert_eq!(broken.failure, Some(FailureKind::Compile));
    assert!(row(&rows, "max_sub_c").passed);
    assert_eq!(summary.errored, 1);
}

#[test]
fn test_mismatch_is_a_failed_row() {
    let catalog = Catalog {
        cases: vec![TestCase::new("wraps", "buffer = gid.x - 1000u;", 0)],
    };
    let Some((rows, summary)) = run_or_skip(
        "test_mismatch_is_a_failed_row",
        &HarnessConfig::default(),
        &catalog,
    ) else {
        return;
    };

    assert_eq!(rows[0].got, Some(0u32.wrapping_sub(1000)));
    assert!(!rows[0].passed);
    assert_eq!(rows[0].failure, None);
    assert_eq!(summary.errored, 0);
}

#[test]
fn test_markdown_table_from_run() {
    let catalog = catalog::builtin();
    let Some((rows, _)) = run_or_skip(
        "test_markdown_table_from_run",
        &HarnessConfig::default(),
        &catalog,
    ) else {
        return;
    };

    let mut table = MarkdownTable::new();
    for row in &rows {
        table.add_row(row);
    }
    let rendered = table.render();
    assert_eq!(rendered.lines().count(), catalog.cases.len() + 2);
    assert!(rendered.contains("| select       | 0          | 0          | Pass |"));
}

#[tokio::test]
async fn test_unwritten_result_reads_sentinel() {
    let Some(session) = session_or_skip("test_unwritten_result_reads_sentinel").await else {
        return;
    };

    // Writes only for invocations other than the single one dispatched.
    let case = TestCase::new("noop", "if (gid.x > 0u) { buffer = 1u; }", 0);
    let shader = ShaderBuilder::new(true).build(&case.snippet);
    let got = execute_case(&session, &case, &shader).await.unwrap();

    assert_eq!(got, SENTINEL);
    assert_ne!(got, case.expected);
}

#[tokio::test]
async fn test_execute_case_reads_computed_word() {
    let Some(session) = session_or_skip("test_execute_case_reads_computed_word").await else {
        return;
    };

    let case = TestCase::new("constant", "buffer = 0x01020304u;", 0x0102_0304);
    let shader = ShaderBuilder::new(false).build(&case.snippet);
    assert!(!shader.binds_zero);

    let got = execute_case(&session, &case, &shader).await.unwrap();
    assert_eq!(got, 0x0102_0304);
}

#[tokio::test]
async fn test_rejected_dispatch_is_a_failure_row() {
    let Some(session) = session_or_skip("test_rejected_dispatch_is_a_failure_row").await else {
        return;
    };

    // Compiles, but the inferred layout has no result binding, so the bind
    // group is rejected and the shader never runs.
    let case = TestCase::new("phony", "/* buffer */ _ = gid;", 0);
    let shader = ShaderBuilder::new(true).build(&case.snippet);
    let outcome = execute_case(&session, &case, &shader).await;
    assert!(
        matches!(outcome, Err(CaseError::Dispatch(_))),
        "outcome: {outcome:?}"
    );

    let row = row_for(&case, &outcome);
    assert!(!row.passed);
    assert_eq!(row.got, None);
    assert_eq!(row.failure, Some(FailureKind::Dispatch));

    // The device stays usable for the next case.
    let next = TestCase::new("after", "buffer = 3u;", 3);
    let shader = ShaderBuilder::new(true).build(&next.snippet);
    assert_eq!(execute_case(&session, &next, &shader).await.unwrap(), 3);
}

#[test]
fn test_no_backends_fails_before_any_case() {
    let config = HarnessConfig {
        backends_bits: 0,
        ..Default::default()
    };
    let mut rows: Vec<ReportRow> = Vec::new();
    let status = StatusLog::new();

    let result = run(&config, &catalog::builtin(), &mut rows, &status);

    assert!(matches!(result, Err(Error::UnsupportedPlatform(_))));
    assert!(rows.is_empty());
    assert_eq!(
        status.messages(),
        vec![
            "Initializing...".to_string(),
            "WebGPU is not supported on this platform.".to_string()
        ]
    );
}
