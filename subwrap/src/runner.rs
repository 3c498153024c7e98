use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use subwrap_types::{Catalog, ReportRow, TestCase};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::outcome::{self, CaseError, Outcome};
use crate::resources::CaseResources;
use crate::shader::{ShaderBuilder, ShaderSource};
use crate::{dispatch, pipeline, readback, validate};
use crate::{DeviceSession, Error, HarnessConfig, ReportSink, StatusSink};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed rows that never produced a value.
    pub errored: usize,
}

impl RunSummary {
    fn record(&mut self, row: &ReportRow) {
        self.total += 1;
        if row.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
            if row.failure.is_some() {
                self.errored += 1;
            }
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Compile, dispatch and read back one case.
pub async fn execute_case(
    session: &Arc<DeviceSession>,
    case: &TestCase,
    shader: &ShaderSource,
) -> Outcome {
    let compiled = pipeline::compile(session, &case.name, shader).await?;
    let resources = CaseResources::allocate(session.device(), &case.name, shader.binds_zero);
    let submission = dispatch::submit(session, &compiled, &resources, &case.name).await?;
    readback::read_word(session, &resources.staging, submission).await
}

async fn with_timeout<F>(work: F, timeout: Option<Duration>) -> Outcome
where
    F: Future<Output = Outcome>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or(Err(CaseError::Timeout(limit))),
        None => work.await,
    }
}

/// Runs every case concurrently against one session.
///
/// Rows reach `sink` in completion order. The completion status is set, and
/// the sink finalized, only after every case task has finished. If the
/// session cannot be acquired no case runs and no row is produced.
pub async fn run_catalog(
    config: &HarnessConfig,
    catalog: &Catalog,
    sink: &mut dyn ReportSink,
    status: &dyn StatusSink,
) -> Result<RunSummary, Error> {
    validate(catalog)?;

    status.set_status("Initializing...");
    let session = match DeviceSession::acquire(config).await {
        Ok(session) => Arc::new(session),
        Err(e) => {
            status.set_status(&e.to_string());
            return Err(e);
        }
    };

    let builder = ShaderBuilder::new(config.always_bind_zero);
    drive(&catalog.cases, config.timeout(), sink, status, |case| {
        let shader = builder.build(&case.snippet);
        let session = Arc::clone(&session);
        let case = case.clone();
        async move { execute_case(&session, &case, &shader).await }
    })
    .await
}

/// Spawns `execute(case)` for every case and collects exactly one row per
/// case, including cases whose task timed out or panicked.
pub(crate) async fn drive<F, Fut>(
    cases: &[TestCase],
    timeout: Option<Duration>,
    sink: &mut dyn ReportSink,
    status: &dyn StatusSink,
    mut execute: F,
) -> Result<RunSummary, Error>
where
    F: FnMut(&TestCase) -> Fut,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<ReportRow>();
    let mut tasks = JoinSet::new();

    for case in cases {
        status.set_status(&format!("Running '{}'...", case.name));
        let work = execute(case);
        let case = case.clone();
        let tx = tx.clone();
        let span = info_span!("case", name = %case.name);

        tasks.spawn(
            async move {
                let outcome = with_timeout(work, timeout).await;
                match &outcome {
                    Ok(got) => debug!(got, expected = case.expected, "case finished"),
                    Err(e) => warn!(error = %e, "case failed"),
                }
                let _ = tx.send(outcome::row_for(&case, &outcome));
            }
            .instrument(span),
        );
    }
    drop(tx);

    let mut summary = RunSummary::default();
    let mut reported = HashSet::new();

    // Closes once every task has dropped its sender.
    while let Some(row) = rx.recv().await {
        summary.record(&row);
        reported.insert(row.name.clone());
        sink.add_row(&row);
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "case task aborted");
        }
    }

    // A task that panicked never sent its row.
    for case in cases.iter().filter(|c| !reported.contains(&c.name)) {
        let row = outcome::row_for(case, &Err(CaseError::Aborted));
        summary.record(&row);
        sink.add_row(&row);
    }

    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        "run complete"
    );
    status.set_status(&format!("{} tests complete.", cases.len()));
    sink.finalize()?;
    Ok(summary)
}
