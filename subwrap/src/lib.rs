use std::time::Duration;

pub use subwrap_types::{Catalog, FailureKind, Report, ReportRow, TestCase};

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod outcome;
pub mod pipeline;
pub mod readback;
pub mod report;
pub mod resources;
pub mod runner;
pub mod session;
pub mod shader;
mod validation;

pub use crate::config::HarnessConfig;
pub use crate::outcome::CaseError;
pub use crate::report::{ReportSink, StatusSink};
pub use crate::resources::SENTINEL;
pub use crate::runner::RunSummary;
pub use crate::session::DeviceSession;
pub use crate::validation::validate;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No adapter, or the adapter refused to hand out a device. Carries the
    /// status line shown to the user.
    #[error("{0}")]
    UnsupportedPlatform(String),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("failed to build async runtime: {0}")]
    RuntimeCreation(#[source] std::io::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Runs every case in `catalog` to completion and reports each row to `sink`
/// as it finishes.
pub fn run(
    config: &HarnessConfig,
    catalog: &Catalog,
    sink: &mut dyn ReportSink,
    status: &dyn StatusSink,
) -> Result<RunSummary, Error> {
    let mut builder = match config.worker_threads {
        Some(_) => tokio::runtime::Builder::new_multi_thread(),
        None => tokio::runtime::Builder::new_current_thread(),
    };

    if let Some(workers) = config.worker_threads {
        builder.worker_threads(workers);
    }

    let runtime = builder
        .enable_all()
        .build()
        .map_err(Error::RuntimeCreation)?;

    let result = runtime.block_on(runner::run_catalog(config, catalog, sink, status));
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}
