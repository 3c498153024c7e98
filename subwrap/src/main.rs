use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use subwrap::catalog;
use subwrap::config::parse_backends;
use subwrap::report::{ConsoleStatus, ConsoleTable, JsonReport, MarkdownTable, SinkSet};
use subwrap::{DeviceSession, Error, HarnessConfig, StatusSink};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Checks that a GPU shader compiler keeps unsigned subtraction identities
/// intact at the wraparound boundary.
#[derive(Parser)]
#[command(name = "subwrap", version)]
struct Cli {
    /// JSON harness configuration; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON catalog to run instead of the built-in identities
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Comma separated backends (vulkan, metal, dx12, gl, primary, all, none)
    #[arg(long, value_name = "LIST")]
    backends: Option<String>,

    /// Prefer a low-power adapter
    #[arg(long)]
    low_power: bool,

    /// Bind the zero uniform only for snippets that reference it
    #[arg(long)]
    only_needed_zero: bool,

    /// Fail a case that has not finished after this many milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Run cases on a multi-threaded runtime with this many workers
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    workers: Option<u64>,

    /// Print the fixed-width Markdown table when the run finishes
    #[arg(long)]
    markdown: bool,

    /// Wrap the Markdown table in a code fence
    #[arg(long, requires = "markdown")]
    fence: bool,

    /// Write a JSON report to this path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Print the catalog and exit
    #[arg(long)]
    list: bool,

    /// Print the selected adapter and exit
    #[arg(long)]
    adapter_info: bool,

    /// Log filter (e.g. `info`, `subwrap=debug`); defaults to RUST_LOG
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}

fn build_config(cli: &Cli) -> Result<HarnessConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };

    if let Some(list) = &cli.backends {
        config.backends_bits = parse_backends(list)?.bits();
    }
    if cli.low_power {
        config.high_performance = false;
    }
    if cli.only_needed_zero {
        config.always_bind_zero = false;
    }
    if cli.timeout_ms.is_some() {
        config.timeout_ms = cli.timeout_ms;
    }
    if let Some(workers) = cli.workers {
        config.worker_threads = Some(workers as usize);
    }
    Ok(config)
}

fn execute(cli: &Cli) -> Result<bool, Error> {
    let config = build_config(cli)?;
    let catalog = match &cli.catalog {
        Some(path) => catalog::load(path)?,
        None => catalog::builtin(),
    };

    if cli.list {
        subwrap::validate(&catalog)?;
        for case in &catalog.cases {
            println!("{:<12} {:>10}  {}", case.name, case.expected, case.snippet);
        }
        return Ok(true);
    }

    if cli.adapter_info {
        let session = match pollster::block_on(DeviceSession::acquire(&config)) {
            Ok(session) => session,
            Err(e) => {
                ConsoleStatus.set_status(&e.to_string());
                return Err(e);
            }
        };
        let info = session.adapter_info();
        println!("{} ({:?}, {:?})", info.name, info.backend, info.device_type);
        if !info.driver.is_empty() {
            println!("driver: {} {}", info.driver, info.driver_info);
        }
        return Ok(true);
    }

    let mut sinks = SinkSet::new();
    sinks.push(ConsoleTable::stdout());
    if cli.markdown {
        let table = MarkdownTable::new().to_writer(std::io::stdout());
        sinks.push(if cli.fence { table.fenced() } else { table });
    }
    if let Some(path) = &cli.json {
        sinks.push(JsonReport::new(path));
    }

    let summary = subwrap::run(&config, &catalog, &mut sinks, &ConsoleStatus)?;
    Ok(summary.all_passed())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            // Platform failures were already shown as the status line.
            if !matches!(e, Error::UnsupportedPlatform(_)) {
                eprintln!("error: {e}");
            }
            ExitCode::from(2)
        }
    }
}
