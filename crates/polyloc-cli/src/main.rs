#[macro_use]
mod ui;

use clap::Parser;
use color_eyre::eyre::Result;
use polyloc_config::Settings;
use polyloc_services::{diagnostics, Error, Generator};
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser)]
#[command(
    name = "polyloc",
    version,
    about = "Split multi-lingual YAML locale sources into one file per language"
)]
struct Cli {
    /// Only process source files whose path matches this regular expression.
    /// Output files are still fully rewritten from the matching files alone.
    filter: Option<String>,
}

const EXIT_FAILED: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "polyloc.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Config(_) | Error::Filter { .. } => EXIT_USAGE,
        _ => EXIT_FAILED,
    }
}

fn run(cli: &Cli, settings: &Settings) -> i32 {
    let generator = match Generator::new(settings) {
        Ok(g) => g,
        Err(e) => {
            diagnostics::report(&e);
            return exit_code(&e);
        }
    };
    tracing::debug!(
        event = "run_args",
        root = %generator.root().display(),
        filter = ?cli.filter,
        languages = generator.languages().len()
    );

    match generator.run(cli.filter.as_deref()) {
        Ok(report) => {
            if let Some(f) = report.filter.as_deref() {
                ui_info!("filter `{}` matched {} source file(s)", f, report.discovered);
            }
            for e in &report.written {
                ui_ok!("{} written", e.path.display());
            }
            ui_ok!(
                "{} document(s) merged, {} skipped",
                report.merged,
                report.skipped.len()
            );
            0
        }
        Err(e) => {
            diagnostics::report(&e);
            exit_code(&e)
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let settings = match polyloc_config::load_config() {
        Ok(cfg) => cfg.resolve(),
        Err(e) => {
            ui_err!("{}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    let guard = init_tracing(settings.log_dir.as_deref());
    let code = run(&cli, &settings);
    // flush the file log before a non-zero exit skips destructors
    drop(guard);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
