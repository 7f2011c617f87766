//! Command line interface for xsea.
//!
//! Parses arguments, configures logging, runs the [`Bundler`] and turns its
//! report into a process exit code.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::{BuildReport, Bundler, Error, Toolchain};
use crate::error::Result;

/// Exit code when interrupted by Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = match Args::try_parse_args() {
        Ok(args) => args,
        Err(e) => {
            e.print()?;
            return Ok(Args::exit_code_for(&e));
        }
    };
    init_logging(&args);
    let runtime_config = RuntimeConfig::from(&args);

    if let Err(e) = args.validate() {
        runtime_config.error(&e.to_string())?;
        return Ok(1);
    }

    let settings = match args.to_settings() {
        Ok(settings) => settings,
        Err(e) => {
            runtime_config.error(&e.to_string())?;
            return Ok(1);
        }
    };
    runtime_config.verbose_println(&format!(
        "Cache: {}",
        settings.cache_dir().display()
    ))?;

    let toolchain = Toolchain::system(&settings)?;
    let bundler = Bundler::new(settings, toolchain);

    let cancel = bundler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let report = match bundler.bundle().await {
        Ok(report) => report,
        Err(Error::Cancelled) => {
            runtime_config.warn("Interrupted, in-flight targets abandoned")?;
            return Ok(EXIT_INTERRUPTED);
        }
        Err(e) => return Err(e.into()),
    };

    print_summary(&runtime_config, &report)?;
    Ok(0)
}

/// Installs env_logger with a level derived from `--quiet`/`--verbose`.
/// `RUST_LOG` takes precedence when set.
fn init_logging(args: &Args) {
    let level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    // A logger may already be installed when run from tests.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn print_summary(runtime_config: &RuntimeConfig, report: &BuildReport) -> std::io::Result<()> {
    if report.cache_cleared() {
        runtime_config.progress("Cache cleared")?;
    }

    if report.outcomes().is_empty() {
        return Ok(());
    }

    runtime_config.output().section("Build summary")?;
    for artifact in report.artifacts() {
        runtime_config.success(&format!(
            "{} -> {}",
            artifact.target,
            artifact.path.display()
        ))?;
        runtime_config.indent(&format!("{} bytes, sha256 {}", artifact.size, artifact.checksum))?;
    }

    // Failure details were already logged as each target gave up.
    if !report.is_complete() {
        let skipped: Vec<String> = report
            .failures()
            .map(|(target, step, _)| format!("{} ({})", target, step))
            .collect();
        runtime_config.warn(&format!(
            "Built {} of {} targets, skipped: {}",
            report.artifacts().count(),
            report.outcomes().len(),
            skipped.join(", ")
        ))?;
    }

    Ok(())
}
