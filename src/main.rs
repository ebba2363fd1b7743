//! Command-line entry point: run a single source file, writing everything -
//! ordinary output and any runtime error message alike - to stdout, and
//! always exiting `0`. That last part is surprising but intentional: it is
//! preserved from the program this interpreter's behavior is pinned to,
//! whose entry point ignored the run's success/failure return value.

use std::fs;
use std::process::ExitCode;

use clap::Parser;

/// Runs an itmoscript source file.
#[derive(Parser)]
#[clap(name = "itmoscript")]
#[clap(version)]
struct Args {
    /// Path to the script to execute.
    path: std::path::PathBuf,

    /// Enable verbose (pretty, span-annotated) logging on stderr.
    #[clap(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_stderr_logging(args.verbose);

    let source = match fs::read_to_string(&args.path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(path = %args.path.display(), error = %e, "failed to read script");
            println!("{e}");
            return ExitCode::SUCCESS;
        }
    };

    let output = itmoscript::run_to_string(&source);
    print!("{output}");
    ExitCode::SUCCESS
}

fn setup_stderr_logging(verbose: bool) {
    use tracing_subscriber::{prelude::*, util::SubscriberInitExt, EnvFilter};

    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::default().add_directive(tracing::Level::WARN.into()));

    let registry = tracing_subscriber::registry().with(env_filter);

    if verbose {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(false)
                    .without_time()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}
