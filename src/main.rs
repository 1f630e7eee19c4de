//! tfau - Terraform module, provider and required_version updater
//!
//! Rewrites version constraints in `.tf` files in place:
//! - `module` blocks (registry `version` or VCS `?ref=`)
//! - `required_providers` entries and `provider` blocks
//! - `terraform { required_version }`

use clap::Parser;
use std::future::Future;
use std::io::{self, Write};
use std::process::ExitCode;
use tfau::cli::CliArgs;
use tfau::config::RunConfig;
use tfau::logging;
use tfau::orchestrator::Orchestrator;
use tfau::output::{create_formatter, OutputConfig};

/// Conventional exit status after SIGINT
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, args.dry_run);
    logging::init(output_config.verbosity);

    match run(args, output_config).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs, output_config: OutputConfig) -> anyhow::Result<ExitCode> {
    let config = RunConfig::from_cli(&args)?;

    if args.verbose {
        eprintln!("tfau v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Target: {}", config.root.display());
        if config.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let orchestrator = Orchestrator::new(config)?;

    // Files already written stay written when interrupted
    let result = tokio::select! {
        result = orchestrator.run_with_progress(output_config.show_progress()) => result,
        () = wait_for_interrupt(tokio::signal::ctrl_c()) => {
            eprintln!("Interrupted; files already written are left as-is");
            return Ok(ExitCode::from(EXIT_INTERRUPTED));
        }
    };

    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    if result.has_fatal_error() {
        Ok(ExitCode::FAILURE)
    } else if result.has_errors() {
        // Partial success - some files or declarations failed
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Resolves once the signal fires; a handler that failed to install never resolves
async fn wait_for_interrupt(signal: impl Future<Output = io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; interrupts are not handled");
        std::future::pending::<()>().await;
    }
}
