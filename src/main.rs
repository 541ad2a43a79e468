//! dirlog: directory traversal logger.
//!
//! Thin binary entry point. All logic lives in the `dirlog-core`
//! and `dirlog-cli` crates.

use anyhow::Context;
use clap::Parser;
use dirlog_cli::{Args, Outcome, Pipeline, RunOptions};
use dirlog_core::mail::SmtpDispatcher;
use dirlog_core::platform::TrashDisposer;
use dirlog_core::Config;
use std::io;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr so the prompts on stdout stay readable.
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(io::stderr)
        .init();

    tracing::info!("dirlog starting");

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    config.keep_log_on_failure |= args.keep_log_on_failure;
    if config.credentials().is_none() {
        tracing::warn!("SMTP credentials are not configured; the email step will fail");
    }

    let work_dir = std::env::current_dir().context("Cannot determine the working directory")?;
    let dispatcher = SmtpDispatcher::new(&config);
    let disposer = TrashDisposer::new();
    let pipeline = Pipeline::new(&config, &dispatcher, &disposer, work_dir);

    let options = RunOptions {
        path: args.path,
        recipient: args.to,
        show_banner: !args.quiet,
    };
    let stdin = io::stdin();
    let outcome = pipeline.run(options, &mut stdin.lock(), &mut io::stdout().lock())?;

    if let Outcome::Completed(report) = &outcome {
        tracing::info!(
            "Run complete: {} (email {})",
            report.summary,
            if report.dispatch.is_ok() { "sent" } else { "not sent" }
        );
    }
    Ok(())
}
