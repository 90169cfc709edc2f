//! CLI binary for cepfast.

use std::path::PathBuf;
use std::process::ExitCode;

use cepfast::{AppConfig, OutputFormat};
use cepfast_race::{RaceResult, SettlePolicy};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

/// cepfast: look up a Brazilian CEP, fastest provider wins.
#[derive(Parser)]
#[command(name = "cepfast", version, about)]
struct Cli {
    /// Postal code to look up, passed to providers as-is.
    #[arg(default_value = cepfast::DEFAULT_QUERY)]
    cep: String,

    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overall deadline in milliseconds.
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Which outcome ends the race.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Wait for a success, all failures, or the deadline.
    FirstSuccess,
    /// Stop at the first outcome, even a failure.
    FirstOutcome,
}

impl From<PolicyArg> for SettlePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::FirstSuccess => SettlePolicy::FirstSuccess,
            PolicyArg::FirstOutcome => SettlePolicy::FirstOutcome,
        }
    }
}

impl Cli {
    /// Apply command-line overrides on top of the file config.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.race.timeout_ms = timeout_ms;
        }
        if let Some(policy) = self.policy {
            config.race.settle_policy = policy.into();
        }
        if self.json {
            config.output = OutputFormat::Json;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr so stdout carries only the lookup result.
    // Override with RUST_LOG=debug to see every provider outcome.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cepfast=info,cepfast_race=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);

    let result = match cepfast::lookup(&cli.cep, &config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "lookup could not start");
            eprintln!("Error: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", cepfast::presenter::render(&result, config.output)?);

    Ok(match result {
        RaceResult::Success(_) => ExitCode::SUCCESS,
        RaceResult::Timeout { .. } | RaceResult::AllFailed { .. } => ExitCode::FAILURE,
    })
}
