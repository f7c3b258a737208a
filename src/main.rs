use anyhow::Result;
use pluginlens::cli::{self, CliVerbosity};
use std::str::FromStr;

fn init_tracing(verbosity: CliVerbosity) {
    let directive = match verbosity.filter_directive() {
        Some(directive) => directive.to_string(),
        None => std::env::var("PLUGINLENS_LOG").unwrap_or_else(|_| "info".to_string()),
    };
    let filter = tracing_subscriber::EnvFilter::from_str(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let action = cli::parse_args(&args)?;
    init_tracing(action.verbosity());
    cli::run(action)
}
