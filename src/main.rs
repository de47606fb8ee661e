use std::path::PathBuf;

use clap::Parser;
use kyc_checklist::cli::{self, Cli, Commands};
use kyc_checklist::config::{self, KycConfig};
use kyc_checklist::errors::KycError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(!cli.no_color)
            .with_writer(std::io::stderr)
            .init();
    }

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            KycError::Config(_) => 2,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> Result<(), KycError> {
    let config = match &cli.config {
        Some(path) => config::load_config(&PathBuf::from(path)).await?,
        None => KycConfig::default(),
    };
    let quiet = cli.quiet;

    match cli.command {
        Commands::Serve(args) => cli::serve::handle_serve(args, &config).await,
        Commands::Issues(args) => cli::listing::handle_issues(args, &config, quiet).await,
        Commands::Stats(args) => cli::listing::handle_stats(args, &config, quiet).await,
        Commands::Stories(args) => cli::listing::handle_stories(args, &config, quiet).await,
        Commands::Check(args) => cli::check::handle_check(args, &config, quiet).await,
        Commands::Validate(args) => cli::validate::handle_validate(args).await,
    }
}
