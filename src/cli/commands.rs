use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kyc-checklist", version, about = "KYC issue checklist: review issues, statistics and checks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP REST API server
    Serve(ServeArgs),
    /// List issues
    Issues(IssuesArgs),
    /// Show review statistics and category counts
    Stats(OutputArgs),
    /// List stories
    Stories(StoriesArgs),
    /// Run the compliance check with live progress
    Check(CheckArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Listen port (overrides server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Listen address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,
}

#[derive(Args, Clone, Default)]
pub struct OutputArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone, Default)]
pub struct IssuesArgs {
    /// Only issues in this category (SOW, UBO, RISK, CORR)
    #[arg(long)]
    pub category: Option<String>,

    /// Only issues of this company id
    #[arg(long)]
    pub company: Option<u32>,

    /// Only issues in this state (open, solved, dismissed)
    #[arg(long)]
    pub state: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Default)]
pub struct StoriesArgs {
    /// Only stories in this category
    #[arg(long)]
    pub category: Option<String>,

    /// Show the issues of one story
    #[arg(long)]
    pub story: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone, Default)]
pub struct CheckArgs {
    /// Milliseconds per timeline step (overrides check.step_delay_ms)
    #[arg(long)]
    pub step_delay_ms: Option<u64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Config file to validate
    pub config: String,
}
