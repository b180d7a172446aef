use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "agentflow",
    version,
    about = "AgentFlow CLI: ask the agent, classify files, or run the decision router locally"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "AGENTFLOW_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Log requests and router steps to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Send a message to the agent (POST /v1/agent)
    Ask(commands::agent::AskArgs),
    /// Run the decision router in-process against fixture tools
    Local(commands::local::LocalArgs),
    /// Upload a file for classification (POST /v1/agent/analyze)
    Analyze(commands::analyze::AnalyzeArgs),
    /// Send a templated prompt to the inference service (POST /v1/agent/prompt)
    Prompt(commands::prompt::PromptArgs),
    /// Direct API access
    Api(commands::api::ApiArgs),
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "agentflow_cli=debug,agentflow_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Ask(args) => commands::agent::ask(&cli.api_url, args).await,
        Commands::Local(args) => commands::local::run(args),
        Commands::Analyze(args) => commands::analyze::run(&cli.api_url, args).await,
        Commands::Prompt(args) => commands::prompt::run(&cli.api_url, args).await,
        Commands::Api(args) => commands::api::run(&cli.api_url, args).await,
    };

    std::process::exit(code);
}
