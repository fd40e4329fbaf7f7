mod analyze;
mod client;
mod progress;
mod report;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sentiscope")]
#[command(about = "Keyword sentiment analysis over Reddit discussions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Analyze sentiment for one keyword
    Analyze {
        /// Keyword or phrase to search for
        keyword: String,

        /// Base URL of a running sentiscope server; runs the analyzer locally when omitted
        #[arg(long, env = "SENTISCOPE_SERVER_URL")]
        server: Option<String>,

        /// Print the raw result as JSON instead of a text report
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    // Progress owns stderr; keep logs quiet unless asked for.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Analyze {
            keyword,
            server,
            json,
        }) => analyze::run_analyze(&keyword, server.as_deref(), json).await?,
        None => println!("no command given; try `sentiscope analyze <keyword>`"),
    }

    Ok(())
}
