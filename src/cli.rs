use clap::{Parser, Subcommand};

use crate::commands;

#[derive(Parser)]
#[command(name = "crypto-scanner")]
#[command(about = "Multi-exchange crypto ticker scanner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the scanner server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 8083)]
        port: u16,
    },
    /// Poll one exchange once and print a ticker summary
    Fetch {
        /// Exchange id: coinbase, kraken, mexc, kucoin
        #[arg(short, long)]
        exchange: String,
    },
}

pub async fn run() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => {
            commands::serve::run(port).await;
        }
        Commands::Fetch { exchange } => {
            commands::fetch::run(&exchange).await;
        }
    }
}
