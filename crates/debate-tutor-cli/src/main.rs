use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "debate-tutor", version, about = "Debate lesson planner and facilitator")]
struct Cli {
    /// Act as this user; scenarios you create are owned by it
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, inspect and edit lesson scenarios
    Scenario {
        #[command(subcommand)]
        action: commands::scenario::ScenarioAction,
    },
    /// Run a saved scenario interactively with a countdown per activity
    Facilitate {
        /// Scenario ID
        id: String,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DEBATE_TUTOR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let user = cli.user.as_deref();

    let result = match cli.command {
        Commands::Scenario { action } => commands::scenario::run(action, user).await,
        Commands::Facilitate { id } => commands::facilitate::run(&id, user).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}
