use clap::{Parser, Subcommand};
use habit_gateway::config::{load_dotenv, Config, CorsConfig};
use habit_gateway::cors::{OriginDecision, OriginPolicy};
use habit_gateway::error::AppResult;
use habit_gateway::server;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// habit-gateway - HTTP API gateway for the habit tracker
#[derive(Parser, Debug)]
#[command(name = "habit-gateway")]
#[command(version)]
#[command(about = "HTTP API gateway for the habit tracker", long_about = None)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Serve {
        /// Host to bind to (overrides HOST env var)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Check whether the origin policy allows an origin
    CheckOrigin {
        /// Origin to check, e.g. http://localhost:3000 (omit for no origin)
        origin: Option<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn check_origin(origin: Option<&str>) -> AppResult<bool> {
    load_dotenv();
    let cors = CorsConfig::from_env()?;
    let policy = OriginPolicy::new(&cors.allowed_origins)?;

    let shown = origin.unwrap_or("<none>");
    match policy.evaluate(origin) {
        OriginDecision::Allowed { rule } => {
            println!("allowed: {} (rule: {})", shown, rule);
            Ok(true)
        }
        OriginDecision::Denied => {
            println!("denied: {}", shown);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<ExitCode> {
    let cli = Cli::parse();

    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = Config::from_env()?;

            // Override config with CLI args if provided
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            server::run_server(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::CheckOrigin { origin } => {
            if check_origin(origin.as_deref())? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
