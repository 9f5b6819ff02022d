mod config;
mod logging;
mod prompt;

use clap::{Parser, Subcommand};
use config::WardenConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use warden_auth::{AuthFacade, Credentials};
use warden_core::{Clock, SystemClock};
use warden_gateway::GatewayServer;
use warden_session::build_policy;
use warden_users::build_user_store;

#[derive(Parser)]
#[command(name = "warden", about = "Warden session authentication service")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "warden.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new account
    Add {
        /// Login email
        email: String,
    },
    /// List registered accounts
    List,
}

async fn build_facade(config: &WardenConfig) -> anyhow::Result<AuthFacade> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sessions = build_policy(&config.session_config(), clock.clone()).await?;
    let users = build_user_store(&config.users, &config.data_dir, clock).await?;
    Ok(AuthFacade::new(users, sessions))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = WardenConfig::load(&cli.config).await?;
    config.apply_env(|key| std::env::var(key).ok())?;
    logging::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let facade = build_facade(&config).await?;
            let app = GatewayServer::build(facade, config.gateway_config());

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            info!(
                addr = %addr,
                backend = ?config.session.backend,
                ttl_secs = config.session.duration_secs,
                "Warden listening"
            );
            axum::serve(listener, app).await?;
        }
        Commands::User { action } => {
            let facade = build_facade(&config).await?;
            match action {
                UserAction::Add { email } => {
                    let password = prompt::read_password("Password: ").await?;
                    let user = facade
                        .register_user(&Credentials::new(email, password)?)
                        .await?;
                    println!("Created user {} ({})", user.email, user.id);
                }
                UserAction::List => {
                    let users = facade.users().all().await?;
                    if users.is_empty() {
                        println!("No users registered.");
                    } else {
                        for user in &users {
                            println!("  {}  {}  {}", user.id, user.email, user.display_name());
                        }
                        println!("\nTotal: {} user(s)", users.len());
                    }
                }
            }
        }
    }

    Ok(())
}
