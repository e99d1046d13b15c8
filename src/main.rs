use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devflow::config::AppConfig;
use devflow::dashboard::Dashboard;
use devflow::platform::github::client::GITHUB_API_BASE;
use devflow::platform::github::GitHubPlatform;
use devflow::platform::relay::RelayPlatform;
use devflow::platform::types::{AccessToken, RepoRef};
use devflow::platform::Platform;
use devflow::server::{build_http_client, create_router, AppState};
use devflow::shutdown::wait_for_shutdown;

#[derive(Parser)]
#[command(name = "devflow", about = "GitHub OAuth relay and repository dashboard")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the OAuth relay and API proxy
    Serve,
    /// Load the dashboard for a token and print the snapshot as JSON
    Dashboard {
        /// Access token issued by the relay's /callback redirect
        #[arg(long)]
        token: String,

        /// Repository to select, as owner/name
        #[arg(long)]
        repo: Option<String>,

        /// Read through a running relay instead of calling GitHub directly
        #[arg(long)]
        relay: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            cli.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!cli.log_json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    match cli.command {
        Command::Serve => serve(cli.config.as_deref()).await,
        Command::Dashboard { token, repo, relay } => {
            dashboard(AccessToken::new(token), repo.as_deref(), relay.as_deref()).await
        }
    }
}

async fn serve(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path)?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        frontend = %config.frontend.base_url,
        "Starting DevFlow relay"
    );

    let state = Arc::new(AppState::new(config.clone())?);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        config.server.host, config.server.port
    ))
    .await?;

    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!("Relay stopped");
    Ok(())
}

async fn dashboard(
    token: AccessToken,
    repo: Option<&str>,
    relay: Option<&str>,
) -> anyhow::Result<()> {
    let repo = match repo {
        Some(r) => Some(
            RepoRef::parse(r).ok_or_else(|| anyhow::anyhow!("expected owner/name, got '{r}'"))?,
        ),
        None => None,
    };

    let http = build_http_client()?;
    let platform: Arc<dyn Platform> = match relay {
        Some(url) => Arc::new(RelayPlatform::new(http, url)),
        None => Arc::new(GitHubPlatform::with_base_url(http, GITHUB_API_BASE, 100)),
    };
    let dashboard = Dashboard::new(platform, token);

    let loaded = dashboard.load_repositories().await;
    if loaded.is_ok() {
        if let Some(repo) = &repo {
            dashboard.select(repo).await;
        }
    }

    println!("{}", serde_json::to_string_pretty(&dashboard.snapshot().await)?);

    loaded?;
    Ok(())
}
