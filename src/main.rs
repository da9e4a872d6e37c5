use clap::{Parser, Subcommand};
use punt::adapters::PostgresStore;
use punt::api::{create_router, AppState};
use punt::auth;
use punt::config::AppConfig;
use punt::engine::{Engine, Rules};
use punt::error::{PuntError, Result};
use punt::services::{QuoteService, SimulatedFeed};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "punt", version, about = "Play-money wagering service")]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Create an admin account and exit
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(&cli.config)?;
    init_logging(&config);

    if let Err(problems) = config.validate() {
        for problem in &problems {
            error!("Config: {}", problem);
        }
        return Err(PuntError::Validation(format!(
            "{} configuration problem(s)",
            problems.len()
        )));
    }

    match cli.command {
        Some(Commands::Migrate) => run_migrate(&config).await,
        Some(Commands::CreateAdmin { username, password }) => {
            run_create_admin(&config, &username, &password).await
        }
        Some(Commands::Serve) | None => run_serve(config).await,
    }
}

async fn connect_store(config: &AppConfig) -> Result<PostgresStore> {
    PostgresStore::new(
        &config.database.url,
        config.database.max_connections,
        Duration::from_secs(config.database.connect_timeout_secs),
    )
    .await
}

async fn run_migrate(config: &AppConfig) -> Result<()> {
    let store = connect_store(config).await?;
    store.migrate().await?;
    Ok(())
}

async fn run_create_admin(config: &AppConfig, username: &str, password: &str) -> Result<()> {
    let store = connect_store(config).await?;
    store.migrate().await?;

    let user = auth::register_user(
        store.pool(),
        username,
        password,
        config.wagering.starting_balance,
        true,
    )
    .await?;
    info!(user_id = user.id, username = %user.username, "admin account ready");
    Ok(())
}

async fn run_serve(config: AppConfig) -> Result<()> {
    info!("Starting punt wagering service");

    let store = connect_store(&config).await?;
    store.migrate().await?;

    let engine = Engine::new(store.pool().clone(), Rules::from(&config.wagering));

    // Idle default board when the feed is disabled
    let quote_service = if config.quotes.enabled {
        Some(QuoteService::spawn(
            SimulatedFeed::new(&config.quotes.symbols),
            Duration::from_millis(config.quotes.refresh_ms),
        ))
    } else {
        None
    };
    let quotes = quote_service
        .as_ref()
        .map(|service| service.board())
        .unwrap_or_default();

    let state = AppState::new(Arc::new(store), Arc::new(engine), quotes);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    if let Some(service) = quote_service {
        service.shutdown().await;
    }
    info!("Shutdown complete");
    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},punt=debug,sqlx=warn", config.logging.level))
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
