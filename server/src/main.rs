use std::error::Error;
use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use credprint_server::config::{Config, Environment, StorageBackend};
use credprint_server::registry::{AppRegistry, Repositories};
use credprint_server::render::photo::HttpPhotoLoader;
use credprint_server::repository::postgres;
use credprint_server::routes::create_routes;
use credprint_server::services::SettingsStore;

fn init_tracing(environment: Environment) {
    let default_level = match environment {
        Environment::Production => "info",
        Environment::Development => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let repositories = match config.storage {
        StorageBackend::Memory => {
            tracing::info!(admin = %config.seed_admin_email, "Using in-memory storage");
            Repositories::in_memory(config.mock_latency, &config.seed_admin_email)
        }
        StorageBackend::Postgres => {
            let pool = postgres::connect(&config.database_url, config.database_max_connections).await?;
            Repositories::postgres(pool)
        }
    };

    let settings = match &config.settings_dir {
        Some(dir) => SettingsStore::load(dir).await?,
        None => SettingsStore::in_memory(),
    };
    let photos = HttpPhotoLoader::new(config.photo_fetch_timeout)?
        .allow_private_hosts(config.photo_allow_private_hosts);

    let registry = AppRegistry::new(repositories, settings, Arc::new(photos));
    let app: Router = create_routes(registry, &config);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(config.environment);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}
