use globalscore::{
    build_router, championships::start_rollover_task, AppConfig, AppState, ChampionshipService,
    InMemoryStore, PostgresStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "globalscore=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GlobalScore scoring service");

    if let Err(e) = run(AppConfig::from_env()).await {
        error!(error = %e, "Server stopped");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = match &config.database_url {
        Some(database_url) => {
            let store = PostgresStore::connect(database_url, config.database_max_connections).await?;
            store.migrate().await?;
            AppState::from_store(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store");
            AppState::from_store(Arc::new(InMemoryStore::new()))
        }
    };

    if config.rollover_enabled {
        let championship_service = Arc::new(ChampionshipService::new(
            Arc::clone(&app_state.user_repository),
            Arc::clone(&app_state.championship_repository),
        ));
        tokio::spawn(start_rollover_task(
            championship_service,
            config.rollover.clone(),
        ));
    }

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(bind_address = %config.bind_address, "Server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
