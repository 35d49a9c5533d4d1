//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, OpenAiModelAdapter},
    config::Config,
    error::ApiError,
    web::{router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use fridge_core::{InMemoryStore, LanguageModel};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize the Model Adapters ---
    let api_key = config
        .recipe_api_key
        .as_ref()
        .ok_or_else(|| ApiError::Internal("RECIPE_API_KEY or OPENAI_API_KEY is required".to_string()))?;
    let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &config.recipe_api_base {
        info!(%base, "Using a custom model endpoint");
        openai_config = openai_config.with_api_base(base);
    }
    let openai_client = Client::with_config(openai_config);

    let recipe_model: Arc<dyn LanguageModel> = Arc::new(OpenAiModelAdapter::new(
        openai_client.clone(),
        config.recipe_model.clone(),
        config.model_timeout,
    ));
    let vision_model: Arc<dyn LanguageModel> = Arc::new(OpenAiModelAdapter::new(
        openai_client,
        config.vision_model.clone(),
        config.model_timeout,
    ));

    // --- 3. Connect to the Store & Build the Shared AppState ---
    let (app_state, db_pool) = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(pool.clone()));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            (
                AppState::new(config.clone(), db_adapter, recipe_model, vision_model),
                Some(pool),
            )
        }
        None => {
            warn!("DATABASE_URL is not set; fridge contents will not survive a restart");
            (
                AppState::new(
                    config.clone(),
                    Arc::new(InMemoryStore::new()),
                    recipe_model,
                    vision_model,
                ),
                None,
            )
        }
    };

    // --- 4. Create the Web Router ---
    let app = router(Arc::new(app_state));

    // --- 5. Start the Server ---
    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {}", e);
            }
            info!("Shutdown signal received.");
            shutdown.cancel();
        }
    });

    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    // --- 6. Release the Store ---
    if let Some(pool) = db_pool {
        pool.close().await;
        info!("Database pool closed.");
    }
    info!("Server stopped.");

    Ok(())
}
