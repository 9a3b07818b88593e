use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use carecall::config::AppConfig;
use carecall::handlers;
use carecall::services::backend::portal::PortalBackend;
use carecall::services::backend::HealthBackend;
use carecall::services::call::CallController;
use carecall::services::voice::vapi::VapiProvider;
use carecall::services::voice::VoiceProvider;
use carecall::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    config.validate()?;

    tracing::info!("using voice provider at {}", config.vapi_base_url);
    let voice: Arc<dyn VoiceProvider> = Arc::new(VapiProvider::new(
        config.vapi_api_key.clone(),
        config.vapi_assistant_id.clone(),
        config.vapi_base_url.clone(),
    ));

    tracing::info!("using portal backend at {}", config.backend_url);
    let backend: Arc<dyn HealthBackend> = Arc::new(PortalBackend::new(config.backend_url.clone()));

    let calls = CallController::new(voice, Arc::clone(&backend), config.timing);

    let state = Arc::new(AppState { calls, backend });

    let app = handlers::router(state);

    let addr = format!("127.0.0.1:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
