use tracing::info;

use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config::KycConfig;
use crate::errors::KycError;

pub async fn handle_serve(args: ServeArgs, config: &KycConfig) -> Result<(), KycError> {
    let host = args.host.unwrap_or_else(|| config.host().to_string());
    let port = args.port.unwrap_or_else(|| config.port());
    info!(host = %host, port, "Starting API server");

    let state = api::create_app_state(config).await?;
    let app = api::build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| KycError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
