use std::sync::Arc;

use mcp_sse_endpoint::{
    build_app,
    config::Config,
    logging,
    session::McpSession,
    tools::{
        builtin::{CurrentTimeTool, EchoTool},
        ToolRepository,
    },
    AppState,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let tools = ToolRepository::builder()
        .register(EchoTool)?
        .register(CurrentTimeTool)?
        .build();

    let bind_socket = config.bind_socket()?;
    let state = AppState::new(
        config.endpoint_path.as_str(),
        config.server_info(),
        tools,
        config.sse_keep_alive,
    )
    .with_max_body_bytes(config.max_body_bytes);
    let session = Arc::clone(&state.session);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        endpoint = %config.endpoint_path,
        "server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(session))
        .await?;
    Ok(())
}

async fn shutdown_signal(session: Arc<McpSession>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    session.shutdown();
}
