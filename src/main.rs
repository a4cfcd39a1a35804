use brightstart_api::server;
use brightstart_api::state::AppState;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up provider credentials
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = brightstart_api::config::config();
    tracing::info!("Starting BrightStart portal API in {:?} mode", config.environment);

    let state = AppState::from_config(config)
        .unwrap_or_else(|e| panic!("failed to wire collaborators: {}", e));
    let app = server::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 BrightStart portal API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
