use mock_server::{AppState, MockConfig};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let defaults = MockConfig::default();
    let config = MockConfig {
        api_key: std::env::var("CBW_API_KEY").unwrap_or(defaults.api_key),
        secret_key: std::env::var("CBW_SECRET_KEY").unwrap_or(defaults.secret_key),
        servers: defaults.servers,
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("listening on {addr}");
    mock_server::run_with(listener, AppState::new(config)).await
}
