use mock_server::{seeded_db, serve_all, MockService};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let mut listeners = Vec::new();
    for service in MockService::ALL {
        let addr = format!("{host}:{}", service.default_port());
        let listener = TcpListener::bind(&addr).await?;
        log::info!("{} listening on {addr}", service.name());
        listeners.push((service, listener));
    }
    log::info!(
        "demo login: {} / {}",
        mock_server::state::DEMO_EMAIL,
        mock_server::state::DEMO_PASSWORD
    );
    serve_all(seeded_db(), listeners).await
}
