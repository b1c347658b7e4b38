use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use rental_order_service::config::AppConfig;
use rental_order_service::infrastructure::backend_client::HttpBackend;
use rental_order_service::{build_server, AppState};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config =
        AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let backend = HttpBackend::new(&config.backend).map_err(io::Error::other)?;
    let state = AppState::new(Arc::new(backend), config.return_accounting);

    log::info!(
        "Starting server at http://{}:{} against backend {} ({:?} return accounting)",
        config.host,
        config.port,
        config.backend.base_url,
        config.return_accounting
    );

    build_server(state, &config.host, config.port)?.await
}
