use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use inklings::{api, config, Generator};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("inklings=info,tower_http=info")),
        )
        .init();

    // Load configuration once; everything downstream gets it explicitly
    config::Config::dotenv_load();
    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    let generator = match Generator::from_config(&config) {
        Ok(generator) => generator,
        Err(e) => {
            tracing::error!("Failed to build generator: {}", e);
            std::process::exit(1);
        }
    };
    if config.hf_token.is_none() && config.provider == config::ProviderKind::Inference {
        tracing::warn!("HF_TOKEN is not set; generate requests will fail until it is");
    }

    let app = api::router(Arc::new(api::AppState { generator }));

    // Run our application with safe parsing
    let host_str = config.api_host.clone();
    let port_str = config.api_port.clone();
    let ip: std::net::IpAddr = host_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", host_str);
        std::net::IpAddr::from([127, 0, 0, 1])
    });
    let port: u16 = port_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 3000", port_str);
        3000
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    if let Err(e) = axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await
    {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}
