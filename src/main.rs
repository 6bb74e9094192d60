use container_fit::api;
use container_fit::config::AppConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "container_fit=info,tower_http=info";

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = dotenv_result {
        let missing_file = matches!(
            err,
            dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        );
        if !missing_file {
            warn!("Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();

    info!(
        "Container fit service v{} starting...",
        env!("CARGO_PKG_VERSION")
    );
    if let Err(err) =
        api::start_api_server(app_config.api, app_config.catalog, app_config.allocation).await
    {
        error!("Server stopped: {}", err);
        std::process::exit(1);
    }
}
