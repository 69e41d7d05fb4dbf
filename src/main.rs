use rforge::{logger, server, BridgeController, Config, GeminiClient, SessionStore};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init()?;

    if dotenv_loaded {
        log::info!(".env file loaded successfully");
    } else {
        log::warn!("No .env file found, using system environment variables");
    }

    let config = Config::from_env();
    logger::log_config_info(&config);

    // a missing API key stops startup before anything is served
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return Err(e.into());
    }
    let client = GeminiClient::new(&config.gemini)?;

    let sessions = SessionStore::with_limits(config.max_sessions(), config.session_ttl_minutes());
    let bridge = BridgeController::new(Arc::new(sessions), client.image().clone());

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.host(),
        config.port(),
    );

    server::run(server::AppState::new(bridge, config)).await?;
    Ok(())
}
