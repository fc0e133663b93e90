use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use urbansim::{AppState, UrbanSimConfig, VERSION, logging, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = UrbanSimConfig::load()?;
    logging::init(&config.logging)?;

    info!("Starting urbansim {}", VERSION);
    let state = Arc::new(AppState::from_config(&config)?);
    info!(
        "Serving cities: {}",
        state.indicators.resolver().supported_names().join(", ")
    );

    web::run(&config.server, state).await
}
