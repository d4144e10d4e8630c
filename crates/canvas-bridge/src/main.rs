use std::sync::Arc;

use anyhow::{Context, Result};
use canvas_bridge::config::SERVICE_NAME;
use canvas_bridge::{BridgeConfig, WebSocketTransport};
use canvas_monitoring::{LogExt, MonitoringConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logging first, so configuration warnings are not lost.
    let monitoring_config = MonitoringConfig::from_env(SERVICE_NAME);
    canvas_monitoring::init_logging(&monitoring_config).context("Failed to initialize logging")?;

    let config = BridgeConfig::load().context("Failed to load configuration")?;

    canvas_bridge::run(config, Arc::new(WebSocketTransport))
        .await
        .log_err("Bridge stopped")
        .context("Bridge error")?;

    Ok(())
}
