//! `vesta gateway` — Start the HTTP API server.

use std::path::Path;

pub async fn run(
    config_path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Vesta Gateway");
    println!("   Listening:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Generative:  {}", if config.generative.enabled { "enabled" } else { "disabled" });

    vesta_gateway::start(config).await?;

    Ok(())
}
