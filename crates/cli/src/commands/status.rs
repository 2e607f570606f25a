//! `vesta status` — Show the effective configuration.

use std::path::Path;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let path = super::config_path(config_path);

    println!("Vesta Status");
    println!("============");
    println!("  Config file:  {}", path.display());
    println!("  Assistant:    {} (max {} words)", config.assistant.name, config.assistant.max_words);
    println!(
        "  Generative:   {} ({} / {}, {} ms timeout)",
        if config.generative.enabled { "enabled" } else { "disabled" },
        config.generative.provider,
        config.generative.model,
        config.generative.timeout_ms
    );
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Threshold:    {}", config.routing.confidence_threshold);
    println!("  Classic:      {}", config.routing.always_classic.join(", "));
    println!("  Never gen.:   {}", config.routing.never_generative.join(", "));
    println!("  Cache:        {} entries, {} s TTL", config.cache.capacity, config.cache.ttl_secs);
    println!(
        "  Memory:       {} ({} min window, {} days retention)",
        config.memory.backend, config.memory.window_minutes, config.memory.retention_days
    );
    println!(
        "  Profiles:     {}",
        config
            .preferences
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in default".into())
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);

    if path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — run `vesta config init` to create one");
    }

    Ok(())
}
