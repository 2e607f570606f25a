//! `vesta config` — Configuration management commands.

use std::path::Path;
use vesta_config::AppConfig;

pub async fn init(config_path: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let path = super::config_path(config_path);
    if path.exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path.display()).into());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

pub async fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   Config parsed and validated");

            let mut warnings = Vec::new();
            if config.generative.enabled && !config.has_api_key() {
                warnings.push("Generative routing enabled but no API key (set VESTA_API_KEY or GEMINI_API_KEY)");
            }
            if config.gateway.host == "0.0.0.0" {
                warnings.push("Gateway bound to 0.0.0.0");
            }
            if let Some(path) = &config.preferences.path
                && !path.exists()
            {
                warnings.push("Preference profile file does not exist");
            }

            for w in &warnings {
                println!("   warning: {w}");
            }

            println!();
            println!("   Provider:  {}", config.generative.provider);
            println!("   Model:     {}", config.generative.model);
            println!("   Memory:    {}", config.memory.backend);
            println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    if config.generative.api_key.is_some() {
        config.generative.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_writes_a_loadable_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vesta").join("config.toml");

        init(Some(path.as_path()), false).await.unwrap();
        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.cache.capacity, 50);

        assert!(init(Some(path.as_path()), false).await.is_err());
        assert!(init(Some(path.as_path()), true).await.is_ok());
    }
}
