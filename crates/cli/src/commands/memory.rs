//! `vesta memory` — Conversation memory commands.

use std::path::Path;
use std::sync::Arc;
use vesta_config::AppConfig;
use vesta_core::utterance::SessionId;
use vesta_engine::{ConversationMemory, DomainClassifier, MemorySettings};

async fn open(config: &AppConfig) -> Result<ConversationMemory, Box<dyn std::error::Error>> {
    let store = vesta_memory::open_store(&config.memory.backend, &config.memory.path).await?;
    Ok(ConversationMemory::new(
        store,
        Arc::new(DomainClassifier::new()),
        MemorySettings::from(&config.memory),
    ))
}

pub async fn stats(config_path: Option<&Path>, session: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let memory = open(&config).await?;
    let stats = memory.stats(&SessionId::from(session)).await?;

    println!("Memory Statistics");
    println!("=================");
    println!("  Backend:          {}", stats.backend);
    if config.memory.backend == "sqlite" {
        println!("  Database:         {}", config.memory.path.display());
    }
    println!("  Total records:    {}", stats.total_records);
    println!("  Session '{session}': {} records", stats.session_records);
    println!("  Window:           {} min", stats.window_minutes);
    match stats.last_interaction_minutes_ago {
        Some(minutes) => println!("  Last exchange:    {minutes} min ago (within window)"),
        None => println!("  Last exchange:    none within window"),
    }
    println!("  Retention:        {} days", config.memory.retention_days);

    Ok(())
}

pub async fn cleanup(config_path: Option<&Path>, days: Option<i64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let retention_days = days.unwrap_or(config.memory.retention_days);
    if retention_days < 0 {
        return Err("--days must not be negative".into());
    }

    let memory = open(&config).await?;
    let removed = memory.cleanup(retention_days).await?;
    println!("Removed {removed} records older than {retention_days} days");

    Ok(())
}
