//! `vesta ask` and `vesta chat` — route utterances from the terminal.

use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use vesta_core::route::RouteResponse;
use vesta_core::utterance::SessionId;

/// Memory cleanup cadence for interactive sessions.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

pub async fn run(
    config_path: Option<&Path>,
    text: &str,
    session: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let router = vesta_engine::build_router(&config).await;

    let response = router.route(text, &SessionId::from(session)).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", response.response_text);
        eprintln!("  [{}]", describe(&response));
    }

    if response.success {
        Ok(())
    } else {
        Err("The utterance could not be routed".into())
    }
}

pub async fn chat(
    config_path: Option<&Path>,
    session: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let router = vesta_engine::build_router(&config).await;
    let session = SessionId::from(session);
    let cleanup = router
        .memory()
        .clone()
        .spawn_cleanup(CLEANUP_INTERVAL, config.memory.retention_days);

    println!();
    println!("  {} — sesión interactiva", config.assistant.name);
    println!("  Session:     {session}");
    println!("  Generative:  {}", if router.generative_enabled() { config.generative.model.as_str() } else { "disabled" });
    println!("  Memory:      {}", router.memory().backend());
    println!();
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        print!("  Tú > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "salir" | ":q") {
            break;
        }

        let response = router.route(line, &session).await;
        for text_line in response.response_text.lines() {
            println!("  {} > {text_line}", config.assistant.name);
        }
        eprintln!("  [{}]", describe(&response));
        println!();
    }

    cleanup.abort();
    println!();
    println!("  ¡Hasta pronto!");
    Ok(())
}

/// One-line summary of how a response was produced.
fn describe(response: &RouteResponse) -> String {
    let mut parts = vec![response.route.as_str().to_string()];
    for key in ["reason", "intent", "domain", "fallback_reason"] {
        if let Some(value) = response.meta_str(key) {
            parts.push(format!("{key}={value}"));
        }
    }
    if let Some(ms) = response.metadata.get("latency_ms").and_then(|v| v.as_u64()) {
        parts.push(format!("{ms} ms"));
    }
    parts.join(" · ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesta_core::route::Route;

    #[test]
    fn describe_lists_route_and_reason() {
        let resp = RouteResponse::new(Route::ClassicRule, "Son las 10:00")
            .with_meta("reason", "always_classic")
            .with_meta("intent", "GET_TIME")
            .with_meta("latency_ms", 3u64);
        assert_eq!(
            describe(&resp),
            "classic_rule · reason=always_classic · intent=GET_TIME · 3 ms"
        );
    }
}
