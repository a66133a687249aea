pub mod ask;
pub mod chat;
pub mod config_cmd;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use gena_agent::{Agent, RetryPolicy};
use gena_config::{GenaConfig, RetryConfig};
use gena_core::ThreadStore;
use gena_threads::{FileThreadStore, InMemoryThreadStore};

/// Load the config and build an agent with the built-in tools.
///
/// `thread` overrides the configured thread file.
pub async fn agent_from_config(thread: Option<PathBuf>) -> anyhow::Result<Agent> {
    let config = GenaConfig::load().context("Failed to load config")?;
    tracing::debug!(?config, "Loaded configuration");

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    GENA_API_KEY=sk-...");
        eprintln!("    OPENAI_API_KEY=sk-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", GenaConfig::config_dir().join("config.toml").display());
        eprintln!();
        bail!("No API key found. See above for setup instructions.");
    }

    let store = open_store(thread.or_else(|| config.thread_file.clone())).await?;
    build_agent(&config, store)
}

pub async fn open_store(path: Option<PathBuf>) -> anyhow::Result<Arc<dyn ThreadStore>> {
    Ok(match path {
        Some(path) => Arc::new(
            FileThreadStore::open(&path)
                .await
                .with_context(|| format!("Failed to open thread {}", path.display()))?,
        ),
        None => Arc::new(InMemoryThreadStore::new()),
    })
}

pub fn build_agent(config: &GenaConfig, store: Arc<dyn ThreadStore>) -> anyhow::Result<Agent> {
    let mut builder = Agent::builder()
        .model(&config.model)
        .system_prompt(&config.system_prompt)
        .temperature(config.temperature)
        .max_iterations(config.max_iterations)
        .retry_policy(retry_policy(&config.retry))
        .thread_store(store);

    if let Some(key) = &config.api_key {
        builder = builder.api_key(key);
    }
    if let Some(url) = &config.api_url {
        builder = builder.api_url(url);
    }
    if let Some(max_tokens) = config.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    for tool in gena_tools::default_tools() {
        builder = builder.tool(tool);
    }

    Ok(builder.build()?)
}

fn retry_policy(retry: &RetryConfig) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_attempts(retry.max_attempts)
        .with_initial_delay(Duration::from_millis(retry.initial_delay_ms))
        .with_multiplier(retry.multiplier)
        .with_max_delay(Duration::from_millis(retry.max_delay_ms))
}
