use crate::config::Config;
use crate::providers::{OllamaOracle, OpenAIOracle};
use crate::traits::Oracle;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub fn create_oracle(config: &Config) -> Result<Arc<dyn Oracle>> {
    let provider_name = config.provider.as_deref().unwrap_or("openai");

    match provider_name.to_lowercase().as_str() {
        "ollama" => {
            let mut oracle = OllamaOracle::new()
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                oracle = oracle.with_base_url(base_url.clone());
            }
            Ok(Arc::new(oracle))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "REAGENT_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut oracle = OpenAIOracle::new(api_key)
                .with_model(config.model.clone())
                .with_temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                oracle = oracle.with_base_url(base_url.clone());
            }
            Ok(Arc::new(oracle))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: openai, ollama",
            provider_name
        )),
    }
}

fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name) {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(anyhow!("No API key found"))
    }
}
