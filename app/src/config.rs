use std::{env, path::Path};

use anyhow::{Context, Result};
use engine::config::MarketConfig;
use tokio::fs;
use tracing::info;

pub const ENV_RPC_URL: &str = "MARKET_RPC_URL";
pub const ENV_API_URL: &str = "MARKET_API_URL";
pub const ENV_JWT_SECRET: &str = "MARKET_JWT_SECRET";
pub const ENV_CREDENTIAL: &str = "MARKET_CREDENTIAL";

pub async fn load_config(config_path: &Path) -> Result<MarketConfig> {
    let raw = fs::read(config_path)
        .await
        .with_context(|| format!("read config file: {}", config_path.display()))?;
    let mut cfg: MarketConfig = serde_json::from_slice(&raw).context("parse config json")?;
    apply_overrides(&mut cfg, |key| env::var(key).ok());
    Ok(cfg)
}

pub fn apply_overrides<F>(cfg: &mut MarketConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.is_empty()) {
        info!("rpc url overridden from {}", ENV_RPC_URL);
        cfg.rpc.url = url;
    }
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
        info!("api url overridden from {}", ENV_API_URL);
        cfg.api.base_url = url;
    }
    if let Some(secret) = lookup(ENV_JWT_SECRET) {
        cfg.jwt_secret = Some(secret).filter(|s| !s.is_empty());
    }
}

pub fn credential_from_env() -> Option<String> {
    env::var(ENV_CREDENTIAL)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
