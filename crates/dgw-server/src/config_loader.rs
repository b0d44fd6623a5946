// SPDX-License-Identifier: MIT OR Apache-2.0
//! Loads [`GatewayConfig`] from a TOML file, then layers a handful of
//! environment-variable overrides on top (§6) — secrets in particular
//! should come from the process environment in production, not a file
//! checked into a config repo.

use dgw_core::config::GatewayConfig;
use std::path::Path;

const ENV_JWT_SECRET: &str = "DGW_JWT_SECRET";
const ENV_BACKEND_API_KEY: &str = "DGW_BACKEND_API_KEY";
const ENV_BACKEND_BASE_URL: &str = "DGW_BACKEND_BASE_URL";

/// Read and parse `path`, applying any `DGW_*` environment overrides.
pub fn load(path: &Path) -> anyhow::Result<GatewayConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
    let mut config: GatewayConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {}: {e}", path.display()))?;
    apply_env_overrides(&mut config);
    Ok(config)
}

fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(secret) = std::env::var(ENV_JWT_SECRET) {
        config.security.jwt_secret = secret;
    }
    if let Ok(api_key) = std::env::var(ENV_BACKEND_API_KEY) {
        config.backend.api_key = api_key;
    }
    if let Ok(base_url) = std::env::var(ENV_BACKEND_BASE_URL) {
        config.backend.base_url = base_url;
    }
}
