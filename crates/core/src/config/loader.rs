use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "TRACEMOE_";

/// `TRACEMOE_` variables read by the binary itself rather than config keys.
const RESERVED_ENV_KEYS: &[&str] = &["config", "log_format"];

/// Environment overrides layered over the file.
///
/// Nested keys are addressed with a double underscore, e.g.
/// `TRACEMOE_TRACE_MOE__BASE_URL` overrides `trace_moe.base_url`.
fn env_overrides() -> Env {
    Env::prefixed(ENV_PREFIX)
        .split("__")
        .ignore(RESERVED_ENV_KEYS)
}

/// Load the config file at `path`, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    Figment::new()
        .merge(Toml::file(path))
        .merge(env_overrides())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse config from TOML text alone; the environment is not consulted.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
