use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml},
};
use gly_application::error::{AppError, AppResult};
use gly_application::infrastructure_config::Config;
use std::path::Path;

pub fn load_config() -> AppResult<Config> {
    load_config_from(Path::new("."))
}

/// Defaults, then `gly.toml` and `gly.json` from `dir`, then `GLY_*`
/// environment variables.
pub fn load_config_from(dir: &Path) -> AppResult<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    let toml = dir.join("gly.toml");
    if toml.exists() {
        figment = figment.merge(Toml::file(toml));
    }

    let json = dir.join("gly.json");
    if json.exists() {
        figment = figment.merge(Json::file(json));
    }

    let config: Config = figment
        .merge(Env::prefixed("GLY_").split("__"))
        .extract()
        .map_err(|e| AppError::ConfigError {
            message: format!("Failed to load configuration: {e}"),
        })?;

    config.validate()?;
    Ok(config)
}
