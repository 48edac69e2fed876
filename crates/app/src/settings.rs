//! Handles settings for the application. Configuration is written in
//! `settings.toml` and can be overridden with `DIVVY__*` environment
//! variables (e.g. `DIVVY__APP__LEVEL=debug`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("database", "memory")?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("DIVVY").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
