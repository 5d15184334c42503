use std::{path::Path, time::Duration};

use anyhow::{bail, Context};
use config::{Config, Environment, File, FileFormat};
use paginator::PaginatorConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "bot.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub log_filter: String,
    pub event_buffer: usize,
    pub paginator: PaginatorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            log_filter: "info".into(),
            event_buffer: 256,
            paginator: PaginatorSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginatorSettings {
    pub reaction_timeout_secs: u64,
    pub button_timeout_secs: u64,
    pub per_page: usize,
    pub mailbox_capacity: usize,
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self {
            reaction_timeout_secs: 30,
            button_timeout_secs: 30,
            per_page: 5,
            mailbox_capacity: 32,
        }
    }
}

impl PaginatorSettings {
    pub fn to_config(&self) -> PaginatorConfig {
        PaginatorConfig {
            reaction_timeout: Duration::from_secs(self.reaction_timeout_secs),
            button_timeout: Duration::from_secs(self.button_timeout_secs),
            mailbox_capacity: self.mailbox_capacity,
        }
    }
}

impl Settings {
    fn validate(&self) -> anyhow::Result<()> {
        if self.paginator.reaction_timeout_secs == 0 || self.paginator.button_timeout_secs == 0 {
            bail!("paginator timeouts must be at least one second");
        }
        if self.paginator.per_page == 0 {
            bail!("paginator.per_page must be greater than zero");
        }
        if self.paginator.mailbox_capacity == 0 {
            bail!("paginator.mailbox_capacity must be greater than zero");
        }
        if self.event_buffer == 0 {
            bail!("event_buffer must be greater than zero");
        }
        Ok(())
    }
}

/// Defaults, then `bot.toml` (or `path`), then `APP__*` environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    build_settings(path, env_source())
}

fn env_source() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn build_settings(path: Option<&Path>, env: Environment) -> anyhow::Result<Settings> {
    let file = match path {
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
    };

    let settings: Settings = Config::builder()
        .add_source(file)
        .add_source(env)
        .build()
        .context("failed to read bot settings")?
        .try_deserialize()
        .context("invalid bot settings")?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
