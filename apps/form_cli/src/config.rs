use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use form_core::ControllerOptions;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "form.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub submit_url: Option<String>,
    pub confirm_close_if_not_saved: bool,
    pub request_timeout_secs: u64,
    pub required_fields: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            submit_url: None,
            confirm_close_if_not_saved: true,
            request_timeout_secs: 30,
            required_fields: Vec::new(),
        }
    }
}

impl Settings {
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions::confirm_close_if_not_saved(self.confirm_close_if_not_saved)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    submit_url: Option<String>,
    confirm_close_if_not_saved: Option<bool>,
    request_timeout_secs: Option<u64>,
    required_fields: Option<Vec<String>>,
}

/// Defaults, then the TOML file at `path` if it exists, then environment.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if path.exists() {
        match read_file_settings(path) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(error) => warn!(
                path = %path.display(),
                error = %format!("{error:#}"),
                "ignoring unreadable settings file"
            ),
        }
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn read_file_settings(path: &Path) -> anyhow::Result<FileSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.submit_url {
        settings.submit_url = Some(v);
    }
    if let Some(v) = file_cfg.confirm_close_if_not_saved {
        settings.confirm_close_if_not_saved = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.required_fields {
        settings.required_fields = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("FORM_SUBMIT_URL") {
        settings.submit_url = Some(v);
    }
    if let Some(v) = var("APP__SUBMIT_URL") {
        settings.submit_url = Some(v);
    }

    if let Some(v) = var("APP__CONFIRM_CLOSE_IF_NOT_SAVED") {
        match parse_bool(&v) {
            Some(parsed) => settings.confirm_close_if_not_saved = parsed,
            None => warn!(value = %v, "APP__CONFIRM_CLOSE_IF_NOT_SAVED is not a boolean"),
        }
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = var("APP__REQUIRED_FIELDS") {
        settings.required_fields = v
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
