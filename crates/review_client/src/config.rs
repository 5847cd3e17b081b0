use std::{fs, path::Path};

use serde::Deserialize;
use shared::domain::DEFAULT_AUDIO_PREFIX_LEN;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_SETTINGS_FILE: &str = "review.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSettings {
    /// Base URL every API path is appended to.
    pub backend_url: String,
    pub page_size: u32,
    /// Output gain applied to every clip, 0.0..=1.0.
    pub volume: f32,
    pub audio_prefix_len: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".into(),
            page_size: 10,
            volume: 0.8,
            audio_prefix_len: DEFAULT_AUDIO_PREFIX_LEN,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    page_size: Option<u32>,
    volume: Option<f32>,
    audio_prefix_len: Option<usize>,
}

/// Defaults, then `review.toml` from the working directory, then the
/// process environment.
pub fn load_settings() -> ConsoleSettings {
    let mut settings = ConsoleSettings::default();
    if let Err(err) = apply_file(&mut settings, Path::new(DEFAULT_SETTINGS_FILE)) {
        tracing::warn!("ignoring {DEFAULT_SETTINGS_FILE}: {err}");
    }
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

/// Like [`load_settings`] but reads an explicit settings file, which must
/// exist and parse.
pub fn load_settings_from(path: &Path) -> Result<ConsoleSettings, ClientError> {
    let mut settings = ConsoleSettings::default();
    if !path.exists() {
        return Err(ClientError::InvalidConfig(format!(
            "settings file '{}' does not exist",
            path.display()
        )));
    }
    apply_file(&mut settings, path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

fn apply_file(settings: &mut ConsoleSettings, path: &Path) -> Result<(), ClientError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(ClientError::io(path, err)),
    };
    let file_cfg: FileSettings = toml::from_str(&raw)
        .map_err(|err| ClientError::InvalidConfig(format!("{}: {err}", path.display())))?;

    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v;
    }
    if let Some(v) = file_cfg.volume {
        settings.volume = v;
    }
    if let Some(v) = file_cfg.audio_prefix_len {
        settings.audio_prefix_len = v;
    }
    Ok(())
}

pub fn apply_env_overrides(
    settings: &mut ConsoleSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("BACKEND_HOST") {
        settings.backend_url = v;
    }
    if let Some(v) = non_empty("APP__BACKEND_URL") {
        settings.backend_url = v;
    }

    if let Some(v) = non_empty("APP__PAGE_SIZE") {
        match v.trim().parse::<u32>() {
            Ok(parsed) => settings.page_size = parsed,
            Err(err) => tracing::warn!("ignoring APP__PAGE_SIZE={v:?}: {err}"),
        }
    }

    if let Some(v) = non_empty("APP__VOLUME") {
        match v.trim().parse::<f32>() {
            Ok(parsed) => settings.volume = parsed,
            Err(err) => tracing::warn!("ignoring APP__VOLUME={v:?}: {err}"),
        }
    }

    if let Some(v) = non_empty("APP__AUDIO_PREFIX_LEN") {
        match v.trim().parse::<usize>() {
            Ok(parsed) => settings.audio_prefix_len = parsed,
            Err(err) => tracing::warn!("ignoring APP__AUDIO_PREFIX_LEN={v:?}: {err}"),
        }
    }
}

impl ConsoleSettings {
    /// Normalizes the backend URL and rejects settings the client cannot
    /// operate with.
    pub fn validated(mut self) -> Result<Self, ClientError> {
        self.backend_url = normalize_backend_url(&self.backend_url)?;
        if self.page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "page size must be greater than zero".into(),
            ));
        }
        if !self.volume.is_finite() {
            return Err(ClientError::InvalidConfig("volume must be a number".into()));
        }
        self.volume = self.volume.clamp(0.0, 1.0);
        Ok(self)
    }
}

pub fn normalize_backend_url(raw: &str) -> Result<String, ClientError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidConfig("backend url is empty".into()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|err| ClientError::InvalidConfig(format!("backend url '{trimmed}': {err}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ClientError::InvalidConfig(format!(
                "backend url '{trimmed}' has unsupported scheme '{other}'"
            )))
        }
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(ClientError::InvalidConfig(format!(
            "backend url '{trimmed}' must not carry a query or fragment"
        )));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
