use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::{error::ClientError, history::DEFAULT_HISTORY_CAPACITY};

pub const DEFAULT_SETTINGS_FILE: &str = "jokes.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub official_joke_url: String,
    pub joke_api_url: String,
    pub request_timeout_secs: u64,
    pub history_capacity: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            official_joke_url: "https://official-joke-api.appspot.com/random_joke".into(),
            joke_api_url: "https://v2.jokeapi.dev/joke/Any".into(),
            request_timeout_secs: 8,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        parse_url("official_joke_url", &self.official_joke_url)?;
        parse_url("joke_api_url", &self.joke_api_url)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    official_joke_url: Option<String>,
    joke_api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    history_capacity: Option<usize>,
}

/// Defaults, then the TOML file, then environment overrides.
///
/// An explicit `path` must exist. Without one, `jokes.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> Result<ClientSettings, ClientError> {
    let mut settings = ClientSettings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(source) => return Err(ClientError::SettingsRead { path, source }),
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path, raw: &str) -> Result<(), ClientError> {
    let file_cfg: FileSettings =
        toml::from_str(raw).map_err(|source| ClientError::SettingsParse {
            path: path.to_path_buf(),
            source,
        })?;

    if let Some(v) = file_cfg.official_joke_url {
        settings.official_joke_url = v;
    }
    if let Some(v) = file_cfg.joke_api_url {
        settings.joke_api_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.history_capacity {
        settings.history_capacity = v.max(1);
    }
    Ok(())
}

fn apply_env(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("JOKES_OFFICIAL_URL") {
        settings.official_joke_url = v;
    }
    if let Some(v) = lookup("APP__OFFICIAL_JOKE_URL") {
        settings.official_joke_url = v;
    }

    if let Some(v) = lookup("JOKES_JOKEAPI_URL") {
        settings.joke_api_url = v;
    }
    if let Some(v) = lookup("APP__JOKE_API_URL") {
        settings.joke_api_url = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("APP__HISTORY_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.history_capacity = parsed.max(1);
        }
    }
}

pub(crate) fn parse_url(field: &'static str, value: &str) -> Result<Url, ClientError> {
    Url::parse(value).map_err(|source| ClientError::InvalidUrl {
        field,
        value: value.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
