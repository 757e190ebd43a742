use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WeatherCacheError};
use crate::utils::normalize_cache_dir;
use crate::weather::types::Units;

pub const API_KEY_LEN: usize = 32;
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_CACHE_TIME_SECS: i64 = 3600;
pub const DEFAULT_API_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org";

/// Language codes accepted by the weather endpoint's `lang` parameter.
pub const SUPPORTED_LANGUAGES: [&str; 49] = [
    "af", "al", "ar", "az", "bg", "ca", "cz", "da", "de", "el", "en", "eu", "fa", "fi", "fr",
    "gl", "he", "hi", "hr", "hu", "id", "it", "ja", "kr", "la", "lt", "mk", "no", "nl", "pl",
    "pt", "pt_br", "ro", "ru", "sv", "se", "sk", "sl", "sp", "es", "sr", "th", "tr", "ua", "uk",
    "vi", "zh_cn", "zh_tw", "zu",
];

/// Raw construction parameters, before validation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub api_key: String,
    pub cache_dir: PathBuf,
    pub language: String,
    pub cache_time_secs: i64,
    pub metric: bool,
    pub api_base_url: String,
    pub icon_base_url: String,
}

impl Config {
    pub fn new(api_key: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: api_key.into(),
            cache_dir: cache_dir.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            cache_time_secs: DEFAULT_CACHE_TIME_SECS,
            metric: true,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("OPENWEATHER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENWEATHER_API_KEY not set"))?;
        let cache_dir = env::var("OPENWEATHER_CACHE_DIR")
            .map_err(|_| anyhow::anyhow!("OPENWEATHER_CACHE_DIR not set"))?;

        let cache_time_secs = match env::var("OPENWEATHER_CACHE_TIME") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("OPENWEATHER_CACHE_TIME is not an integer: {}", e))?,
            Err(_) => DEFAULT_CACHE_TIME_SECS,
        };

        let metric = match env::var("OPENWEATHER_METRIC") {
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                anyhow::anyhow!("OPENWEATHER_METRIC must be true or false, got {}", raw)
            })?,
            Err(_) => true,
        };

        Ok(Config {
            api_key,
            cache_dir: PathBuf::from(cache_dir),
            language: env::var("OPENWEATHER_LANG").unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string()),
            cache_time_secs,
            metric,
            api_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            icon_base_url: env::var("OPENWEATHER_ICON_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ICON_BASE_URL.to_string()),
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_cache_time(mut self, secs: i64) -> Self {
        self.cache_time_secs = secs;
        self
    }

    pub fn with_metric(mut self, metric: bool) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_icon_base_url(mut self, url: impl Into<String>) -> Self {
        self.icon_base_url = url.into();
        self
    }

    /// Checks every parameter and produces the normalized [`Settings`].
    ///
    /// Checks run in a fixed order (key, directory, cache time, language) and
    /// the first failure is reported. The only disk access is an unnamed
    /// probe file in the cache directory; no request is made.
    pub fn validate(self) -> Result<Settings> {
        if self.api_key.len() != API_KEY_LEN {
            return Err(WeatherCacheError::InvalidConfig(format!(
                "API key must be {} characters, got {}",
                API_KEY_LEN,
                self.api_key.len()
            )));
        }

        let cache_dir = normalize_cache_dir(&self.cache_dir);
        check_cache_dir(&cache_dir)?;

        if self.cache_time_secs < 0 {
            return Err(WeatherCacheError::InvalidConfig(
                "Cache time must not be negative; use 0 to disable caching".to_string(),
            ));
        }

        if !SUPPORTED_LANGUAGES.contains(&self.language.as_str()) {
            return Err(WeatherCacheError::InvalidConfig(format!(
                "Language {} is not supported",
                self.language
            )));
        }

        Ok(Settings {
            api_key: self.api_key,
            cache_dir,
            language: self.language,
            cache_time: Duration::from_secs(self.cache_time_secs.unsigned_abs()),
            units: if self.metric { Units::Metric } else { Units::Imperial },
            api_base_url: self.api_base_url.trim_end_matches('/').to_string(),
            icon_base_url: self.icon_base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Validated configuration. Only obtainable through [`Config::validate`].
#[derive(Clone, Debug)]
pub struct Settings {
    api_key: String,
    cache_dir: PathBuf,
    language: String,
    cache_time: Duration,
    units: Units,
    api_base_url: String,
    icon_base_url: String,
}

impl Settings {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Cache directory, always ending with a path separator.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn cache_time(&self) -> Duration {
        self.cache_time
    }

    /// A zero cache time disables the on-disk weather cache.
    pub fn disk_cache_enabled(&self) -> bool {
        !self.cache_time.is_zero()
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn icon_base_url(&self) -> &str {
        &self.icon_base_url
    }
}

fn check_cache_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir).map_err(|e| {
        WeatherCacheError::InvalidConfig(format!(
            "Cache location {} must exist and be writable: {}",
            dir.display(),
            e
        ))
    })?;

    if !metadata.is_dir() {
        return Err(WeatherCacheError::InvalidConfig(format!(
            "Cache location {} is not a directory",
            dir.display()
        )));
    }

    // Permission bits alone ignore ownership, so create an unnamed file instead.
    tempfile::tempfile_in(dir).map_err(|e| {
        WeatherCacheError::InvalidConfig(format!(
            "Cache location {} is not writable: {}",
            dir.display(),
            e
        ))
    })?;

    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
