use std::path::PathBuf;
use thiserror::Error;

use crate::weather::openweather::OpenWeatherError;

#[derive(Error, Debug)]
pub enum WeatherCacheError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] OpenWeatherError),
    #[error("Corrupt cache file {}: {source}", path.display())]
    CorruptCache {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Malformed upstream data: missing or invalid `{0}`")]
    MalformedUpstreamData(String),
    #[error("Unknown data requested: {0}")]
    UnknownField(String),
    #[error("Cache I/O failed for {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl WeatherCacheError {
    pub(crate) fn cache_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CacheIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, WeatherCacheError>;
