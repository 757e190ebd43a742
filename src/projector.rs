use std::fmt;
use std::io::ErrorKind;
use std::str::FromStr;

use crate::cache::WeatherStore;
use crate::error::{Result, WeatherCacheError};
use crate::utils::{icon_data_uri, icon_file_path, is_safe_icon_id};

/// A value that can be projected out of a location's weather payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// `weather[0].description`
    Weather,
    /// `main.feels_like`
    FeelsLike,
    /// `main.temp`
    Temperature,
    /// `weather[0].icon`, returned as an inline PNG data URI.
    Icon,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Weather, Field::FeelsLike, Field::Temperature, Field::Icon];

    pub fn method_name(&self) -> &'static str {
        match self {
            Self::Weather => "getWeather",
            Self::FeelsLike => "getFeelsLike",
            Self::Temperature => "getTemperature",
            Self::Icon => "getIcon",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

impl FromStr for Field {
    type Err = WeatherCacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "getWeather" | "weather" => Ok(Self::Weather),
            "getFeelsLike" | "feels_like" => Ok(Self::FeelsLike),
            "getTemperature" | "temperature" => Ok(Self::Temperature),
            "getIcon" | "icon" => Ok(Self::Icon),
            other => Err(WeatherCacheError::UnknownField(other.to_string())),
        }
    }
}

/// Resolve `location` through the store and extract `field` from it.
pub async fn project(store: &WeatherStore, field: Field, location: &str) -> Result<String> {
    let record = store.resolve(location).await?;

    match field {
        Field::Weather => record.description(),
        Field::FeelsLike => record.feels_like(),
        Field::Temperature => record.temperature(),
        Field::Icon => {
            let icon_id = record.icon()?;
            let bytes = load_icon(store, &icon_id).await?;
            Ok(icon_data_uri(&bytes))
        }
    }
}

/// Icons are fetched once per identifier and kept until the cache is cleared.
/// They are not subject to the weather cache time.
async fn load_icon(store: &WeatherStore, icon_id: &str) -> Result<Vec<u8>> {
    if !is_safe_icon_id(icon_id) {
        return Err(WeatherCacheError::MalformedUpstreamData(format!(
            "weather[0].icon ({:?})",
            icon_id
        )));
    }

    let path = icon_file_path(store.settings().cache_dir(), icon_id);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            tracing::debug!(icon_id, "Icon cache hit");
            return Ok(bytes);
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(WeatherCacheError::cache_io(&path, e)),
    }

    let bytes = store.client().fetch_icon(icon_id).await.map_err(|e| {
        tracing::warn!(icon_id, error = %e, "Icon fetch failed");
        WeatherCacheError::from(e)
    })?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| WeatherCacheError::cache_io(&path, e))?;
    tracing::info!(icon_id, path = %path.display(), "Cached weather icon");

    // Serve what was persisted, same as a later cache hit would.
    tokio::fs::read(&path)
        .await
        .map_err(|e| WeatherCacheError::cache_io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        for field in Field::ALL {
            assert_eq!(field.method_name().parse::<Field>().unwrap(), field);
        }
        assert_eq!("feels_like".parse::<Field>().unwrap(), Field::FeelsLike);
        assert_eq!(Field::Icon.to_string(), "getIcon");
    }

    #[test]
    fn test_unknown_field() {
        match "getHumidity".parse::<Field>() {
            Err(WeatherCacheError::UnknownField(name)) => assert_eq!(name, "getHumidity"),
            other => panic!("expected UnknownField, got {:?}", other),
        }
        assert!("GetWeather".parse::<Field>().is_err());
    }
}
