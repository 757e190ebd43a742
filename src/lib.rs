//! Read-through cache for OpenWeatherMap current-weather data.
//!
//! Weather payloads are keyed by a free-text location name and resolved from
//! an in-process memo, then a time-bounded JSON file cache, then the remote
//! API. Single fields (description, temperature, feels-like, icon) are
//! projected out of the payload; icons are downloaded once and returned as
//! inline `data:` URIs.

pub mod cache;
pub mod config;
pub mod error;
pub mod projector;
pub mod utils;
pub mod weather;

pub use cache::WeatherStore;
pub use config::{Config, Settings};
pub use error::{Result, WeatherCacheError};
pub use projector::Field;
pub use utils::cache_key;
pub use weather::openweather::{OpenWeatherClient, OpenWeatherError};
pub use weather::types::{Units, WeatherRecord};

/// Named entry points over a [`WeatherStore`].
pub struct OpenWeatherCache {
    store: WeatherStore,
}

impl OpenWeatherCache {
    /// Validate `config` and build the cache. No request is made here.
    pub fn new(config: Config) -> Result<Self> {
        let settings = config.validate()?;
        let client = OpenWeatherClient::new(&settings).map_err(|e| {
            WeatherCacheError::InvalidConfig(format!("Unable to build HTTP client: {}", e))
        })?;

        tracing::debug!(
            cache_dir = %settings.cache_dir().display(),
            lang = settings.language(),
            units = %settings.units(),
            cache_time_secs = settings.cache_time().as_secs(),
            "Weather cache ready"
        );

        Ok(Self {
            store: WeatherStore::new(settings, client),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(Config::from_env()?)?)
    }

    pub fn settings(&self) -> &Settings {
        self.store.settings()
    }

    pub fn store(&self) -> &WeatherStore {
        &self.store
    }

    pub async fn get_weather(&self, location: &str) -> Result<String> {
        self.get(Field::Weather, location).await
    }

    pub async fn get_feels_like(&self, location: &str) -> Result<String> {
        self.get(Field::FeelsLike, location).await
    }

    pub async fn get_temperature(&self, location: &str) -> Result<String> {
        self.get(Field::Temperature, location).await
    }

    pub async fn get_icon(&self, location: &str) -> Result<String> {
        self.get(Field::Icon, location).await
    }

    pub async fn get(&self, field: Field, location: &str) -> Result<String> {
        projector::project(&self.store, field, location).await
    }

    /// Project by method name (`getWeather`, `temperature`, ...).
    pub async fn get_named(&self, field: &str, location: &str) -> Result<String> {
        let field: Field = field.parse()?;
        self.get(field, location).await
    }

    /// Full payload for `location`.
    pub async fn resolve(&self, location: &str) -> Result<WeatherRecord> {
        self.store.resolve(location).await
    }

    /// Remove all cached weather files and icons. Returns how many were deleted.
    pub async fn clear_cache(&self) -> Result<usize> {
        self.store.clear_all().await
    }
}
