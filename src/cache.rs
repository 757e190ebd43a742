//! Layered read-through cache for weather payloads.
//!
//! Lookups go memory, then disk (only while the file is younger than the
//! configured cache time), then the remote API. A remote fetch is written
//! back to disk (when disk caching is enabled) and to memory.

use moka::future::Cache;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use crate::config::Settings;
use crate::error::{Result, WeatherCacheError};
use crate::utils::{cache_key, is_cache_artifact, weather_file_path, weather_stem};
use crate::weather::openweather::OpenWeatherClient;
use crate::weather::types::WeatherRecord;

/// Process-lifetime memo, keyed by `<hash>.<language>`. Never expires.
pub type WeatherMemo = Cache<String, WeatherRecord>;

pub struct WeatherStore {
    settings: Settings,
    client: OpenWeatherClient,
    memo: WeatherMemo,
}

impl WeatherStore {
    pub fn new(settings: Settings, client: OpenWeatherClient) -> Self {
        Self {
            settings,
            client,
            memo: Cache::builder().build(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &OpenWeatherClient {
        &self.client
    }

    pub async fn resolve(&self, location: &str) -> Result<WeatherRecord> {
        let key = cache_key(location);
        let language = self.settings.language();
        let memo_key = weather_stem(&key, language);

        if let Some(record) = self.memo.get(&memo_key).await {
            tracing::debug!(location, key = %memo_key, "Memory cache hit");
            return Ok(record);
        }

        let path = weather_file_path(self.settings.cache_dir(), &key, language);

        let record = match self.read_fresh(&path).await? {
            Some(record) => {
                tracing::debug!(location, path = %path.display(), "Disk cache hit");
                record
            }
            None => {
                let record = self.client.fetch_weather(location).await.map_err(|e| {
                    tracing::warn!(location, error = %e, "Weather fetch failed");
                    WeatherCacheError::from(e)
                })?;

                if self.settings.disk_cache_enabled() {
                    write_record(&path, &record).await?;
                    tracing::info!(location, path = %path.display(), "Cached weather payload");
                }
                record
            }
        };

        self.memo.insert(memo_key, record.clone()).await;
        Ok(record)
    }

    /// Returns the disk entry if caching is enabled and the file is fresh.
    async fn read_fresh(&self, path: &Path) -> Result<Option<WeatherRecord>> {
        if !self.settings.disk_cache_enabled() {
            return Ok(None);
        }

        let metadata = match tokio::fs::metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(WeatherCacheError::cache_io(path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| WeatherCacheError::cache_io(path, e))?;
        // An mtime in the future counts as age zero.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or_default();

        if age >= self.settings.cache_time() {
            tracing::debug!(
                path = %path.display(),
                age_secs = age.as_secs(),
                "Disk cache entry is stale"
            );
            return Ok(None);
        }

        read_record(path).await.map(Some)
    }

    /// Deletes every `*.json` and `*.png` file in the cache directory.
    ///
    /// The in-memory memo is left untouched, so records resolved earlier by
    /// this store keep being served until the store is dropped.
    pub async fn clear_all(&self) -> Result<usize> {
        let dir = self.settings.cache_dir();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| WeatherCacheError::cache_io(dir, e))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| WeatherCacheError::cache_io(dir, e))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| WeatherCacheError::cache_io(&path, e))?;

            if !file_type.is_file() || !is_cache_artifact(&path) {
                continue;
            }

            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| WeatherCacheError::cache_io(&path, e))?;
            removed += 1;
        }

        tracing::info!(dir = %dir.display(), removed, "Cleared weather cache");
        Ok(removed)
    }
}

async fn read_record(path: &Path) -> Result<WeatherRecord> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| WeatherCacheError::cache_io(path, e))?;

    let corrupt = |source: serde_json::Error| {
        tracing::warn!(path = %path.display(), "Corrupt weather cache file");
        WeatherCacheError::CorruptCache {
            path: path.to_path_buf(),
            source,
        }
    };

    let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(corrupt)?;
    WeatherRecord::from_value(value).ok_or_else(|| {
        corrupt(<serde_json::Error as serde::de::Error>::custom(
            "cached payload is not a JSON object",
        ))
    })
}

async fn write_record(path: &Path, record: &WeatherRecord) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(record).map_err(|e| {
        WeatherCacheError::cache_io(path, std::io::Error::new(ErrorKind::InvalidData, e))
    })?;

    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| WeatherCacheError::cache_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> WeatherRecord {
        WeatherRecord::from_value(json!({
            "weather": [{"description": "light rain", "icon": "10d"}],
            "main": {"temp": 12.25, "feels_like": 11.0}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.en.json");

        write_record(&path, &record()).await.unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"main\""), "payload should be pretty-printed");

        assert_eq!(read_record(&path).await.unwrap(), record());
    }

    #[tokio::test]
    async fn test_read_record_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.en.json");

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_record(&path).await,
            Err(WeatherCacheError::CorruptCache { .. })
        ));

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            read_record(&path).await,
            Err(WeatherCacheError::CorruptCache { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_record_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone").join("abc.en.json");

        assert!(matches!(
            write_record(&path, &record()).await,
            Err(WeatherCacheError::CacheIo { .. })
        ));
    }
}
