use super::types::*;
use crate::config::Settings;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const WEATHER_PATH: &str = "/data/2.5/weather";
const ICON_PATH: &str = "/img/w";

#[derive(Error, Debug)]
pub enum OpenWeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Empty response from {0}")]
    EmptyResponse(String),
    #[error("Weather payload is not a JSON object")]
    InvalidPayload,
}

/// Stateless client for the current-weather and icon endpoints.
///
/// Every call is a single request. Failures are returned immediately and
/// callers decide what, if anything, to cache.
pub struct OpenWeatherClient {
    client: Client,
    api_key: String,
    units: Units,
    language: String,
    api_base_url: String,
    icon_base_url: String,
}

impl OpenWeatherClient {
    pub fn new(settings: &Settings) -> Result<Self, OpenWeatherError> {
        let client = Client::builder()
            .user_agent(concat!("openweather-cache/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key().to_string(),
            units: settings.units(),
            language: settings.language().to_string(),
            api_base_url: settings.api_base_url().to_string(),
            icon_base_url: settings.icon_base_url().to_string(),
        })
    }

    pub fn weather_url(&self, location: &str) -> String {
        format!(
            "{}{}?q={}&APPID={}&units={}&lang={}",
            self.api_base_url,
            WEATHER_PATH,
            urlencoding::encode(location),
            urlencoding::encode(&self.api_key),
            self.units.as_str(),
            urlencoding::encode(&self.language)
        )
    }

    pub fn icon_url(&self, icon_id: &str) -> String {
        format!(
            "{}{}/{}.png",
            self.icon_base_url,
            ICON_PATH,
            urlencoding::encode(icon_id)
        )
    }

    pub async fn fetch_weather(&self, location: &str) -> Result<WeatherRecord, OpenWeatherError> {
        let url = self.weather_url(location);
        tracing::info!(
            location,
            units = %self.units,
            lang = %self.language,
            "Requesting current weather"
        );

        let body = self.get_bytes(&url, WEATHER_PATH).await?;
        let value: Value = serde_json::from_slice(&body)?;

        WeatherRecord::from_value(value).ok_or(OpenWeatherError::InvalidPayload)
    }

    pub async fn fetch_icon(&self, icon_id: &str) -> Result<Vec<u8>, OpenWeatherError> {
        let url = self.icon_url(icon_id);
        tracing::info!(icon_id, "Requesting weather icon");

        self.get_bytes(&url, ICON_PATH).await
    }

    async fn get_bytes(&self, url: &str, endpoint: &str) -> Result<Vec<u8>, OpenWeatherError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(endpoint, %status, "OpenWeather request rejected");
            return Err(OpenWeatherError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(OpenWeatherError::EmptyResponse(endpoint.to_string()));
        }

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn client(dir: &std::path::Path, metric: bool) -> OpenWeatherClient {
        let settings = Config::new("0123456789abcdef0123456789abcdef", dir)
            .with_language("pt_br")
            .with_metric(metric)
            .with_api_base_url("http://weather.test")
            .with_icon_base_url("http://icons.test/")
            .validate()
            .unwrap();
        OpenWeatherClient::new(&settings).unwrap()
    }

    #[test]
    fn test_weather_url_encodes_location() {
        let dir = tempfile::tempdir().unwrap();
        let url = client(dir.path(), true).weather_url("São Paulo, BR");

        assert_eq!(
            url,
            "http://weather.test/data/2.5/weather?q=S%C3%A3o%20Paulo%2C%20BR\
             &APPID=0123456789abcdef0123456789abcdef&units=metric&lang=pt_br"
        );
    }

    #[test]
    fn test_weather_url_units() {
        let dir = tempfile::tempdir().unwrap();
        let url = client(dir.path(), false).weather_url("Oslo");
        assert!(url.contains("&units=imperial&"));
    }

    #[test]
    fn test_icon_url() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            client(dir.path(), true).icon_url("04n"),
            "http://icons.test/img/w/04n.png"
        );
    }
}
