// SPDX-License-Identifier: GPL-3.0-only

//! Current temperature from the Open-Meteo forecast API

use crate::backends::location::Position;
use crate::errors::WeatherError;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, info};

/// Anything that can report the current temperature at a position
pub trait WeatherSource: Send + Sync {
    /// Current air temperature in whole degrees Celsius
    fn current_temperature(
        &self,
        position: Position,
    ) -> impl Future<Output = Result<i32, WeatherError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
}

/// Open-Meteo HTTP client
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Query parameters for a current-temperature request
    fn query(position: Position) -> [(&'static str, String); 3] {
        [
            ("latitude", position.latitude.to_string()),
            ("longitude", position.longitude.to_string()),
            ("current", "temperature_2m".to_string()),
        ]
    }
}

impl WeatherSource for OpenMeteoClient {
    async fn current_temperature(&self, position: Position) -> Result<i32, WeatherError> {
        debug!(%position, url = %self.base_url, "Requesting current temperature");

        let response = self
            .client
            .get(&self.base_url)
            .query(&Self::query(position))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let temperature = parse_temperature(&body)?;
        info!(temperature, "Current temperature received");
        Ok(temperature)
    }
}

/// Extract the current temperature from an Open-Meteo response body
pub fn parse_temperature(body: &str) -> Result<i32, WeatherError> {
    let forecast: ForecastResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::MalformedResponse(e.to_string()))?;
    round_temperature(forecast.current.temperature_2m)
}

/// Round to the nearest whole degree, halves rounding up
fn round_temperature(value: f64) -> Result<i32, WeatherError> {
    if !value.is_finite() {
        return Err(WeatherError::MalformedResponse(format!(
            "temperature is not a number: {}",
            value
        )));
    }
    Ok((value + 0.5).floor() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temperature() {
        let body = r#"{
            "latitude": 52.52,
            "longitude": 13.42,
            "current_units": {"time": "iso8601", "temperature_2m": "°C"},
            "current": {"time": "2026-10-16T12:00", "interval": 900, "temperature_2m": 17.6}
        }"#;
        assert_eq!(parse_temperature(body), Ok(18));
    }

    #[test]
    fn test_rounding_halves_up() {
        assert_eq!(round_temperature(2.5), Ok(3));
        assert_eq!(round_temperature(-2.5), Ok(-2));
        assert_eq!(round_temperature(-2.6), Ok(-3));
        assert_eq!(round_temperature(0.49), Ok(0));
    }

    #[test]
    fn test_missing_current_block_is_malformed() {
        assert!(matches!(
            parse_temperature(r#"{"error": true, "reason": "bad latitude"}"#),
            Err(WeatherError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_temperature("not json"),
            Err(WeatherError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_query_parameters() {
        let query = OpenMeteoClient::query(Position::new(1.5, -2.25));
        assert_eq!(query[0], ("latitude", "1.5".to_string()));
        assert_eq!(query[1], ("longitude", "-2.25".to_string()));
        assert_eq!(query[2], ("current", "temperature_2m".to_string()));
    }
}
