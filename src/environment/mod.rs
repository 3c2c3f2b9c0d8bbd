// SPDX-License-Identifier: GPL-3.0-only

//! Ambient environment overlay: temperature and air quality at the user's
//! position
//!
//! The reporter runs once per process. It asks for the position, then queries
//! the weather and the air quality services one after the other. Each step
//! reports through an [`EnvironmentUpdate`] so the view can fill in as data
//! arrives.

pub mod air_quality;
pub mod weather;

pub use air_quality::{AirQualitySource, AqiCategory, WaqiClient, aqi_label};
pub use weather::{OpenMeteoClient, WeatherSource};

use crate::backends::location::{Geolocator, LocationSource, Position};
use crate::config::Config;
use crate::constants::services;
use crate::errors::{GeolocationError, WeatherError};
use std::future::Future;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// One step of progress from the reporter
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentUpdate {
    /// Outcome of the position request
    Location(Result<Position, GeolocationError>),
    /// Outcome of the weather query
    Temperature(Result<i32, WeatherError>),
    /// Outcome of the air quality query (`None` = no data)
    AirQuality(Option<u32>),
}

/// Everything the overlay knows about the environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentReading {
    pub position: Option<Position>,
    pub temperature_c: Option<i32>,
    pub aqi: Option<u32>,
    pub location_error: Option<GeolocationError>,
    pub weather_error: Option<WeatherError>,
}

impl EnvironmentReading {
    /// Fold one update into the reading
    pub fn apply(&mut self, update: EnvironmentUpdate) {
        match update {
            EnvironmentUpdate::Location(Ok(position)) => {
                self.position = Some(position);
                self.location_error = None;
            }
            EnvironmentUpdate::Location(Err(e)) => {
                self.position = None;
                self.location_error = Some(e);
            }
            EnvironmentUpdate::Temperature(Ok(celsius)) => {
                self.temperature_c = Some(celsius);
                self.weather_error = None;
            }
            EnvironmentUpdate::Temperature(Err(e)) => {
                self.temperature_c = None;
                self.weather_error = Some(e);
            }
            EnvironmentUpdate::AirQuality(aqi) => self.aqi = aqi,
        }
    }

    /// User-facing error line, location errors first
    pub fn status_message(&self) -> Option<&'static str> {
        self.location_error
            .as_ref()
            .map(GeolocationError::user_message)
            .or_else(|| self.weather_error.as_ref().map(WeatherError::user_message))
    }

    pub fn aqi_category(&self) -> AqiCategory {
        AqiCategory::from_index(self.aqi)
    }

    /// Temperature as shown in the overlay
    pub fn temperature_label(&self) -> String {
        match self.temperature_c {
            Some(celsius) => format!("{}°C", celsius),
            None => "--".to_string(),
        }
    }

    /// AQI value as shown in the overlay
    pub fn aqi_label(&self) -> String {
        match self.aqi {
            Some(aqi) => format!("{} ({})", aqi, self.aqi_category().label()),
            None => self.aqi_category().label().to_string(),
        }
    }
}

/// A one-shot environment lookup that streams its progress
pub trait Reporter: Send + 'static {
    fn report(self, updates: UnboundedSender<EnvironmentUpdate>) -> impl Future<Output = ()> + Send;
}

/// Location → weather → air quality, in that order
#[derive(Debug, Clone)]
pub struct EnvironmentReporter<G, W, A> {
    geolocator: G,
    weather: W,
    air_quality: A,
}

/// Reporter wired to the real services
pub type SystemReporter = EnvironmentReporter<LocationSource, OpenMeteoClient, WaqiClient>;

impl<G, W, A> EnvironmentReporter<G, W, A>
where
    G: Geolocator,
    W: WeatherSource,
    A: AirQualitySource,
{
    pub fn new(geolocator: G, weather: W, air_quality: A) -> Self {
        Self {
            geolocator,
            weather,
            air_quality,
        }
    }

    /// Run the lookup, calling `emit` for every step
    pub async fn run(&self, mut emit: impl FnMut(EnvironmentUpdate) + Send) {
        let position = match self.geolocator.current_position().await {
            Ok(position) => {
                info!(%position, "Location acquired");
                emit(EnvironmentUpdate::Location(Ok(position)));
                position
            }
            Err(e) => {
                warn!(error = %e, "Location unavailable, skipping weather lookup");
                emit(EnvironmentUpdate::Location(Err(e)));
                return;
            }
        };

        let temperature = self.weather.current_temperature(position).await;
        if let Err(e) = &temperature {
            warn!(error = %e, "Weather lookup failed");
        }
        emit(EnvironmentUpdate::Temperature(temperature));

        let aqi = self.air_quality.current_aqi(position).await;
        debug!(?aqi, "Air quality lookup finished");
        emit(EnvironmentUpdate::AirQuality(aqi));
    }

    /// Run the lookup and collect the final reading
    pub async fn fetch(&self) -> EnvironmentReading {
        let mut reading = EnvironmentReading::default();
        self.run(|update| reading.apply(update)).await;
        reading
    }
}

impl<G, W, A> Reporter for EnvironmentReporter<G, W, A>
where
    G: Geolocator + 'static,
    W: WeatherSource + 'static,
    A: AirQualitySource + 'static,
{
    async fn report(self, updates: UnboundedSender<EnvironmentUpdate>) {
        self.run(|update| {
            // Receiver gone means the booth is shutting down
            let _ = updates.send(update);
        })
        .await;
    }
}

impl SystemReporter {
    /// Build the reporter from the configuration
    pub fn from_config(config: &Config) -> Self {
        let client = http_client();
        EnvironmentReporter::new(
            LocationSource::from(&config.location),
            OpenMeteoClient::new(client.clone(), config.weather_url.clone()),
            WaqiClient::new(
                client,
                config.air_quality_url.clone(),
                config.air_quality_token.clone(),
            ),
        )
    }
}

/// Shared HTTP client with the service timeout and user agent
fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(services::HTTP_TIMEOUT)
        .user_agent(services::USER_AGENT)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to configure HTTP client, using defaults");
            reqwest::Client::new()
        })
}
