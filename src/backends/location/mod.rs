// SPDX-License-Identifier: GPL-3.0-only

//! Device location lookup
//!
//! One-shot position requests, either from the GeoClue2 system service or
//! from coordinates fixed in the configuration.

pub mod geoclue;

use crate::errors::GeolocationError;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Geographic coordinates in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite and in range
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Source of the current position
pub trait Geolocator: Send + Sync {
    /// Request the current position once
    fn current_position(&self) -> impl Future<Output = Result<Position, GeolocationError>> + Send;
}

/// Configured location provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationProvider {
    /// Ask the GeoClue2 service on the system bus
    #[default]
    GeoClue,
    /// Always report the same coordinates
    Fixed { latitude: f64, longitude: f64 },
    /// Location lookups are switched off
    Disabled,
}

/// [`Geolocator`] built from a [`LocationProvider`]
#[derive(Debug, Clone)]
pub enum LocationSource {
    GeoClue(geoclue::GeoClueLocator),
    Fixed(Position),
    Disabled,
}

impl From<&LocationProvider> for LocationSource {
    fn from(provider: &LocationProvider) -> Self {
        match provider {
            LocationProvider::GeoClue => LocationSource::GeoClue(geoclue::GeoClueLocator::new()),
            LocationProvider::Fixed {
                latitude,
                longitude,
            } => LocationSource::Fixed(Position::new(*latitude, *longitude)),
            LocationProvider::Disabled => LocationSource::Disabled,
        }
    }
}

impl Geolocator for LocationSource {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        match self {
            LocationSource::GeoClue(locator) => locator.current_position().await,
            LocationSource::Fixed(position) if position.is_valid() => Ok(*position),
            LocationSource::Fixed(position) => Err(GeolocationError::Unavailable(format!(
                "invalid coordinates {}",
                position
            ))),
            LocationSource::Disabled => Err(GeolocationError::Unsupported),
        }
    }
}
