// SPDX-License-Identifier: GPL-3.0-only

//! Air quality index from the WAQI feed API
//!
//! Any failure here means "no data": HTTP errors, a `status` other than
//! `"ok"`, or a station without a numeric index all leave the AQI unset.

use crate::backends::location::Position;
use crate::constants::AQI_BREAKPOINTS;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, info, warn};

/// Anything that can report the AQI at a position
pub trait AirQualitySource: Send + Sync {
    /// Current AQI, or `None` when no data is available
    fn current_aqi(&self, position: Position) -> impl Future<Output = Option<u32>> + Send;
}

#[derive(Debug, Deserialize)]
struct FeedResponse {
    status: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// WAQI HTTP client
#[derive(Debug, Clone)]
pub struct WaqiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl WaqiClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Feed URL for a position (token is sent as a query parameter)
    fn feed_url(&self, position: Position) -> String {
        format!(
            "{}/geo:{};{}/",
            self.base_url.trim_end_matches('/'),
            position.latitude,
            position.longitude
        )
    }
}

impl AirQualitySource for WaqiClient {
    async fn current_aqi(&self, position: Position) -> Option<u32> {
        let url = self.feed_url(position);
        debug!(%url, "Requesting air quality");

        let response = match self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Air quality request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), "Air quality service returned an error status");
            return None;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to read air quality response");
                return None;
            }
        };

        let aqi = parse_aqi(&body);
        match aqi {
            Some(aqi) => info!(aqi, "Air quality index received"),
            None => debug!("Air quality data unavailable"),
        }
        aqi
    }
}

/// Extract the AQI from a WAQI feed response body
pub fn parse_aqi(body: &str) -> Option<u32> {
    let feed: FeedResponse = serde_json::from_str(body).ok()?;
    if feed.status != "ok" {
        return None;
    }
    let aqi = feed.data.get("aqi")?;
    if let Some(value) = aqi.as_u64() {
        return u32::try_from(value).ok();
    }
    // Some stations report a float, others "-" when the sensor is offline
    aqi.as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32)
}

/// Qualitative AQI bucket shown in the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    /// No reading available
    Unavailable,
}

impl AqiCategory {
    /// Bucket for an index; `None` maps to [`AqiCategory::Unavailable`]
    pub fn from_index(aqi: Option<u32>) -> Self {
        let Some(aqi) = aqi else {
            return AqiCategory::Unavailable;
        };
        const BUCKETS: [AqiCategory; 5] = [
            AqiCategory::Good,
            AqiCategory::Moderate,
            AqiCategory::UnhealthyForSensitiveGroups,
            AqiCategory::Unhealthy,
            AqiCategory::VeryUnhealthy,
        ];
        AQI_BREAKPOINTS
            .iter()
            .zip(BUCKETS)
            .find(|(limit, _)| aqi <= **limit)
            .map(|(_, category)| category)
            .unwrap_or(AqiCategory::Hazardous)
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
            AqiCategory::Unavailable => "Unavailable",
        }
    }
}

/// Label for an optional AQI reading
pub fn aqi_label(aqi: Option<u32>) -> &'static str {
    AqiCategory::from_index(aqi).label()
}
