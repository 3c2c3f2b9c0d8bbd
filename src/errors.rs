// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth
//!
//! None of these are fatal to the booth itself: camera and capture failures
//! are logged and the view degrades, location and weather failures become a
//! status line. Only the CLI subcommands bubble them up to `main`.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// The user or the sandbox refused access to the camera
    PermissionDenied,
    /// Camera initialization failed
    InitializationFailed(String),
}

/// Geolocation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    /// No location provider on this system (or location disabled in config)
    Unsupported,
    /// The user denied location access
    PermissionDenied,
    /// The provider was reachable but produced no fix
    Unavailable(String),
}

/// Weather service errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// Request could not be sent or the connection failed
    Network(String),
    /// Non-success HTTP status
    Status(u16),
    /// Response body could not be parsed
    MalformedResponse(String),
}

/// Photo capture errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No stream or no frame available at grab time
    MountMissing,
    /// Frame could not be converted into an image
    InvalidFrame(String),
    /// PNG encoding failed
    EncodingFailed(String),
}

impl GeolocationError {
    /// Text shown in the weather overlay when the lookup fails
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::Unsupported => "Geolocation not supported.",
            GeolocationError::PermissionDenied | GeolocationError::Unavailable(_) => {
                "Location access denied. Enable location for weather."
            }
        }
    }
}

impl WeatherError {
    /// Text shown in the weather overlay when the weather query fails
    pub fn user_message(&self) -> &'static str {
        "Failed to load weather data."
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::PermissionDenied => write!(f, "Camera access denied"),
            CameraError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl fmt::Display for GeolocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeolocationError::Unsupported => write!(f, "Geolocation not supported"),
            GeolocationError::PermissionDenied => write!(f, "Location access denied"),
            GeolocationError::Unavailable(msg) => write!(f, "Location unavailable: {}", msg),
        }
    }
}

impl fmt::Display for WeatherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherError::Network(msg) => write!(f, "Network failure: {}", msg),
            WeatherError::Status(code) => write!(f, "Unexpected HTTP status {}", code),
            WeatherError::MalformedResponse(msg) => write!(f, "Malformed response: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::MountMissing => write!(f, "No video frame available for capture"),
            CaptureError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for GeolocationError {}
impl std::error::Error for WeatherError {}
impl std::error::Error for CaptureError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WeatherError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            WeatherError::Status(status.as_u16())
        } else {
            WeatherError::Network(err.to_string())
        }
    }
}
