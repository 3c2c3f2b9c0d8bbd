// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application identifier used for config/cache directories and D-Bus clients
pub const APP_ID: &str = "smile-camera";

/// File name offered when saving a capture
pub const SAVE_FILE_NAME: &str = "smile-photo.png";

/// Text shown on the welcome screen
pub const WELCOME_MESSAGE: &str = "Hey Beautiful! ❤️";

/// Booth timing
pub mod timing {
    use super::Duration;

    /// How long the welcome notification stays up before the camera opens
    pub const NOTIFICATION_DELAY: Duration = Duration::from_secs(3);

    /// Interval between countdown steps
    pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

    /// Frame counter modulo for periodic logging
    pub const FRAME_LOG_INTERVAL: u64 = 30;

    /// Pipeline playing state timeout on start
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Pipeline state change timeout on stop
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Terminal redraw interval (~60 fps)
    pub const RENDER_INTERVAL: Duration = Duration::from_millis(16);
}

/// GStreamer pipeline settings
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the frame channel between the appsink and the runtime
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Pixel format negotiated at the appsink
    pub const OUTPUT_FORMAT: &str = "RGBA";
}

/// External data services
pub mod services {
    use super::Duration;

    /// Open-Meteo forecast endpoint
    pub const WEATHER_URL: &str = "https://api.open-meteo.com/v1/forecast";

    /// WAQI feed endpoint (coordinates and token are appended)
    pub const AIR_QUALITY_URL: &str = "https://api.waqi.info/feed";

    /// WAQI demo token
    pub const AIR_QUALITY_DEMO_TOKEN: &str = "demo";

    /// Timeout applied to each HTTP request
    pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

    /// How long to wait for GeoClue to deliver a fix
    pub const GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(15);

    /// User-Agent header for HTTP requests
    pub const USER_AGENT: &str = concat!("smile-camera/", env!("CARGO_PKG_VERSION"));
}

/// Upper bounds (inclusive) of the AQI categories, Good through Very Unhealthy.
/// Anything above the last bound is Hazardous.
pub const AQI_BREAKPOINTS: [u32; 5] = [50, 100, 150, 200, 300];
