// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use smile_camera::constants::{AQI_BREAKPOINTS, SAVE_FILE_NAME, timing};
use smile_camera::environment::{AqiCategory, aqi_label};
use std::time::Duration;

#[test]
fn test_booth_timing() {
    assert_eq!(timing::NOTIFICATION_DELAY, Duration::from_secs(3));
    assert_eq!(timing::COUNTDOWN_STEP, Duration::from_secs(1));
}

#[test]
fn test_save_file_name_is_png() {
    assert!(SAVE_FILE_NAME.ends_with(".png"));
}

#[test]
fn test_breakpoints_map_to_categories() {
    // Each breakpoint is the last value of its category
    let expected = [
        AqiCategory::Good,
        AqiCategory::Moderate,
        AqiCategory::UnhealthyForSensitiveGroups,
        AqiCategory::Unhealthy,
        AqiCategory::VeryUnhealthy,
    ];
    for (bound, category) in AQI_BREAKPOINTS.iter().zip(expected) {
        assert_eq!(AqiCategory::from_index(Some(*bound)), category);
    }
    assert_eq!(
        AqiCategory::from_index(Some(AQI_BREAKPOINTS[4] + 1)),
        AqiCategory::Hazardous
    );
}

#[test]
fn test_missing_index_is_unavailable() {
    assert_eq!(AqiCategory::from_index(None), AqiCategory::Unavailable);
    assert_eq!(aqi_label(None), "Unavailable");
}
