// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use picam::constants::*;

#[test]
fn test_thumbnail_bounding_box() {
    assert_eq!(THUMBNAIL_MAX_WIDTH, 240);
    assert_eq!(THUMBNAIL_MAX_HEIGHT, 135);
}

#[test]
fn test_eviction_keeps_the_preload_window() {
    assert!(
        EVICT_KEEP_DISTANCE >= PRELOAD_RADIUS,
        "Eviction inside the preload window would thrash the cache"
    );
}

#[test]
fn test_voltage_calibration_range_is_nonempty() {
    assert!(
        VOLTAGE_FULL > VOLTAGE_EMPTY,
        "Percentage mapping needs a nonempty voltage range"
    );
}

#[test]
fn test_battery_thresholds_are_ordered() {
    assert!(BATTERY_LOW_PERCENT < BATTERY_WARN_PERCENT);
    assert!(BATTERY_WARN_PERCENT < 100.0);
}

#[test]
fn test_debounce_is_shorter_than_a_human_press() {
    // A debounce longer than ~250ms starts eating deliberate presses
    assert!(DEBOUNCE_INTERVAL.as_millis() >= 100);
    assert!(DEBOUNCE_INTERVAL.as_millis() <= 250);
}
