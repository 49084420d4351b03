// SPDX-License-Identifier: GPL-3.0-only

//! Time-cached battery percentage
//!
//! The gauge is polled at most once per refresh interval; between polls the
//! cached reading is returned unchanged. A failed read keeps the previous
//! value (absent if there never was one) and still advances the sample
//! clock, so a dead sensor is re-probed once per interval rather than every
//! tick.

use crate::config::Config;
use crate::devices::PowerGauge;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct BatteryMonitor {
    /// None when the appliance has no gauge; the overlay stays empty
    gauge: Option<Box<dyn PowerGauge>>,
    refresh_interval: Duration,
    v_empty: f32,
    v_full: f32,
    last_percent: Option<f32>,
    last_sample: Option<Instant>,
}

impl BatteryMonitor {
    pub fn new(gauge: Option<Box<dyn PowerGauge>>, config: &Config) -> Self {
        Self {
            gauge,
            refresh_interval: config.gauge_refresh(),
            v_empty: config.voltage_empty,
            v_full: config.voltage_full,
            last_percent: None,
            last_sample: None,
        }
    }

    /// Battery percentage in [0, 100], or None while unavailable
    ///
    /// Two calls within the refresh interval return the identical value
    /// even if the underlying voltage changed in between.
    pub fn percentage(&mut self, now: Instant) -> Option<f32> {
        if let Some(last) = self.last_sample {
            if now.saturating_duration_since(last) < self.refresh_interval {
                return self.last_percent;
            }
        }
        let Some(gauge) = self.gauge.as_mut() else {
            return self.last_percent;
        };
        self.last_sample = Some(now);
        match gauge.read_voltage() {
            Ok(volts) if self.v_full > self.v_empty => {
                let percent = ((volts - self.v_empty) / (self.v_full - self.v_empty) * 100.0)
                    .clamp(0.0, 100.0);
                self.last_percent = Some(percent);
                debug!(volts, percent, "Battery reading updated");
            }
            Ok(volts) => {
                warn!(volts, "Ignoring reading, voltage calibration range is empty");
            }
            Err(e) => {
                warn!(error = %e, "Failed to read battery gauge");
            }
        }
        self.last_percent
    }
}
