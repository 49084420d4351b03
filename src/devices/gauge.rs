// SPDX-License-Identifier: GPL-3.0-only

//! Battery voltage from a sysfs `power_supply` attribute file

use crate::devices::PowerGauge;
use crate::errors::SensorError;
use std::path::PathBuf;
use tracing::info;

/// Reads the pack voltage from a kernel-exported attribute file
/// (e.g. `/sys/class/power_supply/battery/voltage_now`)
pub struct SysfsGauge {
    path: PathBuf,
}

impl SysfsGauge {
    pub fn new(path: PathBuf) -> Self {
        info!(path = %path.display(), "Using sysfs battery gauge");
        Self { path }
    }
}

impl PowerGauge for SysfsGauge {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = std::fs::read_to_string(&self.path)
            .map_err(|e| SensorError::ReadFailed(e.to_string()))?;
        let value: f32 = raw
            .trim()
            .parse()
            .map_err(|_| SensorError::ReadFailed(format!("unparsable reading {:?}", raw.trim())))?;
        // power_supply exports microvolts; anything implausibly large for a
        // volt reading is treated as one
        if value > 1000.0 {
            Ok(value / 1_000_000.0)
        } else {
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn microvolt_readings_are_scaled() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "3700000").unwrap();
        let mut gauge = SysfsGauge::new(file.path().to_path_buf());
        let volts = gauge.read_voltage().unwrap();
        assert!((volts - 3.7).abs() < 1e-3);
    }

    #[test]
    fn volt_readings_pass_through() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "3.85").unwrap();
        let mut gauge = SysfsGauge::new(file.path().to_path_buf());
        let volts = gauge.read_voltage().unwrap();
        assert!((volts - 3.85).abs() < 1e-3);
    }

    #[test]
    fn missing_file_is_a_read_failure() {
        let mut gauge = SysfsGauge::new(PathBuf::from("/nonexistent/voltage_now"));
        assert!(matches!(
            gauge.read_voltage(),
            Err(SensorError::ReadFailed(_))
        ));
    }
}
