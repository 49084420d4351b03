// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the appliance

use std::fmt;
use std::path::PathBuf;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// A required device failed to initialize (fatal at startup)
    Device(DeviceError),
    /// Frame capture failed (transient, per tick)
    Capture(CaptureError),
    /// A stored image could not be loaded or decoded
    Decode(DecodeError),
    /// Background persistence failed
    Persist(PersistError),
    /// Battery gauge read failed
    Sensor(SensorError),
    /// Storage/filesystem errors outside the persist path
    Storage(String),
}

/// Device initialization errors
///
/// Any of these at startup aborts the program before the main loop.
#[derive(Debug, Clone)]
pub enum DeviceError {
    /// Display failed to initialize
    DisplayUnavailable(String),
    /// Camera failed to initialize
    CameraUnavailable(String),
}

/// Capture errors (logged, mode returns to Preview)
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// No frame available from the sensor
    NoFrameAvailable,
    /// Sensor mode switch failed
    ModeSwitchFailed(String),
    /// Capture failed
    CaptureFailed(String),
}

/// Stored-image decode errors (that cache lookup fails, render is skipped)
#[derive(Debug, Clone)]
pub enum DecodeError {
    /// Source file disappeared between index build and decode
    Missing(PathBuf),
    /// File exists but could not be decoded
    Undecodable(PathBuf, String),
}

/// Background persistence errors (logged, index left unchanged, no retry)
#[derive(Debug, Clone)]
pub enum PersistError {
    /// Encoding to JPEG failed
    EncodingFailed(String),
    /// Disk write failed
    WriteFailed(String),
    /// Worker task failed to report back
    WorkerGone,
}

/// Battery gauge errors (previous cached value or absent is substituted)
#[derive(Debug, Clone)]
pub enum SensorError {
    /// No gauge is present on this build
    Unavailable,
    /// The gauge is present but the read failed
    ReadFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Device(e) => write!(f, "Device error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Decode(e) => write!(f, "Decode error: {}", e),
            AppError::Persist(e) => write!(f, "Persist error: {}", e),
            AppError::Sensor(e) => write!(f, "Sensor error: {}", e),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::DisplayUnavailable(msg) => write!(f, "Display unavailable: {}", msg),
            DeviceError::CameraUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoFrameAvailable => write!(f, "No frame available"),
            CaptureError::ModeSwitchFailed(msg) => write!(f, "Mode switch failed: {}", msg),
            CaptureError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Missing(path) => write!(f, "Source file missing: {}", path.display()),
            DecodeError::Undecodable(path, msg) => {
                write!(f, "Failed to decode {}: {}", path.display(), msg)
            }
        }
    }
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            PersistError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            PersistError::WorkerGone => write!(f, "Persist worker exited before completing"),
        }
    }
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable => write!(f, "No battery gauge present"),
            SensorError::ReadFailed(msg) => write!(f, "Gauge read failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for DeviceError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for DecodeError {}
impl std::error::Error for PersistError {}
impl std::error::Error for SensorError {}

impl From<DeviceError> for AppError {
    fn from(err: DeviceError) -> Self {
        AppError::Device(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<DecodeError> for AppError {
    fn from(err: DecodeError) -> Self {
        AppError::Decode(err)
    }
}

impl From<PersistError> for AppError {
    fn from(err: PersistError) -> Self {
        AppError::Persist(err)
    }
}

impl From<SensorError> for AppError {
    fn from(err: SensorError) -> Self {
        AppError::Sensor(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        PersistError::WriteFailed(err.to_string())
    }
}
