//! Error types for fbosim.
//!
//! Configuration problems that leave the system without a safe default state
//! (bad slot counts, mismatched buffer lengths) are fatal and surface as
//! [`ConfigError`]. Per-force problems are not errors at all: the offending
//! force is excluded from the compiled program with a `log::warn!`.

use std::fmt;

/// Fatal configuration errors, rejected before the first simulation pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Slot count is not a perfect square (the state store is an N x N texture).
    NotSquare(u32),
    /// A per-slot buffer does not match the slot count.
    LengthMismatch {
        /// Which buffer was mis-sized.
        buffer: &'static str,
        /// Expected length (the slot count).
        expected: usize,
        /// Actual length supplied.
        actual: usize,
    },
    /// No emitter data was provided, or it contained zero slots.
    EmptySystem,
    /// A min/max range where min exceeds max, or a non-finite bound.
    InvalidRange {
        /// Name of the offending range.
        name: &'static str,
        /// Lower bound as supplied.
        min: f32,
        /// Upper bound as supplied.
        max: f32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotSquare(n) => {
                write!(f, "Slot count {} is not a perfect square. Particle state lives in an N x N texture, so the slot count must be N squared.", n)
            }
            ConfigError::LengthMismatch { buffer, expected, actual } => {
                write!(f, "Buffer '{}' has {} entries but the system has {} slots", buffer, actual, expected)
            }
            ConfigError::EmptySystem => {
                write!(f, "No emitter data provided. Use .with_emitter() to supply spawn positions.")
            }
            ConfigError::InvalidRange { name, min, max } => {
                write!(f, "Invalid {} range: [{}, {}]", name, min, max)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that can occur during GPU initialization and readback.
#[derive(Debug)]
pub enum GpuError {
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
    /// Failed to map buffer for reading.
    BufferMapping(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
            GpuError::BufferMapping(msg) => write!(f, "Failed to map GPU buffer: {}", msg),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceCreation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur when building a particle system.
#[derive(Debug)]
pub enum SystemError {
    /// Configuration was rejected.
    Config(ConfigError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemError::Config(e) => write!(f, "Configuration error: {}", e),
            SystemError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for SystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SystemError::Config(e) => Some(e),
            SystemError::Gpu(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SystemError {
    fn from(e: ConfigError) -> Self {
        SystemError::Config(e)
    }
}

impl From<GpuError> for SystemError {
    fn from(e: GpuError) -> Self {
        SystemError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NotSquare(12);
        assert!(err.to_string().contains("12"));

        let err = ConfigError::LengthMismatch {
            buffer: "max_life",
            expected: 256,
            actual: 100,
        };
        let msg = err.to_string();
        assert!(msg.contains("max_life"));
        assert!(msg.contains("256"));
        assert!(msg.contains("100"));
    }

    #[test]
    fn test_system_error_from_config() {
        let err: SystemError = ConfigError::EmptySystem.into();
        assert!(matches!(err, SystemError::Config(ConfigError::EmptySystem)));
    }
}
