//! Error types for topobg.
//!
//! This module provides error types for GPU initialization, option loading,
//! and running the background window.

use std::fmt;

/// Errors that can occur during GPU initialization.
#[derive(Debug)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    NoAdapter,
    /// Failed to create GPU device.
    DeviceCreation(wgpu::RequestDeviceError),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::SurfaceCreation(e) => write!(f, "Failed to create GPU surface: {}", e),
            GpuError::NoAdapter => write!(f, "No compatible GPU adapter found. Ensure your system has a GPU with Vulkan/Metal/DX12 support."),
            GpuError::DeviceCreation(e) => write!(f, "Failed to create GPU device: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::SurfaceCreation(e) => Some(e),
            GpuError::DeviceCreation(e) => Some(e),
            GpuError::NoAdapter => None,
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::SurfaceCreation(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::DeviceCreation(e)
    }
}

/// Errors that can occur while loading [`BackgroundOptions`](crate::BackgroundOptions).
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the options file.
    Io(std::io::Error),
    /// The options file is not valid JSON for the options schema.
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read options file: {}", e),
            ConfigError::Json(e) => write!(f, "Invalid options JSON: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e)
    }
}

/// Errors that can occur when running the background.
#[derive(Debug)]
pub enum BackgroundError {
    /// Failed to create or run the event loop.
    EventLoop(winit::error::EventLoopError),
    /// Failed to create window.
    Window(winit::error::OsError),
    /// GPU initialization failed.
    Gpu(GpuError),
}

impl fmt::Display for BackgroundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundError::EventLoop(e) => write!(f, "Event loop error: {}", e),
            BackgroundError::Window(e) => write!(f, "Failed to create window: {}", e),
            BackgroundError::Gpu(e) => write!(f, "GPU error: {}", e),
        }
    }
}

impl std::error::Error for BackgroundError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackgroundError::EventLoop(e) => Some(e),
            BackgroundError::Window(e) => Some(e),
            BackgroundError::Gpu(e) => Some(e),
        }
    }
}

impl From<winit::error::EventLoopError> for BackgroundError {
    fn from(e: winit::error::EventLoopError) -> Self {
        BackgroundError::EventLoop(e)
    }
}

impl From<winit::error::OsError> for BackgroundError {
    fn from(e: winit::error::OsError) -> Self {
        BackgroundError::Window(e)
    }
}

impl From<GpuError> for BackgroundError {
    fn from(e: GpuError) -> Self {
        BackgroundError::Gpu(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = ConfigError::from(io);
        assert!(err.to_string().contains("missing"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_no_adapter_has_no_source() {
        let err = BackgroundError::from(GpuError::NoAdapter);
        assert!(err.to_string().starts_with("GPU error"));
        let inner = err.source().expect("gpu error is the source");
        assert!(inner.source().is_none());
    }
}
