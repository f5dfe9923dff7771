//! Background configuration.
//!
//! [`BackgroundOptions`] holds everything the generator, animator and
//! renderer read. Options can be built in code or loaded from JSON, where
//! every field is optional:
//!
//! ```ignore
//! use topobg::BackgroundOptions;
//!
//! let options = BackgroundOptions::from_json_str(r#"{ "particle_count": 300 }"#)?;
//! assert_eq!(options.connection_distance, 180.0);
//! ```
//!
//! # Mobile profile
//!
//! Setting `is_mobile` replaces four tunables with lighter values and turns
//! off connection lines, antialiasing and mouse tracking (touch is tracked
//! instead). It also renders at no more than one pixel per logical pixel. Call [`BackgroundOptions::resolved`] to get the effective values.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Viewports at or below this logical width use the mobile profile.
pub const MOBILE_MAX_WIDTH: f64 = 768.0;

/// Configuration for the topology background.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    /// React to the pointer (mouse on desktop, touch on mobile).
    pub mouse_interaction: bool,
    /// Global multiplier on velocity, drift clock and rotation.
    pub animation_speed: f32,
    /// Number of particles in the cloud.
    pub particle_count: u32,
    /// Particles closer than this (world units) may be linked.
    pub connection_distance: f32,
    /// Hard cap on links touching any one particle.
    pub max_connections: u32,
    /// Use the mobile profile.
    pub is_mobile: bool,
    /// Switch to the mobile profile when the window is narrow.
    pub detect_mobile: bool,
    /// Fixed RNG seed. `None` picks a fresh layout every run.
    pub seed: Option<u64>,
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            mouse_interaction: true,
            animation_speed: 0.4,
            particle_count: 200,
            connection_distance: 180.0,
            max_connections: 4,
            is_mobile: false,
            detect_mobile: false,
            seed: None,
        }
    }
}

impl BackgroundOptions {
    /// Defaults with the mobile profile enabled.
    pub fn mobile() -> Self {
        Self {
            is_mobile: true,
            ..Self::default()
        }
    }

    /// Parse options from a JSON string. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Effective options after applying the mobile profile.
    ///
    /// The mobile values win over anything configured explicitly.
    pub fn resolved(&self) -> Self {
        let mut out = self.clone();
        if out.is_mobile {
            out.particle_count = 120;
            out.connection_distance = 150.0;
            out.max_connections = 3;
            out.animation_speed = 0.3;
        }
        out
    }

    /// Whether connection lines are built and drawn.
    #[inline]
    pub fn draws_connections(&self) -> bool {
        !self.is_mobile
    }

    /// MSAA sample count for the render targets.
    #[inline]
    pub fn sample_count(&self) -> u32 {
        if self.is_mobile {
            1
        } else {
            4
        }
    }

    /// Highest device pixel ratio rendered at. Denser displays get a
    /// lower-resolution frame scaled up to the window.
    #[inline]
    pub fn max_pixel_ratio(&self) -> f64 {
        if self.is_mobile {
            1.0
        } else {
            2.0
        }
    }

    /// GPU power preference for adapter selection.
    pub fn power_preference(&self) -> wgpu::PowerPreference {
        if self.is_mobile {
            wgpu::PowerPreference::LowPower
        } else {
            wgpu::PowerPreference::HighPerformance
        }
    }
}

/// Whether a viewport of the given logical width counts as mobile.
#[inline]
pub fn is_mobile_viewport(logical_width: f64) -> bool {
    logical_width <= MOBILE_MAX_WIDTH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = BackgroundOptions::default();
        assert!(opts.mouse_interaction);
        assert_eq!(opts.particle_count, 200);
        assert_eq!(opts.max_connections, 4);
        assert!((opts.animation_speed - 0.4).abs() < 1e-6);
        assert!((opts.connection_distance - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_mobile_overrides_explicit_values() {
        let opts = BackgroundOptions {
            is_mobile: true,
            particle_count: 5000,
            max_connections: 10,
            ..Default::default()
        }
        .resolved();

        assert_eq!(opts.particle_count, 120);
        assert_eq!(opts.max_connections, 3);
        assert!((opts.connection_distance - 150.0).abs() < 1e-6);
        assert!((opts.animation_speed - 0.3).abs() < 1e-6);
        assert!(!opts.draws_connections());
        assert_eq!(opts.sample_count(), 1);
    }

    #[test]
    fn test_desktop_resolve_is_identity() {
        let opts = BackgroundOptions {
            particle_count: 64,
            ..Default::default()
        };
        assert_eq!(opts.resolved(), opts);
    }

    #[test]
    fn test_partial_json() {
        let opts = BackgroundOptions::from_json_str(r#"{ "particle_count": 32, "seed": 7 }"#)
            .unwrap();
        assert_eq!(opts.particle_count, 32);
        assert_eq!(opts.seed, Some(7));
        assert_eq!(opts.max_connections, 4);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = BackgroundOptions::from_json_str("{ particle_count: }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_pixel_ratio_cap_by_profile() {
        assert_eq!(BackgroundOptions::default().max_pixel_ratio(), 2.0);
        assert_eq!(BackgroundOptions::mobile().max_pixel_ratio(), 1.0);
        assert_eq!(BackgroundOptions::mobile().resolved().max_pixel_ratio(), 1.0);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("topobg-options-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "is_mobile": true, "animation_speed": 1.5 }"#).unwrap();

        let opts = BackgroundOptions::from_json_file(&path);
        std::fs::remove_file(&path).unwrap();

        let opts = opts.unwrap();
        assert!(opts.is_mobile);
        assert!((opts.animation_speed - 1.5).abs() < 1e-6);
        assert_eq!(opts.particle_count, 200);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("topobg-no-such-dir").join("options.json");
        let err = BackgroundOptions::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_mobile_viewport_threshold() {
        assert!(is_mobile_viewport(768.0));
        assert!(is_mobile_viewport(375.0));
        assert!(!is_mobile_viewport(769.0));
    }
}
