// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Grid resolution and rasterizer selection.
//!
//! A [`GridConfig`] is usually written by hand in RON:
//!
//! ```text
//! (
//!     width: 32,
//!     height: 16,
//!     depth: 64,
//!     strategy: Auto,
//!     auto_vectorise_threshold: 64,
//! )
//! ```
//!
//! Missing fields fall back to [`GridConfig::new`].

use lightgrid_core::grid::{GridDimensions, GridError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`GridConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The RON text could not be parsed.
    #[error("Failed to parse grid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// The config could not be written as RON.
    #[error("Failed to serialize grid config: {0}")]
    Serialize(#[from] ron::Error),

    /// The grid resolution is unusable.
    #[error("Invalid grid resolution: {0}")]
    Grid(#[from] GridError),

    /// `auto_vectorise_threshold` is zero.
    #[error("auto_vectorise_threshold must be at least 1")]
    ZeroThreshold,
}

/// Which rasterizer lane the culling agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RasterStrategy {
    /// Always the scalar lane.
    Scalar,
    /// Always the vectorised lane.
    Vectorised,
    /// Scalar for small light counts, vectorised above the threshold.
    #[default]
    Auto,
}

/// Configuration of the clustered light grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Sub-cells across the screen. Multiple of 4.
    pub width: u32,
    /// Sub-cells down the screen. Multiple of 4.
    pub height: u32,
    /// Depth slices between near and far. Multiple of 4.
    pub depth: u32,
    /// Rasterizer selection.
    pub strategy: RasterStrategy,
    /// Light count above which [`RasterStrategy::Auto`] picks the vectorised lane.
    pub auto_vectorise_threshold: usize,
    /// Initial size of each upload buffer, in bytes.
    pub initial_capacity_bytes: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GridConfig {
    /// Creates a configuration with default values (`32×16×64`, automatic strategy).
    pub const fn new() -> Self {
        Self {
            width: 32,
            height: 16,
            depth: 64,
            strategy: RasterStrategy::Auto,
            auto_vectorise_threshold: 64,
            initial_capacity_bytes: 64 * 1024,
        }
    }

    /// Creates a configuration for dense scenes with many small lights.
    pub const fn high_density() -> Self {
        Self {
            width: 64,
            height: 32,
            depth: 128,
            strategy: RasterStrategy::Auto,
            auto_vectorise_threshold: 32,
            initial_capacity_bytes: 1024 * 1024,
        }
    }

    /// Creates a configuration optimized for low overhead.
    pub const fn low_overhead() -> Self {
        Self {
            width: 16,
            height: 8,
            depth: 32,
            strategy: RasterStrategy::Scalar,
            auto_vectorise_threshold: 64,
            initial_capacity_bytes: 16 * 1024,
        }
    }

    /// Parses and validates a RON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed text, and the
    /// [`validate`](Self::validate) errors otherwise.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().indentor("    ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Checks the grid resolution and the auto threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dimensions()?;
        if self.auto_vectorise_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }

    /// The validated grid resolution.
    pub fn dimensions(&self) -> Result<GridDimensions, GridError> {
        GridDimensions::try_new(self.width, self.height, self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GridConfig::default();
        assert_eq!(config, GridConfig::new());
        assert_eq!(config.dimensions().unwrap(), GridDimensions::new(32, 16, 64));
        assert_eq!(config.strategy, RasterStrategy::Auto);
        assert_eq!(config.auto_vectorise_threshold, 64);
    }

    #[test]
    fn test_presets_are_valid() {
        for config in [
            GridConfig::new(),
            GridConfig::high_density(),
            GridConfig::low_overhead(),
        ] {
            assert!(config.validate().is_ok(), "{config:?}");
        }
        assert_eq!(
            GridConfig::high_density().dimensions().unwrap(),
            GridDimensions::new(64, 32, 128)
        );
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = GridConfig::from_ron_str("(width: 16, strategy: Vectorised)").unwrap();
        assert_eq!(config.width, 16);
        assert_eq!(config.height, 16);
        assert_eq!(config.depth, 64);
        assert_eq!(config.strategy, RasterStrategy::Vectorised);
    }

    #[test]
    fn test_ron_round_trip() {
        let text = GridConfig::low_overhead().to_ron_string().unwrap();
        assert_eq!(GridConfig::from_ron_str(&text).unwrap(), GridConfig::low_overhead());
    }

    #[test]
    fn test_bad_dimensions_rejected() {
        let err = GridConfig::from_ron_str("(width: 30)").unwrap_err();
        assert!(matches!(err, ConfigError::Grid(_)), "{err}");
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = GridConfig::from_ron_str("(auto_vectorise_threshold: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::ZeroThreshold));
    }

    #[test]
    fn test_malformed_ron_rejected() {
        let err = GridConfig::from_ron_str("(width: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
