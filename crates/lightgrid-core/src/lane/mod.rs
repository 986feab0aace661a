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

//! # Lane Abstraction
//!
//! A **Lane** is a reusable, swappable processing strategy. The culling
//! agent holds several lanes for the same task (for example a scalar and a
//! vectorised rasterizer) and picks one per frame from their cost estimates
//! and the configured strategy.
//!
//! The hierarchy has two levels:
//!
//! 1. **`Lane`** (this trait): identity and cost estimation.
//! 2. **Domain traits** such as `RasterLane: Lane`, which add the typed
//!    execution entry point.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lightgrid_core::grid::GridDimensions;
//! use lightgrid_core::lane::Lane;
//!
//! struct MyRasterLane;
//!
//! impl Lane for MyRasterLane {
//!     fn strategy_name(&self) -> &'static str { "MyRaster" }
//!     fn estimate_cost(&self, light_count: usize, _dims: &GridDimensions) -> f32 {
//!         light_count as f32 * 2.0
//!     }
//! }
//! ```

use crate::grid::GridDimensions;
use std::fmt;

/// Error type for lane operations.
#[derive(Debug)]
pub enum LaneError {
    /// The lane or its owner has not been initialized, or was shut down.
    NotInitialized,
    /// The input handed to the lane is unusable.
    InvalidInput {
        /// What the lane expected.
        expected: &'static str,
        /// Description of what was received.
        received: String,
    },
    /// A domain-specific error occurred during execution.
    ExecutionFailed(Box<dyn std::error::Error + Send + Sync>),
    /// A domain-specific error occurred during initialization.
    InitializationFailed(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::NotInitialized => write!(f, "Lane not initialized"),
            LaneError::InvalidInput { expected, received } => {
                write!(f, "Invalid lane input: expected {expected}, got {received}")
            }
            LaneError::ExecutionFailed(e) => write!(f, "Lane execution failed: {e}"),
            LaneError::InitializationFailed(e) => write!(f, "Lane initialization failed: {e}"),
        }
    }
}

impl std::error::Error for LaneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaneError::ExecutionFailed(e) | LaneError::InitializationFailed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Base trait for all lanes.
pub trait Lane: Send + Sync {
    /// Human-readable name identifying this lane's strategy.
    ///
    /// Used for logging and selection. Should be unique among the lanes an agent holds
    /// (e.g., `"ScalarRaster"`, `"VectorisedRaster"`).
    fn strategy_name(&self) -> &'static str;

    /// Estimated cost of running this lane for `light_count` lights on `dims`.
    ///
    /// Higher values indicate more expensive strategies. The culling agent
    /// compares these estimates when its strategy is automatic. Default
    /// returns `1.0`.
    fn estimate_cost(&self, _light_count: usize, _dims: &GridDimensions) -> f32 {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ResourceError;
    use std::error::Error;

    #[test]
    fn test_error_source_is_preserved() {
        let err = LaneError::ExecutionFailed(Box::new(ResourceError::OutOfBounds));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Lane execution failed: Resource access out of bounds."
        );
        assert!(LaneError::NotInitialized.source().is_none());
    }

    struct FixedLane;

    impl Lane for FixedLane {
        fn strategy_name(&self) -> &'static str {
            "Fixed"
        }
    }

    #[test]
    fn test_default_cost_is_flat() {
        let dims = GridDimensions::default();
        assert_eq!(FixedLane.estimate_cost(0, &dims), 1.0);
        assert_eq!(FixedLane.estimate_cost(10_000, &dims), 1.0);
    }
}
