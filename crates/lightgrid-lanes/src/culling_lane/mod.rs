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

//! Culling lane - turns lights into per-cluster fragments

use crate::grid_lane::LightGridAccumulator;
use lightgrid_core::lane::Lane;
use lightgrid_core::renderer::{CullingCamera, CullingLight};

mod clip_region;
mod coverage_table;
mod scalar_lane;
mod vectorised_lane;

pub use clip_region::*;
pub use coverage_table::*;
pub use scalar_lane::*;
pub use vectorised_lane::*;

/// A trait defining the behavior of a light rasterization lane.
///
/// Raster lanes map every enabled light onto the clusters of the grid it may
/// affect and push one fragment per touched (cluster, light) pair into a
/// [`LightGridAccumulator`]. Different implementations trade exactness of the
/// per-sub-cell coverage against throughput.
///
/// This trait lets the `CullingAgent` switch rasterizers per frame without
/// knowing which one it drives.
pub trait RasterLane: Lane {
    /// Rasterizes `lights` into `grid`.
    ///
    /// The accumulator must already be sized with
    /// [`LightGridAccumulator::reset`]; the lane only appends to it. An
    /// accumulator without a grid is left untouched.
    ///
    /// # Arguments
    ///
    /// * `lights`: Lights in culling space (`+z` in front of the camera).
    /// * `camera`: Projection terms and depth range of the view.
    /// * `grid`: The accumulator receiving the fragments.
    fn rasterize(
        &self,
        lights: &[CullingLight],
        camera: &CullingCamera,
        grid: &mut LightGridAccumulator,
    );
}
