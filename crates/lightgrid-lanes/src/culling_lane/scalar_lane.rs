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

//! Reference rasterizer: one light at a time, coverage from the box table.

use super::{compute_clip_region, CoverageMaskTable, RasterLane};
use crate::grid_lane::LightGridAccumulator;
use lightgrid_core::grid::GridDimensions;
use lightgrid_core::lane::Lane;
use lightgrid_core::renderer::{CullingCamera, CullingLight};

// --- Cost Estimation Constants ---

/// Cost of solving one clip region.
const CLIP_REGION_COST: f32 = 1.0;

/// Cost per cluster visited, relative to the clip region solve.
const CLUSTER_VISIT_COST: f32 = 0.05;

/// Clusters a typical light touches.
const CLUSTERS_PER_LIGHT: f32 = 8.0;

/// Walks the clusters in each light's clip region and covers the whole
/// clamped box of sub-cells.
///
/// Coverage is the box `[x_min, x_max] × [y_min, y_max] × [z_min, z_max]`
/// cut to each cluster, so it may include sub-cells in the corners of the
/// box that the sphere does not reach. It never misses one the sphere does.
#[derive(Debug, Default, Clone)]
pub struct ScalarRasterLane {
    table: CoverageMaskTable,
}

impl ScalarRasterLane {
    /// Creates the lane and its coverage table.
    pub fn new() -> Self {
        Self {
            table: CoverageMaskTable::new(),
        }
    }

    fn rasterize_light(
        &self,
        light: &CullingLight,
        camera: &CullingCamera,
        dims: &GridDimensions,
        grid: &mut LightGridAccumulator,
    ) {
        let Some(bounds) = compute_clip_region(light, camera).cluster_bounds(dims) else {
            return;
        };
        for cy in bounds.cluster_range(1) {
            for cx in bounds.cluster_range(0) {
                for cz in bounds.cluster_range(2) {
                    let coverage = self.table.lookup(bounds.local_range([cx, cy, cz]));
                    grid.push_fragment(dims.cluster_index(cx, cy, cz), light.gpu_index, coverage);
                }
            }
        }
    }
}

impl Lane for ScalarRasterLane {
    fn strategy_name(&self) -> &'static str {
        "ScalarRaster"
    }

    fn estimate_cost(&self, light_count: usize, _dims: &GridDimensions) -> f32 {
        light_count as f32 * (CLIP_REGION_COST + CLUSTERS_PER_LIGHT * CLUSTER_VISIT_COST)
    }
}

impl RasterLane for ScalarRasterLane {
    fn rasterize(
        &self,
        lights: &[CullingLight],
        camera: &CullingCamera,
        grid: &mut LightGridAccumulator,
    ) {
        let Some(dims) = grid.dimensions() else {
            log::warn!("ScalarRasterLane: accumulator has no grid, skipping");
            return;
        };
        for light in lights {
            self.rasterize_light(light, camera, &dims, grid);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightgrid_core::grid::CoverageMask;
    use lightgrid_core::math::Vec3;

    fn camera() -> CullingCamera {
        CullingCamera {
            x_scale: 1.0,
            y_scale: 1.0,
            near: 1.0,
            far: 5.0,
        }
    }

    #[test]
    fn test_centred_light_fills_single_cluster() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 10.0, 5);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut grid);

        assert_eq!(grid.fragment_count(), 1);
        let entry = grid.cluster(0)[0];
        assert_eq!(entry.light, 5);
        assert_eq!(entry.coverage(), CoverageMask::FULL);
    }

    #[test]
    fn test_light_behind_near_plane_emits_nothing() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(16, 8, 16));
        let lights = [
            CullingLight::point(Vec3::new(0.0, 0.0, -4.0), 1.0, 0),
            CullingLight::point(Vec3::new(0.0, 0.0, 0.5), 0.25, 1),
        ];
        ScalarRasterLane::new().rasterize(&lights, &camera(), &mut grid);
        assert_eq!(grid.fragment_count(), 0);
    }

    #[test]
    fn test_disabled_light_emits_nothing() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(8, 8, 8));
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 1.0, 0).with_enabled(false);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut grid);
        assert_eq!(grid.fragment_count(), 0);
    }

    #[test]
    fn test_small_light_hits_its_own_cluster() {
        let dims = GridDimensions::new(16, 16, 16);
        let mut grid = LightGridAccumulator::with_dimensions(dims);
        // Projects to NDC (0.4, -0.4), linear depth 0.5.
        let light = CullingLight::point(Vec3::new(1.2, 1.2, 3.0), 0.05, 9);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut grid);

        assert!(grid.fragment_count() >= 1);
        // Screen (0.7, 0.3) -> sub-cell (11, 4, 8) -> cluster (2, 1, 2).
        let cluster = dims.cluster_index(2, 1, 2);
        let entry = grid
            .cluster(cluster)
            .iter()
            .find(|e| e.light == 9)
            .copied()
            .unwrap();
        assert!(entry.coverage().contains(lightgrid_core::grid::fine_index(3, 0, 0)));
        assert!(entry.coverage().count() < 64);
    }

    #[test]
    fn test_rasterize_appends() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 10.0, 1);
        let lane = ScalarRasterLane::new();
        lane.rasterize(&[light], &camera(), &mut grid);
        lane.rasterize(&[light], &camera(), &mut grid);
        assert_eq!(grid.cluster(0).len(), 2);
    }

    #[test]
    fn test_no_grid_is_a_no_op() {
        let mut grid = LightGridAccumulator::new();
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 1.0, 1);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut grid);
        assert_eq!(grid.fragment_count(), 0);
    }

    #[test]
    fn test_lane_identity() {
        let lane = ScalarRasterLane::new();
        assert_eq!(lane.strategy_name(), "ScalarRaster");
        let dims = GridDimensions::default();
        assert_eq!(lane.estimate_cost(0, &dims), 0.0);
        assert!(lane.estimate_cost(10, &dims) > lane.estimate_cost(5, &dims));
    }
}
