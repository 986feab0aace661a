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

//! Data-parallel rasterizer.
//!
//! Runs in two fork-join phases on the rayon pool:
//!
//! 1. **Coarse**: one task per light computes its clamped sub-cell bounds.
//! 2. **Fine**: the bounds are expanded into a flat list of (light, cluster)
//!    candidates, and one task per candidate measures how far each sub-cell
//!    of the cluster lies from the light sphere.
//!
//! Tasks only read shared inputs and write their own output slot. The
//! candidates become [`Fragment`]s that are pushed into the accumulator on
//! the calling thread after the second join, in candidate order.

use super::{compute_clip_region, RasterLane};
use crate::grid_lane::LightGridAccumulator;
use lightgrid_core::grid::{ClusterBounds, CoverageMask, Fragment, GridDimensions, CLUSTER_EDGE};
use lightgrid_core::lane::Lane;
use lightgrid_core::renderer::{CullingCamera, CullingLight};
use rayon::prelude::*;
use std::sync::Mutex;

// --- Cost Estimation Constants ---

/// Fixed cost of forking and joining the two parallel phases.
const DISPATCH_OVERHEAD: f32 = 32.0;

/// Per-light cost once the work is spread over the pool.
const PARALLEL_LIGHT_COST: f32 = 0.9;

/// A (light, cluster) pair awaiting its fine coverage test.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    light: u32,
    bounds: ClusterBounds,
    cluster: [u32; 3],
    coverage: CoverageMask,
}

/// Rasterizes lights with a parallel coarse pass over lights and a parallel
/// fine pass over (light, cluster) candidates.
///
/// Each sub-cell is bounded by two screen slabs and one depth slab. Per axis,
/// the light centre's distance to the nearest outward bounding plane is
/// taken, or zero when the slab straddles the light. The squared distances
/// are normalised by the squared plane normals and summed, and the sub-cell
/// is covered unless the sum exceeds the squared radius. Sub-cells in the
/// corners of the light's box that the sphere cannot reach are dropped.
///
/// Only sub-cells inside the light's clamped bounds are tested, so the
/// coverage is always a subset of what [`ScalarRasterLane`] reports for the
/// same light and cluster.
///
/// [`ScalarRasterLane`]: super::ScalarRasterLane
#[derive(Debug, Default)]
pub struct VectorisedRasterLane {
    candidates: Mutex<Vec<Candidate>>,
}

impl VectorisedRasterLane {
    /// Creates the lane with an empty candidate buffer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Lane for VectorisedRasterLane {
    fn strategy_name(&self) -> &'static str {
        "VectorisedRaster"
    }

    fn estimate_cost(&self, light_count: usize, _dims: &GridDimensions) -> f32 {
        DISPATCH_OVERHEAD + light_count as f32 * PARALLEL_LIGHT_COST
    }
}

impl RasterLane for VectorisedRasterLane {
    fn rasterize(
        &self,
        lights: &[CullingLight],
        camera: &CullingCamera,
        grid: &mut LightGridAccumulator,
    ) {
        let Some(dims) = grid.dimensions() else {
            log::warn!("VectorisedRasterLane: accumulator has no grid, skipping");
            return;
        };

        // Coarse phase.
        let bounds: Vec<Option<ClusterBounds>> = lights
            .par_iter()
            .map(|light| compute_clip_region(light, camera).cluster_bounds(&dims))
            .collect();

        let mut candidates = self.candidates.lock().unwrap_or_else(|e| e.into_inner());
        candidates.clear();
        for (light, bounds) in bounds.iter().enumerate() {
            let Some(bounds) = *bounds else { continue };
            for cy in bounds.cluster_range(1) {
                for cx in bounds.cluster_range(0) {
                    for cz in bounds.cluster_range(2) {
                        candidates.push(Candidate {
                            light: light as u32,
                            bounds,
                            cluster: [cx, cy, cz],
                            coverage: CoverageMask::EMPTY,
                        });
                    }
                }
            }
        }

        // Fine phase.
        candidates.par_iter_mut().for_each(|candidate| {
            candidate.coverage =
                fine_coverage(&lights[candidate.light as usize], candidate, camera, &dims);
        });

        grid.push_fragments(candidates.iter().map(|candidate| {
            let [cx, cy, cz] = candidate.cluster;
            Fragment {
                cluster: dims.cluster_index(cx, cy, cz) as u32,
                light: lights[candidate.light as usize].gpu_index,
                coverage: candidate.coverage,
            }
        }));
        log::trace!(
            "VectorisedRasterLane: {} lights, {} candidates",
            lights.len(),
            candidates.len()
        );
    }
}

/// Per-sub-cell coverage of one candidate.
fn fine_coverage(
    light: &CullingLight,
    candidate: &Candidate,
    camera: &CullingCamera,
    dims: &GridDimensions,
) -> CoverageMask {
    let p = light.position;
    let r_sq = light.radius * light.radius;
    let [(x1, x2), (y1, y2), (z1, z2)] = candidate.bounds.local_range(candidate.cluster);
    let origin = candidate.cluster.map(|c| c * CLUSTER_EDGE);

    let columns = slab_distances(x1, x2, |i| {
        screen_slab_distance_sq(origin[0] + i, dims.width, p.x, p.z, camera.x_scale)
    });
    let rows = slab_distances(y1, y2, |i| {
        screen_slab_distance_sq(origin[1] + i, dims.height, -p.y, p.z, camera.y_scale)
    });
    let slices = slab_distances(z1, z2, |i| {
        depth_slab_distance_sq(origin[2] + i, dims.depth, p.z, camera)
    });

    let mut mask = CoverageMask::EMPTY;
    for y in y1..=y2 {
        for x in x1..=x2 {
            let screen = rows[y as usize] + columns[x as usize];
            if screen > r_sq {
                continue;
            }
            for z in z1..=z2 {
                if screen + slices[z as usize] <= r_sq {
                    mask |= CoverageMask::from_local(x, y, z);
                }
            }
        }
    }
    mask
}

/// Squared distances of the local slabs in `[lo, hi]`; infinite outside.
#[inline]
fn slab_distances(lo: u32, hi: u32, mut distance_sq: impl FnMut(u32) -> f32) -> [f32; 4] {
    let mut out = [f32::INFINITY; CLUSTER_EDGE as usize];
    for i in lo..=hi {
        out[i as usize] = distance_sq(i);
    }
    out
}

/// Squared distance from the light centre to screen slab `index` (of
/// `count`), zero if the centre lies between its bounding planes.
///
/// The slab spans `[u0, u1]` in NDC. Its planes through the eye have
/// unnormalised outward normals `(-scale, u0)` and `(scale, -u1)` in the
/// `(c, z)` plane, so `d / |n|` is the distance to each plane.
fn screen_slab_distance_sq(index: u32, count: u32, lc: f32, lz: f32, scale: f32) -> f32 {
    let u0 = 2.0 * index as f32 / count as f32 - 1.0;
    let u1 = 2.0 * (index + 1) as f32 / count as f32 - 1.0;
    let s_sq = scale * scale;

    let d0 = u0 * lz - scale * lc;
    let d1 = scale * lc - u1 * lz;
    let below = if d0 > 0.0 { d0 * d0 / (s_sq + u0 * u0) } else { 0.0 };
    let above = if d1 > 0.0 { d1 * d1 / (s_sq + u1 * u1) } else { 0.0 };
    below.max(above)
}

/// Squared distance from the light centre to depth slice `index` (of
/// `count`), zero if the centre lies inside the slice.
fn depth_slab_distance_sq(index: u32, count: u32, lz: f32, camera: &CullingCamera) -> f32 {
    let step = camera.depth_range() / count as f32;
    let z0 = camera.near + index as f32 * step;
    let z1 = z0 + step;
    let d = (z0 - lz).max(lz - z1).max(0.0);
    d * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culling_lane::ScalarRasterLane;
    use approx::assert_relative_eq;
    use lightgrid_core::grid::fine_index;
    use lightgrid_core::math::Vec3;

    fn camera() -> CullingCamera {
        CullingCamera {
            x_scale: 1.0,
            y_scale: 1.0,
            near: 1.0,
            far: 5.0,
        }
    }

    fn light_field() -> Vec<CullingLight> {
        let mut lights = Vec::new();
        for i in 0..40u16 {
            let t = i as f32;
            let position = Vec3::new((t * 0.37).sin() * 2.0, (t * 0.71).cos() * 1.5, 1.5 + (t * 0.53) % 3.0);
            lights.push(CullingLight::point(position, 0.2 + (t * 0.13) % 0.8, i));
        }
        lights
    }

    #[test]
    fn test_centred_light_fills_single_cluster() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 10.0, 2);
        VectorisedRasterLane::new().rasterize(&[light], &camera(), &mut grid);
        assert_eq!(grid.fragment_count(), 1);
        assert_eq!(grid.cluster(0)[0].coverage(), CoverageMask::FULL);
    }

    #[test]
    fn test_sub_cell_of_light_centre_is_covered() {
        let dims = GridDimensions::new(16, 16, 16);
        let mut grid = LightGridAccumulator::with_dimensions(dims);
        let light = CullingLight::point(Vec3::new(1.2, 1.2, 3.0), 0.05, 9);
        VectorisedRasterLane::new().rasterize(&[light], &camera(), &mut grid);

        let entry = grid.cluster(dims.cluster_index(2, 1, 2))[0];
        assert_eq!(entry.light, 9);
        assert!(entry.coverage().contains(fine_index(3, 0, 0)));
    }

    #[test]
    fn test_coverage_is_subset_of_scalar() {
        let dims = GridDimensions::new(16, 8, 16);
        let lights = light_field();

        let mut scalar = LightGridAccumulator::with_dimensions(dims);
        ScalarRasterLane::new().rasterize(&lights, &camera(), &mut scalar);
        let mut vectorised = LightGridAccumulator::with_dimensions(dims);
        VectorisedRasterLane::new().rasterize(&lights, &camera(), &mut vectorised);

        assert!(vectorised.fragment_count() > 0);
        assert!(vectorised.fragment_count() <= scalar.fragment_count());
        for cluster in 0..dims.cluster_count() {
            for entry in vectorised.cluster(cluster) {
                let reference = scalar
                    .cluster(cluster)
                    .iter()
                    .find(|e| e.light == entry.light)
                    .unwrap_or_else(|| panic!("light {} missing from scalar cluster {cluster}", entry.light));
                assert!(entry.coverage().is_subset_of(reference.coverage()));
            }
        }
    }

    #[test]
    fn test_light_behind_camera_emits_nothing() {
        let mut grid = LightGridAccumulator::with_dimensions(GridDimensions::new(8, 8, 8));
        let lights = [
            CullingLight::point(Vec3::new(0.0, 0.0, -3.0), 1.0, 0),
            CullingLight::point(Vec3::new(0.5, 0.0, 3.0), 1.0, 1).with_enabled(false),
        ];
        VectorisedRasterLane::new().rasterize(&lights, &camera(), &mut grid);
        assert_eq!(grid.fragment_count(), 0);
    }

    #[test]
    fn test_output_is_deterministic() {
        let dims = GridDimensions::new(16, 8, 16);
        let lights = light_field();
        let lane = VectorisedRasterLane::new();

        let mut first = LightGridAccumulator::with_dimensions(dims);
        lane.rasterize(&lights, &camera(), &mut first);
        let mut second = LightGridAccumulator::with_dimensions(dims);
        lane.rasterize(&lights, &camera(), &mut second);

        for cluster in 0..dims.cluster_count() {
            assert_eq!(first.cluster(cluster), second.cluster(cluster));
        }
    }

    #[test]
    fn test_screen_slab_distance() {
        // Light straight ahead at z = 10 straddles the two centre slabs.
        assert_eq!(screen_slab_distance_sq(1, 4, 0.0, 10.0, 1.0), 0.0);
        assert_eq!(screen_slab_distance_sq(2, 4, 0.0, 10.0, 1.0), 0.0);
        // Edge slabs are 5 / sqrt(1.25) away, on either side.
        assert_relative_eq!(screen_slab_distance_sq(0, 4, 0.0, 10.0, 1.0), 20.0, epsilon = 1e-4);
        assert_relative_eq!(screen_slab_distance_sq(3, 4, 0.0, 10.0, 1.0), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_depth_slab_distance() {
        let camera = camera();
        // Slices of one unit each; a light at 2.5 sits inside slice 1.
        assert_relative_eq!(depth_slab_distance_sq(0, 4, 2.5, &camera), 0.25, epsilon = 1e-6);
        assert_eq!(depth_slab_distance_sq(1, 4, 2.5, &camera), 0.0);
        assert_relative_eq!(depth_slab_distance_sq(2, 4, 2.5, &camera), 0.25, epsilon = 1e-6);
        assert_relative_eq!(depth_slab_distance_sq(3, 4, 2.5, &camera), 2.25, epsilon = 1e-6);
    }

    #[test]
    fn test_box_corners_outside_sphere_are_dropped() {
        // Light at z = 3 with radius 1.5 spans sub-cells 3..=12 on x and y and
        // 2..=14 in depth. Sub-cell (3, 3, 2) is a corner of that box: each
        // axis alone is within the radius, but not all three together.
        let dims = GridDimensions::new(16, 16, 16);
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 1.5, 4);

        let mut scalar = LightGridAccumulator::with_dimensions(dims);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut scalar);
        let mut vectorised = LightGridAccumulator::with_dimensions(dims);
        VectorisedRasterLane::new().rasterize(&[light], &camera(), &mut vectorised);

        let corner = dims.cluster_index(0, 0, 0);
        assert!(scalar.cluster(corner)[0].coverage().contains(fine_index(3, 3, 2)));
        assert!(vectorised
            .cluster(corner)
            .iter()
            .all(|entry| !entry.coverage().contains(fine_index(3, 3, 2))));

        // (3, 8, 8) is only off-centre on x, by less than the radius.
        let side = vectorised.cluster(dims.cluster_index(0, 2, 2));
        assert_eq!(side.len(), 1);
        assert!(side[0].coverage().contains(fine_index(3, 0, 0)));
    }

    #[test]
    fn test_covers_fewer_sub_cells_than_box() {
        let dims = GridDimensions::new(16, 16, 16);
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 3.0), 1.5, 0);

        let mut scalar = LightGridAccumulator::with_dimensions(dims);
        ScalarRasterLane::new().rasterize(&[light], &camera(), &mut scalar);
        let mut vectorised = LightGridAccumulator::with_dimensions(dims);
        VectorisedRasterLane::new().rasterize(&[light], &camera(), &mut vectorised);

        let covered = |grid: &LightGridAccumulator| -> u32 {
            grid.clusters()
                .flatten()
                .map(|entry| entry.coverage().count())
                .sum()
        };
        // The box is 10 x 10 x 13 sub-cells.
        assert_eq!(covered(&scalar), 10 * 10 * 13);
        assert!(covered(&vectorised) < covered(&scalar));
        assert!(covered(&vectorised) > 0);
    }

    #[test]
    fn test_cost_favours_scalar_for_few_lights() {
        let dims = GridDimensions::default();
        let scalar = ScalarRasterLane::new();
        let vectorised = VectorisedRasterLane::new();
        assert!(scalar.estimate_cost(4, &dims) < vectorised.estimate_cost(4, &dims));
        assert!(scalar.estimate_cost(1000, &dims) > vectorised.estimate_cost(1000, &dims));
    }
}
