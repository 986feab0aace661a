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

//! Screen/depth regions of light influence and the fragments rasterized from them.

use super::coverage::CoverageMask;
use super::dimensions::GridDimensions;

/// The screen-space rectangle and depth range a light can affect.
///
/// Screen bounds are normalized to `[0, 1]` (`y` grows downwards). Depth
/// bounds are normalized linear depth, `0` at the near plane and `1` at the
/// far plane, and may extend past either end; they are clamped when mapped
/// onto the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRegion {
    /// Left edge.
    pub x_min: f32,
    /// Top edge.
    pub y_min: f32,
    /// Right edge.
    pub x_max: f32,
    /// Bottom edge.
    pub y_max: f32,
    /// Nearest normalized depth.
    pub z_min: f32,
    /// Farthest normalized depth.
    pub z_max: f32,
}

impl ClipRegion {
    /// The zero-area region of a light that cannot affect the view.
    pub const EMPTY: Self = Self {
        x_min: 1.0,
        y_min: 1.0,
        x_max: 0.0,
        y_max: 0.0,
        z_min: 1.0,
        z_max: 0.0,
    };

    /// Returns `true` if the region covers no area or no depth.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.x_min < self.x_max && self.y_min < self.y_max && self.z_min <= self.z_max)
            || self.z_max < 0.0
            || self.z_min > 1.0
    }

    /// Maps the region onto integer sub-cell bounds of `dims`.
    ///
    /// Returns `None` for empty regions. Each bound is `floor(v * dim)`
    /// clamped to `[0, dim - 1]`.
    pub fn cluster_bounds(&self, dims: &GridDimensions) -> Option<ClusterBounds> {
        if self.is_empty() {
            return None;
        }
        let to_cell = |v: f32, dim: u32| -> u32 { ((v * dim as f32).floor().max(0.0) as u32).min(dim - 1) };
        Some(ClusterBounds {
            min: [
                to_cell(self.x_min, dims.width),
                to_cell(self.y_min, dims.height),
                to_cell(self.z_min, dims.depth),
            ],
            max: [
                to_cell(self.x_max, dims.width),
                to_cell(self.y_max, dims.height),
                to_cell(self.z_max, dims.depth),
            ],
        })
    }
}

impl Default for ClipRegion {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Inclusive integer sub-cell bounds of a light on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterBounds {
    /// Smallest sub-cell coordinate per axis (`x`, `y`, `z`).
    pub min: [u32; 3],
    /// Largest sub-cell coordinate per axis, inclusive.
    pub max: [u32; 3],
}

impl ClusterBounds {
    /// Range of cluster coordinates touched along `axis`.
    #[inline]
    pub fn cluster_range(&self, axis: usize) -> std::ops::RangeInclusive<u32> {
        (self.min[axis] / 4)..=(self.max[axis] / 4)
    }

    /// Number of clusters touched by the bounds.
    pub fn cluster_count(&self) -> usize {
        (0..3).map(|axis| self.cluster_range(axis).count()).product()
    }

    /// Bounds relative to the cluster at `(cx, cy, cz)`, clamped to `0..=3`.
    ///
    /// Returns `[(x1, x2), (y1, y2), (z1, z2)]`.
    #[inline]
    pub fn local_range(&self, cluster: [u32; 3]) -> [(u32, u32); 3] {
        let mut out = [(0, 0); 3];
        for axis in 0..3 {
            let origin = cluster[axis] * 4;
            let lo = self.min[axis].saturating_sub(origin).min(3);
            let hi = (self.max[axis] as i64 - origin as i64).clamp(0, 3) as u32;
            out[axis] = (lo, hi);
        }
        out
    }
}

/// A candidate (cluster, light) pair with its sub-cell coverage.
///
/// Fragments with an empty mask are dropped before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fragment {
    /// Index of the cluster, see [`GridDimensions::cluster_index`].
    pub cluster: u32,
    /// GPU buffer index of the light.
    pub light: u16,
    /// Sub-cells of the cluster the light touches.
    pub coverage: CoverageMask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region() {
        assert!(ClipRegion::EMPTY.is_empty());
        assert!(ClipRegion::EMPTY
            .cluster_bounds(&GridDimensions::new(4, 4, 4))
            .is_none());
    }

    #[test]
    fn test_region_behind_far_plane_is_empty() {
        let region = ClipRegion {
            x_min: 0.0,
            y_min: 0.0,
            x_max: 1.0,
            y_max: 1.0,
            z_min: 1.2,
            z_max: 1.5,
        };
        assert!(region.is_empty());
    }

    #[test]
    fn test_bounds_are_clamped() {
        let dims = GridDimensions::new(8, 8, 8);
        let region = ClipRegion {
            x_min: 0.25,
            y_min: 0.0,
            x_max: 1.0,
            y_max: 0.5,
            z_min: -0.5,
            z_max: 0.3,
        };
        let bounds = region.cluster_bounds(&dims).unwrap();
        assert_eq!(bounds.min, [2, 0, 0]);
        assert_eq!(bounds.max, [7, 4, 2]);
        assert_eq!(bounds.cluster_count(), 2 * 2 * 1);
    }

    #[test]
    fn test_local_range() {
        let bounds = ClusterBounds {
            min: [2, 5, 0],
            max: [9, 6, 3],
        };
        assert_eq!(bounds.local_range([0, 1, 0]), [(2, 3), (1, 2), (0, 3)]);
        assert_eq!(bounds.local_range([2, 1, 0]), [(0, 1), (1, 2), (0, 3)]);
        assert_eq!(bounds.local_range([1, 1, 0]), [(0, 3), (1, 2), (0, 3)]);
    }
}
