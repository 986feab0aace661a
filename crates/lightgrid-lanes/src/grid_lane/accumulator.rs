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

//! Per-cluster fragment lists.

use lightgrid_core::grid::{CoverageMask, Fragment, GridDimensions};

/// One light referenced by a cluster, with the sub-cells it covers.
///
/// The mask is kept as two 32-bit words, the same split the packer tests
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterEntry {
    /// GPU buffer index of the light.
    pub light: u16,
    /// Fine indices `0..32`.
    pub coverage_lo: u32,
    /// Fine indices `32..64`.
    pub coverage_hi: u32,
}

impl ClusterEntry {
    /// The full 64-bit coverage.
    #[inline]
    pub fn coverage(&self) -> CoverageMask {
        CoverageMask::from_halves(self.coverage_lo, self.coverage_hi)
    }

    /// Returns `true` if the sub-cell at `fine` is covered.
    #[inline]
    pub fn covers(&self, fine: u32) -> bool {
        let word = if fine < 32 {
            self.coverage_lo
        } else {
            self.coverage_hi
        };
        word & (1 << (fine % 32)) != 0
    }
}

/// Collects fragments into one growable list per cluster.
///
/// Lists are cleared between frames rather than reallocated, so a steady
/// scene stops allocating after its first frames. Pushing is not
/// synchronized; parallel producers hand their fragments back to a single
/// thread first.
#[derive(Debug, Default)]
pub struct LightGridAccumulator {
    dims: Option<GridDimensions>,
    clusters: Vec<Vec<ClusterEntry>>,
    fragment_count: usize,
}

impl LightGridAccumulator {
    /// Creates an accumulator with no grid. Call [`reset`](Self::reset) first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an accumulator sized for `dims`.
    pub fn with_dimensions(dims: GridDimensions) -> Self {
        let mut accumulator = Self::new();
        accumulator.reset(dims);
        accumulator
    }

    /// Sizes the accumulator for `dims`, leaving one empty list per cluster.
    ///
    /// Lists that survive a resize keep their capacity.
    ///
    /// # Panics
    ///
    /// Panics if a dimension is not a non-zero multiple of four.
    pub fn reset(&mut self, dims: GridDimensions) {
        assert!(dims.is_valid(), "invalid grid dimensions {dims}");
        if self.dims != Some(dims) {
            log::info!(
                "LightGridAccumulator: grid set to {} ({} clusters)",
                dims,
                dims.cluster_count()
            );
        }
        self.dims = Some(dims);
        self.clusters.resize_with(dims.cluster_count(), Vec::new);
        self.clear_all_fragments();
    }

    /// Empties every list in place.
    pub fn clear_all_fragments(&mut self) {
        for list in &mut self.clusters {
            list.clear();
        }
        self.fragment_count = 0;
    }

    /// Appends a light to a cluster's list. Empty coverage is dropped.
    ///
    /// # Panics
    ///
    /// Panics if `cluster` is out of range.
    #[inline]
    pub fn push_fragment(&mut self, cluster: usize, light: u16, coverage: CoverageMask) {
        if coverage.is_empty() {
            return;
        }
        self.clusters[cluster].push(ClusterEntry {
            light,
            coverage_lo: coverage.low(),
            coverage_hi: coverage.high(),
        });
        self.fragment_count += 1;
    }

    /// Pushes a batch of fragments in iteration order.
    pub fn push_fragments<I>(&mut self, fragments: I)
    where
        I: IntoIterator<Item = Fragment>,
    {
        for fragment in fragments {
            self.push_fragment(fragment.cluster as usize, fragment.light, fragment.coverage);
        }
    }

    /// The grid this accumulator is sized for.
    pub fn dimensions(&self) -> Option<GridDimensions> {
        self.dims
    }

    /// Number of cluster lists.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Entries of one cluster, in push order.
    pub fn cluster(&self, index: usize) -> &[ClusterEntry] {
        &self.clusters[index]
    }

    /// All cluster lists, indexed by cluster index.
    pub fn clusters(&self) -> impl ExactSizeIterator<Item = &[ClusterEntry]> {
        self.clusters.iter().map(Vec::as_slice)
    }

    /// Fragments stored since the last clear.
    pub fn fragment_count(&self) -> usize {
        self.fragment_count
    }

    /// Allocated capacity of one cluster's list.
    pub fn capacity_of(&self, index: usize) -> usize {
        self.clusters[index].capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_sizes_lists() {
        let acc = LightGridAccumulator::with_dimensions(GridDimensions::new(8, 8, 16));
        assert_eq!(acc.cluster_count(), 2 * 2 * 4);
        assert!(acc.clusters().all(|list| list.is_empty()));
        assert_eq!(acc.dimensions(), Some(GridDimensions::new(8, 8, 16)));
    }

    #[test]
    fn test_empty_coverage_is_dropped() {
        let mut acc = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        acc.push_fragment(0, 3, CoverageMask::EMPTY);
        assert_eq!(acc.fragment_count(), 0);
        assert!(acc.cluster(0).is_empty());
    }

    #[test]
    fn test_push_splits_mask() {
        let mut acc = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        let mask = CoverageMask(0x8000_0001_0000_0002);
        acc.push_fragment(0, 9, mask);
        let entry = acc.cluster(0)[0];
        assert_eq!(entry.coverage_lo, 0x0000_0002);
        assert_eq!(entry.coverage_hi, 0x8000_0001);
        assert_eq!(entry.coverage(), mask);
        assert!(entry.covers(1));
        assert!(entry.covers(32));
        assert!(entry.covers(63));
        assert!(!entry.covers(0));
    }

    #[test]
    fn test_clear_is_idempotent_and_keeps_capacity() {
        let mut acc = LightGridAccumulator::with_dimensions(GridDimensions::new(8, 4, 4));
        for light in 0..10 {
            acc.push_fragment(1, light, CoverageMask::FULL);
        }
        let capacity = acc.capacity_of(1);
        assert!(capacity >= 10);

        acc.clear_all_fragments();
        acc.clear_all_fragments();

        assert!(acc.clusters().all(|list| list.is_empty()));
        assert_eq!(acc.capacity_of(1), capacity);
        assert_eq!(acc.fragment_count(), 0);
    }

    #[test]
    fn test_push_fragments_keeps_order() {
        let mut acc = LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4));
        acc.push_fragments((0..3u16).rev().map(|light| Fragment {
            cluster: 0,
            light,
            coverage: CoverageMask::from_fine_index(light as u32),
        }));
        let lights: Vec<u16> = acc.cluster(0).iter().map(|e| e.light).collect();
        assert_eq!(lights, vec![2, 1, 0]);
    }

    #[test]
    #[should_panic(expected = "invalid grid dimensions")]
    fn test_reset_rejects_invalid_dimensions() {
        let mut acc = LightGridAccumulator::new();
        acc.reset(GridDimensions {
            width: 6,
            height: 4,
            depth: 4,
        });
    }
}
