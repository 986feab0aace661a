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

//! Lookup table from local sub-ranges of a cluster to coverage masks.

use lightgrid_core::grid::{fine_index, CoverageMask, CLUSTER_EDGE};

const EDGE: usize = CLUSTER_EDGE as usize;

/// Precomputed per-axis coverage masks of a 4×4×4 cluster.
///
/// For each axis and each inclusive range `[a, b]` on that axis, the table
/// holds the mask of every sub-cell whose coordinate on the axis lies in the
/// range. A local box is the AND of its three axis masks.
#[derive(Debug, Clone)]
pub struct CoverageMaskTable {
    masks: [[[CoverageMask; EDGE]; EDGE]; 3],
}

impl CoverageMaskTable {
    /// Builds the table by enumerating all 64 sub-cells.
    pub fn new() -> Self {
        let mut masks = [[[CoverageMask::EMPTY; EDGE]; EDGE]; 3];
        for z in 0..CLUSTER_EDGE {
            for y in 0..CLUSTER_EDGE {
                for x in 0..CLUSTER_EDGE {
                    let bit = CoverageMask::from_fine_index(fine_index(x, y, z));
                    for (axis, coord) in [x, y, z].into_iter().enumerate() {
                        for a in 0..=coord as usize {
                            for b in coord as usize..EDGE {
                                masks[axis][a][b] |= bit;
                            }
                        }
                    }
                }
            }
        }
        Self { masks }
    }

    /// Mask of the sub-cells whose `axis` coordinate lies in `[a, b]`.
    ///
    /// Empty when `a > b`.
    #[inline]
    pub fn axis_mask(&self, axis: usize, a: u32, b: u32) -> CoverageMask {
        self.masks[axis][a as usize][b as usize]
    }

    /// Coverage of the local box `[x1, x2] × [y1, y2] × [z1, z2]`.
    #[inline]
    pub fn lookup(&self, range: [(u32, u32); 3]) -> CoverageMask {
        let [(x1, x2), (y1, y2), (z1, z2)] = range;
        self.axis_mask(0, x1, x2) & self.axis_mask(1, y1, y2) & self.axis_mask(2, z1, z2)
    }
}

impl Default for CoverageMaskTable {
    fn default() -> Self {
        Self::new()
    }
}
