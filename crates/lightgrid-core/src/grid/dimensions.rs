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

//! Grid resolution and the index math shared by the CPU and the shading stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge length of a cluster, in sub-cells.
pub const CLUSTER_EDGE: u32 = 4;

/// Number of sub-cells in one cluster (4x4x4).
pub const SUB_CELLS_PER_CLUSTER: usize = 64;

/// Size of a single packed sub-cell header, in bytes.
pub const HEADER_SIZE: usize = 16;

/// Upper bound on the number of sub-cells a grid may hold.
pub const MAX_SUB_CELLS: u64 = 1 << 24;

/// One of the three grid axes, used for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal screen axis.
    X,
    /// Vertical screen axis.
    Y,
    /// Depth axis.
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "width"),
            Axis::Y => write!(f, "height"),
            Axis::Z => write!(f, "depth"),
        }
    }
}

/// An error produced when validating a grid resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// A dimension is zero.
    Zero {
        /// The offending axis.
        axis: Axis,
    },
    /// A dimension is not a multiple of the cluster edge (4).
    NotMultipleOfFour {
        /// The offending axis.
        axis: Axis,
        /// The rejected value.
        value: u32,
    },
    /// The grid holds more sub-cells than the packed layout can address.
    TooManySubCells {
        /// The total number of sub-cells requested.
        count: u64,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::Zero { axis } => write!(f, "Grid {axis} must be non-zero"),
            GridError::NotMultipleOfFour { axis, value } => {
                write!(f, "Grid {axis} ({value}) must be a multiple of {CLUSTER_EDGE}")
            }
            GridError::TooManySubCells { count } => {
                write!(
                    f,
                    "Grid holds {count} sub-cells, more than the {MAX_SUB_CELLS} the layout can address"
                )
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Resolution of the light grid, in sub-cell units.
///
/// Every dimension is a multiple of [`CLUSTER_EDGE`], so the grid divides
/// evenly into 4x4x4 clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDimensions {
    /// Number of sub-cells across the screen.
    pub width: u32,
    /// Number of sub-cells down the screen.
    pub height: u32,
    /// Number of depth slices.
    pub depth: u32,
}

impl GridDimensions {
    /// Validates and creates a grid resolution.
    pub fn try_new(width: u32, height: u32, depth: u32) -> Result<Self, GridError> {
        for (axis, value) in [(Axis::X, width), (Axis::Y, height), (Axis::Z, depth)] {
            if value == 0 {
                return Err(GridError::Zero { axis });
            }
            if value % CLUSTER_EDGE != 0 {
                return Err(GridError::NotMultipleOfFour { axis, value });
            }
        }
        let count = width as u64 * height as u64 * depth as u64;
        if count > MAX_SUB_CELLS {
            return Err(GridError::TooManySubCells { count });
        }
        Ok(Self {
            width,
            height,
            depth,
        })
    }

    /// Creates a grid resolution, panicking if it is invalid.
    ///
    /// # Panics
    ///
    /// Panics if any dimension is zero or not a multiple of four.
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        match Self::try_new(width, height, depth) {
            Ok(dims) => dims,
            Err(e) => panic!("invalid grid dimensions: {e}"),
        }
    }

    /// Returns `true` if every dimension is a non-zero multiple of four.
    pub fn is_valid(&self) -> bool {
        Self::try_new(self.width, self.height, self.depth).is_ok()
    }

    /// Number of clusters along each axis.
    #[inline]
    pub const fn cluster_dims(&self) -> (u32, u32, u32) {
        (
            self.width / CLUSTER_EDGE,
            self.height / CLUSTER_EDGE,
            self.depth / CLUSTER_EDGE,
        )
    }

    /// Total number of clusters.
    #[inline]
    pub const fn cluster_count(&self) -> usize {
        (self.width * self.height * self.depth) as usize / SUB_CELLS_PER_CLUSTER
    }

    /// Total number of sub-cells.
    #[inline]
    pub const fn sub_cell_count(&self) -> usize {
        (self.width * self.height * self.depth) as usize
    }

    /// Size of the fixed header region of the packed grid, in bytes.
    #[inline]
    pub const fn header_bytes(&self) -> usize {
        self.sub_cell_count() * HEADER_SIZE
    }

    /// Index of the cluster at cluster coordinates `(cx, cy, cz)`.
    #[inline]
    pub fn cluster_index(&self, cx: u32, cy: u32, cz: u32) -> usize {
        let (cw, ch, cd) = self.cluster_dims();
        debug_assert!(cx < cw && cy < ch && cz < cd, "cluster ({cx}, {cy}, {cz}) out of range");
        ((cy * cw + cx) * cd + cz) as usize
    }

    /// Inverse of [`cluster_index`](Self::cluster_index).
    #[inline]
    pub fn cluster_coords(&self, index: usize) -> (u32, u32, u32) {
        let (cw, _, cd) = self.cluster_dims();
        let index = index as u32;
        let cz = index % cd;
        let rest = index / cd;
        (rest % cw, rest / cw, cz)
    }

    /// Index of the sub-cell at `(x, y, z)`, row-major `y, x, z` with `z` fastest.
    ///
    /// This is the header address the shading stage uses.
    #[inline]
    pub fn sub_cell_index(&self, x: u32, y: u32, z: u32) -> usize {
        debug_assert!(x < self.width && y < self.height && z < self.depth);
        ((y * self.width + x) * self.depth + z) as usize
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self {
            width: 32,
            height: 16,
            depth: 64,
        }
    }
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}
