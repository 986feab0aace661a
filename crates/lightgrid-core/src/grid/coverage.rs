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

//! Sub-cell coverage masks and the canonical fine-index mapping.
//!
//! A cluster is a 4x4x4 block of sub-cells. Its coverage by a light is a
//! 64-bit mask where bit `i` stands for the sub-cell whose *fine index* is
//! `i`. The mapping from local `(x, y, z)` to fine index is fixed here and
//! shared by every producer and consumer of masks.

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Permutation of the 4x4 `(y, x)` footprint into 16 column slots.
///
/// Neighbouring 2x2 quads share consecutive slots so that adjacent sub-cells
/// land in runs of the mask.
pub const FINE_INDEX_XY: [[u8; 4]; 4] = [[0, 1, 4, 5], [2, 3, 6, 7], [8, 9, 12, 13], [10, 11, 14, 15]];

/// Fine index of the local sub-cell `(x, y, z)`, each in `0..4`.
#[inline]
pub const fn fine_index(x: u32, y: u32, z: u32) -> u32 {
    FINE_INDEX_XY[y as usize][x as usize] as u32 * 4 + z
}

/// Local `(x, y, z)` of the sub-cell with the given fine index.
#[inline]
pub const fn fine_coords(index: u32) -> (u32, u32, u32) {
    let slot = (index / 4) as u8;
    let z = index % 4;
    let mut y = 0;
    while y < 4 {
        let mut x = 0;
        while x < 4 {
            if FINE_INDEX_XY[y][x] == slot {
                return (x as u32, y as u32, z);
            }
            x += 1;
        }
        y += 1;
    }
    panic!("fine index out of range");
}

/// The set of sub-cells of one cluster touched by a light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CoverageMask(pub u64);

impl CoverageMask {
    /// No sub-cell covered.
    pub const EMPTY: Self = Self(0);
    /// Every sub-cell covered.
    pub const FULL: Self = Self(u64::MAX);

    /// Mask with only the given fine index set.
    #[inline]
    pub const fn from_fine_index(index: u32) -> Self {
        Self(1 << index)
    }

    /// Mask with only the local sub-cell `(x, y, z)` set.
    #[inline]
    pub const fn from_local(x: u32, y: u32, z: u32) -> Self {
        Self::from_fine_index(fine_index(x, y, z))
    }

    /// Reassembles a mask from its 32-bit halves.
    #[inline]
    pub const fn from_halves(low: u32, high: u32) -> Self {
        Self((high as u64) << 32 | low as u64)
    }

    /// Returns `true` if no sub-cell is covered.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the sub-cell with the given fine index is covered.
    #[inline]
    pub const fn contains(&self, index: u32) -> bool {
        self.0 & (1 << index) != 0
    }

    /// Number of covered sub-cells.
    #[inline]
    pub const fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Bits 0..32 of the mask.
    #[inline]
    pub const fn low(&self) -> u32 {
        self.0 as u32
    }

    /// Bits 32..64 of the mask.
    #[inline]
    pub const fn high(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns `true` if every sub-cell of `self` is also in `other`.
    #[inline]
    pub const fn is_subset_of(&self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }
}

impl BitAnd for CoverageMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for CoverageMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for CoverageMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
