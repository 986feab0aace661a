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

//! Binary layout of the packed light grid read by the shading stage.
//!
//! # Memory Layout
//!
//! ```text
//! [GridHeader; width * height * depth]   16 bytes each, (y * width + x) * depth + z
//! [u16; ...]                             tail of light indices, 16-byte aligned runs
//! ```
//!
//! A header packs `(tail_byte_offset / 16) << 8 | tail_length` into its first
//! word. The remaining three words hold copies of the last six entries of the
//! run so that short lists can be read without touching the tail.

use bytemuck::{Pod, Zeroable};

/// Alignment of every tail run, in bytes. Offsets are stored in these units.
pub const TAIL_ALIGNMENT: usize = 16;

/// Maximum number of lights a single sub-cell may reference.
pub const MAX_LIGHTS_PER_SUB_CELL: usize = 255;

/// Exclusive upper bound of a tail offset in [`TAIL_ALIGNMENT`] units.
pub const MAX_TAIL_UNITS: usize = 1 << 24;

/// Number of light indices mirrored into a header.
pub const INLINE_LIGHTS: usize = 6;

/// The per-sub-cell header of the packed grid.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct GridHeader {
    /// `(tail_byte_offset / 16) << 8 | tail_length`.
    pub offset_and_length: u32,
    /// The last six tail entries, two per word, first of each pair in the high half.
    pub inline: [u32; 3],
}

impl GridHeader {
    /// Header of a sub-cell no light touches.
    pub const EMPTY: Self = Self {
        offset_and_length: 0,
        inline: [0; 3],
    };

    /// Builds the header of a run of `lights` stored at `tail_byte_offset`.
    ///
    /// # Panics
    ///
    /// Panics if the run holds more than [`MAX_LIGHTS_PER_SUB_CELL`] lights,
    /// if the offset is not aligned, or if it is beyond the addressable range.
    pub fn new(tail_byte_offset: usize, lights: &[u16]) -> Self {
        let length = lights.len();
        assert!(
            length <= MAX_LIGHTS_PER_SUB_CELL,
            "sub-cell references {length} lights, at most {MAX_LIGHTS_PER_SUB_CELL} fit in a header"
        );
        assert_eq!(tail_byte_offset % TAIL_ALIGNMENT, 0, "unaligned tail offset");
        let units = tail_byte_offset / TAIL_ALIGNMENT;
        assert!(units < MAX_TAIL_UNITS, "tail offset {tail_byte_offset} out of range");

        let mut last = [0u16; INLINE_LIGHTS];
        let start = length.saturating_sub(INLINE_LIGHTS);
        last[..length - start].copy_from_slice(&lights[start..]);

        let mut inline = [0u32; 3];
        for (word, pair) in inline.iter_mut().zip(last.chunks_exact(2)) {
            *word = (pair[0] as u32) << 16 | pair[1] as u32;
        }

        Self {
            offset_and_length: (units as u32) << 8 | length as u32,
            inline,
        }
    }

    /// Number of lights in the run.
    #[inline]
    pub const fn length(&self) -> usize {
        (self.offset_and_length & 0xFF) as usize
    }

    /// Byte offset of the run from the start of the buffer.
    #[inline]
    pub const fn tail_byte_offset(&self) -> usize {
        (self.offset_and_length >> 8) as usize * TAIL_ALIGNMENT
    }

    /// Light indices mirrored into the header, in list order.
    pub fn inline_lights(&self) -> impl Iterator<Item = u16> + '_ {
        let count = self.length().min(INLINE_LIGHTS);
        self.inline
            .iter()
            .flat_map(|word| [(word >> 16) as u16, *word as u16])
            .take(count)
    }
}

/// Rounds a byte count up to [`TAIL_ALIGNMENT`].
#[inline]
pub const fn align_tail(bytes: usize) -> usize {
    (bytes + TAIL_ALIGNMENT - 1) & !(TAIL_ALIGNMENT - 1)
}

/// Read-only view over a packed grid, as the shading stage would see it.
#[derive(Debug, Clone, Copy)]
pub struct PackedGridView<'a> {
    bytes: &'a [u8],
    dims: crate::grid::GridDimensions,
}

impl<'a> PackedGridView<'a> {
    /// Wraps a packed buffer produced for `dims`.
    pub fn new(bytes: &'a [u8], dims: crate::grid::GridDimensions) -> Self {
        assert!(bytes.len() >= dims.header_bytes(), "buffer shorter than its headers");
        Self { bytes, dims }
    }

    /// Header of the sub-cell at `(x, y, z)`.
    pub fn header(&self, x: u32, y: u32, z: u32) -> GridHeader {
        let start = self.dims.sub_cell_index(x, y, z) * std::mem::size_of::<GridHeader>();
        bytemuck::pod_read_unaligned(&self.bytes[start..start + std::mem::size_of::<GridHeader>()])
    }

    /// Light indices referenced by the sub-cell at `(x, y, z)`.
    pub fn lights(&self, x: u32, y: u32, z: u32) -> Vec<u16> {
        let header = self.header(x, y, z);
        let start = header.tail_byte_offset();
        let end = start + header.length() * 2;
        self.bytes[start..end]
            .chunks_exact(2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<GridHeader>(), 16);
    }

    #[test]
    fn test_header_bit_layout() {
        let header = GridHeader::new(48, &[7, 9]);
        assert_eq!(header.offset_and_length, (3 << 8) | 2);
        assert_eq!(header.length(), 2);
        assert_eq!(header.tail_byte_offset(), 48);
        assert_eq!(header.inline, [(7 << 16) | 9, 0, 0]);
        assert_eq!(header.inline_lights().collect::<Vec<_>>(), vec![7, 9]);
    }

    #[test]
    fn test_header_keeps_last_six() {
        let lights = [1, 2, 3, 4, 5, 6, 7];
        let header = GridHeader::new(16, &lights);
        assert_eq!(header.length(), 7);
        assert_eq!(header.inline, [(2 << 16) | 3, (4 << 16) | 5, (6 << 16) | 7]);
        assert_eq!(
            header.inline_lights().collect::<Vec<_>>(),
            vec![2, 3, 4, 5, 6, 7]
        );
    }

    #[test]
    fn test_max_length_fits() {
        let lights = vec![1u16; MAX_LIGHTS_PER_SUB_CELL];
        assert_eq!(GridHeader::new(0, &lights).length(), 255);
    }

    #[test]
    #[should_panic(expected = "at most 255")]
    fn test_overlong_run_panics() {
        let lights = vec![1u16; MAX_LIGHTS_PER_SUB_CELL + 1];
        GridHeader::new(0, &lights);
    }

    #[test]
    fn test_align_tail() {
        assert_eq!(align_tail(0), 0);
        assert_eq!(align_tail(2), 16);
        assert_eq!(align_tail(16), 16);
        assert_eq!(align_tail(18), 32);
    }
}
