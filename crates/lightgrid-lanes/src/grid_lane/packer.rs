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

//! Compaction of per-cluster lists into the shader-facing grid buffer.
//!
//! The packed buffer starts with one 16-byte [`GridHeader`] per sub-cell,
//! addressed by [`GridDimensions::sub_cell_index`]. Sub-cells that see at
//! least one light own a 16-byte aligned run of little-endian `u16` light
//! indices in the tail that follows the headers. Empty sub-cells keep an
//! all-zero header and allocate nothing.

use super::accumulator::LightGridAccumulator;
use lightgrid_core::grid::{fine_coords, GridDimensions, CLUSTER_EDGE, SUB_CELLS_PER_CLUSTER};
use lightgrid_core::renderer::{
    align_tail, DoubleBufferedUpload, GraphicsDevice, GridHeader, ResourceError,
};

/// Summary of one packing pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PackStats {
    /// Bytes in use: headers plus aligned tail runs.
    pub allocated_bytes: usize,
    /// Sub-cells with at least one light.
    pub non_empty_sub_cells: usize,
    /// Light indices written to the tail.
    pub tail_entries: usize,
    /// Longest run of any single sub-cell.
    pub max_list_length: usize,
}

/// Builds the packed grid from a [`LightGridAccumulator`].
///
/// The packer owns a CPU staging buffer that is reused across frames. Only
/// its first [`PackStats::allocated_bytes`] are meaningful after a build.
#[derive(Debug)]
pub struct LightGridPacker {
    staging: Vec<u8>,
    scratch: Vec<u16>,
    local_coords: [[u32; 3]; SUB_CELLS_PER_CLUSTER],
}

impl LightGridPacker {
    /// Creates a packer with an empty staging buffer.
    pub fn new() -> Self {
        let mut local_coords = [[0; 3]; SUB_CELLS_PER_CLUSTER];
        for (fine, coords) in local_coords.iter_mut().enumerate() {
            let (x, y, z) = fine_coords(fine as u32);
            *coords = [x, y, z];
        }
        Self {
            staging: Vec::new(),
            scratch: Vec::new(),
            local_coords,
        }
    }

    /// Packs the accumulated lists into the staging buffer.
    ///
    /// Clusters are visited in index order and each cluster's sub-cells in
    /// fine-index order, so the tail layout is deterministic for a given
    /// accumulator.
    ///
    /// # Panics
    ///
    /// Panics if a sub-cell is covered by more than 255 lights, or if the
    /// tail grows beyond the range a header can address.
    pub fn build(&mut self, accumulator: &LightGridAccumulator) -> PackStats {
        let Some(dims) = accumulator.dimensions() else {
            log::warn!("LightGridPacker: accumulator has no grid, nothing to pack");
            self.staging.clear();
            return PackStats::default();
        };

        let header_bytes = dims.header_bytes();
        self.staging.clear();
        self.staging.resize(header_bytes, 0);

        let mut stats = PackStats {
            allocated_bytes: header_bytes,
            ..PackStats::default()
        };

        for (cluster_index, entries) in accumulator.clusters().enumerate() {
            if entries.is_empty() {
                continue;
            }
            let (cx, cy, cz) = dims.cluster_coords(cluster_index);
            let origin = [cx * CLUSTER_EDGE, cy * CLUSTER_EDGE, cz * CLUSTER_EDGE];

            for fine in 0..SUB_CELLS_PER_CLUSTER as u32 {
                self.scratch.clear();
                self.scratch.extend(
                    entries
                        .iter()
                        .filter(|entry| entry.covers(fine))
                        .map(|entry| entry.light),
                );
                if self.scratch.is_empty() {
                    continue;
                }

                let offset = stats.allocated_bytes;
                let header = GridHeader::new(offset, &self.scratch);
                let run_bytes = align_tail(self.scratch.len() * 2);
                self.staging.resize(offset + run_bytes, 0);
                for (slot, light) in self.staging[offset..]
                    .chunks_exact_mut(2)
                    .zip(&self.scratch)
                {
                    slot.copy_from_slice(&light.to_le_bytes());
                }

                let [lx, ly, lz] = self.local_coords[fine as usize];
                write_header(
                    &mut self.staging,
                    &dims,
                    [origin[0] + lx, origin[1] + ly, origin[2] + lz],
                    &header,
                );

                stats.allocated_bytes += run_bytes;
                stats.non_empty_sub_cells += 1;
                stats.tail_entries += self.scratch.len();
                stats.max_list_length = stats.max_list_length.max(self.scratch.len());
            }
        }

        debug_assert_eq!(self.staging.len(), stats.allocated_bytes);
        log::trace!(
            "LightGridPacker: {} bytes, {} non-empty sub-cells, longest run {}",
            stats.allocated_bytes,
            stats.non_empty_sub_cells,
            stats.max_list_length
        );
        stats
    }

    /// Packs the accumulator and uploads the used prefix through `upload`.
    ///
    /// The freshly written buffer becomes the current one.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the upload target cannot grow or be
    /// written. The current buffer is left untouched in that case.
    pub fn build_and_upload(
        &mut self,
        accumulator: &LightGridAccumulator,
        upload: &mut DoubleBufferedUpload,
        device: &dyn GraphicsDevice,
    ) -> Result<PackStats, ResourceError> {
        let stats = self.build(accumulator);
        upload.upload(device, &self.staging[..stats.allocated_bytes])?;
        Ok(stats)
    }

    /// The bytes produced by the last build.
    pub fn packed_bytes(&self) -> &[u8] {
        &self.staging
    }
}

impl Default for LightGridPacker {
    fn default() -> Self {
        Self::new()
    }
}

fn write_header(staging: &mut [u8], dims: &GridDimensions, cell: [u32; 3], header: &GridHeader) {
    let size = std::mem::size_of::<GridHeader>();
    let start = dims.sub_cell_index(cell[0], cell[1], cell[2]) * size;
    staging[start..start + size].copy_from_slice(bytemuck::bytes_of(header));
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightgrid_core::grid::{fine_index, CoverageMask};
    use lightgrid_core::renderer::{BufferSlot, MemoryDevice, PackedGridView};

    fn single_cluster() -> LightGridAccumulator {
        LightGridAccumulator::with_dimensions(GridDimensions::new(4, 4, 4))
    }

    #[test]
    fn test_empty_grid_is_all_headers() {
        let acc = LightGridAccumulator::with_dimensions(GridDimensions::new(8, 4, 8));
        let mut packer = LightGridPacker::new();
        let stats = packer.build(&acc);
        assert_eq!(stats.allocated_bytes, 8 * 4 * 8 * 16);
        assert_eq!(stats.non_empty_sub_cells, 0);
        assert!(packer.packed_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_single_sub_cell_round_trip() {
        let dims = GridDimensions::new(8, 4, 4);
        let mut acc = LightGridAccumulator::with_dimensions(dims);
        // Sub-cell (5, 2, 1) lives in cluster (1, 0, 0) at local (1, 2, 1).
        acc.push_fragment(dims.cluster_index(1, 0, 0), 42, CoverageMask::from_local(1, 2, 1));

        let mut packer = LightGridPacker::new();
        let stats = packer.build(&acc);
        assert_eq!(stats.non_empty_sub_cells, 1);
        assert_eq!(stats.tail_entries, 1);
        assert_eq!(stats.allocated_bytes, dims.header_bytes() + 16);

        let view = PackedGridView::new(packer.packed_bytes(), dims);
        for y in 0..4 {
            for x in 0..8 {
                for z in 0..4 {
                    let header = view.header(x, y, z);
                    if (x, y, z) == (5, 2, 1) {
                        assert_eq!(header.length(), 1);
                        assert_eq!(header.tail_byte_offset(), dims.header_bytes());
                        assert_eq!(view.lights(x, y, z), vec![42]);
                        assert_eq!(header.inline, [42 << 16, 0, 0]);
                    } else {
                        assert_eq!(header, GridHeader::EMPTY, "({x}, {y}, {z})");
                    }
                }
            }
        }
    }

    #[test]
    fn test_full_cluster_light_fills_every_header() {
        let mut acc = single_cluster();
        acc.push_fragment(0, 7, CoverageMask::FULL);
        let mut packer = LightGridPacker::new();
        let stats = packer.build(&acc);

        assert_eq!(stats.non_empty_sub_cells, 64);
        assert_eq!(stats.allocated_bytes, 64 * 16 + 64 * 16);

        let view = PackedGridView::new(packer.packed_bytes(), GridDimensions::new(4, 4, 4));
        let mut offsets = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                for z in 0..4 {
                    assert_eq!(view.lights(x, y, z), vec![7]);
                    offsets.push(view.header(x, y, z).tail_byte_offset());
                }
            }
        }
        offsets.sort_unstable();
        offsets.dedup();
        assert_eq!(offsets.len(), 64);
    }

    #[test]
    fn test_tail_follows_fine_index_order() {
        let mut acc = single_cluster();
        let first = CoverageMask::from_fine_index(fine_index(0, 0, 0));
        let second = CoverageMask::from_fine_index(fine_index(0, 0, 1));
        acc.push_fragment(0, 1, first | second);
        let mut packer = LightGridPacker::new();
        packer.build(&acc);

        let view = PackedGridView::new(packer.packed_bytes(), GridDimensions::new(4, 4, 4));
        assert_eq!(view.header(0, 0, 0).tail_byte_offset(), 1024);
        assert_eq!(view.header(0, 0, 1).tail_byte_offset(), 1040);
    }

    #[test]
    fn test_seven_lights_inline_words() {
        let mut acc = single_cluster();
        for light in [10u16, 11, 12, 13, 14, 15, 16] {
            acc.push_fragment(0, light, CoverageMask::from_local(0, 0, 0));
        }
        let mut packer = LightGridPacker::new();
        let stats = packer.build(&acc);
        assert_eq!(stats.max_list_length, 7);
        assert_eq!(stats.allocated_bytes, 1024 + 16);

        let view = PackedGridView::new(packer.packed_bytes(), GridDimensions::new(4, 4, 4));
        let header = view.header(0, 0, 0);
        assert_eq!(header.offset_and_length, (1024 / 16) << 8 | 7);
        assert_eq!(header.inline, [11 << 16 | 12, 13 << 16 | 14, 15 << 16 | 16]);
        assert_eq!(view.lights(0, 0, 0), vec![10, 11, 12, 13, 14, 15, 16]);
        assert_eq!(&packer.packed_bytes()[1024..1026], &[10, 0]);
    }

    #[test]
    fn test_255_lights_in_one_sub_cell() {
        let mut acc = single_cluster();
        for light in 0..255u16 {
            acc.push_fragment(0, light, CoverageMask::from_local(3, 3, 3));
        }
        let mut packer = LightGridPacker::new();
        let stats = packer.build(&acc);
        assert_eq!(stats.max_list_length, 255);
        let view = PackedGridView::new(packer.packed_bytes(), GridDimensions::new(4, 4, 4));
        assert_eq!(view.header(3, 3, 3).length(), 255);
        assert_eq!(view.lights(3, 3, 3), (0..255).collect::<Vec<u16>>());
    }

    #[test]
    #[should_panic(expected = "at most 255")]
    fn test_256_lights_in_one_sub_cell_panics() {
        let mut acc = single_cluster();
        for light in 0..256u16 {
            acc.push_fragment(0, light, CoverageMask::from_local(3, 3, 3));
        }
        LightGridPacker::new().build(&acc);
    }

    #[test]
    fn test_build_and_upload_sends_used_prefix() {
        let device = MemoryDevice::new();
        let mut upload = DoubleBufferedUpload::new(&device, 64, "LightGrid").unwrap();
        let mut acc = single_cluster();
        acc.push_fragment(0, 3, CoverageMask::from_local(1, 1, 1));

        let mut packer = LightGridPacker::new();
        let stats = packer.build_and_upload(&acc, &mut upload, &device).unwrap();

        assert_eq!(upload.current(), BufferSlot::B);
        assert_eq!(device.bytes_written(), stats.allocated_bytes as u64);
        let uploaded = device.read(upload.current_buffer()).unwrap();
        let view = PackedGridView::new(&uploaded, GridDimensions::new(4, 4, 4));
        assert_eq!(view.lights(1, 1, 1), vec![3]);
    }

    #[test]
    fn test_rebuild_resets_allocation() {
        let mut acc = single_cluster();
        acc.push_fragment(0, 1, CoverageMask::FULL);
        let mut packer = LightGridPacker::new();
        let first = packer.build(&acc);

        acc.clear_all_fragments();
        acc.push_fragment(0, 1, CoverageMask::from_local(0, 0, 0));
        let second = packer.build(&acc);

        assert!(second.allocated_bytes < first.allocated_bytes);
        assert_eq!(packer.packed_bytes().len(), second.allocated_bytes);
    }
}
