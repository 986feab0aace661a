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

//! Double-buffered upload target for the packed light grid.
//!
//! The [`DoubleBufferedUpload`] owns two GPU buffers. The shading stage reads
//! the *current* one while the CPU writes the frame's grid into the other
//! (the *build target*). Once the write completes the roles swap.
//!
//! # Architecture
//!
//! ```text
//! Frame N:     [A: GPU reads]  [B: CPU writes] → swap
//! Frame N+1:   [B: GPU reads]  [A: CPU writes] → swap
//! Frame N+2:   [A: GPU reads]  [B: CPU writes] → swap
//! ```
//!
//! No fence is involved: a buffer is only rewritten after a full frame in
//! which the other buffer was bound for reading.

use crate::renderer::{
    api::buffer::{BufferDescriptor, BufferId, BufferUsage},
    error::ResourceError,
    traits::GraphicsDevice,
};
use std::borrow::Cow;

/// Identifies one of the two physical buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    /// The first buffer.
    A,
    /// The second buffer.
    B,
}

impl BufferSlot {
    /// The other slot.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            BufferSlot::A => BufferSlot::B,
            BufferSlot::B => BufferSlot::A,
        }
    }

    #[inline]
    const fn index(self) -> usize {
        match self {
            BufferSlot::A => 0,
            BufferSlot::B => 1,
        }
    }
}

/// A single physical buffer and its allocated size.
#[derive(Debug, Clone, Copy)]
struct SlotBuffer {
    buffer: BufferId,
    capacity: u64,
}

/// Two GPU buffers used alternately as read source and write target.
#[derive(Debug)]
pub struct DoubleBufferedUpload {
    slots: [SlotBuffer; 2],
    current: BufferSlot,
    label: &'static str,
}

impl DoubleBufferedUpload {
    /// Usage flags of both buffers.
    pub const USAGE: BufferUsage = BufferUsage::STORAGE.union(BufferUsage::COPY_DST);

    /// Allocates both buffers with `capacity` bytes each.
    ///
    /// Slot [`BufferSlot::A`] starts as the current buffer, so the first
    /// upload writes into [`BufferSlot::B`].
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if buffer creation fails.
    pub fn new(
        device: &dyn GraphicsDevice,
        capacity: u64,
        label: &'static str,
    ) -> Result<Self, ResourceError> {
        let capacity = capacity.max(1);
        let a = Self::create_slot(device, label, BufferSlot::A, capacity)?;
        let b = Self::create_slot(device, label, BufferSlot::B, capacity)?;
        Ok(Self {
            slots: [a, b],
            current: BufferSlot::A,
            label,
        })
    }

    fn create_slot(
        device: &dyn GraphicsDevice,
        label: &'static str,
        slot: BufferSlot,
        capacity: u64,
    ) -> Result<SlotBuffer, ResourceError> {
        let buffer = device.create_buffer(&BufferDescriptor {
            label: Some(Cow::Owned(format!("{label} [{slot:?}]"))),
            size: capacity,
            usage: Self::USAGE,
        })?;
        Ok(SlotBuffer { buffer, capacity })
    }

    /// The slot the shading stage currently reads.
    #[inline]
    pub fn current(&self) -> BufferSlot {
        self.current
    }

    /// The slot the next upload writes into.
    #[inline]
    pub fn build_target(&self) -> BufferSlot {
        self.current.other()
    }

    /// The buffer the shading stage currently reads.
    #[inline]
    pub fn current_buffer(&self) -> BufferId {
        self.buffer(self.current)
    }

    /// The buffer behind `slot`.
    #[inline]
    pub fn buffer(&self, slot: BufferSlot) -> BufferId {
        self.slots[slot.index()].buffer
    }

    /// Allocated size of the buffer behind `slot`, in bytes.
    #[inline]
    pub fn capacity(&self, slot: BufferSlot) -> u64 {
        self.slots[slot.index()].capacity
    }

    /// Makes sure the build target can hold `required` bytes.
    ///
    /// Capacity doubles until it fits and never shrinks. Returns `true` if
    /// the buffer was reallocated.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the replacement buffer cannot be created.
    pub fn ensure_capacity(
        &mut self,
        device: &dyn GraphicsDevice,
        required: u64,
    ) -> Result<bool, ResourceError> {
        let target = self.build_target();
        let old = self.slots[target.index()];
        if required <= old.capacity {
            return Ok(false);
        }

        let mut capacity = old.capacity.max(1);
        while capacity < required {
            capacity = capacity.saturating_mul(2);
        }

        let grown = Self::create_slot(device, self.label, target, capacity)?;
        if let Err(e) = device.destroy_buffer(old.buffer) {
            log::warn!(
                "DoubleBufferedUpload({}): Failed to destroy outgrown buffer: {:?}",
                self.label,
                e
            );
        }
        log::debug!(
            "DoubleBufferedUpload({}): grew slot {:?} from {} to {} bytes",
            self.label,
            target,
            old.capacity,
            capacity
        );
        self.slots[target.index()] = grown;
        Ok(true)
    }

    /// Writes `data` into the build target, then swaps the buffers.
    ///
    /// Returns the slot that now holds `data` and has become current.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if growing or writing the buffer fails.
    /// The buffers are not swapped in that case.
    pub fn upload(
        &mut self,
        device: &dyn GraphicsDevice,
        data: &[u8],
    ) -> Result<BufferSlot, ResourceError> {
        self.ensure_capacity(device, data.len() as u64)?;
        let target = self.build_target();
        device.write_buffer(self.buffer(target), 0, data)?;
        self.current = target;
        Ok(target)
    }

    /// Destroys both GPU buffers.
    ///
    /// The upload target must not be used afterwards.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for slot in &self.slots {
            if let Err(e) = device.destroy_buffer(slot.buffer) {
                log::warn!(
                    "DoubleBufferedUpload({}): Failed to destroy buffer: {:?}",
                    self.label,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::MemoryDevice;

    #[test]
    fn test_new_allocates_two_buffers() {
        let device = MemoryDevice::new();
        let upload = DoubleBufferedUpload::new(&device, 64, "Grid").unwrap();
        assert_ne!(upload.buffer(BufferSlot::A), upload.buffer(BufferSlot::B));
        assert_eq!(upload.current(), BufferSlot::A);
        assert_eq!(upload.build_target(), BufferSlot::B);
        assert_eq!(device.live_buffer_count(), 2);
    }

    #[test]
    fn test_upload_alternates() {
        let device = MemoryDevice::new();
        let mut upload = DoubleBufferedUpload::new(&device, 64, "Grid").unwrap();

        let first = upload.upload(&device, &[1; 16]).unwrap();
        let first_buffer = upload.current_buffer();
        let second = upload.upload(&device, &[2; 16]).unwrap();
        let second_buffer = upload.current_buffer();

        assert_eq!(first, BufferSlot::B);
        assert_eq!(second, BufferSlot::A);
        assert_ne!(first_buffer, second_buffer);
        assert_eq!(device.read(first_buffer).unwrap()[..16], [1; 16]);
        assert_eq!(device.read(second_buffer).unwrap()[..16], [2; 16]);
    }

    #[test]
    fn test_growth_only_touches_build_target() {
        let device = MemoryDevice::new();
        let mut upload = DoubleBufferedUpload::new(&device, 16, "Grid").unwrap();
        let reading = upload.current_buffer();

        upload.upload(&device, &[0; 40]).unwrap();

        assert_eq!(upload.capacity(BufferSlot::B), 64);
        assert_eq!(upload.capacity(BufferSlot::A), 16);
        assert_eq!(upload.buffer(BufferSlot::A), reading);
        assert_eq!(upload.current(), BufferSlot::B);
        assert_eq!(device.live_buffer_count(), 2);
    }

    #[test]
    fn test_capacity_never_shrinks() {
        let device = MemoryDevice::new();
        let mut upload = DoubleBufferedUpload::new(&device, 16, "Grid").unwrap();
        upload.upload(&device, &[0; 100]).unwrap();
        upload.upload(&device, &[0; 100]).unwrap();
        upload.upload(&device, &[0; 4]).unwrap();
        assert_eq!(upload.capacity(BufferSlot::A), 128);
        assert_eq!(upload.capacity(BufferSlot::B), 128);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let device = MemoryDevice::new();
        let upload = DoubleBufferedUpload::new(&device, 16, "Grid").unwrap();
        upload.destroy(&device);
        assert_eq!(device.live_buffer_count(), 0);
    }
}
