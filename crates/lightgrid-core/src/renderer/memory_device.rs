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

//! A headless [`GraphicsDevice`] that keeps buffers in system memory.
//!
//! Used by tools and tests that need to inspect what the culling pipeline
//! uploads without a real GPU.

use crate::renderer::{
    api::buffer::{BufferDescriptor, BufferId},
    error::ResourceError,
    traits::GraphicsDevice,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryState {
    buffers: HashMap<BufferId, Vec<u8>>,
    bytes_written: u64,
    write_count: u64,
}

/// A CPU-side graphics device.
#[derive(Debug)]
pub struct MemoryDevice {
    next_id: AtomicUsize,
    state: Mutex<MemoryState>,
}

impl MemoryDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self {
            next_id: AtomicUsize::new(1),
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of a buffer's contents.
    pub fn read(&self, id: BufferId) -> Option<Vec<u8>> {
        self.state().buffers.get(&id).cloned()
    }

    /// Number of buffers currently alive.
    pub fn live_buffer_count(&self) -> usize {
        self.state().buffers.len()
    }

    /// Total bytes written through [`GraphicsDevice::write_buffer`].
    pub fn bytes_written(&self) -> u64 {
        self.state().bytes_written
    }

    /// Number of [`GraphicsDevice::write_buffer`] calls.
    pub fn write_count(&self) -> u64 {
        self.state().write_count
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsDevice for MemoryDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::trace!(
            "MemoryDevice: created buffer {:?} '{}' ({} bytes)",
            id,
            descriptor.label.as_deref().unwrap_or("unnamed"),
            descriptor.size
        );
        self.state()
            .buffers
            .insert(id, vec![0; descriptor.size as usize]);
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        self.state()
            .buffers
            .remove(&id)
            .map(|_| ())
            .ok_or(ResourceError::InvalidHandle)
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut state = self.state();
        let buffer = state.buffers.get_mut(&id).ok_or(ResourceError::NotFound)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > buffer.len() {
            return Err(ResourceError::OutOfBounds);
        }
        buffer[start..end].copy_from_slice(data);
        state.bytes_written += data.len() as u64;
        state.write_count += 1;
        Ok(())
    }
}
