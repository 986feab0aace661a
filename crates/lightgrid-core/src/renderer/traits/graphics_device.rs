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

use crate::renderer::api::buffer::{BufferDescriptor, BufferId};
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The buffer-management surface of a graphics device.
///
/// The culling subsystem only creates, writes and destroys buffers. The
/// concrete backend (wgpu, Vulkan, a test double) lives outside this crate.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the backend cannot allocate the buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Destroys a GPU buffer, releasing its memory.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Writes `data` into the buffer at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] if the write exceeds the buffer.
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;
}
