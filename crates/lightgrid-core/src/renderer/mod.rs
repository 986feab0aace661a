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

//! GPU-facing contracts of the culling subsystem.
//!
//! This module groups the flat light and camera projections consumed by the
//! culling lanes, the packed grid layout they produce, and the minimal
//! device abstraction used to upload it.

pub mod api;
pub mod camera;
pub mod error;
pub mod light;
pub mod light_grid;
pub mod memory_device;
pub mod traits;

pub use self::api::*;
pub use self::camera::CullingCamera;
pub use self::error::ResourceError;
pub use self::light::{CullingLight, LightFlags, INFINITE_RADIUS};
pub use self::light_grid::{align_tail, GridHeader, PackedGridView};
pub use self::memory_device::MemoryDevice;
pub use self::traits::GraphicsDevice;
