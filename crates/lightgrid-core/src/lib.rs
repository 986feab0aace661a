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

//! # LightGrid Core
//!
//! Foundational crate containing the data model, GPU contracts and lane
//! traits shared by the clustered light culling subsystem.
//!
//! Nothing in this crate performs culling by itself. It defines *what* the
//! culling lanes exchange (grids, clip regions, coverage masks, fragments,
//! packed headers) and *how* results reach the GPU (buffer handles, the
//! [`GraphicsDevice`](renderer::traits::GraphicsDevice) trait and the
//! [`DoubleBufferedUpload`](renderer::api::DoubleBufferedUpload)).

#![warn(missing_docs)]

pub mod grid;
pub mod lane;
pub mod math;
pub mod renderer;

pub use grid::{ClipRegion, ClusterBounds, CoverageMask, Fragment, GridDimensions, GridError};
