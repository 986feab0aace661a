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

//! # LightGrid Lanes
//!
//! Hot-path strategies of the clustered light culler:
//!
//! - [`culling_lane`]: clip regions, the coverage mask table and the two
//!   interchangeable rasterizers that turn lights into fragments.
//! - [`grid_lane`]: accumulation of fragments per cluster and packing into
//!   the GPU layout.
//! - [`config`]: grid resolution and strategy configuration.

#![warn(missing_docs)]

pub mod config;
pub mod culling_lane;
pub mod grid_lane;

pub use config::{ConfigError, GridConfig, RasterStrategy};
pub use culling_lane::{RasterLane, ScalarRasterLane, VectorisedRasterLane};
pub use grid_lane::{LightGridAccumulator, LightGridPacker, PackStats};
