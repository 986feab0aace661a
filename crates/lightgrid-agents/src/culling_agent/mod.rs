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

//! Acts as the **[A]gent** for clustered light culling.
//!
//! The agent decides *which* rasterizer runs each frame and owns everything
//! that persists between frames: the per-cluster lists, the packer's staging
//! buffer and the double-buffered GPU upload target. The per-light and
//! per-sub-cell work is delegated to the culling and grid lanes.
//!
//! Its responsibilities:
//! - Holding the grid resolution and resizing the accumulator when it changes.
//! - Picking the scalar or vectorised rasterizer, either as configured or
//!   automatically from the light count.
//! - Running clear, rasterize, pack and upload in order, and reporting
//!   per-frame statistics.

mod agent;

pub use agent::*;
