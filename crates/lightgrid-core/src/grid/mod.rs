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

//! The clustered grid data model.
//!
//! The view frustum is split into a `width x height x depth` grid of
//! sub-cells, grouped into 4x4x4 clusters. Lights are rasterized into
//! clusters as [`Fragment`]s carrying a [`CoverageMask`] over the cluster's
//! 64 sub-cells.

mod coverage;
mod dimensions;
mod region;

pub use coverage::*;
pub use dimensions::*;
pub use region::*;
