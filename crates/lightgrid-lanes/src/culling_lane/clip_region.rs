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

//! Screen-space clip regions of light spheres.
//!
//! A light sphere seen from the eye is bounded on each screen axis by two
//! planes through the eye that are tangent to the sphere. Solving for the
//! tangent plane normals gives the projected extent exactly, without
//! projecting the sphere's bounding box (which overestimates near the
//! screen edges).
//!
//! Each axis is solved independently in the `(c, z)` plane, where `c` is `x`
//! for the horizontal axis and `-y` for the vertical one (screen `y` grows
//! downwards).

use lightgrid_core::grid::ClipRegion;
use lightgrid_core::renderer::{CullingCamera, CullingLight};

/// Computes the clip region of `light` as seen by `camera`.
///
/// Lights that are switched off or lie entirely behind the near plane
/// (`z + radius < near`) produce [`ClipRegion::EMPTY`].
pub fn compute_clip_region(light: &CullingLight, camera: &CullingCamera) -> ClipRegion {
    let p = light.position;
    let radius = light.radius;
    if !light.is_enabled() || p.z + radius < camera.near {
        return ClipRegion::EMPTY;
    }

    let (mut x_min, mut x_max) = (-1.0f32, 1.0f32);
    let (mut y_min, mut y_max) = (-1.0f32, 1.0f32);
    update_clip_region(p.x, p.z, radius, camera.x_scale, &mut x_min, &mut x_max);
    update_clip_region(-p.y, p.z, radius, camera.y_scale, &mut y_min, &mut y_max);

    let depth_range = camera.depth_range();
    let center = camera.linear_depth(p.z);
    let extent = radius / depth_range;

    let region = ClipRegion {
        x_min: x_min * 0.5 + 0.5,
        y_min: y_min * 0.5 + 0.5,
        x_max: x_max * 0.5 + 0.5,
        y_max: y_max * 0.5 + 0.5,
        z_min: center - extent,
        z_max: center + extent,
    };
    if region.is_empty() {
        ClipRegion::EMPTY
    } else {
        region
    }
}

/// Narrows `[clip_min, clip_max]` on one axis to the tangent planes of the sphere.
fn update_clip_region(
    lc: f32,
    lz: f32,
    radius: f32,
    camera_scale: f32,
    clip_min: &mut f32,
    clip_max: &mut f32,
) {
    let r_sq = radius * radius;
    let lc_sq_plus_lz_sq = lc * lc + lz * lz;
    let d = r_sq * lc * lc - lc_sq_plus_lz_sq * (r_sq - lz * lz);
    if d <= 0.0 {
        return;
    }

    let a = radius * lc;
    let b = d.sqrt();
    let nx0 = (a + b) / lc_sq_plus_lz_sq;
    let nx1 = (a - b) / lc_sq_plus_lz_sq;

    update_clip_region_root(nx0, lc, lz, radius, camera_scale, clip_min, clip_max);
    update_clip_region_root(nx1, lc, lz, radius, camera_scale, clip_min, clip_max);
}

/// Applies one tangent plane, with normal `(nc, nz)`, to the running bounds.
fn update_clip_region_root(
    nc: f32,
    lc: f32,
    lz: f32,
    radius: f32,
    camera_scale: f32,
    clip_min: &mut f32,
    clip_max: &mut f32,
) {
    // A plane parallel to the view axis never crosses the screen.
    if nc == 0.0 {
        return;
    }
    let nz = (radius - nc * lc) / lz;
    let pz = (lc * lc + lz * lz - radius * radius) / (lz - (nz / nc) * lc);

    // Tangent point behind the eye.
    if pz <= 0.0 {
        return;
    }

    let c = -nz * camera_scale / nc;
    if nc > 0.0 {
        *clip_min = clip_min.max(c);
    } else {
        *clip_max = clip_max.min(c);
    }
}
