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

//! Camera terms read by the clip region solver and the rasterizers.

use crate::math::Mat4;

/// The subset of camera state light culling depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingCamera {
    /// Horizontal projection scale, `proj[0][0]`.
    pub x_scale: f32,
    /// Vertical projection scale, `proj[1][1]`.
    pub y_scale: f32,
    /// Distance to the near plane.
    pub near: f32,
    /// Distance to the far plane.
    pub far: f32,
}

impl CullingCamera {
    /// Creates camera terms from a perspective projection.
    pub fn perspective(fov_y_radians: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        Self::from_projection(
            &Mat4::perspective_rh_zo(fov_y_radians, aspect_ratio, near, far),
            near,
            far,
        )
    }

    /// Reads the projection scale terms out of a projection matrix.
    pub fn from_projection(projection: &Mat4, near: f32, far: f32) -> Self {
        debug_assert!(near > 0.0 && far > near, "invalid depth range {near}..{far}");
        Self {
            x_scale: projection.cols[0].x,
            y_scale: projection.cols[1].y,
            near,
            far,
        }
    }

    /// Length of the view volume along the depth axis.
    #[inline]
    pub fn depth_range(&self) -> f32 {
        self.far - self.near
    }

    /// Normalized linear depth of a camera-space depth, `0` at near and `1` at far.
    #[inline]
    pub fn linear_depth(&self, z: f32) -> f32 {
        (z - self.near) / self.depth_range()
    }
}
