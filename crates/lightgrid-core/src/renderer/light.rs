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

//! The flat light representation consumed by the culling lanes.
//!
//! Scene lights come in many shapes (directional, point, spot, area), but
//! culling only needs a bounding sphere, an on/off state and the light's GPU
//! slot. The scene collaborator projects every light into a [`CullingLight`]
//! before handing it over.

use crate::math::{Mat4, Vec3};

/// Radius used for lights without a finite falloff (sun/directional lights).
///
/// A large finite value keeps every clip-region computation finite.
pub const INFINITE_RADIUS: f32 = 1_048_576.0;

/// Per-light state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LightFlags {
    bits: u32,
}

impl LightFlags {
    /// No flags set. The light is off.
    pub const NONE: Self = Self { bits: 0 };
    /// The light is switched on.
    pub const ENABLED: Self = Self { bits: 1 << 0 };
    /// The light has no finite falloff and uses [`INFINITE_RADIUS`].
    pub const INFINITE: Self = Self { bits: 1 << 1 };
    /// The light casts shadows. Ignored by culling, carried for the shading stage.
    pub const CASTS_SHADOW: Self = Self { bits: 1 << 2 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Returns these flags without the ones in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Checks if every flag in `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for LightFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for LightFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A light as seen by the culling lanes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CullingLight {
    /// Camera-space position with `+z` pointing away from the camera.
    pub position: Vec3,
    /// Falloff radius.
    pub radius: f32,
    /// State flags.
    pub flags: LightFlags,
    /// Stable index of the light in the GPU light buffer.
    pub gpu_index: u16,
}

impl CullingLight {
    /// Creates an enabled point light.
    pub fn point(position: Vec3, radius: f32, gpu_index: u16) -> Self {
        debug_assert!(radius > 0.0, "light radius must be positive");
        Self {
            position,
            radius,
            flags: LightFlags::ENABLED,
            gpu_index,
        }
    }

    /// Creates an enabled light with no finite falloff.
    pub fn infinite(gpu_index: u16) -> Self {
        Self {
            position: Vec3::ZERO,
            radius: INFINITE_RADIUS,
            flags: LightFlags::ENABLED | LightFlags::INFINITE,
            gpu_index,
        }
    }

    /// Builds a culling light from a world-space position and a view matrix.
    pub fn from_world(
        view: &Mat4,
        world_position: Vec3,
        radius: f32,
        flags: LightFlags,
        gpu_index: u16,
    ) -> Self {
        let radius = if flags.contains(LightFlags::INFINITE) {
            INFINITE_RADIUS
        } else {
            radius
        };
        Self {
            position: to_culling_space(view, world_position),
            radius,
            flags,
            gpu_index,
        }
    }

    /// Returns `true` if the light is switched on.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(LightFlags::ENABLED)
    }

    /// Returns this light switched on or off.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.flags = if enabled {
            self.flags | LightFlags::ENABLED
        } else {
            self.flags.difference(LightFlags::ENABLED)
        };
        self
    }
}

/// Transforms a world-space point into culling space.
///
/// The right-handed view space looks down `-z`; culling space flips `z` so
/// that points in front of the camera have positive depth.
#[inline]
pub fn to_culling_space(view: &Mat4, world_position: Vec3) -> Vec3 {
    let p = view.transform_point3(world_position);
    Vec3::new(p.x, p.y, -p.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags = LightFlags::ENABLED | LightFlags::CASTS_SHADOW;
        assert!(flags.contains(LightFlags::ENABLED));
        assert!(!flags.contains(LightFlags::INFINITE));
        assert!(!flags.is_empty());
        assert!(flags.difference(flags).is_empty());
        assert_eq!(LightFlags::from_bits(flags.bits()), flags);
    }

    #[test]
    fn test_enable_toggle() {
        let light = CullingLight::point(Vec3::new(0.0, 0.0, 5.0), 1.0, 3);
        assert!(light.is_enabled());
        assert!(!light.with_enabled(false).is_enabled());
        assert!(light.with_enabled(false).with_enabled(true).is_enabled());
    }

    #[test]
    fn test_from_world_flips_depth() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y).unwrap();
        let light = CullingLight::from_world(&view, Vec3::ZERO, 2.0, LightFlags::ENABLED, 0);
        assert!((light.position.z - 10.0).abs() < 1e-5);
        assert_eq!(light.radius, 2.0);
    }

    #[test]
    fn test_infinite_light_uses_sentinel() {
        let light = CullingLight::from_world(
            &Mat4::IDENTITY,
            Vec3::ZERO,
            1.0,
            LightFlags::ENABLED | LightFlags::INFINITE,
            0,
        );
        assert_eq!(light.radius, INFINITE_RADIUS);
        assert_eq!(CullingLight::infinite(7).radius, INFINITE_RADIUS);
    }
}
