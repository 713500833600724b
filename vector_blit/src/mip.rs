// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mip level selection.
//!
//! A sprite's world transform is reduced to its axis scale magnitudes and
//! quantized to a power of two. Small continuous zoom changes therefore keep
//! resolving to the same level and reuse the same raster; only crossing a
//! power-of-two threshold asks for a new one.

#[cfg(feature = "libm")]
#[allow(unused_imports, reason = "not needed when std is also enabled")]
use core_maths::CoreFloat;

use crate::config::CacheOptions;
use crate::kurbo::{Affine, Rect};
use crate::model::VectorGeometry;

/// Bias subtracted from `log2(scale)` before rounding up, so that a scale a hair
/// above a power of two still picks the lower level.
pub const MIP_EPSILON: f64 = 1e-2;

/// Decides which mip level, if any, a sprite should be cached at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MipSelector {
    max_bounds: f64,
    min_levels: i32,
    max_levels: i32,
}

impl MipSelector {
    /// Creates a selector from the cache options.
    pub fn new(options: &CacheOptions) -> Self {
        Self {
            max_bounds: options.max_bounds_for_mips,
            min_levels: options.min_cache_levels,
            max_levels: options.max_cache_levels,
        }
    }

    /// The lowest level this selector returns.
    #[inline]
    pub fn lowest_level(&self) -> i32 {
        -self.min_levels
    }

    /// The highest level this selector returns.
    #[inline]
    pub fn highest_level(&self) -> i32 {
        self.max_levels
    }

    /// Reduce `world` to a scale-only transform.
    ///
    /// The diagonal becomes the two axis scale magnitudes, shear and rotation are
    /// dropped, and only the sub-pixel part of the translation is kept.
    pub fn scale_only(world: Affine) -> Affine {
        let [a, b, c, d, tx, ty] = world.as_coeffs();
        Affine::new([
            a.hypot(b),
            0.0,
            0.0,
            c.hypot(d),
            tx - tx.round(),
            ty - ty.round(),
        ])
    }

    /// Whether a shape with these world bounds may be rasterized at all.
    ///
    /// Non-finite bounds never fit.
    pub fn fits(&self, bounds: Rect) -> bool {
        let (width, height) = (bounds.width(), bounds.height());
        width.is_finite() && height.is_finite() && width <= self.max_bounds && height <= self.max_bounds
    }

    /// Quantize a scale magnitude to a mip level, clamped to the configured range.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "the value is clamped to an i32 range first"
    )]
    pub fn mip_level(&self, scale: f64) -> i32 {
        let raw = (scale.log2() - MIP_EPSILON).ceil();
        if raw.is_nan() {
            return self.lowest_level();
        }
        raw.clamp(f64::from(self.lowest_level()), f64::from(self.highest_level())) as i32
    }

    /// The transform every raster of `level` is produced with.
    ///
    /// It depends on nothing but the level, so any two sprites sharing a model and
    /// level can share one raster.
    pub fn mip_transform(level: i32) -> Affine {
        Affine::scale(2.0_f64.powi(level))
    }

    /// Pick the mip level for a sprite, or `None` if it should be drawn directly.
    pub fn select<G: VectorGeometry + ?Sized>(&self, geometry: &G, world: Affine) -> Option<i32> {
        let scaled = Self::scale_only(world);
        let bounds = geometry.world_bounds(world);
        if !self.fits(bounds) {
            return None;
        }
        let [sx, _, _, sy, _, _] = scaled.as_coeffs();
        Some(self.mip_level(sx.max(sy)))
    }
}

impl Default for MipSelector {
    fn default() -> Self {
        Self::new(&CacheOptions::default())
    }
}
