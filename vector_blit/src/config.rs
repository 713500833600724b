// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cache and atlas configuration.

use crate::error::Error;
use crate::raster::CacheType;

/// Default number of downscaled mip levels below 1:1 (down to 1/32 scale).
pub const MIN_CACHE_LEVELS: i32 = 5;

/// Default number of upscaled mip levels above 1:1 (up to 8x scale).
pub const MAX_CACHE_LEVELS: i32 = 3;

/// Shapes whose world bounds exceed this in either axis are never rasterized.
pub const DEFAULT_MAX_BOUNDS_FOR_MIPS: f64 = 1024.0;

/// Options handed to the atlas storage backends.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AtlasOptions {
    /// Edge length of each atlas page, in pixels.
    pub size: u32,
    /// Maximum number of atlas pages per collection.
    pub texture_count: u32,
    /// Whether GPU-rasterized entries are antialiased.
    pub webgl_antialias: bool,
    /// Whether the canvas backend keeps a wider gutter between entries so that
    /// neighbouring rasters never bleed into each other when sampled.
    pub canvas_anti_conflation: bool,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            size: 1024,
            texture_count: 30,
            webgl_antialias: true,
            canvas_anti_conflation: false,
        }
    }
}

/// Policy knobs of a [`ShapeCache`](crate::ShapeCache).
///
/// Construct with struct update syntax:
///
/// ```
/// use vector_blit::{CacheOptions, CacheType};
///
/// let options = CacheOptions {
///     default_cache_type: CacheType::Canvas2d,
///     ..Default::default()
/// };
/// assert_eq!(options.max_bounds_for_mips, 1024.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CacheOptions {
    /// World-space size above which a shape is always drawn directly.
    pub max_bounds_for_mips: f64,
    /// Collection an entry lands in when its type is still [`CacheType::Auto`].
    pub default_cache_type: CacheType,
    /// Number of mip levels below 1:1; the lowest level is `-min_cache_levels`.
    pub min_cache_levels: i32,
    /// Number of mip levels above 1:1; the highest level is `max_cache_levels`.
    pub max_cache_levels: i32,
    /// A model is stale once more than this many GC passes went by without it being drawn.
    pub stale_gc_generations: u64,
    /// Fraction of a persistent collection's capacity above which idle entries are evicted.
    pub memory_pressure: f64,
    /// Options forwarded to the storage backends.
    pub atlas: AtlasOptions,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_bounds_for_mips: DEFAULT_MAX_BOUNDS_FOR_MIPS,
            default_cache_type: CacheType::WebGl,
            min_cache_levels: MIN_CACHE_LEVELS,
            max_cache_levels: MAX_CACHE_LEVELS,
            stale_gc_generations: 3,
            memory_pressure: 0.75,
            atlas: AtlasOptions::default(),
        }
    }
}

impl CacheOptions {
    /// Check that the options describe a usable cache.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.default_cache_type.atlas_index().is_none() {
            return Err(Error::InvalidConfig(
                "default cache type must name an atlas collection",
            ));
        }
        if self.max_bounds_for_mips.is_nan() || self.max_bounds_for_mips <= 0.0 {
            return Err(Error::InvalidConfig("max bounds for mips must be positive"));
        }
        if self.min_cache_levels < 0 || self.max_cache_levels < 0 {
            return Err(Error::InvalidConfig("mip level range must not be negative"));
        }
        if self.min_cache_levels > 30 || self.max_cache_levels > 30 {
            return Err(Error::InvalidConfig("mip level range is too wide"));
        }
        if !(0.0..=1.0).contains(&self.memory_pressure) {
            return Err(Error::InvalidConfig("memory pressure must be within 0..=1"));
        }
        if self.atlas.size == 0 || self.atlas.size > u32::from(u16::MAX) {
            return Err(Error::InvalidConfig("atlas size must be within 1..=65535"));
        }
        if self.atlas.texture_count == 0 {
            return Err(Error::InvalidConfig("texture count must be at least one"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = CacheOptions::default();
        assert_eq!(options.validate(), Ok(()));
        assert_eq!(options.atlas.size, 1024);
        assert_eq!(options.atlas.texture_count, 30);
        assert!(options.atlas.webgl_antialias);
        assert!(!options.atlas.canvas_anti_conflation);
        assert_eq!(options.default_cache_type, CacheType::WebGl);
    }

    #[test]
    fn rejects_non_collection_default() {
        for cache_type in [CacheType::Auto, CacheType::NoCache] {
            let options = CacheOptions {
                default_cache_type: cache_type,
                ..Default::default()
            };
            assert!(
                matches!(options.validate(), Err(Error::InvalidConfig(_))),
                "{cache_type:?} must be rejected"
            );
        }
    }

    #[test]
    fn rejects_nan_bounds() {
        let options = CacheOptions {
            max_bounds_for_mips: f64::NAN,
            ..Default::default()
        };
        assert!(options.validate().is_err(), "NaN bounds must be rejected");
    }

    #[test]
    fn rejects_empty_atlas() {
        let options = CacheOptions {
            atlas: AtlasOptions {
                texture_count: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(options.validate().is_err(), "zero pages must be rejected");
    }
}
