// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster cache entries: one rasterized mip level of one model.

#[cfg(feature = "libm")]
#[allow(unused_imports, reason = "not needed when std is also enabled")]
use core_maths::CoreFloat;

use core::fmt;

use crate::atlas::AtlasSlot;
use crate::kurbo::{Affine, Rect};
use crate::model::ModelId;

/// How a sprite is drawn this frame, and which atlas collection an entry lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheType {
    /// Not decided yet; resolves to [`CacheOptions::default_cache_type`](crate::CacheOptions::default_cache_type).
    #[default]
    Auto,
    /// Software-rendered atlas.
    Canvas2d,
    /// GPU atlas kept across GC passes.
    WebGl,
    /// GPU atlas rebuilt on every GC pass.
    RuntimeWebGl,
    /// Draw the vector shape directly.
    NoCache,
}

impl CacheType {
    /// Types that own an atlas collection, in collection order.
    pub const COLLECTIONS: [Self; 3] = [Self::Canvas2d, Self::WebGl, Self::RuntimeWebGl];

    /// Index of this type's atlas collection, if it has one.
    #[inline]
    pub const fn atlas_index(self) -> Option<usize> {
        match self {
            Self::Canvas2d => Some(0),
            Self::WebGl => Some(1),
            Self::RuntimeWebGl => Some(2),
            Self::Auto | Self::NoCache => None,
        }
    }

    /// Whether entries of this type survive across GC passes.
    #[inline]
    pub const fn is_persistent(self) -> bool {
        matches!(self, Self::Canvas2d | Self::WebGl)
    }
}

/// Lifecycle state of a [`RasterCache`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CacheStatus {
    /// Decided upon; not rasterized at its current slot yet.
    #[default]
    Init,
    /// Rasterized and resident in an atlas.
    Ready,
}

/// Globally unique id of a [`RasterCache`]. Ids are never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub(crate) u32);

impl EntryId {
    /// Returns the raw id (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

/// One rasterized mip level of one [`VectorModel`](crate::VectorModel).
///
/// Entries are created lazily by [`ShapeCache::mip_behaviour`](crate::ShapeCache::mip_behaviour)
/// and destroyed only by the reclamation pass or by removing their model.
#[derive(Clone, Debug)]
pub struct RasterCache {
    pub(crate) id: EntryId,
    pub(crate) model: ModelId,
    pub(crate) level: i32,
    pub(crate) transform: Affine,
    pub(crate) bounds: Rect,
    pub(crate) cache_type: CacheType,
    pub(crate) status: CacheStatus,
    pub(crate) slot: Option<AtlasSlot>,
    pub(crate) last_frame_used: u64,
    /// Set once every collection refused the raster as larger than a page.
    pub(crate) oversized: bool,
}

impl RasterCache {
    pub(crate) fn new(
        id: EntryId,
        model: ModelId,
        level: i32,
        transform: Affine,
        bounds: Rect,
        frame_num: u64,
    ) -> Self {
        Self {
            id,
            model,
            level,
            transform,
            bounds,
            cache_type: CacheType::Auto,
            status: CacheStatus::Init,
            slot: None,
            last_frame_used: frame_num,
            oversized: false,
        }
    }

    /// The entry's unique id.
    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// The model this entry rasterizes.
    #[inline]
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// The mip level. Negative levels are minified, non-negative levels magnified.
    #[inline]
    pub fn level(&self) -> i32 {
        self.level
    }

    /// The scale-only transform the raster is produced with.
    #[inline]
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Bounds of the model under [`transform`](Self::transform).
    #[inline]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The collection this entry is assigned to.
    #[inline]
    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    /// Whether the raster has been drawn into its slot.
    #[inline]
    pub fn status(&self) -> CacheStatus {
        self.status
    }

    /// Where the entry sits in its atlas, if it is placed.
    #[inline]
    pub fn slot(&self) -> Option<AtlasSlot> {
        self.slot
    }

    /// The last frame a sprite resolved to this entry.
    #[inline]
    pub fn last_frame_used(&self) -> u64 {
        self.last_frame_used
    }

    /// Whether the raster turned out larger than any atlas page.
    ///
    /// The size of a mip level never changes, so such an entry is drawn
    /// directly without asking the atlases again.
    #[inline]
    pub fn is_oversized(&self) -> bool {
        self.oversized
    }

    /// Whether the entry can be blitted right now.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.status == CacheStatus::Ready && self.slot.is_some()
    }

    /// The bounds grown outwards to whole pixels.
    pub fn pixel_rect(&self) -> Rect {
        Rect::new(
            self.bounds.x0.floor(),
            self.bounds.y0.floor(),
            self.bounds.x1.ceil(),
            self.bounds.y1.ceil(),
        )
    }

    /// Width and height of the raster in whole pixels, saturating at `u32::MAX`.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "float to int casts saturate, which is what we want for oversized rasters"
    )]
    pub fn pixel_size(&self) -> (u32, u32) {
        let rect = self.pixel_rect();
        (rect.width().max(0.0) as u32, rect.height().max(0.0) as u32)
    }
}
