// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector models and the geometry interface they wrap.

use core::fmt;

use smallvec::SmallVec;

use crate::kurbo::{Affine, BezPath, ParamCurveExtrema, PathEl, Rect, Shape};
use crate::liveness::Liveness;
use crate::raster::EntryId;

/// Handle to a [`VectorModel`] registered with a [`ShapeCache`](crate::ShapeCache).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) u32);

impl ModelId {
    /// Returns the raw id (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelId({})", self.0)
    }
}

/// The drawable shape behind a [`VectorModel`].
///
/// The cache never looks at path data itself. It only needs bounds under a
/// transform and whether there is anything to draw at all.
pub trait VectorGeometry {
    /// Bounds in the model's own coordinate space.
    fn local_bounds(&self) -> Rect;

    /// Number of sub-paths that contain at least one segment.
    fn sub_path_count(&self) -> usize;

    /// Whether there is nothing to draw.
    #[inline]
    fn is_empty(&self) -> bool {
        self.sub_path_count() == 0
    }

    /// Axis-aligned bounds of the geometry after applying `transform`.
    ///
    /// The default transforms the local bounding box, which over-estimates
    /// under rotation; implementations with access to the path should do better.
    fn world_bounds(&self, transform: Affine) -> Rect {
        transform.transform_rect_bbox(self.local_bounds())
    }
}

impl VectorGeometry for BezPath {
    fn local_bounds(&self) -> Rect {
        Shape::bounding_box(self)
    }

    fn sub_path_count(&self) -> usize {
        let mut count = 0;
        let mut open_has_segment = false;
        for el in self.elements() {
            match el {
                PathEl::MoveTo(_) => {
                    if open_has_segment {
                        count += 1;
                    }
                    open_has_segment = false;
                }
                PathEl::LineTo(_) | PathEl::QuadTo(..) | PathEl::CurveTo(..) => {
                    open_has_segment = true;
                }
                PathEl::ClosePath => {}
            }
        }
        if open_has_segment {
            count += 1;
        }
        count
    }

    fn world_bounds(&self, transform: Affine) -> Rect {
        self.segments()
            .map(|seg| ParamCurveExtrema::bounding_box(&(transform * seg)))
            .reduce(|acc, bbox| acc.union(bbox))
            .unwrap_or_else(|| transform.transform_rect_bbox(self.local_bounds()))
    }
}

/// One distinct vector shape and the rasters cached for it.
///
/// Rasters are kept in a sparse array indexed by mip level: not every level
/// needs to exist, but no level ever holds two entries.
#[derive(Clone, Debug)]
pub struct VectorModel<G> {
    geometry: G,
    /// Slot `i` holds the entry for level `i + base_level`.
    mips: SmallVec<[Option<EntryId>; 8]>,
    base_level: i32,
    liveness: Liveness,
}

impl<G: VectorGeometry> VectorModel<G> {
    pub(crate) fn new(geometry: G, min_cache_levels: i32, gc_num: u64) -> Self {
        Self {
            geometry,
            mips: SmallVec::new(),
            base_level: -min_cache_levels,
            liveness: Liveness::new(gc_num),
        }
    }

    /// The shape this model rasterizes.
    #[inline]
    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    /// When the model was last drawn and which GC pass it last survived.
    #[inline]
    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    #[inline]
    pub(crate) fn liveness_mut(&mut self) -> &mut Liveness {
        &mut self.liveness
    }

    pub(crate) fn replace_geometry(&mut self, geometry: G) -> G {
        core::mem::replace(&mut self.geometry, geometry)
    }

    pub(crate) fn into_geometry(self) -> G {
        self.geometry
    }

    fn slot_index(&self, level: i32) -> Option<usize> {
        usize::try_from(level - self.base_level).ok()
    }

    /// The entry cached for `level`, if any.
    pub fn mip(&self, level: i32) -> Option<EntryId> {
        let idx = self.slot_index(level)?;
        self.mips.get(idx).copied().flatten()
    }

    /// All cached levels with their entries, lowest level first.
    pub fn mips(&self) -> impl Iterator<Item = (i32, EntryId)> + '_ {
        let base = self.base_level;
        self.mips.iter().zip(base..).filter_map(|(slot, level)| {
            let entry = (*slot)?;
            Some((level, entry))
        })
    }

    /// Number of cached levels.
    pub fn mip_count(&self) -> usize {
        self.mips.iter().filter(|slot| slot.is_some()).count()
    }

    /// Store `entry` for `level`, growing the sparse array as needed.
    ///
    /// # Panics
    ///
    /// Panics if `level` lies below the lowest mip level or already holds an entry.
    pub(crate) fn set_mip(&mut self, level: i32, entry: EntryId) {
        let Some(idx) = self.slot_index(level) else {
            panic!("mip level {level} lies below the configured range");
        };
        if self.mips.len() <= idx {
            self.mips.resize(idx + 1, None);
        }
        assert!(
            self.mips[idx].is_none(),
            "mip level {level} already holds an entry"
        );
        self.mips[idx] = Some(entry);
    }

    /// Forget the entry stored for `level`, returning it.
    pub(crate) fn clear_mip(&mut self, level: i32) -> Option<EntryId> {
        let idx = self.slot_index(level)?;
        self.mips.get_mut(idx).and_then(Option::take)
    }

    /// Forget all entries, returning them.
    pub(crate) fn clear_mips(&mut self) -> SmallVec<[EntryId; 8]> {
        let entries = self.mips.iter().flatten().copied().collect();
        self.mips.clear();
        entries
    }
}
