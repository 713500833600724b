// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paged atlas storage shared by the backends.

use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use smallvec::SmallVec;
use vello_common::image_cache::ImageCache;
use vello_common::multi_atlas::AtlasConfig;

use super::requests::{PageRequests, RasterRequest, RasterTarget};
use super::slot::AtlasSlot;
use crate::config::AtlasOptions;
use crate::kurbo::{Affine, Vec2};
use crate::raster::{EntryId, RasterCache};

// ---------------------------------------------------------------------------
// AtlasStorage trait: the capability interface of every backend
// ---------------------------------------------------------------------------

/// Common interface of the atlas storage backends.
///
/// The orchestrator only ever talks to storage through this trait, so a
/// collection can swap its backing stores without the caching policy noticing.
/// Packing is entirely up to the implementation.
pub trait AtlasStorage {
    /// Reserve space for `entry` and record a raster request for it.
    ///
    /// Failure is a signal for the reclamation pass, never a fatal condition.
    fn place(&mut self, entry: &RasterCache) -> Result<AtlasSlot, PlacementError>;

    /// Release the space held by `entry`, dropping its pending request if any.
    fn evict(&mut self, entry: EntryId, slot: AtlasSlot);

    /// Take all pending requests (one recorder per dirty page), leaving none behind.
    fn flush(&mut self) -> Vec<PageRequests>;

    /// Release every page and pending request.
    fn clear(&mut self);

    /// Page area currently held by placed entries, padding included.
    fn used_area(&self) -> u64;

    /// Total page area this storage may ever hold.
    fn capacity(&self) -> u64;

    /// Number of placed entries.
    fn len(&self) -> usize;

    /// Whether no entry is placed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of pages touched since the last [`clear`](Self::clear).
    fn page_count(&self) -> usize;
}

/// Why an entry could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementError {
    /// Every page is full, and no more pages may be created.
    Full,
    /// The padded raster is larger than a page; it never fits.
    TooLarge {
        /// Padded width in pixels.
        width: u32,
        /// Padded height in pixels.
        height: u32,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("atlas collection is full"),
            Self::TooLarge { width, height } => {
                write!(f, "raster of {width}x{height} pixels exceeds the atlas page")
            }
        }
    }
}

impl core::error::Error for PlacementError {}

// ---------------------------------------------------------------------------
// AtlasPages: the paged allocator behind both backends
// ---------------------------------------------------------------------------

/// Up to `texture_count` square pages packed through an [`ImageCache`].
///
/// Holds the allocator, the area accounting and the per-page request
/// recorders. Does **not** draw anything; that is left to whoever drains the
/// requests.
pub struct AtlasPages {
    image_cache: ImageCache,
    page_size: u16,
    max_pages: usize,
    /// Gutter kept free on every side of each raster.
    padding: u16,
    target: RasterTarget,
    used_area: u64,
    resident: usize,
    page_count: usize,
    /// Pending requests, indexed by page.
    /// Uses `SmallVec` with inline capacity of 1 because most scenes fit in a
    /// single page.
    pending: SmallVec<[Option<PageRequests>; 1]>,
}

impl AtlasPages {
    /// Creates empty storage. Pages are allocated lazily.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "atlas size is validated to fit in u16"
    )]
    pub fn new(options: &AtlasOptions, padding: u16, target: RasterTarget) -> Self {
        let page_size = options.size.min(u32::from(u16::MAX)) as u16;
        let max_pages = options.texture_count as usize;
        Self {
            image_cache: ImageCache::new_with_config(atlas_config(page_size, max_pages)),
            page_size,
            max_pages,
            padding,
            target,
            used_area: 0,
            resident: 0,
            page_count: 0,
            pending: SmallVec::new(),
        }
    }

    /// Edge length of each page in pixels.
    #[inline]
    pub fn page_size(&self) -> u16 {
        self.page_size
    }

    /// Gutter kept free on every side of each raster.
    #[inline]
    pub fn padding(&self) -> u16 {
        self.padding
    }

    /// Get (or create) the request recorder for the given page.
    fn recorder_for_page(&mut self, page_index: u32) -> &mut PageRequests {
        let idx = page_index as usize;
        if self.pending.len() <= idx {
            self.pending.resize_with(idx + 1, || None);
        }
        let size = self.page_size;
        self.pending[idx].get_or_insert_with(|| PageRequests::new(page_index, size, size))
    }
}

impl AtlasStorage for AtlasPages {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "sizes are checked against the u16 page size first"
    )]
    fn place(&mut self, entry: &RasterCache) -> Result<AtlasSlot, PlacementError> {
        let (width, height) = entry.pixel_size();
        let gutter = 2 * u32::from(self.padding);
        let padded_w = width.saturating_add(gutter);
        let padded_h = height.saturating_add(gutter);
        let page = u32::from(self.page_size);
        if padded_w > page || padded_h > page {
            return Err(PlacementError::TooLarge {
                width: padded_w,
                height: padded_h,
            });
        }

        let image_id = self
            .image_cache
            .allocate(padded_w, padded_h)
            .map_err(|_| PlacementError::Full)?;
        let Some(resource) = self.image_cache.get(image_id) else {
            self.image_cache.deallocate(image_id);
            return Err(PlacementError::Full);
        };
        let page_index = resource.atlas_id.as_u32();

        // Offset by padding to position the raster inside its padded region.
        let slot = AtlasSlot {
            image_id,
            page_index,
            x: resource.offset[0] + self.padding,
            y: resource.offset[1] + self.padding,
            width: width as u16,
            height: height as u16,
            padding: self.padding,
        };

        let origin = entry.pixel_rect().origin();
        let to_slot = Vec2::new(f64::from(slot.x) - origin.x, f64::from(slot.y) - origin.y);
        let request = RasterRequest {
            entry: entry.id(),
            model: entry.model(),
            slot,
            transform: Affine::translate(to_slot) * entry.transform(),
            target: self.target,
        };
        self.recorder_for_page(page_index).push(request);

        self.used_area += slot.padded_area();
        self.resident += 1;
        self.page_count = self.page_count.max(page_index as usize + 1);
        log::trace!(
            "placed {:?} at page {page_index} ({}, {}) size {width}x{height}",
            entry.id(),
            slot.x,
            slot.y
        );
        Ok(slot)
    }

    fn evict(&mut self, entry: EntryId, slot: AtlasSlot) {
        self.image_cache.deallocate(slot.image_id);
        self.used_area = self.used_area.saturating_sub(slot.padded_area());
        self.resident = self.resident.saturating_sub(1);
        if let Some(Some(page)) = self.pending.get_mut(slot.page_index as usize) {
            page.cancel(entry);
        }
    }

    fn flush(&mut self) -> Vec<PageRequests> {
        core::mem::take(&mut self.pending)
            .into_iter()
            .flatten()
            .filter(|page| !page.is_empty())
            .collect()
    }

    fn clear(&mut self) {
        self.image_cache = ImageCache::new_with_config(atlas_config(self.page_size, self.max_pages));
        self.used_area = 0;
        self.resident = 0;
        self.page_count = 0;
        self.pending.clear();
    }

    #[inline]
    fn used_area(&self) -> u64 {
        self.used_area
    }

    #[inline]
    fn capacity(&self) -> u64 {
        let page = u64::from(self.page_size);
        page * page * self.max_pages as u64
    }

    #[inline]
    fn len(&self) -> usize {
        self.resident
    }

    #[inline]
    fn page_count(&self) -> usize {
        self.page_count
    }
}

impl Debug for AtlasPages {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtlasPages")
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("padding", &self.padding)
            .field("resident", &self.resident)
            .field("used_area", &self.used_area)
            .finish_non_exhaustive()
    }
}

fn atlas_config(page_size: u16, max_pages: usize) -> AtlasConfig {
    AtlasConfig {
        initial_atlas_count: 0,
        max_atlases: max_pages as _,
        atlas_size: (u32::from(page_size), u32::from(page_size)),
        auto_grow: true,
        ..Default::default()
    }
}
