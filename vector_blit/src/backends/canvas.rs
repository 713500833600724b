// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Software canvas atlas storage.

use alloc::vec::Vec;

use crate::atlas::{
    AtlasPages, AtlasSlot, AtlasStorage, PageRequests, PlacementError, RasterTarget,
};
use crate::config::AtlasOptions;
use crate::raster::{EntryId, RasterCache};

/// Gutter around each raster when anti-conflation is enabled.
const ANTI_CONFLATION_PADDING: u16 = 2;
const PADDING: u16 = 1;

/// Atlas pages backed by software canvases.
///
/// The application rasterizes the recorded requests with a CPU renderer and
/// keeps one canvas per page. With `canvas_anti_conflation` the gutter is
/// widened so that bilinear sampling of one raster never picks up its
/// neighbours.
#[derive(Debug)]
pub struct CanvasStorage {
    pages: AtlasPages,
}

impl CanvasStorage {
    /// Creates empty canvas storage.
    pub fn new(options: &AtlasOptions) -> Self {
        let anti_conflation = options.canvas_anti_conflation;
        let padding = if anti_conflation {
            ANTI_CONFLATION_PADDING
        } else {
            PADDING
        };
        Self {
            pages: AtlasPages::new(options, padding, RasterTarget::Canvas { anti_conflation }),
        }
    }

    /// The underlying pages.
    #[inline]
    pub fn pages(&self) -> &AtlasPages {
        &self.pages
    }
}

impl AtlasStorage for CanvasStorage {
    fn place(&mut self, entry: &RasterCache) -> Result<AtlasSlot, PlacementError> {
        self.pages.place(entry)
    }

    fn evict(&mut self, entry: EntryId, slot: AtlasSlot) {
        self.pages.evict(entry, slot);
    }

    fn flush(&mut self) -> Vec<PageRequests> {
        self.pages.flush()
    }

    fn clear(&mut self) {
        self.pages.clear();
    }

    fn used_area(&self) -> u64 {
        self.pages.used_area()
    }

    fn capacity(&self) -> u64 {
        self.pages.capacity()
    }

    fn len(&self) -> usize {
        self.pages.len()
    }

    fn page_count(&self) -> usize {
        self.pages.page_count()
    }
}
