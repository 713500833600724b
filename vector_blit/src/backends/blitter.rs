// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU texture atlas storage.

use alloc::vec::Vec;

use crate::atlas::{
    AtlasPages, AtlasSlot, AtlasStorage, PageRequests, PlacementError, RasterTarget,
};
use crate::config::AtlasOptions;
use crate::raster::{EntryId, RasterCache};

/// Atlas pages backed by GPU textures.
///
/// Serves both the persistent `WebGl` collection and the `RuntimeWebGl`
/// collection that is cleared and repacked on every reclamation pass. No
/// pixels are held here; the renderer owns the textures and draws the
/// flushed requests into them.
#[derive(Debug)]
pub struct BlitterStorage {
    pages: AtlasPages,
}

impl BlitterStorage {
    /// Creates empty texture storage.
    pub fn new(options: &AtlasOptions) -> Self {
        let target = RasterTarget::Gpu {
            antialias: options.webgl_antialias,
        };
        Self {
            pages: AtlasPages::new(options, 1, target),
        }
    }

    /// The underlying pages.
    #[inline]
    pub fn pages(&self) -> &AtlasPages {
        &self.pages
    }
}

impl AtlasStorage for BlitterStorage {
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
