// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas collections: one per cache type that owns storage.

use alloc::vec::Vec;

use super::requests::PageRequests;
use super::slot::AtlasSlot;
use super::storage::{AtlasStorage, PlacementError};
use crate::backends::blitter::BlitterStorage;
use crate::backends::canvas::CanvasStorage;
use crate::config::AtlasOptions;
use crate::raster::{CacheType, EntryId, RasterCache};

/// The closed set of storage backends.
#[derive(Debug)]
pub enum StorageBackend {
    /// Software canvas pages.
    Canvas(CanvasStorage),
    /// GPU texture pages.
    Blitter(BlitterStorage),
}

impl StorageBackend {
    /// The backend used for `cache_type`, or `None` if the type owns no collection.
    pub fn for_cache_type(cache_type: CacheType, options: &AtlasOptions) -> Option<Self> {
        match cache_type {
            CacheType::Canvas2d => Some(Self::Canvas(CanvasStorage::new(options))),
            CacheType::WebGl | CacheType::RuntimeWebGl => {
                Some(Self::Blitter(BlitterStorage::new(options)))
            }
            CacheType::Auto | CacheType::NoCache => None,
        }
    }

    fn storage(&self) -> &dyn AtlasStorage {
        match self {
            Self::Canvas(storage) => storage,
            Self::Blitter(storage) => storage,
        }
    }

    fn storage_mut(&mut self) -> &mut dyn AtlasStorage {
        match self {
            Self::Canvas(storage) => storage,
            Self::Blitter(storage) => storage,
        }
    }
}

impl AtlasStorage for StorageBackend {
    fn place(&mut self, entry: &RasterCache) -> Result<AtlasSlot, PlacementError> {
        self.storage_mut().place(entry)
    }

    fn evict(&mut self, entry: EntryId, slot: AtlasSlot) {
        self.storage_mut().evict(entry, slot);
    }

    fn flush(&mut self) -> Vec<PageRequests> {
        self.storage_mut().flush()
    }

    fn clear(&mut self) {
        self.storage_mut().clear();
    }

    fn used_area(&self) -> u64 {
        self.storage().used_area()
    }

    fn capacity(&self) -> u64 {
        self.storage().capacity()
    }

    fn len(&self) -> usize {
        self.storage().len()
    }

    fn page_count(&self) -> usize {
        self.storage().page_count()
    }
}

/// All atlas pages of one [`CacheType`].
///
/// A `Full` placement marks the collection exhausted: it refuses further
/// placements until the next reclamation pass has had a chance to make room.
#[derive(Debug)]
pub struct AtlasCollection {
    cache_type: CacheType,
    storage: StorageBackend,
    exhausted: bool,
    placement_failures: u64,
}

impl AtlasCollection {
    /// Creates the collection for `cache_type`, or `None` if the type owns no storage.
    pub fn new(cache_type: CacheType, options: &AtlasOptions) -> Option<Self> {
        Some(Self {
            cache_type,
            storage: StorageBackend::for_cache_type(cache_type, options)?,
            exhausted: false,
            placement_failures: 0,
        })
    }

    /// The cache type this collection serves.
    #[inline]
    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    /// The backing storage.
    #[inline]
    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    /// Whether a placement failed for lack of space since the last reclamation pass.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of failed placements over the collection's lifetime.
    #[inline]
    pub fn placement_failures(&self) -> u64 {
        self.placement_failures
    }

    /// Fraction of the capacity currently held.
    pub fn usage(&self) -> f64 {
        let capacity = self.storage.capacity();
        if capacity == 0 {
            return 1.0;
        }
        self.storage.used_area() as f64 / capacity as f64
    }

    /// Place `entry`, reporting failure instead of retrying.
    pub fn place(&mut self, entry: &RasterCache) -> Result<AtlasSlot, PlacementError> {
        if self.exhausted {
            self.placement_failures += 1;
            return Err(PlacementError::Full);
        }
        let result = self.storage.place(entry);
        if let Err(err) = result {
            self.placement_failures += 1;
            if err == PlacementError::Full {
                self.exhausted = true;
            }
        }
        result
    }

    /// Release the slot held by `entry`.
    pub fn evict(&mut self, entry: EntryId, slot: AtlasSlot) {
        self.storage.evict(entry, slot);
    }

    /// Take the pending raster requests.
    pub fn flush(&mut self) -> Vec<PageRequests> {
        self.storage.flush()
    }

    /// Drop every page, as done for runtime collections on each reclamation pass.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.exhausted = false;
    }

    /// Allow placements again after a reclamation pass.
    pub(crate) fn reset_exhausted(&mut self) {
        self.exhausted = false;
    }

    /// Number of placed entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Whether no entry is placed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}
