// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas storage for raster cache entries.
//!
//! This module provides:
//! - [`AtlasStorage`], the capability interface every backend implements
//!   (`place`, `evict`, `flush`)
//! - [`AtlasPages`], the paged allocator the backends share, packing entries
//!   into up to `texture_count` pages through `vello_common`'s image cache
//! - [`AtlasCollection`], one per [`CacheType`](crate::CacheType) that owns
//!   storage, dispatching to a closed set of backends
//! - Deferred [`RasterRequest`]s, grouped per page, for the application to draw
//!
//! The concrete backends live in [`backends`](crate::backends):
//! - [`CanvasStorage`](crate::backends::canvas::CanvasStorage) for software pages
//! - [`BlitterStorage`](crate::backends::blitter::BlitterStorage) for GPU pages

mod collection;
mod requests;
mod slot;
mod storage;

pub use collection::{AtlasCollection, StorageBackend};
pub use requests::{PageRequests, RasterRequest, RasterTarget};
pub use slot::AtlasSlot;
pub use storage::{AtlasPages, AtlasStorage, PlacementError};
