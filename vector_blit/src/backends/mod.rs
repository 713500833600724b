// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storage backends for the atlas collections.
//!
//! Both backends share the paged allocator in [`AtlasPages`](crate::atlas::AtlasPages)
//! and differ only in the gutter they keep around each raster and the drawing
//! hints attached to their requests.

pub mod blitter;
pub mod canvas;
