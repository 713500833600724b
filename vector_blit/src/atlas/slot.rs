// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas slot data structures.

use vello_common::paint::ImageId;

/// Location of a placed raster within an atlas page.
#[derive(Clone, Copy, Debug)]
pub struct AtlasSlot {
    /// The image ID for this raster in the page allocator.
    ///
    /// Used for deallocation and for looking up the atlas page/offset.
    pub image_id: ImageId,

    /// Which atlas page (backing store) contains this raster.
    pub page_index: u32,

    /// X position of the raster's top-left pixel in the page, inside the padding.
    pub x: u16,

    /// Y position of the raster's top-left pixel in the page, inside the padding.
    pub y: u16,

    /// Width of the raster (pixels, excluding padding).
    pub width: u16,

    /// Height of the raster (pixels, excluding padding).
    pub height: u16,

    /// Padding kept free on every side of the raster.
    pub padding: u16,
}

impl AtlasSlot {
    /// Area held in the page, padding included.
    #[inline]
    pub fn padded_area(&self) -> u64 {
        let pad = 2 * u64::from(self.padding);
        (u64::from(self.width) + pad) * (u64::from(self.height) + pad)
    }
}
