// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred rasterization requests.
//!
//! Placing an entry does not draw anything. Instead the storage backend records
//! a [`RasterRequest`] into the [`PageRequests`] of the page the entry landed
//! on. At render time the application drains the pending pages with
//! [`ShapeCache::take_raster_requests`](crate::ShapeCache::take_raster_requests),
//! draws each request's model into its page with the given transform, and
//! reports the entries as ready.

use alloc::vec::Vec;

use crate::kurbo::{Affine, Rect};
use crate::model::ModelId;
use crate::raster::EntryId;

use super::AtlasSlot;

/// How the backend expects a request to be drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RasterTarget {
    /// Software canvas page.
    Canvas {
        /// Whether the gutter around the raster was widened against colour bleeding.
        anti_conflation: bool,
    },
    /// GPU texture page.
    Gpu {
        /// Whether the rasterizer should antialias.
        antialias: bool,
    },
}

/// One model to draw into one atlas slot.
#[derive(Clone, Debug)]
pub struct RasterRequest {
    /// The entry that becomes ready once this request is drawn.
    pub entry: EntryId,
    /// The model to draw.
    pub model: ModelId,
    /// Where in the page the raster goes.
    pub slot: AtlasSlot,
    /// Maps model space to page pixels (mip scale followed by the slot offset).
    pub transform: Affine,
    /// Drawing hints from the backend.
    pub target: RasterTarget,
}

impl RasterRequest {
    /// The page rectangle the raster covers, excluding padding.
    pub fn dest_rect(&self) -> Rect {
        let x = f64::from(self.slot.x);
        let y = f64::from(self.slot.y);
        Rect::new(
            x,
            y,
            x + f64::from(self.slot.width),
            y + f64::from(self.slot.height),
        )
    }
}

/// Requests recorded for a single atlas page.
pub struct PageRequests {
    /// Which atlas page these requests target.
    pub page_index: u32,
    /// The recorded requests, in placement order.
    pub requests: Vec<RasterRequest>,
    /// Width of the atlas page (pixels).
    width: u16,
    /// Height of the atlas page (pixels).
    height: u16,
}

impl PageRequests {
    /// Create an empty recorder for the given atlas page.
    pub fn new(page_index: u32, width: u16, height: u16) -> Self {
        Self {
            page_index,
            requests: Vec::new(),
            width,
            height,
        }
    }

    /// Width of the atlas page in pixels.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height of the atlas page in pixels.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Record a request.
    pub fn push(&mut self, request: RasterRequest) {
        self.requests.push(request);
    }

    /// Drop any request for `entry`, returning whether one was found.
    pub fn cancel(&mut self, entry: EntryId) -> bool {
        let before = self.requests.len();
        self.requests.retain(|request| request.entry != entry);
        self.requests.len() != before
    }

    /// Whether nothing is recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl core::fmt::Debug for PageRequests {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageRequests")
            .field("page_index", &self.page_index)
            .field("requests", &self.requests.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
