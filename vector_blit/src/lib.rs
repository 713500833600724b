// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector Blit decides, once per frame, whether a vector shape is drawn directly or blitted
//! from a cached raster, and manages the atlases those rasters live in.
//!
//! The entry point is [`ShapeCache`]. It runs two control loops over a [`SceneGraph`]:
//!
//! - [`ShapeCache::frame_tick`] walks the scene, touches the liveness of every visible
//!   [`VectorModel`], picks a power-of-two mip level for each sprite and tags the sprite with
//!   the resulting [`CacheType`].
//! - [`ShapeCache::gc_tick`] runs at a lower cadence. It ages every model, releases stale and
//!   low-value rasters when an atlas collection is under pressure, and repacks the short-lived
//!   runtime collection from scratch.
//!
//! Rasterization itself is not performed here. Placing an entry records a
//! [`RasterRequest`](atlas::RasterRequest) for its atlas page; the application drains these
//! with [`ShapeCache::take_raster_requests`], draws them with its renderer of choice and
//! reports completion through [`ShapeCache::mark_ready`].
//!
//! ## Features
//!
//! - `std` (enabled by default): Get floating point functions from the standard library
//!   (likely using your target's libc).
//! - `libm`: Use floating point implementations from [libm].
//!
//! At least one of `std` and `libm` is required; `std` overrides `libm`.
//!
//! [libm]: https://crates.io/crates/libm

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

#[cfg(not(any(feature = "std", feature = "libm")))]
compile_error!("vector_blit requires either the `std` or `libm` feature to be enabled");

// Suppress the unused_crate_dependencies lint when both std and libm are specified.
#[cfg(all(feature = "std", feature = "libm"))]
use core_maths as _;

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub use vello_common::kurbo;

pub mod atlas;
pub mod backends;
pub mod scene;

mod cache;
mod config;
mod error;
mod liveness;
mod mip;
mod model;
mod raster;

pub use cache::{CacheStats, GcReport, ShapeCache};
pub use config::{
    AtlasOptions, CacheOptions, DEFAULT_MAX_BOUNDS_FOR_MIPS, MAX_CACHE_LEVELS, MIN_CACHE_LEVELS,
};
pub use error::Error;
pub use liveness::Liveness;
pub use mip::{MIP_EPSILON, MipSelector};
pub use model::{ModelId, VectorGeometry, VectorModel};
pub use raster::{CacheStatus, CacheType, EntryId, RasterCache};
pub use scene::{SceneGraph, SpriteInfo};
