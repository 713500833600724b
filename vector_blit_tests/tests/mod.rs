// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! This crate contains the integration test suite for `vector_blit`.
//!
//! - The `util` module contains the fixtures shared by the topic modules.
//! - We do not use the default Rust test harness, but instead use this `mod.rs` file as the
//!   entry point to run all other tests, which makes sharing the fixtures easy.
//! - Put new tests into the module of their topic (`frame`, `mip`, `gc`, `atlas`), and start
//!   the test name with that topic, e.g. `gc_stale_model_releases_rasters`.

#![allow(missing_docs, reason = "we don't need docs for testing")]

mod atlas;
mod frame;
mod util;
