// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Atlas placement, overflow and raster request tests.

use vector_blit::atlas::RasterTarget;
use vector_blit::kurbo::{Affine, Point, Vec2};
use vector_blit::{AtlasOptions, CacheOptions, CacheStatus, CacheType, Error};

use crate::util::{CacheEnv, small_atlas, square};

#[test]
fn atlas_overflow_falls_back_to_runtime_then_direct() {
    let mut env = CacheEnv::new(small_atlas(64));
    let (_, first) = env.add_sprite(square(40.0), Affine::IDENTITY);
    let (_, second) = env.add_sprite(square(40.0), Affine::IDENTITY);
    let (_, third) = env.add_sprite(square(40.0), Affine::IDENTITY);

    env.frame();

    assert_eq!(env.stage.cache_type(first), CacheType::WebGl);
    assert_eq!(env.stage.cache_type(second), CacheType::RuntimeWebGl);
    assert_eq!(env.stage.cache_type(third), CacheType::NoCache);
    assert_eq!(env.stage.raster(third), None);
    assert_eq!(env.cache.stats().placement_failures, 1);
    assert!(env.cache.atlas(CacheType::WebGl).unwrap().is_exhausted());

    // The unplaced raster stays registered and keeps retrying cheaply.
    assert_eq!(env.cache.entries().count(), 3);
    env.frame();
    assert_eq!(env.stage.cache_type(third), CacheType::NoCache);
    assert_eq!(env.cache.stats().placement_failures, 2);
    assert_eq!(env.stage.cache_type(first), CacheType::WebGl);
}

#[test]
fn atlas_requests_map_raster_into_slot() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, sprite) = env.add_sprite(
        square(20.0),
        Affine::translate(Vec2::new(100.0, 50.0)) * Affine::scale(1.5),
    );
    env.frame();
    let raster = env.stage.raster(sprite).unwrap();

    let pages = env.cache.take_raster_requests(CacheType::WebGl);
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].width(), 1024);
    assert_eq!(pages[0].requests.len(), 1);
    let request = &pages[0].requests[0];
    assert_eq!(request.entry, raster);
    assert_eq!(request.model, model);
    assert_eq!(request.target, RasterTarget::Gpu { antialias: true });

    // Level 1 rasterizes at 2x, so the 20px square covers 40x40 page pixels.
    let dest = request.dest_rect();
    assert_eq!((dest.width(), dest.height()), (40.0, 40.0));
    assert_eq!(request.transform * Point::ORIGIN, dest.origin());
    assert_eq!(request.transform * Point::new(20.0, 20.0), Point::new(dest.x1, dest.y1));

    assert!(env.cache.take_raster_requests(CacheType::WebGl).is_empty());
    assert!(env.cache.take_raster_requests(CacheType::NoCache).is_empty());
}

#[test]
fn atlas_mark_ready_after_drawing() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (_, sprite) = env.add_sprite(square(12.0), Affine::IDENTITY);
    env.frame();
    let raster = env.stage.raster(sprite).unwrap();

    let entry = env.cache.entry(raster).unwrap();
    assert_eq!(entry.status(), CacheStatus::Init);
    assert!(!entry.is_ready());

    assert_eq!(env.draw_pending(), 1);
    let entry = env.cache.entry(raster).unwrap();
    assert_eq!(entry.status(), CacheStatus::Ready);
    assert!(entry.is_ready());

    // Later frames blit the same raster without asking for it again.
    env.frame();
    assert_eq!(env.draw_pending(), 0);
    assert_eq!(env.cache.mark_ready(raster), Ok(()));
}

#[test]
fn atlas_mark_ready_rejects_unknown_and_unplaced() {
    let mut env = CacheEnv::new(small_atlas(64));
    env.add_sprite(square(40.0), Affine::IDENTITY);
    env.add_sprite(square(40.0), Affine::IDENTITY);
    let (_, direct) = env.add_sprite(square(40.0), Affine::IDENTITY);
    env.frame();
    assert_eq!(env.stage.cache_type(direct), CacheType::NoCache);

    let unplaced = env
        .cache
        .entries()
        .find(|entry| entry.slot().is_none())
        .map(|entry| entry.id())
        .unwrap();
    assert_eq!(env.cache.mark_ready(unplaced), Err(Error::NotPlaced(unplaced)));

    env.cache.clear();
    assert_eq!(
        env.cache.mark_ready(unplaced),
        Err(Error::UnknownEntry(unplaced))
    );
}

#[test]
fn atlas_canvas_default_with_anti_conflation() {
    let mut env = CacheEnv::new(CacheOptions {
        default_cache_type: CacheType::Canvas2d,
        atlas: AtlasOptions {
            canvas_anti_conflation: true,
            ..Default::default()
        },
        ..Default::default()
    });
    let (_, sprite) = env.add_sprite(square(10.0), Affine::IDENTITY);
    env.frame();

    assert_eq!(env.stage.cache_type(sprite), CacheType::Canvas2d);
    let raster = env.stage.raster(sprite).unwrap();
    let slot = env.cache.entry(raster).unwrap().slot().unwrap();
    assert_eq!(slot.padding, 2);
    assert_eq!(slot.padded_area(), 14 * 14);

    let pages = env.cache.take_raster_requests(CacheType::Canvas2d);
    assert_eq!(
        pages[0].requests[0].target,
        RasterTarget::Canvas {
            anti_conflation: true
        }
    );
    assert!(env.cache.atlas(CacheType::WebGl).unwrap().is_empty());
}

#[test]
fn atlas_oversized_raster_does_not_exhaust() {
    // 40px at level 1 is an 80px raster, which never fits a 64px page.
    let mut env = CacheEnv::new(small_atlas(64));
    let (_, large) = env.add_sprite(square(40.0), Affine::scale(2.0));
    let (_, small) = env.add_sprite(square(10.0), Affine::IDENTITY);
    env.frame();

    assert_eq!(env.stage.cache_type(large), CacheType::NoCache);
    assert_eq!(env.stage.cache_type(small), CacheType::WebGl);
    assert!(!env.cache.atlas(CacheType::WebGl).unwrap().is_exhausted());
}

#[test]
fn atlas_clear_releases_everything() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, sprite) = env.add_sprite(square(10.0), Affine::IDENTITY);
    env.frame();
    let before = env.stage.raster(sprite).unwrap();

    env.cache.clear();
    assert_eq!(env.cache.entries().count(), 0);
    assert_eq!(env.cache.model(model).unwrap().mip_count(), 0);
    for cache_type in CacheType::COLLECTIONS {
        assert!(env.cache.atlas(cache_type).unwrap().is_empty());
    }

    env.frame();
    let after = env.stage.raster(sprite).unwrap();
    assert_ne!(before, after, "entry ids are never reused");
    assert_eq!(env.stage.cache_type(sprite), CacheType::WebGl);
}

#[test]
fn atlas_oversized_mip_is_not_retried() {
    let mut env = CacheEnv::new(CacheOptions::default());
    // 707px on screen is small enough to cache, but level 1 doubles it past the page.
    let (_, sprite) = env.add_sprite(square(700.0), Affine::scale(1.01));

    for _ in 0..3 {
        env.frame();
        assert_eq!(env.stage.cache_type(sprite), CacheType::NoCache);
    }
    let entry = env.cache.entries().next().unwrap();
    assert!(entry.is_oversized());
    assert!(entry.slot().is_none());

    let stats = env.cache.stats();
    assert_eq!(stats.placement_failures, 0);
    assert_eq!(stats.rejections, 3);
    let webgl = env.cache.atlas(CacheType::WebGl).unwrap();
    assert_eq!(webgl.placement_failures(), 1);
    assert!(!webgl.is_exhausted());
}
