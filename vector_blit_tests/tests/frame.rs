// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame visit loop tests.

use vector_blit::kurbo::{Affine, BezPath, Vec2};
use vector_blit::scene::SceneGraph;
use vector_blit::{CacheOptions, CacheStats, CacheType, EntryId, Error, ShapeCache, SpriteInfo};

use crate::util::{CacheEnv, rect, square};

#[test]
fn frame_zoom_within_bracket_reuses_raster() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let root = env.stage.root();
    let (model, a) = env.add_sprite(square(200.0), Affine::scale(3.0));
    let b = env.instance(root, model, Affine::scale(3.5));

    env.frame();

    assert_eq!(env.stage.cache_type(a), CacheType::WebGl);
    assert_eq!(env.stage.cache_type(b), CacheType::WebGl);
    let raster = env.stage.raster(a).unwrap();
    assert_eq!(env.stage.raster(b), Some(raster));
    assert_eq!(env.cache.entry(raster).unwrap().level(), 2);
    assert_eq!(env.cache.entries().count(), 1);

    let stats = env.cache.stats();
    assert_eq!((stats.misses, stats.hits), (1, 1));
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 1);
}

#[test]
fn frame_oversized_shape_is_drawn_directly() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, sprite) = env.add_sprite(rect(2000.0, 1500.0), Affine::IDENTITY);

    env.frame();

    assert_eq!(env.stage.cache_type(sprite), CacheType::NoCache);
    assert_eq!(env.stage.raster(sprite), None);
    assert_eq!(env.cache.entries().count(), 0);
    assert_eq!(env.cache.stats().rejections, 1);
    // Drawn directly still counts as drawn.
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 1);
}

#[test]
fn frame_empty_geometry_is_skipped() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, sprite) = env.add_sprite(BezPath::new(), Affine::IDENTITY);

    env.frame();

    assert_eq!(env.stage.cache_type(sprite), CacheType::Auto);
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 0);
    assert_eq!(env.cache.stats().skipped_empty, 1);
    assert_eq!(env.cache.entries().count(), 0);
}

#[test]
fn frame_emptied_geometry_keeps_last_annotation() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, sprite) = env.add_sprite(square(10.0), Affine::IDENTITY);
    env.frame();
    assert_eq!(env.stage.cache_type(sprite), CacheType::WebGl);
    let raster = env.stage.raster(sprite).unwrap();

    let mut only_move = BezPath::new();
    only_move.move_to((1.0, 1.0));
    env.cache.set_geometry(model, only_move).unwrap();
    env.frame();

    assert_eq!(env.stage.cache_type(sprite), CacheType::WebGl);
    // The annotation is stale: its raster went away with the old geometry.
    assert_eq!(env.stage.raster(sprite), Some(raster));
    assert!(env.cache.entry(raster).is_none());
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 1);
    assert_eq!(env.cache.entries().count(), 0);
}

#[test]
fn frame_pruned_subtree_is_untouched() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let hidden = env.stage.add_container(env.stage.root());
    let (model, sprite) = env.add_sprite_in(hidden, square(10.0), Affine::IDENTITY);

    env.frame();

    assert_eq!(env.stage.cache_type(sprite), CacheType::Auto);
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 0);

    env.stage.set_vector_children(hidden, true);
    env.frame();
    assert_eq!(env.stage.cache_type(sprite), CacheType::WebGl);
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 2);
}

#[test]
fn frame_empty_scene_only_advances_the_clock() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let model = env.cache.add_model(square(10.0));
    env.frame();
    env.frame();
    assert_eq!(env.cache.frame_num(), 2);
    assert_eq!(env.cache.model(model).unwrap().liveness().last_frame_touched(), 0);
    assert_eq!(env.cache.stats(), CacheStats::default());
}

#[test]
fn frame_unknown_model_is_an_error() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (model, _) = env.add_sprite(square(10.0), Affine::IDENTITY);
    env.cache.remove_model(model).unwrap();

    let err = env.cache.frame_tick(&mut env.stage).unwrap_err();
    assert_eq!(err, Error::UnknownModel(model));
}

#[test]
fn frame_translation_does_not_change_raster() {
    let mut env = CacheEnv::new(CacheOptions::default());
    let (_, sprite) = env.add_sprite(square(50.0), Affine::scale(0.5));
    env.frame();
    let raster = env.stage.raster(sprite);

    for offset in [Vec2::new(0.3, 0.7), Vec2::new(-400.0, 1200.5)] {
        env.stage.set_transform(sprite, Affine::translate(offset) * Affine::scale(0.5));
        env.frame();
        assert_eq!(env.stage.raster(sprite), raster);
    }
    assert_eq!(env.cache.entries().count(), 1);
}

/// A flat tree that records the order of annotations.
struct Recorder {
    children: Vec<Vec<usize>>,
    vector_children: Vec<bool>,
    sprites: Vec<Option<SpriteInfo>>,
    annotated: Vec<usize>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            children: vec![Vec::new()],
            vector_children: vec![true],
            sprites: vec![None],
            annotated: Vec::new(),
        }
    }

    fn add(&mut self, parent: usize, sprite: Option<SpriteInfo>, vector_children: bool) -> usize {
        let node = self.children.len();
        self.children.push(Vec::new());
        self.vector_children.push(vector_children);
        self.sprites.push(sprite);
        self.children[parent].push(node);
        node
    }
}

impl SceneGraph for Recorder {
    type Node = usize;

    fn root(&self) -> usize {
        0
    }

    fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    fn has_vector_children(&self, node: usize) -> bool {
        self.vector_children[node]
    }

    fn sprite(&self, node: usize) -> Option<SpriteInfo> {
        self.sprites[node]
    }

    fn set_cache_type(&mut self, node: usize, _: CacheType, _: Option<EntryId>) {
        self.annotated.push(node);
    }
}

#[test]
fn frame_visits_in_pre_order() {
    let mut cache: ShapeCache = ShapeCache::new(CacheOptions::default()).unwrap();
    let model = cache.add_model(square(8.0));
    let sprite = Some(SpriteInfo {
        model,
        world_transform: Affine::IDENTITY,
    });

    let mut tree = Recorder::new();
    let left = tree.add(0, None, true);
    let l1 = tree.add(left, sprite, false);
    let l2 = tree.add(left, sprite, true);
    let l2a = tree.add(l2, sprite, false);
    let pruned = tree.add(0, None, false);
    tree.add(pruned, sprite, false);
    let right = tree.add(0, sprite, false);

    cache.frame_tick(&mut tree).unwrap();
    assert_eq!(tree.annotated, [l1, l2, l2a, right]);
}
