// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixtures shared across tests.

use vector_blit::kurbo::{Affine, BezPath, Rect, Shape};
use vector_blit::scene::{NodeId, Stage};
use vector_blit::{AtlasOptions, CacheOptions, CacheType, ModelId, ShapeCache};

/// An axis-aligned rectangle path from the origin.
pub(crate) fn rect(width: f64, height: f64) -> BezPath {
    Rect::new(0.0, 0.0, width, height).to_path(0.1)
}

pub(crate) fn square(size: f64) -> BezPath {
    rect(size, size)
}

/// Options with a single small atlas page per collection.
pub(crate) fn small_atlas(size: u32) -> CacheOptions {
    CacheOptions {
        atlas: AtlasOptions {
            size,
            texture_count: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// A cache together with a stage whose root opts into vector content.
pub(crate) struct CacheEnv {
    pub(crate) cache: ShapeCache,
    pub(crate) stage: Stage,
}

impl CacheEnv {
    pub(crate) fn new(options: CacheOptions) -> Self {
        let mut stage = Stage::new();
        stage.set_vector_children(stage.root(), true);
        Self {
            cache: ShapeCache::new(options).unwrap(),
            stage,
        }
    }

    /// Adds a container under the root that opts into vector content.
    pub(crate) fn add_group(&mut self) -> NodeId {
        let group = self.stage.add_container(self.stage.root());
        self.stage.set_vector_children(group, true);
        group
    }

    /// Registers `geometry` and adds a sprite drawing it under the root.
    pub(crate) fn add_sprite(&mut self, geometry: BezPath, transform: Affine) -> (ModelId, NodeId) {
        let parent = self.stage.root();
        self.add_sprite_in(parent, geometry, transform)
    }

    pub(crate) fn add_sprite_in(
        &mut self,
        parent: NodeId,
        geometry: BezPath,
        transform: Affine,
    ) -> (ModelId, NodeId) {
        let model = self.cache.add_model(geometry);
        let node = self.instance(parent, model, transform);
        (model, node)
    }

    /// Adds another sprite for an existing model.
    pub(crate) fn instance(&mut self, parent: NodeId, model: ModelId, transform: Affine) -> NodeId {
        let node = self.stage.add_sprite(parent, model);
        self.stage.set_transform(node, transform);
        node
    }

    pub(crate) fn frame(&mut self) {
        self.cache.frame_tick(&mut self.stage).unwrap();
    }

    /// Drains every collection's raster requests and reports them drawn.
    ///
    /// Returns the number of requests.
    pub(crate) fn draw_pending(&mut self) -> usize {
        let mut drawn = 0;
        for cache_type in CacheType::COLLECTIONS {
            for page in self.cache.take_raster_requests(cache_type) {
                for request in &page.requests {
                    self.cache.mark_ready(request.entry).unwrap();
                    drawn += 1;
                }
            }
        }
        drawn
    }
}
