// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The shape cache orchestrator.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::atlas::{AtlasCollection, PageRequests, PlacementError};
use crate::config::CacheOptions;
use crate::error::Error;
use crate::kurbo::{Affine, BezPath};
use crate::mip::MipSelector;
use crate::model::{ModelId, VectorGeometry, VectorModel};
use crate::raster::{CacheStatus, CacheType, EntryId, RasterCache};
use crate::scene::{SceneGraph, SpriteInfo, rec_find};

/// Counters describing how the cache has been serving sprites.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Mip lookups answered by an existing entry.
    pub hits: u64,
    /// Mip lookups that created a new entry.
    pub misses: u64,
    /// Sprites drawn directly because the shape or its raster is too large to cache.
    pub rejections: u64,
    /// Sprites drawn directly because no collection could place their raster.
    pub placement_failures: u64,
    /// Sprites skipped because their geometry is empty.
    pub skipped_empty: u64,
}

/// Outcome of one [`ShapeCache::gc_tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    /// The GC generation this pass ran as.
    pub gc_num: u64,
    /// Models whose rasters were all released for going undrawn too long.
    pub stale_models: usize,
    /// Entries destroyed by this pass.
    pub evicted: usize,
    /// Runtime entries placed again after the runtime collection was cleared.
    pub repacked: usize,
    /// Runtime entries that fit nowhere and are drawn directly until space frees up.
    pub full_runtime: usize,
}

/// Decides per frame whether vector sprites are drawn directly or blitted from
/// a cached raster, and owns the rasters and the atlases they live in.
///
/// ```
/// use vector_blit::kurbo::{Affine, Rect, Shape};
/// use vector_blit::scene::Stage;
/// use vector_blit::{CacheOptions, CacheType, ShapeCache};
///
/// let mut cache = ShapeCache::new(CacheOptions::default()).unwrap();
/// let model = cache.add_model(Rect::new(0.0, 0.0, 100.0, 100.0).to_path(0.1));
///
/// let mut stage = Stage::new();
/// let root = stage.root();
/// stage.set_vector_children(root, true);
/// let sprite = stage.add_sprite(root, model);
/// stage.set_transform(sprite, Affine::scale(3.0));
///
/// cache.frame_tick(&mut stage).unwrap();
/// assert_eq!(stage.cache_type(sprite), CacheType::WebGl);
///
/// let entry = stage.raster(sprite).unwrap();
/// assert_eq!(cache.entry(entry).unwrap().level(), 2);
/// ```
#[derive(Debug)]
pub struct ShapeCache<G = BezPath> {
    options: CacheOptions,
    selector: MipSelector,
    models: HashMap<ModelId, VectorModel<G>>,
    entries: HashMap<EntryId, RasterCache>,
    /// One collection per [`CacheType::COLLECTIONS`] value, in that order.
    atlases: [AtlasCollection; 3],
    frame_num: u64,
    gc_num: u64,
    /// Frame counter value when the previous GC pass ran.
    last_gc_frame_num: u64,
    next_model_id: u32,
    next_entry_id: u32,
    stats: CacheStats,
}

impl<G: VectorGeometry> ShapeCache<G> {
    /// Creates an empty cache.
    ///
    /// Returns [`Error::InvalidConfig`] when `options` cannot describe a working cache.
    pub fn new(options: CacheOptions) -> Result<Self, Error> {
        options.validate()?;
        let collection = |cache_type| {
            AtlasCollection::new(cache_type, &options.atlas)
                .ok_or(Error::InvalidConfig("cache type owns no atlas collection"))
        };
        let atlases = [
            collection(CacheType::Canvas2d)?,
            collection(CacheType::WebGl)?,
            collection(CacheType::RuntimeWebGl)?,
        ];
        Ok(Self {
            options,
            selector: MipSelector::new(&options),
            models: HashMap::new(),
            entries: HashMap::new(),
            atlases,
            frame_num: 0,
            gc_num: 0,
            last_gc_frame_num: 0,
            next_model_id: 0,
            next_entry_id: 0,
            stats: CacheStats::default(),
        })
    }

    /// The options the cache was created with.
    #[inline]
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// The mip selector derived from the options.
    #[inline]
    pub fn selector(&self) -> &MipSelector {
        &self.selector
    }

    /// Number of completed [`frame_tick`](Self::frame_tick) calls.
    #[inline]
    pub fn frame_num(&self) -> u64 {
        self.frame_num
    }

    /// Number of completed [`gc_tick`](Self::gc_tick) calls.
    #[inline]
    pub fn gc_num(&self) -> u64 {
        self.gc_num
    }

    /// Counters accumulated since creation or the last [`clear_stats`](Self::clear_stats).
    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Resets the counters.
    pub fn clear_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    // --- models ---

    /// Registers a shape, returning the handle sprites refer to it by.
    pub fn add_model(&mut self, geometry: G) -> ModelId {
        let id = ModelId(self.next_model_id);
        self.next_model_id += 1;
        self.models.insert(
            id,
            VectorModel::new(geometry, self.options.min_cache_levels, self.gc_num),
        );
        id
    }

    /// Unregisters a model, releasing all of its rasters, and hands back its geometry.
    pub fn remove_model(&mut self, id: ModelId) -> Result<G, Error> {
        let mut model = self.models.remove(&id).ok_or(Error::UnknownModel(id))?;
        for entry in model.clear_mips() {
            self.release_entry(entry);
        }
        Ok(model.into_geometry())
    }

    /// Swaps the geometry of a model, returning the old one.
    ///
    /// Every raster of the model is released, since it no longer shows the shape.
    pub fn set_geometry(&mut self, id: ModelId, geometry: G) -> Result<G, Error> {
        let model = self.models.get_mut(&id).ok_or(Error::UnknownModel(id))?;
        let old = model.replace_geometry(geometry);
        for entry in model.clear_mips() {
            self.release_entry(entry);
        }
        Ok(old)
    }

    /// The model registered as `id`.
    pub fn model(&self, id: ModelId) -> Option<&VectorModel<G>> {
        self.models.get(&id)
    }

    /// Number of registered models.
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    // --- entries ---

    /// The raster entry `id`.
    pub fn entry(&self, id: EntryId) -> Option<&RasterCache> {
        self.entries.get(&id)
    }

    /// All live raster entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &RasterCache> + '_ {
        self.entries.values()
    }

    /// The atlas collection of `cache_type`, if that type owns one.
    pub fn atlas(&self, cache_type: CacheType) -> Option<&AtlasCollection> {
        self.atlases.get(cache_type.atlas_index()?)
    }

    /// Takes the raster requests recorded by `cache_type`'s collection since the last call.
    ///
    /// The application draws each request and then reports it through
    /// [`mark_ready`](Self::mark_ready). Types without a collection yield nothing.
    pub fn take_raster_requests(&mut self, cache_type: CacheType) -> Vec<PageRequests> {
        match cache_type.atlas_index() {
            Some(idx) => self.atlases[idx].flush(),
            None => Vec::new(),
        }
    }

    /// Records that the raster of `id` has been drawn into its slot.
    pub fn mark_ready(&mut self, id: EntryId) -> Result<(), Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        if entry.slot.is_none() {
            return Err(Error::NotPlaced(id));
        }
        entry.status = CacheStatus::Ready;
        Ok(())
    }

    /// Releases every raster and atlas page. Models, counters and liveness are kept.
    pub fn clear(&mut self) {
        for model in self.models.values_mut() {
            model.clear_mips();
        }
        self.entries.clear();
        for collection in &mut self.atlases {
            collection.clear();
        }
    }

    // --- mip selection ---

    /// Resolve the raster a sprite of `model` under `world` should be blitted from.
    ///
    /// Returns `Ok(None)` when the shape is too large to cache. Otherwise returns
    /// the existing entry for the selected mip level, or creates and registers one.
    pub fn mip_behaviour(
        &mut self,
        model_id: ModelId,
        world: Affine,
    ) -> Result<Option<EntryId>, Error> {
        let model = self
            .models
            .get_mut(&model_id)
            .ok_or(Error::UnknownModel(model_id))?;
        let Some(level) = self.selector.select(model.geometry(), world) else {
            self.stats.rejections += 1;
            return Ok(None);
        };

        if let Some(entry) = model.mip(level) {
            if !self.entries.contains_key(&entry) {
                return Err(Error::DanglingMip {
                    model: model_id,
                    level,
                    entry,
                });
            }
            self.stats.hits += 1;
            return Ok(Some(entry));
        }

        let transform = MipSelector::mip_transform(level);
        let bounds = model.geometry().world_bounds(transform);
        let id = EntryId(self.next_entry_id);
        self.next_entry_id += 1;
        model.set_mip(level, id);
        self.entries.insert(
            id,
            RasterCache::new(id, model_id, level, transform, bounds, self.frame_num),
        );
        self.stats.misses += 1;
        log::trace!("created {id:?} for {model_id:?} at mip level {level}");
        Ok(Some(id))
    }

    // --- frame loop ---

    /// Advance one frame: visit every vector sprite reachable from the scene root
    /// and tag it with how it is drawn.
    ///
    /// Sprites are visited in depth-first pre-order, descending only into nodes
    /// flagged as holding vector content. A sprite whose model has no drawable
    /// geometry is left untouched.
    ///
    /// Fails with [`Error::UnknownModel`] when a sprite names a model that is not
    /// registered; sprites visited before it keep their new annotation.
    pub fn frame_tick<S: SceneGraph + ?Sized>(&mut self, scene: &mut S) -> Result<(), Error> {
        self.frame_num += 1;
        let mut sprites = Vec::new();
        rec_find(&*scene, scene.root(), |node, sprite| {
            sprites.push((node, sprite));
        });
        for (node, sprite) in sprites {
            self.visit_sprite(scene, node, sprite)?;
        }
        Ok(())
    }

    fn visit_sprite<S: SceneGraph + ?Sized>(
        &mut self,
        scene: &mut S,
        node: S::Node,
        sprite: SpriteInfo,
    ) -> Result<(), Error> {
        let model = self
            .models
            .get_mut(&sprite.model)
            .ok_or(Error::UnknownModel(sprite.model))?;
        if model.geometry().is_empty() {
            self.stats.skipped_empty += 1;
            return Ok(());
        }
        model.liveness_mut().touch_frame(self.frame_num);

        let Some(id) = self.mip_behaviour(sprite.model, sprite.world_transform)? else {
            scene.set_cache_type(node, CacheType::NoCache, None);
            return Ok(());
        };
        let cache_type = self.use_entry(id)?;
        let raster = (cache_type != CacheType::NoCache).then_some(id);
        scene.set_cache_type(node, cache_type, raster);
        Ok(())
    }

    /// Mark `id` as used this frame and make sure it holds a slot.
    ///
    /// Returns the collection it lives in, or [`CacheType::NoCache`] if none had room.
    fn use_entry(&mut self, id: EntryId) -> Result<CacheType, Error> {
        let entry = self.entries.get_mut(&id).ok_or(Error::UnknownEntry(id))?;
        entry.last_frame_used = self.frame_num;
        if entry.slot.is_some() {
            return Ok(entry.cache_type);
        }
        if entry.oversized {
            self.stats.rejections += 1;
            return Ok(CacheType::NoCache);
        }
        let preferred = match entry.cache_type {
            CacheType::Auto | CacheType::NoCache => self.options.default_cache_type,
            cache_type => cache_type,
        };
        match place_entry(&mut self.atlases, entry, preferred) {
            Some(cache_type) => Ok(cache_type),
            None if entry.oversized => {
                self.stats.rejections += 1;
                Ok(CacheType::NoCache)
            }
            None => {
                self.stats.placement_failures += 1;
                Ok(CacheType::NoCache)
            }
        }
    }

    // --- reclamation ---

    /// Run one reclamation pass.
    ///
    /// Ages every model, releases the rasters of stale models, evicts idle
    /// rasters from collections under memory pressure and repacks the runtime
    /// collection from scratch. An entry counts as idle when no sprite used it
    /// since the previous pass.
    pub fn gc_tick(&mut self) -> GcReport {
        self.gc_num += 1;
        let gc_num = self.gc_num;
        let prev = self.last_gc_frame_num;
        for model in self.models.values_mut() {
            model.liveness_mut().touch_gc(gc_num, prev);
        }
        self.last_gc_frame_num = self.frame_num;

        let mut report = GcReport {
            gc_num,
            ..GcReport::default()
        };
        self.release_stale_models(&mut report);

        // Idle entries without a slot hold no memory; dropping them is free.
        let unplaced: Vec<EntryId> = self
            .entries
            .values()
            .filter(|entry| entry.slot.is_none() && entry.last_frame_used <= prev)
            .map(|entry| entry.id)
            .collect();
        for id in unplaced {
            if self.release_entry(id) {
                report.evicted += 1;
            }
        }

        for cache_type in CacheType::COLLECTIONS {
            if cache_type.is_persistent() {
                report.evicted += self.relieve_pressure(cache_type, prev);
            }
        }

        self.repack_runtime(prev, &mut report);

        for collection in &mut self.atlases {
            collection.reset_exhausted();
        }
        log::debug!(
            "gc {gc_num}: {} stale models, {} evicted, {} repacked, {} full runtime",
            report.stale_models,
            report.evicted,
            report.repacked,
            report.full_runtime
        );
        report
    }

    fn release_stale_models(&mut self, report: &mut GcReport) {
        let threshold = self.options.stale_gc_generations;
        let gc_num = self.gc_num;
        let mut released = Vec::new();
        for (&model_id, model) in &mut self.models {
            if model.mip_count() == 0 || !model.liveness().is_stale(gc_num, threshold) {
                continue;
            }
            report.stale_models += 1;
            released.extend(model.clear_mips().into_iter().map(|entry| (model_id, entry)));
        }
        for (model_id, entry) in released {
            if self.release_entry(entry) {
                report.evicted += 1;
            } else {
                log::warn!("dropping dangling mip slot {entry:?} of stale {model_id:?}");
            }
        }
    }

    /// Evict idle entries of a persistent collection until it is no longer under pressure.
    ///
    /// Entries are evicted by descending `padded area × frames since last use`,
    /// then oldest use first, then lowest id. A collection marked exhausted gives
    /// up at least one entry. Returns the number of evicted entries.
    fn relieve_pressure(&mut self, cache_type: CacheType, prev: u64) -> usize {
        let Some(idx) = cache_type.atlas_index() else {
            return 0;
        };
        let frame_num = self.frame_num;
        let mut candidates: Vec<(u64, u64, EntryId)> = self
            .entries
            .values()
            .filter(|entry| entry.cache_type == cache_type && entry.last_frame_used <= prev)
            .filter_map(|entry| {
                let area = entry.slot?.padded_area();
                let age = frame_num.saturating_sub(entry.last_frame_used);
                Some((area.saturating_mul(age), entry.last_frame_used, entry.id))
            })
            .collect();
        candidates.sort_unstable_by(|a, b| {
            b.0.cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        let threshold = self.options.memory_pressure;
        let mut must_evict = self.atlases[idx].is_exhausted();
        let mut evicted = 0;
        for (_, _, id) in candidates {
            if !must_evict && self.atlases[idx].usage() <= threshold {
                break;
            }
            if self.release_entry(id) {
                evicted += 1;
            }
            must_evict = false;
        }
        self.atlases[idx].reset_exhausted();
        if evicted > 0 {
            log::debug!(
                "evicted {evicted} idle entries from {cache_type:?}, usage now {:.3}",
                self.atlases[idx].usage()
            );
        }
        evicted
    }

    /// Clear the runtime collection and place its recently used entries again.
    fn repack_runtime(&mut self, prev: u64, report: &mut GcReport) {
        let Some(runtime) = CacheType::RuntimeWebGl.atlas_index() else {
            return;
        };
        self.atlases[runtime].clear();

        let mut idle = Vec::new();
        let mut live = Vec::new();
        for entry in self.entries.values_mut() {
            if entry.cache_type != CacheType::RuntimeWebGl {
                continue;
            }
            // The pages are gone, so the slot is meaningless now.
            entry.slot = None;
            entry.cache_type = CacheType::Auto;
            entry.status = CacheStatus::Init;
            if entry.last_frame_used <= prev {
                idle.push(entry.id);
            } else {
                live.push((entry.last_frame_used, entry.id));
            }
        }

        for id in idle {
            if self.release_entry(id) {
                report.evicted += 1;
            }
        }

        // Most recently used first, so the hottest rasters get the space.
        live.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let preferred = self.options.default_cache_type;
        for (_, id) in live {
            let Some(entry) = self.entries.get_mut(&id) else {
                continue;
            };
            if place_entry(&mut self.atlases, entry, preferred).is_some() {
                report.repacked += 1;
            } else {
                report.full_runtime += 1;
            }
        }
    }

    /// Destroy entry `id`: drop it from the table, its atlas and its model.
    ///
    /// Returns whether the entry existed.
    fn release_entry(&mut self, id: EntryId) -> bool {
        let Some(entry) = self.entries.remove(&id) else {
            return false;
        };
        if let (Some(slot), Some(idx)) = (entry.slot, entry.cache_type.atlas_index()) {
            self.atlases[idx].evict(id, slot);
        }
        if let Some(model) = self.models.get_mut(&entry.model) {
            if model.mip(entry.level) == Some(id) {
                model.clear_mip(entry.level);
            }
        }
        log::trace!("released {id:?} of {:?}", entry.model);
        true
    }
}

/// Place `entry` into `preferred`'s collection, falling back to the runtime
/// collection when a persistent one cannot take it.
///
/// On success the entry records its slot and collection and has to be drawn
/// again. When every collection refuses it as too large, the entry is flagged
/// oversized. Returns the collection it landed in.
fn place_entry(
    atlases: &mut [AtlasCollection; 3],
    entry: &mut RasterCache,
    preferred: CacheType,
) -> Option<CacheType> {
    let fallback = preferred
        .is_persistent()
        .then_some(CacheType::RuntimeWebGl);
    let mut too_large = true;
    for cache_type in core::iter::once(preferred).chain(fallback) {
        let Some(collection) = cache_type.atlas_index().and_then(|idx| atlases.get_mut(idx))
        else {
            continue;
        };
        match collection.place(entry) {
            Ok(slot) => {
                entry.slot = Some(slot);
                entry.cache_type = cache_type;
                entry.status = CacheStatus::Init;
                return Some(cache_type);
            }
            Err(err) => {
                too_large &= matches!(err, PlacementError::TooLarge { .. });
                log::debug!("{cache_type:?} could not place {:?}: {err}", entry.id);
            }
        }
    }
    entry.oversized = too_large;
    None
}
