// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene-graph interface the cache walks every frame, and a small arena
//! implementation of it.
//!
//! The cache does not own the scene. It reads the tree through [`SceneGraph`],
//! and writes back nothing but a [`CacheType`] annotation (plus the raster to
//! blit) on every sprite it visits.

use alloc::vec::Vec;
use core::fmt;

use crate::kurbo::Affine;
use crate::model::ModelId;
use crate::raster::{CacheType, EntryId};

/// What the cache needs to know about a visible vector sprite.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteInfo {
    /// The model the sprite draws.
    pub model: ModelId,
    /// Transform from model space to the world, including all ancestors.
    pub world_transform: Affine,
}

/// Read access to a scene tree plus the one annotation the cache writes.
pub trait SceneGraph {
    /// Node handle.
    type Node: Copy;

    /// The node traversal starts from.
    fn root(&self) -> Self::Node;

    /// Children of `node`, in paint order.
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// Whether the subtree under `node` may contain vector sprites.
    ///
    /// This is opt-in: children of a node returning `false` are never visited.
    fn has_vector_children(&self, node: Self::Node) -> bool;

    /// The sprite carried by `node`, if it is a vector sprite.
    fn sprite(&self, node: Self::Node) -> Option<SpriteInfo>;

    /// Record how the sprite at `node` is drawn this frame.
    ///
    /// The annotation is only refreshed when the sprite is visited. Sprites that
    /// are skipped (pruned, or with empty geometry) keep the previous one, and
    /// its `raster` may since have been released, so it no longer resolves
    /// through [`ShapeCache::entry`](crate::ShapeCache::entry).
    fn set_cache_type(&mut self, node: Self::Node, cache_type: CacheType, raster: Option<EntryId>);
}

/// Depth-first pre-order walk from `root`, calling `visit` for every sprite.
///
/// Children are only descended into when their parent reports
/// [`has_vector_children`](SceneGraph::has_vector_children). Uses an explicit
/// stack, so deep trees do not grow the call stack.
pub fn rec_find<S: SceneGraph + ?Sized>(
    scene: &S,
    root: S::Node,
    mut visit: impl FnMut(S::Node, SpriteInfo),
) {
    let mut stack = Vec::new();
    stack.push(root);
    while let Some(node) = stack.pop() {
        if let Some(sprite) = scene.sprite(node) {
            visit(node, sprite);
        }
        if scene.has_vector_children(node) {
            // Reversed so the first child is popped first.
            stack.extend(scene.children(node).iter().rev().copied());
        }
    }
}

/// Handle to a node in a [`Stage`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Clone, Debug)]
struct StageNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local_transform: Affine,
    vector_children: bool,
    model: Option<ModelId>,
    cache_type: CacheType,
    raster: Option<EntryId>,
}

impl StageNode {
    fn new(parent: Option<NodeId>, model: Option<ModelId>) -> Self {
        Self {
            parent,
            children: Vec::new(),
            local_transform: Affine::IDENTITY,
            vector_children: false,
            model,
            cache_type: CacheType::Auto,
            raster: None,
        }
    }
}

/// A minimal arena-backed [`SceneGraph`].
///
/// Nodes are never removed; handles stay valid for the lifetime of the stage.
/// Containers start with the vector-content flag off and have to opt in with
/// [`set_vector_children`](Self::set_vector_children). Adding a sprite does
/// not flip the flag on its ancestors.
///
/// Accessors panic when handed a [`NodeId`] from another stage.
#[derive(Clone, Debug)]
pub struct Stage {
    nodes: Vec<StageNode>,
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage {
    /// Creates a stage holding only a root container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![StageNode::new(None, None)],
        }
    }

    /// The root container.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, the root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the root always exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: NodeId) -> &StageNode {
        &self.nodes[id.0 as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut StageNode {
        &mut self.nodes[id.0 as usize]
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "a stage with more than u32::MAX nodes does not fit in memory"
    )]
    fn push(&mut self, parent: NodeId, model: Option<ModelId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(StageNode::new(Some(parent), model));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Adds a container as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this stage.
    pub fn add_container(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, None)
    }

    /// Adds a sprite drawing `model` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this stage.
    pub fn add_sprite(&mut self, parent: NodeId, model: ModelId) -> NodeId {
        self.push(parent, Some(model))
    }

    /// Sets the transform of `node` relative to its parent.
    pub fn set_transform(&mut self, node: NodeId, transform: Affine) {
        self.node_mut(node).local_transform = transform;
    }

    /// Sets whether traversal descends into the children of `node`.
    pub fn set_vector_children(&mut self, node: NodeId, vector_children: bool) {
        self.node_mut(node).vector_children = vector_children;
    }

    /// Transform of `node` relative to its parent.
    pub fn transform(&self, node: NodeId) -> Affine {
        self.node(node).local_transform
    }

    /// Transform of `node` relative to the root.
    pub fn world_transform(&self, node: NodeId) -> Affine {
        let mut transform = self.node(node).local_transform;
        let mut cursor = self.node(node).parent;
        while let Some(parent) = cursor {
            let parent = self.node(parent);
            transform = parent.local_transform * transform;
            cursor = parent.parent;
        }
        transform
    }

    /// The model drawn by `node`, if it is a sprite.
    pub fn model(&self, node: NodeId) -> Option<ModelId> {
        self.node(node).model
    }

    /// The cache type last assigned to `node`.
    ///
    /// Stays [`CacheType::Auto`] until a frame visits the node.
    pub fn cache_type(&self, node: NodeId) -> CacheType {
        self.node(node).cache_type
    }

    /// The raster `node` was last told to blit from, if any.
    ///
    /// This is the last annotation, not a live handle: check it with
    /// [`ShapeCache::entry`](crate::ShapeCache::entry) before use.
    pub fn raster(&self, node: NodeId) -> Option<EntryId> {
        self.node(node).raster
    }
}

impl SceneGraph for Stage {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        Self::root(self)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.node(node).children
    }

    fn has_vector_children(&self, node: NodeId) -> bool {
        self.node(node).vector_children
    }

    fn sprite(&self, node: NodeId) -> Option<SpriteInfo> {
        let model = self.node(node).model?;
        Some(SpriteInfo {
            model,
            world_transform: self.world_transform(node),
        })
    }

    fn set_cache_type(&mut self, node: NodeId, cache_type: CacheType, raster: Option<EntryId>) {
        let node = self.node_mut(node);
        node.cache_type = cache_type;
        node.raster = raster;
    }
}
