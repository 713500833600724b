// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::fmt;

use crate::model::ModelId;
use crate::raster::EntryId;

/// Contract violations reported by [`ShapeCache`](crate::ShapeCache).
///
/// Capacity exhaustion and oversized shapes are not errors: they are resolved
/// inside a tick by falling back to direct rendering. Everything here points at
/// a caller bug or an inconsistent table and is surfaced immediately.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A sprite or call referenced a model that was never added, or was removed.
    UnknownModel(ModelId),
    /// A call referenced a raster entry that does not exist.
    UnknownEntry(EntryId),
    /// A model's mip array names an entry missing from the entry table.
    DanglingMip {
        /// The model holding the dangling slot.
        model: ModelId,
        /// The mip level of the slot.
        level: i32,
        /// The entry id stored in the slot.
        entry: EntryId,
    },
    /// [`ShapeCache::mark_ready`](crate::ShapeCache::mark_ready) was called for an
    /// entry that has no atlas slot.
    NotPlaced(EntryId),
    /// The [`CacheOptions`](crate::CacheOptions) cannot describe a working cache.
    InvalidConfig(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownModel(model) => write!(f, "unknown vector model {}", model.index()),
            Self::UnknownEntry(entry) => write!(f, "unknown raster entry {}", entry.index()),
            Self::DanglingMip {
                model,
                level,
                entry,
            } => write!(
                f,
                "mip level {level} of model {} points at missing raster entry {}",
                model.index(),
                entry.index()
            ),
            Self::NotPlaced(entry) => {
                write!(f, "raster entry {} is not placed in an atlas", entry.index())
            }
            Self::InvalidConfig(reason) => write!(f, "invalid cache options: {reason}"),
        }
    }
}

impl core::error::Error for Error {}
