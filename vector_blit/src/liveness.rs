// Copyright 2025 the Vector Blit Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-clock liveness tracking for vector models.

/// Records when a model was last drawn and the last GC pass it survived.
///
/// Two independent clocks drive it: the frame counter, advanced by every
/// [`frame_tick`](crate::ShapeCache::frame_tick), and the GC generation,
/// advanced by every [`gc_tick`](crate::ShapeCache::gc_tick). Comparing the last
/// drawn frame against the frame at which the previous GC pass ran tells apart
/// models drawn every frame, models drawn now and then between passes, and
/// models not drawn since the previous pass at all, without keeping any
/// per-frame history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Liveness {
    last_frame_touched: u64,
    last_gc_survived: u64,
    survived_last_gc: bool,
}

impl Liveness {
    /// Creates a record for a model added during GC generation `gc_num`.
    ///
    /// The model counts as having survived that generation so that it is not
    /// considered stale before it ever had a chance to be drawn.
    pub fn new(gc_num: u64) -> Self {
        Self {
            last_frame_touched: 0,
            last_gc_survived: gc_num,
            survived_last_gc: true,
        }
    }

    /// Record that the model was drawn in frame `frame_num`.
    #[inline]
    pub fn touch_frame(&mut self, frame_num: u64) {
        self.last_frame_touched = frame_num;
    }

    /// Age the record during GC pass `gc_num`.
    ///
    /// `last_gc_frame_num` is the frame counter value at the previous GC pass.
    /// The model survives this pass if it was drawn in any later frame.
    pub fn touch_gc(&mut self, gc_num: u64, last_gc_frame_num: u64) {
        self.survived_last_gc = self.last_frame_touched > last_gc_frame_num;
        if self.survived_last_gc {
            self.last_gc_survived = gc_num;
        }
    }

    /// The last frame the model was drawn in, or 0 if it never was.
    #[inline]
    pub fn last_frame_touched(&self) -> u64 {
        self.last_frame_touched
    }

    /// The last GC generation the model survived.
    #[inline]
    pub fn last_gc_survived(&self) -> u64 {
        self.last_gc_survived
    }

    /// Whether the most recent [`touch_gc`](Self::touch_gc) saw the model drawn since
    /// the pass before it.
    #[inline]
    pub fn survived_last_gc(&self) -> bool {
        self.survived_last_gc
    }

    /// Whether the model was drawn during frame `frame_num`.
    #[inline]
    pub fn touched_in(&self, frame_num: u64) -> bool {
        self.last_frame_touched == frame_num
    }

    /// Number of GC passes since the last one the model survived.
    #[inline]
    pub fn gc_generations_missed(&self, gc_num: u64) -> u64 {
        gc_num.saturating_sub(self.last_gc_survived)
    }

    /// Whether more than `threshold` GC passes went by without the model being drawn.
    ///
    /// Monotone in the gap: once stale, a model stays stale until it is drawn again.
    #[inline]
    pub fn is_stale(&self, gc_num: u64, threshold: u64) -> bool {
        self.gc_generations_missed(gc_num) > threshold
    }
}
