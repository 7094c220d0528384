// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for commits and paints.
//!
//! [`TraceSink`] has one method per event. All of them default to no-ops, so
//! a sink only implements the events it cares about.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. With the `trace` feature
//! **off**, every `Tracer` method compiles to nothing. With it **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies.
//! - `trace-rich` (implies `trace`): gates per-commit [`DamageRect`] events.

use crate::layer::BackingId;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of scene processing is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Applying one scene state to the layer tree.
    Commit,
    /// Painting the tree into the current GPU context.
    Paint,
    /// Releasing GPU-resident resources.
    Purge,
}

/// How a paint waited for a backing store's buffer to become readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaitKind {
    /// A wait queued on the GPU; the CPU did not block.
    Server,
    /// The painting thread blocked on the fence.
    Client,
    /// No fence was available, so the whole GPU pipeline was drained.
    Finish,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Commit index for [`PhaseKind::Commit`], frame index otherwise.
    pub sequence: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Commit index for [`PhaseKind::Commit`], frame index otherwise.
    pub sequence: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted after one scene state has been applied.
#[derive(Clone, Copy, Debug)]
pub struct CommitEvent {
    /// Monotonic commit counter.
    pub commit_index: u64,
    /// Producer-assigned version of the applied state.
    pub version: u64,
    /// Time the commit finished.
    pub timestamp: HostTime,
    /// Layers created.
    pub added: u32,
    /// Layers updated in place.
    pub updated: u32,
    /// Layers destroyed.
    pub removed: u32,
    /// Changes dropped because they referenced unknown layers.
    pub ignored: u32,
}

/// Emitted whenever painting synchronizes with a buffer producer.
#[derive(Clone, Copy, Debug)]
pub struct FenceWaitEvent {
    /// Frame counter of the paint.
    pub frame_index: u64,
    /// The backing store whose buffer was waited on.
    pub backing: BackingId,
    /// How the wait was performed.
    pub kind: WaitKind,
    /// Time the wait was issued.
    pub begin: HostTime,
    /// Time the wait returned.
    pub end: HostTime,
}

/// Per-paint summary.
#[derive(Clone, Copy, Debug)]
pub struct PaintSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Items in the paint plan.
    pub items: u32,
    /// Fence waits performed (any kind).
    pub waits: u32,
    /// Time the paint started.
    pub begin: HostTime,
    /// Time the paint finished.
    pub end: HostTime,
}

/// A root-space damage rectangle.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

#[cfg(feature = "trace-rich")]
impl From<kurbo::Rect> for DamageRect {
    fn from(r: kurbo::Rect) -> Self {
        Self {
            x: r.x0,
            y: r.y0,
            width: r.width(),
            height: r.height(),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from a compositing scene.
///
/// Sinks are installed on scenes shared between threads, hence `Send`.
pub trait TraceSink: Send {
    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called after each applied scene state.
    fn on_commit(&mut self, e: &CommitEvent) {
        _ = e;
    }

    /// Called after each fence wait performed during a paint.
    fn on_fence_wait(&mut self, e: &FenceWaitEvent) {
        _ = e;
    }

    /// Called at the end of each paint.
    fn on_paint_summary(&mut self, s: &PaintSummary) {
        _ = s;
    }

    /// Called with the damage produced by a commit (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, commit_index: u64, rects: &[DamageRect]) {
        _ = (commit_index, rects);
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to `sink` when present.
    #[inline]
    #[must_use]
    pub fn new(sink: Option<&'a mut dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Returns `true` if events reach a sink.
    ///
    /// Lets callers skip building expensive event payloads.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitEvent`].
    #[inline]
    pub fn commit(&mut self, e: &CommitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_commit(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FenceWaitEvent`].
    #[inline]
    pub fn fence_wait(&mut self, e: &FenceWaitEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_fence_wait(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PaintSummary`].
    #[inline]
    pub fn paint_summary(&mut self, s: &PaintSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_paint_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits damage rectangles (requires `trace-rich`).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, commit_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(commit_index, rects);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_commit() -> CommitEvent {
        CommitEvent {
            commit_index: 3,
            version: 17,
            timestamp: HostTime(500),
            added: 2,
            updated: 1,
            removed: 0,
            ignored: 1,
        }
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_enabled());
        tracer.commit(&sample_commit());
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let mut sink = NoopSink;
        sink.on_commit(&sample_commit());
        sink.on_paint_summary(&PaintSummary {
            frame_index: 0,
            items: 0,
            waits: 0,
            begin: HostTime(0),
            end: HostTime(0),
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            commits: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_commit(&mut self, e: &CommitEvent) {
                self.commits.push(e.version);
            }
        }

        let mut sink = RecordingSink {
            commits: Vec::new(),
        };
        let mut tracer = Tracer::new(Some(&mut sink));
        assert!(tracer.is_enabled());
        tracer.commit(&sample_commit());
        drop(tracer);
        assert_eq!(sink.commits, &[17]);
    }
}
