// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Damage rectangles are stored as a count only.

use std::sync::Arc;

use lamina_core::layer::BackingId;
use lamina_core::time::HostTime;
use lamina_core::trace::{
    CommitEvent, DamageRect, FenceWaitEvent, PaintSummary, PhaseBeginEvent, PhaseEndEvent,
    PhaseKind, TraceSink, WaitKind,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_BEGIN: u8 = 1;
const TAG_PHASE_END: u8 = 2;
const TAG_COMMIT: u8 = 3;
const TAG_FENCE_WAIT: u8 = 4;
const TAG_PAINT_SUMMARY: u8 = 5;
const TAG_DAMAGE_RECTS_COUNT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Commit => 0,
            PhaseKind::Paint => 1,
            PhaseKind::Purge => 2,
        });
    }

    fn write_wait(&mut self, w: WaitKind) {
        self.write_u8(match w {
            WaitKind::Server => 0,
            WaitKind::Client => 1,
            WaitKind::Finish => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.sequence);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.sequence);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.write_u8(TAG_COMMIT);
        self.write_u64(e.commit_index);
        self.write_u64(e.version);
        self.write_u64(e.timestamp.nanos());
        self.write_u32(e.added);
        self.write_u32(e.updated);
        self.write_u32(e.removed);
        self.write_u32(e.ignored);
    }

    fn on_fence_wait(&mut self, e: &FenceWaitEvent) {
        self.write_u8(TAG_FENCE_WAIT);
        self.write_u64(e.frame_index);
        self.write_u64(e.backing.0);
        self.write_wait(e.kind);
        self.write_u64(e.begin.nanos());
        self.write_u64(e.end.nanos());
    }

    fn on_paint_summary(&mut self, s: &PaintSummary) {
        self.write_u8(TAG_PAINT_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.items);
        self.write_u32(s.waits);
        self.write_u64(s.begin.nanos());
        self.write_u64(s.end.nanos());
    }

    fn on_damage_rects(&mut self, commit_index: u64, rects: &[DamageRect]) {
        self.write_u8(TAG_DAMAGE_RECTS_COUNT);
        self.write_u64(commit_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "damage rect count capped at u32::MAX for recording"
        )]
        self.write_u32(rects.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// SharedRecorder
// ---------------------------------------------------------------------------

/// A cloneable [`RecorderSink`].
///
/// Install one clone on a scene and keep another to read the recording.
#[derive(Clone, Debug, Default)]
pub struct SharedRecorder {
    inner: Arc<Mutex<RecorderSink>>,
}

impl SharedRecorder {
    /// Creates an empty shared recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the bytes recorded so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().as_bytes().to_vec()
    }
}

impl TraceSink for SharedRecorder {
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.inner.lock().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.inner.lock().on_phase_end(e);
    }

    fn on_commit(&mut self, e: &CommitEvent) {
        self.inner.lock().on_commit(e);
    }

    fn on_fence_wait(&mut self, e: &FenceWaitEvent) {
        self.inner.lock().on_fence_wait(e);
    }

    fn on_paint_summary(&mut self, s: &PaintSummary) {
        self.inner.lock().on_paint_summary(s);
    }

    fn on_damage_rects(&mut self, commit_index: u64, rects: &[DamageRect]) {
        self.inner.lock().on_damage_rects(commit_index, rects);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommitEvent`].
    Commit(CommitEvent),
    /// A [`FenceWaitEvent`].
    FenceWait(FenceWaitEvent),
    /// A [`PaintSummary`].
    PaintSummary(PaintSummary),
    /// Damage-rect count for a commit.
    DamageRectsCount {
        /// Commit counter.
        commit_index: u64,
        /// Number of damage rects.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Commit,
            1 => PhaseKind::Paint,
            _ => PhaseKind::Purge,
        })
    }

    fn read_wait(&mut self) -> Option<WaitKind> {
        Some(match self.read_u8()? {
            0 => WaitKind::Server,
            1 => WaitKind::Client,
            _ => WaitKind::Finish,
        })
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            sequence: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            sequence: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: self.read_time()?,
        }))
    }

    fn decode_commit(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Commit(CommitEvent {
            commit_index: self.read_u64()?,
            version: self.read_u64()?,
            timestamp: self.read_time()?,
            added: self.read_u32()?,
            updated: self.read_u32()?,
            removed: self.read_u32()?,
            ignored: self.read_u32()?,
        }))
    }

    fn decode_fence_wait(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FenceWait(FenceWaitEvent {
            frame_index: self.read_u64()?,
            backing: BackingId(self.read_u64()?),
            kind: self.read_wait()?,
            begin: self.read_time()?,
            end: self.read_time()?,
        }))
    }

    fn decode_paint_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PaintSummary(PaintSummary {
            frame_index: self.read_u64()?,
            items: self.read_u32()?,
            waits: self.read_u32()?,
            begin: self.read_time()?,
            end: self.read_time()?,
        }))
    }

    fn decode_damage_rects_count(&mut self) -> Option<RecordedEvent> {
        let commit_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::DamageRectsCount {
            commit_index,
            count,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMIT => self.decode_commit(),
            TAG_FENCE_WAIT => self.decode_fence_wait(),
            TAG_PAINT_SUMMARY => self.decode_paint_summary(),
            TAG_DAMAGE_RECTS_COUNT => self.decode_damage_rects_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
