// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Commits land on thread 0 and paints on thread 1, matching the control
//! and painting threads of a scene.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use lamina_core::time::HostTime;
use lamina_core::trace::PhaseKind;
use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const CONTROL_TID: u32 = 0;
const PAINT_TID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Phases become duration events and fence waits become complete (`X`)
/// events spanning the wait.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseBegin(e) => {
                events.push(json!({
                    "ph": "B",
                    "name": format!("{:?}", e.phase),
                    "cat": "Scene",
                    "ts": to_us(e.timestamp),
                    "pid": 0,
                    "tid": phase_tid(e.phase),
                    "args": {
                        "sequence": e.sequence,
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": format!("{:?}", e.phase),
                    "cat": "Scene",
                    "ts": to_us(e.timestamp),
                    "pid": 0,
                    "tid": phase_tid(e.phase),
                    "args": {
                        "sequence": e.sequence,
                    }
                }));
            }
            RecordedEvent::Commit(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "Commit",
                    "cat": "Scene",
                    "ts": to_us(e.timestamp),
                    "pid": 0,
                    "tid": CONTROL_TID,
                    "s": "t",
                    "args": {
                        "commit_index": e.commit_index,
                        "version": e.version,
                        "added": e.added,
                        "updated": e.updated,
                        "removed": e.removed,
                        "ignored": e.ignored,
                    }
                }));
            }
            RecordedEvent::FenceWait(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": format!("{:?}Wait", e.kind),
                    "cat": "Fence",
                    "ts": to_us(e.begin),
                    "dur": to_us(e.end) - to_us(e.begin),
                    "pid": 0,
                    "tid": PAINT_TID,
                    "args": {
                        "frame_index": e.frame_index,
                        "backing": e.backing.0,
                    }
                }));
            }
            RecordedEvent::PaintSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "PaintSummary",
                    "cat": "Summary",
                    "ts": to_us(s.end),
                    "pid": 0,
                    "tid": PAINT_TID,
                    "s": "t",
                    "args": {
                        "frame_index": s.frame_index,
                        "items": s.items,
                        "waits": s.waits,
                        "paint_us": to_us(s.end) - to_us(s.begin),
                    }
                }));
            }
            RecordedEvent::DamageRectsCount {
                commit_index,
                count,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": 0,
                    "pid": 0,
                    "tid": CONTROL_TID,
                    "s": "p",
                    "args": {
                        "commit_index": commit_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn phase_tid(phase: PhaseKind) -> u32 {
    match phase {
        PhaseKind::Commit => CONTROL_TID,
        PhaseKind::Paint | PhaseKind::Purge => PAINT_TID,
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "microsecond timestamps stay well inside f64 precision"
)]
fn to_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
