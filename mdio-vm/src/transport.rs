//! Multi-part reply framing and the request-handling entrypoint (§4.D).
//!
//! Mirrors the generic-netlink "dump" convention the original transport
//! uses: a request gets back a sequence of parts — zero or more `DATA`
//! blocks, an optional `ERROR`, and a trailing `DONE` — rather than one
//! unbounded message.

use std::time::Duration;

use mdio_asm::attr::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};

use crate::bus::{BusRegistry, MdioBus};
use crate::errno::ENODEV;
use crate::interpreter::{Abort, Interpreter, ReplySink, RunOutcome};
use crate::validator::{validate, ValidationError};

/// One part of a chunked reply (spec §4.D / §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyPart {
    /// A `DATA` block: a contiguous run of emitted 32-bit words.
    Data(Vec<u32>),
    /// The `ERROR` attribute, present iff the run ended abnormally.
    Error(i32),
    /// The trailing `DONE` marker that closes the reply.
    Done,
}

/// A [`ReplySink`] that buffers emitted words into bounded `DATA` chunks,
/// flushing a full chunk into a closed part and opening a fresh one.
///
/// The per-part capacity stands in for a transport's real datagram size
/// limit; tests exercise chunking by choosing a small one.
pub struct ChunkingReplySink {
    capacity: usize,
    current: Vec<u32>,
    parts: Vec<ReplyPart>,
}

impl ChunkingReplySink {
    /// A sink that closes a `DATA` part every `capacity` words.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "a zero-capacity sink could never emit anything");
        Self {
            capacity,
            current: Vec::with_capacity(capacity),
            parts: Vec::new(),
        }
    }

    /// Consume the sink, returning every closed `DATA` part plus whatever
    /// is still buffered (as one final part if non-empty).
    pub fn into_parts(mut self) -> Vec<ReplyPart> {
        if !self.current.is_empty() {
            let closed = std::mem::take(&mut self.current);
            self.parts.push(ReplyPart::Data(closed));
        }
        self.parts
    }
}

impl ReplySink for ChunkingReplySink {
    fn try_append(&mut self, value: u32) -> bool {
        if self.current.len() >= self.capacity {
            return false;
        }
        self.current.push(value);
        true
    }

    fn flush(&mut self) {
        let closed = std::mem::take(&mut self.current);
        self.parts.push(ReplyPart::Data(closed));
    }
}

/// Assemble the final part sequence for a finished run: every `DATA`
/// chunk the sink collected, then `ERROR` iff the run aborted, then
/// `DONE` (spec §4.D: "the reply always ends with a trailing `DONE`
/// part, whether or not an `ERROR` part preceded it").
pub fn finalize_reply(outcome: RunOutcome, sink: ChunkingReplySink) -> Vec<ReplyPart> {
    let mut parts = sink.into_parts();
    if let RunOutcome::Aborted(abort) = outcome {
        parts.push(ReplyPart::Error(abort.errno()));
    }
    parts.push(ReplyPart::Done);
    parts
}

/// Errors that keep a request from ever reaching the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// `BUS_ID` named no registered adapter.
    #[error("No such device")]
    NoSuchBus,
    /// `PROG` failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl TransportError {
    /// The negative errno this error surfaces to the caller (§7).
    pub fn errno(&self) -> i32 {
        match self {
            TransportError::NoSuchBus => ENODEV,
            TransportError::Validation(_) => crate::errno::EINVAL,
        }
    }
}

/// Clamp a caller-supplied timeout to the transport's policy (§6: absent
/// defaults to 100ms, and 10s is a hard ceiling regardless of what's
/// asked for).
pub fn resolve_timeout(requested_ms: Option<u16>) -> Duration {
    let ms = requested_ms.unwrap_or(DEFAULT_TIMEOUT_MS).min(MAX_TIMEOUT_MS);
    Duration::from_millis(ms as u64)
}

/// Handle one `XFER` request end to end: look up the bus, validate the
/// program, run it under the bus's lock, and frame the result.
///
/// This is the simulated stand-in for the kernel module's
/// `mdio_nl_xfer` handler (§4.D, Design Note §9): same sequencing, same
/// failure surface, without a real netlink socket underneath it.
pub fn handle_request<B: MdioBus>(
    registry: &BusRegistry<B>,
    bus_id: &str,
    raw_prog: &[u8],
    timeout_ms: Option<u16>,
    chunk_capacity: usize,
) -> Result<Vec<ReplyPart>, TransportError> {
    let handle = registry.find(bus_id).ok_or(TransportError::NoSuchBus)?;
    let program = validate(raw_prog)?;
    let timeout = resolve_timeout(timeout_ms);

    // The lock is acquired here and dropped when `guard` goes out of
    // scope at the end of this function — every return path, including
    // the early ones above, releases it implicitly.
    let mut guard = handle.lock();
    let mut sink = ChunkingReplySink::new(chunk_capacity);
    let outcome = Interpreter::new(&program, &mut *guard, &mut sink, timeout).run();

    Ok(finalize_reply(outcome, sink))
}
