// crates/flowctl-audit/src/sink.rs
// ============================================================================
// Module: Domain Event Sinks
// Description: A pluggable sink trait plus a bounded channel-backed default
// implementation and a log-buffer fallback.
// Purpose: Fire-and-forget delivery that never blocks or fails the caller.
// Dependencies: flowctl-core, std::sync::mpsc
// ============================================================================

use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::SyncSender;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use crate::event::DomainEvent;

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Delivers a [`DomainEvent`] to wherever this process's telemetry goes.
///
/// # Invariants
/// - `emit` never blocks the caller beyond enqueueing a single write and
///   never returns an error; delivery failures are counted internally.
pub trait DomainEventSink: Send + Sync {
    /// Records the event. Must not panic or block on a full downstream.
    fn emit(&self, event: DomainEvent);
}

// ============================================================================
// SECTION: Channel-Backed Sink
// ============================================================================

/// Default sink: queues events onto a bounded channel for a consumer to
/// drain. When the channel is full or the receiver has been dropped, the
/// event is discarded and counted rather than blocking the caller.
pub struct ChannelEventSink {
    sender: SyncSender<DomainEvent>,
    dropped: AtomicU64,
}

impl ChannelEventSink {
    /// Builds a channel-backed sink and its paired receiver, with the given
    /// queue capacity.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, Receiver<DomainEvent>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Count of events dropped because the channel was full or the
    /// receiver was gone.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl DomainEventSink for ChannelEventSink {
    fn emit(&self, event: DomainEvent) {
        if self.sender.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ============================================================================
// SECTION: Log Sink
// ============================================================================

/// Fallback sink that appends a human-readable line to an in-memory buffer
/// instead of queueing structured events. Used where no channel consumer is
/// wired up (tests, one-off CLI invocations).
#[derive(Default)]
pub struct LogEventSink {
    lines: Mutex<Vec<String>>,
}

impl LogEventSink {
    /// Creates an empty log sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every line recorded so far, in emission order.
    ///
    /// # Panics
    ///
    /// Never panics on lock poisoning; a poisoned lock's contents are
    /// recovered rather than propagated.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl DomainEventSink for LogEventSink {
    fn emit(&self, event: DomainEvent) {
        let line = match event.error() {
            Some(error) => format!("{} entity={} error={}", event.event_type(), event.entity_id(), error),
            None => format!("{} entity={}", event.event_type(), event.entity_id()),
        };
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line);
    }
}
