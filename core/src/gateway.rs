//! The decryption oracle stand-in: a FIFO of captured ciphertexts plus the
//! global request-id counter, both encapsulated here so no other component
//! touches them directly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::{CellIndex, Ct4, CtBool, PlayerId};

/// A player's outstanding reveal, captured at request time. At most one
/// exists per player; the engine indexes it both by player and by id.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptionRequest {
    /// Monotonically increasing, globally unique.
    pub request_id: u64,
    pub player: PlayerId,
    pub cell_index: CellIndex,
    /// Ciphertext captured when the request was filed; re-submitted as-is if
    /// the request expires.
    pub clue: Ct4,
    pub victory: CtBool,
    /// Absolute block-timestamp past which the oracle ignores the request.
    pub deadline: u64,
    pub completed: bool,
}

impl DecryptionRequest {
    pub fn expired_at(&self, now: u64) -> bool {
        now > self.deadline
    }
}

/// Work item sitting in the gateway queue until the oracle round-trip
/// completes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct GatewayTicket {
    pub request_id: u64,
    pub clue: Ct4,
    pub victory: CtBool,
    pub deadline: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Gateway {
    queue: VecDeque<GatewayTicket>,
    next_request_id: AtomicU64,
    interval_ms: u64,
}

impl Gateway {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            queue: VecDeque::new(),
            next_request_id: AtomicU64::new(0),
            interval_ms,
        }
    }

    /// With a zero interval the queue is drained inside the call that filed
    /// the request; otherwise the host drives draining on its own timer.
    pub fn synchronous(&self) -> bool {
        self.interval_ms == 0
    }

    pub fn allocate_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    pub fn enqueue(&mut self, ticket: GatewayTicket) {
        self.queue.push_back(ticket);
    }

    pub fn pop(&mut self) -> Option<GatewayTicket> {
        self.queue.pop_front()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}
