// ── Single-slot reentrancy guard ──
//
// At most one holder at a time. A second `try_acquire` while held
// fails immediately; nothing is queued. Release happens when the
// guard drops, on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::trace;

#[derive(Debug)]
pub struct Slot {
    name: &'static str,
    held: AtomicBool,
}

impl Slot {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            held: AtomicBool::new(false),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Take the slot, or `None` if someone else holds it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SlotGuard> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        trace!(slot = self.name, "acquired");
        Some(SlotGuard {
            slot: Arc::clone(self),
        })
    }
}

/// Proof of holding a [`Slot`]. `Send`, so it can move into a task.
#[derive(Debug)]
pub struct SlotGuard {
    slot: Arc<Slot>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.held.store(false, Ordering::Release);
        trace!(slot = self.slot.name, "released");
    }
}
