use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering::*},
    },
};

/// Bookkeeping charged for every block on top of its size: one pointer slot
/// in the arena's block list.
pub const BLOCK_OVERHEAD: usize = mem::size_of::<*mut u8>();

/// Shared counter of bytes committed to blocks.
///
/// Only block acquisition writes it, so relaxed ordering is enough: readers
/// want a recent total, not one synchronized with a particular allocation.
#[derive(Debug, Default)]
pub(crate) struct UsageCounter(Arc<AtomicUsize>);

impl UsageCounter {
    /// Charges a freshly acquired block and returns the new total.
    pub(crate) fn record_block(&self, block_bytes: usize) -> usize {
        let charge = block_bytes + BLOCK_OVERHEAD;
        self.0.fetch_add(charge, Relaxed) + charge
    }

    pub(crate) fn get(&self) -> usize {
        self.0.load(Relaxed)
    }

    pub(crate) fn handle(&self) -> UsageHandle {
        UsageHandle(self.0.clone())
    }
}

/// Read-only view of an arena's memory usage.
///
/// The handle is `Send + Sync` and outlives nothing: it can be polled from a
/// monitoring thread while the owning arena keeps allocating, and it keeps
/// reporting the final total after the arena is gone.
#[derive(Debug, Clone)]
pub struct UsageHandle(Arc<AtomicUsize>);

impl UsageHandle {
    pub fn get(&self) -> usize {
        self.0.load(Relaxed)
    }
}
