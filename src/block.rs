use std::{
    alloc::{GlobalAlloc, Layout},
    ptr::NonNull,
};

use crate::{
    error::{Error, Result},
    usage::UsageCounter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// Becomes the active block for bump allocation.
    Standard,
    /// Holds exactly one large request.
    Dedicated,
}

/// One fixed-length buffer obtained from the backing allocator.
#[derive(Debug)]
pub(crate) struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Block {
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub(crate) fn as_non_null(&self) -> NonNull<u8> {
        self.ptr
    }

    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, addr: usize, len: usize) -> bool {
        let start = self.ptr.as_ptr().addr();
        addr >= start && addr + len <= start + self.len()
    }
}

/// Append-only list of blocks. Blocks are never resized or moved, and all of
/// them go back to the allocator together when the store drops.
pub(crate) struct BlockStore<A: GlobalAlloc> {
    alloc: A,
    blocks: Vec<Block>,
}

// SAFETY: every block is uniquely owned heap memory; the raw pointers are
// never shared with another store.
unsafe impl<A: GlobalAlloc + Send> Send for BlockStore<A> {}

impl<A: GlobalAlloc> BlockStore<A> {
    pub(crate) fn new(alloc: A) -> Self {
        Self {
            alloc,
            blocks: Vec::new(),
        }
    }

    /// Allocates a new block and returns its index.
    pub(crate) fn acquire(
        &mut self,
        size: usize,
        align: usize,
        kind: BlockKind,
        usage: &UsageCounter,
    ) -> Result<usize> {
        debug_assert!(size > 0);
        let layout = Layout::from_size_align(size, align)?;

        // grow the list first, a failed push must not leak a fresh block
        self.blocks.reserve(1);

        let ptr = unsafe { self.alloc.alloc(layout) };
        let Some(ptr) = NonNull::new(ptr) else {
            tracing::warn!("Failed to allocate {:?} block of {} bytes", kind, size);
            return Err(Error::OutOfMemory { layout });
        };

        self.blocks.push(Block { ptr, layout });
        let total = usage.record_block(size);
        tracing::trace!(
            "Acquired {:?} block #{} of {} bytes, usage {}",
            kind,
            self.blocks.len() - 1,
            size,
            total
        );

        Ok(self.blocks.len() - 1)
    }

    pub(crate) fn get(&self, idx: usize) -> &Block {
        &self.blocks[idx]
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }
}

impl<A: GlobalAlloc> Drop for BlockStore<A> {
    fn drop(&mut self) {
        for block in self.blocks.drain(..) {
            unsafe { self.alloc.dealloc(block.ptr.as_ptr(), block.layout) };
        }
    }
}
