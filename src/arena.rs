use std::{
    alloc::{GlobalAlloc, Layout, System, handle_alloc_error},
    cell::RefCell,
    ptr::NonNull,
    slice,
};

use crate::{
    align::{ALIGN, is_aligned, slop},
    block::{BlockKind, BlockStore},
    error::{Error, Result},
    options::DEFAULT_BLOCK_SIZE,
    usage::{UsageCounter, UsageHandle},
};

#[derive(Debug, Clone, Copy)]
struct Cursor {
    block: usize,
    offset: usize,
}

struct ArenaInner<A: GlobalAlloc> {
    blocks: BlockStore<A>,
    // next free byte of the active block, `None` until the first standard block
    cursor: Option<Cursor>,
    // bytes free from `cursor` to the end of the active block
    remaining: usize,
    block_size: usize,
}

impl<A: GlobalAlloc> ArenaInner<A> {
    fn cursor_addr(&self) -> usize {
        match self.cursor {
            Some(c) => self.blocks.get(c.block).as_ptr().addr() + c.offset,
            None => 0,
        }
    }

    /// Skips `pad` bytes, then hands out `bytes` from the active block.
    fn bump(&mut self, pad: usize, bytes: usize) -> NonNull<[u8]> {
        let need = pad + bytes;
        debug_assert!(need <= self.remaining);

        let Some(cursor) = self.cursor.as_mut() else {
            unreachable!("bump without an active block");
        };
        let block = self.blocks.get(cursor.block);
        debug_assert!(cursor.offset + need <= block.len());
        // SAFETY: offset + need stays within the active block
        let ptr = unsafe { block.as_non_null().add(cursor.offset + pad) };

        cursor.offset += need;
        self.remaining -= need;
        NonNull::slice_from_raw_parts(ptr, bytes)
    }

    fn allocate(&mut self, bytes: usize, usage: &UsageCounter) -> Result<NonNull<[u8]>> {
        if bytes <= self.remaining {
            return Ok(self.bump(0, bytes));
        }
        self.allocate_fallback(bytes, usage)
    }

    fn allocate_fallback(&mut self, bytes: usize, usage: &UsageCounter) -> Result<NonNull<[u8]>> {
        if bytes > self.block_size / 4 {
            // large objects get their own block, the active one stays usable
            return self.allocate_dedicated(bytes, ALIGN, usage);
        }

        self.reload_block(usage)?;
        Ok(self.bump(0, bytes))
    }

    /// Makes a fresh standard block the active one. The tail of the current
    /// block is wasted.
    fn reload_block(&mut self, usage: &UsageCounter) -> Result<()> {
        let idx = self
            .blocks
            .acquire(self.block_size, ALIGN, BlockKind::Standard, usage)?;
        self.cursor = Some(Cursor {
            block: idx,
            offset: 0,
        });
        self.remaining = self.block_size;
        Ok(())
    }

    fn allocate_dedicated(
        &mut self,
        bytes: usize,
        align: usize,
        usage: &UsageCounter,
    ) -> Result<NonNull<[u8]>> {
        let idx = self
            .blocks
            .acquire(bytes, align, BlockKind::Dedicated, usage)?;
        let ptr = self.blocks.get(idx).as_non_null();
        Ok(NonNull::slice_from_raw_parts(ptr, bytes))
    }

    fn allocate_aligned(&mut self, bytes: usize, usage: &UsageCounter) -> Result<NonNull<[u8]>> {
        let pad = slop(self.cursor_addr(), ALIGN);
        let region = if bytes.saturating_add(pad) <= self.remaining {
            self.bump(pad, bytes)
        } else {
            // fresh blocks are requested with ALIGN, no padding needed
            self.allocate_fallback(bytes, usage)?
        };

        debug_assert!(is_aligned(region.cast::<u8>().as_ptr().addr(), ALIGN));
        Ok(region)
    }

    fn allocate_layout(&mut self, layout: Layout, usage: &UsageCounter) -> Result<NonNull<[u8]>> {
        let bytes = layout.size();
        match layout.align() {
            1 => self.allocate(bytes, usage),
            align if align <= ALIGN => self.allocate_aligned(bytes, usage),
            align => {
                let pad = slop(self.cursor_addr(), align);
                if bytes.saturating_add(pad) <= self.remaining {
                    return Ok(self.bump(pad, bytes));
                }

                // a fresh block starts ALIGN-aligned, so padding is at most align - ALIGN
                let worst = bytes.saturating_add(align - ALIGN);
                if bytes > self.block_size / 4 || worst > self.block_size {
                    return self.allocate_dedicated(bytes, align, usage);
                }

                self.reload_block(usage)?;
                let pad = slop(self.cursor_addr(), align);
                Ok(self.bump(pad, bytes))
            }
        }
    }
}

/// Bump allocator serving many small requests out of larger blocks.
///
/// Memory handed out is never freed individually; every block goes back to
/// the backing allocator `A` when the arena drops. Blocks never move, so the
/// returned regions stay valid for the arena's whole lifetime, even if the
/// `Arena` value itself is moved.
///
/// Allocation needs a single allocating context: the arena is `Send` but not
/// `Sync`. [`Arena::usage`] hands out a handle that may be read from any
/// thread while allocation goes on.
pub struct Arena<A: GlobalAlloc = System> {
    inner: RefCell<ArenaInner<A>>,
    usage: UsageCounter,
}

impl Arena {
    pub fn new() -> Self {
        Self::with_allocator(System)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: GlobalAlloc> Arena<A> {
    /// Arena with the default block size, taking blocks from `alloc`.
    pub fn with_allocator(alloc: A) -> Self {
        Self::from_parts(DEFAULT_BLOCK_SIZE, alloc)
    }

    pub(crate) fn from_parts(block_size: usize, alloc: A) -> Self {
        Self {
            inner: RefCell::new(ArenaInner {
                blocks: BlockStore::new(alloc),
                cursor: None,
                remaining: 0,
                block_size,
            }),
            usage: UsageCounter::default(),
        }
    }

    /// Returns `bytes` contiguous, uninitialized bytes with no alignment
    /// guarantee.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero. Aborts through [`handle_alloc_error`] if the
    /// backing allocator cannot provide a new block.
    pub fn allocate(&self, bytes: usize) -> NonNull<[u8]> {
        or_abort(self.try_allocate(bytes))
    }

    /// Like [`Arena::allocate`], but reports a failing backing allocator as an
    /// error. The arena is left unchanged in that case.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero.
    pub fn try_allocate(&self, bytes: usize) -> Result<NonNull<[u8]>> {
        assert!(bytes > 0, "zero-byte allocation");
        self.inner.borrow_mut().allocate(bytes, &self.usage)
    }

    /// Returns `bytes` uninitialized bytes starting on an [`ALIGN`] boundary.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero. Aborts through [`handle_alloc_error`] if the
    /// backing allocator cannot provide a new block.
    pub fn allocate_aligned(&self, bytes: usize) -> NonNull<[u8]> {
        or_abort(self.try_allocate_aligned(bytes))
    }

    /// Fallible twin of [`Arena::allocate_aligned`].
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is zero.
    pub fn try_allocate_aligned(&self, bytes: usize) -> Result<NonNull<[u8]>> {
        assert!(bytes > 0, "zero-byte allocation");
        self.inner.borrow_mut().allocate_aligned(bytes, &self.usage)
    }

    pub(crate) fn allocate_layout(&self, layout: Layout) -> NonNull<u8> {
        assert!(layout.size() > 0, "zero-byte allocation");
        let res = self.inner.borrow_mut().allocate_layout(layout, &self.usage);
        or_abort(res).cast()
    }

    /// Copies `src` into the arena and returns the copy.
    ///
    /// # Panics
    ///
    /// Panics if `src` is empty.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_copy(&self, src: &[u8]) -> &mut [u8] {
        let region = self.allocate(src.len());
        // SAFETY: the region is fresh, exclusively ours and lives as long as
        // the arena, which `&self` keeps alive.
        unsafe {
            let dst = slice::from_raw_parts_mut(region.cast::<u8>().as_ptr(), src.len());
            dst.copy_from_slice(src);
            dst
        }
    }

    /// Total bytes committed to blocks, block bookkeeping included.
    pub fn memory_usage(&self) -> usize {
        self.usage.get()
    }

    pub fn usage(&self) -> UsageHandle {
        self.usage.handle()
    }

    pub fn block_size(&self) -> usize {
        self.inner.borrow().block_size
    }

    pub fn block_count(&self) -> usize {
        self.inner.borrow().blocks.len()
    }

    /// Bytes left in the active block.
    pub fn remaining(&self) -> usize {
        self.inner.borrow().remaining
    }
}

impl<A: GlobalAlloc> Drop for Arena<A> {
    fn drop(&mut self) {
        tracing::debug!(
            "Releasing arena: {} blocks, usage {}",
            self.inner.get_mut().blocks.len(),
            self.usage.get()
        );
    }
}

fn or_abort<T>(res: Result<T>) -> T {
    match res {
        Ok(v) => v,
        Err(Error::OutOfMemory { layout }) => handle_alloc_error(layout),
        Err(e) => panic!("arena allocation failed: {e}"),
    }
}
