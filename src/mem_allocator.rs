use std::{
    alloc::{GlobalAlloc, Layout},
    ptr::NonNull,
    rc::Rc,
    sync::Arc,
};

use crate::arena::Arena;

/// Memory source for structures that place nodes they never free one by
/// one, such as skiplist towers in a memtable.
pub trait MemAllocator {
    /// Returns uninitialized memory fitting `layout`, valid until the
    /// allocator is dropped.
    ///
    /// # Panics
    ///
    /// Panics on a zero-sized `layout`.
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    fn mem_usage(&self) -> usize;
}

impl<A: GlobalAlloc> MemAllocator for Arena<A> {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        self.allocate_layout(layout)
    }

    fn mem_usage(&self) -> usize {
        self.memory_usage()
    }
}

impl<M: MemAllocator + ?Sized> MemAllocator for &M {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        (**self).allocate(layout)
    }

    fn mem_usage(&self) -> usize {
        (**self).mem_usage()
    }
}

impl<M: MemAllocator + ?Sized> MemAllocator for Rc<M> {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        self.as_ref().allocate(layout)
    }

    fn mem_usage(&self) -> usize {
        self.as_ref().mem_usage()
    }
}

impl<M: MemAllocator + ?Sized> MemAllocator for Arc<M> {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        self.as_ref().allocate(layout)
    }

    fn mem_usage(&self) -> usize {
        self.as_ref().mem_usage()
    }
}
