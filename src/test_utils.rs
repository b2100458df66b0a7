use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
    ptr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering::SeqCst},
    },
};

use parking_lot::Mutex;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default, Debug)]
struct TrackingInner {
    mems: Mutex<Vec<(usize, Layout)>>,
    allocs: AtomicUsize,
    deallocs: AtomicUsize,
}

/// Forwards to [`System`] and remembers every live block.
///
/// Releasing a pointer it never handed out (or releasing one twice) panics.
#[derive(Default, Debug, Clone)]
pub struct TrackingAlloc(Arc<TrackingInner>);

impl TrackingAlloc {
    pub fn allocations(&self) -> usize {
        self.0.allocs.load(SeqCst)
    }

    pub fn deallocations(&self) -> usize {
        self.0.deallocs.load(SeqCst)
    }

    pub fn live(&self) -> usize {
        self.0.mems.lock().len()
    }

    pub fn live_bytes(&self) -> usize {
        self.0.mems.lock().iter().map(|(_, layout)| layout.size()).sum()
    }
}

unsafe impl GlobalAlloc for TrackingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            self.0.mems.lock().push((ptr.addr(), layout));
            self.0.allocs.fetch_add(1, SeqCst);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        {
            let mut mems = self.0.mems.lock();
            let pos = mems
                .iter()
                .position(|&(addr, l)| addr == ptr.addr() && l == layout)
                .unwrap_or_else(|| panic!("dealloc of untracked block {ptr:?}, {layout:?}"));
            mems.swap_remove(pos);
        }
        self.0.deallocs.fetch_add(1, SeqCst);
        unsafe { System.dealloc(ptr, layout) };
    }
}

/// Serves `budget` allocations from [`System`], then reports exhaustion.
#[derive(Debug)]
pub struct FailingAlloc {
    budget: Cell<usize>,
}

impl FailingAlloc {
    pub fn new(budget: usize) -> Self {
        Self {
            budget: Cell::new(budget),
        }
    }
}

unsafe impl GlobalAlloc for FailingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        match self.budget.get() {
            0 => ptr::null_mut(),
            n => {
                self.budget.set(n - 1);
                unsafe { System.alloc(layout) }
            }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
    }
}
