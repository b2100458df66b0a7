mod align;
mod arena;
mod block;
mod mem_allocator;
mod options;
mod usage;

#[cfg(test)]
mod test_utils;

pub mod error;

pub mod prelude {
    pub use crate::align::ALIGN;
    pub use crate::arena::Arena;
    pub use crate::mem_allocator::MemAllocator;
    pub use crate::options::{ArenaOptions, DEFAULT_BLOCK_SIZE, MIN_BLOCK_SIZE};
    pub use crate::usage::{BLOCK_OVERHEAD, UsageHandle};
}
pub use prelude::*;
