use std::alloc::{GlobalAlloc, System};

use crate::{
    align::ALIGN,
    arena::Arena,
    error::{Error, Result},
};

pub const DEFAULT_BLOCK_SIZE: usize = 4096;

pub const MIN_BLOCK_SIZE: usize = 4 * ALIGN;

#[derive(Debug, Clone)]
pub struct ArenaOptions {
    block_size: usize,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ArenaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard block size. Requests above a quarter of it get a block of
    /// their own.
    pub fn block_size(&mut self, size: usize) -> &mut Self {
        self.block_size = size;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(Error::InvalidOptions(format!(
                "block size {} is smaller than {}",
                self.block_size, MIN_BLOCK_SIZE
            )));
        }
        if self.block_size % ALIGN != 0 {
            return Err(Error::InvalidOptions(format!(
                "block size {} is not a multiple of {}",
                self.block_size, ALIGN
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Arena> {
        self.build_in(System)
    }

    pub fn build_in<A: GlobalAlloc>(&self, alloc: A) -> Result<Arena<A>> {
        self.validate()?;
        Ok(Arena::from_parts(self.block_size, alloc))
    }
}
