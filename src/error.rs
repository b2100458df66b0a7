#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(
        "Out of memory: failed to allocate a block of {} bytes (align {})",
        .layout.size(),
        .layout.align()
    )]
    OutOfMemory { layout: std::alloc::Layout },

    #[error("Layout error: {0}")]
    Layout(#[from] std::alloc::LayoutError),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
