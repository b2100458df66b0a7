use std::mem;

const PTR_SIZE: usize = mem::size_of::<*const u8>();

/// Alignment served by [`Arena::allocate_aligned`](crate::Arena::allocate_aligned):
/// the larger of 8 and the native pointer size.
pub const ALIGN: usize = if PTR_SIZE > 8 { PTR_SIZE } else { 8 };

const _: () = assert!(ALIGN.is_power_of_two(), "Pointer size should be a power of 2");

/// Padding needed to move `addr` up to the next multiple of `align`.
#[inline]
pub(crate) fn slop(addr: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    let current_mod = addr & (align - 1);
    if current_mod == 0 { 0 } else { align - current_mod }
}

#[inline]
pub(crate) fn is_aligned(addr: usize, align: usize) -> bool {
    addr & (align - 1) == 0
}
