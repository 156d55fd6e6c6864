/*!
Allocation types and traits.
*/
use std::ptr::NonNull;

use libc::c_void;
use thiserror::Error;

/**
Abstracts over the raw storage an arena grows into.

In practice, this will be implemented by a marker type (which is not intended to actually be instantiated anywhere).  Keeping the allocator a type parameter leaves the allocation strategy pluggable, and lets tests substitute an allocator that fails on demand — which is the only way to observe the arena's no-partial-mutation guarantee from the outside.
*/
pub trait Allocator {
    /**
    Allocate the specified number of bytes.  The contents of the returned storage are unspecified.
    */
    fn alloc_bytes(bytes: usize) -> Result<NonNull<u8>, AllocError>;

    /**
    Free an allocation.

    # Safety

    `ptr` must have been returned by `alloc_bytes` of the *same* allocator, and must not be freed more than once.
    */
    unsafe fn free(ptr: NonNull<u8>);

    /**
    Returns a string which can be used to uniquely identify this allocator in debug output.
    */
    fn debug_prefix() -> &'static str;
}

/**
A general allocation error.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum AllocError {
    #[error("failed to allocate memory")]
    Failed,
    #[error("overflow while computing size")]
    SizeOverflow,
}

/**
Represents the C runtime heap allocator.
*/
pub enum Malloc {}

impl Allocator for Malloc {
    fn alloc_bytes(bytes: usize) -> Result<NonNull<u8>, AllocError> {
        unsafe {
            // malloc(0) may legally return null; never ask for it.
            let ptr = libc::malloc(bytes.max(1));
            NonNull::new(ptr as *mut u8).ok_or(AllocError::Failed)
        }
    }

    unsafe fn free(ptr: NonNull<u8>) {
        libc::free(ptr.as_ptr() as *mut c_void);
    }

    fn debug_prefix() -> &'static str { "C" }
}
