/*!
Pool-recycled growable byte storage.

Every transcoding entry point in this crate writes its output through an [`Arena`]: a contiguous, exclusively owned byte allocation with a logical size and a power-of-two capacity.  An arena can be used standalone, or its backing storage can come from a [`Pool`], which keeps the storage of recycled arenas around for reuse instead of returning it to the allocator.

Neither type is safe to share between threads; the pool performs no internal synchronisation.
*/
use std::fmt::{self, Debug};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::slice;

use log::trace;
use thiserror::Error;

use crate::alloc::{AllocError, Allocator, Malloc};

/**
The largest capacity an arena may reach.

Growth requests past the last full power of two clamp to this value, so on targets where the ceiling is not itself a power of two it is the one capacity that breaks the power-of-two rule.
*/
#[cfg(target_pointer_width = "64")]
pub const MAX_CAPACITY: usize = 0x7FFF_FFFF;
#[cfg(not(target_pointer_width = "64"))]
pub const MAX_CAPACITY: usize = 0x4000_0000;

/**
The largest number of slots a [`Pool`] will hold.
*/
pub const POOL_LIMIT: usize = 255;

// Capacities below this are not worth reallocating to reclaim.
const SHRINK_FLOOR: usize = 512;

/**
An error from an arena operation.

Every failing mutator leaves the arena exactly as it was before the call: same size, same capacity, same contents.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error("requested capacity {requested} exceeds the platform ceiling")]
    CapacityExceeded { requested: usize },
    #[error("size {requested} exceeds capacity {capacity}")]
    SizeOutOfBounds { requested: usize, capacity: usize },
}

/**
An error from a pool operation.
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("arena pool is full")]
    Exhausted,
    #[error("handle does not name a live pool slot")]
    BadHandle,
}

/**
A growable, exclusively owned byte store.

The capacity is always zero, a power of two, or [`MAX_CAPACITY`] itself (the ceiling a too-large power of two clamps to).  Growth allocates the replacement storage *before* touching the old allocation: on any failure the arena is left bytewise unchanged, and the old storage is freed only after its contents have been copied out.

`A` selects the backing [`Allocator`]; the default is the C runtime heap, matching the rest of the crate.
*/
pub struct Arena<A: Allocator = Malloc> {
    data: Option<NonNull<u8>>,
    size: usize,
    capacity: usize,
    _alloc: PhantomData<A>,
}

impl<A: Allocator> Arena<A> {
    /**
    Creates an empty arena.  No storage is allocated until the first append or reserve.
    */
    pub fn new() -> Self {
        Arena {
            data: None,
            size: 0,
            capacity: 0,
            _alloc: PhantomData,
        }
    }

    /**
    Creates an arena whose capacity already covers `capacity` bytes.
    */
    pub fn with_capacity(capacity: usize) -> Result<Self, ArenaError> {
        let mut arena = Arena::new();
        arena.reserve(capacity)?;
        Ok(arena)
    }

    /**
    The number of bytes logically in use.
    */
    pub fn size(&self) -> usize {
        self.size
    }

    /**
    The number of bytes allocated.
    */
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /**
    The bytes logically in use.  The returned slice's pointer identifies the backing storage even when the arena is empty, which the pool tests rely on.
    */
    pub fn as_slice(&self) -> &[u8] {
        match self.data {
            Some(data) => unsafe { slice::from_raw_parts(data.as_ptr(), self.size) },
            None => &[],
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        match self.data {
            Some(data) => unsafe { slice::from_raw_parts_mut(data.as_ptr(), self.size) },
            None => &mut [],
        }
    }

    /**
    Ensures capacity for at least `additional` more bytes beyond the current size, growing to the smallest power of two that covers the requirement.  The logical size is unchanged.

    Bulk transcoding reserves its worst-case output through this before looping, so a whole conversion costs at most one allocation.
    */
    pub fn reserve(&mut self, additional: usize) -> Result<(), ArenaError> {
        let needed = self
            .size
            .checked_add(additional)
            .ok_or(AllocError::SizeOverflow)?;
        if needed > self.capacity {
            self.grow_to(needed)?;
        }
        Ok(())
    }

    /**
    Appends `bytes`, growing if the remaining capacity is insufficient.  An empty slice is a no-op success.
    */
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), ArenaError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.reserve(bytes.len())?;
        debug_assert!(self.data.is_some());
        if let Some(data) = self.data {
            unsafe {
                ptr::copy_nonoverlapping(bytes.as_ptr(), data.as_ptr().add(self.size), bytes.len());
            }
            self.size += bytes.len();
        }
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<(), ArenaError> {
        self.append(&[byte])
    }

    /**
    Appends the little-endian memory image of a 16-bit code unit.
    */
    pub fn push_u16(&mut self, value: u16) -> Result<(), ArenaError> {
        self.append(&value.to_le_bytes())
    }

    /**
    Appends the little-endian memory image of a 32-bit code unit.
    */
    pub fn push_u32(&mut self, value: u32) -> Result<(), ArenaError> {
        self.append(&value.to_le_bytes())
    }

    /**
    Sets the logical size directly.  There is no implicit growth: a size beyond the current capacity is an error.
    */
    pub fn resize(&mut self, new_size: usize) -> Result<(), ArenaError> {
        if new_size > self.capacity {
            return Err(ArenaError::SizeOutOfBounds {
                requested: new_size,
                capacity: self.capacity,
            });
        }
        self.size = new_size;
        Ok(())
    }

    /**
    Resets the logical size to zero.  The storage is retained.
    */
    pub fn clear(&mut self) {
        self.size = 0;
    }

    /**
    Frees the backing storage immediately; size and capacity reset to zero.  Idempotent.  Also runs on drop.
    */
    pub fn release(&mut self) {
        if let Some(data) = self.data.take() {
            unsafe {
                A::free(data);
            }
        }
        self.size = 0;
        self.capacity = 0;
    }

    /**
    Reallocates down to the smallest power-of-two capacity that still covers the current size.

    Returns `Ok(false)` without touching the arena when the capacity is below a 512-byte floor or already minimal.
    */
    pub fn shrink_to_fit(&mut self) -> Result<bool, ArenaError> {
        if self.capacity < SHRINK_FLOOR {
            return Ok(false);
        }
        let target = self.size.next_power_of_two().min(MAX_CAPACITY);
        if target >= self.capacity {
            return Ok(false);
        }
        let new_data = A::alloc_bytes(target)?;
        if let Some(old) = self.data {
            unsafe {
                ptr::copy_nonoverlapping(old.as_ptr(), new_data.as_ptr(), self.size);
                A::free(old);
            }
        }
        trace!("arena shrunk from {} to {}", self.capacity, target);
        self.data = Some(new_data);
        self.capacity = target;
        Ok(true)
    }

    // Replace the allocation with one covering `needed` bytes.  The old
    // allocation survives until the new one holds a copy of the contents.
    fn grow_to(&mut self, needed: usize) -> Result<(), ArenaError> {
        debug_assert!(needed > self.capacity);
        if needed > MAX_CAPACITY {
            return Err(ArenaError::CapacityExceeded { requested: needed });
        }
        let capacity = needed.next_power_of_two().min(MAX_CAPACITY);
        let new_data = A::alloc_bytes(capacity)?;
        if let Some(old) = self.data {
            unsafe {
                ptr::copy_nonoverlapping(old.as_ptr(), new_data.as_ptr(), self.size);
                A::free(old);
            }
        }
        trace!("arena grown from {} to {}", self.capacity, capacity);
        self.data = Some(new_data);
        self.capacity = capacity;
        Ok(())
    }
}

impl<A: Allocator> Default for Arena<A> {
    fn default() -> Self {
        Arena::new()
    }
}

impl<A: Allocator> Drop for Arena<A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<A: Allocator> Debug for Arena<A> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Arena<{}>[{}/{}]",
            A::debug_prefix(),
            self.size,
            self.capacity
        )
    }
}

/**
Identifies one slot of a [`Pool`].
*/
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArenaId(u8);

#[derive(Copy, Clone, PartialEq, Eq)]
enum SlotState {
    Free,
    InUse,
}

struct Slot<A: Allocator> {
    arena: Arena<A>,
    state: SlotState,
}

/**
A bounded collection of recyclable arena slots.

At most [`POOL_LIMIT`] slots ever exist.  A recycled slot keeps its backing storage, so re-acquiring it costs no allocation; acquisition prefers the free slot with the largest capacity.

The pool is an ordinary owned value — callers decide where it lives and who may touch it.  It is not safe to share between threads without external locking.
*/
pub struct Pool<A: Allocator = Malloc> {
    slots: Vec<Slot<A>>,
}

impl<A: Allocator> Pool<A> {
    pub fn new() -> Self {
        Pool { slots: Vec::new() }
    }

    /**
    The number of slots, free and in use.
    */
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /**
    The number of slots currently acquired.
    */
    pub fn live(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::InUse)
            .count()
    }

    /**
    Hands out a slot: the free slot with the largest capacity when one exists, a fresh slot while the pool has room, otherwise [`PoolError::Exhausted`].  The arena behind the returned id is logically empty.
    */
    pub fn acquire(&mut self) -> Result<ArenaId, PoolError> {
        let mut candidate: Option<usize> = None;
        let mut best = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.state == SlotState::Free && (candidate.is_none() || best < slot.arena.capacity())
            {
                best = slot.arena.capacity();
                candidate = Some(index);
            }
        }

        if let Some(index) = candidate {
            let slot = &mut self.slots[index];
            slot.state = SlotState::InUse;
            slot.arena.clear();
            trace!("pool: reusing slot {} (capacity {})", index, best);
            return Ok(ArenaId(index as u8));
        }

        if self.slots.len() < POOL_LIMIT {
            self.slots.push(Slot {
                arena: Arena::new(),
                state: SlotState::InUse,
            });
            let index = self.slots.len() - 1;
            trace!("pool: opened slot {}", index);
            return Ok(ArenaId(index as u8));
        }

        Err(PoolError::Exhausted)
    }

    /**
    The arena behind an acquired id, or `None` for an unknown or free slot.
    */
    pub fn get(&self, id: ArenaId) -> Option<&Arena<A>> {
        self.slots
            .get(id.0 as usize)
            .filter(|slot| slot.state == SlotState::InUse)
            .map(|slot| &slot.arena)
    }

    pub fn get_mut(&mut self, id: ArenaId) -> Option<&mut Arena<A>> {
        self.slots
            .get_mut(id.0 as usize)
            .filter(|slot| slot.state == SlotState::InUse)
            .map(|slot| &mut slot.arena)
    }

    /**
    Marks the slot free without releasing its storage, so a later [`acquire`](Pool::acquire) can reuse the allocation at no cost.
    */
    pub fn recycle(&mut self, id: ArenaId) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(PoolError::BadHandle)?;
        if slot.state == SlotState::Free {
            return Err(PoolError::BadHandle);
        }
        slot.arena.clear();
        slot.state = SlotState::Free;
        trace!("pool: recycled slot {}", id.0);
        Ok(())
    }

    /**
    Frees the slot's backing storage.  The slot itself stays occupied and usable; it simply starts over from an empty allocation.
    */
    pub fn release(&mut self, id: ArenaId) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .ok_or(PoolError::BadHandle)?;
        if slot.state == SlotState::Free {
            return Err(PoolError::BadHandle);
        }
        slot.arena.release();
        Ok(())
    }
}

impl<A: Allocator> Default for Pool<A> {
    fn default() -> Self {
        Pool::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::{AllocError, Allocator, Malloc};
    use std::ptr::NonNull;

    // Refuses any allocation beyond 16 bytes; everything else goes to the
    // real heap.  Used to observe failure atomicity.
    enum TinyAlloc {}

    impl Allocator for TinyAlloc {
        fn alloc_bytes(bytes: usize) -> Result<NonNull<u8>, AllocError> {
            if bytes > 16 {
                return Err(AllocError::Failed);
            }
            Malloc::alloc_bytes(bytes)
        }

        unsafe fn free(ptr: NonNull<u8>) {
            Malloc::free(ptr)
        }

        fn debug_prefix() -> &'static str { "T" }
    }

    #[test]
    fn growth_reaches_next_power_of_two() {
        let mut arena: Arena = Arena::new();
        for byte in 0..100u8 {
            arena.append(&[byte]).unwrap();
        }
        assert_eq!(arena.size(), 100);
        assert_eq!(arena.capacity(), 128);
        assert_eq!(arena.as_slice()[99], 99);
    }

    #[test]
    fn single_byte_arena_has_capacity_one() {
        let mut arena: Arena = Arena::new();
        arena.push(0x41).unwrap();
        assert_eq!(arena.capacity(), 1);
    }

    #[test]
    fn append_empty_is_noop() {
        let mut arena: Arena = Arena::new();
        arena.append(&[]).unwrap();
        assert_eq!(arena.size(), 0);
        assert_eq!(arena.capacity(), 0);
    }

    #[test]
    fn resize_cannot_grow() {
        let mut arena: Arena = Arena::with_capacity(8).unwrap();
        arena.resize(8).unwrap();
        assert_eq!(
            arena.resize(9),
            Err(ArenaError::SizeOutOfBounds {
                requested: 9,
                capacity: 8
            })
        );
        assert_eq!(arena.size(), 8);
    }

    #[test]
    fn failed_growth_leaves_arena_unchanged() {
        let mut arena: Arena<TinyAlloc> = Arena::new();
        arena.append(b"0123456789").unwrap();
        assert_eq!(arena.capacity(), 16);

        let err = arena.append(&[0u8; 32]).unwrap_err();
        assert_eq!(err, ArenaError::Alloc(AllocError::Failed));
        assert_eq!(arena.size(), 10);
        assert_eq!(arena.capacity(), 16);
        assert_eq!(arena.as_slice(), b"0123456789");
    }

    #[test]
    fn release_is_idempotent() {
        let mut arena: Arena = Arena::new();
        arena.append(b"abc").unwrap();
        arena.release();
        assert_eq!(arena.capacity(), 0);
        arena.release();
        assert_eq!(arena.size(), 0);
    }

    #[test]
    fn shrink_respects_floor() {
        let mut arena: Arena = Arena::with_capacity(256).unwrap();
        assert_eq!(arena.shrink_to_fit().unwrap(), false);
        assert_eq!(arena.capacity(), 256);
    }

    #[test]
    fn shrink_reallocates_to_minimal_capacity() {
        let mut arena: Arena = Arena::with_capacity(1024).unwrap();
        arena.append(b"short").unwrap();
        assert_eq!(arena.shrink_to_fit().unwrap(), true);
        assert_eq!(arena.capacity(), 8);
        assert_eq!(arena.as_slice(), b"short");
        assert_eq!(arena.shrink_to_fit().unwrap(), false);
    }

    #[test]
    fn growth_request_clamps_to_the_ceiling() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static LAST_REQUEST: AtomicUsize = AtomicUsize::new(0);

        // Records the size asked of it and refuses, so the capacity
        // computation can be observed without a multi-gigabyte allocation.
        enum RecordingAlloc {}

        impl Allocator for RecordingAlloc {
            fn alloc_bytes(bytes: usize) -> Result<NonNull<u8>, AllocError> {
                LAST_REQUEST.store(bytes, Ordering::SeqCst);
                Err(AllocError::Failed)
            }

            unsafe fn free(_ptr: NonNull<u8>) {}

            fn debug_prefix() -> &'static str { "R" }
        }

        let mut arena: Arena<RecordingAlloc> = Arena::new();
        let err = arena.reserve(MAX_CAPACITY).unwrap_err();
        assert_eq!(err, ArenaError::Alloc(AllocError::Failed));
        assert_eq!(LAST_REQUEST.load(Ordering::SeqCst), MAX_CAPACITY);

        assert_eq!(
            arena.reserve(MAX_CAPACITY + 1),
            Err(ArenaError::CapacityExceeded {
                requested: MAX_CAPACITY + 1
            })
        );
    }

    #[test]
    fn pool_reuses_recycled_storage() {
        let mut pool: Pool = Pool::new();
        let first = pool.acquire().unwrap();
        pool.get_mut(first).unwrap().append(b"warm").unwrap();
        let storage = pool.get(first).unwrap().as_slice().as_ptr();

        pool.recycle(first).unwrap();
        let second = pool.acquire().unwrap();
        let arena = pool.get(second).unwrap();
        assert!(arena.is_empty());
        assert_eq!(arena.as_slice().as_ptr(), storage);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn pool_prefers_largest_free_slot() {
        let mut pool: Pool = Pool::new();
        let small = pool.acquire().unwrap();
        let large = pool.acquire().unwrap();
        pool.get_mut(small).unwrap().reserve(32).unwrap();
        pool.get_mut(large).unwrap().reserve(4096).unwrap();
        pool.recycle(small).unwrap();
        pool.recycle(large).unwrap();

        let reused = pool.acquire().unwrap();
        assert_eq!(pool.get(reused).unwrap().capacity(), 4096);
    }

    #[test]
    fn pool_rejects_recycling_a_free_slot() {
        let mut pool: Pool = Pool::new();
        let id = pool.acquire().unwrap();
        pool.recycle(id).unwrap();
        assert_eq!(pool.recycle(id), Err(PoolError::BadHandle));
    }

    #[test]
    fn pool_exhausts_at_the_slot_limit() {
        let mut pool: Pool = Pool::new();
        for _ in 0..POOL_LIMIT {
            pool.acquire().unwrap();
        }
        assert_eq!(pool.live(), POOL_LIMIT);
        assert_eq!(pool.acquire(), Err(PoolError::Exhausted));
    }
}
