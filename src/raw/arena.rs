use alloc::vec::Vec;
use core::mem::size_of;

use super::handle::Handle;

/// Slot allocator for fixed-size blocks with exact outstanding-byte accounting.
///
/// Every live block is charged `size_of::<T>()` bytes. Freed slots are recycled through a free
/// list, so handles stay dense and `used()` returns to zero once every block is released.
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    used: usize,
}

impl<T> Arena<T> {
    /// Bytes charged for a single block.
    pub(crate) const BLOCK_SIZE: usize = size_of::<T>();

    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            used: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            used: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Number of live blocks.
    pub(crate) const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    #[cfg(any(test, feature = "validate"))]
    pub(crate) const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes held by live blocks.
    pub(crate) const fn used(&self) -> usize {
        self.used
    }

    /// Allocates a block holding `element`.
    ///
    /// # Panics
    ///
    /// Panics when the handle space is exhausted. Allocation failure is not recoverable here.
    pub(crate) fn alloc(&mut self, element: T) -> Handle {
        let handle = if let Some(h) = self.free.pop() {
            self.slots[h.to_index()] = Some(element);
            h
        } else {
            assert!(
                self.slots.len() <= Handle::MAX,
                "`Arena::alloc()` - arena is at maximum capacity ({} blocks)",
                Handle::MAX + 1
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        };
        self.used += Self::BLOCK_SIZE;
        handle
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Releases a block and hands back its contents.
    pub(crate) fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`Arena::take()` - `handle` is invalid!");
        self.free.push(handle);
        self.used -= Self::BLOCK_SIZE;
        element
    }

    pub(crate) fn free(&mut self, handle: Handle) {
        drop(self.take(handle));
    }

    /// Releases every block at once. Slot storage is kept for reuse.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.used = 0;
    }
}
