//! A key followed by a value in a single heap block.
//!
//! The block is laid out with [`Layout`]: the key is added first and the value second, so the
//! key always sits at the front of the block and the value at the next offset that satisfies
//! its alignment. Maps store one `Entry` per node and only ever compare the key half.

use crate::layout::Layout;
use std::alloc;
use std::cmp;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};

// Returns the block layout and the offsets of the key and the value. The block is never zero
// sized so that it can always come from the global allocator.
fn plan<K, V>() -> (Layout, usize, usize) {
    let mut layout = Layout::EMPTY;
    let key = layout.add(Layout::of::<K>());
    let value = layout.add(Layout::of::<V>());
    layout.pad();
    (
        Layout::new(cmp::max(layout.size(), 1), layout.alignment()),
        key,
        value,
    )
}

/// An owned key-value pair packed into one allocation.
pub struct Entry<K, V> {
    ptr: NonNull<u8>,
    marker: PhantomData<(K, V)>,
}

impl<K, V> Entry<K, V> {
    /// Moves `key` and `value` into a freshly allocated block. Gives both back if the block
    /// cannot be allocated.
    pub fn new(key: K, value: V) -> Result<Self, (K, V)> {
        let (layout, key_offset, value_offset) = plan::<K, V>();
        let std_layout = match layout.to_std() {
            Some(std_layout) => std_layout,
            None => return Err((key, value)),
        };
        // SAFETY: `std_layout` is never zero sized.
        let ptr = match NonNull::new(unsafe { alloc::alloc(std_layout) }) {
            Some(ptr) => ptr,
            None => return Err((key, value)),
        };
        // SAFETY: both offsets are in bounds and aligned for their types because the block is
        // aligned to the larger of the two alignments.
        unsafe {
            ptr::write(ptr.as_ptr().add(key_offset) as *mut K, key);
            ptr::write(ptr.as_ptr().add(value_offset) as *mut V, value);
        }
        Ok(Entry {
            ptr,
            marker: PhantomData,
        })
    }

    fn key_ptr(&self) -> *mut K {
        let (_, key_offset, _) = plan::<K, V>();
        // SAFETY: the offset lies inside the block.
        unsafe { self.ptr.as_ptr().add(key_offset) as *mut K }
    }

    fn value_ptr(&self) -> *mut V {
        let (_, _, value_offset) = plan::<K, V>();
        // SAFETY: the offset lies inside the block.
        unsafe { self.ptr.as_ptr().add(value_offset) as *mut V }
    }

    pub fn key(&self) -> &K {
        // SAFETY: the key is initialized for the whole life of the entry.
        unsafe { &*self.key_ptr() }
    }

    pub fn value(&self) -> &V {
        // SAFETY: the value is initialized for the whole life of the entry.
        unsafe { &*self.value_ptr() }
    }

    pub fn value_mut(&mut self) -> &mut V {
        // SAFETY: as for `value`, and `&mut self` guarantees exclusive access.
        unsafe { &mut *self.value_ptr() }
    }

    /// Returns references to both halves.
    pub fn pair(&self) -> (&K, &V) {
        (self.key(), self.value())
    }

    /// Overwrites both halves, returning the previous key and value.
    pub fn replace(&mut self, key: K, value: V) -> (K, V) {
        // SAFETY: both halves are initialized and `&mut self` guarantees exclusive access.
        unsafe {
            (
                ptr::replace(self.key_ptr(), key),
                ptr::replace(self.value_ptr(), value),
            )
        }
    }

    /// Moves both halves out and releases the block.
    pub fn into_parts(self) -> (K, V) {
        let entry = ManuallyDrop::new(self);
        // SAFETY: both halves are read exactly once and the block is released without dropping
        // them again.
        unsafe {
            let key = ptr::read(entry.key_ptr());
            let value = ptr::read(entry.value_ptr());
            entry.deallocate();
            (key, value)
        }
    }

    // SAFETY: must be called at most once, after both halves have been moved out or dropped.
    unsafe fn deallocate(&self) {
        let (layout, _, _) = plan::<K, V>();
        match layout.to_std() {
            Some(std_layout) => alloc::dealloc(self.ptr.as_ptr(), std_layout),
            None => unreachable!(),
        }
    }
}

impl<K, V> Drop for Entry<K, V> {
    fn drop(&mut self) {
        // SAFETY: both halves are initialized; they are dropped once and the block released.
        unsafe {
            ptr::drop_in_place(self.key_ptr());
            ptr::drop_in_place(self.value_ptr());
            self.deallocate();
        }
    }
}

// SAFETY: an entry owns its key and value exactly like a `(K, V)` would.
unsafe impl<K: Send, V: Send> Send for Entry<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Entry<K, V> {}

impl<K, V> fmt::Debug for Entry<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", self.key())
            .field("value", self.value())
            .finish()
    }
}
