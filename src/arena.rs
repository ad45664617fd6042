//! Slab storage for tree nodes, addressed by stable handles.
//!
//! Links between nodes are handles into the arena rather than pointers, so a node's parent link
//! is a plain back-reference and the arena remains the single owner of every node.

use crate::error::{Error, Result};
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A stable reference to an object stored in an `Arena<T>`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

enum Block<T> {
    Occupied(T),
    Vacant(Option<usize>),
}

/// An allocator for a single type of object.
///
/// Freed blocks are threaded onto a free list and handed out again before the backing `Vec`
/// grows. Growth goes through `Vec::try_reserve`, so running out of memory is reported as
/// `Error::AllocationFailed` instead of aborting. An optional limit caps the number of live
/// objects.
///
/// # Examples
///
/// ```
/// use avl_collections::arena::Arena;
///
/// let mut arena = Arena::new();
///
/// let x = arena.allocate(1).unwrap();
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct Arena<T> {
    head: Option<usize>,
    blocks: Vec<Block<T>>,
    len: usize,
    limit: Option<usize>,
}

impl<T> Arena<T> {
    /// Constructs a new, empty `Arena<T>`.
    pub fn new() -> Self {
        Arena {
            head: None,
            blocks: Vec::new(),
            len: 0,
            limit: None,
        }
    }

    /// Constructs a new, empty `Arena<T>` with room for `capacity` objects before it has to
    /// grow.
    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            head: None,
            blocks: Vec::with_capacity(capacity),
            len: 0,
            limit: None,
        }
    }

    /// Caps the number of live objects. Reserving beyond the limit fails with
    /// `Error::AllocationFailed`.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns the number of live objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Makes sure the next call to `allocate` can store an object without allocating memory.
    pub fn reserve(&mut self) -> Result<()> {
        if let Some(limit) = self.limit {
            if self.len >= limit {
                return Err(Error::AllocationFailed);
            }
        }
        if self.head.is_none() && self.blocks.len() == self.blocks.capacity() {
            self.blocks
                .try_reserve(1)
                .map_err(|_| Error::AllocationFailed)?;
        }
        Ok(())
    }

    /// Stores an object and returns its handle.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::arena::Arena;
    ///
    /// let mut arena = Arena::new();
    /// let x = arena.allocate(0).unwrap();
    /// assert_eq!(arena.get(x), Some(&0));
    /// ```
    pub fn allocate(&mut self, value: T) -> Result<Handle> {
        self.reserve()?;
        self.len += 1;

        match self.head.take() {
            None => {
                self.blocks.push(Block::Occupied(value));
                Ok(Handle(self.blocks.len() - 1))
            },
            Some(index) => {
                let vacant_block = mem::replace(&mut self.blocks[index], Block::Occupied(value));
                match vacant_block {
                    Block::Vacant(next) => {
                        self.head = next;
                        Ok(Handle(index))
                    },
                    Block::Occupied(_) => panic!("Error: free list points at an occupied block."),
                }
            },
        }
    }

    /// Removes an object from the arena and returns it. The handle may be handed out again by a
    /// later allocation.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not refer to a live object.
    pub fn free(&mut self, handle: Handle) -> T {
        if handle.0 >= self.blocks.len() {
            panic!("Error: attempting to free invalid block.");
        }
        let old_block = mem::replace(&mut self.blocks[handle.0], Block::Vacant(self.head));
        match old_block {
            Block::Vacant(next) => {
                self.blocks[handle.0] = Block::Vacant(next);
                panic!("Error: attempting to free vacant block.");
            },
            Block::Occupied(value) => {
                self.len -= 1;
                self.head = Some(handle.0);
                value
            },
        }
    }

    /// Returns a reference to an object, or `None` if the handle does not refer to a live
    /// object.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        match self.blocks.get(handle.0) {
            Some(Block::Occupied(ref value)) => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to an object, or `None` if the handle does not refer to a
    /// live object.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        match self.blocks.get_mut(handle.0) {
            Some(Block::Occupied(ref mut value)) => Some(value),
            _ => None,
        }
    }

    /// Drops every object and forgets all handles, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.head = None;
        self.len = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(handle).expect("Error: handle out of bounds.")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(handle).expect("Error: handle out of bounds.")
    }
}

#[cfg(test)]
mod tests {
    use super::{Arena, Handle};
    use crate::error::Error;

    #[test]
    #[should_panic]
    fn test_free_invalid_block() {
        let mut arena: Arena<u32> = Arena::new();
        arena.free(Handle(0));
    }

    #[test]
    #[should_panic]
    fn test_free_vacant_block() {
        let mut arena = Arena::new();
        let handle = arena.allocate(0).unwrap();
        arena.free(handle);
        arena.free(handle);
    }

    #[test]
    fn test_allocate() {
        let mut arena = Arena::new();
        assert_eq!(arena.allocate(0), Ok(Handle(0)));
        assert_eq!(arena.allocate(0), Ok(Handle(1)));
        assert_eq!(arena.allocate(0), Ok(Handle(2)));
        assert_eq!(arena.len(), 3);
    }

    #[test]
    fn test_free_reuses_block() {
        let mut arena = Arena::new();
        let first = arena.allocate(0).unwrap();
        let second = arena.allocate(1).unwrap();
        assert_eq!(arena.free(first), 0);
        assert_eq!(arena.free(second), 1);
        assert!(arena.is_empty());

        assert_eq!(arena.allocate(2), Ok(second));
        assert_eq!(arena.allocate(3), Ok(first));
        assert_eq!(arena.allocate(4), Ok(Handle(2)));
    }

    #[test]
    fn test_get() {
        let mut arena = Arena::new();
        let handle = arena.allocate(0).unwrap();
        assert_eq!(arena.get(handle), Some(&0));
        assert_eq!(arena.get(Handle(1)), None);

        arena.free(handle);
        assert_eq!(arena.get(handle), None);
    }

    #[test]
    fn test_get_mut() {
        let mut arena = Arena::new();
        let handle = arena.allocate(0).unwrap();
        *arena.get_mut(handle).unwrap() = 1;
        assert_eq!(arena[handle], 1);
        assert_eq!(arena.get_mut(Handle(4)), None);
    }

    #[test]
    fn test_limit() {
        let mut arena = Arena::with_capacity(4);
        arena.set_limit(Some(2));
        let first = arena.allocate(0).unwrap();
        arena.allocate(1).unwrap();
        assert_eq!(arena.allocate(2), Err(Error::AllocationFailed));
        assert_eq!(arena.len(), 2);

        arena.free(first);
        assert!(arena.allocate(2).is_ok());
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::new();
        arena.allocate(0).unwrap();
        arena.allocate(1).unwrap();
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.allocate(2), Ok(Handle(0)));
    }
}
