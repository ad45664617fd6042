//! Capabilities a tree uses to handle elements it knows nothing about.
//!
//! The tree never inspects its payloads directly. Ordering goes through [`Compare`], building a
//! value for a fresh node goes through [`Assign`], overwriting a value that is already stored
//! goes through [`Reassign`] and releasing a value goes through [`Destroy`]. The containers bind
//! one set of capabilities at construction and accept per-call overrides for insertion and
//! removal.

use crate::error::Result;
use std::cmp::Ordering;
use std::mem;

/// A strict total order over `T`. `Ordering::Equal` means the two values are the same key.
pub trait Compare<T: ?Sized> {
    fn compare(&self, x: &T, y: &T) -> Ordering;
}

/// Constructs the value stored in a brand new node from a source value.
pub trait Assign<T> {
    /// Builds the value to store. On error nothing is inserted.
    fn assign(&self, source: T) -> Result<T>;
}

/// Overwrites a value that is already stored in a node.
pub trait Reassign<T> {
    /// Replaces `target` with a value built from `source`. On error `target` must be left
    /// exactly as it was.
    fn reassign(&self, target: &mut T, source: T) -> Result<()>;
}

/// Releases a value that is leaving the tree.
pub trait Destroy<T> {
    fn destroy(&self, target: T);
}

/// Orders values by their `Ord` implementation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NaturalOrder;

impl<T> Compare<T> for NaturalOrder
where
    T: Ord + ?Sized,
{
    fn compare(&self, x: &T, y: &T) -> Ordering {
        x.cmp(y)
    }
}

/// Inverts another comparator.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlSet;
/// use avl_collections::capability::{NaturalOrder, Reverse};
///
/// let mut set = AvlSet::with_compare(Reverse(NaturalOrder));
/// set.insert(1).unwrap();
/// set.insert(3).unwrap();
/// assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&3, &1]);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Reverse<C>(pub C);

impl<T, C> Compare<T> for Reverse<C>
where
    T: ?Sized,
    C: Compare<T>,
{
    fn compare(&self, x: &T, y: &T) -> Ordering {
        self.0.compare(y, x)
    }
}

impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, x: &T, y: &T) -> Ordering {
        self(x, y)
    }
}

/// Moves values in, overwrites them in place and drops them on the way out.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Owned;

impl<T> Assign<T> for Owned {
    fn assign(&self, source: T) -> Result<T> {
        Ok(source)
    }
}

impl<T> Reassign<T> for Owned {
    fn reassign(&self, target: &mut T, source: T) -> Result<()> {
        *target = source;
        Ok(())
    }
}

impl<T> Destroy<T> for Owned {
    fn destroy(&self, target: T) {
        drop(target);
    }
}

/// Capabilities for plain `Copy` data: construction is a copy and destruction does nothing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Trivial;

impl<T: Copy> Assign<T> for Trivial {
    fn assign(&self, source: T) -> Result<T> {
        Ok(source)
    }
}

impl<T: Copy> Reassign<T> for Trivial {
    fn reassign(&self, target: &mut T, source: T) -> Result<()> {
        *target = source;
        Ok(())
    }
}

impl<T: Copy> Destroy<T> for Trivial {
    fn destroy(&self, _target: T) {}
}

/// Builds a replacement with `ops`, swaps it in through `commit` and destroys whatever `commit`
/// hands back.
///
/// Every sub-value of the replacement exists before `commit` runs, so when construction fails
/// the target has not been written to and still holds its previous contents.
///
/// # Examples
///
/// ```
/// use avl_collections::capability::{self, Owned};
/// use std::mem;
///
/// let mut slot = (1, String::from("one"));
/// capability::reassign_with(&Owned, (1, String::from("uno")), |new| mem::replace(&mut slot, new))
///     .unwrap();
/// assert_eq!(slot.1, "uno");
/// ```
pub fn reassign_with<T, O, F>(ops: &O, source: T, commit: F) -> Result<()>
where
    O: Assign<T> + Destroy<T>,
    F: FnOnce(T) -> T,
{
    let value = ops.assign(source)?;
    ops.destroy(commit(value));
    Ok(())
}

/// Capabilities for a key-value pair, built from the capabilities of each half.
///
/// The key is constructed first and the value second. If the value cannot be constructed the
/// freshly built key is destroyed again, so a failed assignment leaks nothing and a failed
/// reassignment leaves the old pair untouched.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KeyValue<KO, VO> {
    pub key: KO,
    pub value: VO,
}

impl<KO, VO> KeyValue<KO, VO> {
    pub fn new(key: KO, value: VO) -> Self {
        KeyValue { key, value }
    }
}

impl<K, V, KO, VO> Assign<(K, V)> for KeyValue<KO, VO>
where
    KO: Assign<K> + Destroy<K>,
    VO: Assign<V>,
{
    fn assign(&self, source: (K, V)) -> Result<(K, V)> {
        let (key, value) = source;
        let key = self.key.assign(key)?;
        match self.value.assign(value) {
            Ok(value) => Ok((key, value)),
            Err(error) => {
                self.key.destroy(key);
                Err(error)
            },
        }
    }
}

impl<K, V, KO, VO> Reassign<(K, V)> for KeyValue<KO, VO>
where
    KO: Assign<K> + Destroy<K>,
    VO: Assign<V> + Destroy<V>,
{
    fn reassign(&self, target: &mut (K, V), source: (K, V)) -> Result<()> {
        reassign_with(self, source, |new| mem::replace(target, new))
    }
}

impl<K, V, KO, VO> Destroy<(K, V)> for KeyValue<KO, VO>
where
    KO: Destroy<K>,
    VO: Destroy<V>,
{
    fn destroy(&self, target: (K, V)) {
        let (key, value) = target;
        self.key.destroy(key);
        self.value.destroy(value);
    }
}
