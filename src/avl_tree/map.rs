use crate::arena::Handle;
use crate::avl_tree::node::Direction;
use crate::avl_tree::tree::Tree;
use crate::capability::{self, Assign, Compare, Destroy, NaturalOrder, Owned};
use crate::entry::Entry;
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Index, IndexMut};
use tracing::debug;

/// An ordered map implemented using an avl tree.
///
/// Each node stores its key and value packed into a single [`Entry`] block. Keys are ordered by
/// a [`Compare`] capability; the pair is built and released through capabilities working on
/// `(K, V)`, so keys and values are always constructed and destroyed together.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlMap;
///
/// let mut map = AvlMap::new();
/// assert_eq!(map.insert(0, 1), Ok(true));
/// assert_eq!(map.insert(3, 4), Ok(true));
///
/// assert_eq!(map[&0], 1);
/// assert_eq!(map.get(&1), None);
/// assert_eq!(map.len(), 2);
///
/// assert_eq!(AvlMap::min(&map), Some(&0));
/// assert_eq!(map.ceil(&2), Some(&3));
///
/// map[&0] = 2;
/// assert_eq!(map.take(&0), Some((0, 2)));
/// assert!(!map.remove(&1));
/// ```
pub struct AvlMap<K, V, C = NaturalOrder, O = Owned>
where
    O: Destroy<(K, V)>,
{
    tree: Tree<Entry<K, V>>,
    root: Option<Handle>,
    len: usize,
    compare: C,
    ops: O,
}

impl<K, V> AvlMap<K, V>
where
    K: Ord,
{
    /// Constructs a new, empty `AvlMap<K, V>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let map: AvlMap<u32, u32> = AvlMap::new();
    /// ```
    pub fn new() -> Self {
        AvlMap::with_capabilities(NaturalOrder, Owned)
    }

    /// Constructs a new, empty `AvlMap<K, V>` with room for `capacity` entries before its node
    /// storage has to grow.
    pub fn with_capacity(capacity: usize) -> Self {
        AvlMap {
            tree: Tree::with_capacity(capacity),
            root: None,
            len: 0,
            compare: NaturalOrder,
            ops: Owned,
        }
    }
}

impl<K, V, C> AvlMap<K, V, C>
where
    C: Compare<K>,
{
    /// Constructs a new, empty map whose keys are ordered by `compare`.
    pub fn with_compare(compare: C) -> Self {
        AvlMap::with_capabilities(compare, Owned)
    }
}

impl<K, V, C, O> AvlMap<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    /// Constructs a new, empty map with explicit ordering and lifecycle capabilities.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    /// use avl_collections::capability::{KeyValue, NaturalOrder, Owned, Trivial};
    ///
    /// let mut map = AvlMap::with_capabilities(NaturalOrder, KeyValue::new(Trivial, Owned));
    /// map.insert(1, String::from("one")).unwrap();
    /// assert_eq!(map.get(&1).map(String::as_str), Some("one"));
    /// ```
    pub fn with_capabilities(compare: C, ops: O) -> Self {
        AvlMap {
            tree: Tree::new(),
            root: None,
            len: 0,
            compare,
            ops,
        }
    }

    /// Caps the number of entries the map may hold. Inserting a new key beyond the limit fails
    /// with `Error::AllocationFailed`.
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.set_node_limit(Some(limit));
        self
    }

    pub fn set_node_limit(&mut self, limit: Option<usize>) {
        self.tree.set_limit(limit);
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.tree.limit()
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height(self.root)
    }

    /// Returns the minimum key of the map. Returns `None` if the map is empty.
    pub fn min(&self) -> Option<&K> {
        self.root
            .map(|root| self.tree.payload(self.tree.xmost(root, Direction::Left)).key())
    }

    /// Returns the maximum key of the map. Returns `None` if the map is empty.
    pub fn max(&self) -> Option<&K> {
        self.root
            .map(|root| self.tree.payload(self.tree.xmost(root, Direction::Right)).key())
    }

    /// Removes the entry with the minimum key and returns it without destroying it.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.pop(Direction::Left)
    }

    /// Removes the entry with the maximum key and returns it without destroying it.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.pop(Direction::Right)
    }

    fn pop(&mut self, direction: Direction) -> Option<(K, V)> {
        let node = self.tree.xmost(self.root?, direction);
        let mut taken = None;
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |entry| taken = Some(entry.into_parts()));
        taken
    }

    /// Clears the map, destroying every entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// map.insert(2, 2).unwrap();
    /// map.clear();
    /// assert_eq!(map.is_empty(), true);
    /// ```
    pub fn clear(&mut self) {
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref ops,
            ..
        } = self;
        tree.clear(root.take(), |entry| ops.destroy(entry.into_parts()));
        *len = 0;
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs using in-order
    /// traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// map.insert(2, 2).unwrap();
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&1, &1)));
    /// assert_eq!(iterator.next(), Some((&2, &2)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> AvlMapIter<K, V> {
        AvlMapIter {
            tree: &self.tree,
            front: self.root.map(|root| self.tree.xmost(root, Direction::Left)),
            back: self.root.map(|root| self.tree.xmost(root, Direction::Right)),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys of the map in order.
    pub fn keys(&self) -> AvlMapKeys<K, V> {
        AvlMapKeys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map, ordered by their keys.
    pub fn values(&self) -> AvlMapValues<K, V> {
        AvlMapValues { inner: self.iter() }
    }
}

impl<K, V, C, O> AvlMap<K, V, C, O>
where
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    fn find(&self, key: &K) -> Option<Handle> {
        let mut curr = self.root;
        while let Some(node) = curr {
            match Direction::of(self.compare.compare(key, self.tree.payload(node).key())) {
                None => return Some(node),
                Some(direction) => curr = self.tree.link(node, direction),
            }
        }
        None
    }

    fn closest(&self, key: &K, side: Direction) -> Option<&K> {
        let mut curr = self.root;
        let mut best = None;
        while let Some(node) = curr {
            let curr_key = self.tree.payload(node).key();
            match Direction::of(self.compare.compare(key, curr_key)) {
                None => return Some(curr_key),
                Some(direction) => {
                    if direction != side {
                        best = Some(curr_key);
                    }
                    curr = self.tree.link(node, direction);
                },
            }
        }
        best
    }

    /// Inserts a key-value pair into the map. If the key already exists, the stored key and
    /// value are both replaced with freshly built copies of `key` and `value`.
    ///
    /// Returns `Ok(true)` if the key was new and `Ok(false)` if an existing entry was replaced.
    /// On error the map is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// assert_eq!(map.insert(1, 1), Ok(true));
    /// assert_eq!(map.get(&1), Some(&1));
    /// assert_eq!(map.insert(1, 2), Ok(false));
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<bool>
    where
        O: Assign<(K, V)>,
    {
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref compare,
            ref ops,
        } = self;
        insert_into(tree, root, len, compare, key, value, ops)
    }

    /// Inserts a key-value pair, building the entry with `ops` instead of the capability the map
    /// was constructed with. A replaced entry is released through `ops` as well.
    pub fn insert_with<A>(&mut self, key: K, value: V, ops: &A) -> Result<bool>
    where
        A: Assign<(K, V)> + Destroy<(K, V)>,
    {
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref compare,
            ..
        } = self;
        insert_into(tree, root, len, compare, key, value, ops)
    }

    /// Removes the entry with key `key` and destroys it. Returns `false` if the key does not
    /// exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert!(map.remove(&1));
    /// assert!(!map.remove(&1));
    /// ```
    pub fn remove(&mut self, key: &K) -> bool {
        let node = match self.find(key) {
            Some(node) => node,
            None => return false,
        };
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref ops,
            ..
        } = self;
        detach(tree, root, len, node, |entry| ops.destroy(entry.into_parts()));
        true
    }

    /// Removes the entry with key `key`, releasing it with `destroy` instead of the capability
    /// the map was constructed with.
    pub fn remove_with<D>(&mut self, key: &K, destroy: &D) -> bool
    where
        D: Destroy<(K, V)>,
    {
        let node = match self.find(key) {
            Some(node) => node,
            None => return false,
        };
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |entry| destroy.destroy(entry.into_parts()));
        true
    }

    /// Removes the entry with key `key` and returns it instead of destroying it.
    pub fn take(&mut self, key: &K) -> Option<(K, V)> {
        let node = self.find(key)?;
        let mut taken = None;
        let AvlMap {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |entry| taken = Some(entry.into_parts()));
        taken
    }

    /// Checks if a key exists in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert!(!map.contains_key(&0));
    /// assert!(map.contains_key(&1));
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Returns an immutable reference to the value associated with a particular key. It will
    /// return `None` if the key does not exist in the map.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|node| self.tree.payload(node).value())
    }

    /// Returns the stored key and its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, -1).unwrap();
    /// assert_eq!(map.lookup(&1), Some((&1, &-1)));
    /// assert_eq!(map.lookup(&2), None);
    /// ```
    pub fn lookup(&self, key: &K) -> Option<(&K, &V)> {
        self.find(key).map(|node| self.tree.payload(node).pair())
    }

    /// Returns a mutable reference to the value associated with a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, 1).unwrap();
    /// *map.get_mut(&1).unwrap() = 2;
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let node = self.find(key)?;
        Some(self.tree.payload_mut(node).value_mut())
    }

    /// Returns a key in the map that is less than or equal to a particular key. Returns `None` if
    /// such a key does not exist.
    pub fn floor(&self, key: &K) -> Option<&K> {
        self.closest(key, Direction::Left)
    }

    /// Returns a key in the map that is greater than or equal to a particular key. Returns
    /// `None` if such a key does not exist.
    pub fn ceil(&self, key: &K) -> Option<&K> {
        self.closest(key, Direction::Right)
    }

    /// Compares two maps entry by entry in key order, keys first through the map's comparator
    /// and then values through `compare_value`. When one map is a prefix of the other, the
    /// shorter map is less.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlMap;
    /// use std::cmp::Ordering;
    ///
    /// let mut x = AvlMap::new();
    /// let mut y = AvlMap::new();
    /// x.insert(1, 10).unwrap();
    /// y.insert(1, 20).unwrap();
    /// assert_eq!(x.compare_by(&y, |a, b| b.cmp(a)), Ordering::Greater);
    /// ```
    pub fn compare_by<F>(&self, other: &Self, mut compare_value: F) -> Ordering
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let mut lhs = self.iter();
        let mut rhs = other.iter();
        loop {
            match (lhs.next(), rhs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some((x_key, x_value)), Some((y_key, y_value))) => {
                    match self.compare.compare(x_key, y_key) {
                        Ordering::Equal => {},
                        ordering => return ordering,
                    }
                    match compare_value(x_value, y_value) {
                        Ordering::Equal => {},
                        ordering => return ordering,
                    }
                },
            }
        }
    }

    /// Compares two maps entry by entry, values through their `Ord` implementation.
    pub fn compare(&self, other: &Self) -> Ordering
    where
        V: Ord,
    {
        self.compare_by(other, |x, y| x.cmp(y))
    }

    /// Panics if any structural invariant of the map is broken.
    pub fn assert_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(self.tree.parent(root), None, "Error: root has a parent.");
        }
        self.tree.check(self.root);
        assert_eq!(self.tree.count(self.root), self.len);
        assert_eq!(self.tree.len(), self.len);

        let mut keys = self.keys();
        if let Some(mut prev) = keys.next() {
            for curr in keys {
                assert_eq!(
                    self.compare.compare(prev, curr),
                    Ordering::Less,
                    "Error: keys are out of order.",
                );
                prev = curr;
            }
        }
    }
}

fn make_entry<K, V, A>(ops: &A, key: K, value: V) -> Result<Entry<K, V>>
where
    A: Assign<(K, V)> + Destroy<(K, V)>,
{
    let (key, value) = ops.assign((key, value))?;
    Entry::new(key, value).map_err(|pair| {
        debug!("entry allocation failed");
        ops.destroy(pair);
        Error::AllocationFailed
    })
}

fn insert_into<K, V, C, A>(
    tree: &mut Tree<Entry<K, V>>,
    root: &mut Option<Handle>,
    len: &mut usize,
    compare: &C,
    key: K,
    value: V,
    ops: &A,
) -> Result<bool>
where
    C: Compare<K>,
    A: Assign<(K, V)> + Destroy<(K, V)>,
{
    let mut node = match *root {
        Some(node) => node,
        None => {
            *root = Some(tree.create(|| make_entry(ops, key, value))?);
            *len += 1;
            return Ok(true);
        },
    };

    loop {
        let direction = match Direction::of(compare.compare(&key, tree.payload(node).key())) {
            Some(direction) => direction,
            None => {
                let entry = tree.payload_mut(node);
                capability::reassign_with(ops, (key, value), |(key, value)| {
                    entry.replace(key, value)
                })?;
                return Ok(false);
            },
        };
        match tree.link(node, direction) {
            Some(child) => node = child,
            None => {
                let top = tree.insert(node, direction, || make_entry(ops, key, value))?;
                if tree.parent(top).is_none() {
                    *root = Some(top);
                }
                *len += 1;
                return Ok(true);
            },
        }
    }
}

fn detach<K, V, F>(
    tree: &mut Tree<Entry<K, V>>,
    root: &mut Option<Handle>,
    len: &mut usize,
    node: Handle,
    destroy: F,
) where
    F: FnOnce(Entry<K, V>),
{
    let top = tree.remove(node, destroy);
    if top.map_or(true, |top| tree.parent(top).is_none()) {
        *root = top;
    }
    *len -= 1;
}

impl<K, V, C, O> Drop for AvlMap<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V, C, O> IntoIterator for AvlMap<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    type Item = (K, V);
    type IntoIter = AvlMapIntoIter<K, V, C, O>;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter { map: self }
    }
}

impl<'a, K, V, C, O> IntoIterator for &'a AvlMap<K, V, C, O>
where
    K: 'a,
    V: 'a,
    O: Destroy<(K, V)>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = AvlMapIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `AvlMap<K, V>`.
///
/// This iterator traverses the elements of the map in-order and yields owned entries.
pub struct AvlMapIntoIter<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    map: AvlMap<K, V, C, O>,
}

impl<K, V, C, O> Iterator for AvlMapIntoIter<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V, C, O> DoubleEndedIterator for AvlMapIntoIter<K, V, C, O>
where
    O: Destroy<(K, V)>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.map.pop_last()
    }
}

impl<K, V, C, O> ExactSizeIterator for AvlMapIntoIter<K, V, C, O> where O: Destroy<(K, V)> {}

/// An iterator for `AvlMap<K, V>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable references.
pub struct AvlMapIter<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    tree: &'a Tree<Entry<K, V>>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, K, V> Iterator for AvlMapIter<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node = self.front?;
        self.front = tree.xcessor(node, Direction::Right);
        self.remaining -= 1;
        Some(tree.payload(node).pair())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for AvlMapIter<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node = self.back?;
        self.back = tree.xcessor(node, Direction::Left);
        self.remaining -= 1;
        Some(tree.payload(node).pair())
    }
}

impl<'a, K, V> ExactSizeIterator for AvlMapIter<'a, K, V>
where
    K: 'a,
    V: 'a,
{
}

/// An iterator over the keys of an `AvlMap<K, V>`.
pub struct AvlMapKeys<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    inner: AvlMapIter<'a, K, V>,
}

impl<'a, K, V> Iterator for AvlMapKeys<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for AvlMapKeys<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(key, _)| key)
    }
}

impl<'a, K, V> ExactSizeIterator for AvlMapKeys<'a, K, V>
where
    K: 'a,
    V: 'a,
{
}

/// An iterator over the values of an `AvlMap<K, V>`.
pub struct AvlMapValues<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    inner: AvlMapIter<'a, K, V>,
}

impl<'a, K, V> Iterator for AvlMapValues<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, K, V> DoubleEndedIterator for AvlMapValues<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, value)| value)
    }
}

impl<'a, K, V> ExactSizeIterator for AvlMapValues<'a, K, V>
where
    K: 'a,
    V: 'a,
{
}

impl<K, V> Default for AvlMap<K, V>
where
    K: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C, O> PartialEq for AvlMap<K, V, C, O>
where
    V: PartialEq,
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|((x_key, x_value), (y_key, y_value))| {
                self.compare.compare(x_key, y_key) == Ordering::Equal && x_value == y_value
            })
    }
}

impl<K, V, C, O> Eq for AvlMap<K, V, C, O>
where
    V: Eq,
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
}

impl<K, V, C, O> PartialOrd for AvlMap<K, V, C, O>
where
    V: Ord,
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<K, V, C, O> Ord for AvlMap<K, V, C, O>
where
    V: Ord,
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<K, V, C, O> fmt::Debug for AvlMap<K, V, C, O>
where
    K: fmt::Debug,
    V: fmt::Debug,
    O: Destroy<(K, V)>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, C, O> Index<&'a K> for AvlMap<K, V, C, O>
where
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    type Output = V;

    fn index(&self, key: &K) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<'a, K, V, C, O> IndexMut<&'a K> for AvlMap<K, V, C, O>
where
    C: Compare<K>,
    O: Destroy<(K, V)>,
{
    fn index_mut(&mut self, key: &K) -> &mut Self::Output {
        self.get_mut(key).expect("Error: key does not exist.")
    }
}

#[cfg(test)]
mod tests {
    use super::AvlMap;
    use crate::capability::{Assign, Destroy, KeyValue, NaturalOrder, Owned, Trivial};
    use crate::error::{Error, Result};
    use std::cell::Cell;
    use std::cmp::Ordering;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct CountingValues {
        destroyed: Rc<Cell<usize>>,
    }

    impl Assign<String> for CountingValues {
        fn assign(&self, source: String) -> Result<String> {
            if source.is_empty() {
                Err(Error::Rejected("empty"))
            } else {
                Ok(source)
            }
        }
    }

    impl Destroy<String> for CountingValues {
        fn destroy(&self, _target: String) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    type CountingMap = AvlMap<u32, String, NaturalOrder, KeyValue<Trivial, CountingValues>>;

    fn counting_map() -> (CountingMap, CountingValues) {
        let values = CountingValues::default();
        let map = AvlMap::with_capabilities(NaturalOrder, KeyValue::new(Trivial, values.clone()));
        (map, values)
    }

    #[test]
    fn test_len_empty() {
        let map: AvlMap<u32, u32> = AvlMap::new();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn test_is_empty() {
        let map: AvlMap<u32, u32> = AvlMap::new();
        assert!(map.is_empty());
    }

    #[test]
    fn test_min_max_empty() {
        let map: AvlMap<u32, u32> = AvlMap::new();
        assert_eq!(AvlMap::min(&map), None);
        assert_eq!(AvlMap::max(&map), None);
    }

    #[test]
    fn test_insert() {
        let mut map = AvlMap::new();
        assert_eq!(map.insert(1, 1), Ok(true));
        assert!(map.contains_key(&1));
        assert_eq!(map.get(&1), Some(&1));
    }

    #[test]
    fn test_insert_replace() {
        let mut map = AvlMap::new();
        assert_eq!(map.insert(1, 1), Ok(true));
        assert_eq!(map.insert(1, 3), Ok(false));
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_insert_replace_destroys_old_entry() {
        let (mut map, values) = counting_map();
        map.insert(1, String::from("a")).unwrap();
        assert_eq!(map.insert(1, String::from("b")), Ok(false));
        assert_eq!(values.destroyed.get(), 1);
        assert_eq!(map.get(&1).map(String::as_str), Some("b"));
    }

    #[test]
    fn test_failed_reassign_keeps_old_entry() {
        let (mut map, values) = counting_map();
        map.insert(1, String::from("a")).unwrap();
        assert_eq!(map.insert(1, String::new()), Err(Error::Rejected("empty")));
        assert_eq!(map.lookup(&1), Some((&1, &String::from("a"))));
        assert_eq!(values.destroyed.get(), 0);
        map.assert_invariants();
    }

    #[test]
    fn test_failed_assign_leaves_map_unchanged() {
        let (mut map, _) = counting_map();
        map.insert(1, String::from("a")).unwrap();
        assert_eq!(map.insert(2, String::new()), Err(Error::Rejected("empty")));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&2));
        map.assert_invariants();
    }

    #[test]
    fn test_node_limit() {
        let mut map = AvlMap::new().with_node_limit(2);
        map.insert(1, 1).unwrap();
        map.insert(2, 2).unwrap();
        assert_eq!(map.insert(3, 3), Err(Error::AllocationFailed));
        assert_eq!(map.insert(2, 4), Ok(false));
        assert_eq!(map.iter().collect::<Vec<(&u32, &u32)>>(), vec![(&1, &1), (&2, &4)]);
        map.assert_invariants();
    }

    #[test]
    fn test_remove() {
        let mut map = AvlMap::new();
        map.insert(1, 1).unwrap();
        assert!(map.remove(&1));
        assert!(!map.contains_key(&1));
        assert!(!map.remove(&1));
    }

    #[test]
    fn test_remove_destroys_once() {
        let (mut map, values) = counting_map();
        for key in 0..8 {
            map.insert(key, key.to_string()).unwrap();
        }
        assert!(map.remove(&3));
        assert!(!map.remove(&3));
        assert_eq!(values.destroyed.get(), 1);

        assert_eq!(map.take(&4), Some((4, String::from("4"))));
        assert!(map.remove_with(&5, &KeyValue::new(Trivial, Owned)));
        assert_eq!(values.destroyed.get(), 1);

        drop(map);
        assert_eq!(values.destroyed.get(), 6);
    }

    #[test]
    fn test_get_mut() {
        let mut map = AvlMap::new();
        map.insert(1, 1).unwrap();
        {
            let value = map.get_mut(&1);
            *value.unwrap() = 3;
        }
        assert_eq!(map.get(&1), Some(&3));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_index() {
        let mut map = AvlMap::new();
        map.insert(1, 1).unwrap();
        map[&1] += 1;
        assert_eq!(map[&1], 2);
    }

    #[test]
    #[should_panic]
    fn test_index_missing() {
        let map: AvlMap<u32, u32> = AvlMap::new();
        let _ = map[&1];
    }

    #[test]
    fn test_floor_ceil() {
        let mut map = AvlMap::new();
        map.insert(1, 1).unwrap();
        map.insert(3, 3).unwrap();
        map.insert(5, 5).unwrap();

        assert_eq!(map.floor(&0), None);
        assert_eq!(map.floor(&2), Some(&1));
        assert_eq!(map.floor(&5), Some(&5));
        assert_eq!(map.ceil(&2), Some(&3));
        assert_eq!(map.ceil(&6), None);
    }

    #[test]
    fn test_keys_values() {
        let mut map = AvlMap::new();
        for key in &[3, 1, 2] {
            map.insert(*key, -*key).unwrap();
        }
        assert_eq!(map.keys().collect::<Vec<&i32>>(), vec![&1, &2, &3]);
        assert_eq!(map.values().collect::<Vec<&i32>>(), vec![&-1, &-2, &-3]);
        assert_eq!(map.values().rev().next(), Some(&-3));
    }

    #[test]
    fn test_into_iter() {
        let mut map = AvlMap::new();
        map.insert(1, 2).unwrap();
        map.insert(5, 6).unwrap();
        map.insert(3, 4).unwrap();

        assert_eq!(
            map.into_iter().collect::<Vec<(u32, u32)>>(),
            vec![(1, 2), (3, 4), (5, 6)],
        );
    }

    #[test]
    fn test_pop() {
        let mut map = AvlMap::new();
        map.insert(1, 2).unwrap();
        map.insert(5, 6).unwrap();
        map.insert(3, 4).unwrap();

        assert_eq!(map.pop_last(), Some((5, 6)));
        assert_eq!(map.pop_first(), Some((1, 2)));
        assert_eq!(map.len(), 1);
        map.assert_invariants();
    }

    #[test]
    fn test_compare() {
        let mut x = AvlMap::new();
        let mut y = AvlMap::new();
        for key in 0..10 {
            x.insert(key, key).unwrap();
            y.insert(9 - key, 9 - key).unwrap();
        }
        assert_eq!(x.compare(&y), Ordering::Equal);
        assert_eq!(x, y);

        y.insert(4, 5).unwrap();
        assert_eq!(x.compare(&y), Ordering::Less);
        assert_eq!(x.compare_by(&y, |a, b| b.cmp(a)), Ordering::Greater);
        assert!(x != y);
    }

    #[test]
    fn test_debug() {
        let mut map = AvlMap::new();
        map.insert(2, "b").unwrap();
        map.insert(1, "a").unwrap();
        assert_eq!(format!("{:?}", map), "{1: \"a\", 2: \"b\"}");
    }
}
