use crate::arena::Handle;
use crate::avl_tree::node::Direction;
use crate::avl_tree::tree::Tree;
use crate::capability::{Assign, Compare, Destroy, NaturalOrder, Owned, Reassign};
use crate::error::Result;
use std::cmp::Ordering;
use std::fmt;

/// An ordered set implemented using an avl tree.
///
/// An avl tree is a self-balancing binary search tree that maintains the invariant that the
/// heights of two child subtrees of any node differ by at most one.
///
/// Elements are ordered by a [`Compare`] capability and built, overwritten and released through
/// an [`Assign`] + [`Reassign`] + [`Destroy`] capability. The defaults order by `Ord` and move
/// elements in and drop them on the way out.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlSet;
///
/// let mut set = AvlSet::new();
/// assert_eq!(set.insert(0), Ok(true));
/// assert_eq!(set.insert(3), Ok(true));
///
/// assert_eq!(set.len(), 2);
///
/// assert_eq!(AvlSet::min(&set), Some(&0));
/// assert_eq!(set.ceil(&2), Some(&3));
///
/// assert!(set.remove(&0));
/// assert!(!set.remove(&1));
/// ```
pub struct AvlSet<T, C = NaturalOrder, O = Owned>
where
    O: Destroy<T>,
{
    tree: Tree<T>,
    root: Option<Handle>,
    len: usize,
    compare: C,
    ops: O,
}

impl<T> AvlSet<T>
where
    T: Ord,
{
    /// Constructs a new, empty `AvlSet<T>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let set: AvlSet<u32> = AvlSet::new();
    /// ```
    pub fn new() -> Self {
        AvlSet::with_capabilities(NaturalOrder, Owned)
    }

    /// Constructs a new, empty `AvlSet<T>` with room for `capacity` elements before its node
    /// storage has to grow.
    pub fn with_capacity(capacity: usize) -> Self {
        AvlSet {
            tree: Tree::with_capacity(capacity),
            root: None,
            len: 0,
            compare: NaturalOrder,
            ops: Owned,
        }
    }
}

impl<T, C> AvlSet<T, C>
where
    C: Compare<T>,
{
    /// Constructs a new, empty set ordered by `compare`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::with_compare(|x: &i32, y: &i32| x.abs().cmp(&y.abs()));
    /// set.insert(-3).unwrap();
    /// set.insert(2).unwrap();
    /// assert_eq!(set.iter().collect::<Vec<&i32>>(), vec![&2, &-3]);
    /// ```
    pub fn with_compare(compare: C) -> Self {
        AvlSet::with_capabilities(compare, Owned)
    }
}

impl<T, C, O> AvlSet<T, C, O>
where
    O: Destroy<T>,
{
    /// Constructs a new, empty set with explicit ordering and lifecycle capabilities.
    pub fn with_capabilities(compare: C, ops: O) -> Self {
        AvlSet {
            tree: Tree::new(),
            root: None,
            len: 0,
            compare,
            ops,
        }
    }

    /// Caps the number of elements the set may hold. Inserting a new element beyond the limit
    /// fails with `Error::AllocationFailed`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    /// use avl_collections::Error;
    ///
    /// let mut set = AvlSet::new().with_node_limit(1);
    /// assert_eq!(set.insert(1), Ok(true));
    /// assert_eq!(set.insert(2), Err(Error::AllocationFailed));
    /// assert_eq!(set.insert(1), Ok(false));
    /// ```
    pub fn with_node_limit(mut self, limit: usize) -> Self {
        self.set_node_limit(Some(limit));
        self
    }

    /// Changes or lifts the node limit of the set. Elements already stored are kept even if
    /// there are more of them than the new limit allows.
    pub fn set_node_limit(&mut self, limit: Option<usize>) {
        self.tree.set_limit(limit);
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.tree.limit()
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the height of the underlying tree.
    pub fn height(&self) -> usize {
        self.tree.height(self.root)
    }

    /// Returns the minimum element of the set. Returns `None` if the set is empty.
    pub fn min(&self) -> Option<&T> {
        self.root
            .map(|root| self.tree.payload(self.tree.xmost(root, Direction::Left)))
    }

    /// Returns the maximum element of the set. Returns `None` if the set is empty.
    pub fn max(&self) -> Option<&T> {
        self.root
            .map(|root| self.tree.payload(self.tree.xmost(root, Direction::Right)))
    }

    /// Removes the minimum element and returns it without destroying it.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(2).unwrap();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.pop_first(), Some(1));
    /// assert_eq!(set.pop_last(), Some(2));
    /// assert_eq!(set.pop_first(), None);
    /// ```
    pub fn pop_first(&mut self) -> Option<T> {
        self.pop(Direction::Left)
    }

    /// Removes the maximum element and returns it without destroying it.
    pub fn pop_last(&mut self) -> Option<T> {
        self.pop(Direction::Right)
    }

    fn pop(&mut self, direction: Direction) -> Option<T> {
        let node = self.tree.xmost(self.root?, direction);
        let mut taken = None;
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |element| taken = Some(element));
        taken
    }

    /// Clears the set, destroying every element.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// set.insert(2).unwrap();
    /// set.clear();
    /// assert_eq!(set.is_empty(), true);
    /// ```
    pub fn clear(&mut self) {
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref ops,
            ..
        } = self;
        tree.clear(root.take(), |element| ops.destroy(element));
        *len = 0;
    }

    /// Returns an iterator over the set. The iterator will yield elements using in-order
    /// traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// set.insert(3).unwrap();
    ///
    /// let mut iterator = set.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> AvlSetIter<T> {
        AvlSetIter {
            tree: &self.tree,
            front: self.root.map(|root| self.tree.xmost(root, Direction::Left)),
            back: self.root.map(|root| self.tree.xmost(root, Direction::Right)),
            remaining: self.len,
        }
    }
}

impl<T, C, O> AvlSet<T, C, O>
where
    C: Compare<T>,
    O: Destroy<T>,
{
    fn find(&self, key: &T) -> Option<Handle> {
        let mut curr = self.root;
        while let Some(node) = curr {
            match Direction::of(self.compare.compare(key, self.tree.payload(node))) {
                None => return Some(node),
                Some(direction) => curr = self.tree.link(node, direction),
            }
        }
        None
    }

    // Returns the element equal to `key`, or else the closest element on the `side` of it.
    fn closest(&self, key: &T, side: Direction) -> Option<&T> {
        let mut curr = self.root;
        let mut best = None;
        while let Some(node) = curr {
            let element = self.tree.payload(node);
            match Direction::of(self.compare.compare(key, element)) {
                None => return Some(element),
                Some(direction) => {
                    if direction != side {
                        best = Some(element);
                    }
                    curr = self.tree.link(node, direction);
                },
            }
        }
        best
    }

    /// Inserts an element into the set. If an equal element already exists it is overwritten in
    /// place through the `Reassign` capability.
    ///
    /// Returns `Ok(true)` if the element was new and `Ok(false)` if it replaced an existing one.
    /// On error the set is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// assert_eq!(set.insert(1), Ok(true));
    /// assert!(set.contains(&1));
    /// assert_eq!(set.insert(1), Ok(false));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn insert(&mut self, element: T) -> Result<bool>
    where
        O: Assign<T> + Reassign<T>,
    {
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref compare,
            ref ops,
        } = self;
        insert_into(tree, root, len, compare, element, ops)
    }

    /// Inserts an element, building or overwriting it with `ops` instead of the capability the
    /// set was constructed with.
    pub fn insert_with<A>(&mut self, element: T, ops: &A) -> Result<bool>
    where
        A: Assign<T> + Reassign<T>,
    {
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref compare,
            ..
        } = self;
        insert_into(tree, root, len, compare, element, ops)
    }

    /// Removes an element from the set and destroys it. Returns `false` if no equal element
    /// exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// assert!(set.remove(&1));
    /// assert!(!set.remove(&1));
    /// ```
    pub fn remove(&mut self, key: &T) -> bool {
        let node = match self.find(key) {
            Some(node) => node,
            None => return false,
        };
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ref ops,
            ..
        } = self;
        detach(tree, root, len, node, |element| ops.destroy(element));
        true
    }

    /// Removes an element from the set, releasing it with `destroy` instead of the capability the
    /// set was constructed with.
    pub fn remove_with<D>(&mut self, key: &T, destroy: &D) -> bool
    where
        D: Destroy<T>,
    {
        let node = match self.find(key) {
            Some(node) => node,
            None => return false,
        };
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |element| destroy.destroy(element));
        true
    }

    /// Removes an element from the set and returns it instead of destroying it.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.take(&1), Some(1));
    /// assert_eq!(set.take(&1), None);
    /// ```
    pub fn take(&mut self, key: &T) -> Option<T> {
        let node = self.find(key)?;
        let mut taken = None;
        let AvlSet {
            ref mut tree,
            ref mut root,
            ref mut len,
            ..
        } = self;
        detach(tree, root, len, node, |element| taken = Some(element));
        taken
    }

    /// Checks if an element equal to `key` exists in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// assert!(!set.contains(&0));
    /// assert!(set.contains(&1));
    /// ```
    pub fn contains(&self, key: &T) -> bool {
        self.find(key).is_some()
    }

    /// Returns the stored element equal to `key`.
    pub fn get(&self, key: &T) -> Option<&T> {
        self.find(key).map(|node| self.tree.payload(node))
    }

    /// Returns the greatest element that is less than or equal to `key`. Returns `None` if such
    /// an element does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    ///
    /// let mut set = AvlSet::new();
    /// set.insert(1).unwrap();
    /// assert_eq!(set.floor(&0), None);
    /// assert_eq!(set.floor(&2), Some(&1));
    /// ```
    pub fn floor(&self, key: &T) -> Option<&T> {
        self.closest(key, Direction::Left)
    }

    /// Returns the least element that is greater than or equal to `key`. Returns `None` if such
    /// an element does not exist.
    pub fn ceil(&self, key: &T) -> Option<&T> {
        self.closest(key, Direction::Right)
    }

    /// Compares two sets lexicographically by their in-order elements. When one set is a prefix
    /// of the other, the shorter set is less.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlSet;
    /// use std::cmp::Ordering;
    ///
    /// let mut x = AvlSet::new();
    /// let mut y = AvlSet::new();
    /// for key in &[3, 1, 2] {
    ///     x.insert(*key).unwrap();
    /// }
    /// for key in &[1, 2] {
    ///     y.insert(*key).unwrap();
    /// }
    /// assert_eq!(x.compare(&y), Ordering::Greater);
    /// y.insert(3).unwrap();
    /// assert_eq!(x.compare(&y), Ordering::Equal);
    /// ```
    pub fn compare(&self, other: &Self) -> Ordering {
        let mut lhs = self.iter();
        let mut rhs = other.iter();
        loop {
            match (lhs.next(), rhs.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => match self.compare.compare(x, y) {
                    Ordering::Equal => continue,
                    ordering => return ordering,
                },
            }
        }
    }

    /// Panics if any structural invariant of the set is broken: a balance factor that does not
    /// match the subtree heights, a wrong parent or direction back-reference, elements out of
    /// order, or a count that does not match the reachable nodes.
    pub fn assert_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(self.tree.parent(root), None, "Error: root has a parent.");
        }
        self.tree.check(self.root);
        assert_eq!(self.tree.count(self.root), self.len);
        assert_eq!(self.tree.len(), self.len);

        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for curr in iter {
                assert_eq!(
                    self.compare.compare(prev, curr),
                    Ordering::Less,
                    "Error: elements are out of order.",
                );
                prev = curr;
            }
        }
    }
}

fn insert_into<T, C, A>(
    tree: &mut Tree<T>,
    root: &mut Option<Handle>,
    len: &mut usize,
    compare: &C,
    element: T,
    ops: &A,
) -> Result<bool>
where
    C: Compare<T>,
    A: Assign<T> + Reassign<T>,
{
    let mut node = match *root {
        Some(node) => node,
        None => {
            *root = Some(tree.create(|| ops.assign(element))?);
            *len += 1;
            return Ok(true);
        },
    };

    loop {
        let direction = match Direction::of(compare.compare(&element, tree.payload(node))) {
            Some(direction) => direction,
            None => {
                ops.reassign(tree.payload_mut(node), element)?;
                return Ok(false);
            },
        };
        match tree.link(node, direction) {
            Some(child) => node = child,
            None => {
                let top = tree.insert(node, direction, || ops.assign(element))?;
                if tree.parent(top).is_none() {
                    *root = Some(top);
                }
                *len += 1;
                return Ok(true);
            },
        }
    }
}

fn detach<T, F>(
    tree: &mut Tree<T>,
    root: &mut Option<Handle>,
    len: &mut usize,
    node: Handle,
    destroy: F,
) where
    F: FnOnce(T),
{
    let top = tree.remove(node, destroy);
    if top.map_or(true, |top| tree.parent(top).is_none()) {
        *root = top;
    }
    *len -= 1;
}

impl<T, C, O> Drop for AvlSet<T, C, O>
where
    O: Destroy<T>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C, O> IntoIterator for AvlSet<T, C, O>
where
    O: Destroy<T>,
{
    type Item = T;
    type IntoIter = AvlSetIntoIter<T, C, O>;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter { set: self }
    }
}

impl<'a, T, C, O> IntoIterator for &'a AvlSet<T, C, O>
where
    T: 'a,
    O: Destroy<T>,
{
    type Item = &'a T;
    type IntoIter = AvlSetIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `AvlSet<T>`.
///
/// This iterator traverses the elements of the set in-order and yields owned elements.
pub struct AvlSetIntoIter<T, C, O>
where
    O: Destroy<T>,
{
    set: AvlSet<T, C, O>,
}

impl<T, C, O> Iterator for AvlSetIntoIter<T, C, O>
where
    O: Destroy<T>,
{
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T, C, O> DoubleEndedIterator for AvlSetIntoIter<T, C, O>
where
    O: Destroy<T>,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.set.pop_last()
    }
}

impl<T, C, O> ExactSizeIterator for AvlSetIntoIter<T, C, O> where O: Destroy<T> {}

/// An iterator for `AvlSet<T>`.
///
/// This iterator traverses the elements of the set in-order and yields immutable references.
pub struct AvlSetIter<'a, T>
where
    T: 'a,
{
    tree: &'a Tree<T>,
    front: Option<Handle>,
    back: Option<Handle>,
    remaining: usize,
}

impl<'a, T> Iterator for AvlSetIter<'a, T>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node = self.front?;
        self.front = tree.xcessor(node, Direction::Right);
        self.remaining -= 1;
        Some(tree.payload(node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for AvlSetIter<'a, T>
where
    T: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node = self.back?;
        self.back = tree.xcessor(node, Direction::Left);
        self.remaining -= 1;
        Some(tree.payload(node))
    }
}

impl<'a, T> ExactSizeIterator for AvlSetIter<'a, T> where T: 'a {}

impl<T> Default for AvlSet<T>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C, O> PartialEq for AvlSet<T, C, O>
where
    C: Compare<T>,
    O: Destroy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.compare(other) == Ordering::Equal
    }
}

impl<T, C, O> Eq for AvlSet<T, C, O>
where
    C: Compare<T>,
    O: Destroy<T>,
{
}

impl<T, C, O> PartialOrd for AvlSet<T, C, O>
where
    C: Compare<T>,
    O: Destroy<T>,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<T, C, O> Ord for AvlSet<T, C, O>
where
    C: Compare<T>,
    O: Destroy<T>,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<T, C, O> fmt::Debug for AvlSet<T, C, O>
where
    T: fmt::Debug,
    O: Destroy<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
