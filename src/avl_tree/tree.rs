use crate::arena::{Arena, Handle};
use crate::avl_tree::node::{Direction, Node};
use crate::error::Result;
use std::cmp;
use tracing::{debug, trace};

/// The node storage of an avl tree together with the operations that restructure it.
///
/// The tree does not know its own root: callers descend from the root they keep, hand the
/// engine the node and side to work on, and take back the top of the subtree the engine
/// touched. When that node has no parent it is the new root.
pub struct Tree<P> {
    nodes: Arena<Node<P>>,
}

impl<P> Tree<P> {
    pub fn new() -> Self {
        Tree {
            nodes: Arena::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Tree {
            nodes: Arena::with_capacity(capacity),
        }
    }

    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.nodes.set_limit(limit);
    }

    pub fn limit(&self) -> Option<usize> {
        self.nodes.limit()
    }

    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, node: Handle, direction: Direction) -> Option<Handle> {
        self.nodes[node].child(direction)
    }

    pub fn parent(&self, node: Handle) -> Option<Handle> {
        self.nodes[node].parent
    }

    #[cfg(test)]
    pub fn balance(&self, node: Handle) -> i8 {
        self.nodes[node].balance
    }

    pub fn payload(&self, node: Handle) -> &P {
        &self.nodes[node].payload
    }

    pub fn payload_mut(&mut self, node: Handle) -> &mut P {
        &mut self.nodes[node].payload
    }

    /// Creates a detached node. Storage is reserved before `make` runs, so a failure of either
    /// leaves the tree as it was.
    pub fn create<F>(&mut self, make: F) -> Result<Handle>
    where
        F: FnOnce() -> Result<P>,
    {
        if let Err(error) = self.nodes.reserve() {
            debug!(len = self.nodes.len(), "node allocation failed");
            return Err(error);
        }
        let payload = match make() {
            Ok(payload) => payload,
            Err(error) => {
                debug!(%error, "payload construction failed");
                return Err(error);
            },
        };
        self.nodes.allocate(Node::new(payload))
    }

    /// Returns the leftmost (`Left`) or rightmost (`Right`) node of the subtree rooted at
    /// `node`.
    pub fn xmost(&self, mut node: Handle, direction: Direction) -> Handle {
        while let Some(child) = self.link(node, direction) {
            node = child;
        }
        node
    }

    /// Returns the in-order successor (`Right`) or predecessor (`Left`) of `node`.
    pub fn xcessor(&self, node: Handle, direction: Direction) -> Option<Handle> {
        if let Some(child) = self.link(node, direction) {
            return Some(self.xmost(child, direction.opposite()));
        }

        let mut curr = node;
        loop {
            let parent = self.parent(curr)?;
            if self.nodes[curr].direction != direction {
                return Some(parent);
            }
            curr = parent;
        }
    }

    /// Counts the nodes of the subtree rooted at `root`.
    pub fn count(&self, root: Option<Handle>) -> usize {
        match root {
            None => 0,
            Some(node) => {
                let node = &self.nodes[node];
                self.count(node.left) + self.count(node.right) + 1
            },
        }
    }

    /// Computes the height of the subtree rooted at `root`.
    pub fn height(&self, root: Option<Handle>) -> usize {
        match root {
            None => 0,
            Some(node) => {
                let node = &self.nodes[node];
                cmp::max(self.height(node.left), self.height(node.right)) + 1
            },
        }
    }

    //     X              Y
    //    / \            / \
    //   a   Y    =>    X   c      (direction = Left)
    //      / \        / \
    //     b   c      a   b
    //
    // `x` moves down towards `direction`. Both balances are derived from their old values,
    // never from subtree heights.
    fn rotate(&mut self, x: Handle, direction: Direction) -> Handle {
        let opposite = direction.opposite();
        let y = match self.link(x, opposite) {
            Some(y) => y,
            None => unreachable!(),
        };
        let sign = direction.sign();
        let b = self.link(y, direction);
        let x_parent = self.nodes[x].parent;
        let x_direction = self.nodes[x].direction;
        let y_balance = self.nodes[y].balance;

        if let Some(b) = b {
            let b_node = &mut self.nodes[b];
            b_node.parent = Some(x);
            b_node.direction = opposite;
        }

        let x_balance = self.nodes[x].balance + sign * (cmp::max(0, -sign * y_balance) + 1);
        {
            let x_node = &mut self.nodes[x];
            *x_node.child_mut(opposite) = b;
            x_node.parent = Some(y);
            x_node.direction = direction;
            x_node.balance = x_balance;
        }
        {
            let y_node = &mut self.nodes[y];
            *y_node.child_mut(direction) = Some(x);
            y_node.parent = x_parent;
            y_node.direction = x_direction;
            y_node.balance = y_balance + sign * (cmp::max(sign * x_balance, 0) + 1);
        }

        trace!(pivot = x.index(), top = y.index(), ?direction, "rotated subtree");
        y
    }

    // Restores the balance of `node` if it has drifted to -2 or +2 and re-links the new top of
    // the subtree into the parent.
    fn rebalance(&mut self, node: Handle) -> Handle {
        let balance = self.nodes[node].balance;
        if balance >= -1 && balance <= 1 {
            return node;
        }

        let heavy = if balance < 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        let child = match self.link(node, heavy) {
            Some(child) => child,
            None => unreachable!(),
        };
        if self.nodes[child].balance * heavy.sign() < 0 {
            let top = self.rotate(child, heavy);
            *self.nodes[node].child_mut(heavy) = Some(top);
        }

        let top = self.rotate(node, heavy.opposite());
        if let Some(parent) = self.nodes[top].parent {
            let direction = self.nodes[top].direction;
            *self.nodes[parent].child_mut(direction) = Some(top);
        }
        top
    }

    fn update_after_insertion(&mut self, mut node: Handle) -> Handle {
        while let Some(parent) = self.nodes[node].parent {
            let direction = self.nodes[node].direction;
            self.nodes[parent].balance += direction.sign();
            node = self.rebalance(parent);
            if self.nodes[node].balance == 0 {
                break;
            }
        }
        node
    }

    // Walks up from `node` while subtree heights keep shrinking. Returns `top` unless the walk
    // reached or passed through it, in which case the last node visited is returned.
    fn update_after_removal(&mut self, mut node: Handle, top: Handle) -> Handle {
        let mut top_found = false;
        loop {
            top_found |= node == top;
            node = self.rebalance(node);
            if self.nodes[node].balance != 0 {
                break;
            }
            match self.nodes[node].parent {
                Some(parent) => {
                    let direction = self.nodes[node].direction;
                    self.nodes[parent].balance -= direction.sign();
                    node = parent;
                },
                None => break,
            }
        }

        if top_found {
            node
        } else {
            top
        }
    }

    /// Attaches a new leaf as the `direction` child of `node`, which must not have one yet, and
    /// rebalances upwards. Returns the top of the affected subtree.
    ///
    /// On failure the tree is unchanged.
    pub fn insert<F>(&mut self, node: Handle, direction: Direction, make: F) -> Result<Handle>
    where
        F: FnOnce() -> Result<P>,
    {
        debug_assert!(
            self.link(node, direction).is_none(),
            "Error: inserting into an occupied slot."
        );

        let leaf = self.create(make)?;
        {
            let leaf_node = &mut self.nodes[leaf];
            leaf_node.parent = Some(node);
            leaf_node.direction = direction;
        }
        *self.nodes[node].child_mut(direction) = Some(leaf);
        Ok(self.update_after_insertion(leaf))
    }

    /// Detaches `node`, hands its payload to `destroy` and rebalances upwards. Returns the top
    /// of the affected subtree, or `None` if the tree is now empty.
    pub fn remove<F>(&mut self, node: Handle, destroy: F) -> Option<Handle>
    where
        F: FnOnce(P),
    {
        let (left, right, parent, direction, balance) = {
            let node = &self.nodes[node];
            (node.left, node.right, node.parent, node.direction, node.balance)
        };

        match (left, right) {
            //   N                N
            //    \    =>  a     /    =>  a
            //     a            a
            (None, child) | (child, None) => {
                trace!(node = node.index(), "removing node with at most one child");
                self.release(node, destroy);

                if let Some(child) = child {
                    let child_node = &mut self.nodes[child];
                    child_node.parent = parent;
                    child_node.direction = direction;
                }

                match parent {
                    Some(parent) => {
                        *self.nodes[parent].child_mut(direction) = child;
                        self.nodes[parent].balance -= direction.sign();
                        Some(self.update_after_removal(parent, parent))
                    },
                    None => child,
                }
            },
            (Some(left), Some(right)) => match self.link(right, Direction::Left) {
                //   N
                //  / \           X
                // a   X    =>   / \
                //      \       a   b
                //       b
                None => {
                    trace!(node = node.index(), "promoting right child of removed node");
                    self.release(node, destroy);

                    self.nodes[left].parent = Some(right);
                    {
                        let right_node = &mut self.nodes[right];
                        right_node.left = Some(left);
                        right_node.parent = parent;
                        right_node.direction = direction;
                        right_node.balance = balance - 1;
                    }
                    if let Some(parent) = parent {
                        *self.nodes[parent].child_mut(direction) = Some(right);
                    }
                    Some(self.update_after_removal(right, right))
                },
                //   N            X
                //  / \          / \
                // a   Z        a   Z
                //    / \  =>      / \
                //   Y   d        Y   d
                //  / \          / \
                // X   c        b   c
                //  \
                //   b
                Some(right_left) => {
                    let successor = self.xmost(right_left, Direction::Left);
                    let successor_right = self.nodes[successor].right;
                    let successor_parent = match self.nodes[successor].parent {
                        Some(parent) => parent,
                        None => unreachable!(),
                    };
                    trace!(
                        node = node.index(),
                        successor = successor.index(),
                        "replacing removed node with its successor"
                    );
                    self.release(node, destroy);

                    if let Some(successor_right) = successor_right {
                        let successor_right_node = &mut self.nodes[successor_right];
                        successor_right_node.parent = Some(successor_parent);
                        successor_right_node.direction = Direction::Left;
                    }
                    {
                        let successor_parent_node = &mut self.nodes[successor_parent];
                        successor_parent_node.left = successor_right;
                        successor_parent_node.balance += 1;
                    }

                    self.nodes[left].parent = Some(successor);
                    self.nodes[right].parent = Some(successor);
                    {
                        let successor_node = &mut self.nodes[successor];
                        successor_node.left = Some(left);
                        successor_node.right = Some(right);
                        successor_node.parent = parent;
                        successor_node.direction = direction;
                        successor_node.balance = balance;
                    }
                    if let Some(parent) = parent {
                        *self.nodes[parent].child_mut(direction) = Some(successor);
                    }
                    Some(self.update_after_removal(successor_parent, successor))
                },
            },
        }
    }

    fn release<F>(&mut self, node: Handle, destroy: F)
    where
        F: FnOnce(P),
    {
        let Node { payload, .. } = self.nodes.free(node);
        destroy(payload);
    }

    /// Frees every node of the tree whose root is `root`, depth-first, handing each payload to
    /// `destroy`.
    pub fn clear<F>(&mut self, root: Option<Handle>, mut destroy: F)
    where
        F: FnMut(P),
    {
        debug_assert!(root.map_or(true, |root| self.parent(root).is_none()));

        let mut stack: Vec<Handle> = root.into_iter().collect();
        while let Some(node) = stack.pop() {
            let Node {
                left,
                right,
                payload,
                ..
            } = self.nodes.free(node);
            stack.extend(right);
            stack.extend(left);
            destroy(payload);
        }

        if self.nodes.is_empty() {
            self.nodes.clear();
        }
    }

    /// Recomputes subtree heights from `root` down and panics if a balance factor or a
    /// parent/direction back-reference is wrong. Returns the height of the subtree.
    pub fn check(&self, root: Option<Handle>) -> usize {
        let handle = match root {
            None => return 0,
            Some(handle) => handle,
        };
        let node = &self.nodes[handle];
        let left_height = self.check(node.left);
        let right_height = self.check(node.right);

        assert_eq!(
            right_height as isize - left_height as isize,
            node.balance as isize,
            "Error: balance of node {} does not match its subtree heights.",
            handle.index(),
        );
        assert!(
            node.balance >= -1 && node.balance <= 1,
            "Error: node {} is out of balance.",
            handle.index(),
        );
        if let Some(left) = node.left {
            assert_eq!(self.nodes[left].parent, Some(handle));
            assert_eq!(self.nodes[left].direction, Direction::Left);
        }
        if let Some(right) = node.right {
            assert_eq!(self.nodes[right].parent, Some(handle));
            assert_eq!(self.nodes[right].direction, Direction::Right);
        }

        cmp::max(left_height, right_height) + 1
    }
}

impl<P> Default for Tree<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Tree;
    use crate::arena::Handle;
    use crate::avl_tree::node::Direction;
    use crate::error::Error;
    use std::cell::RefCell;

    // Minimal keyed insert/find on top of the engine.
    fn insert(tree: &mut Tree<u32>, root: &mut Option<Handle>, key: u32) {
        let mut node = match *root {
            None => {
                *root = Some(tree.create(|| Ok(key)).unwrap());
                return;
            },
            Some(node) => node,
        };
        loop {
            let direction = if key < *tree.payload(node) {
                Direction::Left
            } else {
                Direction::Right
            };
            match tree.link(node, direction) {
                Some(child) => node = child,
                None => {
                    let top = tree.insert(node, direction, || Ok(key)).unwrap();
                    if tree.parent(top).is_none() {
                        *root = Some(top);
                    }
                    return;
                },
            }
        }
    }

    fn find(tree: &Tree<u32>, root: Option<Handle>, key: u32) -> Option<Handle> {
        let mut curr = root;
        while let Some(node) = curr {
            let value = *tree.payload(node);
            if key == value {
                return Some(node);
            }
            curr = tree.link(
                node,
                if key < value {
                    Direction::Left
                } else {
                    Direction::Right
                },
            );
        }
        None
    }

    fn remove(tree: &mut Tree<u32>, root: &mut Option<Handle>, key: u32) -> Option<u32> {
        let node = find(tree, *root, key)?;
        let mut removed = None;
        let top = tree.remove(node, |payload| removed = Some(payload));
        if top.map_or(true, |top| tree.parent(top).is_none()) {
            *root = top;
        }
        removed
    }

    fn in_order(tree: &Tree<u32>, root: Option<Handle>) -> Vec<u32> {
        let mut ret = Vec::new();
        let mut curr = root.map(|root| tree.xmost(root, Direction::Left));
        while let Some(node) = curr {
            ret.push(*tree.payload(node));
            curr = tree.xcessor(node, Direction::Right);
        }
        ret
    }

    fn build(keys: &[u32]) -> (Tree<u32>, Option<Handle>) {
        let mut tree = Tree::new();
        let mut root = None;
        for &key in keys {
            insert(&mut tree, &mut root, key);
            tree.check(root);
        }
        (tree, root)
    }

    #[test]
    fn test_single_rotation() {
        let (tree, root) = build(&[1, 2, 3]);
        let root = root.unwrap();
        assert_eq!(*tree.payload(root), 2);
        assert_eq!(tree.balance(root), 0);
        assert_eq!(tree.height(Some(root)), 2);
    }

    #[test]
    fn test_double_rotation() {
        let (tree, root) = build(&[3, 1, 2]);
        let root = root.unwrap();
        assert_eq!(*tree.payload(root), 2);
        assert_eq!(*tree.payload(tree.link(root, Direction::Left).unwrap()), 1);
        assert_eq!(*tree.payload(tree.link(root, Direction::Right).unwrap()), 3);

        let (tree, root) = build(&[1, 3, 2]);
        assert_eq!(*tree.payload(root.unwrap()), 2);
    }

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let keys: Vec<u32> = (0..1024).collect();
        let (tree, root) = build(&keys);
        assert_eq!(tree.count(root), 1024);
        assert_eq!(tree.height(root), 11);
        assert_eq!(in_order(&tree, root), keys);
    }

    #[test]
    fn test_xcessor() {
        let (tree, root) = build(&[4, 2, 6, 1, 3, 5, 7]);
        let three = find(&tree, root, 3).unwrap();
        let four = find(&tree, root, 4).unwrap();
        let seven = find(&tree, root, 7).unwrap();
        let one = find(&tree, root, 1).unwrap();

        assert_eq!(tree.xcessor(three, Direction::Right), Some(four));
        assert_eq!(tree.xcessor(four, Direction::Left), Some(three));
        assert_eq!(tree.xcessor(seven, Direction::Right), None);
        assert_eq!(tree.xcessor(one, Direction::Left), None);
        assert_eq!(tree.xmost(root.unwrap(), Direction::Right), seven);
    }

    #[test]
    fn test_remove_leaf() {
        let (mut tree, mut root) = build(&[2, 1, 3]);
        assert_eq!(remove(&mut tree, &mut root, 1), Some(1));
        tree.check(root);
        assert_eq!(in_order(&tree, root), vec![2, 3]);
        assert_eq!(tree.balance(root.unwrap()), 1);
    }

    #[test]
    fn test_remove_without_left_child() {
        let (mut tree, mut root) = build(&[2, 1, 4, 3, 5, 6]);
        assert_eq!(remove(&mut tree, &mut root, 5), Some(5));
        tree.check(root);
        assert_eq!(in_order(&tree, root), vec![1, 2, 3, 4, 6]);
    }

    #[test]
    fn test_remove_without_right_child() {
        let (mut tree, mut root) = build(&[5, 3, 6, 2, 4, 1]);
        assert_eq!(remove(&mut tree, &mut root, 2), Some(2));
        tree.check(root);
        assert_eq!(in_order(&tree, root), vec![1, 3, 4, 5, 6]);
    }

    #[test]
    fn test_remove_promotes_right_child() {
        let (mut tree, mut root) = build(&[2, 1, 3, 4]);
        assert_eq!(remove(&mut tree, &mut root, 2), Some(2));
        tree.check(root);
        assert_eq!(*tree.payload(root.unwrap()), 3);
        assert_eq!(in_order(&tree, root), vec![1, 3, 4]);
    }

    #[test]
    fn test_remove_through_successor() {
        let (mut tree, mut root) = build(&[4, 2, 7, 1, 3, 6, 8, 5]);
        assert_eq!(remove(&mut tree, &mut root, 4), Some(4));
        tree.check(root);
        assert_eq!(*tree.payload(root.unwrap()), 5);
        assert_eq!(in_order(&tree, root), vec![1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_remove_root_until_empty() {
        let (mut tree, mut root) = build(&[1, 2, 3, 4, 5, 6, 7]);
        while let Some(top) = root {
            let key = *tree.payload(top);
            assert_eq!(remove(&mut tree, &mut root, key), Some(key));
            tree.check(root);
        }
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_create_failure_leaves_tree_unchanged() {
        let (mut tree, root) = build(&[1, 2]);
        tree.set_limit(Some(2));
        let node = find(&tree, root, 2).unwrap();
        assert_eq!(
            tree.insert(node, Direction::Right, || Ok(3)),
            Err(Error::AllocationFailed),
        );
        assert_eq!(
            tree.create(|| Err(Error::Rejected("test"))),
            Err(Error::AllocationFailed),
        );
        tree.set_limit(None);
        assert_eq!(
            tree.insert(node, Direction::Right, || Err(Error::Rejected("test"))),
            Err(Error::Rejected("test")),
        );
        tree.check(root);
        assert_eq!(in_order(&tree, root), vec![1, 2]);
    }

    #[test]
    fn test_clear() {
        let (mut tree, root) = build(&[3, 1, 4, 5, 9, 2, 6]);
        let destroyed = RefCell::new(Vec::new());
        tree.clear(root, |payload| destroyed.borrow_mut().push(payload));
        let mut destroyed = destroyed.into_inner();
        destroyed.sort();
        assert_eq!(destroyed, vec![1, 2, 3, 4, 5, 6, 9]);
        assert_eq!(tree.len(), 0);
    }
}
