//! Self-balancing binary search tree where the heights of the two child subtrees of any node
//! differ by at most one.
//!
//! Every node keeps a balance factor in `-1..=1` and a back-reference to its parent, so
//! insertion and removal rebalance bottom-up in a single walk without recursion or an explicit
//! path stack. `AvlSet` stores elements directly in the nodes while `AvlMap` stores a packed
//! key-value entry per node.

mod map;
mod node;
mod set;
mod tree;

pub use self::map::{AvlMap, AvlMapIntoIter, AvlMapIter, AvlMapKeys, AvlMapValues};
pub use self::set::{AvlSet, AvlSetIntoIter, AvlSetIter};
