//! Ordered sets and maps backed by an AVL tree.
//!
//! The containers are generic over their element types and over the capabilities used to
//! compare, construct, overwrite and release those elements (see [`capability`]). Nodes live in
//! an index-addressed [`arena`], and map entries are packed with the [`layout`] calculator.
//!
//! # Examples
//!
//! ```
//! use avl_collections::avl_tree::{AvlMap, AvlSet};
//!
//! let mut set = AvlSet::new();
//! set.insert(2).unwrap();
//! set.insert(1).unwrap();
//! assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&1, &2]);
//!
//! let mut map = AvlMap::new();
//! map.insert("a", 1).unwrap();
//! assert_eq!(map.get(&"a"), Some(&1));
//! ```

mod entry;
pub mod arena;
pub mod avl_tree;
pub mod capability;
pub mod error;
pub mod layout;

pub use crate::error::{Error, Result};
