use crate::arena::Handle;
use std::cmp::Ordering;

/// Which child of its parent a node is, or which way a rotation or walk goes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Left = -1,
    Right = 1,
}

impl Direction {
    /// Returns -1 for `Left` and +1 for `Right`.
    pub fn sign(self) -> i8 {
        self as i8
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Maps the result of comparing a probe against a node to the child the probe belongs in.
    /// Returns `None` for `Ordering::Equal`.
    pub fn of(ordering: Ordering) -> Option<Self> {
        match ordering {
            Ordering::Less => Some(Direction::Left),
            Ordering::Greater => Some(Direction::Right),
            Ordering::Equal => None,
        }
    }
}

/// A struct representing an internal node of an avl tree.
pub struct Node<P> {
    pub left: Option<Handle>,
    pub right: Option<Handle>,
    pub parent: Option<Handle>,
    pub direction: Direction,
    pub balance: i8,
    pub payload: P,
}

impl<P> Node<P> {
    pub fn new(payload: P) -> Self {
        Node {
            left: None,
            right: None,
            parent: None,
            direction: Direction::Left,
            balance: 0,
            payload,
        }
    }

    pub fn child(&self, direction: Direction) -> Option<Handle> {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn child_mut(&mut self, direction: Direction) -> &mut Option<Handle> {
        match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }
}
