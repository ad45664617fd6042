//! Run-time layout arithmetic for packing several fields into one storage block.
//!
//! Fields are placed in the order they are added, each at the first offset that satisfies its
//! alignment. The same sequence of `add` calls always produces the same offsets, which is what
//! lets a map place its key and then its value reproducibly.

use std::alloc;
use std::cmp;
use std::mem;

/// The size and alignment of a block, or of one field inside a block.
///
/// # Examples
///
/// ```
/// use avl_collections::layout::Layout;
///
/// let mut layout = Layout::EMPTY;
/// assert_eq!(layout.add(Layout::of::<u8>()), 0);
/// assert_eq!(layout.add(Layout::of::<u32>()), 4);
/// assert_eq!(layout.size(), 8);
/// assert_eq!(layout.alignment(), 4);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    size: usize,
    alignment: usize,
}

impl Layout {
    /// A layout with no fields: size 0, alignment 1.
    pub const EMPTY: Layout = Layout {
        size: 0,
        alignment: 1,
    };

    /// Constructs a layout from a size and an alignment. An alignment of 0 is treated as 1.
    pub fn new(size: usize, alignment: usize) -> Self {
        Layout {
            size,
            alignment: cmp::max(alignment, 1),
        }
    }

    /// Returns the layout of `T`.
    pub fn of<T>() -> Self {
        Layout::new(mem::size_of::<T>(), mem::align_of::<T>())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Appends a field to this layout and returns the offset the field must be placed at.
    ///
    /// The offset is the smallest multiple of the field's alignment that is not less than the
    /// current size. Afterwards the size covers the field and the alignment is the larger of the
    /// two alignments.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::layout::Layout;
    ///
    /// let mut layout = Layout::of::<u16>();
    /// assert_eq!(layout.add(Layout::new(1, 0)), 2);
    /// assert_eq!(layout.add(Layout::of::<u64>()), 8);
    /// assert_eq!(layout, Layout::new(16, 8));
    /// ```
    pub fn add(&mut self, member: Layout) -> usize {
        let alignment = cmp::max(member.alignment, 1);
        let offset = round_up(self.size, alignment);
        self.size = offset + member.size;
        self.alignment = cmp::max(self.alignment, alignment);
        offset
    }

    /// Rounds the size up to a multiple of the alignment so that blocks can be laid out back to
    /// back.
    pub fn pad(&mut self) {
        self.size = round_up(self.size, self.alignment);
    }

    /// Converts into a standard allocation layout. Returns `None` if the alignment is not a
    /// power of two or the size overflows when rounded to the alignment.
    pub fn to_std(self) -> Option<alloc::Layout> {
        alloc::Layout::from_size_align(self.size, self.alignment).ok()
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::EMPTY
    }
}

fn round_up(size: usize, alignment: usize) -> usize {
    match size % alignment {
        0 => size,
        rem => size + (alignment - rem),
    }
}
