//! Size class type.

use std::fmt;

use crate::common::config::SIZE_CLASSES;

/// One of the fixed node capacities served by the pool.
///
/// Stored as an index into [`SIZE_CLASSES`] so it can address the pool's
/// per-class free stacks directly: `free_lists[class.index()]`.
///
/// # Example
/// ```
/// use netbuf::SizeClass;
///
/// let class = SizeClass::fit(5000).unwrap();
/// assert_eq!(class.capacity(), 16 * 1024);
/// assert!(SizeClass::fit(8 * 1024 * 1024 + 1).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SizeClass(u8);

impl SizeClass {
    /// Number of size classes.
    pub const COUNT: usize = SIZE_CLASSES.len();

    /// The 4K class.
    pub const SMALLEST: SizeClass = SizeClass(0);

    /// The 8M class.
    pub const LARGEST: SizeClass = SizeClass((Self::COUNT - 1) as u8);

    /// Smallest class whose capacity is at least `requested` bytes.
    ///
    /// Returns `None` if `requested` exceeds the largest class.
    pub fn fit(requested: usize) -> Option<SizeClass> {
        SIZE_CLASSES
            .iter()
            .position(|&cap| requested <= cap)
            .map(|i| SizeClass(i as u8))
    }

    /// Exact lookup: the class whose capacity is `capacity`, if any.
    pub fn from_capacity(capacity: usize) -> Option<SizeClass> {
        SIZE_CLASSES
            .iter()
            .position(|&cap| cap == capacity)
            .map(|i| SizeClass(i as u8))
    }

    /// All classes, ascending.
    pub fn all() -> impl Iterator<Item = SizeClass> {
        (0..Self::COUNT).map(|i| SizeClass(i as u8))
    }

    /// Capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        SIZE_CLASSES[self.0 as usize]
    }

    /// Capacity in kilobytes, the unit of the pool's memory accounting.
    #[inline]
    pub fn kilobytes(&self) -> u64 {
        (self.capacity() / 1024) as u64
    }

    /// Position in the class table.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kb = self.kilobytes();
        if kb >= 1024 {
            write!(f, "{}M", kb / 1024)
        } else {
            write!(f, "{}K", kb)
        }
    }
}
