//! Append-only list of fixed-capacity blocks addressed by stable index.

/// An append-only sequence of blocks.
///
/// Blocks are addressed by their position in the sequence, which never changes
/// once assigned: the arena only grows at the end and never removes or reorders
/// individual blocks. Holders keep a block index rather than a reference, so the
/// arena is free to grow while a cursor points at an earlier block.
///
/// Both the bit stream (blocks of a bit chain) and the packed word array
/// (segments) allocate through this type.
#[derive(Debug, Clone)]
pub struct BlockArena<T> {
    blocks: Vec<T>,
}

impl<T> BlockArena<T> {
    pub fn new() -> Self {
        BlockArena { blocks: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BlockArena {
            blocks: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Appends the next block, produced by `make` from its future index, and
    /// returns that index.
    pub fn push_with(&mut self, make: impl FnOnce(usize) -> T) -> usize {
        let index = self.blocks.len();
        self.blocks.push(make(index));
        index
    }

    /// Appends blocks until the arena holds at least `len` of them.
    ///
    /// Returns the number of blocks added.
    pub fn grow_to(&mut self, len: usize, mut make: impl FnMut(usize) -> T) -> usize {
        let added = len.saturating_sub(self.blocks.len());
        if added > 0 {
            log::trace!("block arena: growing {} -> {len}", self.blocks.len());
            self.blocks.reserve(added);
            while self.blocks.len() < len {
                let index = self.blocks.len();
                self.blocks.push(make(index));
            }
        }
        added
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.blocks.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.blocks.get_mut(index)
    }

    #[inline]
    pub fn last(&self) -> Option<&T> {
        self.blocks.last()
    }

    #[inline]
    pub fn last_mut(&mut self) -> Option<&mut T> {
        self.blocks.last_mut()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.blocks.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.blocks
    }

    /// Drops every block.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}

impl<T> Default for BlockArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::ops::Index<usize> for BlockArena<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: usize) -> &T {
        &self.blocks[index]
    }
}

impl<T> std::ops::IndexMut<usize> for BlockArena<T> {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.blocks[index]
    }
}

impl<'a, T> IntoIterator for &'a BlockArena<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Allocates a zero-filled word buffer of `count` words.
pub fn zeroed_words(count: usize) -> Box<[u64]> {
    vec![0u64; count].into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::{BlockArena, zeroed_words};

    #[test]
    fn test_push_with_assigns_sequential_indices() {
        let mut arena = BlockArena::new();
        assert!(arena.is_empty());
        let a = arena.push_with(|i| (i, zeroed_words(2)));
        let b = arena.push_with(|i| (i, zeroed_words(2)));
        assert_eq!((a, b), (0, 1));
        assert_eq!(arena[1].0, 1);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.last().unwrap().1.len(), 2);
    }

    #[test]
    fn test_grow_to() {
        let mut arena = BlockArena::new();
        assert_eq!(arena.grow_to(5, |i| i * 10), 5);
        assert_eq!(arena.grow_to(3, |i| i * 10), 0);
        assert_eq!(arena.grow_to(6, |i| i * 10), 1);
        assert_eq!(arena.iter().copied().collect::<Vec<_>>(), vec![0, 10, 20, 30, 40, 50]);

        arena[2] = 7;
        assert_eq!(arena.get(2), Some(&7));
        assert_eq!(arena.get(6), None);
        arena.clear();
        assert!(arena.is_empty());
    }
}
