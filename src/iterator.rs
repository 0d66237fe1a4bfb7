use std::ptr;

use crossbeam::epoch::{self, Guard};
use lazyskip_node::prelude::Node;

use crate::SkipList;

/// Cursor over the visible values of a [`SkipList`], in ascending order.
///
/// The cursor keeps its thread pinned, so a node it points at stays
/// allocated even if another thread removes it meanwhile.
pub struct SkipListIter<'a, T> {
    list: &'a SkipList<T>,
    guard: Guard,
    cur: *const Node<T>,
}

impl<'a, T> SkipListIter<'a, T> {
    pub fn new(list: &'a SkipList<T>) -> Self {
        let mut iter = SkipListIter {
            list,
            guard: epoch::pin(),
            cur: ptr::null(),
        };
        iter.seek_to_first();
        iter
    }

    pub fn is_valid(&self) -> bool {
        !self.cur.is_null()
    }

    pub fn key(&self) -> Option<&T> {
        if self.is_valid() {
            unsafe { (*self.cur).key() }
        } else {
            None
        }
    }

    pub fn next(&mut self) {
        assert!(self.is_valid());
        let next = unsafe { (*self.cur).next(0, &self.guard) };
        self.cur = as_ptr(self.list.first_visible(next, &self.guard));
    }

    pub fn seek_to_first(&mut self) {
        let head = self.list.head(&self.guard);
        self.cur = as_ptr(self.list.first_visible(head, &self.guard));
    }
}

impl<T: Ord> SkipListIter<'_, T> {
    /// Moves to the first visible value not less than `key`.
    pub fn seek(&mut self, key: &T) {
        let start = self.list.lower_bound(key, &self.guard);
        self.cur = as_ptr(self.list.first_visible(start, &self.guard));
    }
}

fn as_ptr<T>(node: Option<&Node<T>>) -> *const Node<T> {
    node.map_or(ptr::null(), |n| n as *const _)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::SkipList;

    #[test]
    fn test_empty_iterator() {
        let list = SkipList::<u32>::new();
        let mut iter = list.iter();
        assert!(!iter.is_valid());
        assert_eq!(iter.key(), None);
        iter.seek(&10);
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_iterator() {
        const TEST_COUNT: u32 = 1_000;

        let list = SkipList::new();
        for i in (0..TEST_COUNT).rev() {
            list.insert(i);
        }

        let mut iter = list.iter();
        for i in 0..TEST_COUNT {
            assert_eq!(iter.key(), Some(&i));
            iter.next();
        }
        assert!(!iter.is_valid());

        iter.seek_to_first();
        assert_eq!(iter.key(), Some(&0));
    }

    #[test]
    fn test_iterator_seek() {
        let list = SkipList::new();
        list.insert_batch((0..100u32).map(|i| i * 10));

        let mut iter = list.iter();
        for i in 0..100 {
            iter.seek(&(i * 10));
            assert_eq!(iter.key(), Some(&(i * 10)));
        }

        iter.seek(&15);
        assert_eq!(iter.key(), Some(&20));
        iter.seek(&991);
        assert!(!iter.is_valid());
    }

    #[test]
    fn test_iterator_skips_removed() {
        let list = SkipList::new();
        list.insert_batch(0..10u32);
        for i in [0, 3, 4, 9] {
            list.remove(&i);
        }

        let mut iter = list.iter();
        let mut keys = Vec::new();
        while let Some(key) = iter.key() {
            keys.push(*key);
            iter.next();
        }
        assert_eq!(keys, vec![1, 2, 5, 6, 7, 8]);

        iter.seek(&3);
        assert_eq!(iter.key(), Some(&5));
        assert_eq!(keys.iter().tuple_windows().filter(|(a, b)| a >= b).count(), 0);
    }

    #[test]
    fn test_iterator_survives_removal() {
        let list = SkipList::new();
        list.insert_batch(0..10u32);

        let mut iter = list.iter();
        iter.seek(&5);
        assert!(list.remove(&5));
        // still pinned, the removed node stays readable
        assert_eq!(iter.key(), Some(&5));
        iter.next();
        assert_eq!(iter.key(), Some(&6));
    }
}
