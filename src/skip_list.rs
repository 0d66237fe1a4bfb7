use std::{
    fmt,
    ops::{Bound, RangeBounds},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering::*},
    },
};

use crossbeam::{
    epoch::{self, Atomic, Guard, Owned, Shared},
    utils::Backoff,
};
use lazyskip_node::prelude::{Node, link_nodes};
use parking_lot::MutexGuard;

use crate::{iterator::SkipListIter, options::Options};

/// Ordered set over a skip list with per-node locks.
///
/// Writers lock only the predecessors they relink, from level 0 upward.
/// Readers take no locks and trust a node only when it is fully linked
/// and not marked for deletion.
pub struct SkipList<T> {
    head: Atomic<Node<T>>,
    len: AtomicUsize,
    options: Arc<Options>,
}

impl<T> SkipList<T> {
    pub fn new() -> Self {
        Self::with_options(Arc::new(Options::default()))
    }

    pub fn with_options(options: Arc<Options>) -> Self {
        let max_height = options.max_height();

        // not shared with any thread yet
        let guard = unsafe { epoch::unprotected() };
        let tail = Owned::new(Node::right_sentinel(max_height)).into_shared(guard);
        let mut head = Owned::new(Node::left_sentinel(max_height));
        for level in 0..max_height {
            head.init_next(level, tail);
        }
        head.mark_fully_linked();
        unsafe { tail.deref() }.mark_fully_linked();

        tracing::debug!(p = options.p(), max_height, "skip list created");

        Self {
            head: Atomic::from(head),
            len: AtomicUsize::new(0),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.len.load(SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_height(&self) -> usize {
        self.options.max_height()
    }

    pub fn iter(&self) -> SkipListIter<'_, T> {
        SkipListIter::new(self)
    }

    pub(crate) fn head<'g>(&self, guard: &'g Guard) -> Shared<'g, Node<T>> {
        self.head.load(Acquire, guard)
    }

    /// First node at or after `curr` on level 0 that readers may see,
    /// `None` once the right sentinel is reached.
    pub(crate) fn first_visible<'g>(
        &self,
        mut curr: Shared<'g, Node<T>>,
        guard: &'g Guard,
    ) -> Option<&'g Node<T>> {
        loop {
            let node = unsafe { curr.deref() };
            if node.is_right_sentinel() {
                return None;
            }
            if !node.is_left_sentinel() && is_visible(node) {
                return Some(node);
            }
            curr = node.next(0, guard);
        }
    }
}

impl<T: Ord> SkipList<T> {
    /// Fills `preds`/`succs` for every level and returns the 1-based level
    /// on which a node equal to `key` was first seen.
    fn find<'g>(
        &self,
        key: &T,
        preds: &mut [Shared<'g, Node<T>>],
        succs: &mut [Shared<'g, Node<T>>],
        guard: &'g Guard,
    ) -> Option<usize> {
        let mut level_found = None;
        let mut pred = self.head(guard);

        for level in (0..self.max_height()).rev() {
            let mut curr = unsafe { pred.deref() }.next(level, guard);
            while unsafe { curr.deref() } < key {
                pred = curr;
                curr = unsafe { pred.deref() }.next(level, guard);
            }
            if level_found.is_none() && unsafe { curr.deref() } == key {
                level_found = Some(level + 1);
            }
            preds[level] = pred;
            succs[level] = curr;
        }

        level_found
    }

    /// Same descent as `find` without recording the path.
    fn search<'g>(&self, key: &T, guard: &'g Guard) -> Option<&'g Node<T>> {
        let mut pred = self.head(guard);
        for level in (0..self.max_height()).rev() {
            let mut curr = unsafe { pred.deref() }.next(level, guard);
            while unsafe { curr.deref() } < key {
                pred = curr;
                curr = unsafe { pred.deref() }.next(level, guard);
            }
            let node = unsafe { curr.deref() };
            if node == key {
                return Some(node);
            }
        }
        None
    }

    /// First node on level 0 whose key is not less than `key`.
    pub(crate) fn lower_bound<'g>(&self, key: &T, guard: &'g Guard) -> Shared<'g, Node<T>> {
        let mut pred = self.head(guard);
        for level in (0..self.max_height()).rev() {
            loop {
                let next = unsafe { pred.deref() }.next(level, guard);
                if unsafe { next.deref() } < key {
                    pred = next;
                } else {
                    break;
                }
            }
        }
        unsafe { pred.deref() }.next(0, guard)
    }

    pub fn contains(&self, value: &T) -> bool {
        let guard = &epoch::pin();
        self.search(value, guard).is_some_and(is_visible)
    }

    /// Returns `false` if an equal value is already present.
    pub fn insert(&self, value: T) -> bool
    where
        T: Send + 'static,
    {
        let height = self.options.sampler.sample(&mut rand::rng());
        self.insert_with_height(value, height)
    }

    /// Inserts every value, drawing all heights in one batch. Returns how
    /// many values were new.
    pub fn insert_batch<I>(&self, values: I) -> usize
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
    {
        let values: Vec<T> = values.into_iter().collect();
        let heights = self.options.sampler.sample_n(&mut rand::rng(), values.len());
        values
            .into_iter()
            .zip(heights)
            .map(|(value, height)| self.insert_with_height(value, height))
            .filter(|inserted| *inserted)
            .count()
    }

    fn insert_with_height(&self, value: T, height: usize) -> bool
    where
        T: Send + 'static,
    {
        let max_height = self.max_height();
        let height = height.clamp(1, max_height);
        let guard = &epoch::pin();
        let backoff = Backoff::new();

        let mut preds = vec![Shared::null(); max_height];
        let mut succs = vec![Shared::null(); max_height];

        loop {
            if let Some(level_found) = self.find(&value, &mut preds, &mut succs, guard) {
                let found = unsafe { succs[level_found - 1].deref() };
                if !found.is_marked_for_deletion() {
                    while !found.is_fully_linked() {
                        backoff.snooze();
                    }
                    return false;
                }
                // being removed, wait for the unlink
                backoff.snooze();
                continue;
            }

            let mut locks: Vec<MutexGuard<'_, ()>> = Vec::with_capacity(height);
            let mut prev_pred = Shared::null();
            let mut valid = true;
            for level in 0..height {
                let (pred, succ) = (preds[level], succs[level]);
                let pred_node = unsafe { pred.deref() };
                if pred != prev_pred {
                    locks.push(pred_node.lock());
                    prev_pred = pred;
                }
                valid = !pred_node.is_marked_for_deletion()
                    && !unsafe { succ.deref() }.is_marked_for_deletion()
                    && pred_node.next(level, guard) == succ;
                if !valid {
                    break;
                }
            }
            if !valid {
                tracing::trace!(height, "insert validation failed, retrying");
                continue;
            }

            let mut node = Owned::new(Node::new(value, height, max_height));
            for (level, succ) in succs.iter().enumerate().take(height) {
                node.init_next(level, *succ);
            }
            let node = node.into_shared(guard);
            for (level, pred) in preds.iter().enumerate().take(height) {
                link_nodes(unsafe { pred.deref() }, node, level);
            }
            unsafe { node.deref() }.mark_fully_linked();
            drop(locks);

            self.len.fetch_add(1, SeqCst);
            return true;
        }
    }

    /// Returns `false` if no visible node holds `value`.
    pub fn remove(&self, value: &T) -> bool
    where
        T: Send + 'static,
    {
        let max_height = self.max_height();
        let guard = &epoch::pin();

        let mut preds = vec![Shared::null(); max_height];
        let mut succs = vec![Shared::null(); max_height];

        let mut victim = Shared::null();
        // held from marking until the node is unlinked everywhere
        let mut victim_lock: Option<MutexGuard<'_, ()>> = None;

        loop {
            let level_found = self.find(value, &mut preds, &mut succs, guard);

            if victim_lock.is_none() {
                let Some(level_found) = level_found else {
                    return false;
                };
                let candidate = succs[level_found - 1];
                let node = unsafe { candidate.deref() };
                if !node.ok_to_delete(level_found) {
                    return false;
                }
                let lock = node.lock();
                if node.is_marked_for_deletion() {
                    return false;
                }
                node.mark_for_deletion();
                victim = candidate;
                victim_lock = Some(lock);
            }

            let node = unsafe { victim.deref() };
            let height = node.height();

            let mut locks: Vec<MutexGuard<'_, ()>> = Vec::with_capacity(height);
            let mut prev_pred = Shared::null();
            let mut valid = true;
            for (level, pred) in preds.iter().enumerate().take(height) {
                let pred_node = unsafe { pred.deref() };
                if *pred != prev_pred {
                    locks.push(pred_node.lock());
                    prev_pred = *pred;
                }
                valid = !pred_node.is_marked_for_deletion() && pred_node.next(level, guard) == victim;
                if !valid {
                    break;
                }
            }
            if !valid {
                tracing::trace!(height, "remove validation failed, retrying");
                continue;
            }

            for level in (0..height).rev() {
                link_nodes(unsafe { preds[level].deref() }, node.next(level, guard), level);
            }
            drop(locks);
            drop(victim_lock);

            self.len.fetch_sub(1, SeqCst);
            unsafe { guard.defer_destroy(victim) };
            return true;
        }
    }

    /// Visible values inside `range`, in ascending order.
    pub fn range<R>(&self, range: R) -> Vec<T>
    where
        R: RangeBounds<T>,
        T: Clone,
    {
        let guard = &epoch::pin();
        let start = match range.start_bound() {
            Bound::Included(key) | Bound::Excluded(key) => self.lower_bound(key, guard),
            Bound::Unbounded => unsafe { self.head(guard).deref() }.next(0, guard),
        };

        let mut values = Vec::new();
        let mut curr = self.first_visible(start, guard);
        while let Some(node) = curr {
            let Some(key) = node.key() else {
                break;
            };
            let past_end = match range.end_bound() {
                Bound::Included(end) => key > end,
                Bound::Excluded(end) => key >= end,
                Bound::Unbounded => false,
            };
            if past_end {
                break;
            }
            if range.contains(key) {
                values.push(key.clone());
            }
            curr = self.first_visible(node.next(0, guard), guard);
        }
        values
    }
}

impl<T> Default for SkipList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SkipList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipList")
            .field("len", &self.len())
            .field("options", &self.options)
            .finish()
    }
}

impl<T> Drop for SkipList<T> {
    fn drop(&mut self) {
        unsafe {
            let guard = epoch::unprotected();
            let mut curr = self.head.load(Relaxed, guard);
            while !curr.is_null() {
                // null past the right sentinel
                let next = curr.deref().next(0, guard);
                drop(curr.into_owned());
                curr = next;
            }
        }
    }
}

fn is_visible<T>(node: &Node<T>) -> bool {
    node.is_fully_linked() && !node.is_marked_for_deletion()
}
