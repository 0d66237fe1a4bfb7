//! Skip list node for the optimistic, per-node locking algorithm.
//!
//! A node is linked bottom-up and becomes visible to readers once
//! `fully_linked` is set. Removal sets `marked_for_deletion` first, then
//! unlinks the node top-down. Both flags only ever go from `false` to `true`.
//!
//! `lock` guards writes to `links` and to both flags. Readers never take it.

use std::{
    cmp::Ordering,
    fmt, ptr,
    sync::atomic::{AtomicBool, Ordering::*},
};

use crossbeam::epoch::{Atomic, Guard, Shared};
use parking_lot::{Mutex, MutexGuard};
use rand::Rng;

use crate::{height::HeightSampler, key::KeyRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    LeftSentinel,
    Ordinary,
    RightSentinel,
}

enum Payload<T> {
    LeftSentinel,
    Value(T),
    RightSentinel,
}

pub struct Node<T> {
    payload: Payload<T>,
    links: Box<[Atomic<Self>]>,
    fully_linked: AtomicBool,
    marked_for_deletion: AtomicBool,
    lock: Mutex<()>,
}

impl<T> Node<T> {
    fn with_payload(payload: Payload<T>, height: usize) -> Self {
        let links = (0..height).map(|_| Atomic::null()).collect();
        Self {
            payload,
            links,
            fully_linked: AtomicBool::new(false),
            marked_for_deletion: AtomicBool::new(false),
            lock: Mutex::new(()),
        }
    }

    /// Creates an unlinked node with `height` levels, clamped to `[1, max_height]`.
    pub fn new(value: T, height: usize, max_height: usize) -> Self {
        let height = height.min(max_height).max(1);
        Self::with_payload(Payload::Value(value), height)
    }

    pub fn with_sampled_height<R: Rng>(value: T, sampler: &HeightSampler, rng: &mut R) -> Self {
        Self::new(value, sampler.sample(rng), sampler.max_height())
    }

    pub fn left_sentinel(max_height: usize) -> Self {
        Self::with_payload(Payload::LeftSentinel, max_height.max(1))
    }

    pub fn right_sentinel(max_height: usize) -> Self {
        Self::with_payload(Payload::RightSentinel, max_height.max(1))
    }

    pub fn height(&self) -> usize {
        self.links.len()
    }

    /// The stored value, `None` for sentinels.
    pub fn key(&self) -> Option<&T> {
        match &self.payload {
            Payload::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn key_ref(&self) -> KeyRef<'_, T> {
        match &self.payload {
            Payload::LeftSentinel => KeyRef::Left,
            Payload::Value(v) => KeyRef::Value(v),
            Payload::RightSentinel => KeyRef::Right,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::LeftSentinel => NodeKind::LeftSentinel,
            Payload::Value(_) => NodeKind::Ordinary,
            Payload::RightSentinel => NodeKind::RightSentinel,
        }
    }

    pub fn is_left_sentinel(&self) -> bool {
        self.kind() == NodeKind::LeftSentinel
    }

    pub fn is_right_sentinel(&self) -> bool {
        self.kind() == NodeKind::RightSentinel
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind() != NodeKind::Ordinary
    }

    pub fn is_fully_linked(&self) -> bool {
        self.fully_linked.load(Acquire)
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion.load(Acquire)
    }

    /// Publishes the node to readers. Call once every level is linked,
    /// while the predecessor locks from the insertion are still held.
    pub fn mark_fully_linked(&self) {
        self.fully_linked.store(true, Release);
    }

    /// Logically removes the node. The caller must hold this node's lock.
    pub fn mark_for_deletion(&self) {
        debug_assert!(self.lock.is_locked(), "marking a node without its lock");
        self.marked_for_deletion.store(true, Release);
    }

    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn next<'g>(&self, level: usize, guard: &'g Guard) -> Shared<'g, Self> {
        self.links[level].load(Acquire, guard)
    }

    /// Sets a link on a node that has not been published yet.
    pub fn init_next(&mut self, level: usize, successor: Shared<'_, Self>) {
        self.links[level].store(successor, Relaxed);
    }

    /// Snapshot check that a search which first saw this node on its
    /// `level_found`-th level (1-based) may start removing it.
    ///
    /// The result can go stale immediately; the remover must recheck the
    /// mark under the node's lock.
    pub fn ok_to_delete(&self, level_found: usize) -> bool {
        self.height() == level_found && self.is_fully_linked() && !self.is_marked_for_deletion()
    }
}

/// Points `predecessor` at `successor` on `level`.
///
/// Used both to splice a node in and to splice one out. The caller must hold
/// the predecessor's lock.
pub fn link_nodes<T>(predecessor: &Node<T>, successor: Shared<'_, Node<T>>, level: usize) {
    debug_assert!(
        predecessor.lock.is_locked(),
        "linking from a node without its lock"
    );
    predecessor.links[level].store(successor, Release);
}

/// Nodes are equal only to themselves; equal values in distinct nodes are not.
impl<T> PartialEq for Node<T> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl<T> Eq for Node<T> {}

impl<T: PartialEq> PartialEq<T> for Node<T> {
    fn eq(&self, other: &T) -> bool {
        match &self.payload {
            Payload::Value(v) => v == other,
            _ => false,
        }
    }
}

impl<T: PartialOrd> PartialOrd<T> for Node<T> {
    fn partial_cmp(&self, other: &T) -> Option<Ordering> {
        self.key_ref().partial_cmp(&KeyRef::Value(other))
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key_ref())
            .field("height", &self.height())
            .field("fully_linked", &self.is_fully_linked())
            .field("marked_for_deletion", &self.is_marked_for_deletion())
            .finish()
    }
}
