// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Frames kept on a common date.
//!
//! A synchronizer groups frames that all depend on the same epoch, such as a
//! spacecraft body frame and its sensor frames. Moving the synchronizer to a
//! new date recomputes every member's transform-to-parent, in registration
//! order, and commits them together: if any member fails, neither the date
//! nor any member cache changes.
//!
//! Asking the tree for a member's transform at a date other than the
//! synchronizer's moves the whole group to that date.

use std::cell::Cell;

use tracing::debug;

use crate::error::{KernelError, Result};
use crate::frame::{FrameId, FrameTree, SyncGroup, SynchronizerId, TransformProvider};
use crate::instant::Instant;

impl FrameTree {
    /// Register a new synchronizer, initially at `initial` (J2000.0 if `None`).
    pub fn add_synchronizer(&mut self, initial: Option<Instant>) -> SynchronizerId {
        let index = self.groups.len();
        self.groups.push(SyncGroup {
            date: Cell::new(initial.unwrap_or(Instant::J2000_EPOCH)),
            members: Vec::new(),
        });
        SynchronizerId {
            tree: self.id,
            index: index as u32,
        }
    }

    /// Attach a new frame below `parent` and register it with `synchronizer`.
    ///
    /// Nothing is computed until the synchronizer next moves.
    ///
    /// # Errors
    /// [`KernelError::Configuration`] for a taken name, a foreign parent or a
    /// foreign synchronizer.
    pub fn add_synchronized_frame<P>(
        &mut self,
        name: impl Into<String>,
        parent: FrameId,
        provider: P,
        synchronizer: SynchronizerId,
    ) -> Result<FrameId>
    where
        P: TransformProvider + Send + 'static,
    {
        let name = name.into();
        let group = self.group_index(synchronizer).ok_or_else(|| {
            KernelError::config(name.clone(), "synchronizer belongs to another tree")
        })?;
        let frame = self.insert(name, parent, Box::new(provider), false, Some(group))?;
        self.groups[group].members.push(frame.index());
        Ok(frame)
    }

    /// Handle on `synchronizer`, or `None` if it belongs to another tree.
    pub fn synchronizer(&self, synchronizer: SynchronizerId) -> Option<FrameSynchronizer<'_>> {
        self.group_index(synchronizer).map(|group| FrameSynchronizer { tree: self, group })
    }

    fn group_index(&self, synchronizer: SynchronizerId) -> Option<usize> {
        let index = synchronizer.index as usize;
        (synchronizer.tree == self.id && index < self.groups.len()).then_some(index)
    }

    /// Move group `group` to `date`: compute every member, then commit.
    pub(crate) fn synchronize(&self, group: usize, date: &Instant) -> Result<()> {
        let sync = &self.groups[group];
        let computed = sync
            .members
            .iter()
            .map(|&index| self.compute(index, date))
            .collect::<Result<Vec<_>>>()?;
        for (&index, transform) in sync.members.iter().zip(computed) {
            self.frames[index].cache.replace(Some(transform));
        }
        sync.date.set(*date);
        debug!(synchronizer = group, members = sync.members.len(), %date, "synchronizer committed");
        Ok(())
    }
}

/// Borrowed view of one synchronizer of a [`FrameTree`].
#[derive(Debug, Clone, Copy)]
pub struct FrameSynchronizer<'a> {
    tree: &'a FrameTree,
    group: usize,
}

impl FrameSynchronizer<'_> {
    /// Date of the last commit (the initial date before any).
    pub fn date(&self) -> Instant {
        self.tree.groups[self.group].date.get()
    }

    /// Move every member to `date`, all or nothing.
    ///
    /// # Errors
    /// The first error raised by a member's provider; no state changes.
    pub fn set_date(&self, date: &Instant) -> Result<()> {
        self.tree.synchronize(self.group, date)
    }

    /// Members in registration order.
    pub fn members(&self) -> Vec<FrameId> {
        self.tree.groups[self.group]
            .members
            .iter()
            .map(|&index| self.tree.frame_id(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rotation, Vector3};
    use crate::providers::FixedTransform;
    use crate::transform::Transform;
    use qtty::Seconds;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn spinning(rate: f64) -> impl Fn(&Instant) -> Result<Transform> {
        move |date: &Instant| -> Result<Transform> {
            let dt = date.duration_from(&Instant::J2000_EPOCH).value();
            Ok(Transform::from_rotation(
                *date,
                Rotation::about_z(rate * dt),
                Vector3::new(0.0, 0.0, rate),
            ))
        }
    }

    #[test]
    fn default_date_is_j2000() {
        let mut tree = FrameTree::new("ROOT");
        let sync = tree.add_synchronizer(None);
        assert_eq!(tree.synchronizer(sync).unwrap().date(), Instant::J2000_EPOCH);
        let start = Instant::J2000_EPOCH + Seconds::new(5.0);
        let other = tree.add_synchronizer(Some(start));
        assert_eq!(tree.synchronizer(other).unwrap().date(), start);
    }

    #[test]
    fn adding_members_does_not_compute() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let sync = tree.add_synchronizer(None);
        let body = tree
            .add_synchronized_frame(
                "BODY",
                root,
                move |date: &Instant| -> Result<Transform> {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Ok(Transform::identity(*date))
                },
                sync,
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert_eq!(tree.cached_transform(body), None);
        assert_eq!(tree.synchronizer(sync).unwrap().members(), vec![body]);
    }

    #[test]
    fn member_query_moves_the_group() {
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let sync = tree.add_synchronizer(None);
        let body = tree.add_synchronized_frame("BODY", root, spinning(1e-3), sync).unwrap();
        let sensor = tree
            .add_synchronized_frame(
                "SENSOR",
                body,
                FixedTransform::new(Rotation::about_x(0.1), Vector3::new(0.0, 1.0, 0.0)),
                sync,
            )
            .unwrap();
        let t1 = Instant::J2000_EPOCH + Seconds::new(120.0);
        tree.transform(body, root, &t1).unwrap();
        assert_eq!(tree.synchronizer(sync).unwrap().date(), t1);
        assert_eq!(tree.cached_transform(sensor).map(|t| t.date()), Some(t1));
    }

    #[test]
    fn failed_commit_changes_nothing() {
        let fail = Arc::new(AtomicBool::new(false));
        let switch = Arc::clone(&fail);
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let sync = tree.add_synchronizer(None);
        let a = tree.add_synchronized_frame("A", root, spinning(2e-3), sync).unwrap();
        tree.add_synchronized_frame(
            "B",
            root,
            move |date: &Instant| -> Result<Transform> {
                if switch.load(Ordering::Relaxed) {
                    Err(KernelError::data("EOP history", Some(*date), "no samples"))
                } else {
                    Ok(Transform::identity(*date))
                }
            },
            sync,
        )
        .unwrap();

        let t1 = Instant::J2000_EPOCH + Seconds::new(10.0);
        let handle = tree.synchronizer(sync).unwrap();
        handle.set_date(&t1).unwrap();
        let before = tree.cached_transform(a);

        fail.store(true, Ordering::Relaxed);
        let t2 = t1 + Seconds::new(10.0);
        assert!(handle.set_date(&t2).is_err());
        assert_eq!(handle.date(), t1);
        assert_eq!(tree.cached_transform(a), before);
    }

    #[test]
    fn foreign_synchronizer_rejected() {
        let mut tree = FrameTree::new("ROOT");
        let mut other = FrameTree::new("OTHER");
        let foreign = other.add_synchronizer(None);
        assert!(tree.synchronizer(foreign).is_none());
        let fixed = FixedTransform::new(Rotation::IDENTITY, Vector3::ZERO);
        let err = tree
            .add_synchronized_frame("X", tree.root(), fixed, foreign)
            .unwrap_err();
        assert!(matches!(err, KernelError::Configuration { ref frame, .. } if frame == "X"));
        assert_eq!(tree.frame_by_name("X"), None);
    }
}
