// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Reference-frame tree.
//!
//! Frames live in a [`FrameTree`] arena and are addressed by [`FrameId`].
//! Every frame except the root has a parent and a [`TransformProvider`]
//! giving its transform *to* that parent at any date. A transform between
//! two arbitrary frames is assembled through their lowest common ancestor.
//!
//! Each frame caches the last transform-to-parent it computed, keyed by
//! date. Providers must be `Send` and the caches use interior mutability,
//! so a tree is `Send` but not `Sync`: share it across threads behind a
//! lock, or build one per thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{debug, trace};

use crate::error::{KernelError, Result};
use crate::instant::Instant;
use crate::transform::Transform;

static NEXT_TREE_ID: AtomicU32 = AtomicU32::new(0);

// ═══════════════════════════════════════════════════════════════════════════
// Providers
// ═══════════════════════════════════════════════════════════════════════════

/// Source of a frame's transform to its parent.
pub trait TransformProvider {
    /// Transform from the frame to its parent at `date`.
    fn transform(&self, date: &Instant) -> Result<Transform>;
}

impl<F> TransformProvider for F
where
    F: Fn(&Instant) -> Result<Transform>,
{
    fn transform(&self, date: &Instant) -> Result<Transform> {
        self(date)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════

/// Handle on a frame of one particular [`FrameTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameId {
    tree: u32,
    index: u32,
}

impl FrameId {
    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame #{} of tree #{}", self.index, self.tree)
    }
}

/// Handle on a synchronizer of one particular [`FrameTree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SynchronizerId {
    pub(crate) tree: u32,
    pub(crate) index: u32,
}

// ═══════════════════════════════════════════════════════════════════════════
// FrameTree
// ═══════════════════════════════════════════════════════════════════════════

pub(crate) struct FrameNode {
    pub(crate) name: String,
    pub(crate) parent: Option<usize>,
    pub(crate) provider: Option<Box<dyn TransformProvider + Send>>,
    pub(crate) pseudo_inertial: bool,
    pub(crate) cache: RefCell<Option<Transform>>,
    pub(crate) group: Option<usize>,
}

pub(crate) struct SyncGroup {
    pub(crate) date: Cell<Instant>,
    pub(crate) members: Vec<usize>,
}

/// Arena of frames sharing one root.
pub struct FrameTree {
    pub(crate) id: u32,
    pub(crate) frames: Vec<FrameNode>,
    by_name: HashMap<String, usize>,
    pub(crate) groups: Vec<SyncGroup>,
}

impl fmt::Debug for FrameTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTree")
            .field("id", &self.id)
            .field("frames", &self.frames.iter().map(|n| n.name.as_str()).collect::<Vec<_>>())
            .field("synchronizers", &self.groups.len())
            .finish()
    }
}

impl FrameTree {
    /// A tree holding only its pseudo-inertial root.
    pub fn new(root_name: impl Into<String>) -> Self {
        let name = root_name.into();
        let mut by_name = HashMap::new();
        by_name.insert(name.clone(), 0);
        Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            frames: vec![FrameNode {
                name,
                parent: None,
                provider: None,
                pseudo_inertial: true,
                cache: RefCell::new(None),
                group: None,
            }],
            by_name,
            groups: Vec::new(),
        }
    }

    // ── construction ──────────────────────────────────────────────────

    /// Attach a new frame below `parent`.
    ///
    /// # Errors
    /// [`KernelError::Configuration`] if the name is already taken or
    /// `parent` belongs to another tree.
    pub fn add_frame<P>(
        &mut self,
        name: impl Into<String>,
        parent: FrameId,
        provider: P,
        pseudo_inertial: bool,
    ) -> Result<FrameId>
    where
        P: TransformProvider + Send + 'static,
    {
        self.insert(name.into(), parent, Box::new(provider), pseudo_inertial, None)
    }

    pub(crate) fn insert(
        &mut self,
        name: String,
        parent: FrameId,
        provider: Box<dyn TransformProvider + Send>,
        pseudo_inertial: bool,
        group: Option<usize>,
    ) -> Result<FrameId> {
        if self.by_name.contains_key(&name) {
            return Err(KernelError::config(name, "a frame with this name already exists"));
        }
        if parent.tree != self.id {
            return Err(KernelError::config(
                name,
                format!("parent {parent} belongs to another tree"),
            ));
        }
        let index = self.frames.len();
        debug!(frame = %name, parent = %self.frames[parent.index()].name, "frame added");
        self.by_name.insert(name.clone(), index);
        self.frames.push(FrameNode {
            name,
            parent: Some(parent.index()),
            provider: Some(provider),
            pseudo_inertial,
            cache: RefCell::new(None),
            group,
        });
        Ok(self.frame_id(index))
    }

    /// Move `frame` below `new_parent`, with a new provider.
    ///
    /// # Errors
    /// [`KernelError::Configuration`] if `frame` is the root, either id
    /// belongs to another tree, or `new_parent` is `frame` itself or one of
    /// its descendants.
    pub fn reparent<P>(&mut self, frame: FrameId, new_parent: FrameId, provider: P) -> Result<()>
    where
        P: TransformProvider + Send + 'static,
    {
        if frame.tree != self.id || new_parent.tree != self.id {
            return Err(KernelError::config(
                frame.to_string(),
                format!("cannot reparent across trees (new parent {new_parent})"),
            ));
        }
        let name = self.frames[frame.index()].name.clone();
        if frame.index() == 0 {
            return Err(KernelError::config(name, "the root frame has no parent"));
        }
        let mut cursor = Some(new_parent.index());
        while let Some(index) = cursor {
            if index == frame.index() {
                return Err(KernelError::config(
                    name,
                    format!("parent {} would close a cycle", self.frames[new_parent.index()].name),
                ));
            }
            cursor = self.frames[index].parent;
        }
        debug!(frame = %name, parent = %self.frames[new_parent.index()].name, "frame re-parented");
        let node = &mut self.frames[frame.index()];
        node.parent = Some(new_parent.index());
        node.provider = Some(Box::new(provider));
        node.cache.replace(None);
        Ok(())
    }

    // ── inspection ────────────────────────────────────────────────────

    pub(crate) fn frame_id(&self, index: usize) -> FrameId {
        FrameId {
            tree: self.id,
            index: index as u32,
        }
    }

    pub fn root(&self) -> FrameId {
        self.frame_id(0)
    }

    pub fn frame_by_name(&self, name: &str) -> Option<FrameId> {
        self.by_name.get(name).map(|&index| self.frame_id(index))
    }

    /// Name of `frame`, or `None` if it belongs to another tree.
    pub fn name(&self, frame: FrameId) -> Option<&str> {
        self.node(frame).map(|n| n.name.as_str())
    }

    pub fn parent(&self, frame: FrameId) -> Option<FrameId> {
        self.node(frame)?.parent.map(|index| self.frame_id(index))
    }

    pub fn is_pseudo_inertial(&self, frame: FrameId) -> Option<bool> {
        self.node(frame).map(|n| n.pseudo_inertial)
    }

    /// The transform-to-parent currently cached for `frame`.
    pub fn cached_transform(&self, frame: FrameId) -> Option<Transform> {
        self.node(frame).and_then(|n| *n.cache.borrow())
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn node(&self, frame: FrameId) -> Option<&FrameNode> {
        if frame.tree == self.id {
            self.frames.get(frame.index())
        } else {
            None
        }
    }

    fn describe(&self, frame: FrameId) -> String {
        match self.name(frame) {
            Some(name) => name.to_owned(),
            None => frame.to_string(),
        }
    }

    // ── transforms ────────────────────────────────────────────────────

    /// Transform from `from` to `to` at `date`.
    ///
    /// # Errors
    /// [`KernelError::UnrelatedFrames`] if either frame belongs to another
    /// tree; any error raised by a provider on the path.
    pub fn transform(&self, from: FrameId, to: FrameId, date: &Instant) -> Result<Transform> {
        if self.node(from).is_none() || self.node(to).is_none() {
            return Err(KernelError::UnrelatedFrames {
                from: self.describe(from),
                to: self.describe(to),
            });
        }
        if from == to {
            return Ok(Transform::identity(*date));
        }
        let from_path = self.path_to_root(from.index());
        let to_path = self.path_to_root(to.index());
        // Both paths end at the root; strip the shared tail.
        let shared = from_path
            .iter()
            .rev()
            .zip(to_path.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        let up = self.chain(&from_path[..from_path.len() - shared], date)?;
        let down = self.chain(&to_path[..to_path.len() - shared], date)?;
        Ok(up.compose(&down.inverse()))
    }

    /// Transform from `frame` to its parent at `date` (identity for the root).
    pub fn transform_to_parent(&self, frame: FrameId, date: &Instant) -> Result<Transform> {
        match self.parent(frame) {
            Some(_) => self.to_parent(frame.index(), date),
            None if self.node(frame).is_some() => Ok(Transform::identity(*date)),
            None => Err(KernelError::UnrelatedFrames {
                from: frame.to_string(),
                to: self.frames[0].name.clone(),
            }),
        }
    }

    fn path_to_root(&self, mut index: usize) -> Vec<usize> {
        let mut path = vec![index];
        while let Some(parent) = self.frames[index].parent {
            path.push(parent);
            index = parent;
        }
        path
    }

    /// Compose the transforms-to-parent of `path`, nearest frame first.
    fn chain(&self, path: &[usize], date: &Instant) -> Result<Transform> {
        path.iter().try_fold(Transform::identity(*date), |acc, &index| {
            Ok(acc.compose(&self.to_parent(index, date)?))
        })
    }

    pub(crate) fn to_parent(&self, index: usize, date: &Instant) -> Result<Transform> {
        let node = &self.frames[index];
        let cached = *node.cache.borrow();
        if let Some(hit) = cached.filter(|t| t.date() == *date) {
            return Ok(hit);
        }
        if let Some(group) = node.group {
            self.synchronize(group, date)?;
            let committed = *node.cache.borrow();
            if let Some(hit) = committed {
                return Ok(hit);
            }
        }
        trace!(frame = %node.name, %date, "transform cache miss");
        let computed = self.compute(index, date)?;
        node.cache.replace(Some(computed));
        Ok(computed)
    }

    pub(crate) fn compute(&self, index: usize, date: &Instant) -> Result<Transform> {
        let node = &self.frames[index];
        match &node.provider {
            Some(provider) => Ok(provider.transform(date)?.with_date(*date)),
            None => Ok(Transform::identity(*date)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rotation, Vector3};
    use crate::providers::FixedTransform;
    use qtty::Seconds;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn offset(x: f64) -> FixedTransform {
        FixedTransform::new(Rotation::IDENTITY, Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn root_is_pseudo_inertial_identity() {
        let tree = FrameTree::new("ROOT");
        let root = tree.root();
        assert_eq!(tree.name(root), Some("ROOT"));
        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.is_pseudo_inertial(root), Some(true));
        let t = tree.transform(root, root, &Instant::J2000_EPOCH).unwrap();
        assert_eq!(t, Transform::identity(Instant::J2000_EPOCH));
    }

    #[test]
    fn sibling_transform_goes_through_common_ancestor() {
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let a = tree.add_frame("A", root, offset(10.0), true).unwrap();
        let b = tree
            .add_frame(
                "B",
                root,
                FixedTransform::new(Rotation::about_z(FRAC_PI_2), Vector3::new(0.0, 5.0, 0.0)),
                false,
            )
            .unwrap();
        let t = tree.transform(a, b, &Instant::J2000_EPOCH).unwrap();
        // Origin of A sits at (10, 0, 0) in ROOT, i.e. (-5, -10, 0) in B.
        let p = t.transform_position(Vector3::ZERO);
        assert!(p.distance(&Vector3::new(-5.0, -10.0, 0.0)) < 1e-12, "{p:?}");
        let back = tree.transform(b, a, &Instant::J2000_EPOCH).unwrap();
        assert!(back.compose(&t).rotation().angle() < 1e-15);
    }

    #[test]
    fn duplicate_and_foreign_parents_rejected() {
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        tree.add_frame("A", root, offset(1.0), false).unwrap();
        let dup = tree.add_frame("A", root, offset(2.0), false).unwrap_err();
        assert!(matches!(dup, KernelError::Configuration { ref frame, .. } if frame == "A"));

        let other = FrameTree::new("OTHER");
        let foreign = tree.add_frame("B", other.root(), offset(1.0), false).unwrap_err();
        assert!(matches!(foreign, KernelError::Configuration { .. }));
    }

    #[test]
    fn unrelated_frames_rejected() {
        let tree = FrameTree::new("ROOT");
        let other = FrameTree::new("OTHER");
        let err = tree
            .transform(tree.root(), other.root(), &Instant::J2000_EPOCH)
            .unwrap_err();
        assert!(matches!(err, KernelError::UnrelatedFrames { ref from, .. } if from == "ROOT"));
    }

    #[test]
    fn reparent_rejects_cycles() {
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let a = tree.add_frame("A", root, offset(1.0), false).unwrap();
        let b = tree.add_frame("B", a, offset(1.0), false).unwrap();
        let c = tree.add_frame("C", b, offset(1.0), false).unwrap();
        assert!(matches!(
            tree.reparent(a, c, offset(1.0)),
            Err(KernelError::Configuration { ref frame, .. }) if frame == "A"
        ));
        assert!(tree.reparent(a, a, offset(1.0)).is_err());
        assert!(tree.reparent(root, a, offset(1.0)).is_err());
        assert_eq!(tree.parent(a), Some(root));

        tree.reparent(c, root, offset(3.0)).unwrap();
        assert_eq!(tree.parent(c), Some(root));
        let t = tree.transform(c, root, &Instant::J2000_EPOCH).unwrap();
        assert_eq!(t.translation(), Vector3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn cache_keeps_last_date_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let spin = tree
            .add_frame(
                "SPIN",
                root,
                move |date: &Instant| -> Result<Transform> {
                    counter.fetch_add(1, Ordering::Relaxed);
                    let dt = date.duration_from(&Instant::J2000_EPOCH).value();
                    Ok(Transform::from_rotation(*date, Rotation::about_z(1e-3 * dt), Vector3::ZERO))
                },
                false,
            )
            .unwrap();
        let t0 = Instant::J2000_EPOCH;
        let t1 = t0 + Seconds::new(60.0);
        tree.transform(spin, root, &t0).unwrap();
        tree.transform(spin, root, &t0).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        tree.transform(spin, root, &t1).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(tree.cached_transform(spin).map(|t| t.date()), Some(t1));
        tree.transform(spin, root, &t0).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn provider_errors_propagate() {
        let mut tree = FrameTree::new("ROOT");
        let root = tree.root();
        let broken = tree
            .add_frame(
                "BROKEN",
                root,
                |date: &Instant| -> Result<Transform> {
                    Err(KernelError::data("EOP history", Some(*date), "no samples"))
                },
                false,
            )
            .unwrap();
        let err = tree.transform(broken, root, &Instant::J2000_EPOCH).unwrap_err();
        assert!(matches!(err, KernelError::DataUnavailable { date: Some(_), .. }));
        assert_eq!(tree.cached_transform(broken), None);
    }

    #[test]
    fn lookup_by_name() {
        let mut tree = FrameTree::new("ROOT");
        let a = tree.add_frame("A", tree.root(), offset(1.0), false).unwrap();
        assert_eq!(tree.frame_by_name("A"), Some(a));
        assert_eq!(tree.frame_by_name("Z"), None);
        assert_eq!(tree.len(), 2);
        assert!(format!("{tree:?}").contains("\"A\""));
    }

    #[test]
    fn tree_moves_across_threads_behind_a_lock() {
        fn assert_send<T: Send>() {}
        assert_send::<FrameTree>();

        let mut tree = FrameTree::new("ROOT");
        let a = tree.add_frame("A", tree.root(), offset(2.0), false).unwrap();
        let root = tree.root();
        let shared = Arc::new(std::sync::Mutex::new(tree));
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || {
                let tree = shared.lock().unwrap();
                tree.transform(a, root, &Instant::J2000_EPOCH).unwrap()
            })
        };
        let t = worker.join().unwrap();
        assert_eq!(t.translation(), Vector3::new(2.0, 0.0, 0.0));
        let tree = shared.lock().unwrap();
        assert_eq!(tree.cached_transform(a), Some(t));
    }
}
