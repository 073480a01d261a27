// Portal Autologin - In-Memory UI Tree
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! In-memory UI tree used by unit tests. Tracks how many node handles are
//! alive so tests can assert that traversal releases everything it obtains.

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{UiNode, UiTree};

#[derive(Debug, Default)]
struct NodeData {
    text: Option<String>,
    label: Option<String>,
    clickable: bool,
    parent: Option<usize>,
    children: Vec<usize>,
    activations: usize,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: Mutex<Vec<NodeData>>,
    root: Mutex<Option<usize>>,
    live: AtomicIsize,
    root_calls: AtomicUsize,
    missing_roots: AtomicUsize,
}

impl Inner {
    fn with_nodes<R>(&self, f: impl FnOnce(&mut Vec<NodeData>) -> R) -> R {
        let mut guard = self.nodes.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }
}

/// Shared in-memory tree.
#[derive(Debug, Clone, Default)]
pub struct FakeTree {
    inner: Arc<Inner>,
}

impl FakeTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, parent: Option<usize>, text: &str, label: &str, clickable: bool) -> usize {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        self.inner.with_nodes(|nodes| {
            let index = nodes.len();
            nodes.push(NodeData {
                text: opt(text),
                label: opt(label),
                clickable,
                parent,
                ..NodeData::default()
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            index
        })
    }

    /// Create the root element.
    pub fn root(&self, text: &str, clickable: bool) -> usize {
        let index = self.push(None, text, "", clickable);
        *self.inner.root.lock().unwrap_or_else(|p| p.into_inner()) = Some(index);
        index
    }

    /// Append a child with visible text.
    pub fn child(&self, parent: usize, text: &str, clickable: bool) -> usize {
        self.push(Some(parent), text, "", clickable)
    }

    /// Append a child carrying only an accessible label.
    pub fn labelled(&self, parent: usize, label: &str, clickable: bool) -> usize {
        self.push(Some(parent), "", label, clickable)
    }

    pub fn set_clickable(&self, index: usize, clickable: bool) {
        self.inner.with_nodes(|nodes| nodes[index].clickable = clickable);
    }

    /// Make the next `count` calls to `active_root` return nothing.
    pub fn hide_root_for(&self, count: usize) {
        self.inner.missing_roots.store(count, Ordering::SeqCst);
    }

    pub fn activations(&self, index: usize) -> usize {
        self.inner.with_nodes(|nodes| nodes[index].activations)
    }

    pub fn total_activations(&self) -> usize {
        self.inner.with_nodes(|nodes| nodes.iter().map(|n| n.activations).sum())
    }

    /// Number of node handles currently alive.
    pub fn live_handles(&self) -> isize {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Number of times `active_root` has been called.
    pub fn root_calls(&self) -> usize {
        self.inner.root_calls.load(Ordering::SeqCst)
    }

    /// Obtain a handle to an arbitrary node.
    pub fn node(&self, index: usize) -> FakeNode {
        FakeNode::obtain(&self.inner, index)
    }
}

impl UiTree for FakeTree {
    type Node = FakeNode;

    fn active_root(&self) -> Option<FakeNode> {
        self.inner.root_calls.fetch_add(1, Ordering::SeqCst);
        let hidden = self
            .inner
            .missing_roots
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hidden {
            return None;
        }
        let root = *self.inner.root.lock().unwrap_or_else(|p| p.into_inner());
        root.map(|index| FakeNode::obtain(&self.inner, index))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Handle to one in-memory node.
#[derive(Debug)]
pub struct FakeNode {
    inner: Arc<Inner>,
    pub index: usize,
}

impl FakeNode {
    fn obtain(inner: &Arc<Inner>, index: usize) -> Self {
        inner.live.fetch_add(1, Ordering::SeqCst);
        Self {
            inner: Arc::clone(inner),
            index,
        }
    }
}

impl Clone for FakeNode {
    fn clone(&self) -> Self {
        Self::obtain(&self.inner, self.index)
    }
}

impl Drop for FakeNode {
    fn drop(&mut self) {
        self.inner.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl UiNode for FakeNode {
    fn text(&self) -> Option<String> {
        self.inner.with_nodes(|nodes| nodes[self.index].text.clone())
    }

    fn label(&self) -> Option<String> {
        self.inner.with_nodes(|nodes| nodes[self.index].label.clone())
    }

    fn is_clickable(&self) -> bool {
        self.inner.with_nodes(|nodes| nodes[self.index].clickable)
    }

    fn children(&self) -> Vec<Self> {
        let indices = self.inner.with_nodes(|nodes| nodes[self.index].children.clone());
        indices
            .into_iter()
            .map(|i| FakeNode::obtain(&self.inner, i))
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        let parent = self.inner.with_nodes(|nodes| nodes[self.index].parent);
        parent.map(|i| FakeNode::obtain(&self.inner, i))
    }

    fn activate(&self) -> bool {
        self.inner.with_nodes(|nodes| {
            let node = &mut nodes[self.index];
            if node.clickable {
                node.activations += 1;
                true
            } else {
                false
            }
        })
    }
}
