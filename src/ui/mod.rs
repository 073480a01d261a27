// Portal Autologin - UI Tree Abstraction
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Accessibility tree abstraction.
//!
//! A [`UiNode`] is a handle to one element of a live, externally owned UI
//! tree. Handles are released when dropped, so holding one keeps a host
//! resource alive; code walking the tree drops each handle as soon as it
//! is no longer needed.
//!
//! All methods are blocking and tolerate the tree changing between calls:
//! a vanished element reports empty text, no children and no parent.

pub mod atspi;
pub mod search;

#[cfg(test)]
pub(crate) mod testing;

pub use search::{activate, find_clickable, search_and_activate};

/// A handle to one UI element.
pub trait UiNode: Clone {
    /// Visible text content.
    fn text(&self) -> Option<String>;

    /// Accessible label (name / content description).
    fn label(&self) -> Option<String>;

    /// Whether the element accepts the activate action.
    fn is_clickable(&self) -> bool;

    /// Child handles in document order.
    fn children(&self) -> Vec<Self>;

    /// Parent handle, if any.
    fn parent(&self) -> Option<Self>;

    /// Invoke the element's activate action.
    fn activate(&self) -> bool;
}

/// Access to the currently active UI tree.
pub trait UiTree: Send + Sync + 'static {
    type Node: UiNode;

    /// Root of the active window, if any.
    fn active_root(&self) -> Option<Self::Node>;

    /// Whether the backend is connected and usable.
    fn is_available(&self) -> bool;
}

/// Class of UI change signal delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEventKind {
    /// A window appeared, was activated or changed state.
    WindowStateChanged,
    /// Content inside a window changed.
    ContentChanged,
    /// Anything else (focus, selection, text caret, ...).
    Other,
}

impl UiEventKind {
    /// Whether this signal class can reveal a portal page.
    pub fn is_relevant(&self) -> bool {
        matches!(self, Self::WindowStateChanged | Self::ContentChanged)
    }
}
