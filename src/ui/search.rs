// Portal Autologin - Control Search
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Breadth-first search for the portal's accept control.
//!
//! Priorities are tried in order, each over the whole tree:
//! 1. `click_text_exact` (case-insensitive equality)
//! 2. each `click_text_contains` entry, in list order (case-insensitive substring)
//!
//! An element counts only when both its text or label matches and it is
//! clickable. Every handle the search obtains is dropped before returning,
//! except the one handed back to the caller.

use std::collections::VecDeque;
use tracing::debug;

use super::{UiNode, UiTree};
use crate::matching::{contains_ignore_case, eq_ignore_case};
use crate::models::Profile;

#[derive(Debug, Clone, Copy)]
enum Needle<'a> {
    Exact(&'a str),
    Contains(&'a str),
}

impl Needle<'_> {
    fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Exact(text) => eq_ignore_case(value, text),
            Self::Contains(text) => contains_ignore_case(value, text),
        }
    }
}

fn needles(profile: &Profile) -> impl Iterator<Item = Needle<'_>> {
    profile
        .click_text_exact
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(Needle::Exact)
        .into_iter()
        .chain(
            profile
                .click_text_contains
                .iter()
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .map(Needle::Contains),
        )
}

fn is_target<N: UiNode>(node: &N, needle: Needle<'_>) -> bool {
    let hit = |value: Option<String>| value.map(|v| needle.accepts(&v)).unwrap_or(false);
    (hit(node.text()) || hit(node.label())) && node.is_clickable()
}

fn breadth_first<N: UiNode>(root: &N, needle: Needle<'_>) -> Option<N> {
    if is_target(root, needle) {
        return Some(root.clone());
    }

    let mut queue: VecDeque<N> = root.children().into();
    while let Some(node) = queue.pop_front() {
        if is_target(&node, needle) {
            // Release everything still waiting to be visited.
            queue.clear();
            return Some(node);
        }
        queue.extend(node.children());
    }
    None
}

/// Find the clickable element the profile asks for, if present.
pub fn find_clickable<N: UiNode>(root: &N, profile: &Profile) -> Option<N> {
    needles(profile).find_map(|needle| {
        let found = breadth_first(root, needle);
        if found.is_some() {
            debug!("Portal control found for {:?}", needle);
        }
        found
    })
}

/// Activate `node`, or its nearest clickable ancestor if the node is no
/// longer clickable. Returns `false` when nothing could be activated.
pub fn activate<N: UiNode>(node: N) -> bool {
    if node.is_clickable() {
        return node.activate();
    }

    debug!("Target no longer clickable, walking up to a clickable ancestor");
    let mut current = node.parent();
    drop(node);
    while let Some(ancestor) = current {
        if ancestor.is_clickable() {
            return ancestor.activate();
        }
        current = ancestor.parent();
    }
    false
}

/// Snapshot the active tree, find the profile's control and activate it.
pub fn search_and_activate<T: UiTree>(tree: &T, profile: &Profile) -> bool {
    let Some(root) = tree.active_root() else {
        debug!("No active window to search");
        return false;
    };
    match find_clickable(&root, profile) {
        Some(target) => activate(target),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchKind;
    use crate::ui::testing::FakeTree;

    fn profile(exact: Option<&str>, contains: &[&str]) -> Profile {
        let mut p = Profile::new("Guest", MatchKind::Contains, "http://example.com");
        p.click_text_exact = exact.map(str::to_string);
        p.click_text_contains = contains.iter().map(|s| s.to_string()).collect();
        p
    }

    #[test]
    fn test_exact_beats_shallower_contains() {
        let tree = FakeTree::new();
        let root = tree.root("Portal", false);
        let shallow = tree.child(root, "Accept cookies", true);
        let l1 = tree.child(root, "", false);
        let l2 = tree.child(l1, "", false);
        let deep = tree.child(l2, "I agree", true);

        let p = profile(Some("i AGREE"), &["Accept"]);
        let root_node = tree.active_root().expect("root");
        let found = find_clickable(&root_node, &p).expect("found");
        assert_eq!(found.index, deep);
        assert_ne!(found.index, shallow);
    }

    #[test]
    fn test_breadth_first_tie_break() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        let a = tree.child(root, "", false);
        let _deep = tree.child(a, "Continue", true);
        let first = tree.child(root, "Continue to internet", true);
        let _second = tree.child(root, "Continue", true);

        let root_node = tree.active_root().expect("root");
        let found = find_clickable(&root_node, &profile(None, &["continue"])).expect("found");
        assert_eq!(found.index, first);
    }

    #[test]
    fn test_contains_entries_in_list_order() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        let _accept = tree.child(root, "Accept", true);
        let mid = tree.child(root, "", false);
        let agree = tree.child(mid, "Agree", true);

        let root_node = tree.active_root().expect("root");
        let found = find_clickable(&root_node, &profile(None, &["Agree", "Accept"])).expect("found");
        assert_eq!(found.index, agree);
    }

    #[test]
    fn test_non_clickable_match_skipped() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        let _label = tree.child(root, "Connect", false);
        let wrapper = tree.child(root, "", false);
        let button = tree.labelled(wrapper, "connect now", true);

        let root_node = tree.active_root().expect("root");
        let found = find_clickable(&root_node, &profile(None, &["Connect"])).expect("found");
        assert_eq!(found.index, button);
    }

    #[test]
    fn test_handles_released_on_every_path() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        for i in 0..5 {
            let row = tree.child(root, &format!("row {}", i), false);
            tree.child(row, "Accept", i == 1);
            tree.child(row, "Decline", true);
        }

        {
            let root_node = tree.active_root().expect("root");
            let found = find_clickable(&root_node, &profile(None, &["Accept"]));
            assert!(found.is_some());
            assert_eq!(tree.live_handles(), 2);
        }
        assert_eq!(tree.live_handles(), 0);

        {
            let root_node = tree.active_root().expect("root");
            assert!(find_clickable(&root_node, &profile(None, &["Nothing here"])).is_none());
            assert_eq!(tree.live_handles(), 1);
        }
        assert_eq!(tree.live_handles(), 0);

        assert!(search_and_activate(&tree, &profile(Some("decline"), &[])));
        assert_eq!(tree.live_handles(), 0);
    }

    #[test]
    fn test_activation_falls_back_to_ancestor() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        let card = tree.child(root, "", true);
        let inner = tree.child(card, "", false);
        let button = tree.child(inner, "Get Started", true);

        let root_node = tree.active_root().expect("root");
        let found = find_clickable(&root_node, &profile(None, &["started"])).expect("found");
        tree.set_clickable(button, false);
        assert!(activate(found));
        assert_eq!(tree.activations(card), 1);
        assert_eq!(tree.activations(button), 0);
        drop(root_node);
        assert_eq!(tree.live_handles(), 0);
    }

    #[test]
    fn test_activation_without_clickable_ancestor() {
        let tree = FakeTree::new();
        let root = tree.root("", false);
        let button = tree.child(root, "Accept", false);
        assert!(!activate(tree.node(button)));
        assert_eq!(tree.total_activations(), 0);
        assert_eq!(tree.live_handles(), 0);
    }

    #[test]
    fn test_missing_root_or_targets() {
        let tree = FakeTree::new();
        assert!(!search_and_activate(&tree, &profile(None, &["Accept"])));

        tree.root("Accept", true);
        assert!(!search_and_activate(&tree, &profile(Some(""), &["", ""])));
        assert!(search_and_activate(&tree, &profile(None, &["accept"])));
        assert_eq!(tree.live_handles(), 0);
    }
}
