// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::node::NodeBox;
use crate::widget::{Widget, WidgetBox};

/// Result of aligning one tree position.
pub struct ReconcileOutcome {
    pub node: NodeBox,
    /// Whether a brand new node was created (the old one, if any, was
    /// discarded).
    pub created: bool,
}

/// Align a description with the node that previously occupied its tree
/// position.
///
/// If the node's kind matches, it is updated in place and its children are
/// reconciled recursively; otherwise the old node is discarded and a fresh
/// one created. Surviving nodes keep their internal state (cursor
/// positions, scroll offsets, focus) — that is the property that makes
/// focus stick across rebuilds.
///
/// # Panics
/// Panics when a description creates a node whose kind disagrees with the
/// description's own kind. That is a programmer error in the widget
/// implementation and must not be silently swallowed.
pub fn reconcile(existing: Option<NodeBox>, description: &dyn Widget) -> ReconcileOutcome {
    match existing {
        Some(mut node) if node.base().kind() == description.kind() => {
            let changed = node.update(description);
            if changed {
                node.base_mut().mark_dirty();
            }
            node.base_mut().bindings = description.bindings();

            if reconcile_children(&mut node, description.children()) {
                node.base_mut().mark_dirty();
            }

            ReconcileOutcome {
                node,
                created: false,
            }
        }
        _ => {
            let mut node = description.create_node();
            assert_eq!(
                node.base().kind(),
                description.kind(),
                "description '{}' created a node of kind '{}'; a description's \
                 expected node type must match the node it creates",
                description.kind(),
                node.base().kind(),
            );

            node.base_mut().mark_dirty();
            node.base_mut().bindings = description.bindings();
            reconcile_children(&mut node, description.children());

            ReconcileOutcome {
                node,
                created: true,
            }
        }
    }
}

/// Index-based child reconciliation: the i-th new child is compared with
/// the i-th old child, nothing smarter. There is no keyed matching — a
/// position change is a structural change and creates a fresh node (losing
/// that subtree's state). Returns whether the child list changed shape or
/// identity.
pub fn reconcile_children(node: &mut NodeBox, descriptions: &[WidgetBox]) -> bool {
    let old_children = std::mem::take(&mut node.base_mut().children);
    let mut changed = old_children.len() != descriptions.len();

    let mut old_iter = old_children.into_iter();
    let mut new_children = Vec::with_capacity(descriptions.len());

    for description in descriptions {
        let outcome = reconcile(old_iter.next(), description.as_ref());
        changed |= outcome.created;
        new_children.push(outcome.node);
    }
    // any leftover old children are dropped here

    node.base_mut().children = new_children;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::{Label, TextField, VStack};

    fn boxed(widget: impl Widget + 'static) -> WidgetBox {
        Box::new(widget)
    }

    #[test]
    fn matching_kind_updates_in_place() {
        let first = Label::new("one");
        let outcome = reconcile(None, &first);
        assert!(outcome.created);

        let second = Label::new("two");
        let outcome = reconcile(Some(outcome.node), &second);
        assert!(!outcome.created);
        assert!(outcome.node.base().dirty);
    }

    #[test]
    fn unchanged_config_does_not_dirty() {
        let outcome = reconcile(None, &Label::new("same"));
        let mut node = outcome.node;
        node.base_mut().dirty = false;

        let outcome = reconcile(Some(node), &Label::new("same"));
        assert!(!outcome.node.base().dirty);
    }

    #[test]
    fn kind_mismatch_discards_the_node() {
        let outcome = reconcile(None, &Label::new("x"));
        let outcome = reconcile(Some(outcome.node), &TextField::new(10));
        assert!(outcome.created);
        assert_eq!(outcome.node.base().kind(), "text-field");
    }

    #[test]
    fn child_count_change_dirties_parent() {
        let one = VStack::new(vec![boxed(Label::new("a"))]);
        let outcome = reconcile(None, &one);
        let mut node = outcome.node;
        node.base_mut().dirty = false;

        let two = VStack::new(vec![boxed(Label::new("a")), boxed(Label::new("b"))]);
        let outcome = reconcile(Some(node), &two);
        assert!(!outcome.created);
        assert!(outcome.node.base().dirty);
        assert_eq!(outcome.node.base().children.len(), 2);
    }

    #[test]
    fn index_based_matching_recreates_shifted_children() {
        // [TextField] -> [Label, TextField]: the field moves from index 0
        // to index 1, so by-index comparison recreates both positions.
        let first = VStack::new(vec![boxed(TextField::new(10))]);
        let outcome = reconcile(None, &first);

        let second = VStack::new(vec![boxed(Label::new("l")), boxed(TextField::new(10))]);
        let outcome = reconcile(Some(outcome.node), &second);

        let children = &outcome.node.base().children;
        assert_eq!(children[0].base().kind(), "label");
        assert_eq!(children[1].base().kind(), "text-field");
    }

    #[test]
    fn surviving_node_keeps_focus() {
        let tree = VStack::new(vec![boxed(TextField::new(10))]);
        let outcome = reconcile(None, &tree);
        let mut node = outcome.node;
        node.base_mut().children[0].base_mut().focused = true;

        let rebuilt = VStack::new(vec![boxed(TextField::new(10))]);
        let outcome = reconcile(Some(node), &rebuilt);
        assert!(outcome.node.base().children[0].base().focused);
    }
}
