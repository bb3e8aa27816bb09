// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::node::{NodeBox, all_paths, node_at, node_at_mut};

/// Focus bookkeeping: traversal order, Tab movement, and focus scopes.
///
/// The focus order is the depth-first pre-order of the arranged tree,
/// restricted to the innermost scope when one is pushed (navigators use
/// scopes to trap Tab inside a subtree, e.g. a modal).
#[derive(Debug, Default)]
pub struct FocusManager {
    scopes: Vec<Vec<usize>>,
}

impl FocusManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict traversal to the subtree at `path` until popped.
    pub fn push_scope(&mut self, path: Vec<usize>) {
        self.scopes.push(path);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn scope(&self) -> &[usize] {
        self.scopes.last().map_or(&[], Vec::as_slice)
    }

    /// Paths of all focusable nodes in traversal order, inside the scope.
    #[must_use]
    pub fn focusable_paths(&self, root: &NodeBox) -> Vec<Vec<usize>> {
        let scope = self.scope();
        all_paths(root)
            .into_iter()
            .filter(|path| path.starts_with(scope))
            .filter(|path| node_at(root, path).is_some_and(|node| node.is_focusable()))
            .collect()
    }

    /// Path of the currently focused node, if any.
    #[must_use]
    pub fn focused_path(root: &NodeBox) -> Option<Vec<usize>> {
        all_paths(root)
            .into_iter()
            .find(|path| node_at(root, path).is_some_and(|node| node.base().focused))
    }

    /// Move focus to the node at `path`, clearing it everywhere else.
    /// Nodes whose focus flag flips are marked dirty.
    pub fn focus_path(root: &mut NodeBox, path: &[usize]) {
        for candidate in all_paths(root) {
            let is_target = candidate == path;
            if let Some(node) = node_at_mut(root, &candidate) {
                if node.base().focused != is_target {
                    node.base_mut().focused = is_target;
                    node.base_mut().mark_dirty();
                }
            }
        }
    }

    /// Give focus to the first focusable node if nothing holds it.
    pub fn ensure_focus(&self, root: &mut NodeBox) {
        if Self::focused_path(root).is_some() {
            return;
        }
        if let Some(first) = self.focusable_paths(root).first().cloned() {
            Self::focus_path(root, &first);
        }
    }

    /// Advance to the next focusable node, wrapping at the end.
    pub fn focus_next(&self, root: &mut NodeBox) {
        self.focus_step(root, true);
    }

    /// Retreat to the previous focusable node, wrapping at the start.
    pub fn focus_previous(&self, root: &mut NodeBox) {
        self.focus_step(root, false);
    }

    fn focus_step(&self, root: &mut NodeBox, forward: bool) {
        let order = self.focusable_paths(root);
        if order.is_empty() {
            return;
        }

        let current = Self::focused_path(root);
        let next = current
            .and_then(|path| order.iter().position(|p| *p == path))
            .map_or(0, |index| {
                if forward {
                    (index + 1) % order.len()
                } else {
                    (index + order.len() - 1) % order.len()
                }
            });

        Self::focus_path(root, &order[next]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetBox;
    use crate::widgets::{Label, TextField, VStack};
    use crate::reconcile::reconcile;

    fn tree_with_two_fields() -> NodeBox {
        let tree = VStack::new(vec![
            Box::new(Label::new("title")) as WidgetBox,
            Box::new(TextField::new(10)) as WidgetBox,
            Box::new(TextField::new(10)) as WidgetBox,
        ]);
        reconcile(None, &tree).node
    }

    #[test]
    fn focus_order_skips_unfocusable_nodes() {
        let root = tree_with_two_fields();
        let focus = FocusManager::new();
        let order = focus.focusable_paths(&root);
        assert_eq!(order, vec![vec![1], vec![2]]);
    }

    #[test]
    fn tab_wraps_both_directions() {
        let mut root = tree_with_two_fields();
        let focus = FocusManager::new();

        focus.ensure_focus(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1]));

        focus.focus_next(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![2]));

        focus.focus_next(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1]));

        focus.focus_previous(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![2]));
    }

    #[test]
    fn scope_restricts_traversal() {
        let tree = VStack::new(vec![
            Box::new(TextField::new(10)) as WidgetBox,
            Box::new(VStack::new(vec![
                Box::new(TextField::new(10)) as WidgetBox,
                Box::new(TextField::new(10)) as WidgetBox,
            ])) as WidgetBox,
        ]);
        let mut root = reconcile(None, &tree).node;

        let mut focus = FocusManager::new();
        focus.push_scope(vec![1]);

        let order = focus.focusable_paths(&root);
        assert_eq!(order, vec![vec![1, 0], vec![1, 1]]);

        // tab cycles only inside the scope
        FocusManager::focus_path(&mut root, &[1, 0]);
        focus.focus_next(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1, 1]));
        focus.focus_next(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1, 0]));

        focus.pop_scope();
        focus.focus_next(&mut root);
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1, 1]));
    }

    #[test]
    fn focus_change_marks_both_nodes_dirty() {
        let mut root = tree_with_two_fields();
        let focus = FocusManager::new();
        focus.ensure_focus(&mut root);

        // clear dirt
        for path in all_paths(&root) {
            if let Some(node) = node_at_mut(&mut root, &path) {
                node.base_mut().dirty = false;
            }
        }

        focus.focus_next(&mut root);
        let was = node_at(&root, &[1]).map(|n| n.base().dirty);
        let now = node_at(&root, &[2]).map(|n| n.base().dirty);
        assert_eq!(was, Some(true));
        assert_eq!(now, Some(true));
    }
}
