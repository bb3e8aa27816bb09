// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::any::Any;
use std::fmt;

use crate::input::{Binding, EventContext, EventStatus, KeyEvent, MouseEvent};
use crate::layout::{Constraints, Rect, Size};
use crate::render::RenderSurface;
use crate::widget::Widget;

/// State every node owns regardless of its type: identity tag, layout
/// results, dirty/focus flags, bindings, and the child list.
#[derive(Debug, Default)]
pub struct NodeBase {
    kind: &'static str,
    pub size: Size,
    pub rect: Rect,
    pub dirty: bool,
    pub focused: bool,
    pub hovered: bool,
    pub children: Vec<NodeBox>,
    pub bindings: Vec<Binding>,
}

impl NodeBase {
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            dirty: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.kind
    }

    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// The mutable half of the description/node split.
///
/// A node is created by its description on first reconciliation at a tree
/// position, mutated in place afterwards, and dropped when the description
/// disappears. Node identity across rebuilds is what keeps per-node state
/// (cursor position, scroll offset, focus) alive.
pub trait Node: fmt::Debug {
    fn base(&self) -> &NodeBase;
    fn base_mut(&mut self) -> &mut NodeBase;

    /// Take new configuration from a description of the same kind.
    /// Returns whether anything visible changed. Must not touch children;
    /// the reconciler owns those.
    fn update(&mut self, description: &dyn Widget) -> bool;

    /// Report the preferred size under the given constraints. Containers
    /// measure their children here with adjusted budgets.
    fn measure(&mut self, constraints: Constraints) -> Size;

    /// Assign rectangles to children. The node's own rectangle has already
    /// been stored in its base by the engine.
    fn arrange_children(&mut self, rect: Rect) {
        let _ = rect;
    }

    /// Paint into the surface. Anything outside the node's arranged
    /// rectangle is clipped.
    fn render(&self, surface: &mut RenderSurface);

    fn is_focusable(&self) -> bool {
        false
    }

    fn handle_key(&mut self, event: &KeyEvent, ctx: &mut EventContext) -> EventStatus {
        let _ = (event, ctx);
        EventStatus::NotHandled
    }

    fn handle_mouse(&mut self, event: &MouseEvent, ctx: &mut EventContext) -> EventStatus {
        let _ = (event, ctx);
        EventStatus::NotHandled
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

pub type NodeBox = Box<dyn Node>;

/// Run the measure pass on a node, storing the result in its base.
pub fn measure_node(node: &mut NodeBox, constraints: Constraints) -> Size {
    let size = constraints.constrain(node.measure(constraints));
    node.base_mut().size = size;
    size
}

/// Assign a node's rectangle. A bounds change marks the node dirty even
/// when its configuration is untouched; moving a widget re-renders it.
pub fn arrange_node(node: &mut NodeBox, rect: Rect) {
    if node.base().rect != rect {
        node.base_mut().rect = rect;
        node.base_mut().mark_dirty();
    }
    node.arrange_children(rect);
}

/// Find a node by its path of child indices. An empty path is the root.
#[must_use]
pub fn node_at_mut<'a>(root: &'a mut NodeBox, path: &[usize]) -> Option<&'a mut NodeBox> {
    let mut current = root;
    for &index in path {
        current = current.base_mut().children.get_mut(index)?;
    }
    Some(current)
}

/// Immutable variant of [`node_at_mut`].
#[must_use]
pub fn node_at<'a>(root: &'a NodeBox, path: &[usize]) -> Option<&'a NodeBox> {
    let mut current = root;
    for &index in path {
        current = current.base().children.get(index)?;
    }
    Some(current)
}

/// Pre-order traversal paths of the whole tree.
#[must_use]
pub fn all_paths(root: &NodeBox) -> Vec<Vec<usize>> {
    let mut paths = Vec::new();
    collect_paths(root, &mut Vec::new(), &mut paths);
    paths
}

fn collect_paths(node: &NodeBox, prefix: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
    out.push(prefix.clone());
    for (index, child) in node.base().children.iter().enumerate() {
        prefix.push(index);
        collect_paths(child, prefix, out);
        prefix.pop();
    }
}
