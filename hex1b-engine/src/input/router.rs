// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_common::input::KeyModifiers;

use super::binding::{
    EventContext, EventStatus, InputEvent, Key, KeyEvent, MouseEvent, MouseEventKind,
};
use super::focus::FocusManager;
use crate::node::{NodeBox, all_paths, node_at, node_at_mut};

/// Routes key events along the focus chain and mouse events along the
/// hit-test chain.
#[derive(Debug, Default)]
pub struct InputRouter {
    pub focus: FocusManager,
}

impl InputRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch one event. `Handled` means some binding or node consumed
    /// it; `NotHandled` leaves it to the session's defaults (e.g. Ctrl+C).
    pub fn dispatch(
        &mut self,
        root: &mut NodeBox,
        event: &InputEvent,
        ctx: &mut EventContext,
    ) -> EventStatus {
        match event {
            InputEvent::Key(key) => self.dispatch_key(root, key, ctx),
            InputEvent::Mouse(mouse) => Self::dispatch_mouse(root, mouse, ctx),
        }
    }

    /// Key routing: try the focused node first, then walk up its ancestor
    /// chain. At each node the declarative bindings run before the node's
    /// own handler; later bindings override earlier ones for the same
    /// trigger.
    fn dispatch_key(
        &mut self,
        root: &mut NodeBox,
        event: &KeyEvent,
        ctx: &mut EventContext,
    ) -> EventStatus {
        self.focus.ensure_focus(root);
        let path = FocusManager::focused_path(root).unwrap_or_default();

        for depth in (0..=path.len()).rev() {
            let sub_path = &path[..depth];
            if Self::try_node(root, sub_path, &InputEvent::Key(*event), ctx) == EventStatus::Handled
            {
                return EventStatus::Handled;
            }
            if let Some(node) = node_at_mut(root, sub_path) {
                if node.handle_key(event, ctx) == EventStatus::Handled {
                    return EventStatus::Handled;
                }
            }
        }

        // Focus traversal defaults.
        if event.key == Key::Tab {
            if event.modifiers.contains(KeyModifiers::SHIFT) {
                self.focus.focus_previous(root);
            } else {
                self.focus.focus_next(root);
            }
            ctx.invalidate();
            return EventStatus::Handled;
        }

        EventStatus::NotHandled
    }

    /// Mouse routing: hit-test from the root, descending into the deepest
    /// child whose rectangle contains the point, then bubble up from there.
    fn dispatch_mouse(
        root: &mut NodeBox,
        event: &MouseEvent,
        ctx: &mut EventContext,
    ) -> EventStatus {
        let path = hit_test(root, event.x, event.y);

        if event.kind == MouseEventKind::Move {
            update_hover(root, &path);
        }

        // A click transfers focus to the deepest focusable node on the hit
        // chain.
        if let MouseEventKind::Down(_) = event.kind {
            for depth in (0..=path.len()).rev() {
                let sub_path = &path[..depth];
                if node_at(root, sub_path).is_some_and(|node| node.is_focusable()) {
                    FocusManager::focus_path(root, sub_path);
                    ctx.invalidate();
                    break;
                }
            }
        }

        for depth in (0..=path.len()).rev() {
            let sub_path = &path[..depth];
            if Self::try_node(root, sub_path, &InputEvent::Mouse(*event), ctx)
                == EventStatus::Handled
            {
                return EventStatus::Handled;
            }
            if let Some(node) = node_at_mut(root, sub_path) {
                if node.handle_mouse(event, ctx) == EventStatus::Handled {
                    return EventStatus::Handled;
                }
            }
        }

        EventStatus::NotHandled
    }

    /// Run the first matching binding on the node at `path`, if any.
    fn try_node(
        root: &mut NodeBox,
        path: &[usize],
        event: &InputEvent,
        ctx: &mut EventContext,
    ) -> EventStatus {
        let handler = node_at(root, path).and_then(|node| {
            node.base()
                .bindings
                .iter()
                .rev()
                .find(|binding| binding.trigger.matches(event))
                .map(super::binding::Binding::handler)
        });

        handler.map_or(EventStatus::NotHandled, |handler| {
            handler(ctx);
            EventStatus::Handled
        })
    }
}

/// Path of the deepest node containing the point. Later siblings are
/// rendered on top, so they are tested first.
#[must_use]
pub fn hit_test(root: &NodeBox, x: usize, y: usize) -> Vec<usize> {
    let mut path = Vec::new();

    if !root.base().rect.contains(x, y) {
        return path;
    }

    let mut current: &NodeBox = root;
    loop {
        let mut descended = false;
        for (index, child) in current.base().children.iter().enumerate().rev() {
            if child.base().rect.contains(x, y) {
                path.push(index);
                current = child;
                descended = true;
                break;
            }
        }
        if !descended {
            return path;
        }
    }
}

/// Hover tracking: the hit node gains `hovered`, everything else loses it.
/// Flipped nodes are marked dirty.
fn update_hover(root: &mut NodeBox, hovered: &[usize]) {
    for candidate in all_paths(root) {
        let is_target = candidate == hovered;
        if let Some(node) = node_at_mut(root, &candidate) {
            if node.base().hovered != is_target {
                node.base_mut().hovered = is_target;
                node.base_mut().mark_dirty();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::binding::{Binding, MouseTrigger, Trigger};
    use crate::layout::{Constraints, Rect};
    use crate::node::{arrange_node, measure_node};
    use crate::reconcile::reconcile;
    use crate::widget::{Widget, WidgetBox};
    use crate::widgets::{Label, TextField, VStack};
    use hex1b_common::input::MouseButton;
    use std::cell::Cell;
    use std::rc::Rc;

    fn build(description: &dyn Widget, width: usize, height: usize) -> NodeBox {
        let mut node = reconcile(None, description).node;
        measure_node(
            &mut node,
            Constraints::loose(crate::layout::Size::new(width, height)),
        );
        arrange_node(&mut node, Rect::new(0, 0, width, height));
        node
    }

    #[test]
    fn focused_node_consumes_typing() {
        let tree = VStack::new(vec![Box::new(TextField::new(10)) as WidgetBox]);
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        let status = router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::plain(Key::Char('h'))),
            &mut ctx,
        );
        assert_eq!(status, EventStatus::Handled);
    }

    #[test]
    fn unhandled_keys_bubble_to_ancestor_bindings() {
        let fired = Rc::new(Cell::new(false));
        let seen = Rc::clone(&fired);

        let tree = VStack::new(vec![Box::new(TextField::new(10)) as WidgetBox]).with_binding(
            Binding::new(
                Trigger::Key(Key::Function(2), KeyModifiers::empty()),
                "help",
                move |_| seen.set(true),
            ),
        );
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        let status = router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::plain(Key::Function(2))),
            &mut ctx,
        );
        assert_eq!(status, EventStatus::Handled);
        assert!(fired.get());
    }

    #[test]
    fn later_bindings_override_earlier_ones() {
        let which = Rc::new(Cell::new(0));
        let first = Rc::clone(&which);
        let second = Rc::clone(&which);

        let tree = VStack::new(vec![])
            .with_binding(Binding::new(
                Trigger::Key(Key::Enter, KeyModifiers::empty()),
                "first",
                move |_| first.set(1),
            ))
            .with_binding(Binding::new(
                Trigger::Key(Key::Enter, KeyModifiers::empty()),
                "second",
                move |_| second.set(2),
            ));
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::plain(Key::Enter)),
            &mut ctx,
        );
        assert_eq!(which.get(), 2);
    }

    #[test]
    fn tab_moves_focus_between_fields() {
        let tree = VStack::new(vec![
            Box::new(TextField::new(10)) as WidgetBox,
            Box::new(TextField::new(10)) as WidgetBox,
        ]);
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::plain(Key::Char('x'))),
            &mut ctx,
        );
        assert_eq!(FocusManager::focused_path(&root), Some(vec![0]));

        router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::plain(Key::Tab)),
            &mut ctx,
        );
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1]));

        router.dispatch(
            &mut root,
            &InputEvent::Key(KeyEvent::with_modifiers(Key::Tab, KeyModifiers::SHIFT)),
            &mut ctx,
        );
        assert_eq!(FocusManager::focused_path(&root), Some(vec![0]));
    }

    #[test]
    fn hit_test_finds_the_deepest_child() {
        let tree = VStack::new(vec![
            Box::new(Label::new("top")) as WidgetBox,
            Box::new(Label::new("bottom")) as WidgetBox,
        ]);
        let root = build(&tree, 20, 4);

        assert_eq!(hit_test(&root, 1, 0), vec![0]);
        assert_eq!(hit_test(&root, 1, 1), vec![1]);
        // outside every child but inside the stack
        assert_eq!(hit_test(&root, 1, 3), Vec::<usize>::new());
    }

    #[test]
    fn click_transfers_focus() {
        let tree = VStack::new(vec![
            Box::new(TextField::new(10)) as WidgetBox,
            Box::new(TextField::new(10)) as WidgetBox,
        ]);
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        router.dispatch(
            &mut root,
            &InputEvent::Mouse(MouseEvent {
                x: 2,
                y: 1,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers: KeyModifiers::empty(),
            }),
            &mut ctx,
        );
        assert_eq!(FocusManager::focused_path(&root), Some(vec![1]));
    }

    #[test]
    fn move_updates_hover() {
        let tree = VStack::new(vec![
            Box::new(Label::new("a")) as WidgetBox,
            Box::new(Label::new("b")) as WidgetBox,
        ]);
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        let hover = |x, y| InputEvent::Mouse(MouseEvent {
            x,
            y,
            kind: MouseEventKind::Move,
            modifiers: KeyModifiers::empty(),
        });

        router.dispatch(&mut root, &hover(0, 0), &mut ctx);
        assert!(node_at(&root, &[0]).is_some_and(|n| n.base().hovered));
        assert!(node_at(&root, &[1]).is_some_and(|n| !n.base().hovered));

        router.dispatch(&mut root, &hover(0, 1), &mut ctx);
        assert!(node_at(&root, &[0]).is_some_and(|n| !n.base().hovered));
        assert!(node_at(&root, &[1]).is_some_and(|n| n.base().hovered));
    }

    #[test]
    fn mouse_click_binding_fires() {
        let fired = Rc::new(Cell::new(false));
        let seen = Rc::clone(&fired);

        let tree = VStack::new(vec![Box::new(
            Label::new("button").with_binding(Binding::new(
                Trigger::Mouse(MouseTrigger::Click(MouseButton::Left)),
                "press",
                move |_| seen.set(true),
            )),
        ) as WidgetBox]);
        let mut root = build(&tree, 20, 4);
        let mut router = InputRouter::new();
        let mut ctx = EventContext::new();

        router.dispatch(
            &mut root,
            &InputEvent::Mouse(MouseEvent {
                x: 2,
                y: 0,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers: KeyModifiers::empty(),
            }),
            &mut ctx,
        );
        assert!(fired.get());
    }
}
