// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The primitive description/node pairs the engine needs to exercise its
//! own contract: a text label, an editable field, stacking containers, and
//! a draggable splitter. The widget library proper lives elsewhere; these
//! are deliberately minimal.

use std::any::Any;

use hex1b_common::attributes::CellAttributes;
use hex1b_grid::sgr::SgrState;
use unicode_width::UnicodeWidthStr;

use crate::input::{Binding, EventContext, EventStatus, Key, KeyEvent, MouseEvent, MouseEventKind};
use crate::layout::{Constraints, Rect, Size};
use crate::node::{Node, NodeBase, NodeBox, arrange_node, measure_node};
use crate::render::RenderSurface;
use crate::widget::{Widget, WidgetBox};
use hex1b_common::input::MouseButton;

// ----------------------------------------------------------------------
// Label
// ----------------------------------------------------------------------

/// A single line of styled text.
#[derive(Debug)]
pub struct Label {
    text: String,
    style: SgrState,
    bindings: Vec<Binding>,
}

impl Label {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SgrState::default(),
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_style(mut self, style: SgrState) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl Widget for Label {
    fn kind(&self) -> &'static str {
        "label"
    }

    fn create_node(&self) -> NodeBox {
        Box::new(LabelNode {
            base: NodeBase::new("label"),
            text: self.text.clone(),
            style: self.style,
        })
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn same_config(&self, other: &dyn Widget) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.text == self.text && other.style == self.style)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct LabelNode {
    base: NodeBase,
    text: String,
    style: SgrState,
}

impl Node for LabelNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn update(&mut self, description: &dyn Widget) -> bool {
        let Some(description) = description.as_any().downcast_ref::<Label>() else {
            return false;
        };
        let changed = self.text != description.text || self.style != description.style;
        self.text.clone_from(&description.text);
        self.style = description.style;
        changed
    }

    fn measure(&mut self, constraints: Constraints) -> Size {
        constraints.constrain(Size::new(UnicodeWidthStr::width(self.text.as_str()), 1))
    }

    fn render(&self, surface: &mut RenderSurface) {
        let rect = self.base.rect;
        surface.put_text(rect.x, rect.y, &self.text, &self.style);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ----------------------------------------------------------------------
// TextField
// ----------------------------------------------------------------------

/// A single-line editable input. The edited value and cursor live on the
/// node, so they survive description rebuilds.
#[derive(Debug)]
pub struct TextField {
    width_hint: usize,
    bindings: Vec<Binding>,
}

impl TextField {
    #[must_use]
    pub const fn new(width_hint: usize) -> Self {
        Self {
            width_hint,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl Widget for TextField {
    fn kind(&self) -> &'static str {
        "text-field"
    }

    fn create_node(&self) -> NodeBox {
        Box::new(TextFieldNode {
            base: NodeBase::new("text-field"),
            width_hint: self.width_hint,
            value: String::new(),
            cursor: 0,
        })
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn same_config(&self, other: &dyn Widget) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.width_hint == self.width_hint)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct TextFieldNode {
    base: NodeBase,
    width_hint: usize,
    value: String,
    /// Cursor as a character offset into `value`.
    cursor: usize,
}

impl TextFieldNode {
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_offset)
            .map_or(self.value.len(), |(idx, _)| idx)
    }
}

impl Node for TextFieldNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn update(&mut self, description: &dyn Widget) -> bool {
        let Some(description) = description.as_any().downcast_ref::<TextField>() else {
            return false;
        };
        let changed = self.width_hint != description.width_hint;
        self.width_hint = description.width_hint;
        changed
    }

    fn measure(&mut self, constraints: Constraints) -> Size {
        constraints.constrain(Size::new(self.width_hint.max(4), 1))
    }

    fn render(&self, surface: &mut RenderSurface) {
        let rect = self.base.rect;
        let style = SgrState::default();

        // pad to the field's width so stale characters are overwritten
        let mut display = self.value.clone();
        let used = UnicodeWidthStr::width(display.as_str());
        for _ in used..rect.width {
            display.push(' ');
        }
        surface.put_text(rect.x, rect.y, &display, &style);

        if self.base.focused {
            // draw the cursor cell in reverse video
            let prefix: String = self.value.chars().take(self.cursor).collect();
            let cursor_x = rect.x + UnicodeWidthStr::width(prefix.as_str());
            let under: String = self
                .value
                .chars()
                .nth(self.cursor)
                .map_or_else(|| " ".to_string(), |c| c.to_string());
            let cursor_style = SgrState {
                attributes: CellAttributes::REVERSE,
                ..SgrState::default()
            };
            surface.put_text(cursor_x, rect.y, &under, &cursor_style);
        }
    }

    fn is_focusable(&self) -> bool {
        true
    }

    fn handle_key(&mut self, event: &KeyEvent, ctx: &mut EventContext) -> EventStatus {
        if !event.modifiers.is_empty() {
            return EventStatus::NotHandled;
        }

        let handled = match event.key {
            Key::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            Key::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            Key::Delete => {
                if self.cursor < self.value.chars().count() {
                    let at = self.byte_offset(self.cursor);
                    self.value.remove(at);
                }
                true
            }
            Key::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            Key::Right => {
                self.cursor = (self.cursor + 1).min(self.value.chars().count());
                true
            }
            Key::Home => {
                self.cursor = 0;
                true
            }
            Key::End => {
                self.cursor = self.value.chars().count();
                true
            }
            _ => false,
        };

        if handled {
            self.base.mark_dirty();
            ctx.invalidate();
            EventStatus::Handled
        } else {
            EventStatus::NotHandled
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ----------------------------------------------------------------------
// VStack / HStack
// ----------------------------------------------------------------------

/// Stacks children top to bottom. Each child is offered the full width and
/// the height budget left over by its earlier siblings.
#[derive(Debug)]
pub struct VStack {
    children: Vec<WidgetBox>,
    bindings: Vec<Binding>,
}

impl VStack {
    #[must_use]
    pub fn new(children: Vec<WidgetBox>) -> Self {
        Self {
            children,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl Widget for VStack {
    fn kind(&self) -> &'static str {
        "vstack"
    }

    fn create_node(&self) -> NodeBox {
        Box::new(VStackNode {
            base: NodeBase::new("vstack"),
        })
    }

    fn children(&self) -> &[WidgetBox] {
        &self.children
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn same_config(&self, other: &dyn Widget) -> bool {
        // configuration is the child list, which reconciles separately
        other.as_any().downcast_ref::<Self>().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct VStackNode {
    base: NodeBase,
}

impl Node for VStackNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn update(&mut self, _description: &dyn Widget) -> bool {
        false
    }

    fn measure(&mut self, constraints: Constraints) -> Size {
        let mut used = 0;
        let mut widest = 0;

        for child in &mut self.base.children {
            let remaining = constraints.shrink_height(used);
            let size = measure_node(child, remaining);
            used = (used + size.height).min(constraints.max_height);
            widest = widest.max(size.width);
        }

        constraints.constrain(Size::new(widest, used))
    }

    fn arrange_children(&mut self, rect: Rect) {
        let mut y = rect.y;
        for child in &mut self.base.children {
            let remaining = rect.bottom().saturating_sub(y);
            let height = child.base().size.height.min(remaining);
            arrange_node(child, Rect::new(rect.x, y, rect.width, height));
            y += height;
        }
    }

    fn render(&self, _surface: &mut RenderSurface) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Stacks children left to right.
#[derive(Debug)]
pub struct HStack {
    children: Vec<WidgetBox>,
    bindings: Vec<Binding>,
}

impl HStack {
    #[must_use]
    pub fn new(children: Vec<WidgetBox>) -> Self {
        Self {
            children,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl Widget for HStack {
    fn kind(&self) -> &'static str {
        "hstack"
    }

    fn create_node(&self) -> NodeBox {
        Box::new(HStackNode {
            base: NodeBase::new("hstack"),
        })
    }

    fn children(&self) -> &[WidgetBox] {
        &self.children
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn same_config(&self, other: &dyn Widget) -> bool {
        other.as_any().downcast_ref::<Self>().is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct HStackNode {
    base: NodeBase,
}

impl Node for HStackNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn update(&mut self, _description: &dyn Widget) -> bool {
        false
    }

    fn measure(&mut self, constraints: Constraints) -> Size {
        let mut used = 0;
        let mut tallest = 0;

        for child in &mut self.base.children {
            let remaining = constraints.shrink_width(used);
            let size = measure_node(child, remaining);
            used = (used + size.width).min(constraints.max_width);
            tallest = tallest.max(size.height);
        }

        constraints.constrain(Size::new(used, tallest))
    }

    fn arrange_children(&mut self, rect: Rect) {
        let mut x = rect.x;
        for child in &mut self.base.children {
            let remaining = rect.right().saturating_sub(x);
            let width = child.base().size.width.min(remaining);
            arrange_node(child, Rect::new(x, rect.y, width, rect.height));
            x += width;
        }
    }

    fn render(&self, _surface: &mut RenderSurface) {}

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ----------------------------------------------------------------------
// Splitter
// ----------------------------------------------------------------------

/// Two panes with a draggable vertical divider between them. The divider
/// position is node state, so it survives rebuilds.
#[derive(Debug)]
pub struct Splitter {
    children: Vec<WidgetBox>,
    initial_position: usize,
    bindings: Vec<Binding>,
}

impl Splitter {
    #[must_use]
    pub fn new(left: WidgetBox, right: WidgetBox, initial_position: usize) -> Self {
        Self {
            children: vec![left, right],
            initial_position,
            bindings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl Widget for Splitter {
    fn kind(&self) -> &'static str {
        "splitter"
    }

    fn create_node(&self) -> NodeBox {
        Box::new(SplitterNode {
            base: NodeBase::new("splitter"),
            position: self.initial_position,
            dragging: false,
        })
    }

    fn children(&self) -> &[WidgetBox] {
        &self.children
    }

    fn bindings(&self) -> Vec<Binding> {
        self.bindings.clone()
    }

    fn same_config(&self, other: &dyn Widget) -> bool {
        other
            .as_any()
            .downcast_ref::<Self>()
            .is_some_and(|other| other.initial_position == self.initial_position)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct SplitterNode {
    base: NodeBase,
    position: usize,
    dragging: bool,
}

impl SplitterNode {
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    fn divider_x(&self) -> usize {
        self.base.rect.x + self.clamped_position()
    }

    fn clamped_position(&self) -> usize {
        let width = self.base.rect.width;
        if width < 3 {
            return 1;
        }
        self.position.clamp(1, width - 2)
    }
}

impl Node for SplitterNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn update(&mut self, description: &dyn Widget) -> bool {
        // the live position is node state; a changed initial position does
        // not yank the divider out from under the user
        let _ = description;
        false
    }

    fn measure(&mut self, constraints: Constraints) -> Size {
        let full = Size::new(constraints.max_width, constraints.max_height);
        let position = self.position.min(full.width.saturating_sub(2)).max(1);

        let left = Constraints::loose(Size::new(position, full.height));
        let right = Constraints::loose(Size::new(
            full.width.saturating_sub(position + 1),
            full.height,
        ));

        let mut children = self.base.children.iter_mut();
        if let Some(child) = children.next() {
            measure_node(child, left);
        }
        if let Some(child) = children.next() {
            measure_node(child, right);
        }

        full
    }

    fn arrange_children(&mut self, rect: Rect) {
        let position = self.clamped_position();

        let left = Rect::new(rect.x, rect.y, position, rect.height);
        let right = Rect::new(
            rect.x + position + 1,
            rect.y,
            rect.width.saturating_sub(position + 1),
            rect.height,
        );

        let mut children = self.base.children.iter_mut();
        if let Some(child) = children.next() {
            arrange_node(child, left);
        }
        if let Some(child) = children.next() {
            arrange_node(child, right);
        }
    }

    fn render(&self, surface: &mut RenderSurface) {
        let rect = self.base.rect;
        let style = SgrState::default();

        // repaint the pane background so a moved divider leaves nothing
        // behind; dirty children paint over this afterwards
        surface.fill(rect, ' ', &style);

        let divider = Rect::new(self.divider_x(), rect.y, 1, rect.height);
        surface.fill(divider, '│', &style);
    }

    fn handle_mouse(&mut self, event: &MouseEvent, ctx: &mut EventContext) -> EventStatus {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) if event.x == self.divider_x() => {
                self.dragging = true;
                EventStatus::Handled
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                let relative = event.x.saturating_sub(self.base.rect.x);
                let width = self.base.rect.width;
                if width >= 3 {
                    self.position = relative.clamp(1, width - 2);
                }
                self.base.mark_dirty();
                ctx.invalidate();
                EventStatus::Handled
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                self.dragging = false;
                EventStatus::Handled
            }
            _ => EventStatus::NotHandled,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::reconcile::reconcile;

    fn layout(description: &dyn Widget, width: usize, height: usize) -> NodeBox {
        let mut node = reconcile(None, description).node;
        measure_node(&mut node, Constraints::loose(Size::new(width, height)));
        arrange_node(&mut node, Rect::new(0, 0, width, height));
        node
    }

    #[test]
    fn descriptions_compare_by_kind_and_configuration() {
        let a = Label::new("same");
        let b = Label::new("same");
        let c = Label::new("different");
        assert!(a.same_config(&b));
        assert!(!a.same_config(&c));
        // different kinds never compare equal
        assert!(!a.same_config(&TextField::new(8)));
        assert!(TextField::new(8).same_config(&TextField::new(8)));
        assert!(!TextField::new(8).same_config(&TextField::new(9)));
    }

    #[test]
    fn vstack_assigns_rows_top_down() {
        let tree = VStack::new(vec![
            Box::new(Label::new("one")) as WidgetBox,
            Box::new(Label::new("two")) as WidgetBox,
        ]);
        let node = layout(&tree, 20, 5);

        assert_eq!(node.base().children[0].base().rect, Rect::new(0, 0, 20, 1));
        assert_eq!(node.base().children[1].base().rect, Rect::new(0, 1, 20, 1));
    }

    #[test]
    fn hstack_assigns_columns_left_right() {
        let tree = HStack::new(vec![
            Box::new(Label::new("abc")) as WidgetBox,
            Box::new(Label::new("de")) as WidgetBox,
        ]);
        let node = layout(&tree, 20, 2);

        assert_eq!(node.base().children[0].base().rect, Rect::new(0, 0, 3, 2));
        assert_eq!(node.base().children[1].base().rect, Rect::new(3, 0, 2, 2));
    }

    #[test]
    fn text_field_editing() {
        let mut node = TextFieldNode {
            base: NodeBase::new("text-field"),
            width_hint: 10,
            value: String::new(),
            cursor: 0,
        };
        let mut ctx = EventContext::new();

        for c in "hey".chars() {
            node.handle_key(&KeyEvent::plain(Key::Char(c)), &mut ctx);
        }
        assert_eq!(node.value(), "hey");
        assert_eq!(node.cursor(), 3);

        node.handle_key(&KeyEvent::plain(Key::Left), &mut ctx);
        node.handle_key(&KeyEvent::plain(Key::Backspace), &mut ctx);
        assert_eq!(node.value(), "hy");
        assert_eq!(node.cursor(), 1);

        node.handle_key(&KeyEvent::plain(Key::Char('e')), &mut ctx);
        assert_eq!(node.value(), "hey");
    }

    #[test]
    fn splitter_divides_and_drags() {
        let tree = Splitter::new(
            Box::new(Label::new("left")) as WidgetBox,
            Box::new(Label::new("right")) as WidgetBox,
            21,
        );
        let mut node = layout(&tree, 80, 10);

        assert_eq!(node.base().children[0].base().rect.width, 21);
        assert_eq!(node.base().children[1].base().rect.x, 22);

        let mut ctx = EventContext::new();
        let down = MouseEvent {
            x: 21,
            y: 5,
            kind: MouseEventKind::Down(MouseButton::Left),
            modifiers: hex1b_common::input::KeyModifiers::empty(),
        };
        let drag = MouseEvent {
            x: 31,
            y: 5,
            kind: MouseEventKind::Drag(MouseButton::Left),
            modifiers: hex1b_common::input::KeyModifiers::empty(),
        };

        assert_eq!(node.handle_mouse(&down, &mut ctx), EventStatus::Handled);
        assert_eq!(node.handle_mouse(&drag, &mut ctx), EventStatus::Handled);

        let splitter = node.as_any().downcast_ref::<SplitterNode>().unwrap();
        assert_eq!(splitter.position(), 31);
    }

    #[test]
    fn splitter_clamps_drags_to_the_rect() {
        let tree = Splitter::new(
            Box::new(Label::new("l")) as WidgetBox,
            Box::new(Label::new("r")) as WidgetBox,
            5,
        );
        let mut node = layout(&tree, 10, 4);
        let mut ctx = EventContext::new();

        node.handle_mouse(
            &MouseEvent {
                x: 5,
                y: 0,
                kind: MouseEventKind::Down(MouseButton::Left),
                modifiers: hex1b_common::input::KeyModifiers::empty(),
            },
            &mut ctx,
        );
        node.handle_mouse(
            &MouseEvent {
                x: 99,
                y: 0,
                kind: MouseEventKind::Drag(MouseButton::Left),
                modifiers: hex1b_common::input::KeyModifiers::empty(),
            },
            &mut ctx,
        );

        let splitter = node.as_any().downcast_ref::<SplitterNode>().unwrap();
        assert_eq!(splitter.position(), 8);
    }
}
