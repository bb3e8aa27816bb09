// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use core::fmt;
use std::rc::Rc;

use hex1b_common::input::{KeyModifiers, MouseButton};

/// A normalized key, after wire decoding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Tab,
    Escape,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    Function(u8),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(key: Key, modifiers: KeyModifiers) -> Self {
        Self { key, modifiers }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Drag(MouseButton),
    Move,
    WheelUp,
    WheelDown,
}

/// A mouse event in 0-based grid coordinates.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MouseEvent {
    pub x: usize,
    pub y: usize,
    pub kind: MouseEventKind,
    pub modifiers: KeyModifiers,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EventStatus {
    Handled,
    NotHandled,
}

/// Mouse conditions a binding can match on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MouseTrigger {
    /// A button press (the click moment).
    Click(MouseButton),
    Up(MouseButton),
    Drag,
    Move,
    WheelUp,
    WheelDown,
}

/// What a binding fires on. Triggers are matched exactly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Trigger {
    Key(Key, KeyModifiers),
    Mouse(MouseTrigger),
}

impl Trigger {
    #[must_use]
    pub fn matches(&self, event: &InputEvent) -> bool {
        match (self, event) {
            (Self::Key(key, modifiers), InputEvent::Key(event)) => {
                *key == event.key && *modifiers == event.modifiers
            }
            (Self::Mouse(trigger), InputEvent::Mouse(event)) => match (trigger, event.kind) {
                (MouseTrigger::Click(button), MouseEventKind::Down(pressed)) => *button == pressed,
                (MouseTrigger::Up(button), MouseEventKind::Up(released)) => *button == released,
                (MouseTrigger::Drag, MouseEventKind::Drag(_))
                | (MouseTrigger::Move, MouseEventKind::Move)
                | (MouseTrigger::WheelUp, MouseEventKind::WheelUp)
                | (MouseTrigger::WheelDown, MouseEventKind::WheelDown) => true,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Side effects an event handler may request from the engine.
#[derive(Debug, Default)]
pub struct EventContext {
    quit: bool,
    needs_frame: bool,
}

impl EventContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the session to shut down cleanly.
    pub const fn quit(&mut self) {
        self.quit = true;
    }

    /// Schedule another frame after this event is processed.
    pub const fn invalidate(&mut self) {
        self.needs_frame = true;
    }

    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit
    }

    #[must_use]
    pub const fn frame_requested(&self) -> bool {
        self.needs_frame
    }
}

pub type BindingHandler = Rc<dyn Fn(&mut EventContext)>;

/// A declarative `{ trigger, action, description }` triple attached to a
/// description. Later bindings on the same node override earlier ones for
/// the same trigger.
#[derive(Clone)]
pub struct Binding {
    pub trigger: Trigger,
    pub description: String,
    handler: BindingHandler,
}

impl Binding {
    pub fn new(
        trigger: Trigger,
        description: impl Into<String>,
        handler: impl Fn(&mut EventContext) + 'static,
    ) -> Self {
        Self {
            trigger,
            description: description.into(),
            handler: Rc::new(handler),
        }
    }

    #[must_use]
    pub fn handler(&self) -> BindingHandler {
        Rc::clone(&self.handler)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("trigger", &self.trigger)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
