// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

pub mod binding;
pub mod decode;
pub mod encode;
pub mod focus;
pub mod router;

pub use binding::{
    Binding, EventContext, EventStatus, InputEvent, Key, KeyEvent, MouseEvent, MouseEventKind,
    MouseTrigger, Trigger,
};
pub use decode::events_from_tokens;
pub use focus::FocusManager;
pub use router::InputRouter;
