// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use hex1b_ansi::token::AnsiToken;
use hex1b_grid::sgr::{SgrState, sgr_params_for};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::layout::{Constraints, Rect, Size};
use crate::node::{NodeBox, arrange_node, measure_node};
use crate::reconcile::reconcile;
use crate::widget::Widget;

/// Collects a node's paint operations as tokens, clipped to the node's
/// arranged rectangle.
#[derive(Debug)]
pub struct RenderSurface {
    clip: Rect,
    tokens: Vec<AnsiToken>,
}

impl RenderSurface {
    #[must_use]
    pub const fn new(clip: Rect) -> Self {
        Self {
            clip,
            tokens: Vec::new(),
        }
    }

    #[must_use]
    pub const fn clip(&self) -> Rect {
        self.clip
    }

    /// Write text at absolute grid coordinates. Content outside the clip
    /// rectangle is discarded grapheme by grapheme.
    pub fn put_text(&mut self, x: usize, y: usize, text: &str, style: &SgrState) {
        if y < self.clip.y || y >= self.clip.bottom() || x >= self.clip.right() {
            return;
        }

        let mut column = x;
        let mut visible = String::new();
        let mut start = None;

        for grapheme in text.graphemes(true) {
            let width = UnicodeWidthStr::width(grapheme).max(1);
            if column + width > self.clip.right() {
                break;
            }
            if column >= self.clip.x {
                if start.is_none() {
                    start = Some(column);
                }
                visible.push_str(grapheme);
            }
            column += width;
        }

        let Some(start) = start else {
            return;
        };
        if visible.is_empty() {
            return;
        }

        self.tokens.push(AnsiToken::CursorPosition {
            row: y + 1,
            col: start + 1,
            original_params: None,
        });
        self.tokens.push(AnsiToken::Sgr(sgr_params_for(style)));
        self.tokens.push(AnsiToken::Text(visible));
    }

    /// Fill a rectangle with one character.
    pub fn fill(&mut self, rect: Rect, c: char, style: &SgrState) {
        let target = rect.intersection(&self.clip);
        if target.is_empty() {
            return;
        }

        let line: String = std::iter::repeat_n(c, target.width).collect();
        for y in target.y..target.bottom() {
            self.put_text(target.x, y, &line, style);
        }
    }

    #[must_use]
    pub fn into_tokens(self) -> Vec<AnsiToken> {
        self.tokens
    }
}

/// Drives the build → reconcile → measure → arrange → render cycle and
/// emits each frame between bracket markers.
#[derive(Debug)]
pub struct RenderEngine {
    root: Option<NodeBox>,
    width: usize,
    height: usize,
}

impl RenderEngine {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self {
            root: None,
            width,
            height,
        }
    }

    #[must_use]
    pub const fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    #[must_use]
    pub const fn root(&self) -> Option<&NodeBox> {
        self.root.as_ref()
    }

    #[must_use]
    pub const fn root_mut(&mut self) -> Option<&mut NodeBox> {
        self.root.as_mut()
    }

    /// A new terminal size invalidates the whole tree.
    pub fn set_size(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        if let Some(root) = self.root.as_mut() {
            mark_subtree_dirty(root);
        }
    }

    /// Run one frame against a freshly built description tree.
    ///
    /// Clean nodes with unchanged bounds emit nothing; their previously
    /// emitted cells remain in the committed state downstream.
    pub fn render_frame(&mut self, description: &dyn Widget) -> Vec<AnsiToken> {
        let outcome = reconcile(self.root.take(), description);
        let mut root = outcome.node;

        let mut tokens = vec![AnsiToken::FrameBegin];

        let full = Size {
            width: self.width,
            height: self.height,
        };
        measure_node(&mut root, Constraints::loose(full));
        arrange_node(&mut root, Rect::new(0, 0, self.width, self.height));

        render_node(&mut root, &mut tokens);

        tokens.push(AnsiToken::FrameEnd);
        self.root = Some(root);
        tokens
    }
}

/// Pre-order render, gated per node on `dirty` (which bounds changes set).
fn render_node(node: &mut NodeBox, out: &mut Vec<AnsiToken>) {
    if node.base().dirty {
        let mut surface = RenderSurface::new(node.base().rect);
        node.render(&mut surface);
        out.extend(surface.into_tokens());
        node.base_mut().dirty = false;
    }

    for child in &mut node.base_mut().children {
        render_node(child, out);
    }
}

fn mark_subtree_dirty(node: &mut NodeBox) {
    node.base_mut().mark_dirty();
    for child in &mut node.base_mut().children {
        mark_subtree_dirty(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_text_clips_to_the_rect() {
        let mut surface = RenderSurface::new(Rect::new(2, 1, 4, 2));
        surface.put_text(0, 0, "above", &SgrState::default());
        surface.put_text(2, 1, "abcdefgh", &SgrState::default());

        let tokens = surface.into_tokens();
        // the first write was entirely outside; the second truncated
        assert_eq!(
            tokens,
            vec![
                AnsiToken::CursorPosition {
                    row: 2,
                    col: 3,
                    original_params: None,
                },
                AnsiToken::Sgr("0".to_string()),
                AnsiToken::Text("abcd".to_string()),
            ]
        );
    }

    #[test]
    fn put_text_clips_left_edge() {
        let mut surface = RenderSurface::new(Rect::new(3, 0, 3, 1));
        surface.put_text(1, 0, "abcdef", &SgrState::default());

        let tokens = surface.into_tokens();
        assert_eq!(tokens[0], AnsiToken::CursorPosition {
            row: 1,
            col: 4,
            original_params: None,
        });
        assert_eq!(tokens[2], AnsiToken::Text("cde".to_string()));
    }

    #[test]
    fn wide_graphemes_do_not_straddle_the_clip() {
        let mut surface = RenderSurface::new(Rect::new(0, 0, 3, 1));
        surface.put_text(0, 0, "aあb", &SgrState::default());

        let tokens = surface.into_tokens();
        // "a" (1) + "あ" (2) fit exactly; "b" is clipped
        assert_eq!(tokens[2], AnsiToken::Text("aあ".to_string()));
    }

    #[test]
    fn frames_are_bracketed() {
        use crate::widgets::Label;

        let mut engine = RenderEngine::new(20, 4);
        let tokens = engine.render_frame(&Label::new("hi"));

        assert_eq!(tokens.first(), Some(&AnsiToken::FrameBegin));
        assert_eq!(tokens.last(), Some(&AnsiToken::FrameEnd));
        assert!(tokens.iter().any(|t| matches!(t, AnsiToken::Text(text) if text == "hi")));
    }

    #[test]
    fn clean_second_frame_emits_only_brackets() {
        use crate::widgets::Label;

        let mut engine = RenderEngine::new(20, 4);
        let _ = engine.render_frame(&Label::new("hi"));
        let tokens = engine.render_frame(&Label::new("hi"));

        assert_eq!(tokens, vec![AnsiToken::FrameBegin, AnsiToken::FrameEnd]);
    }
}
