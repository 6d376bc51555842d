//! # Inline Spans
//!
//! Emphasis, strikethrough and code spans are symmetric toggles: a delimiter
//! closes the nearest open frame of its kind above the enclosing block, or
//! opens a new one. Closing pops everything above the match, so overlapping
//! input like `**a*b**c*` still yields a tree.
//!
//! Links move through [`LinkState`]:
//!
//! | State | On | Becomes |
//! |-------|----|---------|
//! | `Label` | `]` | `AwaitingUrl` |
//! | `AwaitingUrl` | `(` | `Url("")` |
//! | `AwaitingUrl` | anything else | literal `[label]` text |
//! | `Url(buf)` | text | `Url(buf + text)` |
//! | `Url(buf)` | `)` | committed `link{url}` / `image{url, alt}` |
//! | `Url(buf)` | a line end | literal `[label](buf` text |
//!
//! Images are links whose label is folded into `alt` on commit.

use std::sync::Arc;

use crate::ast::{Node, NodeKind};
use crate::token::TokenKind;

use super::frame::{Frame, FrameKind, LinkState};
use super::{LineBreak, Parser};

/// Tokens that can carry a paragraph on from the previous line.
pub(super) fn continues_paragraph(kind: TokenKind) -> bool {
    kind == TokenKind::Text || is_inline_markup(kind)
}

fn is_inline_markup(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::BoldDelimiter
            | TokenKind::ItalicDelimiter
            | TokenKind::StrikethroughDelimiter
            | TokenKind::CodeDelimiter
            | TokenKind::LinkTextOpen
            | TokenKind::LinkTextClose
            | TokenKind::LinkUrlOpen
            | TokenKind::LinkUrlClose
            | TokenKind::ImageMarker
    )
}

/// Wraps each run of inline children in a paragraph, leaving blocks alone.
fn wrap_inline_runs(node: &mut Node) {
    let mut wrapped = Vec::with_capacity(node.children.len());
    let mut run = Vec::new();
    for child in node.children.drain(..) {
        if child.kind.is_block() {
            if !run.is_empty() {
                wrapped.push(Arc::new(Node {
                    kind: NodeKind::Paragraph,
                    children: std::mem::take(&mut run),
                }));
            }
            wrapped.push(child);
        } else {
            run.push(child);
        }
    }
    if !run.is_empty() {
        wrapped.push(Arc::new(Node {
            kind: NodeKind::Paragraph,
            children: run,
        }));
    }
    node.children = wrapped;
}

impl Parser {
    pub(super) fn top_is(&self, kind: &FrameKind) -> bool {
        self.stack.last().is_some_and(|f| &f.kind == kind)
    }

    /// True when the insertion point takes inline content as it stands.
    pub(super) fn inline_open(&self) -> bool {
        match self.stack.last().map(|f| &f.kind) {
            Some(FrameKind::ListItem { inline_open, .. }) => *inline_open,
            Some(kind) => {
                kind.is_span() || matches!(kind, FrameKind::Paragraph | FrameKind::Heading)
            }
            None => false,
        }
    }

    pub(super) fn set_item_inline(&mut self, open: bool) {
        if let Some(Frame {
            kind: FrameKind::ListItem { inline_open, .. },
            ..
        }) = self.stack.last_mut()
        {
            *inline_open = open;
        }
    }

    /// Makes the insertion point an inline container, opening a paragraph
    /// if needed, and lays down a pending soft break.
    fn inline_target(&mut self) {
        let top = self.stack.last().map(|f| f.kind.clone());
        match top {
            Some(FrameKind::ListItem {
                inline_open: true, ..
            }) => {}
            Some(FrameKind::ListItem { .. }) => {
                let depth = self.stack.len();
                if self.node(depth).children.is_empty() {
                    self.set_item_inline(true);
                } else {
                    wrap_inline_runs(self.node_mut(depth));
                    self.open(FrameKind::Paragraph);
                }
            }
            Some(kind)
                if kind.is_span() || matches!(kind, FrameKind::Paragraph | FrameKind::Heading) => {}
            _ => self.open(FrameKind::Paragraph),
        }
        if self.line_break.take() == Some(LineBreak::Soft) {
            self.top_mut().push_text("\n");
        }
    }

    /// Routes a text run to the URL buffer, the open code span, or the
    /// insertion point.
    pub(super) fn text(&mut self, s: &str) {
        if let Some(Frame {
            link: Some(LinkState::Url(url)),
            ..
        }) = self.stack.last_mut()
        {
            url.push_str(s);
            return;
        }

        if self.top_is(&FrameKind::CodeInline) {
            let newline = self.line_break.take().is_some();
            if let NodeKind::CodeInline { content } = &mut self.top_mut().kind {
                if newline {
                    content.push('\n');
                }
                content.push_str(s);
            }
            return;
        }

        self.inline_target();
        self.top_mut().push_text(s);
    }

    /// Delimiters inside a code span are just code.
    pub(super) fn literal_in_code_span(&mut self, kind: TokenKind, text: &str) -> bool {
        if kind != TokenKind::CodeDelimiter
            && is_inline_markup(kind)
            && self.top_is(&FrameKind::CodeInline)
        {
            self.text(text);
            return true;
        }
        false
    }

    /// Stack position of the first frame above the enclosing block.
    fn span_floor(&self) -> usize {
        self.stack
            .iter()
            .rposition(|f| !f.kind.is_span())
            .map_or(0, |p| p + 1)
    }

    pub(super) fn toggle(&mut self, kind: FrameKind) {
        let floor = self.span_floor();
        let open = self.stack[floor..].iter().rposition(|f| f.kind == kind);
        match open {
            Some(pos) => {
                self.pop_to(floor + pos + 1);
                self.pop_frame(true);
            }
            None => {
                self.inline_target();
                self.open(kind);
            }
        }
    }

    pub(super) fn open_link(&mut self) {
        let kind = if std::mem::take(&mut self.pending_image) {
            FrameKind::Image
        } else {
            FrameKind::Link
        };
        self.inline_target();
        self.open(kind);
    }

    pub(super) fn close_label(&mut self) {
        let floor = self.span_floor();
        let label = self.stack[floor..]
            .iter()
            .rposition(|f| f.link == Some(LinkState::Label));
        match label {
            Some(pos) => {
                self.pop_to(floor + pos + 1);
                if let Some(frame) = self.stack.last_mut() {
                    frame.link = Some(LinkState::AwaitingUrl);
                }
            }
            None => self.text("]"),
        }
    }

    pub(super) fn open_url(&mut self) {
        match self.stack.last_mut() {
            Some(frame) if frame.link == Some(LinkState::AwaitingUrl) => {
                frame.link = Some(LinkState::Url(String::new()));
            }
            _ => self.text("("),
        }
    }

    pub(super) fn close_url(&mut self) {
        if self.collecting_url() {
            self.pop_frame(true);
        } else {
            self.text(")");
        }
    }

    /// Runs before every token outside code: a stray image marker becomes
    /// `!`, and a link that cannot continue with `kind` turns back into text.
    pub(super) fn settle_link(&mut self, kind: TokenKind) {
        if self.pending_image && kind != TokenKind::LinkTextOpen {
            self.pending_image = false;
            self.text("!");
        }
        let broken = match self.stack.last().and_then(|f| f.link.as_ref()) {
            Some(LinkState::AwaitingUrl) => kind != TokenKind::LinkUrlOpen,
            Some(LinkState::Url(_)) => !matches!(
                kind,
                TokenKind::Text | TokenKind::LinkUrlClose | TokenKind::EndOfInput
            ),
            _ => false,
        };
        if broken && let Some(frame) = self.stack.pop() {
            self.degrade_link(&frame.kind, frame.link);
        }
    }

    /// A copy in which a label waiting for its URL has turned back into text,
    /// as it will once ordinary text arrives. The committed tree is untouched.
    pub(crate) fn with_link_settled(&self) -> Self {
        let mut settled = self.clone();
        settled.settle_link(TokenKind::Text);
        settled
    }

    /// Replaces the (already popped) link frame's node with its source text.
    pub(super) fn degrade_link(&mut self, kind: &FrameKind, link: Option<LinkState>) {
        log::trace!("degrading unfinished {kind:?} ({link:?}) to text");
        let depth = self.stack.len();
        let parent = self.node_mut(depth);
        let Some(node) = parent.children.pop() else {
            return;
        };
        parent.push_text(kind.delimiter());
        for child in Arc::unwrap_or_clone(node).children {
            parent.push_child(child);
        }
        match link {
            Some(LinkState::AwaitingUrl) => parent.push_text("]"),
            Some(LinkState::Url(url)) => {
                parent.push_text("](");
                parent.push_text(&url);
            }
            _ => {}
        }
    }

    pub(super) fn commit_link(&mut self, kind: &FrameKind, url: String) {
        let depth = self.stack.len();
        let Some(node) = self.node_mut(depth).last_child_mut() else {
            return;
        };
        if *kind == FrameKind::Image {
            let alt = node.text_content();
            node.kind = NodeKind::Image { url, alt };
            node.children.clear();
        } else {
            node.kind = NodeKind::Link { url };
        }
    }
}
