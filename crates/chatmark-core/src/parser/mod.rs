//! # Parser - Pushdown Tree Construction
//!
//! The second pipeline stage. Tokens arrive one at a time and the parser
//! mutates a persistent document tree in place, never re-deriving it.
//!
//! ## The Frame Stack
//!
//! Open constructs (an unclosed `**`, a paragraph, a list item, a link still
//! collecting its label) sit on an explicit stack of [`Frame`]s. Every frame's
//! node is the *last* child of the node below it, so the stack is exactly the
//! rightmost spine of the tree:
//!
//! ```text
//! document
//! ├── heading            (closed)
//! └── paragraph          ← frame 0
//!     ├── text "See "
//!     └── strong         ← frame 1 (top: the insertion point)
//!         └── text "this"
//! ```
//!
//! Reaching the insertion point walks the spine through [`Arc::make_mut`],
//! which only copies nodes that a tentative view still shares.
//!
//! ## Line Structure
//!
//! Block structure is decided at line starts. `BlockquoteMarker` and `Indent`
//! tokens are recorded, and the first real token of the line reconciles open
//! blockquotes and list items against them (see [`block`]).
//!
//! | Line end token | Effect |
//! |----------------|--------|
//! | `SoftBreak` | closes a heading; in a paragraph, the next line joins with `"\n"` |
//! | `HardBreak` | as `SoftBreak`, plus a `hard_break` node |
//! | `Newline` | blank line: closes the paragraph; in code, a content line break |
//!
//! ## Leniency
//!
//! Nothing here fails. Unclosed emphasis survives as a node, overlapping
//! delimiters close everything above the match, labels that never get a URL
//! turn back into their literal text. See [`inline`].
//!
//! ```
//! use chatmark_core::parser::Parser;
//! use chatmark_core::token::{Token, TokenKind};
//!
//! let mut parser = Parser::new();
//! parser.accept(Token::new(TokenKind::BoldDelimiter, "**", 0));
//! parser.accept(Token::new(TokenKind::Text, "hi", 2));
//! parser.flush();
//! assert_eq!(parser.get_ast().text_content(), "hi");
//! ```

mod block;
mod frame;
mod inline;

use std::sync::Arc;

use crate::ast::{Node, NodeKind, Tree};
use crate::options::ParserOptions;
use crate::token::{Token, TokenKind, TokenMeta};

use frame::{Frame, FrameKind, LinkState};

/// How the previous content line ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineBreak {
    Soft,
    Hard,
}

#[derive(Debug, Clone)]
pub struct Parser {
    options: ParserOptions,
    root: Tree,
    stack: Vec<Frame>,
    at_line_start: bool,
    line_quotes: usize,
    line_indent: usize,
    /// Set by a line end inside a paragraph: the awaiting-second-newline state.
    line_break: Option<LineBreak>,
    after_blank: bool,
    /// `(value, width)` of a `ListNumber` waiting for its marker.
    pending_number: Option<(u64, usize)>,
    pending_image: bool,
    code_newline_pending: bool,
    awaiting_language: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            root: Arc::new(Node::document()),
            stack: Vec::new(),
            at_line_start: true,
            line_quotes: 0,
            line_indent: 0,
            line_break: None,
            after_blank: false,
            pending_number: None,
            pending_image: false,
            code_newline_pending: false,
            awaiting_language: false,
        }
    }

    /// The committed tree. Cloning the returned `Arc` is O(1).
    pub fn get_ast(&self) -> &Tree {
        &self.root
    }

    pub fn reset(&mut self) {
        *self = Self::with_options(self.options);
    }

    pub fn accept(&mut self, token: Token) {
        if self.in_code_block() {
            return self.accept_code(token);
        }
        self.settle_link(token.kind);

        match token.kind {
            TokenKind::EndOfInput => {}
            TokenKind::BlockquoteMarker => {
                if self.at_line_start {
                    self.line_quotes += 1;
                }
            }
            TokenKind::Indent => {
                if self.at_line_start
                    && let Some(TokenMeta::Indent(width)) = token.meta
                {
                    self.line_indent = width;
                }
            }
            TokenKind::Newline => self.blank_line(),
            TokenKind::SoftBreak => self.line_end(LineBreak::Soft),
            TokenKind::HardBreak => self.line_end(LineBreak::Hard),
            _ => {
                if self.at_line_start {
                    self.begin_line(&token);
                }
                self.dispatch(token);
            }
        }
    }

    fn dispatch(&mut self, token: Token) {
        if self.literal_in_code_span(token.kind, &token.text) {
            return;
        }
        match token.kind {
            TokenKind::AtxHeadingMarker => {
                let level = token.heading_level().unwrap_or(1);
                self.open_heading(level);
            }
            TokenKind::CodeFence => self.open_code_block(),
            TokenKind::ListNumber => {
                let width = token.text.chars().count();
                self.pending_number = Some((token.number().unwrap_or(0), width));
            }
            TokenKind::ListMarker => self.open_list_item(&token),
            TokenKind::HorizontalRule => self.horizontal_rule(&token),
            TokenKind::SetextUnderline => self.setext_underline(&token),
            TokenKind::BoldDelimiter => self.toggle(FrameKind::Strong),
            TokenKind::ItalicDelimiter => self.toggle(FrameKind::Emphasis),
            TokenKind::StrikethroughDelimiter => self.toggle(FrameKind::Strikethrough),
            TokenKind::CodeDelimiter => self.toggle(FrameKind::CodeInline),
            TokenKind::ImageMarker => self.pending_image = true,
            TokenKind::LinkTextOpen => self.open_link(),
            TokenKind::LinkTextClose => self.close_label(),
            TokenKind::LinkUrlOpen => self.open_url(),
            TokenKind::LinkUrlClose => self.close_url(),
            TokenKind::Text | TokenKind::CodeContent => self.text(&token.text),
            TokenKind::BlockquoteMarker
            | TokenKind::Indent
            | TokenKind::Newline
            | TokenKind::SoftBreak
            | TokenKind::HardBreak
            | TokenKind::EndOfInput => {}
        }
    }

    /// Closes every open frame. Unclosed spans survive, links without a URL
    /// become text, a link mid-URL keeps what it has.
    pub fn flush(&mut self) {
        if std::mem::take(&mut self.pending_image) {
            self.text("!");
        }
        while !self.stack.is_empty() {
            self.pop_frame(false);
        }
        self.at_line_start = true;
        self.line_quotes = 0;
        self.line_indent = 0;
        self.line_break = None;
        self.after_blank = false;
        self.pending_number = None;
        self.code_newline_pending = false;
        self.awaiting_language = false;
    }

    // === Probes for the tentative overlay ===

    /// Number of open frames; the insertion point is this many last-child
    /// steps below the root.
    pub fn insertion_depth(&self) -> usize {
        self.stack.len()
    }

    /// A content line ended inside a paragraph and the next one would join it.
    pub fn soft_break_pending(&self) -> bool {
        self.line_break == Some(LineBreak::Soft)
    }

    /// A fenced code line ended and the next content needs a `"\n"` first.
    pub fn code_newline_pending(&self) -> bool {
        self.code_newline_pending
    }

    /// Buffered characters belong to a link URL, not to visible text.
    pub fn collecting_url(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                link: Some(LinkState::Url(_)),
                ..
            })
        )
    }

    /// A link label has closed and only `(` keeps it a link.
    pub fn awaiting_url(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                link: Some(LinkState::AwaitingUrl),
                ..
            })
        )
    }

    /// Buffered characters are a fence info string.
    pub fn awaiting_language(&self) -> bool {
        self.awaiting_language
    }

    // === Tree access ===

    fn in_code_block(&self) -> bool {
        matches!(
            self.stack.last(),
            Some(Frame {
                kind: FrameKind::CodeBlock,
                ..
            })
        )
    }

    /// Node of the frame at `depth` (0 is the document), copied if shared.
    fn node_mut(&mut self, depth: usize) -> &mut Node {
        let mut node = Arc::make_mut(&mut self.root);
        for frame in &self.stack[..depth] {
            node = Arc::make_mut(&mut node.children[frame.index]);
        }
        node
    }

    fn node(&self, depth: usize) -> &Node {
        let mut node = self.root.as_ref();
        for frame in &self.stack[..depth] {
            node = &node.children[frame.index];
        }
        node
    }

    fn top_mut(&mut self) -> &mut Node {
        self.node_mut(self.stack.len())
    }

    fn open(&mut self, kind: FrameKind) {
        let node = kind.initial_node();
        self.push_frame(kind, node);
    }

    /// Appends a node to the insertion point and opens a frame on it.
    fn push_frame(&mut self, kind: FrameKind, node: NodeKind) {
        let parent = self.top_mut();
        parent.children.push(Arc::new(Node::new(node)));
        let index = parent.children.len() - 1;
        self.stack.push(Frame::new(kind, index));
    }

    /// Pops frames until `len` remain.
    fn pop_to(&mut self, len: usize) {
        while self.stack.len() > len {
            self.pop_frame(false);
        }
    }

    /// Pops the top frame and tidies its node. `matched` is true when a
    /// closing delimiter ended it.
    fn pop_frame(&mut self, matched: bool) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let depth = self.stack.len();

        match (&frame.kind, frame.link) {
            (FrameKind::Link | FrameKind::Image, Some(LinkState::Url(url))) => {
                self.commit_link(&frame.kind, url);
            }
            (FrameKind::Link | FrameKind::Image, link) => {
                self.degrade_link(&frame.kind, link);
            }
            (FrameKind::CodeBlock, _) => {
                self.code_newline_pending = false;
                self.awaiting_language = false;
            }
            (FrameKind::Paragraph, _) => {
                let paragraph = self.node(depth).last_child();
                let empty = paragraph.is_none_or(|p| p.children.is_empty());
                let trailing_break = paragraph
                    .and_then(Node::last_child)
                    .is_some_and(|c| c.kind == NodeKind::HardBreak);
                let parent = self.node_mut(depth);
                if empty {
                    parent.children.pop();
                } else if trailing_break && let Some(paragraph) = parent.last_child_mut() {
                    paragraph.children.pop();
                }
            }
            (kind, _) if kind.is_span() => {
                let parent = self.node(depth);
                let empty = parent.last_child().is_none_or(|span| match &span.kind {
                    NodeKind::CodeInline { content } => content.is_empty(),
                    _ => span.children.is_empty(),
                });
                if empty {
                    let literal = kind.delimiter().repeat(if matched { 2 } else { 1 });
                    let parent = self.node_mut(depth);
                    parent.children.pop();
                    parent.push_text(&literal);
                }
            }
            _ => {}
        }
    }

    fn accept_code(&mut self, token: Token) {
        match token.kind {
            TokenKind::CodeFence => {
                if let Some(pos) = self
                    .stack
                    .iter()
                    .rposition(|f| f.kind == FrameKind::CodeBlock)
                {
                    self.pop_to(pos);
                }
                // An empty fence token ends the block before its line begins.
                self.at_line_start = token.text.is_empty();
                if self.at_line_start {
                    self.line_quotes = 0;
                    self.line_indent = 0;
                }
            }
            TokenKind::Text if self.awaiting_language => {
                let language = token.text.split_whitespace().next().map(str::to_string);
                if let NodeKind::CodeBlock { language: lang, .. } = &mut self.top_mut().kind {
                    *lang = language;
                }
            }
            TokenKind::Newline if self.awaiting_language => self.awaiting_language = false,
            TokenKind::Newline => {
                if self.code_newline_pending {
                    self.append_code("\n");
                }
                self.code_newline_pending = true;
            }
            TokenKind::EndOfInput => {}
            _ => {
                self.awaiting_language = false;
                if std::mem::take(&mut self.code_newline_pending) {
                    self.append_code("\n");
                }
                self.append_code(&token.text);
            }
        }
    }

    fn append_code(&mut self, s: &str) {
        if let NodeKind::CodeBlock { content, .. } = &mut self.top_mut().kind {
            content.push_str(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Tokenizes and parses `input` in one go, then flushes both stages.
    pub(super) fn parse(input: &str) -> Tree {
        let mut tokenizer = Tokenizer::new();
        let mut parser = Parser::new();
        for ch in input.chars() {
            for token in tokenizer.accept(ch) {
                parser.accept(token);
            }
        }
        for token in tokenizer.flush() {
            parser.accept(token);
        }
        parser.flush();
        parser.get_ast().clone()
    }

    #[test]
    fn bold_text() {
        assert_eq!(
            parse("**bold text**").outline(),
            "document\n  paragraph\n    strong\n      text \"bold text\"\n"
        );
    }

    #[test]
    fn atx_heading() {
        assert_eq!(
            parse("## Heading 1").outline(),
            "document\n  heading level=2\n    text \"Heading 1\"\n"
        );
    }

    #[test]
    fn inline_code_between_text() {
        assert_eq!(
            parse("Some `inline code` here").outline(),
            "document\n  paragraph\n    text \"Some \"\n    code_inline \"inline code\"\n    text \" here\"\n"
        );
    }

    #[test]
    fn fenced_code_with_language() {
        assert_eq!(
            parse("```python\nprint('hello')\n```").outline(),
            "document\n  code_block lang=python \"print('hello')\"\n"
        );
    }

    #[test]
    fn fenced_code_preserves_blank_lines() {
        let tree = parse("```\na\n\n\nb\n```");
        assert_eq!(tree.text_content(), "a\n\n\nb");
    }

    #[test]
    fn unclosed_fence_keeps_content() {
        assert_eq!(
            parse("```rs\nfn x()").outline(),
            "document\n  code_block lang=rs \"fn x()\"\n"
        );
    }

    #[test]
    fn link() {
        assert_eq!(
            parse("[link text](https://example.com)").outline(),
            "document\n  paragraph\n    link url=\"https://example.com\"\n      text \"link text\"\n"
        );
    }

    #[rstest]
    #[case("")]
    #[case("*")]
    #[case("[")]
    #[case("![")]
    #[case("> ")]
    #[case("```")]
    #[case("1. ")]
    #[case("**a*b**c*")]
    #[case("[a](")]
    fn flush_never_panics(#[case] input: &str) {
        let tree = parse(input);
        assert_eq!(tree.kind, NodeKind::Document);
    }

    #[test]
    fn paragraphs_split_on_blank_line() {
        assert_eq!(
            parse("one\ntwo\n\nthree").outline(),
            "document\n  paragraph\n    text \"one\\ntwo\"\n  paragraph\n    text \"three\"\n"
        );
    }

    #[test]
    fn probes_track_open_constructs() {
        let mut parser = Parser::new();
        parser.accept(Token::new(TokenKind::Text, "a", 0));
        assert_eq!(parser.insertion_depth(), 1);
        parser.accept(Token::new(TokenKind::SoftBreak, "\n", 1));
        assert!(parser.soft_break_pending());

        parser.accept(Token::new(TokenKind::LinkTextOpen, "[", 2));
        assert!(!parser.soft_break_pending());
        parser.accept(Token::new(TokenKind::LinkTextClose, "]", 3));
        parser.accept(Token::new(TokenKind::LinkUrlOpen, "(", 4));
        assert!(parser.collecting_url());
        parser.accept(Token::new(TokenKind::LinkUrlClose, ")", 5));
        assert!(!parser.collecting_url());
    }

    #[test]
    fn code_newline_probe() {
        let mut parser = Parser::new();
        parser.accept(Token::new(TokenKind::CodeFence, "```", 0));
        assert!(parser.awaiting_language());
        parser.accept(Token::new(TokenKind::Newline, "\n", 3));
        parser.accept(Token::new(TokenKind::CodeContent, "x", 4));
        assert!(!parser.code_newline_pending());
        parser.accept(Token::new(TokenKind::Newline, "\n", 5));
        assert!(parser.code_newline_pending());
    }

    #[test]
    fn reset_starts_a_fresh_document() {
        let mut parser = Parser::new();
        parser.accept(Token::new(TokenKind::Text, "a", 0));
        parser.reset();
        assert_eq!(parser.get_ast().node_count(), 1);
        assert_eq!(parser.insertion_depth(), 0);
    }

    #[test]
    fn committed_tree_survives_later_edits() {
        let mut parser = Parser::new();
        parser.accept(Token::new(TokenKind::Text, "a", 0));
        let before = parser.get_ast().clone();
        parser.accept(Token::new(TokenKind::Text, "b", 1));
        assert_eq!(before.text_content(), "a");
        assert_eq!(parser.get_ast().text_content(), "ab");
    }
}
