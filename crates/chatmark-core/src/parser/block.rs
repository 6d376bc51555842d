//! # Block Structure
//!
//! Blocks are decided one line at a time. A line's `>` markers and
//! indentation are known before its first real token, which then:
//!
//! 1. opens or closes blockquotes to match the marker count, unless the line
//!    is a lazy continuation of an open paragraph;
//! 2. closes list items whose content column the line falls short of
//!    (again, unless lazy);
//! 3. is dispatched as usual.
//!
//! List items nest inside the item they are indented under, with `depth`
//! derived from `indent / list_indent_width` and clamped so a level can never
//! be skipped.

use std::sync::Arc;

use crate::ast::{Node, NodeKind};
use crate::token::{Token, TokenKind, TokenMeta};

use super::frame::FrameKind;
use super::inline::continues_paragraph;
use super::{LineBreak, Parser};

impl Parser {
    pub(super) fn begin_line(&mut self, token: &Token) {
        self.at_line_start = false;
        let lazy =
            self.line_break.is_some() && self.inline_open() && continues_paragraph(token.kind);

        let open_quotes = self.open_quotes();
        if self.line_quotes > open_quotes {
            self.close_paragraph();
            for _ in open_quotes..self.line_quotes {
                self.open(FrameKind::Blockquote);
            }
        } else if self.line_quotes < open_quotes && !lazy {
            self.close_quotes_from(self.line_quotes);
        }

        let list_marker = matches!(token.kind, TokenKind::ListMarker | TokenKind::ListNumber);
        if !lazy && !list_marker {
            self.close_items_beyond(self.line_indent);
        }
        if !self.inline_open() {
            self.line_break = None;
        }
        self.after_blank = false;
    }

    pub(super) fn line_end(&mut self, brk: LineBreak) {
        self.at_line_start = true;
        self.line_quotes = 0;
        self.line_indent = 0;

        if let Some(pos) = self
            .stack
            .iter()
            .rposition(|f| f.kind == FrameKind::Heading)
        {
            self.pop_to(pos);
            self.line_break = None;
            return;
        }

        if !self.inline_open() {
            self.line_break = None;
            return;
        }
        if brk == LineBreak::Hard && !self.top_is(&FrameKind::CodeInline) {
            self.top_mut()
                .children
                .push(Arc::new(Node::new(NodeKind::HardBreak)));
        }
        self.line_break = Some(brk);
    }

    pub(super) fn blank_line(&mut self) {
        if self.line_quotes < self.open_quotes() {
            self.close_quotes_from(self.line_quotes);
        }
        self.close_paragraph();
        self.after_blank = true;
        self.at_line_start = true;
        self.line_quotes = 0;
        self.line_indent = 0;
    }

    /// Pops everything above the innermost container (or the document).
    pub(super) fn close_paragraph(&mut self) {
        let keep = self
            .stack
            .iter()
            .rposition(|f| f.kind.is_container())
            .map_or(0, |p| p + 1);
        self.pop_to(keep);
        self.set_item_inline(false);
        self.line_break = None;
    }

    fn open_quotes(&self) -> usize {
        self.stack
            .iter()
            .filter(|f| f.kind == FrameKind::Blockquote)
            .count()
    }

    /// Closes blockquotes beyond the first `keep`, and everything inside them.
    fn close_quotes_from(&mut self, keep: usize) {
        let pos = self
            .stack
            .iter()
            .enumerate()
            .filter(|(_, f)| f.kind == FrameKind::Blockquote)
            .nth(keep)
            .map(|(i, _)| i);
        if let Some(pos) = pos {
            self.pop_to(pos);
        }
    }

    /// Stack position where the innermost blockquote's content starts.
    fn quote_floor(&self) -> usize {
        self.stack
            .iter()
            .rposition(|f| f.kind == FrameKind::Blockquote)
            .map_or(0, |p| p + 1)
    }

    fn close_items_beyond(&mut self, indent: usize) {
        let floor = self.quote_floor();
        let pos = self.stack[floor..].iter().position(|f| {
            matches!(f.kind, FrameKind::ListItem { content_indent, .. } if content_indent > indent)
        });
        if let Some(pos) = pos {
            self.pop_to(floor + pos);
        }
    }

    pub(super) fn open_heading(&mut self, level: u8) {
        self.close_paragraph();
        self.push_frame(FrameKind::Heading, NodeKind::Heading { level });
    }

    pub(super) fn open_code_block(&mut self) {
        self.close_paragraph();
        self.open(FrameKind::CodeBlock);
        self.awaiting_language = true;
        self.code_newline_pending = false;
    }

    pub(super) fn open_list_item(&mut self, marker: &Token) {
        let (ordered, indent) = match marker.meta {
            Some(TokenMeta::List { ordered, indent }) => (ordered, indent),
            _ => (false, self.line_indent),
        };
        let number = self.pending_number.take();
        let level = self.options.list_depth(indent);
        let content_indent =
            indent + marker.text.chars().count() + number.map_or(0, |(_, width)| width);

        let floor = self.quote_floor();
        let sibling = self.stack[floor..]
            .iter()
            .position(|f| matches!(f.kind, FrameKind::ListItem { level: l, .. } if l >= level));
        if let Some(pos) = sibling {
            self.pop_to(floor + pos);
        }
        self.close_paragraph();

        let parent_depth = self.stack[floor..].iter().rev().find_map(|f| match f.kind {
            FrameKind::ListItem { depth, .. } => Some(depth),
            _ => None,
        });
        let depth = level.min(parent_depth.map_or(0, |d| d + 1));

        self.push_frame(
            FrameKind::ListItem {
                depth,
                level,
                content_indent,
                inline_open: false,
            },
            NodeKind::ListItem {
                ordered,
                number: number.map(|(n, _)| n),
                depth,
            },
        );
    }

    pub(super) fn horizontal_rule(&mut self, token: &Token) {
        let marker = match token.meta {
            Some(TokenMeta::Rule { marker }) => marker,
            _ => '-',
        };
        if marker == '-' && self.convert_to_setext(2) {
            return;
        }
        self.close_paragraph();
        self.top_mut()
            .children
            .push(Arc::new(Node::new(NodeKind::HorizontalRule)));
    }

    pub(super) fn setext_underline(&mut self, token: &Token) {
        let level = token.heading_level().unwrap_or(1);
        if !self.convert_to_setext(level) {
            self.text(&token.text);
        }
    }

    /// Turns the paragraph the previous line left open into a heading.
    fn convert_to_setext(&mut self, level: u8) -> bool {
        if self.line_break.is_none() {
            return false;
        }
        let Some(pos) = self.stack.iter().rposition(|f| !f.kind.is_span()) else {
            return false;
        };
        if self.stack[pos].kind != FrameKind::Paragraph {
            return false;
        }

        self.pop_to(pos + 1);
        let node = self.top_mut();
        node.kind = NodeKind::Heading { level };
        if node
            .last_child()
            .is_some_and(|c| c.kind == NodeKind::HardBreak)
        {
            node.children.pop();
        }
        self.stack.pop();
        self.line_break = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn lazy_continuation_stays_in_blockquote() {
        assert_eq!(
            parse("> a\nb").outline(),
            "document\n  blockquote\n    paragraph\n      text \"a\\nb\"\n"
        );
    }

    #[test]
    fn blank_line_closes_blockquote() {
        assert_eq!(
            parse("> a\n\nb").outline(),
            "document\n  blockquote\n    paragraph\n      text \"a\"\n  paragraph\n    text \"b\"\n"
        );
    }

    #[test]
    fn nested_quote_opens_inside_outer() {
        assert_eq!(
            parse("> a\n>> b").outline(),
            "document\n  blockquote\n    paragraph\n      text \"a\"\n    blockquote\n      paragraph\n        text \"b\"\n"
        );
    }

    #[test]
    fn indented_marker_nests_under_previous_item() {
        assert_eq!(
            parse("- a\n  - b\n- c").outline(),
            "document\n  list_item depth=0\n    text \"a\"\n    list_item depth=1\n      text \"b\"\n  list_item depth=0\n    text \"c\"\n"
        );
    }

    #[test]
    fn depth_is_clamped_to_one_below_parent() {
        let outline = parse("- a\n        - b").outline();
        assert!(outline.contains("list_item depth=1"), "{outline}");
    }

    #[test]
    fn deep_siblings_stay_siblings() {
        let outline = parse("- a\n    - b\n    - c").outline();
        assert_eq!(outline.matches("list_item depth=1").count(), 2, "{outline}");
        assert!(!outline.contains("depth=2"), "{outline}");
    }

    #[test]
    fn ordered_items_keep_their_numbers() {
        assert_eq!(
            parse("3. x\n4. y").outline(),
            "document\n  list_item depth=0 number=3\n    text \"x\"\n  list_item depth=0 number=4\n    text \"y\"\n"
        );
    }

    #[test]
    fn indented_paragraph_after_blank_stays_in_item() {
        assert_eq!(
            parse("- a\n\n  b").outline(),
            "document\n  list_item depth=0\n    paragraph\n      text \"a\"\n    paragraph\n      text \"b\"\n"
        );
    }

    #[test]
    fn unindented_paragraph_after_blank_ends_list() {
        assert_eq!(
            parse("- a\n\nb").outline(),
            "document\n  list_item depth=0\n    text \"a\"\n  paragraph\n    text \"b\"\n"
        );
    }

    #[test]
    fn setext_headings() {
        assert_eq!(
            parse("Title\n===").outline(),
            "document\n  heading level=1\n    text \"Title\"\n"
        );
        assert_eq!(
            parse("Title\n---").outline(),
            "document\n  heading level=2\n    text \"Title\"\n"
        );
    }

    #[test]
    fn rule_after_blank_line_is_a_rule() {
        assert_eq!(
            parse("a\n\n---").outline(),
            "document\n  paragraph\n    text \"a\"\n  horizontal_rule\n"
        );
    }

    #[test]
    fn unindented_rule_closes_list() {
        assert_eq!(
            parse("- a\n***").outline(),
            "document\n  list_item depth=0\n    text \"a\"\n  horizontal_rule\n"
        );
    }

    #[test]
    fn heading_ends_at_line_end() {
        assert_eq!(
            parse("# H\ntext").outline(),
            "document\n  heading level=1\n    text \"H\"\n  paragraph\n    text \"text\"\n"
        );
    }

    #[test]
    fn hard_break_node_between_lines() {
        assert_eq!(
            parse("a  \nb").outline(),
            "document\n  paragraph\n    text \"a\"\n    hard_break\n    text \"b\"\n"
        );
    }

    #[test]
    fn trailing_hard_break_is_dropped() {
        assert_eq!(
            parse("a  \n\nb").outline(),
            "document\n  paragraph\n    text \"a\"\n  paragraph\n    text \"b\"\n"
        );
    }

    #[test]
    fn code_fence_inside_list_item() {
        assert_eq!(
            parse("- a\n  ```\n  x\n  ```").outline(),
            "document\n  list_item depth=0\n    text \"a\"\n    code_block \"x\"\n"
        );
    }
}
