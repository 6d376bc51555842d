//! # Streaming Processor
//!
//! The only type a chat client needs. Each call hands over the whole message
//! so far plus how many characters are visible; only the characters past the
//! watermark are fed through the tokenizer and parser.
//!
//! Characters the tokenizer is still holding (an unfinished text run, a lone
//! `*`) are not in the committed tree yet. [`StreamingProcessor::append_text`]
//! shows them anyway by returning a *tentative* tree: the committed root
//! `Arc` is cloned and only the spine down to the insertion point is copied,
//! so every untouched sibling stays shared with the committed tree.
//!
//! ```
//! use chatmark_core::StreamingProcessor;
//!
//! let text = "Hello **world**";
//! let mut processor = StreamingProcessor::new();
//! for visible in 1..=text.chars().count() {
//!     let tree = processor.append_text(text, visible);
//!     assert!(!tree.text_content().is_empty());
//! }
//! let done = processor.finalize(text);
//! assert_eq!(done.text_content(), "Hello world");
//! ```

use std::sync::Arc;

use crate::ast::{Node, NodeKind, Tree};
use crate::options::ParserOptions;
use crate::parser::Parser;
use crate::tokenizer::Tokenizer;

#[derive(Debug, Default)]
pub struct StreamingProcessor {
    tokenizer: Tokenizer,
    parser: Parser,
    processed_chars: usize,
    /// Byte offset matching `processed_chars` in the text seen so far.
    processed_bytes: usize,
    finalized: bool,
}

impl StreamingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            tokenizer: Tokenizer::with_options(options),
            parser: Parser::with_options(options),
            ..Self::default()
        }
    }

    /// Feeds `full_text` up to `visible_length` chars and returns the
    /// tentative tree. A length at or below the watermark adds nothing.
    pub fn append_text(&mut self, full_text: &str, visible_length: usize) -> Tree {
        if self.finalized {
            return self.parser.get_ast().clone();
        }
        if visible_length < self.processed_chars {
            log::debug!(
                "visible length {visible_length} is behind watermark {}; keeping committed tree",
                self.processed_chars
            );
        }
        self.feed(full_text, visible_length);
        self.tentative()
    }

    /// Feeds the rest of `full_text`, flushes both stages and returns the
    /// committed tree. Later `append_text` calls return the same tree.
    pub fn finalize(&mut self, full_text: &str) -> Tree {
        if !self.finalized {
            self.feed(full_text, usize::MAX);
            for token in self.tokenizer.flush() {
                self.parser.accept(token);
            }
            self.parser.flush();
            self.finalized = true;
            log::debug!(
                "finalized after {} chars, {} nodes",
                self.processed_chars,
                self.parser.get_ast().node_count()
            );
        }
        self.parser.get_ast().clone()
    }

    pub fn reset(&mut self) {
        self.tokenizer.reset();
        self.parser.reset();
        self.processed_chars = 0;
        self.processed_bytes = 0;
        self.finalized = false;
    }

    /// The committed tree, without any tentative overlay.
    pub fn get_ast_reference(&self) -> &Tree {
        self.parser.get_ast()
    }

    /// The watermark: chars fed so far.
    pub fn processed_chars(&self) -> usize {
        self.processed_chars
    }

    fn feed(&mut self, full_text: &str, visible_length: usize) {
        let Some(rest) = full_text.get(self.processed_bytes..) else {
            log::debug!(
                "text no longer extends the {} processed bytes; ignoring",
                self.processed_bytes
            );
            return;
        };
        for ch in rest.chars() {
            if self.processed_chars >= visible_length {
                break;
            }
            for token in self.tokenizer.accept(ch) {
                self.parser.accept(token);
            }
            self.processed_chars += 1;
            self.processed_bytes += ch.len_utf8();
        }
    }

    /// The committed tree with the tokenizer's buffered characters laid in at
    /// the insertion point.
    fn tentative(&self) -> Tree {
        let committed = self.parser.get_ast();
        let extra = self.tokenizer.buffered_chars();
        if extra.is_empty() || self.parser.collecting_url() || self.parser.awaiting_language() {
            return committed.clone();
        }

        let settled;
        let parser = if self.parser.awaiting_url() && !extra.starts_with('(') {
            settled = self.parser.with_link_settled();
            &settled
        } else {
            &self.parser
        };

        let mut root = parser.get_ast().clone();
        let mut node = Arc::make_mut(&mut root);
        for _ in 0..parser.insertion_depth() {
            let Some(last) = node.children.len().checked_sub(1) else {
                break;
            };
            node = Arc::make_mut(&mut node.children[last]);
        }
        overlay(
            node,
            extra,
            parser.soft_break_pending(),
            parser.code_newline_pending(),
        );
        root
    }
}

fn overlay(node: &mut Node, extra: &str, soft_break: bool, code_newline: bool) {
    match &mut node.kind {
        NodeKind::CodeBlock { content, .. } => {
            if code_newline {
                content.push('\n');
            }
            content.push_str(extra);
            return;
        }
        NodeKind::CodeInline { content } => {
            if soft_break {
                content.push('\n');
            }
            content.push_str(extra);
            return;
        }
        _ => {}
    }

    let block_level = match node.kind {
        NodeKind::Document | NodeKind::Blockquote => true,
        NodeKind::ListItem { .. } => node.has_block_children(),
        _ => false,
    };
    if block_level {
        node.children.push(Arc::new(Node::with_children(
            NodeKind::Paragraph,
            vec![Node::text(extra)],
        )));
    } else {
        if soft_break {
            node.push_text("\n");
        }
        node.push_text(extra);
    }
}
