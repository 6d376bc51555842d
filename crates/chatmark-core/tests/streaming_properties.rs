//! Property-based tests for the streaming pipeline.
//!
//! Inputs are stitched together from markdown-significant fragments so the
//! generator hits delimiters, line starts and partial constructs far more
//! often than uniformly random text would.
//!
//! 1. **Every prefix renders** - no panic, a `document` root, at any length
//! 2. **Reveal order does not matter** - char-by-char reveal then finalize
//!    equals finalizing the whole text at once
//! 3. **Repeated lengths are idempotent**
//! 4. **Tentative trees share siblings** with the committed tree
//! 5. **Tokens are well formed** - non-empty text, in-range offsets,
//!    exactly one trailing `EndOfInput`
//! 6. **Trees are well nested** - leaves have no children, paragraphs never
//!    hold blocks, documents and blockquotes hold only blocks

use std::sync::Arc;

use chatmark_core::{Node, NodeKind, StreamingProcessor, TokenKind, Tokenizer};
use proptest::prelude::*;

// ============================================================================
// Generators
// ============================================================================

const FRAGMENTS: &[&str] = &[
    "a", "word", " ", "  ", "\n", "\n\n", "*", "**", "***", "~~", "~", "`", "```", "```rs\n",
    "~~~", "#", "## ", "####### ", "- ", "* ", "+ ", "1. ", "12) ", "> ", ">> ", "[", "]", "](",
    "(", ")", "![", "\\", "\\*", "---", "===", "___", "\t", "  - ", "é", "日本",
];

fn markdownish() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..40).prop_map(|parts| parts.concat())
}

fn tokens_of(text: &str) -> Vec<chatmark_core::Token> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = Vec::new();
    for ch in text.chars() {
        tokens.extend(tokenizer.accept(ch));
    }
    tokens.extend(tokenizer.flush());
    tokens
}

/// Returns the first node that breaks block/inline nesting, if any.
fn misnested(node: &Node) -> Option<String> {
    let kind = &node.kind;
    let bad_child = node.children.iter().find(|c| {
        kind.is_leaf()
            || (kind.holds_inline() && c.kind.is_block())
            || (kind.holds_blocks()
                && !matches!(kind, NodeKind::ListItem { .. })
                && !c.kind.is_block())
    });
    if bad_child.is_some() {
        return Some(node.outline());
    }
    node.children.iter().find_map(|c| misnested(c))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn every_prefix_renders(text in markdownish()) {
        let mut processor = StreamingProcessor::new();
        for visible in 0..=text.chars().count() {
            let tree = processor.append_text(&text, visible);
            prop_assert_eq!(&tree.kind, &NodeKind::Document);
        }
        let done = processor.finalize(&text);
        prop_assert_eq!(&done.kind, &NodeKind::Document);
    }

    #[test]
    fn reveal_converges_to_one_shot(text in markdownish()) {
        let mut processor = StreamingProcessor::new();
        for visible in 1..=text.chars().count() {
            processor.append_text(&text, visible);
        }
        let revealed = processor.finalize(&text);
        let one_shot = StreamingProcessor::new().finalize(&text);
        prop_assert_eq!(revealed, one_shot);
    }

    #[test]
    fn chunked_reveal_converges(text in markdownish(), step in 1usize..7) {
        let total = text.chars().count();
        let mut processor = StreamingProcessor::new();
        let mut visible = 0;
        while visible < total {
            visible = (visible + step).min(total);
            processor.append_text(&text, visible);
        }
        prop_assert_eq!(
            processor.finalize(&text),
            StreamingProcessor::new().finalize(&text)
        );
    }

    #[test]
    fn same_length_twice_is_idempotent(text in markdownish(), cut in 0usize..200) {
        let visible = cut.min(text.chars().count());
        let mut processor = StreamingProcessor::new();
        let first = processor.append_text(&text, visible);
        let second = processor.append_text(&text, visible);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn rewinding_never_changes_committed_tree(text in markdownish(), back in 0usize..20) {
        let total = text.chars().count();
        let mut processor = StreamingProcessor::new();
        processor.append_text(&text, total);
        let committed = processor.get_ast_reference().clone();
        processor.append_text(&text, total.saturating_sub(back));
        prop_assert!(Arc::ptr_eq(&committed, processor.get_ast_reference()));
    }

    #[test]
    fn tentative_tree_shares_all_but_the_insertion_path(text in markdownish()) {
        let mut processor = StreamingProcessor::new();
        for visible in 1..=text.chars().count() {
            let tentative = processor.append_text(&text, visible);
            let committed = processor.get_ast_reference();
            let untouched = committed.children.len().saturating_sub(1);
            for i in 0..untouched {
                prop_assert!(Arc::ptr_eq(&tentative.children[i], &committed.children[i]));
            }
        }
    }

    #[test]
    fn tokens_are_well_formed(text in markdownish()) {
        let tokens = tokens_of(&text);
        let len = text.chars().count();

        let ends = tokens.iter().filter(|t| t.kind == TokenKind::EndOfInput).count();
        prop_assert_eq!(ends, 1);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::EndOfInput));

        for token in &tokens {
            prop_assert!(token.source_offset <= len, "{:?} past end {}", token, len);
            if matches!(token.kind, TokenKind::Text | TokenKind::CodeContent) {
                prop_assert!(!token.text.is_empty(), "empty {:?}", token);
            }
        }
    }

    #[test]
    fn trees_are_well_nested(text in markdownish()) {
        let mut processor = StreamingProcessor::new();
        for visible in 1..=text.chars().count() {
            let tree = processor.append_text(&text, visible);
            prop_assert_eq!(misnested(&tree), None);
        }
        prop_assert_eq!(misnested(&processor.finalize(&text)), None);
    }

    #[test]
    fn tokenizer_is_deterministic(text in markdownish()) {
        prop_assert_eq!(tokens_of(&text), tokens_of(&text));
    }

    #[test]
    fn plain_words_survive_verbatim(words in prop::collection::vec("[a-z]{1,8}", 1..10)) {
        let text = words.join(" ");
        let tree = StreamingProcessor::new().finalize(&text);
        prop_assert_eq!(tree.text_content(), text);
    }
}

// ============================================================================
// Fixed regressions
// ============================================================================

#[test]
fn escape_round_trip() {
    let text: String = tokens_of("\\*not italic\\*")
        .into_iter()
        .filter(|t| t.kind != TokenKind::EndOfInput)
        .inspect(|t| assert_eq!(t.kind, TokenKind::Text))
        .map(|t| t.text)
        .collect();
    assert_eq!(text, "*not italic*");
}

#[test]
fn overlapping_emphasis_flushes_cleanly() {
    let tree = StreamingProcessor::new().finalize("**a*b**c*");
    assert_eq!(tree.text_content(), "abc*");
}
