//! # chatmark-core
//!
//! A streaming Markdown parser for chat responses that are revealed one
//! character at a time. Every prefix of the input yields a valid, renderable
//! document tree; unclosed markup is resolved, never rejected.
//!
//! ## Architecture Overview
//!
//! ```text
//! visible prefix → Tokenizer → Tokens → Parser → committed tree
//!                  (per char)           (frame stack)     │
//!                      │                                  │
//!                      └─ buffered chars ──→ overlay ─────┴→ tentative tree
//! ```
//!
//! ### 1. Tokenizer ([`tokenizer`] module)
//!
//! A lookahead-free state machine. Ambiguous characters (`*`, backticks at
//! line start, digits that may open a list) are held until the next one
//! decides them.
//!
//! ```text
//! "## Hi **x**" → [AtxHeadingMarker(2), Text("Hi "), BoldDelimiter,
//!                  Text("x"), BoldDelimiter, EndOfInput]
//! ```
//!
//! ### 2. Parser ([`parser`] module)
//!
//! A pushdown automaton over an explicit stack of open frames. It mutates one
//! persistent tree and never rebuilds it.
//!
//! ### 3. StreamingProcessor ([`processor`] module)
//!
//! Tracks how many characters have been fed, drives the other two stages, and
//! lays the tokenizer's pending characters onto a path copy of the tree so
//! text shows up as soon as it is revealed.
//!
//! ## Trees Are Shared
//!
//! [`Tree`] is an `Arc<Node>` and children are `Arc`s too, so handing a tree
//! to a renderer (or another thread) is a pointer copy, and a tentative tree
//! shares every node off the insertion path with the committed one.
//!
//! ## Quick Start
//!
//! ```
//! use chatmark_core::{NodeKind, StreamingProcessor};
//!
//! let reply = "# Answer\n\nUse `cargo` **today**.";
//! let mut processor = StreamingProcessor::new();
//! for shown in 1..=reply.chars().count() {
//!     let _tree = processor.append_text(reply, shown); // render this
//! }
//! let tree = processor.finalize(reply);
//!
//! assert_eq!(tree.children[0].kind, NodeKind::Heading { level: 1 });
//! assert_eq!(tree.text_content(), "AnswerUse cargo today.");
//! ```

pub mod ast;
pub mod options;
pub mod parser;
pub mod processor;
pub mod token;
pub mod tokenizer;

pub use ast::{Node, NodeKind, Tree};
pub use options::ParserOptions;
pub use parser::Parser;
pub use processor::StreamingProcessor;
pub use token::{Token, TokenKind, TokenMeta};
pub use tokenizer::Tokenizer;
