//! Token vocabulary shared by the [`Tokenizer`](crate::tokenizer::Tokenizer)
//! and the [`Parser`](crate::parser::Parser).
//!
//! The parser depends on this module only, never on the tokenizer itself, so
//! any token source (a replay log, a test fixture) can drive it.

/// All token kinds the tokenizer can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `**`
    BoldDelimiter,
    /// `*`
    ItalicDelimiter,
    /// `~~`
    StrikethroughDelimiter,
    /// A single backtick opening or closing an inline code span
    CodeDelimiter,
    /// ```` ``` ```` or `~~~` at line start
    CodeFence,
    /// `[`
    LinkTextOpen,
    /// `]` matching an open `[`
    LinkTextClose,
    /// `(` directly after a link label
    LinkUrlOpen,
    /// `)` closing a link URL
    LinkUrlClose,
    /// `!` directly before `[`
    ImageMarker,
    /// `#`..`######` followed by whitespace at line start
    AtxHeadingMarker,
    /// A line of `=` under a paragraph
    SetextUnderline,
    /// Digit run of an ordered list marker
    ListNumber,
    /// `-`, `*`, `+` or the `.`/`)` of an ordered marker, with its space
    ListMarker,
    /// `>` at line start
    BlockquoteMarker,
    /// `---`, `***`, `___`
    HorizontalRule,
    /// Leading whitespace of a content line
    Indent,
    /// Line ending after two trailing spaces or a backslash
    HardBreak,
    /// Line ending of a line that carried content
    SoftBreak,
    /// Line ending of a blank line, or any line inside fenced code
    Newline,
    /// Plain text run
    Text,
    /// One verbatim line of fenced code
    CodeContent,
    /// Emitted once by `flush()`
    EndOfInput,
}

impl TokenKind {
    /// True for the three line-ending kinds.
    pub fn is_line_end(self) -> bool {
        matches!(
            self,
            TokenKind::HardBreak | TokenKind::SoftBreak | TokenKind::Newline
        )
    }
}

/// Per-kind token metadata.
///
/// Each variant belongs to exactly one token kind, so a heading level can
/// never be read off a fence token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMeta {
    /// `AtxHeadingMarker` and `SetextUnderline`
    Heading { level: u8 },
    /// `CodeFence`
    Fence { marker: char, length: usize },
    /// `ListMarker`; `indent` is the marker's column
    List { ordered: bool, indent: usize },
    /// `ListNumber`
    Number(u64),
    /// `HorizontalRule`
    Rule { marker: char },
    /// `Indent`
    Indent(usize),
}

/// A lexical unit. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// The source characters this token stands for, after escape resolution.
    pub text: String,
    /// Char index of the token's first character.
    pub source_offset: usize,
    pub meta: Option<TokenMeta>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, source_offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            source_offset,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: TokenMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self.meta {
            Some(TokenMeta::Heading { level }) => Some(level),
            _ => None,
        }
    }

    pub fn number(&self) -> Option<u64> {
        match self.meta {
            Some(TokenMeta::Number(n)) => Some(n),
            _ => None,
        }
    }
}
