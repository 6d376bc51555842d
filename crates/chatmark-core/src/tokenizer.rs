//! # Tokenizer - Character-at-a-Time Lexing
//!
//! The first pipeline stage. Characters arrive one at a time as a chat
//! response is revealed, so the tokenizer can never look ahead: anything
//! ambiguous (a lone `*`, a run of backticks at line start, a digit that may
//! start an ordered list) is held back until the next character settles it.
//!
//! ```
//! use chatmark_core::tokenizer::Tokenizer;
//! use chatmark_core::token::TokenKind;
//!
//! let mut tokenizer = Tokenizer::new();
//! let mut kinds = vec![];
//! for ch in "**hi**".chars() {
//!     kinds.extend(tokenizer.accept(ch).into_iter().map(|t| t.kind));
//! }
//! kinds.extend(tokenizer.flush().into_iter().map(|t| t.kind));
//!
//! assert_eq!(
//!     kinds,
//!     [
//!         TokenKind::BoldDelimiter,
//!         TokenKind::Text,
//!         TokenKind::BoldDelimiter,
//!         TokenKind::EndOfInput,
//!     ]
//! );
//! ```
//!
//! ## Buffering
//!
//! Everything not yet emitted lives in one string: the pending text run
//! first (escape-resolved), then the raw characters of an unresolved lexeme.
//! Resolving a lexeme as literal text just moves the boundary, and
//! [`Tokenizer::buffered_chars`] can hand the whole tail to the processor's
//! tentative overlay without allocating.
//!
//! ## States
//!
//! | State | Entered on | Settled by |
//! |-------|-----------|------------|
//! | `LineStart` | line start, after `>` | first non-space char |
//! | `Hashes` | `#` at line start | whitespace (heading) or other (text) |
//! | `LineRun` | `-` `*` `_` `=` `+` at line start | space (list), newline (rule) |
//! | `Digits`, `OrderedPunct` | digit at line start | `. ` / `) ` (ordered list) |
//! | `FenceRun` | `` ` `` or `~` at line start | run end (fence if 3+) |
//! | `Star`, `Tilde`, `Backticks`, `Bang` | inline delimiter chars | next char |
//! | `Url` | `(` right after a link label | `)` |
//! | `FenceInfo`, `Code` | an opening fence | closing fence |

use crate::options::ParserOptions;
use crate::token::{Token, TokenKind, TokenMeta};

/// Where the current fenced code line is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeLine {
    /// Stripping quote markers and up to 3 spaces of indent.
    Start { quotes_left: usize, spaces: usize },
    /// A run of fence chars that may close the block.
    Closing { count: usize, trailing: bool },
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    Inline,
    Hashes(usize),
    LineRun {
        marker: char,
        count: usize,
        spaced: bool,
    },
    Digits,
    OrderedPunct(char),
    FenceRun {
        marker: char,
        count: usize,
    },
    Star,
    Tilde,
    Backticks(usize),
    Bang,
    Url {
        depth: usize,
    },
    FenceInfo,
    Code(CodeLine),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: char,
    length: usize,
    indent: usize,
    quotes: usize,
}

/// Streaming lexer. One instance per message; see the module docs.
#[derive(Debug)]
pub struct Tokenizer {
    options: ParserOptions,
    state: State,
    /// Char index of the character being processed.
    pos: usize,
    out: Vec<Token>,
    /// Pending text run (`buf[..text_end]`) followed by raw lexeme chars.
    buf: String,
    text_end: usize,
    text_start: usize,
    raw_start: usize,
    /// A backslash is pending in the raw tail.
    escape: bool,
    indent: usize,
    line_quotes: usize,
    line_has_content: bool,
    skip_one_space: bool,
    skip_leading_space: bool,
    in_code_span: bool,
    bracket_depth: usize,
    after_label: bool,
    fence: Option<Fence>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Self {
        Self {
            options,
            state: State::LineStart,
            pos: 0,
            out: Vec::new(),
            buf: String::new(),
            text_end: 0,
            text_start: 0,
            raw_start: 0,
            escape: false,
            indent: 0,
            line_quotes: 0,
            line_has_content: false,
            skip_one_space: false,
            skip_leading_space: false,
            in_code_span: false,
            bracket_depth: 0,
            after_label: false,
            fence: None,
        }
    }

    /// Feeds one character, returning the tokens it completed (usually none).
    pub fn accept(&mut self, ch: char) -> Vec<Token> {
        self.step(ch);
        self.pos += 1;
        std::mem::take(&mut self.out)
    }

    /// Resolves everything buffered as if the line ended, then emits
    /// `EndOfInput`.
    pub fn flush(&mut self) -> Vec<Token> {
        if self.escape {
            self.escape = false;
            self.raw_to_text();
        }
        self.step('\n');
        if self.out.last().is_some_and(|t| t.kind.is_line_end()) {
            self.out.pop();
        }
        self.emit(TokenKind::EndOfInput, "", self.pos, None);
        std::mem::take(&mut self.out)
    }

    pub fn reset(&mut self) {
        *self = Self::with_options(self.options);
    }

    /// Characters accepted but not yet emitted as tokens.
    pub fn buffered_chars(&self) -> &str {
        &self.buf
    }

    // === Buffer helpers ===

    fn raw(&self) -> &str {
        &self.buf[self.text_end..]
    }

    fn start_raw(&mut self, ch: char) {
        if self.buf.len() == self.text_end {
            self.raw_start = self.pos;
        }
        self.buf.push(ch);
    }

    fn drop_raw(&mut self) -> String {
        self.buf.split_off(self.text_end)
    }

    fn raw_to_text(&mut self) {
        if self.text_end == 0 && !self.buf.is_empty() {
            self.text_start = self.raw_start;
        }
        self.text_end = self.buf.len();
    }

    fn push_text_at(&mut self, ch: char, offset: usize) {
        debug_assert_eq!(self.text_end, self.buf.len(), "raw lexeme left unresolved");
        if self.text_end == 0 {
            self.text_start = offset;
        }
        self.buf.push(ch);
        self.text_end = self.buf.len();
    }

    fn push_text(&mut self, ch: char) {
        self.push_text_at(ch, self.pos);
    }

    fn flush_as(&mut self, kind: TokenKind) {
        if self.text_end == 0 {
            return;
        }
        let rest = self.buf.split_off(self.text_end);
        let text = std::mem::replace(&mut self.buf, rest);
        self.text_end = 0;
        self.emit(kind, text, self.text_start, None);
    }

    fn flush_text(&mut self) {
        self.flush_as(TokenKind::Text);
    }

    fn emit(&mut self, kind: TokenKind, text: impl Into<String>, at: usize, meta: Option<TokenMeta>) {
        let mut token = Token::new(kind, text, at);
        token.meta = meta;
        self.out.push(token);
    }

    /// Emits a structural token after flushing pending text.
    fn emit_marker(&mut self, kind: TokenKind, text: impl Into<String>, at: usize, meta: Option<TokenMeta>) {
        self.flush_text();
        self.emit(kind, text, at, meta);
    }

    /// Forgets span context that cannot survive a block boundary.
    fn reset_inline_context(&mut self) {
        self.in_code_span = false;
        self.bracket_depth = 0;
        self.after_label = false;
    }

    /// The line turned out to carry plain content.
    fn begin_content(&mut self) {
        self.line_has_content = true;
        self.state = State::Inline;
    }

    /// Reports leading whitespace once the line's first real char arrives.
    fn emit_indent(&mut self) {
        if self.indent > 0 {
            self.emit(
                TokenKind::Indent,
                " ".repeat(self.indent),
                self.pos.saturating_sub(self.indent),
                Some(TokenMeta::Indent(self.indent)),
            );
        }
    }

    /// Settles a pending line-start lexeme as literal text.
    fn literal_run(&mut self) {
        self.begin_content();
        self.raw_to_text();
    }

    // === Dispatch ===

    fn step(&mut self, ch: char) {
        let in_code = matches!(self.state, State::Code(_) | State::FenceInfo);
        if self.escape && !in_code {
            self.escape = false;
            let start = self.raw_start;
            self.drop_raw();
            if ch == '\n' {
                if self.line_has_content {
                    self.trim_trailing_space();
                    self.flush_text();
                    return self.end_line(TokenKind::HardBreak);
                }
                self.push_text_at('\\', start);
            } else if ch.is_ascii_punctuation() {
                return self.push_text_at(ch, start);
            } else {
                self.push_text_at('\\', start);
            }
        }

        match self.state {
            State::LineStart => self.line_start_char(ch),
            State::Inline => self.inline_char(ch),
            State::Hashes(n) => self.hashes_char(n, ch),
            State::LineRun {
                marker,
                count,
                spaced,
            } => self.line_run_char(marker, count, spaced, ch),
            State::Digits => self.digits_char(ch),
            State::OrderedPunct(punct) => self.ordered_punct_char(punct, ch),
            State::FenceRun { marker, count } => self.fence_run_char(marker, count, ch),
            State::Star => self.star_char(ch),
            State::Tilde => self.tilde_char(ch),
            State::Backticks(n) => self.backticks_char(n, ch),
            State::Bang => self.bang_char(ch),
            State::Url { depth } => self.url_char(depth, ch),
            State::FenceInfo => self.fence_info_char(ch),
            State::Code(line) => self.code_char(line, ch),
        }
    }

    // === Line start ===

    fn line_start_char(&mut self, ch: char) {
        let after_quote = std::mem::take(&mut self.skip_one_space);
        match ch {
            ' ' if after_quote => {}
            ' ' => self.indent += 1,
            '\t' => {
                let tab = self.options.tab_width.max(1);
                self.indent += tab - self.indent % tab;
            }
            '\n' => self.end_line(TokenKind::Newline),
            '>' => {
                self.emit(TokenKind::BlockquoteMarker, ">", self.pos, None);
                self.line_quotes += 1;
                self.indent = 0;
                self.skip_one_space = true;
            }
            _ => {
                self.emit_indent();
                self.line_start_content(ch);
            }
        }
    }

    fn line_start_content(&mut self, ch: char) {
        match ch {
            '#' => {
                self.start_raw(ch);
                self.state = State::Hashes(1);
            }
            '`' | '~' => {
                self.start_raw(ch);
                self.state = State::FenceRun {
                    marker: ch,
                    count: 1,
                };
            }
            '-' | '*' | '_' | '=' | '+' => {
                self.start_raw(ch);
                self.state = State::LineRun {
                    marker: ch,
                    count: 1,
                    spaced: false,
                };
            }
            '0'..='9' => {
                self.start_raw(ch);
                self.state = State::Digits;
            }
            _ => {
                self.begin_content();
                self.inline_char(ch);
            }
        }
    }

    fn hashes_char(&mut self, n: usize, ch: char) {
        match ch {
            '#' => {
                self.start_raw(ch);
                self.state = State::Hashes(n + 1);
            }
            ' ' | '\t' | '\n' if n <= 6 => {
                let start = self.raw_start;
                let hashes = self.drop_raw();
                self.reset_inline_context();
                self.emit_marker(
                    TokenKind::AtxHeadingMarker,
                    hashes,
                    start,
                    Some(TokenMeta::Heading { level: n as u8 }),
                );
                self.line_has_content = true;
                self.state = State::Inline;
                self.skip_leading_space = true;
                if ch == '\n' {
                    self.inline_char(ch);
                }
            }
            _ => {
                self.literal_run();
                self.inline_char(ch);
            }
        }
    }

    fn line_run_char(&mut self, marker: char, count: usize, spaced: bool, ch: char) {
        if ch == marker && marker != '+' {
            self.start_raw(ch);
            self.state = State::LineRun {
                marker,
                count: count + 1,
                spaced,
            };
            return;
        }

        match ch {
            ' ' | '\t' if count == 1 && !spaced && matches!(marker, '-' | '*' | '+') => {
                let start = self.raw_start;
                self.drop_raw();
                self.reset_inline_context();
                let indent = self.indent;
                self.emit_marker(
                    TokenKind::ListMarker,
                    format!("{marker}{ch}"),
                    start,
                    Some(TokenMeta::List {
                        ordered: false,
                        indent,
                    }),
                );
                self.line_has_content = true;
                self.state = State::Inline;
                self.skip_leading_space = true;
            }
            ' ' | '\t' if marker != '+' => {
                self.start_raw(ch);
                self.state = State::LineRun {
                    marker,
                    count,
                    spaced: true,
                };
            }
            '\n' if count >= 3 && matches!(marker, '-' | '*' | '_') => {
                let start = self.raw_start;
                let rule = self.drop_raw();
                self.reset_inline_context();
                self.emit_marker(
                    TokenKind::HorizontalRule,
                    rule.trim_end(),
                    start,
                    Some(TokenMeta::Rule { marker }),
                );
                self.line_has_content = true;
                self.end_line(TokenKind::SoftBreak);
            }
            '\n' if marker == '=' => {
                let start = self.raw_start;
                let underline = self.drop_raw();
                self.reset_inline_context();
                self.emit_marker(
                    TokenKind::SetextUnderline,
                    underline.trim_end(),
                    start,
                    Some(TokenMeta::Heading { level: 1 }),
                );
                self.line_has_content = true;
                self.end_line(TokenKind::SoftBreak);
            }
            _ if marker == '*' && !spaced => {
                self.begin_content();
                self.resolve_stars(count);
                self.inline_char(ch);
            }
            _ => {
                self.literal_run();
                self.inline_char(ch);
            }
        }
    }

    /// `*` → italic, `**` → bold, `***` → bold then italic, longer → text.
    fn resolve_stars(&mut self, count: usize) {
        let start = self.raw_start;
        match count {
            1..=3 => {
                self.drop_raw();
                if count >= 2 {
                    self.emit_marker(TokenKind::BoldDelimiter, "**", start, None);
                }
                if count != 2 {
                    self.emit_marker(TokenKind::ItalicDelimiter, "*", start + count - 1, None);
                }
            }
            _ => self.raw_to_text(),
        }
    }

    fn digits_char(&mut self, ch: char) {
        match ch {
            '0'..='9' if self.raw().len() < 9 => self.start_raw(ch),
            '.' | ')' => {
                self.start_raw(ch);
                self.state = State::OrderedPunct(ch);
            }
            _ => {
                self.literal_run();
                self.inline_char(ch);
            }
        }
    }

    fn ordered_punct_char(&mut self, punct: char, ch: char) {
        if ch != ' ' && ch != '\t' {
            self.literal_run();
            return self.inline_char(ch);
        }
        let start = self.raw_start;
        let mut digits = self.drop_raw();
        digits.pop();
        let number = digits.parse::<u64>().unwrap_or(0);
        let punct_at = start + digits.chars().count();
        self.reset_inline_context();
        self.emit_marker(
            TokenKind::ListNumber,
            digits,
            start,
            Some(TokenMeta::Number(number)),
        );
        self.emit(
            TokenKind::ListMarker,
            format!("{punct}{ch}"),
            punct_at,
            Some(TokenMeta::List {
                ordered: true,
                indent: self.indent,
            }),
        );
        self.line_has_content = true;
        self.state = State::Inline;
        self.skip_leading_space = true;
    }

    fn fence_run_char(&mut self, marker: char, count: usize, ch: char) {
        if ch == marker {
            self.start_raw(ch);
            self.state = State::FenceRun {
                marker,
                count: count + 1,
            };
            return;
        }

        if count >= 3 {
            let start = self.raw_start;
            let run = self.drop_raw();
            self.reset_inline_context();
            self.emit_marker(
                TokenKind::CodeFence,
                run,
                start,
                Some(TokenMeta::Fence {
                    marker,
                    length: count,
                }),
            );
            self.fence = Some(Fence {
                marker,
                length: count,
                indent: self.indent,
                quotes: self.line_quotes,
            });
            self.state = State::FenceInfo;
            return self.fence_info_char(ch);
        }

        self.begin_content();
        match (marker, count) {
            ('`', 1) if ch != '\n' || self.in_code_span => self.code_delimiter(),
            ('~', 2) => {
                let start = self.raw_start;
                self.drop_raw();
                self.emit_marker(TokenKind::StrikethroughDelimiter, "~~", start, None);
            }
            _ => self.raw_to_text(),
        }
        self.inline_char(ch);
    }

    // === Inline ===

    fn inline_char(&mut self, ch: char) {
        self.state = State::Inline;
        let after_label = std::mem::take(&mut self.after_label);

        if self.skip_leading_space {
            if ch == ' ' || ch == '\t' {
                return;
            }
            self.skip_leading_space = false;
        }

        if self.in_code_span {
            match ch {
                '`' => {
                    self.start_raw(ch);
                    self.state = State::Backticks(1);
                }
                '\n' => self.line_break(),
                _ => self.push_text(ch),
            }
            return;
        }

        match ch {
            '\n' => self.line_break(),
            '\\' => {
                self.start_raw(ch);
                self.escape = true;
            }
            '*' => {
                self.start_raw(ch);
                self.state = State::Star;
            }
            '~' => {
                self.start_raw(ch);
                self.state = State::Tilde;
            }
            '`' => {
                self.start_raw(ch);
                self.state = State::Backticks(1);
            }
            '!' => {
                self.start_raw(ch);
                self.state = State::Bang;
            }
            '[' => {
                self.emit_marker(TokenKind::LinkTextOpen, "[", self.pos, None);
                self.bracket_depth += 1;
            }
            ']' if self.bracket_depth > 0 => {
                self.emit_marker(TokenKind::LinkTextClose, "]", self.pos, None);
                self.bracket_depth -= 1;
                self.after_label = true;
            }
            '(' if after_label => {
                self.emit_marker(TokenKind::LinkUrlOpen, "(", self.pos, None);
                self.state = State::Url { depth: 0 };
            }
            _ => self.push_text(ch),
        }
    }

    fn star_char(&mut self, ch: char) {
        let start = self.raw_start;
        self.drop_raw();
        if ch == '*' {
            self.emit_marker(TokenKind::BoldDelimiter, "**", start, None);
            self.state = State::Inline;
        } else {
            self.emit_marker(TokenKind::ItalicDelimiter, "*", start, None);
            self.inline_char(ch);
        }
    }

    fn tilde_char(&mut self, ch: char) {
        if ch == '~' {
            let start = self.raw_start;
            self.drop_raw();
            self.emit_marker(TokenKind::StrikethroughDelimiter, "~~", start, None);
            self.state = State::Inline;
        } else {
            self.raw_to_text();
            self.inline_char(ch);
        }
    }

    fn backticks_char(&mut self, n: usize, ch: char) {
        if ch == '`' {
            self.start_raw(ch);
            self.state = State::Backticks(n + 1);
            return;
        }
        if n == 1 {
            self.code_delimiter();
        } else {
            self.raw_to_text();
        }
        self.inline_char(ch);
    }

    fn code_delimiter(&mut self) {
        let start = self.raw_start;
        self.drop_raw();
        self.emit_marker(TokenKind::CodeDelimiter, "`", start, None);
        self.in_code_span = !self.in_code_span;
    }

    fn bang_char(&mut self, ch: char) {
        if ch == '[' {
            let start = self.raw_start;
            self.drop_raw();
            self.emit_marker(TokenKind::ImageMarker, "!", start, None);
            self.emit(TokenKind::LinkTextOpen, "[", self.pos, None);
            self.bracket_depth += 1;
            self.state = State::Inline;
        } else {
            self.raw_to_text();
            self.inline_char(ch);
        }
    }

    fn url_char(&mut self, depth: usize, ch: char) {
        match ch {
            ')' if depth == 0 => {
                self.emit_marker(TokenKind::LinkUrlClose, ")", self.pos, None);
                self.state = State::Inline;
            }
            ')' => {
                self.push_text(ch);
                self.state = State::Url { depth: depth - 1 };
            }
            '(' => {
                self.push_text(ch);
                self.state = State::Url { depth: depth + 1 };
            }
            '\n' => self.inline_char(ch),
            _ => self.push_text(ch),
        }
    }

    // === Line ends ===

    /// Drops trailing blanks from the text run, returning how many spaces.
    fn trim_trailing_space(&mut self) -> usize {
        let text = &self.buf[..self.text_end];
        let trimmed = text.trim_end_matches([' ', '\t']).len();
        let spaces = text[trimmed..].chars().filter(|c| *c == ' ').count();
        self.buf.truncate(trimmed);
        self.text_end = trimmed;
        spaces
    }

    fn line_break(&mut self) {
        let spaces = self.trim_trailing_space();
        self.flush_text();
        let kind = if !self.line_has_content {
            TokenKind::Newline
        } else if spaces >= 2 {
            TokenKind::HardBreak
        } else {
            TokenKind::SoftBreak
        };
        self.end_line(kind);
    }

    fn end_line(&mut self, kind: TokenKind) {
        self.emit(kind, "\n", self.pos, None);
        if kind == TokenKind::Newline {
            self.reset_inline_context();
        }
        self.state = State::LineStart;
        self.indent = 0;
        self.line_quotes = 0;
        self.line_has_content = false;
        self.skip_one_space = false;
        self.skip_leading_space = false;
        self.after_label = false;
    }

    // === Fenced code ===

    fn fence_info_char(&mut self, ch: char) {
        if ch != '\n' {
            return self.push_text(ch);
        }
        let info = self.buf.trim().to_string();
        self.buf.clear();
        self.text_end = 0;
        if !info.is_empty() {
            self.emit(TokenKind::Text, info, self.text_start, None);
        }
        self.emit(TokenKind::Newline, "\n", self.pos, None);
        self.start_code_line();
    }

    fn start_code_line(&mut self) {
        let quotes_left = self.fence.map_or(0, |f| f.quotes);
        self.skip_one_space = false;
        self.state = State::Code(CodeLine::Start {
            quotes_left,
            spaces: 0,
        });
    }

    fn code_char(&mut self, line: CodeLine, ch: char) {
        let Some(fence) = self.fence else {
            self.state = State::Inline;
            return self.inline_char(ch);
        };

        match line {
            CodeLine::Start {
                quotes_left,
                spaces,
            } => match ch {
                c if quotes_left > 0 && c != '>' && c != ' ' => {
                    self.skip_one_space = false;
                    self.close_quoted_fence(fence.quotes - quotes_left);
                    self.line_start_char(c);
                }
                '>' if quotes_left > 0 && self.raw().is_empty() => {
                    self.skip_one_space = true;
                    self.state = State::Code(CodeLine::Start {
                        quotes_left: quotes_left - 1,
                        spaces,
                    });
                }
                ' ' if self.skip_one_space => self.skip_one_space = false,
                ' ' if spaces < fence.indent.max(3) => {
                    self.start_raw(ch);
                    self.state = State::Code(CodeLine::Start {
                        quotes_left: 0,
                        spaces: spaces + 1,
                    });
                }
                '\n' => {
                    self.settle_code_indent(fence.indent);
                    self.end_code_line();
                }
                c if c == fence.marker => {
                    self.skip_one_space = false;
                    self.start_raw(ch);
                    self.state = State::Code(CodeLine::Closing {
                        count: 1,
                        trailing: false,
                    });
                }
                _ => {
                    self.skip_one_space = false;
                    self.settle_code_indent(fence.indent);
                    self.push_text(ch);
                    self.state = State::Code(CodeLine::Body);
                }
            },
            CodeLine::Closing { count, trailing } => match ch {
                c if c == fence.marker && !trailing => {
                    self.start_raw(ch);
                    self.state = State::Code(CodeLine::Closing {
                        count: count + 1,
                        trailing,
                    });
                }
                ' ' | '\t' => {
                    self.start_raw(ch);
                    self.state = State::Code(CodeLine::Closing {
                        count,
                        trailing: true,
                    });
                }
                '\n' if count >= fence.length => {
                    let start = self.raw_start;
                    let run = self.drop_raw();
                    self.flush_as(TokenKind::CodeContent);
                    self.emit(
                        TokenKind::CodeFence,
                        run.trim(),
                        start,
                        Some(TokenMeta::Fence {
                            marker: fence.marker,
                            length: count,
                        }),
                    );
                    self.fence = None;
                    self.line_has_content = true;
                    self.end_line(TokenKind::SoftBreak);
                }
                '\n' => {
                    self.settle_code_indent(fence.indent);
                    self.end_code_line();
                }
                _ => {
                    self.settle_code_indent(fence.indent);
                    self.push_text(ch);
                    self.state = State::Code(CodeLine::Body);
                }
            },
            CodeLine::Body => {
                if ch == '\n' {
                    self.end_code_line();
                } else {
                    self.push_text(ch);
                }
            }
        }
    }

    /// Turns the pending raw line prefix into content, minus the fence's own
    /// indentation.
    fn settle_code_indent(&mut self, fence_indent: usize) {
        let raw = self.drop_raw();
        let strip = raw.chars().take(fence_indent).take_while(|c| *c == ' ').count();
        if raw.len() > strip {
            if self.text_end == 0 {
                self.text_start = self.raw_start + strip;
            }
            self.buf.push_str(&raw[strip..]);
            self.text_end = self.buf.len();
        }
    }

    /// A line inside a quoted fence is missing some of its `>` markers, so the
    /// quote and the fence end here. Replays the markers already read.
    fn close_quoted_fence(&mut self, quotes_seen: usize) {
        self.flush_as(TokenKind::CodeContent);
        self.emit(TokenKind::CodeFence, "", self.pos, None);
        self.fence = None;
        self.state = State::LineStart;
        self.indent = 0;
        self.line_quotes = quotes_seen;
        for _ in 0..quotes_seen {
            self.emit(TokenKind::BlockquoteMarker, ">", self.pos, None);
        }
    }

    fn end_code_line(&mut self) {
        self.flush_as(TokenKind::CodeContent);
        self.emit(TokenKind::Newline, "\n", self.pos, None);
        self.start_code_line();
    }
}
