/// Knobs shared by the tokenizer and the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Spaces of marker indentation per list nesting level.
    pub list_indent_width: usize,
    /// Columns a tab advances leading indentation by.
    pub tab_width: usize,
}

impl ParserOptions {
    pub const DEFAULT_LIST_INDENT_WIDTH: usize = 2;
    pub const DEFAULT_TAB_WIDTH: usize = 4;

    /// List depth for a marker at column `indent`.
    pub fn list_depth(&self, indent: usize) -> usize {
        indent / self.list_indent_width.max(1)
    }
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            list_indent_width: Self::DEFAULT_LIST_INDENT_WIDTH,
            tab_width: Self::DEFAULT_TAB_WIDTH,
        }
    }
}
