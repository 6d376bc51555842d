//! The document tree.
//!
//! Containers own their children through [`Arc`], which lets a tentative
//! view share every subtree it does not touch with the committed tree. All
//! mutation goes through [`Arc::make_mut`], so writing to a node that a
//! tentative view still holds copies that one node instead of corrupting
//! the view.

use std::fmt;
use std::sync::Arc;

/// A shared handle to a document root.
pub type Tree = Arc<Node>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading {
        level: u8,
    },
    CodeBlock {
        content: String,
        language: Option<String>,
    },
    CodeInline {
        content: String,
    },
    Strong,
    Emphasis,
    Strikethrough,
    Link {
        url: String,
    },
    Image {
        url: String,
        alt: String,
    },
    ListItem {
        ordered: bool,
        number: Option<u64>,
        depth: usize,
    },
    Blockquote,
    HorizontalRule,
    HardBreak,
    Text {
        content: String,
    },
}

impl NodeKind {
    /// Kinds that hold inline content directly.
    pub fn holds_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::Strong
                | NodeKind::Emphasis
                | NodeKind::Strikethrough
                | NodeKind::Link { .. }
                | NodeKind::Image { .. }
        )
    }

    /// Kinds that hold blocks (list items hold either).
    pub fn holds_blocks(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Blockquote | NodeKind::ListItem { .. }
        )
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            NodeKind::Text { .. }
                | NodeKind::CodeBlock { .. }
                | NodeKind::CodeInline { .. }
                | NodeKind::HorizontalRule
                | NodeKind::HardBreak
        )
    }

    /// Block-level kinds (the ones that cannot sit inside a paragraph).
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::Paragraph
                | NodeKind::Heading { .. }
                | NodeKind::CodeBlock { .. }
                | NodeKind::ListItem { .. }
                | NodeKind::Blockquote
                | NodeKind::HorizontalRule
        )
    }

    fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::CodeBlock { .. } => "code_block",
            NodeKind::CodeInline { .. } => "code_inline",
            NodeKind::Strong => "strong",
            NodeKind::Emphasis => "emphasis",
            NodeKind::Strikethrough => "strikethrough",
            NodeKind::Link { .. } => "link",
            NodeKind::Image { .. } => "image",
            NodeKind::ListItem { .. } => "list_item",
            NodeKind::Blockquote => "blockquote",
            NodeKind::HorizontalRule => "horizontal_rule",
            NodeKind::HardBreak => "hard_break",
            NodeKind::Text { .. } => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub children: Vec<Arc<Node>>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn document() -> Self {
        Self::new(NodeKind::Document)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(NodeKind::Text {
            content: content.into(),
        })
    }

    pub fn with_children(kind: NodeKind, children: Vec<Node>) -> Self {
        Self {
            kind,
            children: children.into_iter().map(Arc::new).collect(),
        }
    }

    /// Appends `s` to the trailing text child, or starts a new one.
    pub fn push_text(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        // Checked before make_mut so a shared non-text sibling is never copied.
        let ends_with_text = matches!(
            self.children.last().map(|c| &c.kind),
            Some(NodeKind::Text { .. })
        );
        if ends_with_text
            && let Some(last) = self.children.last_mut()
            && let NodeKind::Text { content } = &mut Arc::make_mut(last).kind
        {
            content.push_str(s);
            return;
        }
        self.children.push(Arc::new(Node::text(s)));
    }

    /// Appends a child, folding text into a trailing text child.
    pub fn push_child(&mut self, child: Arc<Node>) {
        if let NodeKind::Text { content } = &child.kind {
            self.push_text(content);
        } else {
            self.children.push(child);
        }
    }

    pub fn last_child(&self) -> Option<&Node> {
        self.children.last().map(|c| c.as_ref())
    }

    /// Mutable access to the last child, copying it first if shared.
    pub fn last_child_mut(&mut self) -> Option<&mut Node> {
        self.children.last_mut().map(Arc::make_mut)
    }

    /// True when this list item or container already holds a block child.
    pub fn has_block_children(&self) -> bool {
        self.children.iter().any(|c| c.kind.is_block())
    }

    /// Concatenated text of this subtree, as a renderer would show it.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.kind {
            NodeKind::Text { content }
            | NodeKind::CodeInline { content }
            | NodeKind::CodeBlock { content, .. } => out.push_str(content),
            NodeKind::Image { alt, .. } => out.push_str(alt),
            NodeKind::HardBreak => out.push('\n'),
            _ => {}
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    /// Total node count of the subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Indented one-node-per-line dump, used by snapshot tests and the CLI.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, indent: usize) {
        out.push_str(&"  ".repeat(indent));
        out.push_str(self.kind.name());
        match &self.kind {
            NodeKind::Heading { level } => out.push_str(&format!(" level={level}")),
            NodeKind::CodeBlock { content, language } => {
                if let Some(lang) = language {
                    out.push_str(&format!(" lang={lang}"));
                }
                out.push_str(&format!(" {content:?}"));
            }
            NodeKind::CodeInline { content } | NodeKind::Text { content } => {
                out.push_str(&format!(" {content:?}"));
            }
            NodeKind::Link { url } => out.push_str(&format!(" url={url:?}")),
            NodeKind::Image { url, alt } => out.push_str(&format!(" url={url:?} alt={alt:?}")),
            NodeKind::ListItem {
                number, depth, ..
            } => {
                out.push_str(&format!(" depth={depth}"));
                if let Some(n) = number {
                    out.push_str(&format!(" number={n}"));
                }
            }
            _ => {}
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(out, indent + 1);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.outline())
    }
}
