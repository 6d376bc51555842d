use crate::ast::NodeKind;

/// Progress of a link or image frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkState {
    /// Collecting the bracketed label.
    Label,
    /// Saw `]`; only `(` keeps this a link.
    AwaitingUrl,
    /// Collecting the URL.
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameKind {
    Blockquote,
    ListItem {
        /// Nesting depth recorded on the node (clamped).
        depth: usize,
        /// Unclamped `indent / list_indent_width`, used to find siblings.
        level: usize,
        /// Column where the item's content starts.
        content_indent: usize,
        /// Inline content is flowing directly into the item.
        inline_open: bool,
    },
    Paragraph,
    Heading,
    CodeBlock,
    CodeInline,
    Strong,
    Emphasis,
    Strikethrough,
    Link,
    Image,
}

impl FrameKind {
    pub(crate) fn is_container(&self) -> bool {
        matches!(self, FrameKind::Blockquote | FrameKind::ListItem { .. })
    }

    /// Frames that live inside a paragraph or heading.
    pub(crate) fn is_span(&self) -> bool {
        matches!(
            self,
            FrameKind::Strong
                | FrameKind::Emphasis
                | FrameKind::Strikethrough
                | FrameKind::CodeInline
                | FrameKind::Link
                | FrameKind::Image
        )
    }

    pub(crate) fn is_link(&self) -> bool {
        matches!(self, FrameKind::Link | FrameKind::Image)
    }

    /// Source text of the delimiter that opens this span.
    pub(crate) fn delimiter(&self) -> &'static str {
        match self {
            FrameKind::Strong => "**",
            FrameKind::Emphasis => "*",
            FrameKind::Strikethrough => "~~",
            FrameKind::CodeInline => "`",
            FrameKind::Link => "[",
            FrameKind::Image => "![",
            _ => "",
        }
    }

    /// The node a freshly opened frame of this kind starts as.
    pub(crate) fn initial_node(&self) -> NodeKind {
        match self {
            FrameKind::Strong => NodeKind::Strong,
            FrameKind::Emphasis => NodeKind::Emphasis,
            FrameKind::Strikethrough => NodeKind::Strikethrough,
            FrameKind::CodeInline => NodeKind::CodeInline {
                content: String::new(),
            },
            FrameKind::Link => NodeKind::Link { url: String::new() },
            FrameKind::Image => NodeKind::Image {
                url: String::new(),
                alt: String::new(),
            },
            FrameKind::Paragraph => NodeKind::Paragraph,
            FrameKind::Heading => NodeKind::Heading { level: 1 },
            FrameKind::CodeBlock => NodeKind::CodeBlock {
                content: String::new(),
                language: None,
            },
            FrameKind::Blockquote => NodeKind::Blockquote,
            FrameKind::ListItem { depth, .. } => NodeKind::ListItem {
                ordered: false,
                number: None,
                depth: *depth,
            },
        }
    }
}

/// An open construct. Its node is always the last child of the node of the
/// frame below it (or of the document), at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    pub(crate) kind: FrameKind,
    pub(crate) index: usize,
    pub(crate) link: Option<LinkState>,
}

impl Frame {
    pub(crate) fn new(kind: FrameKind, index: usize) -> Self {
        let link = kind.is_link().then_some(LinkState::Label);
        Self { kind, index, link }
    }
}
