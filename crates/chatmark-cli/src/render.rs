//! Turns a document tree into styled terminal lines.

use std::sync::Arc;

use chatmark_core::{Node, NodeKind};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub fn render(tree: &Node) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    render_flow(&tree.children, "", "", true, &mut out);
    out
}

/// Renders a container's children. Adjacent inline children are laid out
/// together as one paragraph; `first` prefixes the first line produced.
fn render_flow(
    children: &[Arc<Node>],
    first: &str,
    rest: &str,
    spaced: bool,
    out: &mut Vec<Line<'static>>,
) {
    let start = out.len();
    let mut i = 0;
    while i < children.len() {
        let tight = i > 0 && is_item(&children[i - 1]) && is_item(&children[i]);
        if spaced && !tight && out.len() > start {
            out.push(Line::from(rest.trim_end().to_string()));
        }
        let lead = if out.len() == start { first } else { rest };

        let run = children[i..]
            .iter()
            .take_while(|c| !c.kind.is_block())
            .count();
        if run > 0 {
            let nodes = children[i..i + run].iter().map(|c| &**c);
            render_inline(nodes, Style::default(), lead, rest, out);
            i += run;
        } else {
            render_block(&children[i], lead, rest, out);
            i += 1;
        }
    }
}

fn is_item(node: &Node) -> bool {
    matches!(node.kind, NodeKind::ListItem { .. })
}

fn render_block(node: &Node, first: &str, rest: &str, out: &mut Vec<Line<'static>>) {
    match &node.kind {
        NodeKind::Paragraph => render_inline(children(node), Style::default(), first, rest, out),
        NodeKind::Heading { level } => {
            let style = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            let lead = format!("{first}{} ", "#".repeat(usize::from(*level)));
            render_inline(children(node), style, &lead, rest, out);
        }
        NodeKind::CodeBlock { content, language } => {
            let fence = Style::default().fg(Color::DarkGray);
            let code = Style::default().fg(Color::Green);
            out.push(Line::from(vec![
                Span::raw(first.to_string()),
                Span::styled(format!("```{}", language.as_deref().unwrap_or("")), fence),
            ]));
            for line in content.split('\n') {
                out.push(Line::from(vec![
                    Span::raw(rest.to_string()),
                    Span::styled(line.to_string(), code),
                ]));
            }
            out.push(Line::from(vec![
                Span::raw(rest.to_string()),
                Span::styled("```", fence),
            ]));
        }
        NodeKind::ListItem { number, .. } => {
            let marker = match number {
                Some(n) => format!("{n}. "),
                None => "• ".to_string(),
            };
            let pad = " ".repeat(marker.chars().count());
            render_flow(
                &node.children,
                &format!("{first}{marker}"),
                &format!("{rest}{pad}"),
                false,
                out,
            );
        }
        NodeKind::Blockquote => {
            render_flow(
                &node.children,
                &format!("{first}│ "),
                &format!("{rest}│ "),
                true,
                out,
            );
        }
        NodeKind::HorizontalRule => {
            out.push(Line::from(format!("{first}{}", "─".repeat(24))));
        }
        _ => render_inline([node], Style::default(), first, rest, out),
    }
}

/// Lays out inline nodes, starting a new terminal line at every `\n` in text
/// and at hard breaks.
fn render_inline<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    base: Style,
    first: &str,
    rest: &str,
    out: &mut Vec<Line<'static>>,
) {
    let mut lines = vec![vec![Span::raw(first.to_string())]];
    for node in nodes {
        walk_inline(node, base, rest, &mut lines);
    }
    out.extend(lines.into_iter().map(Line::from));
}

fn children(node: &Node) -> impl Iterator<Item = &Node> {
    node.children.iter().map(|c| &**c)
}

fn walk_inline(node: &Node, style: Style, rest: &str, lines: &mut Vec<Vec<Span<'static>>>) {
    let push = |text: &str, style: Style, lines: &mut Vec<Vec<Span<'static>>>| {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                lines.push(vec![Span::raw(rest.to_string())]);
            }
            if !part.is_empty()
                && let Some(line) = lines.last_mut()
            {
                line.push(Span::styled(part.to_string(), style));
            }
        }
    };

    match &node.kind {
        NodeKind::Text { content } => push(content, style, lines),
        NodeKind::CodeInline { content } => {
            push(content, style.fg(Color::Yellow), lines);
        }
        NodeKind::HardBreak => push("\n", style, lines),
        NodeKind::Image { alt, .. } => {
            push(&format!("[image: {alt}]"), style.fg(Color::Magenta), lines);
        }
        kind => {
            let style = match kind {
                NodeKind::Strong => style.add_modifier(Modifier::BOLD),
                NodeKind::Emphasis => style.add_modifier(Modifier::ITALIC),
                NodeKind::Strikethrough => style.add_modifier(Modifier::CROSSED_OUT),
                NodeKind::Link { .. } => style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                _ => style,
            };
            for child in &node.children {
                walk_inline(child, style, rest, lines);
            }
        }
    }
}
