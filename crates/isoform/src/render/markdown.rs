//! Markdown-lite block classifier for AI narrative text.
//!
//! The AI is asked for `###` headings and `-`/`1.` lists, but answers vary.
//! Every line maps to exactly one [`Block`]; there is no failure path.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use super::escape_html;

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.)\s*").expect("numbered-item pattern is valid"));

/// One displayed line of narrative text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Section heading.
    Heading(String),
    /// Unordered list item.
    BulletItem(String),
    /// Ordered list item, `label` like `"1."`.
    NumberedItem {
        /// The number and dot as written.
        label: String,
        /// Item text.
        content: String,
    },
    /// Blank line.
    Spacer,
    /// Anything else, verbatim after trimming.
    Paragraph(String),
}

fn classify(line: &str) -> Block {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Block::Spacer;
    }

    if trimmed.starts_with("###") || trimmed.starts_with('【') {
        let text = trimmed.replace("###", "").replace('*', "");
        return Block::Heading(text.trim().to_string());
    }

    if let Some(rest) = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('*'))
        .or_else(|| trimmed.strip_prefix('•'))
    {
        return Block::BulletItem(rest.trim_start().replace("**", ""));
    }

    if let Some(caps) = NUMBERED.captures(trimmed) {
        let label = caps[1].to_string();
        let rest = &trimmed[caps[0].len()..];
        return Block::NumberedItem {
            label,
            content: rest.replace("**", ""),
        };
    }

    Block::Paragraph(trimmed.to_string())
}

/// Classify every line of `text`.
#[must_use]
pub fn render_blocks(text: &str) -> Vec<Block> {
    text.lines().map(classify).collect()
}

/// Present blocks as an HTML fragment.
#[must_use]
pub fn blocks_to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        let _ = match block {
            Block::Heading(text) => writeln!(out, "<h4>{}</h4>", escape_html(text)),
            Block::BulletItem(text) => {
                writeln!(out, "<div class=\"bullet\">• {}</div>", escape_html(text))
            }
            Block::NumberedItem { label, content } => writeln!(
                out,
                "<div class=\"numbered\"><span>{}</span> {}</div>",
                escape_html(label),
                escape_html(content)
            ),
            Block::Spacer => writeln!(out, "<div class=\"spacer\"></div>"),
            Block::Paragraph(text) => writeln!(out, "<p>{}</p>", escape_html(text)),
        };
    }
    out
}

/// Present blocks as plain terminal text.
#[must_use]
pub fn blocks_to_text(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        let _ = match block {
            Block::Heading(text) => writeln!(out, "== {text} =="),
            Block::BulletItem(text) => writeln!(out, "  • {text}"),
            Block::NumberedItem { label, content } => writeln!(out, "  {label} {content}"),
            Block::Spacer => writeln!(out),
            Block::Paragraph(text) => writeln!(out, "{text}"),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_strips_markers() {
        assert_eq!(
            render_blocks("### **Overall risk**"),
            vec![Block::Heading("Overall risk".to_string())]
        );
        assert_eq!(
            render_blocks("【Structure】"),
            vec![Block::Heading("【Structure】".to_string())]
        );
    }

    #[test]
    fn test_bullets() {
        let blocks = render_blocks("- **North side**: heavy smoke\n*   roof sagging\n• exit blocked");
        assert_eq!(
            blocks,
            vec![
                Block::BulletItem("North side: heavy smoke".to_string()),
                Block::BulletItem("roof sagging".to_string()),
                Block::BulletItem("exit blocked".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbered_item() {
        assert_eq!(
            render_blocks("12. **IC**: withdraw interior crews"),
            vec![Block::NumberedItem {
                label: "12.".to_string(),
                content: "IC: withdraw interior crews".to_string(),
            }]
        );
    }

    #[test]
    fn test_number_without_dot_is_paragraph() {
        assert_eq!(
            render_blocks("2 crews on side 3"),
            vec![Block::Paragraph("2 crews on side 3".to_string())]
        );
    }

    #[test]
    fn test_blank_lines_become_spacers() {
        let blocks = render_blocks("a\n\n   \nb");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph("a".to_string()),
                Block::Spacer,
                Block::Spacer,
                Block::Paragraph("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_paragraph_keeps_emphasis() {
        assert_eq!(
            render_blocks("  Hold **position**  "),
            vec![Block::Paragraph("Hold **position**".to_string())]
        );
    }

    #[test]
    fn test_empty_text_has_no_blocks() {
        assert!(render_blocks("").is_empty());
    }

    #[test]
    fn test_blocks_to_html_escapes() {
        let html = blocks_to_html(&render_blocks("### A & B\n- <script>"));
        assert!(html.contains("<h4>A &amp; B</h4>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_blocks_to_text() {
        let text = blocks_to_text(&render_blocks("### Risk\n1. collapse\n- smoke"));
        assert_eq!(text, "== Risk ==\n  1. collapse\n  • smoke\n");
    }
}
