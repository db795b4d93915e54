//! Presentation of form content.
//!
//! - [`markdown`] classifies AI narrative text line by line
//! - [`report`] serializes the whole form into a static HTML document

pub mod markdown;
pub mod report;

pub use markdown::{blocks_to_html, blocks_to_text, render_blocks, Block};
pub use report::render_full_report;

/// Escape the five HTML-significant characters.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}
