//! Report export.
//!
//! The report HTML is handed to a [`DocumentRenderer`] and the resulting
//! bytes are written next to their final name first, then renamed into
//! place. A failed render or write never leaves a partial report behind.

use std::fmt;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::form::FormState;
use crate::render::render_full_report;

/// Fixed page geometry for exported reports, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Page width.
    pub width_mm: f32,
    /// Page height.
    pub height_mm: f32,
    /// Top margin.
    pub margin_top_mm: f32,
    /// Right margin.
    pub margin_right_mm: f32,
    /// Bottom margin.
    pub margin_bottom_mm: f32,
    /// Left margin.
    pub margin_left_mm: f32,
}

impl PageLayout {
    /// A4 portrait with the report margins.
    pub const A4_PORTRAIT: Self = Self {
        width_mm: 210.0,
        height_mm: 297.0,
        margin_top_mm: 10.0,
        margin_right_mm: 8.0,
        margin_bottom_mm: 14.0,
        margin_left_mm: 8.0,
    };

    /// CSS `@page` rule for this layout.
    #[must_use]
    pub fn css(&self) -> String {
        format!(
            "@page {{ size: {}mm {}mm; margin: {}mm {}mm {}mm {}mm; }}",
            self.width_mm,
            self.height_mm,
            self.margin_top_mm,
            self.margin_right_mm,
            self.margin_bottom_mm,
            self.margin_left_mm
        )
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::A4_PORTRAIT
    }
}

/// Turns report HTML into a document file.
pub trait DocumentRenderer: fmt::Debug {
    /// Produce the document bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be produced.
    fn render(&self, html: &str, layout: &PageLayout) -> Result<Vec<u8>>;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;
}

/// Self-contained HTML ready for a browser's print-to-PDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintableHtml;

impl DocumentRenderer for PrintableHtml {
    fn render(&self, html: &str, layout: &PageLayout) -> Result<Vec<u8>> {
        let page_style = format!("<style>\n{}\n</style>\n", layout.css());
        let Some(at) = html.find("</head>") else {
            return Err(Error::export("report has no <head> section"));
        };
        let mut out = String::with_capacity(html.len() + page_style.len());
        out.push_str(&html[..at]);
        out.push_str(&page_style);
        out.push_str(&html[at..]);
        Ok(out.into_bytes())
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

/// File name for a report generated at `now`.
#[must_use]
pub fn report_file_name(now: NaiveDateTime, extension: &str) -> String {
    format!("ISO_Report_{}.{extension}", now.format("%Y-%m-%dT%H%M"))
}

/// Render `state` and save it under `out_dir`.
///
/// An existing report with the same name is replaced.
///
/// # Errors
///
/// Returns [`Error::Export`] if rendering fails, or an I/O error if the
/// directory or file cannot be written.
pub fn export_report(
    state: &FormState,
    renderer: &dyn DocumentRenderer,
    out_dir: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let layout = PageLayout::A4_PORTRAIT;
    let html = render_full_report(state, now);
    let bytes = renderer.render(&html, &layout)?;

    std::fs::create_dir_all(out_dir).map_err(|source| Error::DirectoryCreate {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let target = out_dir.join(report_file_name(now, renderer.extension()));

    let mut tmp = NamedTempFile::new_in(out_dir)?;
    tmp.write_all(&bytes)?;
    tmp.as_file().sync_all()?;
    debug!(bytes = bytes.len(), tmp = %tmp.path().display(), "Report written");
    tmp.persist(&target)
        .map_err(|e| Error::export(format!("failed to save {}: {}", target.display(), e.error)))?;

    info!(path = %target.display(), "Report exported");
    Ok(target)
}
