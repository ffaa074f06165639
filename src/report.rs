//! PDF export of generated summaries.
//!
//! All three report variants share one renderer. A [`ReportTemplate`] picks the
//! heading, whether the source URL is printed, and the output file suffix.

use crate::error::Result;
use crate::rag::SummaryKind;
use crate::storage::DataLayout;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Pt};
use std::path::PathBuf;
use tracing::{info, instrument};

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const MARGIN_PT: f32 = 40.0;
const HEADING_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 12.0;
const LEADING_PT: f32 = 14.4;
/// Average Helvetica glyph width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Per-variant report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportTemplate {
    pub heading: &'static str,
    pub show_source_url: bool,
    pub file_suffix: &'static str,
}

impl ReportTemplate {
    pub fn for_kind(kind: SummaryKind) -> Self {
        match kind {
            SummaryKind::Brief => Self {
                heading: "YouTube Video Summary",
                show_source_url: true,
                file_suffix: "summary",
            },
            SummaryKind::Detailed => Self {
                heading: "Detailed Explanation",
                show_source_url: false,
                file_suffix: "detailed",
            },
            SummaryKind::Breakdown => Self {
                heading: "Time-Aligned Breakdown",
                show_source_url: false,
                file_suffix: "breakdown",
            },
        }
    }

    pub fn file_name(&self, video_id: &str) -> String {
        format!("{}_{}.pdf", video_id, self.file_suffix)
    }

    /// Body text as printed, including the summary preamble where the template has one.
    fn body(&self, text: &str) -> String {
        if self.show_source_url {
            format!("Summary:\n\n{}", text)
        } else {
            text.to_string()
        }
    }

    /// Baseline of the first body line on the first page.
    fn body_top(&self) -> f32 {
        if self.show_source_url {
            PAGE_HEIGHT_PT - 120.0
        } else {
            PAGE_HEIGHT_PT - 80.0
        }
    }
}

/// Render a report and write it to `pdfs/<id>_<suffix>.pdf`.
#[instrument(skip(layout, text, url), fields(kind = %kind))]
pub fn export_report(
    layout: &DataLayout,
    video_id: &str,
    kind: SummaryKind,
    text: &str,
    url: &str,
) -> Result<PathBuf> {
    let template = ReportTemplate::for_kind(kind);
    let bytes = render_report(&template, text, url)?;

    let dir = layout.pdfs_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(template.file_name(video_id));
    std::fs::write(&path, bytes)?;

    info!("Wrote report to {}", path.display());
    Ok(path)
}

/// Render a report to PDF bytes.
pub fn render_report(template: &ReportTemplate, text: &str, url: &str) -> Result<Vec<u8>> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        template.heading,
        Mm::from(Pt(PAGE_WIDTH_PT)),
        Mm::from(Pt(PAGE_HEIGHT_PT)),
        "Layer 1",
    );
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let header = doc.get_page(first_page).get_layer(first_layer);
    draw(&header, template.heading, HEADING_SIZE, PAGE_HEIGHT_PT - MARGIN_PT, &bold);
    if template.show_source_url {
        draw(&header, &format!("URL: {}", url), BODY_SIZE, PAGE_HEIGHT_PT - 80.0, &regular);
    }

    let lines = wrap_lines(&template.body(text), max_chars_per_line());
    let pages = paginate(&lines, template.body_top());

    for (i, page_lines) in pages.iter().enumerate() {
        let (layer, top) = if i == 0 {
            (doc.get_page(first_page).get_layer(first_layer), template.body_top())
        } else {
            let (page, layer) = doc.add_page(
                Mm::from(Pt(PAGE_WIDTH_PT)),
                Mm::from(Pt(PAGE_HEIGHT_PT)),
                "Layer 1",
            );
            (doc.get_page(page).get_layer(layer), PAGE_HEIGHT_PT - MARGIN_PT)
        };

        for (n, line) in page_lines.iter().enumerate() {
            let y = top - n as f32 * LEADING_PT;
            draw(&layer, line, BODY_SIZE, y, &regular);
        }
    }

    Ok(doc.save_to_bytes()?)
}

fn draw(layer: &PdfLayerReference, text: &str, size: f32, y_pt: f32, font: &IndirectFontRef) {
    if text.is_empty() {
        return;
    }
    layer.use_text(text, size, Mm::from(Pt(MARGIN_PT)), Mm::from(Pt(y_pt)), font);
}

fn max_chars_per_line() -> usize {
    let text_width = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
    (text_width / (BODY_SIZE * AVG_GLYPH_WIDTH)).floor() as usize
}

/// Wrap text at word boundaries. Explicit newlines are kept and blank lines survive.
/// Words longer than a line are hard-split.
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current);
    }

    lines
}

/// Split lines into pages. The first page starts at `first_top`, later pages at the top
/// margin, and every page stops at the bottom margin.
pub fn paginate(lines: &[String], first_top: f32) -> Vec<Vec<String>> {
    let per_page = |top: f32| (((top - MARGIN_PT) / LEADING_PT).floor() as usize + 1).max(1);

    let mut pages = Vec::new();
    let mut remaining = lines;
    let mut capacity = per_page(first_top);

    loop {
        let take = capacity.min(remaining.len());
        pages.push(remaining[..take].to_vec());
        remaining = &remaining[take..];
        if remaining.is_empty() {
            break;
        }
        capacity = per_page(PAGE_HEIGHT_PT - MARGIN_PT);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates() {
        let brief = ReportTemplate::for_kind(SummaryKind::Brief);
        assert_eq!(brief.heading, "YouTube Video Summary");
        assert!(brief.show_source_url);
        assert_eq!(brief.file_name("abc"), "abc_summary.pdf");
        assert_eq!(brief.body("text"), "Summary:\n\ntext");

        let detailed = ReportTemplate::for_kind(SummaryKind::Detailed);
        assert_eq!(detailed.heading, "Detailed Explanation");
        assert_eq!(detailed.body("text"), "text");
        assert_eq!(detailed.file_name("abc"), "abc_detailed.pdf");

        let breakdown = ReportTemplate::for_kind(SummaryKind::Breakdown);
        assert_eq!(breakdown.heading, "Time-Aligned Breakdown");
        assert_eq!(breakdown.file_name("abc"), "abc_breakdown.pdf");
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "the quick brown fox jumps over the lazy dog";
        let lines = wrap_lines(text, 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_keeps_blank_lines() {
        let lines = wrap_lines("Summary:\n\nbody", 80);
        assert_eq!(lines, vec!["Summary:", "", "body"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_lines("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_short_text_fits_one_page() {
        let lines = wrap_lines("a short summary", max_chars_per_line());
        let pages = paginate(&lines, PAGE_HEIGHT_PT - 120.0);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_long_text_overflows_to_more_pages() {
        let lines: Vec<String> = (0..200).map(|i| format!("line {}", i)).collect();
        let pages = paginate(&lines, PAGE_HEIGHT_PT - 80.0);
        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 200);
        assert_eq!(pages[1][0], format!("line {}", pages[0].len()));
    }

    #[test]
    fn test_export_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let layout = DataLayout::new(dir.path());

        let path = export_report(
            &layout,
            "abc",
            SummaryKind::Brief,
            "A short summary.",
            "https://x/watch?v=abc",
        )
        .unwrap();

        assert_eq!(path, layout.pdfs_dir().join("abc_summary.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
