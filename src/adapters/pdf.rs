//! PDF rendering of a [`ClinicalReport`] with `printpdf`.
//!
//! Output is single-column A4 using the built-in Helvetica faces, so nothing
//! is embedded. Dates come from the report timestamp, and the trailer `/ID`
//! that `printpdf` fills with random characters is overwritten in place with a
//! digest of the report text, so identical reports give identical bytes.

use std::io::BufWriter;
use std::ops::Range;
use std::sync::OnceLock;

use printpdf::{
    BuiltinFont, CustomPdfConformance, IndirectFontRef, Mm, PdfConformance, PdfDocument,
    PdfDocumentReference, PdfLayerReference,
};
use regex::bytes::Regex;
use sha2::{Digest, Sha256};

use crate::domain::{ClinicalReport, ReportError};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const TOP: Mm = Mm(280.0);
const BOTTOM: Mm = Mm(20.0);
const MARGIN: Mm = Mm(20.0);
const INDENT: Mm = Mm(25.0);
const WRAP_COLUMNS: usize = 85;

/// Render a report into PDF bytes.
///
/// # Errors
/// Returns `ReportError::Render` if `printpdf` fails to build or save.
pub fn render(report: &ClinicalReport) -> Result<Vec<u8>, ReportError> {
    let timestamp = time::OffsetDateTime::from_unix_timestamp(report.generated_at.timestamp())
        .map_err(|e| ReportError::Render(format!("timestamp out of range: {e}")))?;

    let (doc, page, layer) = PdfDocument::new(report.title, PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
    let doc = doc
        .with_conformance(PdfConformance::Custom(CustomPdfConformance {
            requires_icc_profile: false,
            requires_xmp_metadata: false,
            ..Default::default()
        }))
        .with_creation_date(timestamp)
        .with_mod_date(timestamp);

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Render(format!("PDF font error: {e}")))?;

    let first = doc.get_page(page).get_layer(layer);
    let mut pen = Pen {
        doc: &doc,
        layer: first,
        y: TOP,
        regular,
        bold,
    };

    pen.bold(report.title, 16.0, MARGIN, Mm(8.0));
    pen.regular(&report.generated_line(), 9.0, MARGIN, Mm(10.0));

    pen.bold(report.headline, 14.0, MARGIN, Mm(6.0));
    if let Some(line) = &report.probability_line {
        pen.regular(line, 11.0, MARGIN, Mm(6.0));
    }
    pen.regular(&report.heart_score_line, 11.0, MARGIN, Mm(10.0));

    for section in report.sections() {
        pen.bold(section.heading, 12.0, MARGIN, Mm(7.0));
        for item in &section.lines {
            for line in wrap_text(&format!("- {item}"), WRAP_COLUMNS) {
                pen.regular(&line, 10.0, INDENT, Mm(5.5));
            }
        }
        pen.gap(Mm(5.0));
    }

    pen.gap(Mm(5.0));
    pen.regular(report.disclaimer, 8.0, MARGIN, Mm(4.0));

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Render(format!("PDF save error: {e}")))?;
    let mut bytes = buf
        .into_inner()
        .map_err(|e| ReportError::Render(format!("PDF buffer error: {e}")))?;

    stamp_trailer_id(&mut bytes, &document_id(report))?;
    Ok(bytes)
}

/// Content-derived id: uppercase hex SHA-256 of the report text.
fn document_id(report: &ClinicalReport) -> String {
    Sha256::digest(report.to_string().as_bytes())
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

fn trailer_id() -> &'static Regex {
    static TRAILER_ID: OnceLock<Regex> = OnceLock::new();
    TRAILER_ID.get_or_init(|| {
        Regex::new(r"/ID\s*\[\s*\(([0-9A-Za-z]*)\)\s*\(([0-9A-Za-z]*)\)\s*\]")
            .expect("trailer id pattern is valid")
    })
}

/// Overwrite both halves of the last trailer `/ID` with `id`.
///
/// Each half keeps its length, so xref offsets stay valid.
fn stamp_trailer_id(bytes: &mut [u8], id: &str) -> Result<(), ReportError> {
    let halves: Vec<Range<usize>> = trailer_id()
        .captures_iter(bytes)
        .last()
        .map(|caps| caps.iter().skip(1).flatten().map(|m| m.range()).collect())
        .unwrap_or_default();

    if halves.len() != 2 || id.is_empty() {
        return Err(ReportError::Render("PDF trailer /ID not found".to_string()));
    }

    for half in halves {
        for (slot, byte) in bytes[half].iter_mut().zip(id.bytes().cycle()) {
            *slot = byte;
        }
    }
    Ok(())
}

/// Writes lines top-down, starting a new page when the bottom margin is hit.
struct Pen<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: Mm,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Pen<'_> {
    fn ensure_room(&mut self, advance: Mm) {
        if self.y - advance < BOTTOM {
            let (page, layer) = self.doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    fn regular(&mut self, text: &str, size: f32, x: Mm, advance: Mm) {
        self.ensure_room(advance);
        self.layer.use_text(text, size, x, self.y, &self.regular);
        self.y -= advance;
    }

    fn bold(&mut self, text: &str, size: f32, x: Mm, advance: Mm) {
        self.ensure_room(advance);
        self.layer.use_text(text, size, x, self.y, &self.bold);
        self.y -= advance;
    }

    fn gap(&mut self, amount: Mm) {
        self.y -= amount;
    }
}

/// Greedy word wrap on whitespace.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
            current.push_str("  ");
        } else if !current.is_empty() && !current.ends_with("  ") {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }
    lines
}
