//! The paginated output: pages of positioned text runs.

use bytes::Bytes;

use crate::metrics::FontWeight;
use crate::pdf;

/// MIME type of a serialized [`Document`].
pub const PDF_MIME: &str = "application/pdf";

/// Font, size and colour of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Font size in points.
    pub size: f32,
    pub weight: FontWeight,
    /// Grey level, 0 is black.
    pub grey: u8,
}

/// One string drawn at a fixed position.
///
/// `x` is the left edge and `y` the baseline, both in millimetres from the
/// top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub style: TextStyle,
    /// Index of the body line this run belongs to; `None` for the title block.
    pub source_line: Option<usize>,
}

/// An append-only drawing surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    runs: Vec<TextRun>,
    lines: Vec<usize>,
}

impl Page {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub(crate) fn assign_line(&mut self, index: usize) {
        self.lines.push(index);
    }

    /// Everything drawn on this page, in drawing order.
    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Indices of the body lines assigned to this page, blank lines included.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Runs drawn for body line `index`.
    pub fn runs_for_line(&self, index: usize) -> impl Iterator<Item = &TextRun> {
        self.runs
            .iter()
            .filter(move |run| run.source_line == Some(index))
    }
}

/// A finished multi-page document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) title: String,
    pub(crate) page_width: f32,
    pub(crate) page_height: f32,
    pub(crate) pages: Vec<Page>,
}

impl Document {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page size in millimetres.
    pub fn page_size(&self) -> (f32, f32) {
        (self.page_width, self.page_height)
    }

    /// Index of the page that body line `index` was assigned to.
    pub fn page_of_line(&self, index: usize) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.lines.contains(&index))
    }

    /// Serialize to PDF.
    pub fn to_pdf(&self) -> Bytes {
        pdf::write_document(self)
    }

    /// Download name: the title with whitespace runs replaced by `_`.
    ///
    /// ```
    /// use policy_kit::{LayoutConfig, Paginator};
    ///
    /// let doc = Paginator::new(LayoutConfig::default()).paginate("Access  Control Policy", "");
    /// assert_eq!(doc.file_name(), "Access_Control_Policy.pdf");
    /// ```
    pub fn file_name(&self) -> String {
        let stem = self.title.split_whitespace().collect::<Vec<_>>().join("_");
        if stem.is_empty() {
            "document.pdf".to_string()
        } else {
            format!("{}.pdf", stem)
        }
    }
}
