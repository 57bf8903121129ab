//! Markdown-to-page layout.
//!
//! The paginator makes a single pass over the body. A cursor tracks the
//! baseline of the next line on the current page; before each line is drawn,
//! a cursor past the break threshold moves to the top of a fresh page.

use chrono::{Local, NaiveDate};
use tracing::{debug, trace};

use crate::config::{LayoutConfig, LineStyle, WrapOverflow};
use crate::document::{Document, Page, TextRun, TextStyle};
use crate::markdown::{body_lines, LineKind};
use crate::metrics::{wrap_text, FontWeight, Helvetica, TextMetrics};

/// Lays out a title and a markdown-subset body onto fixed-size pages.
///
/// ```
/// use policy_kit::{LayoutConfig, Paginator};
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let doc = Paginator::new(LayoutConfig::default()).paginate_on("Policy", "# Purpose\nKeep data safe.", date);
///
/// assert_eq!(doc.page_count(), 1);
/// assert_eq!(doc.pages()[0].runs()[1].text, "Generated on 3/1/2024");
/// assert_eq!(doc.pages()[0].runs()[2].text, "Purpose");
/// ```
#[derive(Debug, Clone)]
pub struct Paginator<M = Helvetica> {
    layout: LayoutConfig,
    metrics: M,
}

impl Paginator<Helvetica> {
    /// Create a paginator measuring text with the built-in Helvetica widths.
    pub fn new(layout: LayoutConfig) -> Self {
        Self::with_metrics(layout, Helvetica)
    }
}

impl Default for Paginator<Helvetica> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<M: TextMetrics> Paginator<M> {
    pub fn with_metrics(layout: LayoutConfig, metrics: M) -> Self {
        Self { layout, metrics }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Lay out `body` under `title`, captioned with today's date.
    pub fn paginate(&self, title: &str, body: &str) -> Document {
        self.paginate_on(title, body, Local::now().date_naive())
    }

    /// Lay out `body` under `title`, captioned with `date`.
    ///
    /// The result depends only on the arguments and the layout.
    pub fn paginate_on(&self, title: &str, body: &str, date: NaiveDate) -> Document {
        let mut cursor = Cursor::new(self.layout.top_margin);

        self.draw_title_block(&mut cursor, title, date);

        for (index, line) in body_lines(body).enumerate() {
            let kind = LineKind::classify(line);
            trace!(index, %kind, "classified line");

            self.break_if_needed(&mut cursor);
            cursor.page().assign_line(index);

            match kind {
                LineKind::Blank => cursor.y += self.layout.blank_gap,
                LineKind::Plain => self.draw_paragraph(&mut cursor, index, line),
                _ => {
                    let style = *self.style_for(kind);
                    let text = kind.visible_text(line).into_owned();
                    let run = self.body_run(text, cursor.y, &style, index);
                    cursor.page().push_run(run);
                    cursor.y += style.advance;
                }
            }
        }

        debug!(title, pages = cursor.pages.len(), "paginated document");

        Document {
            title: title.to_string(),
            page_width: self.layout.page_width,
            page_height: self.layout.page_height,
            pages: cursor.pages,
        }
    }

    fn draw_title_block(&self, cursor: &mut Cursor, title: &str, date: NaiveDate) {
        let caption = format!("Generated on {}", date.format("%-m/%-d/%Y"));

        let title_style = self.layout.title;
        let run = self.centered_run(title.to_string(), cursor.y, &title_style, 0);
        cursor.page().push_run(run);
        cursor.y += title_style.advance;

        let caption_style = self.layout.caption;
        let run = self.centered_run(caption, cursor.y, &caption_style, self.layout.caption_grey);
        cursor.page().push_run(run);
        cursor.y += caption_style.advance;
    }

    /// Draw a plain line, wrapped to the printable width.
    ///
    /// With [`WrapOverflow::Keep`] every sub-line lands on the current page.
    /// With [`WrapOverflow::Split`] sub-lines after the first continue on a
    /// new page once the threshold is crossed.
    fn draw_paragraph(&self, cursor: &mut Cursor, index: usize, line: &str) {
        let style = self.layout.plain;
        let sub_lines = wrap_text(
            &self.metrics,
            line,
            FontWeight::from_bold(style.bold),
            style.size,
            self.layout.printable_width(),
        );

        for (i, text) in sub_lines.into_iter().enumerate() {
            if i > 0 && self.layout.wrap_overflow == WrapOverflow::Split {
                self.break_if_needed(cursor);
            }
            let run = self.body_run(text, cursor.y, &style, index);
            cursor.page().push_run(run);
            cursor.y += style.advance;
        }
    }

    fn break_if_needed(&self, cursor: &mut Cursor) {
        if cursor.y > self.layout.break_threshold {
            cursor.new_page(self.layout.top_margin);
            debug!(page = cursor.pages.len(), "page break");
        }
    }

    fn style_for(&self, kind: LineKind) -> &LineStyle {
        match kind {
            LineKind::H1 => &self.layout.h1,
            LineKind::H2 => &self.layout.h2,
            LineKind::H3 => &self.layout.h3,
            LineKind::Bold => &self.layout.bold,
            LineKind::Blank | LineKind::Plain => &self.layout.plain,
        }
    }

    fn body_run(&self, text: String, y: f32, style: &LineStyle, index: usize) -> TextRun {
        TextRun {
            text,
            x: self.layout.margin,
            y,
            style: text_style(style, 0),
            source_line: Some(index),
        }
    }

    fn centered_run(&self, text: String, y: f32, style: &LineStyle, grey: u8) -> TextRun {
        let width = self
            .metrics
            .text_width(&text, FontWeight::from_bold(style.bold), style.size);
        TextRun {
            x: (self.layout.page_width - width) / 2.0,
            text,
            y,
            style: text_style(style, grey),
            source_line: None,
        }
    }
}

fn text_style(style: &LineStyle, grey: u8) -> TextStyle {
    TextStyle {
        size: style.size,
        weight: FontWeight::from_bold(style.bold),
        grey,
    }
}

/// Position of the next line: the page being filled and the baseline on it.
struct Cursor {
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new(top: f32) -> Self {
        Self {
            pages: vec![Page::new()],
            y: top,
        }
    }

    fn page(&mut self) -> &mut Page {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self, top: f32) {
        self.pages.push(Page::new());
        self.y = top;
    }
}
