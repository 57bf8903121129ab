//! Minimal PDF 1.4 writer for paginated documents.
//!
//! Only what the layout produces is supported: text runs in Helvetica or
//! Helvetica-Bold with a grey level. Both faces are base-14 fonts, so nothing
//! is embedded. Text is encoded as WinAnsi; characters the encoding lacks
//! become `?`.

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt::Write;

use crate::document::{Document, Page, TextRun};
use crate::metrics::{win_ansi, FontWeight, MM_PER_PT};

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
/// Page objects start here; each page uses two ids, page then content.
const FIRST_PAGE_ID: usize = 5;

/// Serialize `doc` to PDF bytes.
pub fn write_document(doc: &Document) -> Bytes {
    let mut writer = PdfWriter::new();
    let (width_mm, height_mm) = doc.page_size();
    let width = width_mm / MM_PER_PT;
    let height = height_mm / MM_PER_PT;

    let page_ids: Vec<usize> = (0..doc.page_count())
        .map(|i| FIRST_PAGE_ID + 2 * i)
        .collect();

    writer.object(CATALOG_ID, |out| {
        write!(out, "<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID)
    });

    writer.object(PAGES_ID, |out| {
        out.write_str("<< /Type /Pages /Kids [")?;
        for id in &page_ids {
            write!(out, " {} 0 R", id)?;
        }
        write!(out, " ] /Count {} >>", page_ids.len())
    });

    writer.object(REGULAR_FONT_ID, |out| font_dict(out, "Helvetica"));
    writer.object(BOLD_FONT_ID, |out| font_dict(out, "Helvetica-Bold"));

    for (page, &id) in doc.pages().iter().zip(&page_ids) {
        let content = content_stream(page, height);

        writer.object(id, |out| {
            write!(
                out,
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 {} 0 R /F2 {} 0 R >> >> /Contents {} 0 R >>",
                PAGES_ID,
                width,
                height,
                REGULAR_FONT_ID,
                BOLD_FONT_ID,
                id + 1
            )
        });

        writer.stream(id + 1, &content);
    }

    writer.finish(CATALOG_ID)
}

fn font_dict(out: &mut BytesMut, base_font: &str) -> std::fmt::Result {
    write!(
        out,
        "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
        base_font
    )
}

/// Text drawing operators for one page. `height` is the page height in points.
fn content_stream(page: &Page, height: f32) -> BytesMut {
    let mut out = BytesMut::new();
    for run in page.runs() {
        write_run(&mut out, run, height);
    }
    out
}

fn write_run(out: &mut BytesMut, run: &TextRun, height: f32) {
    let font = match run.style.weight {
        FontWeight::Normal => "F1",
        FontWeight::Bold => "F2",
    };
    let grey = f32::from(run.style.grey) / 255.0;
    let x = run.x / MM_PER_PT;
    let y = height - run.y / MM_PER_PT;

    // Writing into BytesMut cannot fail.
    let _ = write!(
        out,
        "BT /{} {:.2} Tf {:.3} g {:.2} {:.2} Td (",
        font, run.style.size, grey, x, y
    );
    put_pdf_string(out, &run.text);
    out.put_slice(b") Tj ET\n");
}

/// Append `text` as the body of a PDF literal string.
fn put_pdf_string(out: &mut BytesMut, text: &str) {
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.put_u8(b'\\');
                out.put_u8(ch as u8);
            }
            '\n' | '\r' | '\t' => out.put_u8(b' '),
            _ => out.put_u8(win_ansi(ch).unwrap_or(b'?')),
        }
    }
}

/// Accumulates numbered objects and their byte offsets.
struct PdfWriter {
    buf: BytesMut,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = BytesMut::with_capacity(4096);
        buf.put_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object<F>(&mut self, id: usize, body: F)
    where
        F: FnOnce(&mut BytesMut) -> std::fmt::Result,
    {
        self.offsets.push((id, self.buf.len()));
        let _ = writeln!(self.buf, "{} 0 obj", id);
        let _ = body(&mut self.buf);
        self.buf.put_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, content: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        let _ = write!(self.buf, "{} 0 obj\n<< /Length {} >>\nstream\n", id, content.len());
        self.buf.put_slice(content);
        self.buf.put_slice(b"\nendstream\nendobj\n");
    }

    fn finish(mut self, root: usize) -> Bytes {
        self.offsets.sort_unstable_by_key(|&(id, _)| id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        let _ = write!(self.buf, "xref\n0 {}\n0000000000 65535 f \n", size);
        for (_, offset) in &self.offsets {
            let _ = write!(self.buf, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            self.buf,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            size, root, xref_offset
        );

        self.buf.freeze()
    }
}
