//! Text measurement and word wrapping.
//!
//! The paginator only needs one primitive from a drawing library: how wide a
//! string is in a given face and size. [`Helvetica`] answers that with the
//! standard Type1 advance widths for the WinAnsi character set, which are
//! also the fonts and encoding the PDF writer uses, so measured and printed
//! widths agree.

/// Millimetres per PostScript point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

/// Font face weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Normal,
    Bold,
}

impl FontWeight {
    pub fn from_bold(bold: bool) -> Self {
        if bold {
            FontWeight::Bold
        } else {
            FontWeight::Normal
        }
    }
}

/// Measures rendered text.
pub trait TextMetrics {
    /// Width of `text` in millimetres at `size` points.
    fn text_width(&self, text: &str, weight: FontWeight, size: f32) -> f32;
}

/// Advance widths (1/1000 em) for the base-14 Helvetica faces.
///
/// Text is measured as it will be printed: each character goes through
/// [`win_ansi`] first, so anything the encoding lacks measures as `?`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Helvetica;

// Widths for WinAnsi codes 0x20 through 0xFF. Codes WinAnsi leaves
// undefined are zero; `win_ansi` never produces them.
#[rustfmt::skip]
const REGULAR: [u16; 224] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, 0,
    556, 0, 222, 556, 333, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 222, 222, 333, 333, 350, 556, 1000, 333, 1000, 500, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

#[rustfmt::skip]
const BOLD: [u16; 224] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, 0,
    556, 0, 278, 556, 500, 1000, 556, 556, 333, 1000, 667, 333, 1000, 0, 611, 0,
    0, 278, 278, 500, 500, 350, 556, 1000, 333, 1000, 556, 333, 944, 0, 500, 667,
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// Map a character to its WinAnsi (Windows-1252) code.
///
/// Returns `None` for characters the encoding cannot show, including control
/// characters and the C1 range U+0080..U+009F.
pub fn win_ansi(ch: char) -> Option<u8> {
    let code = match ch {
        ' '..='~' | '\u{A0}'..='\u{FF}' => return Some(ch as u8),
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(code)
}

impl Helvetica {
    fn char_width(ch: char, weight: FontWeight) -> u16 {
        let table = match weight {
            FontWeight::Normal => &REGULAR,
            FontWeight::Bold => &BOLD,
        };
        // Line breaks and tabs are printed as spaces.
        let ch = match ch {
            '\t' | '\n' | '\r' => ' ',
            _ => ch,
        };
        let code = win_ansi(ch).unwrap_or(b'?');
        table[usize::from(code) - 0x20]
    }
}

impl TextMetrics for Helvetica {
    fn text_width(&self, text: &str, weight: FontWeight, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|ch| u32::from(Self::char_width(ch, weight)))
            .sum();
        units as f32 / 1000.0 * size * MM_PER_PT
    }
}

/// Greedily wrap `text` into lines no wider than `max_width`.
///
/// Breaks only at spaces. A single word wider than `max_width` is kept whole
/// on its own line and overflows. Text that already fits comes back as one
/// line, unchanged.
pub fn wrap_text<M: TextMetrics + ?Sized>(
    metrics: &M,
    text: &str,
    weight: FontWeight,
    size: f32,
    max_width: f32,
) -> Vec<String> {
    if metrics.text_width(text, weight, size) <= max_width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_width = metrics.text_width(&current, weight, size)
            + metrics.text_width(" ", weight, size)
            + metrics.text_width(word, weight, size);

        if candidate_width <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_widths() {
        // "Hello" regular: 722 + 556 + 222 + 222 + 556 = 2278 units.
        let width = Helvetica.text_width("Hello", FontWeight::Normal, 72.0);
        assert!((width - 2.278 * 25.4).abs() < 0.01);

        let bold = Helvetica.text_width("Hello", FontWeight::Bold, 72.0);
        assert!(bold > width);
    }

    #[test]
    fn test_width_scales_with_size() {
        let small = Helvetica.text_width("policy", FontWeight::Normal, 10.0);
        let large = Helvetica.text_width("policy", FontWeight::Normal, 20.0);
        assert!((large - 2.0 * small).abs() < 1e-4);
    }

    #[test]
    fn test_win_ansi_mapping() {
        assert_eq!(win_ansi('A'), Some(b'A'));
        assert_eq!(win_ansi('é'), Some(0xE9));
        assert_eq!(win_ansi('\u{2019}'), Some(0x92));
        assert_eq!(win_ansi('\u{2014}'), Some(0x97));
        assert_eq!(win_ansi('€'), Some(0x80));
        // C1 controls have no glyph of their own in WinAnsi.
        assert_eq!(win_ansi('\u{85}'), None);
        assert_eq!(win_ansi('✓'), None);
    }

    #[test]
    fn test_extended_widths_match_printed_glyphs() {
        // At this size one unit is 0.001 mm.
        let size = 1000.0 / MM_PER_PT;
        let width = |text: &str| Helvetica.text_width(text, FontWeight::Normal, size);

        assert!((width("é") - 556.0).abs() < 0.01);
        assert!((width("\u{2014}") - 1000.0).abs() < 0.01);
        assert!((width("\u{2019}") - 222.0).abs() < 0.01);
        assert!((width("\u{2022}") - 350.0).abs() < 0.01);
        // Unencodable text is printed, and measured, as '?'.
        assert!((width("✓") - width("?")).abs() < 0.01);

        let bold = Helvetica.text_width("\u{201C}", FontWeight::Bold, size);
        assert!((bold - 500.0).abs() < 0.01);
    }

    #[test]
    fn test_short_text_is_not_wrapped() {
        let lines = wrap_text(&Helvetica, "Short line", FontWeight::Normal, 11.0, 170.0);
        assert_eq!(lines, vec!["Short line".to_string()]);
    }

    #[test]
    fn test_long_text_wraps_at_spaces() {
        let text = "word ".repeat(80);
        let text = text.trim_end();
        let lines = wrap_text(&Helvetica, text, FontWeight::Normal, 11.0, 170.0);

        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Helvetica.text_width(line, FontWeight::Normal, 11.0) <= 170.0);
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_unbreakable_token_overflows() {
        let token = "x".repeat(200);
        let text = format!("see {}", token);
        let lines = wrap_text(&Helvetica, &text, FontWeight::Normal, 11.0, 170.0);

        assert_eq!(lines, vec!["see".to_string(), token]);
    }
}
