//! Line classification for the markdown subset used by generated policies.
//!
//! Only whole-line constructs are recognised: three heading levels, a line
//! that opens with bold markers, blank lines, and everything else as plain
//! paragraph text. Prefix checks are anchored at column 0.

use std::borrow::Cow;
use std::fmt;

/// The kind of a single body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    H1,
    H2,
    H3,
    Bold,
    Blank,
    Plain,
}

impl LineKind {
    /// Classify one line.
    ///
    /// ```
    /// use policy_kit::LineKind;
    ///
    /// assert_eq!(LineKind::classify("## Scope"), LineKind::H2);
    /// assert_eq!(LineKind::classify("  # not a heading"), LineKind::Plain);
    /// assert_eq!(LineKind::classify(" \t "), LineKind::Blank);
    /// ```
    pub fn classify(line: &str) -> LineKind {
        if line.starts_with("# ") {
            LineKind::H1
        } else if line.starts_with("## ") {
            LineKind::H2
        } else if line.starts_with("### ") {
            LineKind::H3
        } else if line.starts_with("**") {
            LineKind::Bold
        } else if line.trim().is_empty() {
            LineKind::Blank
        } else {
            LineKind::Plain
        }
    }

    /// The text that is actually drawn for `line` of this kind.
    ///
    /// Headings lose their marker prefix; bold lines lose every `**`.
    pub fn visible_text(self, line: &str) -> Cow<'_, str> {
        match self {
            LineKind::H1 => Cow::Borrowed(line.strip_prefix("# ").unwrap_or(line)),
            LineKind::H2 => Cow::Borrowed(line.strip_prefix("## ").unwrap_or(line)),
            LineKind::H3 => Cow::Borrowed(line.strip_prefix("### ").unwrap_or(line)),
            LineKind::Bold => Cow::Owned(line.replace("**", "")),
            LineKind::Blank => Cow::Borrowed(""),
            LineKind::Plain => Cow::Borrowed(line),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::H1 => "h1",
            LineKind::H2 => "h2",
            LineKind::H3 => "h3",
            LineKind::Bold => "bold",
            LineKind::Blank => "blank",
            LineKind::Plain => "plain",
        }
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Split a body into lines on `\n`, dropping a trailing `\r` from each.
///
/// An empty body has no lines at all.
pub fn body_lines(body: &str) -> impl Iterator<Item = &str> {
    let lines = if body.is_empty() {
        None
    } else {
        Some(body.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)))
    };
    lines.into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(LineKind::classify("# Executive Summary"), LineKind::H1);
        assert_eq!(LineKind::classify("## Scope"), LineKind::H2);
        assert_eq!(LineKind::classify("### Notes"), LineKind::H3);
        assert_eq!(LineKind::classify("**Owner:** CISO"), LineKind::Bold);
        assert_eq!(LineKind::classify(""), LineKind::Blank);
        assert_eq!(LineKind::classify("   "), LineKind::Blank);
        assert_eq!(LineKind::classify("Access is reviewed quarterly."), LineKind::Plain);
    }

    #[test]
    fn test_classify_is_anchored() {
        assert_eq!(LineKind::classify("Note: **important**"), LineKind::Plain);
        assert_eq!(LineKind::classify(" **indented**"), LineKind::Plain);
        assert_eq!(LineKind::classify("#NoSpace"), LineKind::Plain);
        assert_eq!(LineKind::classify("#### Deep"), LineKind::Plain);
    }

    #[test]
    fn test_visible_text_strips_markers() {
        let line = "# Executive Summary";
        assert_eq!(LineKind::classify(line).visible_text(line), "Executive Summary");

        let line = "### Notes";
        assert_eq!(LineKind::classify(line).visible_text(line), "Notes");

        let line = "**Owner:** Security team";
        assert_eq!(LineKind::Bold.visible_text(line), "Owner: Security team");
    }

    #[test]
    fn test_body_lines() {
        assert_eq!(body_lines("").count(), 0);
        let lines: Vec<_> = body_lines("a\r\n\nb").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
        let lines: Vec<_> = body_lines("\n").collect();
        assert_eq!(lines, vec!["", ""]);
    }
}
