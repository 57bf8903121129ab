//! Configuration for the page cache and the paginator.
//!
//! Both configurations use the builder pattern. [`LayoutConfig`] can also be
//! loaded from a TOML file; any field left out keeps its default.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{ExportError, ExportResult};

/// TTL applied when a read does not specify one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration for creating a new [`PageCache`](crate::PageCache).
///
/// ```
/// use policy_kit::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new()
///     .default_ttl(Duration::from_secs(60))
///     .dedupe_in_flight(true)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL used by reads that don't carry their own.
    pub(crate) default_ttl: Duration,

    /// Whether concurrent misses for one key share a single fetch.
    pub(crate) dedupe_in_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            dedupe_in_flight: false,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL used when a read does not specify one.
    ///
    /// A zero TTL is allowed; entries stored with it are stale immediately.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Share one fetch between concurrent non-forced misses on the same key.
    ///
    /// Off by default: every miss runs its own fetch and the last one to
    /// complete wins.
    pub fn dedupe_in_flight(mut self, enabled: bool) -> Self {
        self.dedupe_in_flight = enabled;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Self {
        self
    }

    /// Get the default TTL.
    pub fn get_default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Whether in-flight deduplication is enabled.
    pub fn get_dedupe_in_flight(&self) -> bool {
        self.dedupe_in_flight
    }
}

/// Font size, weight and vertical advance for one kind of line.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LineStyle {
    /// Font size in points.
    pub size: f32,
    /// Draw with the bold face.
    #[serde(default)]
    pub bold: bool,
    /// Cursor advance in millimetres after the line.
    pub advance: f32,
}

impl LineStyle {
    pub const fn new(size: f32, bold: bool, advance: f32) -> Self {
        Self {
            size,
            bold,
            advance,
        }
    }
}

/// What to do when a wrapped paragraph runs past the break threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapOverflow {
    /// Draw the whole wrapped block on the page where it started, even if
    /// the tail runs into the bottom margin.
    #[default]
    Keep,
    /// Re-check the threshold before each sub-line and continue on a new
    /// page when it is crossed.
    Split,
}

/// Page geometry and typography for the paginator.
///
/// All lengths are millimetres; font sizes are points. Defaults describe an
/// A4 portrait page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    /// Left and right margin.
    pub margin: f32,
    /// Baseline of the first line on every page.
    pub top_margin: f32,
    /// A new page starts before any line drawn while the cursor is below this.
    pub break_threshold: f32,
    /// Advance for a blank line.
    pub blank_gap: f32,
    pub title: LineStyle,
    pub caption: LineStyle,
    /// Grey level (0-255) of the caption text.
    pub caption_grey: u8,
    pub h1: LineStyle,
    pub h2: LineStyle,
    pub h3: LineStyle,
    pub bold: LineStyle,
    /// Paragraph text; `advance` is the distance between wrapped sub-lines.
    pub plain: LineStyle,
    pub wrap_overflow: WrapOverflow,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 20.0,
            top_margin: 20.0,
            break_threshold: 270.0,
            blank_gap: 4.0,
            title: LineStyle::new(20.0, true, 10.0),
            caption: LineStyle::new(10.0, false, 15.0),
            caption_grey: 100,
            h1: LineStyle::new(16.0, true, 10.0),
            h2: LineStyle::new(14.0, true, 8.0),
            h3: LineStyle::new(12.0, true, 7.0),
            bold: LineStyle::new(11.0, true, 6.0),
            plain: LineStyle::new(11.0, false, 6.0),
            wrap_overflow: WrapOverflow::Keep,
        }
    }
}

impl LayoutConfig {
    /// Create a new layout builder with A4 defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size in millimetres.
    pub fn page_size(mut self, width: f32, height: f32) -> Self {
        self.page_width = width;
        self.page_height = height;
        self
    }

    /// Set the left and right margin.
    pub fn margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the top margin a new page starts at.
    pub fn top_margin(mut self, top: f32) -> Self {
        self.top_margin = top;
        self
    }

    /// Set the near-bottom position that forces a page break.
    pub fn break_threshold(mut self, y: f32) -> Self {
        self.break_threshold = y;
        self
    }

    /// Choose how wrapped paragraphs behave at the bottom of a page.
    pub fn wrap_overflow(mut self, policy: WrapOverflow) -> Self {
        self.wrap_overflow = policy;
        self
    }

    /// Build the final layout.
    pub fn build(self) -> Self {
        self
    }

    /// Width available to body text.
    pub fn printable_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Parse a layout from TOML and validate it.
    ///
    /// ```
    /// use policy_kit::LayoutConfig;
    ///
    /// let layout = LayoutConfig::from_toml_str("margin = 15.0\nwrap_overflow = \"split\"").unwrap();
    /// assert_eq!(layout.margin, 15.0);
    /// ```
    pub fn from_toml_str(src: &str) -> ExportResult<Self> {
        let layout: LayoutConfig = toml::from_str(src)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Reject geometry the paginator cannot lay out.
    pub fn validate(&self) -> ExportResult<()> {
        let styles = [
            ("title", &self.title),
            ("caption", &self.caption),
            ("h1", &self.h1),
            ("h2", &self.h2),
            ("h3", &self.h3),
            ("bold", &self.bold),
            ("plain", &self.plain),
        ];

        let lengths = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("margin", self.margin),
            ("top_margin", self.top_margin),
            ("break_threshold", self.break_threshold),
            ("blank_gap", self.blank_gap),
        ];
        let style_lengths = styles
            .iter()
            .flat_map(|(name, s)| [(*name, s.size), (*name, s.advance)]);
        if let Some((name, value)) = lengths
            .into_iter()
            .chain(style_lengths)
            .find(|(_, v)| !v.is_finite())
        {
            return Err(ExportError::InvalidLayout(format!(
                "{} must be a finite number, got {}",
                name, value
            )));
        }

        // Every comparison below is against finite values.
        if self.margin < 0.0 || self.top_margin < 0.0 || self.blank_gap < 0.0 {
            return Err(ExportError::InvalidLayout(
                "margins and blank gap must not be negative".to_string(),
            ));
        }
        if self.page_width <= 0.0 || self.page_height <= 0.0 {
            return Err(ExportError::InvalidLayout(format!(
                "page size must be positive, got {}x{}",
                self.page_width, self.page_height
            )));
        }
        if self.printable_width() <= 0.0 {
            return Err(ExportError::InvalidLayout(format!(
                "margins of {} leave no printable width",
                self.margin
            )));
        }
        if self.top_margin >= self.break_threshold || self.break_threshold > self.page_height {
            return Err(ExportError::InvalidLayout(format!(
                "break threshold {} must lie between top margin {} and page height {}",
                self.break_threshold, self.top_margin, self.page_height
            )));
        }
        if let Some((name, _)) = styles.iter().find(|(_, s)| s.size <= 0.0) {
            return Err(ExportError::InvalidLayout(format!(
                "{} font size must be positive",
                name
            )));
        }
        if let Some((name, _)) = styles.iter().find(|(_, s)| s.advance < 0.0) {
            return Err(ExportError::InvalidLayout(format!(
                "{} advance must not be negative",
                name
            )));
        }
        if self.plain.advance <= 0.0 {
            return Err(ExportError::InvalidLayout(
                "plain text advance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert!(!config.dedupe_in_flight);
    }

    #[test]
    fn test_cache_builder_pattern() {
        let config = CacheConfig::new()
            .default_ttl(Duration::from_secs(60))
            .dedupe_in_flight(true)
            .build();

        assert_eq!(config.get_default_ttl(), Duration::from_secs(60));
        assert!(config.get_dedupe_in_flight());
    }

    #[test]
    fn test_default_layout_is_a4() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.page_width, 210.0);
        assert_eq!(layout.page_height, 297.0);
        assert_eq!(layout.printable_width(), 170.0);
        assert!(layout.validate().is_ok());
    }

    #[test]
    fn test_layout_from_partial_toml() {
        let src = r#"
            break_threshold = 250.0
            wrap_overflow = "split"

            [h1]
            size = 18.0
            bold = true
            advance = 12.0
        "#;
        let layout = LayoutConfig::from_toml_str(src).unwrap();
        assert_eq!(layout.break_threshold, 250.0);
        assert_eq!(layout.wrap_overflow, WrapOverflow::Split);
        assert_eq!(layout.h1, LineStyle::new(18.0, true, 12.0));
        // Untouched fields keep their defaults.
        assert_eq!(layout.h2, LayoutConfig::default().h2);
    }

    #[test]
    fn test_layout_rejects_bad_geometry() {
        let layout = LayoutConfig::new().margin(120.0).build();
        assert!(matches!(
            layout.validate(),
            Err(ExportError::InvalidLayout(_))
        ));

        let layout = LayoutConfig::new().break_threshold(10.0).build();
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_rejects_non_finite() {
        for src in [
            "break_threshold = nan",
            "page_width = inf",
            "blank_gap = -inf",
            "[plain]\nsize = nan\nadvance = 6.0",
            "[h2]\nsize = 14.0\nadvance = inf",
        ] {
            let err = LayoutConfig::from_toml_str(src).unwrap_err();
            assert!(
                matches!(err, ExportError::InvalidLayout(_)),
                "accepted {:?}",
                src
            );
        }
    }

    #[test]
    fn test_layout_rejects_backward_advance() {
        let err = LayoutConfig::from_toml_str("blank_gap = -4.0").unwrap_err();
        assert!(matches!(err, ExportError::InvalidLayout(_)));

        let err = LayoutConfig::from_toml_str("[h1]\nsize = 16.0\nadvance = -10.0").unwrap_err();
        assert!(err.to_string().contains("h1 advance"));

        let layout = LayoutConfig::new().top_margin(-1.0).build();
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_layout_rejects_malformed_toml() {
        let err = LayoutConfig::from_toml_str("margin = \"wide\"").unwrap_err();
        assert!(matches!(err, ExportError::Layout(_)));
    }
}
