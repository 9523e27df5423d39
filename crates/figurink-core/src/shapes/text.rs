//! Text and image payloads. Both are anchored boxes whose extent is measured.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Text content of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    /// The text content.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Layout size reported by the renderer. If None, an estimate is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measured: Option<Size>,
}

impl TextContent {
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            measured: None,
        }
    }

    /// Extent of the text box, measured if known.
    pub fn size(&self) -> Size {
        if let Some(size) = self.measured {
            return size;
        }
        let lines = self.content.lines().count().max(1);
        let longest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        Size::new(
            longest as f64 * self.font_size * 0.6,
            lines as f64 * self.font_size * 1.2,
        )
    }

    /// Scale the font (and any measured extent) by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            content: self.content.clone(),
            font_size: self.font_size * factor,
            measured: self.measured.map(|s| Size::new(s.width * factor, s.height * factor)),
        }
    }
}

/// An embedded image reference with its on-canvas size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageContent {
    /// Display width in world units.
    pub width: f64,
    /// Display height in world units.
    pub height: f64,
    /// Opaque source reference owned by the host (data URI, asset key, ...).
    #[serde(default)]
    pub source: String,
}

impl ImageContent {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            source: String::new(),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
