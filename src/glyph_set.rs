//! Glyph data containers: per-character images, placement metrics, and the
//! read-only [`GlyphSet`] bundle a text renderer consumes.
//!
//! Everything here is immutable once constructed. The alignment and merge
//! transforms in [`crate::compose`] take snapshots of this data and return
//! new values; nothing mutates a set in place.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// One rendered character's pixels.
///
/// Rows are stored top to bottom. `channels` is 1 for grayscale coverage
/// (monochrome output is pre-expanded to 0/255 gray) or 4 for straight RGBA
/// decoded from a color strike.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl GlyphImage {
    /// Wrap a pixel buffer.
    ///
    /// A buffer whose length disagrees with the declared dimensions (a
    /// malformed bitmap strike, say) is truncated or zero-padded to fit,
    /// so `sample` can never index past it.
    pub fn new(width: u32, height: u32, channels: u8, mut data: Vec<u8>) -> Self {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            data.resize(expected, 0);
        }
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// The 1x1 single-channel zero image used for ink-free glyphs such as
    /// the space character.
    pub fn blank() -> Self {
        Self::new(1, 1, 1, vec![0])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample one channel of one pixel. Out-of-bounds reads return 0.
    pub fn sample(&self, x: u32, y: u32, channel: u8) -> u8 {
        if x >= self.width || y >= self.height || channel >= self.channels {
            return 0;
        }
        let idx = ((y * self.width + x) * self.channels as u32 + channel as u32) as usize;
        self.data[idx]
    }

    /// Whether any sample in the buffer is non-zero.
    pub fn has_ink(&self) -> bool {
        self.data.iter().any(|&v| v != 0)
    }
}

/// Placement of one glyph relative to the text cursor.
///
/// The cursor sits at the top of the line box; y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Rows from the line top down to the glyph image's topmost row.
    pub dy: i32,
    /// Columns from the cursor to the glyph image's leftmost column.
    pub dx: i32,
    /// Whole pixels the cursor advances to reach the next origin. Always
    /// pre-rounded; the consuming renderer has no sub-pixel placement.
    pub advance: i32,
}

/// Sparse per-codepoint placement table.
pub type Positioning = HashMap<u32, GlyphMetrics>;

/// Sparse per-codepoint image table.
pub type GlyphImages = HashMap<u32, GlyphImage>;

/// The unit of font data: images and placement for every loaded code point,
/// plus the shared vertical frame (`height`, `origin_y`).
///
/// Invariant: `images` and `positioning` always cover the same key set, and
/// every `dy` is expressed against the same baseline at row `origin_y`.
#[derive(Debug, Clone)]
pub struct GlyphSet {
    height: i32,
    images: GlyphImages,
    positioning: Positioning,
    origin_y: i32,
}

impl GlyphSet {
    /// Assemble a set from raw parts, checking the key-parity invariant.
    pub fn new(
        height: i32,
        images: GlyphImages,
        positioning: Positioning,
        origin_y: i32,
    ) -> Result<Self> {
        if images.len() != positioning.len()
            || !images.keys().all(|k| positioning.contains_key(k))
        {
            return Err(Error::InconsistentGlyphSet);
        }
        Ok(Self {
            height,
            images,
            positioning,
            origin_y,
        })
    }

    /// Minimal vertical extent that renders every loaded glyph unclipped.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Baseline row, measured from the top of the `height`-tall box.
    pub fn origin_y(&self) -> i32 {
        self.origin_y
    }

    pub fn images(&self) -> &GlyphImages {
        &self.images
    }

    pub fn positioning(&self) -> &Positioning {
        &self.positioning
    }

    /// Tear the set down into `(height, images, positioning, origin_y)` for
    /// the pure transforms in [`crate::compose`].
    pub fn into_parts(self) -> (i32, GlyphImages, Positioning, i32) {
        (self.height, self.images, self.positioning, self.origin_y)
    }

    /// Image and placement for a single character.
    ///
    /// Returns `None` for empty or multi-character input and for code
    /// points the set does not contain; callers fall back to a placeholder
    /// glyph rather than treating absence as an error.
    pub fn get_glyph(&self, ch: &str) -> Option<(&GlyphImage, GlyphMetrics)> {
        let mut chars = ch.chars();
        let c = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let key = c as u32;
        let image = self.images.get(&key)?;
        let metrics = self.positioning.get(&key)?;
        Some((image, *metrics))
    }

    /// Just the image for a single character.
    pub fn glyph_image(&self, ch: &str) -> Option<&GlyphImage> {
        self.get_glyph(ch).map(|(image, _)| image)
    }

    /// Just the placement for a single character.
    pub fn glyph_metrics(&self, ch: &str) -> Option<GlyphMetrics> {
        self.get_glyph(ch).map(|(_, metrics)| metrics)
    }

    /// Vertical offset from the line top to the glyph's first row.
    pub fn glyph_vertical_offset(&self, ch: &str) -> Option<i32> {
        self.glyph_metrics(ch).map(|m| m.dy)
    }

    /// Horizontal offset from the cursor to the glyph's first column.
    pub fn glyph_horizontal_offset(&self, ch: &str) -> Option<i32> {
        self.glyph_metrics(ch).map(|m| m.dx)
    }

    /// Cursor advance for the character.
    pub fn glyph_advance(&self, ch: &str) -> Option<i32> {
        self.glyph_metrics(ch).map(|m| m.advance)
    }

    /// Bitmap dimensions as `(height, width)`.
    pub fn glyph_dimensions(&self, ch: &str) -> Option<(u32, u32)> {
        self.glyph_image(ch)
            .map(|image| (image.height(), image.width()))
    }

    /// Glyph origin (baseline crossing at the left edge) relative to the
    /// cursor, as `(x, y)` with y growing downward.
    pub fn glyph_baseline(&self, ch: &str) -> Option<(i32, i32)> {
        self.glyph_metrics(ch)
            .map(|m| (m.dx, self.origin_y - m.dy))
    }

    /// Global `(height, baseline_row)` pair.
    pub fn font_metrics(&self) -> (i32, i32) {
        (self.height, self.origin_y)
    }
}
