//! Error types for glyphfuse

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading fonts or building glyph sets.
///
/// Every variant is fatal and surfaced synchronously at the point of
/// detection. Font composition is a deterministic setup-time computation,
/// so nothing here is retried and no partially built glyph set is ever
/// returned.
#[derive(Debug, Error)]
pub enum Error {
    /// Font file path does not exist.
    #[error("font not found: {}", path.display())]
    FontNotFound {
        /// Path to the missing font file.
        path: PathBuf,
    },

    /// Font data exists but cannot be parsed.
    #[error("invalid font at {}: {reason}", path.display())]
    InvalidFont {
        /// Path to the invalid font file.
        path: PathBuf,
        /// Reason why the font is invalid.
        reason: String,
    },

    /// The rasterizer produced a pixel format the adapter cannot copy.
    #[error("unsupported pixel format for U+{codepoint:04X}")]
    UnsupportedGlyphFormat { codepoint: u32 },

    /// Raster configuration that cannot produce output (non-positive
    /// nominal size, zero pixel height).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A code-point remap was requested without a bounded source set.
    #[error("code map requires a restricted code point set")]
    MissingRestriction,

    /// Centering was requested on a code point absent from the set.
    #[error("reference character U+{codepoint:04X} missing from glyph set")]
    ReferenceCharacterMissing { codepoint: u32 },

    /// No ink-bearing glyphs were produced, so no scale can be derived.
    #[error("font produced no ink-bearing glyphs")]
    EmptyFont,

    /// The outline extractor failed on a specific glyph.
    #[error("failed to rasterize U+{codepoint:04X}: {reason}")]
    Raster { codepoint: u32, reason: String },

    /// Mismatched image/positioning key sets when assembling a glyph set.
    #[error("glyph set images and positioning cover different code points")]
    InconsistentGlyphSet,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
