//! Glyphfuse builds glyph atlases out of font files.
//!
//! The pipeline has three stages:
//!
//! 1. **Rasterize**: [`FontFace::glyph_set`] turns a font file into a
//!    [`GlyphSet`], one bitmap plus placement metrics per character, all
//!    sharing a line height and baseline.
//! 2. **Compose**: the functions in [`compose`] shift, align, and center
//!    glyph sets as pure transforms on their positioning tables.
//! 3. **Merge**: [`FontLibrary::merge_fonts`] unions several rasterized
//!    fonts (fallbacks, synthetic bold and italic via the Mathematical
//!    Alphanumeric Symbols block) into one set, recentered for display.
//!
//! [`FontFace::render_text_to_array`] renders a shaped preview string to
//! an RGBA bitmap using the same rasterization machinery, which is how a
//! UI can show a font selection before committing to an atlas rebuild.
//!
//! ```no_run
//! use glyphfuse::{FontLibrary, FontSpec, RasterOptions, Scale};
//!
//! # fn main() -> glyphfuse::Result<()> {
//! let library = FontLibrary::new();
//! let specs = [
//!     FontSpec::new("fonts/NotoSans-Regular.ttf"),
//!     FontSpec::new("fonts/NotoColorEmoji.ttf"),
//! ];
//! let options = RasterOptions {
//!     scale: Scale::PixelHeight(24),
//!     ..RasterOptions::default()
//! };
//! let atlas = library.merge_fonts(&specs, &options)?;
//! let (height, origin) = atlas.font_metrics();
//! println!("line height {height}, baseline at {origin}");
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod error;
pub mod glyph_set;
pub mod merge;
pub mod raster;
pub mod style;
pub mod text;

pub use error::{Error, Result};
pub use glyph_set::{GlyphImage, GlyphImages, GlyphMetrics, GlyphSet, Positioning};
pub use merge::{extended_latin_specs, merge_glyph_sets, FontLibrary, FontSpec, DEFAULT_REFERENCE};
pub use raster::{FontFace, Hinter, RasterOptions, Scale};
pub use text::TextRenderOptions;

pub use compose::{align_fonts, center_font, fit_font_to_new_height, pad_font_top};
