//! Text-to-bitmap preview rendering.
//!
//! Shapes a whole string with HarfBuzz (so kerning and ligatures come from
//! the font's own tables), rasterizes each positioned glyph with the same
//! machinery as [`FontFace::glyph_set`], and composites the run onto an
//! RGBA canvas that is then cropped to the ink.

use harfbuzz_rs::{Face, Feature, Font as HbFont, Tag, UnicodeBuffer};
use skrifa::GlyphId;

use crate::error::{Error, Result};
use crate::glyph_set::GlyphImage;
use crate::raster::{FontFace, GlyphRaster, Hinter, RasterGlyph};

/// Configuration for [`FontFace::render_text_to_array`].
#[derive(Debug, Clone)]
pub struct TextRenderOptions {
    /// Nominal pixel size for shaping and rasterization.
    pub size: f32,
    /// Round each glyph's advance to whole pixels, matching how an atlas
    /// consumer would place quads. Disable for smoother previews.
    pub align_to_pixels: bool,
    /// Apply the font's `kern` feature during shaping.
    pub enable_kerning: bool,
    pub hinter: Hinter,
    pub allow_color: bool,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            size: 16.0,
            align_to_pixels: true,
            enable_kerning: true,
            hinter: Hinter::default(),
            allow_color: true,
        }
    }
}

impl TextRenderOptions {
    pub fn with_size(size: f32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}

/// A glyph shaped and rasterized, pending composition.
struct PlacedGlyph {
    glyph: RasterGlyph,
    /// Pen position of the glyph origin, in canvas-relative pixels.
    pen_x: f64,
    pen_y: f64,
}

impl FontFace {
    /// Render a string to a tightly cropped RGBA image.
    ///
    /// Returns the image and the tallest ascent observed (rows above the
    /// baseline), which lets a caller align the preview against a layout
    /// baseline. Empty or ink-free input yields a 1x1 transparent image
    /// and a zero ascent.
    pub fn render_text_to_array(
        &self,
        text: &str,
        options: &TextRenderOptions,
    ) -> Result<(GlyphImage, i32)> {
        if !options.size.is_finite() || options.size <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "text size must be positive, got {}",
                options.size
            )));
        }
        if text.is_empty() {
            return Ok((empty_rgba(), 0));
        }

        let font = self.font()?;

        let face = Face::from_bytes(self.data(), 0);
        let mut hb_font = HbFont::new(face);
        let scale = (options.size * 64.0) as i32;
        hb_font.set_scale(scale, scale);

        let buffer = UnicodeBuffer::new().add_str(text);
        let features = [Feature::new(
            Tag::new('k', 'e', 'r', 'n'),
            options.enable_kerning as u32,
            0..text.len(),
        )];
        let output = harfbuzz_rs::shape(&hb_font, buffer, &features);

        let raster = GlyphRaster::new(&font, options.size.round(), options.hinter, options.allow_color);

        let positions = output.get_glyph_positions();
        let infos = output.get_glyph_infos();

        let mut placed = Vec::with_capacity(infos.len());
        let mut pen_x = 0.0f64;
        for (info, pos) in infos.iter().zip(positions.iter()) {
            // Clusters are byte offsets into the source string; recover the
            // character for error attribution.
            let codepoint = text
                .get(info.cluster as usize..)
                .and_then(|rest| rest.chars().next())
                .map(|c| c as u32)
                .unwrap_or(0);
            let glyph = raster.rasterize(codepoint, GlyphId::new(info.codepoint))?;

            placed.push(PlacedGlyph {
                glyph,
                pen_x: pen_x + pos.x_offset as f64 / 64.0,
                pen_y: pos.y_offset as f64 / 64.0,
            });

            let advance = pos.x_advance as f64 / 64.0;
            pen_x += if options.align_to_pixels {
                advance.round()
            } else {
                advance
            };
        }

        // The run's vertical frame, from per-glyph baseline bearings.
        let mut max_top = 0i32;
        let mut max_bottom = 0i32;
        for p in &placed {
            let top = p.glyph.top + p.pen_y.round() as i32;
            max_top = max_top.max(top);
            max_bottom = max_bottom.max(p.glyph.image.height() as i32 - top);
        }

        // A full em of margin on every side so marks and swashes that
        // overshoot their advances are not clipped before the crop.
        let margin = options.size.ceil() as i32;
        let canvas_width = (pen_x.ceil() as i32 + 2 * margin).max(1) as usize;
        let canvas_height = ((max_top + max_bottom) + 2 * margin).max(1) as usize;
        let baseline_y = margin + max_top;

        let mut canvas = vec![0u8; canvas_width * canvas_height * 4];
        let mut ink: Option<(usize, usize, usize, usize)> = None;

        for p in &placed {
            let origin_x = margin as f64 + p.pen_x;
            let x0 = if options.align_to_pixels {
                origin_x.round() as i32 + p.glyph.left
            } else {
                (origin_x + p.glyph.left as f64).round() as i32
            };
            let y0 = baseline_y - (p.glyph.top + p.pen_y.round() as i32);
            blit(
                &mut canvas,
                canvas_width,
                canvas_height,
                &p.glyph.image,
                x0,
                y0,
                &mut ink,
            );
        }

        let Some((min_x, min_y, max_x, max_y)) = ink else {
            // Whitespace-only input.
            return Ok((empty_rgba(), 0));
        };

        // Keep a 2-pixel border of breathing room around the ink.
        let crop_x0 = min_x.saturating_sub(2);
        let crop_y0 = min_y.saturating_sub(2);
        let crop_x1 = (max_x + 3).min(canvas_width);
        let crop_y1 = (max_y + 3).min(canvas_height);
        let width = crop_x1 - crop_x0;
        let height = crop_y1 - crop_y0;

        let mut data = Vec::with_capacity(width * height * 4);
        for y in crop_y0..crop_y1 {
            let row = (y * canvas_width + crop_x0) * 4;
            data.extend_from_slice(&canvas[row..row + width * 4]);
        }

        Ok((
            GlyphImage::new(width as u32, height as u32, 4, data),
            max_top,
        ))
    }
}

fn empty_rgba() -> GlyphImage {
    GlyphImage::new(1, 1, 4, vec![0; 4])
}

/// Composite one glyph image onto the RGBA canvas, updating the ink
/// bounds. Grayscale glyphs land in the alpha channel (black text);
/// color glyphs are source-over blended with straight alpha.
fn blit(
    canvas: &mut [u8],
    canvas_width: usize,
    canvas_height: usize,
    image: &GlyphImage,
    x0: i32,
    y0: i32,
    ink: &mut Option<(usize, usize, usize, usize)>,
) {
    let channels = image.channels();
    for sy in 0..image.height() as i32 {
        let dy = y0 + sy;
        if dy < 0 || dy >= canvas_height as i32 {
            continue;
        }
        for sx in 0..image.width() as i32 {
            let dx = x0 + sx;
            if dx < 0 || dx >= canvas_width as i32 {
                continue;
            }
            let alpha = if channels == 4 {
                image.sample(sx as u32, sy as u32, 3)
            } else {
                image.sample(sx as u32, sy as u32, 0)
            };
            if alpha == 0 {
                continue;
            }
            let idx = (dy as usize * canvas_width + dx as usize) * 4;
            if channels == 4 {
                // Source-over with straight alpha.
                let sa = alpha as u32;
                let inv = 255 - sa;
                for c in 0..3 {
                    let src = image.sample(sx as u32, sy as u32, c as u8) as u32;
                    let dst = canvas[idx + c] as u32;
                    canvas[idx + c] = ((src * sa + dst * inv) / 255) as u8;
                }
                let dst_a = canvas[idx + 3] as u32;
                canvas[idx + 3] = (sa + dst_a * inv / 255).min(255) as u8;
            } else {
                canvas[idx + 3] = canvas[idx + 3].max(alpha);
            }

            let (min_x, min_y, max_x, max_y) =
                ink.unwrap_or((dx as usize, dy as usize, dx as usize, dy as usize));
            *ink = Some((
                min_x.min(dx as usize),
                min_y.min(dy as usize),
                max_x.max(dx as usize),
                max_y.max(dy as usize),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_align_and_kern() {
        let options = TextRenderOptions::default();
        assert!(options.align_to_pixels);
        assert!(options.enable_kerning);
        assert_eq!(options.size, 16.0);
    }

    #[test]
    fn blit_tracks_ink_bounds() {
        let mut canvas = vec![0u8; 8 * 8 * 4];
        let glyph = GlyphImage::new(2, 2, 1, vec![255, 0, 0, 255]);
        let mut ink = None;
        blit(&mut canvas, 8, 8, &glyph, 3, 3, &mut ink);
        // Only the two opaque corners count as ink.
        assert_eq!(ink, Some((3, 3, 4, 4)));
        assert_eq!(canvas[(3 * 8 + 3) * 4 + 3], 255);
        assert_eq!(canvas[(3 * 8 + 4) * 4 + 3], 0);
    }

    #[test]
    fn blit_clips_at_canvas_edges() {
        let mut canvas = vec![0u8; 4 * 4 * 4];
        let glyph = GlyphImage::new(3, 3, 1, vec![255; 9]);
        let mut ink = None;
        blit(&mut canvas, 4, 4, &glyph, -1, -1, &mut ink);
        assert_eq!(ink, Some((0, 0, 1, 1)));
    }

    #[test]
    fn color_blit_blends_source_over() {
        let mut canvas = vec![0u8; 4];
        let glyph = GlyphImage::new(1, 1, 4, vec![200, 100, 50, 255]);
        let mut ink = None;
        blit(&mut canvas, 1, 1, &glyph, 0, 0, &mut ink);
        assert_eq!(&canvas, &[200, 100, 50, 255]);
    }
}
