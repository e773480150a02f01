//! The rasterizer adapter: turns a font file plus a rendering
//! configuration into a [`GlyphSet`].
//!
//! Outline glyphs go through skrifa's outline extraction into a dual-path
//! pen (an SVG path string for zeno's rasterizer, a kurbo path for exact
//! bounds), then zeno renders the coverage mask. Color glyphs come from the
//! font's bitmap strikes (sbix, CBDT/CBLC): PNG strikes are decoded with
//! the `png` crate, BGRA strikes are channel-swapped to RGBA, and
//! off-size strikes are rescaled with bilinear interpolation.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kurbo::Shape;
use skrifa::bitmap::{BitmapData, BitmapFormat, BitmapGlyph, BitmapStrikes};
use skrifa::instance::{LocationRef, Size};
use skrifa::metrics::GlyphMetrics as ScaledMetrics;
use skrifa::outline::{
    DrawSettings, Engine, HintingInstance, HintingOptions, OutlineGlyphCollection, OutlinePen,
    SmoothMode, Target,
};
use skrifa::raw::TableProvider;
use skrifa::{FontRef, GlyphId, MetadataProvider};

use crate::error::{Error, Result};
use crate::glyph_set::{GlyphImage, GlyphImages, GlyphMetrics, GlyphSet, Positioning};

/// Rendering-quality mode, selecting how outlines are hinted before
/// rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Hinter {
    /// No hinting at all; blurriest but shape-faithful.
    None,
    /// The font's own hinting instructions.
    Font,
    /// Autohinter in its light mode: sharp, but respects original shapes.
    #[default]
    Light,
    /// Autohinter in its normal mode: sharpest antialiased output.
    Strong,
    /// Hinting tuned for pure black-and-white output; coverage is
    /// thresholded to 0/255.
    Monochrome,
}

/// How the rasterization scale is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Nominal font size in pixels, handed to the rasterizer's pixel-size
    /// machinery directly.
    Nominal(f32),
    /// Target ink height in pixels: the distance between the tallest
    /// glyph top and the deepest glyph bottom once aligned. Resolved by a
    /// bounded search over the nominal size.
    PixelHeight(u32),
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Nominal(16.0)
    }
}

/// Configuration for [`FontFace::glyph_set`].
#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: Scale,
    pub hinter: Hinter,
    /// When set, only these code points are rasterized. Used to build
    /// small supplementary sets (a synthetic bold of just A-Z a-z).
    pub restrict_to: Option<HashSet<u32>>,
    /// Consult the font's color strikes and emit 4-channel glyphs where
    /// they exist.
    pub allow_color: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: Scale::default(),
            hinter: Hinter::default(),
            restrict_to: None,
            allow_color: true,
        }
    }
}

impl RasterOptions {
    /// Options for a nominal pixel size with everything else defaulted.
    pub fn with_size(size: f32) -> Self {
        Self {
            scale: Scale::Nominal(size),
            ..Self::default()
        }
    }
}

/// One font file, loaded once and rasterized on demand.
///
/// Loading is fail-fast: a missing path or unparseable file errors at
/// construction, before any glyph is requested. The bytes are shared
/// read-only afterwards, so faces can be cached and rasterized from
/// multiple threads.
pub struct FontFace {
    path: PathBuf,
    data: Arc<Vec<u8>>,
}

impl FontFace {
    /// Load and validate a font file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FontNotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read(path)?;
        Self::validate(path, &data)?;
        Ok(Self {
            path: path.to_path_buf(),
            data: Arc::new(data),
        })
    }

    /// Wrap already-loaded font bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let path = PathBuf::from("<memory>");
        Self::validate(&path, &data)?;
        Ok(Self {
            path,
            data: Arc::new(data),
        })
    }

    fn validate(path: &Path, data: &[u8]) -> Result<()> {
        FontRef::new(data).map_err(|e| Error::InvalidFont {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn font(&self) -> Result<FontRef<'_>> {
        FontRef::new(&self.data).map_err(|e| Error::InvalidFont {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Rasterize every declared character (or the restricted subset) into
    /// a [`GlyphSet`].
    pub fn glyph_set(&self, options: &RasterOptions) -> Result<GlyphSet> {
        match options.scale {
            Scale::Nominal(size) => {
                if !size.is_finite() || size <= 0.0 {
                    return Err(Error::InvalidConfiguration(format!(
                        "nominal size must be positive, got {size}"
                    )));
                }
                self.build_set(size.round(), options)
            }
            Scale::PixelHeight(target) => self.build_set_for_pixel_height(target, options),
        }
    }

    /// Resolve a pixel-height request by iterating on the nominal size.
    ///
    /// The measured ink extent of a set is `height - 1`; each round
    /// rescales the nominal size by `target / measured` and re-rasterizes.
    /// Converges in a handful of rounds because ink height is close to
    /// proportional to nominal size.
    fn build_set_for_pixel_height(&self, target: u32, options: &RasterOptions) -> Result<GlyphSet> {
        if target == 0 {
            return Err(Error::InvalidConfiguration(
                "pixel height must be non-zero".into(),
            ));
        }
        let target = target as f32;
        let mut nominal = target;
        let mut set = self.build_set(nominal.round(), options)?;
        for _ in 0..3 {
            let ink = (set.height() - 1) as f32;
            if ink <= 0.0 {
                return Err(Error::EmptyFont);
            }
            if (ink - target).abs() < 0.5 {
                break;
            }
            nominal *= target / ink;
            if nominal < 1.0 {
                return Err(Error::EmptyFont);
            }
            set = self.build_set(nominal.round(), options)?;
        }
        Ok(set)
    }

    fn build_set(&self, px: f32, options: &RasterOptions) -> Result<GlyphSet> {
        let font = self.font()?;
        let raster = GlyphRaster::new(&font, px, options.hinter, options.allow_color);

        let mut images = GlyphImages::new();
        let mut placements: HashMap<u32, RawPlacement> = HashMap::new();

        let charmap = font.charmap();
        for (codepoint, glyph_id) in charmap.mappings() {
            if let Some(restrict) = &options.restrict_to {
                if !restrict.contains(&codepoint) {
                    continue;
                }
            }
            let glyph = raster.rasterize(codepoint, glyph_id)?;
            placements.insert(
                codepoint,
                RawPlacement {
                    top: glyph.top,
                    left: glyph.left,
                    advance: glyph.advance,
                },
            );
            images.insert(codepoint, glyph.image);
        }

        let (max_top, max_bottom) = frame_extents(
            placements
                .iter()
                .map(|(codepoint, p)| (p.top, images[codepoint].height() as i32)),
        );
        let height = max_top + max_bottom + 1;
        let origin_y = max_top;

        // Rebase bearings so dy is measured from the line top.
        let positioning: Positioning = placements
            .into_iter()
            .map(|(codepoint, p)| {
                (
                    codepoint,
                    GlyphMetrics {
                        dy: origin_y - p.top,
                        dx: p.left,
                        advance: p.advance,
                    },
                )
            })
            .collect();

        GlyphSet::new(height, images, positioning, origin_y)
    }
}

/// Tightest shared frame over baseline-relative `(top, rows)` placements:
/// the tallest ascent and the deepest descent among the glyphs.
///
/// Extrema are seeded from the first glyph rather than zero, so a font
/// living entirely on one side of the baseline keeps its true tight
/// extent (a negative `max_top` puts the baseline above every bitmap).
fn frame_extents(placements: impl Iterator<Item = (i32, i32)>) -> (i32, i32) {
    let mut extents: Option<(i32, i32)> = None;
    for (top, rows) in placements {
        let bottom = rows - top;
        extents = Some(match extents {
            Some((max_top, max_bottom)) => (max_top.max(top), max_bottom.max(bottom)),
            None => (top, bottom),
        });
    }
    extents.unwrap_or((0, 0))
}

/// Baseline-relative placement straight out of the rasterizer.
struct RawPlacement {
    top: i32,
    left: i32,
    advance: i32,
}

/// One rasterized glyph before it is rebased into a set's frame.
pub(crate) struct RasterGlyph {
    pub image: GlyphImage,
    /// Rows from the baseline up to the image's top row.
    pub top: i32,
    /// Columns from the cursor to the image's left column.
    pub left: i32,
    /// Cursor advance, already collapsed to whole pixels. This is the only
    /// point where sub-pixel placement is rounded away; the consuming
    /// renderer cannot place quads at fractional advances.
    pub advance: i32,
}

/// Per-size rasterization state shared across all glyphs of one pass.
pub(crate) struct GlyphRaster<'a> {
    outlines: OutlineGlyphCollection<'a>,
    metrics: ScaledMetrics<'a>,
    strikes: Option<BitmapStrikes<'a>>,
    strike_format: Option<BitmapFormat>,
    hinting: Option<HintingInstance>,
    units_per_em: f32,
    size: Size,
    px: f32,
    monochrome: bool,
}

impl<'a> GlyphRaster<'a> {
    pub(crate) fn new(font: &FontRef<'a>, px: f32, hinter: Hinter, allow_color: bool) -> Self {
        let outlines = font.outline_glyphs();
        let size = Size::new(px);
        let metrics = font.glyph_metrics(size, LocationRef::default());
        let strikes = if allow_color {
            let strikes = BitmapStrikes::new(font);
            (!strikes.is_empty()).then_some(strikes)
        } else {
            None
        };
        let strike_format = strikes.as_ref().and_then(|s| s.format());
        let units_per_em = font
            .head()
            .map(|head| head.units_per_em() as f32)
            .unwrap_or(1000.0);

        let hint_options = match hinter {
            Hinter::None => None,
            Hinter::Font => Some(HintingOptions {
                engine: Engine::Interpreter,
                target: Target::Smooth {
                    mode: SmoothMode::Normal,
                    symmetric_rendering: false,
                    preserve_linear_metrics: false,
                },
            }),
            Hinter::Light => Some(HintingOptions {
                engine: Engine::AutoFallback,
                target: Target::Smooth {
                    mode: SmoothMode::Light,
                    symmetric_rendering: false,
                    preserve_linear_metrics: false,
                },
            }),
            Hinter::Strong => Some(HintingOptions {
                engine: Engine::AutoFallback,
                target: Target::Smooth {
                    mode: SmoothMode::Normal,
                    symmetric_rendering: false,
                    preserve_linear_metrics: false,
                },
            }),
            Hinter::Monochrome => Some(HintingOptions {
                engine: Engine::AutoFallback,
                target: Target::Mono,
            }),
        };
        let hinting = hint_options.and_then(|options| {
            match HintingInstance::new(&outlines, size, LocationRef::default(), options) {
                Ok(instance) => Some(instance),
                Err(e) => {
                    log::warn!("hinting unavailable ({e}); falling back to unhinted outlines");
                    None
                }
            }
        });

        Self {
            outlines,
            metrics,
            strikes,
            strike_format,
            hinting,
            units_per_em,
            size,
            px,
            monochrome: matches!(hinter, Hinter::Monochrome),
        }
    }

    /// Rasterize one glyph, preferring a color strike when allowed.
    pub(crate) fn rasterize(&self, codepoint: u32, glyph_id: GlyphId) -> Result<RasterGlyph> {
        let advance = self
            .metrics
            .advance_width(glyph_id)
            .unwrap_or(0.0)
            .round() as i32;

        if let Some(strikes) = &self.strikes {
            if let Some(bitmap) = strikes.glyph_for_size(self.size, glyph_id) {
                return self.decode_strike(codepoint, &bitmap, advance);
            }
        }

        let Some(outline) = self.outlines.get(glyph_id) else {
            // Characters mapped without an outline (and without a strike)
            // still occupy advance width; treat them like spaces.
            return Ok(RasterGlyph {
                image: GlyphImage::blank(),
                top: 0,
                left: 0,
                advance,
            });
        };

        let mut pen = MaskPathPen::default();
        let settings = match &self.hinting {
            Some(instance) => DrawSettings::hinted(instance, false),
            None => DrawSettings::unhinted(self.size, LocationRef::default()),
        };
        outline.draw(settings, &mut pen).map_err(|e| Error::Raster {
            codepoint,
            reason: e.to_string(),
        })?;

        let (svg_path, bez_path) = pen.finish();
        let bbox = bez_path.bounding_box();

        // Ink-free glyphs such as the space: a 1x1 zero image with zero
        // bearings, keeping only the advance.
        if !(bbox.x0.is_finite() && bbox.y0.is_finite() && bbox.x1.is_finite() && bbox.y1.is_finite())
        {
            return Ok(RasterGlyph {
                image: GlyphImage::blank(),
                top: 0,
                left: 0,
                advance,
            });
        }

        let left = bbox.x0.floor() as i32;
        let bottom = bbox.y0.floor() as i32;
        let right = bbox.x1.ceil() as i32;
        let top = bbox.y1.ceil() as i32;
        let width = (right - left).max(1) as u32;
        let height = (top - bottom).max(1) as u32;

        let mut mask = vec![0u8; (width * height) as usize];
        let _placement = zeno::Mask::new(svg_path.as_str())
            .size(width, height)
            .offset((-left, -bottom))
            .render_into(&mut mask, None);

        // Font outlines are y-up, bitmaps are y-down.
        for y in 0..(height / 2) {
            let top_row = y as usize * width as usize;
            let bottom_row = (height - 1 - y) as usize * width as usize;
            for x in 0..width as usize {
                mask.swap(top_row + x, bottom_row + x);
            }
        }

        if self.monochrome {
            for value in &mut mask {
                *value = if *value >= 128 { 255 } else { 0 };
            }
        }

        Ok(RasterGlyph {
            image: GlyphImage::new(width, height, 1, mask),
            top,
            left,
            advance,
        })
    }

    /// Decode one bitmap strike into a glyph image, rescaling off-size
    /// strikes and converting everything to straight RGBA (or gray for
    /// mask strikes).
    fn decode_strike(
        &self,
        codepoint: u32,
        bitmap: &BitmapGlyph<'_>,
        advance: i32,
    ) -> Result<RasterGlyph> {
        let native = match &bitmap.data {
            BitmapData::Png(png_data) => decode_png(codepoint, png_data)?,
            BitmapData::Bgra(bgra_data) => {
                // Channel-swap to RGBA on the way in.
                let mut rgba = Vec::with_capacity(bgra_data.len());
                for chunk in bgra_data.chunks_exact(4) {
                    rgba.push(chunk[2]);
                    rgba.push(chunk[1]);
                    rgba.push(chunk[0]);
                    rgba.push(chunk[3]);
                }
                GlyphImage::new(bitmap.width, bitmap.height, 4, rgba)
            }
            BitmapData::Mask(mask) => {
                GlyphImage::new(bitmap.width, bitmap.height, 1, mask.data.to_vec())
            }
        };

        if native.width() == 0 || native.height() == 0 {
            return Ok(RasterGlyph {
                image: GlyphImage::blank(),
                top: 0,
                left: 0,
                advance,
            });
        }

        let scale_x = self.px / bitmap.ppem_x;
        let scale_y = self.px / bitmap.ppem_y;
        let target_width = ((native.width() as f32 * scale_x).round() as u32).max(1);
        let target_height = ((native.height() as f32 * scale_y).round() as u32).max(1);
        let image = if target_width != native.width() || target_height != native.height() {
            scale_bilinear(&native, target_width, target_height)
        } else {
            native
        };

        let bearing_x = bitmap.bearing_x * scale_x;
        // sbix strikes often carry a zero vertical bearing; CoreText
        // substitutes a 100 font-unit offset, so we do the same.
        let bearing_y =
            if bitmap.bearing_y == 0.0 && self.strike_format == Some(BitmapFormat::Sbix) {
                100.0 * self.px / self.units_per_em
            } else {
                bitmap.bearing_y * scale_y
            };

        let (left, top) = match bitmap.placement_origin {
            skrifa::bitmap::Origin::TopLeft => (
                bearing_x - bitmap.inner_bearing_x * scale_x,
                bearing_y - bitmap.inner_bearing_y * scale_y,
            ),
            skrifa::bitmap::Origin::BottomLeft => (
                bearing_x - bitmap.inner_bearing_x * scale_x,
                bearing_y - bitmap.inner_bearing_y * scale_y + image.height() as f32,
            ),
        };

        Ok(RasterGlyph {
            image,
            top: top.round() as i32,
            left: left.round() as i32,
            advance,
        })
    }
}

/// Decode a PNG strike into straight RGBA.
fn decode_png(codepoint: u32, png_data: &[u8]) -> Result<GlyphImage> {
    let decode_err = |_| Error::UnsupportedGlyphFormat { codepoint };
    let decoder = png::Decoder::new(png_data);
    let mut reader = decoder.read_info().map_err(decode_err)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).map_err(decode_err)?;

    let width = info.width;
    let height = info.height;
    let pixels = &buf[..info.buffer_size()];

    let rgba = match info.color_type {
        png::ColorType::Rgba => pixels.to_vec(),
        png::ColorType::Rgb => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for chunk in pixels.chunks_exact(3) {
                rgba.extend_from_slice(chunk);
                rgba.push(255);
            }
            rgba
        }
        png::ColorType::Grayscale => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for &gray in pixels {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
            rgba
        }
        png::ColorType::GrayscaleAlpha => {
            let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
            for chunk in pixels.chunks_exact(2) {
                rgba.extend_from_slice(&[chunk[0], chunk[0], chunk[0], chunk[1]]);
            }
            rgba
        }
        png::ColorType::Indexed => {
            return Err(Error::UnsupportedGlyphFormat { codepoint });
        }
    };

    Ok(GlyphImage::new(width, height, 4, rgba))
}

/// Bilinear rescale, channel-count preserving.
fn scale_bilinear(src: &GlyphImage, target_width: u32, target_height: u32) -> GlyphImage {
    let channels = src.channels() as usize;
    let src_width = src.width() as usize;
    let src_height = src.height() as usize;
    let dst_width = target_width as usize;
    let dst_height = target_height as usize;
    let src_data = src.data();
    let mut dst_data = vec![0u8; dst_width * dst_height * channels];

    for dst_y in 0..dst_height {
        for dst_x in 0..dst_width {
            let src_x_f = (dst_x as f32 + 0.5) * (src_width as f32 / dst_width as f32) - 0.5;
            let src_y_f = (dst_y as f32 + 0.5) * (src_height as f32 / dst_height as f32) - 0.5;

            let x0 = (src_x_f.floor() as isize).clamp(0, src_width as isize - 1) as usize;
            let y0 = (src_y_f.floor() as isize).clamp(0, src_height as isize - 1) as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let wx = src_x_f - src_x_f.floor();
            let wy = src_y_f - src_y_f.floor();

            let dst_idx = (dst_y * dst_width + dst_x) * channels;
            for c in 0..channels {
                let p00 = src_data[(y0 * src_width + x0) * channels + c] as f32;
                let p10 = src_data[(y0 * src_width + x1) * channels + c] as f32;
                let p01 = src_data[(y1 * src_width + x0) * channels + c] as f32;
                let p11 = src_data[(y1 * src_width + x1) * channels + c] as f32;

                let value = p00 * (1.0 - wx) * (1.0 - wy)
                    + p10 * wx * (1.0 - wy)
                    + p01 * (1.0 - wx) * wy
                    + p11 * wx * wy;

                dst_data[dst_idx + c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    GlyphImage::new(target_width, target_height, src.channels(), dst_data)
}

/// Dual-output path builder: an SVG command string for zeno's rasterizer
/// and a kurbo path for exact bounding boxes, built in one outline pass.
#[derive(Default)]
struct MaskPathPen {
    commands: Vec<String>,
    bez_path: kurbo::BezPath,
}

impl MaskPathPen {
    fn finish(self) -> (String, kurbo::BezPath) {
        (self.commands.join(" "), self.bez_path)
    }
}

impl OutlinePen for MaskPathPen {
    fn move_to(&mut self, x: f32, y: f32) {
        self.commands.push(format!("M {:.2},{:.2}", x, y));
        self.bez_path.move_to((x as f64, y as f64));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.commands.push(format!("L {:.2},{:.2}", x, y));
        self.bez_path.line_to((x as f64, y as f64));
    }

    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        self.commands
            .push(format!("Q {:.2},{:.2} {:.2},{:.2}", cx, cy, x, y));
        self.bez_path
            .quad_to((cx as f64, cy as f64), (x as f64, y as f64));
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.commands.push(format!(
            "C {:.2},{:.2} {:.2},{:.2} {:.2},{:.2}",
            cx0, cy0, cx1, cy1, x, y
        ));
        self.bez_path.curve_to(
            (cx0 as f64, cy0 as f64),
            (cx1 as f64, cy1 as f64),
            (x as f64, y as f64),
        );
    }

    fn close(&mut self) {
        self.commands.push("Z".to_string());
        self.bez_path.close_path();
    }
}
