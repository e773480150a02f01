//! Merging several rasterized fonts into one glyph set.
//!
//! A merge aligns every input set onto a shared baseline, takes a
//! last-wins union of their glyphs, and recenters the result around a
//! reference character. [`FontLibrary`] caches loaded faces by path so
//! repeated merges at different sizes reload nothing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::compose::{align_fonts, center_font};
use crate::error::{Error, Result};
use crate::glyph_set::{GlyphImages, GlyphSet, Positioning};
use crate::raster::{FontFace, RasterOptions};
use crate::style;

/// Default centering reference: a capital letter with flat top and
/// bottom, so visual centering matches optical centering for Latin text.
pub const DEFAULT_REFERENCE: u32 = 'B' as u32;

/// A path-keyed cache of loaded faces.
///
/// Faces are loaded once and never evicted; font files are small relative
/// to the rasterized atlases built from them, and a UI rebuilding its
/// atlas on every DPI change hits the same handful of paths repeatedly.
#[derive(Default)]
pub struct FontLibrary {
    faces: DashMap<PathBuf, Arc<FontFace>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a face, or return the cached one.
    pub fn face(&self, path: &Path) -> Result<Arc<FontFace>> {
        if let Some(face) = self.faces.get(path) {
            return Ok(Arc::clone(&face));
        }
        let face = Arc::new(FontFace::from_file(path)?);
        self.faces.insert(path.to_path_buf(), Arc::clone(&face));
        Ok(face)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Rasterize and merge several fonts, centering on `'B'`.
    pub fn merge_fonts(&self, specs: &[FontSpec], options: &RasterOptions) -> Result<GlyphSet> {
        self.merge_fonts_centered(specs, options, DEFAULT_REFERENCE)
    }

    /// Rasterize and merge several fonts, centering on an explicit
    /// reference character.
    pub fn merge_fonts_centered(
        &self,
        specs: &[FontSpec],
        options: &RasterOptions,
        reference: u32,
    ) -> Result<GlyphSet> {
        if specs.is_empty() {
            return Err(Error::InvalidConfiguration(
                "merge requires at least one font".into(),
            ));
        }
        // Validate the whole request before loading anything, so a bad
        // spec at the end does not waste rasterization work.
        for spec in specs {
            if spec.code_map.is_some() && spec.restrict_to.is_none() {
                return Err(Error::MissingRestriction);
            }
        }

        let mut sets = Vec::with_capacity(specs.len());
        for spec in specs {
            let face = self.face(&spec.path)?;
            let mut per_font = options.clone();
            if spec.restrict_to.is_some() {
                per_font.restrict_to = spec.restrict_to.clone();
            }
            let mut set = face.glyph_set(&per_font)?;
            if let Some(map) = spec.code_map {
                set = remap_glyph_set(set, map)?;
            }
            sets.push(set);
        }
        merge_glyph_sets(sets, reference)
    }
}

/// One font's contribution to a merge.
#[derive(Debug, Clone)]
pub struct FontSpec {
    pub path: PathBuf,
    /// Code points to take from this font. Overrides the merge-wide
    /// restriction for this font only.
    pub restrict_to: Option<HashSet<u32>>,
    /// Remaps rasterized code points before the union, e.g. ASCII letters
    /// onto their Mathematical Alphanumeric bold counterparts. Requires
    /// `restrict_to`: remapping an entire character map would silently
    /// collide glyphs.
    pub code_map: Option<fn(u32) -> u32>,
}

impl FontSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            restrict_to: None,
            code_map: None,
        }
    }

    pub fn restrict_to(mut self, codepoints: HashSet<u32>) -> Self {
        self.restrict_to = Some(codepoints);
        self
    }

    pub fn code_map(mut self, map: fn(u32) -> u32) -> Self {
        self.code_map = Some(map);
        self
    }
}

/// Merge already-rasterized sets: shared baseline, last-wins union,
/// recenter on the reference character.
pub fn merge_glyph_sets(sets: Vec<GlyphSet>, reference: u32) -> Result<GlyphSet> {
    let mut heights = Vec::with_capacity(sets.len());
    let mut positionings = Vec::with_capacity(sets.len());
    let mut origins = Vec::with_capacity(sets.len());
    let mut image_maps = Vec::with_capacity(sets.len());
    for set in sets {
        let (height, images, positioning, origin) = set.into_parts();
        heights.push(height);
        positionings.push(positioning);
        origins.push(origin);
        image_maps.push(images);
    }

    let (height, aligned, origin) = align_fonts(&heights, &positionings, &origins);

    // Last-wins union: later fonts override earlier ones, so fallback
    // fonts go first and override fonts last.
    let mut images = GlyphImages::new();
    let mut positioning = Positioning::new();
    for (image_map, aligned_positioning) in image_maps.into_iter().zip(aligned) {
        images.extend(image_map);
        positioning.extend(aligned_positioning);
    }

    let (height, positioning, origin) = center_font(height, &positioning, origin, reference)?;
    GlyphSet::new(height, images, positioning, origin)
}

/// Apply a code map to every key of a set, keeping image and metrics
/// paired per source key.
fn remap_glyph_set(set: GlyphSet, map: fn(u32) -> u32) -> Result<GlyphSet> {
    let (height, mut images, positioning, origin) = set.into_parts();
    let mut remapped_images = GlyphImages::new();
    let mut remapped_positioning = Positioning::new();
    for (key, metrics) in positioning {
        let mapped = map(key);
        if let Some(image) = images.remove(&key) {
            remapped_images.insert(mapped, image);
            remapped_positioning.insert(mapped, metrics);
        }
    }
    GlyphSet::new(height, remapped_images, remapped_positioning, origin)
}

fn ascii_letters() -> HashSet<u32> {
    ('A'..='Z').chain('a'..='z').map(|c| c as u32).collect()
}

/// Build the specs for an extended-Latin merge: a base font covering
/// Latin-1, plus optional bold, italic, and bold-italic faces whose ASCII
/// letters are remapped onto the Mathematical Alphanumeric Symbols block.
pub fn extended_latin_specs(
    base: impl Into<PathBuf>,
    bold: Option<PathBuf>,
    italic: Option<PathBuf>,
    bold_italic: Option<PathBuf>,
) -> Vec<FontSpec> {
    let mut specs = vec![FontSpec::new(base).restrict_to((0u32..256).collect())];
    if let Some(path) = bold {
        specs.push(
            FontSpec::new(path)
                .restrict_to(ascii_letters())
                .code_map(style::bold_map),
        );
    }
    if let Some(path) = italic {
        specs.push(
            FontSpec::new(path)
                .restrict_to(ascii_letters())
                .code_map(style::italic_map),
        );
    }
    if let Some(path) = bold_italic {
        specs.push(
            FontSpec::new(path)
                .restrict_to(ascii_letters())
                .code_map(style::bold_italic_map),
        );
    }
    specs
}
