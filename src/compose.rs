//! Pure baseline transforms over glyph positioning snapshots.
//!
//! These functions rebuild positioning tables instead of mutating them:
//! each one takes `(height, positioning, origin)` values and returns new
//! ones, which keeps the alignment and merge pipeline testable in
//! isolation and keeps every [`crate::GlyphSet`] read-only.
//!
//! Coordinate convention throughout: y grows downward, row 0 is the top of
//! the line box, and `origin` is the row the baseline sits on.

use crate::error::{Error, Result};
use crate::glyph_set::{GlyphMetrics, Positioning};

/// Shift every glyph down by `pad` rows.
///
/// A uniform additive offset renormalizes which row counts as row 0; it
/// never changes a glyph's shape or its position relative to the baseline.
pub fn pad_font_top(positioning: &Positioning, pad: i32) -> Positioning {
    positioning
        .iter()
        .map(|(&key, metrics)| {
            (
                key,
                GlyphMetrics {
                    dy: metrics.dy + pad,
                    dx: metrics.dx,
                    advance: metrics.advance,
                },
            )
        })
        .collect()
}

/// Align several fonts onto one shared baseline.
///
/// Each font's vertical space is split at its own baseline: `origin` rows
/// above, `height - origin - 1` rows below. The common frame takes the
/// maximum of each side, so no input glyph is clipped, and every font's
/// positioning is shifted by the same per-font delta.
///
/// Returns `(height, rewritten_positionings, origin)`.
pub fn align_fonts(
    heights: &[i32],
    positionings: &[Positioning],
    origins: &[i32],
) -> (i32, Vec<Positioning>, i32) {
    debug_assert_eq!(heights.len(), positionings.len());
    debug_assert_eq!(heights.len(), origins.len());
    if heights.is_empty() {
        return (0, Vec::new(), 0);
    }

    // Extremes in a coordinate system centered on each font's baseline.
    let min_y = origins.iter().map(|&o| -o).min().unwrap_or(0);
    let max_y = heights
        .iter()
        .zip(origins)
        .map(|(&h, &o)| h - o - 1)
        .max()
        .unwrap_or(0);

    let new_origin = -min_y;
    let rewritten = positionings
        .iter()
        .zip(origins)
        .map(|(positioning, &origin)| pad_font_top(positioning, new_origin - origin))
        .collect();

    (max_y - min_y + 1, rewritten, new_origin)
}

/// Re-center a font's line box on a reference character.
///
/// The tight `height` computed at load time fits the tallest and deepest
/// glyphs, which rarely looks centered once only common letters are drawn.
/// This pads the box so the reference glyph (the span from its ink top down
/// to the baseline) sits at the optical middle: a positive delta shifts
/// every glyph down and grows the box by the same amount, a negative delta
/// grows the bottom only.
///
/// Each step rounds its delta with standard rounding so any unavoidable
/// one-pixel error pads the bottom, which reads better than extra space
/// above. Padding moves the box center too, so the step is applied until
/// the residual delta reaches zero; height only ever grows, and calling
/// this again on the output is a no-op.
pub fn center_font(
    height: i32,
    positioning: &Positioning,
    origin: i32,
    reference: u32,
) -> Result<(i32, Positioning, i32)> {
    if !positioning.contains_key(&reference) {
        return Err(Error::ReferenceCharacterMissing {
            codepoint: reference,
        });
    }

    let mut height = height;
    let mut positioning = positioning.clone();
    let mut origin = origin;

    // Each step at least halves the residual, so this converges quickly;
    // the cap only guards against arithmetic surprises.
    for _ in 0..64 {
        let min_y = positioning[&reference].dy;
        let max_y = origin;
        let current_center = height as f64 / 2.0;
        let reference_center = (min_y + max_y) as f64 / 2.0;
        let delta = (current_center - reference_center).round() as i32;

        if delta > 0 {
            positioning = pad_font_top(&positioning, delta);
            height += delta;
            origin += delta;
        } else if delta < 0 {
            height -= delta;
        } else {
            break;
        }
    }

    Ok((height, positioning, origin))
}

/// Fit a font into a caller-imposed line height by centering it.
///
/// Returns the rewritten positioning and the shifted origin.
pub fn fit_font_to_new_height(
    target_height: i32,
    height: i32,
    positioning: &Positioning,
    origin: i32,
) -> (Positioning, i32) {
    let pad = ((target_height - height) as f64 / 2.0).round() as i32;
    (pad_font_top(positioning, pad), origin + pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(dy: i32, dx: i32, advance: i32) -> GlyphMetrics {
        GlyphMetrics { dy, dx, advance }
    }

    fn positioning(entries: &[(u32, GlyphMetrics)]) -> Positioning {
        entries.iter().copied().collect()
    }

    #[test]
    fn pad_shifts_dy_only() {
        let input = positioning(&[('A' as u32, metrics(2, 1, 8))]);
        let padded = pad_font_top(&input, 3);
        assert_eq!(padded[&('A' as u32)], metrics(5, 1, 8));

        let unpadded = pad_font_top(&padded, -3);
        assert_eq!(unpadded, input);
    }

    #[test]
    fn align_formulas_hold() {
        // Font 0: 10 rows, baseline at row 7. Font 1: 14 rows, baseline at
        // row 9.
        let heights = [10, 14];
        let origins = [7, 9];
        let positionings = [
            positioning(&[('A' as u32, metrics(1, 0, 6))]),
            positioning(&[('g' as u32, metrics(3, 0, 6))]),
        ];

        let (height, rewritten, origin) = align_fonts(&heights, &positionings, &origins);

        assert_eq!(origin, *origins.iter().max().unwrap());
        let below = heights
            .iter()
            .zip(&origins)
            .map(|(h, o)| h - o - 1)
            .max()
            .unwrap();
        assert_eq!(height, origin + below + 1);

        // Font 0 shifted by 9 - 7 = 2, font 1 untouched.
        assert_eq!(rewritten[0][&('A' as u32)].dy, 3);
        assert_eq!(rewritten[1][&('g' as u32)].dy, 3);
    }

    #[test]
    fn align_preserves_baseline_relative_placement() {
        let heights = [10, 14];
        let origins = [7, 9];
        let shared = 'B' as u32;
        let positionings = [
            positioning(&[(shared, metrics(1, 0, 6))]),
            positioning(&[(shared, metrics(3, 0, 6))]),
        ];
        // Both fonts place 'B' with its top 6 rows above their baseline.
        assert_eq!(origins[0] - positionings[0][&shared].dy, 6);
        assert_eq!(origins[1] - positionings[1][&shared].dy, 6);

        let (_, rewritten, origin) = align_fonts(&heights, &positionings, &origins);

        // After alignment the glyph's position relative to the common
        // baseline is identical no matter which font supplied it.
        assert_eq!(origin - rewritten[0][&shared].dy, 6);
        assert_eq!(origin - rewritten[1][&shared].dy, 6);
    }

    #[test]
    fn align_is_shift_invariant() {
        // Pre-shifting one input's positioning by a constant must not
        // change the derived frame, only that font's rewrite delta.
        let heights = [10, 14];
        let origins = [7, 9];
        let base = positioning(&[('A' as u32, metrics(1, 0, 6))]);
        let other = positioning(&[('g' as u32, metrics(3, 0, 6))]);

        let (h1, _, o1) = align_fonts(&heights, &[base.clone(), other.clone()], &origins);
        let shifted = pad_font_top(&base, 5);
        let (h2, _, o2) = align_fonts(&heights, &[shifted, other], &origins);

        assert_eq!((h1, o1), (h2, o2));
    }

    #[test]
    fn align_empty_input() {
        let (height, rewritten, origin) = align_fonts(&[], &[], &[]);
        assert_eq!((height, origin), (0, 0));
        assert!(rewritten.is_empty());
    }

    #[test]
    fn center_grows_height_and_is_idempotent() {
        let key = 'B' as u32;
        // Reference spans rows 1..=8 high in a 20-row box, so centering
        // pads the top until the span straddles the box middle.
        let input = positioning(&[(key, metrics(1, 0, 7))]);
        let (height, centered, origin) = center_font(20, &input, 8, key).unwrap();

        assert!(height >= 20);
        assert_eq!(height, 31);
        assert_eq!(origin, 19);
        // Reference span straddles the box middle exactly:
        // (dy + origin) / 2 == height / 2.
        assert_eq!(centered[&key].dy + origin, height);

        // Second pass finds the set already centered.
        let (height2, centered2, origin2) = center_font(height, &centered, origin, key).unwrap();
        assert_eq!(height2, height);
        assert_eq!(origin2, origin);
        assert_eq!(centered2, centered);
    }

    #[test]
    fn center_negative_delta_pads_bottom() {
        let key = 'B' as u32;
        // Reference sits low in the box: the box grows downward and the
        // glyph positions stay put.
        let input = positioning(&[(key, metrics(6, 0, 7))]);
        let (height, centered, origin) = center_font(10, &input, 9, key).unwrap();

        assert!(height >= 10);
        assert_eq!(height, 15);
        assert_eq!(origin, 9);
        assert_eq!(centered[&key].dy, 6);

        let (height2, centered2, origin2) = center_font(height, &centered, origin, key).unwrap();
        assert_eq!((height2, origin2), (height, origin));
        assert_eq!(centered2, centered);
    }

    #[test]
    fn center_missing_reference_fails() {
        let input = positioning(&[('A' as u32, metrics(1, 0, 7))]);
        let result = center_font(10, &input, 8, 'B' as u32);
        assert!(matches!(
            result,
            Err(Error::ReferenceCharacterMissing { codepoint }) if codepoint == 'B' as u32
        ));
    }

    #[test]
    fn fit_centers_within_target() {
        let key = 'A' as u32;
        let input = positioning(&[(key, metrics(0, 0, 5))]);
        let (fitted, origin) = fit_font_to_new_height(20, 10, &input, 8);
        assert_eq!(fitted[&key].dy, 5);
        assert_eq!(origin, 13);
    }
}
