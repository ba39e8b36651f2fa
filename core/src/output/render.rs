//! Diagnostic figures rendered as PNG
//!
//! Intensity grids are windowed from their minimum to their maximum onto
//! 8-bit grey; masks are drawn white on black. Titles, step labels and region
//! annotations use the embedded DejaVu Sans Mono font.

use crate::contour::{ShapeAnnotation, StepImage, TruncationDetector};
use crate::error::Result;
use crate::morphology::Labels;
use crate::slice::FinalizedSlice;
use crate::types::{Color, Connectivity, TruncationConfig};
use ab_glyph::FontRef;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use ndarray::ArrayView2;

/// Panels per row in the detail figure
pub const DETAIL_COLUMNS: usize = 4;

/// Gap between panels (px)
pub const PANEL_GAP: u32 = 4;

/// Height of the file-name strip on top of the detail figure (px)
pub const TITLE_HEIGHT: u32 = 26;

/// Height of the step-label strip above each panel (px)
pub const LABEL_HEIGHT: u32 = 20;

const TITLE_SCALE: f32 = 18.0;
const LABEL_SCALE: f32 = 14.0;
const CUTOUT_LABEL: &str = "Cutout";

/// Loads the embedded annotation font
pub fn annotation_font() -> Result<FontRef<'static>> {
    Ok(FontRef::try_from_slice(include_bytes!(
        "../../assets/DejaVuSansMono.ttf"
    ))?)
}

/// Maps intensities linearly from `[lo, hi]` onto `0..=255`
fn window(value: i16, lo: i16, hi: i16) -> u8 {
    if hi <= lo {
        return 0;
    }
    let t = (value as f64 - lo as f64) / (hi as f64 - lo as f64);
    (t.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn grey_range(pixels: ArrayView2<i16>) -> (i16, i16) {
    pixels
        .iter()
        .fold((i16::MAX, i16::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Blits a windowed intensity grid at `(ox, oy)`
fn blit_intensity(
    canvas: &mut RgbImage,
    ox: u32,
    oy: u32,
    pixels: ArrayView2<i16>,
    range: (i16, i16),
) {
    for ((r, c), &v) in pixels.indexed_iter() {
        let g = window(v, range.0, range.1);
        canvas.put_pixel(ox + c as u32, oy + r as u32, Rgb([g, g, g]));
    }
}

fn blit_mask(canvas: &mut RgbImage, ox: u32, oy: u32, mask: ArrayView2<bool>) {
    for ((r, c), &v) in mask.indexed_iter() {
        let g = if v { 255 } else { 0 };
        canvas.put_pixel(ox + c as u32, oy + r as u32, Rgb([g, g, g]));
    }
}

/// Paints every set pixel of `mask` in `color`
fn paint(canvas: &mut RgbImage, ox: u32, oy: u32, mask: ArrayView2<bool>, color: Color) {
    for ((r, c), &v) in mask.indexed_iter() {
        if v {
            canvas.put_pixel(ox + c as u32, oy + r as u32, Rgb(color.0));
        }
    }
}

/// Mask pixels with a 4-neighbour outside the mask or the grid
pub fn outline(mask: ArrayView2<bool>) -> ndarray::Array2<bool> {
    let (rows, cols) = mask.dim();
    ndarray::Array2::from_shape_fn((rows, cols), |(r, c)| {
        mask[(r, c)]
            && Connectivity::Four.offsets().iter().any(|&(dr, dc)| {
                let (nr, nc) = (r as isize + dr, c as isize + dc);
                nr < 0
                    || nc < 0
                    || nr >= rows as isize
                    || nc >= cols as isize
                    || !mask[(nr as usize, nc as usize)]
            })
    })
}

/// Top-left corner of the image area of panel `index`
fn panel_origin(index: usize, width: u32, height: u32) -> (u32, u32) {
    let col = (index % DETAIL_COLUMNS) as u32;
    let row = (index / DETAIL_COLUMNS) as u32;
    (
        col * (width + PANEL_GAP),
        TITLE_HEIGHT + row * (LABEL_HEIGHT + height + PANEL_GAP) + LABEL_HEIGHT,
    )
}

/// Boxes every region of `mask` and writes its formatted metric above it
fn annotate_regions(
    canvas: &mut RgbImage,
    font: &FontRef<'_>,
    origin: (u32, u32),
    mask: ArrayView2<bool>,
    connectivity: Connectivity,
    annotation: &ShapeAnnotation,
) {
    let (ox, oy) = (origin.0 as i32, origin.1 as i32);
    let half = mask.ncols() / 2;
    let color = Rgb(annotation.color.0);

    for region in Labels::new(mask, connectivity).regions() {
        let b = region.bbox;
        let (box_w, box_h) = (b.max_col - b.min_col, b.max_row - b.min_row);
        let rect = Rect::at(ox + b.min_col as i32, oy + b.min_row as i32)
            .of_size(box_w as u32, box_h as u32);
        draw_hollow_rect_mut(canvas, rect, color);

        let text = annotation.format(annotation.metric.of(&region));
        let (text_w, text_h) = text_size(LABEL_SCALE, font, &text);
        // Left-aligned on the left half, right-aligned on the right half
        let x = if b.min_col <= half {
            ox + b.min_col as i32
        } else {
            ox + b.max_col as i32 - text_w as i32
        };
        let y = (oy + b.min_row as i32 - 2 - text_h as i32).max(oy);
        draw_text_mut(canvas, color, x, y, LABEL_SCALE, font, &text);
    }
}

/// Every pipeline step in a grid, plus the image cut out by the final mask
///
/// The figure is titled with the file name and each panel with its step
/// label. Steps carrying a shape annotation get a box and the formatted
/// metric value for each region.
pub fn render_detail(slice: &FinalizedSlice) -> Result<RgbImage> {
    let font = annotation_font()?;
    let white = Rgb(Color::WHITE.0);
    let steps = slice.contour().steps();
    let (rows, cols) = slice.image().shape();
    let (w, h) = (cols as u32, rows as u32);
    let panels = steps.len() + 1;
    let grid_rows = panels.div_ceil(DETAIL_COLUMNS) as u32;
    let mut canvas = RgbImage::new(
        DETAIL_COLUMNS as u32 * (w + PANEL_GAP) - PANEL_GAP,
        TITLE_HEIGHT + grid_rows * (LABEL_HEIGHT + h + PANEL_GAP) - PANEL_GAP,
    );

    draw_text_mut(
        &mut canvas,
        white,
        2,
        4,
        TITLE_SCALE,
        &font,
        &slice.file_name(),
    );

    let connectivity = slice.contour().params().connectivity;
    for (i, step) in steps.iter().enumerate() {
        let (ox, oy) = panel_origin(i, w, h);
        let label_y = (oy - LABEL_HEIGHT + 3) as i32;
        draw_text_mut(
            &mut canvas,
            white,
            ox as i32,
            label_y,
            LABEL_SCALE,
            &font,
            step.label(),
        );

        match step.image() {
            StepImage::Intensity(px) => {
                blit_intensity(&mut canvas, ox, oy, px.view(), grey_range(px.view()))
            }
            StepImage::Mask(mask) => blit_mask(&mut canvas, ox, oy, mask.view()),
        }

        if let (Some(annotation), Some(mask)) = (step.annotation(), step.image().as_mask()) {
            let origin = (ox, oy);
            annotate_regions(&mut canvas, &font, origin, mask.view(), connectivity, annotation);
        }
    }

    let pixels = slice.image().pixels();
    let range = grey_range(pixels);
    let cutout = ndarray::Zip::from(pixels)
        .and(slice.contour().mask())
        .map_collect(|&v, &inside| if inside { v } else { range.0 });
    let (ox, oy) = panel_origin(DETAIL_COLUMNS * grid_rows as usize - 1, w, h);
    let label_y = (oy - LABEL_HEIGHT + 3) as i32;
    draw_text_mut(
        &mut canvas,
        white,
        ox as i32,
        label_y,
        LABEL_SCALE,
        &font,
        CUTOUT_LABEL,
    );
    blit_intensity(&mut canvas, ox, oy, cutout.view(), range);

    Ok(canvas)
}

/// Original image beside the same image with the contour outline
pub fn render_thumbs(slice: &FinalizedSlice, contour_color: Color) -> RgbImage {
    let pixels = slice.image().pixels();
    let (rows, cols) = pixels.dim();
    let (w, h) = (cols as u32, rows as u32);
    let range = grey_range(pixels);

    let mut canvas = RgbImage::new(2 * w + PANEL_GAP, h);
    blit_intensity(&mut canvas, 0, 0, pixels, range);
    blit_intensity(&mut canvas, w + PANEL_GAP, 0, pixels, range);
    paint(
        &mut canvas,
        w + PANEL_GAP,
        0,
        outline(slice.contour().mask()).view(),
        contour_color,
    );
    canvas
}

/// Original image with out-of-scan and thickened out-of-edge pixels highlighted
pub fn render_truncation(slice: &FinalizedSlice, config: &TruncationConfig) -> RgbImage {
    let pixels = slice.image().pixels();
    let (rows, cols) = pixels.dim();
    let mut canvas = RgbImage::new(cols as u32, rows as u32);
    blit_intensity(&mut canvas, 0, 0, pixels, grey_range(pixels));

    let truncation = slice.truncation();
    paint(&mut canvas, 0, 0, truncation.out_of_scan_map.view(), config.oos_color);
    let edges = TruncationDetector::edge_display_map(truncation);
    paint(&mut canvas, 0, 0, edges.view(), config.ooe_color);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SliceMetadata;
    use crate::calibration::CalibratedImage;
    use crate::contour::ContourExtractor;
    use crate::slice::SliceRecord;
    use crate::types::MorphologyConfig;
    use ndarray::{array, Array2};
    use std::path::PathBuf;

    fn finalized(left_edge: bool) -> FinalizedSlice {
        let px = Array2::from_shape_fn((60, 60), |(r, c)| {
            let lo = if left_edge { 0 } else { 15 };
            if (15..45).contains(&r) && (lo..45).contains(&c) {
                30_i16
            } else {
                -1000
            }
        });
        let image = CalibratedImage::new(px, None, None, None);
        SliceRecord::new(PathBuf::from("s.dcm"), SliceMetadata::default(), image)
            .contour(&ContourExtractor::new(
                MorphologyConfig::default().with_areas(1),
            ))
            .flag_truncation(&TruncationDetector::default())
    }

    fn lit_pixels(img: &RgbImage, xs: std::ops::Range<u32>, ys: std::ops::Range<u32>) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0 != [0, 0, 0])
            .count()
    }

    #[test]
    fn test_window() {
        assert_eq!(window(-1000, -1000, 1000), 0);
        assert_eq!(window(1000, -1000, 1000), 255);
        assert_eq!(window(0, -1000, 1000), 128);
        assert_eq!(window(5, 5, 5), 0);
    }

    #[test]
    fn test_outline_of_block() {
        let mask =
            Array2::from_shape_fn((5, 5), |(r, c)| (1..4).contains(&r) && (1..4).contains(&c));
        let edge = outline(mask.view());
        assert!(edge[(1, 1)]);
        assert!(!edge[(2, 2)]);
        assert!(!edge[(0, 0)]);
        assert_eq!(edge.iter().filter(|&&v| v).count(), 8);
    }

    #[test]
    fn test_embedded_font_loads() {
        let font = annotation_font().unwrap();
        let (w, h) = text_size(LABEL_SCALE, &font, "0.500");
        assert!(w > 0 && h > 0);
        // Monospaced
        assert_eq!(text_size(LABEL_SCALE, &font, "11111").0, w);
    }

    #[test]
    fn test_detail_layout() {
        let slice = finalized(false);
        let img = render_detail(&slice).unwrap();
        // 11 panels in 3 rows of 4, each under a label strip
        assert_eq!(img.width(), 4 * 60 + 3 * PANEL_GAP);
        assert_eq!(
            img.height(),
            TITLE_HEIGHT + 3 * (LABEL_HEIGHT + 60) + 2 * PANEL_GAP
        );
    }

    #[test]
    fn test_detail_titles_and_labels() {
        let slice = finalized(false);
        let img = render_detail(&slice).unwrap();
        // File name across the top
        assert!(lit_pixels(&img, 0..img.width(), 0..TITLE_HEIGHT) > 0);
        // Step label above the first panel
        let (ox, oy) = panel_origin(0, 60, 60);
        assert!(lit_pixels(&img, ox..ox + 60, oy - LABEL_HEIGHT..oy) > 0);
        // "Cutout" above the last slot
        let (ox, oy) = panel_origin(11, 60, 60);
        assert!(lit_pixels(&img, ox..ox + 60, oy - LABEL_HEIGHT..oy) > 0);
    }

    #[test]
    fn test_detail_annotations_above_regions() {
        let slice = finalized(false);
        let steps = slice.contour().steps();
        let annotated = steps.iter().position(|s| s.annotation().is_some()).unwrap();
        let plain = steps
            .iter()
            .position(|s| s.annotation().is_none() && s.image().as_mask().is_some())
            .unwrap();
        let img = render_detail(&slice).unwrap();

        // The square starts at row 15; its metric is written in the rows above
        let (ox, oy) = panel_origin(annotated, 60, 60);
        assert!(lit_pixels(&img, ox..ox + 60, oy..oy + 14) > 0);
        let (ox, oy) = panel_origin(plain, 60, 60);
        assert_eq!(lit_pixels(&img, ox..ox + 60, oy..oy + 14), 0);
    }

    #[test]
    fn test_thumbs_outline_colour() {
        let slice = finalized(false);
        let img = render_thumbs(&slice, Color::RED);
        assert_eq!(img.width(), 2 * 60 + PANEL_GAP);
        // Top edge of the square, mid-width
        let x = 60 + PANEL_GAP + 30;
        assert_eq!(img.get_pixel(x, 15), &Rgb(Color::RED.0));
        assert_ne!(img.get_pixel(x, 30), &Rgb(Color::RED.0));
        // Left panel is untouched grey
        let p = img.get_pixel(15, 15);
        assert_eq!(p.0[0], p.0[1]);
    }

    #[test]
    fn test_truncation_overlay() {
        let slice = finalized(true);
        assert!(slice.truncation().is_out_of_edge);
        let config = TruncationConfig::default();
        let img = render_truncation(&slice, &config);
        assert_eq!(img.get_pixel(0, 30), &Rgb(config.ooe_color.0));
        assert_eq!(img.get_pixel(30, 30).0[0], img.get_pixel(30, 30).0[2]);
    }

    #[test]
    fn test_grey_range() {
        let px = array![[3_i16, -7], [12, 0]];
        assert_eq!(grey_range(px.view()), (-7, 12));
    }
}
