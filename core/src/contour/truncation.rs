//! Detection of bodies cut off by the reconstructed field or the image edges

use crate::morphology::{count, dilate, remove_small_objects, StructuringElement};
use crate::types::TruncationConfig;
use log::debug;
use ndarray::{s, Array2, ArrayView1, ArrayView2};

/// Contour pixel counts on each image border
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct EdgeCounts {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl EdgeCounts {
    /// Counts in `(left, right, top, bottom)` order
    pub fn as_tuple(&self) -> (usize, usize, usize, usize) {
        (self.left, self.right, self.top, self.bottom)
    }

    pub fn max(&self) -> usize {
        self.left.max(self.right).max(self.top).max(self.bottom)
    }
}

/// Outcome of truncation detection for one slice
#[derive(Debug, Clone)]
pub struct TruncationResult {
    /// Contour pixels touching the region outside the reconstructed field
    pub out_of_scan_map: Array2<bool>,
    pub out_of_scan_px: usize,
    pub is_out_of_scan: bool,
    /// Contour pixels lying on an image border
    pub out_of_edge_map: Array2<bool>,
    pub out_of_edge_px: EdgeCounts,
    pub is_out_of_edge: bool,
}

impl TruncationResult {
    /// Body extends beyond the field of view or the image edges
    pub fn is_truncated(&self) -> bool {
        self.is_out_of_scan || self.is_out_of_edge
    }
}

/// Flags out-of-scan and out-of-edge truncation of a contour
#[derive(Debug, Clone, Default)]
pub struct TruncationDetector {
    config: TruncationConfig,
}

impl TruncationDetector {
    pub fn new(config: TruncationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TruncationConfig {
        &self.config
    }

    /// Compares the final contour against the scan limit and the borders
    ///
    /// The scan-limit threshold is the image minimum plus one. Pixels at or
    /// below it form the region outside the reconstructed field, provided
    /// the threshold lies below air; otherwise the image carries no padding.
    pub fn detect(&self, pixels: ArrayView2<i16>, mask: ArrayView2<bool>) -> TruncationResult {
        let threshold = pixels.iter().min().map_or(0, |&m| m as i32 + 1);

        let scan_limit = self.scan_limit(pixels, threshold);
        let out_of_scan_map = &mask & &scan_limit;
        let out_of_scan_px = count(out_of_scan_map.view());

        let (out_of_edge_map, out_of_edge_px) = Self::edges(pixels, mask, threshold);

        let result = TruncationResult {
            is_out_of_scan: out_of_scan_px > self.config.out_of_scan_tolerance,
            out_of_scan_map,
            out_of_scan_px,
            is_out_of_edge: out_of_edge_px.max() > self.config.edge_tolerance,
            out_of_edge_map,
            out_of_edge_px,
        };
        debug!(
            "Truncation: out of scan {} px, edges {:?}",
            result.out_of_scan_px,
            result.out_of_edge_px.as_tuple()
        );
        result
    }

    fn scan_limit(&self, pixels: ArrayView2<i16>, threshold: i32) -> Array2<bool> {
        if threshold >= TruncationConfig::SCAN_LIMIT_CEILING_HU {
            return Array2::from_elem(pixels.dim(), false);
        }
        let raw = pixels.mapv(|v| (v as i32) <= threshold);
        let cleaned = remove_small_objects(raw.view(), self.config.small_objects_size);
        dilate(
            cleaned.view(),
            &StructuringElement::square(TruncationConfig::SCAN_LIMIT_DILATION),
        )
    }

    fn edges(
        pixels: ArrayView2<i16>,
        mask: ArrayView2<bool>,
        threshold: i32,
    ) -> (Array2<bool>, EdgeCounts) {
        let (rows, cols) = mask.dim();
        let mut map = Array2::from_elem((rows, cols), false);
        if rows == 0 || cols == 0 {
            return (map, EdgeCounts::default());
        }

        let hit = |pos: (usize, usize)| mask[pos] && (pixels[pos] as i32) > threshold;
        for r in 0..rows {
            map[(r, 0)] = hit((r, 0));
            map[(r, cols - 1)] = hit((r, cols - 1));
        }
        for c in 0..cols {
            map[(0, c)] = hit((0, c));
            map[(rows - 1, c)] = hit((rows - 1, c));
        }

        let side = |line: ArrayView1<bool>| line.iter().filter(|&&v| v).count();
        let counts = EdgeCounts {
            left: side(map.slice(s![.., 0])),
            right: side(map.slice(s![.., cols - 1])),
            top: side(map.slice(s![0, ..])),
            bottom: side(map.slice(s![rows - 1, ..])),
        };
        (map, counts)
    }

    /// Out-of-edge map thickened for display
    pub fn edge_display_map(result: &TruncationResult) -> Array2<bool> {
        dilate(
            result.out_of_edge_map.view(),
            &StructuringElement::square(TruncationConfig::EDGE_DISPLAY_DILATION),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ops::Range;

    fn body(
        rows: usize,
        cols: usize,
        r: Range<usize>,
        c: Range<usize>,
    ) -> (Array2<i16>, Array2<bool>) {
        let mask = Array2::from_shape_fn((rows, cols), |(i, j)| {
            r.contains(&i) && c.contains(&j)
        });
        let px = mask.mapv(|m| if m { 0_i16 } else { -1000 });
        (px, mask)
    }

    #[test]
    fn test_interior_body_not_truncated() {
        let (px, mask) = body(100, 100, 20..80, 20..80);
        let result = TruncationDetector::default().detect(px.view(), mask.view());
        assert!(!result.is_out_of_scan);
        assert!(!result.is_out_of_edge);
        assert!(!result.is_truncated());
        assert_eq!(result.out_of_edge_px, EdgeCounts::default());
        assert_eq!(result.out_of_scan_map.dim(), (100, 100));
    }

    #[test]
    fn test_left_border_out_of_edge() {
        let (px, mask) = body(100, 100, 10..40, 0..20);
        let result = TruncationDetector::default().detect(px.view(), mask.view());
        assert_eq!(result.out_of_edge_px.as_tuple(), (30, 0, 0, 0));
        assert!(result.is_out_of_edge);
        assert!(result.is_truncated());
    }

    #[test]
    fn test_edge_count_at_tolerance_not_flagged() {
        let (px, mask) = body(100, 100, 10..30, 0..20);
        let result = TruncationDetector::default().detect(px.view(), mask.view());
        assert_eq!(result.out_of_edge_px.left, 20);
        assert!(!result.is_out_of_edge);
    }

    #[test]
    fn test_edge_requires_intensity_above_scan_limit() {
        let (mut px, mask) = body(100, 100, 10..40, 0..20);
        for r in 10..40 {
            px[(r, 0)] = -1000;
        }
        let result = TruncationDetector::default().detect(px.view(), mask.view());
        assert_eq!(result.out_of_edge_px.left, 0);
    }

    #[test]
    fn test_body_against_padding_is_out_of_scan() {
        // Field of view disk padded with -3024 outside
        let size = 100;
        let px = Array2::from_shape_fn((size, size), |(r, c)| {
            let (dr, dc) = (r as f64 - 50.0, c as f64 - 50.0);
            let d2 = dr * dr + dc * dc;
            if d2 > 45.0 * 45.0 {
                -3024_i16
            } else if d2 <= 44.0 * 44.0 && c >= 10 {
                0
            } else {
                -1000
            }
        });
        let mask = px.mapv(|v| v == 0);

        let result = TruncationDetector::default().detect(px.view(), mask.view());
        assert!(result.out_of_scan_px > 25);
        assert!(result.is_out_of_scan);
        assert!(result.is_truncated());

        // A body well inside the field does not reach the padding
        let inner = Array2::from_shape_fn((size, size), |(r, c)| {
            let (dr, dc) = (r as f64 - 50.0, c as f64 - 50.0);
            dr * dr + dc * dc <= 30.0 * 30.0
        });
        let result = TruncationDetector::default().detect(px.view(), inner.view());
        assert_eq!(result.out_of_scan_px, 0);
        assert!(!result.is_out_of_scan);
    }

    #[test]
    fn test_background_below_air_ceiling_is_scan_limit() {
        let (px, mask) = body(128, 128, 40..88, 40..88);
        let detector = TruncationDetector::default();

        assert!(!detector.detect(px.view(), mask.view()).is_out_of_scan);

        // Same body on unpadded -1024 air
        let px = px.mapv(|v| if v == -1000 { -1024_i16 } else { v });
        let result = detector.detect(px.view(), mask.view());
        assert!(result.is_out_of_scan);
        assert!(result.out_of_scan_px > 25);
        assert!(result.is_truncated());
    }

    #[test]
    fn test_edge_display_map_is_thicker() {
        let (px, mask) = body(60, 60, 10..40, 0..20);
        let result = TruncationDetector::default().detect(px.view(), mask.view());
        let display = TruncationDetector::edge_display_map(&result);
        assert!(count(display.view()) > count(result.out_of_edge_map.view()));
    }
}
