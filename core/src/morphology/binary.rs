//! Binary morphology on boolean grids
//!
//! Border conventions: pixels outside the grid count as foreground for
//! erosion and as background for dilation, so neither operator invents or
//! removes foreground purely because it sits near the image edge.

use crate::types::Connectivity;
use ndarray::{Array2, ArrayView2};
use std::collections::VecDeque;

/// Structuring element, stored as offsets `(drow, dcol)` from its origin
///
/// For a footprint of side `n` the origin sits at index `n / 2`, so an even
/// square of side 4 spans offsets `-2..=1` on each axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    offsets: Vec<(isize, isize)>,
}

impl StructuringElement {
    /// Full `side × side` square
    pub fn square(side: usize) -> Self {
        let origin = (side / 2) as isize;
        let offsets = (0..side as isize)
            .flat_map(|r| (0..side as isize).map(move |c| (r - origin, c - origin)))
            .collect();
        Self { offsets }
    }

    /// Disk of the given radius: every offset with `dr² + dc² <= radius²`
    pub fn disk(radius: usize) -> Self {
        let r = radius as isize;
        let offsets = (-r..=r)
            .flat_map(|dr| (-r..=r).map(move |dc| (dr, dc)))
            .filter(|(dr, dc)| dr * dr + dc * dc <= r * r)
            .collect();
        Self { offsets }
    }

    /// Offsets relative to the origin
    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    /// Number of active footprint cells
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[inline]
fn shifted(
    (r, c): (usize, usize),
    (dr, dc): (isize, isize),
    (rows, cols): (usize, usize),
) -> Option<(usize, usize)> {
    let nr = r as isize + dr;
    let nc = c as isize + dc;
    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
        None
    } else {
        Some((nr as usize, nc as usize))
    }
}

/// Foreground where `pixels > cutoff`
pub fn threshold_above(pixels: ArrayView2<i16>, cutoff: i16) -> Array2<bool> {
    pixels.mapv(|v| v > cutoff)
}

/// Binary erosion
///
/// A pixel survives when every footprint position `p + e` is foreground.
pub fn erode(mask: ArrayView2<bool>, element: &StructuringElement) -> Array2<bool> {
    let dim = mask.dim();
    Array2::from_shape_fn(dim, |pos| {
        element.offsets().iter().all(|&off| match shifted(pos, off, dim) {
            Some(q) => mask[q],
            None => true,
        })
    })
}

/// Binary dilation
///
/// A pixel is set when any reflected footprint position `p - e` is foreground.
pub fn dilate(mask: ArrayView2<bool>, element: &StructuringElement) -> Array2<bool> {
    let dim = mask.dim();
    let mut out = Array2::from_elem(dim, false);
    for ((r, c), &set) in mask.indexed_iter() {
        if !set {
            continue;
        }
        for &off in element.offsets() {
            if let Some(q) = shifted((r, c), off, dim) {
                out[q] = true;
            }
        }
    }
    out
}

/// Binary closing: dilation followed by erosion with the same element
pub fn close(mask: ArrayView2<bool>, element: &StructuringElement) -> Array2<bool> {
    let dilated = dilate(mask, element);
    erode(dilated.view(), element)
}

/// Fills background regions that cannot reach the image border
///
/// Background is flooded from the border under 4-connectivity; anything
/// the flood does not reach is a hole and becomes foreground.
pub fn fill_holes(mask: ArrayView2<bool>) -> Array2<bool> {
    let (rows, cols) = mask.dim();
    let mut outside = Array2::from_elem((rows, cols), false);
    let mut queue = VecDeque::new();

    let border = (0..rows)
        .flat_map(|r| [(r, 0), (r, cols.saturating_sub(1))])
        .chain((0..cols).flat_map(|c| [(0, c), (rows.saturating_sub(1), c)]));
    for pos in border {
        if rows > 0 && cols > 0 && !mask[pos] && !outside[pos] {
            outside[pos] = true;
            queue.push_back(pos);
        }
    }

    while let Some(pos) = queue.pop_front() {
        for &off in Connectivity::Four.offsets() {
            if let Some(q) = shifted(pos, off, (rows, cols)) {
                if !mask[q] && !outside[q] {
                    outside[q] = true;
                    queue.push_back(q);
                }
            }
        }
    }

    outside.mapv(|o| !o)
}

/// Number of foreground pixels
pub fn count(mask: ArrayView2<bool>) -> usize {
    mask.iter().filter(|&&v| v).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn square_mask(size: usize, top: usize, left: usize, side: usize) -> Array2<bool> {
        Array2::from_shape_fn((size, size), |(r, c)| {
            r >= top && r < top + side && c >= left && c < left + side
        })
    }

    #[test]
    fn test_square_offsets_even_side() {
        let se = StructuringElement::square(4);
        assert_eq!(se.len(), 16);
        assert!(se.offsets().contains(&(-2, -2)));
        assert!(se.offsets().contains(&(1, 1)));
        assert!(!se.offsets().contains(&(2, 2)));
    }

    #[test]
    fn test_disk_shape() {
        assert_eq!(StructuringElement::disk(0).len(), 1);
        assert_eq!(StructuringElement::disk(1).len(), 5);
        assert_eq!(StructuringElement::disk(2).len(), 13);
    }

    #[test]
    fn test_threshold_is_strict() {
        let px = array![[-261_i16, -260], [-259, 0]];
        assert_eq!(
            threshold_above(px.view(), -260),
            array![[false, false], [true, true]]
        );
    }

    #[test]
    fn test_erode_square_shrinks_block() {
        let mask = square_mask(20, 5, 5, 10);
        let eroded = erode(mask.view(), &StructuringElement::square(3));
        assert_eq!(count(eroded.view()), 64);
        assert!(eroded[(6, 6)]);
        assert!(!eroded[(5, 5)]);
    }

    #[test]
    fn test_erode_treats_outside_as_foreground() {
        let mask = Array2::from_elem((5, 5), true);
        let eroded = erode(mask.view(), &StructuringElement::square(3));
        assert_eq!(count(eroded.view()), 25);
    }

    #[test]
    fn test_dilate_then_erode_even_square_restores_block() {
        let mask = square_mask(30, 10, 10, 8);
        let se = StructuringElement::square(4);
        let dilated = dilate(mask.view(), &se);
        assert_eq!(count(dilated.view()), 11 * 11);
        let restored = erode(dilated.view(), &se);
        assert_eq!(restored, mask);
    }

    #[test]
    fn test_close_bridges_gap() {
        let mut mask = square_mask(20, 5, 5, 10);
        for r in 5..15 {
            mask[(r, 10)] = false;
        }
        let closed = close(mask.view(), &StructuringElement::disk(2));
        assert!(closed[(8, 10)]);
    }

    #[test]
    fn test_fill_holes_ring() {
        let mut mask = square_mask(12, 2, 2, 8);
        for r in 4..8 {
            for c in 4..8 {
                mask[(r, c)] = false;
            }
        }
        let filled = fill_holes(mask.view());
        assert_eq!(filled, square_mask(12, 2, 2, 8));
    }

    #[test]
    fn test_fill_holes_keeps_border_connected_background() {
        // U shape open to the top edge
        let mut mask = square_mask(10, 0, 2, 6);
        for r in 0..4 {
            for c in 4..6 {
                mask[(r, c)] = false;
            }
        }
        let filled = fill_holes(mask.view());
        assert_eq!(filled, mask);
    }

    #[test]
    fn test_fill_holes_diagonal_leak_is_a_hole() {
        // Background pixel touching the outside only through a corner
        let mask = array![
            [false, false, false, false],
            [false, true, true, false],
            [true, false, true, false],
            [true, true, true, false],
        ];
        let filled = fill_holes(mask.view());
        assert!(filled[(2, 1)]);
        assert!(!filled[(1, 0)]);
        assert_eq!(count(filled.view()), count(mask.view()) + 1);
    }

    #[test]
    fn test_operations_preserve_shape() {
        let mask = square_mask(17, 3, 3, 5);
        let se = StructuringElement::square(4);
        assert_eq!(erode(mask.view(), &se).dim(), (17, 17));
        assert_eq!(dilate(mask.view(), &se).dim(), (17, 17));
        assert_eq!(close(mask.view(), &StructuringElement::disk(2)).dim(), (17, 17));
        assert_eq!(fill_holes(mask.view()).dim(), (17, 17));
    }
}
