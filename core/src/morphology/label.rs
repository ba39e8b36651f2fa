//! Connected-component labelling, region properties and selection

use crate::types::Connectivity;
use image::{GrayImage, Luma};
use imageproc::region_labelling;
use ndarray::{Array2, ArrayView2};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

/// Neighbourhood of the small-object removal pass
pub const DESPECKLE_CONNECTIVITY: Connectivity = Connectivity::Four;

/// Label grid: each connected foreground region carries a unique id, background is 0
///
/// Ids start at 1 and follow raster-scan order of each region's first pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    grid: Array2<u32>,
    count: u32,
}

impl Labels {
    /// Labels the foreground of `mask` under the given neighbourhood
    pub fn new(mask: ArrayView2<bool>, connectivity: Connectivity) -> Self {
        let (rows, cols) = mask.dim();
        let binary = GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
            Luma([mask[(y as usize, x as usize)] as u8])
        });
        let conn = match connectivity {
            Connectivity::Four => region_labelling::Connectivity::Four,
            Connectivity::Eight => region_labelling::Connectivity::Eight,
        };
        let raw = region_labelling::connected_components(&binary, conn, Luma([0u8]));

        // Renumber by first pixel in raster order
        let mut ids: HashMap<u32, u32> = HashMap::new();
        let mut grid = Array2::<u32>::zeros((rows, cols));
        for (x, y, px) in raw.enumerate_pixels() {
            let l = px[0];
            if l == 0 {
                continue;
            }
            let next = ids.len() as u32 + 1;
            grid[(y as usize, x as usize)] = *ids.entry(l).or_insert(next);
        }

        Self {
            grid,
            count: ids.len() as u32,
        }
    }

    /// Number of labelled regions
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn grid(&self) -> ArrayView2<'_, u32> {
        self.grid.view()
    }

    /// Union of the regions whose ids are listed
    pub fn mask_of(&self, ids: &[u32]) -> Array2<bool> {
        let mut keep = vec![false; self.count as usize + 1];
        for &id in ids {
            if let Some(slot) = keep.get_mut(id as usize) {
                *slot = id != 0;
            }
        }
        self.grid.mapv(|l| keep[l as usize])
    }

    /// Shape properties of every region, ordered by id
    pub fn regions(&self) -> Vec<RegionProps> {
        let mut acc: Vec<MomentAccumulator> =
            vec![MomentAccumulator::default(); self.count as usize];
        for ((r, c), &l) in self.grid.indexed_iter() {
            if l != 0 {
                acc[l as usize - 1].push(r, c);
            }
        }
        acc.into_iter()
            .enumerate()
            .map(|(i, a)| a.finish(i as u32 + 1))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct MomentAccumulator {
    n: usize,
    sum_r: f64,
    sum_c: f64,
    sum_rr: f64,
    sum_cc: f64,
    sum_rc: f64,
    min_r: usize,
    min_c: usize,
    max_r: usize,
    max_c: usize,
}

impl Default for MomentAccumulator {
    fn default() -> Self {
        Self {
            n: 0,
            sum_r: 0.0,
            sum_c: 0.0,
            sum_rr: 0.0,
            sum_cc: 0.0,
            sum_rc: 0.0,
            min_r: usize::MAX,
            min_c: usize::MAX,
            max_r: 0,
            max_c: 0,
        }
    }
}

impl MomentAccumulator {
    fn push(&mut self, r: usize, c: usize) {
        let (rf, cf) = (r as f64, c as f64);
        self.n += 1;
        self.sum_r += rf;
        self.sum_c += cf;
        self.sum_rr += rf * rf;
        self.sum_cc += cf * cf;
        self.sum_rc += rf * cf;
        self.min_r = self.min_r.min(r);
        self.min_c = self.min_c.min(c);
        self.max_r = self.max_r.max(r);
        self.max_c = self.max_c.max(c);
    }

    fn finish(self, label: u32) -> RegionProps {
        let n = self.n as f64;
        let (mr, mc) = (self.sum_r / n, self.sum_c / n);
        // Normalised second central moments (population covariance)
        let var_r = (self.sum_rr / n - mr * mr).max(0.0);
        let var_c = (self.sum_cc / n - mc * mc).max(0.0);
        let cov = self.sum_rc / n - mr * mc;

        let half_trace = (var_r + var_c) / 2.0;
        let spread = (((var_r - var_c) / 2.0).powi(2) + cov * cov).sqrt();
        let major = half_trace + spread;
        let minor = (half_trace - spread).max(0.0);
        let eccentricity = if major > 0.0 {
            (1.0 - minor / major).max(0.0).sqrt()
        } else {
            0.0
        };

        RegionProps {
            label,
            area: self.n,
            bbox: BoundingBox {
                min_row: self.min_r,
                min_col: self.min_c,
                max_row: self.max_r + 1,
                max_col: self.max_c + 1,
            },
            centroid: (mr, mc),
            eccentricity,
        }
    }
}

/// Half-open bounding box `[min, max)` of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_row: usize,
    pub min_col: usize,
    pub max_row: usize,
    pub max_col: usize,
}

/// Shape properties of one labelled region
#[derive(Debug, Clone, PartialEq)]
pub struct RegionProps {
    pub label: u32,
    /// Pixel count
    pub area: usize,
    pub bbox: BoundingBox,
    /// `(row, col)` centre of mass
    pub centroid: (f64, f64),
    /// Eccentricity of the ellipse with the same second moments; 0 is a circle
    pub eccentricity: f64,
}

/// Scalar shape metric a region can be filtered or annotated by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeMetric {
    Area,
    Eccentricity,
}

impl ShapeMetric {
    /// Value of this metric for a region
    pub fn of(&self, region: &RegionProps) -> f64 {
        match self {
            ShapeMetric::Area => region.area as f64,
            ShapeMetric::Eccentricity => region.eccentricity,
        }
    }
}

impl fmt::Display for ShapeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeMetric::Area => write!(f, "area"),
            ShapeMetric::Eccentricity => write!(f, "eccentricity"),
        }
    }
}

/// Rule deciding which labelled regions survive
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Keep regions whose metric is strictly below `bound`
    Below { metric: ShapeMetric, bound: f64 },
    /// Keep regions whose area is at least `min_area`
    AtLeast { min_area: usize },
    /// Keep the `k` largest regions; equal areas rank by ascending id
    LargestAreas(usize),
}

/// Outcome of a selection pass
#[derive(Debug, Clone)]
pub struct SelectedComponents {
    pub labels: Labels,
    pub regions: Vec<RegionProps>,
    /// Selected ids; rank order for [`Selection::LargestAreas`], id order otherwise
    pub selected: Vec<u32>,
    /// Union of the selected regions
    pub mask: Array2<bool>,
}

/// Labels a mask and recombines the regions a [`Selection`] keeps
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentSelector {
    connectivity: Connectivity,
}

impl ComponentSelector {
    pub fn new(connectivity: Connectivity) -> Self {
        Self { connectivity }
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Labels `mask` and keeps the regions chosen by `selection`
    pub fn select(&self, mask: ArrayView2<bool>, selection: Selection) -> SelectedComponents {
        let labels = Labels::new(mask, self.connectivity);
        let regions = labels.regions();

        let selected: Vec<u32> = match selection {
            Selection::Below { metric, bound } => regions
                .iter()
                .filter(|r| metric.of(r) < bound)
                .map(|r| r.label)
                .collect(),
            Selection::AtLeast { min_area } => regions
                .iter()
                .filter(|r| r.area >= min_area)
                .map(|r| r.label)
                .collect(),
            Selection::LargestAreas(k) => {
                let mut ranked: Vec<&RegionProps> = regions.iter().collect();
                ranked.sort_by_key(|r| (Reverse(r.area), r.label));
                ranked.into_iter().take(k).map(|r| r.label).collect()
            }
        };

        let mask = labels.mask_of(&selected);
        SelectedComponents {
            labels,
            regions,
            selected,
            mask,
        }
    }

}

/// Removes edge-connected regions with fewer than `min_size` pixels
///
/// Regions touching only at a corner are measured separately.
pub fn remove_small_objects(mask: ArrayView2<bool>, min_size: usize) -> Array2<bool> {
    ComponentSelector::new(DESPECKLE_CONNECTIVITY)
        .select(mask, Selection::AtLeast { min_area: min_size })
        .mask
}
