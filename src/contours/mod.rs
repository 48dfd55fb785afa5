mod render;

pub use render::{render_contours, ContourPalette, DEFAULT_PALETTE_SEED};

use crate::background::ForegroundMask;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::point::Point;
use imageproc::rect::Rect;

/// Outline of one connected region, reduced to its corner points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest axis-aligned rectangle containing every point
    pub fn bounding_box(&self) -> Option<Rect> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(
            Rect::at(min_x, min_y)
                .of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32),
        )
    }
}

/// Tree links of one contour, mirroring (next, previous, first child, parent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyLink {
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

/// Contours of one frame together with their nesting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContourHierarchy {
    contours: Vec<Contour>,
    links: Vec<HierarchyLink>,
}

impl ContourHierarchy {
    /// Hierarchy where every contour is a top-level sibling
    pub fn siblings(contours: Vec<Contour>) -> Self {
        let count = contours.len();
        let links = (0..count)
            .map(|i| HierarchyLink {
                next: (i + 1 < count).then_some(i + 1),
                previous: i.checked_sub(1),
                first_child: None,
                parent: None,
            })
            .collect();
        Self { contours, links }
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn links(&self) -> &[HierarchyLink] {
        &self.links
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter()
    }

    /// Top-level contours, following the sibling chain from the first
    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        let first = (!self.contours.is_empty()).then_some(0);
        std::iter::successors(first, move |&i| self.links[i].next)
            .filter(move |&i| self.links[i].parent.is_none())
    }
}

/// Offset that turns the inclusive hysteresis comparisons into strict ones
///
/// Gradient magnitudes are square roots of integers, so no magnitude lies
/// within this distance above an integer threshold.
const STRICT_MARGIN: f32 = 1e-3;

/// Edge detection and outer-boundary extraction on cleaned masks
#[derive(Debug, Clone, Copy, Default)]
pub struct ContourExtractor;

impl ContourExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Smoothed hysteresis edge map with thresholds `threshold` and `2 * threshold`
    ///
    /// Edge pixels are 255. A pixel whose gradient exceeds only the low
    /// threshold is kept when it connects to one above the high threshold.
    pub fn detect_edges(&self, mask: &ForegroundMask, threshold: u8) -> GrayImage {
        if mask.width() == 0 || mask.height() == 0 {
            return GrayImage::new(mask.width(), mask.height());
        }
        let low = threshold as f32;
        canny(mask, low + STRICT_MARGIN, 2.0 * low + STRICT_MARGIN)
    }

    /// Outer contours of the edge regions in `mask`
    ///
    /// Holes and anything nested inside another region are dropped, and
    /// every contour keeps only its direction-changing points.
    pub fn extract(&self, mask: &ForegroundMask, threshold: u8) -> ContourHierarchy {
        let _span = tracing::debug_span!("extract").entered();

        if mask.width() == 0 || mask.height() == 0 {
            return ContourHierarchy::default();
        }

        let edge_map = self.detect_edges(mask, threshold);
        let contours: Vec<Contour> = find_contours::<i32>(&edge_map)
            .into_iter()
            .filter(|border| border.border_type == BorderType::Outer && border.parent.is_none())
            .map(|border| Contour::new(simplify_chain(&border.points)))
            .collect();

        tracing::debug!("Extracted {} contours at threshold {}", contours.len(), threshold);
        ContourHierarchy::siblings(contours)
    }
}

/// Drop every point that continues a straight run of a closed chain
fn simplify_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n <= 2 {
        return points.to_vec();
    }

    (0..n)
        .filter(|&k| {
            let prev = points[(k + n - 1) % n];
            let here = points[k];
            let next = points[(k + 1) % n];
            (here.x - prev.x, here.y - prev.y) != (next.x - here.x, next.y - here.y)
        })
        .map(|k| points[k])
        .collect()
}
