use super::ContourHierarchy;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when none is configured
pub const DEFAULT_PALETTE_SEED: u64 = 12345;

/// Line thickness of drawn contours in pixels
const THICKNESS: i32 = 2;

/// Deterministic source of contour colors
///
/// The generator persists across frames: the same seed and the same
/// sequence of contours always yield the same colors.
pub struct ContourPalette {
    seed: u64,
    rng: StdRng,
}

impl ContourPalette {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_color(&mut self) -> Rgb<u8> {
        Rgb([
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
            self.rng.gen_range(0..255),
        ])
    }

    /// One color per contour, in hierarchy order
    pub fn assign(&mut self, hierarchy: &ContourHierarchy) -> Vec<Rgb<u8>> {
        (0..hierarchy.len()).map(|_| self.next_color()).collect()
    }
}

impl Default for ContourPalette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE_SEED)
    }
}

/// Draw every contour as a closed polyline on a black canvas
pub fn render_contours(
    hierarchy: &ContourHierarchy,
    colors: &[Rgb<u8>],
    width: u32,
    height: u32,
) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);

    for (contour, color) in hierarchy.iter().zip(colors) {
        let points = contour.points();
        if points.is_empty() {
            continue;
        }

        let segments = points.iter().zip(points.iter().cycle().skip(1));
        for (a, b) in segments {
            for offset in 0..THICKNESS {
                let shift = offset as f32;
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x as f32 + shift, a.y as f32),
                    (b.x as f32 + shift, b.y as f32),
                    *color,
                );
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x as f32, a.y as f32 + shift),
                    (b.x as f32, b.y as f32 + shift),
                    *color,
                );
            }
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_colors() {
        let mut a = ContourPalette::new(7);
        let mut b = ContourPalette::new(7);
        let first: Vec<_> = (0..10).map(|_| a.next_color()).collect();
        let second: Vec<_> = (0..10).map(|_| b.next_color()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = ContourPalette::new(1);
        let mut b = ContourPalette::new(2);
        let first: Vec<_> = (0..10).map(|_| a.next_color()).collect();
        let second: Vec<_> = (0..10).map(|_| b.next_color()).collect();
        assert_ne!(first, second);
    }
}
