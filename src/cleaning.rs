use crate::background::ForegroundMask;
use crate::params::clamp_kernel_size;
use image::{GrayImage, Luma};
use imageproc::morphology::{grayscale_close, grayscale_dilate, grayscale_erode, Mask};

/// Square structuring element anchored at `size / 2`
///
/// Even sides have no center pixel, so the kernel reaches one cell further
/// before the anchor than after it. Erosion then runs with the reflected
/// kernel, which keeps closing extensive and idempotent for every size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    size: u32,
    kernel: Mask,
    reflected: Mask,
}

impl StructuringElement {
    pub fn square(size: u32) -> Self {
        let size = size.clamp(1, u8::MAX as u32);

        if size % 2 == 1 {
            let kernel = Mask::square(((size - 1) / 2) as u8);
            return Self {
                size,
                reflected: kernel.clone(),
                kernel,
            };
        }

        let anchor = (size / 2) as u8;
        let cells = GrayImage::from_pixel(size, size, Luma([255]));
        Self {
            size,
            kernel: Mask::from_image(&cells, anchor, anchor),
            reflected: Mask::from_image(&cells, size as u8 - 1 - anchor, size as u8 - 1 - anchor),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn is_symmetric(&self) -> bool {
        self.size % 2 == 1
    }

    pub fn dilate(&self, mask: &GrayImage) -> GrayImage {
        grayscale_dilate(mask, &self.kernel)
    }

    /// Erosion paired with [`dilate`](Self::dilate)
    pub fn erode(&self, mask: &GrayImage) -> GrayImage {
        grayscale_erode(mask, &self.reflected)
    }

    /// Dilation followed by erosion
    pub fn close(&self, mask: &GrayImage) -> GrayImage {
        if self.is_symmetric() {
            grayscale_close(mask, &self.kernel)
        } else {
            self.erode(&self.dilate(mask))
        }
    }
}

/// Morphological closing of foreground masks
///
/// Keeps the structuring element between frames and rebuilds it only when
/// the requested size changes.
#[derive(Debug, Clone)]
pub struct MaskCleaner {
    element: StructuringElement,
}

impl Default for MaskCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskCleaner {
    pub fn new() -> Self {
        Self {
            element: StructuringElement::square(1),
        }
    }

    pub fn element(&self) -> &StructuringElement {
        &self.element
    }

    /// Close `mask` in place with a square kernel of side `kernel_size`
    ///
    /// Sizes outside 1..=21 are clamped.
    pub fn clean(&mut self, mask: &mut ForegroundMask, kernel_size: i32) {
        let _span = tracing::debug_span!("clean").entered();

        let size = clamp_kernel_size(kernel_size);
        if self.element.size() != size {
            tracing::debug!("Rebuilding structuring element: {}x{}", size, size);
            self.element = StructuringElement::square(size);
        }

        if size == 1 || mask.width() == 0 || mask.height() == 0 {
            return;
        }

        *mask = self.element.close(mask);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noisy_mask(seed: u64, width: u32, height: u32) -> GrayImage {
        let mut rng = StdRng::seed_from_u64(seed);
        GrayImage::from_fn(width, height, |_, _| {
            if rng.gen_bool(0.3) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn closing_is_idempotent_for_odd_and_even_kernels() {
        for size in 1..=7 {
            let mut cleaner = MaskCleaner::new();
            let mut once = noisy_mask(size as u64, 40, 30);
            cleaner.clean(&mut once, size);

            let mut twice = once.clone();
            cleaner.clean(&mut twice, size);
            assert_eq!(once, twice, "closing with size {} is not idempotent", size);
        }
    }

    #[test]
    fn closing_fills_gap_between_fragments() {
        let mut mask = GrayImage::new(20, 10);
        for y in 3..7 {
            for x in (2..8).chain(9..15) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        MaskCleaner::new().clean(&mut mask, 3);
        for y in 3..7 {
            assert_eq!(mask.get_pixel(8, y)[0], 255);
        }
        assert_eq!(mask.get_pixel(1, 5)[0], 0);
        assert_eq!(mask.get_pixel(16, 5)[0], 0);
    }

    #[test]
    fn closing_is_extensive() {
        for size in [2, 4, 5] {
            let original = noisy_mask(99, 25, 25);
            let mut closed = original.clone();
            MaskCleaner::new().clean(&mut closed, size);

            for (before, after) in original.pixels().zip(closed.pixels()) {
                assert!(after[0] >= before[0], "size {} removed foreground", size);
            }
        }
    }

    #[test]
    fn even_kernel_keeps_isolated_pixel() {
        let mut mask = GrayImage::new(9, 9);
        mask.put_pixel(4, 4, Luma([255]));

        MaskCleaner::new().clean(&mut mask, 2);
        assert_eq!(mask.get_pixel(4, 4)[0], 255);
        assert_eq!(crate::background::foreground_count(&mask), 1);
    }

    #[test]
    fn non_positive_kernel_is_clamped_to_identity() {
        let original = noisy_mask(7, 16, 16);
        let mut mask = original.clone();
        let mut cleaner = MaskCleaner::new();
        cleaner.clean(&mut mask, -3);

        assert_eq!(mask, original);
        assert_eq!(cleaner.element().size(), 1);
    }

    #[test]
    fn element_rebuilt_on_size_change() {
        let mut cleaner = MaskCleaner::new();
        let mut mask = GrayImage::new(8, 8);
        cleaner.clean(&mut mask, 5);
        assert_eq!(cleaner.element(), &StructuringElement::square(5));
        cleaner.clean(&mut mask, 30);
        assert_eq!(cleaner.element().size(), 21);
    }
}
