use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

const LABEL_BACKGROUND: Rgb<u8> = Rgb([0xd3, 0xd3, 0xd3]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Label box corners, inclusive
const LABEL_TOP_LEFT: (i32, i32) = (10, 2);
const LABEL_BOTTOM_RIGHT: (i32, i32) = (100, 20);
const TEXT_ORIGIN: (f32, f32) = (15.0, 5.0);

const DIGIT_WIDTH: f32 = 6.0;
const DIGIT_HEIGHT: f32 = 10.0;
const DIGIT_ADVANCE: f32 = 9.0;

/// Seven-segment strokes as fractions of the digit box: (x0, y0, x1, y1)
const SEGMENTS: [(f32, f32, f32, f32); 7] = [
    (0.0, 0.0, 1.0, 0.0), // top
    (1.0, 0.0, 1.0, 0.5), // upper right
    (1.0, 0.5, 1.0, 1.0), // lower right
    (0.0, 1.0, 1.0, 1.0), // bottom
    (0.0, 0.5, 0.0, 1.0), // lower left
    (0.0, 0.0, 0.0, 0.5), // upper left
    (0.0, 0.5, 1.0, 0.5), // middle
];

/// Lit segments per digit, bit `i` selects `SEGMENTS[i]`
const DIGITS: [u8; 10] = [
    0b011_1111, 0b000_0110, 0b101_1011, 0b100_1111, 0b110_0110, 0b110_1101, 0b111_1101,
    0b000_0111, 0b111_1111, 0b110_1111,
];

/// Write the frame number onto a light label in the top-left corner
///
/// Anything outside the image is clipped.
pub fn stamp_frame_number(image: &mut RgbImage, frame: u64) {
    let (left, top) = LABEL_TOP_LEFT;
    let (right, bottom) = LABEL_BOTTOM_RIGHT;
    let label = Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
    draw_filled_rect_mut(image, label, LABEL_BACKGROUND);

    let (mut x, y) = TEXT_ORIGIN;
    for digit in frame.to_string().bytes().map(|b| (b - b'0') as usize) {
        for (i, &(x0, y0, x1, y1)) in SEGMENTS.iter().enumerate() {
            if DIGITS[digit] & (1 << i) != 0 {
                draw_line_segment_mut(
                    image,
                    (x + x0 * DIGIT_WIDTH, y + y0 * DIGIT_HEIGHT),
                    (x + x1 * DIGIT_WIDTH, y + y1 * DIGIT_HEIGHT),
                    INK,
                );
            }
        }
        x += DIGIT_ADVANCE;
    }
}
