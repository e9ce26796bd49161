//! Average-hash perceptual fingerprint
//!
//! Downscale to an N×N grayscale grid, set each bit when the cell is at or
//! above the grid mean, and pack the bits MSB-first into lowercase hex.
//! Similar images collide on purpose; this is not a cryptographic hash.

use image::imageops::{self, FilterType};
use image::DynamicImage;

use super::grayscale;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Fingerprint of `image` on a `size`×`size` grid
///
/// Output length is ⌈size²/4⌉ hex characters (16 for the default 8×8).
pub fn average_hash(image: &DynamicImage, size: u32) -> String {
    let gray = grayscale(&image.to_rgb8());
    let grid = imageops::resize(&gray, size, size, FilterType::CatmullRom);

    let cells: Vec<f64> = grid.pixels().map(|p| f64::from(p[0])).collect();
    let mean = cells.iter().sum::<f64>() / cells.len().max(1) as f64;

    let bits = cells.iter().map(|&cell| cell >= mean);
    pack_hex(bits, cells.len())
}

/// Pack bits MSB-first into hex, left-padding with zero bits to a whole nibble
fn pack_hex(bits: impl Iterator<Item = bool>, bit_count: usize) -> String {
    let pad = (4 - bit_count % 4) % 4;
    let mut out = String::with_capacity((bit_count + pad) / 4);

    let mut nibble = 0usize;
    let mut filled = 0;
    for bit in std::iter::repeat(false).take(pad).chain(bits) {
        nibble = (nibble << 1) | usize::from(bit);
        filled += 1;
        if filled == 4 {
            out.push(HEX_DIGITS[nibble] as char);
            nibble = 0;
            filled = 0;
        }
    }

    out
}
