use std::path::{Path, PathBuf};

use ndarray::Array2;

use starshrink_core::consts::{FITS_BLOCK_SIZE, FITS_CARD_SIZE};

/// Format one 80-byte header card with a right-justified value.
pub fn card(keyword: &str, value: &str) -> String {
    let text = format!("{keyword:<8}= {value:>20}");
    format!("{text:<width$}", width = FITS_CARD_SIZE)
}

/// Format a card whose value is a quoted string.
pub fn string_card(keyword: &str, value: &str) -> String {
    let quoted = format!("'{}'", value.replace('\'', "''"));
    let text = format!("{keyword:<8}= {quoted:<20}");
    format!("{text:<width$}", width = FITS_CARD_SIZE)
}

fn pad_block(buf: &mut Vec<u8>, fill: u8) {
    let rem = buf.len() % FITS_BLOCK_SIZE;
    if rem != 0 {
        buf.resize(buf.len() + FITS_BLOCK_SIZE - rem, fill);
    }
}

/// Assemble a header unit: the given cards, END, space padding.
pub fn header_unit(cards: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    for c in cards {
        assert_eq!(c.len(), FITS_CARD_SIZE, "bad card: {c:?}");
        buf.extend_from_slice(c.as_bytes());
    }
    buf.extend_from_slice(format!("{:<80}", "END").as_bytes());
    pad_block(&mut buf, b' ');
    buf
}

/// Mandatory primary-header cards for an image.
///
/// `axes` is in NAXIS order: width first.
pub fn primary_cards(bitpix: i32, axes: &[usize]) -> Vec<String> {
    let mut cards = vec![
        card("SIMPLE", "T"),
        card("BITPIX", &bitpix.to_string()),
        card("NAXIS", &axes.len().to_string()),
    ];
    for (i, len) in axes.iter().enumerate() {
        cards.push(card(&format!("NAXIS{}", i + 1), &len.to_string()));
    }
    cards
}

/// Complete single-HDU FITS file from big-endian sample bytes.
pub fn build_fits(bitpix: i32, axes: &[usize], data: &[u8], extra: &[String]) -> Vec<u8> {
    let mut cards = primary_cards(bitpix, axes);
    cards.extend_from_slice(extra);
    let mut buf = header_unit(&cards);
    buf.extend_from_slice(data);
    pad_block(&mut buf, 0);
    buf
}

pub fn build_fits_f32(axes: &[usize], values: &[f32]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    build_fits(-32, axes, &data, &[])
}

pub fn build_fits_i16(axes: &[usize], values: &[i16], extra: &[String]) -> Vec<u8> {
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    build_fits(16, axes, &data, extra)
}

pub fn build_fits_u8(axes: &[usize], values: &[u8]) -> Vec<u8> {
    build_fits(8, axes, values, &[])
}

/// Mono f32 FITS file from a (height, width) array.
pub fn build_mono_fits(image: &Array2<f32>) -> Vec<u8> {
    let (h, w) = image.dim();
    let values: Vec<f32> = image.iter().copied().collect();
    build_fits_f32(&[w, h], &values)
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write test file");
    path
}

/// Dark background with a bright `size` x `size` square centered in the frame.
pub fn make_square_image(h: usize, w: usize, size: usize, bg: f32, fg: f32) -> Array2<f32> {
    let top = (h - size) / 2;
    let left = (w - size) / 2;
    Array2::from_shape_fn((h, w), |(r, c)| {
        if (top..top + size).contains(&r) && (left..left + size).contains(&c) {
            fg
        } else {
            bg
        }
    })
}

/// Gentle gradient sky with a handful of small stars.
pub fn make_star_field(h: usize, w: usize) -> Array2<f32> {
    let stars = [(10usize, 12usize, 900.0f32), (30, 40, 1500.0), (45, 20, 700.0), (20, 50, 1200.0)];
    Array2::from_shape_fn((h, w), |(r, c)| {
        let mut v = 100.0 + r as f32 * 0.5 + c as f32 * 0.25;
        for &(sr, sc, peak) in &stars {
            let dy = r as f32 - sr as f32;
            let dx = c as f32 - sc as f32;
            v += peak * (-(dx * dx + dy * dy) / 2.0).exp();
        }
        v
    })
}

/// Deterministic pseudo-random 8-bit plane.
pub fn make_noise_u8(h: usize, w: usize, seed: u32) -> Array2<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    Array2::from_shape_fn((h, w), |_| {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (state >> 16) as u8
    })
}
