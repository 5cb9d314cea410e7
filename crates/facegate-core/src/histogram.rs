//! Color-distribution descriptor for a localized face crop.
//!
//! For each RGB channel independently: a 256-bin count histogram over the
//! full 0–255 range, L2-normalized so exposure differences between
//! captures do not dominate the comparison. The three normalized
//! histograms are concatenated R‖G‖B into one 768-value descriptor.
//!
//! Extraction is pure: identical pixels produce bit-identical
//! descriptors. Stored and query descriptors go through this exact
//! transform, which is the property matching depends on.

use image::RgbImage;

/// Bins per channel (one per 8-bit intensity value).
pub const BINS_PER_CHANNEL: usize = 256;

/// Total descriptor length: three concatenated per-channel histograms.
pub const DESCRIPTOR_LEN: usize = 3 * BINS_PER_CHANNEL;

/// Compute the 768-value normalized color-histogram descriptor.
pub fn extract_descriptor(crop: &RgbImage) -> Vec<f32> {
    let mut counts = [[0u32; BINS_PER_CHANNEL]; 3];
    for pixel in crop.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            counts[channel][value as usize] += 1;
        }
    }

    let mut descriptor = Vec::with_capacity(DESCRIPTOR_LEN);
    for channel in &counts {
        descriptor.extend(l2_normalize(channel));
    }
    descriptor
}

/// L2-normalize one channel histogram. A zero histogram (empty crop)
/// normalizes to zeros.
fn l2_normalize(counts: &[u32; BINS_PER_CHANNEL]) -> [f32; BINS_PER_CHANNEL] {
    let norm = counts
        .iter()
        .map(|&c| (c as f64) * (c as f64))
        .sum::<f64>()
        .sqrt();

    let mut out = [0.0f32; BINS_PER_CHANNEL];
    if norm > 0.0 {
        for (slot, &c) in out.iter_mut().zip(counts.iter()) {
            *slot = ((c as f64) / norm) as f32;
        }
    }
    out
}
