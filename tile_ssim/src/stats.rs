//! Per-tile, per-channel statistics.
//!
//! Both images are scanned once per (tile, channel). Sample values are bucketed
//! into a [`Histogram`] so the second moment can be evaluated over at most 256
//! distinct values instead of every pixel.

use crate::input::SampleImage;
use crate::tile::Tile;

const BINS: usize = 256;

/// Occurrence count of every 8-bit sample value within one tile of one image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; BINS],
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    #[must_use]
    pub fn new() -> Self {
        Self { counts: [0; BINS] }
    }

    #[inline]
    pub fn add(&mut self, value: u8) {
        self.counts[value as usize] += 1;
    }

    /// Total number of samples recorded.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Population variance of the recorded samples around `mean`.
    #[must_use]
    pub fn variance(&self, mean: f64, pixel_count: usize) -> f64 {
        let mut acc = 0.0f64;
        for (value, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let d = value as f64 - mean;
            acc += count as f64 * d * d;
        }
        acc / pixel_count as f64
    }
}

/// First and second moment of one channel over one tile of one image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelMoments {
    /// Sum of all samples.
    pub sum: u64,
    pub mean: f64,
    /// Population variance (divided by the pixel count).
    pub variance: f64,
}

impl ChannelMoments {
    /// Derives the moments from a filled histogram and the matching sample sum.
    #[must_use]
    pub fn from_histogram(histogram: &Histogram, sum: u64, pixel_count: usize) -> Self {
        let mean = sum as f64 / pixel_count as f64;
        Self {
            sum,
            mean,
            variance: histogram.variance(mean, pixel_count),
        }
    }

    /// Scans `channel` of `image` over `tile`.
    #[must_use]
    pub fn compute<I: SampleImage>(image: &I, tile: Tile, channel: usize) -> Self {
        let mut histogram = Histogram::new();
        let mut sum = 0u64;
        for v in image.channel_data(channel, tile) {
            histogram.add(v);
            sum += u64::from(v);
        }
        Self::from_histogram(&histogram, sum, tile.pixel_count())
    }
}

/// Statistics of one (tile, channel) pair consumed by the SSIM formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileStats {
    pub mean_a: f64,
    pub mean_b: f64,
    pub variance_a: f64,
    pub variance_b: f64,
    /// Population covariance of the samples at identical pixel positions.
    pub covariance: f64,
}

impl TileStats {
    /// Computes the statistics of `channel` over `tile` for both images in a
    /// single scan.
    #[must_use]
    pub fn compute<A, B>(a: &A, b: &B, tile: Tile, channel: usize) -> Self
    where
        A: SampleImage,
        B: SampleImage,
    {
        let mut hist_a = Histogram::new();
        let mut hist_b = Histogram::new();
        let mut sum_a = 0u64;
        let mut sum_b = 0u64;
        let mut product_sum = 0u64;

        for (va, vb) in a
            .channel_data(channel, tile)
            .zip(b.channel_data(channel, tile))
        {
            hist_a.add(va);
            hist_b.add(vb);
            sum_a += u64::from(va);
            sum_b += u64::from(vb);
            product_sum += u64::from(va) * u64::from(vb);
        }

        let pixel_count = tile.pixel_count();
        Self::from_moments(
            &ChannelMoments::from_histogram(&hist_a, sum_a, pixel_count),
            &ChannelMoments::from_histogram(&hist_b, sum_b, pixel_count),
            product_sum,
            pixel_count,
        )
    }

    /// Combines per-image moments with the cross-product sum `sum(a * b)`.
    #[must_use]
    pub fn from_moments(
        a: &ChannelMoments,
        b: &ChannelMoments,
        product_sum: u64,
        pixel_count: usize,
    ) -> Self {
        let n = pixel_count as f64;
        let covariance = (product_sum as f64 - a.sum as f64 * b.sum as f64 / n) / n;
        Self {
            mean_a: a.mean,
            mean_b: b.mean,
            variance_a: a.variance,
            variance_b: b.variance,
            covariance,
        }
    }
}
