//! The single-window SSIM formula and the sequential tile walk.

use crate::input::{SampleImage, DYNAMIC_RANGE};
use crate::stats::TileStats;
use crate::tile::{Tile, TileGrid};

const K1: f64 = 0.01;
const K2: f64 = 0.03;

/// Stabilization constants of the SSIM formula.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SsimConstants {
    pub c1: f64,
    pub c2: f64,
}

impl SsimConstants {
    /// Derives `c1 = (L * 0.01)^2` and `c2 = (L * 0.03)^2` from the dynamic range `L`.
    #[must_use]
    pub fn for_dynamic_range(dynamic_range: f64) -> Self {
        Self {
            c1: (dynamic_range * K1).powi(2),
            c2: (dynamic_range * K2).powi(2),
        }
    }
}

impl Default for SsimConstants {
    fn default() -> Self {
        Self::for_dynamic_range(f64::from(DYNAMIC_RANGE))
    }
}

/// SSIM of a single (tile, channel) window.
///
/// The denominator is strictly positive because `c1, c2 > 0`.
#[inline]
#[must_use]
pub fn ssim_contribution(stats: &TileStats, constants: SsimConstants) -> f64 {
    let SsimConstants { c1, c2 } = constants;
    (2.0 * stats.mean_a * stats.mean_b + c1) * (2.0 * stats.covariance + c2)
        / ((stats.mean_a * stats.mean_a + stats.mean_b * stats.mean_b + c1)
            * (stats.variance_a + stats.variance_b + c2))
}

/// Sum of the contributions of every channel of one tile.
///
/// Tiles have no dependency on each other, so this is the unit of work shared
/// by the sequential and the parallel walks.
#[inline]
#[must_use]
pub fn tile_ssim_sum<A, B>(a: &A, b: &B, tile: Tile, constants: SsimConstants) -> f64
where
    A: SampleImage,
    B: SampleImage,
{
    (0..a.channel_count())
        .map(|channel| ssim_contribution(&TileStats::compute(a, b, tile, channel), constants))
        .sum()
}

/// Walks all tiles in row-major order, accumulating every contribution into a
/// single running sum.
#[must_use]
pub fn sequential_sum<A, B>(a: &A, b: &B, grid: TileGrid, constants: SsimConstants) -> f64
where
    A: SampleImage,
    B: SampleImage,
{
    let mut sum = 0.0f64;
    for tile in grid.iter() {
        for channel in 0..a.channel_count() {
            sum += ssim_contribution(&TileStats::compute(a, b, tile, channel), constants);
        }
    }
    sum
}

/// Per-channel sums of the contributions over all tiles.
#[must_use]
pub fn sequential_channel_sums<A, B>(
    a: &A,
    b: &B,
    grid: TileGrid,
    constants: SsimConstants,
) -> Vec<f64>
where
    A: SampleImage,
    B: SampleImage,
{
    let mut sums = vec![0.0f64; a.channel_count()];
    for tile in grid.iter() {
        for (channel, sum) in sums.iter_mut().enumerate() {
            *sum += ssim_contribution(&TileStats::compute(a, b, tile, channel), constants);
        }
    }
    sums
}

/// Turns the accumulated sum into the mean contribution per tile per channel.
#[inline]
#[must_use]
pub fn normalize(sum: f64, channel_count: usize, grid: TileGrid) -> f64 {
    let tile_area = (grid.tile_size() * grid.tile_size()) as f64;
    sum / (channel_count * grid.trimmed_width() * grid.trimmed_height()) as f64 * tile_area
}
