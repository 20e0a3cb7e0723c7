//! Precomputed reference data for fast repeated SSIM comparisons.
//!
//! When comparing multiple distorted images against the same reference image,
//! the reference-side moments of every (tile, channel) pair can be computed
//! once and reused.
//!
//! # Example
//!
//! ```
//! use tile_ssim::{Image8, SsimConfig, SsimReference};
//!
//! let source = Image8::filled(64, 64, 3, 128);
//! let reference = SsimReference::new(&source, SsimConfig::default()).unwrap();
//!
//! let distorted = Image8::filled(64, 64, 3, 120);
//! let score = reference.compare(&distorted).unwrap();
//! assert!(score < 1.0);
//! ```

use crate::input::{Image8, SampleImage};
use crate::ssim::{normalize, ssim_contribution, SsimConstants};
use crate::stats::{ChannelMoments, Histogram, TileStats};
use crate::tile::TileGrid;
use crate::timer::Timer;
use crate::{validate, SsimConfig, SsimError};

/// Precomputed SSIM reference data for repeated comparisons.
///
/// Stores a copy of the source samples together with the mean and variance of
/// every (tile, channel) pair, so [`compare`][Self::compare] only has to scan
/// the distorted image and the cross term.
#[derive(Clone, Debug)]
pub struct SsimReference {
    source: Image8,
    grid: TileGrid,
    /// Indexed by `tile_index * channels + channel`.
    moments: Vec<ChannelMoments>,
}

impl SsimReference {
    /// Precompute reference data for the given source image.
    ///
    /// # Errors
    /// - If `config.tile_size` is zero
    /// - If the image has no channels
    /// - If the image is smaller than one tile
    /// - If the image is too large to copy
    pub fn new<I: SampleImage>(source: I, config: SsimConfig) -> Result<Self, SsimError> {
        validate(&source, &source, config.tile_size)?;

        let _timer = Timer::new("reference precompute");
        let source = Image8::from_sample_image(&source)?;
        let grid = TileGrid::new(source.width(), source.height(), config.tile_size);
        let channels = source.channel_count();

        let mut moments = Vec::with_capacity(grid.num_tiles() * channels);
        for tile in grid.iter() {
            for channel in 0..channels {
                moments.push(ChannelMoments::compute(&source, tile, channel));
            }
        }

        Ok(Self {
            source,
            grid,
            moments,
        })
    }

    /// Compare a distorted image against the precomputed reference.
    ///
    /// Produces the same score as the sequential path of
    /// [`compute_ssim_with_config`][crate::compute_ssim_with_config].
    ///
    /// # Errors
    /// - If the distorted image dimensions don't match the reference
    /// - If the distorted image has a different number of channels
    pub fn compare<I: SampleImage>(&self, distorted: I) -> Result<f64, SsimError> {
        validate(&self.source, &distorted, self.grid.tile_size())?;

        let _timer = Timer::new("reference compare");
        let constants = SsimConstants::default();
        let channels = self.source.channel_count();
        let pixel_count = self.grid.tile_size() * self.grid.tile_size();

        let mut sum = 0.0f64;
        for (tile, tile_moments) in self.grid.iter().zip(self.moments.chunks_exact(channels)) {
            for (channel, reference) in tile_moments.iter().enumerate() {
                let mut histogram = Histogram::new();
                let mut distorted_sum = 0u64;
                let mut product_sum = 0u64;
                for (vs, vd) in self
                    .source
                    .channel_data(channel, tile)
                    .zip(distorted.channel_data(channel, tile))
                {
                    histogram.add(vd);
                    distorted_sum += u64::from(vd);
                    product_sum += u64::from(vs) * u64::from(vd);
                }
                let distorted_moments =
                    ChannelMoments::from_histogram(&histogram, distorted_sum, pixel_count);
                let stats =
                    TileStats::from_moments(reference, &distorted_moments, product_sum, pixel_count);
                sum += ssim_contribution(&stats, constants);
            }
        }

        Ok(normalize(sum, channels, self.grid))
    }

    /// Get the width of the reference image.
    #[must_use]
    pub fn width(&self) -> usize {
        self.source.width()
    }

    /// Get the height of the reference image.
    #[must_use]
    pub fn height(&self) -> usize {
        self.source.height()
    }

    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.source.channel_count()
    }

    #[must_use]
    pub fn tile_size(&self) -> usize {
        self.grid.tile_size()
    }

    /// Get the number of tiles covered by the reference.
    #[must_use]
    pub fn num_tiles(&self) -> usize {
        self.grid.num_tiles()
    }
}
