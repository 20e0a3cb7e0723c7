//! Tiled Structural Similarity Index (SSIM) for 8-bit raster images.
//!
//! Both images are split into non-overlapping square tiles (7x7 by default).
//! For every tile and channel, mean, variance and covariance of the two
//! images' samples are combined with the standard single-window SSIM formula,
//! and the final score is the mean over all tiles and channels. A score of
//! `1.0` means the images are identical.
//!
//! Remainder strips on the right and bottom edge narrower than one tile are
//! not covered by any tile and do not influence the score.
//!
//! # Example
//!
//! ```
//! use tile_ssim::{compute_ssim, Image8};
//!
//! let a = Image8::filled(14, 14, 1, 100);
//! let b = Image8::filled(14, 14, 1, 100);
//! let score = compute_ssim(&a, &b).unwrap();
//! assert!((score - 1.0).abs() < 1e-9);
//! ```

mod backend;
mod input;
mod precompute;
mod ssim;
mod stats;
mod tile;
mod timer;

#[cfg(feature = "rayon")]
pub use backend::RayonBackend;
pub use backend::{AcceleratedBackend, BackendOutcome, Unavailable};
pub use input::{ChannelSamples, Image8, SampleImage, DYNAMIC_RANGE};
pub use precompute::SsimReference;
pub use ssim::{normalize, sequential_sum, ssim_contribution, tile_ssim_sum, SsimConstants};
pub use stats::{ChannelMoments, Histogram, TileStats};
pub use tile::{Tile, TileGrid, Tiles};

use timer::Timer;

/// Default side length of a tile.
pub const DEFAULT_TILE_SIZE: usize = 7;

/// Errors that can occur when computing SSIM.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SsimError {
    #[error("Source and distorted image width and height must be equal")]
    NonMatchingImageDimensions,

    #[error("Source and distorted image must have the same number of channels")]
    NonMatchingChannelCount,

    #[error("Images must be at least {tile_size}x{tile_size} pixels")]
    ImageSmallerThanTile { tile_size: usize },

    #[error("Tile size must be at least 1")]
    InvalidTileSize,

    #[error("Images must have at least one channel")]
    NoChannels,

    #[error("Sample buffer has length {actual}, expected {expected}")]
    InvalidBufferLength { expected: usize, actual: usize },

    #[error("Image of {width}x{height} with {channels} channels exceeds the addressable size")]
    ImageTooLarge {
        width: usize,
        height: usize,
        channels: usize,
    },
}

/// Execution mode of the tile walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Backend {
    /// Strictly sequential, deterministic order.
    #[default]
    Sequential,
    /// Data-parallel accelerated path with sequential fallback on failure.
    Parallel,
}

/// Configuration for SSIM computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SsimConfig {
    pub tile_size: usize,
    pub backend: Backend,
}

impl Default for SsimConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            backend: Backend::Sequential,
        }
    }
}

impl SsimConfig {
    /// Default tile size, sequential execution.
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Default tile size, accelerated execution.
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            backend: Backend::Parallel,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }
}

/// Checks that two images can be compared with the given tile size.
///
/// # Errors
/// - If `tile_size` is zero
/// - If the images have different width or height
/// - If the images have a different number of channels, or none
/// - If either dimension is smaller than `tile_size`
pub fn validate<A, B>(a: &A, b: &B, tile_size: usize) -> Result<(), SsimError>
where
    A: SampleImage + ?Sized,
    B: SampleImage + ?Sized,
{
    if tile_size == 0 {
        return Err(SsimError::InvalidTileSize);
    }
    if a.width() != b.width() || a.height() != b.height() {
        return Err(SsimError::NonMatchingImageDimensions);
    }
    if a.channel_count() != b.channel_count() {
        return Err(SsimError::NonMatchingChannelCount);
    }
    if a.channel_count() == 0 {
        return Err(SsimError::NoChannels);
    }
    if a.width() < tile_size || a.height() < tile_size {
        return Err(SsimError::ImageSmallerThanTile { tile_size });
    }
    Ok(())
}

/// Computes the SSIM score with a 7x7 tile on the sequential path.
///
/// # Errors
/// See [`validate`].
pub fn compute_ssim<A, B>(a: A, b: B) -> Result<f64, SsimError>
where
    A: SampleImage + Sync,
    B: SampleImage + Sync,
{
    compute_ssim_with_config(a, b, SsimConfig::default())
}

/// Computes the SSIM score with custom configuration.
///
/// With [`Backend::Parallel`], the rayon backend is used when the `rayon`
/// feature is enabled; otherwise the parallel request falls back to the
/// sequential path.
///
/// # Errors
/// See [`validate`].
pub fn compute_ssim_with_config<A, B>(a: A, b: B, config: SsimConfig) -> Result<f64, SsimError>
where
    A: SampleImage + Sync,
    B: SampleImage + Sync,
{
    #[cfg(feature = "rayon")]
    let accelerated = RayonBackend::new();
    #[cfg(not(feature = "rayon"))]
    let accelerated = Unavailable;

    compute_ssim_with_backend(a, b, config, &accelerated)
}

/// Computes the SSIM score, using `accelerated` when the configuration asks
/// for [`Backend::Parallel`].
///
/// If the accelerated backend fails, its result is discarded and the full sum
/// is recomputed sequentially.
///
/// # Errors
/// See [`validate`]. Backend failure is never an error.
pub fn compute_ssim_with_backend<A, B>(
    a: A,
    b: B,
    config: SsimConfig,
    accelerated: &dyn AcceleratedBackend,
) -> Result<f64, SsimError>
where
    A: SampleImage + Sync,
    B: SampleImage + Sync,
{
    validate(&a, &b, config.tile_size)?;

    let grid = TileGrid::new(a.width(), a.height(), config.tile_size);
    let constants = SsimConstants::default();

    let mut outcome = BackendOutcome::Failed;
    if config.backend == Backend::Parallel {
        let _timer = Timer::new("parallel");
        outcome = accelerated.tile_sum(&a, &b, grid, constants);
    }

    let sum = match outcome {
        BackendOutcome::Sum(sum) => sum,
        BackendOutcome::Failed => {
            if config.backend == Backend::Parallel {
                log::warn!("accelerated SSIM backend failed, recomputing sequentially");
            }
            let _timer = Timer::new("sequential");
            sequential_sum(&a, &b, grid, constants)
        }
    };

    log::debug!(
        "ssim over {} tiles of {}x{} ({} channels)",
        grid.num_tiles(),
        grid.tile_size(),
        grid.tile_size(),
        a.channel_count()
    );

    Ok(normalize(sum, a.channel_count(), grid))
}

/// Computes the mean SSIM of each channel separately on the sequential path.
///
/// The arithmetic mean of the returned values equals the overall score.
///
/// # Errors
/// See [`validate`].
pub fn compute_ssim_channels<A, B>(a: A, b: B, config: SsimConfig) -> Result<Vec<f64>, SsimError>
where
    A: SampleImage,
    B: SampleImage,
{
    validate(&a, &b, config.tile_size)?;

    let grid = TileGrid::new(a.width(), a.height(), config.tile_size);
    let _timer = Timer::new("sequential per-channel");
    let sums = ssim::sequential_channel_sums(&a, &b, grid, SsimConstants::default());
    Ok(sums.into_iter().map(|sum| normalize(sum, 1, grid)).collect())
}
