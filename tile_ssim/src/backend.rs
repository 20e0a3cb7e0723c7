//! Accelerated execution of the tile walk.
//!
//! An [`AcceleratedBackend`] either produces the complete sum of all
//! per-tile, per-channel contributions or reports [`BackendOutcome::Failed`].
//! A failed outcome carries no partial sum; the caller recomputes the whole sum
//! on the sequential path.

use crate::input::SampleImage;
use crate::ssim::SsimConstants;
use crate::tile::TileGrid;

/// Result of an accelerated run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BackendOutcome {
    /// Sum of every per-tile, per-channel contribution.
    Sum(f64),
    Failed,
}

/// A data-parallel implementation of the tile walk.
///
/// Implementations must be synchronous: `tile_sum` returns only after all
/// work has been reduced or a failure has been determined.
pub trait AcceleratedBackend {
    fn tile_sum(
        &self,
        a: &(dyn SampleImage + Sync),
        b: &(dyn SampleImage + Sync),
        grid: TileGrid,
        constants: SsimConstants,
    ) -> BackendOutcome;
}

/// Backend that always fails, used when no accelerated path is compiled in.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl AcceleratedBackend for Unavailable {
    fn tile_sum(
        &self,
        _a: &(dyn SampleImage + Sync),
        _b: &(dyn SampleImage + Sync),
        _grid: TileGrid,
        _constants: SsimConstants,
    ) -> BackendOutcome {
        BackendOutcome::Failed
    }
}

#[cfg(feature = "rayon")]
pub use self::rayon_backend::RayonBackend;

#[cfg(feature = "rayon")]
mod rayon_backend {
    use super::{AcceleratedBackend, BackendOutcome};
    use crate::input::SampleImage;
    use crate::ssim::{tile_ssim_sum, SsimConstants};
    use crate::tile::TileGrid;
    use rayon::prelude::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    /// Runs tiles on rayon's current thread pool, or on a dedicated pool when
    /// a thread count is given.
    ///
    /// Each worker folds its own partial sum; the partials are combined in
    /// rayon's reduction. The run fails if the dedicated pool cannot be built,
    /// a worker panics, or the reduced sum is not finite.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct RayonBackend {
        threads: Option<usize>,
    }

    impl RayonBackend {
        /// Uses the current (by default the global) rayon pool.
        #[must_use]
        pub fn new() -> Self {
            Self { threads: None }
        }

        /// Uses a dedicated pool of exactly `threads` worker threads, built per call.
        #[must_use]
        pub fn with_threads(threads: usize) -> Self {
            Self {
                threads: Some(threads),
            }
        }
    }

    impl AcceleratedBackend for RayonBackend {
        fn tile_sum(
            &self,
            a: &(dyn SampleImage + Sync),
            b: &(dyn SampleImage + Sync),
            grid: TileGrid,
            constants: SsimConstants,
        ) -> BackendOutcome {
            let run = || {
                (0..grid.num_tiles())
                    .into_par_iter()
                    .filter_map(|index| grid.tile(index))
                    .map(|tile| tile_ssim_sum(&a, &b, tile, constants))
                    .sum::<f64>()
            };

            let result = match self.threads {
                None => catch_unwind(AssertUnwindSafe(run)),
                Some(threads) => {
                    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                        Ok(pool) => pool,
                        Err(e) => {
                            log::debug!("rayon pool unavailable: {}", e);
                            return BackendOutcome::Failed;
                        }
                    };
                    catch_unwind(AssertUnwindSafe(|| pool.install(run)))
                }
            };

            match result {
                Ok(sum) if sum.is_finite() => BackendOutcome::Sum(sum),
                Ok(sum) => {
                    log::debug!("parallel sum is not finite: {}", sum);
                    BackendOutcome::Failed
                }
                Err(_) => {
                    log::debug!("parallel worker panicked");
                    BackendOutcome::Failed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Image8;

    #[test]
    fn test_unavailable_always_fails() {
        let img = Image8::filled(8, 8, 1, 3);
        let grid = TileGrid::new(8, 8, 4);
        let outcome = Unavailable.tile_sum(&img, &img, grid, SsimConstants::default());
        assert_eq!(outcome, BackendOutcome::Failed);
    }

    #[test]
    #[cfg(feature = "rayon")]
    fn test_rayon_identical_images() {
        let img = Image8::new((0..3 * 16 * 16).map(|i| (i % 251) as u8).collect(), 16, 16, 3)
            .unwrap();
        let grid = TileGrid::new(16, 16, 4);
        match RayonBackend::with_threads(2).tile_sum(&img, &img, grid, SsimConstants::default()) {
            BackendOutcome::Sum(sum) => assert!((sum - 48.0).abs() < 1e-9, "sum={sum}"),
            BackendOutcome::Failed => panic!("rayon backend failed"),
        }
    }

    #[test]
    #[cfg(feature = "rayon")]
    fn test_rayon_runs_in_caller_pool_without_thread_count() {
        let img = Image8::new((0..16 * 16).map(|i| (i * 3 % 256) as u8).collect(), 16, 16, 1)
            .unwrap();
        let other = Image8::new((0..16 * 16).map(|i| (i * 5 % 256) as u8).collect(), 16, 16, 1)
            .unwrap();
        let grid = TileGrid::new(16, 16, 4);
        let constants = SsimConstants::default();

        let dedicated = RayonBackend::with_threads(3).tile_sum(&img, &other, grid, constants);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let (outcome, threads_seen) = pool.install(|| {
            (
                RayonBackend::new().tile_sum(&img, &other, grid, constants),
                rayon::current_num_threads(),
            )
        });

        assert_eq!(threads_seen, 2);
        match (outcome, dedicated) {
            (BackendOutcome::Sum(x), BackendOutcome::Sum(y)) => {
                assert!((x - y).abs() < 1e-9, "{x} vs {y}")
            }
            other => panic!("rayon backend failed: {other:?}"),
        }
    }

    #[test]
    #[cfg(feature = "rayon")]
    fn test_rayon_panicking_image_fails() {
        struct Broken;
        impl SampleImage for Broken {
            fn width(&self) -> usize {
                8
            }
            fn height(&self) -> usize {
                8
            }
            fn channel_count(&self) -> usize {
                1
            }
            fn sample(&self, _channel: usize, _x: usize, _y: usize) -> u8 {
                panic!("sample read failed")
            }
        }

        let grid = TileGrid::new(8, 8, 4);
        let outcome = RayonBackend::new().tile_sum(&Broken, &Broken, grid, SsimConstants::default());
        assert_eq!(outcome, BackendOutcome::Failed);
    }
}
