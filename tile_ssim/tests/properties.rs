//! Behavioural properties of the tiled SSIM score.
//!
//! Run with: cargo test --test properties

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tile_ssim::{
    compute_ssim, compute_ssim_with_config, Image8, SampleImage, SsimConfig, SsimConstants,
    SsimError,
};

fn noise_image(width: usize, height: usize, channels: usize, seed: u64) -> Image8 {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height * channels).map(|_| rng.gen()).collect();
    Image8::new(data, width, height, channels).unwrap()
}

/// Adds bounded noise to every sample.
fn perturb(image: &Image8, amplitude: i16, seed: u64) -> Image8 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = image.clone();
    for v in out.data_mut() {
        let delta = rng.gen_range(-amplitude..=amplitude);
        *v = (i16::from(*v) + delta).clamp(0, 255) as u8;
    }
    out
}

// ============================================================================
// Identity and symmetry
// ============================================================================

#[test]
fn test_identity_for_various_tile_sizes() {
    let img = noise_image(37, 29, 3, 1);
    for tile_size in [1, 2, 3, 5, 7, 8, 29] {
        let config = SsimConfig::default().with_tile_size(tile_size);
        let score = compute_ssim_with_config(&img, &img, config).unwrap();
        assert!(
            (score - 1.0).abs() < 1e-9,
            "tile_size={}: identical images should score 1.0, got {}",
            tile_size,
            score
        );
    }
}

#[test]
fn test_symmetry_is_exact() {
    let a = noise_image(50, 40, 3, 2);
    let b = perturb(&a, 30, 3);
    for tile_size in [4, 7, 11] {
        let config = SsimConfig::default().with_tile_size(tile_size);
        let ab = compute_ssim_with_config(&a, &b, config).unwrap();
        let ba = compute_ssim_with_config(&b, &a, config).unwrap();
        assert_eq!(ab, ba, "tile_size={}", tile_size);
    }
}

#[test]
fn test_score_range() {
    let a = noise_image(64, 64, 1, 4);
    let b = noise_image(64, 64, 1, 5);
    let score = compute_ssim(&a, &b).unwrap();
    assert!((-1.0..=1.0).contains(&score), "score={}", score);
    assert!(score < 0.5, "unrelated noise should score low, got {}", score);
}

#[test]
fn test_more_distortion_scores_lower() {
    let source = noise_image(70, 70, 3, 6);
    let mut prev = f64::INFINITY;
    for (i, amplitude) in [2, 10, 40, 120].into_iter().enumerate() {
        let distorted = perturb(&source, amplitude, 100 + i as u64);
        let score = compute_ssim(&source, &distorted).unwrap();
        assert!(
            score < prev,
            "amplitude {} score ({:.6}) should be < previous ({:.6})",
            amplitude,
            score,
            prev
        );
        prev = score;
    }
}

// ============================================================================
// Concrete scenarios
// ============================================================================

#[test]
fn test_identical_solid_images_score_one() {
    let a = Image8::filled(14, 14, 1, 100);
    let b = Image8::filled(14, 14, 1, 100);
    let score = compute_ssim(&a, &b).unwrap();
    assert!((score - 1.0).abs() < 1e-9, "score={}", score);
}

#[test]
fn test_different_solid_images_closed_form() {
    let a = Image8::filled(14, 14, 1, 100);
    let b = Image8::filled(14, 14, 1, 150);
    let SsimConstants { c1, .. } = SsimConstants::default();

    // Variance and covariance vanish, leaving only the luminance term.
    let expected = (2.0 * 100.0 * 150.0 + c1) / (100.0f64.powi(2) + 150.0f64.powi(2) + c1);
    let score = compute_ssim(&a, &b).unwrap();
    assert!(
        (score - expected).abs() < 1e-12,
        "expected {}, got {}",
        expected,
        score
    );
}

// ============================================================================
// Remainder truncation
// ============================================================================

#[test]
fn test_excluded_edge_pixels_do_not_matter() {
    let a = noise_image(10, 10, 3, 7);
    let b = perturb(&a, 25, 8);
    let before = compute_ssim(&a, &b).unwrap();

    let mut b_edges = b.clone();
    for y in 0..10 {
        for x in 0..10 {
            if x >= 7 || y >= 7 {
                for c in 0..3 {
                    let v = b_edges.sample(c, x, y);
                    b_edges.set_sample(c, x, y, 255 - v);
                }
            }
        }
    }
    let after = compute_ssim(&a, &b_edges).unwrap();
    assert_eq!(before, after);

    // A change inside the covered 7x7 region does show up.
    let mut b_inside = b.clone();
    b_inside.set_sample(0, 3, 3, 255 - b.sample(0, 3, 3));
    assert_ne!(before, compute_ssim(&a, &b_inside).unwrap());
}

// ============================================================================
// Precondition enforcement
// ============================================================================

#[test]
fn test_dimension_mismatch() {
    let a = Image8::filled(20, 20, 3, 0);
    let b = Image8::filled(20, 21, 3, 0);
    assert_eq!(
        compute_ssim(&a, &b),
        Err(SsimError::NonMatchingImageDimensions)
    );
}

#[test]
fn test_channel_mismatch() {
    let a = Image8::filled(20, 20, 3, 0);
    let b = Image8::filled(20, 20, 4, 0);
    assert_eq!(compute_ssim(&a, &b), Err(SsimError::NonMatchingChannelCount));
}

#[test]
fn test_tile_larger_than_image() {
    let a = Image8::filled(20, 6, 1, 0);
    assert_eq!(
        compute_ssim(&a, &a),
        Err(SsimError::ImageSmallerThanTile { tile_size: 7 })
    );

    let config = SsimConfig::parallel().with_tile_size(21);
    let b = Image8::filled(20, 30, 1, 0);
    assert_eq!(
        compute_ssim_with_config(&b, &b, config),
        Err(SsimError::ImageSmallerThanTile { tile_size: 21 })
    );
}

#[test]
fn test_zero_tile_size() {
    let a = Image8::filled(8, 8, 1, 0);
    let config = SsimConfig::default().with_tile_size(0);
    assert_eq!(
        compute_ssim_with_config(&a, &a, config),
        Err(SsimError::InvalidTileSize)
    );
}
