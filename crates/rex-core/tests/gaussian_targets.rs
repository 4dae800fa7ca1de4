use std::f64::consts::PI;

use rex_core::gaussian::{random_mixture, Gaussian2D, GaussianMixture, MixtureSpec, ProductGaussian};
use rex_core::integrand::{Integrand, ModalIntegrand};

fn isotropic(mean: [f64; 2], variance: f64) -> ProductGaussian {
    ProductGaussian::new(vec![
        Gaussian2D::new(mean, [variance, variance], 0.0).expect("valid gaussian"),
    ])
    .expect("one block")
}

#[test]
fn peak_matches_closed_form() {
    let g = Gaussian2D::new([0.5, 0.5], [0.01, 0.01], 0.3).expect("valid gaussian");
    let expected = 1.0 / (2.0 * PI * 0.01);
    assert!((g.pdf(0.5, 0.5) - expected).abs() < 1e-9);
    assert!((g.highest_pdf(1.0) - expected).abs() < 1e-9);
    assert!((g.pdf_tempered(0.5, 0.5, 0.25) - 0.25 * expected).abs() < 1e-9);
}

#[test]
fn rotation_preserves_isotropic_density() {
    let a = Gaussian2D::new([0.5, 0.5], [0.02, 0.02], 0.0).expect("valid gaussian");
    let b = Gaussian2D::new([0.5, 0.5], [0.02, 0.02], 1.1).expect("valid gaussian");
    assert!((a.pdf(0.6, 0.45) - b.pdf(0.6, 0.45)).abs() < 1e-9);
}

#[test]
fn singular_covariance_is_rejected() {
    assert!(Gaussian2D::new([0.5, 0.5], [0.0, 0.01], 0.0).is_err());
}

#[test]
fn mixture_is_zero_outside_cube() {
    let mixture = GaussianMixture::new(vec![isotropic([0.5, 0.5], 0.01)], &[1.0]).expect("mixture");
    assert_eq!(mixture.density(&[1.0, 0.5], 1.0), 0.0);
    assert_eq!(mixture.density(&[-0.1, 0.5], 1.0), 0.0);
    assert!(mixture.density(&[0.5, 0.5], 1.0) > 0.0);
}

#[test]
fn mixture_max_density_bounds_samples() {
    let spec = MixtureSpec {
        components: 8,
        min_weight: 0.5,
        max_weight: 2.0,
        avg_scale: 1.0e-3,
        diff_scale: 2.0,
        seed: 41,
    };
    let mixture = random_mixture(2, &spec).expect("mixture");
    assert_eq!(mixture.mode_count(), 8);
    assert_eq!(mixture.dimension(), 2);
    let max = mixture.max_density(1.0);
    assert!(max > 0.0);
    let grid = 50;
    for i in 0..grid {
        for j in 0..grid {
            let p = [(i as f64 + 0.5) / grid as f64, (j as f64 + 0.5) / grid as f64];
            // Overlapping components can exceed the largest single weighted peak.
            assert!(mixture.density(&p, 1.0) <= max * 8.0 + 1e-9);
        }
    }
}

#[test]
fn mixture_max_density_is_normalized_by_total_weight() {
    let narrow = isotropic([0.25, 0.25], 0.001);
    let wide = isotropic([0.75, 0.75], 0.01);
    let narrow_peak = narrow.highest_pdf(1.0);
    let mixture = GaussianMixture::new(vec![narrow, wide], &[1.0, 3.0]).expect("mixture");
    let expected = narrow_peak * 1.0 / 4.0;
    assert!((mixture.max_density(1.0) - expected).abs() < 1e-9 * expected);
    assert!(mixture.density(&[0.25, 0.25], 1.0) <= mixture.max_density(1.0) * (1.0 + 1e-9));
}

#[test]
fn mode_picks_nearest_component() {
    let mixture = GaussianMixture::new(
        vec![isotropic([0.25, 0.25], 0.001), isotropic([0.75, 0.75], 0.001)],
        &[1.0, 1.0],
    )
    .expect("mixture");
    assert_eq!(mixture.mode(&[0.26, 0.24]), Some(0));
    assert_eq!(mixture.mode(&[0.74, 0.77]), Some(1));
}

#[test]
fn random_mixture_is_deterministic() {
    let spec = MixtureSpec::default();
    let a = random_mixture(4, &spec).expect("mixture");
    let b = random_mixture(4, &spec).expect("mixture");
    assert_eq!(a, b);
}

#[test]
fn odd_dimension_is_rejected() {
    let err = random_mixture(3, &MixtureSpec::default()).expect_err("odd dimension");
    assert_eq!(err.info().code, "dimension");
}
