//! Anisotropic Gaussian mixtures used as synthetic multi-modal targets.

use std::f64::consts::PI;

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, RexError};
use crate::integrand::{inside_unit_cube, Integrand, ModalIntegrand};
use crate::rng::{RngHandle, UniformSource};

/// Rotated two dimensional normal distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian2D {
    mean: Vector2<f64>,
    inverse_sigma: Matrix2<f64>,
    normalization: f64,
}

impl Gaussian2D {
    /// Builds the distribution with covariance `R^-1 diag(scale) R`, where `R`
    /// rotates by `rotation` radians.
    pub fn new(mean: [f64; 2], scale: [f64; 2], rotation: f64) -> Result<Self, RexError> {
        let (sin, cos) = rotation.sin_cos();
        let rot = Matrix2::new(cos, -sin, sin, cos);
        let scale_matrix = Matrix2::new(scale[0], 0.0, 0.0, scale[1]);
        // A rotation is orthogonal, so its inverse is its transpose.
        let sigma = rot.transpose() * scale_matrix * rot;
        let det = sigma.determinant();
        let inverse_sigma = match sigma.try_inverse() {
            Some(inverse) if det > 0.0 && det.is_finite() => inverse,
            _ => {
                return Err(RexError::Config(
                    ErrorInfo::new("degenerate-covariance", "covariance must be positive definite")
                        .with_context("scale_x", scale[0].to_string())
                        .with_context("scale_y", scale[1].to_string()),
                ))
            }
        };
        Ok(Self {
            mean: Vector2::new(mean[0], mean[1]),
            inverse_sigma,
            normalization: 2.0 * PI * det.sqrt(),
        })
    }

    fn quadratic_form(&self, x: f64, y: f64) -> f64 {
        let rel = Vector2::new(x, y) - self.mean;
        rel.dot(&(self.inverse_sigma * rel))
    }

    /// Probability density at `(x, y)`.
    pub fn pdf(&self, x: f64, y: f64) -> f64 {
        (-0.5 * self.quadratic_form(x, y)).exp() / self.normalization
    }

    /// Tempered density `exp(-q·β/2) / norm · β`.
    pub fn pdf_tempered(&self, x: f64, y: f64, beta: f64) -> f64 {
        (-0.5 * self.quadratic_form(x, y) * beta).exp() / self.normalization * beta
    }

    /// Peak value of [`Gaussian2D::pdf_tempered`].
    pub fn highest_pdf(&self, beta: f64) -> f64 {
        beta / self.normalization
    }
}

/// Product of independent [`Gaussian2D`] blocks over an even dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductGaussian {
    blocks: Vec<Gaussian2D>,
}

impl ProductGaussian {
    /// Wraps the blocks; coordinate pair `(2i, 2i+1)` belongs to block `i`.
    pub fn new(blocks: Vec<Gaussian2D>) -> Result<Self, RexError> {
        if blocks.is_empty() {
            return Err(RexError::config(
                "dimension",
                "a product gaussian needs at least one block",
            ));
        }
        Ok(Self { blocks })
    }

    /// Dimension covered by the product.
    pub fn dimension(&self) -> usize {
        self.blocks.len() * 2
    }

    /// Probability density at `x`.
    pub fn pdf(&self, x: &[f64]) -> f64 {
        self.blocks
            .iter()
            .zip(x.chunks_exact(2))
            .map(|(block, pair)| block.pdf(pair[0], pair[1]))
            .product()
    }

    /// Tempered density at `x`.
    pub fn pdf_tempered(&self, x: &[f64], beta: f64) -> f64 {
        self.blocks
            .iter()
            .zip(x.chunks_exact(2))
            .map(|(block, pair)| block.pdf_tempered(pair[0], pair[1], beta))
            .product()
    }

    /// Peak value of the tempered density.
    pub fn highest_pdf(&self, beta: f64) -> f64 {
        self.blocks.iter().map(|b| b.highest_pdf(beta)).product()
    }
}

/// Weighted mixture of [`ProductGaussian`] components restricted to the unit cube.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    components: Vec<ProductGaussian>,
    cdf: Vec<f64>,
    dimension: usize,
}

impl GaussianMixture {
    /// Creates a mixture from components and their (unnormalized) weights.
    pub fn new(components: Vec<ProductGaussian>, weights: &[f64]) -> Result<Self, RexError> {
        if components.is_empty() || components.len() != weights.len() {
            return Err(RexError::Config(
                ErrorInfo::new("mixture-shape", "one positive weight per component is required")
                    .with_context("components", components.len().to_string())
                    .with_context("weights", weights.len().to_string()),
            ));
        }
        let dimension = components[0].dimension();
        if components.iter().any(|c| c.dimension() != dimension) {
            return Err(RexError::config(
                "dimension",
                "all mixture components must share one dimension",
            ));
        }
        if weights.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(RexError::config(
                "mixture-weight",
                "mixture weights must be finite and positive",
            ));
        }
        let cdf = weights
            .iter()
            .scan(0.0, |acc, w| {
                *acc += w;
                Some(*acc)
            })
            .collect();
        Ok(Self {
            components,
            cdf,
            dimension,
        })
    }

    fn total_weight(&self) -> f64 {
        self.cdf.last().copied().unwrap_or(1.0)
    }

    fn weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.cdf
            .iter()
            .scan(0.0, |prev, &c| {
                let w = c - *prev;
                *prev = c;
                Some(w)
            })
    }

    /// Untempered mixture pdf, ignoring the unit cube restriction.
    pub fn pdf(&self, x: &[f64]) -> f64 {
        let total: f64 = self
            .components
            .iter()
            .zip(self.weights())
            .map(|(c, w)| c.pdf(x) * w)
            .sum();
        total / self.total_weight()
    }
}

impl Integrand for GaussianMixture {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn density(&self, state: &[f64], beta: f64) -> f64 {
        if state.len() != self.dimension || !inside_unit_cube(state) {
            return 0.0;
        }
        let total: f64 = self
            .components
            .iter()
            .zip(self.weights())
            .map(|(c, w)| c.pdf_tempered(state, beta) * w)
            .sum();
        total / self.total_weight()
    }

    /// Largest weighted component peak, divided by the total weight like [`Integrand::density`].
    fn max_density(&self, beta: f64) -> f64 {
        let total = self.total_weight();
        self.components
            .iter()
            .zip(self.weights())
            .map(|(c, w)| c.highest_pdf(beta) * w / total)
            .fold(0.0, f64::max)
    }
}

impl ModalIntegrand for GaussianMixture {
    fn mode_count(&self) -> usize {
        self.components.len()
    }

    fn mode(&self, state: &[f64]) -> Option<usize> {
        let mut best = None;
        let mut best_value = 0.0;
        for (idx, (c, w)) in self.components.iter().zip(self.weights()).enumerate() {
            let value = c.pdf(state) * w;
            if value > best_value {
                best = Some(idx);
                best_value = value;
            }
        }
        best
    }
}

/// Parameters of a randomly generated mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureSpec {
    /// Number of components.
    #[serde(default = "default_components")]
    pub components: usize,
    /// Lower bound on component weights.
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,
    /// Upper bound on component weights.
    #[serde(default = "default_max_weight")]
    pub max_weight: f64,
    /// Average per-axis variance.
    #[serde(default = "default_avg_scale")]
    pub avg_scale: f64,
    /// Anisotropy spread: axis variances are `avg/r` and `avg·r` with `r ∈ [1, 1 + diff]`.
    #[serde(default = "default_diff_scale")]
    pub diff_scale: f64,
    /// Seed of the generator stream.
    #[serde(default = "default_mixture_seed")]
    pub seed: u64,
}

fn default_components() -> usize {
    50
}

fn default_min_weight() -> f64 {
    1.0
}

fn default_max_weight() -> f64 {
    1.0
}

fn default_avg_scale() -> f64 {
    1.0e-5
}

fn default_diff_scale() -> f64 {
    10.0
}

fn default_mixture_seed() -> u64 {
    13370
}

impl Default for MixtureSpec {
    fn default() -> Self {
        Self {
            components: default_components(),
            min_weight: default_min_weight(),
            max_weight: default_max_weight(),
            avg_scale: default_avg_scale(),
            diff_scale: default_diff_scale(),
            seed: default_mixture_seed(),
        }
    }
}

/// Builds a random mixture in `dimension` (even, at least 2) dimensions.
///
/// Means are stratified with an n-rooks pattern and pulled away from the cube
/// boundary by three standard deviations.
pub fn random_mixture(dimension: usize, spec: &MixtureSpec) -> Result<GaussianMixture, RexError> {
    if dimension < 2 || dimension % 2 != 0 {
        return Err(RexError::Config(
            ErrorInfo::new("dimension", "mixture dimension must be even and at least 2")
                .with_context("dimension", dimension.to_string()),
        ));
    }
    if spec.components == 0 {
        return Err(RexError::config(
            "mixture-shape",
            "a mixture needs at least one component",
        ));
    }
    if !(spec.avg_scale > 0.0) || spec.diff_scale < 0.0 {
        return Err(RexError::Config(
            ErrorInfo::new("mixture-scale", "scales must be positive")
                .with_context("avg_scale", spec.avg_scale.to_string())
                .with_context("diff_scale", spec.diff_scale.to_string()),
        ));
    }

    let mut rng = RngHandle::from_stream(spec.seed, 1337);
    let margin = spec.avg_scale.sqrt();
    let means = n_rooks(&mut rng, spec.components, dimension);
    let mut components = Vec::with_capacity(spec.components);
    let mut weights = Vec::with_capacity(spec.components);
    for mean in means {
        weights.push(spec.min_weight + rng.draw() * (spec.max_weight - spec.min_weight));
        let scales: Vec<[f64; 2]> = (0..dimension / 2)
            .map(|_| {
                let r = 1.0 + rng.draw() * spec.diff_scale;
                [spec.avg_scale / r, spec.avg_scale * r]
            })
            .collect();
        let blocks = scales
            .into_iter()
            .enumerate()
            .map(|(block, scale)| {
                let shift = |m: f64| margin * 3.0 + m * (1.0 - margin * 6.0);
                let rotation = rng.draw() * 2.0 * PI;
                Gaussian2D::new(
                    [shift(mean[2 * block]), shift(mean[2 * block + 1])],
                    scale,
                    rotation,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        components.push(ProductGaussian::new(blocks)?);
    }
    GaussianMixture::new(components, &weights)
}

/// Stratified points: one per stratum along every axis, axes shuffled independently.
fn n_rooks(rng: &mut RngHandle, count: usize, dimension: usize) -> Vec<Vec<f64>> {
    let strata = 1.0 / count as f64;
    let mut points: Vec<Vec<f64>> = (0..count)
        .map(|i| {
            (0..dimension)
                .map(|_| rng.draw() * strata + strata * i as f64)
                .collect()
        })
        .collect();
    for d in 1..dimension {
        for i in 0..count.saturating_sub(1) {
            let j = i + rng.draw_int((count - i) as u32) as usize;
            let tmp = points[i][d];
            points[i][d] = points[j][d];
            points[j][d] = tmp;
        }
    }
    points
}
