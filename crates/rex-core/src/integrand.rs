//! Target density interface consumed by every sampler.

/// Tempered target density over the unit cube `[0,1)^D`.
pub trait Integrand {
    /// Dimension `D` of the sampling domain.
    fn dimension(&self) -> usize;

    /// Tempered density at `state` for inverse temperature `beta`.
    ///
    /// Must be non-negative and exactly zero outside `[0,1)^D`.
    fn density(&self, state: &[f64], beta: f64) -> f64;

    /// Supremum of [`Integrand::density`] at inverse temperature `beta`.
    fn max_density(&self, beta: f64) -> f64;
}

/// Integrand whose mass is split into identifiable modes.
pub trait ModalIntegrand: Integrand {
    /// Number of modes.
    fn mode_count(&self) -> usize;

    /// Mode that dominates the density at `state`, if any.
    fn mode(&self, state: &[f64]) -> Option<usize>;
}

impl<T: Integrand + ?Sized> Integrand for &T {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn density(&self, state: &[f64], beta: f64) -> f64 {
        (**self).density(state, beta)
    }

    fn max_density(&self, beta: f64) -> f64 {
        (**self).max_density(beta)
    }
}

impl<T: ModalIntegrand + ?Sized> ModalIntegrand for &T {
    fn mode_count(&self) -> usize {
        (**self).mode_count()
    }

    fn mode(&self, state: &[f64]) -> Option<usize> {
        (**self).mode(state)
    }
}

/// Returns `true` when every coordinate lies in `[0, 1)`.
pub fn inside_unit_cube(state: &[f64]) -> bool {
    state.iter().all(|x| (0.0..1.0).contains(x))
}
