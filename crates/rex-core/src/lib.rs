#![deny(missing_docs)]
#![doc = "Core traits and data types for the REX replica-exchange engine: errors, deterministic randomness and target densities."]

pub mod errors;
pub mod gaussian;
pub mod integrand;
pub mod rng;

pub use errors::{ErrorInfo, RexError};
pub use gaussian::{random_mixture, Gaussian2D, GaussianMixture, MixtureSpec, ProductGaussian};
pub use integrand::{inside_unit_cube, Integrand, ModalIntegrand};
pub use rng::{derive_substream_seed, random_point, RngHandle, UniformSource};
