use rex_core::{ErrorInfo, RexError};

/// Bases of the Halton coordinates, one per dimension.
pub const HALTON_BASES: [u64; 18] = [
    2, 3, 5, 11, 17, 23, 31, 43, 59, 71, 89, 107, 131, 149, 163, 191, 211, 227,
];

/// Van der Corput radical inverse of `index` in `base`.
pub fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inverse_base = 1.0 / base as f64;
    let mut factor = 1.0;
    let mut result = 0.0;
    while index > 0 {
        factor *= inverse_base;
        result += factor * (index % base) as f64;
        index /= base;
    }
    result
}

/// Point `index` of the Halton sequence in `[0,1)^dimension`.
pub fn halton_point(index: u64, dimension: usize) -> Vec<f64> {
    HALTON_BASES[..dimension.min(HALTON_BASES.len())]
        .iter()
        .map(|&base| radical_inverse(index, base))
        .collect()
}

/// Rejects dimensions outside `1..=HALTON_BASES.len()`.
pub fn check_halton_dimension(dimension: usize) -> Result<(), RexError> {
    if dimension == 0 || dimension > HALTON_BASES.len() {
        return Err(RexError::Config(
            ErrorInfo::new("dimension", "the Halton sequence has no bases for this dimension")
                .with_context("dimension", dimension.to_string())
                .with_context("max", HALTON_BASES.len().to_string()),
        ));
    }
    Ok(())
}
