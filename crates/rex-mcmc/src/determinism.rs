use rex_core::derive_substream_seed;

const EXCHANGE_DOMAIN: u64 = 0xA5A5_A5A5_A5A5_A5A5;
const BASELINE_DOMAIN: u64 = 0x5A5A_5A5A_5A5A_5A5A;

/// `(state, sequence)` pair that seeds the private stream of `chain_index`.
pub fn chain_stream(master_seed: u64, chain_index: usize) -> (u64, u64) {
    let state = derive_substream_seed(master_seed, chain_index as u64);
    let sequence = derive_substream_seed(state, chain_index as u64 ^ 0xFFFF);
    (state, sequence)
}

/// Seed of the engine-level stream used by sweep-level exchange strategies.
pub fn exchange_stream(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ EXCHANGE_DOMAIN, 0)
}

/// Seed of a single-chain baseline sampler.
pub fn baseline_stream(master_seed: u64, salt: u64) -> u64 {
    derive_substream_seed(master_seed ^ BASELINE_DOMAIN, salt)
}

/// Seed of the `index`-th algorithm of a comparison suite.
pub fn algorithm_seed(master_seed: u64, index: usize) -> u64 {
    derive_substream_seed(master_seed, (index as u64) << 32 | 0x5EED)
}
