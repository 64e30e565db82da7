//! Randomness sources for polynomial generation.
//!
//! Production code draws every coefficient and every proof nonce from a
//! cryptographically secure generator through [`SecureSampler`]. The seeded
//! sampler used to build reproducible test vectors only exists in test
//! builds or behind the `test-utils` feature.

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::group::{ElementModQ, GroupContext};

/// Supplies the secret coefficients of a polynomial and the nonces of their
/// possession proofs. Implementations must never hand out the same nonce
/// twice.
pub trait CoefficientSampler {
    /// Secret coefficient for the given degree.
    fn coefficient(&mut self, group: &GroupContext, degree: usize) -> ElementModQ;

    /// Fresh proof nonce, independent of every previous draw.
    fn nonce(&mut self, group: &GroupContext) -> ElementModQ;
}

/// Samples uniformly from Z_q with a CSPRNG. Not `Clone`: concurrent
/// ceremonies each build their own.
pub struct SecureSampler<R = OsRng> {
    rng: R,
}

impl SecureSampler<OsRng> {
    pub fn new() -> Self {
        SecureSampler { rng: OsRng }
    }
}

impl Default for SecureSampler<OsRng> {
    fn default() -> Self {
        SecureSampler::new()
    }
}

impl<R: RngCore + CryptoRng> SecureSampler<R> {
    pub fn from_rng(rng: R) -> Self {
        SecureSampler { rng }
    }
}

impl<R: RngCore + CryptoRng> CoefficientSampler for SecureSampler<R> {
    fn coefficient(&mut self, group: &GroupContext, _degree: usize) -> ElementModQ {
        group.rand_q(&mut self.rng)
    }

    fn nonce(&mut self, group: &GroupContext) -> ElementModQ {
        group.rand_q(&mut self.rng)
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use seeded::SeededSampler;

#[cfg(any(test, feature = "test-utils"))]
mod seeded {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use sha2::{Digest, Sha256};

    use super::CoefficientSampler;
    use crate::group::{ElementModQ, GroupContext};

    /// Deterministic sampler for test vectors: the coefficient at degree i is
    /// `seed + i`. Proof nonces come from a ChaCha20 stream keyed by the
    /// seed, so proofs are reproducible but still use distinct nonces.
    pub struct SeededSampler {
        seed: ElementModQ,
        nonces: ChaCha20Rng,
    }

    impl SeededSampler {
        pub fn new(group: &GroupContext, seed: ElementModQ) -> Self {
            let seed = group.q_from_biguint(seed.value().clone());
            let mut hasher = Sha256::new();
            hasher.update(b"seeded-sampler");
            hasher.update(seed.value().to_bytes_be());
            let key: [u8; 32] = hasher.finalize().into();
            SeededSampler {
                seed,
                nonces: ChaCha20Rng::from_seed(key),
            }
        }
    }

    impl CoefficientSampler for SeededSampler {
        fn coefficient(&mut self, group: &GroupContext, degree: usize) -> ElementModQ {
            group.add_q(&self.seed, &group.q_from_u64(degree as u64))
        }

        fn nonce(&mut self, group: &GroupContext) -> ElementModQ {
            group.rand_q(&mut self.nonces)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn toy() -> GroupContext {
        GroupContext::from_u64(23, 11, 2).unwrap()
    }

    #[test]
    fn secure_sampler_stays_in_field() {
        let group = GroupContext::production();
        let mut sampler = SecureSampler::new();
        for degree in 0..4 {
            let coefficient = sampler.coefficient(group, degree);
            assert!(group.is_in_bounds_q(&coefficient));
        }
        assert_ne!(sampler.nonce(group), sampler.nonce(group));
    }

    #[test]
    fn secure_sampler_accepts_any_csprng() {
        let group = GroupContext::production();
        let mut a = SecureSampler::from_rng(ChaCha20Rng::seed_from_u64(9));
        let mut b = SecureSampler::from_rng(ChaCha20Rng::seed_from_u64(9));
        assert_eq!(a.coefficient(group, 0), b.coefficient(group, 0));
    }

    #[test]
    fn seeded_sampler_counts_up_from_seed() {
        let group = toy();
        let mut sampler = SeededSampler::new(&group, group.q_from_u64(9));
        assert_eq!(sampler.coefficient(&group, 0), group.q_from_u64(9));
        assert_eq!(sampler.coefficient(&group, 1), group.q_from_u64(10));
        assert_eq!(sampler.coefficient(&group, 2), group.q_from_u64(0));
    }

    #[test]
    fn seeded_sampler_nonces_are_reproducible() {
        let group = GroupContext::production();
        let seed = group.q_from_u64(42);
        let mut a = SeededSampler::new(group, seed.clone());
        let mut b = SeededSampler::new(group, seed);
        let first = a.nonce(group);
        assert_eq!(first, b.nonce(group));
        assert_ne!(first, a.nonce(group));
    }
}
