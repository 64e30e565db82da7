//! Schnorr proof of possession over the integer group.
//!
//! Proves knowledge of `s` for a public commitment `K = g^s` without
//! revealing `s`:
//!
//! 1. commit `h = g^u` with a fresh nonce `u`
//! 2. challenge `c = H(K || h) mod q`
//! 3. respond `v = u + c * s mod q`
//!
//! A verifier accepts iff `g^v == h * K^c` and both `K` and `h` lie in the
//! order-q subgroup.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::trace;

use crate::group::{ElementModP, ElementModQ, GroupContext};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchnorrProof {
    /// `h = g^u`
    pub commitment: ElementModP,
    /// `c = H(K || h)`
    pub challenge: ElementModQ,
    /// `v = u + c * s`
    pub response: ElementModQ,
}

impl SchnorrProof {
    /// Build a proof for `public = g^secret`. The nonce must be freshly
    /// sampled for every proof; reusing it leaks `secret`.
    pub fn prove(
        group: &GroupContext,
        secret: &ElementModQ,
        public: &ElementModP,
        nonce: &ElementModQ,
    ) -> Self {
        let commitment = group.g_pow_p(nonce);
        let challenge = challenge(group, public, &commitment);
        let response = group.add_q(nonce, &group.mul_q(&challenge, secret));
        SchnorrProof {
            commitment,
            challenge,
            response,
        }
    }

    pub fn verify(&self, group: &GroupContext, public: &ElementModP) -> bool {
        if !group.is_valid_residue(public) || !group.is_valid_residue(&self.commitment) {
            trace!("schnorr proof rejected: element outside subgroup");
            return false;
        }
        if !group.is_in_bounds_q(&self.challenge) || !group.is_in_bounds_q(&self.response) {
            trace!("schnorr proof rejected: scalar out of range");
            return false;
        }
        if self.challenge != challenge(group, public, &self.commitment) {
            trace!("schnorr proof rejected: challenge mismatch");
            return false;
        }

        let left = group.g_pow_p(&self.response);
        let right = group.mul_p(&self.commitment, &group.pow_p(public, &self.challenge));
        left == right
    }
}

/// Fiat-Shamir challenge over fixed-width big-endian encodings.
fn challenge(group: &GroupContext, public: &ElementModP, commitment: &ElementModP) -> ElementModQ {
    let width = group.p_byte_len();
    let mut hasher = Sha256::new();
    for element in [public, commitment] {
        let bytes = element.value().to_bytes_be();
        hasher.update(vec![0u8; width.saturating_sub(bytes.len())]);
        hasher.update(&bytes);
    }
    group.q_from_biguint(num_bigint::BigUint::from_bytes_be(&hasher.finalize()))
}
