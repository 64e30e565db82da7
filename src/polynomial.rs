use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::PolynomialError;
use crate::group::{ElementModP, ElementModQ, GroupContext};
use crate::sampler::CoefficientSampler;
use crate::schnorr::SchnorrProof;

/// A guardian's share: the polynomial evaluated at the guardian's sequence
/// order.
pub type Coordinate = ElementModQ;

/// Secret coefficient `a_i`, its commitment `K_i = g^{a_i}` and a proof of
/// possession of `a_i`.
#[derive(PartialEq, Eq)]
pub struct CoefficientRecord {
    value: ElementModQ,
    commitment: ElementModP,
    proof: SchnorrProof,
}

impl CoefficientRecord {
    pub fn value(&self) -> &ElementModQ {
        &self.value
    }

    pub fn commitment(&self) -> &ElementModP {
        &self.commitment
    }

    pub fn proof(&self) -> &SchnorrProof {
        &self.proof
    }
}

impl fmt::Debug for CoefficientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoefficientRecord")
            .field("value", &"<redacted>")
            .field("commitment", &self.commitment)
            .field("proof", &self.proof)
            .finish()
    }
}

/// The secret-sharing polynomial of one guardian. Coefficient 0 is the
/// guardian's secret; the number of coefficients is the quorum size.
///
/// Not serializable. Once shares are distributed, call
/// [`ElectionPolynomial::into_public`] to drop the secrets and keep only what
/// belongs in the election record. Deliberately not `Clone`:
///
/// ```compile_fail
/// use election_polynomial::{generate_polynomial, ElectionPolynomial, GroupContext, SecureSampler};
///
/// let group = GroupContext::production();
/// let polynomial = generate_polynomial(group, 2, &mut SecureSampler::new()).unwrap();
/// let copy: ElectionPolynomial = polynomial.clone();
/// ```
#[derive(PartialEq, Eq, Debug)]
pub struct ElectionPolynomial {
    coefficients: Vec<CoefficientRecord>,
}

impl ElectionPolynomial {
    /// Builds the polynomial for explicitly chosen coefficients, proving each
    /// with a nonce from `sampler`. Reserved for known-answer tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn from_coefficients<S: CoefficientSampler + ?Sized>(
        group: &GroupContext,
        values: Vec<ElementModQ>,
        sampler: &mut S,
    ) -> Result<Self, PolynomialError> {
        if values.is_empty() {
            return Err(PolynomialError::InvalidParameter(
                "a polynomial needs at least one coefficient".into(),
            ));
        }
        let coefficients = values
            .into_iter()
            .map(|value| {
                let value = group.q_from_biguint(value.value().clone());
                commit_coefficient(group, value, &mut *sampler)
            })
            .collect();
        Ok(ElectionPolynomial { coefficients })
    }

    pub fn coefficients(&self) -> &[CoefficientRecord] {
        &self.coefficients
    }

    /// Number of coefficients, i.e. the quorum needed to reconstruct.
    pub fn threshold(&self) -> usize {
        self.coefficients.len()
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// The shared secret held at degree 0.
    pub fn secret(&self) -> &ElementModQ {
        &self.coefficients[0].value
    }

    /// Commitment to the secret; the guardian's public key share.
    pub fn public_key(&self) -> &ElementModP {
        &self.coefficients[0].commitment
    }

    pub fn commitments(&self) -> Vec<ElementModP> {
        self.coefficients
            .iter()
            .map(|c| c.commitment.clone())
            .collect()
    }

    pub fn proofs(&self) -> Vec<SchnorrProof> {
        self.coefficients.iter().map(|c| c.proof.clone()).collect()
    }

    pub fn verify_proofs(&self, group: &GroupContext) -> bool {
        self.coefficients
            .iter()
            .all(|c| c.proof.verify(group, &c.commitment))
    }

    /// Consumes the polynomial, keeping only commitments and proofs.
    pub fn into_public(self) -> PublicPolynomial {
        let (commitments, proofs) = self
            .coefficients
            .into_iter()
            .map(|c| (c.commitment, c.proof))
            .unzip();
        PublicPolynomial {
            commitments,
            proofs,
        }
    }
}

/// The publishable half of an [`ElectionPolynomial`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPolynomial {
    commitments: Vec<ElementModP>,
    proofs: Vec<SchnorrProof>,
}

impl PublicPolynomial {
    pub fn commitments(&self) -> &[ElementModP] {
        &self.commitments
    }

    pub fn proofs(&self) -> &[SchnorrProof] {
        &self.proofs
    }

    pub fn threshold(&self) -> usize {
        self.commitments.len()
    }

    /// Checks every possession proof. A record whose proof list does not
    /// line up with its commitments fails.
    pub fn verify_proofs(&self, group: &GroupContext) -> bool {
        self.commitments.len() == self.proofs.len()
            && self
                .commitments
                .iter()
                .zip(&self.proofs)
                .all(|(commitment, proof)| proof.verify(group, commitment))
    }

    pub fn verify_coordinate(&self, group: &GroupContext, coordinate: &Coordinate, x: u64) -> bool {
        verify_coordinate(group, coordinate, x, &self.commitments)
    }
}

fn commit_coefficient<S: CoefficientSampler + ?Sized>(
    group: &GroupContext,
    value: ElementModQ,
    sampler: &mut S,
) -> CoefficientRecord {
    let commitment = group.g_pow_p(&value);
    let nonce = sampler.nonce(group);
    let proof = SchnorrProof::prove(group, &value, &commitment, &nonce);
    CoefficientRecord {
        value,
        commitment,
        proof,
    }
}

/// Generates a polynomial with `count` coefficients, each committed to and
/// proven with an independent nonce.
pub fn generate_polynomial<S: CoefficientSampler + ?Sized>(
    group: &GroupContext,
    count: usize,
    sampler: &mut S,
) -> Result<ElectionPolynomial, PolynomialError> {
    if count == 0 {
        return Err(PolynomialError::InvalidParameter(
            "number of coefficients must be at least 1".into(),
        ));
    }

    let coefficients = (0..count)
        .map(|degree| {
            let value = sampler.coefficient(group, degree);
            commit_coefficient(group, value, &mut *sampler)
        })
        .collect();

    debug!(count, "generated election polynomial");
    Ok(ElectionPolynomial { coefficients })
}

/// Evaluates `Σ a_i * x^i mod q`.
pub fn compute_coordinate(group: &GroupContext, x: u64, polynomial: &ElectionPolynomial) -> Coordinate {
    let x = group.q_from_u64(x);
    let mut result = group.zero_q();
    let mut x_pow_i = group.one_q();

    for coefficient in &polynomial.coefficients {
        result = group.add_q(&result, &group.mul_q(&coefficient.value, &x_pow_i));
        x_pow_i = group.mul_q(&x_pow_i, &x);
    }

    result
}

/// Checks `g^coordinate == Π K_i^{x^i} mod p` using only public commitments.
/// A coordinate outside `[0, q)` is not a share and never verifies.
pub fn verify_coordinate(
    group: &GroupContext,
    coordinate: &Coordinate,
    x: u64,
    commitments: &[ElementModP],
) -> bool {
    if !group.is_in_bounds_q(coordinate) {
        trace!("coordinate rejected: not reduced mod q");
        return false;
    }

    let x = group.q_from_u64(x);
    let mut expected = group.one_p();

    for (i, commitment) in commitments.iter().enumerate() {
        let exponent = group.pow_q(&x, &BigUint::from(i));
        expected = group.mul_p(&expected, &group.pow_p(commitment, &exponent));
    }

    let valid = group.g_pow_p(coordinate) == expected;
    if !valid {
        trace!(degree = commitments.len(), "coordinate does not match commitments");
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{SecureSampler, SeededSampler};

    fn toy() -> GroupContext {
        GroupContext::from_u64(23, 11, 2).unwrap()
    }

    fn toy_polynomial(group: &GroupContext, values: &[u64]) -> ElectionPolynomial {
        let mut sampler = SeededSampler::new(group, group.zero_q());
        let values = values.iter().map(|v| group.q_from_u64(*v)).collect();
        ElectionPolynomial::from_coefficients(group, values, &mut sampler).unwrap()
    }

    #[test]
    fn zero_coefficients_is_invalid() {
        let group = GroupContext::production();
        let result = generate_polynomial(group, 0, &mut SecureSampler::new());
        assert!(matches!(result, Err(PolynomialError::InvalidParameter(_))));
    }

    #[test]
    fn generated_polynomial_is_committed_and_proven() {
        let group = GroupContext::production();
        let polynomial = generate_polynomial(group, 3, &mut SecureSampler::new()).unwrap();

        assert_eq!(polynomial.threshold(), 3);
        assert_eq!(polynomial.degree(), 2);
        for record in polynomial.coefficients() {
            assert_eq!(record.commitment(), &group.g_pow_p(record.value()));
        }
        assert!(polynomial.verify_proofs(group));
        assert_eq!(polynomial.public_key(), &polynomial.commitments()[0]);

        let nonces: Vec<_> = polynomial.proofs().into_iter().map(|p| p.commitment).collect();
        assert_ne!(nonces[0], nonces[1]);
        assert_ne!(nonces[1], nonces[2]);
    }

    #[test]
    fn seeded_generation_counts_from_seed() {
        let group = GroupContext::production();
        let seed = group.q_from_u64(1000);
        let polynomial =
            generate_polynomial(group, 3, &mut SeededSampler::new(group, seed.clone())).unwrap();
        assert_eq!(polynomial.secret(), &seed);
        assert_eq!(polynomial.coefficients()[2].value(), &group.q_from_u64(1002));
        assert!(polynomial.verify_proofs(group));
    }

    #[test]
    fn toy_scenario_shares() {
        let group = toy();
        let polynomial = toy_polynomial(&group, &[6, 4]);
        let commitments = polynomial.commitments();

        let share_1 = compute_coordinate(&group, 1, &polynomial);
        let share_2 = compute_coordinate(&group, 2, &polynomial);
        assert_eq!(share_1, group.q_from_u64(10));
        assert_eq!(share_2, group.q_from_u64(3));

        assert!(verify_coordinate(&group, &share_1, 1, &commitments));
        assert!(verify_coordinate(&group, &share_2, 2, &commitments));
    }

    #[test]
    fn every_wrong_toy_share_is_rejected() {
        let group = toy();
        let polynomial = toy_polynomial(&group, &[6, 4]);
        let commitments = polynomial.commitments();

        for candidate in 0..11 {
            let accepted = verify_coordinate(&group, &group.q_from_u64(candidate), 2, &commitments);
            assert_eq!(accepted, candidate == 3, "candidate {}", candidate);
        }
    }

    #[test]
    fn unreduced_share_is_rejected() {
        // 14 = 3 + q; g^14 == g^3 but 14 is not an element of Z_11
        let group = toy();
        let polynomial = toy_polynomial(&group, &[6, 4]);
        let commitments = polynomial.commitments();

        let unreduced: Coordinate = serde_json::from_str("\"E\"").unwrap();
        assert!(!group.is_in_bounds_q(&unreduced));
        assert!(!verify_coordinate(&group, &unreduced, 2, &commitments));
        assert!(verify_coordinate(&group, &group.q_from_u64(3), 2, &commitments));
    }

    #[test]
    fn constant_polynomial_evaluates_to_secret() {
        let group = GroupContext::production();
        let polynomial = generate_polynomial(group, 1, &mut SecureSampler::new()).unwrap();
        for x in [1, 2, 7, 1_000_000] {
            let share = compute_coordinate(group, x, &polynomial);
            assert_eq!(&share, polynomial.secret());
            assert!(verify_coordinate(group, &share, x, &polynomial.commitments()));
        }
    }

    #[test]
    fn share_verifies_against_published_half() {
        let group = GroupContext::production();
        let polynomial = generate_polynomial(group, 2, &mut SecureSampler::new()).unwrap();
        let share = compute_coordinate(group, 4, &polynomial);
        let tampered = group.add_q(&share, &group.one_q());

        let public = polynomial.into_public();
        assert!(public.verify_proofs(group));
        assert!(public.verify_coordinate(group, &share, 4));
        assert!(!public.verify_coordinate(group, &tampered, 4));
        assert!(!public.verify_coordinate(group, &share, 5));
    }

    #[test]
    fn public_polynomial_serializes_without_secrets() {
        let group = toy();
        let polynomial = toy_polynomial(&group, &[6, 4]);
        assert!(format!("{:?}", polynomial).contains("<redacted>"));
        let public = polynomial.into_public();

        let json = serde_json::to_string(&public).unwrap();
        let back: PublicPolynomial = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public);
        assert!(back.verify_proofs(&group));
    }

    #[test]
    fn mismatched_proof_list_fails_verification() {
        let group = toy();
        let mut public = toy_polynomial(&group, &[6, 4]).into_public();
        public.proofs.pop();
        assert!(!public.verify_proofs(&group));
    }

    #[test]
    fn evaluation_is_deterministic() {
        let group = GroupContext::production();
        let polynomial = generate_polynomial(group, 4, &mut SecureSampler::new()).unwrap();
        assert_eq!(
            compute_coordinate(group, 3, &polynomial),
            compute_coordinate(group, 3, &polynomial)
        );
    }
}
