//! Lagrange weights for reconstructing a guardian's secret at x = 0.
//!
//! For guardian `i` in quorum `Q`, the weight is
//!
//! λ_i = Π_{j ∈ Q, j ≠ i} j / (j - i)
//!
//! so that Σ λ_i · f(i) = f(0) for any polynomial of degree < |Q|.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PolynomialError;
use crate::group::{ElementModQ, GroupContext};

pub type LagrangeCoefficient = ElementModQ;

/// Computes λ for `coordinate_index` against the other quorum members.
///
/// `participant_indices` must not contain `coordinate_index`: that would put
/// a zero factor in the denominator, which is reported as
/// [`PolynomialError::ArithmeticDomain`]. Zero or repeated participant
/// indices are rejected as [`PolynomialError::InvalidParameter`]. An empty
/// participant list yields 1.
pub fn compute_lagrange_coefficient(
    group: &GroupContext,
    coordinate_index: u64,
    participant_indices: &[u64],
) -> Result<LagrangeCoefficient, PolynomialError> {
    let degrees = distinct_nonzero(group, participant_indices)?;

    let coordinate = group.q_from_u64(coordinate_index);
    if degrees.contains(&coordinate) {
        debug!(coordinate_index, "lagrange coordinate listed among participants");
        return Err(PolynomialError::ArithmeticDomain(format!(
            "participants include coordinate {} mod q; denominator would be zero",
            coordinate_index
        )));
    }

    let mut numerator = group.one_q();
    let mut denominator = group.one_q();
    for &index in participant_indices {
        let degree = group.q_from_u64(index);
        denominator = group.mul_q(&denominator, &group.sub_q(&degree, &coordinate));
        numerator = group.mul_q(&numerator, &degree);
    }

    group.div_q(&numerator, &denominator)
}

/// Reduces indices mod q, rejecting any that vanish or repeat after
/// reduction.
fn distinct_nonzero(
    group: &GroupContext,
    indices: &[u64],
) -> Result<BTreeSet<ElementModQ>, PolynomialError> {
    let mut seen = BTreeSet::new();
    for &index in indices {
        let degree = group.q_from_u64(index);
        if degree.is_zero() {
            return Err(PolynomialError::InvalidParameter(format!(
                "participant index {} is zero mod q",
                index
            )));
        }
        if !seen.insert(degree) {
            return Err(PolynomialError::InvalidParameter(format!(
                "duplicate participant index mod q: {}",
                index
            )));
        }
    }
    Ok(seen)
}

/// Lagrange weights for one quorum, kept in the published election record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagrangeCoefficientsRecord {
    coefficients: Vec<LagrangeCoefficient>,
}

impl LagrangeCoefficientsRecord {
    pub fn new(coefficients: Vec<LagrangeCoefficient>) -> Self {
        LagrangeCoefficientsRecord { coefficients }
    }

    /// Weight for every member of `quorum`, each computed against the rest,
    /// in quorum order.
    pub fn for_quorum(group: &GroupContext, quorum: &[u64]) -> Result<Self, PolynomialError> {
        distinct_nonzero(group, quorum)?;
        let coefficients = quorum
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                let others: Vec<u64> = quorum
                    .iter()
                    .enumerate()
                    .filter(|(other, _)| *other != position)
                    .map(|(_, &j)| j)
                    .collect();
                compute_lagrange_coefficient(group, index, &others)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LagrangeCoefficientsRecord { coefficients })
    }

    /// True if every weight is a canonical element of Z_q. Records read
    /// back from storage should pass this before use.
    pub fn is_valid(&self, group: &GroupContext) -> bool {
        self.coefficients.iter().all(|c| group.is_in_bounds_q(c))
    }

    pub fn coefficients(&self) -> &[LagrangeCoefficient] {
        &self.coefficients
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}
