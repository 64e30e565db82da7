//! Threshold secret sharing for the election key ceremony: polynomial
//! generation with commitments and possession proofs, share evaluation,
//! public share verification and Lagrange weights.

pub mod error;
pub mod group;
pub mod lagrange;
pub mod polynomial;
pub mod sampler;
pub mod schnorr;

pub use error::*;
pub use group::*;
pub use lagrange::*;
pub use polynomial::*;
pub use sampler::*;
pub use schnorr::*;
