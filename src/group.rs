//! Integer group arithmetic for the election key ceremony.
//!
//! Scalars live in Z_q and group elements in the order-q subgroup of Z_p^*.
//! All parameters travel in an explicit [`GroupContext`]; nothing here reads
//! process-wide state except [`GroupContext::production`], which hands out a
//! shared immutable instance.

use std::fmt;

use lazy_static::lazy_static;
use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::PolynomialError;

/// RFC 3526 2048-bit MODP group (group 14). p is a safe prime with
/// p = 7 mod 8, so 2 generates the subgroup of order q = (p - 1) / 2.
const PRODUCTION_P_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AACAA68FFFFFFFFFFFFFFFF",
);

lazy_static! {
    static ref PRODUCTION_GROUP: GroupContext = {
        let p = BigUint::parse_bytes(PRODUCTION_P_HEX.as_bytes(), 16)
            .expect("production modulus is valid hex");
        let q = (&p - 1u32) >> 1;
        GroupContext {
            p,
            q,
            g: BigUint::from(2u32),
        }
    };
}

/// A scalar in Z_q: secret coefficients, coordinates, Lagrange weights.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementModQ(#[serde(with = "hex_biguint")] BigUint);

/// An element of Z_p^*: commitments and proof commitments.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementModP(#[serde(with = "hex_biguint")] BigUint);

impl ElementModQ {
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_str_radix(16).to_uppercase()
    }
}

impl ElementModP {
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.to_str_radix(16).to_uppercase()
    }
}

impl fmt::Debug for ElementModQ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementModQ({})", self.to_hex())
    }
}

impl fmt::Debug for ElementModP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementModP({})", self.to_hex())
    }
}

/// The algebraic parameters of the election: modulus `p`, subgroup order `q`
/// and generator `g` of the order-q subgroup.
///
/// `q` is assumed prime; `new` checks the subgroup structure but does not run
/// a primality test.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GroupParameters", into = "GroupParameters")]
pub struct GroupContext {
    p: BigUint,
    q: BigUint,
    g: BigUint,
}

/// Wire form of a [`GroupContext`], big integers hex-encoded.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct GroupParameters {
    #[serde(with = "hex_biguint")]
    p: BigUint,
    #[serde(with = "hex_biguint")]
    q: BigUint,
    #[serde(with = "hex_biguint")]
    g: BigUint,
}

impl TryFrom<GroupParameters> for GroupContext {
    type Error = PolynomialError;

    fn try_from(params: GroupParameters) -> Result<Self, Self::Error> {
        GroupContext::new(params.p, params.q, params.g)
    }
}

impl From<GroupContext> for GroupParameters {
    fn from(group: GroupContext) -> Self {
        GroupParameters {
            p: group.p,
            q: group.q,
            g: group.g,
        }
    }
}

impl fmt::Debug for GroupContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupContext")
            .field("p_bits", &self.p.bits())
            .field("q_bits", &self.q.bits())
            .field("g", &self.g.to_str_radix(16))
            .finish()
    }
}

impl GroupContext {
    pub fn new(p: BigUint, q: BigUint, g: BigUint) -> Result<Self, PolynomialError> {
        if q <= BigUint::one() {
            return Err(PolynomialError::InvalidParameter(
                "subgroup order q must exceed 1".into(),
            ));
        }
        if p <= q {
            return Err(PolynomialError::InvalidParameter(
                "modulus p must exceed subgroup order q".into(),
            ));
        }
        if !(&p - 1u32).is_multiple_of(&q) {
            return Err(PolynomialError::InvalidParameter(
                "subgroup order q must divide p - 1".into(),
            ));
        }
        if g <= BigUint::one() || g >= p {
            return Err(PolynomialError::InvalidParameter(
                "generator must lie in (1, p)".into(),
            ));
        }
        if !g.modpow(&q, &p).is_one() {
            return Err(PolynomialError::InvalidParameter(
                "generator does not lie in the order-q subgroup".into(),
            ));
        }
        Ok(GroupContext { p, q, g })
    }

    /// Convenience constructor for small test groups.
    pub fn from_u64(p: u64, q: u64, g: u64) -> Result<Self, PolynomialError> {
        GroupContext::new(BigUint::from(p), BigUint::from(q), BigUint::from(g))
    }

    /// The built-in 2048-bit election group.
    pub fn production() -> &'static GroupContext {
        &PRODUCTION_GROUP
    }

    pub fn from_json(json: &str) -> Result<Self, PolynomialError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PolynomialError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn p(&self) -> &BigUint {
        &self.p
    }

    pub fn q(&self) -> &BigUint {
        &self.q
    }

    /// Byte width of an encoded element of Z_p.
    pub fn p_byte_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }

    pub fn generator(&self) -> ElementModP {
        ElementModP(self.g.clone())
    }

    pub fn zero_q(&self) -> ElementModQ {
        ElementModQ(BigUint::zero())
    }

    pub fn one_q(&self) -> ElementModQ {
        ElementModQ(BigUint::one())
    }

    pub fn one_p(&self) -> ElementModP {
        ElementModP(BigUint::one())
    }

    pub fn q_from_u64(&self, value: u64) -> ElementModQ {
        ElementModQ(BigUint::from(value) % &self.q)
    }

    pub fn q_from_biguint(&self, value: BigUint) -> ElementModQ {
        ElementModQ(value % &self.q)
    }

    pub fn p_from_biguint(&self, value: BigUint) -> ElementModP {
        ElementModP(value % &self.p)
    }

    /// True if the scalar is a canonical representative of Z_q.
    pub fn is_in_bounds_q(&self, element: &ElementModQ) -> bool {
        element.0 < self.q
    }

    /// True if the element lies in the order-q subgroup of Z_p^*.
    pub fn is_valid_residue(&self, element: &ElementModP) -> bool {
        !element.0.is_zero() && element.0 < self.p && element.0.modpow(&self.q, &self.p).is_one()
    }

    pub fn add_q(&self, a: &ElementModQ, b: &ElementModQ) -> ElementModQ {
        ElementModQ((&a.0 + &b.0) % &self.q)
    }

    pub fn sub_q(&self, a: &ElementModQ, b: &ElementModQ) -> ElementModQ {
        let b = &b.0 % &self.q;
        ElementModQ((&a.0 + &self.q - b) % &self.q)
    }

    pub fn mul_q(&self, a: &ElementModQ, b: &ElementModQ) -> ElementModQ {
        ElementModQ((&a.0 * &b.0) % &self.q)
    }

    pub fn pow_q(&self, base: &ElementModQ, exponent: &BigUint) -> ElementModQ {
        ElementModQ(base.0.modpow(exponent, &self.q))
    }

    /// Multiplicative inverse in Z_q. Zero (or anything sharing a factor
    /// with q) has no inverse and is reported as a domain error.
    pub fn inverse_q(&self, a: &ElementModQ) -> Result<ElementModQ, PolynomialError> {
        let modulus = BigInt::from(self.q.clone());
        let value = BigInt::from(a.0.clone());
        let gcd = value.extended_gcd(&modulus);
        if !gcd.gcd.is_one() {
            return Err(PolynomialError::ArithmeticDomain(format!(
                "{} has no inverse mod q",
                a.to_hex()
            )));
        }
        let inverse = gcd.x.mod_floor(&modulus).to_biguint().ok_or_else(|| {
            PolynomialError::ArithmeticDomain("inverse reduced to a negative value".into())
        })?;
        Ok(ElementModQ(inverse))
    }

    pub fn div_q(
        &self,
        numerator: &ElementModQ,
        denominator: &ElementModQ,
    ) -> Result<ElementModQ, PolynomialError> {
        Ok(self.mul_q(numerator, &self.inverse_q(denominator)?))
    }

    pub fn mul_p(&self, a: &ElementModP, b: &ElementModP) -> ElementModP {
        ElementModP((&a.0 * &b.0) % &self.p)
    }

    pub fn pow_p(&self, base: &ElementModP, exponent: &ElementModQ) -> ElementModP {
        ElementModP(base.0.modpow(&exponent.0, &self.p))
    }

    pub fn g_pow_p(&self, exponent: &ElementModQ) -> ElementModP {
        ElementModP(self.g.modpow(&exponent.0, &self.p))
    }

    /// Uniform sample from Z_q.
    pub fn rand_q<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> ElementModQ {
        ElementModQ(rng.gen_biguint_below(&self.q))
    }
}

mod hex_biguint {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(16).to_uppercase())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let hex = String::deserialize(deserializer)?;
        BigUint::parse_bytes(hex.as_bytes(), 16)
            .ok_or_else(|| de::Error::custom(format!("invalid hex integer: {hex:?}")))
    }
}
