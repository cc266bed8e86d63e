// Extended-precision float.
//
// The x87 80-bit format: 64-bit significand with an explicit integer bit,
// 15-bit biased exponent and a sign bit, stored in a 16-byte slot (the
// last 6 bytes are padding). The raw slot is kept verbatim so binary
// pass-through is bit-exact, padding included.
//
// Arithmetic is not provided. Conversion from `f64` is exact, conversion
// to `f64` rounds to nearest. Text conversion never passes through `f64`:
// parsing rounds the exact decimal value to 64 significand bits, and
// display prints 20 significant digits of the exact binary value.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::decimal::{BigUint, Decimal, DecimalLiteral, LiteralValue};
use crate::codec::format::{self, FormatArg};

/// Bytes occupied by one extended value on the wire.
pub const EXTENDED_WIDTH: usize = 16;

const EXPONENT_BIAS: i32 = 16383;
const EXPONENT_MASK: u16 = 0x7FFF;
const SIGN_BIT: u16 = 0x8000;
const INTEGER_BIT: u64 = 1 << 63;
const QUIET_BIT: u64 = 1 << 62;

/// Significant digits written by `Display`, enough to read back the same
/// value.
pub const DISPLAY_DIGITS: usize = 20;

/// Decimal exponent above which every literal overflows.
const MAX_DECIMAL_MAGNITUDE: i64 = 4933;
/// Decimal exponent at or below which every literal rounds to zero.
const MIN_DECIMAL_MAGNITUDE: i64 = -4951;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid extended-precision literal '{0}'")]
pub struct ParseExtendedError(pub String);

/// An x87 extended-precision value in its native 16-byte slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Extended([u8; EXTENDED_WIDTH]);

impl Extended {
    pub const ZERO: Extended = Extended([0; EXTENDED_WIDTH]);

    fn from_parts(sign_exponent: u16, significand: u64) -> Self {
        let mut slot = [0u8; EXTENDED_WIDTH];
        slot[..8].copy_from_slice(&significand.to_ne_bytes());
        slot[8..10].copy_from_slice(&sign_exponent.to_ne_bytes());
        Self(slot)
    }

    fn significand(&self) -> u64 {
        let mut b = [0u8; 8];
        b.copy_from_slice(&self.0[..8]);
        u64::from_ne_bytes(b)
    }

    fn sign_exponent(&self) -> u16 {
        u16::from_ne_bytes([self.0[8], self.0[9]])
    }

    pub fn from_ne_bytes(bytes: [u8; EXTENDED_WIDTH]) -> Self {
        Self(bytes)
    }

    pub fn to_ne_bytes(self) -> [u8; EXTENDED_WIDTH] {
        self.0
    }

    /// Exact widening conversion.
    pub fn from_f64(value: f64) -> Self {
        let bits = value.to_bits();
        let sign = if bits >> 63 != 0 { SIGN_BIT } else { 0 };
        let exponent = ((bits >> 52) & 0x7FF) as i32;
        let fraction = bits & ((1u64 << 52) - 1);

        let (exp, significand) = match exponent {
            0x7FF => (EXPONENT_MASK, INTEGER_BIT | (fraction << 11)),
            0 if fraction == 0 => (0, 0),
            0 => {
                // Subnormal double: normalize so the integer bit is set.
                let shift = fraction.leading_zeros();
                let e = EXPONENT_BIAS + 63 - 1074 - shift as i32;
                (e as u16, fraction << shift)
            }
            _ => (
                (exponent - 1023 + EXPONENT_BIAS) as u16,
                INTEGER_BIT | (fraction << 11),
            ),
        };
        Self::from_parts(sign | exp, significand)
    }

    /// Narrowing conversion, rounding to nearest.
    pub fn to_f64(self) -> f64 {
        let se = self.sign_exponent();
        let significand = self.significand();
        let exponent = i32::from(se & EXPONENT_MASK);

        let magnitude = if exponent == i32::from(EXPONENT_MASK) {
            if significand << 1 == 0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        } else if significand == 0 {
            0.0
        } else {
            // Denormals use the minimum exponent with no implicit bit.
            let e = exponent.max(1) - EXPONENT_BIAS - 63;
            scale_by_pow2(significand as f64, e)
        };

        if se & SIGN_BIT != 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    pub fn is_sign_negative(self) -> bool {
        self.sign_exponent() & SIGN_BIT != 0
    }

    pub fn is_nan(self) -> bool {
        self.sign_exponent() & EXPONENT_MASK == EXPONENT_MASK && self.significand() << 1 != 0
    }

    pub fn is_infinite(self) -> bool {
        self.sign_exponent() & EXPONENT_MASK == EXPONENT_MASK && self.significand() << 1 == 0
    }

    /// Exact decimal expansion of the magnitude; `None` for NaN and
    /// infinities.
    pub(crate) fn decimal_magnitude(self) -> Option<Decimal> {
        let exponent = i32::from(self.sign_exponent() & EXPONENT_MASK);
        if exponent == i32::from(EXPONENT_MASK) {
            return None;
        }
        let exp2 = exponent.max(1) - EXPONENT_BIAS - 63;
        Some(Decimal::from_binary(self.significand(), exp2))
    }

    fn infinity(sign: u16) -> Self {
        Self::from_parts(sign | EXPONENT_MASK, INTEGER_BIT)
    }

    /// Nearest value to `digits * 10^exponent`, ties to even.
    fn from_decimal(sign: u16, digits: &[u8], exponent: i64) -> Self {
        if digits.is_empty() {
            return Self::from_parts(sign, 0);
        }
        let magnitude = exponent + digits.len() as i64;
        if magnitude > MAX_DECIMAL_MAGNITUDE {
            return Self::infinity(sign);
        }
        if magnitude <= MIN_DECIMAL_MAGNITUDE {
            return Self::from_parts(sign, 0);
        }

        let mut num = BigUint::from_digits(digits);
        let mut den = BigUint::from_u64(1);
        if exponent >= 0 {
            num.mul_pow10(exponent.unsigned_abs());
        } else {
            den.mul_pow10(exponent.unsigned_abs());
        }

        // Scale so that den <= num < 2 * den; the value is then
        // (num / den) * 2^-scale.
        let mut scale = den.bits() as i64 - num.bits() as i64;
        if scale > 0 {
            num.shl(scale.unsigned_abs());
        } else {
            den.shl(scale.unsigned_abs());
        }
        if num < den {
            num.shl(1);
            scale += 1;
        }

        let mut biased = i64::from(EXPONENT_BIAS) - scale;
        if biased >= i64::from(EXPONENT_MASK) {
            return Self::infinity(sign);
        }
        // Denormals keep fewer significand bits.
        let precision = if biased >= 1 { 64 } else { 63 + biased };
        if precision < 0 {
            return Self::from_parts(sign, 0);
        }

        let mut next_bit = || {
            let bit = num >= den;
            if bit {
                num.sub_assign(&den);
            }
            num.shl(1);
            bit
        };
        let mut significand = 0u64;
        for _ in 0..precision {
            significand = (significand << 1) | u64::from(next_bit());
        }
        let guard = next_bit();
        let sticky = !num.is_zero();

        if guard && (sticky || significand & 1 == 1) {
            let (rounded, carry) = significand.overflowing_add(1);
            significand = rounded;
            if carry {
                significand = INTEGER_BIT;
                biased += 1;
                if biased >= i64::from(EXPONENT_MASK) {
                    return Self::infinity(sign);
                }
            }
        }

        let exponent_field = if biased >= 1 {
            biased as u16
        } else if significand & INTEGER_BIT != 0 {
            // Rounded up into the smallest normal.
            1
        } else {
            0
        };
        Self::from_parts(sign | exponent_field, significand)
    }
}

fn pow2(e: i32) -> f64 {
    f64::from_bits(((e + 1023) as u64) << 52)
}

fn scale_by_pow2(mut x: f64, mut e: i32) -> f64 {
    const STEP: i32 = 1000;
    while e > STEP {
        x *= pow2(STEP);
        e -= STEP;
    }
    while e < -STEP {
        x *= pow2(-STEP);
        e += STEP;
    }
    x * pow2(e)
}

impl From<f64> for Extended {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Extended> for f64 {
    fn from(value: Extended) -> Self {
        value.to_f64()
    }
}

/// `%.20Lg`: shortest of fixed or exponent form, trailing zeros dropped.
impl fmt::Display for Extended {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = String::new();
        format::write_general(&mut text, FormatArg::Extended(*self), DISPLAY_DIGITS)?;
        f.write_str(&text)
    }
}

impl FromStr for Extended {
    type Err = ParseExtendedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = DecimalLiteral::parse(s).ok_or_else(|| ParseExtendedError(s.to_string()))?;
        let sign = if literal.negative { SIGN_BIT } else { 0 };
        Ok(match literal.value {
            LiteralValue::Nan => Self::from_parts(sign | EXPONENT_MASK, INTEGER_BIT | QUIET_BIT),
            LiteralValue::Infinity => Self::infinity(sign),
            LiteralValue::Finite { digits, exponent } => {
                Self::from_decimal(sign, &digits, exponent)
            }
        })
    }
}
