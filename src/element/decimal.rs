// Exact decimal conversion for binary floating-point values.
//
// `Decimal` holds the complete decimal expansion of a finite value
// `m * 2^e`, so rounding it to any number of digits is exact and ties go
// to even, as with C `printf`. `DecimalLiteral` is the parsed form of a
// decimal token, kept as digits so it can be rounded straight to a
// significand of any width.

use std::cmp::Ordering;

/// Largest power of 5 that fits in a limb.
const POW5_STEP: u32 = 13;
const POW5_13: u32 = 1_220_703_125;
const DECIMAL_CHUNK: u32 = 1_000_000_000;

/// Significant digits kept from a literal. Enough to separate any two
/// neighbouring extended values; longer literals keep a sticky digit.
const MAX_LITERAL_DIGITS: usize = 20_000;
const MAX_LITERAL_EXPONENT: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// Natural numbers
// ---------------------------------------------------------------------------

/// Arbitrary-size natural number, little-endian base 2^32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BigUint {
    limbs: Vec<u32>,
}

impl BigUint {
    pub(crate) fn from_u64(v: u64) -> Self {
        let mut n = Self {
            limbs: vec![v as u32, (v >> 32) as u32],
        };
        n.trim();
        n
    }

    /// Parse ASCII decimal digits.
    pub(crate) fn from_digits(digits: &[u8]) -> Self {
        let mut n = Self { limbs: Vec::new() };
        let head = digits.len() % 9;
        let (first, rest) = digits.split_at(head);
        for chunk in std::iter::once(first)
            .filter(|c| !c.is_empty())
            .chain(rest.chunks(9))
        {
            let value = chunk
                .iter()
                .fold(0u32, |acc, &d| acc * 10 + u32::from(d - b'0'));
            n.mul_small(10u32.pow(chunk.len() as u32));
            n.add_small(value);
        }
        n
    }

    fn trim(&mut self) {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
    }

    pub(crate) fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    pub(crate) fn bits(&self) -> u64 {
        match self.limbs.last() {
            None => 0,
            Some(&top) => {
                32 * (self.limbs.len() as u64 - 1) + u64::from(32 - top.leading_zeros())
            }
        }
    }

    fn mul_small(&mut self, m: u32) {
        let mut carry = 0u64;
        for limb in &mut self.limbs {
            let wide = u64::from(*limb) * u64::from(m) + carry;
            *limb = wide as u32;
            carry = wide >> 32;
        }
        if carry != 0 {
            self.limbs.push(carry as u32);
        }
        self.trim();
    }

    fn add_small(&mut self, a: u32) {
        let mut carry = u64::from(a);
        for limb in &mut self.limbs {
            if carry == 0 {
                return;
            }
            let wide = u64::from(*limb) + carry;
            *limb = wide as u32;
            carry = wide >> 32;
        }
        if carry != 0 {
            self.limbs.push(carry as u32);
        }
    }

    pub(crate) fn mul_pow5(&mut self, mut k: u64) {
        while k >= u64::from(POW5_STEP) {
            self.mul_small(POW5_13);
            k -= u64::from(POW5_STEP);
        }
        self.mul_small(5u32.pow(k as u32));
    }

    pub(crate) fn mul_pow10(&mut self, k: u64) {
        self.mul_pow5(k);
        self.shl(k);
    }

    pub(crate) fn shl(&mut self, bits: u64) {
        if self.is_zero() || bits == 0 {
            return;
        }
        let limbs = (bits / 32) as usize;
        let shift = (bits % 32) as u32;
        if shift != 0 {
            let mut carry = 0u32;
            for limb in &mut self.limbs {
                let next = *limb >> (32 - shift);
                *limb = (*limb << shift) | carry;
                carry = next;
            }
            if carry != 0 {
                self.limbs.push(carry);
            }
        }
        self.limbs.splice(0..0, std::iter::repeat_n(0, limbs));
    }

    /// `self -= other`; requires `self >= other`.
    pub(crate) fn sub_assign(&mut self, other: &Self) {
        let mut borrow = false;
        for (i, limb) in self.limbs.iter_mut().enumerate() {
            let rhs = other.limbs.get(i).copied().unwrap_or(0);
            if i >= other.limbs.len() && !borrow {
                break;
            }
            let (d, b1) = limb.overflowing_sub(rhs);
            let (d, b2) = d.overflowing_sub(u32::from(borrow));
            *limb = d;
            borrow = b1 || b2;
        }
        self.trim();
    }

    fn div_small(&mut self, d: u32) -> u32 {
        let mut rem = 0u64;
        for limb in self.limbs.iter_mut().rev() {
            let wide = (rem << 32) | u64::from(*limb);
            *limb = (wide / u64::from(d)) as u32;
            rem = wide % u64::from(d);
        }
        self.trim();
        rem as u32
    }

    /// ASCII decimal digits, most significant first. Empty for zero.
    fn into_digits(mut self) -> Vec<u8> {
        let mut chunks = Vec::new();
        while !self.is_zero() {
            chunks.push(self.div_small(DECIMAL_CHUNK));
        }
        let mut digits = Vec::with_capacity(chunks.len() * 9);
        if let Some((top, rest)) = chunks.split_last() {
            digits.extend(top.to_string().bytes());
            for chunk in rest.iter().rev() {
                digits.extend(format!("{chunk:09}").bytes());
            }
        }
        digits
    }
}

impl PartialOrd for BigUint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BigUint {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

// ---------------------------------------------------------------------------
// Binary to decimal
// ---------------------------------------------------------------------------

/// Exact decimal expansion of a non-negative finite value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Decimal {
    /// ASCII digits with no leading or trailing zeros; empty for zero.
    digits: Vec<u8>,
    /// The value is `0.DIGITS * 10^point`.
    point: i32,
}

impl Decimal {
    /// The value `significand * 2^exp2`.
    pub(crate) fn from_binary(significand: u64, exp2: i32) -> Self {
        if significand == 0 {
            return Self {
                digits: Vec::new(),
                point: 0,
            };
        }
        let zeros = significand.trailing_zeros();
        let exp2 = exp2 + zeros as i32;
        let mut n = BigUint::from_u64(significand >> zeros);

        let scale = if exp2 >= 0 {
            n.shl(exp2 as u64);
            0
        } else {
            // m / 2^k == m * 5^k / 10^k
            n.mul_pow5(u64::from(exp2.unsigned_abs()));
            exp2.unsigned_abs() as i32
        };
        let mut digits = n.into_digits();
        let point = digits.len() as i32 - scale;
        while digits.last() == Some(&b'0') {
            digits.pop();
        }
        Self { digits, point }
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    fn digit_at(&self, i: i32) -> char {
        usize::try_from(i)
            .ok()
            .and_then(|i| self.digits.get(i))
            .map_or('0', |&d| char::from(d))
    }

    /// Round to at most `keep` significant digits, ties to even.
    fn rounded(&self, keep: i32) -> Self {
        let keep = match usize::try_from(keep) {
            Ok(k) if k >= self.digits.len() => return self.clone(),
            Ok(k) => k,
            Err(_) => {
                return Self {
                    digits: Vec::new(),
                    point: 0,
                };
            }
        };
        let round_up = match self.digits[keep] {
            b'6'..=b'9' => true,
            b'5' => {
                self.digits[keep + 1..].iter().any(|&d| d != b'0')
                    || keep.checked_sub(1).is_some_and(|i| (self.digits[i] - b'0') % 2 == 1)
            }
            _ => false,
        };

        let mut digits = self.digits[..keep].to_vec();
        let mut point = self.point;
        if round_up {
            let mut i = keep;
            loop {
                if i == 0 {
                    digits.insert(0, b'1');
                    point += 1;
                    break;
                }
                i -= 1;
                if digits[i] == b'9' {
                    digits[i] = b'0';
                } else {
                    digits[i] += 1;
                    break;
                }
            }
        }
        while digits.last() == Some(&b'0') {
            digits.pop();
        }
        if digits.is_empty() {
            point = 0;
        }
        Self { digits, point }
    }

    /// Same text as Rust's `{:.precision$}` for a non-negative float.
    pub(crate) fn write_fixed(&self, out: &mut String, precision: usize) {
        let r = self.rounded(self.point.saturating_add(precision as i32));
        if r.point <= 0 {
            out.push('0');
        } else {
            out.extend((0..r.point).map(|i| r.digit_at(i)));
        }
        if precision > 0 {
            out.push('.');
            out.extend((0..precision as i32).map(|j| r.digit_at(r.point + j)));
        }
    }

    /// Same text as Rust's `{:.precision$e}` for a non-negative float:
    /// mantissa, `e`, exponent without padding.
    pub(crate) fn write_scientific(&self, out: &mut String, precision: usize) {
        let r = self.rounded(precision as i32 + 1);
        out.push(r.digit_at(0));
        if precision > 0 {
            out.push('.');
            out.extend((1..=precision as i32).map(|i| r.digit_at(i)));
        }
        let exponent = if r.is_zero() { 0 } else { r.point - 1 };
        out.push('e');
        out.push_str(&exponent.to_string());
    }
}

// ---------------------------------------------------------------------------
// Decimal literals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LiteralValue {
    Nan,
    Infinity,
    /// `digits * 10^exponent`; digits carry no leading or trailing zeros
    /// and are empty for zero.
    Finite { digits: Vec<u8>, exponent: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecimalLiteral {
    pub(crate) negative: bool,
    pub(crate) value: LiteralValue,
}

impl DecimalLiteral {
    /// Parse `[+-]` then `inf`, `infinity`, `nan` (any case) or
    /// `digits[.digits][e[+-]digits]`. The whole token must match.
    pub(crate) fn parse(token: &str) -> Option<Self> {
        let (negative, body) = match token.as_bytes().first() {
            Some(b'-') => (true, &token[1..]),
            Some(b'+') => (false, &token[1..]),
            _ => (false, token),
        };

        let value = if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            LiteralValue::Infinity
        } else if body.eq_ignore_ascii_case("nan") {
            LiteralValue::Nan
        } else {
            parse_finite(body.as_bytes())?
        };
        Some(Self { negative, value })
    }
}

fn parse_finite(bytes: &[u8]) -> Option<LiteralValue> {
    let mut digits = Vec::new();
    let mut exponent: i64 = 0;
    let mut seen_digit = false;
    let mut i = 0;

    while let Some(&b) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
        seen_digit = true;
        if b != b'0' || !digits.is_empty() {
            digits.push(b);
        }
        i += 1;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while let Some(&b) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
            seen_digit = true;
            if b != b'0' || !digits.is_empty() {
                digits.push(b);
            }
            exponent -= 1;
            i += 1;
        }
    }
    if !seen_digit {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        i += 1;
        let negative = match bytes.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let start = i;
        let mut e: i64 = 0;
        while let Some(&b) = bytes.get(i).filter(|b| b.is_ascii_digit()) {
            e = (e * 10 + i64::from(b - b'0')).min(MAX_LITERAL_EXPONENT);
            i += 1;
        }
        if i == start {
            return None;
        }
        exponent += if negative { -e } else { e };
    }
    if i != bytes.len() {
        return None;
    }

    if digits.len() > MAX_LITERAL_DIGITS {
        let dropped = digits.len() - MAX_LITERAL_DIGITS;
        let sticky = digits[MAX_LITERAL_DIGITS..].iter().any(|&d| d != b'0');
        digits.truncate(MAX_LITERAL_DIGITS);
        exponent += dropped as i64;
        if sticky {
            digits.push(b'1');
            exponent -= 1;
        }
    }
    while digits.last() == Some(&b'0') {
        digits.pop();
        exponent += 1;
    }
    if digits.is_empty() {
        exponent = 0;
    }
    Some(LiteralValue::Finite { digits, exponent })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expansion(significand: u64, exp2: i32) -> String {
        let d = Decimal::from_binary(significand, exp2);
        let mut s = String::from_utf8(d.digits.clone()).unwrap();
        s.push_str(&format!("@{}", d.point));
        s
    }

    #[test]
    fn bignum_arithmetic() {
        let mut n = BigUint::from_digits(b"123456789012345678901234567890");
        assert_eq!(n.clone().into_digits(), b"123456789012345678901234567890");
        n.mul_pow10(5);
        assert_eq!(n.clone().into_digits(), b"12345678901234567890123456789000000");
        let small = BigUint::from_u64(1);
        let mut m = n.clone();
        m.sub_assign(&small);
        assert_eq!(m.into_digits(), b"12345678901234567890123456788999999");
        assert!(small < n);
        assert_eq!(BigUint::from_u64(u64::MAX).bits(), 64);
        assert!(BigUint::from_digits(b"000").is_zero());
    }

    #[test]
    fn exact_expansions() {
        assert_eq!(expansion(0, 0), "@0");
        assert_eq!(expansion(1, 0), "1@1");
        assert_eq!(expansion(3, -3), "375@0");
        assert_eq!(expansion(1, 10), "1024@4");
        assert_eq!(expansion(5, -10), "48828125@-2");
    }

    #[test]
    fn fixed_rounding_matches_rust() {
        for (v, p) in [
            (2.375, 2),
            (0.5, 0),
            (1.5, 0),
            (2.5, 0),
            (0.001, 2),
            (999.9996, 3),
            (0.0, 3),
        ] {
            let bits = f64::to_bits(v);
            let (m, e) = if v == 0.0 {
                (0, 0)
            } else {
                ((bits & ((1 << 52) - 1)) | (1 << 52), ((bits >> 52) as i32) - 1075)
            };
            let mut s = String::new();
            Decimal::from_binary(m, e).write_fixed(&mut s, p);
            assert_eq!(s, format!("{v:.p$}"), "{v} at {p}");

            let mut s = String::new();
            Decimal::from_binary(m, e).write_scientific(&mut s, p);
            assert_eq!(s, format!("{v:.p$e}"), "{v} at {p}");
        }
    }

    #[test]
    fn literals() {
        let lit = DecimalLiteral::parse("-0012.3400e+3").unwrap();
        assert!(lit.negative);
        assert_eq!(
            lit.value,
            LiteralValue::Finite {
                digits: b"1234".to_vec(),
                exponent: 1
            }
        );
        assert_eq!(
            DecimalLiteral::parse(".5").unwrap().value,
            LiteralValue::Finite {
                digits: b"5".to_vec(),
                exponent: -1
            }
        );
        assert_eq!(
            DecimalLiteral::parse("0.000").unwrap().value,
            LiteralValue::Finite {
                digits: Vec::new(),
                exponent: 0
            }
        );
        assert_eq!(DecimalLiteral::parse("INF").unwrap().value, LiteralValue::Infinity);
        assert_eq!(DecimalLiteral::parse("-nan").unwrap().value, LiteralValue::Nan);
        for bad in ["", "-", ".", "e5", "1e", "1e+", "1.2.3", "0x10", "1 ", "infinit"] {
            assert!(DecimalLiteral::parse(bad).is_none(), "{bad:?}");
        }
    }

    #[test]
    fn long_literal_keeps_sticky_digit() {
        let mut text = String::from("1");
        text.extend(std::iter::repeat_n('0', MAX_LITERAL_DIGITS + 10));
        text.push('7');
        let LiteralValue::Finite { digits, exponent } = DecimalLiteral::parse(&text).unwrap().value
        else {
            panic!("not finite");
        };
        assert_eq!(digits.len(), MAX_LITERAL_DIGITS + 1);
        assert_eq!(digits.last(), Some(&b'1'));
        assert_eq!(exponent, 11);
    }
}
