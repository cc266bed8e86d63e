// Packed 24-bit integers.
//
// `Int24` and `UInt24` hold a value inside the 24-bit range and occupy
// exactly three bytes on the wire, in native byte order. Conversions from
// wider types come in three explicit flavours:
//
//   - checked    (`TryFrom`, `new`): out-of-range is an error
//   - wrapping   (`wrapping_from_*`): keep the low 24 bits
//   - saturating (`saturating_from_*`): clamp to MIN/MAX
//
// Float conversion truncates toward zero and saturates; NaN maps to zero.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a value does not fit a 24-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value {value} is outside the 24-bit range [{min}, {max}]")]
pub struct OutOfRange {
    pub value: i64,
    pub min: i64,
    pub max: i64,
}

/// Error returned by `FromStr` for the 24-bit types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseInt24Error {
    #[error("invalid integer: {0}")]
    Invalid(#[from] std::num::ParseIntError),
    #[error(transparent)]
    OutOfRange(#[from] OutOfRange),
}

#[inline]
fn pack_ne(bits: u32) -> [u8; 3] {
    let le = bits.to_le_bytes();
    if cfg!(target_endian = "little") {
        [le[0], le[1], le[2]]
    } else {
        [le[2], le[1], le[0]]
    }
}

#[inline]
fn unpack_ne(bytes: [u8; 3]) -> u32 {
    let [a, b, c] = bytes;
    if cfg!(target_endian = "little") {
        u32::from_le_bytes([a, b, c, 0])
    } else {
        u32::from_le_bytes([c, b, a, 0])
    }
}

// ---------------------------------------------------------------------------
// Int24
// ---------------------------------------------------------------------------

/// Signed 24-bit integer, range `[-8_388_608, 8_388_607]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int24(i32);

impl Int24 {
    pub const MIN: Int24 = Int24(-(1 << 23));
    pub const MAX: Int24 = Int24((1 << 23) - 1);
    pub const ZERO: Int24 = Int24(0);

    /// Checked construction.
    pub const fn new(value: i32) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Keep the low 24 bits of `value` and sign-extend bit 23.
    pub const fn wrapping_from_i32(value: i32) -> Self {
        Self((value << 8) >> 8)
    }

    pub const fn saturating_from_i64(value: i64) -> Self {
        if value < Self::MIN.0 as i64 {
            Self::MIN
        } else if value > Self::MAX.0 as i64 {
            Self::MAX
        } else {
            Self(value as i32)
        }
    }

    /// Truncate toward zero, then saturate. NaN becomes zero.
    pub fn saturating_from_f64(value: f64) -> Self {
        Self::saturating_from_i64(value as i64)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub fn to_ne_bytes(self) -> [u8; 3] {
        pack_ne(self.0 as u32)
    }

    pub fn from_ne_bytes(bytes: [u8; 3]) -> Self {
        Self::wrapping_from_i32(unpack_ne(bytes) as i32)
    }
}

impl TryFrom<i32> for Int24 {
    type Error = OutOfRange;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange {
            value: value.into(),
            min: Self::MIN.0.into(),
            max: Self::MAX.0.into(),
        })
    }
}

impl TryFrom<i64> for Int24 {
    type Error = OutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i32::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(OutOfRange {
                value,
                min: Self::MIN.0.into(),
                max: Self::MAX.0.into(),
            })
    }
}

impl From<i16> for Int24 {
    fn from(value: i16) -> Self {
        Self(value.into())
    }
}

impl From<Int24> for i32 {
    fn from(value: Int24) -> Self {
        value.0
    }
}

impl From<Int24> for i64 {
    fn from(value: Int24) -> Self {
        value.0.into()
    }
}

impl From<Int24> for f64 {
    fn from(value: Int24) -> Self {
        value.0.into()
    }
}

impl fmt::Display for Int24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Int24 {
    type Err = ParseInt24Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wide: i64 = s.parse()?;
        Ok(Self::try_from(wide)?)
    }
}

// ---------------------------------------------------------------------------
// UInt24
// ---------------------------------------------------------------------------

/// Unsigned 24-bit integer, range `[0, 16_777_215]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UInt24(u32);

impl UInt24 {
    pub const MIN: UInt24 = UInt24(0);
    pub const MAX: UInt24 = UInt24((1 << 24) - 1);
    pub const ZERO: UInt24 = UInt24(0);

    pub const fn new(value: u32) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Keep the low 24 bits of `value`.
    pub const fn wrapping_from_u32(value: u32) -> Self {
        Self(value & Self::MAX.0)
    }

    pub const fn saturating_from_i64(value: i64) -> Self {
        if value < 0 {
            Self::MIN
        } else if value > Self::MAX.0 as i64 {
            Self::MAX
        } else {
            Self(value as u32)
        }
    }

    /// Truncate toward zero, then saturate. NaN becomes zero.
    pub fn saturating_from_f64(value: f64) -> Self {
        Self::saturating_from_i64(value as i64)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub fn to_ne_bytes(self) -> [u8; 3] {
        pack_ne(self.0)
    }

    pub fn from_ne_bytes(bytes: [u8; 3]) -> Self {
        Self(unpack_ne(bytes))
    }
}

impl TryFrom<u32> for UInt24 {
    type Error = OutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange {
            value: value.into(),
            min: 0,
            max: Self::MAX.0.into(),
        })
    }
}

impl TryFrom<i64> for UInt24 {
    type Error = OutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(OutOfRange {
                value,
                min: 0,
                max: Self::MAX.0.into(),
            })
    }
}

impl From<u16> for UInt24 {
    fn from(value: u16) -> Self {
        Self(value.into())
    }
}

impl From<UInt24> for u32 {
    fn from(value: UInt24) -> Self {
        value.0
    }
}

impl From<UInt24> for i64 {
    fn from(value: UInt24) -> Self {
        value.0.into()
    }
}

impl From<UInt24> for f64 {
    fn from(value: UInt24) -> Self {
        value.0.into()
    }
}

impl fmt::Display for UInt24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UInt24 {
    type Err = ParseInt24Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wide: i64 = s.parse()?;
        Ok(Self::try_from(wide)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
