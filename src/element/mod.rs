// Element kinds: the fixed numeric representations a stream can carry.
//
// Each kind fixes a byte width, signedness and parse/format rules. The
// `Element` trait binds a Rust type to its kind so codecs and transforms
// can be written once and monomorphized per kind.
//
// # Modules
//
// - `int24`: packed 3-byte `Int24` / `UInt24`
// - `extended`: x87 80-bit float in a 16-byte slot
// - `decimal`: exact decimal text conversion behind `extended`

pub(crate) mod decimal;
pub mod extended;
pub mod int24;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::codec::format::FormatArg;

pub use extended::{Extended, ParseExtendedError};
pub use int24::{Int24, UInt24};

// ---------------------------------------------------------------------------
// Kinds and encodings
// ---------------------------------------------------------------------------

/// One of the supported fixed-width numeric representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    I8,
    I16,
    I24,
    I32,
    I64,
    U8,
    U16,
    U24,
    U32,
    U64,
    F32,
    F64,
    Extended,
}

impl ElementKind {
    pub const ALL: [ElementKind; 13] = [
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I24,
        Self::U24,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
        Self::F32,
        Self::F64,
        Self::Extended,
    ];

    /// Bytes per value in binary layout.
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I24 | Self::U24 => 3,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::Extended => extended::EXTENDED_WIDTH,
        }
    }

    pub const fn is_signed(self) -> bool {
        !matches!(
            self,
            Self::U8 | Self::U16 | Self::U24 | Self::U32 | Self::U64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64 | Self::Extended)
    }

    /// Single-character tag used on the command line.
    pub const fn tag(self) -> char {
        match self {
            Self::I8 => 'c',
            Self::U8 => 'C',
            Self::I16 => 's',
            Self::U16 => 'S',
            Self::I24 => 'h',
            Self::U24 => 'H',
            Self::I32 => 'i',
            Self::U32 => 'I',
            Self::I64 => 'l',
            Self::U64 => 'L',
            Self::F32 => 'f',
            Self::F64 => 'd',
            Self::Extended => 'e',
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::I8 => "int8",
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I24 => "int24",
            Self::U24 => "uint24",
            Self::I32 => "int32",
            Self::U32 => "uint32",
            Self::I64 => "int64",
            Self::U64 => "uint64",
            Self::F32 => "float32",
            Self::F64 => "float64",
            Self::Extended => "float80",
        }
    }

    /// Print format used by the dumper when the caller supplies none.
    pub const fn default_print_format(self) -> &'static str {
        match self {
            Self::I64 => "%lld",
            Self::U64 => "%llu",
            Self::F32 | Self::F64 => "%g",
            Self::Extended => "%Lg",
            _ if self.is_signed() => "%d",
            _ => "%u",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How values are laid out in a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Fixed-width values in native byte order.
    #[default]
    Binary,
    /// Whitespace-delimited decimal text.
    Ascii,
}

// ---------------------------------------------------------------------------
// Type tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data type '{0}'")]
pub struct UnknownTypeTag(pub String);

/// A parsed command-line type tag: an element kind plus its encoding.
///
/// `a` is extended precision in ASCII; every other tag is binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag {
    kind: ElementKind,
    encoding: Encoding,
}

impl TypeTag {
    /// The `a` tag: extended precision as whitespace-delimited text.
    pub const ASCII_EXTENDED: TypeTag = TypeTag {
        kind: ElementKind::Extended,
        encoding: Encoding::Ascii,
    };

    pub const fn binary(kind: ElementKind) -> Self {
        Self {
            kind,
            encoding: Encoding::Binary,
        }
    }

    pub const fn kind(self) -> ElementKind {
        self.kind
    }

    pub const fn encoding(self) -> Encoding {
        self.encoding
    }
}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "a" {
            return Ok(Self::ASCII_EXTENDED);
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ElementKind::ALL
                .into_iter()
                .find(|k| k.tag() == c)
                .map(Self::binary)
                .ok_or_else(|| UnknownTypeTag(s.to_string())),
            _ => Err(UnknownTypeTag(s.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encoding {
            Encoding::Ascii => f.write_str("a"),
            Encoding::Binary => write!(f, "{}", self.kind.tag()),
        }
    }
}

// ---------------------------------------------------------------------------
// Element trait
// ---------------------------------------------------------------------------

/// A Rust type carrying values of one `ElementKind`.
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    const KIND: ElementKind;
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` native-order bytes.
    fn from_ne_slice(bytes: &[u8]) -> Self;

    /// Encode into exactly `WIDTH` bytes, native order.
    fn write_ne_slice(self, out: &mut [u8]);

    /// Parse one ASCII token. `None` if it is not a valid value of this kind.
    fn parse_token(token: &str) -> Option<Self>;

    /// Convert a pad/fill value. Integers truncate toward zero and saturate,
    /// NaN maps to zero; floats round to nearest.
    fn from_f64_lossy(value: f64) -> Self;

    fn format_arg(self) -> FormatArg;
}

macro_rules! native_element {
    ($($ty:ty => $kind:ident, $arg:ident($wide:ty);)*) => {$(
        impl Element for $ty {
            const KIND: ElementKind = ElementKind::$kind;
            const WIDTH: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn from_ne_slice(bytes: &[u8]) -> Self {
                let mut b = [0u8; std::mem::size_of::<$ty>()];
                b.copy_from_slice(bytes);
                <$ty>::from_ne_bytes(b)
            }

            #[inline]
            fn write_ne_slice(self, out: &mut [u8]) {
                out.copy_from_slice(&self.to_ne_bytes());
            }

            fn parse_token(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn from_f64_lossy(value: f64) -> Self {
                value as $ty
            }

            fn format_arg(self) -> FormatArg {
                FormatArg::$arg(self as $wide)
            }
        }
    )*};
}

native_element! {
    i8 => I8, Signed(i64);
    i16 => I16, Signed(i64);
    i32 => I32, Signed(i64);
    i64 => I64, Signed(i64);
    u8 => U8, Unsigned(u64);
    u16 => U16, Unsigned(u64);
    u32 => U32, Unsigned(u64);
    u64 => U64, Unsigned(u64);
    f32 => F32, Float(f64);
    f64 => F64, Float(f64);
}

impl Element for Int24 {
    const KIND: ElementKind = ElementKind::I24;
    const WIDTH: usize = 3;

    #[inline]
    fn from_ne_slice(bytes: &[u8]) -> Self {
        Int24::from_ne_bytes([bytes[0], bytes[1], bytes[2]])
    }

    #[inline]
    fn write_ne_slice(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_ne_bytes());
    }

    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn from_f64_lossy(value: f64) -> Self {
        Int24::saturating_from_f64(value)
    }

    fn format_arg(self) -> FormatArg {
        FormatArg::Signed(self.into())
    }
}

impl Element for UInt24 {
    const KIND: ElementKind = ElementKind::U24;
    const WIDTH: usize = 3;

    #[inline]
    fn from_ne_slice(bytes: &[u8]) -> Self {
        UInt24::from_ne_bytes([bytes[0], bytes[1], bytes[2]])
    }

    #[inline]
    fn write_ne_slice(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_ne_bytes());
    }

    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn from_f64_lossy(value: f64) -> Self {
        UInt24::saturating_from_f64(value)
    }

    fn format_arg(self) -> FormatArg {
        FormatArg::Unsigned(u32::from(self).into())
    }
}

impl Element for Extended {
    const KIND: ElementKind = ElementKind::Extended;
    const WIDTH: usize = extended::EXTENDED_WIDTH;

    #[inline]
    fn from_ne_slice(bytes: &[u8]) -> Self {
        let mut b = [0u8; extended::EXTENDED_WIDTH];
        b.copy_from_slice(bytes);
        Extended::from_ne_bytes(b)
    }

    #[inline]
    fn write_ne_slice(self, out: &mut [u8]) {
        out.copy_from_slice(&self.to_ne_bytes());
    }

    fn parse_token(token: &str) -> Option<Self> {
        token.parse().ok()
    }

    fn from_f64_lossy(value: f64) -> Self {
        Extended::from_f64(value)
    }

    fn format_arg(self) -> FormatArg {
        FormatArg::Extended(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
