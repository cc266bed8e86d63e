// Printf-style value formatting for dump output.
//
// A pattern holds literal text and exactly one conversion:
//
//   %[flags][width][.precision][length]conversion
//
//   flags       - + space # 0
//   length      hh h l ll L q j z t
//   conversion  d i u o x X f F e E g G
//
// Length modifiers select the integer width the argument is truncated to
// before printing (none = 32-bit, `hh` = 8, `h` = 16, `l`/`ll`/... = 64).
// They are accepted and ignored for floating conversions. Extended
// arguments are rendered from their exact decimal expansion, every other
// float through `f64`.
//
// Rendering goes into a bounded `FormatBuffer`; output that does not fit
// (including room for a terminator, as with `snprintf`) is an error.

use std::fmt::{self, Write};

use bitflags::bitflags;
use thiserror::Error;

use crate::element::Extended;
use crate::element::decimal::Decimal;

/// Scratch capacity used by the dumper.
pub const DEFAULT_BUFFER_SIZE: usize = 128;

/// Largest width or precision accepted in a pattern.
const MAX_FIELD: usize = 4096;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A pattern that cannot be used at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatSyntaxError {
    #[error("print format '{0}' has no conversion")]
    NoConversion(String),
    #[error("print format '{0}' has more than one conversion")]
    MultipleConversions(String),
    #[error("print format '{0}' ends inside a conversion")]
    Incomplete(String),
    #[error("unsupported conversion '%{1}' in print format '{0}'")]
    UnsupportedConversion(String, char),
    #[error("field width or precision in '{0}' exceeds 4096")]
    FieldTooLarge(String),
}

/// A value that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("formatted value needs {needed} bytes, buffer holds {capacity}")]
    Overflow { needed: usize, capacity: usize },
    #[error("formatter error")]
    Write(#[from] fmt::Error),
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// A value widened for formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatArg {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Extended(Extended),
}

impl FormatArg {
    fn as_i64(self) -> i64 {
        match self {
            Self::Signed(v) => v,
            Self::Unsigned(v) => v as i64,
            Self::Float(v) => v as i64,
            Self::Extended(v) => v.to_f64() as i64,
        }
    }

    fn as_u64(self) -> u64 {
        match self {
            Self::Signed(v) => v as u64,
            Self::Unsigned(v) => v,
            Self::Float(_) | Self::Extended(_) => {
                let v = self.as_f64();
                if v < 0.0 { (v as i64) as u64 } else { v as u64 }
            }
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Signed(v) => v as f64,
            Self::Unsigned(v) => v as f64,
            Self::Float(v) => v,
            Self::Extended(v) => v.to_f64(),
        }
    }

    /// Sign and magnitude of a floating conversion argument.
    fn float_parts(self) -> (bool, FloatValue) {
        match self {
            Self::Extended(v) => {
                let value = match v.decimal_magnitude() {
                    Some(exact) => FloatValue::Finite(Magnitude::Exact(exact)),
                    None if v.is_nan() => FloatValue::Nan,
                    None => FloatValue::Infinite,
                };
                (v.is_sign_negative(), value)
            }
            other => {
                let v = other.as_f64();
                let value = if v.is_nan() {
                    FloatValue::Nan
                } else if v.is_infinite() {
                    FloatValue::Infinite
                } else {
                    FloatValue::Finite(Magnitude::Double(v.abs()))
                };
                (v.is_sign_negative(), value)
            }
        }
    }
}

enum FloatValue {
    Nan,
    Infinite,
    Finite(Magnitude),
}

/// A non-negative finite float and the digit source used to print it.
enum Magnitude {
    Double(f64),
    Exact(Decimal),
}

impl Magnitude {
    /// Rust `{:.precision$}` text.
    fn write_fixed(&self, out: &mut String, precision: usize) -> fmt::Result {
        match self {
            Self::Double(v) => write!(out, "{v:.precision$}"),
            Self::Exact(d) => {
                d.write_fixed(out, precision);
                Ok(())
            }
        }
    }

    /// Rust `{:.precision$e}` text.
    fn write_scientific(&self, out: &mut String, precision: usize) -> fmt::Result {
        match self {
            Self::Double(v) => write!(out, "{v:.precision$e}"),
            Self::Exact(d) => {
                d.write_scientific(out, precision);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed pattern
// ---------------------------------------------------------------------------

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FormatFlags: u8 {
        const LEFT = 1 << 0;
        const PLUS = 1 << 1;
        const SPACE = 1 << 2;
        const ALTERNATE = 1 << 3;
        const ZERO = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntWidth {
    Char,
    Short,
    Int,
    Long,
}

impl IntWidth {
    fn truncate_signed(self, v: i64) -> i64 {
        match self {
            Self::Char => i64::from(v as i8),
            Self::Short => i64::from(v as i16),
            Self::Int => i64::from(v as i32),
            Self::Long => v,
        }
    }

    fn truncate_unsigned(self, v: u64) -> u64 {
        match self {
            Self::Char => v & 0xFF,
            Self::Short => v & 0xFFFF,
            Self::Int => v & 0xFFFF_FFFF,
            Self::Long => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Signed,
    Unsigned,
    Octal,
    Hex { upper: bool },
    Fixed { upper: bool },
    Exponent { upper: bool },
    General { upper: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConversionSpec {
    flags: FormatFlags,
    width: usize,
    precision: Option<usize>,
    length: IntWidth,
    conversion: Conversion,
}

/// A validated print pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintFormat {
    pattern: String,
    prefix: String,
    spec: ConversionSpec,
    suffix: String,
}

impl PrintFormat {
    pub fn parse(pattern: &str) -> Result<Self, FormatSyntaxError> {
        let bytes = pattern.as_bytes();
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut spec = None;
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'%' {
                i += 1;
                continue;
            }
            let target = if spec.is_none() {
                &mut prefix
            } else {
                &mut suffix
            };
            target.push_str(&pattern[literal_start..i]);

            if bytes.get(i + 1) == Some(&b'%') {
                target.push('%');
                i += 2;
                literal_start = i;
                continue;
            }
            if spec.is_some() {
                return Err(FormatSyntaxError::MultipleConversions(pattern.into()));
            }
            let (parsed, next) = parse_spec(pattern, i + 1)?;
            spec = Some(parsed);
            i = next;
            literal_start = i;
        }

        let Some(spec) = spec else {
            return Err(FormatSyntaxError::NoConversion(pattern.into()));
        };
        suffix.push_str(&pattern[literal_start..]);

        Ok(Self {
            pattern: pattern.to_string(),
            prefix,
            spec,
            suffix,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Render `arg` into `buf`, returning the text.
    pub fn render<'b>(
        &self,
        arg: FormatArg,
        buf: &'b mut FormatBuffer,
    ) -> Result<&'b str, FormatError> {
        buf.text.clear();
        buf.text.push_str(&self.prefix);
        self.spec.render(arg, &mut buf.text, &mut buf.scratch)?;
        buf.text.push_str(&self.suffix);

        // Reserve one byte for the terminator, like snprintf.
        if buf.text.len() >= buf.capacity {
            return Err(FormatError::Overflow {
                needed: buf.text.len() + 1,
                capacity: buf.capacity,
            });
        }
        Ok(&buf.text)
    }
}

impl ConversionSpec {
    fn render(&self, arg: FormatArg, out: &mut String, body: &mut String) -> fmt::Result {
        let flags = self.flags;
        body.clear();

        let mut sign = "";
        let mut radix_prefix = "";
        let mut zero_fill = self.precision.is_none();

        match self.conversion {
            Conversion::Signed => {
                let v = self.length.truncate_signed(arg.as_i64());
                sign = sign_for(v < 0, flags);
                push_digits(body, v.unsigned_abs(), 10, false, self.precision)?;
            }
            Conversion::Unsigned => {
                let v = self.length.truncate_unsigned(arg.as_u64());
                push_digits(body, v, 10, false, self.precision)?;
            }
            Conversion::Octal => {
                let v = self.length.truncate_unsigned(arg.as_u64());
                push_digits(body, v, 8, false, self.precision)?;
                if flags.contains(FormatFlags::ALTERNATE) && !body.starts_with('0') {
                    body.insert(0, '0');
                }
            }
            Conversion::Hex { upper } => {
                let v = self.length.truncate_unsigned(arg.as_u64());
                push_digits(body, v, 16, upper, self.precision)?;
                if flags.contains(FormatFlags::ALTERNATE) && v != 0 {
                    radix_prefix = if upper { "0X" } else { "0x" };
                }
            }
            Conversion::Fixed { upper }
            | Conversion::Exponent { upper }
            | Conversion::General { upper } => {
                let (negative, value) = arg.float_parts();
                sign = sign_for(negative, flags);
                zero_fill = matches!(value, FloatValue::Finite(_));
                match value {
                    FloatValue::Nan => body.push_str(if upper { "NAN" } else { "nan" }),
                    FloatValue::Infinite => body.push_str(if upper { "INF" } else { "inf" }),
                    FloatValue::Finite(magnitude) => self.push_float(body, &magnitude)?,
                }
            }
        }

        let len = sign.len() + radix_prefix.len() + body.len();
        let fill = self.width.saturating_sub(len);

        if flags.contains(FormatFlags::LEFT) {
            out.push_str(sign);
            out.push_str(radix_prefix);
            out.push_str(body);
            out.extend(std::iter::repeat_n(' ', fill));
        } else if flags.contains(FormatFlags::ZERO) && zero_fill {
            out.push_str(sign);
            out.push_str(radix_prefix);
            out.extend(std::iter::repeat_n('0', fill));
            out.push_str(body);
        } else {
            out.extend(std::iter::repeat_n(' ', fill));
            out.push_str(sign);
            out.push_str(radix_prefix);
            out.push_str(body);
        }
        Ok(())
    }

    fn push_float(&self, body: &mut String, magnitude: &Magnitude) -> fmt::Result {
        let alternate = self.flags.contains(FormatFlags::ALTERNATE);
        let precision = self.precision.unwrap_or(6);

        match self.conversion {
            Conversion::Fixed { .. } => {
                magnitude.write_fixed(body, precision)?;
                if alternate && precision == 0 {
                    body.push('.');
                }
            }
            Conversion::Exponent { upper } => {
                push_exponent(body, magnitude, precision, upper, alternate)?;
            }
            Conversion::General { upper } => {
                let p = precision.max(1);
                let digits = p - 1;
                magnitude.write_scientific(body, digits)?;
                let x = decimal_exponent(body);
                body.clear();

                if x < p as i32 && x >= -4 {
                    let fixed_precision = (p as i32 - 1 - x) as usize;
                    magnitude.write_fixed(body, fixed_precision)?;
                    if !alternate {
                        strip_fraction_zeros(body, body.len());
                    }
                } else {
                    push_exponent(body, magnitude, p - 1, upper, alternate)?;
                    if !alternate {
                        let mantissa_end = body.find(['e', 'E']).unwrap_or(body.len());
                        strip_fraction_zeros(body, mantissa_end);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Render `arg` as `%.{precision}g` into `out`, with no length bound.
pub(crate) fn write_general(out: &mut String, arg: FormatArg, precision: usize) -> fmt::Result {
    let spec = ConversionSpec {
        flags: FormatFlags::empty(),
        width: 0,
        precision: Some(precision),
        length: IntWidth::Long,
        conversion: Conversion::General { upper: false },
    };
    spec.render(arg, out, &mut String::new())
}

impl std::fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl std::str::FromStr for PrintFormat {
    type Err = FormatSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_spec(pattern: &str, mut i: usize) -> Result<(ConversionSpec, usize), FormatSyntaxError> {
    let bytes = pattern.as_bytes();
    let incomplete = || FormatSyntaxError::Incomplete(pattern.into());

    let mut flags = FormatFlags::empty();
    while let Some(&b) = bytes.get(i) {
        let flag = match b {
            b'-' => FormatFlags::LEFT,
            b'+' => FormatFlags::PLUS,
            b' ' => FormatFlags::SPACE,
            b'#' => FormatFlags::ALTERNATE,
            b'0' => FormatFlags::ZERO,
            _ => break,
        };
        flags |= flag;
        i += 1;
    }

    let (width, next) = parse_number(pattern, i)?;
    i = next;

    let precision = if bytes.get(i) == Some(&b'.') {
        let (p, next) = parse_number(pattern, i + 1)?;
        i = next;
        Some(p.unwrap_or(0))
    } else {
        None
    };

    let length = match (bytes.get(i), bytes.get(i + 1)) {
        (Some(b'h'), Some(b'h')) => {
            i += 2;
            IntWidth::Char
        }
        (Some(b'h'), _) => {
            i += 1;
            IntWidth::Short
        }
        (Some(b'l'), Some(b'l')) => {
            i += 2;
            IntWidth::Long
        }
        (Some(b'l' | b'L' | b'q' | b'j' | b'z' | b't'), _) => {
            i += 1;
            IntWidth::Long
        }
        _ => IntWidth::Int,
    };

    let c = pattern[i..].chars().next().ok_or_else(incomplete)?;
    let conversion = match c {
        'd' | 'i' => Conversion::Signed,
        'u' => Conversion::Unsigned,
        'o' => Conversion::Octal,
        'x' => Conversion::Hex { upper: false },
        'X' => Conversion::Hex { upper: true },
        'f' => Conversion::Fixed { upper: false },
        'F' => Conversion::Fixed { upper: true },
        'e' => Conversion::Exponent { upper: false },
        'E' => Conversion::Exponent { upper: true },
        'g' => Conversion::General { upper: false },
        'G' => Conversion::General { upper: true },
        other => {
            return Err(FormatSyntaxError::UnsupportedConversion(
                pattern.into(),
                other,
            ));
        }
    };

    let spec = ConversionSpec {
        flags,
        width: width.unwrap_or(0),
        precision,
        length,
        conversion,
    };
    Ok((spec, i + c.len_utf8()))
}

fn parse_number(pattern: &str, start: usize) -> Result<(Option<usize>, usize), FormatSyntaxError> {
    let digits = pattern[start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return Ok((None, start));
    }
    let end = start + digits;
    match pattern[start..end].parse::<usize>() {
        Ok(n) if n <= MAX_FIELD => Ok((Some(n), end)),
        _ => Err(FormatSyntaxError::FieldTooLarge(pattern.into())),
    }
}

fn sign_for(negative: bool, flags: FormatFlags) -> &'static str {
    if negative {
        "-"
    } else if flags.contains(FormatFlags::PLUS) {
        "+"
    } else if flags.contains(FormatFlags::SPACE) {
        " "
    } else {
        ""
    }
}

fn push_digits(
    body: &mut String,
    v: u64,
    radix: u32,
    upper: bool,
    precision: Option<usize>,
) -> fmt::Result {
    let start = body.len();
    if !(v == 0 && precision == Some(0)) {
        match (radix, upper) {
            (8, _) => write!(body, "{v:o}")?,
            (16, true) => write!(body, "{v:X}")?,
            (16, false) => write!(body, "{v:x}")?,
            _ => write!(body, "{v}")?,
        }
    }
    let written = body.len() - start;
    if let Some(p) = precision {
        for _ in written..p {
            body.insert(start, '0');
        }
    }
    Ok(())
}

/// C-style exponent: mantissa, `e`, sign, at least two exponent digits.
fn push_exponent(
    body: &mut String,
    magnitude: &Magnitude,
    precision: usize,
    upper: bool,
    alternate: bool,
) -> fmt::Result {
    let start = body.len();
    magnitude.write_scientific(body, precision)?;
    let exponent = decimal_exponent(&body[start..]);
    let mantissa_end = body[start..]
        .find('e')
        .map_or(body.len(), |pos| start + pos);
    body.truncate(mantissa_end);
    if alternate && precision == 0 {
        body.push('.');
    }
    body.push(if upper { 'E' } else { 'e' });
    body.push(if exponent < 0 { '-' } else { '+' });
    write!(body, "{:02}", exponent.unsigned_abs())
}

/// Exponent of a Rust `{:e}` rendering.
fn decimal_exponent(text: &str) -> i32 {
    text.rsplit_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0)
}

/// Drop trailing fractional zeros (and a bare '.') from `body[..end]`.
fn strip_fraction_zeros(body: &mut String, end: usize) {
    let mantissa = &body[..end];
    if mantissa.contains('.') {
        let keep = mantissa.trim_end_matches('0').trim_end_matches('.').len();
        body.replace_range(keep..end, "");
    }
}

// ---------------------------------------------------------------------------
// Scratch buffer
// ---------------------------------------------------------------------------

/// Bounded, reusable rendering buffer.
#[derive(Debug, Clone)]
pub struct FormatBuffer {
    text: String,
    scratch: String,
    capacity: usize,
}

impl FormatBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            scratch: String::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FormatBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
