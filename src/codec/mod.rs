// Element codec: typed values to and from byte streams.
//
// Binary streams are concatenated fixed-width values in native byte order,
// with no header or framing. ASCII streams are whitespace-delimited
// decimal tokens.
//
// Reads distinguish a clean end of stream (no byte of the next value was
// available) from truncation (some but not all bytes were). Whole blocks
// are read with one call into a reused byte buffer, so the steady state
// performs no per-element allocation.
//
// # Modules
//
// - `format`: printf-style `PrintFormat` and the bounded `FormatBuffer`

pub mod format;

use std::io::{self, BufRead, Read, Write};

use thiserror::Error;

use crate::element::{Element, ElementKind, Encoding};
use format::{FormatBuffer, FormatError, PrintFormat};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("truncated value: expected {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },
    #[error("cannot parse '{token}' as {kind}")]
    InvalidToken { token: String, kind: ElementKind },
    #[error("input token is not valid UTF-8")]
    InvalidUtf8,
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl CodecError {
    /// A read that stopped mid-value, or a failed read/write.
    pub fn is_stream_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Truncated { .. })
    }

    /// An unparseable token or an unrenderable value.
    pub fn is_format_error(&self) -> bool {
        !self.is_stream_error()
    }
}

/// Read until `buf` is full or the stream ends. Returns the bytes read.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Whitespace as understood by C `isspace`.
#[inline]
fn is_space(b: u8) -> bool {
    b.is_ascii_whitespace() || b == 0x0B
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Reads typed values from a byte stream.
pub struct ElementReader<R> {
    inner: R,
    encoding: Encoding,
    /// Raw block bytes (binary) or the current token (ASCII).
    bytes: Vec<u8>,
}

impl<R: BufRead> ElementReader<R> {
    pub fn new(inner: R, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            bytes: Vec::new(),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read one value. `Ok(None)` at a clean end of stream.
    pub fn read<T: Element>(&mut self) -> Result<Option<T>, CodecError> {
        match self.encoding {
            Encoding::Binary => {
                let mut raw = [0u8; 16];
                let raw = &mut raw[..T::WIDTH];
                match read_full(&mut self.inner, raw)? {
                    0 => Ok(None),
                    n if n == T::WIDTH => Ok(Some(T::from_ne_slice(raw))),
                    got => Err(CodecError::Truncated {
                        expected: T::WIDTH,
                        got,
                    }),
                }
            }
            Encoding::Ascii => match self.next_token()? {
                None => Ok(None),
                Some(token) => parse_token(token).map(Some),
            },
        }
    }

    /// Fill `block` completely.
    ///
    /// Returns `Ok(false)` when the stream ends before the block is full;
    /// the partial block is discarded. A binary stream ending inside a
    /// value is a `Truncated` error.
    pub fn read_block<T: Element>(&mut self, block: &mut [T]) -> Result<bool, CodecError> {
        match self.encoding {
            Encoding::Binary => {
                let total = block.len() * T::WIDTH;
                self.bytes.resize(total, 0);
                let n = read_full(&mut self.inner, &mut self.bytes)?;
                if n < total {
                    let tail = n % T::WIDTH;
                    if tail != 0 {
                        return Err(CodecError::Truncated {
                            expected: T::WIDTH,
                            got: tail,
                        });
                    }
                    return Ok(false);
                }
                for (slot, raw) in block.iter_mut().zip(self.bytes.chunks_exact(T::WIDTH)) {
                    *slot = T::from_ne_slice(raw);
                }
                Ok(true)
            }
            Encoding::Ascii => {
                for slot in block.iter_mut() {
                    match self.next_token()? {
                        None => return Ok(false),
                        Some(token) => *slot = parse_token(token)?,
                    }
                }
                Ok(true)
            }
        }
    }

    /// Next whitespace-delimited token, `None` at end of stream.
    fn next_token(&mut self) -> Result<Option<&str>, CodecError> {
        self.bytes.clear();
        loop {
            let available = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if available.is_empty() {
                break;
            }

            let mut used = 0;
            let mut complete = false;
            for &b in available {
                if is_space(b) {
                    if !self.bytes.is_empty() {
                        complete = true;
                        break;
                    }
                } else {
                    self.bytes.push(b);
                }
                used += 1;
            }
            self.inner.consume(used);
            if complete {
                break;
            }
        }

        if self.bytes.is_empty() {
            return Ok(None);
        }
        std::str::from_utf8(&self.bytes)
            .map(Some)
            .map_err(|_| CodecError::InvalidUtf8)
    }
}

fn parse_token<T: Element>(token: &str) -> Result<T, CodecError> {
    T::parse_token(token).ok_or_else(|| CodecError::InvalidToken {
        token: token.to_string(),
        kind: T::KIND,
    })
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Writes typed values to a byte stream.
///
/// In ASCII mode values of one record are separated by a single space and
/// `end_record` terminates the line. In binary mode records are implicit.
pub struct ElementWriter<W> {
    inner: W,
    encoding: Encoding,
    bytes: Vec<u8>,
    line_open: bool,
}

impl<W: Write> ElementWriter<W> {
    pub fn new(inner: W, encoding: Encoding) -> Self {
        Self {
            inner,
            encoding,
            bytes: Vec::new(),
            line_open: false,
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write<T: Element>(&mut self, value: T) -> Result<(), CodecError> {
        self.write_slice(std::slice::from_ref(&value))
    }

    pub fn write_slice<T: Element>(&mut self, values: &[T]) -> Result<(), CodecError> {
        if values.is_empty() {
            return Ok(());
        }
        match self.encoding {
            Encoding::Binary => {
                self.bytes.resize(values.len() * T::WIDTH, 0);
                for (v, raw) in values.iter().zip(self.bytes.chunks_exact_mut(T::WIDTH)) {
                    v.write_ne_slice(raw);
                }
                self.inner.write_all(&self.bytes)?;
            }
            Encoding::Ascii => {
                for v in values {
                    if self.line_open {
                        self.inner.write_all(b" ")?;
                    }
                    write!(self.inner, "{v}")?;
                    self.line_open = true;
                }
            }
        }
        Ok(())
    }

    /// Terminate the current ASCII line. No-op for binary streams.
    pub fn end_record(&mut self) -> Result<(), CodecError> {
        if self.encoding == Encoding::Ascii && self.line_open {
            self.inner.write_all(b"\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    /// Write `<index>\t<formatted value>\n`.
    pub fn write_dump_line<T: Element>(
        &mut self,
        index: i64,
        value: T,
        format: &PrintFormat,
        buf: &mut FormatBuffer,
    ) -> Result<(), CodecError> {
        let text = format.render(value.format_arg(), buf)?;
        writeln!(self.inner, "{index}\t{text}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CodecError> {
        self.end_record()?;
        self.inner.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Extended, Int24, UInt24};
    use std::io::Cursor;

    fn binary_roundtrip<T: Element>(values: &[T]) {
        let mut w = ElementWriter::new(Vec::new(), Encoding::Binary);
        w.write_slice(values).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes.len(), values.len() * T::WIDTH);

        let mut r = ElementReader::new(Cursor::new(&bytes), Encoding::Binary);
        for v in values {
            assert_eq!(r.read::<T>().unwrap(), Some(*v));
        }
        assert_eq!(r.read::<T>().unwrap(), None);
    }

    #[test]
    fn binary_roundtrip_every_kind() {
        binary_roundtrip(&[i8::MIN, -1, 0, i8::MAX]);
        binary_roundtrip(&[u8::MIN, 1, u8::MAX]);
        binary_roundtrip(&[i16::MIN, 0, i16::MAX]);
        binary_roundtrip(&[u16::MIN, u16::MAX]);
        binary_roundtrip(&[Int24::MIN, Int24::ZERO, Int24::MAX]);
        binary_roundtrip(&[UInt24::MIN, UInt24::MAX]);
        binary_roundtrip(&[i32::MIN, i32::MAX]);
        binary_roundtrip(&[u32::MIN, u32::MAX]);
        binary_roundtrip(&[i64::MIN, i64::MAX]);
        binary_roundtrip(&[u64::MIN, u64::MAX]);
        binary_roundtrip(&[f32::MIN, -0.0, 1.5, f32::MAX]);
        binary_roundtrip(&[f64::MIN, 1e-300, f64::MAX]);
        binary_roundtrip(&[Extended::from_f64(-3.25), Extended::ZERO]);
    }

    #[test]
    fn native_byte_order() {
        let mut w = ElementWriter::new(Vec::new(), Encoding::Binary);
        w.write(0x0102_0304u32).unwrap();
        assert_eq!(w.into_inner(), 0x0102_0304u32.to_ne_bytes());
    }

    #[test]
    fn truncated_value_is_an_error() {
        let mut r = ElementReader::new(Cursor::new(vec![1u8, 2, 3, 4, 5]), Encoding::Binary);
        assert_eq!(r.read::<u32>().unwrap(), Some(u32::from_ne_bytes([1, 2, 3, 4])));
        let err = r.read::<u32>().unwrap_err();
        assert!(matches!(err, CodecError::Truncated { expected: 4, got: 1 }));
        assert!(err.is_stream_error());
    }

    #[test]
    fn block_reads() {
        let data: Vec<u8> = [1i16, 2, 3, 4, 5]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let mut r = ElementReader::new(Cursor::new(data), Encoding::Binary);
        let mut block = [0i16; 2];
        assert!(r.read_block(&mut block).unwrap());
        assert_eq!(block, [1, 2]);
        assert!(r.read_block(&mut block).unwrap());
        assert_eq!(block, [3, 4]);
        // One whole value left: clean end, partial block dropped.
        assert!(!r.read_block(&mut block).unwrap());
    }

    #[test]
    fn block_read_inside_value_is_an_error() {
        let mut r = ElementReader::new(Cursor::new(vec![0u8; 7]), Encoding::Binary);
        let mut block = [0f32; 4];
        assert!(matches!(
            r.read_block(&mut block),
            Err(CodecError::Truncated { expected: 4, got: 3 })
        ));
    }

    #[test]
    fn ascii_tokens() {
        let text = "  1.5\t-2\n\n3e2 \x0b 4\r\n";
        let mut r = ElementReader::new(Cursor::new(text), Encoding::Ascii);
        let mut got = Vec::new();
        while let Some(v) = r.read::<f64>().unwrap() {
            got.push(v);
        }
        assert_eq!(got, [1.5, -2.0, 300.0, 4.0]);
    }

    #[test]
    fn ascii_bad_token() {
        let mut r = ElementReader::new(Cursor::new("1 two 3"), Encoding::Ascii);
        assert_eq!(r.read::<i32>().unwrap(), Some(1));
        let err = r.read::<i32>().unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidToken { ref token, kind: ElementKind::I32 } if token == "two"
        ));
        assert!(err.is_format_error());
    }

    #[test]
    fn ascii_out_of_range_token() {
        let mut r = ElementReader::new(Cursor::new("300"), Encoding::Ascii);
        assert!(r.read::<u8>().is_err());
    }

    #[test]
    fn ascii_writer_lines() {
        let mut w = ElementWriter::new(Vec::new(), Encoding::Ascii);
        w.write_slice(&[1.0f64, 0.1]).unwrap();
        w.write(-2.5f64).unwrap();
        w.end_record().unwrap();
        w.write(7.0f64).unwrap();
        w.flush().unwrap();
        assert_eq!(String::from_utf8(w.into_inner()).unwrap(), "1 0.1 -2.5\n7\n");
    }

    #[test]
    fn dump_line() {
        let fmt = PrintFormat::parse("%5.1f").unwrap();
        let mut buf = FormatBuffer::new();
        let mut w = ElementWriter::new(Vec::new(), Encoding::Binary);
        w.write_dump_line(3, 2.375f64, &fmt, &mut buf).unwrap();
        assert_eq!(w.into_inner(), b"3\t  2.4\n");
    }

    #[test]
    fn dump_line_overflow() {
        let fmt = PrintFormat::parse("%100.90f").unwrap();
        let mut buf = FormatBuffer::new();
        let mut w = ElementWriter::new(Vec::new(), Encoding::Binary);
        let err = w.write_dump_line(0, 1.0f64, &fmt, &mut buf).unwrap_err();
        assert!(matches!(err, CodecError::Format(FormatError::Overflow { .. })));
        assert!(w.into_inner().is_empty());
    }
}
