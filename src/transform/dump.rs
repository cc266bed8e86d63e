// Indexed dumper.
//
// Writes one `<index>\t<value>` line per input value. The index starts at
// the window minimum and, for a bounded window, returns to the minimum the
// step after it reaches the maximum.

use std::io::{BufRead, Write};

use log::debug;

use super::{ConfigError, RunStats};
use crate::codec::format::{FormatBuffer, PrintFormat};
use crate::codec::{CodecError, ElementReader, ElementWriter};
use crate::element::{Element, Encoding};

/// Inclusive label range; `maximum: None` never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexWindow {
    pub minimum: i64,
    pub maximum: Option<i64>,
}

impl IndexWindow {
    pub const fn unbounded(minimum: i64) -> Self {
        Self {
            minimum,
            maximum: None,
        }
    }

    pub const fn bounded(minimum: i64, maximum: i64) -> Self {
        Self {
            minimum,
            maximum: Some(maximum),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.maximum {
            Some(maximum) if maximum < self.minimum => Err(ConfigError::InvalidIndexWindow {
                minimum: self.minimum,
                maximum,
            }),
            _ => Ok(()),
        }
    }

    /// Label following `index`.
    #[inline]
    pub fn next(&self, index: i64) -> i64 {
        match self.maximum {
            Some(maximum) if index >= maximum => self.minimum,
            _ => index.wrapping_add(1),
        }
    }
}

impl Default for IndexWindow {
    fn default() -> Self {
        Self::unbounded(0)
    }
}

/// Kind-independent dumper settings, as taken by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DumpOptions {
    /// printf-style pattern; `None` or empty selects the kind's default.
    pub format: Option<String>,
    pub window: IndexWindow,
}

/// Formats a stream of `T` as indexed text lines.
#[derive(Debug, Clone)]
pub struct IndexedDumper<T: Element> {
    format: PrintFormat,
    window: IndexWindow,
    encoding: Encoding,
    _kind: std::marker::PhantomData<T>,
}

impl<T: Element> IndexedDumper<T> {
    pub fn new(
        format: PrintFormat,
        window: IndexWindow,
        encoding: Encoding,
    ) -> Result<Self, ConfigError> {
        window.validate()?;
        Ok(Self {
            format,
            window,
            encoding,
            _kind: std::marker::PhantomData,
        })
    }

    pub fn format(&self) -> &PrintFormat {
        &self.format
    }

    pub fn window(&self) -> &IndexWindow {
        &self.window
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<RunStats, CodecError> {
        let mut reader = ElementReader::new(input, self.encoding);
        let mut writer = ElementWriter::new(output, Encoding::Ascii);
        let mut buf = FormatBuffer::new();
        let mut stats = RunStats::default();

        let mut index = self.window.minimum;
        while let Some(value) = reader.read::<T>()? {
            stats.values_read += 1;
            writer.write_dump_line(index, value, &self.format, &mut buf)?;
            stats.values_written += 1;
            index = self.window.next(index);
        }
        writer.flush()?;

        debug!("dump {}: {} lines", T::KIND, stats.values_written);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::UInt24;
    use std::io::Cursor;

    fn dump<T: Element>(values: &[T], fmt: &str, window: IndexWindow) -> String {
        let mut input = Vec::new();
        let mut w = ElementWriter::new(&mut input, Encoding::Binary);
        w.write_slice(values).unwrap();
        let d = IndexedDumper::<T>::new(PrintFormat::parse(fmt).unwrap(), window, Encoding::Binary)
            .unwrap();
        let mut out = Vec::new();
        d.run(Cursor::new(input), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn window_validation() {
        assert!(IndexWindow::bounded(3, 3).validate().is_ok());
        assert!(matches!(
            IndexWindow::bounded(3, 2).validate(),
            Err(ConfigError::InvalidIndexWindow { minimum: 3, maximum: 2 })
        ));
        assert!(IndexWindow::unbounded(-5).validate().is_ok());
    }

    #[test]
    fn index_steps() {
        let w = IndexWindow::bounded(1, 3);
        let seq: Vec<i64> = std::iter::successors(Some(1), |&i| Some(w.next(i)))
            .take(7)
            .collect();
        assert_eq!(seq, [1, 2, 3, 1, 2, 3, 1]);

        let u = IndexWindow::unbounded(-1);
        assert_eq!(u.next(-1), 0);
        assert_eq!(u.next(1_000_000), 1_000_001);
    }

    #[test]
    fn unbounded_dump() {
        let text = dump(&[1.5f64, -2.0, 0.25], "%g", IndexWindow::default());
        assert_eq!(text, "0\t1.5\n1\t-2\n2\t0.25\n");
    }

    #[test]
    fn cyclic_dump() {
        let text = dump(&[10i32, 20, 30, 40, 50], "%d", IndexWindow::bounded(0, 1));
        assert_eq!(text, "0\t10\n1\t20\n0\t30\n1\t40\n0\t50\n");
    }

    #[test]
    fn custom_format() {
        let text = dump(&[UInt24::MAX], "%#x", IndexWindow::unbounded(7));
        assert_eq!(text, "7\t0xffffff\n");
    }

    #[test]
    fn overflow_aborts_run() {
        let d = IndexedDumper::<f64>::new(
            PrintFormat::parse("%200f").unwrap(),
            IndexWindow::default(),
            Encoding::Binary,
        )
        .unwrap();
        let mut out = Vec::new();
        let err = d
            .run(Cursor::new(1.0f64.to_ne_bytes().to_vec()), &mut out)
            .unwrap_err();
        assert!(err.is_format_error());
        assert!(out.is_empty());
    }

    #[test]
    fn ascii_input() {
        let d = IndexedDumper::<i16>::new(
            PrintFormat::parse("%+d").unwrap(),
            IndexWindow::default(),
            Encoding::Ascii,
        )
        .unwrap();
        let mut out = Vec::new();
        d.run(Cursor::new("5 -6"), &mut out).unwrap();
        assert_eq!(out, b"0\t+5\n1\t-6\n");
    }
}
