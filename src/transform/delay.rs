// Delay line.
//
// A positive start index `S` emits `S` pad values ahead of the input; a
// non-positive one drops the first `|S|` input values. With `keep_length`
// the output has exactly as many values as the input:
//
//   S > 0, keep   -> the last S input values are discarded
//   S > 0, !keep  -> the stored tail is flushed at end of stream
//   S <= 0, keep  -> one pad value is appended per dropped value
//
// ASCII output carries one value per line.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use log::debug;

use super::RunStats;
use crate::codec::{CodecError, ElementReader, ElementWriter};
use crate::element::{Element, Encoding};

/// Initial ring capacity cap; longer delays grow on demand.
const MAX_PREALLOCATED: usize = 1 << 16;

/// Kind-independent delay settings, as taken by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DelayOptions {
    pub start_index: i64,
    pub keep_length: bool,
    pub pad_value: f64,
}

/// Shifts a stream of `T` by a signed number of samples.
#[derive(Debug, Clone)]
pub struct DelayLine<T: Element> {
    start_index: i64,
    keep_length: bool,
    pad: T,
    encoding: Encoding,
}

impl<T: Element> DelayLine<T> {
    pub fn new(start_index: i64, keep_length: bool, pad: T, encoding: Encoding) -> Self {
        Self {
            start_index,
            keep_length,
            pad,
            encoding,
        }
    }

    pub fn start_index(&self) -> i64 {
        self.start_index
    }

    pub fn keep_length(&self) -> bool {
        self.keep_length
    }

    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<RunStats, CodecError> {
        let mut reader = ElementReader::new(input, self.encoding);
        let mut writer = ElementWriter::new(output, self.encoding);
        let mut stats = RunStats::default();

        if self.start_index <= 0 {
            self.advance(&mut reader, &mut writer, &mut stats)?;
        } else {
            self.delay(&mut reader, &mut writer, &mut stats)?;
        }
        writer.flush()?;

        debug!(
            "delay {} by {}: {} values in, {} values out",
            T::KIND,
            self.start_index,
            stats.values_read,
            stats.values_written
        );
        Ok(stats)
    }

    fn advance<R: BufRead, W: Write>(
        &self,
        reader: &mut ElementReader<R>,
        writer: &mut ElementWriter<W>,
        stats: &mut RunStats,
    ) -> Result<(), CodecError> {
        let skip = self.start_index.unsigned_abs();
        let mut dropped = 0u64;
        while dropped < skip {
            if reader.read::<T>()?.is_none() {
                break;
            }
            dropped += 1;
        }
        stats.values_read = dropped;

        while let Some(value) = reader.read::<T>()? {
            stats.values_read += 1;
            emit(writer, value, stats)?;
        }

        if self.keep_length {
            for _ in 0..dropped {
                emit(writer, self.pad, stats)?;
            }
        }
        Ok(())
    }

    fn delay<R: BufRead, W: Write>(
        &self,
        reader: &mut ElementReader<R>,
        writer: &mut ElementWriter<W>,
        stats: &mut RunStats,
    ) -> Result<(), CodecError> {
        let delay = self.start_index.unsigned_abs();
        let capacity =
            usize::try_from(delay).map_or(MAX_PREALLOCATED, |d| d.min(MAX_PREALLOCATED));
        let mut stored: VecDeque<T> = VecDeque::with_capacity(capacity);

        for _ in 0..delay {
            match reader.read::<T>()? {
                Some(value) => {
                    stats.values_read += 1;
                    stored.push_back(value);
                }
                None if self.keep_length => return Ok(()),
                None => {}
            }
            emit(writer, self.pad, stats)?;
        }

        while let Some(value) = reader.read::<T>()? {
            stats.values_read += 1;
            if let Some(front) = stored.pop_front() {
                emit(writer, front, stats)?;
            }
            stored.push_back(value);
        }

        if !self.keep_length {
            for value in stored.drain(..) {
                emit(writer, value, stats)?;
            }
        }
        Ok(())
    }
}

fn emit<T: Element, W: Write>(
    writer: &mut ElementWriter<W>,
    value: T,
    stats: &mut RunStats,
) -> Result<(), CodecError> {
    writer.write(value)?;
    writer.end_record()?;
    stats.values_written += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(start: i64, keep: bool, input: &[f64]) -> Vec<f64> {
        let bytes: Vec<u8> = input.iter().flat_map(|v| v.to_ne_bytes()).collect();
        let line = DelayLine::new(start, keep, 0.0f64, Encoding::Binary);
        let mut out = Vec::new();
        let stats = line.run(Cursor::new(bytes), &mut out).unwrap();
        let values: Vec<f64> = out
            .chunks_exact(8)
            .map(|c| f64::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(stats.values_written as usize, values.len());
        values
    }

    #[test]
    fn delay_flushes_tail() {
        assert_eq!(run(2, false, &[1.0, 2.0, 3.0]), [0.0, 0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn delay_keeps_length() {
        assert_eq!(run(2, true, &[1.0, 2.0, 3.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn delay_longer_than_input() {
        assert_eq!(run(4, false, &[1.0, 2.0]), [0.0, 0.0, 0.0, 0.0, 1.0, 2.0]);
        assert_eq!(run(4, true, &[1.0, 2.0]), [0.0, 0.0]);
    }

    #[test]
    fn advance_drops_head() {
        assert_eq!(run(-2, false, &[1.0, 2.0, 3.0, 4.0]), [3.0, 4.0]);
        assert_eq!(run(-2, true, &[1.0, 2.0, 3.0, 4.0]), [3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn advance_past_end() {
        assert_eq!(run(-5, true, &[1.0, 2.0]), [0.0, 0.0]);
        assert!(run(-5, false, &[1.0, 2.0]).is_empty());
    }

    #[test]
    fn zero_is_passthrough() {
        assert_eq!(run(0, true, &[1.0, 2.0]), [1.0, 2.0]);
    }

    #[test]
    fn ascii_one_value_per_line() {
        let line = DelayLine::new(1, false, -1i32, Encoding::Ascii);
        let mut out = Vec::new();
        line.run(Cursor::new("7 8"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "-1\n7\n8\n");
    }
}
