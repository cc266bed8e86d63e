// Block reshaper.
//
// Reads the input as consecutive blocks of `input_length` values. For each
// block it writes `output_start` pad values, the window
// `[input_start, input_end]` verbatim, then enough pad values to fill an
// output block of `output_length`. A trailing partial block ends the run
// cleanly and is not flushed.

use std::io::{BufRead, Write};

use log::{debug, trace};

use super::{ConfigError, RunStats};
use crate::codec::{CodecError, ElementReader, ElementWriter};
use crate::element::{Element, Encoding};

/// Input window and output framing, all in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    pub input_length: usize,
    pub input_start: usize,
    pub input_end: usize,
    pub output_start: usize,
    pub output_length: usize,
}

impl BlockGeometry {
    /// Copy every block unchanged.
    pub const fn identity(length: usize) -> Self {
        Self {
            input_length: length,
            input_start: 0,
            input_end: length.saturating_sub(1),
            output_start: 0,
            output_length: length,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_length == 0 {
            return Err(ConfigError::EmptyBlock);
        }
        if self.input_start > self.input_end {
            return Err(ConfigError::StartAfterEnd {
                start: self.input_start,
                end: self.input_end,
            });
        }
        if self.input_end >= self.input_length {
            return Err(ConfigError::EndOutsideBlock {
                end: self.input_end,
                length: self.input_length,
            });
        }
        let required = self.output_start.saturating_add(self.copy_length());
        if self.output_length < required {
            return Err(ConfigError::OutputTooShort {
                length: self.output_length,
                required,
            });
        }
        Ok(())
    }

    /// Elements carried through per block. Only meaningful once validated.
    pub const fn copy_length(&self) -> usize {
        self.input_end.saturating_sub(self.input_start) + 1
    }

    pub const fn left_pad(&self) -> usize {
        self.output_start
    }

    pub const fn right_pad(&self) -> usize {
        self.output_length
            .saturating_sub(self.output_start)
            .saturating_sub(self.copy_length())
    }
}

/// Kind-independent reshaper settings, as taken by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReshapeOptions {
    pub geometry: BlockGeometry,
    /// Converted to the element kind with truncation and saturation.
    pub pad_value: f64,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self {
            geometry: BlockGeometry::identity(512),
            pad_value: 0.0,
        }
    }
}

/// Windows and pads fixed-length blocks of `T`.
#[derive(Debug, Clone)]
pub struct BlockReshaper<T: Element> {
    geometry: BlockGeometry,
    pad: T,
    encoding: Encoding,
}

impl<T: Element> BlockReshaper<T> {
    pub fn new(geometry: BlockGeometry, pad: T, encoding: Encoding) -> Result<Self, ConfigError> {
        geometry.validate()?;
        Ok(Self {
            geometry,
            pad,
            encoding,
        })
    }

    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    pub fn pad(&self) -> T {
        self.pad
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Reshape `input` into `output` until the input runs out of whole blocks.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<RunStats, CodecError> {
        let g = &self.geometry;
        let (left, right) = (g.left_pad(), g.right_pad());

        let mut reader = ElementReader::new(input, self.encoding);
        let mut writer = ElementWriter::new(output, self.encoding);
        let mut block = vec![T::default(); g.input_length];
        let pad = vec![self.pad; left.max(right)];
        let mut stats = RunStats::default();

        while reader.read_block(&mut block)? {
            writer.write_slice(&pad[..left])?;
            writer.write_slice(&block[g.input_start..=g.input_end])?;
            writer.write_slice(&pad[..right])?;
            writer.end_record()?;

            stats.blocks += 1;
            stats.values_read += g.input_length as u64;
            stats.values_written += g.output_length as u64;
            trace!("reshaped block {}", stats.blocks);
        }
        writer.flush()?;

        debug!(
            "reshape {}: {} blocks, {} values in, {} values out",
            T::KIND,
            stats.blocks,
            stats.values_read,
            stats.values_written
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Int24;
    use std::io::Cursor;

    fn geometry(l: usize, s: usize, e: usize, os: usize, ol: usize) -> BlockGeometry {
        BlockGeometry {
            input_length: l,
            input_start: s,
            input_end: e,
            output_start: os,
            output_length: ol,
        }
    }

    fn bytes_of(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    fn values_of(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]))
            .collect()
    }

    #[test]
    fn geometry_validation() {
        assert_eq!(geometry(0, 0, 0, 0, 1).validate(), Err(ConfigError::EmptyBlock));
        assert!(matches!(
            geometry(4, 3, 2, 0, 4).validate(),
            Err(ConfigError::StartAfterEnd { start: 3, end: 2 })
        ));
        assert!(matches!(
            geometry(4, 0, 4, 0, 5).validate(),
            Err(ConfigError::EndOutsideBlock { end: 4, length: 4 })
        ));
        assert!(matches!(
            geometry(4, 1, 2, 3, 4).validate(),
            Err(ConfigError::OutputTooShort { length: 4, required: 5 })
        ));
        assert!(geometry(4, 1, 2, 3, 5).validate().is_ok());
        assert!(BlockGeometry::identity(1).validate().is_ok());
    }

    #[test]
    fn pad_counts() {
        let g = geometry(24, 2, 9, 3, 32);
        assert_eq!(g.copy_length(), 8);
        assert_eq!(g.left_pad(), 3);
        assert_eq!(g.right_pad(), 21);
    }

    #[test]
    fn window_and_pad() {
        let r = BlockReshaper::new(geometry(4, 1, 2, 1, 5), -1i16, Encoding::Binary).unwrap();
        let input = bytes_of(&[10, 11, 12, 13, 20, 21, 22, 23, 30]);
        let mut out = Vec::new();
        let stats = r.run(Cursor::new(input), &mut out).unwrap();
        assert_eq!(values_of(&out), [-1, 11, 12, -1, -1, -1, 21, 22, -1, -1]);
        assert_eq!(
            stats,
            RunStats {
                blocks: 2,
                values_read: 8,
                values_written: 10
            }
        );
    }

    #[test]
    fn empty_input_is_success() {
        let r = BlockReshaper::new(BlockGeometry::identity(3), 0u8, Encoding::Binary).unwrap();
        let mut out = Vec::new();
        let stats = r.run(Cursor::new(Vec::new()), &mut out).unwrap();
        assert_eq!(stats.blocks, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn partial_element_is_an_error() {
        let r = BlockReshaper::new(BlockGeometry::identity(2), 0i16, Encoding::Binary).unwrap();
        let mut out = Vec::new();
        let mut input = bytes_of(&[1, 2]);
        input.push(3);
        let err = r.run(Cursor::new(input), &mut out).unwrap_err();
        assert!(err.is_stream_error());
        assert_eq!(values_of(&out), [1, 2]);
    }

    #[test]
    fn int24_blocks() {
        let r = BlockReshaper::new(geometry(2, 1, 1, 0, 2), Int24::MAX, Encoding::Binary).unwrap();
        let input: Vec<u8> = [Int24::MIN, Int24::ZERO]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let mut out = Vec::new();
        r.run(Cursor::new(input), &mut out).unwrap();
        let mut expected = Int24::ZERO.to_ne_bytes().to_vec();
        expected.extend_from_slice(&Int24::MAX.to_ne_bytes());
        assert_eq!(out, expected);
    }

    #[test]
    fn ascii_reshape() {
        let r = BlockReshaper::new(geometry(3, 0, 1, 1, 4), 0.0f64, Encoding::Ascii).unwrap();
        let mut out = Vec::new();
        r.run(Cursor::new("1 2 3\n4.5 5 6 7"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0 1 2 0\n0 4.5 5 0\n");
    }

    #[test]
    fn ascii_bad_token_outside_window_fails() {
        let r = BlockReshaper::new(geometry(3, 0, 0, 0, 1), 0.0f64, Encoding::Ascii).unwrap();
        let mut out = Vec::new();
        let err = r.run(Cursor::new("1 2 x"), &mut out).unwrap_err();
        assert!(err.is_format_error());
        assert!(out.is_empty());
    }
}
