// File-level I/O helpers.
//
// Provides `reshape_file()` and `dump_file()` convenience functions that
// drive the dispatcher with buffered file I/O, plus `open_input()` for
// callers that read either a file or stdin.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::dispatch::{Dumper, Reshaper};
use crate::transform::{DumpOptions, ReshapeOptions, RunError, RunStats};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, Error)]
pub enum IoError {
    /// Opening, creating or flushing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The transform rejected its configuration or failed mid-run.
    #[error(transparent)]
    Run(#[from] RunError),
}

// ---------------------------------------------------------------------------
// Default buffer size
// ---------------------------------------------------------------------------

pub const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Open `path` for buffered reading, or stdin when `path` is `None`.
pub fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::with_capacity(BUF_SIZE, File::open(path)?)),
        None => Box::new(BufReader::with_capacity(BUF_SIZE, io::stdin().lock())),
    })
}

fn create_output(path: &Path) -> io::Result<BufWriter<File>> {
    Ok(BufWriter::with_capacity(BUF_SIZE, File::create(path)?))
}

// ---------------------------------------------------------------------------
// reshape_file
// ---------------------------------------------------------------------------

/// Reshape the blocks of `input_path` into `output_path`.
///
/// The configuration is checked before either file is touched.
pub fn reshape_file(
    type_tag: &str,
    options: &ReshapeOptions,
    input_path: &Path,
    output_path: &Path,
) -> Result<RunStats, IoError> {
    let reshaper = Reshaper::new(type_tag, options);
    if let Some(e) = reshaper.config_error() {
        return Err(RunError::InvalidConfig(e.clone()).into());
    }

    let input = BufReader::with_capacity(BUF_SIZE, File::open(input_path)?);
    let mut output = create_output(output_path)?;
    let stats = reshaper.try_run(input, &mut output)?;
    output.flush()?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// dump_file
// ---------------------------------------------------------------------------

/// Dump `input_path` as indexed text into `output_path`.
pub fn dump_file(
    type_tag: &str,
    options: &DumpOptions,
    input_path: &Path,
    output_path: &Path,
) -> Result<RunStats, IoError> {
    let dumper = Dumper::new(type_tag, options);
    if let Some(e) = dumper.config_error() {
        return Err(RunError::InvalidConfig(e.clone()).into());
    }

    let input = BufReader::with_capacity(BUF_SIZE, File::open(input_path)?);
    let mut output = create_output(output_path)?;
    let stats = dumper.try_run(input, &mut output)?;
    output.flush()?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{BlockGeometry, ConfigError, IndexWindow};
    use std::io::Read;

    fn write_temp_file(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn reshape_file_pads_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = [1.0f32, 2.0, 3.0, 4.0]
            .iter()
            .flat_map(|v| v.to_ne_bytes())
            .collect();
        let input = write_temp_file(dir.path(), "in.f32", &data);
        let output = dir.path().join("out.f32");

        let options = ReshapeOptions {
            geometry: BlockGeometry {
                input_length: 2,
                input_start: 0,
                input_end: 1,
                output_start: 0,
                output_length: 3,
            },
            pad_value: 9.0,
        };
        let stats = reshape_file("f", &options, &input, &output).unwrap();
        assert_eq!(stats.blocks, 2);

        let got: Vec<f32> = std::fs::read(&output)
            .unwrap()
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(got, [1.0, 2.0, 9.0, 3.0, 4.0, 9.0]);
    }

    #[test]
    fn invalid_config_touches_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("never.bin");
        let err = reshape_file(
            "z",
            &ReshapeOptions::default(),
            &dir.path().join("missing.bin"),
            &output,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IoError::Run(RunError::InvalidConfig(ConfigError::UnknownType(_)))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = dump_file(
            "d",
            &DumpOptions::default(),
            &dir.path().join("missing.bin"),
            &dir.path().join("out.txt"),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Io(_)));
    }

    #[test]
    fn dump_file_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = [7u16, 8, 9].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let input = write_temp_file(dir.path(), "in.u16", &data);
        let output = dir.path().join("out.txt");

        let options = DumpOptions {
            format: None,
            window: IndexWindow::bounded(1, 2),
        };
        let stats = dump_file("S", &options, &input, &output).unwrap();
        assert_eq!(stats.values_written, 3);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "1\t7\n2\t8\n1\t9\n");
    }

    #[test]
    fn open_input_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_file(dir.path(), "text", b"1 2 3");
        let mut text = String::new();
        open_input(Some(&path))
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "1 2 3");
    }
}
