//! Framekit: typed numeric stream codecs and frame transforms.
//!
//! Streams are sequences of fixed-width values of one element kind, laid
//! out in native byte order or as whitespace-delimited text. The crate
//! provides:
//! - Element kinds, including packed 24-bit integers and x87 extended
//!   floats (`element`)
//! - Binary/ASCII readers, writers and printf-style formatting (`codec`)
//! - Generic block reshaping, indexed dumping and delay (`transform`)
//! - Runtime type-tag dispatch to those transforms (`dispatch`)
//! - Entropy and mu-law frame algorithms (`algo`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use framekit::dispatch::Reshaper;
//! use framekit::transform::{BlockGeometry, ReshapeOptions};
//!
//! // Copy elements 1..=2 of every 4-element block of i16 into a 3-element
//! // block that starts with one pad value.
//! let options = ReshapeOptions {
//!     geometry: BlockGeometry {
//!         input_length: 4,
//!         input_start: 1,
//!         input_end: 2,
//!         output_start: 1,
//!         output_length: 3,
//!     },
//!     pad_value: 0.0,
//! };
//! let reshaper = Reshaper::new("s", &options);
//! assert!(reshaper.is_valid());
//!
//! let input: Vec<u8> = [1i16, 2, 3, 4].iter().flat_map(|v| v.to_ne_bytes()).collect();
//! let mut output = Vec::new();
//! assert!(reshaper.run(input.as_slice(), &mut output));
//!
//! let expected: Vec<u8> = [0i16, 2, 3].iter().flat_map(|v| v.to_ne_bytes()).collect();
//! assert_eq!(output, expected);
//! ```

pub mod algo;
pub mod codec;
pub mod dispatch;
pub mod element;
pub mod io;
pub mod transform;

#[cfg(feature = "cli")]
pub mod cli;
