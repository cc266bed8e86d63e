// Type dispatcher.
//
// Maps a command-line type tag to a transform instantiated for that element
// kind. Each front type (`Reshaper`, `Dumper`, `Delay`) owns a closed sum
// over the thirteen kinds, so the per-element loops are fully monomorphized
// and the only runtime branch is one `match` per run.
//
// Construction never fails structurally. A bad tag or configuration leaves
// the value in an invalid state that `is_valid` reports and that `run`
// refuses without touching either stream.

use std::io::{BufRead, Write};

use log::debug;

use crate::codec::format::PrintFormat;
use crate::element::{Element, ElementKind, Extended, Int24, TypeTag, UInt24};
use crate::transform::{
    BlockReshaper, ConfigError, DelayLine, DelayOptions, DumpOptions, IndexedDumper,
    ReshapeOptions, RunError, RunStats,
};

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Sum type with one variant per element kind, plus `From` for each variant.
macro_rules! kind_enum {
    ($(#[$meta:meta])* $name:ident => $inner:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        enum $name {
            I8($inner<i8>),
            I16($inner<i16>),
            I24($inner<Int24>),
            I32($inner<i32>),
            I64($inner<i64>),
            U8($inner<u8>),
            U16($inner<u16>),
            U24($inner<UInt24>),
            U32($inner<u32>),
            U64($inner<u64>),
            F32($inner<f32>),
            F64($inner<f64>),
            Extended($inner<Extended>),
        }

        kind_enum!(@from $name, $inner;
            I8 i8, I16 i16, I24 Int24, I32 i32, I64 i64,
            U8 u8, U16 u16, U24 UInt24, U32 u32, U64 u64,
            F32 f32, F64 f64, Extended Extended);
    };
    (@from $name:ident, $inner:ident; $($variant:ident $ty:ty),*) => {$(
        impl From<$inner<$ty>> for $name {
            fn from(value: $inner<$ty>) -> Self {
                Self::$variant(value)
            }
        }
    )*};
}

/// Evaluate `$body` with `$v` bound to whichever variant is present.
macro_rules! on_variant {
    ($value:expr, $name:ident, $v:ident => $body:expr) => {
        match $value {
            $name::I8($v) => $body,
            $name::I16($v) => $body,
            $name::I24($v) => $body,
            $name::I32($v) => $body,
            $name::I64($v) => $body,
            $name::U8($v) => $body,
            $name::U16($v) => $body,
            $name::U24($v) => $body,
            $name::U32($v) => $body,
            $name::U64($v) => $body,
            $name::F32($v) => $body,
            $name::F64($v) => $body,
            $name::Extended($v) => $body,
        }
    };
}

/// Evaluate `$body` with the type alias `$T` set to the Rust type of `$kind`.
macro_rules! with_element_type {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            ElementKind::I8 => {
                type $T = i8;
                $body
            }
            ElementKind::I16 => {
                type $T = i16;
                $body
            }
            ElementKind::I24 => {
                type $T = Int24;
                $body
            }
            ElementKind::I32 => {
                type $T = i32;
                $body
            }
            ElementKind::I64 => {
                type $T = i64;
                $body
            }
            ElementKind::U8 => {
                type $T = u8;
                $body
            }
            ElementKind::U16 => {
                type $T = u16;
                $body
            }
            ElementKind::U24 => {
                type $T = UInt24;
                $body
            }
            ElementKind::U32 => {
                type $T = u32;
                $body
            }
            ElementKind::U64 => {
                type $T = u64;
                $body
            }
            ElementKind::F32 => {
                type $T = f32;
                $body
            }
            ElementKind::F64 => {
                type $T = f64;
                $body
            }
            ElementKind::Extended => {
                type $T = Extended;
                $body
            }
        }
    };
}

/// Validity query and run entry points shared by the front types.
macro_rules! dispatch_surface {
    ($name:ident, $any:ident) => {
        impl $name {
            /// `false` when the tag or configuration was rejected.
            pub fn is_valid(&self) -> bool {
                self.inner.is_ok()
            }

            pub fn config_error(&self) -> Option<&ConfigError> {
                self.inner.as_ref().err()
            }

            /// Tag and encoding this instance was built for, if valid.
            pub fn type_tag(&self) -> Option<TypeTag> {
                self.tag
            }

            /// Run over `input`/`output`, reporting the failure cause.
            pub fn try_run<R: BufRead, W: Write>(
                &self,
                input: R,
                output: W,
            ) -> Result<RunStats, RunError> {
                let inner = self
                    .inner
                    .as_ref()
                    .map_err(|e| RunError::InvalidConfig(e.clone()))?;
                Ok(on_variant!(inner, $any, t => t.run(input, output))?)
            }

            /// Run over `input`/`output`; `true` on success.
            pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> bool {
                match self.try_run(input, output) {
                    Ok(_) => true,
                    Err(e) => {
                        debug!("{} run failed: {e}", stringify!($name));
                        false
                    }
                }
            }
        }
    };
}

fn parse_tag(type_tag: &str) -> Result<TypeTag, ConfigError> {
    type_tag
        .parse::<TypeTag>()
        .map_err(|e| ConfigError::UnknownType(e.0))
}

fn log_rejection<T>(what: &str, type_tag: &str, result: &Result<T, ConfigError>) {
    if let Err(e) = result {
        debug!("{what} for type '{type_tag}' rejected: {e}");
    }
}

// ---------------------------------------------------------------------------
// Reshaper
// ---------------------------------------------------------------------------

kind_enum!(AnyReshaper => BlockReshaper);

/// A `BlockReshaper` for the element kind named by a type tag.
#[derive(Debug, Clone)]
pub struct Reshaper {
    tag: Option<TypeTag>,
    inner: Result<AnyReshaper, ConfigError>,
}

impl Reshaper {
    pub fn new(type_tag: &str, options: &ReshapeOptions) -> Self {
        let tag = parse_tag(type_tag);
        let inner = tag.clone().and_then(|tag| {
            with_element_type!(tag.kind(), T => BlockReshaper::<T>::new(
                options.geometry,
                T::from_f64_lossy(options.pad_value),
                tag.encoding(),
            )
            .map(AnyReshaper::from))
        });
        log_rejection("reshaper", type_tag, &inner);
        Self {
            tag: tag.ok().filter(|_| inner.is_ok()),
            inner,
        }
    }
}

dispatch_surface!(Reshaper, AnyReshaper);

// ---------------------------------------------------------------------------
// Dumper
// ---------------------------------------------------------------------------

kind_enum!(AnyDumper => IndexedDumper);

/// An `IndexedDumper` for the element kind named by a type tag.
#[derive(Debug, Clone)]
pub struct Dumper {
    tag: Option<TypeTag>,
    inner: Result<AnyDumper, ConfigError>,
}

impl Dumper {
    /// An absent or empty `options.format` selects the kind's default.
    pub fn new(type_tag: &str, options: &DumpOptions) -> Self {
        let tag = parse_tag(type_tag);
        let inner = tag.clone().and_then(|tag| {
            let pattern = options
                .format
                .as_deref()
                .filter(|f| !f.is_empty())
                .unwrap_or(tag.kind().default_print_format());
            let format = PrintFormat::parse(pattern)?;
            with_element_type!(tag.kind(), T => IndexedDumper::<T>::new(
                format,
                options.window,
                tag.encoding(),
            )
            .map(AnyDumper::from))
        });
        log_rejection("dumper", type_tag, &inner);
        Self {
            tag: tag.ok().filter(|_| inner.is_ok()),
            inner,
        }
    }

    /// Pattern in effect, if valid.
    pub fn format(&self) -> Option<&PrintFormat> {
        self.inner
            .as_ref()
            .ok()
            .map(|d| on_variant!(d, AnyDumper, t => t.format()))
    }
}

dispatch_surface!(Dumper, AnyDumper);

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------

kind_enum!(AnyDelay => DelayLine);

/// A `DelayLine` for the element kind named by a type tag.
#[derive(Debug, Clone)]
pub struct Delay {
    tag: Option<TypeTag>,
    inner: Result<AnyDelay, ConfigError>,
}

impl Delay {
    pub fn new(type_tag: &str, options: &DelayOptions) -> Self {
        let tag = parse_tag(type_tag);
        let inner = tag.clone().map(|tag| {
            with_element_type!(tag.kind(), T => AnyDelay::from(DelayLine::<T>::new(
                options.start_index,
                options.keep_length,
                T::from_f64_lossy(options.pad_value),
                tag.encoding(),
            )))
        });
        log_rejection("delay", type_tag, &inner);
        Self {
            tag: tag.ok(),
            inner,
        }
    }
}

dispatch_surface!(Delay, AnyDelay);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
