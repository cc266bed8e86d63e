// Command-line driver for framekit.
//
// One subcommand per tool. Each reads a file or stdin, writes stdout, and
// maps the transform's result to the exit status. Diagnostics are printed
// here; the library itself never writes to stderr.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::algo::{AlgorithmError, EntropyCalculator, EntropyUnit, MuLawCompression};
use crate::codec::{CodecError, ElementReader, ElementWriter};
use crate::dispatch::{Delay, Dumper, Reshaper};
use crate::element::{ElementKind, Encoding};
use crate::io::{BUF_SIZE, open_input};
use crate::transform::{
    BlockGeometry, DelayOptions, DumpOptions, IndexWindow, ReshapeOptions, RunStats,
};

// ---------------------------------------------------------------------------
// Constants (classic tool defaults)
// ---------------------------------------------------------------------------

const DEFAULT_TYPE: &str = "d";
const DEFAULT_BLOCK_LENGTH: usize = 512;
const DEFAULT_ENTROPY_LENGTH: usize = 256;
const DEFAULT_ABS_MAX: f64 = 32768.0;
const DEFAULT_MU: f64 = 255.0;

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Typed numeric stream converters for speech/DSP pipelines.
#[derive(Parser, Debug)]
#[command(
    name = "framekit",
    version,
    about = "Typed numeric stream converters",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output run stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Block copy: window and pad fixed-length blocks.
    Bcp(BcpArgs),
    /// Dump values as indexed text lines.
    Dmp(DmpArgs),
    /// Delay or advance a sequence.
    Delay(DelayArgs),
    /// Entropy of each frame of probabilities (doubles).
    Entropy(EntropyArgs),
    /// Mu-law compress a sequence of doubles.
    Ulaw(UlawArgs),
    /// List the supported data types.
    Types,
}

#[derive(Args, Debug)]
struct BcpArgs {
    /// Input block length.
    #[arg(short = 'l', long = "length", conflicts_with = "order")]
    length: Option<usize>,

    /// Input block order (length - 1).
    #[arg(short = 'm', long = "order")]
    order: Option<usize>,

    /// First input element to copy.
    #[arg(short = 's', long = "start", default_value_t = 0)]
    start: usize,

    /// Last input element to copy [default: length - 1].
    #[arg(short = 'e', long = "end")]
    end: Option<usize>,

    /// Output position of the first copied element.
    #[arg(short = 'S', long = "output-start", default_value_t = 0)]
    output_start: usize,

    /// Output block length [default: output start + copied length].
    #[arg(short = 'L', long = "output-length", conflicts_with = "output_order")]
    output_length: Option<usize>,

    /// Output block order (output length - 1).
    #[arg(short = 'M', long = "output-order")]
    output_order: Option<usize>,

    /// Pad value for empty slots.
    #[arg(short = 'f', long = "pad", default_value_t = 0.0, allow_negative_numbers = true)]
    pad: f64,

    /// Data type tag (see `framekit types`).
    #[arg(short = 't', long = "type", default_value = DEFAULT_TYPE)]
    data_type: String,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DmpArgs {
    /// Cycle indices over 1..=N.
    #[arg(
        short = 'l',
        long = "length",
        conflicts_with = "order",
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    length: Option<i64>,

    /// Cycle indices over 0..=N.
    #[arg(short = 'm', long = "order", value_parser = clap::value_parser!(i64).range(0..))]
    order: Option<i64>,

    /// printf-style value format, e.g. %g or %08.3f [default: per type].
    #[arg(short = 'f', long = "format")]
    format: Option<String>,

    /// Data type tag (see `framekit types`).
    #[arg(short = 't', long = "type", default_value = DEFAULT_TYPE)]
    data_type: String,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DelayArgs {
    /// Start index: positive delays, negative advances.
    #[arg(short = 's', long = "start", default_value_t = 0, allow_negative_numbers = true)]
    start: i64,

    /// Keep the output as long as the input.
    #[arg(short = 'k', long = "keep-length")]
    keep_length: bool,

    /// Pad value for inserted slots.
    #[arg(short = 'f', long = "pad", default_value_t = 0.0, allow_negative_numbers = true)]
    pad: f64,

    /// Data type tag (see `framekit types`).
    #[arg(short = 't', long = "type", default_value = DEFAULT_TYPE)]
    data_type: String,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EntropyArgs {
    /// Number of probabilities per frame.
    #[arg(short = 'l', long = "length", conflicts_with = "order")]
    length: Option<usize>,

    /// Frame order (length - 1).
    #[arg(short = 'm', long = "order")]
    order: Option<usize>,

    /// Output unit: bit, nat or dit (or 0, 1, 2).
    #[arg(short = 'o', long = "unit", default_value = "bit")]
    unit: EntropyUnit,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct UlawArgs {
    /// Absolute maximum of the input.
    #[arg(short = 'a', long = "abs-max", default_value_t = DEFAULT_ABS_MAX)]
    abs_max: f64,

    /// Compression factor mu.
    #[arg(short = 'u', long = "mu", default_value_t = DEFAULT_MU)]
    mu: f64,

    /// Input file (default: stdin).
    #[arg(value_hint = ValueHint::FilePath)]
    input: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Bcp {
        data_type: String,
        options: ReshapeOptions,
    },
    Dmp {
        data_type: String,
        options: DumpOptions,
    },
    Delay {
        data_type: String,
        options: DelayOptions,
    },
    Entropy {
        length: usize,
        unit: EntropyUnit,
    },
    Ulaw {
        abs_max: f64,
        mu: f64,
    },
    Types,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Bcp { .. } => "bcp",
            Self::Dmp { .. } => "dmp",
            Self::Delay { .. } => "delay",
            Self::Entropy { .. } => "entropy",
            Self::Ulaw { .. } => "ulaw",
            Self::Types => "types",
        }
    }
}

#[derive(Debug)]
struct Options {
    command: Command,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
}

fn block_length(
    length: Option<usize>,
    order: Option<usize>,
    default: usize,
) -> Result<usize, String> {
    match (length, order) {
        (Some(length), _) => Ok(length),
        (None, Some(order)) => order
            .checked_add(1)
            .ok_or_else(|| format!("order {order} is too large")),
        (None, None) => Ok(default),
    }
}

fn resolve_options(cli: Cli) -> Result<Options, String> {
    let quiet = cli.quiet;
    let verbose = cli.verbose.min(2);
    let json_output = cli.json_output;

    let (command, input_file) = match cli.command {
        Cmd::Bcp(args) => {
            let input_length = block_length(args.length, args.order, DEFAULT_BLOCK_LENGTH)?;
            let input_end = args.end.unwrap_or(input_length.saturating_sub(1));
            let copy_length = input_end
                .checked_sub(args.start)
                .map_or(0, |span| span.saturating_add(1));
            let output_length = match (args.output_length, args.output_order) {
                (None, None) => args.output_start.saturating_add(copy_length),
                (length, order) => block_length(length, order, 0)?,
            };
            let options = ReshapeOptions {
                geometry: BlockGeometry {
                    input_length,
                    input_start: args.start,
                    input_end,
                    output_start: args.output_start,
                    output_length,
                },
                pad_value: args.pad,
            };
            (
                Command::Bcp {
                    data_type: args.data_type,
                    options,
                },
                args.input,
            )
        }
        Cmd::Dmp(args) => {
            if let Some(format) = &args.format
                && !format.starts_with('%')
            {
                return Err(format!("dmp: print format must begin with '%': {format}"));
            }
            let window = match (args.length, args.order) {
                (Some(length), _) => IndexWindow::bounded(1, length),
                (None, Some(order)) => IndexWindow::bounded(0, order),
                (None, None) => IndexWindow::unbounded(0),
            };
            (
                Command::Dmp {
                    data_type: args.data_type,
                    options: DumpOptions {
                        format: args.format,
                        window,
                    },
                },
                args.input,
            )
        }
        Cmd::Delay(args) => (
            Command::Delay {
                data_type: args.data_type,
                options: DelayOptions {
                    start_index: args.start,
                    keep_length: args.keep_length,
                    pad_value: args.pad,
                },
            },
            args.input,
        ),
        Cmd::Entropy(args) => (
            Command::Entropy {
                length: block_length(args.length, args.order, DEFAULT_ENTROPY_LENGTH)?,
                unit: args.unit,
            },
            args.input,
        ),
        Cmd::Ulaw(args) => (
            Command::Ulaw {
                abs_max: args.abs_max,
                mu: args.mu,
            },
            args.input,
        ),
        Cmd::Types => (Command::Types, None),
    };

    Ok(Options {
        command,
        quiet,
        verbose,
        json_output,
        input_file,
    })
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("framekit".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

fn stdout_writer() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::with_capacity(BUF_SIZE, io::stdout().lock())
}

fn report(opts: &Options, data_type: Option<&str>, stats: &RunStats) {
    let command = opts.command.name();
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "framekit: {command}: blocks: {}, values in: {}, values out: {}",
            stats.blocks, stats.values_read, stats.values_written
        );
    }
    if opts.json_output {
        let json = serde_json::json!({
            "command": command,
            "type": data_type,
            "blocks": stats.blocks,
            "values_read": stats.values_read,
            "values_written": stats.values_written,
        });
        match serde_json::to_string_pretty(&json) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => log::warn!("cannot serialize stats: {e}"),
        }
    }
}

/// Failure while streaming values through an algorithm.
#[derive(Debug, thiserror::Error)]
enum StreamRunError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("item {item}: {source}")]
    Algorithm { item: u64, source: AlgorithmError },
}

/// Run `run` over the configured input and stdout, mapping the result to an
/// exit status.
fn drive<E: std::fmt::Display>(
    opts: &Options,
    data_type: &str,
    run: impl FnOnce(Box<dyn io::BufRead>, &mut dyn Write) -> Result<RunStats, E>,
) -> i32 {
    let command = opts.command.name();
    let input = match open_input(opts.input_file.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            let name = opts
                .input_file
                .as_deref()
                .map_or_else(|| "stdin".into(), |p| p.display().to_string());
            eprintln!("framekit: {command}: input file: {name}: {e}");
            return 1;
        }
    };

    let mut output = stdout_writer();
    let result = run(input, &mut output);
    let flushed = output.flush();

    match (result, flushed) {
        (Ok(stats), Ok(())) => {
            report(opts, Some(data_type), &stats);
            0
        }
        (Err(e), _) => {
            eprintln!("framekit: {command}: {e}");
            1
        }
        (Ok(_), Err(e)) => {
            eprintln!("framekit: {command}: write flush error: {e}");
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Transform commands
// ---------------------------------------------------------------------------

fn cmd_bcp(opts: &Options, data_type: &str, options: &ReshapeOptions) -> i32 {
    let reshaper = Reshaper::new(data_type, options);
    if let Some(e) = reshaper.config_error() {
        eprintln!("framekit: bcp: {e}");
        return 1;
    }
    drive(opts, data_type, |input, output| reshaper.try_run(input, output))
}

fn cmd_dmp(opts: &Options, data_type: &str, options: &DumpOptions) -> i32 {
    let dumper = Dumper::new(data_type, options);
    if let Some(e) = dumper.config_error() {
        eprintln!("framekit: dmp: {e}");
        return 1;
    }
    drive(opts, data_type, |input, output| dumper.try_run(input, output))
}

fn cmd_delay(opts: &Options, data_type: &str, options: &DelayOptions) -> i32 {
    let delay = Delay::new(data_type, options);
    if let Some(e) = delay.config_error() {
        eprintln!("framekit: delay: {e}");
        return 1;
    }
    drive(opts, data_type, |input, output| delay.try_run(input, output))
}

// ---------------------------------------------------------------------------
// Algorithm commands
// ---------------------------------------------------------------------------

fn cmd_entropy(opts: &Options, length: usize, unit: EntropyUnit) -> i32 {
    let calculator = EntropyCalculator::new(length, unit);
    if !calculator.is_valid() {
        eprintln!("framekit: entropy: frame length must be at least 1");
        return 1;
    }

    drive(opts, "d", |input, output| -> Result<RunStats, StreamRunError> {
        let mut reader = ElementReader::new(input, Encoding::Binary);
        let mut writer = ElementWriter::new(output, Encoding::Binary);
        let mut frame = vec![0.0f64; length];
        let mut stats = RunStats::default();

        while reader.read_block(&mut frame)? {
            stats.blocks += 1;
            stats.values_read += length as u64;
            let entropy = calculator
                .run(&frame)
                .map_err(|source| StreamRunError::Algorithm {
                    item: stats.blocks - 1,
                    source,
                })?;
            writer.write(entropy)?;
            stats.values_written += 1;
        }
        writer.flush()?;
        Ok(stats)
    })
}

fn cmd_ulaw(opts: &Options, abs_max: f64, mu: f64) -> i32 {
    let compression = MuLawCompression::new(abs_max, mu);
    if !compression.is_valid() {
        eprintln!("framekit: ulaw: invalid parameters (abs-max {abs_max}, mu {mu})");
        return 1;
    }

    drive(opts, "d", |input, output| -> Result<RunStats, StreamRunError> {
        let mut reader = ElementReader::new(input, Encoding::Binary);
        let mut writer = ElementWriter::new(output, Encoding::Binary);
        let mut stats = RunStats::default();

        while let Some(x) = reader.read::<f64>()? {
            stats.values_read += 1;
            let y = compression
                .run(x)
                .map_err(|source| StreamRunError::Algorithm {
                    item: stats.values_read - 1,
                    source,
                })?;
            writer.write(y)?;
            stats.values_written += 1;
        }
        writer.flush()?;
        Ok(stats)
    })
}

// ---------------------------------------------------------------------------
// Types command
// ---------------------------------------------------------------------------

fn cmd_types(opts: &Options) -> i32 {
    let mut out = stdout_writer();

    let result = if opts.json_output {
        let kinds: Vec<_> = ElementKind::ALL
            .iter()
            .map(|k| {
                serde_json::json!({
                    "tag": k.tag().to_string(),
                    "name": k.name(),
                    "width": k.width(),
                    "signed": k.is_signed(),
                    "float": k.is_float(),
                    "default_format": k.default_print_format(),
                })
            })
            .collect();
        serde_json::to_string_pretty(&kinds)
            .map_err(io::Error::other)
            .and_then(|text| writeln!(out, "{text}"))
    } else {
        write_type_table(&mut out)
    };

    match result.and_then(|()| out.flush()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("framekit: types: {e}");
            1
        }
    }
}

fn write_type_table(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "tag  width  signed  name")?;
    for kind in ElementKind::ALL {
        writeln!(
            out,
            "{:<3}  {:>5}  {:<6}  {}",
            kind.tag(),
            kind.width(),
            if kind.is_signed() { "yes" } else { "no" },
            kind.name()
        )?;
    }
    writeln!(out, "a    {:>5}  yes     {} (ascii)", "-", ElementKind::Extended.name())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn init_logging(opts: &Options) {
    let level = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = match resolve_options(cli) {
        Ok(opts) => opts,
        Err(msg) => {
            eprintln!("framekit: {msg}");
            process::exit(1);
        }
    };
    init_logging(&opts);

    let exit_code = match &opts.command {
        Command::Bcp { data_type, options } => cmd_bcp(&opts, data_type, options),
        Command::Dmp { data_type, options } => cmd_dmp(&opts, data_type, options),
        Command::Delay { data_type, options } => cmd_delay(&opts, data_type, options),
        Command::Entropy { length, unit } => cmd_entropy(&opts, *length, *unit),
        Command::Ulaw { abs_max, mu } => cmd_ulaw(&opts, *abs_max, *mu),
        Command::Types => cmd_types(&opts),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
