//! Corner-point grid converter.
//!
//! Reads a GRDECL or ROFF grid, converts it through the canonical grid and
//! writes it in the other (or the same) format.

mod config;
mod convert;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use grid_common::RoffFormat;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::load_config;
use convert::{Conversion, GridFormat};

#[derive(Parser, Debug)]
#[command(name = "grid-convert")]
#[command(about = "Convert corner-point grids between GRDECL and ROFF")]
struct Args {
    /// Grid file to read
    input: PathBuf,

    /// Grid file to write
    output: PathBuf,

    /// Input format (default: from the input extension)
    #[arg(long, value_enum)]
    from: Option<GridFormat>,

    /// Output format (default: from the output extension)
    #[arg(long, value_enum)]
    to: Option<GridFormat>,

    /// Write ROFF output as ASCII instead of binary
    #[arg(long)]
    ascii: bool,

    /// YAML configuration file (default: environment variables)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Re-read the output and verify it matches the input grid
    #[arg(long)]
    check: bool,

    /// Log level
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs)?;

    let config = load_config(args.config.as_deref())?;
    let input_format = GridFormat::resolve(args.from, &args.input)?;
    let output_format = GridFormat::resolve(args.to, &args.output)?;
    let roff_format = roff_output_format(args.ascii, &args.output, config.roff_output_format);

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        from = ?input_format,
        to = ?output_format,
        "Starting conversion"
    );

    let conversion = Conversion {
        input: &args.input,
        input_format,
        output: &args.output,
        output_format,
        roff_format,
        check: args.check,
    };
    let grid = conversion.run(&config)?;

    info!(dimensions = %grid.dimensions(), "Conversion complete");
    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// `--ascii` and a `.roffasc` extension select ASCII, otherwise the configured form.
fn roff_output_format(ascii: bool, output: &std::path::Path, configured: RoffFormat) -> RoffFormat {
    let ascii_extension = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("roffasc"));
    if ascii || ascii_extension {
        RoffFormat::Ascii
    } else {
        configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["grid-convert", "in.grdecl", "out.dat", "--to", "roff", "--check"]);
        assert_eq!(args.input, PathBuf::from("in.grdecl"));
        assert_eq!(args.from, None);
        assert_eq!(args.to, Some(GridFormat::Roff));
        assert!(args.check);
        assert!(!args.ascii);
    }

    #[test]
    fn test_roff_output_format() {
        let binary = RoffFormat::Binary;
        assert_eq!(roff_output_format(false, Path::new("a.roff"), binary), RoffFormat::Binary);
        assert_eq!(roff_output_format(true, Path::new("a.roff"), binary), RoffFormat::Ascii);
        assert_eq!(roff_output_format(false, Path::new("a.ROFFASC"), binary), RoffFormat::Ascii);
        assert_eq!(roff_output_format(false, Path::new("a.roff"), RoffFormat::Ascii), RoffFormat::Ascii);
    }
}
