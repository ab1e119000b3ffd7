//! xml-delimit: Flatten an XML document into a delimited text file
//!
//! Each direct child of the root element becomes a row; each element below
//! it becomes a column named `{parent}_{tag}_{n}`.
//!
//! Usage:
//!   # Comma-separated, written next to the input as orders-delimited.txt
//!   xml-delimit orders.xml
//!
//!   # Tab-separated to a chosen path
//!   xml-delimit orders.xml --delimiter '\t' --output orders.tsv
//!
//!   # One JSON object per row
//!   xml-delimit orders.xml --format ndjson

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use env_logger::Env;
use std::path::PathBuf;
use xml_delimit::{
    convert_file, derive_output_path, ConvertOptions, FlattenConfig, OutputFormat, TopLevelPrefix,
    WriterConfig,
};

#[derive(Parser, Debug)]
#[command(name = "xml-delimit", version)]
#[command(about = "Flatten an XML document into a delimited text file", long_about = None)]
struct Args {
    /// Input XML document
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Field delimiter; `\t` or `tab` selects a tab
    #[arg(long, short = 'd', default_value = ",")]
    delimiter: String,

    /// Output path (default: the input path with its extension replaced by `-delimited.txt`)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Delimited)]
    format: Format,

    /// Prefix the row element's children with the row tag instead of the root tag
    #[arg(long)]
    row_prefix: bool,

    /// Separator between the parts of a column name (default: "_")
    #[arg(long)]
    separator: Option<String>,

    /// Capture at most N levels below each row element
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Delimited,
    Ndjson,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            // Usage errors exit with 1 rather than clap's default of 2
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    // Build config
    let mut flatten = FlattenConfig::default();
    if args.row_prefix {
        flatten.top_level_prefix = TopLevelPrefix::RowElement;
    }
    if let Some(sep) = args.separator {
        flatten.separator = sep;
    }
    flatten.max_depth = args.max_depth;

    let options = ConvertOptions {
        flatten,
        writer: WriterConfig::with_delimiter(parse_delimiter(&args.delimiter)),
        format: match args.format {
            Format::Delimited => OutputFormat::Delimited,
            Format::Ndjson => OutputFormat::Ndjson,
        },
    };

    let output = args
        .output
        .unwrap_or_else(|| derive_output_path(&args.input));

    convert_file(&args.input, &output, &options)?;
    println!("Delimited file written: {}", output.display());

    Ok(())
}

/// Shell-friendly spellings of the tab character
fn parse_delimiter(raw: &str) -> String {
    match raw {
        "\\t" | "tab" => String::from("\t"),
        _ => raw.to_string(),
    }
}
