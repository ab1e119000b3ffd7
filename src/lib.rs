//! # xml-delimit - XML to delimited text
//!
//! Flattens an XML document into a table: each direct child of the root
//! element becomes one row, and the text of every element below it becomes
//! a column named after its parent tag, its own tag and its position among
//! same-named siblings.
//!
//! ## Modules
//!
//! - **flatten**: element tree, the flattening pass and the table writers
//! - **error**: parse and write errors
//!
//! ## Quick Start
//!
//! ```rust
//! use xml_delimit::{extract_rows, DelimitedWriter, Element, WriterConfig};
//!
//! # fn main() -> anyhow::Result<()> {
//! let root = Element::parse_str(
//!     "<root><record><name>Alice</name><tag>x</tag><tag>y</tag></record></root>",
//! )?;
//! let (columns, rows) = extract_rows(&root).into_parts();
//!
//! let mut writer = DelimitedWriter::new(Vec::new(), WriterConfig::default())?;
//! writer.write_table(&columns, &rows)?;
//!
//! let output = String::from_utf8(writer.into_inner())?;
//! assert_eq!(
//!     output,
//!     "root_name_1,root_tag_1,root_tag_2\r\nAlice,x,y\r\n"
//! );
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use log::info;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod error;
pub mod flatten;

// Re-export commonly used types for convenience
pub use error::{ParseError, WriteError};
pub use flatten::{
    decode_document, extract_rows, parse_document, ColumnSet, DelimitedWriter, Element, FlatTable,
    FlattenConfig, JsonRowsWriter, RowRecord, TopLevelPrefix, TreeFlattener, WriterConfig,
};

/// Suffix that replaces the input's extension in the default output path
pub const OUTPUT_SUFFIX: &str = "-delimited.txt";

/// Shape of the output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Header plus one delimited line per row
    #[default]
    Delimited,
    /// One JSON object per row, no header
    Ndjson,
}

/// Everything a conversion needs besides the input and output paths
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub flatten: FlattenConfig,
    pub writer: WriterConfig,
    pub format: OutputFormat,
}

/// What a conversion produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertSummary {
    pub rows: usize,
    pub columns: usize,
}

/// `data/orders.xml` -> `data/orders-delimited.txt`
pub fn derive_output_path(input: &Path) -> PathBuf {
    match input.file_stem() {
        Some(stem) => {
            let mut name = OsString::from(stem);
            name.push(OUTPUT_SUFFIX);
            input.with_file_name(name)
        }
        None => {
            let mut path = input.as_os_str().to_os_string();
            path.push(OUTPUT_SUFFIX);
            PathBuf::from(path)
        }
    }
}

/// Serialize a flattened table in the requested format
pub fn render_table(table: &FlatTable, options: &ConvertOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Delimited => {
            let mut writer = DelimitedWriter::new(Vec::new(), options.writer.clone())?;
            writer
                .write_table(&table.columns, &table.rows)
                .context("Failed to write delimited table")?;
            Ok(writer.into_inner())
        }
        OutputFormat::Ndjson => {
            let mut writer = JsonRowsWriter::new(Vec::new());
            writer
                .write_rows(&table.rows)
                .context("Failed to write JSON rows")?;
            Ok(writer.into_inner())
        }
    }
}

/// Parse, flatten and render an XML document held in memory
pub fn convert_str(xml: &str, options: &ConvertOptions) -> Result<(FlatTable, Vec<u8>)> {
    let root = Element::parse_str(xml).context("Failed to parse XML")?;
    let table = TreeFlattener::new(options.flatten.clone()).extract_rows(&root);
    let rendered = render_table(&table, options)?;
    Ok((table, rendered))
}

/// Like `convert_str`, for raw bytes that must be UTF-8
pub fn convert_bytes(bytes: Vec<u8>, options: &ConvertOptions) -> Result<(FlatTable, Vec<u8>)> {
    let xml = decode_document(bytes).context("Failed to parse XML")?;
    convert_str(&xml, options)
}

/// Main entry point: convert the XML file at `input` and write the result to `output`
///
/// The output is rendered completely in memory first, so a parse or write
/// error never leaves a partial file behind.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertSummary> {
    let bytes = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (table, rendered) = convert_bytes(bytes, options)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    std::fs::write(output, rendered)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let summary = ConvertSummary {
        rows: table.rows.len(),
        columns: table.columns.len(),
    };
    info!(
        "wrote {} rows and {} columns to {}",
        summary.rows,
        summary.columns,
        output.display()
    );
    Ok(summary)
}
