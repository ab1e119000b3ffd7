//! XML flattening - turn an element tree into rows and columns
//!
//! Every direct child of the document root becomes a row. Every element
//! below it becomes a column named `{parent}_{tag}_{n}`, where `n` counts
//! earlier occurrences of `tag` in the current sibling scope.
//!
//! The column set is only known once all rows are built, so writing is a
//! second pass over a complete `FlatTable`.

pub mod types;
pub mod tree;
pub mod extractor;
pub mod writer;

pub use types::{ColumnSet, FlatTable, FlattenConfig, RowRecord, TopLevelPrefix};
pub use tree::{decode_document, parse_document, Element};
pub use extractor::{extract_rows, TreeFlattener};
pub use writer::{DelimitedWriter, JsonRowsWriter, WriterConfig};
