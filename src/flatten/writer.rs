use crate::error::WriteError;
use crate::flatten::types::{ColumnSet, RowRecord};
use std::io::Write;

/// Dialect for delimited output
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Field separator, usually a single character
    pub delimiter: String,

    /// Character used to wrap fields that need quoting
    pub quote: char,

    pub line_terminator: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            delimiter: String::from(","),
            quote: '"',
            line_terminator: String::from("\r\n"),
        }
    }
}

impl WriterConfig {
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        WriterConfig {
            delimiter: delimiter.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), WriteError> {
        let reason = if self.delimiter.is_empty() {
            "delimiter must not be empty"
        } else if self.delimiter.contains(self.quote) {
            "delimiter must not contain the quote character"
        } else if self.delimiter.contains(['\r', '\n']) {
            "delimiter must not contain a line break"
        } else {
            return Ok(());
        };
        Err(WriteError::InvalidDelimiter {
            delimiter: self.delimiter.clone(),
            reason,
        })
    }
}

/// Writes a flattened table as delimited text: a sorted header line, then
/// one line per row with empty fields for the columns a row does not have
pub struct DelimitedWriter<W: Write> {
    writer: W,
    config: WriterConfig,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W, config: WriterConfig) -> Result<Self, WriteError> {
        config.validate()?;
        Ok(DelimitedWriter { writer, config })
    }

    /// Write the header and every row
    ///
    /// Each row is checked against the header before anything of it is
    /// written; a key outside the header is a `WriteError::UnknownColumn`.
    pub fn write_table(&mut self, columns: &ColumnSet, rows: &[RowRecord]) -> Result<(), WriteError> {
        self.write_header(columns)?;
        for (idx, row) in rows.iter().enumerate() {
            self.write_row(idx, columns, row)?;
        }
        Ok(())
    }

    pub fn write_header(&mut self, columns: &ColumnSet) -> Result<(), WriteError> {
        let fields: Vec<&str> = columns.iter().collect();
        self.write_record(&fields)
    }

    pub fn write_row(&mut self, idx: usize, columns: &ColumnSet, row: &RowRecord) -> Result<(), WriteError> {
        if let Some(column) = row.keys().find(|key| !columns.contains(key)) {
            return Err(WriteError::UnknownColumn {
                row: idx,
                column: column.to_string(),
            });
        }

        let fields: Vec<&str> = columns
            .iter()
            .map(|column| row.get(column).unwrap_or(""))
            .collect();
        self.write_record(&fields)
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, fields: &[&str]) -> Result<(), WriteError> {
        let mut line = String::new();

        // A lone empty field would otherwise read back as a blank line
        if let [only] = fields {
            if only.is_empty() {
                line.push(self.config.quote);
                line.push(self.config.quote);
            }
        }

        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push_str(&self.config.delimiter);
            }
            self.push_field(&mut line, field);
        }
        line.push_str(&self.config.line_terminator);

        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn push_field(&self, line: &mut String, field: &str) {
        let quote = self.config.quote;
        let needs_quotes = field.contains(self.config.delimiter.as_str())
            || field.contains(quote)
            || field.contains(['\r', '\n']);

        if !needs_quotes {
            line.push_str(field);
            return;
        }

        line.push(quote);
        for c in field.chars() {
            if c == quote {
                line.push(quote);
            }
            line.push(c);
        }
        line.push(quote);
    }
}

/// Writes each row as one JSON object per line
pub struct JsonRowsWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonRowsWriter<W> {
    pub fn new(writer: W) -> Self {
        JsonRowsWriter { writer }
    }

    pub fn write_rows(&mut self, rows: &[RowRecord]) -> Result<(), WriteError> {
        for (idx, row) in rows.iter().enumerate() {
            let json = serde_json::to_string(row)
                .map_err(|source| WriteError::Serialize { row: idx, source })?;
            writeln!(self.writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(delimiter: &str, columns: &ColumnSet, rows: &[RowRecord]) -> String {
        let mut writer = DelimitedWriter::new(Vec::new(), WriterConfig::with_delimiter(delimiter)).unwrap();
        writer.write_table(columns, rows).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_missing_columns_are_empty() {
        let columns: ColumnSet = ["a", "b"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![
            [("a", "v1"), ("b", "v2")].into_iter().collect(),
            [("a", "v3")].into_iter().collect(),
        ];

        assert_eq!(render(",", &columns, &rows), "a,b\r\nv1,v2\r\nv3,\r\n");
    }

    #[test]
    fn test_header_is_sorted() {
        let columns: ColumnSet = ["zeta", "alpha", "mid"].into_iter().collect();
        let output = render("|", &columns, &[]);
        assert_eq!(output, "alpha|mid|zeta\r\n");
    }

    #[test]
    fn test_quoting() {
        let columns: ColumnSet = ["a", "b", "c", "d"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![[
            ("a", "x,y"),
            ("b", "say \"hi\""),
            ("c", "two\nlines"),
            ("d", "plain"),
        ]
        .into_iter()
        .collect()];

        assert_eq!(
            render(",", &columns, &rows),
            "a,b,c,d\r\n\"x,y\",\"say \"\"hi\"\"\",\"two\nlines\",plain\r\n"
        );
    }

    #[test]
    fn test_quoting_follows_delimiter() {
        let columns: ColumnSet = ["a", "b"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![[("a", "x,y"), ("b", "p\tq")].into_iter().collect()];

        assert_eq!(render("\t", &columns, &rows), "a\tb\r\nx,y\t\"p\tq\"\r\n");
    }

    #[test]
    fn test_multi_character_delimiter() {
        let columns: ColumnSet = ["a", "b"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![[("a", "1"), ("b", "2::3")].into_iter().collect()];

        assert_eq!(render("::", &columns, &rows), "a::b\r\n1::\"2::3\"\r\n");
    }

    #[test]
    fn test_single_empty_field_is_quoted() {
        let columns: ColumnSet = ["a"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![RowRecord::new()];

        assert_eq!(render(",", &columns, &rows), "a\r\n\"\"\r\n");
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let columns: ColumnSet = ["a"].into_iter().collect();
        let rows: Vec<RowRecord> = vec![
            [("a", "ok")].into_iter().collect(),
            [("a", "1"), ("stray", "2")].into_iter().collect(),
        ];

        let mut writer = DelimitedWriter::new(Vec::new(), WriterConfig::default()).unwrap();
        let err = writer.write_table(&columns, &rows).unwrap_err();
        match err {
            WriteError::UnknownColumn { row, column } => {
                assert_eq!(row, 1);
                assert_eq!(column, "stray");
            }
            other => panic!("unexpected error: {other}"),
        }

        // nothing of the offending row was written
        let output = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(output, "a\r\nok\r\n");
    }

    #[test]
    fn test_invalid_delimiters() {
        for delimiter in ["", "\"", "\n", "a\r"] {
            let result = DelimitedWriter::new(Vec::new(), WriterConfig::with_delimiter(delimiter));
            assert!(
                matches!(result, Err(WriteError::InvalidDelimiter { .. })),
                "delimiter {delimiter:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_json_rows_writer() {
        let rows: Vec<RowRecord> = vec![
            [("b", "2"), ("a", "1")].into_iter().collect(),
            RowRecord::new(),
        ];

        let mut writer = JsonRowsWriter::new(Vec::new());
        writer.write_rows(&rows).unwrap();
        let output = String::from_utf8(writer.into_inner()).unwrap();

        assert_eq!(output, "{\"a\":\"1\",\"b\":\"2\"}\n{}\n");
    }
}
