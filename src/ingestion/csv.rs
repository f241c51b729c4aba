//! CSV ingestion implementation.

use std::io::Read;

use tracing::warn;

use crate::error::IngestionResult;
use crate::types::{DataContainer, Scalar};

/// Options for CSV parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter (default `,`).
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Parse CSV bytes into a column-oriented branch container.
///
/// Rules:
///
/// - The first row is the header; each header names one column.
/// - The result has one leaf child per column, labeled with the header text and parent-linked to
///   the returned branch.
/// - Cells keep their original text. Use [`DataContainer::coerce_numeric`] to convert.
/// - Rows shorter than the header yield [`Scalar::Null`] for the missing cells; surplus cells are
///   ignored.
pub fn parse_csv_slice(input: &[u8], options: &CsvOptions) -> IngestionResult<DataContainer> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(input);
    parse_csv_from_reader(&mut rdr)
}

/// Parse CSV text. See [`parse_csv_slice`].
pub fn parse_csv_str(input: &str, options: &CsvOptions) -> IngestionResult<DataContainer> {
    parse_csv_slice(input.as_bytes(), options)
}

/// Parse CSV data from an existing CSV reader (which must be configured with headers).
pub fn parse_csv_from_reader<R: Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<DataContainer> {
    let headers = rdr.headers()?.clone();
    let mut columns: Vec<Vec<Scalar>> = vec![Vec::new(); headers.len()];

    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() > headers.len() {
            // +2: 1-based, and the header is row 1.
            warn!(
                row = row_idx0 + 2,
                cells = record.len(),
                columns = headers.len(),
                "csv row has more cells than headers; extra cells ignored"
            );
        }
        for (idx, column) in columns.iter_mut().enumerate() {
            column.push(record.get(idx).map_or(Scalar::Null, Scalar::from));
        }
    }

    let leaves = headers
        .iter()
        .zip(columns)
        .map(|(header, values)| {
            let leaf = DataContainer::new();
            leaf.set(values).with_label(header);
            leaf
        })
        .collect::<Vec<_>>();

    Ok(DataContainer::branch(leaves))
}
