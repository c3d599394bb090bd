//! Parsing the single-column list files and the exported result tables
//!
//! All list files (Biological Processes, Genes, metapaths and ignored
//! metapaths) are CSV files. Identifiers are read from one column that
//! is selected via [`Column`]. All other columns are ignored.
//!
//! ```text
//! id,name
//! GO:0000002,mitochondrial genome maintenance
//! GO:0000003,reproduction
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::config::Column;
use crate::identifier::{Identifier, IdentifierList};
use crate::{GatherError, GatherResult};

/// Opens a file for buffered reading
pub(crate) fn open<P: AsRef<Path>>(path: P) -> GatherResult<BufReader<File>> {
    let filename = path.as_ref().display().to_string();
    File::open(path)
        .map(BufReader::new)
        .map_err(|_| GatherError::CannotOpenFile(filename))
}

/// Reads all values of one column, in file order
///
/// Values are trimmed. Blank values are rejected, since they cannot
/// be a valid identifier.
///
/// # Errors
///
/// - [`GatherError::InvalidInput`]: The header does not contain the column,
///   a record cannot be parsed or contains a blank value
pub fn read_column<R: Read>(reader: R, column: &Column) -> GatherResult<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(column.has_header())
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let idx = match column {
        Column::Headerless => 0,
        Column::Named(name) => {
            let headers = csv_reader
                .headers()
                .map_err(|err| GatherError::InvalidInput(format!("unable to read header: {err}")))?;
            headers.iter().position(|h| h == name).ok_or_else(|| {
                GatherError::InvalidInput(format!("header does not contain the column {name}"))
            })?
        }
    };

    let mut values = Vec::new();
    for record in csv_reader.records() {
        let record = record
            .map_err(|err| GatherError::InvalidInput(format!("unable to parse record: {err}")))?;
        let line = record.position().map_or(0, csv::Position::line);
        match record.get(idx) {
            Some(value) if !value.is_empty() => values.push(value.to_string()),
            _ => {
                return Err(GatherError::InvalidInput(format!(
                    "line {line}: missing value in column {column}"
                )))
            }
        }
    }
    Ok(values)
}

/// Parses an [`IdentifierList`] from any reader
///
/// # Errors
///
/// - [`GatherError::InvalidInput`]: The data is malformed, see [`read_column`]
/// - [`GatherError::EmptyList`]: The column does not contain a single value
/// - [`GatherError::DuplicateIdentifier`]: An identifier occurs more than once
///
/// # Examples
///
/// ```
/// use hetgather::{Column, SourceId};
/// use hetgather::parser::list_from_reader;
///
/// let data = "id,name\nGO:0000002,mitochondrial genome maintenance\nGO:0000003,reproduction\n";
/// let column = Column::Named("id".into());
/// let sources = list_from_reader::<SourceId, _>(data.as_bytes(), &column).unwrap();
///
/// assert_eq!(sources.len(), 2);
/// ```
pub fn list_from_reader<T: Identifier, R: Read>(
    reader: R,
    column: &Column,
) -> GatherResult<IdentifierList<T>> {
    let values = read_column(reader, column)?;
    IdentifierList::try_new(values.iter().map(|value| T::new(value)))
}

/// Parses an [`IdentifierList`] from a CSV file
///
/// # Errors
///
/// - [`GatherError::CannotOpenFile`]: The file is not available
/// - All errors of [`list_from_reader`]
pub fn load_list<T: Identifier, P: AsRef<Path>>(
    path: P,
    column: &Column,
) -> GatherResult<IdentifierList<T>> {
    debug!("Loading {} list from {}", T::KIND, path.as_ref().display());
    let reader = open(path)?;
    list_from_reader(reader, column)
}
