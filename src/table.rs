//! The reference table of all scored triples
//!
//! A [`TableBuilder`] collects the scores of a gathering run and turns
//! into an immutable [`ResultTable`] once the run is done. Each
//! (source, target, metapath) triple can be stored only once.
//!
//! Tables are exported as CSV with the columns
//!
//! ```text
//! source,target,metapath,dwpc,pvalue
//! GO:0000002,1,BPpGdAdG,0.42,0.01
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::identifier::Identifier;
use crate::parser::open;
use crate::{GatherError, GatherResult, MetapathId, Score, SourceId, TargetId, Triple};

/// A single row of the [`ResultTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    triple: Triple,
    score: Score,
}

impl Row {
    /// The (source, target, metapath) key of the row
    pub fn triple(&self) -> &Triple {
        &self.triple
    }

    /// The DWPC and p-value
    pub fn score(&self) -> &Score {
        &self.score
    }
}

/// Serialized layout of a [`Row`]
#[derive(Serialize)]
struct CsvRowRef<'a> {
    source: &'a str,
    target: &'a str,
    metapath: &'a str,
    dwpc: f64,
    pvalue: f64,
}

/// Deserialized layout of a [`Row`]
#[derive(Deserialize)]
struct CsvRow {
    source: String,
    target: String,
    metapath: String,
    dwpc: f64,
    pvalue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuilderState {
    Building,
    Finalized,
}

impl BuilderState {
    fn as_str(self) -> &'static str {
        match self {
            BuilderState::Building => "building",
            BuilderState::Finalized => "finalized",
        }
    }
}

/// Collects scored triples into a [`ResultTable`]
///
/// The builder rejects every triple that is already present, instead of
/// overwriting it. After [`TableBuilder::finalize`] no more rows can be added.
///
/// # Examples
///
/// ```
/// use hetgather::{Score, TableBuilder, Triple};
///
/// let mut builder = TableBuilder::new();
/// builder.insert(Triple::from(("BP1", "G1", "M1")), Score::new(0.42, 0.01)).unwrap();
///
/// // the same triple can't be added twice
/// assert!(builder.insert(Triple::from(("BP1", "G1", "M1")), Score::new(0.5, 0.5)).is_err());
///
/// let table = builder.finalize().unwrap();
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get(&Triple::from(("BP1", "G1", "M1"))).unwrap().dwpc(), 0.42);
///
/// // no more rows after finalizing
/// assert!(builder.insert(Triple::from(("BP1", "G2", "M1")), Score::new(0.1, 0.2)).is_err());
/// ```
#[derive(Debug)]
pub struct TableBuilder {
    rows: Vec<Row>,
    index: HashMap<Triple, usize>,
    state: BuilderState,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Constructs a new, empty builder
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            index: HashMap::new(),
            state: BuilderState::Building,
        }
    }

    /// Constructs a builder that continues with all rows of `table`
    ///
    /// The rows keep their order; new rows are appended.
    pub fn from_table(table: ResultTable) -> Self {
        Self {
            rows: table.rows,
            index: table.index,
            state: BuilderState::Building,
        }
    }

    /// Adds a scored triple
    ///
    /// # Errors
    ///
    /// - [`GatherError::DuplicateKey`]: The triple is already present.
    ///   The existing row is not modified.
    /// - [`GatherError::InvalidState`]: The builder was already finalized
    pub fn insert(&mut self, triple: Triple, score: Score) -> GatherResult<()> {
        self.ensure_building("insert")?;
        match self.index.entry(triple) {
            Entry::Occupied(entry) => {
                error!("Triple {} is already present in the table", entry.key());
                Err(GatherError::DuplicateKey(entry.key().clone()))
            }
            Entry::Vacant(entry) => {
                self.rows.push(Row {
                    triple: entry.key().clone(),
                    score,
                });
                entry.insert(self.rows.len() - 1);
                Ok(())
            }
        }
    }

    /// Returns `true` if the triple is already part of the table
    pub fn contains(&self, triple: &Triple) -> bool {
        self.index.contains_key(triple)
    }

    /// Returns the number of rows added so far
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no row was added yet
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if the builder was finalized
    pub fn is_finalized(&self) -> bool {
        self.state == BuilderState::Finalized
    }

    /// Turns all added rows into a [`ResultTable`]
    ///
    /// Afterwards, the builder does not accept any more rows.
    ///
    /// # Errors
    ///
    /// [`GatherError::InvalidState`] if the builder was already finalized
    pub fn finalize(&mut self) -> GatherResult<ResultTable> {
        self.ensure_building("finalize")?;
        self.state = BuilderState::Finalized;
        debug!("Finalized result table with {} rows", self.rows.len());
        Ok(ResultTable {
            rows: std::mem::take(&mut self.rows),
            index: std::mem::take(&mut self.index),
            partial: false,
        })
    }

    fn ensure_building(&self, operation: &'static str) -> GatherResult<()> {
        match self.state {
            BuilderState::Building => Ok(()),
            state => Err(GatherError::InvalidState {
                operation,
                state: state.as_str(),
            }),
        }
    }
}

/// The immutable reference table of a gathering run
///
/// Each (source, target, metapath) triple occurs at most once. Rows are
/// kept in insertion order, which is the enumeration order of the run.
/// Triples without any path are not part of the table.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    rows: Vec<Row>,
    index: HashMap<Triple, usize>,
    partial: bool,
}

impl ResultTable {
    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table does not contain any row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if the run that built the table was cancelled
    ///
    /// A partial table contains only the triples that were scored
    /// before the cancellation.
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub(crate) fn mark_partial(&mut self) {
        self.partial = true;
    }

    /// Returns the score of a triple, or `None` if the triple is not part of the table
    pub fn get(&self, triple: &Triple) -> Option<&Score> {
        self.index.get(triple).map(|idx| &self.rows[*idx].score)
    }

    /// Returns the score of the metapath between `source` and `target`
    ///
    /// Returns `None` if the triple is not part of the table
    pub fn lookup(
        &self,
        source: &SourceId,
        target: &TargetId,
        metapath: &MetapathId,
    ) -> Option<&Score> {
        self.get(&Triple::new(
            source.clone(),
            target.clone(),
            metapath.clone(),
        ))
    }

    /// Returns an Iterator of all rows in insertion order
    pub fn rows(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Writes the table as CSV, including a header row
    ///
    /// # Errors
    ///
    /// [`GatherError::Export`] if the data cannot be written
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> GatherResult<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if self.is_empty() {
            // serde only writes the header together with the first record
            csv_writer
                .write_record(["source", "target", "metapath", "dwpc", "pvalue"])
                .map_err(|err| GatherError::Export(err.to_string()))?;
        }
        for row in &self.rows {
            csv_writer
                .serialize(CsvRowRef {
                    source: row.triple.source().as_str(),
                    target: row.triple.target().as_str(),
                    metapath: row.triple.metapath().as_str(),
                    dwpc: row.score.dwpc(),
                    pvalue: row.score.pvalue(),
                })
                .map_err(|err| GatherError::Export(err.to_string()))?;
        }
        csv_writer
            .flush()
            .map_err(|err| GatherError::Export(err.to_string()))
    }

    /// Writes the table to a CSV file
    ///
    /// # Errors
    ///
    /// [`GatherError::Export`] if the file cannot be created or written
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> GatherResult<()> {
        let filename = path.as_ref().display().to_string();
        let file = File::create(path)
            .map_err(|err| GatherError::Export(format!("{filename}: {err}")))?;
        self.to_csv_writer(BufWriter::new(file))?;
        debug!("Saved {} rows to {}", self.len(), filename);
        Ok(())
    }

    /// Reads a previously exported table
    ///
    /// # Errors
    ///
    /// - [`GatherError::InvalidInput`]: A row cannot be parsed
    /// - [`GatherError::DuplicateKey`]: A triple occurs more than once
    pub fn from_csv_reader<R: Read>(reader: R) -> GatherResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut builder = TableBuilder::new();
        for record in csv_reader.deserialize() {
            let row: CsvRow = record
                .map_err(|err| GatherError::InvalidInput(format!("unable to parse row: {err}")))?;
            builder.insert(
                Triple::new(
                    SourceId::from(row.source),
                    TargetId::from(row.target),
                    MetapathId::from(row.metapath),
                ),
                Score::new(row.dwpc, row.pvalue),
            )?;
        }
        builder.finalize()
    }

    /// Reads a previously exported table from a CSV file
    ///
    /// # Errors
    ///
    /// - [`GatherError::CannotOpenFile`]: The file is not available
    /// - All errors of [`ResultTable::from_csv_reader`]
    pub fn load_csv<P: AsRef<Path>>(path: P) -> GatherResult<Self> {
        let reader = open(path)?;
        Self::from_csv_reader(reader)
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;
    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    fn triple(s: &'static str, t: &'static str, m: &'static str) -> Triple {
        Triple::from((s, t, m))
    }

    #[test]
    fn duplicate_insert_keeps_first_row() {
        let mut builder = TableBuilder::new();
        builder
            .insert(triple("BP1", "G1", "M1"), Score::new(0.42, 0.01))
            .unwrap();
        let err = builder
            .insert(triple("BP1", "G1", "M1"), Score::new(0.9, 0.9))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(builder.len(), 1);

        let table = builder.finalize().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&triple("BP1", "G1", "M1")), Some(&Score::new(0.42, 0.01)));
    }

    #[test]
    fn state_transition() {
        let mut builder = TableBuilder::new();
        assert!(!builder.is_finalized());
        builder.finalize().unwrap();
        assert!(builder.is_finalized());

        let err = builder
            .insert(triple("BP1", "G1", "M1"), Score::new(0.42, 0.01))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(builder.finalize().is_err());
    }

    #[test]
    fn lookup_and_insertion_order() {
        let mut builder = TableBuilder::new();
        builder.insert(triple("BP2", "G1", "M1"), Score::new(0.1, 0.5)).unwrap();
        builder.insert(triple("BP1", "G1", "M1"), Score::new(0.2, 0.4)).unwrap();
        builder.insert(triple("BP1", "G1", "M2"), Score::new(0.3, 0.3)).unwrap();
        let table = builder.finalize().unwrap();

        let order: Vec<String> = table.rows().map(|row| row.triple().to_string()).collect();
        assert_eq!(order, ["(BP2, G1, M1)", "(BP1, G1, M1)", "(BP1, G1, M2)"]);

        let score = table
            .lookup(&"BP1".into(), &"G1".into(), &"M2".into())
            .unwrap();
        assert_eq!(score, &Score::new(0.3, 0.3));
        assert!(table.lookup(&"BP2".into(), &"G1".into(), &"M2".into()).is_none());
        assert!(!table.is_partial());
    }

    #[test]
    fn continue_from_table() {
        let mut builder = TableBuilder::new();
        builder.insert(triple("BP1", "G1", "M1"), Score::new(0.1, 0.5)).unwrap();
        let table = builder.finalize().unwrap();

        let mut builder = TableBuilder::from_table(table);
        assert!(builder.contains(&triple("BP1", "G1", "M1")));
        assert!(builder.insert(triple("BP1", "G1", "M1"), Score::new(0.1, 0.5)).is_err());
        builder.insert(triple("BP1", "G2", "M1"), Score::new(0.2, 0.5)).unwrap();
        assert_eq!(builder.finalize().unwrap().len(), 2);
    }

    #[test]
    fn export_csv() {
        let mut builder = TableBuilder::new();
        builder.insert(triple("BP1", "G1", "M1"), Score::new(0.42, 0.01)).unwrap();
        builder.insert(triple("BP1", "G2", "M1"), Score::new(1.5e-7, 1.0)).unwrap();
        let table = builder.finalize().unwrap();

        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            "source,target,metapath,dwpc,pvalue\nBP1,G1,M1,0.42,0.01\nBP1,G2,M1,1.5e-7,1.0\n"
        );

        let reread = ResultTable::from_csv_reader(out.as_bytes()).unwrap();
        assert_eq!(reread.len(), 2);
        assert_eq!(reread.get(&triple("BP1", "G2", "M1")), Some(&Score::new(1.5e-7, 1.0)));
    }

    #[test]
    fn export_empty_table_has_header() {
        let table = TableBuilder::new().finalize().unwrap();
        let mut out = Vec::new();
        table.to_csv_writer(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "source,target,metapath,dwpc,pvalue\n"
        );
    }

    #[test]
    fn import_rejects_duplicates() {
        let data = "source,target,metapath,dwpc,pvalue\nBP1,G1,M1,0.1,0.2\nBP1,G1,M1,0.3,0.4\n";
        let err = ResultTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, GatherError::DuplicateKey(_)));
    }

    #[test]
    fn import_rejects_malformed_rows() {
        let data = "source,target,metapath,dwpc,pvalue\nBP1,G1,M1,high,0.2\n";
        let err = ResultTable::from_csv_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, GatherError::InvalidInput(_)));
    }
}
