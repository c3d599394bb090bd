//! Settings of a gathering run
//!
//! [`InputFiles`] describes where the source, target and metapath lists
//! are stored, [`GatherConfig`] controls how the triples are scored.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use crate::{GatherError, GatherResult};

/// Selects the column of a list file that holds the identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// The file has a header row, use the column with this name
    Named(String),
    /// The file has no header row, use the first column
    Headerless,
}

impl Column {
    /// Returns `true` if the file is expected to start with a header row
    pub fn has_header(&self) -> bool {
        matches!(self, Column::Named(_))
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Column::Named(name) => write!(f, "'{name}'"),
            Column::Headerless => write!(f, "#1"),
        }
    }
}

/// A list file and the column to read from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFile {
    /// Path to the CSV file
    pub path: PathBuf,
    /// The column with the identifiers
    pub column: Column,
}

impl ListFile {
    /// Constructs a new `ListFile`
    pub fn new<P: Into<PathBuf>>(path: P, column: Column) -> Self {
        Self {
            path: path.into(),
            column,
        }
    }
}

/// The locations of all input lists of a gathering run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    /// Biological Processes
    pub sources: ListFile,
    /// Genes
    pub targets: ListFile,
    /// All known metapaths
    pub catalog: ListFile,
    /// Metapaths that must not be gathered
    pub ignore: ListFile,
}

impl InputFiles {
    /// Uses the default file names and columns inside `folder`
    ///
    /// | List | File | Column |
    /// | --- | --- | --- |
    /// | sources | `BP.csv` | `id` |
    /// | targets | `Gene.csv` | `id` |
    /// | catalog | `metapaths.csv` | `metapath` |
    /// | ignore | `metapaths_ignore.csv` | `metapath` |
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{Column, InputFiles};
    ///
    /// let files = InputFiles::from_folder("data/sources");
    /// assert!(files.sources.path.ends_with("BP.csv"));
    /// assert_eq!(files.ignore.column, Column::Named("metapath".to_string()));
    /// ```
    pub fn from_folder<P: AsRef<Path>>(folder: P) -> Self {
        let path = folder.as_ref();
        let id = || Column::Named(crate::ID_COLUMN.to_string());
        let metapath = || Column::Named(crate::METAPATH_COLUMN.to_string());
        Self {
            sources: ListFile::new(path.join(crate::SOURCE_FILENAME), id()),
            targets: ListFile::new(path.join(crate::TARGET_FILENAME), id()),
            catalog: ListFile::new(path.join(crate::METAPATH_FILENAME), metapath()),
            ignore: ListFile::new(path.join(crate::METAPATH_IGNORE_FILENAME), metapath()),
        }
    }
}

/// Controls how a [`Gatherer`](crate::Gatherer) scores the triples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherConfig {
    chunk_size: usize,
    threads: Option<usize>,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            threads: None,
        }
    }
}

impl GatherConfig {
    /// Sets the number of triples that are scored together before
    /// the results are added to the table
    ///
    /// # Errors
    ///
    /// [`GatherError::InvalidConfig`] if `chunk_size` is 0
    pub fn with_chunk_size(mut self, chunk_size: usize) -> GatherResult<Self> {
        if chunk_size == 0 {
            return Err(GatherError::InvalidConfig(
                "chunk size must be at least 1".to_string(),
            ));
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Scores the triples of each chunk concurrently with `threads` workers
    ///
    /// # Errors
    ///
    /// [`GatherError::InvalidConfig`] if `threads` is 0
    pub fn with_threads(mut self, threads: usize) -> GatherResult<Self> {
        if threads == 0 {
            return Err(GatherError::InvalidConfig(
                "at least one worker thread is required".to_string(),
            ));
        }
        self.threads = Some(threads);
        Ok(self)
    }

    /// Scores all triples one after another in the calling thread
    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.threads = None;
        self
    }

    /// The number of triples per chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The number of worker threads, `None` when scoring sequentially
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn defaults() {
        let config = GatherConfig::default();
        assert_eq!(config.chunk_size(), 1000);
        assert_eq!(config.threads(), None);
    }

    #[test]
    fn invalid_values() {
        let err = GatherConfig::default().with_chunk_size(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        let err = GatherConfig::default().with_threads(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn builder() {
        let config = GatherConfig::default()
            .with_chunk_size(3)
            .and_then(|c| c.with_threads(4))
            .unwrap();
        assert_eq!(config.chunk_size(), 3);
        assert_eq!(config.threads(), Some(4));
        assert_eq!(config.sequential().threads(), None);
    }

    #[test]
    fn column_header() {
        assert!(Column::Named("id".into()).has_header());
        assert!(!Column::Headerless.has_header());
    }
}
