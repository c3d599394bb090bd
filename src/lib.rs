#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
use thiserror::Error;

pub mod config;
pub mod enumerate;
pub mod gather;
pub mod identifier;
pub mod metapath;
pub mod oracle;
pub mod parser;
pub mod table;
mod triple;

pub use config::{Column, GatherConfig, InputFiles, ListFile};
pub use enumerate::Triples;
pub use gather::{
    CancelToken, GatherInputs, GatherOutcome, GatherReport, Gatherer, RunState, RunStatus,
};
pub use identifier::{Identifier, IdentifierList, MetapathId, SourceId, TargetId};
pub use metapath::{EffectiveMetapaths, IgnoreSet, MetapathCatalog};
pub use oracle::{LookupOracle, OracleError, Outcome, Score, ScoringOracle};
pub use table::{ResultTable, Row, TableBuilder};
pub use triple::Triple;

/// Name of the file with all Biological Processes (sources)
const SOURCE_FILENAME: &str = "BP.csv";
/// Name of the file with all Genes (targets)
const TARGET_FILENAME: &str = "Gene.csv";
/// Name of the file with the full metapath catalog
const METAPATH_FILENAME: &str = "metapaths.csv";
/// Name of the file with all metapaths that must be ignored
const METAPATH_IGNORE_FILENAME: &str = "metapaths_ignore.csv";

const ID_COLUMN: &str = "id";
const METAPATH_COLUMN: &str = "metapath";

const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Main Error type for this crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatherError {
    /// Failed to open or read a file
    #[error("cannot open file {0}")]
    CannotOpenFile(String),
    /// A list file is malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A list does not contain a single identifier
    #[error("the {0} list is empty")]
    EmptyList(&'static str),
    /// An identifier occurs more than once in the same list
    #[error("duplicate identifier {id} in the {list} list")]
    DuplicateIdentifier {
        /// The list that contains the duplicate
        list: &'static str,
        /// The duplicated identifier
        id: String,
    },
    /// The ignore list contains a metapath that is not part of the catalog
    #[error("ignored metapath {0} is not part of the metapath catalog")]
    UnknownIgnoredMetapath(MetapathId),
    /// A metapath was requested that is not part of the effective metapaths
    #[error("metapath {0} is not part of the effective metapaths")]
    UnknownMetapath(MetapathId),
    /// A configuration value is not allowed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A triple was inserted into the result table twice
    #[error("duplicate key: {0} is already present in the result table")]
    DuplicateKey(Triple),
    /// The result table cannot be written
    #[error("unable to export result table: {0}")]
    Export(String),
    /// An operation was called in a state that does not allow it
    #[error("{operation} is not allowed while {state}")]
    InvalidState {
        /// The rejected operation
        operation: &'static str,
        /// The state at the time of the call
        state: &'static str,
    },
}

/// The category of a [`GatherError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed, empty or duplicated input lists
    Load,
    /// Inconsistent metapath configuration or invalid settings
    Config,
    /// A triple was produced or inserted twice
    DuplicateKey,
    /// An operation was invoked in a state that forbids it
    State,
    /// Writing the result table failed
    Export,
}

impl GatherError {
    /// Returns the category of the error
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{ErrorKind, GatherError};
    ///
    /// let err = GatherError::EmptyList("source");
    /// assert_eq!(err.kind(), ErrorKind::Load);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatherError::CannotOpenFile(_)
            | GatherError::InvalidInput(_)
            | GatherError::EmptyList(_)
            | GatherError::DuplicateIdentifier { .. } => ErrorKind::Load,
            GatherError::UnknownIgnoredMetapath(_)
            | GatherError::UnknownMetapath(_)
            | GatherError::InvalidConfig(_) => ErrorKind::Config,
            GatherError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            GatherError::InvalidState { .. } => ErrorKind::State,
            GatherError::Export(_) => ErrorKind::Export,
        }
    }
}

/// Shortcut for `Result<T, GatherError>`
pub type GatherResult<T> = Result<T, GatherError>;
