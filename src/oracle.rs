//! The interface to the backend that calculates DWPC and p-values
//!
//! The gathering engine does not know how the scores are calculated. It only
//! requires a [`ScoringOracle`] that returns an [`Outcome`] for each [`Triple`].
//! The backend can be anything: a live computation service, a cached store or
//! a previously exported table ([`LookupOracle`]).
//!
//! Closures can be used as oracles as well:
//!
//! ```
//! use hetgather::{OracleError, Outcome, Score, ScoringOracle, Triple};
//!
//! let oracle = |triple: &Triple| -> Result<Outcome, OracleError> {
//!     if triple.metapath() == "BPpGdAdG" {
//!         Ok(Outcome::Scored(Score::new(0.42, 0.01)))
//!     } else {
//!         Ok(Outcome::NoPath)
//!     }
//! };
//!
//! let scored = oracle.score(&Triple::from(("GO:0000002", "1", "BPpGdAdG"))).unwrap();
//! assert_eq!(scored, Outcome::Scored(Score::new(0.42, 0.01)));
//! ```

use thiserror::Error;

use crate::{ResultTable, Triple};

/// The degree-weighted path count and its p-value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    dwpc: f64,
    pvalue: f64,
}

impl Score {
    /// Constructs a new `Score`
    pub fn new(dwpc: f64, pvalue: f64) -> Self {
        Self { dwpc, pvalue }
    }

    /// The degree-weighted path count
    pub fn dwpc(&self) -> f64 {
        self.dwpc
    }

    /// The significance of the DWPC compared to a null model
    pub fn pvalue(&self) -> f64 {
        self.pvalue
    }
}

/// The result of scoring a single [`Triple`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// At least one path of the metapath connects source and target
    Scored(Score),
    /// The metapath does not connect source and target
    ///
    /// This is a valid and common outcome, not an error.
    NoPath,
}

/// Scoring of a single triple failed
///
/// Oracle errors are considered transient. They are collected per triple
/// and do not abort a gathering run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// The backend did not answer in time
    #[error("timeout: {0}")]
    Timeout(String),
    /// The backend is temporarily not available
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// Any other failure of the backend
    #[error("backend error: {0}")]
    Backend(String),
}

/// A backend that calculates the DWPC and p-value of a triple
///
/// Implementors must be thread-safe, since triples can be scored
/// concurrently by multiple workers.
pub trait ScoringOracle: Sync {
    /// Returns the score of `triple` or [`Outcome::NoPath`]
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] if the backend fails to score this triple.
    fn score(&self, triple: &Triple) -> Result<Outcome, OracleError>;
}

impl<F> ScoringOracle for F
where
    F: Fn(&Triple) -> Result<Outcome, OracleError> + Sync,
{
    fn score(&self, triple: &Triple) -> Result<Outcome, OracleError> {
        self(triple)
    }
}

/// A [`ScoringOracle`] that looks up precomputed scores in a [`ResultTable`]
///
/// Triples that are not part of the table do not have a path.
///
/// # Examples
///
/// ```
/// use hetgather::{LookupOracle, Outcome, ResultTable, ScoringOracle, Triple};
///
/// let data = "source,target,metapath,dwpc,pvalue\nBP1,G1,M1,0.42,0.01\n";
/// let table = ResultTable::from_csv_reader(data.as_bytes()).unwrap();
/// let oracle = LookupOracle::new(table);
///
/// assert!(matches!(oracle.score(&Triple::from(("BP1", "G1", "M1"))), Ok(Outcome::Scored(_))));
/// assert_eq!(oracle.score(&Triple::from(("BP1", "G2", "M1"))), Ok(Outcome::NoPath));
/// ```
#[derive(Debug, Clone)]
pub struct LookupOracle {
    table: ResultTable,
}

impl LookupOracle {
    /// Constructs a new `LookupOracle` from precomputed scores
    pub fn new(table: ResultTable) -> Self {
        Self { table }
    }

    /// The precomputed scores
    pub fn table(&self) -> &ResultTable {
        &self.table
    }
}

impl ScoringOracle for LookupOracle {
    fn score(&self, triple: &Triple) -> Result<Outcome, OracleError> {
        Ok(self
            .table
            .get(triple)
            .map_or(Outcome::NoPath, |score| Outcome::Scored(*score)))
    }
}
