//! Gathering the scores of all (source, target, metapath) triples
//!
//! The [`Gatherer`] drives the enumeration of all triples, asks the
//! [`ScoringOracle`] for each of them and collects the results into a
//! [`ResultTable`].

use std::borrow::Cow;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, error, info, trace, warn};

use crate::config::{GatherConfig, InputFiles};
use crate::enumerate::Triples;
use crate::identifier::IdentifierList;
use crate::metapath::{EffectiveMetapaths, MetapathCatalog};
use crate::parser::load_list;
use crate::{
    GatherError, GatherResult, MetapathId, OracleError, Outcome, ResultTable, ScoringOracle,
    SourceId, TableBuilder, TargetId, Triple,
};

/// The sources, targets and metapaths of a gathering run
///
/// All inputs are immutable once loaded and can be read from
/// multiple threads without synchronization.
#[derive(Debug, Clone)]
pub struct GatherInputs {
    sources: IdentifierList<SourceId>,
    targets: IdentifierList<TargetId>,
    metapaths: EffectiveMetapaths,
}

impl GatherInputs {
    /// Constructs new inputs
    pub fn new(
        sources: IdentifierList<SourceId>,
        targets: IdentifierList<TargetId>,
        metapaths: EffectiveMetapaths,
    ) -> Self {
        Self {
            sources,
            targets,
            metapaths,
        }
    }

    /// Constructs new inputs, using the effective metapaths of the catalog
    ///
    /// # Errors
    ///
    /// [`GatherError::UnknownIgnoredMetapath`] if the ignored metapaths
    /// are not part of the catalog
    pub fn from_catalog(
        sources: IdentifierList<SourceId>,
        targets: IdentifierList<TargetId>,
        catalog: &MetapathCatalog,
    ) -> GatherResult<Self> {
        Ok(Self::new(sources, targets, catalog.effective()?))
    }

    /// Loads all lists from CSV files
    ///
    /// # Errors
    ///
    /// - All errors of [`crate::parser::load_list`] for any of the files
    /// - [`GatherError::UnknownIgnoredMetapath`] if the ignored metapaths
    ///   are not part of the catalog
    pub fn load(files: &InputFiles) -> GatherResult<Self> {
        let sources = load_list(&files.sources.path, &files.sources.column)?;
        let targets = load_list(&files.targets.path, &files.targets.column)?;
        let catalog = MetapathCatalog::load(&files.catalog, &files.ignore)?;
        Self::from_catalog(sources, targets, &catalog)
    }

    /// Gathers only the given metapaths
    ///
    /// # Errors
    ///
    /// [`GatherError::UnknownMetapath`] if a metapath is not part of the effective metapaths
    pub fn restrict_metapaths(self, subset: &[MetapathId]) -> GatherResult<Self> {
        let metapaths = self.metapaths.restrict_to(subset)?;
        Ok(Self { metapaths, ..self })
    }

    /// The Biological Processes
    pub fn sources(&self) -> &IdentifierList<SourceId> {
        &self.sources
    }

    /// The Genes
    pub fn targets(&self) -> &IdentifierList<TargetId> {
        &self.targets
    }

    /// The metapaths to gather
    pub fn metapaths(&self) -> &EffectiveMetapaths {
        &self.metapaths
    }

    /// The number of triples that must be scored
    ///
    /// # Examples
    ///
    /// ```
    /// use hetgather::{GatherInputs, IdentifierList, IgnoreSet, MetapathCatalog};
    ///
    /// let catalog = MetapathCatalog::new(
    ///     IdentifierList::try_new(["M1".into(), "M2".into()]).unwrap(),
    ///     IgnoreSet::new(IdentifierList::try_new(["M2".into()]).unwrap()),
    /// );
    /// let inputs = GatherInputs::from_catalog(
    ///     IdentifierList::try_new(["BP1".into()]).unwrap(),
    ///     IdentifierList::try_new(["G1".into(), "G2".into()]).unwrap(),
    ///     &catalog,
    /// ).unwrap();
    ///
    /// assert_eq!(inputs.expected_queries(), 2);
    /// ```
    pub fn expected_queries(&self) -> u64 {
        [self.sources.len(), self.targets.len(), self.metapaths.len()]
            .into_iter()
            .map(|n| u64::try_from(n).unwrap_or(u64::MAX))
            .fold(1u64, u64::saturating_mul)
    }

    /// Returns a lazy iterator of all triples
    pub fn triples(&self) -> Triples<'_> {
        Triples::new(
            self.sources.as_slice(),
            self.targets.as_slice(),
            self.metapaths.as_slice(),
        )
    }
}

/// Where the [`Gatherer`] gets its inputs from
#[derive(Debug)]
enum Inputs {
    Loaded(GatherInputs),
    Files(InputFiles),
}

impl Inputs {
    fn resolve(&self) -> GatherResult<Cow<'_, GatherInputs>> {
        match self {
            Inputs::Loaded(inputs) => Ok(Cow::Borrowed(inputs)),
            Inputs::Files(files) => {
                debug!("Loading inputs from files");
                GatherInputs::load(files).map(Cow::Owned)
            }
        }
    }
}

/// Signals a running [`Gatherer`] to stop
///
/// The token is checked before each triple is scored. Triples that are
/// already being scored are finished and stored. [`Gatherer::retry`]
/// resets the token.
///
/// # Examples
///
/// ```
/// use hetgather::CancelToken;
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Constructs a new token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the cancellation of the run
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` if the cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears a previous cancellation request
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// The lifecycle of a [`Gatherer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Not started yet
    Idle,
    /// Scoring triples
    Running,
    /// All triples were processed
    Completed,
    /// The run was stopped via its [`CancelToken`]
    Cancelled,
    /// The run was aborted by a fatal error
    Failed,
}

impl RunState {
    fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::Failed => "failed",
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a successful run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// All triples were processed
    Completed,
    /// The run was cancelled, the table is partial
    Cancelled,
}

/// Statistics and per-triple failures of a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatherReport {
    expected: u64,
    attempted: u64,
    stored: u64,
    no_path: u64,
    failures: Vec<(Triple, OracleError)>,
    skipped: Vec<Triple>,
    resume_from: Option<usize>,
}

impl GatherReport {
    fn new(expected: u64) -> Self {
        Self {
            expected,
            ..Default::default()
        }
    }

    /// The number of triples of the full enumeration
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// The number of triples that were sent to the oracle
    pub fn attempted(&self) -> u64 {
        self.attempted
    }

    /// The number of triples that were stored in the table
    pub fn stored(&self) -> u64 {
        self.stored
    }

    /// The number of triples without any path
    pub fn no_path(&self) -> u64 {
        self.no_path
    }

    /// The number of triples that could not be scored
    pub fn failed(&self) -> u64 {
        self.failures.len() as u64
    }

    /// All triples that could not be scored and the reason, in enumeration order
    pub fn failures(&self) -> &[(Triple, OracleError)] {
        &self.failures
    }

    /// All triples that could not be scored, in enumeration order
    pub fn failed_triples(&self) -> impl Iterator<Item = &Triple> {
        self.failures.iter().map(|(triple, _)| triple)
    }

    /// Triples that were not scored because the run was cancelled
    ///
    /// Triples after [`GatherReport::resume_from`] are not listed.
    pub fn skipped(&self) -> &[Triple] {
        &self.skipped
    }

    /// The position in the enumeration where a cancelled run stopped
    ///
    /// `None` if the run reached the end of the enumeration.
    pub fn resume_from(&self) -> Option<usize> {
        self.resume_from
    }

    /// Returns `true` if some triples were not scored successfully
    ///
    /// These triples are scored by [`Gatherer::retry`].
    pub fn has_remaining(&self) -> bool {
        !self.failures.is_empty() || !self.skipped.is_empty() || self.resume_from.is_some()
    }

    fn record(
        &mut self,
        builder: &mut TableBuilder,
        triple: Triple,
        result: Result<Outcome, OracleError>,
    ) -> GatherResult<()> {
        self.attempted += 1;
        match result {
            Ok(Outcome::Scored(score)) => {
                builder.insert(triple, score)?;
                self.stored += 1;
            }
            Ok(Outcome::NoPath) => {
                trace!("No path for {}", triple);
                self.no_path += 1;
            }
            Err(err) => {
                warn!("Unable to score {}: {}", triple, err);
                self.failures.push((triple, err));
            }
        }
        Ok(())
    }
}

impl Display for GatherReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "attempted {} of {} triples: {} stored, {} without path, {} failed",
            self.attempted,
            self.expected,
            self.stored,
            self.no_path,
            self.failed()
        )
    }
}

/// The result of a successful run
#[derive(Debug, Clone)]
pub struct GatherOutcome {
    status: RunStatus,
    table: ResultTable,
    report: GatherReport,
}

impl GatherOutcome {
    /// Whether the run completed or was cancelled
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The finalized table, partial if the run was cancelled
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Statistics and failures of the run
    pub fn report(&self) -> &GatherReport {
        &self.report
    }

    /// Splits the outcome into its table and report
    pub fn into_parts(self) -> (ResultTable, GatherReport) {
        (self.table, self.report)
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Gathers the scores of all triples into a [`ResultTable`]
///
/// A `Gatherer` runs once. Afterwards it can only [`retry`](Gatherer::retry)
/// the triples that failed or were not reached because of a cancellation.
///
/// ```mermaid
/// stateDiagram-v2
///     [*] --> Idle
///     Idle --> Running: run
///     Running --> Completed
///     Running --> Cancelled: CancelToken
///     Running --> Failed: fatal error
///     Completed --> Running: retry
///     Cancelled --> Running: retry
/// ```
///
/// Per-triple [`OracleError`]s do not stop the run, they are collected in the
/// [`GatherReport`]. The run fails only if the inputs cannot be loaded, the
/// metapath configuration is inconsistent or the same triple is stored twice.
///
/// # Examples
///
/// ```
/// use hetgather::{
///     GatherConfig, GatherInputs, Gatherer, IdentifierList, IgnoreSet, MetapathCatalog,
///     OracleError, Outcome, RunStatus, Score, Triple,
/// };
///
/// let catalog = MetapathCatalog::new(
///     IdentifierList::try_new(["M1".into(), "M2".into()]).unwrap(),
///     IgnoreSet::new(IdentifierList::try_new(["M2".into()]).unwrap()),
/// );
/// let inputs = GatherInputs::from_catalog(
///     IdentifierList::try_new(["BP1".into()]).unwrap(),
///     IdentifierList::try_new(["G1".into(), "G2".into()]).unwrap(),
///     &catalog,
/// ).unwrap();
///
/// let oracle = |triple: &Triple| -> Result<Outcome, OracleError> {
///     if triple.target() == "G1" {
///         Ok(Outcome::Scored(Score::new(0.42, 0.01)))
///     } else {
///         Ok(Outcome::NoPath)
///     }
/// };
///
/// let mut gatherer = Gatherer::new(inputs, oracle, GatherConfig::default());
/// let outcome = gatherer.run().unwrap();
///
/// assert_eq!(outcome.status(), RunStatus::Completed);
/// assert_eq!(outcome.table().len(), 1);
/// assert_eq!(outcome.report().no_path(), 1);
/// ```
#[derive(Debug)]
pub struct Gatherer<O> {
    inputs: Inputs,
    oracle: O,
    config: GatherConfig,
    cancel: CancelToken,
    state: RunState,
}

impl<O: ScoringOracle> Gatherer<O> {
    /// Constructs a new `Gatherer` from loaded inputs
    pub fn new(inputs: GatherInputs, oracle: O, config: GatherConfig) -> Self {
        Self::with_inputs(Inputs::Loaded(inputs), oracle, config)
    }

    /// Constructs a new `Gatherer` that loads its inputs when the run starts
    ///
    /// Errors while loading the files make the run fail.
    pub fn from_files(files: InputFiles, oracle: O, config: GatherConfig) -> Self {
        Self::with_inputs(Inputs::Files(files), oracle, config)
    }

    fn with_inputs(inputs: Inputs, oracle: O, config: GatherConfig) -> Self {
        Self {
            inputs,
            oracle,
            config,
            cancel: CancelToken::new(),
            state: RunState::Idle,
        }
    }

    /// Uses `token` to cancel the run
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle to cancel the run, e.g. from another thread
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The current state of the `Gatherer`
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The scoring backend
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Scores all triples and returns the finalized [`ResultTable`]
    ///
    /// # Errors
    ///
    /// - [`GatherError::InvalidState`]: The `Gatherer` is not idle
    /// - Load errors: The input files cannot be loaded
    /// - Config errors: The ignored metapaths are not part of the catalog,
    ///   or the worker pool cannot be created
    /// - [`GatherError::DuplicateKey`]: A triple was scored twice
    pub fn run(&mut self) -> GatherResult<GatherOutcome> {
        self.start("run", &[RunState::Idle])?;
        let result = self.load_inputs().and_then(|()| self.gather_all());
        self.finish(result)
    }

    /// Continues after a previous run or retry
    ///
    /// Scores the failed and skipped triples of `report` and, if the previous
    /// run was cancelled, all triples it did not reach. The [`CancelToken`]
    /// is reset before the retry starts.
    ///
    /// The returned table contains all rows of `table` and the rows of
    /// the newly scored triples. The report covers only the retried triples.
    ///
    /// # Errors
    ///
    /// - [`GatherError::InvalidState`]: The `Gatherer` did not complete or cancel a run
    /// - [`GatherError::DuplicateKey`]: A retried triple is already part of `table`
    pub fn retry(
        &mut self,
        table: ResultTable,
        report: &GatherReport,
    ) -> GatherResult<GatherOutcome> {
        self.start("retry", &[RunState::Completed, RunState::Cancelled])?;
        self.cancel.reset();
        let result = self.gather_remaining(table, report);
        self.finish(result)
    }

    fn start(&mut self, operation: &'static str, allowed: &[RunState]) -> GatherResult<()> {
        if !allowed.contains(&self.state) {
            return Err(GatherError::InvalidState {
                operation,
                state: self.state.as_str(),
            });
        }
        self.state = RunState::Running;
        Ok(())
    }

    fn finish(&mut self, result: GatherResult<GatherOutcome>) -> GatherResult<GatherOutcome> {
        match result {
            Ok(outcome) => {
                self.state = match outcome.status {
                    RunStatus::Completed => RunState::Completed,
                    RunStatus::Cancelled => RunState::Cancelled,
                };
                info!("Gathering {}: {}", self.state, outcome.report);
                Ok(outcome)
            }
            Err(err) => {
                error!("Gathering failed: {}", err);
                self.state = RunState::Failed;
                Err(err)
            }
        }
    }

    /// Loads the input files once, so that retries use the same inputs
    fn load_inputs(&mut self) -> GatherResult<()> {
        if let Inputs::Files(files) = &self.inputs {
            debug!("Loading inputs from files");
            let inputs = GatherInputs::load(files)?;
            self.inputs = Inputs::Loaded(inputs);
        }
        Ok(())
    }

    fn gather_all(&self) -> GatherResult<GatherOutcome> {
        let inputs = self.inputs.resolve()?;
        let mut report = GatherReport::new(inputs.expected_queries());
        info!(
            "Gathering {} sources x {} targets x {} metapaths = {} triples",
            inputs.sources().len(),
            inputs.targets().len(),
            inputs.metapaths().len(),
            report.expected
        );
        let mut builder = TableBuilder::new();
        let status = self.gather(
            Vec::new(),
            Some(inputs.triples()),
            &mut builder,
            &mut report,
        )?;
        Self::conclude(status, builder, report)
    }

    fn gather_remaining(
        &self,
        table: ResultTable,
        previous: &GatherReport,
    ) -> GatherResult<GatherOutcome> {
        let inputs = self.inputs.resolve()?;
        let pending: Vec<Triple> = previous
            .failed_triples()
            .chain(previous.skipped())
            .cloned()
            .collect();
        let remainder = previous
            .resume_from
            .map(|position| inputs.triples().starting_at(position));
        let unreached = remainder.as_ref().map_or(0, ExactSizeIterator::len);

        let mut report = GatherReport::new((pending.len() + unreached) as u64);
        info!(
            "Retrying {} failed and {} skipped triples, {} triples not reached yet",
            previous.failed(),
            previous.skipped.len(),
            unreached
        );
        let mut builder = TableBuilder::from_table(table);
        let status = self.gather(pending, remainder, &mut builder, &mut report)?;
        Self::conclude(status, builder, report)
    }

    fn conclude(
        status: RunStatus,
        mut builder: TableBuilder,
        report: GatherReport,
    ) -> GatherResult<GatherOutcome> {
        let mut table = builder.finalize()?;
        if status == RunStatus::Cancelled {
            table.mark_partial();
        }
        Ok(GatherOutcome {
            status,
            table,
            report,
        })
    }

    /// Scores the `pending` triples first, then the rest of the enumeration
    ///
    /// On cancellation, all triples that were not scored are recorded in the
    /// report, either as skipped or by the position to resume the enumeration.
    fn gather(
        &self,
        pending: Vec<Triple>,
        remainder: Option<Triples<'_>>,
        builder: &mut TableBuilder,
        report: &mut GatherReport,
    ) -> GatherResult<RunStatus> {
        let pool = self.worker_pool()?;
        let chunk_size = self.config.chunk_size();

        let mut pending = pending.into_iter();
        loop {
            let chunk: Vec<Triple> = pending.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            if self.score_chunk(pool.as_ref(), chunk, builder, report)? == RunStatus::Cancelled {
                report.skipped.extend(pending);
                report.resume_from = remainder
                    .filter(|triples| triples.len() > 0)
                    .map(|triples| triples.position());
                return Ok(RunStatus::Cancelled);
            }
        }

        let Some(triples) = remainder else {
            return Ok(RunStatus::Completed);
        };
        let total = triples.total();
        let mut position = triples.position();
        for chunk in triples.chunks(chunk_size) {
            position += chunk.len();
            if self.score_chunk(pool.as_ref(), chunk, builder, report)? == RunStatus::Cancelled {
                report.resume_from = (position < total).then_some(position);
                return Ok(RunStatus::Cancelled);
            }
        }
        Ok(RunStatus::Completed)
    }

    /// Scores a chunk and inserts the results in chunk order
    fn score_chunk(
        &self,
        pool: Option<&ThreadPool>,
        chunk: Vec<Triple>,
        builder: &mut TableBuilder,
        report: &mut GatherReport,
    ) -> GatherResult<RunStatus> {
        debug!("Scoring chunk of {} triples", chunk.len());
        let scored: Vec<(Triple, Option<Result<Outcome, OracleError>>)> = match pool {
            Some(pool) => pool.install(|| {
                chunk
                    .into_par_iter()
                    .map(|triple| self.score_triple(triple))
                    .collect()
            }),
            None => chunk
                .into_iter()
                .map(|triple| self.score_triple(triple))
                .collect(),
        };

        let mut status = RunStatus::Completed;
        for (triple, result) in scored {
            match result {
                Some(result) => report.record(builder, triple, result)?,
                None => {
                    status = RunStatus::Cancelled;
                    report.skipped.push(triple);
                }
            }
        }
        if status == RunStatus::Cancelled {
            warn!("Gathering cancelled after {} triples", report.attempted);
        }
        Ok(status)
    }

    /// Scores a single triple, unless the run was cancelled
    fn score_triple(&self, triple: Triple) -> (Triple, Option<Result<Outcome, OracleError>>) {
        if self.cancel.is_cancelled() {
            return (triple, None);
        }
        let result = self.oracle.score(&triple);
        (triple, Some(result))
    }

    fn worker_pool(&self) -> GatherResult<Option<ThreadPool>> {
        let Some(threads) = self.config.threads() else {
            return Ok(None);
        };
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map(Some)
            .map_err(|err| GatherError::InvalidConfig(format!("unable to start workers: {err}")))
    }
}
