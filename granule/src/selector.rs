//! Granularity selector: the end-to-end selection run.
//!
//! ```text
//! load graph ──► look up invalid regions ──► sweep ladder ──► solve target
//!                                           │                  │
//!                                           ▼                  ▼
//!                                  table_error.csv      selection listing
//!                                                              │
//!                                                              ▼
//!                                                 annotate + save graph
//! ```
//!
//! The sweep runs one relaxation search per ladder entry. Each search works on
//! its own annotation snapshot and only reads the graph, so with `jobs > 1`
//! ladder entries are spread over scoped worker threads fed by a channel. The
//! table is assembled in ladder order afterwards and is identical whatever
//! the job count.

use crossbeam_channel::unbounded;
use granule_common::{InvalidRegions, Reachability, RegionGraph, RegionId, RegionStore};
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::domain::{SelectError, SolverError, Tolerance, TOLERATED_ERRORS};
use crate::report::{write_selection_report, ErrorCoverageTable};
use crate::search::{Relaxation, RelaxationSearch};
use crate::selection::Selection;
use crate::solver::SolverBackend;

/// Everything the selector needs besides its store and backend.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Where the error/coverage table is written.
    pub report_path: PathBuf,
    /// Invalid-region list; listed regions are never selected.
    pub invalid_list: Option<PathBuf>,
    pub search: RelaxationSearch,
    /// Worker threads for the ladder sweep (1 = sequential).
    pub jobs: usize,
}

impl SelectorConfig {
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        Self {
            report_path: report_path.into(),
            invalid_list: None,
            search: RelaxationSearch::default(),
            jobs: 1,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub target_error: f64,
    /// Regions eligible for selection (invalid regions excluded).
    pub regions: usize,
    /// Empty when the graph had no regions.
    pub table: ErrorCoverageTable,
    pub selection: Selection,
    /// Coverage floor reached at the target error (0 if unsolvable).
    pub target_coverage: f64,
    /// Sum of coverage over the selected regions.
    pub coverage: f64,
    pub target_solved: bool,
}

pub struct GranularitySelector<S, B> {
    store: S,
    backend: B,
    config: SelectorConfig,
    diagnostics: Box<dyn Write>,
}

impl<S, B> GranularitySelector<S, B>
where
    S: RegionStore,
    B: SolverBackend + Sync,
{
    /// Selector writing its selection listing to stderr.
    pub fn new(store: S, backend: B, config: SelectorConfig) -> Self {
        Self { store, backend, config, diagnostics: Box::new(io::stderr()) }
    }

    /// Redirect the selection listing.
    #[must_use]
    pub fn with_diagnostics(mut self, out: impl Write + 'static) -> Self {
        self.diagnostics = Box::new(out);
        self
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run the selection and report only whether it completed.
    ///
    /// Returns `Ok(false)` if the region graph could not be loaded.
    ///
    /// # Errors
    /// A target error outside the ladder, solver failures, and report or
    /// store write failures.
    pub fn solve_with_best_granularity(&mut self, target_error: f64) -> Result<bool, SelectError> {
        match self.run(target_error) {
            Ok(_) => Ok(true),
            Err(SelectError::GraphUnavailable(reason)) => {
                error!("Cannot load region graph ({reason}). Was the program profiled?");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Full selection run for `target_error`.
    ///
    /// The target is checked against the ladder before the store is touched.
    /// An unsolvable target is logged and yields an empty selection; the
    /// table and the graph are still written.
    ///
    /// # Errors
    /// [`SelectError::ToleranceNotOnLadder`], [`SelectError::GraphUnavailable`],
    /// solver failures, and report or store write failures.
    pub fn run(&mut self, target_error: f64) -> Result<RunSummary, SelectError> {
        let target = Tolerance::on_ladder(target_error)?;

        let mut graph = match self.store.load_graph() {
            Ok(Some(graph)) => graph,
            Ok(None) => return Err(SelectError::GraphUnavailable("no graph recorded".into())),
            Err(e) => return Err(SelectError::GraphUnavailable(e.to_string())),
        };

        let invalid = match &self.config.invalid_list {
            Some(path) => {
                let invalid = InvalidRegions::open(path)?.listed_in(&graph);
                if !invalid.is_empty() {
                    let count = invalid.len();
                    warn!("Ignoring {count} invalid regions listed in {}", path.display());
                }
                invalid
            }
            None => BTreeSet::new(),
        };

        if graph.is_empty() {
            info!("Graph is empty, nothing to select");
            return Ok(RunSummary {
                target_error: target.percent(),
                regions: 0,
                table: ErrorCoverageTable::new(),
                selection: Selection::new(),
                target_coverage: 0.0,
                coverage: 0.0,
                target_solved: true,
            });
        }

        let reach = Reachability::of(&graph);
        let table = self.sweep(&graph, &reach, &invalid)?;

        let relaxation =
            self.config.search.solve(&graph, &reach, &self.backend, target.percent(), &invalid)?;
        let (selection, target_coverage, target_solved) = match &relaxation {
            Relaxation::Found { selection, coverage, .. } => (selection.clone(), *coverage, true),
            Relaxation::Unsolvable { .. } => {
                error!("Solution impossible at {target}% error");
                (Selection::new(), 0.0, false)
            }
        };

        table
            .write_to_path(&self.config.report_path)
            .map_err(|source| SelectError::ReportFailed {
                path: self.config.report_path.clone(),
                source,
            })?;
        info!("Solved with coverage >= {target_coverage}");

        let coverage = write_selection_report(&graph, &selection, &mut self.diagnostics)?;
        relaxation.annotations().apply_to(&mut graph);
        graph.set_coverage(coverage);
        self.store.save_graph(&graph)?;

        Ok(RunSummary {
            target_error: target.percent(),
            regions: graph.len() - invalid.len(),
            table,
            selection,
            target_coverage,
            coverage,
            target_solved,
        })
    }

    /// Build the error/coverage table over the whole ladder.
    ///
    /// A tolerance with no feasible floor repeats the previous row's
    /// coverage (0 for the first row).
    fn sweep(
        &self,
        graph: &RegionGraph,
        reach: &Reachability,
        invalid: &BTreeSet<RegionId>,
    ) -> Result<ErrorCoverageTable, SolverError> {
        let search = self.config.search;
        let outcomes = if self.config.jobs > 1 {
            self.sweep_parallel(graph, reach, invalid)?
        } else {
            TOLERATED_ERRORS
                .iter()
                .map(|&err| {
                    info!("Computing matching with a maximum error of {err}%");
                    Ok(search.solve(graph, reach, &self.backend, err, invalid)?.coverage())
                })
                .collect::<Result<Vec<_>, SolverError>>()?
        };

        let mut table = ErrorCoverageTable::new();
        let mut last = 0.0;
        for (&err, outcome) in TOLERATED_ERRORS.iter().zip(outcomes) {
            match outcome {
                Some(coverage) => last = coverage,
                None => warn!("No feasible coverage at {err}% error, keeping {last}"),
            }
            table.record(err, last);
        }
        Ok(table)
    }

    fn sweep_parallel(
        &self,
        graph: &RegionGraph,
        reach: &Reachability,
        invalid: &BTreeSet<RegionId>,
    ) -> Result<Vec<Option<f64>>, SolverError> {
        let (work_tx, work_rx) = unbounded::<(usize, f64)>();
        let (result_tx, result_rx) = unbounded();
        for entry in TOLERATED_ERRORS.iter().copied().enumerate() {
            if work_tx.send(entry).is_err() {
                break;
            }
        }
        drop(work_tx);

        let search = self.config.search;
        let backend = &self.backend;
        let workers = self.config.jobs.min(TOLERATED_ERRORS.len());

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, err) in work_rx {
                        info!("Computing matching with a maximum error of {err}%");
                        let outcome = search
                            .solve(graph, reach, backend, err, invalid)
                            .map(|r| r.coverage());
                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut outcomes = vec![None; TOLERATED_ERRORS.len()];
        for (index, outcome) in result_rx {
            outcomes[index] = outcome?;
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::tests::Exhaustive;
    use crate::solver::{Assignment, CoverageProgram};
    use granule_common::{MemoryStore, Region, RegionId};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Shared buffer usable as the diagnostics sink.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    /// Fails every solve it is given.
    struct Broken;

    /// Never finds a feasible assignment.
    struct AlwaysInfeasible;

    impl SolverBackend for AlwaysInfeasible {
        fn name(&self) -> &'static str {
            "infeasible"
        }

        fn solve(&self, _program: &CoverageProgram) -> Result<Assignment, SolverError> {
            Ok(Assignment::Infeasible)
        }
    }

    /// Solves exactly while some region is excluded, infeasible once every
    /// region matches.
    struct InfeasibleWhenAllMatch;

    impl SolverBackend for InfeasibleWhenAllMatch {
        fn name(&self) -> &'static str {
            "picky"
        }

        fn solve(&self, program: &CoverageProgram) -> Result<Assignment, SolverError> {
            if program.excluded().is_empty() {
                Ok(Assignment::Infeasible)
            } else {
                Exhaustive.solve(program)
            }
        }
    }

    impl SolverBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn solve(&self, _program: &CoverageProgram) -> Result<Assignment, SolverError> {
            Err(SolverError::Backend("license expired".into()))
        }
    }

    fn scenario_b() -> RegionGraph {
        let mut graph = RegionGraph::new();
        graph.add_region(Region::new(1, "A", 0.0, 60.0)).unwrap();
        graph.add_region(Region::new(2, "B", 0.0, 40.0)).unwrap();
        graph.add_nesting(RegionId(1), RegionId(2)).unwrap();
        graph
    }

    fn selector<'a>(
        store: &'a MemoryStore,
        dir: &TempDir,
    ) -> (GranularitySelector<&'a MemoryStore, Exhaustive>, Captured) {
        let sink = Captured::default();
        let config = SelectorConfig::new(dir.path().join("table_error.csv"));
        let selector =
            GranularitySelector::new(store, Exhaustive, config).with_diagnostics(sink.clone());
        (selector, sink)
    }

    #[test]
    fn test_off_ladder_target_rejected_before_loading() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::empty();
        let (mut selector, _) = selector(&store, &dir);

        let err = selector.run(12.0).unwrap_err();
        assert!(matches!(err, SelectError::ToleranceNotOnLadder(_)));
        assert!(selector.solve_with_best_granularity(12.0).is_err());
    }

    #[test]
    fn test_missing_graph_is_unsuccessful() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::empty();
        let (mut selector, _) = selector(&store, &dir);

        assert!(!selector.solve_with_best_granularity(5.0).unwrap());
        assert!(!dir.path().join("table_error.csv").exists());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_empty_graph_skips_sweep() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(RegionGraph::new());
        let (mut selector, sink) = selector(&store, &dir);

        assert!(selector.solve_with_best_granularity(5.0).unwrap());
        assert!(!dir.path().join("table_error.csv").exists());
        assert_eq!(store.save_count(), 0);
        assert!(sink.text().is_empty());
    }

    #[test]
    fn test_scenario_selects_outer_region() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(scenario_b());
        let (mut selector, sink) = selector(&store, &dir);

        let summary = selector.run(5.0).unwrap();

        assert!(summary.target_solved);
        assert_eq!(summary.selection.iter().collect::<Vec<_>>(), vec![RegionId(1)]);
        assert_eq!(summary.target_coverage, 60.0);
        assert_eq!(summary.table.len(), TOLERATED_ERRORS.len());
        assert!(summary.table.rows().iter().all(|r| r.coverage == 60.0));
        assert_eq!(sink.text(), "> A 60\n");

        let saved = store.graph().unwrap();
        assert_eq!(saved.coverage(), 60.0);
        assert!(saved.region(RegionId(1)).unwrap().selected);
        assert!(saved.region(RegionId(2)).unwrap().matching);
        assert!(!saved.region(RegionId(2)).unwrap().selected);

        let csv = std::fs::read_to_string(dir.path().join("table_error.csv")).unwrap();
        assert!(csv.starts_with("Error,Exec Time\n5,60\n10,60\n"));
        assert!(csv.ends_with("95,60\n99.9,60\n"));
    }

    #[test]
    fn test_only_loosest_tolerance_admits_noisy_regions() {
        let mut graph = RegionGraph::new();
        graph.add_region(Region::new(1, "noisy_a", 97.0, 55.0)).unwrap();
        graph.add_region(Region::new(2, "noisy_b", 99.0, 30.0)).unwrap();
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(graph);
        let (mut selector, _) = selector(&store, &dir);

        let summary = selector.run(99.9).unwrap();
        let rows = summary.table.rows();

        assert!(rows[..rows.len() - 1].iter().all(|r| r.coverage == 0.0));
        assert_eq!(rows.last().unwrap().coverage, 85.0);
        assert_eq!(summary.coverage, 85.0);
    }

    #[test]
    fn test_parallel_sweep_matches_sequential() {
        let mut graph = scenario_b();
        graph.add_region(Region::new(3, "C", 12.0, 30.0)).unwrap();
        graph.add_region(Region::new(4, "D", 42.0, 10.0)).unwrap();
        let reach = Reachability::of(&graph);

        let store = MemoryStore::empty();
        let config = SelectorConfig::new("unused");
        let sequential = GranularitySelector::new(&store, Exhaustive, config);
        let mut config = SelectorConfig::new("unused");
        config.jobs = 4;
        let parallel = GranularitySelector::new(&store, Exhaustive, config);

        let none = BTreeSet::new();
        let expected = sequential.sweep(&graph, &reach, &none).unwrap();
        assert_eq!(parallel.sweep(&graph, &reach, &none).unwrap(), expected);
        assert_eq!(expected.coverage_at(10.0), Some(60.0));
        assert_eq!(expected.coverage_at(15.0), Some(90.0));
        assert_eq!(expected.coverage_at(45.0), Some(100.0));
    }

    #[test]
    fn test_solver_failure_aborts_run() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(scenario_b());
        let config = SelectorConfig::new(dir.path().join("table_error.csv"));
        let mut selector = GranularitySelector::new(&store, Broken, config);

        let err = selector.solve_with_best_granularity(5.0).unwrap_err();
        assert!(matches!(err, SelectError::Solver(SolverError::Backend(_))));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_invalid_regions_are_skipped_but_kept() {
        let dir = TempDir::new().unwrap();
        let invalid = dir.path().join("invalid_loops");
        std::fs::write(&invalid, "A\n").unwrap();
        let store = MemoryStore::with_graph(scenario_b());
        let mut config = SelectorConfig::new(dir.path().join("table_error.csv"));
        config.invalid_list = Some(invalid);
        let mut selector = GranularitySelector::new(&store, Exhaustive, config)
            .with_diagnostics(Captured::default());

        let summary = selector.run(5.0).unwrap();

        assert_eq!(summary.regions, 1);
        assert_eq!(summary.selection.iter().collect::<Vec<_>>(), vec![RegionId(2)]);
        assert_eq!(summary.target_coverage, 40.0);

        let saved = store.graph().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved.nestings(), vec![(RegionId(1), RegionId(2))]);
        let a = saved.region(RegionId(1)).unwrap();
        assert!(!a.matching && !a.selected);
        assert!(saved.region(RegionId(2)).unwrap().selected);
    }

    #[test]
    fn test_unsolvable_target_still_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(scenario_b());
        let config = SelectorConfig::new(dir.path().join("table_error.csv"));
        let sink = Captured::default();
        let mut selector = GranularitySelector::new(&store, AlwaysInfeasible, config)
            .with_diagnostics(sink.clone());

        let summary = selector.run(5.0).unwrap();

        assert!(!summary.target_solved);
        assert!(summary.selection.is_empty());
        assert_eq!(summary.coverage, 0.0);
        assert_eq!(summary.table.len(), TOLERATED_ERRORS.len());
        assert!(summary.table.rows().iter().all(|r| r.coverage == 0.0));
        assert!(sink.text().is_empty());

        assert_eq!(store.save_count(), 1);
        let saved = store.graph().unwrap();
        assert_eq!(saved.coverage(), 0.0);
        assert!(saved.regions().all(|r| !r.selected));

        let csv = std::fs::read_to_string(dir.path().join("table_error.csv")).unwrap();
        assert!(csv.starts_with("Error,Exec Time\n5,0\n10,0\n"));
        assert_eq!(csv.lines().count(), TOLERATED_ERRORS.len() + 1);
    }

    #[test]
    fn test_infeasible_tolerance_repeats_previous_row() {
        let mut graph = scenario_b();
        graph.add_region(Region::new(3, "C", 12.0, 30.0)).unwrap();
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_graph(graph);
        let config = SelectorConfig::new(dir.path().join("table_error.csv"));
        let mut selector = GranularitySelector::new(&store, InfeasibleWhenAllMatch, config)
            .with_diagnostics(Captured::default());

        // From 15% on C matches too, the backend gives up, and 60 carries over
        let summary = selector.run(15.0).unwrap();

        assert_eq!(summary.table.coverage_at(5.0), Some(60.0));
        assert_eq!(summary.table.coverage_at(10.0), Some(60.0));
        assert_eq!(summary.table.coverage_at(15.0), Some(60.0));
        assert_eq!(summary.table.coverage_at(99.9), Some(60.0));
        assert!(!summary.target_solved);
        assert_eq!(summary.target_coverage, 0.0);
        assert_eq!(store.save_count(), 1);
    }
}
