use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use granule::domain::{SelectError, TOLERATED_ERRORS};
use granule::solver::MicroLpBackend;
use granule::{GranularitySelector, RunSummary, SelectorConfig};
use granule_common::{InvalidRegions, JsonFileStore, RegionId, RegionStore};
use tempfile::TempDir;

const FIXTURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Copy a fixture graph into a fresh measures directory.
fn measures_with(fixture: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let graph_path = dir.path().join("graph.json");
    fs::copy(Path::new(FIXTURES).join(fixture), &graph_path).expect("Failed to copy fixture");
    (dir, graph_path)
}

fn run_selection(dir: &Path, graph_path: &Path, target: f64) -> Result<RunSummary, SelectError> {
    let mut config = SelectorConfig::new(dir.join("table_error.csv"));
    config.invalid_list = Some(dir.join("invalid_loops"));
    let mut selector =
        GranularitySelector::new(JsonFileStore::new(graph_path), MicroLpBackend, config)
            .with_diagnostics(io::sink());
    selector.run(target)
}

fn ids(raw: &[u32]) -> Vec<RegionId> {
    raw.iter().copied().map(RegionId).collect()
}

#[test]
fn test_nested_loops_table_and_selection() {
    let (dir, graph_path) = measures_with("nested_loops.json");

    let summary = run_selection(dir.path(), &graph_path, 15.0).expect("Selection failed");

    assert_eq!(summary.regions, 6);
    assert!(summary.target_solved);
    assert_eq!(summary.selection.iter().collect::<Vec<_>>(), ids(&[1, 6]));
    assert_eq!(summary.target_coverage, 90.0);
    assert_eq!(summary.coverage, 90.0);

    let mut expected = String::from("Error,Exec Time\n");
    for err in TOLERATED_ERRORS {
        let coverage = if err < 35.0 { 90 } else { 100 };
        expected.push_str(&format!("{err},{coverage}\n"));
    }
    let csv = fs::read_to_string(dir.path().join("table_error.csv")).expect("No table written");
    assert_eq!(csv, expected);
}

#[test]
fn test_saved_graph_carries_target_annotations() {
    let (dir, graph_path) = measures_with("nested_loops.json");
    run_selection(dir.path(), &graph_path, 15.0).expect("Selection failed");

    let graph = JsonFileStore::new(&graph_path)
        .load_graph()
        .expect("Saved graph unreadable")
        .expect("Saved graph missing");

    assert_eq!(graph.coverage(), 90.0);
    assert_eq!(
        graph.nestings(),
        vec![
            (RegionId(1), RegionId(2)),
            (RegionId(1), RegionId(4)),
            (RegionId(2), RegionId(3)),
        ]
    );

    let matching: Vec<_> = graph.regions().filter(|r| r.matching).map(|r| r.id).collect();
    let selected: Vec<_> = graph.regions().filter(|r| r.selected).map(|r| r.id).collect();
    assert_eq!(matching, ids(&[1, 2, 4, 6]));
    assert_eq!(selected, ids(&[1, 6]));
}

#[test]
fn test_rerun_on_saved_graph_is_stable() {
    let (dir, graph_path) = measures_with("nested_loops.json");

    let first = run_selection(dir.path(), &graph_path, 35.0).expect("First run failed");
    let first_graph = fs::read_to_string(&graph_path).unwrap();
    let first_csv = fs::read_to_string(dir.path().join("table_error.csv")).unwrap();

    let second = run_selection(dir.path(), &graph_path, 35.0).expect("Second run failed");

    assert_eq!(first, second);
    assert_eq!(second.selection.iter().collect::<Vec<_>>(), ids(&[1, 5, 6]));
    assert_eq!(fs::read_to_string(&graph_path).unwrap(), first_graph);
    assert_eq!(fs::read_to_string(dir.path().join("table_error.csv")).unwrap(), first_csv);
}

#[test]
fn test_empty_graph_writes_nothing() {
    let (dir, graph_path) = measures_with("empty.json");
    let before = fs::read_to_string(&graph_path).unwrap();

    let summary = run_selection(dir.path(), &graph_path, 15.0).expect("Selection failed");

    assert_eq!(summary.regions, 0);
    assert!(summary.table.is_empty());
    assert!(summary.selection.is_empty());
    assert!(!dir.path().join("table_error.csv").exists());
    assert_eq!(fs::read_to_string(&graph_path).unwrap(), before);
}

#[test]
fn test_regions_above_every_tolerance_but_the_last() {
    let (dir, graph_path) = measures_with("noisy_regions.json");

    let summary = run_selection(dir.path(), &graph_path, 95.0).expect("Selection failed");

    assert!(summary.selection.is_empty());
    assert_eq!(summary.coverage, 0.0);
    assert_eq!(summary.table.len(), TOLERATED_ERRORS.len());
    assert_eq!(summary.table.coverage_at(95.0), Some(0.0));
    assert_eq!(summary.table.coverage_at(99.9), Some(70.0));
}

#[test]
fn test_off_ladder_target_leaves_files_untouched() {
    let (dir, graph_path) = measures_with("nested_loops.json");
    let before = fs::read_to_string(&graph_path).unwrap();

    let err = run_selection(dir.path(), &graph_path, 12.0).unwrap_err();

    assert!(matches!(err, SelectError::ToleranceNotOnLadder(e) if e == 12.0));
    assert!(!dir.path().join("table_error.csv").exists());
    assert_eq!(fs::read_to_string(&graph_path).unwrap(), before);
}

#[test]
fn test_missing_graph_reports_unavailable() {
    let dir = TempDir::new().unwrap();
    let graph_path = dir.path().join("graph.json");

    let err = run_selection(dir.path(), &graph_path, 15.0).unwrap_err();
    assert!(matches!(err, SelectError::GraphUnavailable(_)));

    let mut selector = GranularitySelector::new(
        JsonFileStore::new(&graph_path),
        MicroLpBackend,
        SelectorConfig::new(dir.path().join("table_error.csv")),
    );
    assert!(!selector.solve_with_best_granularity(15.0).unwrap());
}

#[test]
fn test_invalid_region_is_skipped_but_kept() {
    let (dir, graph_path) = measures_with("nested_loops.json");
    let mut invalid = InvalidRegions::open(dir.path().join("invalid_loops")).unwrap();
    assert!(invalid.mark("main_loop").unwrap());

    let summary = run_selection(dir.path(), &graph_path, 15.0).expect("Selection failed");

    assert_eq!(summary.regions, 5);
    assert_eq!(summary.selection.iter().collect::<Vec<_>>(), ids(&[2, 4, 6]));
    assert_eq!(summary.target_coverage, 80.0);
    assert_eq!(summary.coverage, 83.0);

    let graph = JsonFileStore::new(&graph_path).load_graph().unwrap().unwrap();
    assert_eq!(graph.len(), 6);
    assert_eq!(graph.nestings().len(), 3);
    let main_loop = graph.region(RegionId(1)).unwrap();
    assert!(!main_loop.matching && !main_loop.selected);

    // Unlisting the region brings it back into play on the next run
    fs::write(dir.path().join("invalid_loops"), "").unwrap();
    let restored = run_selection(dir.path(), &graph_path, 15.0).expect("Selection failed");
    assert_eq!(restored.regions, 6);
    assert_eq!(restored.selection.iter().collect::<Vec<_>>(), ids(&[1, 6]));
}

#[test]
fn test_parallel_sweep_writes_same_table() {
    let (seq_dir, seq_graph) = measures_with("nested_loops.json");
    let (par_dir, par_graph) = measures_with("nested_loops.json");

    let sequential = run_selection(seq_dir.path(), &seq_graph, 20.0).unwrap();

    let mut config = SelectorConfig::new(par_dir.path().join("table_error.csv"));
    config.jobs = 4;
    let parallel = GranularitySelector::new(JsonFileStore::new(&par_graph), MicroLpBackend, config)
        .with_diagnostics(io::sink())
        .run(20.0)
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(
        fs::read_to_string(seq_dir.path().join("table_error.csv")).unwrap(),
        fs::read_to_string(par_dir.path().join("table_error.csv")).unwrap()
    );
}
