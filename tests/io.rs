use mip_bugger::tools::{self, read_instance, write_instance};
use mip_bugger::*;
use std::fs;
use std::path::Path;

const PROBLEM: &str = "\
* a small production planning model
NAME plan
ROWS
 N  cost
 L  machine
 G  demand
 E  balance
COLUMNS
    MARKER 'MARKER' 'INTORG'
    open cost 10.5 machine -8
    MARKER 'MARKER' 'INTEND'
    make cost 1.25 machine 1
    make demand 1 balance 1
    store cost 0.1 balance -1
RHS
    RHS demand 3.5
BOUNDS
 BV BND open
 UP BND make 8
ENDATA
";

const SETTINGS: &str = "\
# tuned settings
presolving/maxrounds = 0
lp/initalgorithm = 'd'
limits/time = 3600.0
";

const SOLUTION: &str = "\
status feasible
open 1
make 3.5
store 3.5
";

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn plan(dir: &Path) -> Instance<f64> {
    let settings = write(dir, "plan.set", SETTINGS);
    let problem = write(dir, "plan.mps", PROBLEM);
    let solution = write(dir, "plan.sol", SOLUTION);
    read_instance(Some(&settings), &problem, Some(&solution)).unwrap()
}

#[test]
fn instance_files_are_read() {
    let dir = tempfile::tempdir().unwrap();
    let inst = plan(dir.path());
    assert_eq!(inst.settings.total_len(), 3);
    assert_eq!(inst.settings.find("lp/initalgorithm"), Some(SettingValue::Char('d')));
    assert_eq!(inst.settings.find("limits/time"), Some(SettingValue::Double(3600.)));
    assert_eq!(inst.problem.ncols(), 3);
    assert_eq!(inst.problem.nrows(), 3);
    assert!(inst.problem.domains().is_integral(0));
    assert_eq!(inst.solution.primal, vec![1., 3.5, 3.5]);
    assert!(inst.solution.violations(&inst.problem, &Num::default()).is_empty());
}

#[test]
fn reduced_instance_still_fails_after_writing() {
    let dir = tempfile::tempdir().unwrap();
    let inst = plan(dir.path());
    // The defect: the solver trips over the store column in the balance row.
    let judge = |_: &SolverSettings, pb: &Problem<f64>, _: &Solution<f64>| {
        let balance = pb.row_names().iter().position(|n| n == "balance");
        let store = pb.col_names().iter().position(|n| n == "store");
        match (balance, store) {
            (Some(i), Some(j)) if !pb.is_redundant(i) && pb.matrix().coefficient(i, j).is_some() => {
                Retcode::DUAL_FAIL
            }
            _ => Retcode::OKAY,
        }
    };
    let mut oracle = FnOracle::new(judge);
    let params = BuggerParameters {
        compress: true,
        ..BuggerParameters::default()
    };
    let mut run = BuggerRun::new(params, inst, &mut oracle, None);
    let summary = run.run();
    assert!(summary.reduced());
    let (compressed, maps) = run.into_instance().compress();
    assert_eq!(compressed.problem.nrows(), 1);
    assert_eq!(maps.rows.iter().flatten().count(), 1);
    assert_eq!(compressed.solution.primal.len(), compressed.problem.ncols());

    let stem = dir.path().join("bugged");
    assert_eq!(write_instance(&stem, &compressed, true, true), (true, true, true));
    let back: Instance<f64> = read_instance(
        Some(&dir.path().join("bugged.set")),
        &dir.path().join("bugged.mps"),
        Some(&dir.path().join("bugged.sol")),
    )
    .unwrap();
    assert_eq!(judge(&back.settings, &back.problem, &back.solution), Retcode::DUAL_FAIL);
    assert_eq!(back.settings, compressed.settings);
}

#[test]
fn probes_are_written_to_the_debug_stem() {
    let dir = tempfile::tempdir().unwrap();
    let inst = plan(dir.path());
    let stem = dir.path().join("probe");
    let params = BuggerParameters {
        debugfile: Some(stem.display().to_string()),
        maxrounds: 1,
        ..BuggerParameters::default()
    };
    let mut oracle = FnOracle::new(|_, pb: &Problem<f64>, _| {
        if pb.is_redundant(0) { Retcode::OKAY } else { Retcode::PRIMAL_FAIL }
    });
    let summary = BuggerRun::new(params, inst, &mut oracle, None).run();
    assert!(summary.probes >= 2);
    for n in 1..=summary.probes {
        assert!(dir.path().join(format!("probe_{n}.mps")).exists(), "probe {n}");
        assert!(dir.path().join(format!("probe_{n}.set")).exists());
    }
}

#[test]
fn checkpoint_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let inst = plan(dir.path());
    let path = dir.path().join("state.snap");
    let state = RunState {
        round: 7,
        stage: 4,
        success: 2,
        nbatches: 5,
    };
    tools::save_checkpoint(&path, &inst, &state).unwrap();
    let (back, back_state) = tools::load_checkpoint::<f64, _>(&path).unwrap();
    assert_eq!(back_state, state);
    assert_eq!(back.settings, inst.settings);
    assert_eq!(back.solution, inst.solution);
    assert_eq!(back.problem.col_names(), inst.problem.col_names());
}

#[test]
fn parameter_files_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "bugger.set",
        "bugger.nbatches = 5\nbugger.emphasis = 1\nvarround.enabled = false\nnot a line\n",
    );
    let mut set = ParameterSet::new();
    BuggerParameters::register(&mut set);
    set.read_file(&path).unwrap();
    set.apply_overrides(&["--bugger.maxrounds=3"]).unwrap();
    let params = BuggerParameters::from_set(&set).unwrap();
    assert_eq!(params.nbatches, 5);
    assert_eq!(params.emphasis, Emphasis::Aggressive);
    assert_eq!(params.maxrounds, 3);
    assert!(!params.is_enabled("varround"));
    assert!(set.apply_overrides(&["--bugger.nbatches=-1"]).is_err());
    assert!(set.apply_overrides(&["--no.such=1"]).is_err());
}
