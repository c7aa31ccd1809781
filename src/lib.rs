//!Delta debugging of mixed-integer programs.
//!
//!Given an instance (a problem, solver settings and a reference solution)
//!on which a solver misbehaves, the crate shrinks it while the misbehavior
//!persists. Reduction modules remove or simplify rows, columns, coefficients
//!and settings by batches, and an `Oracle` decides after every batch whether
//!the defect is still there.
//!
//!# Example
//!
//!```rust,no_run
//!use mip_bugger::*;
//!
//!pub fn main() -> Result<()> {
//!    init_default_log();
//!    let instance = tools::read_instance::<f64>(None, "crash.mps".as_ref(), None)?;
//!    // The defect shows whenever the problem still has a row named "cut".
//!    let mut oracle = FnOracle::new(|_, pb: &Problem<f64>, _| {
//!        if pb.row_names().iter().enumerate().any(|(i, n)| n == "cut" && !pb.is_redundant(i)) {
//!            Retcode::PRIMAL_FAIL
//!        } else {
//!            Retcode::OKAY
//!        }
//!    });
//!    let mut run = BuggerRun::new(BuggerParameters::default(), instance, &mut oracle, None);
//!    let summary = run.run();
//!    println!("{summary}");
//!    tools::write_instance("reduced".as_ref(), run.instance(), true, true);
//!    Ok(())
//!}
//!```
//!

#![warn(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    //unused_qualifications,
    unused_labels,
    //unused_results
)]

mod error;
pub use crate::error::{Error, Result};

pub mod flags;
pub mod matrix;
pub mod numerics;
pub use crate::numerics::{Num, Real};

pub mod problem;
pub use crate::problem::{Problem, ProblemBuilder, ProblemSize};
pub mod settings;
pub use crate::settings::{SettingKind, SettingValue, SolverSettings};
pub mod solution;
pub use crate::solution::{Solution, SolutionStatus};

pub mod modifier;
pub mod oracle;
pub mod params;
pub use crate::oracle::{BuggerStatus, FnOracle, Oracle, Retcode, SolverStatus};
pub use crate::params::{BuggerParameters, Emphasis, Mode, ParameterSet};

pub mod report;
pub mod run;
pub mod tools;
pub use crate::run::{BuggerRun, Instance, RunState, RunSummary};

#[macro_use]
extern crate serde_derive;

use env_logger::{Builder, Env};
use log::LevelFilter;

fn init_log(level: LevelFilter) {
    // RUST_LOG takes precedence over the default level.
    let mut builder = Builder::from_env(Env::default());
    if std::env::var_os("RUST_LOG").is_none() {
        let _ = builder.filter_level(level);
    }
    let _ = builder
        .format_target(false)
        .format_timestamp(None)
        .try_init();
}
pub fn init_default_log() {
    init_log(LevelFilter::Info)
}
pub fn init_debug_log() {
    init_log(LevelFilter::Trace)
}
