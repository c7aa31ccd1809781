//! Interface to the solver whose defect is being reduced.

use crate::error::Result;
use crate::numerics::Real;
use crate::problem::Problem;
use crate::run::Instance;
use crate::settings::SolverSettings;
use crate::solution::Solution;
use crate::tools;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Raw result code of a solver probe.
///
/// Zero means the solver behaved, positive values are mismatches detected by
/// the checker, negative values are internal failures of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Retcode(pub i32);

impl Retcode {
    pub const OKAY: Retcode = Retcode(0);
    pub const DUAL_FAIL: Retcode = Retcode(1);
    pub const PRIMAL_FAIL: Retcode = Retcode(2);
    pub const OBJECTIVE_FAIL: Retcode = Retcode(3);

    /// Map an internal error code of a backend to a negative return code,
    /// distinct from `OKAY` whatever the sign of `code`.
    pub fn internal(code: i32) -> Self {
        Retcode(-code.saturating_abs().saturating_add(1))
    }
    pub fn is_okay(self) -> bool {
        self == Self::OKAY
    }
    /// `OKAY` if the code is one of `passcodes`.
    pub fn filter(self, passcodes: &[i32]) -> Self {
        if passcodes.contains(&self.0) { Self::OKAY } else { self }
    }
}

impl fmt::Display for Retcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Retcode::OKAY => write!(f, "okay"),
            Retcode::DUAL_FAIL => write!(f, "dual fail"),
            Retcode::PRIMAL_FAIL => write!(f, "primal fail"),
            Retcode::OBJECTIVE_FAIL => write!(f, "objective fail"),
            Retcode(code) => write!(f, "code {code}"),
        }
    }
}

/// Status reported by the solver, only used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
    NodeLimit,
    TimeLimit,
    GapLimit,
    SolutionLimit,
    Interrupted,
    Unknown,
    UndefinedError,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::InfeasibleOrUnbounded => "inforunbd",
            SolverStatus::NodeLimit => "nodelimit",
            SolverStatus::TimeLimit => "timelimit",
            SolverStatus::GapLimit => "gaplimit",
            SolverStatus::SolutionLimit => "sollimit",
            SolverStatus::Interrupted => "interrupted",
            SolverStatus::Unknown => "unknown",
            SolverStatus::UndefinedError => "undefined",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SolverStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, String> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "optimal" => SolverStatus::Optimal,
            "infeasible" => SolverStatus::Infeasible,
            "unbounded" => SolverStatus::Unbounded,
            "inforunbd" => SolverStatus::InfeasibleOrUnbounded,
            "nodelimit" => SolverStatus::NodeLimit,
            "timelimit" => SolverStatus::TimeLimit,
            "gaplimit" => SolverStatus::GapLimit,
            "sollimit" => SolverStatus::SolutionLimit,
            "interrupted" => SolverStatus::Interrupted,
            "unknown" => SolverStatus::Unknown,
            "undefined" => SolverStatus::UndefinedError,
            _ => return Err(format!("unknown solver status {s}")),
        })
    }
}

/// Verdict of a probe: is the defect still there?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuggerStatus {
    Okay,
    Bug,
    Error,
}

impl BuggerStatus {
    pub fn classify(retcode: Retcode, passcodes: &[i32]) -> Self {
        match retcode.filter(passcodes).0 {
            0 => BuggerStatus::Okay,
            c if c > 0 => BuggerStatus::Bug,
            _ => BuggerStatus::Error,
        }
    }
}

/// A solver backend able to judge a candidate instance.
///
/// The reduction calls `set_up` and then `solve` for every probe, from a
/// single thread, and never looks at the backend state otherwise.
pub trait Oracle<N: Real> {
    /// Load a candidate instance.
    fn set_up(&mut self, settings: &SolverSettings, problem: &Problem<N>, solution: &Solution<N>);

    /// Solve the loaded instance. Codes in `passcodes` are reported as `OKAY`.
    fn solve(&mut self, passcodes: &[i32]) -> (Retcode, SolverStatus);

    /// Cost of the last solve, such as an iteration count, or -1 if unknown.
    fn solving_effort(&self) -> i64 {
        -1
    }

    /// Load an instance from files.
    fn read_instance(
        &self,
        settings_path: Option<&Path>,
        problem_path: &Path,
        solution_path: Option<&Path>,
    ) -> Result<Instance<N>> {
        tools::read_instance(settings_path, problem_path, solution_path)
    }

    /// Write the loaded instance next to `stem`. Returns which of settings,
    /// problem and solution were written.
    fn write_instance(
        &self,
        stem: &Path,
        write_settings: bool,
        write_solution: bool,
    ) -> (bool, bool, bool);
}

type Judge<N> = dyn FnMut(&SolverSettings, &Problem<N>, &Solution<N>) -> Retcode;

/// An oracle deciding with a closure.
pub struct FnOracle<N> {
    judge: Box<Judge<N>>,
    instance: Option<Instance<N>>,
    effort: i64,
}

impl<N: Real> FnOracle<N> {
    pub fn new<F>(judge: F) -> Self
    where
        F: FnMut(&SolverSettings, &Problem<N>, &Solution<N>) -> Retcode + 'static,
    {
        Self {
            judge: Box::new(judge),
            instance: None,
            effort: -1,
        }
    }
    /// Report a constant solving effort.
    pub fn with_effort(mut self, effort: i64) -> Self {
        self.effort = effort;
        self
    }
    /// The instance of the last `set_up`.
    pub fn instance(&self) -> Option<&Instance<N>> {
        self.instance.as_ref()
    }
}

impl<N> fmt::Debug for FnOracle<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("FnOracle")
            .field("effort", &self.effort)
            .finish()
    }
}

impl<N: Real> Oracle<N> for FnOracle<N> {
    fn set_up(&mut self, settings: &SolverSettings, problem: &Problem<N>, solution: &Solution<N>) {
        self.instance = Some(Instance {
            settings: settings.clone(),
            problem: problem.clone(),
            solution: solution.clone(),
        });
    }
    fn solve(&mut self, passcodes: &[i32]) -> (Retcode, SolverStatus) {
        match &self.instance {
            Some(inst) => {
                let retcode = (self.judge)(&inst.settings, &inst.problem, &inst.solution);
                (retcode.filter(passcodes), SolverStatus::Unknown)
            }
            None => (Retcode::internal(0), SolverStatus::UndefinedError),
        }
    }
    fn solving_effort(&self) -> i64 {
        self.effort
    }
    fn write_instance(
        &self,
        stem: &Path,
        write_settings: bool,
        write_solution: bool,
    ) -> (bool, bool, bool) {
        match &self.instance {
            Some(inst) => tools::write_instance(stem, inst, write_settings, write_solution),
            None => (false, false, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::small;

    #[test]
    fn classification() {
        assert_eq!(BuggerStatus::classify(Retcode::OKAY, &[]), BuggerStatus::Okay);
        assert_eq!(BuggerStatus::classify(Retcode::PRIMAL_FAIL, &[]), BuggerStatus::Bug);
        assert_eq!(BuggerStatus::classify(Retcode::internal(4), &[]), BuggerStatus::Error);
        assert_eq!(BuggerStatus::classify(Retcode::internal(0), &[]), BuggerStatus::Error);
        assert_eq!(BuggerStatus::classify(Retcode::PRIMAL_FAIL, &[2]), BuggerStatus::Okay);
        assert_eq!(BuggerStatus::classify(Retcode::internal(2), &[-3]), BuggerStatus::Okay);
    }

    #[test]
    fn internal_codes_are_negative() {
        assert_eq!(Retcode::internal(0), Retcode(-1));
        assert_eq!(Retcode::internal(-5), Retcode(-6));
        assert_eq!(Retcode::internal(5), Retcode(-6));
        assert!(Retcode::internal(i32::MIN).0 < 0);
    }

    #[test]
    fn closure_oracle() {
        let mut oracle = FnOracle::new(|_, pb: &Problem<f64>, _| {
            if pb.nrows() > 2 { Retcode::DUAL_FAIL } else { Retcode::OKAY }
        })
        .with_effort(7);
        assert_eq!(oracle.solve(&[]).0, Retcode::internal(0));
        oracle.set_up(&SolverSettings::new(), &small(), &Solution::default());
        assert_eq!(oracle.solve(&[]), (Retcode::DUAL_FAIL, SolverStatus::Unknown));
        assert_eq!(oracle.solve(&[1]).0, Retcode::OKAY);
        assert_eq!(oracle.solving_effort(), 7);
        assert!(oracle.instance().is_some());
    }

    #[test]
    fn status_names() {
        for s in ["optimal", "inforunbd", "timelimit", "undefined"] {
            assert_eq!(s.parse::<SolverStatus>().unwrap().to_string(), s);
        }
    }
}
