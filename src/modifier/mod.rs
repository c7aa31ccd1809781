//! Reduction modules and the batched delta debugging they share.
//!
//! A module looks at one kind of element of an instance (rows, columns,
//! coefficients, settings...). In a call it applies its change to every
//! admissible element of a working copy, grouped in batches. After each batch
//! the oracle is asked whether the defect survives: if it does the batch is
//! kept, otherwise the copy is reset to the last accepted state.

mod coefficient;
mod consround;
mod constraint;
mod fixing;
mod objective;
mod setting;
mod side;
mod variable;
mod varround;

pub use self::coefficient::CoefficientReduction;
pub use self::consround::ConsroundReduction;
pub use self::constraint::ConstraintReduction;
pub use self::fixing::FixingReduction;
pub use self::objective::ObjectiveReduction;
pub use self::setting::SettingReduction;
pub use self::side::SideReduction;
pub use self::variable::VariableReduction;
pub use self::varround::VarroundReduction;

use crate::matrix::MatrixBuffer;
use crate::numerics::{Num, Real};
use crate::oracle::{BuggerStatus, Oracle};
use crate::params::{BuggerParameters, Emphasis};
use crate::problem::Problem;
use crate::settings::SolverSettings;
use crate::solution::Solution;
use log::*;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Names of the modules, in the order of the default run.
pub const MODULE_NAMES: [&str; 9] = [
    ConstraintReduction::NAME,
    VariableReduction::NAME,
    ObjectiveReduction::NAME,
    SideReduction::NAME,
    FixingReduction::NAME,
    CoefficientReduction::NAME,
    VarroundReduction::NAME,
    ConsroundReduction::NAME,
    SettingReduction::NAME,
];

/// Outcome of a module call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierStatus {
    /// Disabled by the parameters.
    DidNotRun,
    /// No element was eligible.
    NotAdmissible,
    /// Every batch was rejected by the oracle.
    Unsuccessful,
    Successful,
}

impl fmt::Display for ModifierStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ModifierStatus::DidNotRun => "-",
            ModifierStatus::NotAdmissible => "n",
            ModifierStatus::Unsuccessful => "u",
            ModifierStatus::Successful => "S",
        };
        write!(f, "{s}")
    }
}

/// Counters of a module over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierStats {
    pub calls: usize,
    pub successes: usize,
    pub solver_calls: usize,
    pub accepted_batches: usize,
    /// Number of elements changed in accepted batches.
    pub changes: usize,
    pub time: Duration,
}

/// Read-only information a reduction uses to judge and transform elements.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a, N> {
    pub num: &'a Num<N>,
    pub solution: &'a Solution<N>,
    pub emphasis: Emphasis,
}

/// Working copy of the instance being modified by a module.
///
/// Coefficient changes are buffered and only written into the matrix by
/// `flush`, which happens before every probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft<N> {
    pub problem: Problem<N>,
    pub settings: SolverSettings,
    changes: MatrixBuffer<N>,
}

impl<N: Real> Draft<N> {
    pub fn new(problem: Problem<N>, settings: SolverSettings) -> Self {
        Self {
            problem,
            settings,
            changes: MatrixBuffer::new(),
        }
    }
    /// Set the coefficient at `(row, col)` at the next flush.
    pub fn change_coefficient(&mut self, row: usize, col: usize, value: N) {
        self.changes.add_entry(row, col, value)
    }
    pub fn flush(&mut self) {
        if !self.changes.is_empty() {
            self.problem.matrix_mut().change_coefficients(&self.changes);
            self.changes.clear();
        }
    }
}

/// What a module needs from the run: parameters, tolerances and the oracle.
pub struct Context<'a, N> {
    pub params: &'a BuggerParameters,
    pub num: &'a Num<N>,
    pub oracle: &'a mut dyn Oracle<N>,
    /// Number of batches of the next module calls.
    pub nbatches: usize,
    /// Probes issued so far.
    pub probes: usize,
    /// Solving effort reported for the last probe.
    pub last_effort: i64,
}

impl<N> fmt::Debug for Context<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Context")
            .field("nbatches", &self.nbatches)
            .field("probes", &self.probes)
            .field("last_effort", &self.last_effort)
            .finish()
    }
}

impl<'a, N: Real> Context<'a, N> {
    pub fn new(params: &'a BuggerParameters, num: &'a Num<N>, oracle: &'a mut dyn Oracle<N>) -> Self {
        Self {
            params,
            num,
            oracle,
            nbatches: params.nbatches,
            probes: 0,
            last_effort: -1,
        }
    }

    /// Ask the oracle about an instance.
    pub fn call_solver(
        &mut self,
        settings: &SolverSettings,
        problem: &Problem<N>,
        solution: &Solution<N>,
    ) -> BuggerStatus {
        self.oracle.set_up(settings, problem, solution);
        let (retcode, status) = self.oracle.solve(&self.params.passcodes);
        self.last_effort = self.oracle.solving_effort();
        self.probes += 1;
        if let Some(stem) = &self.params.debugfile {
            let stem = PathBuf::from(format!("{stem}_{}", self.probes));
            let written = self.oracle.write_instance(&stem, true, true);
            if !written.1 {
                warn!("Cannot write probe {}", stem.display())
            }
        }
        let verdict = BuggerStatus::classify(retcode, &self.params.passcodes);
        debug!(
            "Probe {}: {retcode}, solver {status}, effort {} -> {verdict:?}",
            self.probes, self.last_effort
        );
        verdict
    }
}

/// Number of elements per batch for `admissible` elements split in
/// `nbatches` batches, 0 meaning a single batch.
pub fn batch_size(admissible: usize, nbatches: usize) -> usize {
    if nbatches == 0 {
        admissible.max(1)
    } else {
        admissible.div_ceil(nbatches).max(1)
    }
}

/// The element-level part of a module: which elements can be changed and how.
pub trait Reduction<N: Real> {
    /// One element, such as a row index.
    type Unit: Copy + fmt::Debug;

    /// Candidate elements of the problem, in the order they are tried.
    ///
    /// Called once per module call, before any change.
    fn prepare(&mut self, problem: &Problem<N>, settings: &SolverSettings, scope: &Scope<N>)
    -> Vec<Self::Unit>;

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, unit: Self::Unit) -> bool;

    /// Change the element in the working copy. Only called on admissible elements.
    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, unit: Self::Unit);
}

/// A module as seen by the run.
pub trait Modifier<N: Real> {
    fn name(&self) -> &'static str;

    /// Try to reduce the instance. On success `settings` and `problem` are
    /// replaced by the reduced ones, otherwise they are left untouched.
    fn run(
        &mut self,
        settings: &mut SolverSettings,
        problem: &mut Problem<N>,
        solution: &Solution<N>,
        ctx: &mut Context<N>,
    ) -> ModifierStatus;

    fn stats(&self) -> &ModifierStats;

    /// Solving effort of the last accepted probe, -1 if unknown.
    fn last_effort(&self) -> i64;
}

/// Batched delta debugging over the elements of a `Reduction`.
#[derive(Debug, Clone)]
pub struct Module<R> {
    name: &'static str,
    reduction: R,
    stats: ModifierStats,
    last_effort: i64,
}

impl<R> Module<R> {
    pub fn new(name: &'static str, reduction: R) -> Self {
        Self {
            name,
            reduction,
            stats: ModifierStats::default(),
            last_effort: -1,
        }
    }
}

impl<R> Module<R> {
    fn probe<N: Real>(
        &mut self,
        draft: &mut Draft<N>,
        accepted: &mut Draft<N>,
        solution: &Solution<N>,
        ctx: &mut Context<N>,
        batch: usize,
    ) -> bool {
        draft.flush();
        let verdict = ctx.call_solver(&draft.settings, &draft.problem, solution);
        self.stats.solver_calls += 1;
        if verdict == BuggerStatus::Okay {
            trace!("{}: batch of {batch} rejected", self.name);
            draft.clone_from(accepted);
            false
        } else {
            trace!("{}: batch of {batch} accepted", self.name);
            accepted.clone_from(draft);
            self.stats.accepted_batches += 1;
            self.stats.changes += batch;
            self.last_effort = ctx.last_effort;
            true
        }
    }

    fn execute<N: Real>(
        &mut self,
        settings: &mut SolverSettings,
        problem: &mut Problem<N>,
        solution: &Solution<N>,
        ctx: &mut Context<N>,
    ) -> ModifierStatus
    where
        R: Reduction<N>,
    {
        let scope = Scope {
            num: ctx.num,
            solution,
            emphasis: ctx.params.emphasis,
        };
        let mut draft = Draft::new(problem.clone(), settings.clone());
        let candidates: Vec<R::Unit> = self
            .reduction
            .prepare(problem, settings, &scope)
            .into_iter()
            .filter(|&unit| self.reduction.is_admissible(&draft, &scope, unit))
            .collect();
        if candidates.is_empty() {
            return ModifierStatus::NotAdmissible;
        }
        let size = batch_size(candidates.len(), ctx.nbatches);
        debug!(
            "{}: {} admissible, batches of {size}",
            self.name,
            candidates.len()
        );
        let mut accepted = draft.clone();
        let mut success = false;
        let mut batch = 0;
        for unit in candidates {
            // An earlier change of the pass may have made the element ineligible.
            if !self.reduction.is_admissible(&draft, &scope, unit) {
                trace!("{}: {unit:?} skipped", self.name);
                continue;
            }
            self.reduction.apply(&mut draft, &scope, unit);
            batch += 1;
            if batch >= size {
                success |= self.probe(&mut draft, &mut accepted, solution, ctx, batch);
                batch = 0;
            }
        }
        if batch > 0 {
            success |= self.probe(&mut draft, &mut accepted, solution, ctx, batch);
        }
        if !success {
            return ModifierStatus::Unsuccessful;
        }
        *problem = accepted.problem;
        *settings = accepted.settings;
        ModifierStatus::Successful
    }
}

impl<N: Real, R: Reduction<N>> Modifier<N> for Module<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(
        &mut self,
        settings: &mut SolverSettings,
        problem: &mut Problem<N>,
        solution: &Solution<N>,
        ctx: &mut Context<N>,
    ) -> ModifierStatus {
        if !ctx.params.is_enabled(self.name) {
            return ModifierStatus::DidNotRun;
        }
        let start = Instant::now();
        self.stats.calls += 1;
        let status = self.execute(settings, problem, solution, ctx);
        if status == ModifierStatus::Successful {
            self.stats.successes += 1;
        }
        self.stats.time += start.elapsed();
        info!("{:<12} {status:?}", self.name);
        status
    }

    fn stats(&self) -> &ModifierStats {
        &self.stats
    }

    fn last_effort(&self) -> i64 {
        self.last_effort
    }
}

/// The nine modules in their default order.
///
/// Without `target` settings the setting module never finds anything to do.
pub fn default_modules<N: Real>(target: Option<SolverSettings>) -> Vec<Box<dyn Modifier<N>>> {
    vec![
        Box::new(Module::new(ConstraintReduction::NAME, ConstraintReduction::default())),
        Box::new(Module::new(VariableReduction::NAME, VariableReduction)),
        Box::new(Module::new(ObjectiveReduction::NAME, ObjectiveReduction)),
        Box::new(Module::new(SideReduction::NAME, SideReduction)),
        Box::new(Module::new(FixingReduction::NAME, FixingReduction)),
        Box::new(Module::new(CoefficientReduction::NAME, CoefficientReduction)),
        Box::new(Module::new(VarroundReduction::NAME, VarroundReduction)),
        Box::new(Module::new(ConsroundReduction::NAME, ConsroundReduction)),
        Box::new(Module::new(SettingReduction::NAME, SettingReduction::new(target))),
    ]
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::oracle::{FnOracle, Retcode};
    use crate::problem::ProblemBuilder;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Marks elements `0..n` as "touched" in the objective offset.
    #[derive(Debug, Default)]
    struct Touch {
        n: usize,
    }

    impl Reduction<f64> for Touch {
        type Unit = usize;
        fn prepare(&mut self, _: &Problem<f64>, _: &SolverSettings, _: &Scope<f64>) -> Vec<usize> {
            (0..self.n).collect()
        }
        fn is_admissible(&self, draft: &Draft<f64>, _: &Scope<f64>, unit: usize) -> bool {
            draft.problem.objective().coefficients[unit] == 0.
        }
        fn apply(&self, draft: &mut Draft<f64>, _: &Scope<f64>, unit: usize) {
            draft.problem.objective_mut().coefficients[unit] = 1.;
        }
    }

    fn blank(n: usize) -> Problem<f64> {
        ProblemBuilder::new("blank", 0, n).build().unwrap()
    }

    /// Run `module` with an oracle answering from `verdicts` and
    /// return the number of elements changed in each probe.
    pub(crate) fn batches_probed<R: Reduction<f64>>(
        module: &mut Module<R>,
        problem: &mut Problem<f64>,
        solution: &Solution<f64>,
        nbatches: usize,
        mut verdict: impl FnMut(&Problem<f64>) -> Retcode + 'static,
    ) -> (ModifierStatus, usize) {
        let params = BuggerParameters::default();
        let num = Num::default();
        let mut oracle = FnOracle::new(move |_, pb, _| verdict(pb));
        let mut ctx = Context::new(&params, &num, &mut oracle);
        ctx.nbatches = nbatches;
        let mut settings = SolverSettings::new();
        let status = module.run(&mut settings, problem, solution, &mut ctx);
        (status, ctx.probes)
    }

    #[test]
    fn batch_sizes() {
        assert_eq!(batch_size(10, 0), 10);
        assert_eq!(batch_size(10, 3), 4);
        assert_eq!(batch_size(10, 20), 1);
        assert_eq!(batch_size(0, 0), 1);
        for k in 1..40 {
            for n in 1..12 {
                let size = batch_size(k, n);
                assert!(k.div_ceil(size) <= n, "k={k} n={n}");
            }
        }
    }

    #[test]
    fn partition_covers_every_element_once() {
        let sizes = Rc::new(RefCell::new(Vec::new()));
        let seen = sizes.clone();
        let mut module = Module::new("touch", Touch { n: 10 });
        let mut pb = blank(10);
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 3, move |pb| {
            let touched = pb.objective().coefficients.iter().filter(|&&c| c == 1.).count();
            seen.borrow_mut().push(touched);
            Retcode::DUAL_FAIL
        });
        assert_eq!(status, ModifierStatus::Successful);
        assert_eq!(probes, 3);
        // Every probe is accepted, so the counts are cumulative.
        assert_eq!(*sizes.borrow(), vec![4, 8, 10]);
        assert!(pb.objective().coefficients.iter().all(|&c| c == 1.));
        assert_eq!(module.stats().changes, 10);
    }

    #[test]
    fn rejected_batches_leave_no_trace() {
        let mut module = Module::new("touch", Touch { n: 6 });
        let mut pb = blank(6);
        let before = bincode::serialize(&pb).unwrap();
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 2, |_| Retcode::OKAY);
        assert_eq!(status, ModifierStatus::Unsuccessful);
        assert_eq!(probes, 2);
        assert_eq!(bincode::serialize(&pb).unwrap(), before);
    }

    #[test]
    fn only_surviving_batches_are_kept() {
        // The bug needs coefficient 5 to stay untouched.
        let mut module = Module::new("touch", Touch { n: 6 });
        let mut pb = blank(6);
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 3, |pb| {
            if pb.objective().coefficients[5] == 0. { Retcode::PRIMAL_FAIL } else { Retcode::OKAY }
        });
        assert_eq!(status, ModifierStatus::Successful);
        assert_eq!(probes, 3);
        assert_eq!(pb.objective().coefficients, vec![1., 1., 1., 1., 0., 0.]);
        assert_eq!(module.stats().accepted_batches, 2);
    }

    #[test]
    fn single_batch_and_nothing_to_do() {
        let mut module = Module::new("touch", Touch { n: 4 });
        let mut pb = blank(4);
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 0, |_| Retcode::internal(3));
        assert_eq!((status, probes), (ModifierStatus::Successful, 1));
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 0, |_| Retcode::DUAL_FAIL);
        assert_eq!((status, probes), (ModifierStatus::NotAdmissible, 0));
        assert_eq!(module.stats().calls, 2);
        assert_eq!(module.stats().successes, 1);
    }

    #[test]
    fn disabled_module_does_not_run() {
        let mut params = BuggerParameters::default();
        params.set_enabled("touch", false);
        let num = Num::default();
        let mut oracle = FnOracle::new(|_, _: &Problem<f64>, _| Retcode::DUAL_FAIL);
        let mut ctx = Context::new(&params, &num, &mut oracle);
        let mut module = Module::new("touch", Touch { n: 2 });
        let status = module.run(
            &mut SolverSettings::new(),
            &mut blank(2),
            &Solution::default(),
            &mut ctx,
        );
        assert_eq!(status, ModifierStatus::DidNotRun);
        assert_eq!(ctx.probes, 0);
        assert_eq!(module.stats().calls, 0);
    }

    #[test]
    fn module_names_are_parameters() {
        let params = BuggerParameters::default();
        for name in MODULE_NAMES {
            assert!(params.is_enabled(name));
        }
        let modules = default_modules::<f64>(None);
        let names: Vec<_> = modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, MODULE_NAMES.to_vec());
    }
}
