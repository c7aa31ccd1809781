//! Rounds and stages: the loop sequencing the modules until nothing shrinks.

use crate::modifier::{self, Context, Modifier, ModifierStats, ModifierStatus};
use crate::numerics::{Num, Real};
use crate::oracle::{BuggerStatus, Oracle};
use crate::params::{BuggerParameters, Mode};
use crate::problem::{IndexMaps, Problem, ProblemSize};
use crate::settings::SolverSettings;
use crate::solution::Solution;
use crate::tools::snapshot;
use arrayvec::ArrayVec;
use log::*;
use std::fmt;
use std::time::{Duration, Instant};

/// Largest number of modules a run can hold.
pub const MAX_MODULES: usize = 16;

/// A problem with the settings and reference solution it is solved with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance<N> {
    pub settings: SolverSettings,
    pub problem: Problem<N>,
    pub solution: Solution<N>,
}

impl<N: Real> Instance<N> {
    pub fn new(settings: SolverSettings, problem: Problem<N>, solution: Solution<N>) -> Self {
        Self {
            settings,
            problem,
            solution,
        }
    }
    /// Remove redundant rows and fixed columns from problem and solution.
    pub fn compress(&self) -> (Self, IndexMaps) {
        let (problem, maps) = self.problem.compress();
        let solution = self.solution.compress(&maps);
        let instance = Self {
            settings: self.settings.clone(),
            problem,
            solution,
        };
        (instance, maps)
    }
}

/// Position of the run in the round and stage loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub round: usize,
    pub stage: usize,
    /// Last module that succeeded, or the stage frontier when none did.
    pub success: usize,
    pub nbatches: usize,
}

impl RunState {
    pub fn new(params: &BuggerParameters) -> Self {
        Self {
            round: params.initround,
            stage: params.initstage,
            success: params.initstage,
            nbatches: params.nbatches,
        }
    }
}

/// What happened in one round.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    pub round: usize,
    /// Stage at the end of the round.
    pub stage: usize,
    pub nbatches: usize,
    /// Status of each module called, in call order.
    pub statuses: ArrayVec<ModifierStatus, MAX_MODULES>,
    pub size: ProblemSize,
}

/// Statistics of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Verdict on the original instance, if it was checked.
    pub initial: Option<BuggerStatus>,
    pub rounds: Vec<RoundRecord>,
    pub modules: Vec<(&'static str, ModifierStats)>,
    pub initial_size: ProblemSize,
    pub final_size: ProblemSize,
    pub probes: usize,
    pub elapsed: Duration,
    pub state: RunState,
}

impl RunSummary {
    /// True if some module changed the instance.
    pub fn reduced(&self) -> bool {
        self.modules.iter().any(|(_, s)| s.successes > 0)
    }
}

/// A reduction run over one instance.
pub struct BuggerRun<'a, N> {
    params: BuggerParameters,
    num: Num<N>,
    oracle: &'a mut dyn Oracle<N>,
    modules: Vec<Box<dyn Modifier<N>>>,
    instance: Instance<N>,
    state: RunState,
}

impl<N: Real> fmt::Debug for BuggerRun<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BuggerRun")
            .field("state", &self.state)
            .field("modules", &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl<'a, N: Real> BuggerRun<'a, N> {
    /// A run with the default modules. The setting module moves settings
    /// towards `target`.
    pub fn new(
        params: BuggerParameters,
        instance: Instance<N>,
        oracle: &'a mut dyn Oracle<N>,
        target: Option<SolverSettings>,
    ) -> Self {
        Self::with_modules(params, instance, oracle, modifier::default_modules(target))
    }

    pub fn with_modules(
        params: BuggerParameters,
        instance: Instance<N>,
        oracle: &'a mut dyn Oracle<N>,
        modules: Vec<Box<dyn Modifier<N>>>,
    ) -> Self {
        assert!(modules.len() <= MAX_MODULES, "too many modules");
        Self {
            num: Num::new(params.epsilon, params.feastol, params.zeta),
            state: RunState::new(&params),
            params,
            oracle,
            modules,
            instance,
        }
    }

    /// Continue from a saved position instead of the initial round and stage.
    pub fn resume(&mut self, state: RunState) {
        self.state = state
    }
    pub fn state(&self) -> RunState {
        self.state
    }
    pub fn instance(&self) -> &Instance<N> {
        &self.instance
    }
    pub fn into_instance(self) -> Instance<N> {
        self.instance
    }
    pub fn num(&self) -> &Num<N> {
        &self.num
    }

    /// Reduce the instance until no module succeeds any more, or a limit is
    /// reached.
    pub fn run(&mut self) -> RunSummary {
        let start = Instant::now();
        let maxstages = self.params.maxstages.min(self.modules.len());
        let Self {
            params,
            num,
            oracle,
            modules,
            instance,
            state,
        } = self;
        let initial_size = instance.problem.size(num);
        info!("Original problem: {initial_size}");
        let mut ctx = Context::new(params, num, &mut **oracle);
        ctx.nbatches = state.nbatches;
        let mut initial = None;
        let mut rounds = Vec::new();

        let check = params.mode != Mode::ReduceOnly;
        let reproduced = !check || {
            let verdict = ctx.call_solver(&instance.settings, &instance.problem, &instance.solution);
            initial = Some(verdict);
            match verdict {
                BuggerStatus::Okay => warn!("The original instance does not show the bug"),
                _ => info!("The original instance shows the bug: {verdict:?}"),
            }
            verdict != BuggerStatus::Okay
        };

        if reproduced && params.mode != Mode::ReproduceOnly {
            while state.round < params.maxrounds && state.stage < maxstages {
                let mut statuses = ArrayVec::new();
                let mut module = 0;
                while module <= state.stage && state.stage < maxstages {
                    let m = &mut modules[module];
                    let status = m.run(
                        &mut instance.settings,
                        &mut instance.problem,
                        &instance.solution,
                        &mut ctx,
                    );
                    statuses.push(status);
                    if status == ModifierStatus::Successful {
                        state.success = module;
                        let effort = m.last_effort();
                        if params.expenditure > 0 && effort > 0 {
                            ctx.nbatches =
                                (params.expenditure as u64).div_ceil(effort as u64) as usize;
                            debug!("Batches adapted to {}", ctx.nbatches);
                        }
                    } else if module == state.success {
                        state.stage += 1;
                        state.success = state.stage;
                    }
                    module += 1;
                }
                state.round += 1;
                state.nbatches = ctx.nbatches;
                let size = instance.problem.size(num);
                info!("Round {} stage {}: {size}", state.round, state.stage);
                rounds.push(RoundRecord {
                    round: state.round,
                    stage: state.stage,
                    nbatches: ctx.nbatches,
                    statuses,
                    size,
                });
                if let Some(path) = &params.checkpoint {
                    if let Err(e) = snapshot::save_checkpoint(path, instance, state) {
                        warn!("Checkpoint not written: {e}")
                    }
                }
                if start.elapsed().as_secs_f64() >= params.tlim {
                    info!("Time limit reached");
                    break;
                }
            }
        }

        let summary = RunSummary {
            initial,
            rounds,
            modules: modules.iter().map(|m| (m.name(), m.stats().clone())).collect(),
            initial_size,
            final_size: instance.problem.size(num),
            probes: ctx.probes,
            elapsed: start.elapsed(),
            state: *state,
        };
        info!(
            "Reduced to {} after {} probes in {:.2}s",
            summary.final_size,
            summary.probes,
            summary.elapsed.as_secs_f64()
        );
        summary
    }
}
