//! An oracle running an external solver command on files.

use crate::error::{Error, Result};
use crate::numerics::Real;
use crate::oracle::{Oracle, Retcode, SolverStatus};
use crate::problem::Problem;
use crate::run::Instance;
use crate::settings::SolverSettings;
use crate::solution::Solution;
use log::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs a command on every probe.
///
/// The command is a list of whitespace separated words in which `{problem}`,
/// `{settings}` and `{solution}` are replaced by the paths of the probe files.
/// The exit status is the return code: 0 means the solver behaved, 1 to 3 are
/// the dual, primal and objective mismatches, anything else is an internal
/// failure. The command may print lines `effort <n>` and `status <status>`.
#[derive(Debug)]
pub struct CommandOracle<N> {
    command: Vec<String>,
    workdir: PathBuf,
    instance: Option<Instance<N>>,
    effort: i64,
}

impl<N: Real> CommandOracle<N> {
    /// Probe files are written in `workdir`, created if needed.
    pub fn new<P: Into<PathBuf>>(command: &str, workdir: P) -> Result<Self> {
        let workdir = workdir.into();
        let command: Vec<String> = command.split_whitespace().map(String::from).collect();
        if command.is_empty() {
            return Err(Error::parameter("command", "empty solver command"));
        }
        fs::create_dir_all(&workdir).map_err(|e| Error::io(&workdir, e))?;
        Ok(Self {
            command,
            workdir,
            instance: None,
            effort: -1,
        })
    }

    fn stem(&self) -> PathBuf {
        self.workdir.join("probe")
    }

    fn arguments(&self, stem: &Path) -> Vec<String> {
        let file = |ext: &str| super::with_extension(stem, ext).display().to_string();
        self.command[1..]
            .iter()
            .map(|arg| {
                arg.replace("{problem}", &file("mps"))
                    .replace("{settings}", &file("set"))
                    .replace("{solution}", &file("sol"))
            })
            .collect()
    }

    fn run(&mut self) -> Result<(Retcode, SolverStatus)> {
        let stem = self.stem();
        let (s, p, o) = self.write_instance(&stem, true, true);
        if !(s && p && o) {
            return Err(Error::Inconsistent(format!(
                "cannot write probe files in {}",
                self.workdir.display()
            )));
        }
        let mut command = Command::new(&self.command[0]);
        command.args(self.arguments(&stem)).stdin(Stdio::null());
        trace!("command: {command:?}");
        let output = command.output().map_err(|source| Error::Command {
            command: self.command.join(" "),
            source,
        })?;
        let mut status = SolverStatus::Unknown;
        self.effort = -1;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            let mut words = line.split_whitespace();
            match (words.next(), words.next()) {
                (Some("effort"), Some(n)) => self.effort = n.parse().unwrap_or(-1),
                (Some("status"), Some(s)) => status = s.parse().unwrap_or(SolverStatus::Unknown),
                _ => (),
            }
        }
        let retcode = match output.status.code() {
            Some(c @ 0..=3) => Retcode(c),
            Some(c) => Retcode::internal(c),
            // Killed by a signal
            None => {
                status = SolverStatus::UndefinedError;
                Retcode::internal(0)
            }
        };
        Ok((retcode, status))
    }
}

impl<N: Real> Oracle<N> for CommandOracle<N> {
    fn set_up(&mut self, settings: &SolverSettings, problem: &Problem<N>, solution: &Solution<N>) {
        self.instance = Some(Instance::new(settings.clone(), problem.clone(), solution.clone()));
    }

    fn solve(&mut self, passcodes: &[i32]) -> (Retcode, SolverStatus) {
        if self.instance.is_none() {
            return (Retcode::internal(0), SolverStatus::UndefinedError);
        }
        match self.run() {
            Ok((retcode, status)) => (retcode.filter(passcodes), status),
            Err(e) => {
                warn!("{e}");
                (Retcode::internal(0).filter(passcodes), SolverStatus::UndefinedError)
            }
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
            Some(inst) => super::write_instance(stem, inst, write_settings, write_solution),
            None => (false, false, false),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::problem::tests::small;

    fn oracle(command: &str, dir: &tempfile::TempDir) -> CommandOracle<f64> {
        let mut oracle = CommandOracle::new(command, dir.path().join("work")).unwrap();
        oracle.set_up(&SolverSettings::new(), &small(), &Solution::default());
        oracle
    }

    #[test]
    fn exit_codes_are_return_codes() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(oracle("true", &dir).solve(&[]).0, Retcode::OKAY);
        let script = dir.path().join("solver.sh");
        fs::write(
            &script,
            "echo effort 42\necho status infeasible\ngrep -q c2 \"$1\" && exit 2\nexit 0\n",
        )
        .unwrap();
        let mut failing = oracle(&format!("sh {} {{problem}}", script.display()), &dir);
        assert_eq!(failing.solve(&[]), (Retcode::PRIMAL_FAIL, SolverStatus::Infeasible));
        assert_eq!(failing.solving_effort(), 42);
        assert_eq!(failing.solve(&[2]).0, Retcode::OKAY);
    }

    #[test]
    fn crashes_are_internal_errors() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("crash.sh");
        fs::write(&script, "exit 139\n").unwrap();
        let mut o = oracle(&format!("sh {}", script.display()), &dir);
        assert_eq!(o.solve(&[]).0, Retcode::internal(139));
        let mut missing = oracle("/nonexistent/solver", &dir);
        assert_eq!(missing.solve(&[]), (Retcode::internal(0), SolverStatus::UndefinedError));
        assert!(CommandOracle::<f64>::new("  ", dir.path()).is_err());
    }
}
