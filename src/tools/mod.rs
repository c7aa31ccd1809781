//! File formats and oracles built on them.

mod command;
pub mod mps;
pub mod snapshot;
pub mod text;

pub use self::command::CommandOracle;
pub use self::mps::{read_mps, write_mps};
pub use self::snapshot::{load_checkpoint, save_checkpoint};
pub use self::text::{read_settings, read_solution, write_settings, write_solution};

use crate::error::Result;
use crate::numerics::Real;
use crate::run::Instance;
use crate::solution::Solution;
use log::*;
use std::path::{Path, PathBuf};

/// `stem` followed by `.ext`, keeping any dot already in `stem`.
pub(crate) fn with_extension(stem: &Path, ext: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_owned();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}

/// Load an instance. Without settings file the settings are empty, without
/// solution file the reference solution is unknown.
pub fn read_instance<N: Real>(
    settings_path: Option<&Path>,
    problem_path: &Path,
    solution_path: Option<&Path>,
) -> Result<Instance<N>> {
    let settings = match settings_path {
        Some(path) => read_settings(path)?,
        None => Default::default(),
    };
    let problem = read_mps(problem_path)?;
    let solution = match solution_path {
        Some(path) => read_solution(path, &problem)?,
        None => Solution::default(),
    };
    info!(
        "Read {} with {} rows, {} columns and {} settings",
        problem_path.display(),
        problem.nrows(),
        problem.ncols(),
        settings.total_len()
    );
    Ok(Instance::new(settings, problem, solution))
}

/// Write `stem.set`, `stem.mps` and `stem.sol`. Returns which were written.
pub fn write_instance<N: Real>(
    stem: &Path,
    instance: &Instance<N>,
    write_settings: bool,
    write_solution: bool,
) -> (bool, bool, bool) {
    let check = |res: Result<()>| match res {
        Ok(()) => true,
        Err(e) => {
            warn!("{e}");
            false
        }
    };
    let settings = write_settings
        && check(text::write_settings(with_extension(stem, "set"), &instance.settings));
    let problem = check(write_mps(with_extension(stem, "mps"), &instance.problem));
    let solution = write_solution
        && check(text::write_solution(
            with_extension(stem, "sol"),
            &instance.problem,
            &instance.solution,
        ));
    (settings, problem, solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::small;
    use crate::settings::{SettingValue, SolverSettings};

    #[test]
    fn instance_files() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("case.v2");
        let mut settings = SolverSettings::new();
        settings.push("lp/threads", SettingValue::Int(2));
        let instance = Instance::new(settings, small(), Solution::feasible(vec![1., 0., 1.]));
        assert_eq!(write_instance(&stem, &instance, true, true), (true, true, true));
        assert!(dir.path().join("case.v2.mps").exists());
        let back: Instance<f64> = read_instance(
            Some(&with_extension(&stem, "set")),
            &with_extension(&stem, "mps"),
            Some(&with_extension(&stem, "sol")),
        )
        .unwrap();
        assert_eq!(back.settings, instance.settings);
        assert_eq!(back.solution, instance.solution);
        assert_eq!(back.problem.ncols(), 3);

        let bare = dir.path().join("bare");
        assert_eq!(write_instance(&bare, &instance, false, false), (false, true, false));
        let back: Instance<f64> = read_instance(None, &with_extension(&bare, "mps"), None).unwrap();
        assert!(back.settings.is_empty());
        assert_eq!(back.solution, Solution::default());
    }

    #[test]
    fn unwritable_stem() {
        let instance = Instance::new(SolverSettings::new(), small(), Solution::default());
        let stem = Path::new("/nonexistent/dir/probe");
        assert_eq!(write_instance(stem, &instance, true, true), (false, false, false));
    }
}
