//! Plain text formats of settings and solutions.
//!
//! Settings are lines `name = value`; the kind of a value is read from its
//! shape: `TRUE`/`FALSE`, `'c'`, `"string"`, integers and decimals. Integers
//! of settings under `limits/` are limits, other integers are `Int` when they
//! fit in 32 bits and `Long` otherwise.
//!
//! Solutions are a `status <status>` line followed by `name value` lines for
//! the primal values and `ray name value` lines for an unbounded ray. Columns
//! not listed are zero.

use crate::error::{Error, Result};
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::{SettingValue, SolverSettings};
use crate::solution::{Solution, SolutionStatus};
use log::*;
use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Strip `#` comments, keeping those inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => (),
        }
    }
    line
}

/// Parse the value of setting `name`.
pub fn parse_setting(name: &str, value: &str) -> Option<SettingValue> {
    let value = value.trim();
    match value {
        "TRUE" | "true" => return Some(SettingValue::Bool(true)),
        "FALSE" | "false" => return Some(SettingValue::Bool(false)),
        _ => (),
    }
    if let Some(s) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        return Some(SettingValue::Str(s.to_string()));
    }
    if let Some(s) = value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
        let mut chars = s.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(SettingValue::Char(c)),
            _ => None,
        };
    }
    if let Ok(v) = value.parse::<i64>() {
        return Some(if name.starts_with("limits/") {
            SettingValue::Limit(v)
        } else if let Ok(v) = i32::try_from(v) {
            SettingValue::Int(v)
        } else {
            SettingValue::Long(v)
        });
    }
    if let Ok(v) = value.parse::<f64>() {
        return Some(SettingValue::Double(v));
    }
    None
}

/// Read a settings file.
pub fn read_settings<P: AsRef<Path>>(path: P) -> Result<SolverSettings> {
    let path = path.as_ref();
    let mut settings = SolverSettings::new();
    for (index, line) in read_to_string(path)?.lines().enumerate() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| Error::parse(path, index + 1, "expected name = value"))?;
        let name = name.trim();
        let value = parse_setting(name, value).ok_or_else(|| {
            Error::parse(path, index + 1, format!("invalid value for {name}"))
        })?;
        settings.push(name, value);
    }
    debug!("{} settings read from {}", settings.total_len(), path.display());
    Ok(settings)
}

pub fn write_settings<P: AsRef<Path>>(path: P, settings: &SolverSettings) -> Result<()> {
    let path = path.as_ref();
    let write = || -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for (name, value) in settings.iter() {
            writeln!(w, "{name} = {value}")?;
        }
        w.flush()
    };
    write().map_err(|e| Error::io(path, e))
}

/// Read a solution of `problem`, matching columns by name.
pub fn read_solution<N: Real, P: AsRef<Path>>(path: P, problem: &Problem<N>) -> Result<Solution<N>> {
    let path = path.as_ref();
    let index: HashMap<&str, usize> = problem
        .col_names()
        .iter()
        .enumerate()
        .map(|(j, name)| (name.as_str(), j))
        .collect();
    let mut status = SolutionStatus::Feasible;
    let mut primal = vec![N::zero(); problem.ncols()];
    let mut ray: Option<Vec<N>> = None;
    for (lineno, line) in read_to_string(path)?.lines().enumerate() {
        let lineno = lineno + 1;
        let tokens: Vec<&str> = strip_comment(line).split_whitespace().collect();
        let (target, name, value) = match tokens[..] {
            [] => continue,
            ["status", s] => {
                status = s.parse().map_err(|e: String| Error::parse(path, lineno, e))?;
                continue;
            }
            // Objective value written by some solvers
            ["=obj=", _] | ["objective", _] => continue,
            ["ray", name, value] => (ray.get_or_insert_with(|| vec![N::zero(); problem.ncols()]), name, value),
            [name, value] => (&mut primal, name, value),
            _ => return Err(Error::parse(path, lineno, "expected name and value")),
        };
        let Some(&col) = index.get(name) else {
            warn!("{}:{lineno}: unknown column {name} ignored", path.display());
            continue;
        };
        target[col] = N::parse_real(value)
            .ok_or_else(|| Error::parse(path, lineno, format!("invalid number {value}")))?;
    }
    Ok(match status {
        SolutionStatus::Feasible => Solution::feasible(primal),
        SolutionStatus::Unbounded => Solution::unbounded(primal, ray.unwrap_or_default()),
        other => Solution::new(other),
    })
}

pub fn write_solution<N: Real, P: AsRef<Path>>(
    path: P,
    problem: &Problem<N>,
    solution: &Solution<N>,
) -> Result<()> {
    let path = path.as_ref();
    let names = problem.col_names();
    let write = || -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "status {}", solution.status)?;
        for (name, x) in names.iter().zip(&solution.primal) {
            if !x.is_zero() {
                writeln!(w, "{name} {x}")?;
            }
        }
        for (name, x) in names.iter().zip(&solution.ray) {
            if !x.is_zero() {
                writeln!(w, "ray {name} {x}")?;
            }
        }
        w.flush()
    };
    write().map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::tests::small;

    #[test]
    fn setting_values() {
        assert_eq!(parse_setting("a", "TRUE"), Some(SettingValue::Bool(true)));
        assert_eq!(parse_setting("a", " 12 "), Some(SettingValue::Int(12)));
        assert_eq!(parse_setting("a", "12345678901"), Some(SettingValue::Long(12345678901)));
        assert_eq!(parse_setting("limits/nodes", "-1"), Some(SettingValue::Limit(-1)));
        assert_eq!(parse_setting("limits/time", "1e20"), Some(SettingValue::Double(1e20)));
        assert_eq!(parse_setting("a", "0.5"), Some(SettingValue::Double(0.5)));
        assert_eq!(parse_setting("a", "'p'"), Some(SettingValue::Char('p')));
        assert_eq!(parse_setting("a", "\"x # y\""), Some(SettingValue::Str("x # y".into())));
        assert_eq!(parse_setting("a", "'pq'"), None);
        assert_eq!(parse_setting("a", "maybe"), None);
    }

    #[test]
    fn settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.set");
        let mut settings = SolverSettings::new();
        settings.push("presolving/enabled", SettingValue::Bool(false));
        settings.push("lp/threads", SettingValue::Int(3));
        settings.push("numerics/feastol", SettingValue::Double(1e-7));
        settings.push("lp/pricing", SettingValue::Char('d'));
        settings.push("visual/output", SettingValue::Str("a # b".into()));
        settings.push("limits/nodes", SettingValue::Limit(100));
        write_settings(&path, &settings).unwrap();
        assert_eq!(read_settings(&path).unwrap(), settings);

        fs::write(&path, "# comment\n\nlp/threads = 2 # trailing\nbroken line\n").unwrap();
        match read_settings(&path) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn solution_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.sol");
        let pb = small();
        let sol = Solution::feasible(vec![1., 0., -2.5]);
        write_solution(&path, &pb, &sol).unwrap();
        assert_eq!(read_solution(&path, &pb).unwrap(), sol);

        let ray = Solution::unbounded(vec![0., 1., 0.], vec![0., 0., 1.]);
        write_solution(&path, &pb, &ray).unwrap();
        assert_eq!(read_solution(&path, &pb).unwrap(), ray);

        fs::write(&path, "status infeasible\n").unwrap();
        assert_eq!(read_solution(&path, &pb).unwrap().status, SolutionStatus::Infeasible);

        fs::write(&path, "=obj= 3\nx0 2\nunknown 4\n").unwrap();
        assert_eq!(read_solution(&path, &pb).unwrap(), Solution::feasible(vec![2., 0., 0.]));
    }
}
