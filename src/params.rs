//! Named parameters and the typed configuration of a run.
//!
//! Parameters are registered with a default value, then overwritten by a
//! parameter file and by `--key=value` arguments, in this order.

use crate::error::{Error, Result};
use crate::modifier::MODULE_NAMES;
use log::*;
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Long(v) => write!(f, "{v}"),
            ParamValue::Double(v) => write!(f, "{v}"),
            ParamValue::String(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone)]
struct Parameter {
    description: String,
    value: ParamValue,
    min: f64,
    max: f64,
}

/// Registry of named parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    params: BTreeMap<String, Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, name: &str, description: &str, value: ParamValue, min: f64, max: f64) {
        let previous = self.params.insert(
            name.to_string(),
            Parameter {
                description: description.to_string(),
                value,
                min,
                max,
            },
        );
        assert!(previous.is_none(), "parameter {name} registered twice");
    }
    pub fn add_bool(&mut self, name: &str, description: &str, default: bool) {
        self.add(name, description, ParamValue::Bool(default), 0., 1.)
    }
    pub fn add_int(&mut self, name: &str, description: &str, default: i32, min: i32, max: i32) {
        self.add(
            name,
            description,
            ParamValue::Int(default),
            min.into(),
            max.into(),
        )
    }
    pub fn add_long(&mut self, name: &str, description: &str, default: i64, min: i64, max: i64) {
        self.add(
            name,
            description,
            ParamValue::Long(default),
            min as f64,
            max as f64,
        )
    }
    pub fn add_double(&mut self, name: &str, description: &str, default: f64, min: f64, max: f64) {
        self.add(name, description, ParamValue::Double(default), min, max)
    }
    pub fn add_string(&mut self, name: &str, description: &str, default: &str) {
        self.add(
            name,
            description,
            ParamValue::String(default.to_string()),
            f64::NEG_INFINITY,
            f64::INFINITY,
        )
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name).map(|p| &p.value)
    }
    fn lookup(&self, name: &str) -> Result<&ParamValue> {
        self.get(name)
            .ok_or_else(|| Error::parameter(name, "not registered"))
    }
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.lookup(name)? {
            ParamValue::Bool(b) => Ok(*b),
            _ => Err(Error::parameter(name, "not a boolean")),
        }
    }
    pub fn get_int(&self, name: &str) -> Result<i32> {
        match self.lookup(name)? {
            ParamValue::Int(v) => Ok(*v),
            _ => Err(Error::parameter(name, "not an int")),
        }
    }
    pub fn get_long(&self, name: &str) -> Result<i64> {
        match self.lookup(name)? {
            ParamValue::Long(v) => Ok(*v),
            _ => Err(Error::parameter(name, "not a long")),
        }
    }
    pub fn get_double(&self, name: &str) -> Result<f64> {
        match self.lookup(name)? {
            ParamValue::Double(v) => Ok(*v),
            _ => Err(Error::parameter(name, "not a double")),
        }
    }
    pub fn get_string(&self, name: &str) -> Result<&str> {
        match self.lookup(name)? {
            ParamValue::String(s) => Ok(s),
            _ => Err(Error::parameter(name, "not a string")),
        }
    }

    /// Parse `value` with the type of parameter `name` and store it.
    pub fn set_from_str(&mut self, name: &str, value: &str) -> Result<()> {
        let param = self
            .params
            .get_mut(name)
            .ok_or_else(|| Error::parameter(name, "unknown parameter"))?;
        let value = value.trim();
        let bad = |what: &str| Error::parameter(name, format!("cannot read {value:?} as {what}"));
        let new = match param.value {
            ParamValue::Bool(_) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" => ParamValue::Bool(true),
                "false" | "0" => ParamValue::Bool(false),
                _ => return Err(bad("a boolean")),
            },
            ParamValue::Int(_) => ParamValue::Int(value.parse().map_err(|_| bad("an int"))?),
            ParamValue::Long(_) => ParamValue::Long(value.parse().map_err(|_| bad("a long"))?),
            ParamValue::Double(_) => {
                ParamValue::Double(value.parse().map_err(|_| bad("a double"))?)
            }
            ParamValue::String(_) => ParamValue::String(value.trim_matches('"').to_string()),
        };
        let numeric = match new {
            ParamValue::Int(v) => Some(v.into()),
            ParamValue::Long(v) => Some(v as f64),
            ParamValue::Double(v) => Some(v),
            _ => None,
        };
        if let Some(x) = numeric {
            if x < param.min || x > param.max {
                return Err(Error::parameter(
                    name,
                    format!("{value} outside of [{}, {}]", param.min, param.max),
                ));
            }
        }
        param.value = new;
        Ok(())
    }

    /// Read `key = value` lines. Malformed lines are skipped with a warning.
    pub fn read_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        for (i, line) in content.lines().enumerate() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let res = match line.split_once('=') {
                Some((key, value)) => self.set_from_str(key.trim(), value),
                None => Err(Error::parse(path, i + 1, "expected key = value")),
            };
            if let Err(e) = res {
                warn!("{}:{}: line skipped: {e}", path.display(), i + 1)
            }
        }
        Ok(())
    }

    /// Apply `--key=value` arguments. Any invalid argument is an error.
    pub fn apply_overrides<S: AsRef<str>>(&mut self, args: &[S]) -> Result<()> {
        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .strip_prefix("--")
                .and_then(|a| a.split_once('='))
                .ok_or_else(|| Error::parameter(arg, "expected --key=value"))?;
            self.set_from_str(key, value)?;
        }
        Ok(())
    }

    /// One line per parameter: name, current value and description.
    pub fn describe(&self) -> String {
        let mut res = String::new();
        for (name, p) in &self.params {
            let _ = writeln!(res, "{name:<24} {:<12} {}", p.value.to_string(), p.description);
        }
        res
    }
}

/// How much a reduction may trade faithfulness for size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emphasis {
    /// Keep rows needed to explain an infeasible reference.
    Safe,
    Aggressive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Only check that the instance reproduces the bug.
    ReproduceOnly,
    ReproduceAndReduce,
    /// Reduce without checking the initial instance.
    ReduceOnly,
}

/// Typed configuration of a reduction run. Read-only once the run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuggerParameters {
    pub mode: Mode,
    pub emphasis: Emphasis,
    /// Wall-clock limit in seconds.
    pub tlim: f64,
    pub nbatches: usize,
    pub expenditure: i64,
    pub initround: usize,
    pub initstage: usize,
    pub maxrounds: usize,
    pub maxstages: usize,
    /// Return codes counted as "no bug".
    pub passcodes: Vec<i32>,
    pub debugfile: Option<String>,
    pub checkpoint: Option<String>,
    pub compress: bool,
    pub epsilon: f64,
    pub feastol: f64,
    pub zeta: f64,
    pub enabled: BTreeMap<String, bool>,
}

impl Default for BuggerParameters {
    fn default() -> Self {
        let mut set = ParameterSet::new();
        Self::register(&mut set);
        Self::from_set(&set).unwrap_or_else(|e| panic!("inconsistent default parameters: {e}"))
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl BuggerParameters {
    /// Register every parameter of a run with its default value.
    pub fn register(set: &mut ParameterSet) {
        set.add_int(
            "bugger.mode",
            "-1: reproduce only, 0: reproduce and reduce, 1: reduce only",
            0,
            -1,
            1,
        );
        set.add_int("bugger.emphasis", "0: safe, 1: aggressive", 0, 0, 1);
        set.add_double(
            "bugger.tlim",
            "wall-clock limit in seconds",
            f64::INFINITY,
            0.,
            f64::INFINITY,
        );
        set.add_long(
            "bugger.nbatches",
            "batches per module call, 0 for a single batch",
            2,
            0,
            i64::MAX,
        );
        set.add_long(
            "bugger.expenditure",
            "solving effort per module call used to size batches, 0 to disable",
            0,
            0,
            i64::MAX,
        );
        set.add_int("bugger.initround", "first round", 0, 0, i32::MAX);
        set.add_int("bugger.initstage", "first stage", 0, 0, i32::MAX);
        set.add_int("bugger.maxrounds", "maximum number of rounds", i32::MAX, 0, i32::MAX);
        set.add_int(
            "bugger.maxstages",
            "maximum number of stages",
            MODULE_NAMES.len() as i32,
            0,
            i32::MAX,
        );
        set.add_string(
            "bugger.passcodes",
            "comma separated return codes meaning no bug",
            "",
        );
        set.add_string("bugger.debugfile", "stem of files written for every probe", "");
        set.add_string("bugger.checkpoint", "snapshot written after every round", "");
        set.add_bool(
            "bugger.compress",
            "remove redundant rows and fixed columns from the result",
            false,
        );
        set.add_double("numerics.epsilon", "equality tolerance", 1e-9, 0., 1.);
        set.add_double("numerics.feastol", "feasibility tolerance", 1e-6, 0., 1.);
        set.add_double("numerics.zeta", "admissibility tolerance", 1e-4, 0., 1.);
        for name in MODULE_NAMES {
            set.add_bool(
                &format!("{name}.enabled"),
                &format!("run the {name} module"),
                true,
            );
        }
    }

    pub fn from_set(set: &ParameterSet) -> Result<Self> {
        let mode = match set.get_int("bugger.mode")? {
            -1 => Mode::ReproduceOnly,
            0 => Mode::ReproduceAndReduce,
            _ => Mode::ReduceOnly,
        };
        let emphasis = match set.get_int("bugger.emphasis")? {
            0 => Emphasis::Safe,
            _ => Emphasis::Aggressive,
        };
        let passcodes = set
            .get_string("bugger.passcodes")?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse()
                    .map_err(|_| Error::parameter("bugger.passcodes", format!("bad code {s}")))
            })
            .collect::<Result<Vec<i32>>>()?;
        let enabled = MODULE_NAMES
            .iter()
            .map(|name| Ok((name.to_string(), set.get_bool(&format!("{name}.enabled"))?)))
            .collect::<Result<_>>()?;
        Ok(Self {
            mode,
            emphasis,
            tlim: set.get_double("bugger.tlim")?,
            nbatches: set.get_long("bugger.nbatches")? as usize,
            expenditure: set.get_long("bugger.expenditure")?,
            initround: set.get_int("bugger.initround")? as usize,
            initstage: set.get_int("bugger.initstage")? as usize,
            maxrounds: set.get_int("bugger.maxrounds")? as usize,
            maxstages: set.get_int("bugger.maxstages")? as usize,
            passcodes,
            debugfile: non_empty(set.get_string("bugger.debugfile")?),
            checkpoint: non_empty(set.get_string("bugger.checkpoint")?),
            compress: set.get_bool("bugger.compress")?,
            epsilon: set.get_double("numerics.epsilon")?,
            feastol: set.get_double("numerics.feastol")?,
            zeta: set.get_double("numerics.zeta")?,
            enabled,
        })
    }

    pub fn is_enabled(&self, module: &str) -> bool {
        self.enabled.get(module).copied().unwrap_or(true)
    }
    pub fn set_enabled(&mut self, module: &str, enabled: bool) {
        let _ = self.enabled.insert(module.to_string(), enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn registered() -> ParameterSet {
        let mut set = ParameterSet::new();
        BuggerParameters::register(&mut set);
        set
    }

    #[test]
    fn defaults() {
        let params = BuggerParameters::default();
        assert_eq!(params.mode, Mode::ReproduceAndReduce);
        assert_eq!(params.emphasis, Emphasis::Safe);
        assert_eq!(params.nbatches, 2);
        assert_eq!(params.maxstages, 9);
        assert!(params.tlim.is_infinite());
        assert!(params.passcodes.is_empty());
        assert!(params.is_enabled("varround"));
        assert_eq!(params.debugfile, None);
    }

    #[test]
    fn overrides() {
        let mut set = registered();
        set.apply_overrides(&[
            "--bugger.nbatches=5",
            "--bugger.passcodes=1, -3",
            "--side.enabled=false",
        ])
        .unwrap();
        let params = BuggerParameters::from_set(&set).unwrap();
        assert_eq!(params.nbatches, 5);
        assert_eq!(params.passcodes, vec![1, -3]);
        assert!(!params.is_enabled("side"));
        assert!(set.apply_overrides(&["--bugger.mode=3"]).is_err());
        assert!(set.apply_overrides(&["--unknown=1"]).is_err());
        assert!(set.apply_overrides(&["bugger.mode"]).is_err());
    }

    #[test]
    fn parameter_file_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "bugger.emphasis = 1").unwrap();
        writeln!(file, "this line is wrong").unwrap();
        writeln!(file, "bugger.tlim = soon").unwrap();
        writeln!(file, "bugger.debugfile = \"probe\" # trailing").unwrap();
        let mut set = registered();
        set.read_file(file.path()).unwrap();
        let params = BuggerParameters::from_set(&set).unwrap();
        assert_eq!(params.emphasis, Emphasis::Aggressive);
        assert!(params.tlim.is_infinite());
        assert_eq!(params.debugfile.as_deref(), Some("probe"));
        assert!(set.describe().contains("bugger.nbatches"));
        assert!(set.read_file("/nonexistent/params.set").is_err());
    }
}
