use log::*;
use mip_bugger::report::Html;
use mip_bugger::tools::{self, CommandOracle};
use mip_bugger::*;
use num::BigRational;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const HELP: &str = "\
Shrink a mixed-integer program while a solver keeps failing on it.

USAGE:
  mip-bugger -f PROBLEM.mps -c COMMAND [OPTIONS] [--key=value ...]

OPTIONS:
  -f, --problem FILE     problem in (free) MPS format, possibly gzipped
  -s, --settings FILE    solver settings, lines `name = value`
  -o, --solution FILE    reference solution
  -t, --target FILE      settings the setting module moves towards
  -p, --parameters FILE  parameters of the reduction, lines `key = value`
  -c, --command CMD      solver command, with {problem} {settings} {solution}
  -d, --output STEM      where the reduced instance is written [default: bugged]
      --report NAME      write statistics in NAME.html
      --resume FILE      continue from a checkpoint
      --exact            use exact rational arithmetic
      --list-params      print every parameter and exit
  -v, --verbose          debug output
  -h, --help             print this help

Parameters can be given on the command line as --key=value.
";

struct Args {
    problem: Option<PathBuf>,
    settings: Option<PathBuf>,
    solution: Option<PathBuf>,
    target: Option<PathBuf>,
    parameters: Option<PathBuf>,
    command: Option<String>,
    output: PathBuf,
    report: Option<String>,
    resume: Option<PathBuf>,
    exact: bool,
    list_params: bool,
    overrides: Vec<String>,
}

fn parse_args() -> std::result::Result<Option<Args>, pico_args::Error> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(None);
    }
    if pargs.contains(["-v", "--verbose"]) {
        init_debug_log()
    } else {
        init_default_log()
    }
    let args = Args {
        problem: pargs.opt_value_from_str(["-f", "--problem"])?,
        settings: pargs.opt_value_from_str(["-s", "--settings"])?,
        solution: pargs.opt_value_from_str(["-o", "--solution"])?,
        target: pargs.opt_value_from_str(["-t", "--target"])?,
        parameters: pargs.opt_value_from_str(["-p", "--parameters"])?,
        command: pargs.opt_value_from_str(["-c", "--command"])?,
        output: pargs
            .opt_value_from_str(["-d", "--output"])?
            .unwrap_or_else(|| PathBuf::from("bugged")),
        report: pargs.opt_value_from_str("--report")?,
        resume: pargs.opt_value_from_str("--resume")?,
        exact: pargs.contains("--exact"),
        list_params: pargs.contains("--list-params"),
        overrides: pargs
            .finish()
            .into_iter()
            .map(OsString::into_string)
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| pico_args::Error::NonUtf8Argument)?,
    };
    Ok(Some(args))
}

fn parameters(args: &Args) -> Result<BuggerParameters> {
    let mut set = ParameterSet::new();
    BuggerParameters::register(&mut set);
    if let Some(path) = &args.parameters {
        set.read_file(path)?;
    }
    set.apply_overrides(&args.overrides)?;
    if args.list_params {
        print!("{}", set.describe());
    }
    BuggerParameters::from_set(&set)
}

/// Reduce with the solver command working in `workdir`, removed afterwards.
fn run<N: Real>(args: &Args, params: BuggerParameters, workdir: &Path) -> Result<()> {
    let res = reduce::<N>(args, params, workdir);
    if workdir.exists() {
        if let Err(e) = std::fs::remove_dir_all(workdir) {
            warn!("Cannot remove {}: {e}", workdir.display());
        }
    }
    res
}

fn reduce<N: Real>(args: &Args, params: BuggerParameters, workdir: &Path) -> Result<()> {
    let command = args
        .command
        .as_deref()
        .ok_or_else(|| Error::Inconsistent("no solver command given (-c)".into()))?;
    let mut oracle = CommandOracle::<N>::new(command, workdir)?;
    let (instance, state) = match (&args.resume, &args.problem) {
        (Some(snapshot), _) => {
            let (instance, state) = tools::load_checkpoint(snapshot)?;
            (instance, Some(state))
        }
        (None, Some(problem)) => {
            let instance = oracle.read_instance(
                args.settings.as_deref(),
                problem,
                args.solution.as_deref(),
            )?;
            (instance, None)
        }
        (None, None) => return Err(Error::Inconsistent("no problem given (-f)".into())),
    };
    let target = args.target.as_ref().map(tools::read_settings).transpose()?;

    let mut run = BuggerRun::new(params.clone(), instance, &mut oracle, target);
    let violated = run.instance().solution.violations(&run.instance().problem, run.num());
    if !violated.is_empty() {
        warn!("The reference solution violates {}", violated.join(", "));
    }
    if let Some(state) = state {
        run.resume(state);
    }
    let summary = run.run();
    println!("{summary}");
    if let Some(name) = &args.report {
        summary.html(name).map_err(|e| Error::Inconsistent(format!("report: {e}")))?;
    }
    if summary.reduced() {
        let mut instance = run.into_instance();
        if params.compress {
            instance = instance.compress().0;
        }
        let (s, p, o) = tools::write_instance(&args.output, &instance, true, true);
        if !p {
            return Err(Error::Inconsistent(format!(
                "cannot write {}",
                args.output.display()
            )));
        }
        info!(
            "Reduced instance written to {}.mps{}{}",
            args.output.display(),
            if s { " with settings" } else { "" },
            if o { " and solution" } else { "" }
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}\n\n{HELP}");
            return ExitCode::FAILURE;
        }
    };
    let workdir = std::env::temp_dir().join(format!("mip-bugger-{}", std::process::id()));
    let res = parameters(&args).and_then(|params| {
        if args.list_params {
            Ok(())
        } else if args.exact {
            run::<BigRational>(&args, params, &workdir)
        } else {
            run::<f64>(&args, params, &workdir)
        }
    });
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
