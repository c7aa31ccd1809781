//! Reading and writing problems in free MPS format.
//!
//! Supported sections: `NAME`, `OBJSENSE`, `ROWS`, `COLUMNS` (with integrality
//! markers), `RHS`, `RANGES`, `BOUNDS` and `ENDATA`. Files ending in `.gz` are
//! decompressed on the fly.
//!
//! A right-hand side given for the objective row is the negated objective
//! offset. Integral columns default to the domain `[0, inf)`.

use crate::error::{Error, Result};
use crate::flags::RowFlag;
use crate::numerics::Real;
use crate::problem::{ObjSense, Problem, ProblemBuilder};
use flate2::read::MultiGzDecoder;
use log::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Values at least this large are read as infinite.
const INFINITY: f64 = 1e20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Name,
    ObjSense,
    Rows,
    Columns,
    Rhs,
    Ranges,
    Bounds,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowType {
    Equal,
    Less,
    Greater,
}

/// State of the reader, before the problem is assembled.
struct MpsData<N> {
    name: String,
    sense: ObjSense,
    objective: Option<String>,
    /// Other free rows, ignored.
    free_rows: Vec<String>,
    rows: HashMap<String, usize>,
    row_types: Vec<RowType>,
    row_names: Vec<String>,
    rhs: Vec<N>,
    ranges: Vec<Option<N>>,
    cols: HashMap<String, usize>,
    col_names: Vec<String>,
    obj: Vec<N>,
    offset: N,
    integral: Vec<bool>,
    lb: Vec<Option<N>>,
    ub: Vec<Option<N>>,
    entries: Vec<(usize, usize, N)>,
}

impl<N: Real> MpsData<N> {
    fn new() -> Self {
        Self {
            name: String::new(),
            sense: ObjSense::Minimize,
            objective: None,
            free_rows: Vec::new(),
            rows: HashMap::new(),
            row_types: Vec::new(),
            row_names: Vec::new(),
            rhs: Vec::new(),
            ranges: Vec::new(),
            cols: HashMap::new(),
            col_names: Vec::new(),
            obj: Vec::new(),
            offset: N::zero(),
            integral: Vec::new(),
            lb: Vec::new(),
            ub: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn col(&mut self, name: &str, integral: bool) -> usize {
        if let Some(&j) = self.cols.get(name) {
            return j;
        }
        let j = self.col_names.len();
        let _ = self.cols.insert(name.to_string(), j);
        self.col_names.push(name.to_string());
        self.obj.push(N::zero());
        self.integral.push(integral);
        self.lb.push(Some(N::zero()));
        self.ub.push(None);
        j
    }

    fn is_objective(&self, row: &str) -> bool {
        self.objective.as_deref() == Some(row)
    }

    fn into_problem(self) -> Result<Problem<N>> {
        let mut b = ProblemBuilder::new(self.name, 0, 0);
        b.set_obj_sense(self.sense).set_obj_offset(self.offset);
        for (name, ((obj, lb), (ub, integral))) in self.col_names.into_iter().zip(
            self.obj
                .into_iter()
                .zip(self.lb)
                .zip(self.ub.into_iter().zip(self.integral)),
        ) {
            let j = b.add_col(name);
            b.set_obj(j, obj)
                .set_col_lb(j, lb)
                .set_col_ub(j, ub)
                .set_col_integral(j, integral);
        }
        for (i, name) in self.row_names.into_iter().enumerate() {
            let i2 = b.add_row(name);
            debug_assert_eq!(i, i2);
            let rhs = self.rhs[i].clone();
            let (lhs, rhs) = match (self.row_types[i], self.ranges[i].clone()) {
                (RowType::Equal, None) => (rhs.clone(), rhs),
                (RowType::Equal, Some(r)) if r.is_negative() => (rhs.clone() + r, rhs),
                (RowType::Equal, Some(r)) => (rhs.clone(), rhs + r),
                (RowType::Less, None) => {
                    b.set_row_rhs(i, Some(rhs));
                    continue;
                }
                (RowType::Less, Some(r)) => (rhs.clone() - r.abs(), rhs),
                (RowType::Greater, None) => {
                    b.set_row_lhs(i, Some(rhs));
                    continue;
                }
                (RowType::Greater, Some(r)) => (rhs.clone(), rhs + r.abs()),
            };
            b.set_row_lhs(i, Some(lhs)).set_row_rhs(i, Some(rhs));
        }
        for (row, col, value) in self.entries {
            b.add_entry(row, col, value);
        }
        b.build()
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|e| e == "gz") {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(Box::new(BufReader::new(reader)))
}

fn parse_value<N: Real>(path: &Path, line: usize, s: &str) -> Result<N> {
    N::parse_real(s).ok_or_else(|| Error::parse(path, line, format!("invalid number {s}")))
}

/// A bound value, `None` when infinite.
fn parse_bound<N: Real>(path: &Path, line: usize, s: &str) -> Result<Option<N>> {
    let value: N = parse_value(path, line, s)?;
    match value.to_f64() {
        Some(v) if v.abs() >= INFINITY => Ok(None),
        _ => Ok(Some(value)),
    }
}

/// Read a problem from a free MPS file.
pub fn read_mps<N: Real, P: AsRef<Path>>(path: P) -> Result<Problem<N>> {
    let path = path.as_ref();
    let mut data = MpsData::<N>::new();
    let mut section = Section::Name;
    let mut in_marker = false;
    for (index, line) in open(path)?.lines().enumerate() {
        let lineno = index + 1;
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() || line.starts_with('*') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let err = |msg: &str| Error::parse(path, lineno, msg.to_string());
        if !line.starts_with(char::is_whitespace) {
            section = match tokens[0] {
                "NAME" => {
                    data.name = tokens.get(1).unwrap_or(&"").to_string();
                    Section::Name
                }
                "OBJSENSE" => {
                    if let Some(&sense) = tokens.get(1) {
                        data.sense = parse_sense(sense).ok_or_else(|| err("unknown sense"))?;
                    }
                    Section::ObjSense
                }
                "ROWS" => Section::Rows,
                "COLUMNS" => Section::Columns,
                "RHS" => Section::Rhs,
                "RANGES" => Section::Ranges,
                "BOUNDS" => Section::Bounds,
                "ENDATA" => Section::End,
                other => {
                    // Section bodies are indented, except in files using
                    // first-column names. Treat those as data lines.
                    if section == Section::Name || section == Section::End {
                        return Err(err(&format!("unknown section {other}")));
                    }
                    section
                }
            };
            if matches!(
                tokens[0],
                "NAME" | "OBJSENSE" | "ROWS" | "COLUMNS" | "RHS" | "RANGES" | "BOUNDS" | "ENDATA"
            ) {
                continue;
            }
        }
        match section {
            Section::Name | Section::End => return Err(err("data outside of a section")),
            Section::ObjSense => {
                data.sense = parse_sense(tokens[0]).ok_or_else(|| err("unknown sense"))?;
            }
            Section::Rows => {
                let [kind, name] = tokens[..] else {
                    return Err(err("expected a row type and a name"));
                };
                let row_type = match kind {
                    "N" => {
                        if data.objective.is_none() {
                            data.objective = Some(name.to_string());
                        } else {
                            data.free_rows.push(name.to_string());
                        }
                        continue;
                    }
                    "E" => RowType::Equal,
                    "L" => RowType::Less,
                    "G" => RowType::Greater,
                    _ => return Err(err(&format!("unknown row type {kind}"))),
                };
                let i = data.row_names.len();
                if data.rows.insert(name.to_string(), i).is_some() {
                    return Err(err(&format!("duplicate row {name}")));
                }
                data.row_names.push(name.to_string());
                data.row_types.push(row_type);
                data.rhs.push(N::zero());
                data.ranges.push(None);
            }
            Section::Columns => {
                if tokens.get(1) == Some(&"'MARKER'") {
                    match tokens.get(2) {
                        Some(&"'INTORG'") => in_marker = true,
                        Some(&"'INTEND'") => in_marker = false,
                        _ => return Err(err("unknown marker")),
                    }
                    continue;
                }
                if tokens.len() != 3 && tokens.len() != 5 {
                    return Err(err("expected a column and one or two entries"));
                }
                let col = data.col(tokens[0], in_marker);
                for pair in tokens[1..].chunks(2) {
                    let value: N = parse_value(path, lineno, pair[1])?;
                    if data.is_objective(pair[0]) {
                        data.obj[col] = value;
                    } else if let Some(&row) = data.rows.get(pair[0]) {
                        if !value.is_zero() {
                            data.entries.push((row, col, value));
                        }
                    } else if !data.free_rows.iter().any(|r| r == pair[0]) {
                        return Err(err(&format!("unknown row {}", pair[0])));
                    }
                }
            }
            Section::Rhs | Section::Ranges => {
                // The vector name is optional.
                let pairs = if tokens.len() % 2 == 1 { &tokens[1..] } else { &tokens[..] };
                for pair in pairs.chunks(2) {
                    let [row, value] = pair else {
                        return Err(err("expected row and value pairs"));
                    };
                    let value: N = parse_value(path, lineno, value)?;
                    if section == Section::Rhs && data.is_objective(row) {
                        data.offset = -value;
                    } else if let Some(&i) = data.rows.get(*row) {
                        if section == Section::Rhs {
                            data.rhs[i] = value;
                        } else {
                            data.ranges[i] = Some(value);
                        }
                    } else if !data.free_rows.iter().any(|r| r == row) {
                        return Err(err(&format!("unknown row {row}")));
                    }
                }
            }
            Section::Bounds => read_bound(&mut data, path, lineno, &tokens)?,
        }
    }
    if section != Section::End {
        warn!("{}: missing ENDATA", path.display());
    }
    if data.objective.is_none() {
        warn!("{}: no objective row", path.display());
    }
    data.into_problem()
}

fn parse_sense(s: &str) -> Option<ObjSense> {
    match s {
        "MIN" | "MINIMIZE" => Some(ObjSense::Minimize),
        "MAX" | "MAXIMIZE" => Some(ObjSense::Maximize),
        _ => None,
    }
}

fn read_bound<N: Real>(
    data: &mut MpsData<N>,
    path: &Path,
    lineno: usize,
    tokens: &[&str],
) -> Result<()> {
    let err = |msg: String| Error::parse(path, lineno, msg);
    let kind = tokens[0];
    let needs_value = !matches!(kind, "FR" | "MI" | "PL" | "BV");
    // Skip the optional bound vector name.
    let rest = match (needs_value, tokens.len()) {
        (true, 4) | (false, 3) => &tokens[2..],
        (true, 3) | (false, 2) => &tokens[1..],
        // Some writers give a value to BV bounds.
        (false, 4) if kind == "BV" => &tokens[2..3],
        _ => return Err(err(format!("malformed {kind} bound"))),
    };
    let col = *data
        .cols
        .get(rest[0])
        .ok_or_else(|| err(format!("unknown column {}", rest[0])))?;
    let value = |s: Option<&&str>| -> Result<Option<N>> {
        match s {
            Some(s) => parse_bound(path, lineno, s),
            None => Err(err(format!("missing value in {kind} bound"))),
        }
    };
    match kind {
        "UP" => {
            let ub = value(rest.get(1))?;
            if ub.as_ref().is_some_and(|v| v.is_negative())
                && data.lb[col].as_ref().is_some_and(|v| v.is_zero())
            {
                warn!("Negative upper bound on {}: lower bound set to -inf", rest[0]);
                data.lb[col] = None;
            }
            data.ub[col] = ub;
        }
        "LO" => data.lb[col] = value(rest.get(1))?,
        "FX" => {
            let v = value(rest.get(1))?;
            data.lb[col] = v.clone();
            data.ub[col] = v;
        }
        "FR" => {
            data.lb[col] = None;
            data.ub[col] = None;
        }
        "MI" => data.lb[col] = None,
        "PL" => data.ub[col] = None,
        "BV" => {
            data.integral[col] = true;
            data.lb[col] = Some(N::zero());
            data.ub[col] = Some(N::one());
        }
        "LI" => {
            data.integral[col] = true;
            data.lb[col] = value(rest.get(1))?;
        }
        "UI" => {
            data.integral[col] = true;
            data.ub[col] = value(rest.get(1))?;
        }
        _ => return Err(err(format!("unsupported bound type {kind}"))),
    }
    Ok(())
}

/// Write a problem in free MPS format.
///
/// Redundant rows and rows without finite side are left out.
pub fn write_mps<N: Real, P: AsRef<Path>>(path: P, problem: &Problem<N>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(file);
    write_to(&mut w, problem)
        .and_then(|()| w.flush())
        .map_err(|e| Error::io(path, e))
}

fn write_to<N: Real, W: Write>(w: &mut W, pb: &Problem<N>) -> std::io::Result<()> {
    const OBJ: &str = "obj";
    let matrix = pb.matrix();
    let domains = pb.domains();
    let (lhs, rhs) = (matrix.lhs(), matrix.rhs());
    let written: Vec<bool> = pb
        .row_flags()
        .iter()
        .map(|f| !f.test(RowFlag::Redundant) && !(f.test(RowFlag::LhsInf) && f.test(RowFlag::RhsInf)))
        .collect();
    writeln!(w, "NAME {}", pb.name())?;
    if pb.objective().sense == ObjSense::Maximize {
        writeln!(w, "OBJSENSE\n    MAX")?;
    }
    writeln!(w, "ROWS")?;
    writeln!(w, " N  {OBJ}")?;
    for (i, flags) in pb.row_flags().iter().enumerate() {
        if !written[i] {
            continue;
        }
        let kind = if flags.test(RowFlag::LhsInf) {
            "L"
        } else if flags.test(RowFlag::RhsInf) || !flags.test(RowFlag::Equation) {
            "G"
        } else {
            "E"
        };
        writeln!(w, " {kind}  {}", pb.row_names()[i])?;
    }
    writeln!(w, "COLUMNS")?;
    let mut in_marker = false;
    let mut markers = 0;
    for col in 0..pb.ncols() {
        let integral = domains.is_integral(col);
        if integral != in_marker {
            let kind = if integral { "INTORG" } else { "INTEND" };
            writeln!(w, "    MARKER{markers} 'MARKER' '{kind}'")?;
            markers += usize::from(!integral);
            in_marker = integral;
        }
        let name = &pb.col_names()[col];
        let obj = &pb.objective().coefficients[col];
        let mut empty = true;
        if !obj.is_zero() {
            writeln!(w, "    {name} {OBJ} {obj}")?;
            empty = false;
        }
        for (row, value) in matrix.col(col) {
            if written[row] {
                writeln!(w, "    {name} {} {value}", pb.row_names()[row])?;
                empty = false;
            }
        }
        if empty {
            writeln!(w, "    {name} {OBJ} 0")?;
        }
    }
    if in_marker {
        writeln!(w, "    MARKER{markers} 'MARKER' 'INTEND'")?;
    }
    writeln!(w, "RHS")?;
    let offset = &pb.objective().offset;
    if !offset.is_zero() {
        writeln!(w, "    RHS {OBJ} {}", -offset.clone())?;
    }
    for (i, flags) in pb.row_flags().iter().enumerate() {
        if !written[i] {
            continue;
        }
        let side = if flags.test(RowFlag::LhsInf) { &rhs[i] } else { &lhs[i] };
        if !side.is_zero() {
            writeln!(w, "    RHS {} {side}", pb.row_names()[i])?;
        }
    }
    let ranged: Vec<usize> = (0..pb.nrows())
        .filter(|&i| {
            let f = pb.row_flags()[i];
            written[i] && !f.test(RowFlag::LhsInf) && !f.test(RowFlag::RhsInf) && !f.test(RowFlag::Equation)
        })
        .collect();
    if !ranged.is_empty() {
        writeln!(w, "RANGES")?;
        for i in ranged {
            writeln!(w, "    RNG {} {}", pb.row_names()[i], rhs[i].clone() - lhs[i].clone())?;
        }
    }
    writeln!(w, "BOUNDS")?;
    for col in 0..pb.ncols() {
        let name = &pb.col_names()[col];
        let (lb, ub) = (&domains.lower_bounds[col], &domains.upper_bounds[col]);
        match (domains.lb_inf(col), domains.ub_inf(col)) {
            (true, true) => writeln!(w, " FR BND {name}")?,
            (false, false) if lb == ub => writeln!(w, " FX BND {name} {lb}")?,
            (lb_inf, ub_inf) => {
                if lb_inf {
                    writeln!(w, " MI BND {name}")?;
                } else if !lb.is_zero() {
                    writeln!(w, " LO BND {name} {lb}")?;
                }
                if !ub_inf {
                    writeln!(w, " UP BND {name} {ub}")?;
                }
            }
        }
    }
    writeln!(w, "ENDATA")
}
