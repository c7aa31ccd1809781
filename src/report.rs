//! Statistics of a run, as text or as an html page.

use crate::numerics::{Num, Real};
use crate::problem::{ConstraintType, Problem};
use crate::run::RunSummary;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::PathBuf;

/// Number of rows of each type.
pub fn constraint_counts<N: Real>(problem: &Problem<N>, num: &Num<N>) -> BTreeMap<ConstraintType, usize> {
    let mut counts = BTreeMap::new();
    for t in problem.constraint_types(num) {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(status) = self.initial {
            writeln!(f, "Original instance: {status:?}")?;
        }
        writeln!(
            f,
            "{:<12} {:>6} {:>9} {:>8} {:>8} {:>8} {:>9}",
            "module", "calls", "successes", "probes", "batches", "changes", "time (s)"
        )?;
        for (name, s) in &self.modules {
            writeln!(
                f,
                "{:<12} {:>6} {:>9} {:>8} {:>8} {:>8} {:>9.3}",
                name,
                s.calls,
                s.successes,
                s.solver_calls,
                s.accepted_batches,
                s.changes,
                s.time.as_secs_f64()
            )?;
        }
        for r in &self.rounds {
            let statuses: String = r.statuses.iter().map(|s| s.to_string()).collect();
            writeln!(f, "round {:>3} stage {:>2} [{statuses}] {}", r.round, r.stage, r.size)?;
        }
        writeln!(f, "before: {}", self.initial_size)?;
        writeln!(f, "after:  {}", self.final_size)?;
        write!(
            f,
            "{} probes in {:.2}s",
            self.probes,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Objects that can be shown in an html page.
pub trait Html {
    fn print_html<W: Write>(&self, w: &mut W) -> Result<()>;

    /// Write a standalone page in `name.html`.
    fn html(&self, name: &str) -> Result<()> {
        let mut filename = PathBuf::from(name);
        let _ = filename.set_extension("html");
        let mut file = BufWriter::new(File::create(&filename)?);
        header(&mut file, name)?;
        self.print_html(&mut file)?;
        footer(&mut file)?;
        file.flush()
    }
}

const CSS: &str = "
:root {
    --color1: #a3bbdc;
    --color2: #dae4f1;
    --color3: #edf2f8;
    --darkcolor4: #ff971d;
}
h2 {
    color: var(--darkcolor4);
}
table {
    border-collapse: collapse;
    background-color: var(--color3);
}
th {
    background-color: var(--color1);
}
td, th {
    padding: 2px 10px;
    text-align: right;
}
tr:nth-child(even) {
    background-color: var(--color2);
}
.S {
    color: green;
}
";

fn header<W: Write>(w: &mut W, title: &str) -> Result<()> {
    writeln!(
        w,
        "<!DOCTYPE html><html><head>
<meta charset=\"UTF-8\">
<title>{title}</title>
<style>
{CSS}
</style></head><body>"
    )
}

fn footer<W: Write>(w: &mut W) -> Result<()> {
    writeln!(w, "</body></html>")
}

fn row<W: Write, T: fmt::Display>(w: &mut W, cells: &[T]) -> Result<()> {
    write!(w, "<tr>")?;
    for c in cells {
        write!(w, "<td>{c}</td>")?;
    }
    writeln!(w, "</tr>")
}

impl Html for RunSummary {
    fn print_html<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(w, "<h2>Size</h2><table>")?;
        writeln!(w, "<tr><th></th><th>rows</th><th>columns</th><th>nonzeros</th><th>non-integral</th></tr>")?;
        for (label, s) in [("before", &self.initial_size), ("after", &self.final_size)] {
            row(w, &[label.to_string(), s.rows.to_string(), s.cols.to_string(), s.nnz.to_string(), s.nonintegral.to_string()])?;
        }
        writeln!(w, "</table>")?;
        writeln!(w, "<h2>Modules</h2><table>")?;
        writeln!(w, "<tr><th>module</th><th>calls</th><th>successes</th><th>probes</th><th>batches</th><th>changes</th><th>time (s)</th></tr>")?;
        for (name, s) in &self.modules {
            row(
                w,
                &[
                    name.to_string(),
                    s.calls.to_string(),
                    s.successes.to_string(),
                    s.solver_calls.to_string(),
                    s.accepted_batches.to_string(),
                    s.changes.to_string(),
                    format!("{:.3}", s.time.as_secs_f64()),
                ],
            )?;
        }
        writeln!(w, "</table>")?;
        writeln!(w, "<h2>Rounds</h2><table>")?;
        writeln!(w, "<tr><th>round</th><th>stage</th><th>batches</th><th>statuses</th><th>rows</th><th>columns</th></tr>")?;
        for r in &self.rounds {
            let statuses: String = r
                .statuses
                .iter()
                .map(|s| format!("<span class=\"{s}\">{s}</span>"))
                .collect();
            row(
                w,
                &[
                    r.round.to_string(),
                    r.stage.to_string(),
                    r.nbatches.to_string(),
                    statuses,
                    r.size.rows.to_string(),
                    r.size.cols.to_string(),
                ],
            )?;
        }
        writeln!(w, "</table>")?;
        writeln!(
            w,
            "<p>{} probes in {:.2}s.</p>",
            self.probes,
            self.elapsed.as_secs_f64()
        )
    }
}
