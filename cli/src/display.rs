use std::io::{self, Write};
use temu_core::loader::LoadedCorpus;
use temu_core::{QueryStatus, SearchReport, SearchResult};

const TITLE_PREVIEW: usize = 100;
const BODY_PREVIEW: usize = 150;
const WIDE_RULE: usize = 80;

/// First `max` characters of `s`, never splitting a code point.
pub fn preview(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub fn write_results<W: Write>(out: &mut W, results: &[SearchResult]) -> io::Result<()> {
    if results.is_empty() {
        writeln!(out, "\nNo results found.")?;
        return Ok(());
    }
    let rule = "=".repeat(WIDE_RULE);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "Top {} results:", results.len())?;
    writeln!(out, "{rule}\n")?;
    for (rank, r) in results.iter().enumerate() {
        writeln!(out, "[{}] Score: {:.16}", rank + 1, r.score)?;
        writeln!(out, "    Id: {}", r.id)?;
        writeln!(out, "    Source: {}", r.source)?;
        writeln!(out, "    Title: {}...", preview(&r.title, TITLE_PREVIEW))?;
        writeln!(out, "    Body: {}...", preview(&r.body, BODY_PREVIEW))?;
        writeln!(out, "{}\n", "-".repeat(WIDE_RULE))?;
    }
    Ok(())
}

pub fn write_diagnostics<W: Write>(out: &mut W, report: &SearchReport) -> io::Result<()> {
    writeln!(out, "\nQuery: {}", report.query)?;
    writeln!(out, "Normalized: {}", report.normalized)?;
    for t in &report.terms {
        match t.slot {
            Some(slot) => writeln!(out, "  + '{}' in vocabulary (slot {slot})", t.term)?,
            None => writeln!(out, "  - '{}' not in vocabulary", t.term)?,
        }
    }
    writeln!(out, "Query vector sum: {}, non-zero: {}", report.query_vector_total, report.query_vector_nnz)?;
    writeln!(out, "Candidates: {}", report.candidates)?;
    Ok(())
}

pub fn write_report<W: Write>(out: &mut W, report: &SearchReport, explain: bool) -> io::Result<()> {
    match report.status {
        QueryStatus::EmptyQuery => writeln!(out, "\nQuery is empty after normalization."),
        QueryStatus::NoMatches => {
            if explain {
                write_diagnostics(out, report)?;
            }
            writeln!(out, "\nNo documents found.")
        }
        QueryStatus::Matched => {
            if explain {
                write_diagnostics(out, report)?;
            }
            write_results(out, &report.results)
        }
    }
}

pub fn write_load_report<W: Write>(out: &mut W, loaded: &LoadedCorpus) -> io::Result<()> {
    writeln!(out, "Found {} dataset file(s)\n", loaded.reports.len())?;
    for r in &loaded.reports {
        match &r.outcome {
            Ok(n) => writeln!(out, "Loaded {}: {n} records", r.path.display())?,
            Err(e) => writeln!(out, "Skipped {}: {e}", r.path.display())?,
        }
    }
    let rule = "=".repeat(50);
    writeln!(out, "{rule}\nTotal records: {}\n{rule}", loaded.total_records())?;
    Ok(())
}
