//! Reads record batches from disk. Every `.csv`, `.json` or `.jsonl` file is
//! one batch named after its file stem.

use crate::document::{RawRecord, RecordBatch};
use crate::error::SearchError;
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TITLE_COLUMNS: &[&str] = &["title", "judul"];
const BODY_COLUMNS: &[&str] = &["body", "konten"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub source: String,
    pub path: PathBuf,
    /// Number of records read, or why the batch was skipped.
    pub outcome: Result<usize, SearchError>,
}

#[derive(Debug, Default)]
pub struct LoadedCorpus {
    pub batches: Vec<RecordBatch>,
    pub reports: Vec<BatchReport>,
}

impl LoadedCorpus {
    pub fn failures(&self) -> impl Iterator<Item = &SearchError> {
        self.reports.iter().filter_map(|r| r.outcome.as_ref().err())
    }

    pub fn total_records(&self) -> usize {
        self.batches.iter().map(|b| b.records.len()).sum()
    }
}

fn is_batch_file(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("csv" | "json" | "jsonl"))
}

/// Collect batch files under `input` (a single file or a directory tree),
/// sorted by path. Entries the walk could not read (unreadable directories,
/// dangling links) come back as errors so the caller can report them.
pub fn discover(input: &Path) -> Result<Vec<Result<PathBuf, walkdir::Error>>> {
    if input.is_file() {
        return Ok(vec![Ok(input.to_path_buf())]);
    }
    if !input.is_dir() {
        bail!("dataset path {} does not exist", input.display());
    }
    let entries = WalkDir::new(input)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) if e.file_type().is_file() && is_batch_file(e.path()) => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
        .collect();
    Ok(entries)
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load every batch under `input`. A batch that cannot be read is reported
/// and skipped; the rest still load.
pub fn load_path(input: &Path) -> Result<LoadedCorpus> {
    let entries = discover(input)?;
    if entries.is_empty() {
        bail!("no .csv, .json or .jsonl files found under {}", input.display());
    }
    tracing::info!(entries = entries.len(), input = %input.display(), "loading dataset");

    let mut corpus = LoadedCorpus::default();
    for entry in entries {
        let (path, read) = match entry {
            Ok(path) => {
                let read = read_batch(&path);
                (path, read)
            }
            Err(err) => {
                let path = err.path().unwrap_or(input).to_path_buf();
                (path, Err(anyhow::Error::new(err).context("walking dataset directory")))
            }
        };
        let source = source_name(&path);
        let outcome = match read {
            Ok(records) => {
                let n = records.len();
                tracing::info!(source = %source, records = n, "read batch");
                corpus.batches.push(RecordBatch::new(source.clone(), records));
                Ok(n)
            }
            Err(e) => {
                let err = SearchError::RecordBatch { source_name: source.clone(), message: format!("{e:#}") };
                tracing::warn!(source = %source, path = %path.display(), error = %err, "skipping batch");
                Err(err)
            }
        };
        corpus.reports.push(BatchReport { source, path, outcome });
    }
    Ok(corpus)
}

pub fn read_batch(path: &Path) -> Result<Vec<RawRecord>> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => read_csv(path),
        Some("jsonl") => read_jsonl(path),
        Some("json") => read_json(path),
        _ => bail!("unsupported batch file {}", path.display()),
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawRecord>> {
    // Deserialization matches on header names, so they are trimmed up front.
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let has = |names: &[&str]| headers.iter().any(|h| names.contains(&h));
    if !has(TITLE_COLUMNS) || !has(BODY_COLUMNS) {
        bail!("{} must have a title/judul and a body/konten column", path.display());
    }
    let mut records = Vec::new();
    for (row, rec) in reader.deserialize::<RawRecord>().enumerate() {
        records.push(rec.with_context(|| format!("{} row {}", path.display(), row + 1))?);
    }
    Ok(records)
}

fn read_jsonl(path: &Path) -> Result<Vec<RawRecord>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(f);
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let rec: RawRecord = serde_json::from_str(&line)
            .with_context(|| format!("{} line {}", path.display(), lineno + 1))?;
        records.push(rec);
    }
    Ok(records)
}

fn read_json(path: &Path) -> Result<Vec<RawRecord>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(f);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => bail!("{} must hold a record or an array of records", path.display()),
    }
}
