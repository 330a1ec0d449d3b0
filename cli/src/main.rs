use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use temu_core::config::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_MAX_TERMS, DEFAULT_TOP_K};
use temu_core::loader::load_path;
use temu_core::persist::{load_index, prepare_index_dir, save_index, IndexPaths};
use temu_core::{DocumentStore, EngineConfig, IndexedCorpus, SearchEngine, SearchError};
use tracing_subscriber::{fmt, EnvFilter};

mod display;

#[derive(Parser)]
#[command(name = "temu")]
#[command(about = "Build and query a term-frequency document search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct Limits {
    /// Maximum vocabulary size
    #[arg(long, default_value_t = DEFAULT_MAX_TERMS)]
    max_terms: usize,
    /// Candidates fetched from the inverted index before re-ranking
    #[arg(long, default_value_t = DEFAULT_CANDIDATE_LIMIT)]
    candidates: usize,
}

impl Limits {
    fn config(self, top_k: usize) -> EngineConfig {
        EngineConfig { max_terms: self.max_terms, candidate_limit: self.candidates, top_k }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dataset (file or directory of CSV/JSON/JSONL) and write the index
    Build {
        #[arg(long)]
        input: PathBuf,
        /// Output index directory; cleared before writing
        #[arg(long, default_value = "./indexdir")]
        index: PathBuf,
        #[command(flatten)]
        limits: Limits,
    },
    /// Query a previously built index
    Search {
        #[arg(long, default_value = "./indexdir")]
        index: PathBuf,
        #[arg(short, long)]
        query: String,
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Print query terms, vocabulary hits and candidate count
        #[arg(long, default_value_t = false)]
        explain: bool,
        /// Print the full search report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Interactive menu: load & index, search, exit
    Shell {
        #[arg(long, default_value = "./dataset")]
        input: PathBuf,
        /// Also persist the index here after every load
        #[arg(long)]
        index: Option<PathBuf>,
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        #[command(flatten)]
        limits: Limits,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, index, limits } => {
            let mut engine = SearchEngine::new(limits.config(DEFAULT_TOP_K));
            let mut out = io::stdout().lock();
            load_and_index(&mut engine, &input, Some(index.as_path()), &mut out)
        }
        Commands::Search { index, query, top_k, explain, json } => {
            run_search(&index, &query, top_k, explain, json)
        }
        Commands::Shell { input, index, top_k, limits } => {
            let stdin = io::stdin().lock();
            let mut out = io::stdout().lock();
            run_shell(stdin, &mut out, &input, index.as_deref(), limits.config(top_k))
        }
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into())
}

/// Load, build and (optionally) persist a new generation. The engine only
/// switches to it once every step has succeeded.
fn load_and_index<W: Write>(engine: &mut SearchEngine, input: &Path, index: Option<&Path>, out: &mut W) -> Result<()> {
    let loaded = load_path(input)?;
    display::write_load_report(out, &loaded)?;

    let corpus = IndexedCorpus::build(*engine.config(), DocumentStore::load(loaded.batches))?;
    writeln!(
        out,
        "Indexed {} documents, {} distinct terms, vocabulary of {}",
        corpus.store().len(),
        corpus.index().num_terms(),
        corpus.model().vocabulary().len()
    )?;

    if let Some(dir) = index {
        let paths = IndexPaths::new(dir);
        prepare_index_dir(&paths).with_context(|| format!("index not saved to {}", dir.display()))?;
        save_index(&paths, &corpus, now_rfc3339()).with_context(|| format!("index not saved to {}", dir.display()))?;
        writeln!(out, "Index written to {}", dir.display())?;
    }
    engine.install(corpus);
    Ok(())
}

fn run_search(index: &Path, query: &str, top_k: usize, explain: bool, json: bool) -> Result<()> {
    let (corpus, meta) = load_index(&IndexPaths::new(index))?;
    tracing::info!(num_docs = meta.num_docs, created_at = %meta.created_at, "loaded index");
    let mut engine = SearchEngine::new(*corpus.config());
    engine.install(corpus);

    let report = engine.explain(query, top_k)?;
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        display::write_report(&mut out, &report, explain)?;
    }
    Ok(())
}

fn write_menu<W: Write>(out: &mut W) -> io::Result<()> {
    let rule = "=".repeat(40);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "=== DOCUMENT SEARCH ===")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "[1] Load & Index Dataset")?;
    writeln!(out, "[2] Search Query")?;
    writeln!(out, "[3] Exit")?;
    writeln!(out, "{rule}")?;
    write!(out, "\nChoice: ")?;
    out.flush()
}

fn run_shell<R: BufRead, W: Write>(input: R, out: &mut W, dataset: &Path, index: Option<&Path>, config: EngineConfig) -> Result<()> {
    let mut engine = SearchEngine::new(config);
    let mut lines = input.lines();

    loop {
        write_menu(out)?;
        let Some(choice) = lines.next() else { break };
        match choice?.trim() {
            "1" => match load_and_index(&mut engine, dataset, index, out) {
                Ok(()) => writeln!(out, "\nDataset loaded and indexed.")?,
                Err(e) => {
                    let state = if engine.is_indexed() { "previous index kept" } else { "no index loaded" };
                    writeln!(out, "\nFailed to load dataset: {e:#} ({state})")?
                }
            },
            "2" => {
                if !engine.is_indexed() {
                    writeln!(out, "\n{}. Load and index the dataset first (option 1).", SearchError::NotIndexed)?;
                    continue;
                }
                write!(out, "\nQuery: ")?;
                out.flush()?;
                let Some(query) = lines.next() else { break };
                let query = query?;
                let query = query.trim();
                if query.is_empty() {
                    writeln!(out, "Query must not be empty.")?;
                    continue;
                }
                let report = engine.explain(query, config.top_k)?;
                display::write_report(out, &report, false)?;
            }
            "3" => {
                writeln!(out, "\nGoodbye.")?;
                break;
            }
            _ => writeln!(out, "\nInvalid option, enter 1, 2 or 3.")?,
        }
    }
    Ok(())
}
