use crate::config::EngineConfig;
use crate::document::DocumentStore;
use crate::index::InvertedIndex;
use crate::search::IndexedCorpus;
use crate::vector::{TermVector, VectorSpaceModel, Vocabulary};
use anyhow::{ensure, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    #[serde(default)]
    pub config: EngineConfig,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn docs(&self) -> PathBuf { self.root.join("docs.bin") }
    fn postings(&self) -> PathBuf { self.root.join("postings.bin") }
    fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.bin") }
    fn vectors(&self) -> PathBuf { self.root.join("vectors.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn exists(&self) -> bool { self.meta().is_file() }
}

/// Clear any previous index artifacts and recreate an empty directory.
pub fn prepare_index_dir(paths: &IndexPaths) -> Result<()> {
    if paths.root.exists() {
        fs::remove_dir_all(&paths.root).with_context(|| format!("clearing {}", paths.root.display()))?;
    }
    create_dir_all(&paths.root).with_context(|| format!("creating {}", paths.root.display()))?;
    Ok(())
}

fn save_bin<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let bytes = bincode::serialize(value)?;
    f.write_all(&bytes)?;
    Ok(())
}

fn load_bin<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let value = bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?;
    Ok(value)
}

fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    fs::write(paths.meta(), json).with_context(|| format!("writing {}", paths.meta().display()))
}

/// Read only `meta.json`; enough to report what an index directory holds.
pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let text = fs::read_to_string(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let meta: MetaFile = serde_json::from_str(&text).with_context(|| format!("decoding {}", paths.meta().display()))?;
    Ok(meta)
}

/// Write every artifact of a built generation. `created_at` is recorded
/// verbatim in `meta.json`.
pub fn save_index(paths: &IndexPaths, corpus: &IndexedCorpus, created_at: String) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    save_bin(&paths.docs(), corpus.store())?;
    save_bin(&paths.postings(), corpus.index())?;
    save_bin(&paths.vocabulary(), corpus.model().vocabulary())?;
    save_bin(&paths.vectors(), &corpus.model().doc_vectors())?;
    let meta = MetaFile {
        num_docs: corpus.store().len() as u32,
        num_terms: corpus.index().num_terms() as u32,
        created_at,
        version: FORMAT_VERSION,
        config: *corpus.config(),
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "saved index");
    Ok(meta)
}

/// Read back a generation written by [`save_index`].
pub fn load_index(paths: &IndexPaths) -> Result<(IndexedCorpus, MetaFile)> {
    let meta = load_meta(paths)?;
    ensure!(meta.version == FORMAT_VERSION, "unsupported index version {} (expected {})", meta.version, FORMAT_VERSION);
    let store: DocumentStore = load_bin(&paths.docs())?;
    let index: InvertedIndex = load_bin(&paths.postings())?;
    let vocabulary: Vocabulary = load_bin(&paths.vocabulary())?;
    let vectors: Vec<TermVector> = load_bin(&paths.vectors())?;
    ensure!(
        store.len() == index.num_docs() && store.len() == vectors.len(),
        "index artifacts in {} disagree on document count",
        paths.root.display()
    );
    let model = VectorSpaceModel::from_parts(vocabulary, vectors);
    Ok((IndexedCorpus::from_parts(meta.config, store, index, model), meta))
}
