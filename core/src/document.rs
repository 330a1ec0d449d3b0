use crate::tokenizer::normalize;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A record as supplied by a corpus batch. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, alias = "judul")]
    pub title: Option<String>,
    #[serde(default, alias = "konten")]
    pub body: Option<String>,
}

impl RawRecord {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: Some(title.into()), body: Some(body.into()) }
    }
}

/// All records read from one source, in source order.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub source: String,
    pub records: Vec<RawRecord>,
}

impl RecordBatch {
    pub fn new(source: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self { source: source.into(), records }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// `{source}_{position}`, unique across the corpus.
    pub id: String,
    pub source: String,
    pub title: String,
    pub body: String,
    pub full_text: String,
    pub normalized: String,
}

impl Document {
    fn from_record(source: &str, position: usize, record: RawRecord) -> Option<Self> {
        let title = record.title.unwrap_or_default();
        let body = record.body.unwrap_or_default();
        let full_text = format!("{title} {body}");
        if full_text.trim().is_empty() {
            return None;
        }
        let normalized = normalize(&full_text);
        Some(Self {
            id: format!("{source}_{position}"),
            source: source.to_string(),
            title,
            body,
            full_text,
            normalized,
        })
    }
}

/// Owns the loaded corpus. Documents live in an arena addressed by [`DocId`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DocumentStore {
    docs: Vec<Document>,
    by_id: HashMap<String, DocId>,
}

impl DocumentStore {
    pub fn new() -> Self { Self::default() }

    /// Build a store from record batches. Records whose title and body are
    /// both blank are skipped but still consume their position in the batch.
    pub fn load<I>(batches: I) -> Self
    where
        I: IntoIterator<Item = RecordBatch>,
    {
        let mut store = Self::new();
        for batch in batches {
            let before = store.docs.len();
            let total = batch.records.len();
            for (pos, record) in batch.records.into_iter().enumerate() {
                if let Some(doc) = Document::from_record(&batch.source, pos, record) {
                    store.push(doc);
                }
            }
            tracing::debug!(source = %batch.source, records = total, loaded = store.docs.len() - before, "loaded batch");
        }
        store
    }

    fn push(&mut self, doc: Document) {
        if self.by_id.contains_key(&doc.id) {
            tracing::warn!(id = %doc.id, "duplicate document id; keeping the first occurrence");
            return;
        }
        let doc_id = self.docs.len() as DocId;
        self.by_id.insert(doc.id.clone(), doc_id);
        self.docs.push(doc);
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Document> {
        self.docs.get(doc_id as usize)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Document> {
        self.by_id.get(id).and_then(|&doc_id| self.get(doc_id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> {
        self.docs.iter().enumerate().map(|(i, d)| (i as DocId, d))
    }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_batch_positions() {
        let store = DocumentStore::load(vec![RecordBatch::new(
            "berita",
            vec![
                RawRecord::new("Judul pertama", "isi"),
                RawRecord::default(),
                RawRecord::new("", "Hanya konten"),
            ],
        )]);
        assert_eq!(store.len(), 2);
        assert!(store.get_by_id("berita_0").is_some());
        assert!(store.get_by_id("berita_1").is_none());
        let doc = store.get_by_id("berita_2").unwrap();
        assert_eq!(doc.full_text, " Hanya konten");
        assert_eq!(doc.normalized, "hanya konten");
    }

    #[test]
    fn whitespace_only_records_are_skipped() {
        let store = DocumentStore::load(vec![RecordBatch::new("x", vec![RawRecord::new("  ", "\t")])]);
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let store = DocumentStore::load(vec![
            RecordBatch::new("a", vec![RawRecord::new("pertama", "")]),
            RecordBatch::new("a", vec![RawRecord::new("kedua", "")]),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get_by_id("a_0").unwrap().title, "pertama");
    }
}
