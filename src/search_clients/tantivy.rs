use crate::config::AppConfig;
use crate::document::{PhotoDocument, PhotoHit};
use crate::error::AppError;
use crate::search::PhotoIndex;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Term, STORED, STRING, TEXT};
use tantivy::tokenizer::TokenStream;
use tantivy::{Document, Index, IndexReader, IndexWriter, ReloadPolicy};

/// Elasticsearch returns ten hits unless told otherwise; the embedded index
/// applies the same cap.
const RESULT_LIMIT: usize = 10;
const WRITER_MEMORY_BYTES: usize = 50_000_000;

#[derive(Clone, Copy)]
struct PhotoFields {
    object_key: Field,
    bucket: Field,
    created_timestamp: Field,
    labels: Field,
}

fn build_schema() -> (Schema, PhotoFields) {
    let mut schema_builder = Schema::builder();
    let fields = PhotoFields {
        object_key: schema_builder.add_text_field("objectKey", STRING | STORED),
        bucket: schema_builder.add_text_field("bucket", STRING | STORED),
        created_timestamp: schema_builder.add_text_field("createdTimestamp", STRING | STORED),
        labels: schema_builder.add_text_field("labels", TEXT | STORED),
    };
    (schema_builder.build(), fields)
}

/// Embedded label index. One writer is shared by every request; readers are
/// reloaded after each commit so writes are visible to the next search.
pub struct TantivySearcher {
    index: Index,
    fields: PhotoFields,
    writer: Arc<Mutex<IndexWriter>>,
    reader: IndexReader,
}

impl TantivySearcher {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let index_path = &config.tantivy_index_path;
        log::debug!("Initializing Tantivy searcher with index path: {}", index_path);

        std::fs::create_dir_all(index_path)?;
        let (schema, fields) = build_schema();
        let index = Index::open_or_create(MmapDirectory::open(index_path)?, schema)?;
        Self::from_index(index, fields)
    }

    pub fn in_memory() -> Result<Self, AppError> {
        let (schema, fields) = build_schema();
        Self::from_index(Index::create_in_ram(schema), fields)
    }

    fn from_index(index: Index, fields: PhotoFields) -> Result<Self, AppError> {
        let writer = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        log::debug!("Tantivy searcher initialized successfully.");
        Ok(Self {
            index,
            fields,
            writer: Arc::new(Mutex::new(writer)),
            reader,
        })
    }

    /// Runs each keyword through the `labels` analyzer so matching follows
    /// the same lowercasing the stored labels went through.
    fn labels_query(&self, keywords: &[String]) -> Result<Option<BooleanQuery>, AppError> {
        let analyzer = self.index.tokenizer_for_field(self.fields.labels)?;
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for keyword in keywords {
            let mut stream = analyzer.token_stream(keyword);
            while stream.advance() {
                let term = Term::from_field_text(self.fields.labels, &stream.token().text);
                clauses.push((
                    Occur::Should,
                    Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)),
                ));
            }
        }
        if clauses.is_empty() {
            return Ok(None);
        }
        Ok(Some(BooleanQuery::new(clauses)))
    }
}

fn lock_poisoned<T>(_: T) -> AppError {
    AppError::Generic("Tantivy index writer lock poisoned".to_string())
}

#[async_trait]
impl PhotoIndex for TantivySearcher {
    async fn upsert_document(&self, document: &PhotoDocument) -> Result<(), AppError> {
        let fields = self.fields;
        let writer = self.writer.clone();
        let reader = self.reader.clone();
        let document = document.clone();

        tokio::task::spawn_blocking(move || -> Result<(), AppError> {
            log::debug!("Indexing document {} into Tantivy", document.object_key);
            let mut doc = Document::default();
            doc.add_text(fields.object_key, &document.object_key);
            doc.add_text(fields.bucket, &document.bucket);
            doc.add_text(fields.created_timestamp, &document.created_timestamp);
            for label in &document.labels {
                doc.add_text(fields.labels, label);
            }

            {
                let mut writer = writer.lock().map_err(lock_poisoned)?;
                writer.delete_term(Term::from_field_text(fields.object_key, &document.object_key));
                writer.add_document(doc)?;
                writer.commit()?;
            }
            reader.reload()?;
            log::trace!("Tantivy index writer committed {}", document.object_key);
            Ok(())
        })
        .await?
    }

    async fn search_labels(&self, keywords: &[String]) -> Result<Vec<PhotoHit>, AppError> {
        let query = match self.labels_query(keywords)? {
            Some(query) => query,
            None => return Ok(Vec::new()),
        };
        let fields = self.fields;
        let reader = self.reader.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<PhotoHit>, AppError> {
            let searcher = reader.searcher();
            let top_docs = searcher.search(&query, &TopDocs::with_limit(RESULT_LIMIT))?;

            let mut hits = Vec::with_capacity(top_docs.len());
            for (_score, doc_address) in top_docs {
                let retrieved = searcher.doc(doc_address)?;
                let text = |field: Field| {
                    retrieved
                        .get_first(field)
                        .and_then(|v| v.as_text())
                        .unwrap_or("")
                        .to_string()
                };
                hits.push(PhotoHit {
                    object_key: text(fields.object_key),
                    bucket: text(fields.bucket),
                    labels: Some(
                        retrieved
                            .get_all(fields.labels)
                            .filter_map(|v| v.as_text())
                            .map(str::to_string)
                            .collect(),
                    ),
                });
            }
            log::debug!("Found {} photos in Tantivy", hits.len());
            Ok(hits)
        })
        .await?
    }
}
