
use super::{ChunkMetadata, VectorRecord};
use crate::{RagError, config::Config};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use std::sync::Arc;
use tracing::{debug, info};

/// Persistent chunk collection backed by LanceDB.
///
/// The store owns all `VectorRecord` persistence: the Ingestor is its only
/// writer (via [`VectorStore::upsert_batch`]) and the Retriever reads it back
/// with [`VectorStore::get_all`]. Records survive process restarts at the
/// configured directory; the table is created lazily on first use.
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: Option<usize>,
}

/// Search result from vector similarity search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub metadata: ChunkMetadata,
    pub similarity_score: f32,
    pub distance: f32,
}

/// A record as read back from the store, without its vector.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredChunk {
    pub id: String,
    pub metadata: ChunkMetadata,
}

impl VectorStore {
    /// Open (or create) the collection named by `config.collection` under the
    /// configured vector directory.
    #[inline]
    pub async fn new(config: &Config) -> Result<Self, RagError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        std::fs::create_dir_all(&db_path).map_err(|e| {
            RagError::Database(format!("Failed to create vector database directory: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());
        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            table_name: config.collection.clone(),
            vector_dimension: None,
        };

        store.initialize_table(config.ollama.embedding_dimension as usize).await?;

        info!("Vector store initialized for collection '{}'", store.table_name);
        Ok(store)
    }

    /// Create the table if absent, otherwise detect its vector dimension.
    async fn initialize_table(&mut self, default_dimension: usize) -> Result<(), RagError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            let dim = self.detect_existing_vector_dimension().await?;
            debug!("Collection exists with vector dimension {}", dim);
            self.vector_dimension = Some(dim);
            return Ok(());
        }

        info!(
            "Creating collection '{}' with {} dimensions",
            self.table_name, default_dimension
        );
        let schema = self.create_schema(default_dimension);
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to create table: {}", e)))?;

        self.vector_dimension = Some(default_dimension);
        Ok(())
    }

    /// Detect vector dimension from the existing table schema.
    async fn detect_existing_vector_dimension(&self) -> Result<usize, RagError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open existing table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| RagError::Database(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(RagError::Database(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self, vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("game_id", DataType::UInt32, false),
            Field::new("game_name", DataType::Utf8, false),
            Field::new("section_name", DataType::Utf8, false),
            Field::new("section_text", DataType::Utf8, false),
            Field::new("chunk_text", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Insert or overwrite a single record at its id.
    #[inline]
    pub async fn upsert(&self, record: VectorRecord) -> Result<(), RagError> {
        self.upsert_batch(vec![record]).await
    }

    /// Insert or overwrite records by id via a single merge operation, so
    /// re-ingesting a document replaces its chunks instead of appending
    /// duplicates. Per id, either the whole record lands or the call fails
    /// and the previous version is still there.
    #[inline]
    pub async fn upsert_batch(&self, records: Vec<VectorRecord>) -> Result<(), RagError> {
        if records.is_empty() {
            debug!("No records to upsert");
            return Ok(());
        }

        debug!("Upserting batch of {} records", records.len());

        let expected_dim = self
            .vector_dimension
            .ok_or_else(|| RagError::Database("Vector dimension not set".to_string()))?;
        let vector_dim = records[0].vector.len();
        if vector_dim != expected_dim {
            return Err(RagError::Database(format!(
                "Collection '{}' stores {}-dimensional vectors but this batch has {}; \
                 it was built with a different embedding dimension",
                self.table_name, expected_dim, vector_dim
            )));
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))?;

        let record_batch = self.create_record_batch(&records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(Box::new(reader))
            .await
            .map_err(|e| RagError::Database(format!("Failed to merge records: {}", e)))?;

        info!("Upserted {} records", records.len());
        Ok(())
    }

    fn create_record_batch(&self, records: &[VectorRecord]) -> Result<RecordBatch, RagError> {
        let len = records.len();
        let vector_dim = self
            .vector_dimension
            .ok_or_else(|| RagError::Database("Vector dimension not set".to_string()))?;

        let mut ids = Vec::with_capacity(len);
        let mut vectors = Vec::with_capacity(len);
        let mut game_ids = Vec::with_capacity(len);
        let mut game_names = Vec::with_capacity(len);
        let mut section_names = Vec::with_capacity(len);
        let mut section_texts = Vec::with_capacity(len);
        let mut chunk_texts = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);

        for record in records {
            if record.vector.len() != vector_dim {
                return Err(RagError::Database(format!(
                    "Record '{}' has {} dimensions, expected {}",
                    record.id,
                    record.vector.len(),
                    vector_dim
                )));
            }
            ids.push(record.id.as_str());
            vectors.push(&record.vector);
            game_ids.push(record.metadata.game_id);
            game_names.push(record.metadata.game_name.as_str());
            section_names.push(record.metadata.section_name.as_str());
            section_texts.push(record.metadata.section_text.as_str());
            chunk_texts.push(record.metadata.chunk_text.as_str());
            chunk_indices.push(record.metadata.chunk_index);
            created_ats.push(record.metadata.created_at.as_str());
        }

        let schema = self.create_schema(vector_dim);

        let mut flat_values = Vec::with_capacity(len * vector_dim);
        for vector in &vectors {
            flat_values.extend_from_slice(vector);
        }
        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| RagError::Database(format!("Failed to create vector array: {}", e)))?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(UInt32Array::from(game_ids)),
            Arc::new(StringArray::from(game_names)),
            Arc::new(StringArray::from(section_names)),
            Arc::new(StringArray::from(section_texts)),
            Arc::new(StringArray::from(chunk_texts)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| RagError::Database(format!("Failed to create record batch: {}", e)))
    }

    /// Fetch every stored record, in insertion order. The Retriever filters
    /// client-side by id prefix; this is a full-corpus scan per call.
    #[inline]
    pub async fn get_all(&self) -> Result<Vec<StoredChunk>, RagError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .query()
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to scan table: {}", e)))?;

        let mut chunks = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read scan stream: {}", e)))?
        {
            chunks.extend(self.parse_metadata_batch(&batch, None)?.into_iter().map(
                |(id, metadata, _)| StoredChunk { id, metadata },
            ));
        }

        debug!("Scanned {} stored records", chunks.len());
        Ok(chunks)
    }

    /// Search for the most similar chunks to `query_vector`.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, RagError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .vector_search(query_vector)
            .map_err(|e| RagError::Database(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to execute search: {}", e)))?;

        let mut results = Vec::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| RagError::Database(format!("Failed to read result stream: {}", e)))?
        {
            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>().cloned());
            results.extend(
                self.parse_metadata_batch(&batch, distances.as_ref())?
                    .into_iter()
                    .map(|(id, metadata, distance)| SearchResult {
                        id,
                        metadata,
                        similarity_score: 1.0 - distance,
                        distance,
                    }),
            );
        }

        debug!("Parsed {} search results", results.len());
        Ok(results)
    }

    /// Parse metadata columns out of a record batch. The optional distance
    /// column is zipped in when present (similarity search results).
    fn parse_metadata_batch(
        &self,
        batch: &RecordBatch,
        distances: Option<&Float32Array>,
    ) -> Result<Vec<(String, ChunkMetadata, f32)>, RagError> {
        let num_rows = batch.num_rows();

        let ids = string_column(batch, "id")?;
        let game_ids = u32_column(batch, "game_id")?;
        let game_names = string_column(batch, "game_name")?;
        let section_names = string_column(batch, "section_name")?;
        let section_texts = string_column(batch, "section_text")?;
        let chunk_texts = string_column(batch, "chunk_text")?;
        let chunk_indices = u32_column(batch, "chunk_index")?;
        let created_ats = string_column(batch, "created_at")?;

        let mut rows = Vec::with_capacity(num_rows);
        for row in 0..num_rows {
            let metadata = ChunkMetadata {
                game_id: game_ids.value(row),
                game_name: game_names.value(row).to_string(),
                section_name: section_names.value(row).to_string(),
                section_text: section_texts.value(row).to_string(),
                chunk_text: chunk_texts.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                created_at: created_ats.value(row).to_string(),
            };

            let distance =
                distances.map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            rows.push((ids.value(row).to_string(), metadata, distance));
        }

        Ok(rows)
    }

    /// Total number of stored records.
    #[inline]
    pub async fn count_records(&self) -> Result<u64, RagError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| RagError::Database(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| RagError::Database(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, RagError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}

fn u32_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array, RagError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| RagError::Database(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<UInt32Array>()
        .ok_or_else(|| RagError::Database(format!("Invalid {} column type", name)))
}
