//! Tantivy-based search index module.
//!
//! Provides full-text search over tour cards with field boosting.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, QueryParser};
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{Stored, Tour};

/// Field boosts: a match in the tour name outranks one in the fine print.
const BOOST_NAME: f32 = 10.0;
const BOOST_DESCRIPTION: f32 = 6.0;
const BOOST_ITINERARY: f32 = 4.0;
const BOOST_INCLUSIONS: f32 = 2.0;

/// Search result with tour ID and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub tour_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    tour_id: Field,
    name: Field,
    description: Field,
    itinerary: Field,
    inclusions: Field,
}

/// Tantivy search index for tours.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        let mut schema_builder = Schema::builder();
        let tour_id = schema_builder.add_text_field("tour_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let description = schema_builder.add_text_field("description", TEXT);
        let itinerary = schema_builder.add_text_field("itinerary", TEXT);
        let inclusions = schema_builder.add_text_field("inclusions", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            tour_id,
            name,
            description,
            itinerary,
            inclusions,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from tours.
    pub async fn rebuild(&self, tours: &[Stored<Tour>]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for tour in tours {
            writer.add_document(self.create_document(tour))?;
        }
        writer.commit()?;

        // Reload reader to see new documents
        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} tours", tours.len());
        Ok(())
    }

    /// Index or re-index a single tour.
    pub async fn index_tour(&self, tour: &Stored<Tour>) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.tour_id, &tour.id);
        writer.delete_term(term);
        writer.add_document(self.create_document(tour))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a tour from the index.
    pub async fn remove_tour(&self, tour_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = tantivy::Term::from_field_text(self.fields.tour_id, tour_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for tours matching the query.
    pub fn search(&self, query_str: &str, limit: usize) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let field_queries = [
            (self.fields.name, BOOST_NAME),
            (self.fields.description, BOOST_DESCRIPTION),
            (self.fields.itinerary, BOOST_ITINERARY),
            (self.fields.inclusions, BOOST_INCLUSIONS),
        ];

        let mut subqueries: Vec<(Occur, Box<dyn tantivy::query::Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                subqueries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        if subqueries.is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid search query: {}",
                query_str
            )));
        }
        let query = BooleanQuery::new(subqueries);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.max(1)))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let tour_id = doc.get_first(self.fields.tour_id)?.as_str()?.to_string();
                Some(SearchResult { tour_id, score })
            })
            .collect();

        Ok(results)
    }

    fn create_document(&self, tour: &Stored<Tour>) -> TantivyDocument {
        doc!(
            self.fields.tour_id => tour.id.clone(),
            self.fields.name => tour.doc.name.clone(),
            self.fields.description => tour.doc.description.clone(),
            self.fields.itinerary => tour.doc.itinerary_text(),
            self.fields.inclusions => tour.doc.inclusions.join(" ")
        )
    }
}
