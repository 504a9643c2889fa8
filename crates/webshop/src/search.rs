//! Full-text catalogue search using Tantivy.
//!
//! The index lives in RAM and is built once from the loaded catalogue. Query
//! keywords run through the same English stemming analyzer as the documents,
//! so "shirts" finds "shirt". Title matches weigh more than matches elsewhere
//! in the product text.

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value,
};
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, TextAnalyzer, TokenStream,
};
use tantivy::{Index, IndexReader, ReloadPolicy, Term, doc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use shopping_assistant_core::CatalogueKey;

use crate::catalogue::Catalogue;

/// Most hits returned for one query.
pub const MAX_RESULTS: usize = 50;

const TOKENIZER: &str = "en_stem";
const TITLE_BOOST: f32 = 2.0;
const FUZZY_MIN_LEN: usize = 4;

/// Search errors.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("index error: {0}")]
    Index(String),

    #[error("query error: {0}")]
    Query(String),
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub asin: CatalogueKey,
    pub score: f32,
}

#[derive(Clone, Copy)]
struct SearchFields {
    asin: Field,
    title_text: Field,
    contents_text: Field,
}

/// In-memory search index over a catalogue.
pub struct SearchIndex {
    reader: IndexReader,
    fields: SearchFields,
    analyzer: TextAnalyzer,
    num_docs: u64,
}

impl std::fmt::Debug for SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex")
            .field("num_docs", &self.num_docs)
            .finish_non_exhaustive()
    }
}

fn analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(Stemmer::new(Language::English))
        .build()
}

fn build_schema() -> (Schema, SearchFields) {
    let mut schema_builder = Schema::builder();

    // STRING: indexed as a single token, not analyzed
    let asin = schema_builder.add_text_field("asin", STRING | STORED);

    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text_options = TextOptions::default().set_indexing_options(text_indexing);

    let title_text = schema_builder.add_text_field("title_text", text_options.clone());
    let contents_text = schema_builder.add_text_field("contents_text", text_options);

    let fields = SearchFields {
        asin,
        title_text,
        contents_text,
    };
    (schema_builder.build(), fields)
}

impl SearchIndex {
    /// Index every product of `catalogue`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index writer or reader cannot be created or a
    /// document cannot be added.
    #[instrument(skip_all, fields(products = catalogue.len()))]
    pub fn build(catalogue: &Catalogue) -> Result<Self, SearchError> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        index.tokenizers().register(TOKENIZER, analyzer());

        let mut writer: tantivy::IndexWriter = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| SearchError::Index(format!("Failed to create writer: {e}")))?;

        for product in catalogue.iter() {
            writer
                .add_document(doc!(
                    fields.asin => product.asin.as_str(),
                    fields.title_text => product.title.as_str(),
                    fields.contents_text => product.contents()
                ))
                .map_err(|e| SearchError::Index(format!("Failed to add document: {e}")))?;
        }

        writer
            .commit()
            .map_err(|e| SearchError::Index(format!("Failed to commit index: {e}")))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::Index(format!("Failed to create reader: {e}")))?;

        let num_docs = reader.searcher().num_docs();
        info!(docs = num_docs, "Search index built");

        Ok(Self {
            reader,
            fields,
            analyzer: analyzer(),
            num_docs,
        })
    }

    /// Number of indexed products.
    #[must_use]
    pub const fn num_docs(&self) -> u64 {
        self.num_docs
    }

    /// Split keywords into index terms.
    fn tokens(&self, keywords: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(keywords);
        let mut tokens = Vec::new();
        while stream.advance() {
            let text = &stream.token().text;
            if !tokens.contains(text) {
                tokens.push(text.clone());
            }
        }
        tokens
    }

    /// Rank products against `keywords`.
    ///
    /// Returns at most `limit` hits, best first. Keywords with no indexable
    /// token return no hits.
    ///
    /// # Errors
    ///
    /// Returns an error if the search or document retrieval fails.
    #[instrument(skip(self))]
    pub fn search(&self, keywords: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        let tokens = self.tokens(keywords);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for token in &tokens {
            let title_term = Term::from_field_text(self.fields.title_text, token);
            subqueries.push((
                Occur::Should,
                Box::new(BoostQuery::new(
                    Box::new(TermQuery::new(title_term, IndexRecordOption::WithFreqs)),
                    TITLE_BOOST,
                )),
            ));

            let contents_term = Term::from_field_text(self.fields.contents_text, token);
            subqueries.push((
                Occur::Should,
                Box::new(TermQuery::new(
                    contents_term.clone(),
                    IndexRecordOption::WithFreqs,
                )),
            ));

            if token.chars().count() >= FUZZY_MIN_LEN {
                subqueries.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(contents_term, 1, true)),
                ));
            }
        }
        let query = BooleanQuery::new(subqueries);

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::Query(format!("Search failed: {e}")))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc = searcher
                .doc::<tantivy::TantivyDocument>(address)
                .map_err(|e| SearchError::Query(format!("Failed to retrieve doc: {e}")))?;
            let asin = doc
                .get_first(self.fields.asin)
                .and_then(|value| value.as_str())
                .ok_or_else(|| SearchError::Query("Indexed document has no asin".to_string()))?;
            hits.push(SearchHit {
                asin: CatalogueKey::new(asin),
                score,
            });
        }

        debug!(hits = hits.len(), "Search complete");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Product;
    use indexmap::IndexMap;
    use rust_decimal::Decimal;

    fn product(asin: &str, title: &str, description: &str) -> Product {
        Product {
            asin: CatalogueKey::new(asin),
            title: title.to_string(),
            description: description.to_string(),
            bullet_points: Vec::new(),
            price: Decimal::TEN,
            price_display: "$10.00".to_string(),
            rating: None,
            main_image: None,
            options: IndexMap::new(),
            reviews: Vec::new(),
            category: None,
            query: None,
        }
    }

    fn index() -> SearchIndex {
        let catalogue = Catalogue::from_products([
            product("B1", "Blue Cotton T-Shirt", "A soft shirt for summer"),
            product("B2", "Red Wool Socks", "Warm socks with a blue stripe"),
            product("B3", "Garden Hose", "Fifty feet of green hose"),
        ]);
        SearchIndex::build(&catalogue).expect("build index")
    }

    #[test]
    fn test_title_match_ranks_first() {
        let hits = index().search("blue shirt", MAX_RESULTS).expect("search");
        let keys: Vec<&str> = hits.iter().map(|hit| hit.asin.as_str()).collect();
        assert_eq!(keys.first(), Some(&"B1"));
        assert!(keys.contains(&"B2"));
        assert!(!keys.contains(&"B3"));
    }

    #[test]
    fn test_stemming_matches_plural() {
        let hits = index().search("shirts", MAX_RESULTS).expect("search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].asin.as_str(), "B1");
    }

    #[test]
    fn test_fuzzy_tolerates_typo() {
        let hits = index().search("gardn", MAX_RESULTS).expect("search");
        assert_eq!(hits.first().map(|hit| hit.asin.as_str()), Some("B3"));
    }

    #[test]
    fn test_no_tokens_no_hits() {
        let index = index();
        assert!(index.search("", MAX_RESULTS).expect("search").is_empty());
        assert!(index.search("  !! ", MAX_RESULTS).expect("search").is_empty());
    }

    #[test]
    fn test_limit_caps_hits() {
        let hits = index().search("blue", 1).expect("search");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_num_docs() {
        assert_eq!(index().num_docs(), 3);
    }
}
