//! Product catalog and relevance ranking.
//!
//! The catalog is loaded once at startup — either the built-in ten-product
//! literal or a JSON file of the same shape — and is read-only afterwards.
//! Relevance scoring lives behind [`ProductRanker`] so the ranking rule can
//! be swapped without touching the router.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const BUILTIN_PRODUCTS: &str = include_str!("builtin_products.json");

/// Ranked rows injected into the prompt context.
const CONTEXT_ROWS: usize = 5;

/// Tokens shorter than this are ignored when scoring.
const MIN_TOKEN_LEN: usize = 3;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One catalog row. Prices are kept as the source strings (INR amounts).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub product_name: String,
    pub discounted_price: String,
    pub actual_price: String,
    pub discount_percentage: String,
    pub rating: String,
    pub rating_count: String,
    pub about_product: String,
    /// Source data stores reviews as one pipe-delimited string; a plain
    /// list is accepted too.
    #[serde(deserialize_with = "deserialize_reviews")]
    pub reviews: Vec<String>,
}

fn deserialize_reviews<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Joined(joined) => joined
            .split('|')
            .map(|review| review.trim().to_string())
            .filter(|review| !review.is_empty())
            .collect(),
        Raw::List(list) => list,
    })
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<Product>,
}

/// Read-only product catalog, populated once at startup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// The ten-product literal compiled into the binary.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_PRODUCTS).expect("built-in catalog JSON is valid")
    }

    /// A catalog with no rows; product augmentation degrades to a
    /// "no data" note.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Ok(Self {
            products: file.products,
        })
    }

    /// Load a catalog file from disk.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json(&contents)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// Pluggable relevance scoring over catalog rows.
pub trait ProductRanker: Send + Sync {
    /// Rank catalog rows against an utterance, most relevant first.
    fn rank<'a>(&self, catalog: &'a Catalog, utterance: &str) -> Vec<&'a Product>;

    /// The name of this ranker implementation.
    fn name(&self) -> &str;
}

/// Substring counting with fixed per-field weights: a token hit in the name
/// scores 10, in the description 3, in each review 2. Top five survive.
#[derive(Debug, Clone, Default)]
pub struct WeightedSubstringRanker;

impl WeightedSubstringRanker {
    pub fn new() -> Self {
        Self
    }

    fn tokenize(utterance: &str) -> Vec<String> {
        utterance
            .to_lowercase()
            .split_whitespace()
            .map(|token| {
                token
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_string()
            })
            .filter(|token| token.len() >= MIN_TOKEN_LEN)
            .collect()
    }

    fn score(product: &Product, tokens: &[String]) -> u32 {
        let name = product.product_name.to_lowercase();
        let about = product.about_product.to_lowercase();
        let mut score = 0;
        for token in tokens {
            if name.contains(token.as_str()) {
                score += 10;
            }
            if about.contains(token.as_str()) {
                score += 3;
            }
            for review in &product.reviews {
                if review.to_lowercase().contains(token.as_str()) {
                    score += 2;
                }
            }
        }
        score
    }
}

impl ProductRanker for WeightedSubstringRanker {
    fn rank<'a>(&self, catalog: &'a Catalog, utterance: &str) -> Vec<&'a Product> {
        let tokens = Self::tokenize(utterance);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(u32, &Product)> = catalog
            .products()
            .iter()
            .map(|product| (Self::score(product, &tokens), product))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored
            .into_iter()
            .take(CONTEXT_ROWS)
            .map(|(_, product)| product)
            .collect()
    }

    fn name(&self) -> &str {
        "weighted_substring"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 10);
    }

    #[test]
    fn pipe_delimited_reviews_split_into_list() {
        let catalog = Catalog::builtin();
        let first = &catalog.products()[0];
        assert_eq!(first.reviews.len(), 5);
        assert!(first.reviews[0].starts_with("Premium feel"));
    }

    #[test]
    fn review_list_form_is_accepted() {
        let json = r#"{"products":[{
            "product_name":"Test Buds",
            "discounted_price":"100","actual_price":"200","discount_percentage":"50",
            "rating":"4.0","rating_count":"10",
            "about_product":"Test earbuds.",
            "reviews":["Good.","Bad."]
        }]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.products()[0].reviews, vec!["Good.", "Bad."]);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Catalog::from_json("{not json").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }

    #[test]
    fn brand_token_ranks_matching_products() {
        let catalog = Catalog::builtin();
        let ranker = WeightedSubstringRanker::new();
        let ranked = ranker.rank(&catalog, "tell me about Sony earphones");
        assert!(!ranked.is_empty());
        assert!(ranked[0].product_name.contains("Sony"));
    }

    #[test]
    fn rank_caps_at_five_rows() {
        let catalog = Catalog::builtin();
        let ranker = WeightedSubstringRanker::new();
        // "headphones" appears in several names and every description.
        let ranked = ranker.rank(&catalog, "best headphones with great battery");
        assert!(ranked.len() <= 5);
        assert!(!ranked.is_empty());
    }

    #[test]
    fn empty_catalog_ranks_nothing() {
        let ranker = WeightedSubstringRanker::new();
        assert!(ranker.rank(&Catalog::empty(), "sony headphones").is_empty());
    }

    #[test]
    fn short_tokens_are_ignored() {
        let catalog = Catalog::builtin();
        let ranker = WeightedSubstringRanker::new();
        assert!(ranker.rank(&catalog, "is it ok").is_empty());
    }

    #[test]
    fn name_hits_outrank_description_hits() {
        let json = r#"{"products":[
            {"product_name":"Alpha Bass Buds","discounted_price":"1","actual_price":"2",
             "discount_percentage":"50","rating":"4","rating_count":"1",
             "about_product":"Earbuds.","reviews":"Fine."},
            {"product_name":"Beta Buds","discounted_price":"1","actual_price":"2",
             "discount_percentage":"50","rating":"4","rating_count":"1",
             "about_product":"Deep bass earbuds.","reviews":"Fine."}
        ]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        let ranked = WeightedSubstringRanker::new().rank(&catalog, "bass");
        assert_eq!(ranked[0].product_name, "Alpha Bass Buds");
    }
}
