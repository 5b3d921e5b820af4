//! Intent detection for incoming support messages.
//!
//! Keyword heuristics only, no model call. Matching rules live behind
//! [`IntentClassifier`] so they can be swapped or tested independently of
//! response generation.

use serde::{Deserialize, Serialize};

use crate::orders::OrderStore;

/// Phrases that hand the conversation to a human operator. Matching is
/// case-insensitive substring, so "agents" and "reagent" trigger too.
pub const ESCALATION_KEYWORDS: &[&str] = &[
    "fraud",
    "dispute",
    "human",
    "agent",
    "supervisor",
    "manager",
    "speak to someone",
    "real person",
];

const STATUS_MARKERS: &[&str] = &["status", "where", "track"];

const RETURN_MARKERS: &[&str] = &["return", "refund"];

/// Words that mark a message as being about the product catalog.
const PRODUCT_KEYWORDS: &[&str] = &[
    "headphone",
    "earphone",
    "earbud",
    "speaker",
    "wireless",
    "wired",
    "bluetooth",
    "sony",
    "jbl",
    "boult",
    "ptron",
    "oneplus",
    "skullcandy",
    "price",
    "discount",
    "deal",
    "rating",
    "review",
    "recommend",
    "compare",
    "battery",
    "bass",
    "noise",
];

/// Punctuation trimmed from token edges before order-number lookup.
const ORDER_TOKEN_TRIM: &[char] = &['#', '.', ',', '?', '!'];

/// What a message is asking for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Intent {
    /// Hand the conversation to a human operator.
    Escalate,
    /// Status inquiry for a known order.
    OrderStatus { order_id: String },
    /// Return or refund request for a known order.
    ReturnRefund { order_id: String },
    /// Question about the product catalog.
    ProductQuery,
    /// Anything else; delegated to the completion service as-is.
    General,
}

/// Swappable matching rules for intent detection.
pub trait IntentClassifier: Send + Sync {
    /// Classify one utterance. Only the current utterance counts; history
    /// never feeds back into classification.
    fn classify(&self, utterance: &str, orders: &dyn OrderStore) -> Intent;

    /// The name of this classifier implementation.
    fn name(&self) -> &str;
}

/// Case-insensitive substring matching against fixed keyword lists.
/// First match wins, in the order: escalate, order status, return/refund,
/// product query, general.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Find the first whitespace token that names a known order, after
    /// trimming `#.,?!` from the token edges. Membership in the order store
    /// is the only validation.
    pub fn extract_order_number(utterance: &str, orders: &dyn OrderStore) -> Option<String> {
        utterance
            .split_whitespace()
            .map(|word| word.trim_matches(ORDER_TOKEN_TRIM))
            .find(|cleaned| !cleaned.is_empty() && orders.get(cleaned).is_some())
            .map(str::to_string)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

impl IntentClassifier for KeywordClassifier {
    fn classify(&self, utterance: &str, orders: &dyn OrderStore) -> Intent {
        let lowered = utterance.to_lowercase();

        if contains_any(&lowered, ESCALATION_KEYWORDS) {
            return Intent::Escalate;
        }

        if let Some(order_id) = Self::extract_order_number(utterance, orders) {
            if contains_any(&lowered, STATUS_MARKERS) {
                return Intent::OrderStatus { order_id };
            }
            if contains_any(&lowered, RETURN_MARKERS) {
                return Intent::ReturnRefund { order_id };
            }
        }

        if contains_any(&lowered, PRODUCT_KEYWORDS) {
            return Intent::ProductQuery;
        }

        Intent::General
    }

    fn name(&self) -> &str {
        "keyword"
    }
}
