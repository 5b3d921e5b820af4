//! System prompt assembly for the support agent.

use crate::catalog::{Catalog, Product};

/// Context note used when augmentation finds nothing to inject.
pub const NO_PRODUCT_DATA_NOTE: &str =
    "PRODUCT CONTEXT: no product data is available for this query.";

const AGENT_BEHAVIOR: &str = "\
You are an e-commerce customer support agent for a headphones marketplace. \
You help customers with queries about headphones, using the provided \
PRODUCT_DATA JSON as your single source of truth.

PRODUCT_DATA is an array of products with these fields: product_name, \
discounted_price (final selling price in INR), actual_price (original \
listed price in INR), discount_percentage, rating (1-5 average), \
rating_count, about_product (short description), reviews (customer \
reviews, positive and negative).

Behavior guidelines:
- Be polite, concise, and helpful, with a natural conversational flow.
- Product info queries: answer with price, rating, description, or reviews \
from PRODUCT_DATA.
- Comparisons: highlight differences in price, features, ratings, and \
reviews across products.
- Filtering and sorting: apply brand, price range, rating, or type filters \
and sort as asked.
- Deals and offers: share discounted price, original price, and discount \
percentage.
- Recommendations: suggest alternatives based on budget, need, or rating.
- Order queries (tracking, returns, complaints): walk through a short \
conversational flow and then hand off to a live agent.
- If a query cannot be resolved from PRODUCT_DATA or standard FAQ, reply: \
\"I'll connect you with a live agent who can help further with this \
request.\"
- Never invent product data outside PRODUCT_DATA.";

/// The static behavior prompt with the full catalog embedded.
pub fn system_prompt(catalog: &Catalog) -> String {
    let data = serde_json::to_string_pretty(catalog.products())
        .unwrap_or_else(|_| "[]".to_string());
    format!("{AGENT_BEHAVIOR}\n\nPRODUCT_DATA:\n{data}")
}

/// Serialize ranked rows into the context block appended as an extra system
/// message. Empty input degrades to [`NO_PRODUCT_DATA_NOTE`].
pub fn context_block(products: &[&Product]) -> String {
    if products.is_empty() {
        return NO_PRODUCT_DATA_NOTE.to_string();
    }

    let mut block = String::from("PRODUCT CONTEXT (most relevant first):\n");
    for product in products {
        block.push_str(&format!(
            "- {} — ₹{} (was ₹{}, {}% off), rated {} by {} customers\n  {}\n",
            product.product_name,
            product.discounted_price,
            product.actual_price,
            product.discount_percentage,
            product.rating,
            product.rating_count,
            product.about_product,
        ));
    }
    block
}
