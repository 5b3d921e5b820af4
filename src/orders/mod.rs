//! Order lookup behind an injectable key-value interface.
//!
//! A real storefront would back [`OrderStore`] with an order-management
//! service; the default store carries the three fixture records the demo
//! ships with, frozen for the process lifetime.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shipment state of an order, carrying the date field that goes with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum OrderStatus {
    Shipped { eta: String },
    Delivered { delivered_on: String },
    Processing { ships_on: String },
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipped { eta } => write!(f, "shipped (arrives by {eta})"),
            Self::Delivered { delivered_on } => write!(f, "delivered on {delivered_on}"),
            Self::Processing { ships_on } => write!(f, "processing (ships {ships_on})"),
        }
    }
}

/// One order as the support agent sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: String,
    pub status: OrderStatus,
    pub items: Vec<String>,
}

impl OrderRecord {
    /// Canned reply for a status inquiry, worded by shipment state.
    pub fn status_reply(&self) -> String {
        let items = self.items.join(", ");
        match &self.status {
            OrderStatus::Shipped { eta } => format!(
                "Your order #{} has been shipped and is scheduled to arrive by {eta}. It contains: {items}.",
                self.id
            ),
            OrderStatus::Delivered { delivered_on } => format!(
                "Your order #{} was delivered on {delivered_on}. It contained: {items}.",
                self.id
            ),
            OrderStatus::Processing { ships_on } => format!(
                "Your order #{} is currently processing and will ship on {ships_on}. It contains: {items}.",
                self.id
            ),
        }
    }

    /// Canned confirmation for a return/refund request.
    pub fn return_reply(&self) -> String {
        format!(
            "I've initiated a return for order #{}. You'll receive a return shipping label \
             via email shortly. Once we receive the returned items, your refund will be \
             processed within 5-7 business days.",
            self.id
        )
    }
}

/// Key-value lookup into the order book.
///
/// Substituting a real backend means implementing this trait; the router and
/// classifier only ever see the interface.
pub trait OrderStore: Send + Sync {
    /// Look up one order by its exact ID.
    fn get(&self, order_id: &str) -> Option<OrderRecord>;

    /// All known orders, for display.
    fn list(&self) -> Vec<OrderRecord>;

    /// The name of this store implementation.
    fn name(&self) -> &str;
}

/// Fixed three-record store standing in for a real order-management system.
pub struct MockOrderStore {
    records: Vec<OrderRecord>,
}

impl MockOrderStore {
    pub fn new() -> Self {
        let eta = (Utc::now() + Duration::days(3)).format("%B %d").to_string();
        let ships_on = (Utc::now() + Duration::days(2)).format("%B %d").to_string();
        Self {
            records: vec![
                OrderRecord {
                    id: "123".to_string(),
                    status: OrderStatus::Shipped { eta },
                    items: vec!["Wireless Earbuds".to_string(), "Phone Case".to_string()],
                },
                OrderRecord {
                    id: "456".to_string(),
                    status: OrderStatus::Delivered {
                        delivered_on: "September 15".to_string(),
                    },
                    items: vec!["Smart Watch".to_string(), "Charging Cable".to_string()],
                },
                OrderRecord {
                    id: "789".to_string(),
                    status: OrderStatus::Processing { ships_on },
                    items: vec!["Bluetooth Speaker".to_string()],
                },
            ],
        }
    }
}

impl Default for MockOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderStore for MockOrderStore {
    fn get(&self, order_id: &str) -> Option<OrderRecord> {
        self.records.iter().find(|r| r.id == order_id).cloned()
    }

    fn list(&self) -> Vec<OrderRecord> {
        self.records.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_orders_resolve() {
        let store = MockOrderStore::new();
        for id in ["123", "456", "789"] {
            assert!(store.get(id).is_some(), "order {id} should exist");
        }
    }

    #[test]
    fn unknown_order_returns_none() {
        let store = MockOrderStore::new();
        assert!(store.get("999").is_none());
        assert!(store.get("").is_none());
    }

    #[test]
    fn list_returns_all_three() {
        let store = MockOrderStore::new();
        assert_eq!(store.list().len(), 3);
    }

    #[test]
    fn shipped_reply_names_eta_and_items() {
        let store = MockOrderStore::new();
        let record = store.get("123").unwrap();
        let OrderStatus::Shipped { ref eta } = record.status else {
            panic!("order 123 should be shipped");
        };
        let reply = record.status_reply();
        assert!(reply.contains("has been shipped"));
        assert!(reply.contains(eta));
        assert!(reply.contains("Wireless Earbuds, Phone Case"));
    }

    #[test]
    fn delivered_reply_uses_delivery_date() {
        let store = MockOrderStore::new();
        let reply = store.get("456").unwrap().status_reply();
        assert!(reply.contains("was delivered on September 15"));
        assert!(reply.contains("Smart Watch, Charging Cable"));
    }

    #[test]
    fn processing_reply_uses_ship_date() {
        let store = MockOrderStore::new();
        let reply = store.get("789").unwrap().status_reply();
        assert!(reply.contains("currently processing"));
        assert!(reply.contains("Bluetooth Speaker"));
    }

    #[test]
    fn return_reply_names_order_and_refund_window() {
        let store = MockOrderStore::new();
        let reply = store.get("456").unwrap().return_reply();
        assert!(reply.contains("#456"));
        assert!(reply.contains("5-7 business days"));
    }

    #[test]
    fn status_round_trips_through_json() {
        let status = OrderStatus::Shipped {
            eta: "August 07".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"shipped\""));
        assert!(json.contains("\"eta\""));
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
