//! The message router: decides between canned replies and delegation to
//! the completion service.
//!
//! All collaborators sit behind traits so the order backend, matching
//! rules, ranking rule, and completion backend are each replaceable on
//! their own.

use tracing::{debug, error};

use crate::catalog::{Catalog, ProductRanker, WeightedSubstringRanker};
use crate::classifier::{Intent, IntentClassifier, KeywordClassifier};
use crate::orders::{MockOrderStore, OrderStore};
use crate::prompt;
use crate::providers::{ChatMessage, Provider};

/// Fixed reply when the conversation is handed to a human operator.
pub const ESCALATION_REPLY: &str = "I'll connect you with a human support agent who can \
     better assist you with this. Please hold while I transfer your chat.";

/// Fixed reply when the completion service is unreachable. The underlying
/// error goes to the log, never into the transcript.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble answering right now. \
     Please try again in a moment, or ask for a human agent.";

/// Completion phrasings that count as a low-confidence reply.
const HEDGING_PHRASES: &[&str] = &[
    "I'm not sure I understand",
    "I don't have that information",
    "I'm unable to assist with that",
    "I'm not sure what you're asking",
    "Could you please clarify",
];

/// Consecutive low-confidence replies tolerated before handing off.
const FAILURE_THRESHOLD: u8 = 2;

/// Per-session state passed into and mutated by [`MessageRouter::route`].
/// No ambient globals; the caller owns this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// Consecutive low-confidence completions. Stays in 0..=1 between
    /// calls: reaching the threshold fires an escalation and resets
    /// within the same call.
    pub failures: u8,
}

pub struct MessageRouter {
    classifier: Box<dyn IntentClassifier>,
    orders: Box<dyn OrderStore>,
    ranker: Box<dyn ProductRanker>,
    catalog: Catalog,
    provider: Box<dyn Provider>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl MessageRouter {
    pub fn new(
        provider: Box<dyn Provider>,
        catalog: Catalog,
        model: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            classifier: Box::new(KeywordClassifier::new()),
            orders: Box::new(MockOrderStore::new()),
            ranker: Box::new(WeightedSubstringRanker::new()),
            catalog,
            provider,
            model: model.to_string(),
            temperature,
            max_tokens,
        }
    }

    /// Swap the matching rules.
    pub fn with_classifier(mut self, classifier: Box<dyn IntentClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Swap the order backend.
    pub fn with_orders(mut self, orders: Box<dyn OrderStore>) -> Self {
        self.orders = orders;
        self
    }

    /// Swap the ranking rule.
    pub fn with_ranker(mut self, ranker: Box<dyn ProductRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    /// Route one utterance. First match wins: escalation, order status,
    /// return/refund, then delegation to the completion service (with
    /// product context injected for catalog queries). Escalation dominates
    /// everything, including order lookups.
    pub async fn route(
        &self,
        utterance: &str,
        history: &[ChatMessage],
        ctx: &mut SessionContext,
    ) -> String {
        let intent = self.classifier.classify(utterance, self.orders.as_ref());
        debug!(?intent, failures = ctx.failures, "routing message");

        if intent == Intent::Escalate || ctx.failures >= FAILURE_THRESHOLD {
            ctx.failures = 0;
            return ESCALATION_REPLY.to_string();
        }

        match intent {
            Intent::OrderStatus { ref order_id } => {
                if let Some(record) = self.orders.get(order_id) {
                    return record.status_reply();
                }
            }
            Intent::ReturnRefund { ref order_id } => {
                if let Some(record) = self.orders.get(order_id) {
                    return record.return_reply();
                }
            }
            _ => {}
        }

        let mut messages = vec![ChatMessage::system(prompt::system_prompt(&self.catalog))];
        if intent == Intent::ProductQuery {
            let ranked = self.ranker.rank(&self.catalog, utterance);
            messages.push(ChatMessage::system(prompt::context_block(&ranked)));
        }
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(utterance));

        let reply = match self
            .provider
            .chat_with_history(&messages, &self.model, self.temperature, self.max_tokens)
            .await
        {
            Ok(reply) => reply,
            Err(err) => {
                error!(provider = self.provider.name(), error = %err, "completion request failed");
                // An error reply is not a low-confidence completion.
                ctx.failures = 0;
                return FALLBACK_REPLY.to_string();
            }
        };

        if HEDGING_PHRASES.iter().any(|phrase| reply.contains(phrase)) {
            ctx.failures += 1;
            if ctx.failures >= FAILURE_THRESHOLD {
                ctx.failures = 0;
                return ESCALATION_REPLY.to_string();
            }
        } else {
            ctx.failures = 0;
        }

        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Provider that returns a fixed reply and records what it was sent.
    struct FixedProvider {
        reply: String,
        seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    }

    impl FixedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Arc::new(Mutex::new(Vec::new())),
            }
        }

        /// Same, plus a handle to the requests it receives.
        fn capturing(reply: &str) -> (Self, Arc<Mutex<Vec<Vec<ChatMessage>>>>) {
            let provider = Self::new(reply);
            let seen = provider.seen.clone();
            (provider, seen)
        }
    }

    #[async_trait]
    impl Provider for FixedProvider {
        async fn chat_with_history(
            &self,
            messages: &[ChatMessage],
            _model: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> anyhow::Result<String> {
            self.seen.lock().push(messages.to_vec());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl Provider for FailingProvider {
        async fn chat_with_history(
            &self,
            _messages: &[ChatMessage],
            _model: &str,
            _temperature: f64,
            _max_tokens: u32,
        ) -> anyhow::Result<String> {
            Err(anyhow!("upstream exploded: sk-verysecrettoken"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn router_with(provider: Box<dyn Provider>) -> MessageRouter {
        MessageRouter::new(provider, Catalog::builtin(), "gpt-3.5-turbo", 0.3, 800)
    }

    #[tokio::test]
    async fn escalation_keyword_wins_regardless_of_case_and_order_number() {
        let router = router_with(Box::new(FixedProvider::new("unused")));
        let mut ctx = SessionContext { failures: 1 };

        let reply = router
            .route("This is FRAUD, where is order #123?", &[], &mut ctx)
            .await;
        assert_eq!(reply, ESCALATION_REPLY);
        assert_eq!(ctx.failures, 0);
    }

    #[tokio::test]
    async fn failure_threshold_escalates_any_utterance() {
        let router = router_with(Box::new(FixedProvider::new("unused")));
        let mut ctx = SessionContext { failures: 2 };

        let reply = router.route("hello", &[], &mut ctx).await;
        assert_eq!(reply, ESCALATION_REPLY);
        assert_eq!(ctx.failures, 0);
    }

    #[tokio::test]
    async fn order_status_reply_is_canned() {
        let orders = MockOrderStore::new();
        let eta = match orders.get("123").unwrap().status {
            crate::orders::OrderStatus::Shipped { eta } => eta,
            other => panic!("order 123 should be shipped, got {other}"),
        };
        let router =
            router_with(Box::new(FixedProvider::new("unused"))).with_orders(Box::new(orders));
        let mut ctx = SessionContext::default();

        let reply = router
            .route("What's the status of order #123?", &[], &mut ctx)
            .await;
        assert!(reply.contains("has been shipped"));
        assert!(reply.contains(&eta));
        assert!(reply.contains("Wireless Earbuds, Phone Case"));
    }

    #[tokio::test]
    async fn return_reply_names_order_and_refund_window() {
        let router = router_with(Box::new(FixedProvider::new("unused")));
        let mut ctx = SessionContext::default();

        let reply = router
            .route("I want to refund order 456", &[], &mut ctx)
            .await;
        assert!(reply.contains("#456"));
        assert!(reply.contains("5-7 business days"));
    }

    #[tokio::test]
    async fn unknown_order_number_delegates_to_provider() {
        let router = router_with(Box::new(FixedProvider::new("delegated")));
        let mut ctx = SessionContext::default();

        let reply = router
            .route("what's the status of order 999?", &[], &mut ctx)
            .await;
        assert_eq!(reply, "delegated");
    }

    #[tokio::test]
    async fn product_query_injects_ranked_context() {
        let (provider, seen) = FixedProvider::capturing("here are some options");
        let router = MessageRouter::new(
            Box::new(provider),
            Catalog::builtin(),
            "gpt-3.5-turbo",
            0.3,
            800,
        );
        let mut ctx = SessionContext::default();

        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello!")];
        router
            .route("show me Sony earphones", &history, &mut ctx)
            .await;

        let requests = seen.lock();
        let messages = &requests[0];
        assert!(messages[0].content.contains("PRODUCT_DATA:"));
        assert!(
            messages[1].role == "system" && messages[1].content.contains("PRODUCT CONTEXT"),
            "ranked context should ride along as an extra system message"
        );
        assert!(messages[1].content.contains("Sony"));
        // Prior history in order, then the current utterance last.
        assert_eq!(messages[2].content, "hi");
        assert_eq!(messages[3].content, "hello!");
        assert_eq!(messages.last().unwrap().content, "show me Sony earphones");
    }

    #[tokio::test]
    async fn empty_catalog_product_query_gets_no_data_note() {
        let (provider, seen) = FixedProvider::capturing("ok");
        let router = MessageRouter::new(
            Box::new(provider),
            Catalog::empty(),
            "gpt-3.5-turbo",
            0.3,
            800,
        );
        let mut ctx = SessionContext::default();

        let reply = router
            .route("recommend wireless earbuds", &[], &mut ctx)
            .await;
        assert_eq!(reply, "ok");

        let requests = seen.lock();
        assert!(
            requests[0][1]
                .content
                .contains("no product data is available"),
            "augmentation should degrade to a note, not raise"
        );
    }

    #[tokio::test]
    async fn hedging_reply_increments_then_escalates() {
        let router = router_with(Box::new(FixedProvider::new(
            "I'm not sure I understand what you mean.",
        )));
        let mut ctx = SessionContext::default();

        let first = router.route("gibberish one", &[], &mut ctx).await;
        assert!(first.contains("I'm not sure I understand"));
        assert_eq!(ctx.failures, 1);

        let second = router.route("gibberish two", &[], &mut ctx).await;
        assert_eq!(second, ESCALATION_REPLY);
        assert_eq!(ctx.failures, 0);
    }

    #[tokio::test]
    async fn confident_reply_resets_counter() {
        let router = router_with(Box::new(FixedProvider::new("A clear answer.")));
        let mut ctx = SessionContext { failures: 1 };

        let reply = router.route("tell me more", &[], &mut ctx).await;
        assert_eq!(reply, "A clear answer.");
        assert_eq!(ctx.failures, 0);
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_fallback_reply() {
        let router = router_with(Box::new(FailingProvider));
        let mut ctx = SessionContext { failures: 1 };

        let reply = router.route("hello there", &[], &mut ctx).await;
        assert_eq!(reply, FALLBACK_REPLY);
        assert!(!reply.contains("sk-verysecrettoken"));
        assert_eq!(ctx.failures, 0);
    }

    #[tokio::test]
    async fn history_never_triggers_escalation() {
        let router = router_with(Box::new(FixedProvider::new("sure thing")));
        let mut ctx = SessionContext::default();

        // A prior assistant turn mentioning an escalation keyword must not
        // escalate the current benign utterance.
        let history = vec![
            ChatMessage::user("I need a human agent"),
            ChatMessage::assistant(ESCALATION_REPLY),
        ];
        let reply = router.route("thanks, one more question", &history, &mut ctx).await;
        assert_eq!(reply, "sure thing");
        assert_eq!(ctx.failures, 0);
    }
}
