//! Interactive chat shell. Owns the session transcript and drives the
//! router; the router itself never touches the store.

use anyhow::Result;
use console::style;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::providers::{self, ChatMessage};
use crate::router::{MessageRouter, SessionContext};
use crate::sessions::{InMemorySessionStore, SessionStore, TranscriptEntry};

/// Run the support chat: single-shot when `message` is given, interactive
/// otherwise.
pub async fn run(
    config: Config,
    message: Option<String>,
    provider_override: Option<String>,
    model_override: Option<String>,
    temperature_override: Option<f64>,
) -> Result<()> {
    let catalog = load_catalog(&config).await;
    let router = build_router(
        &config,
        catalog,
        provider_override,
        model_override,
        temperature_override,
    )?;

    let store = InMemorySessionStore::new();
    let session = uuid::Uuid::new_v4().to_string();
    let mut ctx = SessionContext::default();

    if let Some(message) = message {
        let reply = respond(&router, &store, &session, &config, &message, &mut ctx).await?;
        println!("{reply}");
        return Ok(());
    }

    println!(
        "{}",
        style("Soundesk support — ask about products or orders; 'exit' to quit.").bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("you>").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let reply = respond(&router, &store, &session, &config, line, &mut ctx).await?;
        println!("{} {reply}", style("soundesk>").green().bold());
    }

    Ok(())
}

/// Wire the router from config plus CLI overrides.
pub fn build_router(
    config: &Config,
    catalog: Catalog,
    provider_override: Option<String>,
    model_override: Option<String>,
    temperature_override: Option<f64>,
) -> Result<MessageRouter> {
    let provider_name = provider_override
        .or_else(|| config.default_provider.clone())
        .unwrap_or_else(|| "openai".to_string());
    let api_key = providers::resolve_api_key(config.api_key.as_deref());
    let provider = providers::create_provider(&provider_name, &api_key, config.api_url.as_deref())?;

    let model = model_override
        .or_else(|| config.default_model.clone())
        .unwrap_or_else(|| "gpt-3.5-turbo".to_string());
    let temperature = temperature_override.unwrap_or(config.default_temperature);

    Ok(MessageRouter::new(
        provider,
        catalog,
        &model,
        temperature,
        config.max_tokens,
    ))
}

/// Load the configured catalog, degrading on failure instead of aborting.
pub async fn load_catalog(config: &Config) -> Catalog {
    match config.catalog_path() {
        Some(path) => match Catalog::load(&path).await {
            Ok(catalog) => {
                tracing::info!(products = catalog.len(), path = %path.display(), "Catalog loaded");
                catalog
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to load catalog; continuing without product data"
                );
                Catalog::empty()
            }
        },
        None => Catalog::builtin(),
    }
}

/// One exchange: route against prior history, then append both sides.
async fn respond(
    router: &MessageRouter,
    store: &InMemorySessionStore,
    session: &str,
    config: &Config,
    utterance: &str,
    ctx: &mut SessionContext,
) -> Result<String> {
    let history: Vec<ChatMessage> = store
        .transcript(session, Some(config.agent.max_history_messages))
        .await?
        .into_iter()
        .map(|entry| ChatMessage {
            role: entry.role,
            content: entry.content,
        })
        .collect();

    let reply = router.route(utterance, &history, ctx).await;

    store
        .append(session, TranscriptEntry::new("user", utterance))
        .await?;
    store
        .append(session, TranscriptEntry::new("assistant", &reply))
        .await?;

    Ok(reply)
}
