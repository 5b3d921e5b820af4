use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use soundesk::catalog::{ProductRanker, WeightedSubstringRanker};
use soundesk::orders::{MockOrderStore, OrderStore};
use soundesk::{chat, providers, Config};

fn parse_temperature(s: &str) -> std::result::Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=2.0).contains(&t) {
        return Err("temperature must be between 0.0 and 2.0".to_string());
    }
    Ok(t)
}

/// Soundesk - customer support for the headphones storefront.
#[derive(Parser, Debug)]
#[command(name = "soundesk")]
#[command(version)]
#[command(about = "Customer-support chat agent for the Soundesk storefront.", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a support chat session
    #[command(long_about = "\
Start a support chat session.

Launches an interactive session against the configured completion \
provider. Use --message for single-shot queries without entering \
interactive mode.

Examples:
  soundesk chat                                   # interactive session
  soundesk chat -m \"Where is order #123?\"         # single message
  soundesk chat -p openai --model gpt-4o-mini")]
    Chat {
        /// Single message mode (don't enter interactive mode)
        #[arg(short, long)]
        message: Option<String>,

        /// Provider to use (openai)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model to use
        #[arg(long)]
        model: Option<String>,

        /// Temperature (0.0 - 2.0); defaults to the configured value
        #[arg(short, long, value_parser = parse_temperature)]
        temperature: Option<f64>,
    },

    /// Show configuration and data-source status
    Status,

    /// List the orders the mock order book knows about
    Orders,

    /// List the catalog, or rank it against a query
    Catalog {
        /// Query to rank products against
        query: Option<String>,
    },

    /// List supported completion providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("SOUNDESK_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = Config::load_or_init().await?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Chat {
            message,
            provider,
            model,
            temperature,
        } => chat::run(config, message, provider, model, temperature).await,

        Commands::Status => {
            let catalog = chat::load_catalog(&config).await;
            println!("Soundesk Status");
            println!();
            println!("Version:      {}", env!("CARGO_PKG_VERSION"));
            println!("Config:       {}", config.config_path.display());
            println!();
            println!(
                "Provider:     {}",
                config.default_provider.as_deref().unwrap_or("openai")
            );
            println!(
                "Model:        {}",
                config.default_model.as_deref().unwrap_or("(default)")
            );
            println!("Temperature:  {}", config.default_temperature);
            println!("Max tokens:   {}", config.max_tokens);
            println!();
            println!(
                "Catalog:      {} products ({})",
                catalog.len(),
                config
                    .catalog
                    .path
                    .as_deref()
                    .unwrap_or("built-in")
            );
            println!("Orders:       {} mock records", MockOrderStore::new().list().len());
            Ok(())
        }

        Commands::Orders => {
            let store = MockOrderStore::new();
            println!("Mock order book ({} records):\n", store.list().len());
            for order in store.list() {
                println!("  #{:<6} {}", order.id, order.status);
                println!("          items: {}", order.items.join(", "));
            }
            Ok(())
        }

        Commands::Catalog { query } => {
            let catalog = chat::load_catalog(&config).await;
            if catalog.is_empty() {
                println!("No product data available.");
                return Ok(());
            }

            match query {
                Some(query) => {
                    let ranker = WeightedSubstringRanker::new();
                    let ranked = ranker.rank(&catalog, &query);
                    if ranked.is_empty() {
                        println!("No products match \"{query}\".");
                        return Ok(());
                    }
                    println!("Top matches for \"{query}\":\n");
                    for product in ranked {
                        println!(
                            "  {} — ₹{} ({}% off, rated {})",
                            product.product_name,
                            product.discounted_price,
                            product.discount_percentage,
                            product.rating
                        );
                    }
                }
                None => {
                    println!("Catalog ({} products):\n", catalog.len());
                    for product in catalog.products() {
                        println!(
                            "  {} — ₹{} (rated {} by {} customers)",
                            product.product_name,
                            product.discounted_price,
                            product.rating,
                            product.rating_count
                        );
                    }
                }
            }
            Ok(())
        }

        Commands::Providers => {
            let providers = providers::list_providers();
            println!("Supported providers ({} total):\n", providers.len());
            for p in &providers {
                println!("  {:<10} {}", p.name, p.display_name);
            }
            println!("\nAny OpenAI-compatible endpoint works via api_url in config.toml.");
            Ok(())
        }
    }
}
