//! Provider subsystem for completion backends.
//!
//! Factory pattern: each backend implements [`Provider`] in its own
//! submodule and is created by canonical name via [`create_provider`].

pub mod openai;
pub mod traits;

pub use traits::{ChatMessage, Provider};

const MAX_API_ERROR_CHARS: usize = 200;

/// Placeholder used when no credential is configured anywhere. Provider
/// calls then fail with an auth error that degrades to the fallback reply;
/// a missing key is never a startup failure.
pub const PLACEHOLDER_API_KEY: &str = "no-key";

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

/// Scrub known secret-like token prefixes from provider error strings.
pub fn scrub_secret_patterns(input: &str) -> String {
    const PREFIXES: [&str; 3] = ["sk-", "xoxb-", "ghp_"];

    let mut scrubbed = input.to_string();

    for prefix in PREFIXES {
        let mut search_from = 0;
        loop {
            let Some(rel) = scrubbed[search_from..].find(prefix) else {
                break;
            };

            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = content_start
                + scrubbed[content_start..]
                    .char_indices()
                    .take_while(|(_, c)| is_secret_char(*c))
                    .last()
                    .map_or(0, |(i, c)| i + c.len_utf8());

            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Sanitize API error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input);

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Build a sanitized provider error from a failed HTTP response.
pub async fn api_error(provider: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read provider error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{provider} API error ({status}): {sanitized}")
}

/// Resolve the provider API key: configured value first (the config file is
/// the secrets store), then environment candidates, finally the placeholder.
pub fn resolve_api_key(configured: Option<&str>) -> String {
    if let Some(raw) = configured {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    for env_var in ["SOUNDESK_API_KEY", "OPENAI_API_KEY", "API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    PLACEHOLDER_API_KEY.to_string()
}

/// Factory: create a provider by canonical name, with an optional base URL
/// override for OpenAI-compatible gateways.
pub fn create_provider(
    name: &str,
    api_key: &str,
    api_url: Option<&str>,
) -> anyhow::Result<Box<dyn Provider>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "openai" => Ok(Box::new(openai::OpenAiProvider::new(api_key, api_url))),
        other => anyhow::bail!("Unknown provider: {other}. Only \"openai\" is currently supported."),
    }
}

/// Information about a supported provider for display purposes.
pub struct ProviderInfo {
    /// Canonical name used in config (e.g. `"openai"`)
    pub name: &'static str,
    /// Human-readable display name
    pub display_name: &'static str,
}

/// All known providers, for `soundesk providers`.
pub fn list_providers() -> Vec<ProviderInfo> {
    vec![ProviderInfo {
        name: "openai",
        display_name: "OpenAI (and compatible endpoints via api_url)",
    }]
}
