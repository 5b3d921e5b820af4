use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

// ── Top-level config ──────────────────────────────────────────────

/// Top-level Soundesk configuration, loaded from `config.toml`.
///
/// Resolution order: `SOUNDESK_CONFIG_DIR` env → `~/.soundesk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,
    /// API key for the completion provider. Overridden by `SOUNDESK_API_KEY`
    /// or `API_KEY` env vars; absent everywhere means a placeholder key.
    pub api_key: Option<String>,
    /// Base URL override for the provider API (any OpenAI-compatible endpoint)
    pub api_url: Option<String>,
    /// Default provider ID (e.g. `"openai"`). Default: `"openai"`.
    pub default_provider: Option<String>,
    /// Default model routed through the selected provider.
    pub default_model: Option<String>,
    /// Default model temperature (0.0–2.0). Default: `0.3`.
    pub default_temperature: f64,
    /// Completion token cap per reply. Default: `800`.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Agent settings (`[agent]`).
    #[serde(default)]
    pub agent: AgentConfig,

    /// Product catalog source (`[catalog]`).
    #[serde(default)]
    pub catalog: CatalogConfig,
}

fn default_max_tokens() -> u32 {
    800
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: None,
            api_url: None,
            default_provider: Some("openai".to_string()),
            default_model: Some("gpt-3.5-turbo".to_string()),
            default_temperature: 0.3,
            max_tokens: default_max_tokens(),
            agent: AgentConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

/// Agent settings (`[agent]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum conversation history messages sent per completion. Default: `50`.
    #[serde(default = "default_agent_max_history_messages")]
    pub max_history_messages: usize,
}

fn default_agent_max_history_messages() -> usize {
    50
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history_messages: default_agent_max_history_messages(),
        }
    }
}

/// Product catalog source (`[catalog]` section).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Path to a catalog JSON file. Unset means the built-in catalog;
    /// a file that fails to load means an empty one.
    #[serde(default)]
    pub path: Option<String>,
}

fn soundesk_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SOUNDESK_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".soundesk"))
        .context("Could not determine home directory")
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let dir = soundesk_dir()?;
        let config_path = dir.join("config.toml");

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path;
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                initialized = false,
                "Config loaded"
            );
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path;
            config.save().await?;

            // Restrict permissions on the new config file (may hold an API key)
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config.config_path, Permissions::from_mode(0o600))
                    .await;
            }

            tracing::info!(
                path = %config.config_path.display(),
                initialized = true,
                "Config loaded"
            );
            Ok(config)
        }
    }

    /// Catch obviously invalid values early instead of failing at arbitrary
    /// runtime points.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.default_temperature) {
            anyhow::bail!("default_temperature must be between 0.0 and 2.0");
        }
        if self.max_tokens == 0 {
            anyhow::bail!("max_tokens must be greater than 0");
        }
        if self.agent.max_history_messages == 0 {
            anyhow::bail!("agent.max_history_messages must be greater than 0");
        }
        Ok(())
    }

    /// Apply environment variable overrides to config.
    pub fn apply_env_overrides(&mut self) {
        // API key: SOUNDESK_API_KEY or API_KEY (generic)
        if let Ok(key) = std::env::var("SOUNDESK_API_KEY").or_else(|_| std::env::var("API_KEY")) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        // Provider: SOUNDESK_PROVIDER or PROVIDER
        if let Ok(provider) =
            std::env::var("SOUNDESK_PROVIDER").or_else(|_| std::env::var("PROVIDER"))
        {
            if !provider.is_empty() {
                self.default_provider = Some(provider);
            }
        }

        // Model: SOUNDESK_MODEL or MODEL
        if let Ok(model) = std::env::var("SOUNDESK_MODEL").or_else(|_| std::env::var("MODEL")) {
            if !model.is_empty() {
                self.default_model = Some(model);
            }
        }

        // Base URL: SOUNDESK_API_URL
        if let Ok(url) = std::env::var("SOUNDESK_API_URL") {
            if !url.is_empty() {
                self.api_url = Some(url);
            }
        }

        // Temperature: SOUNDESK_TEMPERATURE
        if let Ok(temp_str) = std::env::var("SOUNDESK_TEMPERATURE") {
            if let Ok(temp) = temp_str.parse::<f64>() {
                if (0.0..=2.0).contains(&temp) {
                    self.default_temperature = temp;
                }
            }
        }

        // Catalog path: SOUNDESK_CATALOG
        if let Ok(path) = std::env::var("SOUNDESK_CATALOG") {
            if !path.is_empty() {
                self.catalog.path = Some(path);
            }
        }
    }

    /// Catalog path with `~` expanded, if configured.
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog
            .path
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).into_owned()))
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        // Write to a temp file and rename so a crash never truncates the
        // existing config.
        let file_name = self
            .config_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("config.toml");
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));

        fs::write(&temp_path, &toml_str).await.with_context(|| {
            format!(
                "Failed to write temporary config file: {}",
                temp_path.display()
            )
        })?;

        if let Err(err) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(err).with_context(|| {
                format!("Failed to replace config file: {}", self.config_path.display())
            });
        }

        Ok(())
    }
}
