use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Environment variables checked for an API key, in priority order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["AIMAILER_API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationSettings,
}

fn default_theme() -> String {
    "auto".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Deepseek,
    Groq,
    #[serde(rename = "openrouter")]
    OpenRouter,
    Ollama,
    Custom,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI",
            ProviderKind::OpenAI => "OPENAI",
            ProviderKind::Deepseek => "DEEPSEEK",
            ProviderKind::Groq => "GROQ",
            ProviderKind::OpenRouter => "OPENROUTER",
            ProviderKind::Ollama => "OLLAMA",
            ProviderKind::Custom => "CUSTOM",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
            ProviderKind::Deepseek => "https://api.deepseek.com/v1",
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1",
            ProviderKind::Ollama => "http://localhost:11434/v1",
            ProviderKind::Custom => "https://api.openai.com/v1",
        }
    }

    pub fn default_auth(self) -> ProviderAuth {
        match self {
            ProviderKind::Gemini => ProviderAuth::GoogApiKey,
            ProviderKind::Ollama => ProviderAuth::None,
            _ => ProviderAuth::Bearer,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::OpenAI | ProviderKind::Custom => "gpt-4o-mini",
            ProviderKind::Deepseek => "deepseek-chat",
            ProviderKind::Groq => "llama-3.3-70b-versatile",
            ProviderKind::OpenRouter => "google/gemini-flash-1.5",
            ProviderKind::Ollama => "llama3.2",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderAuth {
    Bearer,
    GoogApiKey,
    None,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub auth: Option<ProviderAuth>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::builtin(ProviderKind::Gemini, None)
    }
}

impl ProviderConfig {
    pub fn builtin(kind: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            kind,
            name: None,
            api_key,
            base_url: kind.default_base_url().to_string(),
            auth: None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .as_ref()
            .filter(|n| !n.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| self.kind.display_name().to_string())
    }

    /// Fills defaults for blank fields and trims user-entered values.
    pub fn normalized(mut self) -> Self {
        if self.base_url.trim().is_empty() {
            self.base_url = self.kind.default_base_url().to_string();
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.api_key = clean_optional(self.api_key.take());
        self.name = clean_optional(self.name.take());
        if self.auth.is_none() {
            self.auth = Some(self.kind.default_auth());
        }
        self
    }

    pub fn effective_auth(&self) -> ProviderAuth {
        self.auth.unwrap_or_else(|| self.kind.default_auth())
    }

    pub fn has_key(&self) -> bool {
        match self.effective_auth() {
            ProviderAuth::None => true,
            ProviderAuth::Bearer | ProviderAuth::GoogApiKey => self
                .api_key
                .as_ref()
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            provider: ProviderConfig::default(),
            generation: GenerationSettings::default(),
        }
    }
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("aimailer"))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads the user config and applies API key environment overrides.
    /// A missing file yields defaults; a missing key is not an error here.
    pub async fn load() -> Result<Self> {
        Self::load_at(&Self::default_path()?).await
    }

    /// Same as [`Config::load`] for an explicit file.
    pub async fn load_at(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path).await?;
        config.apply_api_key_override(api_key_from_env());
        Ok(config)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config at {}", path.display()))?;
        Ok(config)
    }

    pub async fn save(&self) -> Result<()> {
        self.save_to_path(&Self::default_path()?).await
    }

    pub async fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).await?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    pub fn apply_api_key_override(&mut self, key: Option<String>) {
        if let Some(key) = clean_optional(key) {
            self.provider.api_key = Some(key);
        }
    }

    /// Model id sent with every generation call.
    pub fn model(&self) -> String {
        clean_optional(self.generation.model.clone())
            .unwrap_or_else(|| self.provider.kind.default_model().to_string())
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|name| clean_optional(std::env::var(name).ok()))
}

fn clean_optional(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load_from_path(&tmp.path().join("config.toml"))
            .await
            .unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.model(), "gemini-1.5-flash");
        assert!(!config.provider.has_key());
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.theme = "retro".to_string();
        config.provider = ProviderConfig::builtin(ProviderKind::Groq, Some("gsk-test".to_string()));
        config.generation.model = Some("llama3-8b-8192".to_string());
        config.generation.temperature = Some(0.4);

        config.save_to_path(&path).await.unwrap();
        let loaded = Config::load_from_path(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn partial_file_fills_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[provider]\nkind = \"openai\"\napi_key = \" sk-abc \"\n")
            .await
            .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.theme, "auto");
        assert_eq!(config.provider.kind, ProviderKind::OpenAI);
        assert_eq!(config.generation.request_timeout_secs, 60);
        assert_eq!(config.model(), "gpt-4o-mini");

        let provider = config.provider.normalized();
        assert_eq!(provider.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(provider.base_url, "https://api.openai.com/v1");
        assert_eq!(provider.auth, Some(ProviderAuth::Bearer));
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "theme = [").await.unwrap();
        assert!(Config::load_from_path(&path).await.is_err());
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut config = Config::default();
        config.provider.api_key = Some("from-file".to_string());

        config.apply_api_key_override(Some("  ".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-file"));

        config.apply_api_key_override(Some("from-env".to_string()));
        assert_eq!(config.provider.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn ollama_needs_no_key() {
        let provider = ProviderConfig::builtin(ProviderKind::Ollama, None);
        assert!(provider.has_key());
        assert_eq!(provider.normalized().auth, Some(ProviderAuth::None));
    }
}
