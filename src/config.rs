use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

pub const DEFAULT_JOB_MINUTES: u32 = 120;

const ENV_PREFIX: &str = "CLEANDESK_";

/// Settings for the language-model completion endpoint.
///
/// The API key is never read from the config file; it only comes from the
/// `CLEANDESK_AI_API_KEY` environment variable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Base URL of an OpenAI-compatible API, without the trailing `/chat/completions`.
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file. Relative paths resolve against the data directory.
    pub database_path: PathBuf,
    /// Root directory for receipt photos.
    pub receipts_dir: PathBuf,
    /// Accounts that always resolve to the admin role.
    pub admin_emails: Vec<String>,
    /// Duration shown for jobs without an estimate.
    pub default_job_minutes: u32,
    pub ai: AiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("cleandesk.db"),
            receipts_dir: PathBuf::from("receipts"),
            admin_emails: Vec::new(),
            default_job_minutes: DEFAULT_JOB_MINUTES,
            ai: AiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load `cleandesk.toml` from `data_dir` if present, then apply
    /// environment overrides. Relative paths are anchored at `data_dir`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let file = data_dir.join("cleandesk.toml");
        let mut config = if file.exists() {
            Self::from_file(&file)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());

        if config.database_path.is_relative() {
            config.database_path = data_dir.join(&config.database_path);
        }
        if config.receipts_dir.is_relative() {
            config.receipts_dir = data_dir.join(&config.receipts_dir);
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Apply `CLEANDESK_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(path) = var("DATABASE_PATH") {
            self.database_path = PathBuf::from(path);
        }
        if let Some(dir) = var("RECEIPTS_DIR") {
            self.receipts_dir = PathBuf::from(dir);
        }
        if let Some(emails) = var("ADMIN_EMAILS") {
            self.admin_emails = emails
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(minutes) = var("DEFAULT_JOB_MINUTES").and_then(|m| m.parse().ok()) {
            self.default_job_minutes = minutes;
        }
        if let Some(url) = var("AI_BASE_URL") {
            self.ai.base_url = url;
        }
        if let Some(model) = var("AI_MODEL") {
            self.ai.model = model;
        }
        if let Some(secs) = var("AI_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.ai.timeout_secs = secs;
        }
        if let Some(key) = var("AI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.ai.api_key = Some(key);
        }
    }
}
