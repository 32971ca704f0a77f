use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::identity::{AliasRule, IdentityNormalizer, MatchPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePaths {
    pub posts: PathBuf,
    pub campaigns: PathBuf,
    pub financials: PathBuf,
    pub predictions: PathBuf,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            posts: PathBuf::from("data/influencers"),
            campaigns: PathBuf::from("data/campaigns"),
            financials: PathBuf::from("data/financials"),
            predictions: PathBuf::from("data/predictions.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub containment_fallback: bool,
    pub min_containment_len: usize,
    pub aliases: Vec<AliasRule>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let policy = MatchPolicy::default();
        Self {
            containment_fallback: policy.containment_fallback,
            min_containment_len: policy.min_containment_len,
            aliases: Vec::new(),
        }
    }
}

impl IdentityConfig {
    pub fn policy(&self) -> MatchPolicy {
        MatchPolicy {
            containment_fallback: self.containment_fallback,
            min_containment_len: self.min_containment_len,
        }
    }

    /// Built-in aliases followed by the configured ones.
    pub fn normalizer(&self) -> IdentityNormalizer {
        IdentityNormalizer::with_extra_aliases(self.aliases.iter().cloned())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub web_root: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            web_root: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourcePaths,
    pub identity: IdentityConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse config: {}", err))?
            } else {
                PipelineConfig::default()
            }
        } else {
            PipelineConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|err| format!("failed to create config dir: {}", err))?;
            }
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_var("PAWRANK_POSTS_PATH") {
            self.sources.posts = PathBuf::from(path);
        }
        if let Some(path) = non_empty_var("PAWRANK_CAMPAIGNS_PATH") {
            self.sources.campaigns = PathBuf::from(path);
        }
        if let Some(path) = non_empty_var("PAWRANK_FINANCIALS_PATH") {
            self.sources.financials = PathBuf::from(path);
        }
        if let Some(path) = non_empty_var("PAWRANK_PREDICTIONS_PATH") {
            self.sources.predictions = PathBuf::from(path);
        }
        if let Some(flag) = non_empty_var("PAWRANK_CONTAINMENT_FALLBACK") {
            if let Ok(value) = flag.parse::<bool>() {
                self.identity.containment_fallback = value;
            }
        }
        if let Some(host) = non_empty_var("PAWRANK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty_var("PAWRANK_PORT") {
            if let Ok(value) = port.parse::<u16>() {
                self.server.port = value;
            }
        }
        if let Some(level) = non_empty_var("PAWRANK_LOG") {
            self.logging.level = level;
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn default_config_path() -> Option<PathBuf> {
    non_empty_var("PAWRANK_CONFIG_PATH")
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/pawrank.toml")))
}
