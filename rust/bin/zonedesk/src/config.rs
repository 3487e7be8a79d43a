//! Client-side context management.
//!
//! Reads/writes `~/.zonedesk/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zonedesk_client::{GatewayConfig, DEFAULT_CSRF_HEADER};

/// A single context — connection to one admin API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "staging").
    pub name: String,

    /// API root (e.g. "http://localhost:8000/api").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Session bearer token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Anti-forgery token sent with every request.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub csrf_token: String,

    /// Header carrying `csrf_token`. Empty means the default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub csrf_header: String,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: String::new(),
            token: String::new(),
            csrf_token: String::new(),
            csrf_header: String::new(),
        }
    }

    /// Gateway settings for this context.
    pub fn gateway_config(&self) -> anyhow::Result<GatewayConfig> {
        if self.server.is_empty() {
            anyhow::bail!(
                "No server URL set for context \"{}\". Run `zonedesk context set {} --server <url>`.",
                self.name,
                self.name
            );
        }
        let header = if self.csrf_header.is_empty() {
            DEFAULT_CSRF_HEADER
        } else {
            self.csrf_header.as_str()
        };
        Ok(GatewayConfig::new(&self.server)
            .with_csrf_token(&self.csrf_token)
            .with_csrf_header(header))
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    /// List of configured contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.zonedesk/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the currently active context, if any.
    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    pub fn require_current(&self) -> anyhow::Result<&Context> {
        self.current().ok_or_else(|| {
            anyhow::anyhow!("No current context. Run `zonedesk context set <name> --server <url>`.")
        })
    }

    /// Get a mutable reference to a context by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true if it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

/// Return the zonedesk config directory (~/.zonedesk).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".zonedesk")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staging() -> Context {
        Context {
            server: "http://localhost:8000/api/".to_string(),
            token: "jwt".to_string(),
            csrf_token: "csrf".to_string(),
            ..Context::new("staging")
        }
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.current_context.is_empty());
        assert!(config.contexts.is_empty());
        assert!(config.require_current().is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut config = ClientConfig::default();
        config.current_context = "staging".to_string();
        config.contexts.push(staging());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("current-context"));
        let back: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.current_context, "staging");
        assert_eq!(back.contexts, vec![staging()]);
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert!(config.contexts.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ClientConfig::default();
        config.upsert_context(staging());
        config.current_context = "staging".to_string();
        config.save(&path).unwrap();

        let back = ClientConfig::load(&path).unwrap();
        assert_eq!(back.require_current().unwrap().token, "jwt");
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut config = ClientConfig::default();
        config.upsert_context(staging());
        config.upsert_context(Context {
            token: "fresh".to_string(),
            ..staging()
        });
        assert_eq!(config.contexts.len(), 1);
        assert_eq!(config.contexts[0].token, "fresh");

        config.current_context = "staging".to_string();
        assert!(config.remove_context("staging"));
        assert!(config.current_context.is_empty());
        assert!(!config.remove_context("staging"));
    }

    #[test]
    fn test_gateway_config() {
        let gw = staging().gateway_config().unwrap();
        assert_eq!(gw.base_url, "http://localhost:8000/api");
        assert_eq!(gw.csrf_token.as_deref(), Some("csrf"));
        assert_eq!(gw.csrf_header, DEFAULT_CSRF_HEADER);

        let custom = Context {
            csrf_header: "X-XSRF-TOKEN".to_string(),
            ..staging()
        };
        assert_eq!(custom.gateway_config().unwrap().csrf_header, "X-XSRF-TOKEN");

        assert!(Context::new("empty").gateway_config().is_err());
    }
}
