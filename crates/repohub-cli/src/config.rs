use std::path::PathBuf;
use std::time::Duration;

use repohub::{Identity, SiblingOrder, TreeBuilder};
use repohub_http::{CanisterClientConfig, RetryPolicy};
use serde::{Deserialize, Serialize};

pub const TOKEN_VAR: &str = "REPOHUB_TOKEN";
pub const PRINCIPAL_VAR: &str = "REPOHUB_PRINCIPAL";
pub const URL_VAR: &str = "REPOHUB_URL";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendSection,
    pub retry: RetrySection,
    pub tree: TreeSection,
    pub fallback: FallbackSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendSection {
    /// Gateway root of the repository canister.
    pub url: String,
    /// Per-request timeout. `0` disables it.
    pub timeout_secs: u64,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:4943".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySection {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 250,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TreeSection {
    pub placeholder: String,
    pub folders_first: bool,
}

impl Default for TreeSection {
    fn default() -> Self {
        Self {
            placeholder: repohub::path::DEFAULT_PLACEHOLDER.into(),
            folders_first: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FallbackSection {
    pub enabled: bool,
}

impl Default for FallbackSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Apply environment overrides. `lookup` is `std::env::var` in practice.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_VAR)
            && !url.trim().is_empty()
        {
            self.backend.url = url.trim().to_owned();
        }
    }

    pub fn client_config(&self) -> CanisterClientConfig {
        let mut config = CanisterClientConfig::new(&self.backend.url);
        config.timeout = match self.backend.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        config.retry = RetryPolicy {
            max_attempts: self.retry.attempts,
            base_delay: Duration::from_millis(self.retry.delay_ms),
        };
        config
    }

    /// Tree builder for this configuration. `folders_first` on the command
    /// line wins over the file setting.
    pub fn tree_builder(&self, folders_first: bool) -> TreeBuilder {
        let order = if folders_first || self.tree.folders_first {
            SiblingOrder::FoldersFirst
        } else {
            SiblingOrder::Insertion
        };
        TreeBuilder::new()
            .placeholder(self.tree.placeholder.clone())
            .order(order)
    }
}

/// Identity from the environment. A missing token means anonymous.
pub fn identity_from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<Identity> {
    let token = lookup(TOKEN_VAR)?;
    let principal = lookup(PRINCIPAL_VAR).unwrap_or_default();
    Some(Identity::new(principal, token))
}

/// Config file path: `~/.config/repohub/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("repohub").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(
                path = %path.display(),
                "failed to parse config, using defaults: {e}"
            ),
        }
    }

    AppConfig::default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use repohub::{FileRecord, TreeNode};

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.tree.placeholder, ".keep");
        assert!(config.fallback.enabled);
    }

    #[test]
    fn parse_all_sections() {
        let toml_str = r#"
[backend]
url = "https://gateway.example/canister/abcde"
timeout_secs = 5

[retry]
attempts = 5
delay_ms = 100

[tree]
placeholder = ".gitkeep"
folders_first = true

[fallback]
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.url, "https://gateway.example/canister/abcde");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay_ms, 100);
        assert_eq!(config.tree.placeholder, ".gitkeep");
        assert!(config.tree.folders_first);
        assert!(!config.fallback.enabled);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml_str = r#"
[backend]
timeout_secs = 0
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.url, "http://127.0.0.1:4943");
        assert_eq!(config.client_config().timeout, None);
    }

    #[test]
    fn client_config_maps_retry_settings() {
        let mut config = AppConfig::default();
        config.retry.attempts = 4;
        config.retry.delay_ms = 10;

        let client = config.client_config();
        assert_eq!(client.retry.max_attempts, 4);
        assert_eq!(client.retry.base_delay, Duration::from_millis(10));
        assert_eq!(client.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn env_overrides_url() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[(URL_VAR, "http://localhost:8000")]));
        assert_eq!(config.backend.url, "http://localhost:8000");

        config.apply_env(env(&[(URL_VAR, "  ")]));
        assert_eq!(config.backend.url, "http://localhost:8000");
    }

    #[test]
    fn identity_requires_token() {
        assert_eq!(identity_from_env(env(&[(PRINCIPAL_VAR, "abc")])), None);

        let identity = identity_from_env(env(&[(TOKEN_VAR, "t"), (PRINCIPAL_VAR, "abc")])).unwrap();
        assert_eq!(identity.principal, "abc");
        assert_eq!(identity.token, "t");
    }

    #[test]
    fn tree_builder_honours_placeholder_and_order() {
        let mut config = AppConfig::default();
        config.tree.placeholder = ".gitkeep".into();

        let records = vec![
            FileRecord::file("b.txt", 1, 0),
            FileRecord::file("a/.gitkeep", 0, 0),
        ];

        let tree = config.tree_builder(true).synthesized_at(0).build(&records);
        let names: Vec<&str> = tree.iter().map(TreeNode::name).collect();
        assert_eq!(names, vec!["a", "b.txt"]);

        let tree = config.tree_builder(false).synthesized_at(0).build(&records);
        let names: Vec<&str> = tree.iter().map(TreeNode::name).collect();
        assert_eq!(names, vec!["b.txt", "a"]);
    }
}
