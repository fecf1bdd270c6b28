use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::flexible::flexible_list;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_CONFIG_JSON_PATH: &str = "data/config.json";
/// Default prefix list when `COMMAND_START` is unset.
pub const DEFAULT_COMMAND_START: &[&str] = &["/"];

/// Top-level static deployment configuration — loaded once at process start
/// from `bot.toml` plus `BOT_*` / bare-named env var overrides (see the
/// per-field doc comments below for the exact env var name, matching the
/// original naming in §6 of the spec rather than a uniform `BOT_` prefix).
///
/// Distinct from the dynamically-keyed [`ConfigDocument`] (`qqbot-config`),
/// which holds runtime-toggleable plugin state (e.g. the anti-recall
/// enabled flag) and is mutated and persisted at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Command prefixes, e.g. `["/"]`. Env: `COMMAND_START`.
    #[serde(default = "default_command_start", deserialize_with = "flexible_list_opt_string")]
    pub command_start: Vec<String>,

    /// Superuser QQ numbers. Env: `SUPERUSERS`.
    #[serde(default, deserialize_with = "flexible_list_opt_i64")]
    pub superusers: Vec<i64>,

    /// Path to the persistent plugin-keyed JSON config (C1). Env: `NB_CONFIG_JSON_PATH`.
    #[serde(default = "default_config_json_path")]
    pub nb_config_json_path: String,

    #[serde(default)]
    pub anti_recall: AntiRecallConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub onebot: OneBotConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            command_start: default_command_start(),
            superusers: Vec::new(),
            nb_config_json_path: default_config_json_path(),
            anti_recall: AntiRecallConfig::default(),
            agent: AgentConfig::default(),
            onebot: OneBotConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

/// OneBot V11 HTTP action API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneBotConfig {
    #[serde(default = "default_onebot_base_url")]
    pub base_url: String,
    /// Bearer access token, if the gateway requires one.
    pub access_token: Option<String>,
}

impl Default for OneBotConfig {
    fn default() -> Self {
        Self {
            base_url: default_onebot_base_url(),
            access_token: None,
        }
    }
}

/// `ANTI_RECALL__*` settings (C6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AntiRecallConfig {
    /// Env: `ANTI_RECALL__MONITOR_GROUPS`.
    #[serde(default, deserialize_with = "flexible_list_opt_i64")]
    pub monitor_groups: Vec<i64>,
    /// Env: `ANTI_RECALL__TARGET_USER_ID`.
    #[serde(default, deserialize_with = "flexible_list_opt_i64")]
    pub target_user_id: Vec<i64>,
    /// Env: `ANTI_RECALL__ARCHIVE_GROUP_ID`.
    pub archive_group_id: Option<i64>,
}

/// `AGENT__*` settings (C7/C8/C9).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AgentConfig {
    pub n8n_base_url: Option<String>,
    pub n8n_api_key: Option<String>,
    pub n8n_webhook_path: Option<String>,
    /// `"gemini"` is the only provider implemented; unknown names fail
    /// explicitly at first use (see `qqbot-llm::ProviderRouter`).
    pub provider: Option<String>,
    pub gemini_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_config_json_path() -> String {
    DEFAULT_CONFIG_JSON_PATH.to_string()
}
fn default_onebot_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}
fn default_command_start() -> Vec<String> {
    DEFAULT_COMMAND_START.iter().map(|s| s.to_string()).collect()
}

fn flexible_list_opt_i64<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    flexible_list(deserializer)
}

fn flexible_list_opt_string<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    flexible_list(deserializer)
}

impl BotConfig {
    /// Load config from an optional TOML file plus environment overrides.
    ///
    /// Checks, in order: explicit `config_path` argument, then `BOT_CONFIG`
    /// env var, then `./bot.toml` (missing file degrades to defaults, same
    /// as the teacher's `SkynetConfig::load`). Env vars are matched
    /// case-insensitively with `__` splitting into nested keys, so
    /// `ANTI_RECALL__MONITOR_GROUPS` lands on `anti_recall.monitor_groups`
    /// and the flat names from §6 of the spec (`COMMAND_START`,
    /// `SUPERUSERS`, `NB_CONFIG_JSON_PATH`) land directly on their
    /// top-level fields without needing a shared prefix.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("BOT_CONFIG").ok())
            .unwrap_or_else(|| "bot.toml".to_string());

        let config: BotConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::raw().split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = BotConfig::default();
        assert_eq!(cfg.command_start, vec!["/".to_string()]);
        assert_eq!(cfg.gateway.port, DEFAULT_PORT);
        assert!(cfg.superusers.is_empty());
    }
}
