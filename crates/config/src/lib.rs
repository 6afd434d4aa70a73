//! Configuration loading, validation, and management for Agentgate.
//!
//! Loads configuration from `agentgate.toml` with environment variable
//! overrides. Validates all settings at startup: a routing table that
//! references an unknown agent or an uncompilable dispatch pattern is
//! a fatal startup error, never a runtime surprise.

use agentgate_core::{AgentCatalog, AgentDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `agentgate.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM provider settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Gateway (HTTP server) settings
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Routing tables: agents, categories, dispatch patterns
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Circuit breaker thresholds
    #[serde(default)]
    pub breaker: BreakerSettings,

    /// Rate-limit retry settings
    #[serde(default)]
    pub retry: RetrySettings,

    /// Remote tool endpoints registered at startup
    #[serde(default)]
    pub tools: Vec<ToolEndpoint>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("gateway", &self.gateway)
            .field("routing", &self.routing)
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .field("tools", &self.tools)
            .finish()
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider name, for logging
    #[serde(default = "default_provider_name")]
    pub name: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key (env vars override this)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openai".into()
}
fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            api_url: default_api_url(),
            api_key: None,
            default_model: default_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("default_model", &self.default_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8642
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// A selectable agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Selection priority; lower wins inside a category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// A named family of mutually overlapping agents. At most one agent per
/// category survives selection. Order matters: an agent listed in two
/// categories partitions into the first one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub members: Vec<String>,
}

/// A query dispatch rule. Patterns are matched case-insensitively, in
/// order; the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regex matched against the raw query
    pub pattern: String,

    /// Agent to dispatch to
    pub agent: String,

    /// Named tools to narrow the catalog to
    pub tools: Vec<String>,

    /// Tool limit for this rule
    #[serde(default = "default_pattern_max_tools")]
    pub max_tools: usize,
}

fn default_pattern_max_tools() -> usize {
    5
}

/// Advisory: for a known task shape, a single agent is usually better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecommendation {
    pub task: String,
    pub agent: String,
}

/// Keywords used to score an agent against a free-form query when no
/// dispatch pattern matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub agent: String,
    pub keywords: Vec<String>,
}

/// Routing tables. The defaults describe the standard agent fleet; a
/// deployment overrides them wholesale in `agentgate.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentEntry>,

    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryEntry>,

    #[serde(default = "default_patterns")]
    pub patterns: Vec<PatternRule>,

    #[serde(default = "default_task_recommendations")]
    pub task_recommendations: Vec<TaskRecommendation>,

    #[serde(default = "default_good_combinations")]
    pub good_combinations: Vec<Vec<String>>,

    #[serde(default = "default_bad_combinations")]
    pub bad_combinations: Vec<Vec<String>>,

    #[serde(default = "default_agent_keywords")]
    pub agent_keywords: Vec<KeywordEntry>,

    /// Hard cap on agents per query
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Tool cap on the relevance-filtered fallback path
    #[serde(default = "default_relevance_tool_limit")]
    pub relevance_tool_limit: usize,
}

fn default_max_agents() -> usize {
    3
}
fn default_relevance_tool_limit() -> usize {
    15
}

fn agent(name: &str, description: &str, priority: u32) -> AgentEntry {
    AgentEntry {
        name: name.into(),
        description: description.into(),
        priority: Some(priority),
    }
}

fn default_agents() -> Vec<AgentEntry> {
    vec![
        agent("github_security_agent", "Combined GitHub and security operations", 1),
        agent("github_agent", "GitHub repositories, issues, and pull requests", 2),
        agent("chart_agent", "Chart and graph rendering", 1),
        agent("pdf_agent", "PDF document analysis", 1),
        agent("security_agent", "Web security analysis", 2),
        agent("snyk_scanner_agent", "Standalone Snyk vulnerability scanning", 3),
        agent("scraper_agent", "Web scraping", 1),
        agent("azure_agent", "Azure resource management", 1),
        agent("sample_agent", "Sample and demo operations", 3),
    ]
}

fn category(name: &str, members: &[&str]) -> CategoryEntry {
    CategoryEntry {
        name: name.into(),
        members: members.iter().map(|s| s.to_string()).collect(),
    }
}

fn default_categories() -> Vec<CategoryEntry> {
    vec![
        category("github", &["github_agent", "github_security_agent"]),
        category("security", &["security_agent", "snyk_scanner_agent", "github_security_agent"]),
        category("chart", &["chart_agent"]),
        category("pdf", &["pdf_agent"]),
        category("scraper", &["scraper_agent"]),
        category("azure", &["azure_agent"]),
        category("sample", &["sample_agent"]),
    ]
}

fn rule(pattern: &str, agent: &str, tools: &[&str], max_tools: usize) -> PatternRule {
    PatternRule {
        pattern: pattern.into(),
        agent: agent.into(),
        tools: tools.iter().map(|s| s.to_string()).collect(),
        max_tools,
    }
}

fn default_patterns() -> Vec<PatternRule> {
    vec![
        // GitHub security
        rule(
            r"dependabot|vulnerable|vulnerability|alert",
            "github_security_agent",
            &["list_dependabot_alerts", "get_dependabot_alert"],
            5,
        ),
        rule(
            r"codeql|code scan|security scan|alert",
            "github_security_agent",
            &["list_code_scanning_alerts", "get_code_scanning_alert"],
            5,
        ),
        rule(
            r"secret|leaked|credential",
            "github_security_agent",
            &["list_secret_scanning_alerts", "get_secret_scanning_alert"],
            5,
        ),
        // GitHub general
        rule(
            r"pull request|pr|merge",
            "github_agent",
            &["list_pull_requests", "get_pull_request", "create_pull_request"],
            8,
        ),
        rule(
            r"issue|bug|feature",
            "github_agent",
            &["list_issues", "get_issue", "create_issue"],
            8,
        ),
        rule(
            r"repository|repo|fork|clone",
            "github_agent",
            &["get_repository", "list_repositories", "create_repository"],
            10,
        ),
        // Snyk
        rule(
            r"snyk|scan|security scan",
            "snyk_scanner_agent",
            &["snyk_scan_github_repo", "snyk_scan_docker_image"],
            3,
        ),
        // Charts
        rule(
            r"chart|graph|visual|plot|dashboard",
            "chart_agent",
            &["create_chart", "render_chart"],
            3,
        ),
    ]
}

fn default_task_recommendations() -> Vec<TaskRecommendation> {
    [
        ("github_security", "github_security_agent"),
        ("dependabot", "github_security_agent"),
        ("codeql", "github_security_agent"),
        ("github_issues", "github_agent"),
        ("github_prs", "github_agent"),
        ("charts_only", "chart_agent"),
        ("pdf_analysis", "pdf_agent"),
        ("web_security", "security_agent"),
    ]
    .iter()
    .map(|(task, agent)| TaskRecommendation {
        task: task.to_string(),
        agent: agent.to_string(),
    })
    .collect()
}

fn combos(pairs: &[&[&str]]) -> Vec<Vec<String>> {
    pairs
        .iter()
        .map(|combo| combo.iter().map(|s| s.to_string()).collect())
        .collect()
}

fn default_good_combinations() -> Vec<Vec<String>> {
    combos(&[
        &["github_agent", "chart_agent"],
        &["github_security_agent", "chart_agent"],
        &["pdf_agent", "chart_agent"],
        &["scraper_agent", "chart_agent"],
        &["github_agent", "pdf_agent"],
        &["security_agent", "pdf_agent"],
    ])
}

fn default_bad_combinations() -> Vec<Vec<String>> {
    combos(&[
        &["github_agent", "github_security_agent"],
        &["security_agent", "snyk_scanner_agent"],
        &["security_agent", "github_security_agent"],
    ])
}

fn keywords(agent: &str, words: &[&str]) -> KeywordEntry {
    KeywordEntry {
        agent: agent.into(),
        keywords: words.iter().map(|s| s.to_string()).collect(),
    }
}

fn default_agent_keywords() -> Vec<KeywordEntry> {
    vec![
        keywords(
            "github_security_agent",
            &["security", "vulnerability", "alert", "dependabot", "codeql", "secret"],
        ),
        keywords(
            "github_agent",
            &["github", "repository", "pull", "issue", "commit"],
        ),
        keywords("snyk_scanner_agent", &["snyk", "scan", "vulnerability"]),
        keywords("chart_agent", &["chart", "graph", "visual", "plot"]),
    ]
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            agents: default_agents(),
            categories: default_categories(),
            patterns: default_patterns(),
            task_recommendations: default_task_recommendations(),
            good_combinations: default_good_combinations(),
            bad_combinations: default_bad_combinations(),
            agent_keywords: default_agent_keywords(),
            max_agents: default_max_agents(),
            relevance_tool_limit: default_relevance_tool_limit(),
        }
    }
}

impl RoutingConfig {
    /// Build the agent catalog from the configured entries.
    pub fn agent_catalog(&self) -> AgentCatalog {
        AgentCatalog::new(
            self.agents
                .iter()
                .map(|a| AgentDescriptor {
                    name: a.name.clone(),
                    description: a.description.clone(),
                    priority: a.priority,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Failures before the breaker opens
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds before an open breaker allows a half-open probe
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout_secs: u64,

    /// Consecutive half-open successes needed to close
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Maximum execution time for a guarded call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

fn default_failure_threshold() -> u32 {
    5
}
fn default_recovery_timeout() -> u64 {
    30
}
fn default_success_threshold() -> u32 {
    2
}
fn default_call_timeout() -> u64 {
    60
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout(),
            success_threshold: default_success_threshold(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt (rate-limit errors only)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff, milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Minimum spacing between outbound calls, milliseconds
    #[serde(default = "default_min_spacing_ms")]
    pub min_spacing_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_min_spacing_ms() -> u64 {
    500
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            min_spacing_ms: default_min_spacing_ms(),
        }
    }
}

/// A remote tool endpoint registered into the catalog at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEndpoint {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// URL the tool client POSTs invocation arguments to
    pub endpoint: String,
}

impl AppConfig {
    /// Load configuration from the default path (`./agentgate.toml`).
    ///
    /// Also checks environment variables:
    /// - `AGENTGATE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `AGENTGATE_MODEL` overrides the default model
    /// - `AGENTGATE_API_URL` overrides the provider URL
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new("agentgate.toml"))?;

        if config.provider.api_key.is_none() {
            config.provider.api_key = std::env::var("AGENTGATE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("AGENTGATE_MODEL") {
            config.provider.default_model = model;
        }

        if let Ok(url) = std::env::var("AGENTGATE_API_URL") {
            config.provider.api_url = url;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration. Routing tables that reference unknown
    /// agents and dispatch patterns that fail to compile are fatal here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.routing.max_agents == 0 {
            return Err(ConfigError::ValidationError(
                "routing.max_agents must be at least 1".into(),
            ));
        }

        if self.breaker.failure_threshold == 0 || self.breaker.success_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "breaker thresholds must be at least 1".into(),
            ));
        }

        let known: HashSet<&str> = self.routing.agents.iter().map(|a| a.name.as_str()).collect();

        let check = |name: &str, place: &str| -> Result<(), ConfigError> {
            if known.contains(name) {
                Ok(())
            } else {
                Err(ConfigError::ValidationError(format!(
                    "{place} references unknown agent '{name}'"
                )))
            }
        };

        for cat in &self.routing.categories {
            for member in &cat.members {
                check(member, &format!("category '{}'", cat.name))?;
            }
        }

        for rule in &self.routing.patterns {
            check(&rule.agent, &format!("pattern '{}'", rule.pattern))?;
            regex_lite::Regex::new(&format!("(?i){}", rule.pattern)).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "pattern '{}' does not compile: {e}",
                    rule.pattern
                ))
            })?;
            if rule.max_tools == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "pattern '{}' has max_tools = 0",
                    rule.pattern
                )));
            }
        }

        for rec in &self.routing.task_recommendations {
            check(&rec.agent, &format!("task recommendation '{}'", rec.task))?;
        }

        for combo in self
            .routing
            .good_combinations
            .iter()
            .chain(self.routing.bad_combinations.iter())
        {
            for name in combo {
                check(name, "agent combination")?;
            }
        }

        for entry in &self.routing.agent_keywords {
            check(&entry.agent, "agent_keywords")?;
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            gateway: GatewaySettings::default(),
            routing: RoutingConfig::default(),
            breaker: BreakerSettings::default(),
            retry: RetrySettings::default(),
            tools: vec![],
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.max_agents, 3);
        assert_eq!(config.routing.agents.len(), 9);
        assert_eq!(config.routing.patterns.len(), 8);
        assert_eq!(config.breaker.failure_threshold, 5);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.routing.agents.len(), config.routing.agents.len());
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn pattern_referencing_unknown_agent_rejected() {
        let mut config = AppConfig::default();
        config.routing.patterns.push(PatternRule {
            pattern: "weather".into(),
            agent: "weather_agent".into(),
            tools: vec!["get_forecast".into()],
            max_tools: 3,
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weather_agent"));
    }

    #[test]
    fn uncompilable_pattern_rejected() {
        let mut config = AppConfig::default();
        config.routing.patterns.push(PatternRule {
            pattern: "(unclosed".into(),
            agent: "github_agent".into(),
            tools: vec![],
            max_tools: 3,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn category_member_must_exist() {
        let mut config = AppConfig::default();
        config.routing.categories.push(CategoryEntry {
            name: "ml".into(),
            members: vec!["ml_agent".into()],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_agents_rejected() {
        let mut config = AppConfig::default();
        config.routing.max_agents = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentgate.toml");
        std::fs::write(&path, "[gateway]\nport = 9000\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.gateway.port, 9000);
        // Unspecified sections fall back to defaults.
        assert_eq!(config.provider.name, "openai");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentgate.toml");
        std::fs::write(&path, "[gateway\nport = ").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/agentgate.toml"));
        assert!(result.is_ok());
        let config = result.unwrap();
        assert_eq!(config.provider.name, "openai");
    }

    #[test]
    fn agent_catalog_carries_priorities() {
        let catalog = AppConfig::default().routing.agent_catalog();
        assert_eq!(catalog.priority_of("github_security_agent"), 1);
        assert_eq!(catalog.priority_of("snyk_scanner_agent"), 3);
        assert_eq!(catalog.priority_of("unknown_agent"), 99);
    }

    #[test]
    fn routing_tables_parse_from_toml() {
        let toml_str = r#"
[routing]
task_recommendations = []
good_combinations = []
bad_combinations = []
agent_keywords = []

[[routing.agents]]
name = "alpha_agent"
priority = 1

[[routing.agents]]
name = "beta_agent"

[[routing.categories]]
name = "greek"
members = ["alpha_agent", "beta_agent"]

[[routing.patterns]]
pattern = "alpha"
agent = "alpha_agent"
tools = ["alpha_tool"]
max_tools = 2
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.routing.agents.len(), 2);
        assert_eq!(config.routing.categories[0].members.len(), 2);
        assert_eq!(config.routing.patterns[0].max_tools, 2);
        assert!(config.routing.agents[1].priority.is_none());
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("github_security_agent"));
        assert!(toml_str.contains("8642"));
    }
}
