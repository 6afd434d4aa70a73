//! Ordered, case-insensitive dispatch patterns.
//!
//! Rules come from `[[routing.patterns]]` and are evaluated top to
//! bottom against the raw query; the first match wins even when a
//! later rule would also match. Rule order is therefore part of the
//! routing contract, not an implementation detail.

use agentgate_config::{ConfigError, PatternRule};
use regex_lite::Regex;

/// A compiled dispatch rule.
pub struct CompiledRule {
    regex: Regex,
    /// The raw pattern text, for logging
    pub pattern: String,
    /// Agent this rule dispatches to
    pub agent: String,
    /// Named tools the rule narrows the catalog to
    pub tools: Vec<String>,
    /// Tool limit for this rule
    pub max_tools: usize,
}

/// The ordered set of compiled dispatch rules.
pub struct PatternSet {
    rules: Vec<CompiledRule>,
}

impl PatternSet {
    /// Compile the configured rules. Patterns are anchored nowhere and
    /// matched case-insensitively.
    pub fn compile(rules: &[PatternRule]) -> Result<Self, ConfigError> {
        let compiled = rules
            .iter()
            .map(|r| {
                let regex = Regex::new(&format!("(?i){}", r.pattern)).map_err(|e| {
                    ConfigError::ValidationError(format!(
                        "pattern '{}' does not compile: {e}",
                        r.pattern
                    ))
                })?;
                Ok(CompiledRule {
                    regex,
                    pattern: r.pattern.clone(),
                    agent: r.agent.clone(),
                    tools: r.tools.clone(),
                    max_tools: r.max_tools,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules: compiled })
    }

    /// The first rule whose pattern matches the query, if any.
    pub fn first_match(&self, query: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.regex.is_match(query))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
