//! The query router: one entry point, two paths.
//!
//! Fast path: a dispatch pattern matched, so the target agent and the
//! exact tool names are known up front. Fallback path: keyword-score
//! the agents and relevance-filter the catalog. Both paths emit a
//! [`RoutePlan`] whose tool subset respects the plan's tool limit, so
//! the prompt assembler downstream can rely on that cap regardless of
//! which path produced the plan.

use agentgate_core::{AgentCatalog, ToolDescriptor};
use agentgate_config::{ConfigError, RoutingConfig};
use serde::Serialize;
use tracing::{debug, info};

use crate::pattern::PatternSet;
use crate::relevance::filter_by_relevance;

/// Execution tuning attached to every route plan.
#[derive(Debug, Clone, Serialize)]
pub struct SpeedConfig {
    /// Maximum think/act/observe iterations
    pub max_iterations: u32,
    /// Sampling temperature (deterministic by default)
    pub temperature: f32,
    /// Per-query execution timeout, seconds
    pub timeout_secs: u64,
    /// Hard cap on tools exposed to the runtime
    pub tool_limit: usize,
    /// Tool descriptions are clamped to this many characters in the
    /// provider request
    pub description_char_limit: usize,
}

const FAST_MAX_ITERATIONS: u32 = 3;
const FAST_TIMEOUT_SECS: u64 = 30;
const DESCRIPTION_CHAR_LIMIT: usize = 100;
const DEFAULT_TOOL_LIMIT: usize = 15;

impl SpeedConfig {
    fn with_tool_limit(tool_limit: usize) -> Self {
        Self {
            max_iterations: FAST_MAX_ITERATIONS,
            temperature: 0.0,
            timeout_secs: FAST_TIMEOUT_SECS,
            tool_limit,
            description_char_limit: DESCRIPTION_CHAR_LIMIT,
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self::with_tool_limit(DEFAULT_TOOL_LIMIT)
    }
}

/// Everything downstream stages need to execute a routed query.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    /// Inferred agents, best first
    pub agents: Vec<String>,
    /// The narrowed tool subset, never longer than `speed.tool_limit`
    pub tools: Vec<ToolDescriptor>,
    /// Execution tuning
    pub speed: SpeedConfig,
    /// The dispatch pattern that fired, if the fast path was taken
    pub pattern_matched: Option<String>,
}

/// Routes queries to agents and tool subsets.
pub struct QueryRouter {
    patterns: PatternSet,
    keywords: Vec<(String, Vec<String>)>,
    relevance_tool_limit: usize,
}

impl QueryRouter {
    pub fn from_config(routing: &RoutingConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            patterns: PatternSet::compile(&routing.patterns)?,
            keywords: routing
                .agent_keywords
                .iter()
                .map(|k| (k.agent.clone(), k.keywords.clone()))
                .collect(),
            relevance_tool_limit: routing.relevance_tool_limit,
        })
    }

    /// Produce a route plan for the query against the full catalog.
    pub fn route(
        &self,
        query: &str,
        descriptors: &[ToolDescriptor],
        available: &AgentCatalog,
    ) -> RoutePlan {
        if let Some(rule) = self.patterns.first_match(query) {
            let agents = if available.contains(&rule.agent) {
                vec![rule.agent.clone()]
            } else {
                available.first().map(|a| vec![a.name.clone()]).unwrap_or_default()
            };

            let mut tools = filter_by_names(descriptors, &rule.tools);
            tools.truncate(rule.max_tools);

            info!(
                pattern = %rule.pattern,
                agent = %rule.agent,
                tools = tools.len(),
                "Fast path: dispatch pattern matched"
            );

            return RoutePlan {
                agents,
                tools,
                speed: SpeedConfig::with_tool_limit(rule.max_tools),
                pattern_matched: Some(rule.pattern.clone()),
            };
        }

        let agents = self.score_agents(query, available);
        let mut tools = filter_by_relevance(descriptors, query, self.relevance_tool_limit);
        tools.truncate(self.relevance_tool_limit);

        debug!(
            agents = agents.len(),
            tools = tools.len(),
            "Fallback path: keyword scoring"
        );

        RoutePlan {
            agents,
            tools,
            speed: SpeedConfig::with_tool_limit(self.relevance_tool_limit),
            pattern_matched: None,
        }
    }

    /// Keyword-score every available agent and keep the top two with a
    /// nonzero score. When nothing scores, degrade to the first
    /// configured agent so a query never routes nowhere.
    fn score_agents(&self, query: &str, available: &AgentCatalog) -> Vec<String> {
        let query_lower = query.to_lowercase();

        let mut scored: Vec<(u32, &str)> = available
            .all()
            .iter()
            .map(|agent| {
                let score = self
                    .keywords
                    .iter()
                    .find(|(name, _)| name == &agent.name)
                    .map(|(_, words)| {
                        words.iter().filter(|w| query_lower.contains(w.as_str())).count() as u32
                    })
                    .unwrap_or(0);
                (score, agent.name.as_str())
            })
            .collect();

        scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

        let top: Vec<String> = scored
            .iter()
            .take(2)
            .filter(|(score, _)| *score > 0)
            .map(|(_, name)| name.to_string())
            .collect();

        if top.is_empty() {
            available.first().map(|a| vec![a.name.clone()]).unwrap_or_default()
        } else {
            top
        }
    }
}

/// Narrow descriptors to those matching the named tools. Matching is
/// deliberately loose: a target matches when it is a substring of the
/// tool name, or when any underscore-separated word of the target
/// appears in the name. Catalog order is preserved.
fn filter_by_names(descriptors: &[ToolDescriptor], targets: &[String]) -> Vec<ToolDescriptor> {
    descriptors
        .iter()
        .filter(|d| {
            targets.iter().any(|target| {
                d.name.contains(target.as_str())
                    || target.split('_').any(|word| d.name.contains(word))
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, description: &str) -> ToolDescriptor {
        ToolDescriptor {
            name: name.into(),
            description: description.into(),
        }
    }

    fn router() -> QueryRouter {
        QueryRouter::from_config(&RoutingConfig::default()).unwrap()
    }

    fn catalog() -> AgentCatalog {
        RoutingConfig::default().agent_catalog()
    }

    fn github_descriptors() -> Vec<ToolDescriptor> {
        vec![
            descriptor("list_dependabot_alerts", "List Dependabot alerts for a repository"),
            descriptor("get_dependabot_alert", "Get a single Dependabot alert"),
            descriptor("list_pull_requests", "List pull requests"),
            descriptor("render_chart", "Render a chart image"),
            descriptor("pdf_extract_text", "Extract text from a PDF"),
        ]
    }

    #[test]
    fn dependabot_query_takes_fast_path() {
        let plan = router().route(
            "List open Dependabot alerts for my repo",
            &github_descriptors(),
            &catalog(),
        );
        assert_eq!(plan.agents, ["github_security_agent"]);
        assert!(plan.pattern_matched.is_some());
        assert!(plan.tools.iter().any(|t| t.name == "list_dependabot_alerts"));
        assert_eq!(plan.speed.tool_limit, 5);
        assert_eq!(plan.speed.max_iterations, 3);
        assert!(plan.speed.temperature.abs() < f32::EPSILON);
    }

    #[test]
    fn fast_path_respects_tool_limit() {
        // "alert" matches loosely against many descriptors; the plan
        // must still honor the rule's max_tools.
        let descriptors: Vec<ToolDescriptor> = (0..12)
            .map(|i| descriptor(&format!("list_dependabot_alerts_{i}"), "alerts"))
            .collect();
        let plan = router().route("dependabot status", &descriptors, &catalog());
        assert!(plan.tools.len() <= plan.speed.tool_limit);
    }

    #[test]
    fn unavailable_pattern_agent_degrades_to_first() {
        let mut routing = RoutingConfig::default();
        routing.agents.retain(|a| a.name != "github_security_agent");
        let router = QueryRouter::from_config(&routing).unwrap();
        let catalog = routing.agent_catalog();

        let plan = router.route("dependabot alerts", &github_descriptors(), &catalog);
        assert_eq!(plan.agents, [catalog.first().unwrap().name.clone()]);
    }

    #[test]
    fn unmatched_query_takes_fallback_path() {
        let plan = router().route(
            "summarize the contents of this document",
            &github_descriptors(),
            &catalog(),
        );
        assert!(plan.pattern_matched.is_none());
        assert_eq!(plan.speed.tool_limit, 15);
    }

    #[test]
    fn fallback_scores_agents_by_keywords() {
        // "github" and "commit" are github_agent keywords and no
        // dispatch pattern matches this phrasing.
        let plan = router().route(
            "show recent github commit activity",
            &github_descriptors(),
            &catalog(),
        );
        assert!(plan.pattern_matched.is_none());
        assert_eq!(plan.agents[0], "github_agent");
    }

    #[test]
    fn fallback_with_no_keyword_hits_uses_first_agent() {
        let plan = router().route(
            "what is the meaning of life",
            &github_descriptors(),
            &catalog(),
        );
        assert_eq!(plan.agents, [catalog().first().unwrap().name.clone()]);
    }

    #[test]
    fn name_filter_matches_partially() {
        let descriptors = vec![
            descriptor("github_list_dependabot_alerts", ""),
            descriptor("render_chart", ""),
        ];
        let filtered = filter_by_names(&descriptors, &["list_dependabot_alerts".into()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "github_list_dependabot_alerts");
    }

    #[test]
    fn empty_catalog_routes_to_no_agents() {
        let empty = AgentCatalog::new(vec![]);
        let plan = router().route("anything at all", &[], &empty);
        assert!(plan.agents.is_empty());
        assert!(plan.tools.is_empty());
    }
}
