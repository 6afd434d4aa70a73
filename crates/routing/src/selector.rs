//! Agent selection and conflict resolution.
//!
//! Callers may request any set of agents; the selector reduces that to
//! a non-conflicting set of at most `max_agents`, keeping the best
//! agent per category by priority, and explains itself through
//! warnings (what was removed and why) and recommendations (what a
//! better request would look like). Warnings never block execution.

use agentgate_core::AgentCatalog;
use agentgate_config::RoutingConfig;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// The outcome of agent selection.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    /// The surviving agents, conflict-free and capped
    pub agents: Vec<String>,
    /// What was removed or limited, and why
    pub warnings: Vec<String>,
    /// Advisory suggestions for a better request
    pub recommendations: Vec<String>,
    pub original_count: usize,
    pub optimized_count: usize,
}

/// Resolves conflicting agent requests against the configured
/// categories, priorities, and combination tables.
pub struct AgentSelector {
    categories: Vec<(String, Vec<String>)>,
    task_recommendations: Vec<(String, String)>,
    good_combinations: Vec<Vec<String>>,
    bad_combinations: Vec<Vec<String>>,
    max_agents: usize,
}

impl AgentSelector {
    pub fn from_config(routing: &RoutingConfig) -> Self {
        Self {
            categories: routing
                .categories
                .iter()
                .map(|c| (c.name.clone(), c.members.clone()))
                .collect(),
            task_recommendations: routing
                .task_recommendations
                .iter()
                .map(|r| (r.task.clone(), r.agent.clone()))
                .collect(),
            good_combinations: routing.good_combinations.clone(),
            bad_combinations: routing.bad_combinations.clone(),
            max_agents: routing.max_agents,
        }
    }

    /// Reduce a requested agent list to a conflict-free selection.
    pub fn optimize(&self, requested: &[String], available: &AgentCatalog) -> SelectionResult {
        let mut warnings = Vec::new();
        let mut recommendations = Vec::new();

        // Drop agents that don't exist, preserving request order.
        let (valid, invalid): (Vec<String>, Vec<String>) = requested
            .iter()
            .cloned()
            .partition(|a| available.contains(a));

        if !invalid.is_empty() {
            warnings.push(format!("Unavailable agents removed: {}", invalid.join(", ")));
        }

        if valid.len() > self.max_agents {
            warnings.push(format!(
                "Too many agents requested ({}), limiting to {}",
                valid.len(),
                self.max_agents
            ));
        }

        warnings.extend(
            self.detect_conflicts(&valid)
                .into_iter()
                .map(|c| format!("Conflicting agents detected: {c}")),
        );

        let optimized = self.resolve_conflicts(&valid, available);

        if optimized.len() < valid.len() {
            let kept: HashSet<&str> = optimized.iter().map(|s| s.as_str()).collect();
            let removed: Vec<&str> = valid
                .iter()
                .map(|s| s.as_str())
                .filter(|a| !kept.contains(a))
                .collect();
            recommendations.push(format!("Removed conflicting agents: {}", removed.join(", ")));
        }

        recommendations.extend(self.suggest_improvements(&optimized, available));

        debug!(
            requested = requested.len(),
            selected = optimized.len(),
            "Agent selection complete"
        );

        SelectionResult {
            original_count: requested.len(),
            optimized_count: optimized.len(),
            agents: optimized,
            warnings,
            recommendations,
        }
    }

    /// Conflicts: two agents in the same category, or a known bad pair.
    fn detect_conflicts(&self, agents: &[String]) -> Vec<String> {
        let mut conflicts = Vec::new();

        let mut category_holder: Vec<(&str, &str)> = Vec::new();
        for agent in agents {
            for (category, members) in &self.categories {
                if members.contains(agent) {
                    match category_holder.iter().find(|(c, _)| c == category) {
                        Some((_, first)) => {
                            conflicts.push(format!("{category}: {first} vs {agent}"));
                        }
                        None => category_holder.push((category, agent)),
                    }
                }
            }
        }

        let agent_set: HashSet<&str> = agents.iter().map(|s| s.as_str()).collect();
        for combo in &self.bad_combinations {
            if combo.iter().all(|a| agent_set.contains(a.as_str())) {
                conflicts.push(format!("Bad combination: {}", combo.join(" + ")));
            }
        }

        conflicts
    }

    /// Keep the best agent per category (lowest priority number, ties go
    /// to the earlier request), pass uncategorized agents through, and
    /// cap the total with a stable priority sort.
    fn resolve_conflicts(&self, agents: &[String], available: &AgentCatalog) -> Vec<String> {
        // Partition into categories; an agent in several categories
        // lands in the first one configured.
        let mut grouped: Vec<(&str, Vec<&String>)> = Vec::new();
        let mut uncategorized: Vec<&String> = Vec::new();

        'agents: for agent in agents {
            for (category, members) in &self.categories {
                if members.contains(agent) {
                    match grouped.iter_mut().find(|(c, _)| *c == category.as_str()) {
                        Some((_, bucket)) => bucket.push(agent),
                        None => grouped.push((category, vec![agent])),
                    }
                    continue 'agents;
                }
            }
            uncategorized.push(agent);
        }

        let mut optimized: Vec<String> = grouped
            .iter()
            .filter_map(|(_, bucket)| {
                bucket
                    .iter()
                    .min_by_key(|a| available.priority_of(a))
                    .map(|a| (*a).clone())
            })
            .collect();

        optimized.extend(uncategorized.into_iter().cloned());

        if optimized.len() > self.max_agents {
            optimized.sort_by_key(|a| available.priority_of(a));
            optimized.truncate(self.max_agents);
        }

        optimized
    }

    fn suggest_improvements(&self, current: &[String], available: &AgentCatalog) -> Vec<String> {
        let mut suggestions = Vec::new();
        let current_set: HashSet<&str> = current.iter().map(|s| s.as_str()).collect();

        if current.len() > 1 {
            for (task, recommended) in &self.task_recommendations {
                if available.contains(recommended)
                    && current_set.contains(recommended.as_str())
                    && current.len() > 1
                {
                    suggestions.push(format!(
                        "For {task} tasks, consider using only '{recommended}' (currently using {} agents)",
                        current.len()
                    ));
                }
            }
        }

        for combo in &self.good_combinations {
            if combo.len() <= current.len()
                && combo.iter().all(|a| available.contains(a))
                && !combo.iter().any(|a| current_set.contains(a.as_str()))
            {
                suggestions.push(format!("Consider trying: {}", combo.join(" + ")));
            }
        }

        if current_set.contains("github_agent")
            && current_set.contains("security_agent")
            && available.contains("github_security_agent")
        {
            suggestions.push(
                "Consider using 'github_security_agent' instead of separate GitHub and security agents"
                    .into(),
            );
        }

        if current.len() > 2 {
            suggestions.push("For faster responses, try using fewer agents".into());
        }

        if current_set.contains("chart_agent") {
            suggestions
                .push("Chart agent may timeout - ensure chart server is running properly".into());
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentgate_config::RoutingConfig;

    fn selector() -> AgentSelector {
        AgentSelector::from_config(&RoutingConfig::default())
    }

    fn catalog() -> AgentCatalog {
        RoutingConfig::default().agent_catalog()
    }

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn same_category_conflict_keeps_higher_priority() {
        let result = selector().optimize(
            &names(&["github_agent", "github_security_agent"]),
            &catalog(),
        );
        // github_security_agent has priority 1, github_agent 2.
        assert_eq!(result.agents, ["github_security_agent"]);
        assert!(result.warnings.iter().any(|w| w.contains("Conflicting agents")));
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("Removed conflicting agents: github_agent")));
    }

    #[test]
    fn security_category_resolves_by_priority() {
        // security_agent (priority 2) beats snyk_scanner_agent (3)
        // inside the security category, regardless of request order.
        let result = selector().optimize(
            &names(&["snyk_scanner_agent", "security_agent"]),
            &catalog(),
        );
        assert_eq!(result.agents, ["security_agent"]);
    }

    #[test]
    fn unavailable_agents_removed_with_warning() {
        let result = selector().optimize(&names(&["ghost_agent", "chart_agent"]), &catalog());
        assert_eq!(result.agents, ["chart_agent"]);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Unavailable agents removed: ghost_agent")));
        assert_eq!(result.original_count, 2);
        assert_eq!(result.optimized_count, 1);
    }

    #[test]
    fn over_cap_selection_is_limited_by_priority() {
        let result = selector().optimize(
            &names(&["chart_agent", "pdf_agent", "scraper_agent", "azure_agent"]),
            &catalog(),
        );
        assert_eq!(result.agents.len(), 3);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Too many agents requested (4), limiting to 3")));
    }

    #[test]
    fn bad_combination_flagged() {
        let result = selector().optimize(
            &names(&["security_agent", "snyk_scanner_agent"]),
            &catalog(),
        );
        assert!(result.warnings.iter().any(|w| {
            w.contains("Bad combination: security_agent + snyk_scanner_agent")
        }));
    }

    #[test]
    fn empty_request_yields_empty_selection() {
        let result = selector().optimize(&[], &catalog());
        assert!(result.agents.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.original_count, 0);
    }

    #[test]
    fn github_plus_security_suggests_combined_agent() {
        let result = selector().optimize(&names(&["github_agent", "security_agent"]), &catalog());
        assert!(result
            .recommendations
            .iter()
            .any(|r| r.contains("github_security_agent")));
    }

    #[test]
    fn chart_agent_timeout_note() {
        let result = selector().optimize(&names(&["chart_agent"]), &catalog());
        assert!(result.recommendations.iter().any(|r| r.contains("timeout")));
    }

    #[test]
    fn uncategorized_agent_passes_through() {
        // An agent present in the catalog but not in any category must
        // survive selection untouched.
        let mut routing = RoutingConfig::default();
        routing.agents.push(agentgate_config::AgentEntry {
            name: "weather_agent".into(),
            description: String::new(),
            priority: None,
        });
        let selector = AgentSelector::from_config(&routing);
        let catalog = routing.agent_catalog();

        let result = selector.optimize(&names(&["weather_agent", "chart_agent"]), &catalog);
        assert!(result.agents.contains(&"weather_agent".to_string()));
        assert!(result.agents.contains(&"chart_agent".to_string()));
    }
}
