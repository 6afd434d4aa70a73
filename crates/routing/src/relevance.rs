//! Relevance scoring for tool descriptors.
//!
//! Used on the fallback routing path, where no dispatch pattern named
//! the tools outright: every catalog descriptor is scored against the
//! query and the top `max_tools` survive. Scoring weights name-word
//! overlap heaviest, then description overlap, plus a small bonus for
//! tools whose name carries a common action verb.

use agentgate_core::ToolDescriptor;
use std::collections::HashSet;

const NAME_WEIGHT: u32 = 3;
const DESCRIPTION_WEIGHT: u32 = 2;
const ACTION_VERBS: [&str; 7] = ["list", "get", "create", "update", "delete", "scan", "check"];

/// Score one descriptor against a pre-split set of query words.
pub fn relevance_score(descriptor: &ToolDescriptor, query_words: &HashSet<String>) -> u32 {
    let mut score = 0;

    let name_lower = descriptor.name.to_lowercase();
    let name_words: HashSet<String> = name_lower
        .replace('_', " ")
        .split_whitespace()
        .map(str::to_string)
        .collect();
    score += query_words.intersection(&name_words).count() as u32 * NAME_WEIGHT;

    let desc_words: HashSet<String> = descriptor
        .description
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    score += query_words.intersection(&desc_words).count() as u32 * DESCRIPTION_WEIGHT;

    if ACTION_VERBS.iter().any(|verb| name_lower.contains(verb)) {
        score += 1;
    }

    score
}

/// Keep the `max_tools` highest-scoring descriptors with nonzero score.
///
/// The sort is stable: descriptors with equal scores keep their catalog
/// order, so repeated calls on the same catalog produce the same subset.
pub fn filter_by_relevance(
    descriptors: &[ToolDescriptor],
    query: &str,
    max_tools: usize,
) -> Vec<ToolDescriptor> {
    let query_words: HashSet<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let mut scored: Vec<(u32, &ToolDescriptor)> = descriptors
        .iter()
        .map(|d| (relevance_score(d, &query_words), d))
        .collect();

    scored.sort_by_key(|(score, _)| std::cmp::Reverse(*score));

    scored
        .into_iter()
        .take(max_tools)
        .filter(|(score, _)| *score > 0)
        .map(|(_, d)| d.clone())
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

    #[test]
    fn name_overlap_outweighs_description_overlap() {
        let words: HashSet<String> = ["dependabot".to_string()].into_iter().collect();
        let by_name = descriptor("dependabot_summary", "tool");
        let by_desc = descriptor("summary_tool", "dependabot data");
        assert!(relevance_score(&by_name, &words) > relevance_score(&by_desc, &words));
    }

    #[test]
    fn action_verb_bonus() {
        let words: HashSet<String> = HashSet::new();
        assert_eq!(relevance_score(&descriptor("list_things", "x"), &words), 1);
        assert_eq!(relevance_score(&descriptor("render_things", "x"), &words), 0);
    }

    #[test]
    fn zero_score_tools_are_dropped() {
        let descriptors = vec![
            descriptor("render_chart", "Render a chart image"),
            descriptor("pdf_extract", "Extract text from a PDF"),
        ];
        let result = filter_by_relevance(&descriptors, "draw me a chart", 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "render_chart");
    }

    #[test]
    fn cap_is_enforced() {
        let descriptors: Vec<ToolDescriptor> = (0..20)
            .map(|i| descriptor(&format!("list_item_{i}"), "list an item"))
            .collect();
        let result = filter_by_relevance(&descriptors, "list every item", 5);
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn equal_scores_keep_catalog_order() {
        let descriptors = vec![
            descriptor("list_alpha", "first"),
            descriptor("list_beta", "second"),
            descriptor("list_gamma", "third"),
        ];
        // All score 1 via the action-verb bonus.
        let result = filter_by_relevance(&descriptors, "unrelated query", 3);
        let names: Vec<&str> = result.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["list_alpha", "list_beta", "list_gamma"]);
    }

    #[test]
    fn no_relevant_tools_gives_empty_subset() {
        let descriptors = vec![descriptor("render_image", "image output")];
        let result = filter_by_relevance(&descriptors, "weather in tokyo", 10);
        assert!(result.is_empty());
    }
}
