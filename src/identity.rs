//! Handle normalization and identity matching.
//!
//! Raw sources spell the same creator many ways (`@Adam_Wickens`,
//! `adam wickens`, `adamwickens / adam.w`). [`IdentityNormalizer::normalize`]
//! collapses a raw handle into one canonical identifier; [`MatchPolicy`] decides
//! how loosely an identifier may match an already-canonical one.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One known duplicate identity: every pattern (compared by
/// [`comparison_key`]) resolves to `canonical`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub canonical: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl AliasRule {
    pub fn new(canonical: &str, patterns: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            patterns: patterns.iter().map(|pattern| pattern.to_string()).collect(),
        }
    }
}

pub fn builtin_aliases() -> Vec<AliasRule> {
    vec![AliasRule::new(
        "Adam_Wickens",
        &["adam wickens", "adamwickens", "adam.wickens"],
    )]
}

#[derive(Debug, Clone)]
pub struct IdentityNormalizer {
    rules: Vec<AliasRule>,
    // comparison key -> canonical identifier
    lookup: HashMap<String, String>,
}

impl Default for IdentityNormalizer {
    fn default() -> Self {
        Self::new(builtin_aliases())
    }
}

impl IdentityNormalizer {
    pub fn new(rules: Vec<AliasRule>) -> Self {
        let rules: Vec<AliasRule> = rules
            .into_iter()
            .map(|rule| AliasRule {
                canonical: clean_handle(&rule.canonical),
                patterns: rule.patterns,
            })
            .filter(|rule| !rule.canonical.is_empty())
            .collect();

        let mut lookup: HashMap<String, String> = HashMap::new();
        for rule in &rules {
            let key = comparison_key(&rule.canonical);
            if !key.is_empty() {
                lookup.entry(key).or_insert_with(|| rule.canonical.clone());
            }
        }
        for rule in &rules {
            // Patterns point at whichever canonical owns the rule's key, so a
            // canonical output always maps back onto itself.
            let owner = lookup
                .get(&comparison_key(&rule.canonical))
                .cloned()
                .unwrap_or_else(|| rule.canonical.clone());
            for pattern in &rule.patterns {
                let key = comparison_key(&clean_handle(pattern));
                if !key.is_empty() {
                    lookup.entry(key).or_insert_with(|| owner.clone());
                }
            }
        }

        Self { rules, lookup }
    }

    pub fn with_extra_aliases(extra: impl IntoIterator<Item = AliasRule>) -> Self {
        let mut rules = builtin_aliases();
        rules.extend(extra);
        Self::new(rules)
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Canonical identifier for a raw handle. Pure and idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        let cleaned = clean_handle(raw);
        if cleaned.is_empty() {
            return cleaned;
        }
        self.lookup
            .get(&comparison_key(&cleaned))
            .cloned()
            .unwrap_or(cleaned)
    }
}

/// Strips `@` and surrounding whitespace and keeps only the first of several
/// slash-separated handles.
pub fn clean_handle(raw: &str) -> String {
    let first = strip_decoration(raw).split('/').next().unwrap_or_default();
    strip_decoration(first).to_string()
}

fn strip_decoration(value: &str) -> &str {
    value
        .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
        .trim_end()
}

/// Lower-cased identifier with everything but letters and digits removed.
pub fn comparison_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Allow substring containment between comparison keys as a last resort.
    pub containment_fallback: bool,
    /// Keys shorter than this never take part in containment matching.
    pub min_containment_len: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            containment_fallback: true,
            min_containment_len: 4,
        }
    }
}

impl MatchPolicy {
    pub fn exact_only() -> Self {
        Self {
            containment_fallback: false,
            ..Self::default()
        }
    }

    /// Equal comparison keys.
    pub fn keys_equal(&self, left: &str, right: &str) -> bool {
        let left = comparison_key(left);
        !left.is_empty() && left == comparison_key(right)
    }

    /// Either comparison key contains the other, when containment is enabled.
    pub fn contains_either(&self, left: &str, right: &str) -> bool {
        if !self.containment_fallback {
            return false;
        }
        let left = comparison_key(left);
        let right = comparison_key(right);
        if left.chars().count() < self.min_containment_len.max(1)
            || right.chars().count() < self.min_containment_len.max(1)
        {
            return false;
        }
        left.contains(&right) || right.contains(&left)
    }

    /// Best candidate for `id` among `candidates`: exact, then
    /// case-insensitive, then comparison-key equality, then containment.
    /// Candidates are tried in iteration order within each stage.
    pub fn resolve<'a, I>(&self, id: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: Clone,
    {
        let candidates = candidates.into_iter();
        let lowered = id.to_lowercase();
        candidates
            .clone()
            .find(|candidate| *candidate == id)
            .or_else(|| {
                candidates
                    .clone()
                    .find(|candidate| candidate.to_lowercase() == lowered)
            })
            .or_else(|| {
                candidates
                    .clone()
                    .find(|candidate| self.keys_equal(candidate, id))
            })
            .or_else(|| candidates.clone().find(|candidate| self.contains_either(candidate, id)))
    }
}
