//! Rule-based classification of campaign names.
//!
//! Rules are checked highest priority first. Each field takes the value of
//! the first matching rule that sets it; fields no rule sets keep the
//! defaults below.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::classification::{ClassificationField, OverrideFields};

/// Field values for campaigns no rule classifies.
pub const DEFAULT_NETWORK: &str = "Unknown";
pub const DEFAULT_DOMAIN: &str = "Unknown Network";
pub const DEFAULT_PLACEMENT: &str = "Unknown";
pub const DEFAULT_TARGETING: &str = "Unknown";
pub const DEFAULT_SPECIAL: &str = "Standard";

/// Rules at or above this priority add a confidence bonus.
pub const HIGH_PRIORITY: i32 = 900;

/// A mapping value meaning "leave to lower-priority rules".
const INHERIT: &str = "inherit";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Exact,
    Contains,
    StartsWith,
    EndsWith,
    Regex,
}

/// A configured mapping rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub pattern_type: PatternType,
    pub pattern_value: String,
    #[serde(default)]
    pub mapping: OverrideFields,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: MappingRule,
    lowered: String,
    /// `None` for invalid regex patterns, which never match
    regex: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: MappingRule) -> Self {
        let regex = match rule.pattern_type {
            PatternType::Regex => RegexBuilder::new(&rule.pattern_value)
                .case_insensitive(true)
                .build()
                .ok(),
            _ => None,
        };
        Self {
            lowered: rule.pattern_value.to_lowercase(),
            rule,
            regex,
        }
    }

    fn matches(&self, name_lower: &str, name: &str) -> bool {
        if self.rule.pattern_value.is_empty() {
            return false;
        }
        match self.rule.pattern_type {
            PatternType::Exact => name_lower == self.lowered,
            PatternType::Contains => name_lower.contains(&self.lowered),
            PatternType::StartsWith => name_lower.starts_with(&self.lowered),
            PatternType::EndsWith => name_lower.ends_with(&self.lowered),
            PatternType::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(name)),
        }
    }
}

/// A rule that matched during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRule {
    pub name: String,
    pub priority: i32,
    pub pattern_type: PatternType,
    pub pattern_value: String,
}

/// Result of classifying one campaign name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub campaign_name: String,
    pub network: String,
    pub domain: String,
    pub placement: String,
    pub targeting: String,
    pub special: String,
    pub matched_rules: Vec<MatchedRule>,
    pub confidence: f64,
}

impl RuleMatch {
    pub fn get(&self, field: ClassificationField) -> &str {
        match field {
            ClassificationField::Network => &self.network,
            ClassificationField::Domain => &self.domain,
            ClassificationField::Placement => &self.placement,
            ClassificationField::Targeting => &self.targeting,
            ClassificationField::Special => &self.special,
        }
    }
}

fn default_value(field: ClassificationField) -> &'static str {
    match field {
        ClassificationField::Network => DEFAULT_NETWORK,
        ClassificationField::Domain => DEFAULT_DOMAIN,
        ClassificationField::Placement => DEFAULT_PLACEMENT,
        ClassificationField::Targeting => DEFAULT_TARGETING,
        ClassificationField::Special => DEFAULT_SPECIAL,
    }
}

/// Priority-ordered, compiled rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile rules, dropping inactive ones and ordering by priority (highest first).
    pub fn new(rules: impl IntoIterator<Item = MappingRule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .filter(|r| r.active)
            .map(CompiledRule::compile)
            .collect();
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Self { rules: compiled }
    }

    /// A small built-in rule set for the major ad networks.
    pub fn builtin() -> Self {
        let rule = |name: &str, pattern: &str, fields: [&str; 5], priority: i32| MappingRule {
            name: name.to_string(),
            priority,
            pattern_type: PatternType::Contains,
            pattern_value: pattern.to_string(),
            mapping: OverrideFields {
                network: Some(fields[0].to_string()),
                domain: Some(fields[1].to_string()),
                placement: Some(fields[2].to_string()),
                targeting: Some(fields[3].to_string()),
                special: Some(fields[4].to_string()),
            },
            active: true,
        };
        Self::new([
            rule("Facebook Desktop", "Facebook Desktop", ["Facebook", "Social Media", "Desktop", "Desktop Users", "Premium"], 981),
            rule("Facebook Mobile", "Facebook Mobile", ["Facebook", "Social Media", "Mobile", "Mobile Users", "Standard"], 981),
            rule("Instagram Stories", "Instagram Stories", ["Instagram", "Social Media", "Stories", "Story Viewers", "Ephemeral"], 981),
            rule("Google Display", "Google Display", ["Google", "Display Network", "Banner", "Display Users", "Retargeting"], 981),
            rule("Google Search", "Google Search", ["Google", "Search Network", "Text", "Search Users", "Intent"], 981),
            rule("TikTok Video", "TikTok", ["TikTok", "Social Media", "Video", "Gen Z", "Viral"], 981),
            rule("YouTube Pre-roll", "YouTube", ["YouTube", "Video Platform", "Pre-roll", "Video Viewers", "Skippable"], 981),
            rule("Reddit Promoted", "Reddit", ["Reddit", "Community", "Promoted", "Niche Communities", "Discussion"], 981),
        ])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of regex rules whose pattern failed to compile.
    pub fn invalid_rules(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.rule.pattern_type == PatternType::Regex && r.regex.is_none())
            .map(|r| r.rule.name.as_str())
            .collect()
    }

    /// Classify a campaign name.
    pub fn classify(&self, campaign_name: &str) -> RuleMatch {
        let name_lower = campaign_name.to_lowercase();
        let mut values: [String; 5] =
            ClassificationField::ALL.map(|f| default_value(f).to_string());
        let mut matched_rules = Vec::new();

        for compiled in &self.rules {
            if !compiled.matches(&name_lower, campaign_name) {
                continue;
            }
            let rule = &compiled.rule;
            matched_rules.push(MatchedRule {
                name: rule.name.clone(),
                priority: rule.priority,
                pattern_type: rule.pattern_type,
                pattern_value: rule.pattern_value.clone(),
            });

            for (slot, field) in values.iter_mut().zip(ClassificationField::ALL) {
                let Some(value) = rule.mapping.get(field) else {
                    continue;
                };
                if value.is_empty() || value.eq_ignore_ascii_case(INHERIT) {
                    continue;
                }
                if slot.as_str() == default_value(field) {
                    *slot = value.to_string();
                }
            }
        }

        let confidence = mapping_confidence(&values, &matched_rules);
        let [network, domain, placement, targeting, special] = values;

        RuleMatch {
            campaign_name: campaign_name.to_string(),
            network,
            domain,
            placement,
            targeting,
            special,
            matched_rules,
            confidence,
        }
    }
}

fn mapping_confidence(values: &[String; 5], matched: &[MatchedRule]) -> f64 {
    if matched.is_empty() {
        return 0.1;
    }

    let mut confidence = (matched.len() as f64 * 0.2).min(0.8);
    if matched.iter().any(|r| r.pattern_type == PatternType::Exact) {
        confidence += 0.2;
    }
    if matched.iter().any(|r| r.priority >= HIGH_PRIORITY) {
        confidence += 0.1;
    }
    let unknown_count = values.iter().filter(|v| v.contains("Unknown")).count();
    if unknown_count >= 3 {
        confidence -= 0.2;
    }

    confidence.clamp(0.1, 1.0)
}
