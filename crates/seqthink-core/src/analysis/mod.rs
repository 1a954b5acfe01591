//! Heuristic scoring of a single thought.
//!
//! [`analyze`] is a pure function of the thought text and the caller's position
//! in the reasoning process. It keeps no state between calls.

pub mod recommend;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

pub use recommend::{
    EstimatedCompletion, RecommendationContext, ResponseContext, estimated_completion, recommend,
    suggested_next_steps,
};

/// Ordinal complexity label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, AsRefStr,
)]
pub enum Complexity {
    #[serde(rename = "very low")]
    #[strum(serialize = "very low")]
    VeryLow,
    #[serde(rename = "low")]
    #[strum(serialize = "low")]
    Low,
    #[serde(rename = "medium")]
    #[strum(serialize = "medium")]
    Medium,
    #[serde(rename = "high")]
    #[strum(serialize = "high")]
    High,
    #[serde(rename = "very high")]
    #[strum(serialize = "very high")]
    VeryHigh,
}

impl Complexity {
    pub fn from_score(score: f64) -> Self {
        if score <= 2.0 {
            Self::VeryLow
        } else if score <= 4.0 {
            Self::Low
        } else if score <= 6.0 {
            Self::Medium
        } else if score <= 8.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }
}

/// Kind of reasoning step a thought represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThoughtType {
    Question,
    Analysis,
    Solution,
    Planning,
    Evaluation,
    Synthesis,
    Assumption,
    Conclusion,
    Revision,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scope {
    Narrow,
    Medium,
    Broad,
}

/// Position of the thought in the caller's reasoning process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisContext {
    pub thought_number: Option<u32>,
    pub total_thoughts: Option<u32>,
}

impl AnalysisContext {
    pub fn new(thought_number: u32, total_thoughts: u32) -> Self {
        Self {
            thought_number: Some(thought_number),
            total_thoughts: Some(total_thoughts),
        }
    }

    /// `thought_number / total_thoughts`, or 0 when either is unknown.
    pub fn progress(&self) -> f64 {
        match (self.thought_number, self.total_thoughts) {
            (Some(number), Some(total)) if total > 0 => f64::from(number) / f64::from(total),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub complexity: Complexity,
    #[serde(rename = "type")]
    pub thought_type: ThoughtType,
    pub confidence: f64,
    pub scope: Scope,
    pub progress: f64,
}

const COMPLEXITY_KEYWORDS: [&str; 10] = [
    "analysis",
    "synthesize",
    "integrate",
    "architecture",
    "algorithm",
    "optimization",
    "strategy",
    "framework",
    "paradigm",
    "abstraction",
];

/// Classification rules, evaluated top to bottom. The first match wins.
const TYPE_RULES: [(ThoughtType, &str); 9] = [
    (ThoughtType::Question, r"\?|how|what|why|when|where|which|who"),
    (ThoughtType::Analysis, r"analyze|examine|investigate|explore|consider"),
    (ThoughtType::Solution, r"solve|fix|implement|create|build|develop"),
    (ThoughtType::Planning, r"plan|design|outline|structure|organize"),
    (ThoughtType::Evaluation, r"evaluate|assess|compare|review|critique"),
    (ThoughtType::Synthesis, r"combine|integrate|merge|synthesize|unify"),
    (ThoughtType::Assumption, r"assume|suppose|presume|hypothesize"),
    (ThoughtType::Conclusion, r"conclude|therefore|thus|hence|result"),
    (ThoughtType::Revision, r"revise|modify|update|change|adjust"),
];

const SCOPE_GROUPS: [(Scope, &[&str]); 3] = [
    (Scope::Narrow, &["specific", "particular", "focus", "target"]),
    (Scope::Medium, &["general", "overall", "comprehensive"]),
    (Scope::Broad, &["system", "architecture", "strategy", "paradigm"]),
];

fn case_insensitive(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("(?i){pattern}")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::error!("[HeuristicAnalyzer] Invalid pattern '{}': {}", pattern, e);
            None
        }
    }
}

static TYPE_TABLE: Lazy<Vec<(ThoughtType, Regex)>> = Lazy::new(|| {
    TYPE_RULES
        .iter()
        .filter_map(|(label, pattern)| case_insensitive(pattern).map(|regex| (*label, regex)))
        .collect()
});

static CONDITIONALS: Lazy<Option<Regex>> =
    Lazy::new(|| case_insensitive("if|then|else|when|unless|while"));
static DEFINITIVE: Lazy<Option<Regex>> =
    Lazy::new(|| case_insensitive("definitely|certainly|clearly|obviously"));
static UNCERTAIN: Lazy<Option<Regex>> =
    Lazy::new(|| case_insensitive("maybe|perhaps|possibly|uncertain|unclear"));

fn matches(regex: &Option<Regex>, text: &str) -> bool {
    regex.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Scores a thought. Deterministic: identical inputs give identical output.
pub fn analyze(text: &str, context: &AnalysisContext) -> Analysis {
    let progress = context.progress();
    Analysis {
        complexity: Complexity::from_score(complexity_score(text)),
        thought_type: classify(text),
        confidence: confidence(text, context),
        scope: scope(text),
        progress,
    }
}

/// Raw complexity score before it is mapped to a [`Complexity`] label.
pub fn complexity_score(text: &str) -> f64 {
    let length = text.chars().count();
    let lowered = text.to_lowercase();

    let mut score = 0.0;
    if length > 500 {
        score += 2.0;
    } else if length > 200 {
        score += 1.0;
    }

    score += COMPLEXITY_KEYWORDS
        .iter()
        .filter(|keyword| lowered.contains(*keyword))
        .count() as f64;

    score += text.matches('?').count() as f64;

    let conditionals = match &*CONDITIONALS {
        Some(regex) => regex.find_iter(text).count(),
        None => 0,
    };
    score += (conditionals as f64 / 2.0).min(2.0);

    score
}

pub fn classify(text: &str) -> ThoughtType {
    TYPE_TABLE
        .iter()
        .find(|(_, regex)| regex.is_match(text))
        .map_or(ThoughtType::General, |(label, _)| *label)
}

/// Confidence estimate, always within `[0.1, 1.0]`.
pub fn confidence(text: &str, context: &AnalysisContext) -> f64 {
    let mut confidence = 0.5;
    if matches(&DEFINITIVE, text) {
        confidence += 0.3;
    }
    if matches(&UNCERTAIN, text) {
        confidence -= 0.2;
    }
    if text.contains('?') && text.chars().count() < 200 {
        confidence += 0.1;
    }
    if context.thought_number.is_some() && context.total_thoughts.is_some() {
        confidence += context.progress() * 0.2;
    }
    confidence.clamp(0.1, 1.0)
}

pub fn scope(text: &str) -> Scope {
    let lowered = text.to_lowercase();
    SCOPE_GROUPS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map_or(Scope::Medium, |(scope, _)| *scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_table_complete() {
        assert_eq!(TYPE_TABLE.len(), TYPE_RULES.len());
        assert!(CONDITIONALS.is_some());
        assert!(DEFINITIVE.is_some());
        assert!(UNCERTAIN.is_some());
    }

    #[test]
    fn test_short_question() {
        let analysis = analyze(
            "Should we refactor the query layer?",
            &AnalysisContext::new(1, 5),
        );
        assert_eq!(analysis.thought_type, ThoughtType::Question);
        assert_eq!(analysis.complexity, Complexity::VeryLow);
        assert!((analysis.progress - 0.2).abs() < 1e-9);
        // 0.5 base + 0.1 short question + 0.2 * 0.2 progress
        assert!((analysis.confidence - 0.64).abs() < 1e-9);
    }

    #[test]
    fn test_long_text_with_keywords_and_questions() {
        let mut text = String::from("architecture optimization ? ? ? ");
        while text.chars().count() < 600 {
            text.push('x');
        }
        assert_eq!(text.chars().count(), 600);
        assert_eq!(complexity_score(&text), 7.0);
        assert_eq!(analyze(&text, &AnalysisContext::default()).complexity, Complexity::High);
    }

    #[test]
    fn test_conditionals_are_capped() {
        let text = "if if if if if if if if";
        assert_eq!(complexity_score(text), 2.0);
        assert_eq!(complexity_score("if then"), 1.0);
        assert_eq!(complexity_score("only if"), 0.5);
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::from_score(2.0), Complexity::VeryLow);
        assert_eq!(Complexity::from_score(2.5), Complexity::Low);
        assert_eq!(Complexity::from_score(6.0), Complexity::Medium);
        assert_eq!(Complexity::from_score(8.0), Complexity::High);
        assert_eq!(Complexity::from_score(8.5), Complexity::VeryHigh);
    }

    #[test]
    fn test_first_rule_wins() {
        assert_eq!(classify("Why examine this?"), ThoughtType::Question);
        assert_eq!(classify("Examine the cache"), ThoughtType::Analysis);
        assert_eq!(classify("Fix the parser"), ThoughtType::Solution);
        assert_eq!(classify("Outline the steps"), ThoughtType::Planning);
        assert_eq!(classify("Assess the risk"), ThoughtType::Evaluation);
        assert_eq!(classify("Merge both ideas"), ThoughtType::Synthesis);
        assert_eq!(classify("Suppose it fails"), ThoughtType::Assumption);
        assert_eq!(classify("Hence it holds"), ThoughtType::Conclusion);
        assert_eq!(classify("Adjust it"), ThoughtType::Revision);
        assert_eq!(classify("Plain statement"), ThoughtType::General);
    }

    #[test]
    fn test_confidence_markers() {
        let context = AnalysisContext::default();
        assert!((confidence("This is clearly right", &context) - 0.8).abs() < 1e-9);
        assert!((confidence("Maybe it works", &context) - 0.3).abs() < 1e-9);
        assert!((confidence("Clearly, maybe", &context) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_bounds() {
        let texts = [
            "",
            "maybe perhaps unclear",
            "definitely certainly clearly obviously?",
            "?",
        ];
        for text in texts {
            for (number, total) in [(1, 1), (1, 100), (50, 50)] {
                let value = confidence(text, &AnalysisContext::new(number, total));
                assert!((0.1..=1.0).contains(&value), "{text}: {value}");
            }
        }
    }

    #[test]
    fn test_scope_groups() {
        assert_eq!(scope("Focus on the parser"), Scope::Narrow);
        assert_eq!(scope("Overall picture"), Scope::Medium);
        assert_eq!(scope("The whole system"), Scope::Broad);
        assert_eq!(scope("nothing here"), Scope::Medium);
        // Narrow is checked before broad.
        assert_eq!(scope("specific system"), Scope::Narrow);
    }

    #[test]
    fn test_progress_unknown() {
        let context = AnalysisContext {
            thought_number: Some(2),
            total_thoughts: None,
        };
        assert_eq!(context.progress(), 0.0);
    }

    #[test]
    fn test_labels_serialize() {
        let analysis = analyze("plain", &AnalysisContext::new(1, 2));
        let value = serde_json::to_value(analysis).unwrap();
        assert_eq!(value["complexity"], "very low");
        assert_eq!(value["type"], "general");
        assert_eq!(value["scope"], "medium");
    }
}
