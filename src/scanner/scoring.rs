//! Priority scoring and effort estimation.
//!
//! Both functions are pure and total: absent or negative counts behave as
//! zero, and the same signals always produce the same result.

use crate::model::{MAX_ESTIMATED_EFFORT, Priority};

/// Labels that add two points to an issue's priority score.
pub const HIGH_SIGNAL_LABELS: &[&str] = &["bug", "enhancement", "help wanted", "good first issue"];

const ENHANCEMENT_LABELS: &[&str] = &["enhancement", "feature", "feature request"];
const BUG_LABELS: &[&str] = &["bug", "type: bug", "kind/bug"];
const DOCUMENTATION_LABELS: &[&str] = &["documentation", "docs"];

const COMMENT_THRESHOLDS: &[i64] = &[10, 20, 50];
const REACTION_THRESHOLDS: &[i64] = &[5, 10, 20];
const DESCRIPTION_THRESHOLDS: &[i64] = &[500, 1000];

const BASE_EFFORT: u32 = 4;

/// The parts of an issue that scoring looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueSignals {
    pub comments: i64,
    pub reactions: i64,
    /// Lowercased, trimmed label names.
    pub labels: Vec<String>,
    /// Description length in characters.
    pub description_len: usize,
}

impl IssueSignals {
    pub fn new<I, S>(comments: i64, reactions: i64, labels: I, description_len: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            comments,
            reactions,
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().trim().to_lowercase())
                .collect(),
            description_len,
        }
    }

    fn has_any(&self, class: &[&str]) -> bool {
        self.labels.iter().any(|l| class.contains(&l.as_str()))
    }
}

/// How many thresholds `value` strictly exceeds.
fn thresholds_exceeded(value: i64, thresholds: &[i64]) -> u32 {
    thresholds.iter().filter(|&&t| value > t).count() as u32
}

pub fn priority_score(signals: &IssueSignals) -> u32 {
    let mut score = thresholds_exceeded(signals.comments.max(0), COMMENT_THRESHOLDS);
    score += thresholds_exceeded(signals.reactions.max(0), REACTION_THRESHOLDS);
    if signals.has_any(HIGH_SIGNAL_LABELS) {
        score += 2;
    }
    score
}

pub fn priority_for_score(score: u32) -> Priority {
    match score {
        6.. => Priority::Critical,
        4..=5 => Priority::High,
        2..=3 => Priority::Medium,
        _ => Priority::Low,
    }
}

pub fn priority(signals: &IssueSignals) -> Priority {
    priority_for_score(priority_score(signals))
}

/// Estimated hours of work, clamped to `0..=40`.
pub fn estimate_effort(signals: &IssueSignals) -> u32 {
    let mut hours = BASE_EFFORT;
    if signals.has_any(ENHANCEMENT_LABELS) {
        hours += 8;
    }
    if signals.has_any(BUG_LABELS) {
        hours += 2;
    }
    if signals.has_any(DOCUMENTATION_LABELS) {
        hours += 1;
    }
    let len = i64::try_from(signals.description_len).unwrap_or(i64::MAX);
    hours += 2 * thresholds_exceeded(len, DESCRIPTION_THRESHOLDS);
    hours.min(MAX_ESTIMATED_EFFORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_bug_is_critical() {
        let signals = IssueSignals::new(60, 25, ["bug"], 0);
        assert_eq!(priority_score(&signals), 8);
        assert_eq!(priority(&signals), Priority::Critical);
        // Deterministic across calls
        assert_eq!(priority(&signals), priority(&signals.clone()));
    }

    #[test]
    fn test_quiet_issue_is_low() {
        assert_eq!(priority(&IssueSignals::default()), Priority::Low);
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        assert_eq!(priority_score(&IssueSignals::new(10, 5, Vec::<String>::new(), 0)), 0);
        assert_eq!(priority_score(&IssueSignals::new(11, 6, Vec::<String>::new(), 0)), 2);
        assert_eq!(priority_score(&IssueSignals::new(21, 11, Vec::<String>::new(), 0)), 4);
        assert_eq!(priority_score(&IssueSignals::new(51, 21, Vec::<String>::new(), 0)), 6);
    }

    #[test]
    fn test_score_to_priority_bands() {
        assert_eq!(priority_for_score(0), Priority::Low);
        assert_eq!(priority_for_score(1), Priority::Low);
        assert_eq!(priority_for_score(2), Priority::Medium);
        assert_eq!(priority_for_score(4), Priority::High);
        assert_eq!(priority_for_score(6), Priority::Critical);
        assert_eq!(priority_for_score(8), Priority::Critical);
    }

    #[test]
    fn test_label_match_ignores_case() {
        let signals = IssueSignals::new(0, 0, ["Help Wanted "], 0);
        assert_eq!(priority_score(&signals), 2);
    }

    #[test]
    fn test_negative_counts_are_zero() {
        let signals = IssueSignals::new(-40, -3, Vec::<String>::new(), 0);
        assert_eq!(priority_score(&signals), 0);
    }

    #[test]
    fn test_base_effort() {
        assert_eq!(estimate_effort(&IssueSignals::default()), 4);
    }

    #[test]
    fn test_effort_label_classes() {
        assert_eq!(estimate_effort(&IssueSignals::new(0, 0, ["enhancement"], 0)), 12);
        assert_eq!(estimate_effort(&IssueSignals::new(0, 0, ["bug"], 0)), 6);
        assert_eq!(estimate_effort(&IssueSignals::new(0, 0, ["documentation"], 0)), 5);
        assert_eq!(
            estimate_effort(&IssueSignals::new(0, 0, ["enhancement", "bug", "docs"], 0)),
            15
        );
    }

    #[test]
    fn test_effort_description_buckets() {
        let effort = |len| estimate_effort(&IssueSignals::new(0, 0, Vec::<String>::new(), len));
        assert_eq!(effort(500), 4);
        assert_eq!(effort(501), 6);
        assert_eq!(effort(1000), 6);
        assert_eq!(effort(1001), 8);
    }

    #[test]
    fn test_long_enhancement_hits_formula_maximum() {
        let signals = IssueSignals::new(0, 0, ["enhancement"], 5000);
        let effort = estimate_effort(&signals);
        assert_eq!(effort, 16);
        assert!(effort <= MAX_ESTIMATED_EFFORT);

        let everything = IssueSignals::new(0, 0, ["enhancement", "bug", "documentation"], usize::MAX);
        assert!(estimate_effort(&everything) <= MAX_ESTIMATED_EFFORT);
    }
}
