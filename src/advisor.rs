//! Offline work advisor.
//!
//! Produces the analysis note attached when a session starts and answers
//! `chat` messages. Replies are rule-based so sessions stay reproducible.

use std::fmt;

use crate::model::Problem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Complexity::Low => write!(f, "low"),
            Complexity::Medium => write!(f, "medium"),
            Complexity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub complexity: Complexity,
    pub approach: &'static str,
    pub suggestions: Vec<String>,
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Analysis: {} complexity, {} approach. Suggestions: {}",
            self.complexity,
            self.approach,
            self.suggestions.join("; ")
        )
    }
}

pub trait Advisor {
    fn analyze(&self, problem: &Problem) -> Analysis;
    fn reply(&self, message: &str, problem: &Problem) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAdvisor;

impl HeuristicAdvisor {
    fn complexity(problem: &Problem) -> Complexity {
        match problem.estimated_effort {
            0..=6 => Complexity::Low,
            7..=12 => Complexity::Medium,
            _ => Complexity::High,
        }
    }

    fn has_tag(problem: &Problem, tag: &str) -> bool {
        problem.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

impl Advisor for HeuristicAdvisor {
    fn analyze(&self, problem: &Problem) -> Analysis {
        let complexity = Self::complexity(problem);
        let mut suggestions = Vec::new();

        if Self::has_tag(problem, "bug") {
            suggestions.push("Reproduce the bug locally before changing code".to_string());
        }
        if Self::has_tag(problem, "enhancement") {
            suggestions.push("Agree on the design in the issue thread first".to_string());
        }
        if Self::has_tag(problem, "documentation") {
            suggestions.push("Check which docs pages link to the affected section".to_string());
        }
        suggestions.push("Research existing solutions and related issues".to_string());
        if complexity != Complexity::Low {
            suggestions.push("Break the problem down into smaller tasks".to_string());
        }

        let approach = match complexity {
            Complexity::Low => "direct_fix",
            Complexity::Medium => "proof_of_concept",
            Complexity::High => "iterative_development",
        };

        Analysis {
            complexity,
            approach,
            suggestions,
        }
    }

    fn reply(&self, message: &str, problem: &Problem) -> String {
        let lower = message.to_lowercase();
        if lower.contains("stuck") || lower.contains("help") {
            let analysis = self.analyze(problem);
            return format!("Try this next: {}", analysis.suggestions.join("; "));
        }
        if lower.contains("estimate") || lower.contains("how long") {
            let remaining = problem.estimated_effort.saturating_sub(problem.actual_effort);
            return format!(
                "Estimated {}h, {}h logged so far, about {}h remaining.",
                problem.estimated_effort, problem.actual_effort, remaining
            );
        }
        if lower.contains("link") || lower.contains("url") {
            return format!("The issue is at {}", problem.url);
        }
        format!(
            "Noted. Keep \"{}\" moving; log progress as you go.",
            problem.title
        )
    }
}
