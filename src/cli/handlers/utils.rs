use crate::model::{Priority, Problem, ProblemStatus, SessionRecord};
use colored::Colorize;

/// Format status with color coding
pub fn format_status(status: ProblemStatus) -> colored::ColoredString {
    match status {
        ProblemStatus::Discovered => "discovered".dimmed(),
        ProblemStatus::Queued => "queued".white(),
        ProblemStatus::InProgress => "in_progress".yellow(),
        ProblemStatus::Completed => "completed".green(),
        ProblemStatus::Failed => "failed".red(),
        ProblemStatus::Archived => "archived".dimmed(),
    }
}

/// Format priority with color coding
pub fn format_priority(priority: Priority) -> colored::ColoredString {
    match priority {
        Priority::Critical => "critical".red().bold(),
        Priority::High => "high".red(),
        Priority::Medium => "medium".white(),
        Priority::Low => "low".dimmed(),
    }
}

/// Print a single problem with details
pub fn print_problem(problem: &Problem) {
    println!("{} {}", problem.id.cyan().bold(), problem.title.bold());
    println!("Source:   {}", problem.source.blue());
    println!("Status:   {}", format_status(problem.status));
    println!("Priority: {}", format_priority(problem.priority));
    println!(
        "Effort:   {}h estimated, {}h logged",
        problem.estimated_effort, problem.actual_effort
    );
    if !problem.url.is_empty() {
        println!("URL:      {}", problem.url.underline());
    }
    if !problem.tags.is_empty() {
        let tags: Vec<&str> = problem.tags.iter().map(String::as_str).collect();
        println!("Tags:     {}", tags.join(", ").yellow());
    }
    println!(
        "Created:  {}",
        problem.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
    println!(
        "Updated:  {}",
        problem.updated_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
    );

    if !problem.description.is_empty() {
        println!();
        println!("{}", problem.description);
    }
}

/// Print a list of problems (compact format)
pub fn print_problem_list(problems: &[Problem]) {
    if problems.is_empty() {
        println!("No problems found.");
        return;
    }

    for problem in problems {
        println!(
            "{} {} [{}] {}",
            problem.id.cyan(),
            format_status(problem.status),
            format_priority(problem.priority),
            problem.title
        );
    }
}

pub fn print_sessions(sessions: &[SessionRecord]) {
    if sessions.is_empty() {
        return;
    }
    println!();
    println!("{}", "Sessions:".bold());
    for session in sessions {
        println!(
            "  #{} {} {} ({}h)",
            session.id,
            session.start_time.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            session.outcome,
            session.elapsed_hours
        );
        for entry in &session.progress {
            println!("    {} {}", "+".green(), entry);
        }
        for entry in &session.notes {
            println!("    {} {}", "-".dimmed(), entry);
        }
    }
}
