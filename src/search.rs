//! Client-side search matching
//!
//! Mirrors the server's `q=` substring search so optimistic cache patches
//! can decide membership in a filtered view without a round trip.

use crate::task::Task;

pub fn normalize_search_term(search_term: &str) -> String {
    search_term.trim().to_lowercase()
}

/// Case-insensitive substring match on title or description; an empty or
/// whitespace-only term matches everything.
pub fn matches_task_search(task: &Task, search_term: &str) -> bool {
    let normalized = normalize_search_term(search_term);
    if normalized.is_empty() {
        return true;
    }

    task.title.to_lowercase().contains(&normalized)
        || task.description.to_lowercase().contains(&normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskColumn, TaskPriority};

    fn task(title: &str, description: &str) -> Task {
        Task {
            id: 1,
            title: title.to_string(),
            description: description.to_string(),
            column: TaskColumn::Backlog,
            order: 1000.0,
            priority: TaskPriority::Medium,
        }
    }

    #[test]
    fn empty_or_whitespace_term_matches_everything() {
        let task = task("Write docs", "Docs task");
        assert!(matches_task_search(&task, ""));
        assert!(matches_task_search(&task, "   "));
    }

    #[test]
    fn matches_title_or_description_case_insensitive() {
        let task = task("Write docs", "Board task");
        assert!(matches_task_search(&task, "DOCS"));
        assert!(matches_task_search(&task, "board"));
        assert!(!matches_task_search(&task, "missing"));
    }

    #[test]
    fn term_is_trimmed_before_matching() {
        let task = task("Write docs", "");
        assert!(matches_task_search(&task, "  docs  "));
    }
}
