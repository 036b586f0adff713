//! Task data model
//!
//! Tasks live on a four-column kanban board. Within a column the display
//! order is defined by the fractional `order` key (see `crate::order`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LENGTH: usize = 120;
pub const DESCRIPTION_MAX_LENGTH: usize = 500;

/// The four fixed board columns, in display order.
pub const TASK_COLUMNS: [TaskColumn; 4] = [
    TaskColumn::Backlog,
    TaskColumn::InProgress,
    TaskColumn::Review,
    TaskColumn::Done,
];

/// Board column; also the primary partition key for cached queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskColumn {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl TaskColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskColumn::Backlog => "backlog",
            TaskColumn::InProgress => "in_progress",
            TaskColumn::Review => "review",
            TaskColumn::Done => "done",
        }
    }

    /// Human title used by the view layer.
    pub fn title(&self) -> &'static str {
        match self {
            TaskColumn::Backlog => "Backlog",
            TaskColumn::InProgress => "In Progress",
            TaskColumn::Review => "Review",
            TaskColumn::Done => "Done",
        }
    }
}

impl fmt::Display for TaskColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskColumn {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "backlog" => Ok(TaskColumn::Backlog),
            "in_progress" => Ok(TaskColumn::InProgress),
            "review" => Ok(TaskColumn::Review),
            "done" => Ok(TaskColumn::Done),
            _ => Err(()),
        }
    }
}

/// Task priority. Unknown wire values fall back to `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    Hard,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::Hard => "hard",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "hard" => Ok(TaskPriority::Hard),
            _ => Err(()),
        }
    }
}

/// Check a title against the form rules shared by the dialog and the CLI.
pub fn validate_title(title: &str) -> std::result::Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Title is required.".to_string());
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(format!(
            "Title must be {TITLE_MAX_LENGTH} characters or less."
        ));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> std::result::Result<(), String> {
    if description.trim().chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(format!(
            "Description must be {DESCRIPTION_MAX_LENGTH} characters or less."
        ));
    }
    Ok(())
}

/// A board task.
///
/// Server-assigned ids are positive; optimistic creates use transient
/// negative ids until the server confirms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub column: TaskColumn,
    pub order: f64,
    pub priority: TaskPriority,
}

/// Body for `POST /tasks`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: String,
    pub column: TaskColumn,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

/// Partial body for `PATCH /tasks/:id`. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateTaskInput {
    #[serde(skip)]
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<TaskColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl UpdateTaskInput {
    pub fn order_only(id: i64, order: f64) -> Self {
        Self {
            id,
            order: Some(order),
            ..Self::default()
        }
    }

    /// The optimistic task state: the patch merged over the previous task.
    pub fn apply_to(&self, previous: &Task) -> Task {
        Task {
            id: previous.id,
            title: self.title.clone().unwrap_or_else(|| previous.title.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| previous.description.clone()),
            column: self.column.unwrap_or(previous.column),
            order: self.order.unwrap_or(previous.order),
            priority: self.priority.unwrap_or(previous.priority),
        }
    }
}

/// One fetched page of a column query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub page: u32,
    pub limit: usize,
    /// Authoritative count for the column+filter when the backend reports it.
    pub total: Option<u64>,
    /// When `total` is unknown this falls back to `items.len() == limit`,
    /// which stays true after an exactly-full final page until the next
    /// fetch comes back empty.
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_round_trips_wire_form() {
        for column in TASK_COLUMNS {
            assert_eq!(column.as_str().parse::<TaskColumn>(), Ok(column));
        }
        assert!("doing".parse::<TaskColumn>().is_err());
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn update_input_merges_over_previous() {
        let previous = Task {
            id: 7,
            title: "Old".to_string(),
            description: "Desc".to_string(),
            column: TaskColumn::Backlog,
            order: 1000.0,
            priority: TaskPriority::Low,
        };
        let input = UpdateTaskInput {
            id: 7,
            title: Some("New".to_string()),
            column: Some(TaskColumn::Review),
            ..UpdateTaskInput::default()
        };

        let merged = input.apply_to(&previous);
        assert_eq!(merged.title, "New");
        assert_eq!(merged.description, "Desc");
        assert_eq!(merged.column, TaskColumn::Review);
        assert_eq!(merged.order, 1000.0);
        assert_eq!(merged.priority, TaskPriority::Low);
    }

    #[test]
    fn validation_enforces_required_title_and_length_caps() {
        assert!(validate_title("Fix login").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(TITLE_MAX_LENGTH + 1)).is_err());
        assert!(validate_description(&"x".repeat(DESCRIPTION_MAX_LENGTH)).is_ok());
        assert!(validate_description(&"x".repeat(DESCRIPTION_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn update_input_serializes_only_set_fields() {
        let input = UpdateTaskInput::order_only(3, 1500.0);
        let body = serde_json::to_value(&input).expect("serialize");
        assert_eq!(body, serde_json::json!({ "order": 1500.0 }));
    }
}
