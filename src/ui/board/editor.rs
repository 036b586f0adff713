//! Task dialog form state
//!
//! Create/edit dialog for a task. Validation failures stay inside the
//! dialog and never reach the network.

use crossterm::event::{KeyCode, KeyEvent};

use crate::task::{
    validate_description, validate_title, Task, TaskColumn, TaskPriority, TASK_COLUMNS,
};

const PRIORITIES: [TaskPriority; 3] = [
    TaskPriority::Low,
    TaskPriority::Medium,
    TaskPriority::Hard,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogField {
    Title,
    Description,
    Column,
    Priority,
}

const FIELDS: [DialogField; 4] = [
    DialogField::Title,
    DialogField::Description,
    DialogField::Column,
    DialogField::Priority,
];

/// Validated dialog submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogValues {
    pub title: String,
    pub description: String,
    pub column: TaskColumn,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    None,
    Cancel,
    Submit,
}

#[derive(Debug, Clone)]
pub struct TaskDialog {
    mode: DialogMode,
    task_id: Option<i64>,
    title: String,
    description: String,
    column: TaskColumn,
    priority: TaskPriority,
    active: DialogField,
    error: Option<String>,
}

impl TaskDialog {
    pub fn create(default_column: TaskColumn) -> Self {
        Self {
            mode: DialogMode::Create,
            task_id: None,
            title: String::new(),
            description: String::new(),
            column: default_column,
            priority: TaskPriority::Medium,
            active: DialogField::Title,
            error: None,
        }
    }

    pub fn edit(task: &Task) -> Self {
        Self {
            mode: DialogMode::Edit,
            task_id: Some(task.id),
            title: task.title.clone(),
            description: task.description.clone(),
            column: task.column,
            priority: task.priority,
            active: DialogField::Title,
            error: None,
        }
    }

    pub fn mode(&self) -> DialogMode {
        self.mode
    }

    pub fn task_id(&self) -> Option<i64> {
        self.task_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn column(&self) -> TaskColumn {
        self.column
    }

    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    pub fn active_field(&self) -> DialogField {
        self.active
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn cycle_field(&mut self, forward: bool) {
        let index = FIELDS.iter().position(|f| *f == self.active).unwrap_or(0);
        let next = if forward {
            (index + 1) % FIELDS.len()
        } else {
            (index + FIELDS.len() - 1) % FIELDS.len()
        };
        self.active = FIELDS[next];
    }

    fn cycle_column(&mut self, forward: bool) {
        let index = TASK_COLUMNS
            .iter()
            .position(|c| *c == self.column)
            .unwrap_or(0);
        let next = if forward {
            (index + 1) % TASK_COLUMNS.len()
        } else {
            (index + TASK_COLUMNS.len() - 1) % TASK_COLUMNS.len()
        };
        self.column = TASK_COLUMNS[next];
    }

    fn cycle_priority(&mut self, forward: bool) {
        let index = PRIORITIES
            .iter()
            .position(|p| *p == self.priority)
            .unwrap_or(1);
        let next = if forward {
            (index + 1) % PRIORITIES.len()
        } else {
            (index + PRIORITIES.len() - 1) % PRIORITIES.len()
        };
        self.priority = PRIORITIES[next];
    }

    fn active_text_mut(&mut self) -> Option<&mut String> {
        match self.active {
            DialogField::Title => Some(&mut self.title),
            DialogField::Description => Some(&mut self.description),
            _ => None,
        }
    }

    /// Validate current values; trimmed on success.
    pub fn validate(&self) -> Result<DialogValues, String> {
        validate_title(&self.title)?;
        validate_description(&self.description)?;

        Ok(DialogValues {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            column: self.column,
            priority: self.priority,
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DialogAction {
        match key.code {
            KeyCode::Esc => return DialogAction::Cancel,
            KeyCode::Tab | KeyCode::Down => self.cycle_field(true),
            KeyCode::BackTab | KeyCode::Up => self.cycle_field(false),
            KeyCode::Left => match self.active {
                DialogField::Column => self.cycle_column(false),
                DialogField::Priority => self.cycle_priority(false),
                _ => {}
            },
            KeyCode::Right => match self.active {
                DialogField::Column => self.cycle_column(true),
                DialogField::Priority => self.cycle_priority(true),
                _ => {}
            },
            KeyCode::Backspace => {
                if let Some(text) = self.active_text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(text) = self.active_text_mut() {
                    text.push(ch);
                }
            }
            KeyCode::Enter => match self.validate() {
                Ok(_) => return DialogAction::Submit,
                Err(message) => self.error = Some(message),
            },
            _ => {}
        }

        DialogAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn empty_title_blocks_submission() {
        let mut dialog = TaskDialog::create(TaskColumn::Backlog);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), DialogAction::None);
        assert_eq!(dialog.error(), Some("Title is required."));
    }

    #[test]
    fn overlong_fields_block_submission() {
        let mut dialog = TaskDialog::create(TaskColumn::Backlog);
        dialog.title = "x".repeat(crate::task::TITLE_MAX_LENGTH + 1);
        assert!(dialog.validate().is_err());

        dialog.title = "ok".to_string();
        dialog.description = "x".repeat(crate::task::DESCRIPTION_MAX_LENGTH + 1);
        assert!(dialog.validate().is_err());
    }

    #[test]
    fn submit_trims_values() {
        let mut dialog = TaskDialog::create(TaskColumn::Review);
        dialog.title = "  Fix login  ".to_string();
        dialog.description = " details ".to_string();

        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), DialogAction::Submit);
        let values = dialog.validate().expect("valid");
        assert_eq!(values.title, "Fix login");
        assert_eq!(values.description, "details");
        assert_eq!(values.column, TaskColumn::Review);
    }

    #[test]
    fn typing_goes_to_the_active_field() {
        let mut dialog = TaskDialog::create(TaskColumn::Backlog);
        dialog.handle_key(key(KeyCode::Char('a')));
        dialog.handle_key(key(KeyCode::Tab));
        dialog.handle_key(key(KeyCode::Char('b')));
        assert_eq!(dialog.title(), "a");
        assert_eq!(dialog.description(), "b");
    }

    #[test]
    fn arrow_keys_cycle_column_and_priority() {
        let mut dialog = TaskDialog::create(TaskColumn::Backlog);
        dialog.active = DialogField::Column;
        dialog.handle_key(key(KeyCode::Right));
        assert_eq!(dialog.column(), TaskColumn::InProgress);

        dialog.active = DialogField::Priority;
        dialog.handle_key(key(KeyCode::Right));
        assert_eq!(dialog.priority(), TaskPriority::Hard);
        dialog.handle_key(key(KeyCode::Left));
        assert_eq!(dialog.priority(), TaskPriority::Medium);
    }

    #[test]
    fn edit_mode_preloads_task_values() {
        let task = Task {
            id: 9,
            title: "Ship".to_string(),
            description: "Board".to_string(),
            column: TaskColumn::Done,
            order: 1000.0,
            priority: TaskPriority::Low,
        };
        let dialog = TaskDialog::edit(&task);
        assert_eq!(dialog.mode(), DialogMode::Edit);
        assert_eq!(dialog.task_id(), Some(9));
        assert_eq!(dialog.title(), "Ship");
        assert_eq!(dialog.column(), TaskColumn::Done);
    }
}
