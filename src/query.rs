//! Cache keys for column list queries
//!
//! A cached view is identified by the `(column, search term, page size)`
//! triple. The string codec exists for logs and diagnostics; the typed key
//! is what the cache is actually indexed by.

use std::fmt;

use crate::task::TaskColumn;

const KEY_PREFIX: &str = "tasks/list/";

/// Identity of one cached, filtered, paginated column view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskListKey {
    pub column: TaskColumn,
    pub search_term: String,
    pub page_size: usize,
}

impl TaskListKey {
    pub fn new(column: TaskColumn, search_term: impl Into<String>, page_size: usize) -> Self {
        Self {
            column,
            search_term: search_term.into(),
            page_size,
        }
    }
}

impl fmt::Display for TaskListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{KEY_PREFIX}{}?q={}&limit={}",
            self.column, self.search_term, self.page_size
        )
    }
}

/// Parse the string form back into a key. Returns `None` for anything that
/// does not match the exact shape `tasks/list/<column>?q=<term>&limit=<n>`.
pub fn parse_task_list_key(value: &str) -> Option<TaskListKey> {
    let rest = value.strip_prefix(KEY_PREFIX)?;
    let (column, query) = rest.split_once('?')?;
    let column: TaskColumn = column.parse().ok()?;

    let query = query.strip_prefix("q=")?;
    let (search_term, limit) = query.rsplit_once("&limit=")?;
    let page_size: usize = limit.parse().ok()?;

    Some(TaskListKey::new(column, search_term, page_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_parse_round_trip() {
        let key = TaskListKey::new(TaskColumn::InProgress, "login bug", 10);
        let encoded = key.to_string();
        assert_eq!(encoded, "tasks/list/in_progress?q=login bug&limit=10");
        assert_eq!(parse_task_list_key(&encoded), Some(key));
    }

    #[test]
    fn empty_search_term_round_trips() {
        let key = TaskListKey::new(TaskColumn::Done, "", 25);
        assert_eq!(parse_task_list_key(&key.to_string()), Some(key));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(parse_task_list_key("tasks/list/backlog"), None);
        assert_eq!(parse_task_list_key("tasks/list/doing?q=&limit=10"), None);
        assert_eq!(parse_task_list_key("tasks/list/backlog?q=x&limit=ten"), None);
        assert_eq!(parse_task_list_key("leases/list/backlog?q=&limit=10"), None);
    }
}
