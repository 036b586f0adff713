//! Cached column views and optimistic reconciliation
//!
//! `PagedTasks` reshapes already-fetched pages around a single task change
//! without touching the network. `TaskCache` is the key-value store owning
//! every `(column, search term, page size)` view; it is passed explicitly
//! to the mutation layer rather than living behind a global.

use std::collections::HashMap;

use crate::query::TaskListKey;
use crate::search::matches_task_search;
use crate::task::{Task, TaskColumn, TaskPage};

/// Pages of one column view, in fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagedTasks {
    pub pages: Vec<TaskPage>,
}

impl PagedTasks {
    /// Canonical read view: all page items concatenated in page order.
    pub fn flatten(&self) -> Vec<Task> {
        self.pages
            .iter()
            .flat_map(|page| page.items.iter().cloned())
            .collect()
    }

    /// Authoritative total when the backend reported one.
    pub fn total(&self) -> Option<u64> {
        self.pages.first().and_then(|page| page.total)
    }

    pub fn has_more(&self) -> bool {
        self.pages.last().map(|page| page.has_more).unwrap_or(false)
    }

    /// Redistribute a flattened task list back into the same number of
    /// pages at the view's page size. Anything beyond the loaded capacity
    /// is dropped from the view, not retained.
    fn rebuild(&self, tasks: Vec<Task>, key: &TaskListKey, total_override: Option<u64>) -> Self {
        if self.pages.is_empty() {
            return self.clone();
        }

        let page_size = key.page_size;
        let capacity = self.pages.len() * page_size;
        let visible = &tasks[..tasks.len().min(capacity)];

        let pages = self
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let start = (index * page_size).min(visible.len());
                let end = (start + page_size).min(visible.len());
                let items = visible[start..end].to_vec();
                let total = total_override.or(page.total);
                let has_more = match total {
                    Some(total) => (((index + 1) * page_size) as u64) < total,
                    None => items.len() == page_size,
                };

                TaskPage {
                    items,
                    page: index as u32 + 1,
                    limit: page_size,
                    total,
                    has_more,
                }
            })
            .collect();

        Self { pages }
    }

    /// Re-seat one task in this view after a mutation.
    ///
    /// Membership is decided client-side: the task must belong to the
    /// view's column and still match its search term. A known total is
    /// adjusted only when membership actually changed.
    pub fn upsert(&self, key: &TaskListKey, task: &Task) -> Self {
        let current = self.flatten();
        let had_task = current.iter().any(|item| item.id == task.id);
        let include_task =
            task.column == key.column && matches_task_search(task, &key.search_term);

        let mut next: Vec<Task> = current
            .into_iter()
            .filter(|item| item.id != task.id)
            .collect();
        if include_task {
            next.push(task.clone());
        }
        next.sort_by(|a, b| a.order.total_cmp(&b.order));

        let next_total = self.total().map(|total| {
            if !had_task && include_task {
                total + 1
            } else if had_task && !include_task {
                total.saturating_sub(1)
            } else {
                total
            }
        });

        self.rebuild(next, key, next_total)
    }

    /// Drop a task from this view. A no-op (by value) when the id is not
    /// currently loaded.
    pub fn remove(&self, key: &TaskListKey, task_id: i64) -> Self {
        let current = self.flatten();
        if !current.iter().any(|item| item.id == task_id) {
            return self.clone();
        }

        let next: Vec<Task> = current
            .into_iter()
            .filter(|item| item.id != task_id)
            .collect();
        let next_total = self.total().map(|total| total.saturating_sub(1));

        self.rebuild(next, key, next_total)
    }
}

/// Verbatim capture of one cached view, restored on mutation failure.
#[derive(Debug, Clone)]
pub struct TaskQuerySnapshot {
    pub key: TaskListKey,
    pub data: PagedTasks,
}

#[derive(Debug, Default)]
struct CachedView {
    data: PagedTasks,
    stale: bool,
    /// Bumped to cancel in-flight fetches; a completion carrying an older
    /// generation is dropped instead of clobbering newer state.
    generation: u64,
}

/// The query store: every cached column view, keyed by `TaskListKey`.
#[derive(Debug, Default)]
pub struct TaskCache {
    views: HashMap<TaskListKey, CachedView>,
}

fn unique_columns(columns: &[TaskColumn]) -> Vec<TaskColumn> {
    let mut unique = Vec::new();
    for column in columns {
        if !unique.contains(column) {
            unique.push(*column);
        }
    }
    unique
}

impl TaskCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TaskListKey) -> Option<&PagedTasks> {
        self.views.get(key).map(|view| &view.data)
    }

    /// Flattened visible task list for a view; empty when nothing is cached.
    pub fn tasks_for(&self, key: &TaskListKey) -> Vec<Task> {
        self.get(key).map(PagedTasks::flatten).unwrap_or_default()
    }

    /// Column count surfaced to the view layer: the authoritative total
    /// when known, else however many tasks are loaded.
    pub fn count_for(&self, key: &TaskListKey) -> u64 {
        match self.get(key) {
            Some(data) => data
                .total()
                .unwrap_or_else(|| data.flatten().len() as u64),
            None => 0,
        }
    }

    pub fn has_more(&self, key: &TaskListKey) -> bool {
        self.get(key).map(PagedTasks::has_more).unwrap_or(false)
    }

    pub fn loaded_pages(&self, key: &TaskListKey) -> u32 {
        self.get(key).map(|data| data.pages.len() as u32).unwrap_or(0)
    }

    pub fn is_stale(&self, key: &TaskListKey) -> bool {
        self.views.get(key).map(|view| view.stale).unwrap_or(false)
    }

    /// Keys of every cached view belonging to the given columns.
    pub fn views_for_columns(&self, columns: &[TaskColumn]) -> Vec<TaskListKey> {
        let columns = unique_columns(columns);
        self.views
            .keys()
            .filter(|key| columns.contains(&key.column))
            .cloned()
            .collect()
    }

    /// Register an outgoing fetch for this view and return the generation
    /// the completion must present to be accepted.
    pub fn begin_fetch(&mut self, key: &TaskListKey) -> u64 {
        self.views.entry(key.clone()).or_default().generation
    }

    /// Install a fetched page. Returns false (and changes nothing) when the
    /// fetch was cancelled by a later `cancel_columns` call.
    pub fn complete_fetch(&mut self, key: &TaskListKey, generation: u64, page: TaskPage) -> bool {
        let Some(view) = self.views.get_mut(key) else {
            return false;
        };
        if view.generation != generation {
            return false;
        }

        let index = page.page.saturating_sub(1) as usize;
        if index < view.data.pages.len() {
            view.data.pages[index] = page;
        } else if index == view.data.pages.len() {
            view.data.pages.push(page);
        } else {
            return false;
        }
        view.stale = false;
        true
    }

    /// Cancel in-flight fetches for the given columns so a stale response
    /// cannot overwrite an optimistic patch.
    pub fn cancel_columns(&mut self, columns: &[TaskColumn]) {
        let columns = unique_columns(columns);
        for (key, view) in self.views.iter_mut() {
            if columns.contains(&key.column) {
                view.generation += 1;
            }
        }
    }

    /// Mark every view of the given columns stale. Refetching is the
    /// owner's responsibility; reconciliation itself never touches the
    /// network.
    pub fn invalidate_columns(&mut self, columns: &[TaskColumn]) {
        let columns = unique_columns(columns);
        for (key, view) in self.views.iter_mut() {
            if columns.contains(&key.column) {
                view.stale = true;
            }
        }
    }

    pub fn stale_keys(&self) -> Vec<TaskListKey> {
        self.views
            .iter()
            .filter(|(_, view)| view.stale)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Capture the current state of every view in the given columns.
    pub fn snapshot_columns(&self, columns: &[TaskColumn]) -> Vec<TaskQuerySnapshot> {
        self.views_for_columns(columns)
            .into_iter()
            .filter_map(|key| {
                self.get(&key).map(|data| TaskQuerySnapshot {
                    data: data.clone(),
                    key,
                })
            })
            .collect()
    }

    /// Restore previously captured snapshots verbatim.
    pub fn restore(&mut self, snapshots: Vec<TaskQuerySnapshot>) {
        for snapshot in snapshots {
            if let Some(view) = self.views.get_mut(&snapshot.key) {
                view.data = snapshot.data;
            }
        }
    }

    /// Apply an optimistic upsert to every cached view of the given columns.
    pub fn upsert_task(&mut self, columns: &[TaskColumn], task: &Task) {
        for key in self.views_for_columns(columns) {
            if let Some(view) = self.views.get_mut(&key) {
                view.data = view.data.upsert(&key, task);
            }
        }
    }

    /// Apply an optimistic removal to every cached view of the given columns.
    pub fn remove_task(&mut self, columns: &[TaskColumn], task_id: i64) {
        for key in self.views_for_columns(columns) {
            if let Some(view) = self.views.get_mut(&key) {
                view.data = view.data.remove(&key, task_id);
            }
        }
    }
}
