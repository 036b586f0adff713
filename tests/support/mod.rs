#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use deck::api::TaskApi;
use deck::error::{Error, Result};
use deck::search::matches_task_search;
use deck::task::{CreateTaskInput, Task, TaskColumn, TaskPage, TaskPriority, UpdateTaskInput};

pub fn task(id: i64, column: TaskColumn, order: f64) -> Task {
    Task {
        id,
        title: format!("Task {id}"),
        description: format!("Description {id}"),
        column,
        order,
        priority: TaskPriority::Medium,
    }
}

struct FakeState {
    tasks: Vec<Task>,
    next_id: i64,
    fail_message: Option<String>,
    updates: Vec<UpdateTaskInput>,
    deletes: Vec<i64>,
}

/// In-memory `TaskApi` with the same list semantics as the real backend:
/// column filtering, substring search, order sorting, and paging with a
/// reported total.
pub struct FakeTaskApi {
    state: Mutex<FakeState>,
}

impl FakeTaskApi {
    pub fn new(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|task| task.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(FakeState {
                tasks,
                next_id,
                fail_message: None,
                updates: Vec::new(),
                deletes: Vec::new(),
            }),
        }
    }

    /// Every mutating call fails with this backend message.
    pub fn with_failure(tasks: Vec<Task>, message: &str) -> Self {
        let api = Self::new(tasks);
        api.state.lock().unwrap().fail_message = Some(message.to_string());
        api
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn task_by_id(&self, id: i64) -> Option<Task> {
        self.tasks().into_iter().find(|task| task.id == id)
    }

    pub fn recorded_updates(&self) -> Vec<UpdateTaskInput> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn recorded_deletes(&self) -> Vec<i64> {
        self.state.lock().unwrap().deletes.clone()
    }

    fn failure(state: &FakeState) -> Option<Error> {
        state.fail_message.as_ref().map(|message| Error::Api {
            status: Some(422),
            message: message.clone(),
        })
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn fetch_page(
        &self,
        column: TaskColumn,
        search_term: &str,
        page: u32,
        limit: usize,
    ) -> Result<TaskPage> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<Task> = state
            .tasks
            .iter()
            .filter(|task| task.column == column && matches_task_search(task, search_term))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.order.total_cmp(&b.order));

        let total = matching.len() as u64;
        let start = ((page.max(1) - 1) as usize * limit).min(matching.len());
        let end = (start + limit).min(matching.len());
        let items = matching[start..end].to_vec();
        let has_more = (page as u64) * (limit as u64) < total;

        Ok(TaskPage {
            items,
            page,
            limit,
            total: Some(total),
            has_more,
        })
    }

    async fn create(&self, input: &CreateTaskInput) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = Self::failure(&state) {
            return Err(err);
        }

        let id = state.next_id;
        state.next_id += 1;
        let task = Task {
            id,
            title: input.title.clone(),
            description: input.description.clone(),
            column: input.column,
            order: input.order.unwrap_or(0.0),
            priority: input.priority,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, input: &UpdateTaskInput) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = Self::failure(&state) {
            return Err(err);
        }

        state.updates.push(input.clone());
        let Some(position) = state.tasks.iter().position(|task| task.id == input.id) else {
            return Err(Error::Api {
                status: Some(404),
                message: format!("task {} not found", input.id),
            });
        };
        let updated = input.apply_to(&state.tasks[position]);
        state.tasks[position] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = Self::failure(&state) {
            return Err(err);
        }

        state.deletes.push(id);
        state.tasks.retain(|task| task.id != id);
        Ok(())
    }
}
