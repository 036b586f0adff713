//! Task subcommands: list, add, edit, mv, rm.
//!
//! Every mutating command goes through the same optimistic cache path the
//! board uses: warm the affected column views, apply the change through the
//! mutation layer, and report what the server confirmed.

use std::collections::HashMap;

use tracing::debug;

use crate::api::TaskApi;
use crate::cache::TaskCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::mutation::{self, UpdateRequest};
use crate::order::{bottom_insert_order, top_insert_order};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::query::TaskListKey;
use crate::task::{
    validate_description, validate_title, CreateTaskInput, Task, TaskColumn, TaskPriority,
    UpdateTaskInput, TASK_COLUMNS,
};
use crate::ui::board::controller::{resolve_drop, DropTarget};

/// Hard cap on pages pulled per column, in case the backend never reports a
/// total and keeps returning exactly full pages.
const MAX_LIST_PAGES: u32 = 50;

pub(crate) fn parse_column(value: &str) -> Result<TaskColumn> {
    value.parse().map_err(|()| {
        Error::InvalidArgument(format!(
            "unknown column '{value}' (expected backlog, in_progress, review, or done)"
        ))
    })
}

pub(crate) fn parse_priority(value: &str) -> Result<TaskPriority> {
    value.parse().map_err(|()| {
        Error::InvalidArgument(format!(
            "unknown priority '{value}' (expected low, medium, or hard)"
        ))
    })
}

/// Pull every loaded page of a column into the cache, exactly as the board
/// would have it after scrolling to the end.
async fn warm_column(
    api: &dyn TaskApi,
    cache: &mut TaskCache,
    column: TaskColumn,
    search_term: &str,
    page_size: usize,
) -> Result<()> {
    let key = TaskListKey::new(column, search_term, page_size);
    let mut page = 1u32;
    loop {
        let generation = cache.begin_fetch(&key);
        let fetched = api.fetch_page(column, search_term, page, page_size).await?;
        let has_more = fetched.has_more;
        cache.complete_fetch(&key, generation, fetched);
        if !has_more || page >= MAX_LIST_PAGES {
            break;
        }
        page += 1;
    }
    debug!(%key, pages = page, "warmed column view");
    Ok(())
}

async fn warm_columns(
    api: &dyn TaskApi,
    cache: &mut TaskCache,
    columns: &[TaskColumn],
    page_size: usize,
) -> Result<()> {
    for column in columns {
        warm_column(api, cache, *column, "", page_size).await?;
    }
    Ok(())
}

async fn find_task(api: &dyn TaskApi, config: &Config, task_id: i64) -> Result<(TaskCache, Task)> {
    let mut cache = TaskCache::new();
    let page_size = config.board.page_size;
    for column in TASK_COLUMNS {
        warm_column(api, &mut cache, column, "", page_size).await?;
        let key = TaskListKey::new(column, "", page_size);
        if let Some(task) = cache
            .tasks_for(&key)
            .into_iter()
            .find(|task| task.id == task_id)
        {
            return Ok((cache, task));
        }
    }
    Err(Error::TaskNotFound(task_id))
}

fn task_detail_line(task: &Task) -> String {
    format!(
        "#{:<6} [{}] {} ({})",
        task.id,
        task.column.as_str(),
        task.title,
        task.priority
    )
}

fn task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("id", task.id.to_string());
    human.push_summary("title", task.title.clone());
    human.push_summary("column", task.column.as_str().to_string());
    human.push_summary("priority", task.priority.to_string());
}

pub async fn run_ls(
    api: &dyn TaskApi,
    options: OutputOptions,
    config: &Config,
    column: Option<TaskColumn>,
    search: &str,
) -> Result<()> {
    let columns: Vec<TaskColumn> = match column {
        Some(column) => vec![column],
        None => TASK_COLUMNS.to_vec(),
    };

    let mut cache = TaskCache::new();
    let page_size = config.board.page_size;
    let mut tasks: Vec<Task> = Vec::new();
    let mut human = HumanOutput::new("Tasks");
    for column in &columns {
        warm_column(api, &mut cache, *column, search, page_size).await?;
        let key = TaskListKey::new(*column, search, page_size);
        let column_tasks = cache.tasks_for(&key);
        human.push_summary(column.title(), column_tasks.len().to_string());
        tasks.extend(column_tasks);
    }

    for task in &tasks {
        human.push_detail(task_detail_line(task));
    }

    emit_success(options, "ls", &tasks, Some(&human))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_add(
    api: &dyn TaskApi,
    options: OutputOptions,
    config: &Config,
    title: String,
    description: String,
    column: TaskColumn,
    priority: TaskPriority,
    bottom: bool,
) -> Result<()> {
    validate_title(&title).map_err(Error::InvalidArgument)?;
    validate_description(&description).map_err(Error::InvalidArgument)?;

    let mut cache = TaskCache::new();
    warm_columns(api, &mut cache, &[column], config.board.page_size).await?;
    let key = TaskListKey::new(column, "", config.board.page_size);
    let existing = cache.tasks_for(&key);
    let order = if bottom {
        bottom_insert_order(&existing)
    } else {
        top_insert_order(&existing)
    };

    let input = CreateTaskInput {
        title: title.trim().to_string(),
        description: description.trim().to_string(),
        column,
        priority,
        order: Some(order),
    };
    let created = mutation::create_task(api, &mut cache, input).await?;

    let mut human = HumanOutput::new(format!("Created task #{}", created.id));
    task_summary(&mut human, &created);
    emit_success(options, "add", &created, Some(&human))
}

#[allow(clippy::too_many_arguments)]
pub async fn run_edit(
    api: &dyn TaskApi,
    options: OutputOptions,
    config: &Config,
    task_id: i64,
    title: Option<String>,
    description: Option<String>,
    column: Option<TaskColumn>,
    priority: Option<TaskPriority>,
) -> Result<()> {
    if title.is_none() && description.is_none() && column.is_none() && priority.is_none() {
        return Err(Error::InvalidArgument(
            "nothing to change; pass --title, --description, --column, or --priority".to_string(),
        ));
    }
    if let Some(title) = &title {
        validate_title(title).map_err(Error::InvalidArgument)?;
    }
    if let Some(description) = &description {
        validate_description(description).map_err(Error::InvalidArgument)?;
    }

    let (mut cache, previous) = find_task(api, config, task_id).await?;
    let input = UpdateTaskInput {
        id: task_id,
        title: title.map(|value| value.trim().to_string()),
        description: description.map(|value| value.trim().to_string()),
        column,
        priority,
        order: None,
    };

    let request = UpdateRequest {
        input,
        previous,
        rebalance: Vec::new(),
    };
    let updated = mutation::update_task(api, &mut cache, request).await?;

    let mut human = HumanOutput::new(format!("Updated task #{}", updated.id));
    task_summary(&mut human, &updated);
    emit_success(options, "edit", &updated, Some(&human))
}

pub async fn run_mv(
    api: &dyn TaskApi,
    options: OutputOptions,
    config: &Config,
    task_id: i64,
    column: Option<TaskColumn>,
    before: Option<i64>,
) -> Result<()> {
    let (mut cache, previous) = find_task(api, config, task_id).await?;
    let destination = column.unwrap_or(previous.column);
    warm_columns(
        api,
        &mut cache,
        &[previous.column, destination],
        config.board.page_size,
    )
    .await?;

    let board: HashMap<TaskColumn, Vec<Task>> = TASK_COLUMNS
        .iter()
        .map(|column| {
            let key = TaskListKey::new(*column, "", config.board.page_size);
            (*column, cache.tasks_for(&key))
        })
        .collect();

    let target = match before {
        Some(anchor) => {
            let exists = board
                .values()
                .flatten()
                .any(|task| task.id == anchor && task.column == destination);
            if !exists {
                return Err(Error::InvalidArgument(format!(
                    "task #{anchor} is not in the {} column",
                    destination.as_str()
                )));
            }
            DropTarget::Task(anchor)
        }
        None => DropTarget::Column(destination),
    };

    let Some(request) = resolve_drop(&board, task_id, target, config.order.min_gap) else {
        let mut human = HumanOutput::new(format!("Task #{task_id} is already in place"));
        task_summary(&mut human, &previous);
        return emit_success(options, "mv", &previous, Some(&human));
    };

    let rebalanced = request.rebalance.len();
    let moved = mutation::update_task(api, &mut cache, request).await?;

    let mut human = HumanOutput::new(format!("Moved task #{}", moved.id));
    task_summary(&mut human, &moved);
    if rebalanced > 0 {
        human.push_detail(format!("renumbered {rebalanced} tasks in the column"));
    }
    emit_success(options, "mv", &moved, Some(&human))
}

pub async fn run_rm(
    api: &dyn TaskApi,
    options: OutputOptions,
    config: &Config,
    task_id: i64,
) -> Result<()> {
    let (mut cache, task) = find_task(api, config, task_id).await?;
    mutation::delete_task(api, &mut cache, &task).await?;

    let mut human = HumanOutput::new(format!("Deleted task #{}", task.id));
    task_summary(&mut human, &task);
    emit_success(options, "rm", &task, Some(&human))
}
