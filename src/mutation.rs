//! Optimistic mutation orchestration
//!
//! Every mutation follows the same sequence: cancel in-flight refetches for
//! the affected columns, snapshot their cached views, apply the change
//! optimistically, then issue the real request. Success invalidates the
//! affected views so a background refetch reconciles with the server;
//! failure restores the snapshots verbatim.
//!
//! The begin/commit/rollback split exists so an event loop can run the
//! synchronous bookkeeping immediately, park the `MutationGuard`, and
//! resolve it when the spawned request completes. The async drivers below
//! wrap the same steps for callers that can simply await.

use chrono::Utc;
use tracing::{debug, warn};

use crate::api::TaskApi;
use crate::cache::{TaskCache, TaskQuerySnapshot};
use crate::error::Result;
use crate::order::OrderPatch;
use crate::task::{CreateTaskInput, Task, TaskColumn, UpdateTaskInput};

/// Memento for one in-flight optimistic mutation: the captured snapshots
/// plus the columns to invalidate on success.
#[derive(Debug)]
pub struct MutationGuard {
    snapshots: Vec<TaskQuerySnapshot>,
    affected: Vec<TaskColumn>,
}

impl MutationGuard {
    pub fn affected_columns(&self) -> &[TaskColumn] {
        &self.affected
    }
}

/// A primary task update plus the optional order-only follow-up patches
/// computed over the simulated destination column.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub input: UpdateTaskInput,
    pub previous: Task,
    pub rebalance: Vec<OrderPatch>,
}

/// Columns whose cached views an update can touch: the task's previous
/// column and its target column (the same set for in-column reorders).
pub fn affected_columns(previous: &Task, input: &UpdateTaskInput) -> Vec<TaskColumn> {
    let target = input.column.unwrap_or(previous.column);
    if target == previous.column {
        vec![previous.column]
    } else {
        vec![previous.column, target]
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The transient task shown while a create is in flight. The negative id
/// cannot collide with server-assigned ids and is replaced wholesale by the
/// refetch after commit.
pub fn optimistic_create_task(input: &CreateTaskInput) -> Task {
    let stamp = now_millis();
    Task {
        id: -stamp,
        title: input.title.clone(),
        description: input.description.clone(),
        column: input.column,
        order: input.order.unwrap_or(stamp as f64),
        priority: input.priority,
    }
}

pub fn begin_create(cache: &mut TaskCache, input: &CreateTaskInput) -> MutationGuard {
    let affected = vec![input.column];
    cache.cancel_columns(&affected);
    let snapshots = cache.snapshot_columns(&affected);

    let optimistic = optimistic_create_task(input);
    cache.upsert_task(&affected, &optimistic);

    MutationGuard {
        snapshots,
        affected,
    }
}

pub fn begin_update(
    cache: &mut TaskCache,
    previous: &Task,
    input: &UpdateTaskInput,
) -> MutationGuard {
    let affected = affected_columns(previous, input);
    cache.cancel_columns(&affected);
    let snapshots = cache.snapshot_columns(&affected);

    let optimistic = input.apply_to(previous);
    cache.upsert_task(&affected, &optimistic);

    MutationGuard {
        snapshots,
        affected,
    }
}

pub fn begin_delete(cache: &mut TaskCache, task: &Task) -> MutationGuard {
    let affected = vec![task.column];
    cache.cancel_columns(&affected);
    let snapshots = cache.snapshot_columns(&affected);

    cache.remove_task(&affected, task.id);

    MutationGuard {
        snapshots,
        affected,
    }
}

/// The server confirmed: drop the snapshots and mark the affected views
/// stale so the next refetch reconciles optimistic state with truth.
pub fn commit(cache: &mut TaskCache, guard: MutationGuard) -> Vec<TaskColumn> {
    debug!(columns = ?guard.affected, "mutation committed");
    cache.invalidate_columns(&guard.affected);
    guard.affected
}

/// The server refused: restore every captured view verbatim.
pub fn rollback(cache: &mut TaskCache, guard: MutationGuard) {
    debug!(columns = ?guard.affected, "mutation rolled back");
    cache.restore(guard.snapshots);
}

/// Issue the primary update, then fire any still-relevant rebalance patches
/// concurrently. Follow-up failures are logged and accepted; they are never
/// rolled back.
pub async fn send_update<A: TaskApi + ?Sized>(api: &A, request: &UpdateRequest) -> Result<Task> {
    let updated = api.update(&request.input).await?;

    let extra: Vec<&OrderPatch> = request
        .rebalance
        .iter()
        .filter(|patch| patch.id != updated.id || patch.order != updated.order)
        .collect();
    if !extra.is_empty() {
        let inputs: Vec<UpdateTaskInput> = extra
            .iter()
            .map(|patch| UpdateTaskInput::order_only(patch.id, patch.order))
            .collect();
        let results =
            futures::future::join_all(inputs.iter().map(|input| api.update(input))).await;
        for (patch, result) in extra.iter().zip(results) {
            if let Err(err) = result {
                warn!(task_id = patch.id, error = %err, "rebalance patch failed");
            }
        }
    }

    Ok(updated)
}

/// Optimistically create a task and await the server's verdict.
pub async fn create_task<A: TaskApi + ?Sized>(
    api: &A,
    cache: &mut TaskCache,
    input: CreateTaskInput,
) -> Result<Task> {
    let guard = begin_create(cache, &input);
    match api.create(&input).await {
        Ok(task) => {
            commit(cache, guard);
            Ok(task)
        }
        Err(err) => {
            rollback(cache, guard);
            Err(err)
        }
    }
}

/// Optimistically update a task (optionally with rebalance follow-ups) and
/// await the server's verdict.
pub async fn update_task<A: TaskApi + ?Sized>(
    api: &A,
    cache: &mut TaskCache,
    request: UpdateRequest,
) -> Result<Task> {
    let guard = begin_update(cache, &request.previous, &request.input);
    match send_update(api, &request).await {
        Ok(task) => {
            commit(cache, guard);
            Ok(task)
        }
        Err(err) => {
            rollback(cache, guard);
            Err(err)
        }
    }
}

/// Optimistically delete a task and await the server's verdict.
pub async fn delete_task<A: TaskApi + ?Sized>(
    api: &A,
    cache: &mut TaskCache,
    task: &Task,
) -> Result<()> {
    let guard = begin_delete(cache, task);
    match api.delete(task.id).await {
        Ok(()) => {
            commit(cache, guard);
            Ok(())
        }
        Err(err) => {
            rollback(cache, guard);
            Err(err)
        }
    }
}
