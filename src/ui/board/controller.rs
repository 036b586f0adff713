//! Drag-and-drop resolution
//!
//! A drag gesture is a tiny state machine (`Idle` -> `Dragging` -> `Idle`;
//! cancel returns to `Idle` with no side effects). Dropping resolves to an
//! `UpdateRequest` here, synchronously and without touching the cache; the
//! caller submits it through the optimistic mutation layer.

use std::collections::HashMap;

use crate::mutation::UpdateRequest;
use crate::order::{order_between, rebalance_patches};
use crate::task::{Task, TaskColumn, UpdateTaskInput};

/// Gesture state for the card currently being dragged, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(i64),
}

impl DragState {
    pub fn start(&mut self, task_id: i64) {
        *self = DragState::Dragging(task_id);
    }

    /// Abort the gesture with no side effects.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }

    pub fn active_task(&self) -> Option<i64> {
        match self {
            DragState::Idle => None,
            DragState::Dragging(task_id) => Some(*task_id),
        }
    }

    /// End the gesture, yielding the dragged task id.
    pub fn finish(&mut self) -> Option<i64> {
        let active = self.active_task();
        *self = DragState::Idle;
        active
    }
}

/// What the drag ended on: an empty column area, or another card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Column(TaskColumn),
    Task(i64),
}

fn find_task<'a>(
    tasks_by_column: &'a HashMap<TaskColumn, Vec<Task>>,
    task_id: i64,
) -> Option<&'a Task> {
    tasks_by_column
        .values()
        .flat_map(|tasks| tasks.iter())
        .find(|task| task.id == task_id)
}

fn array_move(tasks: &[Task], from: usize, to: usize) -> Vec<Task> {
    let mut moved: Vec<Task> = tasks.to_vec();
    let task = moved.remove(from);
    let to = to.min(moved.len());
    moved.insert(to, task);
    moved
}

fn neighbor_order(tasks: &[Task], index: Option<usize>) -> Option<f64> {
    index
        .and_then(|index| tasks.get(index))
        .map(|task| task.order)
}

/// Resolve a completed drag into the update to submit, or `None` when the
/// drop is a no-op (self-target, same slot, unknown source).
pub fn resolve_drop(
    tasks_by_column: &HashMap<TaskColumn, Vec<Task>>,
    source_id: i64,
    target: DropTarget,
    min_gap: f64,
) -> Option<UpdateRequest> {
    let source_task = find_task(tasks_by_column, source_id)?.clone();
    let source_column = source_task.column;
    let empty = Vec::new();
    let source_tasks = tasks_by_column.get(&source_column).unwrap_or(&empty);
    let source_index = source_tasks
        .iter()
        .position(|task| task.id == source_task.id)?;

    let (destination_column, destination_index, target_task_id) = match target {
        DropTarget::Column(column) => {
            let index = if column == source_column {
                // Dropping on the column surface keeps the card in place at
                // the end rather than producing a pointless self-move.
                source_tasks.len().saturating_sub(1)
            } else {
                tasks_by_column.get(&column).map_or(0, Vec::len)
            };
            (column, index, None)
        }
        DropTarget::Task(task_id) => {
            let destination_task = find_task(tasks_by_column, task_id)?;
            let column = destination_task.column;
            let index = tasks_by_column
                .get(&column)
                .and_then(|tasks| tasks.iter().position(|task| task.id == task_id))
                .unwrap_or_else(|| tasks_by_column.get(&column).map_or(0, Vec::len));
            (column, index, Some(task_id))
        }
    };

    if destination_column == source_column {
        if target_task_id == Some(source_task.id) || destination_index == source_index {
            return None;
        }

        let mut reordered = array_move(source_tasks, source_index, destination_index);
        let updated_order = order_between(
            neighbor_order(&reordered, destination_index.checked_sub(1)),
            neighbor_order(&reordered, destination_index.checked_add(1)),
        );
        reordered[destination_index].order = updated_order;
        let rebalance = rebalance_patches(&reordered, min_gap);

        return Some(UpdateRequest {
            input: UpdateTaskInput::order_only(source_task.id, updated_order),
            previous: source_task,
            rebalance,
        });
    }

    let destination_tasks: Vec<Task> = tasks_by_column
        .get(&destination_column)
        .map(|tasks| {
            tasks
                .iter()
                .filter(|task| task.id != source_task.id)
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    let bounded_index = destination_index.min(destination_tasks.len());

    let updated_order = order_between(
        neighbor_order(&destination_tasks, bounded_index.checked_sub(1)),
        neighbor_order(&destination_tasks, Some(bounded_index)),
    );

    let mut preview = destination_tasks;
    preview.insert(
        bounded_index,
        Task {
            column: destination_column,
            order: updated_order,
            ..source_task.clone()
        },
    );
    let rebalance = rebalance_patches(&preview, min_gap);

    Some(UpdateRequest {
        input: UpdateTaskInput {
            id: source_task.id,
            column: Some(destination_column),
            order: Some(updated_order),
            ..UpdateTaskInput::default()
        },
        previous: source_task,
        rebalance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::MIN_ORDER_GAP;
    use crate::task::TaskPriority;

    fn task(id: i64, column: TaskColumn, order: f64) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: String::new(),
            column,
            order,
            priority: TaskPriority::Medium,
        }
    }

    fn board(columns: &[(TaskColumn, Vec<Task>)]) -> HashMap<TaskColumn, Vec<Task>> {
        columns.iter().cloned().collect()
    }

    #[test]
    fn drag_state_transitions() {
        let mut state = DragState::default();
        assert_eq!(state.active_task(), None);

        state.start(4);
        assert_eq!(state.active_task(), Some(4));

        state.cancel();
        assert_eq!(state, DragState::Idle);

        state.start(4);
        assert_eq!(state.finish(), Some(4));
        assert_eq!(state.finish(), None);
    }

    #[test]
    fn dropping_on_earlier_task_moves_before_it() {
        let tasks = board(&[(
            TaskColumn::Backlog,
            vec![
                task(1, TaskColumn::Backlog, 1000.0),
                task(2, TaskColumn::Backlog, 2000.0),
            ],
        )]);

        let request = resolve_drop(&tasks, 2, DropTarget::Task(1), MIN_ORDER_GAP).expect("move");
        assert_eq!(request.input.id, 2);
        assert_eq!(request.input.column, None);
        assert!(request.input.order.expect("order") < 1000.0);
        assert!(request.rebalance.is_empty());
    }

    #[test]
    fn dropping_on_self_or_same_slot_is_a_noop() {
        let tasks = board(&[(
            TaskColumn::Backlog,
            vec![
                task(1, TaskColumn::Backlog, 1000.0),
                task(2, TaskColumn::Backlog, 2000.0),
            ],
        )]);

        assert!(resolve_drop(&tasks, 2, DropTarget::Task(2), MIN_ORDER_GAP).is_none());
        assert!(
            resolve_drop(&tasks, 2, DropTarget::Column(TaskColumn::Backlog), MIN_ORDER_GAP)
                .is_none()
        );
    }

    #[test]
    fn dropping_on_own_column_moves_to_the_end() {
        let tasks = board(&[(
            TaskColumn::Backlog,
            vec![
                task(1, TaskColumn::Backlog, 1000.0),
                task(2, TaskColumn::Backlog, 2000.0),
                task(3, TaskColumn::Backlog, 3000.0),
            ],
        )]);

        let request = resolve_drop(&tasks, 1, DropTarget::Column(TaskColumn::Backlog), MIN_ORDER_GAP)
            .expect("move");
        // Now last: one step past task 3's order.
        assert_eq!(request.input.order, Some(4000.0));
    }

    #[test]
    fn cross_column_drop_on_task_inserts_before_it() {
        let tasks = board(&[
            (
                TaskColumn::Backlog,
                vec![task(1, TaskColumn::Backlog, 1000.0)],
            ),
            (
                TaskColumn::Review,
                vec![
                    task(2, TaskColumn::Review, 1000.0),
                    task(3, TaskColumn::Review, 2000.0),
                ],
            ),
        ]);

        let request = resolve_drop(&tasks, 1, DropTarget::Task(3), MIN_ORDER_GAP).expect("move");
        assert_eq!(request.input.column, Some(TaskColumn::Review));
        assert_eq!(request.input.order, Some(1500.0));
        assert!(request.rebalance.is_empty());
    }

    #[test]
    fn cross_column_drop_on_empty_column_appends() {
        let tasks = board(&[
            (
                TaskColumn::Backlog,
                vec![task(1, TaskColumn::Backlog, 1000.0)],
            ),
            (TaskColumn::Done, Vec::new()),
        ]);

        let request = resolve_drop(&tasks, 1, DropTarget::Column(TaskColumn::Done), MIN_ORDER_GAP)
            .expect("move");
        assert_eq!(request.input.column, Some(TaskColumn::Done));
        assert_eq!(request.input.order, Some(crate::order::ORDER_STEP));
    }

    #[test]
    fn degenerate_gaps_produce_rebalance_patches() {
        let tasks = board(&[(
            TaskColumn::Backlog,
            vec![
                task(1, TaskColumn::Backlog, 1000.0),
                task(2, TaskColumn::Backlog, 1000.000001),
                task(3, TaskColumn::Backlog, 1000.000002),
            ],
        )]);

        let request = resolve_drop(&tasks, 3, DropTarget::Task(1), MIN_ORDER_GAP).expect("move");
        assert!(!request.rebalance.is_empty());
    }

    #[test]
    fn unknown_source_resolves_to_nothing() {
        let tasks = board(&[(TaskColumn::Backlog, Vec::new())]);
        assert!(resolve_drop(&tasks, 99, DropTarget::Column(TaskColumn::Backlog), MIN_ORDER_GAP)
            .is_none());
    }
}
