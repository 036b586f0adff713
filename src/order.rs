//! Fractional ordering for drag-and-drop
//!
//! Each task carries a real-valued `order` key; moving a card assigns the
//! midpoint of its new neighbors so no other row has to be rewritten.
//! Repeated bisection eventually exhausts usable float precision, at which
//! point the whole column is renumbered with evenly spaced keys.

use crate::task::Task;

/// Spacing between freshly assigned order keys.
pub const ORDER_STEP: f64 = 1000.0;

/// Smallest tolerated gap between adjacent order keys before a rebalance.
pub const MIN_ORDER_GAP: f64 = 0.00001;

/// An order-only follow-up update for one task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPatch {
    pub id: i64,
    pub order: f64,
}

/// Order key for a slot between two neighbors, either of which may be
/// missing (start/end of column, or an empty column).
pub fn order_between(previous: Option<f64>, next: Option<f64>) -> f64 {
    match (previous, next) {
        (Some(previous), Some(next)) => (previous + next) / 2.0,
        (Some(previous), None) => previous + ORDER_STEP,
        (None, Some(next)) => next - ORDER_STEP,
        (None, None) => ORDER_STEP,
    }
}

fn finite_orders(tasks: &[Task]) -> impl Iterator<Item = f64> + '_ {
    tasks
        .iter()
        .map(|task| task.order)
        .filter(|order| order.is_finite())
}

/// Order key placing a new task above everything in the column.
pub fn top_insert_order(tasks: &[Task]) -> f64 {
    finite_orders(tasks)
        .fold(None::<f64>, |min, order| {
            Some(min.map_or(order, |value| value.min(order)))
        })
        .map(|min| min - ORDER_STEP)
        .unwrap_or(ORDER_STEP)
}

/// Order key placing a new task below everything in the column.
pub fn bottom_insert_order(tasks: &[Task]) -> f64 {
    finite_orders(tasks)
        .fold(None::<f64>, |max, order| {
            Some(max.map_or(order, |value| value.max(order)))
        })
        .map(|max| max + ORDER_STEP)
        .unwrap_or(ORDER_STEP)
}

fn sorted_by_order(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.order.total_cmp(&b.order));
    sorted
}

/// True when any two order-adjacent tasks sit closer than `min_gap`,
/// signalling that midpoint bisection has run out of precision.
pub fn should_rebalance(tasks: &[Task], min_gap: f64) -> bool {
    if tasks.len() < 2 {
        return false;
    }

    let sorted = sorted_by_order(tasks);
    sorted
        .windows(2)
        .any(|pair| pair[1].order - pair[0].order < min_gap)
}

/// Renumber the column with evenly spaced keys when bisection has
/// degenerated. Works over the full current in-column ordering, since one
/// move can force a global renumbering; tasks whose key would not change
/// are omitted from the result.
pub fn rebalance_patches(tasks: &[Task], min_gap: f64) -> Vec<OrderPatch> {
    if !should_rebalance(tasks, min_gap) {
        return Vec::new();
    }

    sorted_by_order(tasks)
        .iter()
        .enumerate()
        .map(|(index, task)| OrderPatch {
            id: task.id,
            order: (index as f64 + 1.0) * ORDER_STEP,
        })
        .filter(|patch| {
            tasks
                .iter()
                .find(|task| task.id == patch.id)
                .map(|task| task.order != patch.order)
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskColumn, TaskPriority};

    fn task(id: i64, order: f64) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: String::new(),
            column: TaskColumn::Backlog,
            order,
            priority: TaskPriority::Medium,
        }
    }

    #[test]
    fn midpoint_when_both_neighbors_exist() {
        assert_eq!(order_between(Some(1000.0), Some(3000.0)), 2000.0);
    }

    #[test]
    fn steps_past_a_single_neighbor() {
        assert_eq!(order_between(Some(4000.0), None), 4000.0 + ORDER_STEP);
        assert_eq!(order_between(None, Some(2000.0)), 2000.0 - ORDER_STEP);
        assert_eq!(order_between(None, None), ORDER_STEP);
    }

    #[test]
    fn top_insert_goes_before_the_minimum() {
        let tasks = vec![task(1, 1000.0), task(2, 3000.0)];
        assert_eq!(top_insert_order(&tasks), 0.0);
        assert_eq!(top_insert_order(&[]), ORDER_STEP);
    }

    #[test]
    fn bottom_insert_goes_after_the_maximum() {
        let tasks = vec![task(1, 1000.0), task(2, 3000.0)];
        assert_eq!(bottom_insert_order(&tasks), 4000.0);
        assert_eq!(bottom_insert_order(&[]), ORDER_STEP);
    }

    #[test]
    fn insert_helpers_skip_non_finite_orders() {
        let tasks = vec![task(1, f64::NAN), task(2, 2000.0)];
        assert_eq!(top_insert_order(&tasks), 1000.0);
        assert_eq!(bottom_insert_order(&tasks), 3000.0);
    }

    #[test]
    fn no_rebalance_while_gaps_are_healthy() {
        let tasks = vec![task(1, 1000.0), task(2, 2000.0), task(3, 3000.0)];
        assert!(!should_rebalance(&tasks, MIN_ORDER_GAP));
        assert!(rebalance_patches(&tasks, MIN_ORDER_GAP).is_empty());
    }

    #[test]
    fn rebalance_renumbers_and_skips_unchanged_keys() {
        let tasks = vec![
            task(1, 1000.0),
            task(2, 1000.000001),
            task(3, 1000.000002),
        ];
        let patches = rebalance_patches(&tasks, MIN_ORDER_GAP);

        // Task 1 already sits at 1000, so only 2 and 3 get patches.
        assert_eq!(
            patches,
            vec![
                OrderPatch {
                    id: 2,
                    order: 2000.0
                },
                OrderPatch {
                    id: 3,
                    order: 3000.0
                },
            ]
        );
    }

    #[test]
    fn rebalance_is_deterministic_over_the_sorted_column() {
        let tasks = vec![task(3, 5.0), task(1, 5.000001), task(2, 4.0)];
        let patches = rebalance_patches(&tasks, MIN_ORDER_GAP);
        assert_eq!(
            patches,
            vec![
                OrderPatch {
                    id: 2,
                    order: 1000.0
                },
                OrderPatch {
                    id: 3,
                    order: 2000.0
                },
                OrderPatch {
                    id: 1,
                    order: 3000.0
                },
            ]
        );
    }
}
