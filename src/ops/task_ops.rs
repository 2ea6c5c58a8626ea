use chrono::Utc;

use crate::model::task::{Priority, Task};

/// Where to insert a task in a note's sequence
#[derive(Debug, Clone)]
pub enum InsertPosition {
    /// Append to end of the sequence
    End,
    /// Insert after the task with this id
    After(String),
}

// ---------------------------------------------------------------------------
// Indentation
// ---------------------------------------------------------------------------

/// Increase the task's indent level by 1, capped at one deeper than the
/// task immediately before it. The first task in a sequence can never
/// indent. Unknown ids and already-maximal tasks return the input
/// unchanged.
pub fn indent(tasks: &[Task], task_id: &str) -> Vec<Task> {
    let Some(idx) = position_of(tasks, task_id) else {
        return tasks.to_vec();
    };
    if idx == 0 {
        return tasks.to_vec();
    }
    let max_level = tasks[idx - 1].indent_level + 1;
    if tasks[idx].indent_level >= max_level {
        return tasks.to_vec();
    }
    let mut next = tasks.to_vec();
    next[idx].indent_level += 1;
    next
}

/// Decrease the task's indent level by 1, floored at 0.
pub fn outdent(tasks: &[Task], task_id: &str) -> Vec<Task> {
    let Some(idx) = position_of(tasks, task_id) else {
        return tasks.to_vec();
    };
    if tasks[idx].indent_level == 0 {
        return tasks.to_vec();
    }
    let mut next = tasks.to_vec();
    next[idx].indent_level -= 1;
    next
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Move the task to `target_index` within the sequence.
///
/// Indented children do NOT travel with the task: each task's indent level
/// is independent metadata, so moving a parent away from its children
/// visually promotes the orphans. That is deliberate and preserved.
pub fn reorder(tasks: &[Task], task_id: &str, target_index: usize) -> Vec<Task> {
    let Some(idx) = position_of(tasks, task_id) else {
        return tasks.to_vec();
    };
    let mut next = tasks.to_vec();
    let task = next.remove(idx);
    let target = target_index.min(next.len());
    next.insert(target, task);
    next
}

/// Insert a task at the given position. A stale `After` id falls back to
/// appending at the end rather than dropping the task. Levels are clamped
/// afterwards so the insertion cannot orphan deeper successors.
pub fn insert(tasks: &[Task], task: Task, position: &InsertPosition) -> Vec<Task> {
    let mut next = tasks.to_vec();
    match position {
        InsertPosition::End => next.push(task),
        InsertPosition::After(after_id) => match position_of(&next, after_id) {
            Some(idx) => next.insert(idx + 1, task),
            None => next.push(task),
        },
    }
    normalize_levels(&mut next);
    next
}

/// Remove the task, returning the remainder and the removed task (the
/// reducer transitions it to the archive). The remainder is re-clamped:
/// removing a parent must not leave children indented past their new
/// predecessor. The removed task keeps its original fields.
pub fn remove(tasks: &[Task], task_id: &str) -> (Vec<Task>, Option<Task>) {
    let Some(idx) = position_of(tasks, task_id) else {
        return (tasks.to_vec(), None);
    };
    let mut next = tasks.to_vec();
    let removed = next.remove(idx);
    normalize_levels(&mut next);
    (next, Some(removed))
}

/// Clamp each task to at most one level deeper than its predecessor,
/// walking forward so clamps cascade. Used after insert and remove;
/// deliberately NOT applied to reorder, where orphaned indentation is the
/// intended behavior.
pub fn normalize_levels(tasks: &mut [Task]) {
    let mut prev_level = 0usize;
    for (idx, task) in tasks.iter_mut().enumerate() {
        let max = if idx == 0 { 0 } else { prev_level + 1 };
        if task.indent_level > max {
            task.indent_level = max;
        }
        prev_level = task.indent_level;
    }
}

// ---------------------------------------------------------------------------
// Field updates
// ---------------------------------------------------------------------------

pub fn set_priority(tasks: &[Task], task_id: &str, priority: Priority) -> Vec<Task> {
    update(tasks, task_id, |task| task.priority = priority)
}

/// Flip completion, maintaining `completed_at`.
pub fn toggle_complete(tasks: &[Task], task_id: &str) -> Vec<Task> {
    update(tasks, task_id, |task| {
        task.completed = !task.completed;
        task.completed_at = if task.completed {
            Some(Utc::now())
        } else {
            None
        };
    })
}

pub fn update_text(tasks: &[Task], task_id: &str, text: &str) -> Vec<Task> {
    update(tasks, task_id, |task| task.text = text.to_string())
}

/// Apply a single-task edit, returning the input unchanged when the id is
/// absent (stale references are expected, not errors).
fn update(tasks: &[Task], task_id: &str, f: impl FnOnce(&mut Task)) -> Vec<Task> {
    let Some(idx) = position_of(tasks, task_id) else {
        return tasks.to_vec();
    };
    let mut next = tasks.to_vec();
    f(&mut next[idx]);
    next
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn position_of(tasks: &[Task], task_id: &str) -> Option<usize> {
    tasks.iter().position(|t| t.id == task_id)
}

/// The deepest level a task appended after `tasks` may carry.
pub fn max_append_level(tasks: &[Task]) -> usize {
    tasks.last().map_or(0, |t| t.indent_level + 1)
}

/// True when no task is indented more than one deeper than its
/// predecessor.
pub fn holds_indent_invariant(tasks: &[Task]) -> bool {
    let mut prev_level = 0usize;
    for (idx, task) in tasks.iter().enumerate() {
        let max = if idx == 0 { 0 } else { prev_level + 1 };
        if task.indent_level > max {
            return false;
        }
        prev_level = task.indent_level;
    }
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task_with(id: &str, text: &str, level: usize) -> Task {
        let mut task = Task::new(text);
        task.id = id.to_string();
        task.indent_level = level;
        task
    }

    fn groceries() -> Vec<Task> {
        vec![
            task_with("t-milk", "Milk", 0),
            task_with("t-eggs", "Eggs", 0),
            task_with("t-bread", "Bread", 0),
        ]
    }

    fn levels(tasks: &[Task]) -> Vec<usize> {
        tasks.iter().map(|t| t.indent_level).collect()
    }

    // --- Indent / outdent ---

    #[test]
    fn indent_nests_under_previous_task() {
        let tasks = indent(&groceries(), "t-eggs");
        assert_eq!(levels(&tasks), vec![0, 1, 0]);
    }

    #[test]
    fn indent_is_capped_at_previous_plus_one() {
        let tasks = indent(&groceries(), "t-eggs");
        // Second indent would exceed Milk's level + 1
        let tasks = indent(&tasks, "t-eggs");
        assert_eq!(levels(&tasks), vec![0, 1, 0]);
    }

    #[test]
    fn first_task_cannot_indent() {
        let tasks = indent(&groceries(), "t-milk");
        assert_eq!(levels(&tasks), vec![0, 0, 0]);
    }

    #[test]
    fn indent_missing_id_is_noop() {
        let before = groceries();
        let after = indent(&before, "t-gone");
        assert_eq!(after, before);
    }

    #[test]
    fn outdent_floors_at_zero() {
        let tasks = indent(&groceries(), "t-eggs");
        let tasks = outdent(&tasks, "t-eggs");
        assert_eq!(levels(&tasks), vec![0, 0, 0]);
        // Second outdent is a no-op
        let tasks = outdent(&tasks, "t-eggs");
        assert_eq!(levels(&tasks), vec![0, 0, 0]);
    }

    #[test]
    fn indent_does_not_mutate_input() {
        let before = groceries();
        let _ = indent(&before, "t-eggs");
        assert_eq!(levels(&before), vec![0, 0, 0]);
    }

    // --- Reorder ---

    #[test]
    fn reorder_moves_task_only() {
        let tasks = vec![
            task_with("t-a", "Parent", 0),
            task_with("t-b", "Child", 1),
            task_with("t-c", "Other", 0),
        ];
        // Moving the parent to the end orphans the child; its stored level
        // stays 1 and is still legal behind "Other"
        let tasks = reorder(&tasks, "t-a", 2);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-b", "t-c", "t-a"]);
        assert_eq!(tasks[0].indent_level, 1);
    }

    #[test]
    fn reorder_clamps_out_of_range_index() {
        let tasks = reorder(&groceries(), "t-milk", 99);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t-eggs", "t-bread", "t-milk"]);
    }

    #[test]
    fn reorder_missing_id_is_noop() {
        let before = groceries();
        assert_eq!(reorder(&before, "t-gone", 0), before);
    }

    // --- Insert / remove ---

    #[test]
    fn insert_at_end() {
        let tasks = insert(&groceries(), task_with("t-jam", "Jam", 0), &InsertPosition::End);
        assert_eq!(tasks.last().unwrap().id, "t-jam");
        assert_eq!(tasks.len(), 4);
    }

    #[test]
    fn insert_after_task() {
        let tasks = insert(
            &groceries(),
            task_with("t-jam", "Jam", 0),
            &InsertPosition::After("t-milk".into()),
        );
        assert_eq!(tasks[1].id, "t-jam");
    }

    #[test]
    fn insert_after_stale_id_appends() {
        let tasks = insert(
            &groceries(),
            task_with("t-jam", "Jam", 0),
            &InsertPosition::After("t-gone".into()),
        );
        assert_eq!(tasks.last().unwrap().id, "t-jam");
    }

    #[test]
    fn remove_returns_remainder_and_task() {
        let (rest, removed) = remove(&groceries(), "t-milk");
        assert_eq!(rest.len(), 2);
        assert_eq!(removed.unwrap().text, "Milk");
    }

    #[test]
    fn remove_reclamps_orphaned_children() {
        let tasks = vec![
            task_with("t-a", "Parent", 0),
            task_with("t-b", "Child", 1),
            task_with("t-c", "Grandchild", 2),
        ];
        let (rest, removed) = remove(&tasks, "t-b");
        assert_eq!(removed.unwrap().indent_level, 1);
        // Grandchild clamps to Parent's level + 1
        assert_eq!(levels(&rest), vec![0, 1]);
        assert!(holds_indent_invariant(&rest));
    }

    #[test]
    fn insert_reclamps_successors() {
        let tasks = vec![
            task_with("t-a", "A", 0),
            task_with("t-b", "B", 1),
            task_with("t-c", "C", 2),
        ];
        // A level-0 insert between B and C lowers C's cap
        let tasks = insert(
            &tasks,
            task_with("t-x", "X", 0),
            &InsertPosition::After("t-b".into()),
        );
        assert_eq!(levels(&tasks), vec![0, 1, 0, 1]);
        assert!(holds_indent_invariant(&tasks));
    }

    #[test]
    fn remove_missing_id_returns_none() {
        let before = groceries();
        let (rest, removed) = remove(&before, "t-gone");
        assert_eq!(rest, before);
        assert!(removed.is_none());
    }

    // --- Field updates ---

    #[test]
    fn toggle_complete_maintains_completed_at() {
        let tasks = toggle_complete(&groceries(), "t-milk");
        assert!(tasks[0].completed);
        assert!(tasks[0].completed_at.is_some());

        let tasks = toggle_complete(&tasks, "t-milk");
        assert!(!tasks[0].completed);
        assert!(tasks[0].completed_at.is_none());
    }

    #[test]
    fn set_priority_targets_one_task() {
        let tasks = set_priority(&groceries(), "t-eggs", Priority::High);
        assert_eq!(tasks[1].priority, Priority::High);
        assert_eq!(tasks[0].priority, Priority::None);
    }

    #[test]
    fn update_text_missing_id_is_noop() {
        let before = groceries();
        assert_eq!(update_text(&before, "t-gone", "x"), before);
    }

    // --- Invariant ---

    #[test]
    fn invariant_holds_under_op_mix() {
        let mut tasks = groceries();
        let ids = ["t-milk", "t-eggs", "t-bread"];
        // Grind through a deterministic mix of operations; the invariant
        // must hold after every step. Reorder is excluded: it is allowed
        // to orphan indentation by design.
        for round in 0..ids.len() * 8 {
            let id = ids[round % ids.len()];
            tasks = match round % 5 {
                0 => indent(&tasks, id),
                1 => outdent(&tasks, id),
                2 => remove(&tasks, &format!("extra {}", round.saturating_sub(3))).0,
                3 => indent(&tasks, id),
                _ => insert(
                    &tasks,
                    Task::new(format!("extra {round}")),
                    &InsertPosition::After(id.into()),
                ),
            };
            assert!(
                holds_indent_invariant(&tasks),
                "invariant broken at round {round}: {:?}",
                levels(&tasks)
            );
        }
    }

    #[test]
    fn invariant_detects_orphaned_indent() {
        let tasks = vec![task_with("t-a", "A", 0), task_with("t-b", "B", 2)];
        assert!(!holds_indent_invariant(&tasks));
    }

    #[test]
    fn max_append_level_follows_last_task() {
        assert_eq!(max_append_level(&[]), 0);
        let tasks = indent(&groceries(), "t-eggs");
        // Last task is Bread at level 0
        assert_eq!(max_append_level(&tasks), 1);
    }
}
