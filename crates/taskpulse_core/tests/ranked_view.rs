use std::sync::Arc;
use taskpulse_core::{Priority, RankedViewProjector, Task, TaskCollection};

const HOUR: i64 = 3_600_000;
const NOW: i64 = 1_700_000_000_000;

fn task(id: &str, priority: Priority, deadline: i64) -> Task {
    Task::with_id(id, id, priority, deadline, NOW - HOUR)
}

fn ids(items: &[taskpulse_core::ScoredTask]) -> Vec<&str> {
    items.iter().map(|item| item.task.id.as_str()).collect()
}

#[test]
fn equal_scores_keep_input_order() {
    // a and b share priority and deadline; c is overdue.
    let tasks: TaskCollection = Arc::new(vec![
        task("a", Priority::Medium, NOW + 10 * HOUR),
        task("b", Priority::Medium, NOW + 10 * HOUR),
        task("c", Priority::Low, NOW - HOUR),
    ]);
    let mut projector = RankedViewProjector::new();

    let ranked = projector.select_ranked_tasks(&tasks, NOW);
    assert_eq!(ids(ranked), vec!["c", "a", "b"]);
    assert_eq!(ranked[1].score, ranked[2].score);
}

#[test]
fn pending_and_completed_sublists_preserve_ranked_order() {
    let mut done_early = task("done-early", Priority::High, NOW + HOUR);
    done_early.mark_completed(NOW - HOUR);
    let mut done_late = task("done-late", Priority::Low, NOW - 5 * HOUR);
    done_late.mark_completed(NOW);

    let tasks: TaskCollection = Arc::new(vec![
        done_early,
        task("later", Priority::Low, NOW + 48 * HOUR),
        done_late,
        task("soon", Priority::High, NOW + HOUR),
    ]);
    let mut projector = RankedViewProjector::new();

    assert_eq!(ids(projector.select_pending(&tasks, NOW)), vec!["soon", "later"]);
    assert_eq!(
        ids(projector.select_completed(&tasks, NOW)),
        vec!["done-early", "done-late"]
    );
    assert_eq!(projector.consistency_score(&tasks, NOW), 50);
    assert_eq!(projector.recomputations(), 1);
}

#[test]
fn completed_tasks_sink_below_every_pending_task() {
    let mut finished = task("finished", Priority::High, NOW + HOUR);
    finished.mark_completed(NOW);
    let tasks: TaskCollection = Arc::new(vec![
        finished,
        task("far", Priority::Low, NOW + 1_000 * HOUR),
    ]);

    let mut projector = RankedViewProjector::new();
    assert_eq!(ids(projector.select_ranked_tasks(&tasks, NOW)), vec!["far", "finished"]);
}

#[test]
fn projection_is_memoized_on_collection_identity() {
    let tasks: TaskCollection = Arc::new(vec![task("a", Priority::Low, NOW + HOUR)]);
    let mut projector = RankedViewProjector::new();

    let first = projector.view(&tasks, NOW);
    let again = projector.view(&Arc::clone(&tasks), NOW + HOUR);
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(projector.recomputations(), 1);

    let mut changed = tasks.as_ref().clone();
    changed.push(task("b", Priority::High, NOW + 2 * HOUR));
    let changed: TaskCollection = Arc::new(changed);
    let next = projector.view(&changed, NOW + HOUR);
    assert_eq!(projector.recomputations(), 2);
    assert_eq!(next.ranked.len(), 2);
    assert_eq!(next.computed_at, NOW + HOUR);
}
