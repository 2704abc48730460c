//! Ranked, score-annotated views over a task collection.
//!
//! # Responsibility
//! - Project a raw task collection into ranked/pending/completed lists plus
//!   the collection-wide consistency score.
//! - Memoize the projection against the collection's identity.
//!
//! # Invariants
//! - Ranking is a stable descending sort on `compute_score`; equal scores keep
//!   the input order.
//! - Output contains each task id once; the first occurrence wins. The
//!   consistency score is computed over the same de-duplicated tasks.
//! - The cache key is `Arc` identity, never structural equality. The cached
//!   `now` is reused until the collection reference changes.
//! - The projector is single-owner (`&mut self`); sharing it across threads
//!   needs external synchronization.

use crate::model::task::{Task, TaskStatus};
use crate::scoring::{compute_consistency_score, compute_score};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// Shared, immutable task snapshot handed out by a task repository.
///
/// Every repository mutation yields a new `Arc`, which is what the projector
/// keys its cache on.
pub type TaskCollection = Arc<Vec<Task>>;

/// A task plus its transient, never-persisted score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTask {
    pub task: Task,
    pub score: f64,
}

/// One projection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedView {
    /// All tasks, descending by score.
    pub ranked: Vec<ScoredTask>,
    /// Pending subset in ranked order.
    pub pending: Vec<ScoredTask>,
    /// Completed subset in ranked order.
    pub completed: Vec<ScoredTask>,
    pub consistency_score: u8,
    /// `now` the scores were computed against.
    pub computed_at: i64,
}

/// Computes a ranked view without any caching.
pub fn project_ranked_view(tasks: &[Task], now: i64) -> RankedView {
    let mut seen = HashSet::with_capacity(tasks.len());
    let unique = tasks
        .iter()
        .filter(|task| seen.insert(task.id.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    let consistency_score = compute_consistency_score(&unique, now);

    let mut ranked = unique
        .into_iter()
        .map(|task| ScoredTask {
            score: compute_score(&task, now),
            task,
        })
        .collect::<Vec<_>>();
    // `sort_by` is stable.
    ranked.sort_by(|left, right| right.score.total_cmp(&left.score));

    let (pending, completed): (Vec<_>, Vec<_>) = ranked
        .iter()
        .cloned()
        .partition(|item| item.task.status == TaskStatus::Pending);

    RankedView {
        ranked,
        pending,
        completed,
        consistency_score,
        computed_at: now,
    }
}

struct CachedProjection {
    source: TaskCollection,
    view: Arc<RankedView>,
}

impl CachedProjection {
    fn build(tasks: &TaskCollection, now: i64) -> Self {
        Self {
            source: Arc::clone(tasks),
            view: Arc::new(project_ranked_view(tasks, now)),
        }
    }
}

/// Identity-memoized ranked view projector.
#[derive(Default)]
pub struct RankedViewProjector {
    cached: Option<CachedProjection>,
    recomputations: u64,
}

impl RankedViewProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the view for `tasks`, recomputing only when the collection
    /// reference differs from the cached one.
    ///
    /// Holding the source `Arc` keeps its allocation alive, so a pointer match
    /// always means the same collection.
    pub fn view(&mut self, tasks: &TaskCollection, now: i64) -> Arc<RankedView> {
        Arc::clone(&self.refresh(tasks, now).view)
    }

    pub fn select_ranked_tasks(&mut self, tasks: &TaskCollection, now: i64) -> &[ScoredTask] {
        &self.refresh(tasks, now).view.ranked
    }

    pub fn select_pending(&mut self, tasks: &TaskCollection, now: i64) -> &[ScoredTask] {
        &self.refresh(tasks, now).view.pending
    }

    pub fn select_completed(&mut self, tasks: &TaskCollection, now: i64) -> &[ScoredTask] {
        &self.refresh(tasks, now).view.completed
    }

    pub fn consistency_score(&mut self, tasks: &TaskCollection, now: i64) -> u8 {
        self.refresh(tasks, now).view.consistency_score
    }

    /// Number of actual projection passes so far.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Drops the cached view; the next call recomputes.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    fn refresh(&mut self, tasks: &TaskCollection, now: i64) -> &CachedProjection {
        let fresh = self
            .cached
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(&cached.source, tasks));
        if !fresh {
            self.recomputations += 1;
            debug!(
                "event=projection_recompute module=projection status=ok tasks={} pass={}",
                tasks.len(),
                self.recomputations
            );
            self.cached = Some(CachedProjection::build(tasks, now));
        }
        self.cached
            .get_or_insert_with(|| CachedProjection::build(tasks, now))
    }
}

#[cfg(test)]
mod tests {
    use super::{project_ranked_view, RankedViewProjector, TaskCollection};
    use crate::clock::MS_PER_HOUR;
    use crate::model::task::{Priority, Task};
    use std::sync::Arc;

    const NOW: i64 = 1_700_000_000_000;

    fn task(id: &str, priority: Priority, hours: i64) -> Task {
        Task::with_id(id, id, priority, NOW + hours * MS_PER_HOUR, NOW - MS_PER_HOUR)
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let first = task("a", Priority::Low, 5);
        let mut second = task("a", Priority::High, 1);
        second.title = "shadow".to_string();

        let view = project_ranked_view(&[first, second], NOW);
        assert_eq!(view.ranked.len(), 1);
        assert_eq!(view.ranked[0].task.priority, Priority::Low);
    }

    #[test]
    fn consistency_ignores_repeated_ids() {
        let mut late = task("a", Priority::Low, -3);
        late.mark_completed(NOW);
        let mut on_time = task("b", Priority::Low, 3);
        on_time.mark_completed(NOW);

        let view = project_ranked_view(&[late.clone(), late.clone(), late, on_time], NOW);
        assert_eq!(view.ranked.len(), 2);
        assert_eq!(view.consistency_score, 50);
    }

    #[test]
    fn cached_view_is_reused_for_same_collection() {
        let tasks: TaskCollection = Arc::new(vec![task("a", Priority::Low, 5)]);
        let mut projector = RankedViewProjector::new();

        let first = projector.view(&tasks, NOW);
        let second = projector.view(&tasks, NOW + 10 * MS_PER_HOUR);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.computed_at, NOW);
        assert_eq!(projector.recomputations(), 1);
    }

    #[test]
    fn new_collection_reference_recomputes_even_if_equal() {
        let tasks: TaskCollection = Arc::new(vec![task("a", Priority::Low, 5)]);
        let copy: TaskCollection = Arc::new(tasks.as_ref().clone());
        let mut projector = RankedViewProjector::new();

        projector.select_ranked_tasks(&tasks, NOW);
        projector.select_ranked_tasks(&copy, NOW);
        assert_eq!(projector.recomputations(), 2);

        projector.invalidate();
        projector.select_pending(&copy, NOW);
        assert_eq!(projector.recomputations(), 3);
    }
}
