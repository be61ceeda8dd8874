use std::collections::HashMap;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Periodic session work. Variant order is execution order within one
/// `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    PriceTick,
    CandleTick,
    SettlementScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskLifecycle {
    Scheduled,
    Running,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTask {
    pub id: TaskId,
    pub kind: TaskKind,
    pub interval_ms: i64,
    pub next_due_ms: i64,
    pub state: TaskLifecycle,
    pub runs: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<TaskId, PeriodicTask>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task whose first run is one interval after `now_ms`.
    pub fn register(&mut self, kind: TaskKind, interval_ms: i64, now_ms: i64) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.insert(
            id,
            PeriodicTask {
                id,
                kind,
                interval_ms,
                next_due_ms: now_ms.saturating_add(interval_ms),
                state: TaskLifecycle::Scheduled,
                runs: 0,
            },
        );
        id
    }

    pub fn task(&self, id: TaskId) -> Option<&PeriodicTask> {
        self.tasks.get(&id)
    }

    /// Scheduled tasks whose deadline has passed, in execution order.
    pub fn due(&self, now_ms: i64) -> Vec<(TaskId, TaskKind)> {
        let mut due: Vec<(TaskId, TaskKind)> = self
            .tasks
            .values()
            .filter(|task| task.state == TaskLifecycle::Scheduled && task.next_due_ms <= now_ms)
            .map(|task| (task.id, task.kind))
            .collect();
        due.sort_by_key(|(id, kind)| (*kind, *id));
        due
    }

    pub fn mark_running(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(&id) {
            if task.state == TaskLifecycle::Scheduled {
                task.state = TaskLifecycle::Running;
            }
        }
    }

    /// Reschedules a task after it ran at `now_ms`. A task that fell more than
    /// one interval behind runs once and realigns to `now_ms + interval`.
    pub fn complete(&mut self, id: TaskId, now_ms: i64) {
        let Some(task) = self.tasks.get_mut(&id) else {
            return;
        };
        if task.state != TaskLifecycle::Running {
            return;
        }

        task.runs += 1;
        task.state = TaskLifecycle::Scheduled;
        let next = task.next_due_ms.saturating_add(task.interval_ms);
        if next <= now_ms {
            debug!(
                kind = ?task.kind,
                missed_ms = now_ms - task.next_due_ms,
                "coalesced missed ticks"
            );
            task.next_due_ms = now_ms.saturating_add(task.interval_ms);
        } else {
            task.next_due_ms = next;
        }
    }

    pub fn cancel_all(&mut self) {
        for task in self.tasks.values_mut() {
            task.state = TaskLifecycle::Cancelled;
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.tasks
            .values()
            .all(|task| task.state == TaskLifecycle::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::{Scheduler, TaskId, TaskKind, TaskLifecycle};

    #[test]
    fn nothing_is_due_before_first_interval() {
        let mut scheduler = Scheduler::new();
        scheduler.register(TaskKind::PriceTick, 1_000, 0);

        assert!(scheduler.due(999).is_empty());
        assert_eq!(scheduler.due(1_000).len(), 1);
    }

    #[test]
    fn due_tasks_run_in_fixed_order() {
        let mut scheduler = Scheduler::new();
        scheduler.register(TaskKind::SettlementScan, 1_000, 0);
        scheduler.register(TaskKind::CandleTick, 1_000, 0);
        scheduler.register(TaskKind::PriceTick, 1_000, 0);

        let kinds: Vec<TaskKind> = scheduler.due(1_000).into_iter().map(|(_, kind)| kind).collect();

        assert_eq!(
            kinds,
            vec![
                TaskKind::PriceTick,
                TaskKind::CandleTick,
                TaskKind::SettlementScan
            ]
        );
    }

    #[test]
    fn on_time_task_keeps_its_cadence() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(TaskKind::PriceTick, 1_000, 0);

        scheduler.mark_running(id);
        scheduler.complete(id, 1_200);

        assert_eq!(scheduler.task(id).unwrap().next_due_ms, 2_000);
        assert_eq!(scheduler.task(id).unwrap().runs, 1);
    }

    #[test]
    fn late_task_runs_once_and_realigns() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(TaskKind::CandleTick, 1_000, 0);

        assert_eq!(scheduler.due(5_500).len(), 1);
        scheduler.mark_running(id);
        scheduler.complete(id, 5_500);

        let task = scheduler.task(id).unwrap();
        assert_eq!(task.next_due_ms, 6_500);
        assert_eq!(task.runs, 1);
        assert!(scheduler.due(5_500).is_empty());
    }

    #[test]
    fn cancelled_tasks_are_never_due() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.register(TaskKind::SettlementScan, 1_000, 0);

        scheduler.cancel_all();
        scheduler.mark_running(id);
        scheduler.complete(id, 10_000);

        assert!(scheduler.due(10_000).is_empty());
        assert_eq!(scheduler.task(id).unwrap().state, TaskLifecycle::Cancelled);
        assert!(scheduler.is_cancelled());
    }

    #[test]
    fn unknown_task_is_ignored() {
        let mut scheduler = Scheduler::new();

        scheduler.mark_running(TaskId(99));
        scheduler.complete(TaskId(99), 1_000);

        assert!(scheduler.task(TaskId(99)).is_none());
    }
}
