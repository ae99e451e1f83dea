use std::time::Duration;

use bevy::prelude::*;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Deferred session work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    RespawnTraffic,
    HideNotification,
    EndCameraShake,
}

struct Pending {
    id: TaskId,
    task: ScheduledTask,
    /// non-repeating, like a fuse
    timer: Timer,
}

/// Single-shot timed tasks owned by one session.
///
/// Time only moves when the session ticks, so nothing fires while the game is
/// paused, and dropping or cancelling the scheduler discards whatever is pending.
#[derive(Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_id: u64,
}

impl Scheduler {
    pub fn schedule(&mut self, task: ScheduledTask, delay: Duration) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            task,
            timer: Timer::new(delay, TimerMode::Once),
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Cancels every pending task of one kind and returns how many were dropped.
    pub fn cancel_kind(&mut self, task: ScheduledTask) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.task != task);
        before - self.pending.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Moves time forward and returns the tasks that came due, in scheduling order.
    pub fn advance(&mut self, delta: Duration) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        self.pending.retain_mut(|p| {
            p.timer.tick(delta);
            if p.timer.finished() {
                due.push(p.task);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn pending_count(&self, task: ScheduledTask) -> usize {
        self.pending.iter().filter(|p| p.task == task).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
