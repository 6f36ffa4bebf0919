//! Run queue (C4): doubly-linked list of task nodes with head/tail/count,
//! ported from `task.c`'s `task_queue_t` and `add_to_queue`/
//! `remove_from_queue`/`rotate_queue`.

use super::task::{task_at, TaskStatus, NONE};
use crate::config::MAX_PROCESSES;

struct RunQueue {
    head: i32,
    tail: i32,
    count: usize,
}

static mut QUEUE: RunQueue = RunQueue {
    head: NONE,
    tail: NONE,
    count: 0,
};

/// # Safety
/// Must run with interrupts disabled (§5 run-queue mutation discipline).
unsafe fn queue() -> &'static mut RunQueue {
    &mut *core::ptr::addr_of_mut!(QUEUE)
}

pub fn head() -> i32 {
    unsafe { queue().head }
}

pub fn count() -> usize {
    unsafe { queue().count }
}

/// Add `pid` at the tail of the run queue as an active task, matching
/// `add_process`'s enqueue-on-create behavior.
pub fn enqueue(pid: i32) {
    unsafe {
        let q = queue();
        let task = task_at(pid);
        task.status = TaskStatus::Active;
        task.in_queue = true;
        task.prev = q.tail;
        task.next = NONE;
        if q.tail != NONE {
            task_at(q.tail).next = pid;
        } else {
            q.head = pid;
        }
        q.tail = pid;
        q.count += 1;
    }
}

/// Remove `pid` from the run queue (O(1) by node), matching `halt`'s
/// free-task-and-run-queue-entry step.
pub fn dequeue(pid: i32) {
    unsafe {
        let q = queue();
        let task = task_at(pid);
        if !task.in_queue {
            return;
        }
        let (prev, next) = (task.prev, task.next);
        if prev != NONE {
            task_at(prev).next = next;
        } else {
            q.head = next;
        }
        if next != NONE {
            task_at(next).prev = prev;
        } else {
            q.tail = prev;
        }
        let task = task_at(pid);
        task.in_queue = false;
        task.prev = NONE;
        task.next = NONE;
        q.count -= 1;
    }
}

/// Pop the head and push it to the tail, returning the new head (the
/// rotation candidate). Returns `NONE` on an empty queue.
pub fn rotate() -> i32 {
    unsafe {
        let q = queue();
        if q.head == NONE {
            return NONE;
        }
        let head = q.head;
        if q.head == q.tail {
            return head;
        }
        let new_head = task_at(head).next;
        dequeue(head);
        enqueue_preserving_status(head);
        new_head
    }
}

/// Re-append a task to the tail without resetting its status to `Active`,
/// used by rotation (which must preserve idle/sleeping tasks' status while
/// still cycling them through the queue).
fn enqueue_preserving_status(pid: i32) {
    unsafe {
        let q = queue();
        let task = task_at(pid);
        task.in_queue = true;
        task.prev = q.tail;
        task.next = NONE;
        if q.tail != NONE {
            task_at(q.tail).next = pid;
        } else {
            q.head = pid;
        }
        q.tail = pid;
        q.count += 1;
    }
}

/// Highest pid currently present anywhere in `0..MAX_PROCESSES` with an
/// in-queue task node, used by `process::table::setup_process` to pick the
/// next pid (`task.c`'s "scan for the max present pid, add one").
pub fn max_live_pid() -> i32 {
    unsafe {
        let mut max = -1;
        for pid in 0..MAX_PROCESSES as i32 {
            if task_at(pid).in_queue && pid > max {
                max = pid;
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::task::TASKS;

    fn reset() {
        unsafe {
            for t in core::ptr::addr_of_mut!(TASKS).as_mut().unwrap().iter_mut() {
                *t = super::super::task::Task::empty();
            }
            let q = queue();
            q.head = NONE;
            q.tail = NONE;
            q.count = 0;
        }
    }

    #[test]
    fn enqueue_then_dequeue_empties_queue() {
        reset();
        enqueue(1);
        enqueue(2);
        assert_eq!(count(), 2);
        dequeue(1);
        dequeue(2);
        assert_eq!(count(), 0);
        assert_eq!(head(), NONE);
    }

    #[test]
    fn rotate_cycles_every_active_task_through_head() {
        reset();
        enqueue(1);
        enqueue(2);
        enqueue(3);
        let mut seen = [0i32; 3];
        for slot in seen.iter_mut() {
            *slot = head();
            rotate();
        }
        seen.sort_unstable();
        assert_eq!(seen, [1, 2, 3]);
    }
}
