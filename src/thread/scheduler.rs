/*
 * Scheduling Decision
 *
 * `schedule` is the pure decision function every entry point (timer tick,
 * syscall trap) consults after mutating kernel state. It never touches
 * interrupt hardware itself; callers are expected to already be inside a
 * critical section (the syscall/timer entry points below arrange that).
 */

use crate::irq::IrqState;

use super::table::with_table;
use super::types::{Priority, ScheduleRequest, ThreadState};

/// Decide which thread's context should run next.
///
/// Implements the five-step algorithm: fast-path the current thread on a
/// `Current` request, otherwise compute the highest priority among
/// `Running` threads (honoring the `Other` exclusion), then round-robin
/// within that priority band starting just after the current thread's
/// slot and wrapping back to the start — which may return the current
/// thread itself if it is the band's only member. Priority-band
/// membership in the walk is judged by priority value alone: a thread
/// can be "found" by the walk without the walk re-checking that it is
/// still `Running` (eligibility was already settled when `p*` was
/// computed).
pub fn schedule(current: *const IrqState, request: ScheduleRequest) -> *const IrqState {
    with_table(|table| {
        let current_slot = match table.find_by_context(current) {
            Some(slot) => slot,
            None => return current,
        };

        if request == ScheduleRequest::Current {
            if let Some(tcb) = &table.slots[current_slot] {
                if tcb.state == ThreadState::Running {
                    return &tcb.context as *const IrqState;
                }
            }
        }

        let mut top_priority = Priority::IDLE;
        for (i, slot) in table.slots.iter().enumerate() {
            if let Some(tcb) = slot {
                if request == ScheduleRequest::Other && i == current_slot {
                    continue;
                }
                if tcb.state != ThreadState::Running {
                    continue;
                }
                if tcb.priority > top_priority {
                    top_priority = tcb.priority;
                }
            }
        }

        let len = table.slots.len();
        for offset in 1..=len {
            let i = (current_slot + offset) % len;
            if let Some(tcb) = &table.slots[i] {
                if tcb.priority == top_priority {
                    return &tcb.context as *const IrqState;
                }
            }
        }

        current
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::table::{init, with_table as with_table_for_test};
    use crate::thread::tcb::Tcb;
    use crate::thread::types::ThreadId;

    fn spawn_running(table: &mut super::super::table::ThreadTable, name: &str, priority: i32) -> *const IrqState {
        let id = ThreadId(1000 + priority as u32 + name.len() as u32);
        let slot = table.slots.iter().position(Option::is_none).unwrap();
        table.slots[slot] = Some(Tcb {
            name: Tcb::make_name(name),
            id,
            priority: Priority(priority),
            state: ThreadState::Running,
            is_main: false,
            context: IrqState::new_state(test_entry, 0, core::ptr::null_mut()),
            stack: None,
            retval: None,
        });
        &table.slots[slot].as_ref().unwrap().context as *const IrqState
    }

    extern "C" fn test_entry(_arg: usize) -> usize {
        0
    }

    #[test]
    fn idle_only_schedules_itself() {
        init();
        let idle_ctx = with_table_for_test(|table| {
            let slot = table.idle_slot().unwrap();
            &table.slots[slot].as_ref().unwrap().context as *const IrqState
        });

        assert_eq!(schedule(idle_ctx, ScheduleRequest::Current), idle_ctx);
        assert_eq!(schedule(idle_ctx, ScheduleRequest::Other), idle_ctx);
    }

    #[test]
    fn round_robin_within_a_band() {
        init();
        let (a, b, c) = with_table_for_test(|table| {
            let a = spawn_running(table, "a", 0);
            let b = spawn_running(table, "b", 0);
            let c = spawn_running(table, "c", 0);
            (a, b, c)
        });

        assert_eq!(schedule(a, ScheduleRequest::Other), b);
        assert_eq!(schedule(b, ScheduleRequest::Other), c);
        assert_eq!(schedule(c, ScheduleRequest::Other), a);
    }

    #[test]
    fn higher_priority_preempts() {
        init();
        let (a, b) = with_table_for_test(|table| {
            let a = spawn_running(table, "a", 0);
            let b = spawn_running(table, "b", 5);
            (a, b)
        });

        assert_eq!(schedule(a, ScheduleRequest::Any), b);

        with_table_for_test(|table| {
            let slot = table.find_by_context(b).unwrap();
            table.slots[slot].as_mut().unwrap().state = ThreadState::Stopped;
        });

        assert_eq!(schedule(b, ScheduleRequest::Any), a);
    }
}
