/*
 * Syscall Dispatch
 *
 * `syscall_timer`/`syscall_trapa` are the two entry points invoked from
 * interrupt context: a timer tick and a software-trap system call. Both
 * are plain function calls rather than a trap-opcode crossing; the
 * contract kept here is "while dispatching, no other thread observes
 * intermediate state," which `with_table`'s critical-section wrapping
 * already guarantees for every table mutation a syscall performs.
 */

use crate::irq::{ARG0_SLOT, ARG1_SLOT, IrqState, RESULT_SLOT};

use super::counter::CounterHandle;
use super::types::{Priority, ScheduleRequest, ThreadId};
use super::{scheduler, thread_id, thread_priority, thread_start, thread_stop};
use super::counter;

/// Trap numbers 0-7 dispatched by `syscall_trapa`.
pub mod trap {
    pub const COUNTER_INCREMENT: u32 = 0;
    pub const COUNTER_DECREMENT: u32 = 1;
    pub const COUNTER_READ: u32 = 2;
    pub const YIELD: u32 = 3;
    pub const START: u32 = 4;
    pub const STOP: u32 = 5;
    pub const SET_PRIORITY: u32 = 6;
    pub const SELF_ID: u32 = 7;
}

/// A tick does not by itself preempt a running thread; it only triggers
/// rescheduling of stopped/finished threads or selects after a voluntary
/// yield (the fast path in `schedule`'s step 2 returns `current`
/// immediately if it is still `Running`).
pub fn syscall_timer(current: *const IrqState) -> *const IrqState {
    scheduler::schedule(current, ScheduleRequest::Current)
}

/// Dispatch trap `trap` against `current`, mutating kernel state as
/// needed and returning the next context to resume (possibly `current`
/// itself). Arguments and the result travel through `current`'s
/// register slots 4, 5 (args) and 0 (result).
pub fn syscall_trapa(current: *mut IrqState, trap: u32) -> *const IrqState {
    // SAFETY: the caller (a trap-entry adapter) guarantees `current`
    // points at a valid, exclusively-owned context for the duration of
    // this call.
    let ctx = unsafe { &mut *current };

    match trap {
        trap::COUNTER_INCREMENT => {
            let handle = CounterHandle(ctx.slot(ARG0_SLOT) as u32);
            counter::increment(handle);
            schedule_current(current)
        }
        trap::COUNTER_DECREMENT => {
            let handle = CounterHandle(ctx.slot(ARG0_SLOT) as u32);
            counter::decrement(handle);
            schedule_current(current)
        }
        trap::COUNTER_READ => {
            let handle = CounterHandle(ctx.slot(ARG0_SLOT) as u32);
            let value = counter::value(handle);
            ctx.set_slot(RESULT_SLOT, value as usize);
            schedule_current(current)
        }
        trap::YIELD => scheduler::schedule(current, ScheduleRequest::Other),
        trap::START => {
            let id = ThreadId(ctx.slot(ARG0_SLOT) as u32);
            thread_start(id);
            scheduler::schedule(current, ScheduleRequest::Any)
        }
        trap::STOP => {
            let id = ThreadId(ctx.slot(ARG0_SLOT) as u32);
            thread_stop(id);
            scheduler::schedule(current, ScheduleRequest::Any)
        }
        trap::SET_PRIORITY => {
            let id = ThreadId(ctx.slot(ARG0_SLOT) as u32);
            let priority = Priority(ctx.slot(ARG1_SLOT) as i32);
            thread_priority(id, priority);
            scheduler::schedule(current, ScheduleRequest::Any)
        }
        trap::SELF_ID => {
            let id = thread_id(current);
            ctx.set_slot(RESULT_SLOT, id.0 as usize);
            schedule_current(current)
        }
        _ => {
            log::warn!("syscall_trapa: unknown trap {trap}");
            schedule_current(current)
        }
    }
}

fn schedule_current(current: *const IrqState) -> *const IrqState {
    scheduler::schedule(current, ScheduleRequest::Current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::{init, thread_create, thread_info, ThreadId as Tid};

    extern "C" fn noop(_arg: usize) -> usize {
        0
    }

    fn context_of(id: Tid) -> *mut IrqState {
        super::table::context_ptr_mut(id)
    }

    #[test]
    fn trap_self_id_returns_caller_id() {
        init();
        let id = thread_create("t", noop, 0);
        thread_start(id);
        let ctx = context_of(id);
        let next = syscall_trapa(ctx, trap::SELF_ID);
        let ctx_ref = unsafe { &*ctx };
        assert_eq!(ctx_ref.slot(RESULT_SLOT), id.0 as usize);
        assert!(!next.is_null());
    }

    #[test]
    fn trap_start_and_stop_transition_state() {
        init();
        let id = thread_create("t", noop, 0);
        let ctx = context_of(id);
        unsafe {
            (*ctx).set_slot(ARG0_SLOT, id.0 as usize);
        }
        syscall_trapa(ctx, trap::START);
        assert!(thread_info(id).unwrap().running);

        syscall_trapa(ctx, trap::STOP);
        assert!(!thread_info(id).unwrap().running);
    }

    #[test]
    fn trap_counter_roundtrip() {
        init();
        let id = thread_create("t", noop, 0);
        let ctx = context_of(id);
        let handle = counter::init(0);
        unsafe {
            (*ctx).set_slot(ARG0_SLOT, handle.0 as usize);
        }
        syscall_trapa(ctx, trap::COUNTER_INCREMENT);
        syscall_trapa(ctx, trap::COUNTER_INCREMENT);
        syscall_trapa(ctx, trap::COUNTER_READ);
        let ctx_ref = unsafe { &*ctx };
        assert_eq!(ctx_ref.slot(RESULT_SLOT), 2);
        counter::free(handle);
    }

    #[test]
    fn timer_tick_does_not_preempt_a_running_thread() {
        init();
        let id = thread_create("t", noop, 0);
        thread_start(id);
        let ctx = context_of(id) as *const IrqState;
        assert_eq!(syscall_timer(ctx), ctx);
    }
}
