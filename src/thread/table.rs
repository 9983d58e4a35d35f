/*
 * Fixed Thread Table
 *
 * A fixed `[Option<Tcb>; MAX_THREADS]` array behind a critical-section
 * mutex, replacing the process-aware `BTreeMap` table a hosted kernel
 * would use: deterministic worst case, no allocator pressure while
 * interrupts are masked, matching the fixed-array mandate.
 */

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::MAX_THREADS;
use crate::irq::IrqState;

use super::tcb::Tcb;
use super::types::{Priority, ThreadId, ThreadState};

pub(crate) struct ThreadTable {
    pub(crate) slots: [Option<Tcb>; MAX_THREADS],
    next_id: u32,
    /// Slot of the idle thread, set once by `init`.
    idle_slot: Option<usize>,
}

impl ThreadTable {
    const fn empty() -> Self {
        Self {
            slots: [None; MAX_THREADS],
            next_id: 1,
            idle_slot: None,
        }
    }

    fn first_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Find a free slot and mint a fresh, non-zero id for it in one step,
    /// for callers (`thread_create`, `register_main`) that need both.
    pub(crate) fn alloc_slot(&mut self) -> Option<(usize, ThreadId)> {
        let slot = self.first_free_slot()?;
        Some((slot, ThreadId(self.alloc_id())))
    }

    pub(crate) fn find_by_id(&self, id: ThreadId) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some(tcb) if tcb.id == id))
    }

    pub(crate) fn find_by_context(&self, context: *const IrqState) -> Option<usize> {
        self.slots.iter().position(|slot| match slot {
            Some(tcb) => core::ptr::eq(&tcb.context, context),
            None => false,
        })
    }

    pub(crate) fn idle_slot(&self) -> Option<usize> {
        self.idle_slot
    }
}

/// Test-only accessor: a raw mutable pointer to `id`'s context, for
/// driving `syscall_trapa` the way a real trap-entry adapter would (it
/// hands the dispatcher a pointer into the saved context it owns).
#[cfg(test)]
pub(crate) fn context_ptr_mut(id: ThreadId) -> *mut IrqState {
    with_table(|table| {
        let slot = table.find_by_id(id).expect("context_ptr_mut: unknown id");
        &mut table.slots[slot].as_mut().unwrap().context as *mut IrqState
    })
}

pub(crate) static TABLE: Mutex<RefCell<ThreadTable>> = Mutex::new(RefCell::new(ThreadTable::empty()));

/// Run `f` with exclusive access to the thread table, under an
/// IRQ-disabled critical section.
pub(crate) fn with_table<F, R>(f: F) -> R
where
    F: FnOnce(&mut ThreadTable) -> R,
{
    critical_section::with(|cs| {
        let cell = TABLE.borrow(cs);
        let mut table = cell.borrow_mut();
        f(&mut table)
    })
}

/// Initialize the thread table and create the idle thread.
///
/// Idempotent in the sense that calling it again would create a second
/// idle thread; callers are expected to call it exactly once at boot.
pub fn init() {
    with_table(|table| {
        *table = ThreadTable::empty();

        let idle_id = ThreadId(table.alloc_id());
        let slot = table
            .first_free_slot()
            .expect("thread table has zero capacity");

        table.slots[slot] = Some(Tcb {
            name: Tcb::make_name("idle"),
            id: idle_id,
            priority: Priority::IDLE,
            state: ThreadState::Running,
            is_main: false,
            context: IrqState::new_state(idle_trampoline, 0, core::ptr::null_mut()),
            stack: None,
            retval: None,
        });
        table.idle_slot = Some(slot);
    });

    log::info!("thread table initialized, idle thread running");
}

/// The idle thread never does real work from Rust's perspective: the
/// external entry/exit stub loops it through `thread_yield()` forever.
/// This trampoline exists only so the idle thread has a well-formed
/// `IrqState::entry`; it is never expected to be called directly from
/// within this crate.
extern "C" fn idle_trampoline(_arg: usize) -> usize {
    0
}

/// Register the caller's own execution context as the main thread.
///
/// The main thread's stack and context were not allocated by this crate
/// (they predate kernel init); `context` is whatever the platform's
/// entry/exit stub already has in hand for the thread calling this
/// function.
pub fn register_main(context: IrqState) -> ThreadId {
    with_table(|table| {
        let id = ThreadId(table.alloc_id());
        match table.first_free_slot() {
            Some(slot) => {
                table.slots[slot] = Some(Tcb {
                    name: Tcb::make_name("main"),
                    id,
                    priority: Priority::DEFAULT,
                    state: ThreadState::Running,
                    is_main: true,
                    context,
                    stack: None,
                    retval: None,
                });
                id
            }
            None => ThreadId::NONE,
        }
    })
}
