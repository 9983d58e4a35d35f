/*
 * Semaphores
 *
 * The in-scope thread core declares a `(max, current)` semaphore table
 * and a lookup-by-handle function but never operates on it beyond that
 * lookup, leaving it an explicit reserved extension point. This module
 * supplies the minimal operations a fixed-table, critical-section-guarded
 * semaphore can support without inventing a blocking primitive this
 * crate doesn't otherwise define: a non-blocking try-acquire and a
 * release. A caller that needs to block loops on `acquire` around
 * `thread_yield()`.
 */

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::MAX_SEMAPHORES;

/// An opaque handle to a live semaphore. `SemaphoreHandle(0)` is never valid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SemaphoreHandle(pub u32);

impl SemaphoreHandle {
    pub const NONE: SemaphoreHandle = SemaphoreHandle(0);
}

#[derive(Copy, Clone)]
struct Semaphore {
    max: u32,
    current: u32,
}

struct SemaphoreTable {
    slots: [Option<Semaphore>; MAX_SEMAPHORES],
    handles: [u32; MAX_SEMAPHORES],
    next_handle: u32,
}

impl SemaphoreTable {
    const fn empty() -> Self {
        Self {
            slots: [None; MAX_SEMAPHORES],
            handles: [0; MAX_SEMAPHORES],
            next_handle: 1,
        }
    }
}

static TABLE: Mutex<RefCell<SemaphoreTable>> = Mutex::new(RefCell::new(SemaphoreTable::empty()));

fn find_index(table: &SemaphoreTable, handle: SemaphoreHandle) -> Option<usize> {
    for i in 0..MAX_SEMAPHORES {
        if table.slots[i].is_some() && table.handles[i] == handle.0 {
            return Some(i);
        }
    }
    None
}

/// Allocate a semaphore with `max` permits, all initially available.
/// Returns `SemaphoreHandle::NONE` if the table is full.
pub fn init(max: u32) -> SemaphoreHandle {
    critical_section::with(|cs| {
        let cell = TABLE.borrow(cs);
        let mut table = cell.borrow_mut();
        match table.slots.iter().position(Option::is_none) {
            Some(i) => {
                let handle = table.next_handle;
                table.next_handle += 1;
                table.slots[i] = Some(Semaphore { max, current: max });
                table.handles[i] = handle;
                SemaphoreHandle(handle)
            }
            None => SemaphoreHandle::NONE,
        }
    })
}

/// Try to acquire one permit. Returns `true` and decrements `current` if a
/// permit was available, `false` otherwise (including when `handle` is
/// not found).
pub fn acquire(handle: SemaphoreHandle) -> bool {
    critical_section::with(|cs| {
        let cell = TABLE.borrow(cs);
        let mut table = cell.borrow_mut();
        match find_index(&table, handle) {
            Some(i) => {
                let sem = table.slots[i].as_mut().unwrap();
                if sem.current > 0 {
                    sem.current -= 1;
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    })
}

/// Release one permit, saturating at `max`. No-op if `handle` is not found.
pub fn release(handle: SemaphoreHandle) {
    critical_section::with(|cs| {
        let cell = TABLE.borrow(cs);
        let mut table = cell.borrow_mut();
        if let Some(i) = find_index(&table, handle) {
            let sem = table.slots[i].as_mut().unwrap();
            sem.current = (sem.current + 1).min(sem.max);
        }
    });
}

/// Release a semaphore. No-op if `handle` is not found.
pub fn free(handle: SemaphoreHandle) {
    critical_section::with(|cs| {
        let cell = TABLE.borrow(cs);
        let mut table = cell.borrow_mut();
        if let Some(i) = find_index(&table, handle) {
            table.slots[i] = None;
            table.handles[i] = 0;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_respects_max_and_release_restores() {
        let h = init(2);
        assert!(acquire(h));
        assert!(acquire(h));
        assert!(!acquire(h));
        release(h);
        assert!(acquire(h));
        free(h);
    }

    #[test]
    fn release_never_exceeds_max() {
        let h = init(1);
        release(h);
        release(h);
        assert!(acquire(h));
        assert!(!acquire(h));
        free(h);
    }
}
