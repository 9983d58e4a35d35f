/*
 * IRQ State and Critical Sections
 *
 * This module supplies the two building blocks every other kernel table
 * rests on:
 *
 * - `IrqState`, the opaque per-thread register snapshot. Its real layout
 *   and the assembly that saves/restores it on a trap are an external
 *   collaborator's job; this crate only needs a stable, addressable
 *   container with syscall-ABI argument/result slots (0, 4, 5) and enough
 *   information to drive the thread entry trampoline directly from Rust.
 * - `with_interrupts_disabled`, the sole synchronization primitive used
 *   by every table in this crate. It is a thin wrapper over
 *   `critical_section::with`, which restores the prior interrupt mask on
 *   every exit path (including `?` and panics) the same way a
 *   hand-rolled RAII guard would, but portably: the same call compiles
 *   against a hosted backend under `cargo test` and a bare-metal backend
 *   on target hardware.
 */

/// A thread's entry function: takes its opaque argument, returns an
/// opaque result pointer (carried through as `usize`).
pub type ThreadEntry = extern "C" fn(usize) -> usize;

/// Number of addressable general-purpose register slots in a snapshot.
pub const GP_REG_COUNT: usize = 8;

/// Slot holding a syscall's first argument.
pub const ARG0_SLOT: usize = 4;

/// Slot holding a syscall's second argument.
pub const ARG1_SLOT: usize = 5;

/// Slot holding a syscall's result.
pub const RESULT_SLOT: usize = 0;

/// An opaque per-thread register snapshot.
///
/// Real targets construct this from whatever the trap entry stub saved;
/// this crate never inspects slots beyond the syscall ABI positions and
/// the entry/arg pair needed to start a fresh thread.
#[derive(Debug, Clone)]
pub struct IrqState {
    gp_regs: [usize; GP_REG_COUNT],
    entry: ThreadEntry,
    arg: usize,
}

impl IrqState {
    /// Build a fresh snapshot for a thread that has not run yet.
    ///
    /// `stack_top` is accepted (and would be wired into the real saved
    /// stack-pointer register by the entry/exit stub this crate does not
    /// own) but otherwise unused here.
    pub fn new_state(entry: ThreadEntry, arg: usize, _stack_top: *mut u8) -> Self {
        Self {
            gp_regs: [0; GP_REG_COUNT],
            entry,
            arg,
        }
    }

    /// Read a general-purpose register slot. Out-of-range indices read 0.
    pub fn slot(&self, index: usize) -> usize {
        self.gp_regs.get(index).copied().unwrap_or(0)
    }

    /// Write a general-purpose register slot. Out-of-range indices are ignored.
    pub fn set_slot(&mut self, index: usize, value: usize) {
        if let Some(slot) = self.gp_regs.get_mut(index) {
            *slot = value;
        }
    }

    /// The thread's entry function.
    pub fn entry(&self) -> ThreadEntry {
        self.entry
    }

    /// The opaque argument passed to the entry function.
    pub fn arg(&self) -> usize {
        self.arg
    }
}

/// Release an IRQ state snapshot.
///
/// Taking the `Box` by value and letting it drop is the whole contract;
/// this exists as a named call so call sites read the same way the
/// collaborator interface describes them (`new_state`/`free_state` as a
/// pair), rather than a bare `drop`.
pub fn free_state(state: alloc::boxed::Box<IrqState>) {
    drop(state);
}

/// Run `f` with interrupts disabled, restoring the prior mask on every
/// exit path. This is the only synchronization primitive used by the
/// thread, counter, and semaphore tables.
pub fn with_interrupts_disabled<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    critical_section::with(|_| f())
}
