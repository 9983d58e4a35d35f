/*
 * Thread Type Definitions
 *
 * Small, Copy-able newtypes shared across the thread table, scheduler,
 * and syscall dispatcher.
 */

/// A thread's handle. `ThreadId(0)` means "no thread".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

impl ThreadId {
    /// The sentinel value meaning "no thread".
    pub const NONE: ThreadId = ThreadId(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// Thread priority. Higher values are more preferred; the idle thread
/// always runs at `Priority::IDLE`, the minimum representable value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// The idle thread's priority: guaranteed lower than any real thread.
    pub const IDLE: Priority = Priority(i32::MIN);

    /// The priority new threads are created with.
    pub const DEFAULT: Priority = Priority(0);
}

/// A thread's lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ThreadState {
    /// Not currently eligible to run; either never started or `thread_stop`ed.
    Stopped,
    /// Eligible to run; the only state the scheduler will select.
    Running,
    /// The entry function has returned; not yet reaped.
    Finished,
    /// Reaped, awaiting destruction. Unused by any operation in scope today,
    /// but part of the lifecycle `thread_info` reports against.
    Zombie,
    /// Waiting on a resource (e.g. a semaphore). Not selectable by the scheduler.
    Waiting,
}

/// What kind of thread the scheduler should prefer next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScheduleRequest {
    /// Keep running the current thread if it still can.
    Current,
    /// Prefer any thread other than the current one.
    Other,
    /// No preference; pick strictly by priority band.
    Any,
}

/// A point-in-time snapshot of a thread, as returned by `thread_info`.
#[derive(Debug, Clone)]
pub struct ThreadInfo {
    pub name: heapless::String<63>,
    pub priority: Priority,
    /// True for Stopped/Running/Waiting, false for Finished/Zombie.
    pub alive: bool,
    /// True only for Running.
    pub running: bool,
}
