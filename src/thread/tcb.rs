/*
 * Thread Control Block
 */

use alloc::boxed::Box;

use crate::irq::IrqState;

use super::types::{Priority, ThreadId, ThreadState};

/// A single thread's complete kernel-visible state.
///
/// `context` is stored inline rather than behind a pointer: as long as a
/// `Tcb` stays in its table slot, `&tcb.context as *const IrqState` is
/// exactly as stable an identity as a heap pointer would be, and
/// lookup-by-context (used by the scheduler to find "the calling
/// thread") works the same way.
pub struct Tcb {
    pub name: heapless::String<63>,
    pub id: ThreadId,
    pub priority: Priority,
    pub state: ThreadState,
    /// The root thread, whose stack and context predate the kernel.
    pub is_main: bool,
    pub context: IrqState,
    /// `None` only for the main thread.
    pub stack: Option<Box<[u8]>>,
    /// Set once `state` becomes `Finished`.
    pub retval: Option<usize>,
}

impl Tcb {
    /// Build the name field, truncating at a char boundary if `name` is
    /// longer than the 63-byte capacity rather than panicking.
    pub fn make_name(name: &str) -> heapless::String<63> {
        let mut truncated = name;
        while truncated.len() > 63 {
            let mut end = 63;
            while !truncated.is_char_boundary(end) {
                end -= 1;
            }
            truncated = &truncated[..end];
        }
        // SAFETY/ infallibility: `truncated` now fits within the 63-byte capacity.
        heapless::String::try_from(truncated).unwrap_or_default()
    }

    /// True for Stopped/Running/Waiting, false for Finished/Zombie.
    pub fn alive(&self) -> bool {
        matches!(
            self.state,
            ThreadState::Stopped | ThreadState::Running | ThreadState::Waiting
        )
    }
}
