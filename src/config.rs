/*
 * Kernel Configuration
 *
 * Compile-time capacities for every fixed-size table in the kernel. These
 * are plain consts rather than a runtime-configurable struct: the tables
 * they size are stack/static allocated once, at build time, so there is
 * no allocator pressure while interrupts are masked.
 */

/// Maximum number of live thread control blocks, including the idle thread.
pub const MAX_THREADS: usize = 32;

/// Maximum number of live global counters.
pub const MAX_GLOBAL_COUNTERS: usize = 32;

/// Maximum number of live semaphores.
pub const MAX_SEMAPHORES: usize = 16;

/// Maximum number of distinct in-flight inbound fragments the message
/// layer tracks during a single `recv` pass.
pub const MAX_OUTSTANDING_PACKETS: usize = 16;

/// Stack size allocated for each non-main thread.
pub const THREAD_STACK_SIZE: usize = 64 * 1024;

/// Maximum size, in bytes, of a single transport frame (header + payload).
pub const MAX_PACKET_LENGTH: usize = 256;

/// Largest message the fragmentation layer will send or reassemble.
pub const MAX_MESSAGE_LENGTH: usize = 0xFFFF;

/// Size, in bytes, of the fragment header (type, sequence, length, offset).
pub const MESSAGE_HEADER_LENGTH: usize = 8;

/// Largest payload a single fragment can carry.
pub const MAX_MESSAGE_DATA_LENGTH: usize = MAX_PACKET_LENGTH - MESSAGE_HEADER_LENGTH;
