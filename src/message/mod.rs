/*
 * Message Layer
 *
 * Fragmentation and reassembly of application messages (up to
 * `MAX_MESSAGE_LENGTH` bytes) over a raw, fixed-frame packet transport.
 * Unlike the thread core this layer is not IRQ-critical: it is called
 * synchronously from user code and assumes a single producer and single
 * consumer of the transport.
 */

mod header;
mod recv;
mod send;
mod transport;

pub use header::FragmentHeader;
pub use recv::message_recv;
pub use send::message_send;
pub use transport::PacketTransport;

/// A fully reassembled message, as returned by `message_recv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedMessage {
    pub type_id: u16,
    pub data: alloc::vec::Vec<u8>,
    pub length: u16,
}

/// Why `message_send` failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SendError {
    /// `data.len() > MAX_MESSAGE_LENGTH`.
    TooLarge,
    /// The underlying transport's `send` returned an error mid-message.
    /// The sequence number consumed for this message is not reused.
    TransportFailure,
}

impl core::fmt::Display for SendError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SendError::TooLarge => write!(f, "message exceeds MAX_MESSAGE_LENGTH"),
            SendError::TransportFailure => write!(f, "transport send failed"),
        }
    }
}

/// Why `message_recv` failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RecvError {
    /// No sequence currently buffered by the transport is fully present.
    Incomplete,
}

impl core::fmt::Display for RecvError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecvError::Incomplete => write!(f, "no complete message available"),
        }
    }
}
