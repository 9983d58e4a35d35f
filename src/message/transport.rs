/*
 * Packet Transport
 *
 * The external collaborator for a raw, fixed-size frame transport the
 * message layer sends into and peeks/discards from. Out of this crate's
 * scope (no retransmission, no reordering guarantees, no authentication)
 * — this trait is the whole contract.
 */

/// A raw packet transport with up to `max_outstanding()` buffered inbound
/// frames, each at most `MAX_PACKET_LENGTH` bytes.
pub trait PacketTransport {
    /// Send a single frame. `buf.len() <= MAX_PACKET_LENGTH`.
    fn send(&mut self, buf: &[u8]) -> Result<(), ()>;

    /// Look at the frame buffered in `slot` without consuming it.
    /// `slot` ranges over `0..self.max_outstanding()`.
    fn peek(&self, slot: usize) -> Option<&[u8]>;

    /// Drop the frame buffered in `slot`, if any. Idempotent.
    fn discard(&mut self, slot: usize);

    /// Number of inbound slots this transport exposes to `peek`/`discard`.
    fn max_outstanding(&self) -> usize;
}
