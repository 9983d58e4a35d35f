/*
 * Test-Only Mock Transport
 *
 * A fixed-capacity, host-side stand-in for the packet transport external
 * collaborator. `send` only records into `sent`; tests explicitly
 * `deliver_*` recorded frames into the inbound slots so fragment
 * ordering, partial delivery, and malformed-fragment injection can all
 * be driven directly.
 */

use core::ops::Range;

use crate::config::MAX_OUTSTANDING_PACKETS;
use crate::message::PacketTransport;

pub(crate) struct MockTransport {
    pub(crate) sent: Vec<Vec<u8>>,
    slots: [Option<Vec<u8>>; MAX_OUTSTANDING_PACKETS],
    pub(crate) fail_next_send: bool,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            sent: Vec::new(),
            slots: core::array::from_fn(|_| None),
            fail_next_send: false,
        }
    }

    /// Move every frame recorded in `sent` into inbound slots, in order.
    pub(crate) fn deliver_all_sent(&mut self) {
        let range = 0..self.sent.len();
        self.deliver_sent_range(range);
    }

    /// Move a subrange of `sent` into inbound slots, in order.
    pub(crate) fn deliver_sent_range(&mut self, range: Range<usize>) {
        for frame in self.sent[range].iter() {
            self.push_into_free_slot(frame.clone());
        }
    }

    /// Move every frame recorded in `sent` into inbound slots, reversed.
    pub(crate) fn deliver_reversed(&mut self) {
        for frame in self.sent.iter().rev().cloned().collect::<Vec<_>>() {
            self.push_into_free_slot(frame);
        }
    }

    /// Inject a raw, hand-built frame directly into an inbound slot,
    /// bypassing `message_send` entirely (for malformed-fragment tests).
    pub(crate) fn inject_raw(&mut self, frame: &[u8]) {
        self.push_into_free_slot(frame.to_vec());
    }

    fn push_into_free_slot(&mut self, frame: Vec<u8>) {
        if let Some(slot) = self.slots.iter().position(Option::is_none) {
            self.slots[slot] = Some(frame);
        }
    }
}

impl PacketTransport for MockTransport {
    fn send(&mut self, buf: &[u8]) -> Result<(), ()> {
        if self.fail_next_send {
            self.fail_next_send = false;
            return Err(());
        }
        self.sent.push(buf.to_vec());
        Ok(())
    }

    fn peek(&self, slot: usize) -> Option<&[u8]> {
        self.slots.get(slot)?.as_deref()
    }

    fn discard(&mut self, slot: usize) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = None;
        }
    }

    fn max_outstanding(&self) -> usize {
        MAX_OUTSTANDING_PACKETS
    }
}
