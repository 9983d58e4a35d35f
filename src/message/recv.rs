/*
 * Message Reassembly (Recv)
 *
 * Stateless-across-calls reassembly over whatever fragments the transport
 * currently has buffered. Three passes: catalog every buffered fragment
 * by sequence, find the first sequence whose presence bitmap is fully
 * set, then deliver it by re-walking the transport and discarding each
 * matching fragment. Redone from scratch on every call rather than
 * hoisted into persistent state — simpler, at the cost of an
 * O(MAX_OUTSTANDING_PACKETS^2) worst case across the two scans.
 */

use alloc::vec;
use alloc::vec::Vec;

use crate::config::{MAX_MESSAGE_DATA_LENGTH, MAX_OUTSTANDING_PACKETS, MESSAGE_HEADER_LENGTH};

use super::header::FragmentHeader;
use super::transport::PacketTransport;
use super::{ReceivedMessage, RecvError};

/// One sequence's reassembly bookkeeping, alive only for the duration of
/// a single `message_recv` call.
struct TrackingSlot {
    sequence: u16,
    length: u16,
    /// One byte per fragment needed; `presence[i] != 0` once fragment `i`
    /// (offset `i * MAX_MESSAGE_DATA_LENGTH`) has been seen.
    presence: Vec<u8>,
}

impl TrackingSlot {
    fn ready(&self) -> bool {
        self.presence.iter().all(|&b| b != 0)
    }
}

fn fragments_needed(length: u16) -> usize {
    if length == 0 {
        0
    } else {
        (length as usize + MAX_MESSAGE_DATA_LENGTH - 1) / MAX_MESSAGE_DATA_LENGTH
    }
}

/// Attempt to reassemble one complete message from `transport`'s
/// currently buffered fragments.
///
/// Returns `RecvError::Incomplete` if no sequence is fully present yet;
/// the transport is left untouched except for fragments discarded as
/// malformed (shorter than the header) or carrying the reserved
/// sequence 0.
pub fn message_recv(transport: &mut dyn PacketTransport) -> Result<ReceivedMessage, RecvError> {
    let outstanding = transport.max_outstanding().min(MAX_OUTSTANDING_PACKETS);
    let mut tracked: Vec<TrackingSlot> = Vec::new();

    // Pass 1: catalog every buffered fragment by sequence.
    for slot in 0..outstanding {
        let frame = match transport.peek(slot) {
            Some(frame) => frame,
            None => continue,
        };

        let header = match FragmentHeader::decode(frame) {
            Some(header) => header,
            None => {
                transport.discard(slot);
                continue;
            }
        };

        if header.sequence == 0 {
            transport.discard(slot);
            continue;
        }

        let index = match tracked.iter().position(|t| t.sequence == header.sequence) {
            Some(index) => index,
            None => {
                if tracked.len() >= MAX_OUTSTANDING_PACKETS {
                    continue;
                }
                let need = fragments_needed(header.length);
                tracked.push(TrackingSlot {
                    sequence: header.sequence,
                    length: header.length,
                    presence: vec![0u8; need],
                });
                tracked.len() - 1
            }
        };

        let need = fragments_needed(header.length);
        if need > 0 {
            let fragment_index = header.offset as usize / MAX_MESSAGE_DATA_LENGTH;
            if fragment_index < tracked[index].presence.len() {
                tracked[index].presence[fragment_index] = 1;
            }
        }
    }

    // Pass 2: the first slot (in creation order) that is fully present wins.
    let winner = match tracked.iter().find(|t| t.ready()) {
        Some(winner) => winner,
        None => return Err(RecvError::Incomplete),
    };
    let sequence = winner.sequence;
    let length = winner.length;

    // Pass 3: deliver by re-walking the transport and discarding matches.
    let mut data = if length > 0 {
        vec![0u8; length as usize]
    } else {
        Vec::new()
    };
    let mut type_id = 0u16;

    for slot in 0..outstanding {
        let frame = match transport.peek(slot) {
            Some(frame) => frame,
            None => continue,
        };
        let header = match FragmentHeader::decode(frame) {
            Some(header) => header,
            None => continue,
        };
        if header.sequence != sequence {
            continue;
        }

        type_id = header.type_id;
        if length > 0 {
            let payload = &frame[MESSAGE_HEADER_LENGTH..];
            let start = header.offset as usize;
            let end = (start + payload.len()).min(data.len());
            if start < data.len() {
                data[start..end].copy_from_slice(&payload[..end - start]);
            }
        }
        transport.discard(slot);
    }

    Ok(ReceivedMessage {
        type_id,
        data,
        length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::send::message_send;
    use crate::testing::MockTransport;

    #[test]
    fn round_trip_small_message() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 0x1234, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        transport.deliver_all_sent();

        let received = message_recv(&mut transport).unwrap();
        assert_eq!(received.type_id, 0x1234);
        assert_eq!(received.length, 4);
        assert_eq!(received.data, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn fragmented_message_reassembles_out_of_order() {
        let mut transport = MockTransport::new();
        let total_len = 2 * MAX_MESSAGE_DATA_LENGTH + 10;
        let data: Vec<u8> = (0..total_len).map(|i| (i % 251) as u8).collect();
        message_send(&mut transport, 9, &data).unwrap();
        assert_eq!(transport.sent.len(), 3);
        transport.deliver_reversed();

        let received = message_recv(&mut transport).unwrap();
        assert_eq!(received.type_id, 9);
        assert_eq!(received.length, total_len as u16);
        assert_eq!(received.data, data);
    }

    #[test]
    fn zero_length_message_round_trips() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 7, &[]).unwrap();
        transport.deliver_all_sent();

        let received = message_recv(&mut transport).unwrap();
        assert_eq!(received.type_id, 7);
        assert_eq!(received.length, 0);
        assert!(received.data.is_empty());
    }

    #[test]
    fn incomplete_message_yields_incomplete() {
        let mut transport = MockTransport::new();
        let total_len = 2 * MAX_MESSAGE_DATA_LENGTH + 10;
        let data: Vec<u8> = (0..total_len).map(|i| (i % 251) as u8).collect();
        message_send(&mut transport, 9, &data).unwrap();
        assert_eq!(transport.sent.len(), 3);
        // Only deliver the first two of three fragments.
        transport.deliver_sent_range(0..2);

        assert_eq!(message_recv(&mut transport), Err(RecvError::Incomplete));
    }

    #[test]
    fn malformed_fragments_are_discarded_without_disturbing_others() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 1, &[0xAA]).unwrap();
        transport.deliver_all_sent();
        // Inject a too-short "fragment" and one with sequence 0.
        transport.inject_raw(&[0x00, 0x00, 0x00]);
        transport.inject_raw(&[0x01, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0xFF]);

        let received = message_recv(&mut transport).unwrap();
        assert_eq!(received.data, vec![0xAA]);
        for slot in 0..transport.max_outstanding() {
            assert!(transport.peek(slot).is_none());
        }
    }
}
