/*
 * Message Fragmentation (Send)
 *
 * Splits a logical message into `MAX_MESSAGE_DATA_LENGTH`-sized fragments
 * and pushes each one into the transport. The fragment loop always runs
 * at least once, so a zero-length message still emits one header-only
 * fragment. The sequence counter is read once up front and only
 * persisted back, advanced, once every fragment has sent: a transport
 * failure partway through a message leaves the counter exactly where it
 * was, so the next call reuses the same sequence number rather than
 * burning it on a message nobody received.
 */

use core::cell::RefCell;

use critical_section::Mutex;

use crate::config::{MAX_MESSAGE_DATA_LENGTH, MAX_MESSAGE_LENGTH, MAX_PACKET_LENGTH, MESSAGE_HEADER_LENGTH};

use super::header::FragmentHeader;
use super::transport::PacketTransport;
use super::SendError;

static SEQUENCE: Mutex<RefCell<u16>> = Mutex::new(RefCell::new(1));

/// The sequence number this call to `message_send` will use: the current
/// value of the counter, left unchanged until the whole message sends.
fn current_sequence() -> u16 {
    critical_section::with(|cs| *SEQUENCE.borrow(cs).borrow())
}

/// Advance the sequence counter after a fully successful send, skipping
/// the reserved value 0 on wraparound.
fn advance_sequence() {
    critical_section::with(|cs| {
        let cell = SEQUENCE.borrow(cs);
        let mut next = cell.borrow().wrapping_add(1);
        if next == 0 {
            next = 1;
        }
        *cell.borrow_mut() = next;
    });
}

/// Split `data` into fragments and send each one through `transport`.
///
/// A zero-length message still emits exactly one header-only fragment,
/// and every fragment carries the same `type_id`, `sequence`, and total
/// `length`, varying only in `offset` and payload.
pub fn message_send(
    transport: &mut dyn PacketTransport,
    type_id: u16,
    data: &[u8],
) -> Result<(), SendError> {
    if data.len() > MAX_MESSAGE_LENGTH {
        return Err(SendError::TooLarge);
    }

    let sequence = current_sequence();
    let length = data.len() as u16;

    let mut buf = [0u8; MAX_PACKET_LENGTH];
    let mut offset = 0usize;
    loop {
        let remaining = data.len() - offset;
        let chunk_len = remaining.min(MAX_MESSAGE_DATA_LENGTH);

        let header = FragmentHeader {
            type_id,
            sequence,
            length,
            offset: offset as u16,
        };
        header.encode(&mut buf[..MESSAGE_HEADER_LENGTH]);
        if chunk_len > 0 {
            buf[MESSAGE_HEADER_LENGTH..MESSAGE_HEADER_LENGTH + chunk_len]
                .copy_from_slice(&data[offset..offset + chunk_len]);
        }

        transport
            .send(&buf[..MESSAGE_HEADER_LENGTH + chunk_len])
            .map_err(|_| SendError::TransportFailure)?;

        offset += chunk_len;
        if offset >= data.len() {
            break;
        }
    }

    advance_sequence();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    #[test]
    fn zero_length_message_emits_one_header_only_fragment() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 7, &[]).unwrap();
        assert_eq!(transport.sent.len(), 1);
        assert_eq!(transport.sent[0].len(), MESSAGE_HEADER_LENGTH);
    }

    #[test]
    fn small_message_matches_worked_example() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 0x1234, &[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        assert_eq!(transport.sent.len(), 1);
        let frame = &transport.sent[0];
        assert_eq!(frame.len(), 12);
        let header = FragmentHeader::decode(frame).unwrap();
        assert_eq!(header.type_id, 0x1234);
        assert_eq!(header.length, 4);
        assert_eq!(header.offset, 0);
        assert_ne!(header.sequence, 0);
        assert_eq!(&frame[MESSAGE_HEADER_LENGTH..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn too_large_message_is_rejected() {
        let mut transport = MockTransport::new();
        let data = vec![0u8; MAX_MESSAGE_LENGTH + 1];
        assert_eq!(message_send(&mut transport, 0, &data), Err(SendError::TooLarge));
    }

    #[test]
    fn sequence_numbers_advance_and_skip_zero() {
        let mut transport = MockTransport::new();
        message_send(&mut transport, 0, &[1]).unwrap();
        message_send(&mut transport, 0, &[2]).unwrap();
        let first = FragmentHeader::decode(&transport.sent[0]).unwrap().sequence;
        let second = FragmentHeader::decode(&transport.sent[1]).unwrap().sequence;
        assert_ne!(first, 0);
        assert_ne!(second, 0);
        assert_ne!(first, second);
    }

    #[test]
    fn failed_transport_send_does_not_advance_sequence() {
        let mut transport = MockTransport::new();
        let before = current_sequence();
        transport.fail_next_send = true;
        assert_eq!(
            message_send(&mut transport, 0, &[1, 2, 3]),
            Err(SendError::TransportFailure)
        );
        assert_eq!(current_sequence(), before);
    }
}
