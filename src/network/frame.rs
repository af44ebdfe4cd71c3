//! Fixed 8-byte frames for [OrderMessage].
//!
//! ```text
//!  0   1   2   3   4   5   6   7
//! +---+---+---+---+---+---+---+---+
//! | type  | 0 |id |flr|dir|  crc  |
//! +---+---+---+---+---+---+---+---+
//! ```
//! Bytes 0..6 are ASCII (`"NW"`/`"AC"`/`"CO"`, reserved `'0'`, three digits), so a frame
//! can be read straight off a packet dump. Bytes 6..8 are a big-endian CRC-16/CCITT-FALSE
//! over bytes 0..6.

use thiserror::Error;

use super::{OrderMessage, OrderType};
use crate::config;
use crate::elevio::Direction;

/// Length of every frame on the wire
pub const FRAME_LEN: usize = 8;

/// Number of bytes covered by the checksum
const BODY_LEN: usize = 6;

const RESERVED: u8 = b'0';

/// Why a frame was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame is not exactly [FRAME_LEN] bytes
    #[error("frame has length {0}, expected 8")]
    BadLength(usize),
    /// Trailing CRC does not match the body
    #[error("checksum mismatch: frame says {received:#06x}, body gives {computed:#06x}")]
    ChecksumMismatch {
        /// CRC carried by the frame
        received: u16,
        /// CRC recomputed over the body
        computed: u16,
    },
    /// Unknown type tag
    #[error("unknown type tag {0:?}")]
    UnknownType([u8; 2]),
    /// Reserved byte is not `'0'`
    #[error("reserved byte is {0:#04x}")]
    Reserved(u8),
    /// Sender id is not a digit
    #[error("sender id byte {0:#04x} is not a digit")]
    BadSender(u8),
    /// Floor is not a digit below the number of floors
    #[error("floor byte {0:#04x} is not a valid floor")]
    BadFloor(u8),
    /// Direction is not `'0'` (up) or `'1'` (down)
    #[error("direction byte {0:#04x} is not up or down")]
    BadDirection(u8),
}

/// CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, not reflected, no final xor.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn digit(value: u8) -> u8 {
    debug_assert!(value <= 9, "{} does not fit in one digit", value);
    b'0' + value
}

fn parse_digit(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}

/// Encodes a message into one frame.
///
/// Cab directions never go on the wire; `Direction::None` is written as `'2'` and will be
/// rejected by [decode].
pub fn encode(msg: &OrderMessage) -> [u8; FRAME_LEN] {
    let tag = msg.kind.tag();
    let dir = match msg.direction {
        Direction::Up => b'0',
        Direction::Down => b'1',
        Direction::None => b'2',
    };

    let mut frame = [0u8; FRAME_LEN];
    frame[..BODY_LEN].copy_from_slice(&[
        tag[0],
        tag[1],
        RESERVED,
        digit(msg.sender_id),
        digit(msg.floor),
        dir,
    ]);
    let crc = crc16(&frame[..BODY_LEN]);
    frame[BODY_LEN..].copy_from_slice(&crc.to_be_bytes());
    frame
}

/// Decodes one frame.
///
/// Length and checksum are checked before any field is looked at.
pub fn decode(frame: &[u8]) -> Result<OrderMessage, FrameError> {
    if frame.len() != FRAME_LEN {
        return Err(FrameError::BadLength(frame.len()));
    }

    let received = u16::from_be_bytes([frame[6], frame[7]]);
    let computed = crc16(&frame[..BODY_LEN]);
    if received != computed {
        return Err(FrameError::ChecksumMismatch { received, computed });
    }

    let tag = [frame[0], frame[1]];
    let kind = match OrderType::from_tag(tag) {
        OrderType::Invalid => return Err(FrameError::UnknownType(tag)),
        kind => kind,
    };

    if frame[2] != RESERVED {
        return Err(FrameError::Reserved(frame[2]));
    }

    let sender_id = parse_digit(frame[3]).ok_or(FrameError::BadSender(frame[3]))?;

    let floor = parse_digit(frame[4])
        .filter(|f| *f < config::NUM_FLOORS)
        .ok_or(FrameError::BadFloor(frame[4]))?;

    let direction = match frame[5] {
        b'0' => Direction::Up,
        b'1' => Direction::Down,
        other => return Err(FrameError::BadDirection(other)),
    };

    Ok(OrderMessage { kind, sender_id, floor, direction })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(kind: OrderType, sender_id: u8, floor: u8, direction: Direction) -> OrderMessage {
        OrderMessage { kind, sender_id, floor, direction }
    }

    #[test]
    fn crc_matches_reference_check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn frame_body_is_readable_text() {
        let frame = encode(&msg(OrderType::AcceptedOrder, 3, 2, Direction::Down));
        assert_eq!(&frame[..6], b"AC0321");
        assert_eq!(u16::from_be_bytes([frame[6], frame[7]]), crc16(b"AC0321"));
    }

    #[test]
    fn decode_inverts_encode() {
        let cases = [
            msg(OrderType::NewOrder, 0, 0, Direction::Up),
            msg(OrderType::AcceptedOrder, 9, 3, Direction::Down),
            msg(OrderType::CompletedOrder, 4, 1, Direction::Up),
        ];
        for m in cases {
            assert_eq!(decode(&encode(&m)), Ok(m));
        }
    }

    #[test]
    fn wrong_length_is_rejected_before_checksum() {
        let frame = encode(&msg(OrderType::NewOrder, 1, 1, Direction::Up));
        assert_eq!(decode(&frame[..7]), Err(FrameError::BadLength(7)));

        let mut long = frame.to_vec();
        long.push(0);
        assert_eq!(decode(&long), Err(FrameError::BadLength(9)));
        assert_eq!(decode(&[]), Err(FrameError::BadLength(0)));
    }

    #[test]
    fn cab_direction_does_not_survive_the_wire() {
        let frame = encode(&msg(OrderType::NewOrder, 1, 1, Direction::None));
        assert_eq!(decode(&frame), Err(FrameError::BadDirection(b'2')));
    }

    /// Builds a frame with a valid checksum around an arbitrary body
    fn with_crc(body: &[u8; 6]) -> [u8; 8] {
        let mut frame = [0u8; 8];
        frame[..6].copy_from_slice(body);
        frame[6..].copy_from_slice(&crc16(body).to_be_bytes());
        frame
    }

    #[test]
    fn well_checksummed_garbage_is_still_rejected() {
        assert_eq!(decode(&with_crc(b"XX0110")), Err(FrameError::UnknownType(*b"XX")));
        assert_eq!(decode(&with_crc(b"NW1110")), Err(FrameError::Reserved(b'1')));
        assert_eq!(decode(&with_crc(b"NW0a10")), Err(FrameError::BadSender(b'a')));
        assert_eq!(decode(&with_crc(b"NW0190")), Err(FrameError::BadFloor(b'9')));
        assert_eq!(decode(&with_crc(b"NW0115")), Err(FrameError::BadDirection(b'5')));
    }

    fn any_message() -> impl Strategy<Value = OrderMessage> {
        (
            prop_oneof![
                Just(OrderType::NewOrder),
                Just(OrderType::AcceptedOrder),
                Just(OrderType::CompletedOrder),
            ],
            0..=9u8,
            0..config::NUM_FLOORS,
            prop_oneof![Just(Direction::Up), Just(Direction::Down)],
        )
            .prop_map(|(kind, id, floor, dir)| msg(kind, id, floor, dir))
    }

    proptest! {
        #[test]
        fn single_bit_flip_in_body_is_detected(m in any_message(), byte in 0..6usize, bit in 0..8u8) {
            let mut frame = encode(&m);
            frame[byte] ^= 1 << bit;
            let is_checksum_mismatch = matches!(decode(&frame), Err(FrameError::ChecksumMismatch { .. }));
            prop_assert!(is_checksum_mismatch);
        }

        #[test]
        fn every_valid_message_round_trips(m in any_message()) {
            prop_assert_eq!(decode(&encode(&m)), Ok(m));
        }
    }
}
