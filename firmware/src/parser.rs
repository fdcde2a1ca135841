// Frame Parser
//
// Reassembles the host's byte stream into validated frame payloads. The
// parser is a three-state machine driven one byte at a time; it is
// resumable across arbitrarily many byte arrivals and defines no timeout.
//
// Frame layout on the wire:
//   SYNC (0xAA) | LEN (1..=31) | PAYLOAD[LEN] | CRC
// The CRC covers the payload only.
//
// State machine:
// - `Sync`: discard bytes until the sync marker appears. Garbage here is
//   silent: no event, no acknowledgement. This is the resync path after
//   corruption.
// - `Length`: one byte. Zero and values above the payload cap abort the
//   frame with an error event and fall back to `Sync`.
// - `Payload`: accumulate `LEN` payload bytes plus the trailing CRC byte,
//   then verify. Valid payloads are handed up as owned copies; mismatches
//   report expected vs received.
//
// Correctness notes:
// - A sync byte inside a payload needs no escaping: the length field fixes
//   the frame boundary deterministically
// - A second 0xAA while in `Length` is read as a length value (170), which
//   exceeds the cap and aborts the frame
// - Every completed or aborted frame returns the machine to `Sync`

use heapless::Vec;

use crate::crc;
use crate::protocol::{MAX_PACKET_SIZE, MAX_PAYLOAD_LEN, SYNC};

/// Owned copy of one validated frame payload (opcode + parameters).
pub type Payload = Vec<u8, MAX_PAYLOAD_LEN>;

/// Outcome of feeding one byte, when the byte completes or aborts a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// CRC-valid payload, ready for dispatch.
    Frame(Payload),
    /// `LEN == 0`: a frame with no opcode.
    EmptyFrame,
    /// `LEN` above the payload cap.
    InvalidLength { len: u8 },
    CrcMismatch { expected: u8, received: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Sync,
    Length,
    Payload,
}

pub struct FrameParser {
    state: RxState,
    /// Payload bytes followed by the CRC byte.
    buf: [u8; MAX_PACKET_SIZE],
    /// Payload length announced by the LEN field.
    want: usize,
    /// Bytes accumulated so far in `Payload` state.
    have: usize,
}

impl FrameParser {
    pub const fn new() -> Self {
        Self {
            state: RxState::Sync,
            buf: [0; MAX_PACKET_SIZE],
            want: 0,
            have: 0,
        }
    }

    /// Advance the machine by one received byte.
    pub fn feed(&mut self, byte: u8) -> Option<ParseEvent> {
        match self.state {
            RxState::Sync => {
                if byte == SYNC {
                    self.state = RxState::Length;
                }
                None
            }
            RxState::Length => {
                if byte == 0 {
                    self.state = RxState::Sync;
                    return Some(ParseEvent::EmptyFrame);
                }
                if byte as usize > MAX_PAYLOAD_LEN {
                    self.state = RxState::Sync;
                    return Some(ParseEvent::InvalidLength { len: byte });
                }
                self.want = byte as usize;
                self.have = 0;
                self.state = RxState::Payload;
                None
            }
            RxState::Payload => {
                self.buf[self.have] = byte;
                self.have += 1;
                if self.have < self.want + 1 {
                    return None;
                }

                self.state = RxState::Sync;
                let expected = crc::crc8(&self.buf[..self.want]);
                let received = self.buf[self.want];
                if expected != received {
                    return Some(ParseEvent::CrcMismatch { expected, received });
                }

                let mut payload = Payload::new();
                // `want` is capped by the LEN check, so this cannot truncate.
                let _ = payload.extend_from_slice(&self.buf[..self.want]);
                Some(ParseEvent::Frame(payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(parser: &mut FrameParser, bytes: &[u8]) -> std::vec::Vec<ParseEvent> {
        bytes.iter().filter_map(|&b| parser.feed(b)).collect()
    }

    fn framed(payload: &[u8]) -> std::vec::Vec<u8> {
        let mut out = vec![SYNC, payload.len() as u8];
        out.extend_from_slice(payload);
        out.push(crc::crc8(payload));
        out
    }

    #[test]
    fn test_valid_frame() {
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &framed(&[0x01, 0x05, 0xFB, 0x00]));
        assert_eq!(events.len(), 1);
        match &events[0] {
            ParseEvent::Frame(payload) => assert_eq!(payload.as_slice(), &[0x01, 0x05, 0xFB, 0x00]),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_garbage_before_sync_is_silent() {
        let mut parser = FrameParser::new();
        assert!(feed_all(&mut parser, &[0x00, 0xFF, 0x42, 0x13]).is_empty());
        // The machine still accepts a frame afterwards.
        let events = feed_all(&mut parser, &framed(&[0x13]));
        assert!(matches!(events[0], ParseEvent::Frame(_)));
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &[SYNC, 0x00]);
        assert_eq!(events, vec![ParseEvent::EmptyFrame]);
        // Back in sync state: the next frame parses cleanly.
        let events = feed_all(&mut parser, &framed(&[0x13]));
        assert!(matches!(events[0], ParseEvent::Frame(_)));
    }

    #[test]
    fn test_oversize_length_rejected() {
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &[SYNC, 32]);
        assert_eq!(events, vec![ParseEvent::InvalidLength { len: 32 }]);
    }

    #[test]
    fn test_max_length_accepted() {
        let payload: std::vec::Vec<u8> = (0..31).collect();
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &framed(&payload));
        match &events[0] {
            ParseEvent::Frame(got) => assert_eq!(got.as_slice(), payload.as_slice()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_sync_byte_as_length_is_oversize() {
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &[SYNC, SYNC]);
        assert_eq!(events, vec![ParseEvent::InvalidLength { len: SYNC }]);
    }

    #[test]
    fn test_crc_mismatch_reports_both_values() {
        let payload = [0x01, 0x05, 0xFB, 0x00];
        let good = crc::crc8(&payload);
        let mut bytes = framed(&payload);
        *bytes.last_mut().unwrap() ^= 0xFF;

        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &bytes);
        assert_eq!(
            events,
            vec![ParseEvent::CrcMismatch {
                expected: good,
                received: good ^ 0xFF,
            }]
        );
    }

    #[test]
    fn test_sync_byte_inside_payload() {
        let payload = [0x14, SYNC, SYNC, SYNC];
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &framed(&payload));
        match &events[0] {
            ParseEvent::Frame(got) => assert_eq!(got.as_slice(), &payload),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_resumable_across_partial_delivery() {
        let bytes = framed(&[0x02, 0x01]);
        let mut parser = FrameParser::new();
        let (first, rest) = bytes.split_at(2);
        assert!(feed_all(&mut parser, first).is_empty());
        let events = feed_all(&mut parser, rest);
        assert!(matches!(events[0], ParseEvent::Frame(_)));
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut bytes = framed(&[0x13]);
        bytes.extend_from_slice(&framed(&[0x02, 0x01]));
        let mut parser = FrameParser::new();
        let events = feed_all(&mut parser, &bytes);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| matches!(e, ParseEvent::Frame(_))));
    }
}
