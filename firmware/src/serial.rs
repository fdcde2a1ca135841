// Serial Link Interface
//
// Declares the primary full-duplex serial link between the control host and
// the firmware. The link is byte-reliable but unframed; framing is the
// parser's job. The board layer implements this trait on top of its UART.
//
// Implementation notes:
// - `read_byte` must never block: it returns `None` when no byte is pending
// - `write_byte` carries the single-byte acknowledgement traffic
// - The auxiliary log channel is separate (see `log.rs`) and outbound-only

/// Link rate for both the primary and the auxiliary channel.
pub const BAUD_RATE: u32 = 115_200;

/// 8 data bits, no parity, 1 stop bit.
pub const LINK_FORMAT: &str = "8N1";

pub trait SerialLink {
    /// Next pending byte from the host, if any. Non-blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Queue one byte for transmission to the host.
    fn write_byte(&mut self, byte: u8);
}
