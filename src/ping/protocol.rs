// Server-list-ping wire format: VarInt coding and packet framing.
//
// Every packet is [VarInt frame length][VarInt packet id][payload].
// VarInts are little-endian groups of 7 bits, MSB set on every byte
// except the last, at most 5 bytes for a 32-bit value.

use bytes::{Buf, BufMut, BytesMut};

use super::PingError;

/// Handshake packet id (handshaking state).
pub const PACKET_ID_HANDSHAKE: i32 = 0x00;
/// Status request packet id (status state); the response reuses the id.
pub const PACKET_ID_STATUS: i32 = 0x00;
/// Protocol version sent in the status handshake. -1 means "just asking".
pub const HANDSHAKE_PROTOCOL_VERSION: i32 = -1;
/// Next-state field value that switches the connection to status.
pub const NEXT_STATE_STATUS: i32 = 1;

/// Longest legal VarInt encoding of a 32-bit value.
pub const MAX_VARINT_BYTES: usize = 5;
/// Upper bound on an accepted response frame. Status documents with
/// favicons and mod lists run tens of KiB; anything past this is junk.
pub const MAX_FRAME_BYTES: usize = 256 * 1024;

pub fn write_varint(out: &mut BytesMut, value: i32) {
    let mut remaining = value as u32;
    loop {
        let byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining == 0 {
            out.put_u8(byte);
            return;
        }
        out.put_u8(byte | 0x80);
    }
}

/// Decode a VarInt from the front of `buf`, advancing it. Bits past the
/// 32nd are dropped, matching the reference servers' int arithmetic.
pub fn read_varint(buf: &mut impl Buf) -> Result<i32, PingError> {
    let mut value: u64 = 0;
    for shift in 0..MAX_VARINT_BYTES {
        if !buf.has_remaining() {
            return Err(PingError::Protocol("truncated VarInt"));
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7f) as u64) << (7 * shift);
        if byte & 0x80 == 0 {
            return Ok(value as u32 as i32);
        }
    }
    Err(PingError::Protocol("VarInt wider than 5 bytes"))
}

/// Protocol string: VarInt byte length, then UTF-8 bytes.
pub fn write_string(out: &mut BytesMut, s: &str) {
    write_varint(out, s.len() as i32);
    out.put_slice(s.as_bytes());
}

/// Prefix a finished packet body with its VarInt length.
pub fn frame(payload: BytesMut) -> BytesMut {
    let mut out = BytesMut::with_capacity(payload.len() + MAX_VARINT_BYTES);
    write_varint(&mut out, payload.len() as i32);
    out.put_slice(&payload);
    out
}

/// Framed status handshake: protocol -1, the dialed address and port,
/// next-state 1.
pub fn handshake_packet(address: &str, port: u16) -> BytesMut {
    let mut payload = BytesMut::with_capacity(address.len() + 16);
    write_varint(&mut payload, PACKET_ID_HANDSHAKE);
    write_varint(&mut payload, HANDSHAKE_PROTOCOL_VERSION);
    write_string(&mut payload, address);
    payload.put_u16(port);
    write_varint(&mut payload, NEXT_STATE_STATUS);
    frame(payload)
}

/// Framed status request; empty beyond the packet id.
pub fn status_request_packet() -> BytesMut {
    let mut payload = BytesMut::with_capacity(1);
    write_varint(&mut payload, PACKET_ID_STATUS);
    frame(payload)
}
