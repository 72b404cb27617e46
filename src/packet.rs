//! Wire-format definitions for protocol packets.
//!
//! Every unit exchanged between sender and receiver is a [`Packet`].  This
//! module is responsible for:
//! - Defining the fixed on-wire binary layout (no variable-length fields).
//! - Serialising a [`Packet`] into a byte buffer and back.
//! - Computing and validating the integrity checksum used as the
//!   corruption-detection oracle.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                 Acknowledgment Number (i32)                   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |        Payload ...            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `acknum` is `-1` for data packets; ACK packets carry the acknowledged
//! sequence number.  The payload is always exactly [`PAYLOAD_SIZE`] bytes —
//! one application [`Message`] per packet, no fragmentation.
//!
//! Total frame size: [`WIRE_LEN`] = 26 bytes.
//! seq(4) + ack(4) + checksum(2) + payload(16)

/// Payload bytes carried by every packet (configuration constant).
pub const PAYLOAD_SIZE: usize = 16;

/// Byte length of the fixed header on the wire.
pub const HEADER_LEN: usize = 10;

/// Byte length of a complete serialised frame.
pub const WIRE_LEN: usize = HEADER_LEN + PAYLOAD_SIZE;

// Byte offsets of each field within the serialised frame.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_CHECKSUM: usize = 8;
const OFF_PAYLOAD: usize = 10;

/// The application-layer unit: a fixed-size chunk of bytes.
///
/// One packet carries exactly one message; short application writes must be
/// padded by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message {
    pub data: [u8; PAYLOAD_SIZE],
}

/// A complete protocol frame.
///
/// Fields are in host byte order; [`Packet::encode`] converts to big-endian
/// on the wire and [`Packet::decode`] converts back.  The checksum field is
/// set at construction and deliberately **not** recomputed afterwards, so a
/// payload mutated in flight fails [`Packet::is_valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet {
    /// Sequence number, in `0..SEQ_LEN`.
    pub seqnum: u32,
    /// `-1` for data packets; acknowledged sequence number for ACKs.
    pub acknum: i32,
    /// Internet checksum (RFC 1071) over the frame with this field zeroed.
    pub checksum: u16,
    /// Fixed-size payload (all zeros for ACK packets).
    pub payload: [u8; PAYLOAD_SIZE],
}

impl Packet {
    /// Build a data packet carrying one message, checksum filled in.
    pub fn data(seqnum: u32, payload: [u8; PAYLOAD_SIZE]) -> Self {
        let mut pkt = Self {
            seqnum,
            acknum: -1,
            checksum: 0,
            payload,
        };
        pkt.checksum = pkt.compute_checksum();
        pkt
    }

    /// Build an ACK packet for `acknum`, checksum filled in.
    pub fn ack(acknum: u32) -> Self {
        let mut pkt = Self {
            seqnum: 0,
            acknum: acknum as i32,
            checksum: 0,
            payload: [0u8; PAYLOAD_SIZE],
        };
        pkt.checksum = pkt.compute_checksum();
        pkt
    }

    /// The acknowledged sequence number, or `None` for data packets.
    pub fn ack_seq(&self) -> Option<u32> {
        if self.acknum >= 0 {
            Some(self.acknum as u32)
        } else {
            None
        }
    }

    /// Recompute the checksum over this packet with the checksum field
    /// neutralised.  Deterministic and order-sensitive over every other
    /// field including all payload bytes.
    pub fn compute_checksum(&self) -> u16 {
        let mut buf = self.encode();
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&0u16.to_be_bytes());
        internet_checksum(&buf)
    }

    /// `true` when the stored checksum matches the recomputed one.
    ///
    /// This is the corruption oracle: any single flipped payload or header
    /// byte makes it return `false`.
    pub fn is_valid(&self) -> bool {
        self.compute_checksum() == self.checksum
    }

    /// Serialise this packet into a fixed-size byte array.
    pub fn encode(&self) -> [u8; WIRE_LEN] {
        let mut buf = [0u8; WIRE_LEN];
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.acknum.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&self.checksum.to_be_bytes());
        buf[OFF_PAYLOAD..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Only the frame length is enforced here; checksum verification is a
    /// protocol event, not a parse error, so corrupted frames decode
    /// successfully and fail [`Packet::is_valid`] instead.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() != WIRE_LEN {
            return Err(PacketError::BadLength(buf.len()));
        }

        let seqnum = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());
        let acknum = i32::from_be_bytes(buf[OFF_ACK..OFF_ACK + 4].try_into().unwrap());
        let checksum =
            u16::from_be_bytes(buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].try_into().unwrap());
        let mut payload = [0u8; PAYLOAD_SIZE];
        payload.copy_from_slice(&buf[OFF_PAYLOAD..]);

        Ok(Packet {
            seqnum,
            acknum,
            checksum,
            payload,
        })
    }
}

/// Errors that can arise when parsing a raw frame.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer length differs from the fixed frame size.
    BadLength(usize),
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::BadLength(n) => {
                write!(f, "frame is {n} bytes, expected exactly {WIRE_LEN}")
            }
        }
    }
}

impl std::error::Error for PacketError {}

/// Compute the Internet checksum (RFC 1071) over `data`.
///
/// Sum consecutive 16-bit big-endian words, fold the carry, return the
/// one's-complement.  The caller must zero any checksum field within `data`
/// before calling this function.
fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut i = 0;

    while i + 1 < data.len() {
        sum += u32::from(u16::from_be_bytes([data[i], data[i + 1]]));
        i += 2;
    }
    // Odd trailing byte — pad with a zero byte on the right.
    if i < data.len() {
        sum += u32::from(data[i]) << 8;
    }

    // Fold 32-bit sum into 16 bits.
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}
