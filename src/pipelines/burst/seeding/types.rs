// Seed key and seed payload types
//
// A seed tuple travels from the generator to the join as a byte payload:
//
//   byte 0     flags: bit 0 = is_reference, bit 4 = is_reverse_complement
//   bytes 1-4  offset (u32 BE): reference position, or seed start in the read
//   bytes 5-8  id (u32 BE): sequence id or read id
//   bytes 9..  packed-4 left flank (reversed), 0xFF, packed-4 right flank

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::core::compute::encoding::{self, PAD_NIBBLE, TERMINATOR};
use crate::error::{BurstError, Result};

const KIND: &str = "seed";
const HEADER_LEN: usize = 9;
const FLAG_REFERENCE: u8 = 0x01;
const FLAG_REVERSE_COMPLEMENT: u8 = 0x10;

/// Packed 2-bit seed window plus optional redundancy slot byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeedKey(pub Vec<u8>);

impl SeedKey {
    pub fn new(window: &[u8], slot: u32, redundancy: u32) -> Self {
        SeedKey(encoding::encode_seed(window, slot, redundancy))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Human-readable form for log and error context: the bases, then the
    /// redundancy slot when the key carries one.
    pub fn describe(&self, seed_len: usize) -> String {
        let bases = String::from_utf8_lossy(&encoding::decode_seed(&self.0, seed_len)).into_owned();
        if self.0.len() > seed_len.div_ceil(4) {
            format!("{}/{}", bases, self.0[self.0.len() - 1])
        } else {
            bases
        }
    }
}

/// A seed occurrence with the flanks needed to extend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTuple {
    pub is_reference: bool,
    pub is_reverse_complement: bool,
    /// Absolute reference position of the seed, or its start in the read
    pub offset: u32,
    /// Reference sequence id or read id
    pub id: u32,
    /// Bases left of the seed, packed-4, nearest base first
    pub left_flank: Vec<u8>,
    /// Bases right of the seed, packed-4
    pub right_flank: Vec<u8>,
}

/// Encode a seed payload straight from an ASCII sequence without building a
/// [`SeedTuple`] first. `left` is stored reversed.
pub fn encode_payload(
    is_reference: bool,
    is_reverse_complement: bool,
    offset: u32,
    id: u32,
    seq: &[u8],
    left: Range<usize>,
    right: Range<usize>,
) -> Vec<u8> {
    let left_bytes = encoding::packed_len(left.len());
    let right_bytes = encoding::packed_len(right.len());
    let mut out = vec![0u8; HEADER_LEN + left_bytes + 1 + right_bytes];

    out[0] = flags(is_reference, is_reverse_complement);
    out[1..5].copy_from_slice(&offset.to_be_bytes());
    out[5..9].copy_from_slice(&id.to_be_bytes());

    let mut pos = HEADER_LEN;
    pos += encoding::encode_reversed_into(&seq[left], &mut out[pos..pos + left_bytes]);
    out[pos] = TERMINATOR;
    pos += 1;
    encoding::encode_into(&seq[right], &mut out[pos..]);

    out
}

#[inline]
fn flags(is_reference: bool, is_reverse_complement: bool) -> u8 {
    let mut f = 0;
    if is_reference {
        f |= FLAG_REFERENCE;
    }
    if is_reverse_complement {
        f |= FLAG_REVERSE_COMPLEMENT;
    }
    f
}

/// Reject anything that is not a well-formed packed-4 buffer: the pad nibble
/// may only appear in the low half of the final byte.
fn check_packed(packed: &[u8], side: &str) -> Result<()> {
    let Some((last, body)) = packed.split_last() else {
        return Ok(());
    };
    let bad_body = body
        .iter()
        .any(|&b| b >> 4 == PAD_NIBBLE || b & 0x0F == PAD_NIBBLE);
    if bad_body || last >> 4 == PAD_NIBBLE {
        return Err(BurstError::malformed(
            KIND,
            format!("pad nibble inside {} flank", side),
        ));
    }
    Ok(())
}

impl SeedTuple {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(HEADER_LEN + self.left_flank.len() + 1 + self.right_flank.len());
        out.push(flags(self.is_reference, self.is_reverse_complement));
        out.extend_from_slice(&self.offset.to_be_bytes());
        out.extend_from_slice(&self.id.to_be_bytes());
        out.extend_from_slice(&self.left_flank);
        out.push(TERMINATOR);
        out.extend_from_slice(&self.right_flank);
        out
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < HEADER_LEN + 1 {
            return Err(BurstError::malformed(
                KIND,
                format!("{} bytes, at least {} required", raw.len(), HEADER_LEN + 1),
            ));
        }

        let flag_byte = raw[0];
        if flag_byte & !(FLAG_REFERENCE | FLAG_REVERSE_COMPLEMENT) != 0 {
            return Err(BurstError::malformed(
                KIND,
                format!("unknown flag bits {:#04x}", flag_byte),
            ));
        }

        let flanks = &raw[HEADER_LEN..];
        let split = flanks
            .iter()
            .position(|&b| b == TERMINATOR)
            .ok_or_else(|| BurstError::malformed(KIND, "missing flank terminator"))?;
        let (left, right) = (&flanks[..split], &flanks[split + 1..]);
        check_packed(left, "left")?;
        check_packed(right, "right")?;

        Ok(Self {
            is_reference: flag_byte & FLAG_REFERENCE != 0,
            is_reverse_complement: flag_byte & FLAG_REVERSE_COMPLEMENT != 0,
            offset: u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]),
            id: u32::from_be_bytes([raw[5], raw[6], raw[7], raw[8]]),
            left_flank: left.to_vec(),
            right_flank: right.to_vec(),
        })
    }

    /// Number of bases in the left flank.
    pub fn left_len(&self) -> usize {
        encoding::packed_base_len(&self.left_flank)
    }

    /// Number of bases in the right flank.
    pub fn right_len(&self) -> usize {
        encoding::packed_base_len(&self.right_flank)
    }
}

/// `is_ref;is_rc;offset;id;left;right`, left flank as stored (reversed).
impl fmt::Display for SeedTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};{};{};{};{};{}",
            u8::from(self.is_reference),
            u8::from(self.is_reverse_complement),
            self.offset,
            self.id,
            String::from_utf8_lossy(&encoding::decode(&self.left_flank)),
            String::from_utf8_lossy(&encoding::decode(&self.right_flank)),
        )
    }
}

fn parse_flag(field: &str, name: &str) -> Result<bool> {
    match field {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(BurstError::malformed(KIND, format!("{} {:?}", name, other))),
    }
}

fn parse_u32(field: &str, name: &str) -> Result<u32> {
    field
        .parse::<u32>()
        .map_err(|e| BurstError::malformed(KIND, format!("{} {:?}: {}", name, field, e)))
}

impl FromStr for SeedTuple {
    type Err = BurstError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split(';').collect();
        let [is_ref, is_rc, offset, id, left, right] = fields[..] else {
            return Err(BurstError::malformed(KIND, format!("expected 6 fields: {:?}", s)));
        };
        Ok(Self {
            is_reference: parse_flag(is_ref, "is_ref")?,
            is_reverse_complement: parse_flag(is_rc, "is_rc")?,
            offset: parse_u32(offset, "offset")?,
            id: parse_u32(id, "id")?,
            left_flank: encoding::encode(left.as_bytes()),
            right_flank: encoding::encode(right.as_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SeedTuple {
        SeedTuple {
            is_reference: true,
            is_reverse_complement: false,
            offset: 1024,
            id: 7,
            left_flank: encoding::encode_reversed(b"ACG"),
            right_flank: encoding::encode(b"TTAN"),
        }
    }

    #[test]
    fn test_payload_layout() {
        let bytes = encode_payload(false, true, 3, 0x0A0B_0C0D, b"ACGGATTC", 0..3, 5..8);
        assert_eq!(bytes[0], FLAG_REVERSE_COMPLEMENT);
        assert_eq!(&bytes[1..5], &[0, 0, 0, 3]);
        assert_eq!(&bytes[5..9], &[0x0A, 0x0B, 0x0C, 0x0D]);

        let tuple = SeedTuple::from_bytes(&bytes).unwrap();
        assert!(!tuple.is_reference);
        assert!(tuple.is_reverse_complement);
        assert_eq!(encoding::decode(&tuple.left_flank), b"GCA".to_vec());
        assert_eq!(encoding::decode(&tuple.right_flank), b"TTC".to_vec());
        assert_eq!(tuple.left_len(), 3);
        assert_eq!(tuple.to_bytes(), bytes);
    }

    #[test]
    fn test_empty_flanks() {
        let bytes = encode_payload(true, false, 0, 1, b"ACGT", 0..0, 4..4);
        assert_eq!(bytes.len(), HEADER_LEN + 1);
        let tuple = SeedTuple::from_bytes(&bytes).unwrap();
        assert!(tuple.left_flank.is_empty());
        assert!(tuple.right_flank.is_empty());
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(SeedTuple::from_bytes(&[1, 0, 0, 0, 0, 0, 0, 0]).is_err());

        let mut no_terminator = sample().to_bytes();
        no_terminator.retain(|&b| b != TERMINATOR);
        let err = SeedTuple::from_bytes(&no_terminator).unwrap_err();
        assert!(err.to_string().contains("terminator"));

        let mut bad_flags = sample().to_bytes();
        bad_flags[0] = 0x03;
        assert!(SeedTuple::from_bytes(&bad_flags).is_err());

        let mut bad_pad = sample().to_bytes();
        bad_pad[HEADER_LEN] = 0x0F;
        assert!(SeedTuple::from_bytes(&bad_pad).is_err());
    }

    #[test]
    fn test_text_round_trip() {
        let t = sample();
        let text = t.to_string();
        assert_eq!(text, "1;0;1024;7;GCA;TTAN");
        assert_eq!(text.parse::<SeedTuple>().unwrap(), t);
        assert!("1;0;x;7;A;C".parse::<SeedTuple>().is_err());
        assert!("1;0;1;7".parse::<SeedTuple>().is_err());
    }

    #[test]
    fn test_seed_key_describe() {
        let key = SeedKey::new(b"AAAAC", 9, 4);
        assert_eq!(key.describe(5), "AAAAC/1");
        assert_eq!(SeedKey::new(b"GATTACA", 0, 1).describe(7), "GATTACA");
    }
}
