//! # DNA Encoding
//!
//! Dense binary forms for DNA used throughout the aligner:
//!
//! ```text
//! ┌──────────────┬───────────────────────────────────────────────────────────┐
//! │ Form         │ Layout                                                    │
//! ├──────────────┼───────────────────────────────────────────────────────────┤
//! │ packed-4     │ one nibble per base, first base in the high nibble        │
//! │              │ A=0x0 C=0x1 G=0x2 T=0x4 N=0x8, pad=0xF (odd lengths only) │
//! │ seed key     │ two bits per base, four bases per byte, high bits first   │
//! │              │ A=0 C=1 G=2 T=3, optional trailing redundancy slot byte   │
//! └──────────────┴───────────────────────────────────────────────────────────┘
//! ```
//!
//! Packed-4 keeps ambiguous bases (`N`) and is the form used for flanks and
//! chunk sequences. Seed keys have no ambiguous-base representation; callers
//! check windows with [`has_ambiguous_base`] before calling [`encode_seed`].
//!
//! All packing routines are pure functions over explicit slices. Output
//! slices must be large enough ([`packed_len`], [`seed_key_len`]).

// ============================================================================
// NIBBLE CODES
// ============================================================================

pub const DNA_A: u8 = 0x00;
pub const DNA_C: u8 = 0x01;
pub const DNA_G: u8 = 0x02;
pub const DNA_T: u8 = 0x04;
pub const DNA_N: u8 = 0x08;

/// Low-nibble filler for the final byte of an odd-length packed buffer.
pub const PAD_NIBBLE: u8 = 0x0F;

/// Byte separating the two flanks inside a seed payload.
///
/// A packed-4 byte never has `0xF` in its high nibble, so this value cannot
/// collide with sequence data.
pub const TERMINATOR: u8 = 0xFF;

const BASE_TO_NIBBLE: [u8; 256] = build_base_to_nibble();
const NIBBLE_TO_BASE: [u8; 16] = build_nibble_to_base();
const COMPLEMENT: [u8; 256] = build_complement();

const fn build_base_to_nibble() -> [u8; 256] {
    let mut table = [DNA_N; 256];
    table[b'A' as usize] = DNA_A;
    table[b'a' as usize] = DNA_A;
    table[b'C' as usize] = DNA_C;
    table[b'c' as usize] = DNA_C;
    table[b'G' as usize] = DNA_G;
    table[b'g' as usize] = DNA_G;
    table[b'T' as usize] = DNA_T;
    table[b't' as usize] = DNA_T;
    table
}

const fn build_nibble_to_base() -> [u8; 16] {
    let mut table = [b'N'; 16];
    table[DNA_A as usize] = b'A';
    table[DNA_C as usize] = b'C';
    table[DNA_G as usize] = b'G';
    table[DNA_T as usize] = b'T';
    table
}

const fn build_complement() -> [u8; 256] {
    let mut table = [b'N'; 256];
    table[b'A' as usize] = b'T';
    table[b'a' as usize] = b't';
    table[b'T' as usize] = b'A';
    table[b't' as usize] = b'a';
    table[b'C' as usize] = b'G';
    table[b'c' as usize] = b'g';
    table[b'G' as usize] = b'C';
    table[b'g' as usize] = b'c';
    table[b'n' as usize] = b'n';
    table
}

/// Convert an ASCII base to its packed-4 nibble. Anything other than
/// A/C/G/T (either case) maps to [`DNA_N`].
#[inline(always)]
pub const fn base_to_nibble(base: u8) -> u8 {
    BASE_TO_NIBBLE[base as usize]
}

/// Convert a packed-4 nibble back to an upper-case ASCII base.
#[inline(always)]
pub const fn nibble_to_base(nibble: u8) -> u8 {
    NIBBLE_TO_BASE[(nibble & 0x0F) as usize]
}

/// Complement of a single ASCII base (case preserved, unknown symbols → `N`).
#[inline(always)]
pub const fn complement(base: u8) -> u8 {
    COMPLEMENT[base as usize]
}

/// Two-bit seed code for an unambiguous ASCII base.
#[inline(always)]
const fn base_to_seed_code(base: u8) -> u8 {
    match base {
        b'C' | b'c' => 1,
        b'G' | b'g' => 2,
        b'T' | b't' => 3,
        _ => 0,
    }
}

#[inline(always)]
const fn seed_code_to_base(code: u8) -> u8 {
    match code & 0x03 {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

// ============================================================================
// PACKED-4 (NIBBLE) ENCODING
// ============================================================================

/// Number of bytes needed to pack `bases` bases at two bases per byte.
#[inline]
pub const fn packed_len(bases: usize) -> usize {
    bases.div_ceil(2)
}

/// Number of bases stored in a packed-4 buffer (accounts for a trailing pad).
#[inline]
pub fn packed_base_len(packed: &[u8]) -> usize {
    match packed.last() {
        None => 0,
        Some(&last) if last & 0x0F == PAD_NIBBLE => packed.len() * 2 - 1,
        Some(_) => packed.len() * 2,
    }
}

/// Pack `ascii` into `out`, returning the number of bytes written.
///
/// # Panics
/// Panics if `out` is shorter than `packed_len(ascii.len())`.
pub fn encode_into(ascii: &[u8], out: &mut [u8]) -> usize {
    let written = packed_len(ascii.len());
    assert!(
        out.len() >= written,
        "packed output holds {} bytes, {} required",
        out.len(),
        written
    );

    let mut pairs = ascii.chunks_exact(2);
    for (slot, pair) in out.iter_mut().zip(&mut pairs) {
        *slot = (base_to_nibble(pair[0]) << 4) | base_to_nibble(pair[1]);
    }
    if let [last] = pairs.remainder() {
        out[written - 1] = (base_to_nibble(*last) << 4) | PAD_NIBBLE;
    }

    written
}

/// Pack `ascii` in reverse order (last base first) into `out`.
///
/// Used for left flanks so that extension outward from a seed is always a
/// forward scan.
pub fn encode_reversed_into(ascii: &[u8], out: &mut [u8]) -> usize {
    let written = packed_len(ascii.len());
    assert!(
        out.len() >= written,
        "packed output holds {} bytes, {} required",
        out.len(),
        written
    );

    let mut pairs = ascii.rchunks_exact(2);
    for (slot, pair) in out.iter_mut().zip(&mut pairs) {
        *slot = (base_to_nibble(pair[1]) << 4) | base_to_nibble(pair[0]);
    }
    if let [first] = pairs.remainder() {
        out[written - 1] = (base_to_nibble(*first) << 4) | PAD_NIBBLE;
    }

    written
}

/// Pack an ASCII sequence into a new packed-4 buffer.
pub fn encode(ascii: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; packed_len(ascii.len())];
    encode_into(ascii, &mut out);
    out
}

/// Pack an ASCII sequence in reverse order into a new packed-4 buffer.
pub fn encode_reversed(ascii: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; packed_len(ascii.len())];
    encode_reversed_into(ascii, &mut out);
    out
}

/// Unpack a packed-4 buffer, appending ASCII bases to `out`.
pub fn decode_into(packed: &[u8], out: &mut Vec<u8>) {
    let bases = packed_base_len(packed);
    out.reserve(bases);
    for &byte in packed {
        out.push(nibble_to_base(byte >> 4));
        out.push(nibble_to_base(byte & 0x0F));
    }
    // Drop the pad nibble's placeholder.
    out.truncate(out.len() - (packed.len() * 2 - bases));
}

/// Unpack a packed-4 buffer into ASCII.
pub fn decode(packed: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed.len() * 2);
    decode_into(packed, &mut out);
    out
}

// ============================================================================
// SEED (2-BIT) ENCODING
// ============================================================================

/// Bytes in a seed key for `seed_len` bases, including the redundancy slot
/// byte when `redundancy > 1`.
#[inline]
pub const fn seed_key_len(seed_len: usize, redundancy: u32) -> usize {
    let base = seed_len.div_ceil(4);
    if redundancy > 1 {
        base + 1
    } else {
        base
    }
}

/// Pack an ambiguity-free window into a 2-bit seed key.
///
/// When `redundancy > 1` one extra byte holding `slot % redundancy` is
/// appended. Returns the number of bytes written.
///
/// # Panics
/// Panics if `out` is shorter than `seed_key_len(window.len(), redundancy)`.
pub fn encode_seed_into(window: &[u8], slot: u32, redundancy: u32, out: &mut [u8]) -> usize {
    let written = seed_key_len(window.len(), redundancy);
    assert!(
        out.len() >= written,
        "seed output holds {} bytes, {} required",
        out.len(),
        written
    );
    debug_assert!(!has_ambiguous_base(window), "seed window contains an ambiguous base");

    for (slot_byte, quad) in out.iter_mut().zip(window.chunks(4)) {
        let mut byte = 0u8;
        for (i, &base) in quad.iter().enumerate() {
            byte |= base_to_seed_code(base) << (6 - 2 * i);
        }
        *slot_byte = byte;
    }

    if redundancy > 1 {
        out[written - 1] = (slot % redundancy) as u8;
    }

    written
}

/// Pack an ambiguity-free window into a new seed key buffer.
pub fn encode_seed(window: &[u8], slot: u32, redundancy: u32) -> Vec<u8> {
    let mut out = vec![0u8; seed_key_len(window.len(), redundancy)];
    encode_seed_into(window, slot, redundancy, &mut out);
    out
}

/// Unpack the first `seed_len` bases of a seed key. A trailing redundancy
/// byte, if any, is ignored.
pub fn decode_seed(key: &[u8], seed_len: usize) -> Vec<u8> {
    (0..seed_len)
        .map(|i| seed_code_to_base(key[i / 4] >> (6 - 2 * (i % 4))))
        .collect()
}

// ============================================================================
// SEQUENCE HELPERS
// ============================================================================

/// Reverse complement into a new buffer.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter().rev().map(|&b| complement(b)).collect()
}

/// Reverse complement in place.
pub fn reverse_complement_in_place(seq: &mut [u8]) {
    seq.reverse();
    for base in seq.iter_mut() {
        *base = complement(*base);
    }
}

/// True if the window contains anything other than A/C/G/T.
#[inline]
pub fn has_ambiguous_base(window: &[u8]) -> bool {
    window.iter().any(|&b| base_to_nibble(b) == DNA_N)
}

/// Number of non-A/C/G/T symbols in a sequence.
pub fn count_ambiguous(seq: &[u8]) -> usize {
    seq.iter().filter(|&&b| base_to_nibble(b) == DNA_N).count()
}

/// True if every base in the window is identical (e.g. a poly-A run).
///
/// Repetitive seeds are the ones worth fanning out over redundancy slots.
#[inline]
pub fn is_repetitive(window: &[u8]) -> bool {
    match window.split_first() {
        Some((first, rest)) => rest.iter().all(|b| b == first),
        None => true,
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
