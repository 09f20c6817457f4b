//! ITU-T G.711 A-law.

use crate::PCM_SAMPLE_BYTES;

const SIGN_BIT: u8 = 0x80;
const QUANT_MASK: u8 = 0x0F;
const SEG_MASK: u8 = 0x70;
const SEG_SHIFT: u32 = 4;
/// Even-bit inversion applied to every code word on the wire.
const EVEN_BITS: u8 = 0x55;

static DECODE_TABLE: [i16; 256] = build_decode_table();

const fn expand(code: u8) -> i16 {
    let code = code ^ EVEN_BITS;
    let seg = ((code & SEG_MASK) >> SEG_SHIFT) as u32;
    let mut t = ((code & QUANT_MASK) as i32) << 4;
    t += if seg == 0 { 8 } else { 0x108 };
    if seg > 1 {
        t <<= seg - 1;
    }
    if code & SIGN_BIT != 0 {
        t as i16
    } else {
        -t as i16
    }
}

const fn build_decode_table() -> [i16; 256] {
    let mut table = [0i16; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = expand(i as u8);
        i += 1;
    }
    table
}

/// Decode one A-law code word to a 16-bit linear sample.
#[inline]
pub fn decode(code: u8) -> i16 {
    DECODE_TABLE[code as usize]
}

/// Encode one 16-bit linear sample to an A-law code word.
#[inline]
pub fn encode(sample: i16) -> u8 {
    // 13-bit magnitude domain; negatives fold onto 0..=4095 as `-v - 1`.
    let v = (sample >> 3) as i32;
    let negative = v < 0;
    let magnitude = (if negative { -v - 1 } else { v }) as u32;
    let mask: u8 = if negative { EVEN_BITS } else { EVEN_BITS | SIGN_BIT };

    // magnitude <= 4095, so the segment is at most 7.
    let seg = (u32::BITS - (magnitude | 0x1F).leading_zeros()) - 5;
    let shift = seg + u32::from(seg == 0);
    let code = ((seg as u8) << SEG_SHIFT) | ((magnitude >> shift) as u8 & QUANT_MASK);
    code ^ mask
}

/// Expand A-law bytes into little-endian 16-bit PCM.
///
/// Converts as many samples as both buffers allow and returns that count.
pub fn decode_slice(wire: &[u8], pcm: &mut [u8]) -> usize {
    let mut count = 0;
    for (code, out) in wire.iter().zip(pcm.chunks_exact_mut(PCM_SAMPLE_BYTES)) {
        out.copy_from_slice(&decode(*code).to_le_bytes());
        count += 1;
    }
    count
}

/// Compress little-endian 16-bit PCM into A-law bytes.
///
/// Converts as many samples as both buffers allow and returns that count.
pub fn encode_slice(pcm: &[u8], wire: &mut [u8]) -> usize {
    let mut count = 0;
    for (sample, out) in pcm.chunks_exact(PCM_SAMPLE_BYTES).zip(wire.iter_mut()) {
        *out = encode(i16::from_le_bytes([sample[0], sample[1]]));
        count += 1;
    }
    count
}
