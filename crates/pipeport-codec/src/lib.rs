//! Sample conversion between 8-bit companded and 16-bit linear PCM.
//!
//! The leaf of pipeport: no state, no allocation, no failure modes. Every
//! 8-bit input decodes and every 16-bit input encodes.
//!
//! Linear PCM on the byte side is always little-endian `i16`.

pub mod alaw;

pub use alaw::{decode, decode_slice, encode, encode_slice};

/// Bytes per linear PCM sample.
pub const PCM_SAMPLE_BYTES: usize = 2;
