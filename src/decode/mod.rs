// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Unpacking of raw 4-bit samples.
//!
//! A raw 16-bit word holds four 4-bit two's-complement nibbles. From the least
//! significant nibble up, they are the real and imaginary parts of the first
//! polarisation, then the real and imaginary parts of the second
//! polarisation. Rather than twiddle bits for every sample, all 65536 words
//! are decoded once into a lookup table.


use byteorder::{ByteOrder, LittleEndian};
use lazy_static::lazy_static;
use num_complex::Complex;

/// The number of distinct raw words.
pub const LOOKUP_LEN: usize = 1 << 16;

lazy_static! {
    /// Every raw word decoded into its four signed bytes. `lazy_static` builds
    /// this exactly once, even if many threads race to use it first.
    static ref EIGHT_BIT_LOOKUP: Box<[[i8; 4]]> = build_eight_bit_lookup();
}

/// Sign-extend a 4-bit two's-complement value (the low nibble of `v`).
#[inline]
pub fn decode_nibble(v: u8) -> i8 {
    let v = (v & 0xf) as i8;
    if v >= 8 {
        v - 16
    } else {
        v
    }
}

fn build_eight_bit_lookup() -> Box<[[i8; 4]]> {
    (0..LOOKUP_LEN)
        .map(|word| {
            let mut out = [0; 4];
            for (i_nibble, o) in out.iter_mut().enumerate() {
                *o = decode_nibble((word >> (i_nibble * 4)) as u8);
            }
            out
        })
        .collect()
}

/// Build the lookup table now, rather than on the first decode. Calling this
/// more than once is harmless.
pub fn init_lookup() {
    lazy_static::initialize(&EIGHT_BIT_LOOKUP);
}

/// The whole lookup table, indexed by raw word.
pub fn lookup_table() -> &'static [[i8; 4]] {
    &EIGHT_BIT_LOOKUP
}

/// Decode a raw word into `[pol0.re, pol0.im, pol1.re, pol1.im]`.
#[inline]
pub fn decode_word(word: u16) -> [i8; 4] {
    EIGHT_BIT_LOOKUP[word as usize]
}

/// Decode the little-endian raw word at the start of `bytes` into the complex
/// samples of both polarisations.
#[inline]
pub fn decode_pair(bytes: &[u8]) -> [Complex<i8>; 2] {
    let [r0, i0, r1, i1] = decode_word(LittleEndian::read_u16(bytes));
    [Complex::new(r0, i0), Complex::new(r1, i1)]
}
