//! Base-128 varints, zigzag mapping and delta-coded tile coordinates.

use crate::buffer::BufferedSource;
use crate::error::{DecodeError, Result};
use std::io::Read;

/// Longest encoding of a `u32`.
pub const MAX_VARINT_LEN: usize = 5;

/// Decode one unsigned varint.
///
/// The fifth byte contributes its low four bits only; a continuation bit on
/// it is a malformed varint.
#[inline]
pub fn decode_varint<R: Read>(src: &mut BufferedSource<R>) -> Result<u32> {
    if src.available() >= MAX_VARINT_LEN {
        let (value, len) = decode_resident(src.peek())?;
        src.consume(len);
        Ok(value)
    } else {
        decode_refilling(src)
    }
}

#[inline(always)]
fn decode_resident(bytes: &[u8]) -> Result<(u32, usize)> {
    let b: &[u8; MAX_VARINT_LEN] = bytes[..MAX_VARINT_LEN]
        .try_into()
        .map_err(|_| DecodeError::MalformedVarint)?;

    if b[0] < 0x80 {
        return Ok((b[0] as u32, 1));
    }
    let mut v = (b[0] & 0x7f) as u32;
    if b[1] < 0x80 {
        return Ok((v | (b[1] as u32) << 7, 2));
    }
    v |= ((b[1] & 0x7f) as u32) << 7;
    if b[2] < 0x80 {
        return Ok((v | (b[2] as u32) << 14, 3));
    }
    v |= ((b[2] & 0x7f) as u32) << 14;
    if b[3] < 0x80 {
        return Ok((v | (b[3] as u32) << 21, 4));
    }
    v |= ((b[3] & 0x7f) as u32) << 21;
    if b[4] < 0x80 {
        return Ok((v | (b[4] as u32) << 28, 5));
    }
    Err(DecodeError::MalformedVarint)
}

#[cold]
fn decode_refilling<R: Read>(src: &mut BufferedSource<R>) -> Result<u32> {
    let mut value = 0u32;
    for i in 0..MAX_VARINT_LEN {
        let b = src.read_u8()?;
        value |= ((b & 0x7f) as u32) << (7 * i);
        if b < 0x80 {
            return Ok(value);
        }
    }
    Err(DecodeError::MalformedVarint)
}

/// Append the varint encoding of `value` to `out`.
pub fn encode_varint(mut value: u32, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

pub const fn varint_len(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}

#[inline(always)]
pub fn zigzag_decode(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

#[inline(always)]
pub fn zigzag_encode(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

/// Per-element state for delta-coded coordinates.
///
/// Values alternate x, y. Each value is added to the running total for its
/// axis, divided by `scale`, and y is flipped from the wire's top-down origin.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateDeltas {
    scale: f32,
    tile_size: f32,
    last_x: i32,
    last_y: i32,
    even: bool,
}

impl CoordinateDeltas {
    /// `scale` is `reference_tile_size / renderer_tile_size`.
    pub fn new(scale: f32, tile_size: f32) -> Self {
        Self {
            scale,
            tile_size,
            last_x: 0,
            last_y: 0,
            even: true,
        }
    }

    /// Feed one raw varint; returns the rescaled x or y it decodes to.
    #[inline]
    pub fn next(&mut self, raw: u32) -> f32 {
        let delta = zigzag_decode(raw);
        if self.even {
            self.even = false;
            self.last_x = self.last_x.wrapping_add(delta);
            self.last_x as f32 / self.scale
        } else {
            self.even = true;
            self.last_y = self.last_y.wrapping_add(delta);
            self.tile_size - self.last_y as f32 / self.scale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(bytes: &[u8]) -> Result<u32> {
        let mut src = BufferedSource::new(bytes);
        src.fill_more()?;
        decode_varint(&mut src)
    }

    #[test]
    fn known_encodings() {
        let mut out = Vec::new();
        encode_varint(300, &mut out);
        assert_eq!(out, [0xac, 0x02]);
        assert_eq!(decode_all(&out).unwrap(), 300);

        out.clear();
        encode_varint(u32::MAX, &mut out);
        assert_eq!(out, [0xff, 0xff, 0xff, 0xff, 0x0f]);
    }

    #[test]
    fn continuation_on_fifth_byte_is_malformed() {
        let bytes = [0xff, 0xff, 0xff, 0xff, 0x8f, 0x01, 0, 0];
        assert!(matches!(decode_all(&bytes), Err(DecodeError::MalformedVarint)));
        // Nothing resident yet, so this goes byte by byte.
        let mut src = BufferedSource::new(&bytes[..]);
        assert!(matches!(decode_varint(&mut src), Err(DecodeError::MalformedVarint)));
    }

    #[test]
    fn truncated_varint_is_eof() {
        assert!(matches!(
            decode_all(&[0x80, 0x80]),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn fast_and_slow_paths_agree_in_sequence() {
        let mut out = Vec::new();
        let values = [0u32, 1, 127, 128, 16_383, 16_384, 1 << 28, u32::MAX];
        for v in values {
            encode_varint(v, &mut out);
        }
        let mut src = BufferedSource::new(&out[..]);
        for v in values {
            assert_eq!(decode_varint(&mut src).unwrap(), v);
        }
        assert_eq!(src.bytes_processed(), out.len());
    }

    #[test]
    fn zigzag_small_magnitudes_stay_small() {
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
        assert_eq!(zigzag_encode(-2), 3);
        assert_eq!(zigzag_decode(3), -2);
        assert_eq!(zigzag_decode(u32::MAX), i32::MIN);
    }

    #[test]
    fn coordinate_deltas_flip_y() {
        let mut deltas = CoordinateDeltas::new(16.0, 256.0);
        assert_eq!(deltas.next(zigzag_encode(160)), 10.0);
        assert_eq!(deltas.next(zigzag_encode(320)), 236.0);
        assert_eq!(deltas.next(zigzag_encode(-32)), 8.0);
        assert_eq!(deltas.next(zigzag_encode(16)), 235.0);
    }

    proptest! {
        #[test]
        fn prop_varint_round_trip(v in any::<u32>()) {
            let mut out = Vec::new();
            encode_varint(v, &mut out);
            prop_assert!(out.len() <= MAX_VARINT_LEN);
            prop_assert_eq!(out.len(), varint_len(v));
            prop_assert_eq!(decode_all(&out).unwrap(), v);
        }

        #[test]
        fn prop_zigzag_round_trip(v in any::<i32>()) {
            prop_assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
    }
}
